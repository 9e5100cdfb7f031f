use mockall::mock;
use storefront_payment_engine::{
    db_types::{CartLine, FulfilmentStatus, NewOrder, Order, OrderItem, Payment, PaymentRef, PaymentStatus},
    OrderApiError,
    OrderManagement,
    CheckoutDatabase,
    PaymentGatewayError,
    PaymentUpdate,
};

mock! {
    pub CheckoutDb {}

    impl Clone for CheckoutDb {
        fn clone(&self) -> Self;
    }

    impl OrderManagement for CheckoutDb {
        async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderApiError>;
        async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError>;
        async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderApiError>;
        async fn fetch_order_for_guest(&self, order_id: i64, email: &str) -> Result<Option<Order>, OrderApiError>;
    }

    impl CheckoutDatabase for CheckoutDb {
        fn url(&self) -> &str;
        async fn fetch_cart_lines(&self, cart_id: &str) -> Result<Vec<CartLine>, PaymentGatewayError>;
        async fn process_order_submission(&self, order: NewOrder, payment_ref: PaymentRef) -> Result<(Order, Payment), PaymentGatewayError>;
        async fn reconcile_payment(&self, order_id: i64, payment_ref: PaymentRef) -> Result<Payment, PaymentGatewayError>;
        async fn update_payment_status(&self, payment_ref: &PaymentRef, status: PaymentStatus) -> Result<PaymentUpdate, PaymentGatewayError>;
        async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, PaymentGatewayError>;
        async fn set_fulfilment_status(&self, order_id: i64, status: FulfilmentStatus) -> Result<Order, PaymentGatewayError>;
        async fn close(&mut self) -> Result<(), PaymentGatewayError>;
    }
}
