//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database calls,
//! etc.) must be expressed as a future or asynchronous function so that worker threads can interleave requests.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use storefront_payment_engine::{
    db_types::{FulfilmentStatus, Role},
    order_objects::OrderSubmission,
    CheckoutDatabase,
    OrderFlowApi,
};

use crate::{
    auth::{AccessTokenClaims, CallerIdentity},
    data_objects::{GuestOrderRequest, SubmitOrderRequest, UpdateFulfilmentRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/orders" impl CheckoutDatabase);
/// Order submission, open to authenticated customers and guests alike.
///
/// The caller's identity picks the submission variant: customers are bound by their access token, guests must
/// supply a contact email in the payload. Either variant may name an existing order instead of a cart to retry a
/// failed or pending payment; a completed payment rejects the retry.
pub async fn submit_order<B: CheckoutDatabase>(
    identity: CallerIdentity,
    body: web::Json<SubmitOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let submission = match identity {
        CallerIdentity::Customer(claims) => {
            debug!("💻️ POST order submission for customer {}", claims.customer_id);
            OrderSubmission::Authenticated {
                customer_id: claims.customer_id,
                email: claims.email,
                cart_id: request.cart_id,
                retry_order_id: request.order_id,
            }
        },
        CallerIdentity::Anonymous => {
            debug!("💻️ POST guest order submission");
            let email = request.email.ok_or_else(|| {
                ServerError::ValidationError("A contact email is required for guest orders.".to_string())
            })?;
            OrderSubmission::Guest { email, cart_id: request.cart_id, retry_order_id: request.order_id }
        },
    };
    let result = api.submit_order(submission).await?;
    Ok(HttpResponse::Created().json(result))
}

route!(my_orders => Get "/orders" impl CheckoutDatabase);
pub async fn my_orders<B: CheckoutDatabase>(
    claims: AccessTokenClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for customer {}", claims.customer_id);
    let orders = if claims.has_role(Role::Admin) {
        api.all_orders().await?
    } else {
        api.orders_for_customer(claims.customer_id).await?
    };
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl CheckoutDatabase);
pub async fn order_by_id<B: CheckoutDatabase>(
    claims: AccessTokenClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for customer {}", claims.customer_id);
    let details = api.order_details(order_id).await?;
    // Non-admins only see their own orders, and a foreign order looks exactly like a missing one.
    let visible = details.filter(|d| {
        claims.has_role(Role::Admin) || d.order.customer_id == Some(claims.customer_id)
    });
    match visible {
        Some(details) => Ok(HttpResponse::Ok().json(details)),
        None => Err(ServerError::NoRecordFound("Order not found.".to_string())),
    }
}

//----------------------------------------------   Guest lookup  ----------------------------------------------------
route!(guest_order_lookup => Post "/orders/guest-lookup" impl CheckoutDatabase);
/// Allows guests to retrieve an order with its id and the contact email captured on the order. No authentication
/// required; a wrong email is indistinguishable from an unknown order id.
pub async fn guest_order_lookup<B: CheckoutDatabase>(
    body: web::Json<GuestOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    trace!("💻️ POST guest order lookup for order {}", request.order_id);
    match api.order_for_guest(request.order_id, &request.email).await? {
        Some(details) => Ok(HttpResponse::Ok().json(details)),
        None => Err(ServerError::NoRecordFound("Order not found or email does not match.".to_string())),
    }
}

//----------------------------------------------   Fulfilment  ----------------------------------------------------
route!(update_fulfilment => Patch "/orders/{id}/fulfilment" impl CheckoutDatabase);
/// Vendor-side fulfilment updates. This touches the fulfilment status only; payment status is owned by webhook
/// ingestion.
pub async fn update_fulfilment<B: CheckoutDatabase>(
    claims: AccessTokenClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateFulfilmentRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    if !(claims.has_role(Role::Vendor) || claims.has_role(Role::Admin)) {
        return Err(ServerError::InsufficientPermissions(
            "Only vendors and admins may update fulfilment status.".to_string(),
        ));
    }
    let order_id = path.into_inner();
    let status =
        body.into_inner().status.parse::<FulfilmentStatus>().map_err(|e| ServerError::ValidationError(e.to_string()))?;
    debug!("💻️ PATCH fulfilment for order {order_id} to {status}");
    let order = api.set_fulfilment_status(order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}
