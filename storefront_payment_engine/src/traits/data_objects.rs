use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Payment};

/// The result of applying a provider payment event to the store.
///
/// `changed` is `false` when the event was a replay (the payment was already in the requested state) or when the
/// requested transition was ignored because the payment had already completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub payment: Payment,
    pub order: Order,
    pub changed: bool,
}
