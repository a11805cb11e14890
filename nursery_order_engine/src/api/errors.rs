use thiserror::Error;

use crate::{db_types::OrderId, traits::OrderStoreError};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    StoreError(#[from] OrderStoreError),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl OrderFlowError {
    /// Whether the failure reads as "the record is not there", as opposed to a backend fault.
    /// Observers racing against order creation treat this as "no update yet".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            OrderFlowError::OrderNotFound(_) | OrderFlowError::StoreError(OrderStoreError::OrderNotFound(_))
        )
    }
}
