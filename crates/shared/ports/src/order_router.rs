use tempo_core::{ChildOrder, OrderId, Price, Quantity, Side};

use crate::error::OrderError;
use crate::market_data::Instrument;

/// Port to the order-management system that transmits child orders
///
/// Implementations are expected to reflect placed orders in the active-order
/// set and exposure counters of the [`Instrument`] named by the order's
/// `owner`. Crosses are booked against the instrument passed in.
pub trait OrderRouter: Send + Sync {
    /// Submit a new child order
    fn place(&self, order: &ChildOrder) -> Result<OrderId, OrderError>;

    /// Request cancellation of a working child order
    fn cancel(&self, order: &ChildOrder) -> Result<(), OrderError>;

    /// Cross a quantity internally against the firm's own flow
    fn cross(
        &self,
        quantity: Quantity,
        price: Option<Price>,
        side: Side,
        sub_account: &str,
        instrument: &dyn Instrument,
    ) -> Result<(), OrderError>;
}
