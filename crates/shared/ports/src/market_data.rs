use std::sync::Arc;

use tempo_core::{ChildOrder, MarketSnapshot, Quantity, Security, SubscriptionId};

use crate::error::MarketDataError;

/// Subscription handle for one security, as seen by one algorithm instance
///
/// Exposes the market snapshot together with the instance's own order
/// accounting, which the order-management system keeps current.
pub trait Instrument: Send + Sync {
    /// Identifies this subscription; child orders stamped with it through
    /// [`ChildOrder::with_owner`] count towards its accounting
    fn id(&self) -> SubscriptionId;

    /// Reference data of the subscribed security
    fn security(&self) -> &Security;

    /// Latest market snapshot
    fn snapshot(&self) -> MarketSnapshot;

    /// Cumulative filled quantity across this subscription's child orders
    fn cum_qty(&self) -> Quantity;

    /// Cumulative canceled quantity across this subscription's child orders
    fn cum_cx_qty(&self) -> Quantity;

    /// Filled quantity plus quantity still working in the market
    fn total_exposure(&self) -> Quantity;

    /// This subscription's child orders currently working
    fn active_orders(&self) -> Vec<ChildOrder>;

    /// Release the subscription
    fn release(&self);
}

/// Port to the market-data distribution layer
pub trait MarketDataSource: Send + Sync {
    /// Subscribe to a security on a named source (`None` for the default)
    fn subscribe(
        &self,
        security: &Security,
        source: Option<&str>,
    ) -> Result<Arc<dyn Instrument>, MarketDataError>;
}
