mod execution_report;
mod order;
mod order_status;
mod order_type;
mod parent;
mod position_effect;
mod side;

pub use execution_report::ExecutionReport;
pub use order::{ChildOrder, OrderId, SubscriptionId};
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use parent::ParentOrder;
pub use position_effect::PositionEffect;
pub use side::Side;
