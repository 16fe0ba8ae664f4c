use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Quantity value - uses Decimal for precision
/// Shares are whole numbers in practice, but fractional lots stay representable
pub type Quantity = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Symbol identifier for a tradeable security
pub type Symbol = String;
