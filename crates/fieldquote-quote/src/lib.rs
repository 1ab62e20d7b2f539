//! FieldQuote Quote: price site orders from resolved catalog rates.

pub mod pricing;
pub mod types;

pub use pricing::{compute_totals, parse_distance, price_order, sanitize_items};
pub use types::*;
