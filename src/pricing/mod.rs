//! Price catalog snapshot, cache and lookups.

pub mod cache;
pub mod lookup;
pub mod snapshot;

pub use cache::PriceCache;
pub use snapshot::{Price, PriceEntry, PriceSnapshot};
