//! Content-addressed entry storage.

mod entry;
mod store;

pub use entry::CacheEntry;
pub use store::{EntryStore, Lookup};
