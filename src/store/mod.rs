// ============================================================================
// Store - the live order collection and where it comes from
// ============================================================================

pub mod http_source;
pub mod order_store;
pub mod source;

pub use http_source::HttpOrderSource;
pub use order_store::{MutationOutcome, OrderStore, RefreshOutcome, RefreshTrigger, StoreState};
pub use source::{InMemorySource, OrderSource, SourceError};
