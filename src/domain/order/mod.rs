// ============================================================================
// Order Domain - Lifecycle Rules for Delivery Orders
// ============================================================================
//
// - Value objects (OrderStatus, Marketplace, OrderItem, ...)
// - Transition table and policy
// - Commands (Accept, StartPreparation, ...)
// - Errors (OrderError enum)
// - Order entity and ingestion payload
// - Seed fixtures and statistics
//
// ============================================================================

pub mod value_objects;
pub mod transitions;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod fixtures;
pub mod stats;

// Re-export for convenience
pub use value_objects::*;
pub use transitions::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use stats::*;
