// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Pure order lifecycle rules. Nothing in here performs I/O; the store and
// the HTTP surface build on top of it.
//
// ============================================================================

pub mod order;
