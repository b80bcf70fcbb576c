// ============================================================================
// Views - status-filtered projections of the order collection
// ============================================================================

pub mod board;
pub mod status_view;

pub use board::{ActionInfo, ViewBoard, ViewPage};
pub use status_view::{StatusView, ViewAction, ViewError};
