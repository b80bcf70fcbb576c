use super::value_objects::OrderStatus;

// ============================================================================
// Order Commands - Represent staff intent
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCommand {
    /// Accept a freshly arrived order
    Accept,
    StartPreparation,
    /// Food is ready and handed to the courier
    MarkReady,
    ConfirmDelivery,
    Cancel,
    /// Raw status overwrite
    SetStatus(OrderStatus),
}

impl OrderCommand {
    pub fn target_status(&self) -> OrderStatus {
        match self {
            OrderCommand::Accept => OrderStatus::Confirmed,
            OrderCommand::StartPreparation => OrderStatus::Preparing,
            OrderCommand::MarkReady => OrderStatus::Shipped,
            OrderCommand::ConfirmDelivery => OrderStatus::Delivered,
            OrderCommand::Cancel => OrderStatus::Cancelled,
            OrderCommand::SetStatus(status) => *status,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::Accept => "accept",
            OrderCommand::StartPreparation => "start_preparation",
            OrderCommand::MarkReady => "mark_ready",
            OrderCommand::ConfirmDelivery => "confirm_delivery",
            OrderCommand::Cancel => "cancel",
            OrderCommand::SetStatus(_) => "set_status",
        }
    }
}
