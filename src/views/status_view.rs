use serde::Serialize;

use crate::domain::order::{Order, OrderCommand, OrderError, OrderId, OrderStatus};
use crate::store::{MutationOutcome, OrderStore};

// ============================================================================
// Status View - one lifecycle stage, one forward action
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewAction {
    Accept,
    StartPreparation,
    MarkReady,
    ConfirmDelivery,
}

impl ViewAction {
    pub fn command(&self) -> OrderCommand {
        match self {
            ViewAction::Accept => OrderCommand::Accept,
            ViewAction::StartPreparation => OrderCommand::StartPreparation,
            ViewAction::MarkReady => OrderCommand::MarkReady,
            ViewAction::ConfirmDelivery => OrderCommand::ConfirmDelivery,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewAction::Accept => "Accept order",
            ViewAction::StartPreparation => "Start preparation",
            ViewAction::MarkReady => "Mark ready",
            ViewAction::ConfirmDelivery => "Confirm delivery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
    #[error("no action available in the {0} view")]
    NoAction(OrderStatus),

    #[error("order not found: {0}")]
    UnknownOrder(OrderId),

    #[error("order {id} is {actual}, not in the {view} view")]
    NotInView {
        id: OrderId,
        view: OrderStatus,
        actual: OrderStatus,
    },

    #[error(transparent)]
    Rejected(#[from] OrderError),
}

#[derive(Debug, Clone)]
pub struct StatusView {
    status: OrderStatus,
    selected: Option<OrderId>,
}

impl StatusView {
    pub fn new(status: OrderStatus) -> Self {
        Self {
            status,
            selected: None,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn selected(&self) -> Option<&OrderId> {
        self.selected.as_ref()
    }

    /// Orders in this view's status, in collection order
    pub fn project(&self, orders: &[Order]) -> Vec<Order> {
        orders
            .iter()
            .filter(|o| o.status == self.status)
            .cloned()
            .collect()
    }

    /// Keep the selection if it is still listed, otherwise fall back to the
    /// first listed order (or nothing).
    pub fn reconcile(&mut self, filtered: &[Order]) -> Option<&OrderId> {
        let still_listed = self
            .selected
            .as_ref()
            .is_some_and(|id| filtered.iter().any(|o| &o.id == id));

        if !still_listed {
            self.selected = filtered.first().map(|o| o.id.clone());
        }
        self.selected.as_ref()
    }

    /// Only orders in `filtered` can be selected
    pub fn select(&mut self, id: &OrderId, filtered: &[Order]) -> bool {
        if filtered.iter().any(|o| &o.id == id) {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    pub fn action(&self) -> Option<ViewAction> {
        match self.status {
            OrderStatus::Pending => Some(ViewAction::Accept),
            OrderStatus::Confirmed => Some(ViewAction::StartPreparation),
            OrderStatus::Preparing => Some(ViewAction::MarkReady),
            OrderStatus::Shipped => Some(ViewAction::ConfirmDelivery),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// Run this view's action on one of its orders
    pub async fn perform(&self, store: &OrderStore, id: &OrderId) -> Result<MutationOutcome, ViewError> {
        let action = self.action().ok_or(ViewError::NoAction(self.status))?;

        let actual = store
            .snapshot()
            .find(id)
            .map(|o| o.status)
            .ok_or_else(|| ViewError::UnknownOrder(id.clone()))?;
        if actual != self.status {
            return Err(ViewError::NotInView {
                id: id.clone(),
                view: self.status,
                actual,
            });
        }

        Ok(store.apply_command(id, action.command()).await?)
    }
}
