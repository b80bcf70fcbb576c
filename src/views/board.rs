use serde::Serialize;

use crate::domain::order::{Order, OrderId, OrderStatus};

use super::status_view::{StatusView, ViewAction};

// ============================================================================
// View Board - the six status views side by side
// ============================================================================
//
// Each view keeps its own selection; nothing else is shared between them
// beyond the order collection they are rendered from.
//
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ActionInfo {
    pub action: ViewAction,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPage {
    pub status: OrderStatus,
    pub title: &'static str,
    pub description: &'static str,
    pub count: usize,
    pub orders: Vec<Order>,
    pub selected: Option<Order>,
    pub action: Option<ActionInfo>,
}

fn heading(status: OrderStatus) -> (&'static str, &'static str) {
    match status {
        OrderStatus::Pending => ("Pending", "Waiting for confirmation"),
        OrderStatus::Confirmed => ("Confirmed", "Ready to prepare"),
        OrderStatus::Preparing => ("Preparing", "In the kitchen"),
        OrderStatus::Shipped => ("Shipped", "On the way to the customer"),
        OrderStatus::Delivered => ("Delivered", "Completed"),
        OrderStatus::Cancelled => ("Cancelled", "Cancelled orders"),
    }
}

pub struct ViewBoard {
    views: Vec<StatusView>,
}

impl Default for ViewBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewBoard {
    pub fn new() -> Self {
        Self {
            views: OrderStatus::ALL.iter().map(|s| StatusView::new(*s)).collect(),
        }
    }

    pub fn view(&self, status: OrderStatus) -> Option<&StatusView> {
        self.views.iter().find(|v| v.status() == status)
    }

    fn view_mut(&mut self, status: OrderStatus) -> Option<&mut StatusView> {
        self.views.iter_mut().find(|v| v.status() == status)
    }

    /// Render a view against the current collection, reconciling its selection first
    pub fn page(&mut self, status: OrderStatus, orders: &[Order]) -> Option<ViewPage> {
        let view = self.view_mut(status)?;
        let filtered = view.project(orders);
        let selected_id = view.reconcile(&filtered).cloned();
        let selected = selected_id.and_then(|id| filtered.iter().find(|o| o.id == id).cloned());
        let (title, description) = heading(status);

        Some(ViewPage {
            status,
            title,
            description,
            count: filtered.len(),
            selected,
            action: view.action().map(|action| ActionInfo {
                action,
                label: action.label(),
            }),
            orders: filtered,
        })
    }

    pub fn select(&mut self, status: OrderStatus, id: &OrderId, orders: &[Order]) -> bool {
        match self.view_mut(status) {
            Some(view) => {
                let filtered = view.project(orders);
                view.select(id, &filtered)
            }
            None => false,
        }
    }
}
