use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::transitions::TransitionPolicy;
use super::value_objects::{Customer, DeliveryAddress, Marketplace, OrderId, OrderItem, OrderStatus, Restaurant};

// ============================================================================
// Order - the unit tracked through the lifecycle
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: OrderId,
    pub order_number: String,
    pub marketplace: Marketplace,

    // Lifecycle
    pub status: OrderStatus,

    // Snapshot taken at creation
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    pub payment_method: String,
    pub order_date: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub delivery_fee: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub restaurant: Restaurant,

    /// Stored as received; not derived from `items`
    pub total: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// An order as handed over by marketplace ingestion, before it gets an id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub marketplace: Marketplace,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    pub payment_method: String,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
    pub estimated_delivery: DateTime<Utc>,
    #[serde(default)]
    pub delivery_fee: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub restaurant: Restaurant,
    /// Defaults to the sum of the line items when absent
    #[serde(default)]
    pub total: Option<f64>,
}

impl Order {
    /// Build a pending order from an ingested payload.
    ///
    /// `sequence` feeds the human readable order number (`ORD-000042`).
    pub fn from_new(new: NewOrder, sequence: u64) -> Result<Self, OrderError> {
        validate_items(&new.items)?;

        let items_total: f64 = new.items.iter().map(OrderItem::line_total).sum();
        let total = new.total.unwrap_or(items_total);

        Ok(Self {
            id: OrderId::new(Uuid::new_v4().to_string()),
            order_number: format!("ORD-{:06}", sequence),
            marketplace: new.marketplace,
            status: OrderStatus::Pending,
            customer: new.customer,
            items: new.items,
            delivery_address: new.delivery_address,
            payment_method: new.payment_method,
            order_date: new.order_date.unwrap_or_else(Utc::now),
            estimated_delivery: new.estimated_delivery,
            delivery_fee: new.delivery_fee,
            notes: new.notes,
            restaurant: new.restaurant,
            total,
            delivered_at: None,
        })
    }

    pub fn items_total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Compares the stored total with the line items at cent precision
    pub fn total_matches_items(&self) -> bool {
        to_cents(self.total) == to_cents(self.items_total())
    }

    /// Decide which status a command leads to, without touching the order.
    ///
    /// Returns `Ok(None)` when the order already has the target status and
    /// the policy lets the write through as a no-op.
    pub fn handle_command(
        &self,
        command: &OrderCommand,
        policy: TransitionPolicy,
    ) -> Result<Option<OrderStatus>, OrderError> {
        let target = command.target_status();
        policy.check(self.status, target)?;

        if target == self.status {
            Ok(None)
        } else {
            Ok(Some(target))
        }
    }

    pub fn apply_status(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.delivered_at = match status {
            OrderStatus::Delivered => Some(at),
            _ => None,
        };
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyItems);
    }

    for item in items {
        if item.quantity <= 0 {
            return Err(OrderError::InvalidQuantity(item.quantity));
        }
        if item.price.is_nan() || item.price < 0.0 {
            return Err(OrderError::InvalidPrice(item.price));
        }
    }

    Ok(())
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures;

    fn new_order(items: Vec<OrderItem>) -> NewOrder {
        let template = fixtures::sample_order("t-1", OrderStatus::Pending);
        NewOrder {
            marketplace: Marketplace::Keeta,
            customer: template.customer,
            items,
            delivery_address: template.delivery_address,
            payment_method: "PIX".to_string(),
            order_date: None,
            estimated_delivery: template.estimated_delivery,
            delivery_fee: 4.0,
            notes: None,
            restaurant: template.restaurant,
            total: None,
        }
    }

    fn item(quantity: i32, price: f64) -> OrderItem {
        OrderItem {
            name: "Açaí 500ml".to_string(),
            quantity,
            price,
            description: None,
            observations: None,
        }
    }

    #[test]
    fn test_from_new_assigns_identity_and_pending() {
        let order = Order::from_new(new_order(vec![item(2, 10.5)]), 42).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_number, "ORD-000042");
        assert!(!order.id.as_str().is_empty());
        assert!((order.total - 21.0).abs() < 1e-9);
        assert!(order.total_matches_items());
    }

    #[test]
    fn test_from_new_rejects_bad_items() {
        assert_eq!(
            Order::from_new(new_order(vec![]), 1).unwrap_err(),
            OrderError::EmptyItems
        );
        assert_eq!(
            Order::from_new(new_order(vec![item(0, 3.0)]), 1).unwrap_err(),
            OrderError::InvalidQuantity(0)
        );
        assert!(matches!(
            Order::from_new(new_order(vec![item(1, -1.0)]), 1),
            Err(OrderError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_stored_total_is_independent_of_items() {
        let mut payload = new_order(vec![item(1, 10.0)]);
        payload.total = Some(99.0);
        let order = Order::from_new(payload, 1).unwrap();

        assert_eq!(order.total, 99.0);
        assert!(!order.total_matches_items());
    }

    #[test]
    fn test_handle_command_permissive_allows_backwards() {
        let order = fixtures::sample_order("1", OrderStatus::Delivered);
        let target = order
            .handle_command(&OrderCommand::SetStatus(OrderStatus::Pending), TransitionPolicy::Permissive)
            .unwrap();
        assert_eq!(target, Some(OrderStatus::Pending));
    }

    #[test]
    fn test_handle_command_enforced_rejects_backwards() {
        let order = fixtures::sample_order("1", OrderStatus::Delivered);
        let err = order
            .handle_command(&OrderCommand::SetStatus(OrderStatus::Pending), TransitionPolicy::Enforced)
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::IllegalTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending
            }
        );
    }

    #[test]
    fn test_handle_command_same_status_is_noop_when_permissive() {
        let order = fixtures::sample_order("1", OrderStatus::Confirmed);
        let target = order
            .handle_command(&OrderCommand::Accept, TransitionPolicy::Permissive)
            .unwrap();
        assert_eq!(target, None);
    }

    #[test]
    fn test_apply_status_stamps_delivery() {
        let mut order = fixtures::sample_order("1", OrderStatus::Shipped);
        let now = Utc::now();
        order.apply_status(OrderStatus::Delivered, now);

        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.delivered_at, Some(now));
    }

    #[test]
    fn test_moving_off_delivered_clears_delivery_stamp() {
        let mut order = fixtures::sample_order("1", OrderStatus::Shipped);
        order.apply_status(OrderStatus::Delivered, Utc::now());
        order.apply_status(OrderStatus::Pending, Utc::now());

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.delivered_at, None);
    }

    #[test]
    fn test_order_json_is_camel_case() {
        let order = fixtures::sample_order("7", OrderStatus::Pending);
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["id"], "7");
        assert_eq!(json["status"], "pending");
        assert!(json.get("orderNumber").is_some());
        assert!(json["deliveryAddress"].get("zipCode").is_some());
        assert!(json.get("deliveredAt").is_none());
    }
}
