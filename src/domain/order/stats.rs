use serde::Serialize;
use std::collections::BTreeMap;

use super::aggregate::Order;
use super::value_objects::OrderStatus;

/// Aggregate figures for the analytics view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_marketplace: BTreeMap<&'static str, usize>,
    pub total_revenue: f64,
    pub average_order_value: f64,
}

impl OrderStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut by_status: BTreeMap<&'static str, usize> =
            OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut by_marketplace = BTreeMap::new();
        let mut total_revenue = 0.0;

        for order in orders {
            *by_status.entry(order.status.as_str()).or_default() += 1;
            *by_marketplace.entry(order.marketplace.as_str()).or_default() += 1;
            total_revenue += order.total;
        }

        let average_order_value = if orders.is_empty() {
            0.0
        } else {
            total_revenue / orders.len() as f64
        };

        Self {
            total_orders: orders.len(),
            by_status,
            by_marketplace,
            total_revenue,
            average_order_value,
        }
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures;

    #[test]
    fn test_empty_collection() {
        let stats = OrderStats::from_orders(&[]);
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.average_order_value, 0.0);
        assert_eq!(stats.count(OrderStatus::Pending), 0);
        assert_eq!(stats.by_status.len(), 6);
    }

    #[test]
    fn test_counts_and_revenue() {
        let orders = vec![
            fixtures::sample_order("a", OrderStatus::Pending),
            fixtures::sample_order("b", OrderStatus::Pending),
            fixtures::sample_order("c", OrderStatus::Delivered),
        ];
        let stats = OrderStats::from_orders(&orders);

        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.count(OrderStatus::Pending), 2);
        assert_eq!(stats.count(OrderStatus::Delivered), 1);
        assert_eq!(stats.by_marketplace.get("Rappi"), Some(&3));
        assert!((stats.total_revenue - 3.0 * orders[0].total).abs() < 1e-9);
        assert!((stats.average_order_value - orders[0].total).abs() < 1e-9);
    }
}
