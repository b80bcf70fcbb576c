use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::value_objects::OrderStatus;

// ============================================================================
// Status Transition Table
// ============================================================================
//
//   pending ──► confirmed ──► preparing ──► shipped ──► delivered
//      │            │             │            │
//      └────────────┴─────────────┴────────────┴──────► cancelled
//
// delivered and cancelled are terminal.
//
// ============================================================================

/// How strictly status writes are checked against the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any status may overwrite any other status
    #[default]
    Permissive,
    /// Only transitions listed in the table are accepted
    Enforced,
}

impl std::str::FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "enforced" => Ok(TransitionPolicy::Enforced),
            other => Err(format!("unknown transition policy: {}", other)),
        }
    }
}

/// Targets reachable from `from` under the enforced table
pub fn allowed_targets(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;

    match from {
        Pending => &[Confirmed, Cancelled],
        Confirmed => &[Preparing, Cancelled],
        Preparing => &[Shipped, Cancelled],
        Shipped => &[Delivered, Cancelled],
        Delivered | Cancelled => &[],
    }
}

impl TransitionPolicy {
    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        match self {
            TransitionPolicy::Permissive => Ok(()),
            TransitionPolicy::Enforced => {
                if from == to {
                    return Err(OrderError::AlreadyInStatus(from));
                }
                if allowed_targets(from).contains(&to) {
                    Ok(())
                } else {
                    Err(OrderError::IllegalTransition { from, to })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::value_objects::OrderStatus::*;

    #[test]
    fn test_enforced_accepts_forward_path() {
        let policy = TransitionPolicy::Enforced;
        assert!(policy.check(Pending, Confirmed).is_ok());
        assert!(policy.check(Confirmed, Preparing).is_ok());
        assert!(policy.check(Preparing, Shipped).is_ok());
        assert!(policy.check(Shipped, Delivered).is_ok());
    }

    #[test]
    fn test_enforced_cancel_only_from_non_terminal() {
        let policy = TransitionPolicy::Enforced;
        for from in OrderStatus::ALL {
            let result = policy.check(from, Cancelled);
            assert_eq!(result.is_ok(), !from.is_terminal(), "from {}", from);
        }
    }

    #[test]
    fn test_enforced_rejects_backwards_and_skips() {
        let policy = TransitionPolicy::Enforced;
        assert_eq!(
            policy.check(Delivered, Pending),
            Err(OrderError::IllegalTransition { from: Delivered, to: Pending })
        );
        assert!(policy.check(Pending, Shipped).is_err());
        assert_eq!(policy.check(Shipped, Shipped), Err(OrderError::AlreadyInStatus(Shipped)));
    }

    #[test]
    fn test_permissive_accepts_everything() {
        let policy = TransitionPolicy::Permissive;
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert!(policy.check(from, to).is_ok());
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_targets() {
        assert!(allowed_targets(Delivered).is_empty());
        assert!(allowed_targets(Cancelled).is_empty());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Enforced".parse::<TransitionPolicy>(), Ok(TransitionPolicy::Enforced));
        assert!("strict".parse::<TransitionPolicy>().is_err());
    }
}
