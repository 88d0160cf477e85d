//! Order state machines.
//!
//! Two independent graphs:
//!
//! ```text
//! status:   draft -> confirmed -> processing -> shipped -> delivered
//!           (any of draft/confirmed/processing/shipped) -> cancelled
//!
//! payment:  pending -> partial -> paid -> refunded
//!                      partial ---------> refunded
//! ```
//!
//! `delivered`, `cancelled` and `refunded` are terminal. The only side effect
//! coupled to a transition is the stock release on entering `cancelled`,
//! which the caller learns about through [`StatusTransition::Cancel`].

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Draft,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Returns `true` if `next` is an edge of the status graph.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Draft, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Draft | Confirmed | Processing | Shipped, Cancelled)
        )
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidInput(format!(
                "invalid order status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] =
        [Self::Pending, Self::Partial, Self::Paid, Self::Refunded];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }

    /// Returns `true` if `next` is an edge of the payment graph.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Partial) | (Partial, Paid) | (Paid, Refunded) | (Partial, Refunded)
        )
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            other => Err(EngineError::InvalidInput(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

/// What the caller has to do to apply a validated status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTransition {
    /// Plain status update.
    Advance(OrderStatus),
    /// Status update plus a stock release for every line item.
    Cancel,
    /// Cancelling an already cancelled order: nothing to write.
    NoOp,
}

/// Validates `from -> to` on the status graph.
pub fn plan_status_transition(
    from: OrderStatus,
    to: OrderStatus,
) -> ResultEngine<StatusTransition> {
    if from == OrderStatus::Cancelled && to == OrderStatus::Cancelled {
        return Ok(StatusTransition::NoOp);
    }
    if !from.can_transition_to(to) {
        return Err(EngineError::InvalidStatusTransition(format!(
            "{} -> {}",
            from.as_str(),
            to.as_str()
        )));
    }
    if to == OrderStatus::Cancelled {
        return Ok(StatusTransition::Cancel);
    }
    Ok(StatusTransition::Advance(to))
}

/// Validates `from -> to` on the payment graph.
pub fn check_payment_transition(from: PaymentStatus, to: PaymentStatus) -> ResultEngine<()> {
    if !from.can_transition_to(to) {
        return Err(EngineError::InvalidPaymentTransition(format!(
            "{} -> {}",
            from.as_str(),
            to.as_str()
        )));
    }
    Ok(())
}

/// Hard deletion is only allowed for drafts.
pub fn check_deletable(status: OrderStatus) -> ResultEngine<()> {
    if status != OrderStatus::Draft {
        return Err(EngineError::OrderNotDeletable(format!(
            "order is {}; cancel it instead",
            status.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::OrderStatus::*;

    const STATUS_EDGES: [(OrderStatus, OrderStatus); 8] = [
        (Draft, Confirmed),
        (Confirmed, Processing),
        (Processing, Shipped),
        (Shipped, Delivered),
        (Draft, Cancelled),
        (Confirmed, Cancelled),
        (Processing, Cancelled),
        (Shipped, Cancelled),
    ];

    #[test]
    fn status_graph_matches_edge_list() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = STATUS_EDGES.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{} -> {}",
                    from.as_str(),
                    to.as_str()
                );
            }
        }
    }

    #[test]
    fn rejected_status_edges_report_invalid_transition() {
        for (from, to) in [
            (Delivered, Shipped),
            (Cancelled, Confirmed),
            (Delivered, Processing),
            (Delivered, Cancelled),
            (Draft, Shipped),
            (Confirmed, Confirmed),
        ] {
            let err = plan_status_transition(from, to).unwrap_err();
            assert_eq!(err.kind(), "INVALID_STATUS_TRANSITION");
        }
    }

    #[test]
    fn cancelling_plans_release_once() {
        assert_eq!(
            plan_status_transition(Confirmed, Cancelled).unwrap(),
            StatusTransition::Cancel
        );
        assert_eq!(
            plan_status_transition(Cancelled, Cancelled).unwrap(),
            StatusTransition::NoOp
        );
        assert_eq!(
            plan_status_transition(Draft, Confirmed).unwrap(),
            StatusTransition::Advance(Confirmed)
        );
    }

    #[test]
    fn payment_graph() {
        use super::PaymentStatus::*;
        let edges = [
            (Pending, Partial),
            (Partial, Paid),
            (Paid, Refunded),
            (Partial, Refunded),
        ];
        for from in PaymentStatus::ALL {
            for to in PaymentStatus::ALL {
                let result = check_payment_transition(from, to);
                if edges.contains(&(from, to)) {
                    assert!(result.is_ok());
                } else {
                    assert_eq!(result.unwrap_err().kind(), "INVALID_PAYMENT_TRANSITION");
                }
            }
        }
    }

    #[test]
    fn only_drafts_are_deletable() {
        assert!(check_deletable(Draft).is_ok());
        for status in [Confirmed, Processing, Shipped, Delivered, Cancelled] {
            assert_eq!(
                check_deletable(status).unwrap_err().kind(),
                "ORDER_NOT_DELETABLE"
            );
        }
    }
}
