//! Delivery-status classification and per-order derivations
//!
//! The classifier is a pure function of the order status and its delivery
//! date relative to a reference instant:
//!
//! | status in completed set | delivery missing | delivery < now | now <= delivery <= now + horizon | otherwise |
//! |-------------------------|------------------|----------------|----------------------------------|-----------|
//! | Completed               | OnTime           | Overdue        | DueSoon                          | OnTime    |
//!
//! The status check always wins over the date comparisons.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::StatusPolicy;

/// Delivery classification of a work order (`estado_entrega`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeliveryState {
    /// Status is in the completed set
    Completed,
    /// Delivery date already passed
    Overdue,
    /// Delivery date falls inside the due-soon window
    DueSoon,
    /// No date, or the date is beyond the window
    OnTime,
}

impl DeliveryState {
    pub const ALL: [DeliveryState; 4] = [
        DeliveryState::Overdue,
        DeliveryState::DueSoon,
        DeliveryState::OnTime,
        DeliveryState::Completed,
    ];

    /// Label used in exported tables and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Completed => "Completada",
            DeliveryState::Overdue => "Vencida",
            DeliveryState::DueSoon => "Por vencer",
            DeliveryState::OnTime => "En plazo",
        }
    }

    /// Chart color
    pub fn color(&self) -> &'static str {
        match self {
            DeliveryState::Completed => "#00CC96",
            DeliveryState::Overdue => "#FF4B4B",
            DeliveryState::DueSoon => "#FFA500",
            DeliveryState::OnTime => "#636EFA",
        }
    }
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify an order's delivery state at `now`.
pub fn classify_delivery(
    status: Option<&str>,
    delivery: Option<NaiveDateTime>,
    now: NaiveDateTime,
    policy: &StatusPolicy,
) -> DeliveryState {
    if policy.is_completed(status) {
        return DeliveryState::Completed;
    }
    let Some(due) = delivery else {
        return DeliveryState::OnTime;
    };
    // a horizon past the calendar range leaves the window open-ended
    let horizon = TimeDelta::try_days(policy.due_soon_days).and_then(|d| now.checked_add_signed(d));
    if due < now {
        DeliveryState::Overdue
    } else if horizon.map_or(true, |h| due <= h) {
        DeliveryState::DueSoon
    } else {
        DeliveryState::OnTime
    }
}

/// Whether a purchase-order reference marks the order as warranty rework.
///
/// Case-insensitive substring match; a missing reference is never rework.
pub fn is_rework(purchase_order: Option<&str>, marker: &str) -> bool {
    match purchase_order {
        Some(po) if !marker.is_empty() => po.to_uppercase().contains(&marker.to_uppercase()),
        _ => false,
    }
}

// ============================================================================
// Hours deviation
// ============================================================================

/// Sign classification of an hours deviation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviationKind {
    /// Actual hours within the estimate (deviation <= 0)
    Positive,
    /// Actual hours over the estimate
    Negative,
}

impl DeviationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviationKind::Positive => "Desviación Positiva",
            DeviationKind::Negative => "Desviación Negativa",
        }
    }
}

/// Estimated vs actual hours of one work order
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoursDeviation {
    pub estimated: f64,
    pub actual: f64,
    /// `actual - estimated`
    pub difference: f64,
    pub kind: DeviationKind,
}

impl HoursDeviation {
    /// Returns `None` unless both values are present
    pub fn from_hours(estimated: Option<f64>, actual: Option<f64>) -> Option<Self> {
        let (estimated, actual) = (estimated?, actual?);
        let difference = actual - estimated;
        let kind = if difference <= 0.0 {
            DeviationKind::Positive
        } else {
            DeviationKind::Negative
        };
        Some(Self {
            estimated,
            actual,
            difference,
            kind,
        })
    }
}
