//! Dashboard metrics
//!
//! Aggregates answer the question "how is production doing right now?" for
//! the currently filtered orders:
//!
//! - **DashboardMetrics**: headline counts and percentages
//! - **HoursSummary**: estimated vs actual hours at work-order level
//! - **Breakdowns**: per-state, per-client, per-status and per-process tables
//!
//! Every percentage is 0 when its denominator is 0.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{DeliveryState, DeviationKind, ProcessTable, StatusPolicy, WorkOrderTable};
use crate::report::DerivedOrder;

/// Number of critical orders listed in reports
pub const CRITICAL_ORDERS: usize = 5;

/// Number of processes shown in the "top" rankings
pub const TOP_PROCESSES: usize = 10;

pub(crate) fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

// ============================================================================
// Headline metrics
// ============================================================================

/// Hours deviation totals over orders with both estimated and actual hours
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HoursSummary {
    /// Orders that have both hour values
    pub orders_with_hours: usize,
    /// Σ estimated hours
    pub scheduled_hours: f64,
    /// Σ actual hours of orders finished within estimate
    pub positive_hours: f64,
    /// Σ actual hours of orders over estimate
    pub negative_hours: f64,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub positive_orders: usize,
    pub negative_orders: usize,
}

/// Headline numbers of the dashboard
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_orders: usize,
    pub in_process: usize,
    pub billed: usize,
    pub pending_billing: usize,
    pub billed_pct: f64,
    pub overdue: usize,
    pub due_soon: usize,
    pub on_time: usize,
    pub completed: usize,
    pub rework: usize,
    pub rework_pct: f64,
    pub hours: HoursSummary,
}

impl DashboardMetrics {
    /// Compute metrics for `orders`, whose derivations are in `derived` (same order)
    pub fn compute(orders: &WorkOrderTable, derived: &[DerivedOrder], policy: &StatusPolicy) -> Self {
        let total_orders = orders.len();
        let in_process = orders
            .rows
            .iter()
            .filter(|o| policy.is_in_process(o.status.as_deref()))
            .count();
        let billed = orders.rows.iter().filter(|o| policy.is_billed(o.status.as_deref())).count();

        let count_state = |state: DeliveryState| derived.iter().filter(|d| d.state == state).count();

        let rework = if orders.has_purchase_orders() {
            derived.iter().filter(|d| d.rework).count()
        } else {
            0
        };

        let hours = if orders.has_order_hours() {
            hours_summary(derived)
        } else {
            HoursSummary::default()
        };

        Self {
            total_orders,
            in_process,
            billed,
            pending_billing: total_orders - billed,
            billed_pct: percent(billed as f64, total_orders as f64),
            overdue: count_state(DeliveryState::Overdue),
            due_soon: count_state(DeliveryState::DueSoon),
            on_time: count_state(DeliveryState::OnTime),
            completed: count_state(DeliveryState::Completed),
            rework,
            rework_pct: percent(rework as f64, total_orders as f64),
            hours,
        }
    }
}

fn hours_summary(derived: &[DerivedOrder]) -> HoursSummary {
    let mut summary = HoursSummary::default();
    for dev in derived.iter().filter_map(|d| d.deviation) {
        summary.orders_with_hours += 1;
        summary.scheduled_hours += dev.estimated;
        match dev.kind {
            DeviationKind::Positive => {
                summary.positive_orders += 1;
                summary.positive_hours += dev.actual;
            }
            DeviationKind::Negative => {
                summary.negative_orders += 1;
                summary.negative_hours += dev.actual;
            }
        }
    }
    summary.positive_pct = percent(summary.positive_hours, summary.scheduled_hours);
    summary.negative_pct = percent(summary.negative_hours, summary.scheduled_hours);
    summary
}

// ============================================================================
// Breakdowns
// ============================================================================

/// A labelled count, one bar or slice of a chart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub label: String,
    pub count: usize,
}

/// Work order running over its hour estimate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalOrder {
    pub id: String,
    pub client: Option<String>,
    pub estimated: f64,
    pub actual: f64,
    pub difference: f64,
}

/// Hours aggregated per process name
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessHours {
    pub process: String,
    pub estimated: f64,
    pub actual: f64,
    /// `actual - estimated`
    pub difference: f64,
    /// `estimated / actual * 100`; `None` when nothing was logged
    pub efficiency: Option<f64>,
}

/// Hours over all process steps
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessTotals {
    pub estimated: f64,
    pub actual: f64,
    pub difference: f64,
    /// `estimated / actual * 100`, 0 when either total is 0
    pub efficiency: f64,
}

/// Chart and table data derived from the filtered dataset
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdowns {
    pub by_state: Vec<CountRow>,
    pub by_client: Vec<CountRow>,
    pub by_status: Vec<CountRow>,
    /// Most frequent processes, at most [`TOP_PROCESSES`]
    pub top_processes: Vec<CountRow>,
    /// Processes with the most estimated hours, at most [`TOP_PROCESSES`]
    pub top_process_hours: Vec<ProcessHours>,
    /// Every process, sorted by efficiency (highest first)
    pub process_efficiency: Vec<ProcessHours>,
    pub process_totals: ProcessTotals,
    /// Orders with the largest overruns, at most [`CRITICAL_ORDERS`]
    pub critical_orders: Vec<CriticalOrder>,
}

impl Breakdowns {
    pub fn compute(orders: &WorkOrderTable, derived: &[DerivedOrder], processes: &ProcessTable) -> Self {
        let by_state = DeliveryState::ALL
            .iter()
            .map(|state| CountRow {
                label: state.as_str().to_string(),
                count: derived.iter().filter(|d| d.state == *state).count(),
            })
            .filter(|row| row.count > 0)
            .collect();

        let by_client = value_counts(orders.rows.iter().filter_map(|o| o.client.as_deref()));
        let by_status = value_counts(orders.rows.iter().filter_map(|o| o.status.as_deref()));

        let mut top_processes = value_counts(processes.rows.iter().filter_map(|s| s.process.as_deref()));
        top_processes.truncate(TOP_PROCESSES);

        let process_hours = process_hours(processes);

        let mut top_process_hours = process_hours.clone();
        top_process_hours.sort_by(|a, b| b.estimated.total_cmp(&a.estimated));
        top_process_hours.truncate(TOP_PROCESSES);

        let mut process_efficiency = process_hours;
        process_efficiency.sort_by(|a, b| match (a.efficiency, b.efficiency) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        Self {
            by_state,
            by_client,
            by_status,
            top_processes,
            top_process_hours,
            process_efficiency,
            process_totals: process_totals(processes),
            critical_orders: critical_orders(orders, derived),
        }
    }
}

/// Count occurrences, most frequent first, ties by label
fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<CountRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut rows: Vec<CountRow> = counts
        .into_iter()
        .map(|(label, count)| CountRow {
            label: label.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}

fn process_hours(processes: &ProcessTable) -> Vec<ProcessHours> {
    let mut grouped: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for step in &processes.rows {
        let Some(name) = step.process.as_deref() else {
            continue;
        };
        let entry = grouped.entry(name).or_default();
        entry.0 += step.estimated_hours.unwrap_or(0.0);
        entry.1 += step.actual_hours.unwrap_or(0.0);
    }
    grouped
        .into_iter()
        .map(|(process, (estimated, actual))| ProcessHours {
            process: process.to_string(),
            estimated,
            actual,
            difference: actual - estimated,
            efficiency: (actual != 0.0).then(|| estimated / actual * 100.0),
        })
        .collect()
}

fn process_totals(processes: &ProcessTable) -> ProcessTotals {
    let estimated: f64 = processes.rows.iter().filter_map(|s| s.estimated_hours).sum();
    let actual: f64 = processes.rows.iter().filter_map(|s| s.actual_hours).sum();
    let efficiency = if estimated > 0.0 { percent(estimated, actual) } else { 0.0 };
    ProcessTotals {
        estimated,
        actual,
        difference: actual - estimated,
        efficiency,
    }
}

/// Every order over its hour estimate, in source order
pub fn overrun_orders(orders: &WorkOrderTable, derived: &[DerivedOrder]) -> Vec<CriticalOrder> {
    orders
        .rows
        .iter()
        .zip(derived)
        .filter_map(|(order, d)| {
            let dev = d.deviation.filter(|dev| dev.kind == DeviationKind::Negative)?;
            Some(CriticalOrder {
                id: order.id.clone(),
                client: order.client.clone(),
                estimated: dev.estimated,
                actual: dev.actual,
                difference: dev.difference,
            })
        })
        .collect()
}

fn critical_orders(orders: &WorkOrderTable, derived: &[DerivedOrder]) -> Vec<CriticalOrder> {
    let mut rows = overrun_orders(orders, derived);
    // Stable sort keeps source order among equal overruns
    rows.sort_by(|a, b| b.difference.total_cmp(&a.difference));
    rows.truncate(CRITICAL_ORDERS);
    rows
}
