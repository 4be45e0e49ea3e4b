//! # otdash-core
//!
//! Core domain model for the otdash work-order dashboard.
//!
//! This crate provides:
//! - Domain types: `WorkOrder`, `ProcessStep`, `Dataset`
//! - The delivery-status classifier and rework / hours-deviation derivations
//! - Filters, metrics and the `DashboardReport` consumed by renderers
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use otdash_core::{Dataset, DashboardReport, StatusPolicy, WorkOrder};
//!
//! let mut dataset = Dataset::default();
//! dataset.orders.rows.push(
//!     WorkOrder::new("1001")
//!         .client("ACME")
//!         .status("EN PROCESO")
//!         .delivery(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()),
//! );
//!
//! let now = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let report = DashboardReport::build("Adimatec", dataset, now, &StatusPolicy::default());
//! assert_eq!(report.metrics.due_soon, 1);
//! ```

pub mod classify;
pub mod filter;
pub mod metrics;
pub mod names;
pub mod report;

pub use classify::{classify_delivery, is_rework, DeliveryState, DeviationKind, HoursDeviation};
pub use filter::{FilterOptions, FilterSet};
pub use metrics::{Breakdowns, CountRow, CriticalOrder, DashboardMetrics, HoursSummary, ProcessHours, ProcessTotals};
pub use names::clean_name;
pub use report::{DashboardReport, DerivedOrder};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Column names
// ============================================================================

/// Column names as exported by the production spreadsheet
pub mod columns {
    pub const OT: &str = "ot";
    pub const DESCRIPTION: &str = "descripcion";
    pub const CLIENT: &str = "cliente";
    pub const STATUS: &str = "estatus";
    pub const DELIVERY_DATE: &str = "fecha_entrega";
    pub const PRINT_DATE: &str = "fecha_impresion";
    pub const FINISH_DATE: &str = "fecha_terminado";
    pub const DELIVERED_DATE: &str = "fecha_entregada";
    pub const ORDER_ESTIMATED_HOURS: &str = "horas_estimadas_ot";
    pub const ORDER_ACTUAL_HOURS: &str = "horas_reales_ot";
    pub const PURCHASE_ORDER: &str = "orden_compra";

    pub const STEP_ESTIMATED_HOURS: &str = "horas_estimadas";
    pub const STEP_ACTUAL_HOURS: &str = "horas_reales";
    pub const EMPLOYEE_1: &str = "empleado_1";
    pub const EMPLOYEE_2: &str = "empleado_2";
    pub const START_1: &str = "fecha_inicio_1";
    pub const START_2: &str = "fecha_inicio_2";

    /// Accepted spellings of the process-name column, in lookup order
    pub const PROCESS_ALIASES: [&str; 5] =
        ["proceso", "Proceso", "PROCESO", "proceso_nombre", "Proceso_Nombre"];

    /// Derived columns appended on export
    pub const DELIVERY_STATE: &str = "estado_entrega";
    pub const REWORK: &str = "es_reproceso";
    pub const HOURS_DIFF: &str = "diferencia_horas";
}

/// Unique identifier for a work order (the `ot` column)
pub type OrderId = String;

// ============================================================================
// Status policy
// ============================================================================

/// Business rules that drive classification and metrics.
///
/// Status comparisons trim whitespace and ignore ASCII case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPolicy {
    /// Statuses that count as finished; these are never overdue
    pub completed: Vec<String>,
    /// Status that marks an order as billed
    pub billed: String,
    /// Status that marks an order as in production
    pub in_process: String,
    /// Marker searched in the purchase-order text to detect rework
    pub rework_marker: String,
    /// Width of the due-soon window in days
    pub due_soon_days: i64,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            completed: vec!["FACTURADO".into(), "OK".into(), "OK NO ENTREGADO".into()],
            billed: "FACTURADO".into(),
            in_process: "EN PROCESO".into(),
            rework_marker: "GARANTIA".into(),
            due_soon_days: 7,
        }
    }
}

impl StatusPolicy {
    /// Whether `status` belongs to the completed set
    pub fn is_completed(&self, status: Option<&str>) -> bool {
        status.is_some_and(|s| self.completed.iter().any(|c| status_eq(c, s)))
    }

    pub fn is_billed(&self, status: Option<&str>) -> bool {
        status.is_some_and(|s| status_eq(&self.billed, s))
    }

    pub fn is_in_process(&self, status: Option<&str>) -> bool {
        status.is_some_and(|s| status_eq(&self.in_process, s))
    }
}

fn status_eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

// ============================================================================
// Work order
// ============================================================================

/// A row of the work-order master table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: OrderId,
    pub description: Option<String>,
    pub client: Option<String>,
    pub status: Option<String>,
    pub delivery_date: Option<NaiveDateTime>,
    pub print_date: Option<NaiveDateTime>,
    pub finish_date: Option<NaiveDateTime>,
    pub delivered_date: Option<NaiveDateTime>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub purchase_order: Option<String>,
    /// Raw cells in source column order, kept for full-table exports
    #[serde(skip)]
    pub raw: Vec<String>,
}

impl WorkOrder {
    pub fn new(id: impl Into<OrderId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Set the delivery date (midnight)
    pub fn delivery(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(date.and_time(chrono::NaiveTime::MIN));
        self
    }

    pub fn hours(mut self, estimated: f64, actual: f64) -> Self {
        self.estimated_hours = Some(estimated);
        self.actual_hours = Some(actual);
        self
    }

    pub fn purchase_order(mut self, po: impl Into<String>) -> Self {
        self.purchase_order = Some(po.into());
        self
    }
}

/// The work-order master table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkOrderTable {
    /// Source column headers, in order
    pub headers: Vec<String>,
    pub rows: Vec<WorkOrder>,
}

impl WorkOrderTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether rework can be detected at all.
    ///
    /// Tables built in code carry no headers and are treated as complete.
    pub fn has_purchase_orders(&self) -> bool {
        self.has_column(columns::PURCHASE_ORDER) || self.headers.is_empty()
    }

    /// Whether hours deviation can be computed at all
    pub fn has_order_hours(&self) -> bool {
        (self.has_column(columns::ORDER_ESTIMATED_HOURS) && self.has_column(columns::ORDER_ACTUAL_HOURS))
            || self.headers.is_empty()
    }
}

// ============================================================================
// Process step
// ============================================================================

/// A row of the process-steps table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub order_id: OrderId,
    pub process: Option<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub employee_1: Option<String>,
    pub employee_2: Option<String>,
    pub start_1: Option<NaiveDateTime>,
    pub start_2: Option<NaiveDateTime>,
    #[serde(skip)]
    pub raw: Vec<String>,
}

impl ProcessStep {
    pub fn new(order_id: impl Into<OrderId>) -> Self {
        Self {
            order_id: order_id.into(),
            ..Self::default()
        }
    }

    pub fn process(mut self, name: impl Into<String>) -> Self {
        self.process = Some(name.into());
        self
    }

    pub fn hours(mut self, estimated: f64, actual: f64) -> Self {
        self.estimated_hours = Some(estimated);
        self.actual_hours = Some(actual);
        self
    }

    pub fn employees(mut self, first: Option<&str>, second: Option<&str>) -> Self {
        self.employee_1 = first.map(String::from);
        self.employee_2 = second.map(String::from);
        self
    }

    /// Whether either employee field matches `name` after cleanup
    pub fn worked_by(&self, name: &str) -> bool {
        [&self.employee_1, &self.employee_2]
            .into_iter()
            .filter_map(|e| clean_name(e.as_deref()))
            .any(|e| e == name)
    }
}

/// The process-steps table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessTable {
    pub headers: Vec<String>,
    /// Header holding the process name, if any alias was found
    pub process_column: Option<String>,
    pub rows: Vec<ProcessStep>,
}

impl ProcessTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Both tables, as loaded or after filtering
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub orders: WorkOrderTable,
    pub processes: ProcessTable,
}

impl Dataset {
    pub fn new(orders: WorkOrderTable, processes: ProcessTable) -> Self {
        Self { orders, processes }
    }

    /// Keep only process steps whose work order survived in the order table
    pub fn retain_steps_of_orders(&mut self) {
        let ids: std::collections::HashSet<&str> =
            self.orders.rows.iter().map(|o| o.id.as_str()).collect();
        self.processes.rows.retain(|s| ids.contains(s.order_id.as_str()));
    }

    /// Keep only work orders referenced by a remaining process step
    pub fn retain_orders_of_steps(&mut self) {
        let ids: std::collections::HashSet<&str> =
            self.processes.rows.iter().map(|s| s.order_id.as_str()).collect();
        self.orders.rows.retain(|o| ids.contains(o.id.as_str()));
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a dashboard report to the output format
    fn render(&self, report: &DashboardReport) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
