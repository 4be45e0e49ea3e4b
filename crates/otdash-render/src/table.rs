//! Tabular views of a dashboard report
//!
//! A [`TableView`] is a titled grid of [`Cell`]s. The terminal, Excel and CSV
//! outputs all read from the same views, so a column shown in one is shown
//! the same way in the others.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use otdash_core::{columns, DashboardReport, DeliveryState, ProcessStep, RenderError, WorkOrder};

/// One table cell
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    /// Text as read from the source
    Text(String),
    /// Computed value, shown with one decimal
    Number(f64),
    Percent(f64),
    Bool(bool),
}

impl Cell {
    fn text(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, |s| Cell::Text(s.to_string()))
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }

    fn date(value: Option<NaiveDateTime>) -> Self {
        value.map_or(Cell::Empty, |d| Cell::Text(format_datetime(d)))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) => write!(f, "{n:.1}"),
            Cell::Percent(p) => write!(f, "{p:.1}%"),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
        }
    }
}

/// Dates without a time of day print as `YYYY-MM-DD`
pub fn format_datetime(value: NaiveDateTime) -> String {
    if value.hour() == 0 && value.minute() == 0 && value.second() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// The tables a report can show
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableKind {
    Orders,
    Processes,
    Overdue,
    DueSoon,
    Completed,
    Rework,
    Efficiency,
    Critical,
}

impl TableKind {
    pub const ALL: [TableKind; 8] = [
        TableKind::Orders,
        TableKind::Processes,
        TableKind::Overdue,
        TableKind::DueSoon,
        TableKind::Completed,
        TableKind::Rework,
        TableKind::Efficiency,
        TableKind::Critical,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            TableKind::Orders => "Tabla OT Master",
            TableKind::Processes => "Tabla Procesos",
            TableKind::Overdue => "OTs Vencidas (Solo Activas)",
            TableKind::DueSoon => "OTs por Vencer (Solo Activas)",
            TableKind::Completed => "OTs Completadas",
            TableKind::Rework => "Detalle de Reprocesos (OTs con Garantía)",
            TableKind::Efficiency => "Análisis de Eficiencia por Proceso",
            TableKind::Critical => "OTs con Desviaciones Negativas",
        }
    }
}

/// A titled grid ready for display or export
#[derive(Clone, Debug, PartialEq)]
pub struct TableView {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build the requested table from a report
    pub fn build(report: &DashboardReport, kind: TableKind) -> Self {
        let mut view = match kind {
            TableKind::Orders => order_columns(
                report,
                report.dataset.orders.rows.iter(),
                &[
                    columns::OT,
                    columns::DESCRIPTION,
                    columns::CLIENT,
                    columns::STATUS,
                    columns::DELIVERY_DATE,
                    columns::ORDER_ESTIMATED_HOURS,
                    columns::ORDER_ACTUAL_HOURS,
                ],
            ),
            TableKind::Processes => process_view(report),
            TableKind::Overdue => order_columns(
                report,
                report.orders_in(DeliveryState::Overdue),
                &[columns::OT, columns::CLIENT, columns::DELIVERY_DATE, columns::STATUS],
            ),
            TableKind::DueSoon => order_columns(
                report,
                report.orders_in(DeliveryState::DueSoon),
                &[columns::OT, columns::CLIENT, columns::DELIVERY_DATE, columns::STATUS],
            ),
            TableKind::Completed => order_columns(
                report,
                report.orders_in(DeliveryState::Completed),
                &[
                    columns::OT,
                    columns::CLIENT,
                    columns::DELIVERY_DATE,
                    columns::STATUS,
                    columns::FINISH_DATE,
                ],
            ),
            TableKind::Rework => order_columns(
                report,
                report.rework_orders(),
                &[columns::OT, columns::CLIENT, columns::PURCHASE_ORDER, columns::STATUS],
            ),
            TableKind::Efficiency => efficiency_view(report),
            TableKind::Critical => critical_view(report),
        };
        view.title = kind.title().to_string();
        view
    }

    /// Every source column of the order table plus the derived ones
    pub fn full_orders(report: &DashboardReport) -> Self {
        let orders = &report.dataset.orders;
        let (mut headers, mut rows) = if orders.headers.is_empty() {
            let view = order_columns(
                report,
                orders.rows.iter(),
                &[
                    columns::OT,
                    columns::DESCRIPTION,
                    columns::CLIENT,
                    columns::STATUS,
                    columns::DELIVERY_DATE,
                    columns::PRINT_DATE,
                    columns::FINISH_DATE,
                    columns::DELIVERED_DATE,
                    columns::ORDER_ESTIMATED_HOURS,
                    columns::ORDER_ACTUAL_HOURS,
                    columns::PURCHASE_ORDER,
                ],
            );
            (view.headers, view.rows)
        } else {
            let width = orders.headers.len();
            (
                orders.headers.clone(),
                orders.rows.iter().map(|o| raw_cells(&o.raw, width)).collect(),
            )
        };

        headers.push(columns::DELIVERY_STATE.to_string());
        headers.push(columns::REWORK.to_string());
        for (row, derived) in rows.iter_mut().zip(&report.derived) {
            row.push(Cell::Text(derived.state.as_str().to_string()));
            row.push(Cell::Bool(derived.rework));
        }

        TableView {
            title: TableKind::Orders.title().to_string(),
            headers,
            rows,
        }
    }

    /// Every source column of the process table
    pub fn full_processes(report: &DashboardReport) -> Self {
        let processes = &report.dataset.processes;
        if processes.headers.is_empty() {
            return TableView::build(report, TableKind::Processes);
        }
        let width = processes.headers.len();
        TableView {
            title: TableKind::Processes.title().to_string(),
            headers: processes.headers.clone(),
            rows: processes.rows.iter().map(|s| raw_cells(&s.raw, width)).collect(),
        }
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, RenderError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(|c| c.to_string()))
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| RenderError::Format(e.to_string()))
    }
}

/// Filtered work orders with all columns and the derived delivery state and rework flag
pub fn orders_csv(report: &DashboardReport) -> Result<Vec<u8>, RenderError> {
    TableView::full_orders(report).to_csv()
}

/// Filtered process steps with all columns
pub fn processes_csv(report: &DashboardReport) -> Result<Vec<u8>, RenderError> {
    TableView::full_processes(report).to_csv()
}

fn raw_cells(raw: &[String], width: usize) -> Vec<Cell> {
    (0..width)
        .map(|i| match raw.get(i).map(|s| s.as_str()) {
            Some("") | None => Cell::Empty,
            Some(s) => Cell::Text(s.to_string()),
        })
        .collect()
}

fn order_cell(order: &WorkOrder, column: &str) -> Cell {
    match column {
        columns::OT => Cell::Text(order.id.clone()),
        columns::DESCRIPTION => Cell::text(order.description.as_deref()),
        columns::CLIENT => Cell::text(order.client.as_deref()),
        columns::STATUS => Cell::text(order.status.as_deref()),
        columns::DELIVERY_DATE => Cell::date(order.delivery_date),
        columns::PRINT_DATE => Cell::date(order.print_date),
        columns::FINISH_DATE => Cell::date(order.finish_date),
        columns::DELIVERED_DATE => Cell::date(order.delivered_date),
        columns::ORDER_ESTIMATED_HOURS => Cell::number(order.estimated_hours),
        columns::ORDER_ACTUAL_HOURS => Cell::number(order.actual_hours),
        columns::PURCHASE_ORDER => Cell::text(order.purchase_order.as_deref()),
        _ => Cell::Empty,
    }
}

/// Project orders onto the wanted columns the source actually has
fn order_columns<'a>(
    report: &DashboardReport,
    orders: impl Iterator<Item = &'a WorkOrder>,
    wanted: &[&str],
) -> TableView {
    let table = &report.dataset.orders;
    let shown: Vec<&str> = wanted
        .iter()
        .copied()
        .filter(|c| table.headers.is_empty() || table.has_column(c))
        .collect();
    TableView {
        title: String::new(),
        headers: shown.iter().map(|c| c.to_string()).collect(),
        rows: orders
            .map(|o| shown.iter().map(|c| order_cell(o, c)).collect())
            .collect(),
    }
}

type StepCell = fn(&ProcessStep) -> Cell;

fn step_order(s: &ProcessStep) -> Cell {
    Cell::Text(s.order_id.clone())
}

fn step_process(s: &ProcessStep) -> Cell {
    Cell::text(s.process.as_deref())
}

fn step_estimated(s: &ProcessStep) -> Cell {
    Cell::number(s.estimated_hours)
}

fn step_actual(s: &ProcessStep) -> Cell {
    Cell::number(s.actual_hours)
}

fn step_employee_1(s: &ProcessStep) -> Cell {
    Cell::text(s.employee_1.as_deref())
}

fn step_employee_2(s: &ProcessStep) -> Cell {
    Cell::text(s.employee_2.as_deref())
}

fn process_view(report: &DashboardReport) -> TableView {
    let table = &report.dataset.processes;
    let has = |name: &str| table.headers.is_empty() || table.has_column(name);

    let mut shown: Vec<(String, StepCell)> = vec![(columns::OT.to_string(), step_order as StepCell)];
    if table.headers.is_empty() || table.process_column.is_some() {
        let header = table
            .process_column
            .clone()
            .unwrap_or_else(|| columns::PROCESS_ALIASES[0].to_string());
        shown.push((header, step_process));
    }
    let optional: [(&str, StepCell); 4] = [
        (columns::STEP_ESTIMATED_HOURS, step_estimated),
        (columns::STEP_ACTUAL_HOURS, step_actual),
        (columns::EMPLOYEE_1, step_employee_1),
        (columns::EMPLOYEE_2, step_employee_2),
    ];
    for (name, get) in optional {
        if has(name) {
            shown.push((name.to_string(), get));
        }
    }

    TableView {
        title: String::new(),
        headers: shown.iter().map(|(h, _)| h.clone()).collect(),
        rows: table
            .rows
            .iter()
            .map(|s| shown.iter().map(|(_, get)| get(s)).collect())
            .collect(),
    }
}

fn efficiency_view(report: &DashboardReport) -> TableView {
    let headers = ["proceso", "horas_estimadas", "horas_reales", "diferencia", "eficiencia"];
    TableView {
        title: String::new(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: report
            .breakdowns
            .process_efficiency
            .iter()
            .map(|p| {
                vec![
                    Cell::Text(p.process.clone()),
                    Cell::Number(p.estimated),
                    Cell::Number(p.actual),
                    Cell::Number(p.difference),
                    p.efficiency.map_or(Cell::Empty, Cell::Percent),
                ]
            })
            .collect(),
    }
}

/// Every order over its estimate, with the hour columns the source has
fn critical_view(report: &DashboardReport) -> TableView {
    let orders = &report.dataset.orders;
    let has = |name: &str| orders.headers.is_empty() || orders.has_column(name);
    let show_estimated = has(columns::ORDER_ESTIMATED_HOURS);
    let show_actual = has(columns::ORDER_ACTUAL_HOURS);

    let mut headers = vec![columns::OT.to_string(), columns::CLIENT.to_string()];
    if show_estimated {
        headers.push(columns::ORDER_ESTIMATED_HOURS.to_string());
    }
    if show_actual {
        headers.push(columns::ORDER_ACTUAL_HOURS.to_string());
    }
    headers.push(columns::HOURS_DIFF.to_string());

    let rows = report
        .overrun_orders()
        .into_iter()
        .map(|c| {
            let mut row = vec![Cell::Text(c.id), Cell::text(c.client.as_deref())];
            if show_estimated {
                row.push(Cell::Number(c.estimated));
            }
            if show_actual {
                row.push(Cell::Number(c.actual));
            }
            row.push(Cell::Number(c.difference));
            row
        })
        .collect();

    TableView {
        title: String::new(),
        headers,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use otdash_core::{Dataset, StatusPolicy, WorkOrderTable};
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn datetime_format_drops_midnight() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(format_datetime(d.and_hms_opt(0, 0, 0).unwrap()), "2026-03-01");
        assert_eq!(format_datetime(d.and_hms_opt(14, 30, 0).unwrap()), "2026-03-01 14:30");
    }

    #[test]
    fn detail_tables_keep_only_matching_orders() {
        let report = crate::tests::sample_report();
        let overdue = TableView::build(&report, TableKind::Overdue);
        assert_eq!(overdue.headers, vec!["ot", "cliente", "fecha_entrega", "estatus"]);
        assert_eq!(
            overdue.rows,
            vec![vec![
                Cell::Text("1001".into()),
                Cell::Text("ACME".into()),
                Cell::Text("2026-03-05".into()),
                Cell::Text("EN PROCESO".into()),
            ]]
        );

        let rework = TableView::build(&report, TableKind::Rework);
        assert_eq!(rework.rows.len(), 1);
        assert_eq!(rework.rows[0][2], Cell::Text("OC GARANTIA 7".into()));
    }

    #[test]
    fn columns_missing_from_source_are_hidden() {
        let mut dataset = Dataset::default();
        dataset.orders = WorkOrderTable {
            headers: vec!["ot".into(), "cliente".into(), "estatus".into()],
            rows: vec![WorkOrder::new("7").client("ACME").status("OK")],
        };
        let report = DashboardReport::build("X", dataset, now(), &StatusPolicy::default());

        let view = TableView::build(&report, TableKind::Orders);
        assert_eq!(view.headers, vec!["ot", "cliente", "estatus"]);

        let critical = TableView::build(&report, TableKind::Critical);
        assert_eq!(critical.headers, vec!["ot", "cliente", "diferencia_horas"]);
    }

    #[test]
    fn full_orders_csv_appends_derived_columns() {
        let mut dataset = Dataset::default();
        let mut order = WorkOrder::new("7").status("EN PROCESO").purchase_order("garantia");
        order.raw = vec!["7".into(), "EN PROCESO".into(), "garantia".into()];
        dataset.orders = WorkOrderTable {
            headers: vec!["ot".into(), "estatus".into(), "orden_compra".into()],
            rows: vec![order],
        };
        let report = DashboardReport::build("X", dataset, now(), &StatusPolicy::default());

        let csv = String::from_utf8(orders_csv(&report).unwrap()).unwrap();
        assert_eq!(
            csv,
            "ot,estatus,orden_compra,estado_entrega,es_reproceso\n7,EN PROCESO,garantia,En plazo,True\n"
        );
    }

    #[test]
    fn efficiency_table_leaves_missing_efficiency_blank() {
        let mut dataset = Dataset::default();
        dataset.processes.rows = vec![
            ProcessStep::new("1").process("Corte").hours(4.0, 2.0),
            ProcessStep::new("1").process("Soldadura").hours(3.0, 0.0),
        ];
        let report = DashboardReport::build("X", dataset, now(), &StatusPolicy::default());
        let view = TableView::build(&report, TableKind::Efficiency);
        assert_eq!(view.rows[0][0], Cell::Text("Corte".into()));
        assert_eq!(view.rows[0][4].to_string(), "200.0%");
        assert_eq!(view.rows[1][4], Cell::Empty);
    }
}
