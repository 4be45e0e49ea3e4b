//! CSV decoding into typed tables
//!
//! Decoding is header-driven. Only the `ot` column is required; every other
//! column is optional and cells that do not parse become `None` rather than
//! failing the load. Rows with every cell blank (trailing spreadsheet rows)
//! are skipped.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use otdash_core::{columns, ProcessStep, ProcessTable, WorkOrder, WorkOrderTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::SourceError;

/// Order of day and month in slash-separated dates such as `03/05/2026`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `MM/DD/YYYY`, falling back to day-first when the month would be > 12
    #[default]
    MonthFirst,
    /// `DD/MM/YYYY`, falling back to month-first when the month would be > 12
    DayFirst,
}

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const ISO_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M", "%H:%M:%S%.f"];

/// Parse a date or date-time cell; anything unrecognised yields `None`.
pub fn parse_datetime(cell: &str, order: DateOrder) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, fmt) {
            return Some(dt);
        }
    }

    let mut parts = cell.splitn(2, char::is_whitespace);
    let date_part = parts.next()?;
    let time = match parts.next().map(str::trim) {
        None | Some("") => NaiveTime::MIN,
        Some(t) => TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(t, fmt).ok())?,
    };

    let date = ISO_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .or_else(|| parse_slash_date(date_part, order))?;

    Some(date.and_time(time))
}

fn parse_slash_date(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let (first, second) = match order {
        DateOrder::MonthFirst => ("%m/%d/%Y", "%d/%m/%Y"),
        DateOrder::DayFirst => ("%d/%m/%Y", "%m/%d/%Y"),
    };
    let s = s.replace('-', "/");
    NaiveDate::parse_from_str(&s, first)
        .or_else(|_| NaiveDate::parse_from_str(&s, second))
        .ok()
}

/// Parse an hours cell. Accepts a decimal comma when no dot is present.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    let normalized = if cell.contains('.') {
        cell.to_string()
    } else {
        cell.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// Column lookup
// ============================================================================

struct Columns {
    headers: Vec<String>,
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        let headers: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut index = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            // First occurrence wins for duplicated headers
            index.entry(h.clone()).or_insert(i);
        }
        Self { headers, index }
    }

    fn require(&self, table: &str, column: &str) -> Result<usize, SourceError> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| SourceError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    fn text<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        let i = *self.index.get(column)?;
        record.get(i).map(str::trim).filter(|s| !s.is_empty())
    }

    fn string(&self, record: &csv::StringRecord, column: &str) -> Option<String> {
        self.text(record, column).map(String::from)
    }

    fn number(&self, record: &csv::StringRecord, column: &str) -> Option<f64> {
        self.text(record, column).and_then(parse_number)
    }

    fn datetime(&self, record: &csv::StringRecord, column: &str, order: DateOrder) -> Option<NaiveDateTime> {
        self.text(record, column).and_then(|s| parse_datetime(s, order))
    }

    fn raw(&self, record: &csv::StringRecord) -> Vec<String> {
        (0..self.headers.len())
            .map(|i| record.get(i).unwrap_or("").trim().to_string())
            .collect()
    }
}

fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes)
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|c| c.trim().is_empty())
}

// ============================================================================
// Tables
// ============================================================================

/// Decode the work-order master table
pub fn decode_work_orders(bytes: &[u8], order: DateOrder) -> Result<WorkOrderTable, SourceError> {
    const TABLE: &str = "work orders";
    let csv_err = |source| SourceError::Csv {
        table: TABLE.to_string(),
        source,
    };

    let mut rdr = reader(bytes);
    let cols = Columns::new(rdr.headers().map_err(csv_err)?);
    let ot = cols.require(TABLE, columns::OT)?;

    let mut rows = Vec::new();
    let mut bad_dates = 0usize;
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        if is_blank(&record) {
            continue;
        }
        let delivery_text = cols.text(&record, columns::DELIVERY_DATE);
        let delivery_date = cols.datetime(&record, columns::DELIVERY_DATE, order);
        if delivery_text.is_some() && delivery_date.is_none() {
            bad_dates += 1;
        }

        rows.push(WorkOrder {
            id: record.get(ot).unwrap_or("").trim().to_string(),
            description: cols.string(&record, columns::DESCRIPTION),
            client: cols.string(&record, columns::CLIENT),
            status: cols.string(&record, columns::STATUS),
            delivery_date,
            print_date: cols.datetime(&record, columns::PRINT_DATE, order),
            finish_date: cols.datetime(&record, columns::FINISH_DATE, order),
            delivered_date: cols.datetime(&record, columns::DELIVERED_DATE, order),
            estimated_hours: cols.number(&record, columns::ORDER_ESTIMATED_HOURS),
            actual_hours: cols.number(&record, columns::ORDER_ACTUAL_HOURS),
            purchase_order: cols.string(&record, columns::PURCHASE_ORDER),
            raw: cols.raw(&record),
        });
    }

    if bad_dates > 0 {
        warn!(count = bad_dates, "unparsable delivery dates treated as missing");
    }
    debug!(rows = rows.len(), columns = cols.headers.len(), "decoded work orders");

    Ok(WorkOrderTable {
        headers: cols.headers,
        rows,
    })
}

/// Decode the process-steps table
pub fn decode_process_steps(bytes: &[u8], order: DateOrder) -> Result<ProcessTable, SourceError> {
    const TABLE: &str = "process steps";
    let csv_err = |source| SourceError::Csv {
        table: TABLE.to_string(),
        source,
    };

    let mut rdr = reader(bytes);
    let cols = Columns::new(rdr.headers().map_err(csv_err)?);
    let ot = cols.require(TABLE, columns::OT)?;

    let process_column = columns::PROCESS_ALIASES
        .iter()
        .find(|alias| cols.index.contains_key(**alias))
        .map(|alias| (*alias).to_string());
    if process_column.is_none() {
        warn!(available = ?cols.headers, "no process-name column found");
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        if is_blank(&record) {
            continue;
        }
        rows.push(ProcessStep {
            order_id: record.get(ot).unwrap_or("").trim().to_string(),
            process: process_column.as_deref().and_then(|c| cols.string(&record, c)),
            estimated_hours: cols.number(&record, columns::STEP_ESTIMATED_HOURS),
            actual_hours: cols.number(&record, columns::STEP_ACTUAL_HOURS),
            employee_1: cols.string(&record, columns::EMPLOYEE_1),
            employee_2: cols.string(&record, columns::EMPLOYEE_2),
            start_1: cols.datetime(&record, columns::START_1, order),
            start_2: cols.datetime(&record, columns::START_2, order),
            raw: cols.raw(&record),
        });
    }
    debug!(rows = rows.len(), "decoded process steps");

    Ok(ProcessTable {
        headers: cols.headers,
        process_column,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn parses_iso_dates_and_datetimes() {
        let order = DateOrder::MonthFirst;
        assert_eq!(parse_datetime("2026-03-05", order), Some(dt(2026, 3, 5, 0, 0)));
        assert_eq!(parse_datetime("2026-03-05 14:30:00", order), Some(dt(2026, 3, 5, 14, 30)));
        assert_eq!(parse_datetime("2026-03-05T14:30", order), Some(dt(2026, 3, 5, 14, 30)));
        assert_eq!(parse_datetime(" 2026/03/05 ", order), Some(dt(2026, 3, 5, 0, 0)));
    }

    #[test]
    fn slash_dates_follow_configured_order() {
        assert_eq!(parse_datetime("03/05/2026", DateOrder::MonthFirst), Some(dt(2026, 3, 5, 0, 0)));
        assert_eq!(parse_datetime("03/05/2026", DateOrder::DayFirst), Some(dt(2026, 5, 3, 0, 0)));
        assert_eq!(
            parse_datetime("3/5/2026 8:15:00", DateOrder::MonthFirst),
            Some(dt(2026, 3, 5, 8, 15))
        );
    }

    #[test]
    fn impossible_month_falls_back_to_other_order() {
        assert_eq!(parse_datetime("25/03/2026", DateOrder::MonthFirst), Some(dt(2026, 3, 25, 0, 0)));
        assert_eq!(parse_datetime("03/25/2026", DateOrder::DayFirst), Some(dt(2026, 3, 25, 0, 0)));
    }

    #[test]
    fn garbage_dates_are_none() {
        let order = DateOrder::MonthFirst;
        assert_eq!(parse_datetime("", order), None);
        assert_eq!(parse_datetime("pendiente", order), None);
        assert_eq!(parse_datetime("2026-13-40", order), None);
        assert_eq!(parse_datetime("2026-03-05 nope", order), None);
    }

    #[test]
    fn numbers_accept_decimal_comma() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number(" 7 "), Some(7.0));
        assert_eq!(parse_number("3,25"), Some(3.25));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn decodes_work_orders_with_optional_columns() {
        let csv = "\u{feff}ot,cliente,estatus,fecha_entrega,horas_estimadas_ot,horas_reales_ot,orden_compra,extra\n\
                   1001,ACME,EN PROCESO,2026-03-12,10,12.5,OC-1,x\n\
                   ,,,,,,,\n\
                   1002, Globex ,FACTURADO,no date,,,GARANTIA 3,\n";
        let table = decode_work_orders(csv.as_bytes(), DateOrder::MonthFirst).unwrap();

        assert_eq!(table.headers[0], "ot");
        assert_eq!(table.headers.len(), 8);
        assert_eq!(table.len(), 2);

        let first = &table.rows[0];
        assert_eq!(first.id, "1001");
        assert_eq!(first.client.as_deref(), Some("ACME"));
        assert_eq!(first.delivery_date, Some(dt(2026, 3, 12, 0, 0)));
        assert_eq!(first.estimated_hours, Some(10.0));
        assert_eq!(first.actual_hours, Some(12.5));
        assert_eq!(first.raw.last().map(String::as_str), Some("x"));

        let second = &table.rows[1];
        assert_eq!(second.client.as_deref(), Some("Globex"));
        assert_eq!(second.delivery_date, None);
        assert_eq!(second.estimated_hours, None);
        assert_eq!(second.purchase_order.as_deref(), Some("GARANTIA 3"));
        assert!(table.has_purchase_orders());
    }

    #[test]
    fn missing_ot_column_is_an_error() {
        let err = decode_work_orders(b"cliente,estatus\nACME,OK\n", DateOrder::MonthFirst).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { ref column, .. } if column == "ot"));
    }

    #[test]
    fn process_column_aliases() {
        let csv = "ot,Proceso_Nombre,horas_estimadas,horas_reales,empleado_1,empleado_2\n\
                   1001,Corte,2,3,juan perez,\n";
        let table = decode_process_steps(csv.as_bytes(), DateOrder::MonthFirst).unwrap();
        assert_eq!(table.process_column.as_deref(), Some("Proceso_Nombre"));
        assert_eq!(table.rows[0].process.as_deref(), Some("Corte"));
        assert_eq!(table.rows[0].employee_1.as_deref(), Some("juan perez"));
        assert_eq!(table.rows[0].employee_2, None);
    }

    #[test]
    fn first_alias_wins() {
        let csv = "ot,PROCESO,proceso\n1,Upper,lower\n";
        let table = decode_process_steps(csv.as_bytes(), DateOrder::MonthFirst).unwrap();
        assert_eq!(table.process_column.as_deref(), Some("proceso"));
        assert_eq!(table.rows[0].process.as_deref(), Some("lower"));
    }

    #[test]
    fn steps_without_process_column() {
        let csv = "ot,horas_estimadas\n1,2\n";
        let table = decode_process_steps(csv.as_bytes(), DateOrder::MonthFirst).unwrap();
        assert_eq!(table.process_column, None);
        assert_eq!(table.rows[0].process, None);
    }
}
