//! Integration tests loading both tables from local CSV exports

use std::fs;

use chrono::NaiveDate;
use otdash_core::{DashboardReport, FilterSet, StatusPolicy};
use otdash_source::{DataSource, DateOrder, Location, SheetSource, SourceError};

const ORDERS: &str = "\
ot,descripcion,cliente,estatus,fecha_entrega,fecha_terminado,horas_estimadas_ot,horas_reales_ot,orden_compra
1001,Bastidor,ACME,EN PROCESO,05/03/2026,,10,14,OC-77
1002,Soporte,ACME,FACTURADO,01/03/2026,28/02/2026,8,6,OC-78
1003,Carcasa,Globex,EN PROCESO,20/03/2026,,5,5,GARANTIA OC-12
1004,Tapa,Globex,OK,,,,,
";

const STEPS: &str = "\
ot,proceso,horas_estimadas,horas_reales,empleado_1,empleado_2
1001,Corte,4,6,JUAN PEREZ,
1001,Soldadura,6,8,ana gomez,juan  perez
1002,Corte,8,6,Ana Gomez,
1003,Pintura,5,5,luis*,
";

fn write_exports(dir: &std::path::Path) -> DataSource {
    let orders = dir.join("ot_master.csv");
    let steps = dir.join("procesos.csv");
    fs::write(&orders, ORDERS).unwrap();
    fs::write(&steps, STEPS).unwrap();
    DataSource::new(
        SheetSource::new("ot_master", Location::File(orders)),
        SheetSource::new("procesos", Location::File(steps)),
    )
    .date_order(DateOrder::DayFirst)
}

#[test]
fn loads_and_reports_local_exports() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_exports(dir.path()).load().expect("load should succeed");

    assert_eq!(dataset.orders.len(), 4);
    assert_eq!(dataset.processes.len(), 4);
    assert_eq!(
        dataset.orders.rows[0].delivery_date.map(|d| d.date()),
        NaiveDate::from_ymd_opt(2026, 3, 5)
    );

    let now = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();
    let report = DashboardReport::build("Adimatec", dataset, now, &StatusPolicy::default());
    let m = &report.metrics;

    assert_eq!(m.total_orders, 4);
    assert_eq!(m.billed, 1);
    assert_eq!(m.overdue, 1);
    assert_eq!(m.due_soon, 0);
    assert_eq!(m.on_time, 1);
    assert_eq!(m.completed, 2);
    assert_eq!(m.rework, 1);
    assert_eq!(m.hours.scheduled_hours, 23.0);
    assert_eq!(m.hours.negative_hours, 14.0);
}

#[test]
fn employee_filter_over_loaded_data() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_exports(dir.path()).load().unwrap();

    let filtered = FilterSet::new().employee("Juan Perez").apply(&dataset);
    let ids: Vec<&str> = filtered.orders.rows.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["1001"]);
    assert_eq!(filtered.processes.len(), 2);
}

#[test]
fn missing_process_file_stops_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_exports(dir.path());
    fs::remove_file(dir.path().join("procesos.csv")).unwrap();

    let err = source.load().unwrap_err();
    assert!(matches!(err, SourceError::Io { .. }), "got {err}");
}
