//! End-to-end CLI tests over local CSV exports
//!
//! The fixture config points at `tests/fixtures/*.csv` and every run pins
//! `--as-of 2026-03-10T09:00`, so delivery states are stable:
//!
//! | OT   | Status     | Delivery   | State      | Hours  |
//! |------|------------|------------|------------|--------|
//! | 1001 | EN PROCESO | 2026-03-05 | Vencida    | 10/16  |
//! | 1002 | FACTURADO  | 2026-03-01 | Completada | 8/6    |
//! | 1003 | EN PROCESO | 2026-03-12 | Por vencer | 5/5    |
//! | 1004 | OK         | 2026-03-20 | Completada | 4/7    |
//! | 1005 | EN PROCESO | 2026-04-30 | En plazo   | -      |

use std::path::PathBuf;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::Value;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run_with_config(config: PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_otdash"))
        .arg("--config")
        .arg(config)
        .args(["--as-of", "2026-03-10T09:00"])
        .args(args)
        .env_remove("OTDASH_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute otdash")
}

fn run(args: &[&str]) -> Output {
    run_with_config(fixtures_dir().join("otdash.toml"), args)
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "otdash failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn json(args: &[&str]) -> Value {
    serde_json::from_str(&stdout(&run(args))).unwrap()
}

// =============================================================================
// summary
// =============================================================================

#[test]
fn summary_text() {
    let out = stdout(&run(&["summary"]));
    assert!(out.starts_with("Reporte de Producción - Adimatec"));
    assert!(out.contains("Total OTs:        5"));
    assert!(out.contains("OTs Facturadas:   1 (20.0%)"));
    assert!(out.contains("Reprocesos:       1 (20.0%)"));
    assert!(out.contains("OT 1001: 6.0h (Cliente: ACME)"));
}

#[test]
fn summary_json_metrics() {
    let value = json(&["summary", "--format", "json"]);
    let m = &value["metrics"];
    assert_eq!(m["total_orders"], 5);
    assert_eq!(m["in_process"], 3);
    assert_eq!(m["overdue"], 1);
    assert_eq!(m["due_soon"], 1);
    assert_eq!(m["on_time"], 1);
    assert_eq!(m["completed"], 2);
    assert_eq!(m["rework"], 1);
    assert_eq!(m["hours"]["scheduled_hours"], 27.0);
    assert_eq!(m["hours"]["positive_hours"], 11.0);
    assert_eq!(m["hours"]["negative_hours"], 23.0);
}

#[test]
fn employee_filter_narrows_orders() {
    let value = json(&["summary", "--format", "json", "--employee", "JUAN perez"]);
    assert_eq!(value["metrics"]["total_orders"], 1);
    assert_eq!(value["breakdowns"]["critical_orders"][0]["id"], "1001");
}

#[test]
fn date_range_filter() {
    let value = json(&["summary", "--format", "json", "--from", "2026-03-01", "--to", "2026-03-12"]);
    assert_eq!(value["metrics"]["total_orders"], 3);
}

// =============================================================================
// options / tables
// =============================================================================

#[test]
fn options_lists_filter_values() {
    let value = json(&["options", "--format", "json"]);
    assert_eq!(value["clients"], serde_json::json!(["ACME", "Globex", "Initech"]));
    assert_eq!(value["employees"], serde_json::json!(["Juan Perez", "Maria Lopez", "Pedro"]));
    assert_eq!(value["first_delivery"], "2026-03-01");
    assert_eq!(value["last_delivery"], "2026-04-30");
}

#[test]
fn overdue_table() {
    let out = stdout(&run(&["tables", "--which", "overdue"]));
    assert!(out.starts_with("OTs Vencidas (Solo Activas)\n"));
    assert!(out.contains("1001"));
    assert!(!out.contains("1003"));
}

#[test]
fn efficiency_table() {
    let out = stdout(&run(&["tables", "--which", "efficiency"]));
    // Corte 9/11, Soldadura 6/10, Pintura 4/7
    let corte = out.lines().find(|l| l.starts_with("Corte")).unwrap();
    assert!(corte.ends_with("81.8%"), "{corte}");
}

// =============================================================================
// charts / export
// =============================================================================

#[test]
fn charts_written_as_svg() {
    let dir = tempfile::tempdir().unwrap();
    let out = stdout(&run(&["charts", "--out-dir", dir.path().to_str().unwrap()]));
    assert_eq!(out.lines().count(), 7);
    let svg = std::fs::read_to_string(dir.path().join("estado_entregas.svg")).unwrap();
    assert!(svg.starts_with("<svg"));
}

#[test]
fn export_all_formats() {
    let dir = tempfile::tempdir().unwrap();
    stdout(&run(&["export", "--out-dir", dir.path().to_str().unwrap()]));

    for name in [
        "Reporte_Adimatec_20260310.xlsx",
        "Reporte_Adimatec_20260310.pdf",
        "Reporte_Adimatec_20260310.html",
        "ot_master_filtrado.csv",
        "procesos_filtrados.csv",
    ] {
        assert!(dir.path().join(name).is_file(), "missing {name}");
    }
    let pdf = std::fs::read(dir.path().join("Reporte_Adimatec_20260310.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn csv_export_follows_filters() {
    let dir = tempfile::tempdir().unwrap();
    stdout(&run(&[
        "export",
        "--format",
        "csv",
        "--client",
        "Globex",
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]));

    let orders = std::fs::read_to_string(dir.path().join("ot_master_filtrado.csv")).unwrap();
    let lines: Vec<&str> = orders.lines().collect();
    assert_eq!(
        lines[0],
        "ot,descripcion,cliente,estatus,fecha_entrega,fecha_terminado,horas_estimadas_ot,horas_reales_ot,orden_compra,estado_entrega,es_reproceso"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1002,Brida,Globex,FACTURADO"));
    assert!(lines[1].ends_with(",Completada,False"));

    let steps = std::fs::read_to_string(dir.path().join("procesos_filtrados.csv")).unwrap();
    assert_eq!(steps.lines().count(), 1);
}

// =============================================================================
// errors
// =============================================================================

#[test]
fn failed_export_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    // a directory where the PDF should go makes that one write fail
    std::fs::create_dir(dir.path().join("Reporte_Adimatec_20260310.pdf")).unwrap();

    let output = run(&["export", "--out-dir", dir.path().to_str().unwrap()]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error al generar PDF"), "{stderr}");
    assert!(stderr.contains("1 export(s) failed: PDF"), "{stderr}");

    for name in [
        "Reporte_Adimatec_20260310.xlsx",
        "Reporte_Adimatec_20260310.html",
        "ot_master_filtrado.csv",
        "procesos_filtrados.csv",
    ] {
        assert!(dir.path().join(name).is_file(), "missing {name}");
    }
    assert!(dir.path().join("Reporte_Adimatec_20260310.pdf").is_dir());
}

#[test]
fn missing_config_fails() {
    let output = run_with_config(fixtures_dir().join("nope.toml"), &["summary"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read config"));
}

#[test]
fn missing_export_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("otdash.toml");
    std::fs::write(
        &config,
        "[source]\norders = \"absent.csv\"\nprocesses = \"absent.csv\"\n[cache]\nenabled = false\n",
    )
    .unwrap();

    let output = run_with_config(config, &["summary"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load production data"));
}
