//! Dashboard report
//!
//! A `DashboardReport` is everything a renderer needs: the filtered tables,
//! the per-order derivations, the headline metrics and the breakdowns, all
//! computed once at a fixed reference instant.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::{
    classify_delivery, is_rework, Breakdowns, DashboardMetrics, Dataset, DeliveryState, HoursDeviation,
    StatusPolicy, WorkOrder,
};

/// Derived, non-persisted attributes of one work order
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DerivedOrder {
    /// `estado_entrega`
    pub state: DeliveryState,
    /// `es_reproceso`
    pub rework: bool,
    pub deviation: Option<HoursDeviation>,
}

impl DerivedOrder {
    pub fn derive(order: &WorkOrder, now: NaiveDateTime, policy: &StatusPolicy) -> Self {
        Self {
            state: classify_delivery(order.status.as_deref(), order.delivery_date, now, policy),
            rework: is_rework(order.purchase_order.as_deref(), &policy.rework_marker),
            deviation: HoursDeviation::from_hours(order.estimated_hours, order.actual_hours),
        }
    }
}

/// Filtered data plus everything derived from it
#[derive(Clone, Debug)]
pub struct DashboardReport {
    /// Company name shown in titles and file names
    pub company: String,
    /// Reference instant for delivery classification
    pub generated_at: NaiveDateTime,
    pub dataset: Dataset,
    /// One entry per row of `dataset.orders`, same order
    pub derived: Vec<DerivedOrder>,
    pub metrics: DashboardMetrics,
    pub breakdowns: Breakdowns,
}

impl DashboardReport {
    /// Derive every attribute and metric of an (already filtered) dataset
    pub fn build(
        company: impl Into<String>,
        dataset: Dataset,
        now: NaiveDateTime,
        policy: &StatusPolicy,
    ) -> Self {
        let derived: Vec<DerivedOrder> = dataset
            .orders
            .rows
            .iter()
            .map(|o| DerivedOrder::derive(o, now, policy))
            .collect();
        let metrics = DashboardMetrics::compute(&dataset.orders, &derived, policy);
        let breakdowns = Breakdowns::compute(&dataset.orders, &derived, &dataset.processes);

        debug!(
            total = metrics.total_orders,
            overdue = metrics.overdue,
            due_soon = metrics.due_soon,
            "built dashboard report"
        );

        Self {
            company: company.into(),
            generated_at: now,
            dataset,
            derived,
            metrics,
            breakdowns,
        }
    }

    /// Orders paired with their derivations
    pub fn orders(&self) -> impl Iterator<Item = (&WorkOrder, &DerivedOrder)> {
        self.dataset.orders.rows.iter().zip(&self.derived)
    }

    /// Orders in the given delivery state
    pub fn orders_in(&self, state: DeliveryState) -> impl Iterator<Item = &WorkOrder> {
        self.orders().filter(move |(_, d)| d.state == state).map(|(o, _)| o)
    }

    /// Orders flagged as warranty rework
    pub fn rework_orders(&self) -> impl Iterator<Item = &WorkOrder> {
        self.orders().filter(|(_, d)| d.rework).map(|(o, _)| o)
    }

    /// Every order over its hour estimate, in source order
    pub fn overrun_orders(&self) -> Vec<crate::CriticalOrder> {
        crate::metrics::overrun_orders(&self.dataset.orders, &self.derived)
    }

    /// Report title, e.g. "Reporte de Producción - Adimatec"
    pub fn title(&self) -> String {
        format!("Reporte de Producción - {}", self.company)
    }

    /// Download file name stem, e.g. "Reporte_Adimatec_20260310"
    pub fn file_stem(&self) -> String {
        let company: String = self
            .company
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("Reporte_{}_{}", company, self.generated_at.format("%Y%m%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn derived_rows_follow_orders() {
        let mut dataset = Dataset::default();
        dataset.orders.rows = vec![
            WorkOrder::new("1").status("OK"),
            WorkOrder::new("2")
                .status("EN PROCESO")
                .delivery(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
                .purchase_order("GARANTIA 12"),
        ];
        let report = DashboardReport::build("Adimatec", dataset, now(), &StatusPolicy::default());

        assert_eq!(report.derived.len(), 2);
        assert_eq!(report.derived[0].state, DeliveryState::Completed);
        assert_eq!(report.derived[1].state, DeliveryState::Overdue);

        let overdue: Vec<&str> = report.orders_in(DeliveryState::Overdue).map(|o| o.id.as_str()).collect();
        assert_eq!(overdue, vec!["2"]);
        let rework: Vec<&str> = report.rework_orders().map(|o| o.id.as_str()).collect();
        assert_eq!(rework, vec!["2"]);
    }

    #[test]
    fn file_stem_uses_company_and_date() {
        let report = DashboardReport::build("Adi Matec", Dataset::default(), now(), &StatusPolicy::default());
        assert_eq!(report.file_stem(), "Reporte_Adi_Matec_20260310");
        assert_eq!(report.title(), "Reporte de Producción - Adi Matec");
    }
}
