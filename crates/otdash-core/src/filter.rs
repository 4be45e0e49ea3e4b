//! Dashboard filters
//!
//! Filters are applied in a fixed order and every step keeps the process
//! table consistent with the work-order table through the shared `ot` id:
//!
//! 1. client
//! 2. status
//! 3. work order id
//! 4. employee (matched on cleaned names; narrows orders to those worked on)
//! 5. delivery date range, inclusive, only when both bounds are set

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{clean_name, Dataset};

/// User-selected filters; `None` means "all"
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub client: Option<String>,
    pub status: Option<String>,
    pub work_order: Option<String>,
    pub employee: Option<String>,
    pub delivery_from: Option<NaiveDate>,
    pub delivery_to: Option<NaiveDate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn work_order(mut self, id: impl Into<String>) -> Self {
        self.work_order = Some(id.into());
        self
    }

    pub fn employee(mut self, name: impl Into<String>) -> Self {
        self.employee = Some(name.into());
        self
    }

    pub fn delivery_between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.delivery_from = Some(from);
        self.delivery_to = Some(to);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply every active filter to a copy of `dataset`
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        let mut out = dataset.clone();

        if let Some(client) = &self.client {
            out.orders.rows.retain(|o| o.client.as_deref() == Some(client.as_str()));
            out.retain_steps_of_orders();
        }

        if let Some(status) = &self.status {
            out.orders.rows.retain(|o| o.status.as_deref() == Some(status.as_str()));
            out.retain_steps_of_orders();
        }

        if let Some(id) = &self.work_order {
            out.orders.rows.retain(|o| &o.id == id);
            out.processes.rows.retain(|s| &s.order_id == id);
        }

        if let Some(employee) = &self.employee {
            // Selections typed on the command line get the same cleanup as the data
            let wanted = clean_name(Some(employee)).unwrap_or_default();
            out.processes.rows.retain(|s| s.worked_by(&wanted));
            out.retain_orders_of_steps();
        }

        if let (Some(from), Some(to)) = (self.delivery_from, self.delivery_to) {
            let start = from.and_time(NaiveTime::MIN);
            let end = to.and_time(NaiveTime::MIN);
            out.orders
                .rows
                .retain(|o| o.delivery_date.is_some_and(|d| d >= start && d <= end));
            out.retain_steps_of_orders();
        }

        debug!(
            orders = out.orders.len(),
            steps = out.processes.len(),
            "applied filters"
        );
        out
    }
}

/// Values available for each filter, taken from the unfiltered data
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub clients: Vec<String>,
    pub statuses: Vec<String>,
    pub work_orders: Vec<String>,
    pub employees: Vec<String>,
    pub first_delivery: Option<NaiveDate>,
    pub last_delivery: Option<NaiveDate>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let orders = &dataset.orders.rows;

        let clients: BTreeSet<String> = orders.iter().filter_map(|o| o.client.clone()).collect();
        let statuses: BTreeSet<String> = orders.iter().filter_map(|o| o.status.clone()).collect();
        let work_orders: BTreeSet<String> = orders.iter().map(|o| o.id.clone()).collect();
        let employees: BTreeSet<String> = dataset
            .processes
            .rows
            .iter()
            .flat_map(|s| [s.employee_1.as_deref(), s.employee_2.as_deref()])
            .filter_map(clean_name)
            .collect();

        let dates = orders.iter().filter_map(|o| o.delivery_date.map(|d| d.date()));
        let first_delivery = dates.clone().min();
        let last_delivery = dates.max();

        Self {
            clients: clients.into_iter().collect(),
            statuses: statuses.into_iter().collect(),
            work_orders: work_orders.into_iter().collect(),
            employees: employees.into_iter().collect(),
            first_delivery,
            last_delivery,
        }
    }
}
