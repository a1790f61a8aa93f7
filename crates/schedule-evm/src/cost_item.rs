use crate::error::EngineError;
use crate::evm::{EvmMetrics, EvmTotals, round_money};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use site_schedule::TaskId;

pub type CostItemId = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub id: CostItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_task_id: Option<TaskId>,
    pub planned_cost: f64,
    #[serde(default)]
    pub actual_cost: f64,
    #[serde(default)]
    pub percent_financial_complete: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_finish: Option<NaiveDate>,

    // Derived on recompute.
    #[serde(default)]
    pub earned_value: Option<f64>,
    #[serde(default)]
    pub metrics: Option<EvmMetrics>,
}

impl CostItem {
    pub fn new(id: CostItemId, name: impl Into<String>, planned_cost: f64) -> Self {
        Self {
            id,
            name: name.into(),
            linked_task_id: None,
            planned_cost,
            actual_cost: 0.0,
            percent_financial_complete: 0.0,
            window_start: None,
            window_finish: None,
            earned_value: None,
            metrics: None,
        }
    }

    pub fn with_actual_cost(mut self, actual_cost: f64) -> Self {
        self.actual_cost = actual_cost;
        self
    }

    pub fn with_percent_complete(mut self, percent: f64) -> Self {
        self.percent_financial_complete = percent;
        self
    }

    pub fn linked_to(mut self, task_id: TaskId) -> Self {
        self.linked_task_id = Some(task_id);
        self
    }

    pub fn with_window(mut self, start: NaiveDate, finish: NaiveDate) -> Self {
        self.window_start = Some(start);
        self.window_finish = Some(finish);
        self
    }

    /// BCWP, unrounded.
    pub fn earned(&self) -> f64 {
        self.planned_cost * self.percent_financial_complete / 100.0
    }

    pub fn totals(&self) -> EvmTotals {
        EvmTotals::new(self.planned_cost, self.earned(), self.actual_cost)
    }

    pub fn clear_derived(&mut self) {
        self.earned_value = None;
        self.metrics = None;
    }

    pub(crate) fn apply_metrics(&mut self) {
        self.earned_value = Some(round_money(self.earned()));
        self.metrics = Some(self.totals().metrics());
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: String| EngineError::InvalidCostItem {
            id: self.id,
            reason,
        };
        for (field, value) in [
            ("planned_cost", self.planned_cost),
            ("actual_cost", self.actual_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{field} must be a non-negative number, got {value}")));
            }
        }
        let pct = self.percent_financial_complete;
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(invalid(format!(
                "percent_financial_complete {pct} must be between 0 and 100"
            )));
        }
        if let (Some(start), Some(finish)) = (self.window_start, self.window_finish) {
            if finish < start {
                return Err(invalid(format!(
                    "window finish {finish} precedes window start {start}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earned_value_follows_financial_progress() {
        let mut item = CostItem::new(1, "Concrete", 10_000.0)
            .with_percent_complete(40.0)
            .with_actual_cost(5_000.0);
        item.apply_metrics();
        assert_eq!(item.earned_value, Some(4_000.0));
        let metrics = item.metrics.unwrap();
        assert_eq!(metrics.cpi, 0.8);
        assert_eq!(metrics.cv, -1_000.0);
        assert_eq!(metrics.spi, 0.4);
        assert_eq!(metrics.sv, -6_000.0);
        assert_eq!(metrics.eac, 12_500.0);
        assert_eq!(metrics.etc, 7_500.0);
        assert_eq!(metrics.vac, -2_500.0);
    }

    #[test]
    fn no_actual_cost_means_zero_cpi_and_eac_at_budget() {
        let item = CostItem::new(2, "Design fee", 2_000.0).with_percent_complete(50.0);
        let metrics = item.totals().metrics();
        assert_eq!(metrics.cpi, 0.0);
        assert_eq!(metrics.eac, metrics.bac);
        assert_eq!(metrics.etc, 2_000.0);
    }

    #[test]
    fn zero_budget_means_zero_spi() {
        let item = CostItem::new(3, "Allowance", 0.0).with_actual_cost(100.0);
        assert_eq!(item.totals().metrics().spi, 0.0);
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(CostItem::new(1, "x", -5.0).validate().is_err());
        assert!(CostItem::new(1, "x", 5.0).with_percent_complete(101.0).validate().is_err());
        assert!(CostItem::new(1, "x", f64::INFINITY).validate().is_err());
        assert!(CostItem::new(1, "x", 5.0).validate().is_ok());
    }
}
