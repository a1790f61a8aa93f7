use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round_ratio(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Unrounded BCWS/BCWP/ACWP sums. Ratios are always derived from totals,
/// never averaged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvmTotals {
    pub bcws: f64,
    pub bcwp: f64,
    pub acwp: f64,
}

impl EvmTotals {
    pub fn new(bcws: f64, bcwp: f64, acwp: f64) -> Self {
        Self { bcws, bcwp, acwp }
    }

    pub fn metrics(&self) -> EvmMetrics {
        let bac = self.bcws;
        let cpi = if self.acwp == 0.0 {
            0.0
        } else {
            self.bcwp / self.acwp
        };
        let spi = if self.bcws == 0.0 {
            0.0
        } else {
            self.bcwp / self.bcws
        };
        let eac = if cpi == 0.0 { bac } else { bac / cpi };
        let etc = eac - self.acwp;

        EvmMetrics {
            bcws: round_money(self.bcws),
            bcwp: round_money(self.bcwp),
            acwp: round_money(self.acwp),
            bac: round_money(bac),
            cpi: round_ratio(cpi),
            spi: round_ratio(spi),
            cv: round_money(self.bcwp - self.acwp),
            sv: round_money(self.bcwp - self.bcws),
            eac: round_money(eac),
            etc: round_money(etc),
            vac: round_money(bac - eac),
        }
    }
}

impl Add for EvmTotals {
    type Output = EvmTotals;

    fn add(self, other: EvmTotals) -> EvmTotals {
        EvmTotals {
            bcws: self.bcws + other.bcws,
            bcwp: self.bcwp + other.bcwp,
            acwp: self.acwp + other.acwp,
        }
    }
}

impl AddAssign for EvmTotals {
    fn add_assign(&mut self, other: EvmTotals) {
        *self = *self + other;
    }
}

impl std::iter::Sum for EvmTotals {
    fn sum<I: Iterator<Item = EvmTotals>>(iter: I) -> Self {
        iter.fold(EvmTotals::default(), Add::add)
    }
}

/// Rounded earned-value figures: money to cents, ratios to four places.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvmMetrics {
    pub bcws: f64,
    pub bcwp: f64,
    pub acwp: f64,
    pub bac: f64,
    pub cpi: f64,
    pub spi: f64,
    pub cv: f64,
    pub sv: f64,
    pub eac: f64,
    pub etc: f64,
    pub vac: f64,
}

impl EvmMetrics {
    pub fn is_over_budget(&self) -> bool {
        self.cv < 0.0
    }

    pub fn is_behind_schedule(&self) -> bool {
        self.sv < 0.0
    }
}

/// Sum the raw totals first, then derive one set of metrics.
pub fn aggregate<I>(totals: I) -> EvmMetrics
where
    I: IntoIterator<Item = EvmTotals>,
{
    totals.into_iter().sum::<EvmTotals>().metrics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_signs_drive_the_status_flags() {
        let metrics = EvmMetrics {
            cv: -1000.0,
            sv: 0.0,
            ..EvmMetrics::default()
        };
        assert!(metrics.is_over_budget());
        assert!(!metrics.is_behind_schedule());
    }

    #[test]
    fn rounding_happens_once_at_the_boundary() {
        // cpi = 1/3 would give eac = 3000.30 if the ratio were rounded first
        let metrics = EvmTotals::new(1000.0, 100.0, 300.0).metrics();
        assert_eq!(metrics.cpi, 0.3333);
        assert_eq!(metrics.eac, 3000.0);
        assert_eq!(metrics.vac, -2000.0);
    }

    #[test]
    fn aggregation_does_not_average_ratios() {
        let items = [
            EvmTotals::new(1000.0, 1000.0, 500.0),
            EvmTotals::new(9000.0, 0.0, 4500.0),
        ];
        let metrics = aggregate(items);
        // averaging the item cpis (2.0 and 0.0) would give 1.0
        assert_eq!(metrics.cpi, 0.2);
        assert_eq!(metrics.spi, 0.1);
        assert_eq!(metrics.bcws, 10_000.0);
    }

    #[test]
    fn empty_aggregate_is_all_zero() {
        assert_eq!(aggregate(Vec::new()), EvmMetrics::default());
    }
}
