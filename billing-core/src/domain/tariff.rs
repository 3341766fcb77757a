use crate::usage::MonthlyUsage;

/// Unit prices applied to monthly usage.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tariff {
    pub electric_per_kwh: f64,
    pub water_per_m3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BillEstimate {
    pub electric_cost: f64,
    pub water_cost: f64,
    pub total: f64,
}

impl Tariff {
    pub fn new(electric_per_kwh: f64, water_per_m3: f64) -> Self {
        Self {
            electric_per_kwh,
            water_per_m3,
        }
    }

    pub fn estimate(&self, usage: &MonthlyUsage) -> BillEstimate {
        let electric_cost = usage.electric * self.electric_per_kwh;
        let water_cost = usage.water * self.water_per_m3;
        BillEstimate {
            electric_cost,
            water_cost,
            total: electric_cost + water_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_multiplies_usage_by_unit_price() {
        let usage = MonthlyUsage {
            month: "2025-06".parse().unwrap(),
            electric: 55.0,
            water: 8.0,
        };
        let est = Tariff::new(3500.0, 15000.0).estimate(&usage);

        assert_eq!(est.electric_cost, 192_500.0);
        assert_eq!(est.water_cost, 120_000.0);
        assert_eq!(est.total, 312_500.0);
    }
}
