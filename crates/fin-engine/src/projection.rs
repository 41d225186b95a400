//! Forward projection under compounded growth and seasonality.

use crate::checked;
use crate::costs::{compute_costs, CostRatios};
use crate::unit_economics::{compute_month_figures, MonthFigures};
use fin_core::{EffectiveParameters, ValidationError, MAX_PROJECTION_MONTHS};
use rust_decimal::Decimal;
use serde::Serialize;

const MONTHS_PER_YEAR: usize = 12;

/// Per-calendar-month demand multipliers, all non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Seasonality([Decimal; MONTHS_PER_YEAR]);

impl Default for Seasonality {
    fn default() -> Self {
        Self::flat()
    }
}

impl Seasonality {
    /// No seasonal adjustment.
    pub fn flat() -> Self {
        Self([Decimal::ONE; MONTHS_PER_YEAR])
    }

    pub fn new(multipliers: [Decimal; MONTHS_PER_YEAR]) -> Result<Self, ValidationError> {
        for (month, value) in multipliers.iter().enumerate() {
            if *value < Decimal::ZERO {
                return Err(ValidationError::NegativeSeasonality {
                    month: month + 1,
                    value: *value,
                });
            }
        }
        Ok(Self(multipliers))
    }

    /// Multiplier for 0-indexed month `t`, wrapping after a year.
    pub fn multiplier(&self, t: usize) -> Decimal {
        self.0[t % MONTHS_PER_YEAR]
    }

    pub fn as_slice(&self) -> &[Decimal] {
        &self.0
    }
}

impl TryFrom<&[Decimal]> for Seasonality {
    type Error = ValidationError;

    fn try_from(values: &[Decimal]) -> Result<Self, Self::Error> {
        let multipliers: [Decimal; MONTHS_PER_YEAR] =
            values
                .try_into()
                .map_err(|_| ValidationError::SeasonalityLength {
                    expected: MONTHS_PER_YEAR,
                    got: values.len(),
                })?;
        Self::new(multipliers)
    }
}

/// One month of the projection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProjectionRow {
    /// 1-based month number.
    pub month_index: u32,
    /// (1 + g)^t x seasonality[t].
    pub growth_factor: Decimal,
    #[serde(flatten)]
    pub figures: MonthFigures,
}

/// Sums over the projected months.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AnnualTotals {
    pub revenue: Decimal,
    pub net_profit: Decimal,
}

impl AnnualTotals {
    pub fn from_rows(rows: &[ProjectionRow]) -> Result<Self, ValidationError> {
        rows.iter().try_fold(Self::default(), |acc, r| {
            Ok(Self {
                revenue: checked::add("annual revenue", acc.revenue, r.figures.total_revenue)?,
                net_profit: checked::add(
                    "annual net profit",
                    acc.net_profit,
                    r.figures.net_profit,
                )?,
            })
        })
    }
}

/// Combined growth and seasonal factor for 0-indexed month `t`.
pub fn growth_factor(
    monthly_growth_rate: Decimal,
    seasonality: &Seasonality,
    t: usize,
) -> Result<Decimal, ValidationError> {
    let step = Decimal::ONE + monthly_growth_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..t {
        compound = checked::mul("growth factor", compound, step)?;
    }
    checked::mul("growth factor", compound, seasonality.multiplier(t))
}

/// Project `months` rows from the base month.
///
/// All streams scale together with the same factor; cost ratios and fixed
/// expenses stay as in the base month.
pub fn project(
    base: &MonthFigures,
    params: &EffectiveParameters,
    seasonality: &Seasonality,
    months: usize,
) -> Result<Vec<ProjectionRow>, ValidationError> {
    if months > MAX_PROJECTION_MONTHS {
        return Err(ValidationError::HorizonTooLong {
            got: months,
            max: MAX_PROJECTION_MONTHS,
        });
    }
    let ratios = CostRatios::resolve(params);
    let mut rows = Vec::with_capacity(months);
    for t in 0..months {
        let factor = growth_factor(params.monthly_growth_rate, seasonality, t)?;
        let revenue = base.revenue.scaled(factor)?;
        let costs = compute_costs(&revenue, &ratios);
        rows.push(ProjectionRow {
            month_index: (t + 1) as u32,
            growth_factor: factor,
            figures: compute_month_figures(&revenue, &costs, base.fixed_expenses)?,
        });
    }
    Ok(rows)
}
