//! Net profit, break-even, ROI and payback for a single month.

use crate::checked;
use crate::costs::CostBreakdown;
use crate::revenue::RevenueBreakdown;
use fin_core::{validate_investment, EffectiveParameters, ValidationError};
use rust_decimal::Decimal;
use serde::Serialize;

/// Figures of one month. Built fresh on every computation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MonthFigures {
    pub revenue: RevenueBreakdown,
    pub total_revenue: Decimal,
    pub costs: CostBreakdown,
    pub fixed_expenses: Decimal,
    pub net_profit: Decimal,
    /// Net profit over revenue; 0 when there is no revenue.
    pub net_margin: Decimal,
}

/// Months needed to recover the investment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "months", rename_all = "snake_case")]
pub enum Payback {
    Months(Decimal),
    /// Monthly profit is zero or negative; the investment never comes back.
    NotRecoverable,
}

impl Payback {
    pub fn months(&self) -> Option<Decimal> {
        match self {
            Payback::Months(m) => Some(*m),
            Payback::NotRecoverable => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct UnitEconomicsSummary {
    /// 1 - core COGS ratio - variable expense ratio.
    pub contribution_margin_ratio: Decimal,
    pub break_even_revenue: Decimal,
    pub break_even_customers: Decimal,
    /// Annualized: twelve base months of net profit over the investment.
    pub roi_annual: Decimal,
    pub payback: Payback,
}

/// Costs eat all of each revenue dollar; no break-even exists.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct InfeasibleMarker {
    pub contribution_margin_ratio: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Feasible(UnitEconomicsSummary),
    Infeasible(InfeasibleMarker),
}

impl SummaryOutcome {
    pub fn feasible(&self) -> Option<&UnitEconomicsSummary> {
        match self {
            SummaryOutcome::Feasible(s) => Some(s),
            SummaryOutcome::Infeasible(_) => None,
        }
    }
}

/// Net profit over revenue, guarding against zero revenue.
pub fn net_margin(
    net_profit: Decimal,
    total_revenue: Decimal,
) -> Result<Decimal, ValidationError> {
    if total_revenue > Decimal::ZERO {
        checked::div("net margin", net_profit, total_revenue)
    } else {
        Ok(Decimal::ZERO)
    }
}

pub fn contribution_margin_ratio(params: &EffectiveParameters) -> Decimal {
    Decimal::ONE - params.core_cogs_ratio - params.variable_expense_ratio
}

/// Combine revenue, costs and fixed expenses into a month.
pub fn compute_month_figures(
    revenue: &RevenueBreakdown,
    costs: &CostBreakdown,
    fixed_expenses: Decimal,
) -> Result<MonthFigures, ValidationError> {
    let total_revenue = revenue.checked_total()?;
    let net_profit = checked::sub(
        "net profit",
        costs.gross_profit,
        checked::add("operating expenses", fixed_expenses, costs.variable_expenses)?,
    )?;
    Ok(MonthFigures {
        revenue: *revenue,
        total_revenue,
        costs: *costs,
        fixed_expenses,
        net_profit,
        net_margin: net_margin(net_profit, total_revenue)?,
    })
}

/// Break-even, ROI and payback of the base month.
///
/// The break-even uses the core contribution margin, so additional streams
/// with better margins make it conservative. A non-positive margin yields
/// [`SummaryOutcome::Infeasible`] rather than an error.
pub fn compute_summary(
    base: &MonthFigures,
    params: &EffectiveParameters,
    investment: Decimal,
) -> Result<SummaryOutcome, ValidationError> {
    validate_investment(investment)?;
    let cm = contribution_margin_ratio(params);
    if cm <= Decimal::ZERO {
        return Ok(SummaryOutcome::Infeasible(InfeasibleMarker {
            contribution_margin_ratio: cm,
        }));
    }

    let break_even_revenue = checked::div("break-even revenue", base.fixed_expenses, cm)?;
    let break_even_customers = if params.average_ticket > Decimal::ZERO {
        checked::div(
            "break-even customers",
            break_even_revenue,
            params.average_ticket,
        )?
    } else {
        Decimal::ZERO
    };
    let annual_profit = checked::mul("annual profit", base.net_profit, Decimal::from(12u32))?;
    let roi_annual = checked::div("annual ROI", annual_profit, investment)?;
    let payback = if base.net_profit > Decimal::ZERO {
        Payback::Months(checked::div("payback", investment, base.net_profit)?)
    } else {
        Payback::NotRecoverable
    };

    Ok(SummaryOutcome::Feasible(UnitEconomicsSummary {
        contribution_margin_ratio: cm,
        break_even_revenue,
        break_even_customers,
        roi_annual,
        payback,
    }))
}
