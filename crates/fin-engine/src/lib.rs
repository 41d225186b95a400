#![deny(warnings)]

//! Projection engine for the franchise financial model.
//!
//! A pure pipeline: revenue by stream, cost of goods and variable expenses,
//! base-month unit economics, then a forward projection under compounded
//! growth and seasonality. Inputs are validated up front; nothing here does
//! I/O or keeps state between calls.
//!
//! Example:
//! let out = compute_financial_projection(&variant, &params, fixed, investment, &Seasonality::flat())?;
//! assert_eq!(out.projection.len(), 12);

mod checked;
pub mod costs;
pub mod projection;
pub mod revenue;
pub mod unit_economics;

pub use costs::{category_margins, compute_costs, CategoryMargins, CostBreakdown, CostRatios};
pub use projection::{growth_factor, project, AnnualTotals, ProjectionRow, Seasonality};
pub use revenue::{
    compute_base_revenue, compute_traffic, ConsultationRevenue, RevenueBreakdown, RevenueStream,
    TrafficFigures,
};
pub use unit_economics::{
    compute_month_figures, compute_summary, contribution_margin_ratio, net_margin,
    InfeasibleMarker, MonthFigures, Payback, SummaryOutcome, UnitEconomicsSummary,
};

use fin_core::{
    check_money, validate_investment, validate_line_parameters, validate_parameters,
    BusinessModelVariant, EffectiveParameters, ValidationError, PROJECTION_MONTHS,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// Everything the presentation layer needs from one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinancialProjection {
    pub traffic: TrafficFigures,
    pub base_month: MonthFigures,
    pub summary: SummaryOutcome,
    pub category_margins: CategoryMargins,
    pub projection: Vec<ProjectionRow>,
    pub annual_totals: AnnualTotals,
}

impl FinancialProjection {
    pub fn is_feasible(&self) -> bool {
        self.summary.feasible().is_some()
    }
}

/// Run the full model for one variant and parameter set.
///
/// Fails before computing anything when an input is out of its domain, and
/// with [`ValidationError::Overflow`] when in-domain but extreme inputs push a
/// figure outside the `Decimal` range. A structurally infeasible cost
/// structure is reported through [`SummaryOutcome::Infeasible`]; base-month
/// figures and the projection are still populated.
pub fn compute_financial_projection(
    variant: &BusinessModelVariant,
    params: &EffectiveParameters,
    fixed_expense_total: Decimal,
    investment: Decimal,
    seasonality: &Seasonality,
) -> Result<FinancialProjection, ValidationError> {
    validate_parameters(params)?;
    validate_line_parameters(variant, params)?;
    check_money("fixed_expenses", fixed_expense_total)?;
    validate_investment(investment)?;

    let traffic = compute_traffic(variant, params);
    let revenue = compute_base_revenue(variant, params)?;
    let ratios = CostRatios::resolve(params);
    let costs = compute_costs(&revenue, &ratios);
    let base_month = compute_month_figures(&revenue, &costs, fixed_expense_total)?;
    let summary = compute_summary(&base_month, params, investment)?;
    let projection = project(&base_month, params, seasonality, PROJECTION_MONTHS)?;
    let annual_totals = AnnualTotals::from_rows(&projection)?;

    Ok(FinancialProjection {
        traffic,
        base_month,
        summary,
        category_margins: category_margins(variant, &ratios),
        projection,
        annual_totals,
    })
}
