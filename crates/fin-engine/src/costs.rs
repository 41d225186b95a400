//! Cost of goods per stream and variable operating expenses.

use crate::revenue::RevenueBreakdown;
use fin_core::{BusinessModelVariant, EffectiveParameters};
use rust_decimal::Decimal;
use serde::Serialize;

/// Resolved cost ratios for every stream.
///
/// Prescription and secondary ratios fall back to the core ratio when the
/// parameters leave them unset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CostRatios {
    pub core: Decimal,
    pub prescription: Decimal,
    pub secondary_goods: Decimal,
    pub variable_expense: Decimal,
}

impl CostRatios {
    pub fn resolve(params: &EffectiveParameters) -> Self {
        let core = params.core_cogs_ratio;
        Self {
            core,
            prescription: params
                .consultation
                .as_ref()
                .map_or(core, |c| c.cogs_ratio(core)),
            secondary_goods: params
                .secondary_goods
                .as_ref()
                .map_or(core, |s| s.cogs_ratio(core)),
            variable_expense: params.variable_expense_ratio,
        }
    }
}

/// Cost of goods by stream. Consultation fees carry none.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StreamCosts {
    pub core: Decimal,
    pub prescription: Option<Decimal>,
    pub secondary_goods: Option<Decimal>,
}

impl StreamCosts {
    pub fn total(&self) -> Decimal {
        self.core
            + self.prescription.unwrap_or(Decimal::ZERO)
            + self.secondary_goods.unwrap_or(Decimal::ZERO)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub cogs: StreamCosts,
    pub total_cogs: Decimal,
    /// Payment processing, packaging and other transaction-linked costs.
    pub variable_expenses: Decimal,
    pub gross_profit: Decimal,
}

/// Apply per-stream ratios to a revenue breakdown.
///
/// Every cost is bounded by the revenue it applies to, so this cannot leave
/// the `Decimal` range for a breakdown whose total fits.
pub fn compute_costs(revenue: &RevenueBreakdown, ratios: &CostRatios) -> CostBreakdown {
    let cogs = StreamCosts {
        core: revenue.core * ratios.core,
        prescription: revenue
            .prescription_and_consultation
            .map(|c| c.prescription * ratios.prescription),
        secondary_goods: revenue.secondary_goods.map(|s| s * ratios.secondary_goods),
    };
    let total_revenue = revenue.total();
    let total_cogs = cogs.total();
    CostBreakdown {
        cogs,
        total_cogs,
        variable_expenses: total_revenue * ratios.variable_expense,
        gross_profit: total_revenue - total_cogs,
    }
}

/// Gross margin (1 - COGS ratio) of each product category the variant sells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CategoryMargins {
    pub core: Decimal,
    pub prescription: Option<Decimal>,
    pub secondary_goods: Option<Decimal>,
}

pub fn category_margins(variant: &BusinessModelVariant, ratios: &CostRatios) -> CategoryMargins {
    CategoryMargins {
        core: Decimal::ONE - ratios.core,
        prescription: variant
            .has_consultation_line
            .then(|| Decimal::ONE - ratios.prescription),
        secondary_goods: variant
            .has_secondary_goods_line
            .then(|| Decimal::ONE - ratios.secondary_goods),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revenue::ConsultationRevenue;
    use fin_core::{ConsultationParams, SecondaryGoodsParams, VariantId};

    fn params() -> EffectiveParameters {
        EffectiveParameters {
            hourly_traffic: 60,
            conversion_rate: Decimal::new(10, 2),
            average_ticket: Decimal::new(90, 0),
            core_cogs_ratio: Decimal::new(74, 2),
            variable_expense_ratio: Decimal::new(4, 2),
            monthly_growth_rate: Decimal::new(25, 3),
            consultation: Some(ConsultationParams {
                consultations_per_day: 10,
                consultation_fee: Decimal::new(45, 0),
                attach_rate: Decimal::new(65, 2),
                prescription_ticket: Decimal::new(140, 0),
                prescription_cogs_ratio: None,
            }),
            secondary_goods: Some(SecondaryGoodsParams {
                share_of_core: Decimal::new(15, 2),
                cogs_ratio: Some(Decimal::new(90, 2)),
            }),
        }
    }

    #[test]
    fn unset_ratios_fall_back_to_core() {
        let r = CostRatios::resolve(&params());
        assert_eq!(r.prescription, Decimal::new(74, 2));
        assert_eq!(r.secondary_goods, Decimal::new(90, 2));

        let mut p = params();
        p.consultation = None;
        p.secondary_goods = None;
        let r = CostRatios::resolve(&p);
        assert_eq!(r.prescription, r.core);
        assert_eq!(r.secondary_goods, r.core);
    }

    #[test]
    fn per_stream_costs() {
        let revenue = RevenueBreakdown {
            core: Decimal::new(100_000, 0),
            prescription_and_consultation: Some(ConsultationRevenue {
                prescription: Decimal::new(20_000, 0),
                consultation_fees: Decimal::new(10_000, 0),
            }),
            secondary_goods: Some(Decimal::new(15_000, 0)),
        };
        let c = compute_costs(&revenue, &CostRatios::resolve(&params()));
        assert_eq!(c.cogs.core, Decimal::new(74_000, 0));
        assert_eq!(c.cogs.prescription, Some(Decimal::new(14_800, 0)));
        assert_eq!(c.cogs.secondary_goods, Some(Decimal::new(13_500, 0)));
        assert_eq!(c.total_cogs, Decimal::new(102_300, 0));
        // 145_000 * 0.04
        assert_eq!(c.variable_expenses, Decimal::new(5_800, 0));
        assert_eq!(c.gross_profit, Decimal::new(42_700, 0));
    }

    #[test]
    fn margins_follow_variant_lines() {
        let variant = BusinessModelVariant {
            id: VariantId::new("clinic"),
            name: "Clinic".to_string(),
            has_consultation_line: true,
            has_secondary_goods_line: false,
            base_investment: Decimal::new(700_000, 0),
        };
        let m = category_margins(&variant, &CostRatios::resolve(&params()));
        assert_eq!(m.core, Decimal::new(26, 2));
        assert_eq!(m.prescription, Some(Decimal::new(26, 2)));
        assert_eq!(m.secondary_goods, None);
    }
}
