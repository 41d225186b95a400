//! Monthly revenue by stream.

use crate::checked;
use fin_core::{
    check_money, validate_line_parameters, BusinessModelVariant, EffectiveParameters,
    ValidationError, OPERATING_DAYS_PER_MONTH, OPERATING_HOURS_PER_DAY,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// An independent revenue source with its own pricing and cost ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueStream {
    CoreRetail,
    Prescription,
    ConsultationFees,
    SecondaryGoods,
}

impl RevenueStream {
    pub fn label(self) -> &'static str {
        match self {
            RevenueStream::CoreRetail => "Pharmacy",
            RevenueStream::Prescription => "Prescriptions",
            RevenueStream::ConsultationFees => "Consultations",
            RevenueStream::SecondaryGoods => "Groceries",
        }
    }
}

impl fmt::Display for RevenueStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Footfall behind the base month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TrafficFigures {
    pub monthly_traffic: u64,
    pub converting_customers: u64,
    pub monthly_consultations: u64,
}

/// Revenue of the consultation room and the prescriptions it sends over.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ConsultationRevenue {
    pub prescription: Decimal,
    pub consultation_fees: Decimal,
}

/// Monthly revenue; optional lines are `None` when the variant lacks them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RevenueBreakdown {
    pub core: Decimal,
    pub prescription_and_consultation: Option<ConsultationRevenue>,
    pub secondary_goods: Option<Decimal>,
}

impl RevenueBreakdown {
    /// Sum of all active streams.
    pub fn total(&self) -> Decimal {
        self.streams().iter().map(|(_, v)| *v).sum()
    }

    /// Like [`total`](Self::total), but reports a sum that leaves the
    /// `Decimal` range instead of panicking.
    pub fn checked_total(&self) -> Result<Decimal, ValidationError> {
        self.streams()
            .iter()
            .try_fold(Decimal::ZERO, |acc, (_, v)| checked::add("total revenue", acc, *v))
    }

    /// Active streams in display order.
    pub fn streams(&self) -> Vec<(RevenueStream, Decimal)> {
        let mut out = vec![(RevenueStream::CoreRetail, self.core)];
        if let Some(c) = &self.prescription_and_consultation {
            out.push((RevenueStream::Prescription, c.prescription));
            out.push((RevenueStream::ConsultationFees, c.consultation_fees));
        }
        if let Some(s) = self.secondary_goods {
            out.push((RevenueStream::SecondaryGoods, s));
        }
        out
    }

    /// Each active stream as a fraction of the total; all zero without revenue.
    pub fn shares(&self) -> Vec<(RevenueStream, Decimal)> {
        let total = self.total();
        self.streams()
            .into_iter()
            .map(|(s, v)| {
                let share = if total > Decimal::ZERO {
                    v / total
                } else {
                    Decimal::ZERO
                };
                (s, share)
            })
            .collect()
    }

    /// Every stream multiplied by the same factor.
    pub fn scaled(&self, factor: Decimal) -> Result<Self, ValidationError> {
        let scale = |v: Decimal| checked::mul("scaled revenue", v, factor);
        let out = Self {
            core: scale(self.core)?,
            prescription_and_consultation: match self.prescription_and_consultation {
                Some(c) => Some(ConsultationRevenue {
                    prescription: scale(c.prescription)?,
                    consultation_fees: scale(c.consultation_fees)?,
                }),
                None => None,
            },
            secondary_goods: self.secondary_goods.map(scale).transpose()?,
        };
        out.checked_total()?;
        Ok(out)
    }
}

/// Traffic, buyers and consultations for one month.
///
/// Buyers are floored to whole customers. Consultations count only when the
/// variant operates the consultation room.
pub fn compute_traffic(
    variant: &BusinessModelVariant,
    params: &EffectiveParameters,
) -> TrafficFigures {
    let monthly_traffic = u64::from(params.hourly_traffic)
        * u64::from(OPERATING_HOURS_PER_DAY)
        * u64::from(OPERATING_DAYS_PER_MONTH);
    let converting_customers = (Decimal::from(monthly_traffic) * params.conversion_rate)
        .floor()
        .to_u64()
        .unwrap_or(0);
    let monthly_consultations = match (&params.consultation, variant.has_consultation_line) {
        (Some(c), true) => u64::from(c.consultations_per_day) * u64::from(OPERATING_DAYS_PER_MONTH),
        _ => 0,
    };
    TrafficFigures {
        monthly_traffic,
        converting_customers,
        monthly_consultations,
    }
}

/// Base-month revenue by stream.
///
/// Rates are expected to be within their domains already; only negative
/// money and missing line parameters are rejected here, plus figures too
/// large for a `Decimal`.
pub fn compute_base_revenue(
    variant: &BusinessModelVariant,
    params: &EffectiveParameters,
) -> Result<RevenueBreakdown, ValidationError> {
    check_money("average_ticket", params.average_ticket)?;
    validate_line_parameters(variant, params)?;

    let traffic = compute_traffic(variant, params);
    let core = checked::mul(
        "core revenue",
        Decimal::from(traffic.converting_customers),
        params.average_ticket,
    )?;

    let prescription_and_consultation = match (&params.consultation, variant.has_consultation_line)
    {
        (Some(c), true) => {
            check_money("consultation_fee", c.consultation_fee)?;
            check_money("prescription_ticket", c.prescription_ticket)?;
            let consultations = Decimal::from(traffic.monthly_consultations);
            let filled = consultations * c.attach_rate;
            Some(ConsultationRevenue {
                prescription: checked::mul("prescription revenue", filled, c.prescription_ticket)?,
                consultation_fees: checked::mul(
                    "consultation revenue",
                    consultations,
                    c.consultation_fee,
                )?,
            })
        }
        _ => None,
    };

    let secondary_goods = match (&params.secondary_goods, variant.has_secondary_goods_line) {
        (Some(s), true) => Some(core * s.share_of_core),
        _ => None,
    };

    let revenue = RevenueBreakdown {
        core,
        prescription_and_consultation,
        secondary_goods,
    };
    revenue.checked_total()?;
    Ok(revenue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fin_core::{ConsultationParams, SecondaryGoodsParams, VariantId};
    use proptest::prelude::*;

    fn variant(consultation: bool, secondary: bool) -> BusinessModelVariant {
        BusinessModelVariant {
            id: VariantId::new("test"),
            name: "Test".to_string(),
            has_consultation_line: consultation,
            has_secondary_goods_line: secondary,
            base_investment: Decimal::new(950_000, 0),
        }
    }

    fn params() -> EffectiveParameters {
        EffectiveParameters {
            hourly_traffic: 110,
            conversion_rate: Decimal::new(14, 2),
            average_ticket: Decimal::new(120, 0),
            core_cogs_ratio: Decimal::new(69, 2),
            variable_expense_ratio: Decimal::new(6, 2),
            monthly_growth_rate: Decimal::new(4, 2),
            consultation: Some(ConsultationParams {
                consultations_per_day: 18,
                consultation_fee: Decimal::new(70, 0),
                attach_rate: Decimal::new(75, 2),
                prescription_ticket: Decimal::new(200, 0),
                prescription_cogs_ratio: Some(Decimal::new(58, 2)),
            }),
            secondary_goods: Some(SecondaryGoodsParams {
                share_of_core: Decimal::new(22, 2),
                cogs_ratio: Some(Decimal::new(88, 2)),
            }),
        }
    }

    #[test]
    fn traffic_uses_fixed_opening_hours_and_days() {
        let t = compute_traffic(&variant(true, true), &params());
        assert_eq!(t.monthly_traffic, 110 * 12 * 28);
        // 36_960 * 0.14 = 5174.4
        assert_eq!(t.converting_customers, 5174);
        assert_eq!(t.monthly_consultations, 18 * 28);
    }

    #[test]
    fn all_four_streams() {
        let r = compute_base_revenue(&variant(true, true), &params()).unwrap();
        assert_eq!(r.core, Decimal::new(620_880, 0));
        let c = r.prescription_and_consultation.unwrap();
        // 504 consultations * 0.75 * 200
        assert_eq!(c.prescription, Decimal::new(75_600, 0));
        assert_eq!(c.consultation_fees, Decimal::new(35_280, 0));
        assert_eq!(r.secondary_goods, Some(Decimal::new(136_593_60, 2)));
        assert_eq!(
            r.total(),
            Decimal::new(620_880, 0)
                + Decimal::new(75_600, 0)
                + Decimal::new(35_280, 0)
                + Decimal::new(136_593_60, 2)
        );
        assert_eq!(r.streams().len(), 4);
    }

    #[test]
    fn inactive_lines_are_absent_even_with_parameters() {
        let r = compute_base_revenue(&variant(false, false), &params()).unwrap();
        assert!(r.prescription_and_consultation.is_none());
        assert!(r.secondary_goods.is_none());
        assert_eq!(r.total(), r.core);
        assert_eq!(compute_traffic(&variant(false, false), &params()).monthly_consultations, 0);
    }

    #[test]
    fn enabled_line_without_parameters_fails() {
        let mut p = params();
        p.secondary_goods = None;
        assert!(compute_base_revenue(&variant(true, true), &p).is_err());
    }

    #[test]
    fn negative_money_fails() {
        let mut p = params();
        p.consultation.as_mut().unwrap().consultation_fee = Decimal::new(-40, 0);
        assert!(matches!(
            compute_base_revenue(&variant(true, false), &p),
            Err(ValidationError::NegativeMoney {
                field: "consultation_fee",
                ..
            })
        ));
    }

    #[test]
    fn zero_traffic_means_zero_core_revenue() {
        let mut p = params();
        p.hourly_traffic = 0;
        let r = compute_base_revenue(&variant(false, false), &p).unwrap();
        assert_eq!(r.total(), Decimal::ZERO);
        assert!(r.shares().iter().all(|(_, s)| *s == Decimal::ZERO));
    }

    #[test]
    fn shares_sum_to_one() {
        let r = compute_base_revenue(&variant(true, true), &params()).unwrap();
        let sum: Decimal = r.shares().iter().map(|(_, s)| *s).sum();
        assert!((sum - Decimal::ONE).abs() < Decimal::new(1, 20));
    }

    proptest! {
        #[test]
        fn total_is_sum_of_streams(traffic in 0u32..500, conv in 0i64..=100, ticket in 0i64..50_000) {
            let mut p = params();
            p.hourly_traffic = traffic;
            p.conversion_rate = Decimal::new(conv, 2);
            p.average_ticket = Decimal::new(ticket, 2);
            let r = compute_base_revenue(&variant(true, true), &p).unwrap();
            let c = r.prescription_and_consultation.unwrap();
            let manual = r.core + c.prescription + c.consultation_fees + r.secondary_goods.unwrap();
            prop_assert_eq!(r.total(), manual);
            prop_assert!(r.core >= Decimal::ZERO);
        }
    }
}
