#![deny(warnings)]

//! Core domain models and invariants for the franchise projection.
//!
//! This crate defines the serializable inputs of the projection engine:
//! business-model variants, scenario tiers and presets, the effective
//! parameter set with its optional revenue lines, caller-side overrides and
//! the fixed-expense ledger. Validation helpers guard numeric domains before
//! any figure is computed.

mod ledger;

pub use ledger::{ExpenseLedger, ExpenseLineItem, LedgerError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opening hours per day assumed by the revenue model.
pub const OPERATING_HOURS_PER_DAY: u32 = 12;
/// Trading days per month assumed by the revenue model.
pub const OPERATING_DAYS_PER_MONTH: u32 = 28;
/// Number of rows in a forward projection.
pub const PROJECTION_MONTHS: usize = 12;
/// Longest horizon the projection engine accepts.
pub const MAX_PROJECTION_MONTHS: usize = 36;

/// Identifier of a franchise format, e.g. "mini", "clinic", "super".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantId(pub String);

impl VariantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A franchise format and the optional revenue lines it operates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessModelVariant {
    /// Catalog key.
    pub id: VariantId,
    /// Display name.
    pub name: String,
    /// Medical consultation room with prescription-attached sales.
    pub has_consultation_line: bool,
    /// Grocery/convenience goods sold alongside the pharmacy.
    pub has_secondary_goods_line: bool,
    /// Up-front investment to open the store (>= 0).
    pub base_investment: Decimal,
}

/// Named scenario tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioTier {
    /// New or contested location, low foot traffic.
    Conservative,
    /// Most likely outcome.
    Medium,
    /// Prime location, loyal clientele.
    Aggressive,
}

impl ScenarioTier {
    pub const ALL: [ScenarioTier; 3] = [
        ScenarioTier::Conservative,
        ScenarioTier::Medium,
        ScenarioTier::Aggressive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioTier::Conservative => "conservative",
            ScenarioTier::Medium => "medium",
            ScenarioTier::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for ScenarioTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(ScenarioTier::Conservative),
            "medium" => Ok(ScenarioTier::Medium),
            "aggressive" => Ok(ScenarioTier::Aggressive),
            other => Err(ValidationError::UnknownTier(other.to_string())),
        }
    }
}

/// Parameters of the consultation room line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsultationParams {
    /// Consultations per trading day.
    pub consultations_per_day: u32,
    /// Fee charged per consultation.
    pub consultation_fee: Decimal,
    /// Share of consultations that fill their prescription in store, in [0,1].
    pub attach_rate: Decimal,
    /// Average ticket of a prescription purchase.
    pub prescription_ticket: Decimal,
    /// Prescription cost-of-goods ratio; falls back to the core ratio.
    #[serde(default)]
    pub prescription_cogs_ratio: Option<Decimal>,
}

impl ConsultationParams {
    /// Effective prescription COGS ratio given the mandatory core ratio.
    pub fn cogs_ratio(&self, core_cogs_ratio: Decimal) -> Decimal {
        self.prescription_cogs_ratio.unwrap_or(core_cogs_ratio)
    }
}

/// Parameters of the secondary goods (grocery) line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecondaryGoodsParams {
    /// Secondary sales as a share of core retail revenue, in [0,1).
    pub share_of_core: Decimal,
    /// Secondary cost-of-goods ratio; falls back to the core ratio.
    #[serde(default)]
    pub cogs_ratio: Option<Decimal>,
}

impl SecondaryGoodsParams {
    /// Effective secondary COGS ratio given the mandatory core ratio.
    pub fn cogs_ratio(&self, core_cogs_ratio: Decimal) -> Decimal {
        self.cogs_ratio.unwrap_or(core_cogs_ratio)
    }
}

/// The parameter set the engine consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectiveParameters {
    /// People passing the storefront per hour.
    pub hourly_traffic: u32,
    /// Share of passers-by who buy, in [0,1].
    pub conversion_rate: Decimal,
    /// Average pharmacy ticket.
    pub average_ticket: Decimal,
    /// Core retail cost-of-goods ratio, in [0,1).
    pub core_cogs_ratio: Decimal,
    /// Transaction-linked expenses as a share of revenue, in [0,1).
    pub variable_expense_ratio: Decimal,
    /// Compounded monthly growth rate, in [0,1).
    pub monthly_growth_rate: Decimal,
    #[serde(default)]
    pub consultation: Option<ConsultationParams>,
    #[serde(default)]
    pub secondary_goods: Option<SecondaryGoodsParams>,
}

/// Read-only preset for one (variant, tier) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPreset {
    pub variant: VariantId,
    pub tier: ScenarioTier,
    /// Monthly fixed expenses assumed when no ledger is supplied.
    pub baseline_fixed_expenses: Decimal,
    pub parameters: EffectiveParameters,
}

impl ScenarioPreset {
    /// Preset parameters with caller overrides applied.
    pub fn effective(&self, overrides: &ParameterOverrides) -> EffectiveParameters {
        overrides.apply(&self.parameters)
    }
}

/// Caller-supplied replacements for individual preset fields.
///
/// Line-specific overrides only take effect when the base parameters carry
/// that line; they never switch a line on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterOverrides {
    pub hourly_traffic: Option<u32>,
    pub conversion_rate: Option<Decimal>,
    pub average_ticket: Option<Decimal>,
    pub core_cogs_ratio: Option<Decimal>,
    pub variable_expense_ratio: Option<Decimal>,
    pub monthly_growth_rate: Option<Decimal>,
    pub consultations_per_day: Option<u32>,
    pub consultation_fee: Option<Decimal>,
    pub attach_rate: Option<Decimal>,
    pub prescription_ticket: Option<Decimal>,
    pub prescription_cogs_ratio: Option<Decimal>,
    pub secondary_goods_share: Option<Decimal>,
    pub secondary_goods_cogs_ratio: Option<Decimal>,
}

impl ParameterOverrides {
    pub fn is_empty(&self) -> bool {
        *self == ParameterOverrides::default()
    }

    /// Produce a fresh parameter set; `base` is left untouched.
    pub fn apply(&self, base: &EffectiveParameters) -> EffectiveParameters {
        let mut out = base.clone();
        if let Some(v) = self.hourly_traffic {
            out.hourly_traffic = v;
        }
        if let Some(v) = self.conversion_rate {
            out.conversion_rate = v;
        }
        if let Some(v) = self.average_ticket {
            out.average_ticket = v;
        }
        if let Some(v) = self.core_cogs_ratio {
            out.core_cogs_ratio = v;
        }
        if let Some(v) = self.variable_expense_ratio {
            out.variable_expense_ratio = v;
        }
        if let Some(v) = self.monthly_growth_rate {
            out.monthly_growth_rate = v;
        }
        if let Some(c) = out.consultation.as_mut() {
            if let Some(v) = self.consultations_per_day {
                c.consultations_per_day = v;
            }
            if let Some(v) = self.consultation_fee {
                c.consultation_fee = v;
            }
            if let Some(v) = self.attach_rate {
                c.attach_rate = v;
            }
            if let Some(v) = self.prescription_ticket {
                c.prescription_ticket = v;
            }
            if self.prescription_cogs_ratio.is_some() {
                c.prescription_cogs_ratio = self.prescription_cogs_ratio;
            }
        }
        if let Some(s) = out.secondary_goods.as_mut() {
            if let Some(v) = self.secondary_goods_share {
                s.share_of_core = v;
            }
            if self.secondary_goods_cogs_ratio.is_some() {
                s.cogs_ratio = self.secondary_goods_cogs_ratio;
            }
        }
        out
    }
}

/// Validation errors for engine inputs.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Cost and share ratios must be within [0, 1).
    #[error("ratio `{field}` must be within [0, 1), got {value}")]
    RatioOutOfRange { field: &'static str, value: Decimal },
    /// Conversion and attach rates must be within [0, 1].
    #[error("rate `{field}` must be within [0, 1], got {value}")]
    RateOutOfRange { field: &'static str, value: Decimal },
    /// Money inputs must be non-negative.
    #[error("negative monetary value for `{field}`: {value}")]
    NegativeMoney { field: &'static str, value: Decimal },
    /// ROI and payback need a strictly positive investment.
    #[error("investment must be > 0, got {0}")]
    NonPositiveInvestment(Decimal),
    /// Seasonality multipliers scale revenue and cannot be negative.
    #[error("seasonality multiplier for month {month} must be >= 0, got {value}")]
    NegativeSeasonality { month: usize, value: Decimal },
    /// The variant enables a revenue line whose parameters are absent.
    #[error("variant `{variant}` enables the {line} line but no parameters were supplied")]
    MissingLineParameters { variant: String, line: &'static str },
    /// A seasonality vector holds exactly one multiplier per calendar month.
    #[error("seasonality needs {expected} multipliers, got {got}")]
    SeasonalityLength { expected: usize, got: usize },
    /// Projection horizon beyond what the engine models.
    #[error("projection horizon of {got} months exceeds the maximum of {max}")]
    HorizonTooLong { got: usize, max: usize },
    /// Tier name not recognised.
    #[error("unknown scenario tier: {0}")]
    UnknownTier(String),
    /// A derived figure does not fit in a `Decimal`.
    #[error("{quantity} is outside the representable range")]
    Overflow { quantity: &'static str },
}

fn check_ratio(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(ValidationError::RatioOutOfRange { field, value });
    }
    Ok(())
}

fn check_rate(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::RateOutOfRange { field, value });
    }
    Ok(())
}

/// Reject negative money.
pub fn check_money(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney { field, value });
    }
    Ok(())
}

/// Validate the investment used for ROI and payback.
pub fn validate_investment(investment: Decimal) -> Result<(), ValidationError> {
    if investment <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveInvestment(investment));
    }
    Ok(())
}

/// Validate a consultation line.
pub fn validate_consultation(c: &ConsultationParams) -> Result<(), ValidationError> {
    check_money("consultation_fee", c.consultation_fee)?;
    check_rate("attach_rate", c.attach_rate)?;
    check_money("prescription_ticket", c.prescription_ticket)?;
    if let Some(r) = c.prescription_cogs_ratio {
        check_ratio("prescription_cogs_ratio", r)?;
    }
    Ok(())
}

/// Validate a secondary goods line.
pub fn validate_secondary_goods(s: &SecondaryGoodsParams) -> Result<(), ValidationError> {
    check_ratio("secondary_goods_share", s.share_of_core)?;
    if let Some(r) = s.cogs_ratio {
        check_ratio("secondary_goods_cogs_ratio", r)?;
    }
    Ok(())
}

/// Validate the full parameter set, including any optional lines.
pub fn validate_parameters(p: &EffectiveParameters) -> Result<(), ValidationError> {
    check_rate("conversion_rate", p.conversion_rate)?;
    check_money("average_ticket", p.average_ticket)?;
    check_ratio("core_cogs_ratio", p.core_cogs_ratio)?;
    check_ratio("variable_expense_ratio", p.variable_expense_ratio)?;
    check_ratio("monthly_growth_rate", p.monthly_growth_rate)?;
    if let Some(c) = &p.consultation {
        validate_consultation(c)?;
    }
    if let Some(s) = &p.secondary_goods {
        validate_secondary_goods(s)?;
    }
    Ok(())
}

/// Validate a variant on its own.
pub fn validate_variant(v: &BusinessModelVariant) -> Result<(), ValidationError> {
    check_money("base_investment", v.base_investment)
}

/// Check that every line the variant enables has parameters.
///
/// Parameters for a line the variant does not operate are allowed and ignored.
pub fn validate_line_parameters(
    variant: &BusinessModelVariant,
    p: &EffectiveParameters,
) -> Result<(), ValidationError> {
    if variant.has_consultation_line && p.consultation.is_none() {
        return Err(ValidationError::MissingLineParameters {
            variant: variant.id.0.clone(),
            line: "consultation",
        });
    }
    if variant.has_secondary_goods_line && p.secondary_goods.is_none() {
        return Err(ValidationError::MissingLineParameters {
            variant: variant.id.0.clone(),
            line: "secondary goods",
        });
    }
    Ok(())
}
