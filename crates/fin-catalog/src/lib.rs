#![deny(warnings)]

//! Scenario catalog: franchise formats, tier presets and expense presets.
//!
//! The built-in catalog carries the three franchise formats with their
//! conservative, medium and aggressive presets. A catalog can also be loaded
//! from YAML; loaded catalogs are validated before use.

use fin_core::{
    validate_line_parameters, validate_parameters, validate_variant, BusinessModelVariant,
    ConsultationParams, EffectiveParameters, ExpenseLedger, ParameterOverrides,
    SecondaryGoodsParams, ScenarioPreset, ScenarioTier, ValidationError, VariantId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid catalog document: {0}")]
    Parse(String),
    #[error("duplicate variant id: {0}")]
    DuplicateVariant(String),
    #[error("unknown variant: {0}")]
    UnknownVariant(String),
    #[error("duplicate preset for {variant}/{tier}")]
    DuplicatePreset { variant: String, tier: ScenarioTier },
    #[error("no preset for {variant}/{tier}")]
    MissingPreset { variant: String, tier: ScenarioTier },
    #[error("invalid preset {variant}/{tier}: {source}")]
    InvalidPreset {
        variant: String,
        tier: ScenarioTier,
        #[source]
        source: ValidationError,
    },
    #[error("invalid variant {variant}: {source}")]
    InvalidVariant {
        variant: String,
        #[source]
        source: ValidationError,
    },
    #[error("unknown growth preset: {0}")]
    UnknownGrowthPreset(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(e: serde_yaml::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

/// Monthly growth expectation offered to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthPreset {
    /// 1% per month.
    Slow,
    /// 3% per month.
    Moderate,
    /// 5% per month.
    Aggressive,
}

impl GrowthPreset {
    pub const ALL: [GrowthPreset; 3] = [
        GrowthPreset::Slow,
        GrowthPreset::Moderate,
        GrowthPreset::Aggressive,
    ];

    pub fn monthly_rate(self) -> Decimal {
        match self {
            GrowthPreset::Slow => Decimal::new(1, 2),
            GrowthPreset::Moderate => Decimal::new(3, 2),
            GrowthPreset::Aggressive => Decimal::new(5, 2),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GrowthPreset::Slow => "slow",
            GrowthPreset::Moderate => "moderate",
            GrowthPreset::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for GrowthPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrowthPreset {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(GrowthPreset::Slow),
            "moderate" => Ok(GrowthPreset::Moderate),
            "aggressive" => Ok(GrowthPreset::Aggressive),
            other => Err(CatalogError::UnknownGrowthPreset(other.to_string())),
        }
    }
}

/// Default fixed-expense items for a variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpensePreset {
    pub variant: VariantId,
    pub items: ExpenseLedger,
}

/// Read-only table of variants and presets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCatalog {
    pub variants: Vec<BusinessModelVariant>,
    pub presets: Vec<ScenarioPreset>,
    #[serde(default)]
    pub expense_presets: Vec<ExpensePreset>,
}

/// A variant, its preset and the parameters after overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<'a> {
    pub variant: &'a BusinessModelVariant,
    pub preset: &'a ScenarioPreset,
    pub parameters: EffectiveParameters,
}

impl ScenarioCatalog {
    pub fn variant(&self, id: &str) -> Option<&BusinessModelVariant> {
        self.variants.iter().find(|v| v.id.0 == id)
    }

    pub fn preset(&self, variant: &str, tier: ScenarioTier) -> Option<&ScenarioPreset> {
        self.presets
            .iter()
            .find(|p| p.variant.0 == variant && p.tier == tier)
    }

    /// Fresh, caller-owned ledger seeded from the variant's expense preset.
    /// Empty when the catalog has none for that variant.
    pub fn default_ledger(&self, variant: &str) -> ExpenseLedger {
        self.expense_presets
            .iter()
            .find(|e| e.variant.0 == variant)
            .map(|e| e.items.clone())
            .unwrap_or_default()
    }

    /// Look up a variant and tier and apply caller overrides.
    pub fn select(
        &self,
        variant: &str,
        tier: ScenarioTier,
        overrides: &ParameterOverrides,
    ) -> Result<Selection<'_>, CatalogError> {
        let v = self
            .variant(variant)
            .ok_or_else(|| CatalogError::UnknownVariant(variant.to_string()))?;
        let preset = self
            .preset(variant, tier)
            .ok_or_else(|| CatalogError::MissingPreset {
                variant: variant.to_string(),
                tier,
            })?;
        if !overrides.is_empty() {
            debug!(variant, %tier, ?overrides, "applying parameter overrides");
        }
        Ok(Selection {
            variant: v,
            preset,
            parameters: preset.effective(overrides),
        })
    }

    /// Check ids, cross-references and every preset's parameter domains.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut ids: BTreeSet<&str> = BTreeSet::new();
        for v in &self.variants {
            if !ids.insert(v.id.0.as_str()) {
                return Err(CatalogError::DuplicateVariant(v.id.0.clone()));
            }
            validate_variant(v).map_err(|source| CatalogError::InvalidVariant {
                variant: v.id.0.clone(),
                source,
            })?;
        }

        let mut seen: BTreeSet<(&str, ScenarioTier)> = BTreeSet::new();
        for p in &self.presets {
            let variant = self
                .variant(&p.variant.0)
                .ok_or_else(|| CatalogError::UnknownVariant(p.variant.0.clone()))?;
            if !seen.insert((p.variant.0.as_str(), p.tier)) {
                return Err(CatalogError::DuplicatePreset {
                    variant: p.variant.0.clone(),
                    tier: p.tier,
                });
            }
            let invalid = |source| CatalogError::InvalidPreset {
                variant: p.variant.0.clone(),
                tier: p.tier,
                source,
            };
            validate_parameters(&p.parameters).map_err(invalid)?;
            validate_line_parameters(variant, &p.parameters).map_err(invalid)?;
            fin_core::check_money("baseline_fixed_expenses", p.baseline_fixed_expenses)
                .map_err(invalid)?;
        }

        for e in &self.expense_presets {
            if self.variant(&e.variant.0).is_none() {
                return Err(CatalogError::UnknownVariant(e.variant.0.clone()));
            }
        }
        Ok(())
    }

    /// Parse and validate a YAML catalog document.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: ScenarioCatalog = serde_yaml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_yaml_string(&self) -> Result<String, CatalogError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load a catalog file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&text)?;
        info!(
            path = %path.display(),
            variants = catalog.variants.len(),
            presets = catalog.presets.len(),
            "loaded scenario catalog"
        );
        Ok(catalog)
    }

    /// The three franchise formats and their nine presets.
    pub fn builtin() -> Self {
        let variants = vec![
            variant("mini", "Mini pharmacy", false, false, 570_000),
            variant("clinic", "Pharmacy with clinic", true, false, 700_000),
            variant("super", "Pharmacy, clinic and groceries", true, true, 950_000),
        ];

        use ScenarioTier::{Aggressive, Conservative, Medium};
        let presets = vec![
            preset("mini", Conservative, 22_000, base(30, 8, 75, 72, 3, 15)),
            preset("mini", Medium, 28_000, base(60, 12, 95, 68, 5, 30)),
            preset("mini", Aggressive, 35_000, base(100, 16, 120, 65, 7, 45)),
            preset(
                "clinic",
                Conservative,
                35_000,
                base(45, 9, 85, 70, 4, 20).with_consultation(consult(8, 40, 60, 120, 62)),
            ),
            preset(
                "clinic",
                Medium,
                45_000,
                base(80, 13, 110, 67, 6, 35).with_consultation(consult(15, 60, 72, 180, 58)),
            ),
            preset(
                "clinic",
                Aggressive,
                58_000,
                base(140, 17, 150, 63, 8, 50).with_consultation(consult(25, 85, 85, 250, 55)),
            ),
            preset(
                "super",
                Conservative,
                48_000,
                base(60, 10, 90, 74, 4, 25)
                    .with_consultation(consult(10, 45, 65, 140, 62))
                    .with_secondary(groceries(15, 90)),
            ),
            preset(
                "super",
                Medium,
                62_000,
                base(110, 14, 120, 69, 6, 40)
                    .with_consultation(consult(18, 70, 75, 200, 58))
                    .with_secondary(groceries(22, 88)),
            ),
            preset(
                "super",
                Aggressive,
                78_000,
                base(180, 18, 165, 65, 8, 55)
                    .with_consultation(consult(30, 100, 88, 280, 55))
                    .with_secondary(groceries(32, 85)),
            ),
        ];

        let expense_presets = vec![
            expenses(
                "mini",
                &[
                    ("Rent", 8_000),
                    ("Payroll", 6_000),
                    ("Electricity", 1_500),
                    ("Internet/Phone", 500),
                    ("Accountant", 1_000),
                    ("Insurance", 500),
                    ("Cleaning", 500),
                ],
            ),
            expenses(
                "clinic",
                &[
                    ("Rent", 12_000),
                    ("Pharmacy payroll", 8_000),
                    ("Doctor payroll", 10_000),
                    ("Electricity", 2_500),
                    ("Internet/Phone", 800),
                    ("Accountant", 1_500),
                    ("Insurance", 1_200),
                    ("Cleaning", 800),
                    ("Medical supplies", 1_200),
                ],
            ),
            expenses(
                "super",
                &[
                    ("Rent", 18_000),
                    ("Pharmacy payroll", 10_000),
                    ("Doctor payroll", 10_000),
                    ("Grocery payroll", 5_000),
                    ("Electricity", 4_000),
                    ("Internet/Phone", 1_000),
                    ("Accountant", 2_000),
                    ("Insurance", 1_500),
                    ("Cleaning", 1_200),
                    ("Medical supplies", 1_300),
                ],
            ),
        ];

        Self {
            variants,
            presets,
            expense_presets,
        }
    }
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn variant(
    id: &str,
    name: &str,
    consultation: bool,
    secondary: bool,
    investment: i64,
) -> BusinessModelVariant {
    BusinessModelVariant {
        id: VariantId::new(id),
        name: name.to_string(),
        has_consultation_line: consultation,
        has_secondary_goods_line: secondary,
        base_investment: Decimal::new(investment, 0),
    }
}

fn preset(
    variant: &str,
    tier: ScenarioTier,
    fixed: i64,
    parameters: EffectiveParameters,
) -> ScenarioPreset {
    ScenarioPreset {
        variant: VariantId::new(variant),
        tier,
        baseline_fixed_expenses: Decimal::new(fixed, 0),
        parameters,
    }
}

/// Percentages are whole points except growth, given in tenths of a point.
fn base(
    traffic: u32,
    conversion_pct: i64,
    ticket: i64,
    cogs_pct: i64,
    variable_pct: i64,
    growth_permille: i64,
) -> EffectiveParameters {
    EffectiveParameters {
        hourly_traffic: traffic,
        conversion_rate: Decimal::new(conversion_pct, 2),
        average_ticket: Decimal::new(ticket, 0),
        core_cogs_ratio: Decimal::new(cogs_pct, 2),
        variable_expense_ratio: Decimal::new(variable_pct, 2),
        monthly_growth_rate: Decimal::new(growth_permille, 3),
        consultation: None,
        secondary_goods: None,
    }
}

fn consult(
    per_day: u32,
    fee: i64,
    attach_pct: i64,
    prescription_ticket: i64,
    cogs_pct: i64,
) -> ConsultationParams {
    ConsultationParams {
        consultations_per_day: per_day,
        consultation_fee: Decimal::new(fee, 0),
        attach_rate: Decimal::new(attach_pct, 2),
        prescription_ticket: Decimal::new(prescription_ticket, 0),
        prescription_cogs_ratio: Some(Decimal::new(cogs_pct, 2)),
    }
}

fn groceries(share_pct: i64, cogs_pct: i64) -> SecondaryGoodsParams {
    SecondaryGoodsParams {
        share_of_core: Decimal::new(share_pct, 2),
        cogs_ratio: Some(Decimal::new(cogs_pct, 2)),
    }
}

fn expenses(variant: &str, items: &[(&str, i64)]) -> ExpensePreset {
    let ledger = ExpenseLedger::from_items(
        items
            .iter()
            .map(|(name, amount)| (*name, Decimal::new(*amount, 0))),
    )
    .expect("builtin expense names are unique");
    ExpensePreset {
        variant: VariantId::new(variant),
        items: ledger,
    }
}

trait WithLines {
    fn with_consultation(self, c: ConsultationParams) -> Self;
    fn with_secondary(self, s: SecondaryGoodsParams) -> Self;
}

impl WithLines for EffectiveParameters {
    fn with_consultation(mut self, c: ConsultationParams) -> Self {
        self.consultation = Some(c);
        self
    }

    fn with_secondary(mut self, s: SecondaryGoodsParams) -> Self {
        self.secondary_goods = Some(s);
        self
    }
}
