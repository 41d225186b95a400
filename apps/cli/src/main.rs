#![deny(warnings)]

//! Headless projection report for a pharmacy franchise.
//!
//! Picks a franchise format and scenario from the catalog, applies parameter
//! overrides and expense edits, runs the engine and prints the base month,
//! the KPIs and the 12-month table (or the raw result as JSON).

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::Parser;
use fin_catalog::{GrowthPreset, ScenarioCatalog};
use fin_core::{
    BusinessModelVariant, EffectiveParameters, ExpenseLedger, ParameterOverrides, ScenarioPreset,
    ScenarioTier,
};
use fin_engine::{
    compute_financial_projection, FinancialProjection, Payback, Seasonality, SummaryOutcome,
    UnitEconomicsSummary,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Payback below this many months reads as a healthy investment.
const PAYBACK_TARGET_MONTHS: i64 = 24;
/// Paybacks at or beyond this many months are shown as n/a.
const PAYBACK_DISPLAY_LIMIT: i64 = 100;
/// Net margin under this many percent is flagged as fragile.
const THIN_MARGIN_PERCENT: i64 = 5;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")");

#[derive(Debug, Parser)]
#[command(
    name = "cli",
    about = "Monthly financials and a 12-month projection for a pharmacy franchise",
    version,
    long_version = LONG_VERSION
)]
struct Args {
    /// YAML catalog replacing the built-in presets.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Franchise format id (see --list).
    #[arg(long, default_value = "mini")]
    model: String,
    /// conservative, medium or aggressive.
    #[arg(long, default_value = "medium")]
    scenario: ScenarioTier,
    /// Print the catalog and exit.
    #[arg(long)]
    list: bool,

    /// People passing per hour.
    #[arg(long)]
    traffic: Option<u32>,
    #[arg(long)]
    conversion: Option<Decimal>,
    #[arg(long)]
    ticket: Option<Decimal>,
    #[arg(long)]
    cogs: Option<Decimal>,
    #[arg(long)]
    variable_ratio: Option<Decimal>,
    /// slow (1%), moderate (3%) or aggressive (5%) monthly growth.
    #[arg(long, conflicts_with = "growth_rate")]
    growth: Option<GrowthPreset>,
    #[arg(long)]
    growth_rate: Option<Decimal>,
    /// Consultations per day.
    #[arg(long)]
    consultations: Option<u32>,
    #[arg(long)]
    consultation_fee: Option<Decimal>,
    #[arg(long)]
    attach_rate: Option<Decimal>,
    #[arg(long)]
    prescription_ticket: Option<Decimal>,
    #[arg(long)]
    prescription_cogs: Option<Decimal>,
    #[arg(long)]
    grocery_share: Option<Decimal>,
    #[arg(long)]
    grocery_cogs: Option<Decimal>,

    /// Initial investment; defaults to the format's base investment.
    #[arg(long)]
    investment: Option<Decimal>,
    /// Monthly fixed expenses replacing the preset baseline.
    #[arg(long, conflicts_with_all = ["use_ledger", "expenses", "drop_expenses"])]
    fixed_expenses: Option<Decimal>,
    /// Use the format's itemised expense ledger instead of the baseline.
    #[arg(long)]
    use_ledger: bool,
    /// Add or change a ledger item, e.g. --expense "Advertising=1500".
    #[arg(long = "expense", value_parser = parse_expense)]
    expenses: Vec<(String, Decimal)>,
    /// Remove a ledger item by name.
    #[arg(long = "drop-expense")]
    drop_expenses: Vec<String>,

    /// Twelve comma-separated monthly multipliers.
    #[arg(long, value_delimiter = ',')]
    seasonality: Option<Vec<Decimal>>,
    /// First projected month (YYYY-MM-DD), used to label the table.
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    /// Emit the result as JSON.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            hourly_traffic: self.traffic,
            conversion_rate: self.conversion,
            average_ticket: self.ticket,
            core_cogs_ratio: self.cogs,
            variable_expense_ratio: self.variable_ratio,
            monthly_growth_rate: self
                .growth_rate
                .or_else(|| self.growth.map(GrowthPreset::monthly_rate)),
            consultations_per_day: self.consultations,
            consultation_fee: self.consultation_fee,
            attach_rate: self.attach_rate,
            prescription_ticket: self.prescription_ticket,
            prescription_cogs_ratio: self.prescription_cogs,
            secondary_goods_share: self.grocery_share,
            secondary_goods_cogs_ratio: self.grocery_cogs,
        }
    }

    /// Line-specific flags the selected model has no line for.
    fn ignored_line_flags(
        &self,
        variant: &BusinessModelVariant,
        params: &EffectiveParameters,
    ) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if !(variant.has_consultation_line && params.consultation.is_some()) {
            let flags = [
                ("--consultations", self.consultations.is_some()),
                ("--consultation-fee", self.consultation_fee.is_some()),
                ("--attach-rate", self.attach_rate.is_some()),
                ("--prescription-ticket", self.prescription_ticket.is_some()),
                ("--prescription-cogs", self.prescription_cogs.is_some()),
            ];
            ignored.extend(flags.iter().filter(|(_, set)| *set).map(|(f, _)| *f));
        }
        if !(variant.has_secondary_goods_line && params.secondary_goods.is_some()) {
            let flags = [
                ("--grocery-share", self.grocery_share.is_some()),
                ("--grocery-cogs", self.grocery_cogs.is_some()),
            ];
            ignored.extend(flags.iter().filter(|(_, set)| *set).map(|(f, _)| *f));
        }
        ignored
    }

    fn wants_ledger(&self) -> bool {
        self.use_ledger || !self.expenses.is_empty() || !self.drop_expenses.is_empty()
    }
}

fn parse_expense(s: &str) -> Result<(String, Decimal), String> {
    let (name, amount) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got `{s}`"))?;
    let amount = amount
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("invalid amount in `{s}`: {e}"))?;
    Ok((name.trim().to_string(), amount))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

/// Fixed expenses from the ledger when requested, else the preset baseline.
fn fixed_expenses(
    args: &Args,
    catalog: &ScenarioCatalog,
    preset: &ScenarioPreset,
) -> Result<(Decimal, Option<ExpenseLedger>)> {
    if !args.wants_ledger() {
        let fixed = args
            .fixed_expenses
            .unwrap_or(preset.baseline_fixed_expenses);
        return Ok((fixed, None));
    }
    let mut ledger = catalog.default_ledger(&args.model);
    for name in &args.drop_expenses {
        ledger.remove(name)?;
    }
    for (name, amount) in &args.expenses {
        ledger.upsert(name, *amount)?;
    }
    if ledger.is_empty() {
        warn!(model = %args.model, "expense ledger is empty, fixed expenses are zero");
    }
    Ok((ledger.total(), Some(ledger)))
}

#[derive(Serialize)]
struct Report<'a> {
    model: &'a str,
    scenario: ScenarioTier,
    investment: Decimal,
    fixed_expense_items: Option<&'a ExpenseLedger>,
    #[serde(flatten)]
    result: &'a FinancialProjection,
}

/// Half away from zero, without a negative zero.
fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let r = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if r.is_zero() {
        Decimal::ZERO
    } else {
        r
    }
}

fn money(value: Decimal) -> String {
    let rounded = round_half_up(value, 0);
    let negative = rounded < Decimal::ZERO;
    let digits = rounded.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}", if negative { "-" } else { "" }, grouped)
}

fn count(value: u64) -> String {
    money(Decimal::from(value)).replacen('$', "", 1)
}

fn pct(ratio: Decimal) -> String {
    format!("{:.1}%", round_half_up(ratio * Decimal::ONE_HUNDRED, 1))
}

fn add_months(start: NaiveDate, months: u32) -> NaiveDate {
    let total = start.month0() + months;
    let year = start.year() + (total / 12) as i32;
    NaiveDate::from_ymd_opt(year, total % 12 + 1, 1).unwrap_or(start)
}

fn month_label(start: Option<NaiveDate>, index: u32) -> String {
    match start {
        Some(d) => {
            let m = add_months(d, index - 1);
            format!("{:04}-{:02}", m.year(), m.month())
        }
        None => index.to_string(),
    }
}

enum Verdict {
    Profitable,
    SlowPayback,
    Unprofitable,
}

fn verdict(net_profit: Decimal, payback: &Payback) -> Verdict {
    match payback.months() {
        Some(m) if m < Decimal::from(PAYBACK_TARGET_MONTHS) => Verdict::Profitable,
        _ if net_profit > Decimal::ZERO => Verdict::SlowPayback,
        _ => Verdict::Unprofitable,
    }
}

fn payback_text(payback: &Payback) -> String {
    match payback.months() {
        Some(m) if m < Decimal::from(PAYBACK_DISPLAY_LIMIT) => {
            format!("{:.1} months", round_half_up(m, 1))
        }
        _ => "n/a".to_string(),
    }
}

/// Advisory notes on a feasible result.
fn warnings(out: &FinancialProjection, summary: &UnitEconomicsSummary) -> Vec<String> {
    let mut notes = Vec::new();
    let slow = match summary.payback.months() {
        Some(m) => m > Decimal::from(PAYBACK_TARGET_MONTHS),
        None => true,
    };
    if slow {
        notes.push(
            "the investment takes more than 2 years to recover; look for ways to improve"
                .to_string(),
        );
    }
    let needed: u64 = summary
        .break_even_customers
        .trunc()
        .try_into()
        .unwrap_or(u64::MAX);
    let projected = out.traffic.converting_customers;
    if projected < needed {
        notes.push(format!(
            "{} customers are needed to break even but only {} are projected",
            count(needed),
            count(projected)
        ));
    }
    let m = &out.base_month;
    if m.net_margin < Decimal::new(THIN_MARGIN_PERCENT, 2) && m.net_profit > Decimal::ZERO {
        notes.push(
            "net margin is below 5%; any surprise can turn the month into a loss".to_string(),
        );
    }
    notes
}

fn print_catalog(catalog: &ScenarioCatalog) {
    for v in &catalog.variants {
        let mut lines = vec!["pharmacy"];
        if v.has_consultation_line {
            lines.push("consultations");
        }
        if v.has_secondary_goods_line {
            lines.push("groceries");
        }
        println!(
            "{} | {} | investment: {} | lines: {}",
            v.id,
            v.name,
            money(v.base_investment),
            lines.join(", ")
        );
        for tier in ScenarioTier::ALL {
            if let Some(p) = catalog.preset(&v.id.0, tier) {
                println!(
                    "  {:<12} traffic/h: {:>4} | conversion: {:>6} | ticket: {:>6} | fixed: {}",
                    tier.as_str(),
                    p.parameters.hourly_traffic,
                    pct(p.parameters.conversion_rate),
                    money(p.parameters.average_ticket),
                    money(p.baseline_fixed_expenses)
                );
            }
        }
    }
    let growth: Vec<String> = GrowthPreset::ALL
        .iter()
        .map(|g| format!("{} ({})", g, pct(g.monthly_rate())))
        .collect();
    println!("growth presets: {}", growth.join(", "));
}

fn print_base_month(name: &str, args: &Args, investment: Decimal, out: &FinancialProjection) {
    let m = &out.base_month;
    println!(
        "{} | scenario: {} | investment: {}",
        name,
        args.scenario,
        money(investment)
    );
    println!(
        "Traffic | per month: {} | buyers: {} | consultations: {}",
        count(out.traffic.monthly_traffic),
        count(out.traffic.converting_customers),
        count(out.traffic.monthly_consultations)
    );
    let revenue: Vec<String> = m
        .revenue
        .shares()
        .into_iter()
        .zip(m.revenue.streams())
        .map(|((stream, share), (_, value))| {
            format!("{}: {} ({})", stream, money(value), pct(share))
        })
        .collect();
    println!(
        "Revenue | {} | total: {}",
        revenue.join(" | "),
        money(m.total_revenue)
    );
    println!(
        "Costs | goods: {} | fixed: {} | variable: {} | total: {}",
        money(m.costs.total_cogs),
        money(m.fixed_expenses),
        money(m.costs.variable_expenses),
        money(m.costs.total_cogs + m.fixed_expenses + m.costs.variable_expenses)
    );
    let mut margins = vec![format!("pharmacy: {}", pct(out.category_margins.core))];
    if let Some(p) = out.category_margins.prescription {
        margins.push(format!("prescriptions: {}", pct(p)));
    }
    if let Some(s) = out.category_margins.secondary_goods {
        margins.push(format!("groceries: {}", pct(s)));
    }
    println!("Gross margins | {}", margins.join(" | "));
}

fn print_projection(args: &Args, out: &FinancialProjection) {
    println!(
        "{:>7} {:>12} {:>12} {:>12} {:>10} {:>10} {:>12} {:>7}",
        "Month", "Revenue", "COGS", "Gross", "Fixed", "Variable", "Net", "Margin"
    );
    for row in &out.projection {
        let f = &row.figures;
        println!(
            "{:>7} {:>12} {:>12} {:>12} {:>10} {:>10} {:>12} {:>7}",
            month_label(args.start, row.month_index),
            money(f.total_revenue),
            money(f.costs.total_cogs),
            money(f.costs.gross_profit),
            money(f.fixed_expenses),
            money(f.costs.variable_expenses),
            money(f.net_profit),
            pct(f.net_margin)
        );
    }
    println!(
        "Year | revenue: {} | net profit: {}",
        money(out.annual_totals.revenue),
        money(out.annual_totals.net_profit)
    );
}

fn main() -> Result<()> {
    // Logging setup; reports go to stdout, logs to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!(model = %args.model, scenario = %args.scenario, "starting projection");

    let catalog = match &args.catalog {
        Some(path) => ScenarioCatalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => ScenarioCatalog::builtin(),
    };
    if args.list {
        print_catalog(&catalog);
        return Ok(());
    }

    let selection = catalog.select(&args.model, args.scenario, &args.overrides())?;
    let ignored = args.ignored_line_flags(selection.variant, &selection.parameters);
    if !ignored.is_empty() {
        warn!(
            model = %args.model,
            flags = %ignored.join(" "),
            "model has no matching revenue line, ignoring flags"
        );
    }
    let (fixed, ledger) = fixed_expenses(&args, &catalog, selection.preset)?;
    let investment = args
        .investment
        .unwrap_or(selection.variant.base_investment);
    let seasonality = match &args.seasonality {
        Some(values) => Seasonality::try_from(values.as_slice())?,
        None => Seasonality::flat(),
    };

    let out = compute_financial_projection(
        selection.variant,
        &selection.parameters,
        fixed,
        investment,
        &seasonality,
    )
    .context("computing projection")?;
    info!(
        revenue = %out.base_month.total_revenue,
        net_profit = %out.base_month.net_profit,
        feasible = out.is_feasible(),
        "projection computed"
    );

    if args.json {
        let report = Report {
            model: &args.model,
            scenario: args.scenario,
            investment,
            fixed_expense_items: ledger.as_ref(),
            result: &out,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_base_month(&selection.variant.name, &args, investment, &out);
    if let Some(ledger) = &ledger {
        let items: Vec<String> = ledger
            .items()
            .iter()
            .map(|i| format!("{}: {}", i.name, money(i.monthly_amount)))
            .collect();
        println!("Fixed expense items | {}", items.join(" | "));
    }

    let summary = match &out.summary {
        SummaryOutcome::Feasible(s) => s,
        SummaryOutcome::Infeasible(marker) => bail!(
            "contribution margin of {} leaves nothing to cover fixed expenses; \
             costs are too high for this business to break even",
            pct(marker.contribution_margin_ratio)
        ),
    };

    let net = out.base_month.net_profit;
    match verdict(net, &summary.payback) {
        Verdict::Profitable => println!(
            "Verdict | PROFITABLE: {} per month, investment back in {}",
            money(net),
            payback_text(&summary.payback)
        ),
        Verdict::SlowPayback => println!(
            "Verdict | PROFITABLE BUT SLOW: {} per month, investment back in {}",
            money(net),
            payback_text(&summary.payback)
        ),
        Verdict::Unprofitable => println!(
            "Verdict | NOT PROFITABLE: losing {} per month",
            money(net.abs())
        ),
    }
    println!(
        "KPI | net profit: {} | net margin: {} | break-even: {} ({} buyers) | payback: {} | ROI: {}",
        money(net),
        pct(out.base_month.net_margin),
        money(summary.break_even_revenue),
        count(
            summary
                .break_even_customers
                .ceil()
                .try_into()
                .unwrap_or(u64::MAX)
        ),
        payback_text(&summary.payback),
        pct(summary.roi_annual)
    );
    for note in warnings(&out, summary) {
        println!("Warning | {}", note);
    }
    print_projection(&args, &out);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn percentages_round_half_up() {
        assert_eq!(pct(d("0.16666")), "16.7%");
        assert_eq!(pct(d("0.01675")), "1.7%");
        assert_eq!(pct(d("0.00025")), "0.0%");
        assert_eq!(pct(d("-0.0005")), "-0.1%");
        assert_eq!(pct(d("-0.0004")), "0.0%");
        assert_eq!(pct(d("0.27")), "27.0%");
    }

    #[test]
    fn payback_rounds_and_caps() {
        assert_eq!(payback_text(&Payback::Months(d("16.666"))), "16.7 months");
        assert_eq!(payback_text(&Payback::Months(d("1.65"))), "1.7 months");
        assert_eq!(payback_text(&Payback::Months(d("100"))), "n/a");
        assert_eq!(payback_text(&Payback::NotRecoverable), "n/a");
    }

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(d("229805")), "$229,805");
        assert_eq!(money(d("34047.5")), "$34,048");
        assert_eq!(money(d("-1874.8")), "-$1,875");
        assert_eq!(money(d("-0.4")), "$0");
        assert_eq!(count(1_000), "1,000");
    }

    #[test]
    fn months_roll_over_the_year() {
        let start = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        assert_eq!(month_label(Some(start), 1), "2025-11");
        assert_eq!(month_label(Some(start), 3), "2026-01");
        assert_eq!(month_label(None, 7), "7");
    }
}
