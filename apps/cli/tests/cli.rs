use assert_fs::prelude::*;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    assert_cmd::cargo_bin_cmd!("cli")
}

#[test]
fn help_lists_options() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--seasonality"));
}

#[test]
fn default_run_reports_mini_medium() {
    cli()
        .assert()
        .success()
        .stdout(predicate::str::contains("Mini pharmacy | scenario: medium"))
        .stdout(predicate::str::contains("buyers: 2,419"))
        .stdout(predicate::str::contains("total: $229,805"))
        .stdout(predicate::str::contains("PROFITABLE: $34,047 per month"))
        .stdout(predicate::str::contains("payback: 16.7 months"))
        .stdout(predicate::str::contains("Year | revenue:"));
}

#[test]
fn json_output_is_machine_readable() {
    let out = cli().arg("--json").output().unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["model"], "mini");
    assert_eq!(v["scenario"], "medium");
    assert_eq!(v["base_month"]["total_revenue"], "229805");
    assert_eq!(v["summary"]["status"], "feasible");
    assert_eq!(v["projection"].as_array().unwrap().len(), 12);
    assert!(v["fixed_expense_items"].is_null());
}

#[test]
fn ledger_replaces_baseline_expenses() {
    cli()
        .args(["--use-ledger"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fixed: $18,000"))
        .stdout(predicate::str::contains("Rent: $8,000"));

    cli()
        .args(["--expense", "Advertising=2000", "--drop-expense", "Cleaning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fixed: $19,500"))
        .stdout(predicate::str::contains("Advertising: $2,000"))
        .stdout(predicate::str::contains("Cleaning").not());
}

#[test]
fn dropping_unknown_expense_fails() {
    cli()
        .args(["--drop-expense", "Yacht"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Yacht"));
}

#[test]
fn infeasible_costs_show_base_month_then_fail() {
    cli()
        .args(["--cogs", "0.95", "--variable-ratio", "0.05"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("total: $229,805"))
        .stdout(predicate::str::contains("Verdict").not())
        .stderr(predicate::str::contains("contribution margin"));
}

#[test]
fn verdict_buckets() {
    cli()
        .args(["--investment", "5000000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROFITABLE BUT SLOW"))
        .stdout(predicate::str::contains("payback: n/a"));

    cli()
        .args(["--fixed-expenses", "100000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NOT PROFITABLE"))
        .stdout(predicate::str::contains("payback: n/a"));
}

#[test]
fn invalid_inputs_are_rejected() {
    cli()
        .args(["--conversion", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conversion_rate"));

    cli()
        .args(["--seasonality", "1,1,1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("seasonality needs 12 multipliers, got 3"));

    cli()
        .args(["--model", "megastore"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown variant: megastore"));

    cli()
        .args(["--fixed-expenses", "1000", "--use-ledger"])
        .assert()
        .failure();
}

#[test]
fn start_date_labels_months() {
    cli()
        .args(["--start", "2025-11-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-11"))
        .stdout(predicate::str::contains("2026-10"));
}

#[test]
fn growth_preset_and_seasonality() {
    let out = cli()
        .args([
            "--growth",
            "slow",
            "--seasonality",
            "1,1,1,1,1,1,1,1,1,1,1,2",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = v["projection"].as_array().unwrap();
    assert_eq!(rows[1]["growth_factor"], "1.01");
    let december: f64 = rows[11]["growth_factor"].as_str().unwrap().parse().unwrap();
    assert!(december > 2.2);
}

#[test]
fn list_shows_catalog() {
    cli()
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("clinic | Pharmacy with clinic"))
        .stdout(predicate::str::contains("lines: pharmacy, consultations, groceries"))
        .stdout(predicate::str::contains("moderate (3.0%)"));
}

#[test]
fn custom_catalog_file() {
    let catalog = assert_fs::NamedTempFile::new("catalog.yaml").unwrap();
    catalog
        .write_str(
            r#"
variants:
  - id: kiosk
    name: Kiosk
    has_consultation_line: false
    has_secondary_goods_line: false
    base_investment: 250000
presets:
  - variant: kiosk
    tier: medium
    baseline_fixed_expenses: 12000
    parameters:
      hourly_traffic: 40
      conversion_rate: "0.1"
      average_ticket: 80
      core_cogs_ratio: "0.7"
      variable_expense_ratio: "0.04"
      monthly_growth_rate: "0.02"
"#,
        )
        .unwrap();

    cli()
        .args(["--catalog", catalog.path().to_str().unwrap(), "--model", "kiosk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kiosk | scenario: medium"))
        .stdout(predicate::str::contains("total: $107,520"));

    cli()
        .args(["--catalog", "/nonexistent/catalog.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading catalog"));
}

#[test]
fn version_embeds_commit() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("cli 0.1.0 ("));
}

#[test]
fn extreme_ticket_reports_overflow() {
    cli()
        .args(["--ticket", "100000000000000000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "core revenue is outside the representable range",
        ));
}

#[test]
fn advisory_warnings() {
    cli()
        .args(["--ticket", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Warning | 2,592 customers are needed to break even but only 2,419 are projected",
        ))
        .stdout(predicate::str::contains("more than 2 years to recover"))
        .stdout(predicate::str::contains("below 5%").not());

    cli()
        .args(["--fixed-expenses", "60000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning | net margin is below 5%"))
        .stdout(predicate::str::contains("more than 2 years to recover"))
        .stdout(predicate::str::contains("customers are needed").not());

    cli()
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning").not());
}

#[test]
fn flags_for_missing_lines_are_reported() {
    cli()
        .env_remove("RUST_LOG")
        .args(["--model", "mini", "--consultations", "20", "--grocery-share", "0.3"])
        .assert()
        .success()
        .stderr(predicate::str::contains("ignoring flags"))
        .stderr(predicate::str::contains("--consultations"))
        .stderr(predicate::str::contains("--grocery-share"));

    cli()
        .env_remove("RUST_LOG")
        .args(["--model", "clinic", "--consultations", "20"])
        .assert()
        .success()
        .stderr(predicate::str::contains("ignoring flags").not());
}
