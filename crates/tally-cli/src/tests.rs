//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::{DateTime, TimeZone, Utc};
use clap::Parser;
use tally_core::stats::FlowKind;
use tally_core::test_utils::{write_sample_snapshots, MockBackendServer};
use tally_core::{AppContext, Config, DataSource, FilterInput};
use tempfile::TempDir;

use crate::cli::{Cli, Commands, FilterArgs};
use crate::commands::{self, format_money, parse_now, truncate, ReceiverQuery, Session};

fn mid_may() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

/// Session over the fixture snapshots, evaluated at 2024-05-15 12:00 UTC
fn setup_session() -> (TempDir, Session) {
    let dir = tempfile::tempdir().unwrap();
    write_sample_snapshots(dir.path()).unwrap();

    let ctx = AppContext::from_source(&DataSource::Local(dir.path().to_path_buf())).unwrap();
    let session = Session::new(ctx, &Config::default(), mid_may(), false);
    (dir, session)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn ids(transactions: &[tally_core::Transaction]) -> Vec<i64> {
    transactions.iter().map(|t| t.id).collect()
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a long receiver name", 10), "a long ...");
    assert_eq!(truncate("Bäckerei Müller", 8), "Bäcke...");
}

#[test]
fn test_format_money() {
    assert_eq!(format_money(12.5, "EUR"), "12.50 EUR");
    assert_eq!(format_money(-82.4, "USD"), "-82.40 USD");
}

#[test]
fn test_parse_now() {
    assert_eq!(
        parse_now(Some("2024-05-15T12:00:00Z")).unwrap(),
        mid_may()
    );
    assert_eq!(
        parse_now(Some("2024-05-15")).unwrap(),
        Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap()
    );
    assert!(parse_now(Some("15/05/2024")).is_err());

    let before = Utc::now();
    let now = parse_now(None).unwrap();
    assert!(now >= before);
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_filter_flags_become_filter_input() {
    let cli = Cli::try_parse_from([
        "tally",
        "transactions",
        "--keyword",
        "rent",
        "--category",
        "1,3",
        "--min",
        "-50",
        "--to",
        "2024-05-31",
    ])
    .unwrap();

    let Commands::Transactions { filter } = cli.command else {
        panic!("expected transactions command");
    };
    let input: FilterInput = filter.into();
    assert_eq!(input.keyword.as_deref(), Some("rent"));
    assert_eq!(input.categories.as_deref(), Some("1,3"));
    assert_eq!(input.price_from.as_deref(), Some("-50"));
    assert_eq!(input.date_to.as_deref(), Some("2024-05-31"));
    assert!(input.date_from.is_none());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["tally", "summary", "--json", "--now", "2024-05-15"]).unwrap();
    assert!(cli.json);
    assert_eq!(cli.now.as_deref(), Some("2024-05-15"));
    assert!(matches!(cli.command, Commands::Summary));
}

#[test]
fn test_receivers_days_conflicts_with_all_time() {
    let result = Cli::try_parse_from(["tally", "receivers", "--days", "7", "--all-time"]);
    assert!(result.is_err());
}

// ========== Summary Tests ==========

#[tokio::test]
async fn test_summary_figures() {
    let (_dir, session) = setup_session();
    let report = commands::build_summary(&session).await.unwrap();

    let tx = report.transactions;
    assert_close(tx.planned_earnings, 2500.0);
    assert_close(tx.planned_expenses, 106.4);
    assert_close(tx.received_earnings, 2500.0);
    assert_close(tx.paid_expenses, 82.4);
    assert_close(tx.upcoming_expenses, 24.0);

    // Streaming runs on the 15th and counts as paid, the gym on the 28th does not
    let subs = report.subscriptions;
    assert_close(subs.paid_expenses, 12.99);
    assert_close(subs.upcoming_expenses, 30.0);
    assert_close(subs.upcoming_earnings, 0.0);
}

#[tokio::test]
async fn test_cmd_summary_prints() {
    let (_dir, session) = setup_session();
    assert!(commands::cmd_summary(&session).await.is_ok());
}

// ========== Transaction Tests ==========

#[tokio::test]
async fn test_transactions_unfiltered_newest_first() {
    let (_dir, session) = setup_session();
    let txs = commands::list_transactions(&session, &FilterInput::default())
        .await
        .unwrap();
    assert_eq!(ids(&txs), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_transactions_keyword_matches_description() {
    let (_dir, session) = setup_session();
    let input = FilterInput {
        keyword: Some("weekly".to_string()),
        ..Default::default()
    };
    let txs = commands::list_transactions(&session, &input).await.unwrap();
    assert_eq!(ids(&txs), vec![2]);
}

#[tokio::test]
async fn test_transactions_keyword_matches_payment_method_name() {
    let (_dir, session) = setup_session();
    let input = FilterInput {
        keyword: Some("credit".to_string()),
        ..Default::default()
    };
    let txs = commands::list_transactions(&session, &input).await.unwrap();
    assert_eq!(ids(&txs), vec![3, 2]);
}

#[tokio::test]
async fn test_transactions_signed_price_range() {
    let (_dir, session) = setup_session();
    let input: FilterInput = FilterArgs {
        min: Some("-50".to_string()),
        max: Some("0".to_string()),
        ..Default::default()
    }
    .into();
    let txs = commands::list_transactions(&session, &input).await.unwrap();
    assert_eq!(ids(&txs), vec![3]);
}

#[tokio::test]
async fn test_transactions_invalid_filter_is_error() {
    let (_dir, session) = setup_session();
    let input = FilterInput {
        date_from: Some("May 1st".to_string()),
        ..Default::default()
    };
    let result = commands::list_transactions(&session, &input).await;
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("Invalid filter"));
}

#[tokio::test]
async fn test_cmd_transactions_json() {
    let (_dir, session) = setup_session();
    let session = Session {
        json: true,
        ..session
    };
    assert!(commands::cmd_transactions(&session, FilterInput::default())
        .await
        .is_ok());
}

// ========== Subscription Tests ==========

#[tokio::test]
async fn test_subscriptions_by_execution_day() {
    let (_dir, session) = setup_session();
    let input = FilterInput {
        date_from: Some("2024-05-10".to_string()),
        date_to: Some("2024-05-20".to_string()),
        ..Default::default()
    };
    let subs = commands::list_subscriptions(&session, &input).await.unwrap();
    let receivers: Vec<&str> = subs.iter().map(|s| s.receiver.as_str()).collect();
    assert_eq!(receivers, vec!["Streaming"]);
}

#[tokio::test]
async fn test_cmd_subscriptions_prints() {
    let (_dir, session) = setup_session();
    assert!(commands::cmd_subscriptions(&session, FilterInput::default())
        .await
        .is_ok());
}

// ========== Receiver Tests ==========

#[tokio::test]
async fn test_receivers_window_excludes_future() {
    let (_dir, session) = setup_session();
    let receivers = commands::top_receivers(
        &session,
        ReceiverQuery {
            days: Some(30),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(receivers, vec!["Employer", "Supermarket"]);
}

#[tokio::test]
async fn test_receivers_all_time_with_limit() {
    let (_dir, session) = setup_session();
    let receivers = commands::top_receivers(
        &session,
        ReceiverQuery {
            limit: Some(2),
            all_time: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(receivers, vec!["Employer", "Supermarket"]);

    let everyone = commands::top_receivers(
        &session,
        ReceiverQuery {
            all_time: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(everyone.len(), 3);
}

// ========== Chart Tests ==========

#[tokio::test]
async fn test_category_totals() {
    let (_dir, session) = setup_session();

    let expenses = commands::category_totals(&session, FlowKind::Expenses)
        .await
        .unwrap();
    let names: Vec<&str> = expenses.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Groceries", "Leisure"]);
    assert_close(expenses[0].total, 82.4);

    let income = commands::category_totals(&session, FlowKind::Income)
        .await
        .unwrap();
    assert_eq!(income.len(), 1);
    assert_eq!(income[0].name, "Salary");
}

#[tokio::test]
async fn test_cmd_monthly_and_categories_print() {
    let (_dir, session) = setup_session();
    assert!(commands::cmd_monthly(&session, Some(2024)).await.is_ok());
    assert!(commands::cmd_categories(&session, true).await.is_ok());
}

#[tokio::test]
async fn test_budget_report() {
    let (_dir, session) = setup_session();
    let report = commands::budget_report(&session).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report[0].name, "Fun");
    assert_close(report[0].spent, 24.0);
    assert!(!report[0].is_exceeded());
    assert!(commands::cmd_budgets(&session).await.is_ok());
}

// ========== Session Tests ==========

#[tokio::test]
async fn test_session_open_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    write_sample_snapshots(&data).unwrap();

    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "currency = \"USD\"\n").unwrap();

    let session = Session::open(
        Some(&config_path),
        Some(&data),
        Some("2024-05-15T12:00:00Z"),
        false,
    )
    .unwrap();

    assert_eq!(session.currency, "USD");
    assert_eq!(session.now, mid_may());
    assert_eq!(session.money(1.0), "1.00 USD");
    assert_eq!(
        commands::list_transactions(&session, &FilterInput::default())
            .await
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn test_missing_snapshots_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = AppContext::from_source(&DataSource::Local(dir.path().to_path_buf())).unwrap();
    let session = Session::new(ctx, &Config::default(), mid_may(), false);

    let result = commands::build_summary(&session).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to load"));
}

#[tokio::test]
async fn test_remote_session() {
    let server = MockBackendServer::start().await;
    let ctx = AppContext::from_source(&DataSource::Remote {
        url: server.url(),
        api_key: MockBackendServer::API_KEY.to_string(),
        access_token: Some(MockBackendServer::ACCESS_TOKEN.to_string()),
    })
    .unwrap();
    let session = Session::new(ctx, &Config::default(), mid_may(), false);

    let report = commands::budget_report(&session).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_close(report[0].spent, 24.0);
}
