//! End-to-end run over two SQLite files laid out the way a dataframe export
//! writes them.

use std::path::Path;

use predchart_core::config::ChartConfig;
use predchart_core::{ComparisonMode, Config, ErrorKind, SkipReason};
use predchart_ingestion::SqliteSource;
use predchart_render::{HtmlChartRenderer, PairStatus, Pipeline};
use rusqlite::{params, Connection};

fn create_actual_db(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE "NIFTY50" (id INTEGER PRIMARY KEY AUTOINCREMENT, "Datetime" TEXT,
            "Open" REAL, "High" REAL, "Low" REAL, "Close" REAL);
        CREATE TABLE "BANKNIFTY" ("index" INTEGER, "Datetime" TEXT,
            "Open" REAL, "High" REAL, "Low" REAL, "Close" REAL);
        CREATE TABLE "RELIANCE" ("index" INTEGER, "Datetime" TEXT,
            "Open" REAL, "High" REAL, "Low" REAL, "Close" REAL);
        CREATE TABLE "TCS" ("index" INTEGER, "Datetime" TEXT,
            "Open" REAL, "High" REAL, "Low" REAL, "Close" REAL);
        CREATE TABLE "INFY" ("index" INTEGER, "Datetime" TEXT,
            "Open" REAL, "High" REAL, "Low" REAL, "Close" REAL);
        INSERT INTO "INFY" VALUES (0, '2024-01-01 09:15:00', 20.0, 22.0, 19.0, 21.0);
        "#,
    )
    .unwrap();

    let nifty = [
        ("2024-01-01 09:15:00", 103.0),
        ("2024-01-01 09:15:00", 104.0),
        ("2024-01-01 09:16:00", 105.0),
    ];
    for (ts, close) in nifty {
        conn.execute(
            r#"INSERT INTO "NIFTY50" ("Datetime", "Open", "High", "Low", "Close")
               VALUES (?1, 100.0, 106.0, 99.0, ?2)"#,
            params![ts, close],
        )
        .unwrap();
    }

    conn.execute(
        r#"INSERT INTO "BANKNIFTY" VALUES (0, '2024-01-01 09:15:00', 1.0, 2.0, 0.5, 1.5)"#,
        [],
    )
    .unwrap();
    conn.execute(r#"INSERT INTO "BANKNIFTY" VALUES (1, 'n/a', 1.0, 2.0, 0.5, 1.5)"#, [])
        .unwrap();
    conn.execute(
        r#"INSERT INTO "RELIANCE" VALUES (0, '2024-01-01 09:15:00', 1.0, 2.0, 0.5, 1.5)"#,
        [],
    )
    .unwrap();
    conn.execute(
        r#"INSERT INTO "TCS" VALUES (0, '2024-01-01 09:15:00', 10.0, 12.0, 9.0, 11.0)"#,
        [],
    )
    .unwrap();
}

fn create_predictions_db(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE "NIFTY50_predictions" (
            "index" INTEGER, "Datetime" TEXT, "Predicted_Close" REAL);
        INSERT INTO "NIFTY50_predictions" VALUES (0, '2024-01-01 09:15:00', 102.0);
        INSERT INTO "NIFTY50_predictions" VALUES (1, '2024-01-01 09:17:00', 110.0);
        CREATE TABLE "BANKNIFTY_predictions" (
            "index" INTEGER, "Datetime" TEXT, "Predicted_Close" REAL);
        INSERT INTO "BANKNIFTY_predictions" VALUES (0, '2024-01-01 09:15:00', 1.4);
        CREATE TABLE "TCS_predictions" ("index" INTEGER, "Datetime" TEXT,
            "Predicted_Open" REAL, "Predicted_High" REAL,
            "Predicted_Low" REAL, "Predicted_Close" REAL);
        INSERT INTO "TCS_predictions" VALUES (0, '2024-01-01 09:15:00', 10.5, 12.5, 9.5, 11.5);
        CREATE TABLE "infy_predictions" ("Datetime" TEXT, "Predicted_Close" REAL);
        INSERT INTO "infy_predictions" VALUES ('2024-01-01 09:15:00', 21.5);
        "#,
    )
    .unwrap();
}

#[test]
fn test_pipeline_over_sqlite_files() {
    let dir = tempfile::tempdir().unwrap();
    let actual_path = dir.path().join("nifty50_data_v1.db");
    let predictions_path = dir.path().join("predictions.db");
    create_actual_db(&actual_path);
    create_predictions_db(&predictions_path);

    let charts = dir.path().join("charts");
    let config = Config {
        chart: ChartConfig {
            output_dir: charts.clone(),
            ..ChartConfig::default()
        },
        ..Config::default()
    };

    let actual = SqliteSource::open(&actual_path).unwrap();
    let predicted = SqliteSource::open(&predictions_path).unwrap();
    let renderer = HtmlChartRenderer::new(config.chart.clone());
    let report = Pipeline::new(&config).run(&actual, &predicted, &renderer).unwrap();

    let names: Vec<&str> = report.outcomes.iter().map(|o| o.pair.actual.as_str()).collect();
    assert_eq!(names, vec!["BANKNIFTY", "INFY", "NIFTY50", "RELIANCE", "TCS"]);

    match &report.outcome("BANKNIFTY").unwrap().status {
        PairStatus::Failed { kind, message } => {
            assert_eq!(*kind, ErrorKind::Schema);
            assert!(message.contains("unparseable timestamp"));
        }
        other => panic!("expected failure, got {other:?}"),
    }

    match &report.outcome("NIFTY50").unwrap().status {
        PairStatus::Rendered {
            artifact,
            mode,
            rows,
            matched_rows,
        } => {
            assert_eq!(*mode, ComparisonMode::PredictedLineOnly);
            assert_eq!(*rows, 2);
            assert_eq!(*matched_rows, 1);
            assert_eq!(artifact, &charts.join("NIFTY50.html"));
        }
        other => panic!("expected render, got {other:?}"),
    }

    assert_eq!(
        report.outcome("RELIANCE").unwrap().status,
        PairStatus::Skipped {
            reason: SkipReason::PredictedAbsent
        }
    );

    // Stored as `infy_predictions`; SQLite table names ignore ASCII case.
    assert!(matches!(
        report.outcome("INFY").unwrap().status,
        PairStatus::Rendered {
            mode: ComparisonMode::PredictedLineOnly,
            matched_rows: 1,
            ..
        }
    ));

    assert!(matches!(
        report.outcome("TCS").unwrap().status,
        PairStatus::Rendered {
            mode: ComparisonMode::FullOverlay,
            ..
        }
    ));

    let nifty = std::fs::read_to_string(charts.join("NIFTY50.html")).unwrap();
    assert!(nifty.contains("<title>Candlestick Chart for NIFTY50</title>"));
    assert!(nifty.contains(r#"class="predicted-line""#));
    assert_eq!(nifty.matches(r#"class="candle actual""#).count(), 2);

    let tcs = std::fs::read_to_string(charts.join("TCS.html")).unwrap();
    assert_eq!(tcs.matches(r#"class="candle predicted""#).count(), 1);

    assert!(!charts.join("BANKNIFTY.html").exists());
    assert!(!charts.join("RELIANCE.html").exists());
    assert_eq!(report.artifacts().count(), 3);
}

#[test]
fn test_empty_actual_database() {
    let dir = tempfile::tempdir().unwrap();
    let actual_path = dir.path().join("empty.db");
    let predictions_path = dir.path().join("predictions.db");
    Connection::open(&actual_path)
        .unwrap()
        .execute_batch("CREATE TABLE placeholder (x INTEGER); DROP TABLE placeholder;")
        .unwrap();
    create_predictions_db(&predictions_path);

    let config = Config::default();
    let actual = SqliteSource::open(&actual_path).unwrap();
    let predicted = SqliteSource::open(&predictions_path).unwrap();
    let renderer = HtmlChartRenderer::new(ChartConfig {
        output_dir: dir.path().join("charts"),
        ..ChartConfig::default()
    });
    let report = Pipeline::new(&config).run(&actual, &predicted, &renderer).unwrap();
    assert!(report.outcomes.is_empty());
    assert!(!dir.path().join("charts").exists());
}
