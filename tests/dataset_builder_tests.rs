//! End-to-end test for the training-dataset builder: mock provider,
//! real fetch path, CSV on disk.

use chrono::NaiveDate;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use simfin_stocks::api::SimFinClient;
use simfin_stocks::dataset::TrainingSetBuilder;
use simfin_stocks::models::{Config, DateRange};

fn price_rows(start: NaiveDate, closes: &[f64]) -> Value {
    let rows: Vec<Value> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let date = start + chrono::Duration::days(i as i64);
            json!([date.to_string(), close])
        })
        .collect();
    json!([{
        "columns": ["Date", "Last Closing Price"],
        "data": rows,
    }])
}

#[tokio::test]
async fn builds_labeled_csv_and_skips_failing_tickers() {
    let server = MockServer::start().await;
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    // 52 closes: enough for two full 50-day windows, one labeled pair each
    let mut closes = vec![100.0; 50];
    closes.push(101.0);
    closes.push(99.0);

    Mock::given(method("GET"))
        .and(path("/companies/prices/compact"))
        .and(query_param("ticker", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(price_rows(start, &closes)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/companies/statements/compact"))
        .and(query_param("ticker", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "statements": [{
                "columns": [
                    "Report Date",
                    "Total Liabilities",
                    "Total Equity",
                    "Share Capital & Additional Paid-In Capital",
                ],
                "data": [["2023-12-31", 50.0, 100.0, 10.0]],
            }],
        }])))
        .mount(&server)
        .await;
    // Second ticker fails outright; the run must continue without it
    Mock::given(method("GET"))
        .and(path("/companies/prices/compact"))
        .and(query_param("ticker", "FAIL"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .mount(&server)
        .await;

    let config = Config {
        simfin_api_key: "test-key".to_string(),
        simfin_base_url: server.uri(),
        rate_limit_per_second: 1000,
    };
    let client = SimFinClient::new(&config).unwrap();
    let builder = TrainingSetBuilder::new(&client);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("train.csv");
    let range = DateRange::new(start, start + chrono::Duration::days(60));

    let written = builder
        .build(&["AAPL".to_string(), "FAIL".to_string()], range, &output)
        .await
        .unwrap();

    assert_eq!(written, 2);

    let contents = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines[0],
        "ticker,date,close,sma_50,debt_to_equity,next_day_direction"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("AAPL,2024-02-19,100.0,100.0,0.5,1"));
    assert!(lines[2].starts_with("AAPL,2024-02-20,101.0,"));
    assert!(lines[2].ends_with(",0"));
}
