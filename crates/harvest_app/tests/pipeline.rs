use std::fs;

use harvest_app::{run, HarvestConfig, SourceKind};
use harvest_engine::read_records;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHART_PAGE: &str = r#"[
  {"rank": 1, "title": "肖申克的救赎", "score": "9.7", "vote_count": 3000000,
   "release_date": "1994-09-10", "regions": ["美国"], "types": ["犯罪", "剧情"],
   "actors": ["蒂姆·罗宾斯", "摩根·弗里曼"], "url": "https://movie.example.com/subject/1/"},
  {"rank": 2, "title": "霸王别姬", "score": "9.6", "vote_count": 2000000,
   "release_date": "1993-01-01", "regions": ["中国大陆", "中国香港"], "types": ["剧情", "爱情"]}
]"#;

fn config(server: &MockServer, dir: &TempDir) -> HarvestConfig {
    HarvestConfig {
        source: SourceKind::Chart,
        base_url: server.uri(),
        cooldown_ms: 0,
        output: Some(dir.path().join("chart.csv")),
        chart_dir: dir.path().join("charts"),
        ..HarvestConfig::default()
    }
}

async fn mount_count(server: &MockServer, total: usize) {
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list_count"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(format!(r#"{{"total": {total}}}"#), "application/json"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn chart_run_exports_and_summarizes() {
    harvest_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_count(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list"))
        .and(query_param("start", "0"))
        .and(query_param("type", "10"))
        .and(query_param("interval_id", "100:90"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CHART_PAGE, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = config(&server, &dir);
    let report = run(&config).await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.harvested, 2);
    assert_eq!(report.pages, 1);
    let export = report.export.as_ref().unwrap();
    assert_eq!(export.output_path, dir.path().join("chart.csv"));

    let records = read_records(&export.output_path).unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["肖申克的救赎", "霸王别姬"]);
    assert_eq!(records[0].year, "1994");

    let summary = report.summary.as_ref().unwrap();
    assert_eq!(summary.country_total(), 3);
    assert_eq!(summary.category.scores().len(), 2);

    let text = report.to_string();
    assert!(text.contains("2 of 2 items harvested"), "{text}");
}

#[tokio::test]
async fn empty_chart_skips_export() {
    let server = MockServer::start().await;
    mount_count(&server, 0).await;

    let dir = TempDir::new().unwrap();
    let report = run(&config(&server, &dir)).await.unwrap();

    assert!(report.export.is_none());
    assert!(report.summary.is_none());
    assert!(!dir.path().join("chart.csv").exists());
}

#[tokio::test]
async fn page_failure_aborts_without_partial_file() {
    let server = MockServer::start().await;
    mount_count(&server, 40).await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CHART_PAGE, "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list"))
        .and(query_param("start", "20"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let err = run(&config(&server, &dir)).await.unwrap_err();

    assert!(format!("{err:#}").contains("nothing was exported"));
    assert!(!dir.path().join("chart.csv").exists());
}

#[tokio::test]
async fn disabled_charts_render_nothing() {
    let server = MockServer::start().await;
    mount_count(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CHART_PAGE, "application/json"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = HarvestConfig {
        charts: false,
        ..config(&server, &dir)
    };
    let report = run(&config).await.unwrap();

    assert!(report.charts.is_empty());
    assert!(!dir.path().join("charts").exists());
    assert!(fs::metadata(dir.path().join("chart.csv")).unwrap().is_file());
}
