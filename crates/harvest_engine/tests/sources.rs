use std::sync::Arc;

use harvest_engine::{
    ChartSource, FetchSettings, HarvestError, LogProgressSink, PageSource, Paginator, ParseError,
    ReqwestFetcher, Top250Source,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn init_logging() {
    harvest_logging::initialize_for_tests();
}

fn fetcher() -> Arc<ReqwestFetcher> {
    Arc::new(ReqwestFetcher::new(FetchSettings::default()))
}

fn listing_li(rank: u32, title: &str, rating: &str, info: &str) -> String {
    format!(
        r#"<li><div class="item">
  <div class="pic"><em class="">{rank}</em><a href="/subject/{rank}/"><img src="https://img.example.com/{rank}.jpg"></a></div>
  <div class="info">
    <div class="hd"><a href="/subject/{rank}/"><span class="title">{title}</span><span class="title">&nbsp;/&nbsp;Other Title</span></a></div>
    <div class="bd">
      <p class="">
        {info}
      </p>
      <div class="star"><span class="rating5-t"></span><span class="rating_num">{rating}</span><span content="10.0"></span><span>{rank}00人评价</span></div>
    </div>
  </div>
</div></li>"#
    )
}

fn listing_page(items: &[String], total: usize) -> String {
    format!(
        r#"<html><head><meta charset="utf-8"></head><body>
<ol class="grid_view">{}</ol>
<div class="paginator"><span class="count">(共{total}条)</span></div>
</body></html>"#,
        items.join("\n")
    )
}

#[tokio::test]
async fn top250_pages_flow_through_paginator() {
    init_logging();
    let server = MockServer::start().await;
    let first = listing_page(
        &[
            listing_li(
                1,
                "肖申克的救赎",
                "9.7",
                "导演: 弗兰克·德拉邦特 Frank Darabont&nbsp;&nbsp;&nbsp;主演: 蒂姆·罗宾斯<br>\n        1994&nbsp;/&nbsp;美国&nbsp;/&nbsp;犯罪 剧情",
            ),
            listing_li(
                2,
                "霸王别姬",
                "9.6",
                "导演: 陈凯歌 Kaige Chen<br>\n        1993&nbsp;/&nbsp;中国大陆 中国香港&nbsp;/&nbsp;剧情 爱情 同性",
            ),
        ],
        3,
    );
    let second = listing_page(
        &[listing_li(3, "阿甘正传", "9.5", "导演: Robert Zemeckis<br>\n        1994 / 美国 / 剧情 / 爱情")],
        3,
    );
    Mock::given(method("GET"))
        .and(path("/top250"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(first, "text/html; charset=utf-8"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/top250"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(second, "text/html; charset=utf-8"))
        .mount(&server)
        .await;

    let source = Top250Source::new(fetcher(), server.uri());
    assert_eq!(source.total_count().await.unwrap(), 3);

    let harvest = Paginator::new(&source, &LogProgressSink)
        .collect(2, None)
        .await
        .unwrap();
    assert_eq!(harvest.records.len(), 3);

    let first = &harvest.records[0];
    assert_eq!(first.rank, Some(1));
    assert_eq!(first.title, "肖申克的救赎");
    assert_eq!(first.score.as_deref(), Some("9.7"));
    assert_eq!(first.year, "1994");
    assert_eq!(first.country, "美国");
    assert_eq!(first.genre, "犯罪 剧情");
    assert!(first.info.starts_with("导演: 弗兰克·德拉邦特"));
    assert_eq!(first.vote_count, Some(100));
    assert_eq!(first.url, Some(format!("{}/subject/1/", server.uri())));
    assert_eq!(first.cover_url.as_deref(), Some("https://img.example.com/1.jpg"));

    assert_eq!(harvest.records[1].country, "中国大陆 中国香港");
    assert_eq!(harvest.records[2].genre, "剧情 / 爱情");
}

// Serves the list the way the site does: 25 items from `start`, whatever the caller wants.
async fn mount_full_list(server: &MockServer, total: usize) {
    Mock::given(method("GET"))
        .and(path("/top250"))
        .respond_with(move |request: &Request| {
            let start = request
                .url
                .query_pairs()
                .find(|(key, _)| key == "start")
                .and_then(|(_, value)| value.parse::<usize>().ok())
                .unwrap_or(0);
            let end = (start + Top250Source::PAGE_SIZE).min(total);
            let items: Vec<String> = (start..end)
                .map(|i| {
                    let rank = i as u32 + 1;
                    listing_li(rank, &format!("Film {rank}"), "8.5", "导演: X<br>\n 2000 / 美国 / 剧情")
                })
                .collect();
            ResponseTemplate::new(200)
                .set_body_raw(listing_page(&items, total), "text/html; charset=utf-8")
        })
        .mount(server)
        .await;
}

async fn harvested_titles(server: &MockServer, page_size: usize) -> Vec<String> {
    let source = Top250Source::new(fetcher(), server.uri());
    let harvest = Paginator::new(&source, &LogProgressSink)
        .collect(page_size, None)
        .await
        .unwrap();
    harvest.records.into_iter().map(|r| r.title).collect()
}

#[tokio::test]
async fn top250_smaller_page_size_yields_each_item_once() {
    init_logging();
    let server = MockServer::start().await;
    mount_full_list(&server, 50).await;

    let titles = harvested_titles(&server, 20).await;
    let expected: Vec<String> = (1..=50).map(|n| format!("Film {n}")).collect();
    assert_eq!(titles, expected);
}

#[tokio::test]
async fn top250_larger_page_size_stitches_site_pages() {
    let server = MockServer::start().await;
    mount_full_list(&server, 50).await;

    let titles = harvested_titles(&server, 30).await;
    let expected: Vec<String> = (1..=50).map(|n| format!("Film {n}")).collect();
    assert_eq!(titles, expected);
}

#[tokio::test]
async fn top250_first_page_is_fetched_once() {
    let server = MockServer::start().await;
    mount_full_list(&server, 50).await;

    let titles = harvested_titles(&server, 25).await;
    assert_eq!(titles.len(), 50);

    let starts: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(key, _)| key == "start")
                .map(|(_, value)| value.into_owned())
        })
        .collect();
    assert_eq!(starts, vec!["0", "25"]);
}

#[tokio::test]
async fn top250_page_without_list_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top250"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>请登录</body></html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let source = Top250Source::new(fetcher(), server.uri());
    let err = Paginator::new(&source, &LogProgressSink)
        .collect(25, Some(250))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarvestError::Parse(ParseError::MissingElement { .. })
    ));
}

#[tokio::test]
async fn chart_source_counts_then_pages() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list_count"))
        .and(query_param("type", "10"))
        .and(query_param("interval_id", "100:90"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"total": 3}"#, "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list"))
        .and(query_param("start", "0"))
        .and(query_param("limit", "2"))
        .and(query_param("action", ""))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[
                {"rank":1,"title":"控方证人","score":"9.6","vote_count":400000,"release_date":"1957-12-17",
                 "regions":["美国"],"types":["剧情","悬疑","犯罪"],"actors":["泰隆·鲍华","玛琳·黛德丽"],
                 "url":"https://movie.example.com/subject/1296141/","cover_url":"https://img.example.com/a.jpg"},
                {"rank":2,"score":"9.0"}
            ]"#,
            "application/json; charset=utf-8",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"rank":3,"title":"看不见的客人","score":"8.8","release_date":"2016-09-16","regions":["西班牙"],"types":["悬疑","犯罪"]}]"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let source = ChartSource::new(fetcher(), format!("{}/", server.uri()), 10, "100:90");
    let harvest = Paginator::new(&source, &LogProgressSink)
        .collect(2, None)
        .await
        .unwrap();

    assert_eq!(harvest.total, 3);
    assert_eq!(harvest.pages_fetched, 2);
    assert_eq!(harvest.skipped, 1);
    let titles: Vec<&str> = harvest.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["控方证人", "看不见的客人"]);
    assert_eq!(harvest.records[0].genre, "剧情,悬疑,犯罪");
    assert_eq!(harvest.records[1].year, "2016");
}

#[tokio::test]
async fn chart_count_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list_count"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = ChartSource::new(fetcher(), server.uri(), 10, "100:90");
    let err = Paginator::new(&source, &LogProgressSink)
        .collect(20, None)
        .await
        .unwrap_err();
    assert!(matches!(err, HarvestError::Transport(_)));
}

#[tokio::test]
async fn chart_page_with_wrong_shape_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/j/chart/top_list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"msg":"rate limited"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let source = ChartSource::new(fetcher(), server.uri(), 10, "100:90");
    let err = source.fetch_page(0, 20).await.unwrap_err();
    assert!(matches!(err, HarvestError::Parse(ParseError::Json(_))));
}
