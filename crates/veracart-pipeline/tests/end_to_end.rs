//! End-to-end pipeline runs against a `wiremock` server.
//!
//! Each test stands up a local server that plays the retailer sites, feeds
//! the pipeline a batch of raw backend items, and asserts on the final
//! report: what survived, in what order, and what the rejection ledger says.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use veracart_core::rules::{DomainTables, ProductPattern, RulesFile};
use veracart_core::{AppConfig, Environment, FallbackEntry, RawItem, RuleSet, SourceType};
use veracart_pipeline::ValidationPipeline;

fn test_config(max_results: usize) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "debug".to_string(),
        rules_path: "./config/rules.yaml".into(),
        search_api_key: None,
        request_timeout_secs: 5,
        user_agent: "veracart-test/0.1".to_string(),
        max_concurrent_checks: 4,
        inter_request_delay_ms: 0,
        relevance_floor: 0.15,
        max_results,
        price_ceiling: 3000.0,
    }
}

fn test_rules() -> Arc<RuleSet> {
    Arc::new(
        RulesFile {
            domains: DomainTables {
                blacklist: vec!["aliexpress.com".to_string()],
                whitelist: vec!["amazon.com".to_string()],
            },
            search_indicators: vec![
                "/search".to_string(),
                "?q=".to_string(),
                "/s?k=".to_string(),
            ],
            product_patterns: vec![
                ProductPattern {
                    retailer: "amazon".to_string(),
                    pattern: "/dp/[A-Za-z0-9]+".to_string(),
                },
                ProductPattern {
                    retailer: "shopify".to_string(),
                    pattern: r"/products/[\w-]+".to_string(),
                },
            ],
            origin_keywords: vec!["ships from china".to_string()],
            commerce_indicators: vec!["add to cart".to_string(), "$".to_string()],
            fallback: vec![
                FallbackEntry {
                    title: "Top rated match for {query}".to_string(),
                    price_text: "$24.99".to_string(),
                    price: 24.99,
                    source: "Amazon".to_string(),
                    link: "https://www.amazon.com/dp/B08N5WRWNW".to_string(),
                },
                FallbackEntry {
                    title: "Budget option for {query}".to_string(),
                    price_text: "$19.99".to_string(),
                    price: 19.99,
                    source: "Target".to_string(),
                    link: "https://www.target.com/p/79345520".to_string(),
                },
            ],
        }
        .compile()
        .expect("test rules must compile"),
    )
}

fn items(value: serde_json::Value) -> Vec<RawItem> {
    value
        .as_array()
        .expect("fixture must be an array")
        .iter()
        .map(|v| v.as_object().expect("fixture items must be objects").clone())
        .collect()
}

/// Mounts a product page with a commerce-looking body at `page_path`.
async fn mount_product_page(server: &MockServer, page_path: &str, title: &str) {
    let body = format!(
        "<html><head><title>{title}</title></head>\
         <body><h1>{title}</h1><button>Add to Cart</button><span>$</span></body></html>"
    );
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Scenario 1 – single clean item survives with its parsed price
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_clean_item_yields_one_verified_product() {
    let server = MockServer::start().await;
    mount_product_page(&server, "/products/iphone-13-blue", "Apple iPhone 13").await;

    let pipeline = ValidationPipeline::new(&test_config(20), test_rules()).unwrap();
    let batch = items(json!([
        {
            "title": "Apple iPhone 13 128GB (Unlocked) Blue",
            "price": "$599.00",
            "product_link": format!("{}/products/iphone-13-blue", server.uri()),
            "source": "Amazon"
        }
    ]));

    let report = pipeline.run("iphone 13", &batch).await.unwrap();

    assert_eq!(report.results.len(), 1, "report: {report:?}");
    assert!(report.rejections.is_empty());
    let product = &report.results[0];
    assert!((product.price_value - 599.0).abs() < f64::EPSILON);
    assert_eq!(product.price, "$599.00");
    assert!(product.verified);
    assert_eq!(product.source_type, SourceType::Live);
    assert!(product.warnings.is_empty());
    assert!(!report.is_fallback());
}

// ---------------------------------------------------------------------------
// Scenario 2 – mixed batch: every rejection class plus survivors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mixed_batch_filters_sorts_and_dedupes() {
    let server = MockServer::start().await;
    mount_product_page(&server, "/products/widget-pro", "Widget Pro 2000").await;
    mount_product_page(&server, "/products/widget-pro-alt", "Widget Pro 2000").await;
    mount_product_page(&server, "/products/widget-mini", "Widget Mini").await;
    mount_product_page(&server, "/products/garden-hose", "Garden Hose 50ft").await;

    Mock::given(method("GET"))
        .and(path("/products/widget-dead"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let base = server.uri();
    let pipeline = ValidationPipeline::new(&test_config(20), test_rules()).unwrap();
    let batch = items(json!([
        // Survives; duplicate of the next item but cheaper.
        {
            "title": "Widget Pro 2000",
            "price": "$49.99",
            "link": format!("{base}/products/widget-pro"),
            "source": "WidgetCo"
        },
        // Same identity key, higher price — dropped by dedupe.
        {
            "title": "Widget Pro 2000",
            "price": "$59.99",
            "link": format!("{base}/products/widget-pro-alt"),
            "source": "WidgetCo"
        },
        // Survives; cheapest overall, should sort first.
        {
            "title": "Widget Mini",
            "price": "$9.99",
            "link": format!("{base}/products/widget-mini"),
            "source": "WidgetCo"
        },
        // Search URL — structural veto.
        {
            "title": "Widget search results",
            "price": "$5.00",
            "link": format!("{base}/search?query=widget")
        },
        // Blacklisted marketplace — rejected before any fetch.
        {
            "title": "Widget Clone",
            "price": "$3.00",
            "link": "https://m.aliexpress.com/item/100500.html"
        },
        // Dead link — unreachable.
        {
            "title": "Widget Pro Discontinued",
            "price": "$19.99",
            "link": format!("{base}/products/widget-dead")
        },
        // Reachable but irrelevant to the query.
        {
            "title": "Garden Hose 50ft",
            "price": "$29.99",
            "link": format!("{base}/products/garden-hose")
        },
        // Missing price — malformed.
        {
            "title": "Widget Promo",
            "link": format!("{base}/products/widget-pro")
        }
    ]));

    let report = pipeline.run("widget", &batch).await.unwrap();

    assert_eq!(report.candidates_seen, 8);
    assert_eq!(report.results.len(), 2, "report: {report:?}");
    assert_eq!(report.results[0].title, "Widget Mini");
    assert!((report.results[0].price_value - 9.99).abs() < f64::EPSILON);
    assert_eq!(report.results[1].title, "Widget Pro 2000");
    assert!(
        (report.results[1].price_value - 49.99).abs() < f64::EPSILON,
        "dedupe must keep the cheaper duplicate"
    );

    assert_eq!(report.rejected_count("not_product_page"), 1);
    assert_eq!(report.rejected_count("blacklisted"), 1);
    assert_eq!(report.rejected_count("unreachable"), 1);
    assert_eq!(report.rejected_count("low_relevance"), 1);
    assert_eq!(report.rejected_count("malformed"), 1);
}

// ---------------------------------------------------------------------------
// Scenario 3 – foreign-origin page content rejects a reachable candidate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn origin_keywords_reject_reachable_candidate() {
    let server = MockServer::start().await;

    let body = "<html><body><h1>Widget Pro</h1>\
                <p>Add to cart — ships from china within 30 days</p></body></html>";
    Mock::given(method("GET"))
        .and(path("/products/widget-import"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let pipeline = ValidationPipeline::new(&test_config(20), test_rules()).unwrap();
    let batch = items(json!([
        {
            "title": "Widget Pro",
            "price": "$14.99",
            "link": format!("{}/products/widget-import", server.uri())
        }
    ]));

    let report = pipeline.run("widget", &batch).await.unwrap();

    assert_eq!(report.rejected_count("foreign_origin"), 1);
    assert!(report.is_fallback());
}

// ---------------------------------------------------------------------------
// Scenario 4 – redirects rewrite the stored link
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accepted_product_carries_post_redirect_link() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/widget-old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/products/widget-new"))
        .mount(&server)
        .await;
    mount_product_page(&server, "/products/widget-new", "Widget Pro 2000").await;

    let pipeline = ValidationPipeline::new(&test_config(20), test_rules()).unwrap();
    let batch = items(json!([
        {
            "title": "Widget Pro 2000",
            "price": "$49.99",
            "link": format!("{}/products/widget-old", server.uri())
        }
    ]));

    let report = pipeline.run("widget", &batch).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(
        report.results[0].link,
        format!("{}/products/widget-new", server.uri())
    );
}

// ---------------------------------------------------------------------------
// Scenario 5 – ambiguous product page is accepted with a warning
// ---------------------------------------------------------------------------

#[tokio::test]
async fn page_without_commerce_indicators_warns_but_passes() {
    let server = MockServer::start().await;

    let body = "<html><head><title>Widget Pro</title></head>\
                <body>A fine widget, reviewed at length.</body></html>";
    Mock::given(method("GET"))
        .and(path("/products/widget-review"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let pipeline = ValidationPipeline::new(&test_config(20), test_rules()).unwrap();
    let batch = items(json!([
        {
            "title": "Widget Pro",
            "price": "$21.00",
            "link": format!("{}/products/widget-review", server.uri())
        }
    ]));

    let report = pipeline.run("widget", &batch).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(
        !report.results[0].warnings.is_empty(),
        "expected an ambiguous-page warning: {report:?}"
    );
}

// ---------------------------------------------------------------------------
// Scenario 6 – all-rejected batch falls back to the curated catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_rejected_batch_serves_fallback_catalog() {
    let pipeline = ValidationPipeline::new(&test_config(20), test_rules()).unwrap();
    let batch = items(json!([
        {
            "title": "Widget Clone A",
            "price": "$3.00",
            "link": "https://aliexpress.com/item/1.html"
        },
        {
            "title": "Widget Clone B",
            "price": "$4.00",
            "link": "https://sub.aliexpress.com/af/widget.html?q=widget"
        }
    ]));

    let report = pipeline.run("widget", &batch).await.unwrap();

    assert!(!report.results.is_empty(), "fallback must not be empty");
    assert!(report.is_fallback());
    for product in &report.results {
        assert_eq!(product.source_type, SourceType::Fallback);
        assert!(!product.verified);
        assert!(product.title.contains("widget"));
    }
}

// ---------------------------------------------------------------------------
// Scenario 7 – result cap applies after sorting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn result_cap_keeps_cheapest_entries() {
    let server = MockServer::start().await;
    mount_product_page(&server, "/products/widget-a", "Widget Alpha").await;
    mount_product_page(&server, "/products/widget-b", "Widget Beta").await;
    mount_product_page(&server, "/products/widget-c", "Widget Gamma").await;

    let base = server.uri();
    let pipeline = ValidationPipeline::new(&test_config(2), test_rules()).unwrap();
    let batch = items(json!([
        {"title": "Widget Alpha", "price": "$30.00", "link": format!("{base}/products/widget-a"), "source": "A"},
        {"title": "Widget Beta", "price": "$10.00", "link": format!("{base}/products/widget-b"), "source": "B"},
        {"title": "Widget Gamma", "price": "$20.00", "link": format!("{base}/products/widget-c"), "source": "C"}
    ]));

    let report = pipeline.run("widget", &batch).await.unwrap();

    assert_eq!(report.results.len(), 2);
    assert!((report.results[0].price_value - 10.0).abs() < f64::EPSILON);
    assert!((report.results[1].price_value - 20.0).abs() < f64::EPSILON);
}
