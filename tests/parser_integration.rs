//! Integration tests for the HTML parser and normalizer using fixture files.

use gsm_crawler::gsmarena::models::NOT_AVAILABLE;
use gsm_crawler::gsmarena::normalize::build_record;
use gsm_crawler::gsmarena::parser::Parser;

const SEARCH_FIXTURE: &str = include_str!("fixtures/search_iphone15.html");
const DEVICE_FIXTURE: &str = include_str!("fixtures/device_iphone15.html");
const NO_BATTERY_FIXTURE: &str = include_str!("fixtures/device_no_battery.html");

const BASE: &str = "https://www.gsmarena.com";

fn parser() -> Parser {
    Parser::new(BASE, 5)
}

#[test]
fn test_parse_search_results() {
    let stubs = parser().parse_results(SEARCH_FIXTURE, "iPhone 15");

    // 7 anchors: one duplicate, one placeholder link, one past the cap
    assert_eq!(stubs.len(), 5);
    assert!(stubs.iter().all(|s| s.brand == "Apple"));

    let ids: Vec<&str> = stubs.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "apple_iphone_15-12559",
            "apple_iphone_15_plus-12558",
            "apple_iphone_15_pro-12557",
            "apple_iphone_15_pro_max-12548",
            "apple_iphone_14-11861",
        ]
    );

    let first = &stubs[0];
    assert_eq!(first.name, "Apple iPhone 15");
    assert_eq!(first.detail_url, "https://www.gsmarena.com/apple_iphone_15-12559.php");
    assert_eq!(
        first.image_url.as_deref(),
        Some("https://fdn2.gsmarena.com/vv/bigpic/apple-iphone-15.jpg")
    );
    assert_eq!(stubs[3].name, "Apple iPhone 15 Pro Max");
}

#[test]
fn test_search_results_unique_urls() {
    let stubs = parser().parse_results(SEARCH_FIXTURE, "iPhone 15");
    let mut urls: Vec<&str> = stubs.iter().map(|s| s.detail_url.as_str()).collect();
    urls.sort_unstable();
    urls.dedup();
    assert_eq!(urls.len(), stubs.len());
}

#[test]
fn test_search_results_respect_smaller_cap() {
    let stubs = Parser::new(BASE, 2).parse_results(SEARCH_FIXTURE, "iPhone 15");
    assert_eq!(stubs.len(), 2);
}

#[test]
fn test_parse_empty_results() {
    let html = r#"
        <html>
        <body>
            <div id="review-body"><p>Sorry, no results.</p></div>
        </body>
        </html>
    "#;

    assert!(parser().parse_results(html, "nonexistent").is_empty());
}

#[test]
fn test_parse_device_page() {
    let page = parser().parse_device_page(DEVICE_FIXTURE);

    assert_eq!(page.name.as_deref(), Some("Apple iPhone 15"));
    assert_eq!(
        page.image_url.as_deref(),
        Some("https://fdn2.gsmarena.com/vv/bigpic/apple-iphone-15.jpg")
    );

    let network = &page.specs["Network"];
    assert_eq!(network["2G bands"], "GSM 850 / 900 / 1800 / 1900\nCDMA 800 / 1900");
    assert_eq!(page.specs["Platform"]["Chipset"], "Apple A16 Bionic (4 nm)");
    assert_eq!(page.specs.len(), 9);
}

#[test]
fn test_normalize_device_page() {
    let url = format!("{BASE}/apple_iphone_15-12559.php");
    let page = parser().parse_device_page(DEVICE_FIXTURE);
    let record = build_record("apple_iphone_15-12559", &url, &page, None);

    assert_eq!(record.name, "Apple iPhone 15");
    assert_eq!(record.brand, "Apple");
    assert_eq!(record.source, "gsmarena");
    assert_eq!(record.source_url, url);
    assert_eq!(record.release_date.map(|d| d.to_string()).as_deref(), Some("2023-09-12"));

    let price = record.price.as_ref().unwrap();
    assert_eq!(price.amount, 579.0);
    assert_eq!(price.currency, "USD");

    let specs = &record.specifications;
    assert!(specs.display.starts_with("6.1 inches"));
    assert!(specs.resolution.starts_with("1179 x 2556 pixels"));
    assert!(specs.display_type.starts_with("Super Retina XDR OLED"));
    assert_eq!(specs.cpu, "Apple A16 Bionic (4 nm)");
    assert_eq!(specs.gpu, "Apple GPU (5-core graphics)");
    assert!(specs.ram.contains("6GB RAM"));
    assert!(specs.storage.starts_with("128GB"));
    assert!(specs.camera.starts_with("48 MP"));
    assert_eq!(specs.front_camera, "12 MP, f/1.9, 23mm (wide)");
    assert!(specs.video.starts_with("4K@24/25/30/60fps"));
    assert_eq!(specs.battery, "Li-Ion 3349 mAh");
    assert_eq!(specs.charging, "Wired, PD2.0, 50% in 30 min");
    assert_eq!(specs.resolved_count(), 12);
}

#[test]
fn test_device_without_battery() {
    let url = format!("{BASE}/nokia_8110_4g-9053.php");
    let page = parser().parse_device_page(NO_BATTERY_FIXTURE);
    let record = build_record("nokia_8110_4g-9053", &url, &page, None);

    assert_eq!(record.name, "Nokia 8110 4G");
    assert_eq!(record.brand, "Nokia");
    assert_eq!(record.specifications.battery, NOT_AVAILABLE);
    assert_eq!(record.specifications.charging, NOT_AVAILABLE);
    assert_eq!(record.specifications.cpu, NOT_AVAILABLE);
    assert_eq!(record.specifications.display, "2.45 inches");
    assert_eq!(record.release_date.map(|d| d.to_string()).as_deref(), Some("2018-02-01"));
    assert!(record.price.is_none());

    // Every canonical field is either a value or N/A
    for (_, value) in record.specifications.fields() {
        assert!(!value.is_empty());
    }
}

#[test]
fn test_unrecognized_page_degrades() {
    let page = parser().parse_device_page("<html><body><p>Moved</p></body></html>");
    let record = build_record("gone-1", &format!("{BASE}/gone-1.php"), &page, None);

    assert_eq!(record.name, "gone-1");
    assert_eq!(record.brand, "Unknown");
    assert_eq!(record.specifications.resolved_count(), 0);
}
