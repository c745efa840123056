//! End-to-end smoke test against a real browser.
//!
//! Needs chromedriver (configured in the TOML file or on PATH) and a Chrome
//! install. Run with: cargo test --test live_browser -- --ignored --nocapture

use serde_json::json;
use thirtyfour::By;

use nice_webdriver::{init_logging, DriverType, NiceWebDriverFactory};

const PAGE: &str = "data:text/html,<html><body>\
    <input id='name'>\
    <a id='home' href='/app/home'>home</a>\
    </body></html>";

#[tokio::test]
#[ignore = "requires chromedriver and a Chrome install"]
async fn test_chrome_session_smoke() {
    init_logging();

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("domain.toml");
    std::fs::write(&config, "[test]\nwait_seconds = 2\n").unwrap();

    let factory = NiceWebDriverFactory::get(&config).unwrap();
    let driver = factory.nice_driver(DriverType::Chrome).await.unwrap();

    driver.open(PAGE).await.unwrap();
    assert!(!driver.is_web_page_404().await.unwrap());

    let input = driver.find_by_id("name").await.unwrap();
    assert!(input.is_some());
    assert!(driver
        .send_keys_if_exists(By::Id("name"), "selenium")
        .await
        .unwrap());

    assert!(driver.anchor_exists_with_href("/app/home", false).await.unwrap());
    assert!(driver.find_by_id("absent").await.unwrap().is_none());
    assert!(!driver.click_if_exists(By::Id("absent")).await.unwrap());

    let sum = driver
        .execute_script("return arguments[0] + arguments[1];", vec![json!(2), json!(3)])
        .await
        .unwrap();
    assert_eq!(sum, json!(5));

    driver.close().await.unwrap();
}
