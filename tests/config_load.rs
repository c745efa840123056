use std::path::Path;

use nice_webdriver::{DomainConstants, DriverType};

const FULL_CONFIG: &str = r#"
[driver_paths]
chrome = "/opt/drivers/chromedriver"
firefox = "/opt/drivers/geckodriver"

[local]
port = 9090
web_context_root = "app"

[test]
host = "ci.example.org"
port = 8443
web_context_root = "app"
wait_seconds = 2
instantiation_max_retry = 3

[sleeps]
between_keystrokes_ms = 50

[[nodes]]
local = true
driver_type = "chrome"

[[nodes]]
local = false
remote_url = "http://grid.example.org:4444/wd/hub"
driver_type = "firefox"
"#;

#[test]
fn test_load_full_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("domain.toml");
    std::fs::write(&path, FULL_CONFIG).unwrap();

    let constants = DomainConstants::load(&path).unwrap();

    assert_eq!(
        constants.driver_path(DriverType::Chrome),
        Some(Path::new("/opt/drivers/chromedriver"))
    );
    assert_eq!(constants.driver_path(DriverType::Edge), None);

    assert_eq!(constants.local.port, 9090);
    assert_eq!(constants.local.web_context_root, "app");
    assert_eq!(constants.local.wait_seconds, 1);

    assert_eq!(constants.test.host, "ci.example.org");
    assert_eq!(constants.test.port, 8443);
    assert_eq!(constants.test.wait_seconds, 2);
    assert_eq!(constants.test.instantiation_max_retry, 3);

    assert_eq!(constants.sleeps.between_keystrokes_ms, 50);
    assert_eq!(constants.sleeps.interactive_pause_ms, 2000);

    assert_eq!(constants.nodes.len(), 2);
    assert!(constants.nodes[0].local);
    assert_eq!(constants.nodes[0].driver_type, DriverType::Chrome);
    assert_eq!(
        constants.nodes[1].remote_url.as_ref().unwrap().as_str(),
        "http://grid.example.org:4444/wd/hub"
    );
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("domain.toml");
    std::fs::write(&path, "[test]\nwait_seconds = 0\n").unwrap();
    assert!(DomainConstants::load(&path).is_err());
}

#[test]
fn test_missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(DomainConstants::load(dir.path().join("absent.toml")).is_err());
}
