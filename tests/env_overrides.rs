use nice_webdriver::DomainConstants;

// Lives in its own binary: config loading reads these variables, so this
// test cannot share a process with other load tests.
#[test]
fn test_env_overrides_test_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("domain.toml");
    std::fs::write(&path, "[test]\nhost = \"from-file\"\n").unwrap();

    std::env::set_var("NICE_WEBDRIVER_HOST", "from-env");
    std::env::set_var("NICE_WEBDRIVER_PORT", "9999");
    std::env::set_var("NICE_WEBDRIVER_WAIT", "7");
    let constants = DomainConstants::load(&path).unwrap();

    assert_eq!(constants.test.host, "from-env");
    assert_eq!(constants.test.port, 9999);
    assert_eq!(constants.test.wait_seconds, 7);
}
