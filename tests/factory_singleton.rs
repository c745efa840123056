use nice_webdriver::{Error, NiceWebDriverFactory};

// The whole singleton lifecycle lives in one test function; separate
// functions would race on initialization order under the parallel runner.
#[test]
fn test_factory_singleton_lifecycle() {
    assert!(matches!(
        NiceWebDriverFactory::get_existing(),
        Err(Error::FactoryNotInitialized)
    ));

    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.toml");
    std::fs::write(&first, "[test]\nhost = \"first.example.org\"\n").unwrap();
    let factory = NiceWebDriverFactory::get(&first).unwrap();
    assert_eq!(factory.constants().test.host, "first.example.org");
    assert!(factory.nodes().is_empty());

    // Later calls win nothing: the first config stays pinned.
    let second = dir.path().join("second.toml");
    std::fs::write(&second, "[test]\nhost = \"second.example.org\"\n").unwrap();
    let again = NiceWebDriverFactory::get(&second).unwrap();
    assert!(std::ptr::eq(factory, again));
    assert_eq!(again.constants().test.host, "first.example.org");

    let existing = NiceWebDriverFactory::get_existing().unwrap();
    assert!(std::ptr::eq(factory, existing));
}
