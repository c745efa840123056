use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::{By, Key};
use tracing_subscriber::EnvFilter;

use crate::config::{SeleniumNode, TestSleeps};
use crate::driver::NiceWebDriver;
use crate::factory::{DriverOptions, NiceWebDriverFactory};
use crate::Result;

/// Install the global tracing subscriber. Safe to call from every test;
/// only the first call takes effect.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Lifecycle hooks for a browser test suite running against every
/// configured node.
///
/// Implementors point at a config file and get one [`NodeSession`] per
/// `[[nodes]]` entry. Suites meant to be watched can turn on
/// [`demonstrated`](Self::demonstrated) to pace interactions at human speed.
#[async_trait]
pub trait TestSuite {
    fn config_path(&self) -> &Path;

    /// Subroot opened right after each session comes up.
    fn default_subroot(&self) -> &str {
        ""
    }

    /// Browser arguments applied to every local session that accepts them.
    fn default_option_args(&self) -> Option<&str> {
        None
    }

    /// Pace interactions so a human can follow along.
    fn demonstrated(&self) -> bool {
        false
    }

    /// Leave browsers open after the suite, for inspecting failures.
    fn keep_open_for_debugging(&self) -> bool {
        false
    }

    /// One session per configured node, each already on the default subroot.
    async fn open_sessions(&self) -> Result<Vec<NodeSession>> {
        let factory = NiceWebDriverFactory::get(self.config_path())?;
        let wait = Duration::from_secs(factory.constants().test.wait_seconds);
        let mut sessions = Vec::with_capacity(factory.nodes().len());
        for node in factory.nodes() {
            let options = options_for_node(node, self.default_option_args(), wait);
            let driver = factory.nice_driver_for_node(node, options).await?;
            tracing::info!(
                driver_type = %node.driver_type,
                local = node.local,
                "Opened node session"
            );
            let session = NodeSession::new(
                driver,
                node.clone(),
                factory.constants().sleeps.clone(),
                self.demonstrated(),
            );
            session.driver().open_test(self.default_subroot()).await?;
            sessions.push(session);
        }
        Ok(sessions)
    }

    /// Close every session and stop the spawned driver servers, unless the
    /// suite wants browsers left open.
    async fn close_sessions(&self, sessions: Vec<NodeSession>) -> Result<()> {
        if self.keep_open_for_debugging() {
            tracing::warn!("Leaving browser sessions open for debugging");
            return Ok(());
        }
        for session in sessions {
            session.close().await?;
        }
        if let Ok(factory) = NiceWebDriverFactory::get_existing() {
            factory.shutdown_servers().await;
        }
        Ok(())
    }
}

/// Session options for one node. Default option args go to local nodes
/// only, and only where the browser takes them; every node gets the test
/// wait budget.
fn options_for_node(
    node: &SeleniumNode,
    default_args: Option<&str>,
    wait: Duration,
) -> DriverOptions {
    let mut options = DriverOptions::new().wait(wait);
    if node.local && node.driver_type.supports_option_args() {
        if let Some(args) = default_args {
            options = options.option_args(args);
        }
    }
    options
}

/// One live browser session bound to a configured node, with paced
/// interaction and assertion helpers.
pub struct NodeSession {
    driver: NiceWebDriver,
    node: SeleniumNode,
    sleeps: TestSleeps,
    demonstrated: bool,
}

impl NodeSession {
    pub fn new(
        driver: NiceWebDriver,
        node: SeleniumNode,
        sleeps: TestSleeps,
        demonstrated: bool,
    ) -> Self {
        Self {
            driver,
            node,
            sleeps,
            demonstrated,
        }
    }

    pub fn driver(&self) -> &NiceWebDriver {
        &self.driver
    }

    pub fn node(&self) -> &SeleniumNode {
        &self.node
    }

    pub async fn close(self) -> Result<()> {
        self.driver.close().await
    }

    async fn pace(&self, millis: u64) {
        if self.demonstrated {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// Pause long enough for a watcher to take in the current page state.
    pub async fn interactive_pause(&self) {
        self.pace(self.sleeps.interactive_pause_ms).await;
    }

    /// Pause long enough for a watcher to read a success message.
    pub async fn success_pause(&self) {
        self.pace(self.sleeps.success_message_ms).await;
    }

    /// Click with demo pacing around it. Returns whether a click happened.
    pub async fn click_paced(&self, by: By) -> Result<bool> {
        self.pace(self.sleeps.before_click_ms).await;
        let clicked = self.driver.click_if_exists(by).await?;
        self.pace(self.sleeps.after_click_ms).await;
        Ok(clicked)
    }

    /// Type text, one keystroke at a time when demonstrating. Returns
    /// whether the element was found.
    pub async fn send_keys_paced(&self, by: By, text: &str) -> Result<bool> {
        if !self.demonstrated {
            return self.driver.send_keys_if_exists(by, text).await;
        }
        let Some(elem) = self.driver.find_if_exists(by).await? else {
            return Ok(false);
        };
        for ch in text.chars() {
            elem.send_keys(ch.to_string()).await?;
            self.pace(self.sleeps.between_keystrokes_ms).await;
        }
        Ok(true)
    }

    /// Erase characters from a field with paced backspace keystrokes.
    pub async fn backspace(&self, by: By, count: usize) -> Result<bool> {
        let Some(elem) = self.driver.find_if_exists(by).await? else {
            return Ok(false);
        };
        let key = char::from(Key::Backspace).to_string();
        for _ in 0..count {
            elem.send_keys(&key).await?;
            self.pace(self.sleeps.between_keystrokes_ms).await;
        }
        Ok(true)
    }

    /// Open the page at the subroot and panic if the container serves a 404.
    pub async fn assert_subroot_not_404(&self, subroot: &str) -> Result<()> {
        self.driver.open_test(subroot).await?;
        if self.driver.is_web_page_404().await? {
            panic!("page at subroot {:?} returned HTTP Status 404", subroot);
        }
        Ok(())
    }

    /// Panic unless an anchor with the href fragment is present on the page.
    pub async fn assert_anchor_present(&self, href: &str) -> Result<()> {
        if !self.driver.anchor_exists_with_href(href, false).await? {
            panic!("no anchor with href containing {:?}", href);
        }
        Ok(())
    }

    /// Panic unless the anchor is present inside an expanded menu.
    pub async fn assert_anchor_visible(&self, href: &str) -> Result<()> {
        if !self.driver.anchor_exists_with_href(href, true).await? {
            panic!("anchor with href containing {:?} is not visible", href);
        }
        Ok(())
    }

    /// Panic unless the anchor exists but sits in a collapsed menu.
    pub async fn assert_anchor_hidden(&self, href: &str) -> Result<()> {
        if !self.driver.anchor_exists_with_href(href, false).await? {
            panic!("no anchor with href containing {:?}", href);
        }
        if self.driver.anchor_exists_with_href(href, true).await? {
            panic!("anchor with href containing {:?} is visible", href);
        }
        Ok(())
    }

    /// Panic if any anchor with the href fragment exists at all.
    pub async fn assert_anchor_absent(&self, href: &str) -> Result<()> {
        if self.driver.anchor_exists_with_href(href, false).await? {
            panic!("unexpected anchor with href containing {:?}", href);
        }
        Ok(())
    }

    /// Click the anchor and panic unless the browser lands on its page.
    pub async fn assert_anchor_navigates(&self, href: &str) -> Result<()> {
        self.pace(self.sleeps.before_click_ms).await;
        if !self.driver.click_anchor_with_href(href, false).await? {
            panic!("no anchor with href containing {:?}", href);
        }
        self.pace(self.sleeps.after_click_ms).await;
        if !self.driver.current_page_is(href).await? {
            panic!("clicking anchor {:?} did not navigate there", href);
        }
        Ok(())
    }
}
