use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thirtyfour::error::WebDriverError;
use thirtyfour::{By, WebDriver, WebElement};
use tokio::time::Instant;
use url::Url;

use crate::config::DomainConstants;
use crate::page_url::PageUrl;
use crate::timeouts::ms;
use crate::Result;

/// A WebDriver session with graceful element lookup.
///
/// Lookup helpers return `Ok(None)` instead of failing when an element never
/// appears, and interaction helpers retry once the element becomes clickable
/// before giving up. The wait budget is fixed at construction time.
pub struct NiceWebDriver {
    driver: WebDriver,
    constants: Arc<DomainConstants>,
    wait: Duration,
    remote: bool,
}

impl NiceWebDriver {
    pub(crate) fn new(
        driver: WebDriver,
        constants: Arc<DomainConstants>,
        wait: Duration,
        remote: bool,
    ) -> Self {
        Self {
            driver,
            constants,
            wait,
            remote,
        }
    }

    /// The underlying session, for operations this wrapper does not cover.
    pub fn inner(&self) -> &WebDriver {
        &self.driver
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Whether this session runs on a remote grid node rather than a
    /// locally spawned driver server.
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub async fn open(&self, url: &str) -> Result<()> {
        tracing::info!(url, "Opening page");
        self.driver.goto(url).await?;
        Ok(())
    }

    pub async fn open_page(&self, page: &PageUrl) -> Result<()> {
        self.open(&page.build()).await
    }

    /// Open a page served from this machine, under the configured local
    /// context root.
    pub async fn open_local(&self, subroot: &str) -> Result<()> {
        let page = PageUrl::http("localhost")
            .port(self.constants.local.port)
            .context_root(&self.constants.local.web_context_root)
            .subroot(subroot);
        self.open_page(&page).await
    }

    /// Open a page on the environment under test over plain HTTP.
    pub async fn open_test(&self, subroot: &str) -> Result<()> {
        let page = PageUrl::http(&self.constants.test.host)
            .port(self.constants.test.port)
            .context_root(&self.constants.test.web_context_root)
            .subroot(subroot);
        self.open_page(&page).await
    }

    /// Open a page on the environment under test over HTTPS.
    pub async fn open_test_https(&self, subroot: &str) -> Result<()> {
        let page = PageUrl::https(&self.constants.test.host)
            .port(self.constants.test.port)
            .context_root(&self.constants.test.web_context_root)
            .subroot(subroot);
        self.open_page(&page).await
    }

    /// Find an element, waiting up to the session wait budget for it to
    /// appear. Returns `Ok(None)` if it never does.
    ///
    /// The first probe is immediate so pages that already carry the element
    /// pay no wait at all.
    pub async fn find_if_exists(&self, by: By) -> Result<Option<WebElement>> {
        match self.driver.find(by.clone()).await {
            Ok(elem) => return Ok(Some(elem)),
            Err(WebDriverError::NoSuchElement(_)) => {}
            Err(e) => return Err(e.into()),
        }
        let deadline = Instant::now() + self.wait;
        loop {
            tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
            match self.driver.find(by.clone()).await {
                Ok(elem) => return Ok(Some(elem)),
                Err(WebDriverError::NoSuchElement(_)) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(selector = ?by, wait = ?self.wait, "Element never appeared");
                        return Ok(None);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn find_by_css(&self, css: &str) -> Result<Option<WebElement>> {
        self.find_if_exists(By::Css(css)).await
    }

    pub async fn find_by_xpath(&self, xpath: &str) -> Result<Option<WebElement>> {
        self.find_if_exists(By::XPath(xpath)).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<WebElement>> {
        self.find_if_exists(By::Id(id)).await
    }

    pub async fn find_by_link_text(&self, text: &str) -> Result<Option<WebElement>> {
        self.find_if_exists(By::LinkText(text)).await
    }

    /// Click the element if it exists. Returns whether a click happened.
    ///
    /// A click rejected for interactability is retried once the element
    /// reports clickable, then once more after a full wait period. That
    /// last attempt propagates its error.
    pub async fn click_if_exists(&self, by: By) -> Result<bool> {
        let Some(elem) = self.find_if_exists(by.clone()).await? else {
            return Ok(false);
        };
        match elem.click().await {
            Ok(()) => return Ok(true),
            Err(e) if is_interactability_error(&e) => {
                tracing::debug!(selector = ?by, error = %e, "Click rejected, waiting for clickability");
            }
            Err(e) => return Err(e.into()),
        }
        if self.await_clickable(&elem).await? && elem.click().await.is_ok() {
            return Ok(true);
        }
        tokio::time::sleep(self.wait).await;
        elem.click().await?;
        Ok(true)
    }

    /// Type into the element if it exists. Returns whether the keys were sent.
    pub async fn send_keys_if_exists(&self, by: By, text: &str) -> Result<bool> {
        let Some(elem) = self.find_if_exists(by.clone()).await? else {
            return Ok(false);
        };
        match elem.send_keys(text).await {
            Ok(()) => return Ok(true),
            Err(e) if is_interactability_error(&e) => {
                tracing::debug!(selector = ?by, error = %e, "Keystrokes rejected, waiting for clickability");
            }
            Err(e) => return Err(e.into()),
        }
        if self.await_clickable(&elem).await? && elem.send_keys(text).await.is_ok() {
            return Ok(true);
        }
        tokio::time::sleep(self.wait).await;
        elem.send_keys(text).await?;
        Ok(true)
    }

    /// Scroll the element into view if it exists. Returns whether it was found.
    pub async fn scroll_into_view_if_exists(&self, by: By) -> Result<bool> {
        let Some(elem) = self.find_if_exists(by.clone()).await? else {
            return Ok(false);
        };
        match elem.scroll_into_view().await {
            Ok(()) => return Ok(true),
            Err(e) => {
                tracing::debug!(selector = ?by, error = %e, "Scroll rejected, waiting for visibility");
            }
        }
        if self.await_displayed(&elem).await? && elem.scroll_into_view().await.is_ok() {
            return Ok(true);
        }
        tokio::time::sleep(self.wait).await;
        elem.scroll_into_view().await?;
        Ok(true)
    }

    async fn await_displayed(&self, elem: &WebElement) -> Result<bool> {
        let deadline = Instant::now() + self.wait;
        loop {
            if elem.is_displayed().await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
        }
    }

    async fn await_clickable(&self, elem: &WebElement) -> Result<bool> {
        let deadline = Instant::now() + self.wait;
        loop {
            if elem.is_clickable().await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
        }
    }

    /// CSS query matching anchors whose href contains the given fragment.
    /// With `visible_only`, restricted to anchors inside an expanded
    /// (`.show`) parent, as Bootstrap-style menus render them.
    pub fn anchor_query_for_href(href: &str, visible_only: bool) -> String {
        if visible_only {
            format!(".show > a[href*=\"{}\"]", href)
        } else {
            format!("a[href*=\"{}\"]", href)
        }
    }

    pub async fn anchor_with_href(
        &self,
        href: &str,
        visible_only: bool,
    ) -> Result<Option<WebElement>> {
        self.find_by_css(&Self::anchor_query_for_href(href, visible_only))
            .await
    }

    pub async fn anchor_exists_with_href(&self, href: &str, visible_only: bool) -> Result<bool> {
        Ok(self.anchor_with_href(href, visible_only).await?.is_some())
    }

    /// Click the anchor whose href contains the fragment. Returns whether
    /// a click happened.
    pub async fn click_anchor_with_href(&self, href: &str, visible_only: bool) -> Result<bool> {
        self.click_if_exists(By::Css(Self::anchor_query_for_href(href, visible_only)))
            .await
    }

    pub async fn current_url(&self) -> Result<Url> {
        Ok(self.driver.current_url().await?)
    }

    /// Whether the browser currently shows the page at the given subroot.
    pub async fn current_page_is(&self, subroot: &str) -> Result<bool> {
        let url = self.driver.current_url().await?;
        Ok(url_matches_subroot(url.path(), subroot))
    }

    /// Whether the current page is a container 404 error page.
    pub async fn is_web_page_404(&self) -> Result<bool> {
        let source = self.driver.source().await?;
        Ok(source.contains("HTTP Status 404"))
    }

    pub async fn title(&self) -> Result<String> {
        Ok(self.driver.title().await?)
    }

    pub async fn page_source(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }

    /// Run a JavaScript snippet in the page and return its result.
    pub async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let ret = self.driver.execute(script, args).await?;
        Ok(ret.json().clone())
    }

    /// End the session and release the browser.
    pub async fn close(self) -> Result<()> {
        tracing::info!("Closing WebDriver session");
        self.driver.quit().await?;
        Ok(())
    }
}

fn is_interactability_error(e: &WebDriverError) -> bool {
    matches!(
        e,
        WebDriverError::ElementNotInteractable(_) | WebDriverError::ElementClickIntercepted(_)
    )
}

fn url_matches_subroot(path: &str, subroot: &str) -> bool {
    let path = path.trim_end_matches('/');
    let subroot = subroot.trim_matches('/');
    if subroot.is_empty() {
        return true;
    }
    // Suffix match only counts on a path-segment boundary, so being on
    // /app/mylogin is not being on the login subroot.
    path == subroot
        || path
            .strip_suffix(subroot)
            .is_some_and(|prefix| prefix.ends_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_query_any() {
        assert_eq!(
            NiceWebDriver::anchor_query_for_href("/app/login", false),
            "a[href*=\"/app/login\"]"
        );
    }

    #[test]
    fn test_anchor_query_visible_only() {
        assert_eq!(
            NiceWebDriver::anchor_query_for_href("/app/login", true),
            ".show > a[href*=\"/app/login\"]"
        );
    }

    #[test]
    fn test_url_matches_subroot() {
        assert!(url_matches_subroot("/app/login", "login"));
        assert!(url_matches_subroot("/app/login/", "login"));
        assert!(url_matches_subroot("/app/login", "/login/"));
        assert!(!url_matches_subroot("/app/login", "logout"));
    }

    #[test]
    fn test_subroot_requires_segment_boundary() {
        assert!(!url_matches_subroot("/app/mylogin", "login"));
        assert!(!url_matches_subroot("/app/login2", "login"));
        assert!(url_matches_subroot("/app/login", "app/login"));
        assert!(!url_matches_subroot("/webapp/login", "app/login"));
    }

    #[test]
    fn test_empty_subroot_matches_everything() {
        assert!(url_matches_subroot("/", ""));
        assert!(url_matches_subroot("/app", "/"));
    }
}
