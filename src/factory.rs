use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use thirtyfour::prelude::*;
use thirtyfour::{Capabilities, DesiredCapabilities};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::config::{DomainConstants, SeleniumNode};
use crate::driver::NiceWebDriver;
use crate::driver_type::DriverType;
use crate::timeouts::ms;
use crate::{Error, Result};

static FACTORY: OnceCell<NiceWebDriverFactory> = OnceCell::new();

/// Per-session overrides applied on top of the loaded domain constants.
#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    pub(crate) option_args: Option<String>,
    pub(crate) wait: Option<Duration>,
}

impl DriverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitespace-separated browser arguments, e.g. `"--headless --incognito"`.
    /// Only Chrome, Firefox, and Edge accept these.
    pub fn option_args(mut self, args: impl Into<String>) -> Self {
        self.option_args = Some(args.into());
        self
    }

    /// Element wait budget for the session, replacing the configured default.
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }
}

/// Process-wide builder of [`NiceWebDriver`] sessions.
///
/// The first [`get`](Self::get) call loads the domain constants and pins them
/// for the life of the process; later calls return the same instance no matter
/// which path they pass. Driver servers are spawned lazily, at most one
/// running per driver type, and stay up until
/// [`shutdown_servers`](Self::shutdown_servers) kills them.
pub struct NiceWebDriverFactory {
    constants: Arc<DomainConstants>,
    servers: Mutex<HashMap<DriverType, Child>>,
}

impl NiceWebDriverFactory {
    /// The factory singleton, initializing it from the given config file on
    /// the first call.
    pub fn get(config_path: impl AsRef<Path>) -> Result<&'static Self> {
        FACTORY.get_or_try_init(|| {
            let constants = DomainConstants::load(config_path.as_ref())?;
            tracing::info!(
                config = %config_path.as_ref().display(),
                "Initialized WebDriver factory"
            );
            Ok(Self {
                constants: Arc::new(constants),
                servers: Mutex::new(HashMap::new()),
            })
        })
    }

    /// The already-initialized singleton, or an error if no [`get`](Self::get)
    /// call has happened yet.
    pub fn get_existing() -> Result<&'static Self> {
        FACTORY.get().ok_or(Error::FactoryNotInitialized)
    }

    #[cfg(test)]
    fn with_constants(constants: DomainConstants) -> Self {
        Self {
            constants: Arc::new(constants),
            servers: Mutex::new(HashMap::new()),
        }
    }

    pub fn constants(&self) -> &DomainConstants {
        &self.constants
    }

    /// The configured execution targets, in file order.
    pub fn nodes(&self) -> &[SeleniumNode] {
        &self.constants.nodes
    }

    /// A local session with default options.
    pub async fn nice_driver(&self, driver: DriverType) -> Result<NiceWebDriver> {
        self.nice_driver_with_options(driver, DriverOptions::new())
            .await
    }

    /// A local session: ensures the driver server for this browser is
    /// running, then connects with bounded retries. Retry count and default
    /// wait come from the `[local]` config section.
    pub async fn nice_driver_with_options(
        &self,
        driver: DriverType,
        options: DriverOptions,
    ) -> Result<NiceWebDriver> {
        if !driver.is_instantiable() {
            return Err(Error::UnsupportedDriver(driver));
        }
        let caps = build_capabilities(driver, options.option_args.as_deref())?;
        self.ensure_server(driver).await?;
        let endpoint = format!("http://localhost:{}", driver.default_server_port());
        let session = self
            .connect(
                driver,
                &endpoint,
                caps,
                self.constants.local.instantiation_max_retry,
            )
            .await?;
        Ok(NiceWebDriver::new(
            session,
            Arc::clone(&self.constants),
            options
                .wait
                .unwrap_or(Duration::from_secs(self.constants.local.wait_seconds)),
            false,
        ))
    }

    /// A session against a remote grid node.
    pub async fn nice_driver_remote(
        &self,
        remote_url: &url::Url,
        driver: DriverType,
        options: DriverOptions,
    ) -> Result<NiceWebDriver> {
        if !driver.is_instantiable() {
            return Err(Error::UnsupportedDriver(driver));
        }
        let caps = build_capabilities(driver, options.option_args.as_deref())?;
        let session = self
            .connect(
                driver,
                remote_url.as_str(),
                caps,
                self.constants.test.instantiation_max_retry,
            )
            .await?;
        Ok(NiceWebDriver::new(
            session,
            Arc::clone(&self.constants),
            options
                .wait
                .unwrap_or(Duration::from_secs(self.constants.test.wait_seconds)),
            true,
        ))
    }

    /// A session for a configured node, local or remote.
    pub async fn nice_driver_for_node(
        &self,
        node: &SeleniumNode,
        options: DriverOptions,
    ) -> Result<NiceWebDriver> {
        if node.local {
            self.nice_driver_with_options(node.driver_type, options).await
        } else {
            let url = node
                .remote_url
                .as_ref()
                .ok_or_else(|| Error::InvalidUrl("remote node has no remote_url".into()))?;
            self.nice_driver_remote(url, node.driver_type, options).await
        }
    }

    async fn ensure_server(&self, driver: DriverType) -> Result<()> {
        let mut servers = self.servers.lock().await;
        if let Some(child) = servers.get_mut(&driver) {
            match child.try_wait()? {
                None => return Ok(()),
                Some(status) => {
                    tracing::warn!(driver = %driver, %status, "Driver server exited, respawning");
                    servers.remove(&driver);
                }
            }
        }
        let binary = self.resolve_server_binary(driver)?;
        let port = driver.default_server_port();
        tracing::info!(
            driver = %driver,
            binary = %binary.display(),
            port,
            "Starting driver server"
        );
        let child = Command::new(&binary)
            .arg(format!("--port={}", port))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::ServerSpawnFailed { driver, source })?;
        servers.insert(driver, child);
        tokio::time::sleep(Duration::from_millis(ms::SERVER_STARTUP_SETTLE)).await;
        Ok(())
    }

    /// Kill every spawned driver server and reap it. Without this the
    /// children outlive the process: the singleton is a `static`, so its
    /// drop glue (and with it kill-on-drop) never runs.
    pub async fn shutdown_servers(&self) {
        let mut servers = self.servers.lock().await;
        for (driver, mut child) in servers.drain() {
            tracing::info!(driver = %driver, "Stopping driver server");
            if let Err(e) = child.kill().await {
                tracing::warn!(driver = %driver, error = %e, "Failed to stop driver server");
            }
        }
    }

    /// Configured binary path for the driver server, falling back to a PATH
    /// lookup by conventional name. A configured path that does not exist on
    /// disk fails fast rather than at spawn time.
    fn resolve_server_binary(&self, driver: DriverType) -> Result<PathBuf> {
        if let Some(path) = self.constants.driver_path(driver) {
            if !path.exists() {
                return Err(Error::DriverBinaryNotFound {
                    driver,
                    path: path.to_path_buf(),
                });
            }
            return Ok(path.to_path_buf());
        }
        let name = driver
            .server_binary_name()
            .ok_or(Error::DriverBinaryUnconfigured(driver))?;
        which::which(name).map_err(|_| Error::DriverBinaryUnconfigured(driver))
    }

    async fn connect(
        &self,
        driver: DriverType,
        endpoint: &str,
        caps: Capabilities,
        max_retry: u32,
    ) -> Result<WebDriver> {
        for attempt in 1..=max_retry {
            match WebDriver::new(endpoint, caps.clone()).await {
                Ok(session) => {
                    tracing::debug!(driver = %driver, endpoint, attempt, "WebDriver session established");
                    return Ok(session);
                }
                Err(e) => {
                    tracing::debug!(
                        driver = %driver,
                        endpoint,
                        attempt,
                        max_retry,
                        error = %e,
                        "Session attempt failed"
                    );
                    tokio::time::sleep(Duration::from_millis(ms::SERVER_CONNECT_RETRY_DELAY))
                        .await;
                }
            }
        }
        tracing::error!(driver = %driver, endpoint, attempts = max_retry, "Giving up on WebDriver session");
        Err(Error::SessionConnect {
            driver,
            attempts: max_retry,
        })
    }
}

fn build_capabilities(driver: DriverType, option_args: Option<&str>) -> Result<Capabilities> {
    if option_args.is_some() && !driver.supports_option_args() {
        return Err(Error::OptionArgsUnsupported(driver));
    }
    let args = option_args.unwrap_or_default().split_whitespace();
    let caps = match driver {
        DriverType::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            for arg in args {
                caps.add_arg(arg)?;
            }
            caps.into()
        }
        DriverType::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            for arg in args {
                caps.add_arg(arg)?;
            }
            caps.into()
        }
        DriverType::Edge => {
            let mut caps = DesiredCapabilities::edge();
            for arg in args {
                caps.add_arg(arg)?;
            }
            caps.into()
        }
        DriverType::Ie => DesiredCapabilities::internet_explorer().into(),
        DriverType::Opera => DesiredCapabilities::opera().into(),
        DriverType::Safari => DesiredCapabilities::safari().into(),
        other => return Err(Error::UnsupportedDriver(other)),
    };
    Ok(caps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_driver_options_defaults() {
        let options = DriverOptions::new();
        assert!(options.option_args.is_none());
        assert!(options.wait.is_none());
    }

    #[test]
    fn test_driver_options_builder() {
        let options = DriverOptions::new()
            .option_args("--headless")
            .wait(Duration::from_secs(3));
        assert_eq!(options.option_args.as_deref(), Some("--headless"));
        assert_eq!(options.wait, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_chrome_capabilities_carry_args() {
        let caps =
            build_capabilities(DriverType::Chrome, Some("--headless --no-sandbox")).unwrap();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.contains(&Value::String("--headless".into())));
        assert!(args.contains(&Value::String("--no-sandbox".into())));
    }

    #[test]
    fn test_option_args_rejected_for_safari() {
        let err = build_capabilities(DriverType::Safari, Some("--headless")).unwrap_err();
        assert!(matches!(err, Error::OptionArgsUnsupported(DriverType::Safari)));
    }

    #[test]
    fn test_uninstantiable_driver_rejected() {
        let err = build_capabilities(DriverType::Android, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDriver(DriverType::Android)));
    }

    #[test]
    fn test_safari_without_args_ok() {
        build_capabilities(DriverType::Safari, None).unwrap();
    }

    #[test]
    fn test_missing_configured_binary_fails_fast() {
        let mut constants = DomainConstants::default();
        constants
            .driver_paths
            .insert(DriverType::Chrome, "/nonexistent/chromedriver".into());
        let factory = NiceWebDriverFactory::with_constants(constants);
        let err = factory.resolve_server_binary(DriverType::Chrome).unwrap_err();
        assert!(matches!(err, Error::DriverBinaryNotFound { .. }));
    }

    // Stands in `sleep` for the driver server; it exits as soon as it
    // rejects the --port argument, which also exercises the respawn path.
    #[tokio::test]
    async fn test_server_lifecycle_spawn_respawn_shutdown() {
        let stand_in = which::which("sleep").unwrap();
        let mut constants = DomainConstants::default();
        constants.driver_paths.insert(DriverType::Chrome, stand_in);
        let factory = NiceWebDriverFactory::with_constants(constants);

        factory.ensure_server(DriverType::Chrome).await.unwrap();
        assert_eq!(factory.servers.lock().await.len(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        factory.ensure_server(DriverType::Chrome).await.unwrap();
        assert_eq!(factory.servers.lock().await.len(), 1);

        factory.shutdown_servers().await;
        assert!(factory.servers.lock().await.is_empty());
    }
}
