use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::driver_type::DriverType;
use crate::{Error, Result};

/// Process-wide constants for a test domain, loaded once from a TOML file.
///
/// Layout mirrors the config namespaces: `[driver_paths]`, `[local]`,
/// `[test]`, `[sleeps]`, and a `[[nodes]]` list of execution targets.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DomainConstants {
    #[serde(default)]
    pub driver_paths: HashMap<DriverType, PathBuf>,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub test: TestConfig,
    #[serde(default)]
    pub sleeps: TestSleeps,
    #[serde(default)]
    pub nodes: Vec<SeleniumNode>,
}

/// Constants for pages served from the machine running the tests.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub web_context_root: String,
    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: u64,
    #[serde(default = "default_instantiation_max_retry")]
    pub instantiation_max_retry: u32,
}

/// Constants for the environment under test.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TestConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub web_context_root: String,
    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: u64,
    #[serde(default = "default_instantiation_max_retry")]
    pub instantiation_max_retry: u32,
}

/// Millisecond pauses used to pace interactions during watched demo runs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TestSleeps {
    #[serde(default = "default_between_keystrokes_ms")]
    pub between_keystrokes_ms: u64,
    #[serde(default = "default_before_click_ms")]
    pub before_click_ms: u64,
    #[serde(default = "default_after_click_ms")]
    pub after_click_ms: u64,
    #[serde(default = "default_interactive_pause_ms")]
    pub interactive_pause_ms: u64,
    #[serde(default = "default_success_message_ms")]
    pub success_message_ms: u64,
}

/// One configured execution target: a local browser or a remote grid node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeleniumNode {
    pub local: bool,
    #[serde(default)]
    pub remote_url: Option<Url>,
    pub driver_type: DriverType,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_wait_seconds() -> u64 {
    1
}
fn default_instantiation_max_retry() -> u32 {
    5
}
fn default_between_keystrokes_ms() -> u64 {
    100
}
fn default_before_click_ms() -> u64 {
    100
}
fn default_after_click_ms() -> u64 {
    100
}
fn default_interactive_pause_ms() -> u64 {
    2000
}
fn default_success_message_ms() -> u64 {
    3500
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            web_context_root: String::new(),
            wait_seconds: default_wait_seconds(),
            instantiation_max_retry: default_instantiation_max_retry(),
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_context_root: String::new(),
            wait_seconds: default_wait_seconds(),
            instantiation_max_retry: default_instantiation_max_retry(),
        }
    }
}

impl Default for TestSleeps {
    fn default() -> Self {
        Self {
            between_keystrokes_ms: default_between_keystrokes_ms(),
            before_click_ms: default_before_click_ms(),
            after_click_ms: default_after_click_ms(),
            interactive_pause_ms: default_interactive_pause_ms(),
            success_message_ms: default_success_message_ms(),
        }
    }
}

impl DomainConstants {
    /// Load constants from a TOML file, apply environment overrides, and
    /// validate the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut constants: DomainConstants = toml::from_str(&content)?;
        constants.load_from_env();
        constants.validate()?;
        tracing::debug!(
            config = %path.display(),
            nodes = constants.nodes.len(),
            "Loaded domain constants"
        );
        Ok(constants)
    }

    fn load_from_env(&mut self) {
        if let Ok(host) = std::env::var("NICE_WEBDRIVER_HOST") {
            self.test.host = host;
        }
        if let Ok(port) = std::env::var("NICE_WEBDRIVER_PORT") {
            if let Ok(port) = port.parse() {
                self.test.port = port;
            }
        }
        if let Ok(wait) = std::env::var("NICE_WEBDRIVER_WAIT") {
            if let Ok(wait) = wait.parse() {
                self.test.wait_seconds = wait;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.local.wait_seconds == 0 {
            return Err(Error::Config(
                "local.wait_seconds must be greater than 0".into(),
            ));
        }
        if self.test.wait_seconds == 0 {
            return Err(Error::Config(
                "test.wait_seconds must be greater than 0".into(),
            ));
        }
        if self.local.instantiation_max_retry == 0 {
            return Err(Error::Config(
                "local.instantiation_max_retry must be greater than 0".into(),
            ));
        }
        if self.test.instantiation_max_retry == 0 {
            return Err(Error::Config(
                "test.instantiation_max_retry must be greater than 0".into(),
            ));
        }
        for (name, value) in [
            ("sleeps.between_keystrokes_ms", self.sleeps.between_keystrokes_ms),
            ("sleeps.before_click_ms", self.sleeps.before_click_ms),
            ("sleeps.after_click_ms", self.sleeps.after_click_ms),
            ("sleeps.interactive_pause_ms", self.sleeps.interactive_pause_ms),
            ("sleeps.success_message_ms", self.sleeps.success_message_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than 0", name)));
            }
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if node.local && node.remote_url.is_some() {
                return Err(Error::Config(format!(
                    "nodes[{}] is local but carries a remote_url",
                    i
                )));
            }
            if !node.local && node.remote_url.is_none() {
                return Err(Error::Config(format!(
                    "nodes[{}] is remote but has no remote_url",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Configured path of the driver-server binary for a driver type.
    pub fn driver_path(&self, driver: DriverType) -> Option<&Path> {
        self.driver_paths.get(&driver).map(PathBuf::as_path)
    }
}
