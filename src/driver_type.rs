use serde::{Deserialize, Serialize};

/// The browser/engine behind a WebDriver session.
///
/// The mobile and HtmlUnit variants exist so configuration files naming them
/// still parse, but the factory cannot instantiate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverType {
    Chrome,
    Firefox,
    Ie,
    Edge,
    Opera,
    Safari,
    IosIphone,
    IosIpad,
    Android,
    HtmlUnit,
}

impl DriverType {
    pub const ALL: [DriverType; 10] = [
        DriverType::Chrome,
        DriverType::Firefox,
        DriverType::Ie,
        DriverType::Edge,
        DriverType::Opera,
        DriverType::Safari,
        DriverType::IosIphone,
        DriverType::IosIpad,
        DriverType::Android,
        DriverType::HtmlUnit,
    ];

    /// Whether the factory can build a session for this driver type.
    pub fn is_instantiable(self) -> bool {
        !matches!(
            self,
            DriverType::IosIphone | DriverType::IosIpad | DriverType::Android | DriverType::HtmlUnit
        )
    }

    /// Whether free-form browser option arguments can be applied.
    pub fn supports_option_args(self) -> bool {
        matches!(
            self,
            DriverType::Chrome | DriverType::Firefox | DriverType::Edge
        )
    }

    /// Conventional name of the driver-server binary, used as a PATH
    /// fallback when no explicit path is configured.
    pub fn server_binary_name(self) -> Option<&'static str> {
        match self {
            DriverType::Chrome => Some("chromedriver"),
            DriverType::Firefox => Some("geckodriver"),
            DriverType::Ie => Some("IEDriverServer"),
            DriverType::Edge => Some("msedgedriver"),
            DriverType::Opera => Some("operadriver"),
            DriverType::Safari => Some("safaridriver"),
            _ => None,
        }
    }

    /// Default listen port of the driver server for this browser.
    pub fn default_server_port(self) -> u16 {
        match self {
            DriverType::Chrome => 9515,
            DriverType::Firefox => 4444,
            DriverType::Ie => 5555,
            DriverType::Edge => 17556,
            DriverType::Opera => 9516,
            DriverType::Safari => 4445,
            // Unreachable through the factory, but keep the map total.
            _ => 4444,
        }
    }
}

impl std::fmt::Display for DriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DriverType::Chrome => "chrome",
            DriverType::Firefox => "firefox",
            DriverType::Ie => "ie",
            DriverType::Edge => "edge",
            DriverType::Opera => "opera",
            DriverType::Safari => "safari",
            DriverType::IosIphone => "ios_iphone",
            DriverType::IosIpad => "ios_ipad",
            DriverType::Android => "android",
            DriverType::HtmlUnit => "html_unit",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for DriverType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "firefox" | "gecko" => Ok(Self::Firefox),
            "ie" | "internet_explorer" => Ok(Self::Ie),
            "edge" => Ok(Self::Edge),
            "opera" => Ok(Self::Opera),
            "safari" => Ok(Self::Safari),
            "ios_iphone" => Ok(Self::IosIphone),
            "ios_ipad" => Ok(Self::IosIpad),
            "android" => Ok(Self::Android),
            "html_unit" | "htmlunit" => Ok(Self::HtmlUnit),
            _ => Err(format!("Unknown driver type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_roundtrip() {
        for dt in DriverType::ALL {
            let parsed = DriverType::from_str(&dt.to_string()).unwrap();
            assert_eq!(parsed, dt);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(DriverType::from_str("netscape").is_err());
    }

    #[test]
    fn test_instantiable_set() {
        assert!(DriverType::Chrome.is_instantiable());
        assert!(DriverType::Safari.is_instantiable());
        assert!(!DriverType::Android.is_instantiable());
        assert!(!DriverType::HtmlUnit.is_instantiable());
    }

    #[test]
    fn test_option_args_support() {
        assert!(DriverType::Chrome.supports_option_args());
        assert!(DriverType::Firefox.supports_option_args());
        assert!(!DriverType::Safari.supports_option_args());
    }

    #[test]
    fn test_server_binary_names() {
        assert_eq!(DriverType::Chrome.server_binary_name(), Some("chromedriver"));
        assert_eq!(DriverType::Firefox.server_binary_name(), Some("geckodriver"));
        assert_eq!(DriverType::Android.server_binary_name(), None);
    }
}
