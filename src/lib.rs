pub mod config;
pub mod driver;
pub mod driver_type;
pub mod error;
pub mod factory;
pub mod harness;
pub mod page_url;
pub mod timeouts;

pub use config::{DomainConstants, SeleniumNode};
pub use driver::NiceWebDriver;
pub use driver_type::DriverType;
pub use error::Error;
pub use factory::{DriverOptions, NiceWebDriverFactory};
pub use harness::{init_logging, NodeSession, TestSuite};
pub use page_url::PageUrl;

pub type Result<T> = std::result::Result<T, Error>;
