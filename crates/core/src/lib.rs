//! Configuration contract, domain types, and error definitions.
//!
//! Foundation crate -- no async or I/O dependencies beyond reading the
//! optional `config.yml`.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConnectorConfig, Resolver};
pub use error::{CourierError, CourierResult};
pub use types::{ConnectorType, LogLevel, ProxyProtocol, RunInterval};
