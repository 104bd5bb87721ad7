//! Domain types for the Courier connector shell.

use crate::error::{CourierError, CourierResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Connector identity
// ---------------------------------------------------------------------------

/// Connector registration class, as the platform knows them.
///
/// Wire values are the upper-snake strings used in `CONNECTOR_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorType {
    ExternalImport,
    InternalEnrichment,
    InternalImportFile,
    InternalExportFile,
    Stream,
}

impl ConnectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalImport => "EXTERNAL_IMPORT",
            Self::InternalEnrichment => "INTERNAL_ENRICHMENT",
            Self::InternalImportFile => "INTERNAL_IMPORT_FILE",
            Self::InternalExportFile => "INTERNAL_EXPORT_FILE",
            Self::Stream => "STREAM",
        }
    }
}

impl FromStr for ConnectorType {
    type Err = CourierError;

    fn from_str(s: &str) -> CourierResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EXTERNAL_IMPORT" => Ok(Self::ExternalImport),
            "INTERNAL_ENRICHMENT" => Ok(Self::InternalEnrichment),
            "INTERNAL_IMPORT_FILE" => Ok(Self::InternalImportFile),
            "INTERNAL_EXPORT_FILE" => Ok(Self::InternalExportFile),
            "STREAM" => Ok(Self::Stream),
            other => Err(CourierError::InvalidInput(format!(
                "Unknown connector type: {other}"
            ))),
        }
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Log level
// ---------------------------------------------------------------------------

/// Log verbosity from `CONNECTOR_LOG_LEVEL`. Maps onto a tracing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string for `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = CourierError;

    fn from_str(s: &str) -> CourierResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            // "warning" is what the platform sample configs use.
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(CourierError::InvalidInput(format!(
                "Unknown log level: {other}"
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

// ---------------------------------------------------------------------------
// Proxy protocol
// ---------------------------------------------------------------------------

/// Scheme for the optional outbound proxy (`PROXY_PROTOCOL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks5 => "socks5",
        }
    }
}

impl FromStr for ProxyProtocol {
    type Err = CourierError;

    fn from_str(s: &str) -> CourierResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            "socks5" | "socks" => Ok(Self::Socks5),
            other => Err(CourierError::InvalidInput(format!(
                "Unknown proxy protocol: {other}"
            ))),
        }
    }
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

// ---------------------------------------------------------------------------
// Run interval
// ---------------------------------------------------------------------------

/// Polling cadence from `CONNECTOR_RUN_EVERY`.
///
/// Grammar: `<positive integer><unit>` where unit is `s`, `m`, `h`, or `d`
/// (`30s`, `10m`, `12h`, `1d`). Bare numbers are rejected so a cadence can
/// never be misread as seconds vs. days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunInterval(Duration);

impl RunInterval {
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

impl FromStr for RunInterval {
    type Err = CourierError;

    fn from_str(s: &str) -> CourierResult<Self> {
        let invalid = || {
            CourierError::InvalidInput(format!(
                "Invalid run interval '{s}': expected <number><s|m|h|d>"
            ))
        };

        let s = s.trim();
        // char_indices keeps the split on a char boundary for multibyte input.
        let (idx, unit) = s.char_indices().last().ok_or_else(invalid)?;
        let digits = &s[..idx];

        let multiplier: u64 = match unit {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            _ => return Err(invalid()),
        };

        let count: u64 = digits.parse().map_err(|_| invalid())?;

        if count == 0 {
            return Err(CourierError::InvalidInput(
                "Run interval must be positive".into(),
            ));
        }

        let secs = count.checked_mul(multiplier).ok_or_else(invalid)?;
        Ok(Self(Duration::from_secs(secs)))
    }
}

impl fmt::Display for RunInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        if secs % 86_400 == 0 {
            write!(f, "{}d", secs / 86_400)
        } else if secs % 3_600 == 0 {
            write!(f, "{}h", secs / 3_600)
        } else if secs % 60 == 0 {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{secs}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_type_round_trips_wire_strings() {
        for s in [
            "EXTERNAL_IMPORT",
            "INTERNAL_ENRICHMENT",
            "INTERNAL_IMPORT_FILE",
            "INTERNAL_EXPORT_FILE",
            "STREAM",
        ] {
            let t: ConnectorType = s.parse().unwrap();
            assert_eq!(t.as_str(), s);
        }
        assert!("IMPORT".parse::<ConnectorType>().is_err());
    }

    #[test]
    fn log_level_accepts_platform_spellings() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("trace2".parse::<LogLevel>().is_err());
    }

    #[test]
    fn run_interval_grammar() {
        assert_eq!("60s".parse::<RunInterval>().unwrap().as_secs(), 60);
        assert_eq!("30m".parse::<RunInterval>().unwrap().as_secs(), 1_800);
        assert_eq!("12h".parse::<RunInterval>().unwrap().as_secs(), 43_200);
        assert_eq!("1d".parse::<RunInterval>().unwrap().as_secs(), 86_400);

        assert!("0d".parse::<RunInterval>().is_err());
        assert!("300".parse::<RunInterval>().is_err());
        assert!("".parse::<RunInterval>().is_err());
        assert!("daily".parse::<RunInterval>().is_err());
        // multibyte final char must not split mid-character
        assert!("1д".parse::<RunInterval>().is_err());
        assert!("д".parse::<RunInterval>().is_err());
        // seconds conversion must not overflow u64
        assert!("300000000000000000d".parse::<RunInterval>().is_err());
        assert_eq!(
            "213503982334601d".parse::<RunInterval>().unwrap().as_secs(),
            213_503_982_334_601 * 86_400
        );
    }

    #[test]
    fn run_interval_display_picks_largest_unit() {
        assert_eq!("1d".parse::<RunInterval>().unwrap().to_string(), "1d");
        assert_eq!("90m".parse::<RunInterval>().unwrap().to_string(), "90m");
        assert_eq!("45s".parse::<RunInterval>().unwrap().to_string(), "45s");
    }
}
