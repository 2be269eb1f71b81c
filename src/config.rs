//! Parser configuration.

use crate::error::{CnabError, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the decode mode.
pub const MODE_ENV_VAR: &str = "CNAB240_MODE";

/// How field-level decode errors on event records are handled.
///
/// Structural errors (headers, record lengths, segment ordering) are fatal
/// in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Any decode error aborts the parse.
    Strict,
    /// A bad event is logged, reported and skipped.
    #[default]
    Tolerant,
}

impl FromStr for DecodeMode {
    type Err = CnabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(DecodeMode::Strict),
            "tolerant" => Ok(DecodeMode::Tolerant),
            other => Err(CnabError::InvalidConfig(format!(
                "unknown decode mode '{}', expected 'strict' or 'tolerant'",
                other
            ))),
        }
    }
}

impl fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeMode::Strict => write!(f, "strict"),
            DecodeMode::Tolerant => write!(f, "tolerant"),
        }
    }
}

/// Settings for one [`Cnab240Parser`](crate::Cnab240Parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserConfig {
    pub mode: DecodeMode,
}

impl ParserConfig {
    pub fn strict() -> Self {
        ParserConfig {
            mode: DecodeMode::Strict,
        }
    }

    pub fn tolerant() -> Self {
        ParserConfig {
            mode: DecodeMode::Tolerant,
        }
    }

    /// Reads the configuration from `CNAB240_MODE`, defaulting to tolerant.
    pub fn from_env() -> Result<Self> {
        Self::from_mode_var(env::var(MODE_ENV_VAR).ok().as_deref())
    }

    fn from_mode_var(value: Option<&str>) -> Result<Self> {
        let mode = match value {
            Some(v) if !v.trim().is_empty() => v.parse()?,
            _ => DecodeMode::default(),
        };
        Ok(ParserConfig { mode })
    }
}
