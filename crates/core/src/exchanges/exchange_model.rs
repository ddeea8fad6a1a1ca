//! Exchange identity.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};

/// A copper futures venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Lme,
    Shfe,
    Comex,
}

impl Exchange {
    pub const ALL: [Exchange; 3] = [Exchange::Lme, Exchange::Shfe, Exchange::Comex];

    pub fn code(&self) -> &'static str {
        match self {
            Exchange::Lme => "LME",
            Exchange::Shfe => "SHFE",
            Exchange::Comex => "COMEX",
        }
    }

    /// Vendor ticker root for copper on this venue.
    pub fn ticker_root(&self) -> &'static str {
        match self {
            Exchange::Lme => "LP",
            Exchange::Shfe => "CU",
            Exchange::Comex => "HG",
        }
    }

    /// Number of generic slots seeded for a fresh database.
    pub fn default_generic_slots(&self) -> u32 {
        match self {
            Exchange::Lme => 24,
            Exchange::Shfe => 12,
            Exchange::Comex => 36,
        }
    }

    /// Whether the built-in rules miss part of this venue's holidays, so a
    /// calendar needs an explicit holiday list.
    pub fn requires_explicit_holidays(&self) -> bool {
        matches!(self, Exchange::Shfe)
    }

    pub fn weekend_days(&self) -> Vec<Weekday> {
        vec![Weekday::Sat, Weekday::Sun]
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Exchange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LME" => Ok(Exchange::Lme),
            "SHFE" => Ok(Exchange::Shfe),
            "COMEX" => Ok(Exchange::Comex),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown exchange code '{}'",
                other
            )))),
        }
    }
}
