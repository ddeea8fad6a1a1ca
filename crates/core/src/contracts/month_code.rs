//! Futures month codes and vendor ticker parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::COMDTY_YELLOW_KEY;
use crate::errors::{Error, ValidationError};
use crate::exchanges::Exchange;

/// Single-letter futures delivery month code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MonthCode {
    F,
    G,
    H,
    J,
    K,
    M,
    N,
    Q,
    U,
    V,
    X,
    Z,
}

impl MonthCode {
    pub const ALL: [MonthCode; 12] = [
        MonthCode::F,
        MonthCode::G,
        MonthCode::H,
        MonthCode::J,
        MonthCode::K,
        MonthCode::M,
        MonthCode::N,
        MonthCode::Q,
        MonthCode::U,
        MonthCode::V,
        MonthCode::X,
        MonthCode::Z,
    ];

    pub fn from_month(month: u32) -> Option<MonthCode> {
        month
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn letter(&self) -> char {
        match self {
            MonthCode::F => 'F',
            MonthCode::G => 'G',
            MonthCode::H => 'H',
            MonthCode::J => 'J',
            MonthCode::K => 'K',
            MonthCode::M => 'M',
            MonthCode::N => 'N',
            MonthCode::Q => 'Q',
            MonthCode::U => 'U',
            MonthCode::V => 'V',
            MonthCode::X => 'X',
            MonthCode::Z => 'Z',
        }
    }

    pub fn from_letter(letter: char) -> Option<MonthCode> {
        Self::ALL
            .iter()
            .find(|code| code.letter() == letter.to_ascii_uppercase())
            .copied()
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for MonthCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c),
            _ => None,
        }
        .ok_or_else(|| {
            Error::Validation(ValidationError::InvalidInput(format!(
                "Invalid month code '{}'",
                s
            )))
        })
    }
}

/// A concrete contract ticker such as `HGH25 Comdty`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractTicker {
    pub root: String,
    pub month: MonthCode,
    pub year: i32,
}

impl ContractTicker {
    pub fn new(exchange: Exchange, year: i32, month: MonthCode) -> Self {
        Self {
            root: exchange.ticker_root().to_string(),
            month,
            year,
        }
    }

    /// Parses `<ROOT><CODE><Y or YY>[ Comdty]`.
    ///
    /// A one-digit year resolves to the first year not before
    /// `reference_year` ending in that digit; a two-digit year resolves to
    /// the century that puts it nearest to `reference_year`.
    pub fn parse(ticker: &str, reference_year: i32) -> Result<Self, Error> {
        let invalid = || {
            Error::Validation(ValidationError::InvalidInput(format!(
                "Invalid contract ticker '{}'",
                ticker
            )))
        };

        let body = ticker
            .trim()
            .strip_suffix(COMDTY_YELLOW_KEY)
            .unwrap_or(ticker)
            .trim();
        let digits = body.chars().rev().take_while(char::is_ascii_digit).count();
        if digits == 0 || digits > 2 || body.len() < digits + 2 {
            return Err(invalid());
        }
        let (head, year_part) = body.split_at(body.len() - digits);
        let mut head_chars = head.chars();
        let code = head_chars.next_back().and_then(MonthCode::from_letter);
        let root = head_chars.as_str();
        let (Some(month), false) = (code, root.is_empty()) else {
            return Err(invalid());
        };
        let short_year: i32 = year_part.parse().map_err(|_| invalid())?;

        let year = if digits == 1 {
            let mut y = reference_year - reference_year.rem_euclid(10) + short_year;
            if y < reference_year {
                y += 10;
            }
            y
        } else {
            let century = reference_year - reference_year.rem_euclid(100);
            [century - 100, century, century + 100]
                .into_iter()
                .map(|c| c + short_year)
                .min_by_key(|y| (y - reference_year).abs())
                .unwrap_or(century + short_year)
        };

        Ok(Self {
            root: root.to_string(),
            month,
            year,
        })
    }

    pub fn contract_month(&self) -> u32 {
        self.month.month()
    }
}

impl fmt::Display for ContractTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{:02} {}",
            self.root,
            self.month,
            self.year.rem_euclid(100),
            COMDTY_YELLOW_KEY
        )
    }
}

/// Generic ticker for a slot, e.g. `HG1 Comdty`.
pub fn generic_ticker(exchange: Exchange, slot: u32) -> String {
    format!("{}{} {}", exchange.ticker_root(), slot, COMDTY_YELLOW_KEY)
}
