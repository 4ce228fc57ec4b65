//! Currency codes and the regional-indicator flag table.
//!
//! Channels announce currencies either by ISO code (`USD`, `eur`) or by a
//! flag emoji. A flag is two Unicode regional-indicator symbols spelling the
//! ISO 3166 country code (`🇺🇸` = `U`+`S`), decoded here through a fixed
//! country → currency table.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::ParserError;

/// First regional-indicator symbol (`🇦`).
const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;
/// Last regional-indicator symbol (`🇿`).
const REGIONAL_INDICATOR_Z: u32 = 0x1F1FF;

/// Set of supported currency codes.
#[allow(missing_docs)]
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[strum(ascii_case_insensitive)]
pub enum Currency {
    USD,
    EUR,
    PLN,
    GBP,
    CHF,
    CAD,
    CZK,
    SEK,
    JPY,
    NOK,
    DKK,
    UAH,
}

impl Currency {
    /// Parses a three-letter code, case-insensitively.
    pub fn from_code(code: &str) -> Result<Self, ParserError> {
        code.trim()
            .parse::<Self>()
            .map_err(|_| ParserError::UnknownCurrency(code.to_string()))
    }

    /// Decodes one flag glyph (two regional-indicator symbols) to its currency.
    ///
    /// Returns `None` if either char is not a regional indicator or the country
    /// is not in the flag table.
    pub fn from_flag(first: char, second: char) -> Option<Self> {
        let country = [indicator_letter(first)?, indicator_letter(second)?];
        match &country {
            b"US" => Some(Currency::USD),
            b"EU" => Some(Currency::EUR),
            b"GB" => Some(Currency::GBP),
            b"CH" => Some(Currency::CHF),
            b"PL" => Some(Currency::PLN),
            b"CA" => Some(Currency::CAD),
            b"CZ" => Some(Currency::CZK),
            b"SE" => Some(Currency::SEK),
            b"JP" => Some(Currency::JPY),
            b"NO" => Some(Currency::NOK),
            b"DK" => Some(Currency::DKK),
            b"UA" => Some(Currency::UAH),
            _ => None,
        }
    }

    /// Regex alternation of every supported code, e.g. `USD|EUR|...`.
    pub fn code_alternation() -> String {
        Currency::iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Returns true for the 26 regional-indicator symbols.
pub fn is_regional_indicator(c: char) -> bool {
    (REGIONAL_INDICATOR_A..=REGIONAL_INDICATOR_Z).contains(&(c as u32))
}

fn indicator_letter(c: char) -> Option<u8> {
    if !is_regional_indicator(c) {
        return None;
    }
    Some(b'A' + (c as u32 - REGIONAL_INDICATOR_A) as u8)
}

/// Scans `text` for flag glyphs in order of appearance.
///
/// Each adjacent pair of regional indicators counts as one flag, so
/// `🇪🇺/🇺🇸` yields two entries. Flags missing from the table decode to `None`
/// but keep their position.
pub fn decode_flags(text: &str) -> Vec<Option<Currency>> {
    let chars: Vec<char> = text.chars().collect();
    let mut flags = Vec::new();
    let mut i = 0;
    while i + 1 < chars.len() {
        if is_regional_indicator(chars[i]) && is_regional_indicator(chars[i + 1]) {
            flags.push(Currency::from_flag(chars[i], chars[i + 1]));
            i += 2;
            continue;
        }
        i += 1;
    }
    flags
}

/// Decodes a leading currency indicator: a three-letter code or a single flag.
pub fn decode_indicator(text: &str) -> Option<Currency> {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), None) if is_regional_indicator(a) => Currency::from_flag(a, b),
        _ => Currency::from_code(trimmed).ok(),
    }
}
