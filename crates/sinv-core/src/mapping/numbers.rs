//! Lenient number parsing for values lifted out of supplier documents.

use lazy_static::lazy_static;
use regex::{Match, Regex};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

lazy_static! {
    /// A number with `,`/`.` separators, or with space-grouped thousands, and
    /// an optional exponent.
    static ref NUMBER_TOKEN: Regex = Regex::new(
        r"\d{1,3}(?:[ \x{a0}]\d{3})+(?:[.,]\d+)?\b|\d[\d.,]*(?:[eE][+-]?\d+)?"
    ).unwrap();
}

const CURRENCY_SYMBOLS: &str = "$€£¥₹₽₩₺₴₦₱₪¢";

/// Parse an amount such as "1,234.50", "1 234,50", "$12.00" or "(3.10)".
///
/// Only the first number in the text counts; anything after it ("12.50 ea",
/// "10 (2 boxes)") is ignored. Digits glued to a word ("SKU12", "Ref-7") are
/// not a number. When both `,` and `.` appear, the last one is the decimal
/// separator. A separator that repeats is a thousands separator, as is a
/// single comma followed by exactly three digits; a single dot is always
/// decimal. A `-` directly before the number (currency symbols aside) or
/// parentheses around the whole value make it negative. Returns `None` when
/// no number is found.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let token = first_number(s)?;
    let amount = token_value(token.as_str())?;
    Some(if is_negative(s, &token) { -amount } else { amount })
}

/// First number token that is not part of a word.
fn first_number(s: &str) -> Option<Match<'_>> {
    NUMBER_TOKEN.find_iter(s).find(|m| {
        let before = &s[..m.start()];
        match before.chars().next_back() {
            Some(c) if c.is_alphanumeric() || c == '_' => false,
            Some('-') => !ends_alphanumeric(&before[..before.len() - 1]),
            _ => true,
        }
    })
}

fn is_negative(s: &str, token: &Match<'_>) -> bool {
    let sign_zone = s[..token.start()]
        .trim_end_matches(|c: char| c.is_whitespace() || CURRENCY_SYMBOLS.contains(c));
    if let Some(head) = sign_zone.strip_suffix('-') {
        if !ends_alphanumeric(head) {
            return true;
        }
    }

    // "(3.10)" but not "(2 boxes)".
    s.starts_with('(')
        && s.ends_with(')')
        && s[..token.start()]
            .chars()
            .chain(s[token.end()..].chars())
            .all(|c| !c.is_ascii_digit() && !c.is_lowercase())
}

fn ends_alphanumeric(s: &str) -> bool {
    s.chars().next_back().is_some_and(char::is_alphanumeric)
}

/// Decimal value of one number token.
fn token_value(token: &str) -> Option<Decimal> {
    let (mantissa, exponent) = match token.find(['e', 'E']) {
        Some(i) => (&token[..i], Some(&token[i + 1..])),
        None => (token, None),
    };

    let cleaned: String = mantissa.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.trim_matches(|c| c == ',' || c == '.');

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => single_separator(cleaned, ','),
        (None, Some(_)) => single_separator(cleaned, '.'),
        (None, None) => cleaned.to_string(),
    };

    match exponent {
        Some(exp) => Decimal::from_scientific(&format!("{}e{}", normalized, exp)).ok(),
        None => Decimal::from_str(&normalized).ok(),
    }
}

/// Resolve a number that uses only one kind of separator.
fn single_separator(s: &str, sep: char) -> String {
    let parts: Vec<&str> = s.split(sep).collect();
    let is_grouping = parts.len() > 2
        || (sep == ',' && parts.last().is_some_and(|last| last.len() == 3));

    if is_grouping {
        parts.concat()
    } else {
        s.replace(sep, ".")
    }
}

/// Parse a quantity, truncating toward zero. Non-numeric text yields 0.
pub fn parse_quantity(s: &str) -> i64 {
    parse_amount(s)
        .and_then(|q| q.trunc().to_i64())
        .unwrap_or(0)
}
