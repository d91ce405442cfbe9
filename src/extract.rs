//! Field Extractor.
//!
//! Derives `street`, `is_24/7`, `middle_avg_bill` and `middle_coffee_cup` from
//! the raw text fields of a single [`Venue`]. Every function here is pure and
//! depends only on the record it is given.

use std::fmt;

use thiserror::Error;

use crate::report::utility::median;
use crate::venue::Venue;

pub const DAILY_MARKER: &str = "ежедневно";
pub const ROUND_THE_CLOCK_MARKER: &str = "круглосуточно";

const DASHES: &[char] = &['-', '‐', '‑', '–', '—', '−'];
/// Only typographic spaces group digits; a plain space separates numbers.
const GROUP_SEPARATORS: &[char] = &['\u{a0}', '\u{2009}', '\u{202f}'];

/// Which derived price column a sentence template feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    /// `Средний счёт: ...`
    AvgBill,
    /// `Цена одной чашки капучино: ...`
    CoffeeCup,
}

impl PriceField {
    /// Literal prefix of `avg_bill` that selects this field.
    pub fn prefix(self) -> &'static str {
        match self {
            PriceField::AvgBill => "Средний счёт",
            PriceField::CoffeeCup => "Цена одной чашки капучино",
        }
    }

    /// Output column name.
    pub fn column(self) -> &'static str {
        match self {
            PriceField::AvgBill => "middle_avg_bill",
            PriceField::CoffeeCup => "middle_coffee_cup",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A derivation that failed for one record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("address has fewer than two comma-separated components: {0:?}")]
    UnparsableAddress(String),

    #[error("cannot read a price for {field} from {text:?}")]
    UnparsablePrice { field: PriceField, text: String },
}

/// Derived columns of one venue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedFields {
    pub street: Option<String>,
    pub is_24_7: bool,
    pub middle_avg_bill: Option<f64>,
    pub middle_coffee_cup: Option<f64>,
}

/// Result of running the extractor over one record: whatever could be
/// derived, plus the derivations that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub derived: DerivedFields,
    pub failures: Vec<ExtractError>,
}

/// Runs every derivation on `venue`. Never fails as a whole; failed
/// derivations leave their field absent and are listed in `failures`.
pub fn extract(venue: &Venue) -> Extraction {
    let mut failures = Vec::new();

    let street = keep(street(&venue.address).map(|s| Some(s.to_string())), &mut failures);
    let avg_bill = venue.avg_bill.as_deref();
    let middle_avg_bill = keep(parse_price(avg_bill, PriceField::AvgBill), &mut failures);
    let middle_coffee_cup = keep(parse_price(avg_bill, PriceField::CoffeeCup), &mut failures);

    Extraction {
        derived: DerivedFields {
            street,
            is_24_7: daily_and_round_the_clock(venue.hours.as_deref()),
            middle_avg_bill,
            middle_coffee_cup,
        },
        failures,
    }
}

fn keep<T>(result: Result<Option<T>, ExtractError>, failures: &mut Vec<ExtractError>) -> Option<T> {
    result.unwrap_or_else(|e| {
        failures.push(e);
        None
    })
}

/// Returns the second comma-separated component of `address`, untrimmed.
pub fn street(address: &str) -> Result<&str, ExtractError> {
    address
        .split(',')
        .nth(1)
        .ok_or_else(|| ExtractError::UnparsableAddress(address.to_string()))
}

/// 24/7 heuristic: true when `hours` contains both the "daily" and the
/// "round-the-clock" marker anywhere, in any order.
///
/// The two checks are independent, so text like
/// `ежедневно 10:00–22:00; пт круглосуточно` also counts. Downstream shares
/// are computed against exactly this definition.
pub fn daily_and_round_the_clock(hours: Option<&str>) -> bool {
    hours.is_some_and(|h| h.contains(DAILY_MARKER) && h.contains(ROUND_THE_CLOCK_MARKER))
}

/// Parses `avg_bill` for `field`.
///
/// - absent text, or text without the field's prefix → `Ok(None)`
/// - a single number → that number
/// - `A–B` → median of the two endpoints
/// - anything else after the prefix → [`ExtractError::UnparsablePrice`]
pub fn parse_price(avg_bill: Option<&str>, field: PriceField) -> Result<Option<f64>, ExtractError> {
    let Some(text) = avg_bill else {
        return Ok(None);
    };
    let Some(rest) = text.strip_prefix(field.prefix()) else {
        return Ok(None);
    };

    let fail = || ExtractError::UnparsablePrice {
        field,
        text: text.to_string(),
    };
    let values = price_values(rest).ok_or_else(fail)?;
    median(&values).map(Some).ok_or_else(fail)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Dash,
}

fn price_values(text: &str) -> Option<Vec<f64>> {
    match tokenize(text)?.as_slice() {
        [Token::Number(v)] => Some(vec![*v]),
        [Token::Number(a), Token::Dash, Token::Number(b)] => Some(vec![*a, *b]),
        _ => None,
    }
}

/// Splits price text into numbers and dashes. Currency signs, words and
/// separators are skipped.
fn tokenize(text: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            let (value, next) = read_number(&chars, i)?;
            tokens.push(Token::Number(value));
            i = next;
            continue;
        }
        if DASHES.contains(&c) {
            tokens.push(Token::Dash);
        }
        i += 1;
    }

    Some(tokens)
}

/// Reads one number starting at `start`. Thousands grouped with a
/// non-breaking or thin space are joined; `.` is a decimal point when
/// followed by a digit.
fn read_number(chars: &[char], start: usize) -> Option<(f64, usize)> {
    let mut digits = String::new();
    let mut seen_point = false;
    let mut i = start;

    while let Some(&c) = chars.get(i) {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if GROUP_SEPARATORS.contains(&c) && !seen_point && is_digit_group(chars, i + 1) {
            // thousands separator, skip
        } else if c == '.' && !seen_point && chars.get(i + 1).is_some_and(char::is_ascii_digit) {
            digits.push('.');
            seen_point = true;
        } else {
            break;
        }
        i += 1;
    }

    digits.parse().ok().map(|value| (value, i))
}

/// True when exactly three digits start at `start`.
fn is_digit_group(chars: &[char], start: usize) -> bool {
    let group = chars.get(start..start + 3);
    group.is_some_and(|g| g.iter().all(char::is_ascii_digit))
        && !chars.get(start + 3).is_some_and(char::is_ascii_digit)
}
