//! Money fields as the back-office forms send them.
//!
//! Amounts arrive either as JSON numbers, plain decimal strings with at most
//! two fraction digits (`"62000.50"`) or rupiah as typed by staff
//! (`"Rp 1.200.000"`, `"150.000"`). Rates arrive as numbers or
//! with a decimal comma (`"2,5"`).

use std::fmt;
use std::str::FromStr;

use koperasi_shared::types::{parse_percent, parse_rupiah};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// A money amount accepted from request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(pub Decimal);

/// A percentage rate accepted from request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate(pub Decimal);

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

struct DecimalVisitor {
    parse_text: fn(&str) -> Result<Decimal, String>,
    expecting: &'static str,
}

impl Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        Decimal::try_from(v).map_err(|_| E::custom(format!("{v} is not a valid amount")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        (self.parse_text)(v).map_err(E::custom)
    }
}

/// True for `"62000"` and `"62000.50"`; false for `"150.000"`, which is a
/// thousands separator.
fn is_plain_decimal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let fraction_ok = if digits.contains('.') {
        (1..=2).contains(&fraction.len())
    } else {
        true
    };
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
        && fraction_ok
}

fn amount_text(raw: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    if is_plain_decimal(trimmed) {
        return Decimal::from_str(trimmed).map_err(|e| e.to_string());
    }
    parse_rupiah(trimmed).map_err(|e| e.to_string())
}

fn rate_text(raw: &str) -> Result<Decimal, String> {
    parse_percent(raw)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "rate is empty".to_string())
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(DecimalVisitor {
                parse_text: amount_text,
                expecting: "an amount as a number or string",
            })
            .map(Amount)
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(DecimalVisitor {
                parse_text: rate_text,
                expecting: "a percentage as a number or string",
            })
            .map(Rate)
    }
}
