//! Money amounts
//!
//! Unified parsing, validation, and formatting for monetary amounts. The
//! ledger stores amounts as `rust_decimal::Decimal` with at most
//! [`AMOUNT_SCALE`] fractional digits; every amount that enters the system
//! MUST pass through this module.
//!
//! ## Rules
//! 1. No silent truncation or rounding, ever
//! 2. Ambiguous spellings like ".5" or "5." are rejected
//! 3. Transfer amounts are strictly greater than zero

use rust_decimal::prelude::*;
use thiserror::Error;

/// Maximum fractional digits for an amount (cents).
pub const AMOUNT_SCALE: u32 = 2;

/// Maximum whole-part digits. Matches the NUMERIC(20, 2) storage column.
const MAX_WHOLE_DIGITS: usize = 18;

/// Money validation errors
#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("precision overflow: got {provided} decimals, limit is {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("amount must be positive")]
    InvalidAmount,

    #[error("amount too large")]
    Overflow,

    #[error("malformed amount: {0}")]
    InvalidFormat(String),
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a client-provided amount string into a validated `Decimal`.
///
/// # Errors
/// * `InvalidFormat` - empty, signed, non-numeric, or ambiguous (".5", "5.")
/// * `PrecisionOverflow` - more than [`AMOUNT_SCALE`] fractional digits
/// * `InvalidAmount` - zero or negative
/// * `Overflow` - whole part wider than the storage column
pub fn parse_amount(raw: &str) -> Result<Decimal, MoneyError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    // Amounts are unsigned magnitudes; any sign prefix is refused
    if raw.starts_with('-') || raw.starts_with('+') {
        return Err(MoneyError::InvalidAmount);
    }

    let (whole, frac) = match raw.split_once('.') {
        None => (raw, ""),
        Some((_, frac)) if frac.contains('.') => {
            return Err(MoneyError::InvalidFormat("multiple decimal points".into()));
        }
        Some((whole, _)) if whole.is_empty() => {
            return Err(MoneyError::InvalidFormat(
                "missing leading zero (write 0.5, not .5)".into(),
            ));
        }
        Some((_, frac)) if frac.is_empty() => {
            return Err(MoneyError::InvalidFormat(
                "trailing decimal point (write 5.0, not 5.)".into(),
            ));
        }
        Some(pair) => pair,
    };

    if !all_digits(whole) || !(frac.is_empty() || all_digits(frac)) {
        return Err(MoneyError::InvalidFormat(format!("not a number: {raw}")));
    }

    if frac.len() > AMOUNT_SCALE as usize {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: AMOUNT_SCALE,
        });
    }

    if whole.trim_start_matches('0').len() > MAX_WHOLE_DIGITS {
        return Err(MoneyError::Overflow);
    }

    let amount =
        Decimal::from_str(raw).map_err(|e| MoneyError::InvalidFormat(e.to_string()))?;

    if amount.is_zero() {
        return Err(MoneyError::InvalidAmount);
    }

    Ok(amount)
}

/// Validate a `Decimal` that arrived through JSON deserialization.
///
/// Same rules as [`parse_amount`]: positive, at most [`AMOUNT_SCALE`]
/// fractional digits as written (trailing zeros count), bounded whole part.
pub fn validate_amount(amount: Decimal) -> Result<(), MoneyError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(MoneyError::InvalidAmount);
    }

    if amount.scale() > AMOUNT_SCALE {
        return Err(MoneyError::PrecisionOverflow {
            provided: amount.scale(),
            max: AMOUNT_SCALE,
        });
    }

    if amount.trunc().to_string().len() > MAX_WHOLE_DIGITS {
        return Err(MoneyError::Overflow);
    }

    Ok(())
}

/// Format an amount for display with exactly [`AMOUNT_SCALE`] decimals.
/// Negative values keep their sign, so derived balances print as-is.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.prec$}", amount, prec = AMOUNT_SCALE as usize)
}

/// Serde helper: serialize an amount as a fixed-scale string.
///
/// Wire amounts are strings so clients never lose precision to float
/// parsing.
pub fn serialize_amount<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_amount(*amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_well_formed_amounts() {
        assert_eq!(parse_amount("1.23").unwrap(), Decimal::new(123, 2));
        assert_eq!(parse_amount("100").unwrap(), Decimal::from(100));
        assert_eq!(parse_amount("001.23").unwrap(), Decimal::new(123, 2));
        assert_eq!(parse_amount("1.20").unwrap(), Decimal::new(120, 2));
        assert_eq!(parse_amount("0.01").unwrap(), Decimal::new(1, 2));
        assert_eq!(parse_amount(" 42.50 ").unwrap(), Decimal::new(4250, 2));
    }

    #[test]
    fn test_parse_rejects_zero() {
        // Every spelling of zero fails: amounts are positive non-zero
        assert_eq!(parse_amount("0"), Err(MoneyError::InvalidAmount));
        assert_eq!(parse_amount("0.00"), Err(MoneyError::InvalidAmount));
        assert_eq!(parse_amount("000"), Err(MoneyError::InvalidAmount));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        let bad = [
            "",
            "  ",
            "1,000.00",
            "1.2.3",
            "1. 23",
            "-1.23",
            "+1.23",
            "1e2",
            "0x12",
            ".",
            ".5",
            "5.",
            "abc",
            "NaN",
        ];
        for case in bad {
            assert!(parse_amount(case).is_err(), "accepted malformed {case:?}");
        }
    }

    #[test]
    fn test_parse_precision_boundary() {
        assert!(parse_amount("1.23").is_ok());
        assert_eq!(
            parse_amount("1.234"),
            Err(MoneyError::PrecisionOverflow {
                provided: 3,
                max: 2
            })
        );
    }

    #[test]
    fn test_parse_whole_digit_boundary() {
        // 18 whole digits fit the storage column; 19 do not
        assert!(parse_amount("999999999999999999.99").is_ok());
        assert_eq!(
            parse_amount("1000000000000000000.00"),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_validate_decimal_rules() {
        assert!(validate_amount(Decimal::new(123, 2)).is_ok());
        assert!(validate_amount(Decimal::from(1000)).is_ok());

        // Scale as written counts: 1.230 carries scale 3
        assert_eq!(
            validate_amount(Decimal::new(1230, 3)),
            Err(MoneyError::PrecisionOverflow {
                provided: 3,
                max: 2
            })
        );
        assert_eq!(
            validate_amount(Decimal::ZERO),
            Err(MoneyError::InvalidAmount)
        );
        assert_eq!(
            validate_amount(Decimal::new(-100, 2)),
            Err(MoneyError::InvalidAmount)
        );
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(format_amount(Decimal::new(150, 2)), "1.50");
        assert_eq!(format_amount(Decimal::from(300)), "300.00");
        assert_eq!(format_amount(Decimal::new(-150, 2)), "-1.50");
    }

    #[test]
    fn test_parse_format_roundtrip() {
        for s in ["1", "1.5", "0.01", "1234.56", "999999.99"] {
            let parsed = parse_amount(s).unwrap();
            let back = parse_amount(&format_amount(parsed)).unwrap();
            assert_eq!(parsed, back, "roundtrip changed value for {s}");
        }
    }
}
