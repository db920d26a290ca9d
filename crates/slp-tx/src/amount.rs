//! Decimal token amounts to raw on-chain quantities and back

use slp_core::{constants, AmountError, TokenDescriptor};

/// Convert a human-readable decimal amount into the token's raw quantity.
///
/// Fails with `UnsupportedDecimals` for a descriptor declaring more than 9
/// decimals, with `Range` when the amount (or its scaled raw form) does not fit
/// in 8 unsigned bytes, and with `Precision` when it has more significant
/// fractional digits than the token declares.
///
/// For tokens with 0 decimals the fraction is truncated, not rejected:
/// `"2.9"` becomes `2`. Callers that accept free-form input should round or
/// validate before calling.
pub fn to_raw_amount(amount: &str, token: &TokenDescriptor) -> Result<u64, AmountError> {
    if token.decimals > constants::MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals {
            decimals: token.decimals,
        });
    }

    let (int_digits, frac_digits) = split_decimal(amount)?;

    let int_value = parse_integer(int_digits).ok_or_else(|| AmountError::Range {
        amount: amount.to_string(),
    })?;
    let has_fraction = frac_digits.bytes().any(|b| b != b'0');
    if int_value == u64::MAX as u128 && has_fraction {
        return Err(AmountError::Range {
            amount: amount.to_string(),
        });
    }

    if token.decimals == 0 {
        if has_fraction {
            tracing::warn!(
                token_id = %token.token_id,
                amount,
                "Truncating fractional amount for 0-decimal token"
            );
        }
        return Ok(int_value as u64);
    }

    let significant = frac_digits.trim_end_matches('0');
    if significant.len() > token.decimals as usize {
        return Err(AmountError::Precision {
            ticker: token.ticker.clone(),
            decimals: token.decimals,
            amount: amount.to_string(),
        });
    }

    let scale = 10u128.pow(token.decimals as u32);
    let mut frac_value: u128 = 0;
    for b in significant.bytes() {
        frac_value = frac_value * 10 + (b - b'0') as u128;
    }
    frac_value *= 10u128.pow((token.decimals as usize - significant.len()) as u32);

    int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .filter(|v| *v <= u64::MAX as u128)
        .map(|v| v as u64)
        .ok_or_else(|| AmountError::Range {
            amount: amount.to_string(),
        })
}

/// Render a raw quantity as a decimal string without trailing zeros
pub fn from_raw_amount(raw: u64, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }

    let digits = format!("{:0>width$}", raw, width = decimals as usize + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - decimals as usize);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// Split `"123.45"` into `("123", "45")`, rejecting signs, exponents and junk
fn split_decimal(amount: &str) -> Result<(&str, &str), AmountError> {
    let malformed = || AmountError::Malformed {
        amount: amount.to_string(),
    };

    let trimmed = amount.trim();
    let (int_digits, frac_digits) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };

    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(malformed());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_digits) || !all_digits(frac_digits) {
        return Err(malformed());
    }

    Ok((int_digits, frac_digits))
}

/// Parse the integer part; `None` if it exceeds `u64::MAX`
fn parse_integer(digits: &str) -> Option<u128> {
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(0);
    }
    if digits.len() > 20 {
        return None;
    }
    digits
        .parse::<u128>()
        .ok()
        .filter(|v| *v <= u64::MAX as u128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slp_core::TokenId;

    fn token(decimals: u8) -> TokenDescriptor {
        TokenDescriptor::fungible(TokenId::from_bytes([7u8; 32]), "TEST", decimals).unwrap()
    }

    #[test]
    fn test_scales_by_decimals() {
        assert_eq!(to_raw_amount("1.5", &token(2)).unwrap(), 150);
        assert_eq!(to_raw_amount("0.01", &token(2)).unwrap(), 1);
        assert_eq!(to_raw_amount("42", &token(8)).unwrap(), 4_200_000_000);
        assert_eq!(to_raw_amount(".5", &token(1)).unwrap(), 5);
        assert_eq!(to_raw_amount("7.", &token(3)).unwrap(), 7_000);
    }

    #[test]
    fn test_trailing_zeros_are_not_precision() {
        assert_eq!(to_raw_amount("1.500000", &token(2)).unwrap(), 150);
    }

    #[test]
    fn test_excess_precision_fails() {
        let err = to_raw_amount("1.234", &token(2)).unwrap_err();
        match err {
            AmountError::Precision {
                decimals, amount, ..
            } => {
                assert_eq!(decimals, 2);
                assert_eq!(amount, "1.234");
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_zero_decimals_truncates() {
        assert_eq!(to_raw_amount("5", &token(0)).unwrap(), 5);
        assert_eq!(to_raw_amount("2.9", &token(0)).unwrap(), 2);
        assert_eq!(to_raw_amount("0.999", &token(0)).unwrap(), 0);
    }

    #[test]
    fn test_range_checks() {
        assert_eq!(
            to_raw_amount("18446744073709551615", &token(0)).unwrap(),
            u64::MAX
        );
        assert!(matches!(
            to_raw_amount("18446744073709551616", &token(0)),
            Err(AmountError::Range { .. })
        ));
        assert!(matches!(
            to_raw_amount("18446744073709551615.5", &token(0)),
            Err(AmountError::Range { .. })
        ));
        // fits before scaling, not after
        assert!(matches!(
            to_raw_amount("18446744073709551615", &token(2)),
            Err(AmountError::Range { .. })
        ));
        assert_eq!(
            to_raw_amount("184467440737.09551615", &token(8)).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_descriptor_with_excess_decimals_is_rejected() {
        let json = format!(
            r#"{{"tokenId":"{}","ticker":"BAD","decimals":40,"kind":{{"type":"fungible"}}}}"#,
            "07".repeat(32)
        );
        let token: TokenDescriptor = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            to_raw_amount("1", &token),
            Err(AmountError::UnsupportedDecimals { decimals: 40 })
        ));

        let mut token = token;
        token.decimals = 10;
        assert!(matches!(
            to_raw_amount("1.5", &token),
            Err(AmountError::UnsupportedDecimals { decimals: 10 })
        ));
    }

    #[test]
    fn test_malformed_input() {
        for bad in ["", ".", "-1", "1e5", "1.2.3", "abc", "+3"] {
            assert!(
                matches!(to_raw_amount(bad, &token(2)), Err(AmountError::Malformed { .. })),
                "expected malformed for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_from_raw_amount() {
        assert_eq!(from_raw_amount(150, 2), "1.5");
        assert_eq!(from_raw_amount(1, 8), "0.00000001");
        assert_eq!(from_raw_amount(0, 4), "0");
        assert_eq!(from_raw_amount(12_000, 3), "12");
        assert_eq!(from_raw_amount(99, 0), "99");
    }

    #[test]
    fn test_raw_roundtrip_within_precision() {
        let cases = [
            ("0.1", 1),
            ("123.456", 3),
            ("123.456", 9),
            ("1000000", 0),
            ("0.000000001", 9),
        ];
        for (amount, decimals) in cases {
            let raw = to_raw_amount(amount, &token(decimals)).unwrap();
            assert_eq!(from_raw_amount(raw, decimals), amount);
        }
    }
}
