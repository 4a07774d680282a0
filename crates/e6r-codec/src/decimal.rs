//! DECIMAL128 decoding.
//!
//! Two wire shapes exist and do not converge: the row stream carries UTF-8
//! decimal text, chunks carry 16-byte IEEE 754-2008 Decimal128 big-endian.
//! The binary decoder implements the *binary integer significand* (BID)
//! small form exactly — every canonical finite encoding uses it — and
//! decodes everything else (large form, over-range coefficients, NaN,
//! infinities, wrong-length payloads) to zero with a warning. `BigDecimal`
//! has no specials, and a result cell must always exist, so zero is the
//! contract, not a shortcut. Neither entry point can fail.

use std::str::FromStr;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use tracing::warn;

/// Decimal128 exponent bias.
const EXPONENT_BIAS: i64 = 6176;

/// Largest canonical coefficient: 10^34 − 1.
const MAX_COEFFICIENT: u128 = 9_999_999_999_999_999_999_999_999_999_999_999;

/// Parse decimal text from the row stream. `"-0"` and friends normalize to
/// zero through `BigDecimal` itself.
pub fn decimal_from_text(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text.trim()).ok()
}

/// Decode a 16-byte big-endian Decimal128. Never fails; see the module doc
/// for what maps to zero.
pub fn decimal_from_binary(bytes: &[u8]) -> BigDecimal {
    let raw: [u8; 16] = match bytes.try_into() {
        Ok(raw) => raw,
        Err(_) => {
            warn!(len = bytes.len(), "decimal128 payload is not 16 bytes; decoding as zero");
            return BigDecimal::from(0);
        }
    };
    let bits = u128::from_be_bytes(raw);
    let negative = bits >> 127 == 1;

    // Top five combination bits: 11111 = NaN, 11110 = infinity.
    match (bits >> 122) & 0x1F {
        0b11111 => {
            warn!("decimal128 NaN; decoding as zero");
            return BigDecimal::from(0);
        }
        0b11110 => {
            warn!("decimal128 infinity; decoding as zero");
            return BigDecimal::from(0);
        }
        _ => {}
    }

    // BID large form (combination starts 11) only encodes coefficients above
    // the canonical maximum; treat it like any other non-canonical input.
    if (bits >> 125) & 0b11 == 0b11 {
        warn!("non-canonical decimal128 encoding; decoding as zero");
        return BigDecimal::from(0);
    }

    let exponent = ((bits >> 113) & 0x3FFF) as i64;
    let coefficient = bits & ((1u128 << 113) - 1);
    if coefficient > MAX_COEFFICIENT {
        warn!("decimal128 coefficient out of range; decoding as zero");
        return BigDecimal::from(0);
    }

    let mut digits = BigInt::from(coefficient);
    if negative {
        digits = -digits;
    }
    // value = digits × 10^(exponent − bias); BigDecimal scale is the
    // negation of that power.
    BigDecimal::new(digits, EXPONENT_BIAS - exponent)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_bid(negative: bool, coefficient: u128, exponent: i64) -> [u8; 16] {
        let mut bits = coefficient;
        bits |= (((exponent + EXPONENT_BIAS) as u128) & 0x3FFF) << 113;
        if negative {
            bits |= 1 << 127;
        }
        bits.to_be_bytes()
    }

    #[test]
    fn all_zero_bytes_decode_to_zero() {
        // All-zero bits: exponent −6176, coefficient 0 → exactly zero.
        let d = decimal_from_binary(&[0u8; 16]);
        assert_eq!(d, BigDecimal::from(0));
    }

    #[test]
    fn small_form_round_trips() {
        let d = decimal_from_binary(&encode_bid(false, 1234567, -3));
        assert_eq!(d, "1234.567".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn sign_bit_negates() {
        let d = decimal_from_binary(&encode_bid(true, 25, -1));
        assert_eq!(d, "-2.5".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn thirty_four_digit_coefficient_survives() {
        let d = decimal_from_binary(&encode_bid(false, MAX_COEFFICIENT, 0));
        assert_eq!(
            d,
            "9999999999999999999999999999999999".parse::<BigDecimal>().unwrap()
        );
    }

    #[test]
    fn specials_decode_to_zero_without_panicking() {
        let mut inf = [0u8; 16];
        inf[0] = 0b0_11110_00;
        assert_eq!(decimal_from_binary(&inf), BigDecimal::from(0));

        let mut nan = [0u8; 16];
        nan[0] = 0b0_11111_00;
        assert_eq!(decimal_from_binary(&nan), BigDecimal::from(0));
    }

    #[test]
    fn wrong_length_decodes_to_zero() {
        assert_eq!(decimal_from_binary(&[0u8; 15]), BigDecimal::from(0));
        assert_eq!(decimal_from_binary(&[0u8; 17]), BigDecimal::from(0));
        assert_eq!(decimal_from_binary(&[]), BigDecimal::from(0));
    }

    #[test]
    fn text_minus_zero_is_zero() {
        let d = decimal_from_text("-0").unwrap();
        assert_eq!(d, BigDecimal::from(0));
    }

    #[test]
    fn text_parses_plain_and_scientific() {
        assert_eq!(
            decimal_from_text(" 12.50 ").unwrap(),
            "12.50".parse::<BigDecimal>().unwrap()
        );
        assert_eq!(
            decimal_from_text("1e3").unwrap(),
            "1000".parse::<BigDecimal>().unwrap()
        );
        assert!(decimal_from_text("not a number").is_none());
    }
}
