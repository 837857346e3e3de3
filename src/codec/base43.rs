//! Base43 codec for BBQr-adjacent interchange.
//!
//! A big-endian arbitrary-precision integer encoded by repeated division by
//! 43 over a 44-character charset, with leading `0x00` input bytes mapped to
//! an equal number of leading `'0'` output characters and mirrored back on
//! decode. No third-party test vectors are publicly available for this
//! charset/procedure; the round-trip and leading-zero-byte tests below are
//! this module's own cross-check.

use crate::{Error, Result};

const CHARSET: &[u8; 43] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ$*+-./:";

fn char_value(c: u8) -> Option<u8> {
    CHARSET.iter().position(|&x| x == c).map(|p| p as u8)
}

/// Encodes `data` as a Base43 string.
pub fn encode(data: &[u8]) -> String {
    let leading_zeros = data.iter().take_while(|&&b| b == 0).count();

    // Big-endian big integer as base-256 digits, most significant first.
    let mut digits: Vec<u8> = data.to_vec();
    let mut out_digits = Vec::new();

    // Repeated division by 43 over the big-endian byte vector.
    while digits.iter().any(|&d| d != 0) {
        let mut remainder: u32 = 0;
        let mut quotient = Vec::with_capacity(digits.len());
        for &d in &digits {
            let acc = remainder * 256 + d as u32;
            quotient.push((acc / 43) as u8);
            remainder = acc % 43;
        }
        // Drop leading zero bytes in the quotient so the loop terminates.
        let first_nonzero = quotient.iter().position(|&b| b != 0).unwrap_or(quotient.len());
        digits = quotient[first_nonzero..].to_vec();
        out_digits.push(CHARSET[remainder as usize]);
    }

    out_digits.reverse();
    let mut result = String::with_capacity(leading_zeros + out_digits.len());
    for _ in 0..leading_zeros {
        result.push('0');
    }
    for c in out_digits {
        result.push(c as char);
    }
    result
}

/// Decodes a Base43 string back into bytes.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let leading_zeros = input.chars().take_while(|&c| c == '0').count();
    let suffix: Vec<char> = input.chars().skip(leading_zeros).collect();

    if suffix.is_empty() {
        // The whole input was zero characters (or empty): that many zero
        // bytes, and nothing else.
        return Ok(vec![0u8; leading_zeros]);
    }

    // Repeated multiply-add: bigint = bigint*43 + digit, stored as
    // little-endian base-256 digits for efficient in-place growth.
    let mut digits: Vec<u32> = vec![0];
    for c in suffix {
        let b = u8::try_from(c).map_err(|_| Error::BadFormat("non-ASCII base43 character"))?;
        let value = char_value(b).ok_or(Error::BadFormat("invalid base43 character"))? as u32;

        let mut carry = value;
        for d in digits.iter_mut() {
            let acc = *d * 43 + carry;
            *d = acc & 0xFF;
            carry = acc >> 8;
        }
        while carry > 0 {
            digits.push(carry & 0xFF);
            carry >>= 8;
        }
    }

    // digits is little-endian; reverse to big-endian and strip the
    // redundant leading zero the accumulator starts with.
    digits.reverse();
    while digits.len() > 1 && digits[0] == 0 {
        digits.remove(0);
    }
    let out: Vec<u8> = digits.into_iter().map(|d| d as u8).collect();

    let mut result = vec![0u8; leading_zeros];
    result.extend_from_slice(&out);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_arbitrary_bytes() {
        let data = b"the quick brown fox";
        let encoded = encode(data);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn leading_zero_bytes_map_to_leading_zero_chars() {
        let data = [0u8, 0u8, 1u8, 2u8, 3u8];
        let encoded = encode(&data);
        assert!(encoded.starts_with("00"));
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn empty_input_round_trips() {
        let encoded = encode(&[]);
        assert_eq!(decode(&encoded).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(decode("!!!").is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_round_trip(data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let encoded = encode(&data);
            let decoded = decode(&encoded).unwrap();
            proptest::prop_assert_eq!(decoded, data);
        }
    }
}
