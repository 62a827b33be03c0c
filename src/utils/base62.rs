//! Base-62 短码编解码
//!
//! 字母表 `0-9a-zA-Z`，高位在前，`0` 编码为 `"0"`。
//! 编码结果与版本无关，已发出的短码永远可以解码回原值。

use std::fmt;

pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const BASE: u64 = 62;

/// 解码错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Empty,
    InvalidCharacter(char),
    LeadingZero,
    Overflow,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "code is empty"),
            Self::InvalidCharacter(c) => write!(f, "invalid base62 character: {:?}", c),
            Self::LeadingZero => write!(f, "non-canonical code with leading zero"),
            Self::Overflow => write!(f, "code exceeds the 64-bit range"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// 将非负整数编码为 base-62 字符串
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    // u64::MAX 最多 11 位
    let mut buf = [0u8; 11];
    let mut pos = buf.len();
    while n > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    buf[pos..].iter().map(|&b| b as char).collect()
}

fn digit_value(c: u8) -> Option<u64> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as u64),
        b'a'..=b'z' => Some((c - b'a') as u64 + 10),
        b'A'..=b'Z' => Some((c - b'A') as u64 + 36),
        _ => None,
    }
}

/// `encode` 的逆运算
///
/// 拒绝空串、字母表外字符、多余前导零（`"0"` 本身除外）以及超出 u64 的值。
pub fn decode(code: &str) -> Result<u64, DecodeError> {
    let bytes = code.as_bytes();
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return Err(DecodeError::LeadingZero);
    }

    let mut value: u64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let digit = digit_value(b).ok_or_else(|| {
            // 取完整字符，避免多字节字符被截断
            let c = code[i..].chars().next().unwrap_or(b as char);
            DecodeError::InvalidCharacter(c)
        })?;
        value = value
            .checked_mul(BASE)
            .and_then(|v| v.checked_add(digit))
            .ok_or(DecodeError::Overflow)?;
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        let cases = [
            (0u64, "0"),
            (1, "1"),
            (10, "a"),
            (36, "A"),
            (61, "Z"),
            (62, "10"),
            (123, "1Z"),
            (12345, "3d7"),
            (999_999, "4c91"),
        ];
        for (n, code) in cases {
            assert_eq!(encode(n), code, "encode({})", n);
            assert_eq!(decode(code), Ok(n), "decode({})", code);
        }
    }

    #[test]
    fn test_round_trip_samples() {
        let mut n = 1u64;
        while n < u64::MAX / 7 {
            assert_eq!(decode(&encode(n)), Ok(n));
            n = n * 7 + 3;
        }
        assert_eq!(decode(&encode(u64::MAX)), Ok(u64::MAX));
    }

    #[test]
    fn test_encode_is_canonical() {
        for n in [1u64, 62, 3843, 3844, 238_327, u64::MAX] {
            let code = encode(n);
            assert!(!code.starts_with('0'));
            assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_encode_is_monotonic_in_length() {
        assert_eq!(encode(61).len(), 1);
        assert_eq!(encode(62).len(), 2);
        assert_eq!(encode(3843).len(), 2);
        assert_eq!(encode(3844).len(), 3);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert_eq!(decode(""), Err(DecodeError::Empty));
        assert_eq!(decode("00"), Err(DecodeError::LeadingZero));
        assert_eq!(decode("01"), Err(DecodeError::LeadingZero));
        assert_eq!(decode("ab-c"), Err(DecodeError::InvalidCharacter('-')));
        assert_eq!(decode("é"), Err(DecodeError::InvalidCharacter('é')));
        assert_eq!(decode("ZZZZZZZZZZZ"), Err(DecodeError::Overflow));
    }
}
