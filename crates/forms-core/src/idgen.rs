//! SHA256 + base36 id generation for forms and fields.

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};

/// Base36 alphabet (0-9, a-z).
const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the hash suffix in generated ids.
pub const ID_HASH_LENGTH: usize = 8;

/// Prefix for form schema ids.
pub const FORM_PREFIX: &str = "form";

/// Prefix for field ids.
pub const FIELD_PREFIX: &str = "fld";

/// Converts a byte slice to a base36 string of exactly `length` characters.
pub fn encode_base36(data: &[u8], length: usize) -> String {
    let mut num = BigUint::from_bytes_be(data);
    let base = BigUint::from(36u32);
    let zero = BigUint::zero();

    let mut chars: Vec<char> = Vec::with_capacity(length);
    while num > zero {
        let rem = &num % &base;
        num /= &base;
        let digits = rem.to_u32_digits();
        let i = digits.first().copied().unwrap_or(0) as usize;
        chars.push(BASE36_ALPHABET[i] as char);
    }
    chars.reverse();

    let mut s: String = chars.into_iter().collect();
    if s.len() < length {
        s = "0".repeat(length - s.len()) + &s;
    }
    // Keep the least significant digits.
    if s.len() > length {
        s = s[s.len() - length..].to_owned();
    }
    s
}

fn hash_id(prefix: &str, content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    // 6 bytes = 48 bits ~ 9.3 base36 chars, enough for 8.
    format!("{}-{}", prefix, encode_base36(&hash[..6], ID_HASH_LENGTH))
}

/// Creates a hash-based id for a saved form schema.
pub fn generate_form_id(name: &str, created_at: DateTime<Utc>, nonce: u32) -> String {
    let content = format!(
        "{}|{}|{}",
        name,
        created_at.timestamp_nanos_opt().unwrap_or(0),
        nonce
    );
    hash_id(FORM_PREFIX, &content)
}

/// Creates a hash-based id for a new field.
///
/// `position` and `nonce` keep ids distinct when two fields share a label.
pub fn generate_field_id(label: &str, position: usize, salt: DateTime<Utc>, nonce: u32) -> String {
    let content = format!(
        "{}|{}|{}|{}",
        label,
        position,
        salt.timestamp_nanos_opt().unwrap_or(0),
        nonce
    );
    hash_id(FIELD_PREFIX, &content)
}
