//! Packing of card fields into fixed-width unsigned integers.
//!
//! Text fields are truncated to a per-field byte cap and packed big-endian,
//! so `"Alexandria"` stored as a full name comes back as `"Alexand"`. The
//! truncation is silent and lossy. Decoding never fails: anything that is
//! not printable ASCII is shown as its decimal value instead.

use std::fmt;

use ethers::types::U256;

use crate::error::CodecError;

/// Shown for a field whose clear value is zero or out of range.
pub const PLACEHOLDER: &str = "-";

/// Country calling codes offered when entering a phone number.
pub const COUNTRY_CODES: [(&str, &str); 20] = [
    ("+1", "US/CA"),
    ("+44", "UK"),
    ("+86", "CN"),
    ("+81", "JP"),
    ("+82", "KR"),
    ("+852", "HK"),
    ("+886", "TW"),
    ("+65", "SG"),
    ("+60", "MY"),
    ("+61", "AU"),
    ("+49", "DE"),
    ("+33", "FR"),
    ("+39", "IT"),
    ("+34", "ES"),
    ("+7", "RU"),
    ("+91", "IN"),
    ("+55", "BR"),
    ("+52", "MX"),
    ("+966", "SA"),
    ("+971", "AE"),
];

// First prefix that leaves a non-empty remainder wins.
const PHONE_PREFIXES: [&str; 9] = ["86", "852", "886", "44", "81", "82", "91", "1", "7"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Gender,
    Phone,
    FullName,
    SocialId,
    Location,
}

impl FieldKind {
    /// Order in which fields are encrypted, returned as handles and passed
    /// to `createCard`.
    pub const ORDER: [FieldKind; 5] = [
        FieldKind::Gender,
        FieldKind::Phone,
        FieldKind::FullName,
        FieldKind::SocialId,
        FieldKind::Location,
    ];

    pub fn width(self) -> usize {
        match self {
            FieldKind::Gender => 8,
            FieldKind::Phone | FieldKind::FullName => 64,
            FieldKind::SocialId => 128,
            FieldKind::Location => 256,
        }
    }

    /// Maximum number of UTF-8 bytes kept for text fields.
    pub fn byte_cap(self) -> Option<usize> {
        match self {
            FieldKind::FullName => Some(7),
            FieldKind::SocialId => Some(15),
            FieldKind::Location => Some(31),
            FieldKind::Gender | FieldKind::Phone => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Gender => "gender",
            FieldKind::Phone => "phone",
            FieldKind::FullName => "fullName",
            FieldKind::SocialId => "socialId",
            FieldKind::Location => "location",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Gender {
    #[default]
    NotDisclosed = 0,
    Male = 1,
    Female = 2,
    Other = 3,
}

impl Gender {
    pub const LABELS: [&'static str; 4] = ["Not Disclosed", "Male", "Female", "Other"];

    pub fn label(self) -> &'static str {
        Self::LABELS[self as usize]
    }
}

impl TryFrom<u64> for Gender {
    type Error = CodecError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::NotDisclosed),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Female),
            3 => Ok(Gender::Other),
            other => Err(CodecError::InvalidGender(other)),
        }
    }
}

/// Encode a raw input for `kind`. Gender takes its enum value as decimal
/// text, phone takes country code and number already concatenated.
pub fn encode(kind: FieldKind, raw: &str) -> Result<U256, CodecError> {
    match kind {
        FieldKind::Gender => {
            let value = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| CodecError::NotANumber(raw.to_string()))?;
            Ok(encode_gender(Gender::try_from(value)?))
        }
        FieldKind::Phone => encode_digits(raw),
        FieldKind::FullName | FieldKind::SocialId | FieldKind::Location => {
            Ok(encode_text(kind, raw))
        }
    }
}

pub fn encode_gender(gender: Gender) -> U256 {
    U256::from(gender as u8)
}

/// Every non-digit character of `country_code` and `number` is dropped and
/// the rest read as one decimal integer.
pub fn encode_phone(country_code: &str, number: &str) -> Result<U256, CodecError> {
    encode_digits(&format!("{country_code}{number}"))
}

fn encode_digits(raw: &str) -> Result<U256, CodecError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    let overflow = CodecError::Overflow {
        kind: FieldKind::Phone,
        width: FieldKind::Phone.width(),
    };
    let value = U256::from_dec_str(&digits).map_err(|_| overflow.clone())?;
    if value.bits() > FieldKind::Phone.width() {
        return Err(overflow);
    }
    Ok(value)
}

/// Pack the first `byte_cap` UTF-8 bytes of `text` big-endian. Kinds without
/// a byte cap are treated as the widest text field.
pub fn encode_text(kind: FieldKind, text: &str) -> U256 {
    let cap = kind.byte_cap().unwrap_or(31);
    let bytes = text.as_bytes();
    let kept = &bytes[..bytes.len().min(cap)];
    U256::from_big_endian(kept)
}

pub fn decode(kind: FieldKind, value: U256) -> String {
    match kind {
        FieldKind::Gender => decode_gender(value),
        FieldKind::Phone => decode_phone(value),
        FieldKind::FullName | FieldKind::SocialId | FieldKind::Location => decode_text(value),
    }
}

fn decode_gender(value: U256) -> String {
    if value > U256::from(3u8) {
        return PLACEHOLDER.to_string();
    }
    Gender::LABELS[value.as_usize()].to_string()
}

fn decode_phone(value: U256) -> String {
    if value.is_zero() {
        return PLACEHOLDER.to_string();
    }
    let digits = value.to_string();
    for prefix in PHONE_PREFIXES {
        if let Some(rest) = digits.strip_prefix(prefix) {
            if !rest.is_empty() {
                return format!("+{prefix} {rest}");
            }
        }
    }
    format!("+{digits}")
}

fn decode_text(value: U256) -> String {
    if value.is_zero() {
        return PLACEHOLDER.to_string();
    }
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    let bytes: Vec<u8> = word.into_iter().filter(|b| *b != 0).collect();
    if !bytes.is_empty() && bytes.iter().all(|b| (32..=126).contains(b)) {
        bytes.into_iter().map(char::from).collect()
    } else {
        value.to_string()
    }
}
