//! Fixed-width textual encoding of one measured value plus optional metadata.
//!
//! Token layout: 2-char variable id, 7 hex digits holding the value in excess-2^27
//! form (or the 8-char literal `"     nan"`), 1 SI-prefix char, then optional
//! `,`-separated metadata tokens: `1X` status nibble and `2XX` range byte.

use crate::devices::{current_range_to_text, DeviceType};
use crate::error::DecodeError;
use crate::vartype::{lookup, VarType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bias added to the signed value so the wire never carries a sign character.
pub const OFFSET: i64 = 1 << 27;

const VALUE_DIGITS: usize = 7;
const MIN_TOKEN_LEN: usize = 2 + VALUE_DIGITS + 1;
const NAN_FIELD: &str = "     nan";

/// Status bits carried in the `1X` metadata token.
pub const STATUS_FLAGS: &[(u8, &str)] = &[
    (0x1, "TIMING_ERROR"),
    (0x2, "OVERLOAD"),
    (0x4, "UNDERLOAD"),
    (0x8, "OVERLOAD_WARNING"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiPrefix {
    Atto,
    Femto,
    Pico,
    Nano,
    Micro,
    Milli,
    /// Plain space: no scaling.
    None,
    /// `i`: the value is an integer count, no scaling.
    Integer,
    Kilo,
    Mega,
    Giga,
    Tera,
    Peta,
    Exa,
}

impl SiPrefix {
    pub const ALL: [SiPrefix; 14] = [
        SiPrefix::Atto,
        SiPrefix::Femto,
        SiPrefix::Pico,
        SiPrefix::Nano,
        SiPrefix::Micro,
        SiPrefix::Milli,
        SiPrefix::None,
        SiPrefix::Integer,
        SiPrefix::Kilo,
        SiPrefix::Mega,
        SiPrefix::Giga,
        SiPrefix::Tera,
        SiPrefix::Peta,
        SiPrefix::Exa,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        let prefix = match c {
            'a' => SiPrefix::Atto,
            'f' => SiPrefix::Femto,
            'p' => SiPrefix::Pico,
            'n' => SiPrefix::Nano,
            'u' => SiPrefix::Micro,
            'm' => SiPrefix::Milli,
            ' ' => SiPrefix::None,
            'i' => SiPrefix::Integer,
            'k' => SiPrefix::Kilo,
            'M' => SiPrefix::Mega,
            'G' => SiPrefix::Giga,
            'T' => SiPrefix::Tera,
            'P' => SiPrefix::Peta,
            'E' => SiPrefix::Exa,
            _ => return None,
        };
        Some(prefix)
    }

    pub fn as_char(self) -> char {
        match self {
            SiPrefix::Atto => 'a',
            SiPrefix::Femto => 'f',
            SiPrefix::Pico => 'p',
            SiPrefix::Nano => 'n',
            SiPrefix::Micro => 'u',
            SiPrefix::Milli => 'm',
            SiPrefix::None => ' ',
            SiPrefix::Integer => 'i',
            SiPrefix::Kilo => 'k',
            SiPrefix::Mega => 'M',
            SiPrefix::Giga => 'G',
            SiPrefix::Tera => 'T',
            SiPrefix::Peta => 'P',
            SiPrefix::Exa => 'E',
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            SiPrefix::Atto => 1e-18,
            SiPrefix::Femto => 1e-15,
            SiPrefix::Pico => 1e-12,
            SiPrefix::Nano => 1e-9,
            SiPrefix::Micro => 1e-6,
            SiPrefix::Milli => 1e-3,
            SiPrefix::None | SiPrefix::Integer => 1.0,
            SiPrefix::Kilo => 1e3,
            SiPrefix::Mega => 1e6,
            SiPrefix::Giga => 1e9,
            SiPrefix::Tera => 1e12,
            SiPrefix::Peta => 1e15,
            SiPrefix::Exa => 1e18,
        }
    }
}

/// Decoded value field, before SI scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawValue {
    /// Signed value in `[-2^27, 2^27 - 1]`.
    Integer(i32),
    NotANumber,
}

impl RawValue {
    pub const MIN: i32 = -(1 << 27);
    pub const MAX: i32 = (1 << 27) - 1;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Status nibble from a `1X` token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    /// Range code from a `2XX` token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_range: Option<u8>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.current_range.is_none()
    }
}

/// One decoded variable token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptVariable {
    id: String,
    raw: RawValue,
    si_prefix: SiPrefix,
    #[serde(default)]
    metadata: Metadata,
}

impl ScriptVariable {
    /// Build a variable from parts. Fails if `id` is not two ASCII characters or
    /// `raw` is outside the 28-bit signed range.
    pub fn new(id: &str, raw: i32, si_prefix: SiPrefix) -> Result<Self, DecodeError> {
        check_id(id)?;
        if !(RawValue::MIN..=RawValue::MAX).contains(&raw) {
            return Err(DecodeError::InvalidValue(raw.to_string()));
        }
        Ok(Self {
            id: id.to_string(),
            raw: RawValue::Integer(raw),
            si_prefix,
            metadata: Metadata::default(),
        })
    }

    pub fn nan(id: &str) -> Result<Self, DecodeError> {
        check_id(id)?;
        Ok(Self {
            id: id.to_string(),
            raw: RawValue::NotANumber,
            si_prefix: SiPrefix::None,
            metadata: Metadata::default(),
        })
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn raw_value(&self) -> RawValue {
        self.raw
    }

    pub fn si_prefix(&self) -> SiPrefix {
        self.si_prefix
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn var_type(&self) -> VarType {
        lookup(&self.id)
    }

    /// Engineering value: raw value scaled by the SI prefix. NaN for `nan` tokens.
    pub fn value(&self) -> f64 {
        match self.raw {
            RawValue::Integer(v) => f64::from(v) * self.si_prefix.factor(),
            RawValue::NotANumber => f64::NAN,
        }
    }

    pub fn is_nan(&self) -> bool {
        self.raw == RawValue::NotANumber
    }

    pub fn status_text(&self) -> Option<String> {
        self.metadata.status.map(status_to_text)
    }

    pub fn range_text(&self, device_type: DeviceType) -> Option<&'static str> {
        let code = self.metadata.current_range?;
        Some(current_range_to_text(device_type, &self.var_type(), code))
    }
}

impl fmt::Display for ScriptVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vt = self.var_type();
        write!(f, "{}: {:e}", vt.name(), self.value())?;
        if !vt.unit().is_empty() {
            write!(f, " {}", vt.unit())?;
        }
        Ok(())
    }
}

fn check_id(id: &str) -> Result<(), DecodeError> {
    if id.len() != 2 || !id.is_ascii() {
        return Err(DecodeError::InvalidValue(id.to_string()));
    }
    Ok(())
}

/// Decode one `;`-separated token of a data package.
pub fn decode_token(token: &str) -> Result<ScriptVariable, DecodeError> {
    if token.len() < MIN_TOKEN_LEN {
        return Err(DecodeError::TooShort { len: token.len() });
    }
    if !token.is_ascii() {
        return Err(DecodeError::InvalidValue(token.to_string()));
    }
    let id = &token[0..2];
    let (raw, si_prefix) = if &token[2..MIN_TOKEN_LEN] == NAN_FIELD {
        (RawValue::NotANumber, SiPrefix::None)
    } else {
        let field = &token[2..2 + VALUE_DIGITS];
        let raw = decode_value(field)?;
        let c = char::from(token.as_bytes()[MIN_TOKEN_LEN - 1]);
        let prefix = SiPrefix::from_char(c).ok_or(DecodeError::UnknownPrefix(c))?;
        (RawValue::Integer(raw), prefix)
    };
    let metadata = decode_metadata(&token[MIN_TOKEN_LEN..])?;
    Ok(ScriptVariable {
        id: id.to_string(),
        raw,
        si_prefix,
        metadata,
    })
}

fn decode_value(field: &str) -> Result<i32, DecodeError> {
    if field.len() != VALUE_DIGITS || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidValue(field.to_string()));
    }
    let unsigned = u32::from_str_radix(field, 16)
        .map_err(|_| DecodeError::InvalidValue(field.to_string()))?;
    let signed = i64::from(unsigned) - OFFSET;
    i32::try_from(signed).map_err(|_| DecodeError::InvalidValue(field.to_string()))
}

fn decode_metadata(rest: &str) -> Result<Metadata, DecodeError> {
    let mut metadata = Metadata::default();
    for part in rest.split(',') {
        let bytes = part.as_bytes();
        match (bytes.len(), bytes.first()) {
            (2, Some(b'1')) => {
                let v = u8::from_str_radix(&part[1..], 16)
                    .map_err(|_| DecodeError::InvalidMetadata(part.to_string()))?;
                metadata.status = Some(v);
            }
            (3, Some(b'2')) => {
                if !part[1..].bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(DecodeError::InvalidMetadata(part.to_string()));
                }
                let v = u8::from_str_radix(&part[1..], 16)
                    .map_err(|_| DecodeError::InvalidMetadata(part.to_string()))?;
                metadata.current_range = Some(v);
            }
            // Shapes this engine does not know yet are left for newer firmware
            _ => {}
        }
    }
    Ok(metadata)
}

/// Inverse of [`decode_token`].
pub fn encode_token(var: &ScriptVariable) -> String {
    let mut out = String::with_capacity(MIN_TOKEN_LEN + 8);
    out.push_str(&var.id);
    match var.raw {
        RawValue::Integer(v) => {
            let unsigned = i64::from(v) + OFFSET;
            out.push_str(&format!("{unsigned:07X}"));
            out.push(var.si_prefix.as_char());
        }
        RawValue::NotANumber => out.push_str(NAN_FIELD),
    }
    if let Some(status) = var.metadata.status {
        out.push_str(&format!(",1{:X}", status & 0x0F));
    }
    if let Some(cr) = var.metadata.current_range {
        out.push_str(&format!(",2{cr:02X}"));
    }
    out
}

/// Describe a status nibble, e.g. `"OVERLOAD | UNDERLOAD"`, or `"OK"` when no
/// known bit is set.
pub fn status_to_text(flags: u8) -> String {
    let names: Vec<&str> = STATUS_FLAGS
        .iter()
        .filter(|(mask, _)| flags & mask != 0)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        "OK".to_string()
    } else {
        names.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_zero_with_prefix() {
        let var = decode_token("ba8000000m").unwrap();
        assert_eq!(var.id(), "ba");
        assert_eq!(var.raw_value(), RawValue::Integer(0));
        assert_eq!(var.si_prefix(), SiPrefix::Milli);
        assert_eq!(var.value(), 0.0);
        assert!(var.metadata().is_empty());
    }

    #[test]
    fn test_decode_offset_encoding() {
        // 0x0800000 = 2^23, well below the bias
        let var = decode_token("da0800000m").unwrap();
        assert_eq!(var.raw_value(), RawValue::Integer((1 << 23) - (1 << 27)));

        let var = decode_token("ba8000001u").unwrap();
        assert_eq!(var.raw_value(), RawValue::Integer(1));
        assert!((var.value() - 1e-6).abs() < 1e-18);

        let var = decode_token("ba0000000 ").unwrap();
        assert_eq!(var.raw_value(), RawValue::Integer(RawValue::MIN));

        let var = decode_token("baFFFFFFFi").unwrap();
        assert_eq!(var.raw_value(), RawValue::Integer(RawValue::MAX));
        assert_eq!(var.si_prefix(), SiPrefix::Integer);
    }

    #[test]
    fn test_decode_lowercase_hex() {
        let var = decode_token("eb80003e8m").unwrap();
        assert_eq!(var.raw_value(), RawValue::Integer(1000));
        assert!((var.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_decode_nan_literal() {
        let var = decode_token("ba     nan").unwrap();
        assert!(var.is_nan());
        assert!(var.value().is_nan());
        assert_eq!(var.si_prefix(), SiPrefix::None);

        let var = decode_token("cc     nan,12").unwrap();
        assert!(var.value().is_nan());
        assert_eq!(var.metadata().status, Some(2));
    }

    #[test]
    fn test_decode_metadata() {
        let var = decode_token("ba8000010n,14,20B").unwrap();
        assert_eq!(var.metadata().status, Some(4));
        assert_eq!(var.metadata().current_range, Some(0x0B));
        assert_eq!(var.status_text().as_deref(), Some("UNDERLOAD"));
    }

    #[test]
    fn test_decode_ignores_unknown_metadata_shapes() {
        let var = decode_token("ba8000010n,14,3ABC,9,,20B").unwrap();
        assert_eq!(var.metadata().status, Some(4));
        assert_eq!(var.metadata().current_range, Some(0x0B));
    }

    #[test]
    fn test_decode_rejects_bad_metadata_digits() {
        assert!(matches!(
            decode_token("ba8000010n,1z"),
            Err(DecodeError::InvalidMetadata(_))
        ));
        assert!(matches!(
            decode_token("ba8000010n,2+1"),
            Err(DecodeError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            decode_token("ba800000m"),
            Err(DecodeError::TooShort { len: 9 })
        );
        assert!(matches!(
            decode_token("ba80000g0m"),
            Err(DecodeError::InvalidValue(_))
        ));
        assert!(matches!(
            decode_token("ba+800000m"),
            Err(DecodeError::InvalidValue(_))
        ));
        assert_eq!(
            decode_token("ba8000000x"),
            Err(DecodeError::UnknownPrefix('x'))
        );
        assert!(matches!(
            decode_token("ba  nan   "),
            Err(DecodeError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_encode_decode_boundaries_for_every_prefix() {
        let values = [RawValue::MIN, -1_000_000, -1, 0, 1, 123_456, RawValue::MAX];
        for prefix in SiPrefix::ALL {
            for v in values {
                let var = ScriptVariable::new("ab", v, prefix).unwrap();
                let token = encode_token(&var);
                assert_eq!(token.len(), 10);
                let back = decode_token(&token).unwrap();
                assert_eq!(back.raw_value(), RawValue::Integer(v));
                assert_eq!(back.si_prefix(), prefix);
            }
        }
    }

    #[test]
    fn test_encode_with_metadata_and_nan() {
        let var = ScriptVariable::new("ba", 0, SiPrefix::Nano)
            .unwrap()
            .with_metadata(Metadata {
                status: Some(0x3),
                current_range: Some(0x8A),
            });
        assert_eq!(encode_token(&var), "ba8000000n,13,28A");
        assert_eq!(decode_token("ba8000000n,13,28A").unwrap(), var);

        let nan = ScriptVariable::nan("cd").unwrap();
        assert_eq!(encode_token(&nan), "cd     nan");
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(ScriptVariable::new("ba", RawValue::MAX + 1, SiPrefix::None).is_err());
        assert!(ScriptVariable::new("ba", RawValue::MIN - 1, SiPrefix::None).is_err());
        assert!(ScriptVariable::new("b", 0, SiPrefix::None).is_err());
    }

    #[test]
    fn test_status_to_text() {
        assert_eq!(status_to_text(0), "OK");
        assert_eq!(status_to_text(0x2), "OVERLOAD");
        let all = status_to_text(0xF);
        for (_, name) in STATUS_FLAGS {
            assert!(all.contains(name));
        }
        assert_eq!(all.matches('|').count(), 3);
    }

    #[test]
    fn test_display() {
        let var = decode_token("ba8000001m").unwrap();
        assert_eq!(var.to_string(), "WE current: 1e-3 A");
        let var = decode_token("ee8000005i").unwrap();
        assert_eq!(var.to_string(), "Count: 5e0");
    }
}
