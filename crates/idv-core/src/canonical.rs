//! # Canonical Serialization
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used to fingerprint a credential payload.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which sorts object keys and
//! writes the payload with a fixed formatter. Any function that fingerprints a
//! payload must accept `&CanonicalBytes`, so a digest over ad-hoc bytes cannot
//! be produced by accident.
//!
//! ## Byte Format
//!
//! Digests already anchored by the legacy backend were computed over Python's
//! `json.dumps(obj, sort_keys=True)` output, and the format is kept byte for
//! byte:
//!
//! 1. **Sorted keys**: object keys in code point order, recursively.
//! 2. **Spaced separators**: `", "` between items, `": "` between key and value.
//! 3. **ASCII only**: every character outside `0x20..=0x7e` is written as a
//!    lowercase `\uXXXX` escape, using UTF-16 surrogate pairs above the BMP.
//! 4. **Floats in `repr` form**: shortest round-trip digits, always with a
//!    fractional part (`100.0`), and exponent notation below `1e-4` or from
//!    `1e16` up, with a signed exponent of at least two digits (`1e-07`,
//!    `1.5e+16`).
//!
//! Integers are exact within the `i64`/`u64` range. Larger integers cannot be
//! represented in a `serde_json::Value` without becoming floats, so payloads
//! parsed from JSON text with such integers do not reproduce legacy digests.
//!
//! So `{"num":"X123","doc":"passport"}` canonicalizes to
//! `{"doc": "passport", "num": "X123"}`.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;

use crate::error::HashingError;

/// Bytes produced exclusively by the canonical payload serializer.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted at every depth.
/// - The byte sequence is pure ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `HashingError::Serialization` if the value cannot be
    /// represented as JSON (for example a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, HashingError> {
        let value = serde_json::to_value(obj)?;
        let sorted = sort_keys(value);
        let mut out = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedAsciiFormatter);
        sorted.serialize(&mut ser)?;
        Ok(Self(out))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical form as text. Always valid: the output is ASCII.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Rebuild every object with its keys in sorted order.
///
/// `serde_json::Map` is only guaranteed sorted when the `preserve_order`
/// feature is off; feature unification elsewhere in a build can turn it on,
/// so the order is established here explicitly.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// JSON formatter with `", "` / `": "` separators and ASCII-only strings.
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(python_float_repr(value).as_bytes())
    }

    // Quotes, backslashes and C0 controls arrive through `write_char_escape`;
    // fragments carry everything else, including DEL and non-ASCII.
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// Python's `repr(float)` for a finite value.
fn python_float_repr(value: f64) -> String {
    // `{:e}` yields the shortest round-trip digits, e.g. `1.5e16`, `0e0`.
    let sci = format!("{:e}", value.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if value.is_sign_negative() { "-" } else { "" };

    if !(-4..16).contains(&exp) {
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{:02}", exp.abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    if exp >= 0 {
        let point = exp as usize + 1;
        if digits.len() <= point {
            format!("{sign}{digits}{}.0", "0".repeat(point - digits.len()))
        } else {
            format!("{sign}{}.{}", &digits[..point], &digits[point..])
        }
    } else {
        format!("{sign}0.{}{digits}", "0".repeat((-exp - 1) as usize))
    }
}
