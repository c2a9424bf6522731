use bytes::{Bytes, BytesMut};

use crate::endian::{htol16, htol32, htol64, ltoh16, ltoh32, ltoh64};
use crate::error::{CodecError, Result};
use crate::wire::{Sink, SliceSink};

/// Parsed floats with at most this many significant digits are stored as F32.
pub const F32_MAX_PRECISION: u32 = 7;

/// Human-form float output stops once the remaining fraction drops below this.
const FRACTION_EPSILON: f64 = 0.0001;

/// A fractional remainder above this is treated as floating-point drift and
/// carried into the current digit.
const CARRY_THRESHOLD: f64 = 0.9999;

const MAX_FRACTION_DIGITS: usize = 32;

/// Magnitude limit for human-form floats (the integer part is an `i64`).
const FLOAT_INTEGER_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Type tag carried in the top three bits of a binary parameter header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParamType {
    F64 = 0b000,
    F32 = 0b001,
    I64 = 0b010,
    I32 = 0b011,
    I16 = 0b100,
    I8 = 0b101,
    U8 = 0b110,
    Str = 0b111,
}

impl ParamType {
    /// Decode a tag from the low three bits of `bits`.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => ParamType::F64,
            0b001 => ParamType::F32,
            0b010 => ParamType::I64,
            0b011 => ParamType::I32,
            0b100 => ParamType::I16,
            0b101 => ParamType::I8,
            0b110 => ParamType::U8,
            _ => ParamType::Str,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Fixed binary payload size, or `None` for NUL-terminated strings.
    pub fn payload_len(self) -> Option<usize> {
        match self {
            ParamType::U8 | ParamType::I8 => Some(1),
            ParamType::I16 => Some(2),
            ParamType::I32 | ParamType::F32 => Some(4),
            ParamType::I64 | ParamType::F64 => Some(8),
            ParamType::Str => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamType::F64 => "f64",
            ParamType::F32 => "f32",
            ParamType::I64 => "i64",
            ParamType::I32 => "i32",
            ParamType::I16 => "i16",
            ParamType::I8 => "i8",
            ParamType::U8 => "u8",
            ParamType::Str => "str",
        }
    }
}

/// The active representation of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Raw bytes without the wire NUL terminator.
    Str(Bytes),
}

macro_rules! cast_value {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&self) -> $ty {
            match *self {
                Value::U8(v) => v as $ty,
                Value::I8(v) => v as $ty,
                Value::I16(v) => v as $ty,
                Value::I32(v) => v as $ty,
                Value::I64(v) => v as $ty,
                Value::F32(v) => v as $ty,
                Value::F64(v) => v as $ty,
                Value::Str(_) => 0 as $ty,
            }
        }
    };
}

impl Value {
    pub fn param_type(&self) -> ParamType {
        match self {
            Value::U8(_) => ParamType::U8,
            Value::I8(_) => ParamType::I8,
            Value::I16(_) => ParamType::I16,
            Value::I32(_) => ParamType::I32,
            Value::I64(_) => ParamType::I64,
            Value::F32(_) => ParamType::F32,
            Value::F64(_) => ParamType::F64,
            Value::Str(_) => ParamType::Str,
        }
    }

    cast_value!(
        /// Numeric value cast to `u8`. Strings cast to zero.
        as_u8,
        u8
    );
    cast_value!(as_i8, i8);
    cast_value!(as_i16, i16);
    cast_value!(as_i32, i32);
    cast_value!(as_i64, i64);
    cast_value!(as_f32, f32);
    cast_value!(as_f64, f64);

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// String payload, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|s| std::str::from_utf8(s).ok())
    }
}

/// A letter-tagged typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    letter: u8,
    value: Value,
}

/// Uppercase and check a parameter/command letter.
pub(crate) fn validate_letter(letter: char) -> Result<u8> {
    let upper = letter.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        Ok(upper as u8)
    } else {
        Err(CodecError::Parse)
    }
}

impl Param {
    /// Create a parameter. Letters are uppercased and must be `A..=Z`
    /// (`Parse` otherwise); strings must not contain NUL (`Dump`).
    pub fn new(letter: char, value: Value) -> Result<Self> {
        let letter = validate_letter(letter)?;
        if let Value::Str(s) = &value {
            if s.contains(&0) {
                return Err(CodecError::Dump);
            }
        }
        Ok(Self { letter, value })
    }

    pub fn u8(letter: char, v: u8) -> Result<Self> {
        Self::new(letter, Value::U8(v))
    }

    pub fn i8(letter: char, v: i8) -> Result<Self> {
        Self::new(letter, Value::I8(v))
    }

    pub fn i16(letter: char, v: i16) -> Result<Self> {
        Self::new(letter, Value::I16(v))
    }

    pub fn i32(letter: char, v: i32) -> Result<Self> {
        Self::new(letter, Value::I32(v))
    }

    pub fn i64(letter: char, v: i64) -> Result<Self> {
        Self::new(letter, Value::I64(v))
    }

    pub fn f32(letter: char, v: f32) -> Result<Self> {
        Self::new(letter, Value::F32(v))
    }

    pub fn f64(letter: char, v: f64) -> Result<Self> {
        Self::new(letter, Value::F64(v))
    }

    pub fn string(letter: char, v: impl Into<Bytes>) -> Result<Self> {
        Self::new(letter, Value::Str(v.into()))
    }

    /// Built from an already validated letter byte.
    pub(crate) fn from_parts(letter: u8, value: Value) -> Self {
        Self { letter, value }
    }

    pub fn letter(&self) -> char {
        self.letter as char
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn param_type(&self) -> ParamType {
        self.value.param_type()
    }

    /// Wire header: letter in the low five bits, type tag in the high three.
    pub fn header(&self) -> u8 {
        (self.letter & 0x1F) | (self.param_type().bits() << 5)
    }

    /// Parse one binary parameter, returning it and the bytes consumed.
    ///
    /// A string without a NUL terminator runs to the end of `buf`.
    pub fn parse_binary(buf: &[u8]) -> Result<(Self, usize)> {
        let (&header, rest) = buf.split_first().ok_or(CodecError::Buffer)?;
        let letter = (header & 0x1F) | 0x40;
        if !letter.is_ascii_uppercase() {
            return Err(CodecError::Parse);
        }

        let ty = ParamType::from_bits(header >> 5);
        let (value, consumed) = match ty {
            ParamType::U8 => (Value::U8(wire_array::<1>(rest)?[0]), 2),
            ParamType::I8 => (Value::I8(wire_array::<1>(rest)?[0] as i8), 2),
            ParamType::I16 => {
                let raw = ltoh16(u16::from_ne_bytes(wire_array(rest)?));
                (Value::I16(raw as i16), 3)
            }
            ParamType::I32 => {
                let raw = ltoh32(u32::from_ne_bytes(wire_array(rest)?));
                (Value::I32(raw as i32), 5)
            }
            ParamType::F32 => {
                let raw = ltoh32(u32::from_ne_bytes(wire_array(rest)?));
                (Value::F32(f32::from_bits(raw)), 5)
            }
            ParamType::I64 => {
                let raw = ltoh64(u64::from_ne_bytes(wire_array(rest)?));
                (Value::I64(raw as i64), 9)
            }
            ParamType::F64 => {
                let raw = ltoh64(u64::from_ne_bytes(wire_array(rest)?));
                (Value::F64(f64::from_bits(raw)), 9)
            }
            ParamType::Str => match rest.iter().position(|&b| b == 0) {
                Some(len) => (Value::Str(Bytes::copy_from_slice(&rest[..len])), len + 2),
                None => (Value::Str(Bytes::copy_from_slice(rest)), buf.len()),
            },
        };

        Ok((Self { letter, value }, consumed))
    }

    /// Parse one human-readable parameter (`LETTER` then a quoted string or a
    /// decimal number), returning it and the bytes consumed.
    pub fn parse_human(buf: &[u8]) -> Result<(Self, usize)> {
        let (&first, rest) = buf.split_first().ok_or(CodecError::Buffer)?;
        let letter = first.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(CodecError::Parse);
        }

        if let Some((text, used)) = parse_quoted(rest)? {
            return Ok((Self::from_parts(letter, Value::Str(text)), used + 1));
        }

        let (value, used) = parse_number(rest)?;
        Ok((Self::from_parts(letter, value), used + 1))
    }

    /// Write the binary form into `out`, returning the bytes written.
    pub fn dump_binary(&self, out: &mut [u8]) -> Result<usize> {
        let mut sink = SliceSink::new(out);
        self.write_binary(&mut sink)?;
        Ok(sink.written())
    }

    /// Write the human form into `out`, returning the bytes written.
    pub fn dump_human(&self, out: &mut [u8]) -> Result<usize> {
        let mut sink = SliceSink::new(out);
        self.write_human(&mut sink)?;
        Ok(sink.written())
    }

    /// Append the binary form to a growable buffer.
    pub fn encode_binary(&self, dst: &mut BytesMut) -> Result<()> {
        self.write_binary(dst)
    }

    /// Append the human form to a growable buffer.
    pub fn encode_human(&self, dst: &mut BytesMut) -> Result<()> {
        self.write_human(dst)
    }

    pub(crate) fn write_binary<S: Sink>(&self, sink: &mut S) -> Result<()> {
        sink.put(&[self.header()])?;
        match &self.value {
            Value::U8(v) => sink.put(&[*v]),
            Value::I8(v) => sink.put(&[*v as u8]),
            Value::I16(v) => sink.put(&htol16(*v as u16).to_ne_bytes()),
            Value::I32(v) => sink.put(&htol32(*v as u32).to_ne_bytes()),
            Value::F32(v) => sink.put(&htol32(v.to_bits()).to_ne_bytes()),
            Value::I64(v) => sink.put(&htol64(*v as u64).to_ne_bytes()),
            Value::F64(v) => sink.put(&htol64(v.to_bits()).to_ne_bytes()),
            Value::Str(s) => {
                sink.put(s)?;
                sink.put(&[0])
            }
        }
    }

    pub(crate) fn write_human<S: Sink>(&self, sink: &mut S) -> Result<()> {
        sink.put(&[self.letter])?;
        match &self.value {
            Value::Str(s) => {
                let has_single = s.contains(&b'\'');
                let has_double = s.contains(&b'"');
                if has_single && has_double {
                    return Err(CodecError::Dump);
                }
                let quote = if has_single { b'"' } else { b'\'' };
                sink.put(&[quote])?;
                sink.put(s)?;
                sink.put(&[quote])
            }
            Value::F32(v) => write_float(sink, f64::from(*v)),
            Value::F64(v) => write_float(sink, *v),
            other => sink.put(other.as_i64().to_string().as_bytes()),
        }
    }
}

fn wire_array<const N: usize>(buf: &[u8]) -> Result<[u8; N]> {
    buf.get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(CodecError::Buffer)
}

fn decimal_digit(b: u8) -> Option<u8> {
    b.is_ascii_digit().then(|| b - b'0')
}

/// `'...'` or `"..."` with no escaping. `Ok(None)` if `buf` does not start
/// with a quote.
fn parse_quoted(buf: &[u8]) -> Result<Option<(Bytes, usize)>> {
    let &quote = buf.first().ok_or(CodecError::Buffer)?;
    if quote != b'\'' && quote != b'"' {
        return Ok(None);
    }
    let body = &buf[1..];
    let len = body
        .iter()
        .position(|&b| b == quote)
        .ok_or(CodecError::Buffer)?;
    let text = &body[..len];
    if text.contains(&0) {
        return Err(CodecError::Parse);
    }
    Ok(Some((Bytes::copy_from_slice(text), len + 2)))
}

/// Decimal number with optional sign and decimal point.
///
/// `precision` is the count of significant digits up to the last non-zero
/// one; it picks F32 or F64 for decimals. Integers take the narrowest type
/// that holds them exactly.
fn parse_number(buf: &[u8]) -> Result<(Value, usize)> {
    let mut pos = 0;
    let negative = buf.first() == Some(&b'-');
    if negative {
        pos += 1;
    }

    let mut digits = 0u32;
    let mut precision = 0u32;
    let mut seen_digit = false;
    let mut int: i64 = 0;

    while let Some(d) = buf.get(pos).copied().and_then(decimal_digit) {
        int = int.wrapping_mul(10).wrapping_add(i64::from(d));
        pos += 1;
        seen_digit = true;
        if digits > 0 || d != 0 {
            digits += 1;
        }
        if d != 0 {
            precision = digits;
        }
    }

    if buf.get(pos) == Some(&b'.') {
        pos += 1;
        let mut value = int as f64;
        let mut scale = 10.0f64;
        while let Some(d) = buf.get(pos).copied().and_then(decimal_digit) {
            value += f64::from(d) / scale;
            scale *= 10.0;
            pos += 1;
            digits += 1;
            if d != 0 {
                precision = digits;
            }
        }
        if negative {
            value = -value;
        }
        let value = if precision <= F32_MAX_PRECISION {
            Value::F32(value as f32)
        } else {
            Value::F64(value)
        };
        return Ok((value, pos));
    }

    if !seen_digit {
        return Err(CodecError::Parse);
    }

    let int = if negative { int.wrapping_neg() } else { int };
    Ok((narrowest_int(int), pos))
}

fn narrowest_int(v: i64) -> Value {
    if let Ok(v) = u8::try_from(v) {
        Value::U8(v)
    } else if let Ok(v) = i8::try_from(v) {
        Value::I8(v)
    } else if let Ok(v) = i16::try_from(v) {
        Value::I16(v)
    } else if let Ok(v) = i32::try_from(v) {
        Value::I32(v)
    } else {
        Value::I64(v)
    }
}

/// Integer part, `.`, then fractional digits until the remainder falls below
/// [`FRACTION_EPSILON`]. A zero fraction still emits one `0`.
fn write_float<S: Sink>(sink: &mut S, value: f64) -> Result<()> {
    if !value.is_finite() || value.abs() >= FLOAT_INTEGER_LIMIT {
        return Err(CodecError::Dump);
    }

    let mut value = value;
    if value < 0.0 {
        sink.put(b"-")?;
        value = -value;
    }

    let mut base = value.trunc() as i64;
    let mut frac = value - base as f64;
    if frac > CARRY_THRESHOLD {
        base += 1;
        frac -= CARRY_THRESHOLD;
    }
    sink.put(base.to_string().as_bytes())?;
    sink.put(b".")?;

    if frac <= FRACTION_EPSILON {
        return sink.put(b"0");
    }

    let mut emitted = 0;
    while frac > FRACTION_EPSILON && emitted < MAX_FRACTION_DIGITS {
        frac *= 10.0;
        let mut digit = frac as u8;
        frac -= f64::from(digit);
        if frac > CARRY_THRESHOLD && digit < 9 {
            digit += 1;
            frac -= CARRY_THRESHOLD;
        }
        sink.put(&[b'0' + digit])?;
        emitted += 1;
    }
    Ok(())
}
