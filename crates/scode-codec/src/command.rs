use bytes::{Bytes, BytesMut};

use crate::crc::crc8;
use crate::error::{CodecError, Result};
use crate::param::{validate_letter, Param, Value};
use crate::wire::{CrcSink, Sink, SliceSink};

/// Terminates the parameter list of a binary frame.
pub const BINARY_TERMINATOR: u8 = 0x00;

/// Starts a comment in a human line.
pub const COMMENT: u8 = b';';

/// Wire family of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// `[id][param]*[0x00][crc]`
    Binary,
    /// `LETTER NUMBER (' ' PARAM)* [';' comment] EOL`
    Human,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Binary => "binary",
            Encoding::Human => "human",
        }
    }
}

/// A letter+number identified command with ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    letter: u8,
    number: u8,
    params: Vec<Param>,
    binary: bool,
}

impl Command {
    /// Create a command with no parameters. Directly created commands
    /// report the binary encoding.
    pub fn new(letter: char, number: u8) -> Result<Self> {
        Self::with_params(letter, number, Vec::new())
    }

    /// Create a command with room for `capacity` parameters.
    pub fn with_capacity(letter: char, number: u8, capacity: usize) -> Result<Self> {
        Self::with_params(letter, number, Vec::with_capacity(capacity))
    }

    pub fn with_params(letter: char, number: u8, params: Vec<Param>) -> Result<Self> {
        Ok(Self {
            letter: validate_letter(letter)?,
            number,
            params,
            binary: true,
        })
    }

    pub fn letter(&self) -> char {
        self.letter as char
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Vec<Param> {
        &mut self.params
    }

    pub fn into_params(self) -> Vec<Param> {
        self.params
    }

    pub fn push(&mut self, param: Param) {
        self.params.push(param);
    }

    /// First parameter with the given letter.
    pub fn param(&self, letter: char) -> Option<&Param> {
        let letter = letter.to_ascii_uppercase();
        self.params.iter().find(|p| p.letter() == letter)
    }

    /// Whether this command was decoded from a binary frame.
    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn encoding(&self) -> Encoding {
        if self.binary {
            Encoding::Binary
        } else {
            Encoding::Human
        }
    }

    /// Mark the family subsequent same-family re-encodes should use.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.binary = encoding == Encoding::Binary;
    }

    fn identifier(&self) -> Param {
        Param::from_parts(self.letter, Value::U8(self.number))
    }

    /// Parse one command from the start of `buf`, returning it and the bytes
    /// consumed (leading whitespace and the frame terminator included).
    ///
    /// Frames whose first significant byte has bit 7 set are binary; anything
    /// else is a human line.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let start = buf
            .iter()
            .position(|&b| !is_space(b) || is_eol(b))
            .unwrap_or(buf.len());
        let first = *buf.get(start).ok_or(CodecError::Buffer)?;

        if first & 0x80 != 0 {
            parse_binary_frame(buf, start)
        } else {
            parse_human_line(buf, start)
        }
    }

    /// Write the binary frame into `out`, returning the bytes written.
    pub fn dump_binary(&self, out: &mut [u8]) -> Result<usize> {
        let mut sink = SliceSink::new(out);
        self.write_binary(&mut sink)?;
        Ok(sink.written())
    }

    /// Write the human line (ending in `\r\n`) into `out`, returning the
    /// bytes written.
    pub fn dump_human(&self, out: &mut [u8]) -> Result<usize> {
        let mut sink = SliceSink::new(out);
        self.write_human(&mut sink)?;
        Ok(sink.written())
    }

    /// Append the frame in the given encoding to a growable buffer.
    ///
    /// On error, bytes already appended are left in `dst`.
    pub fn encode(&self, encoding: Encoding, dst: &mut BytesMut) -> Result<()> {
        match encoding {
            Encoding::Binary => self.write_binary(dst),
            Encoding::Human => self.write_human(dst),
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self, encoding: Encoding) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode(encoding, &mut dst)?;
        Ok(dst.freeze())
    }

    fn write_binary<S: Sink>(&self, sink: &mut S) -> Result<()> {
        let crc = {
            let mut body = CrcSink::new(sink);
            self.identifier().write_binary(&mut body)?;
            for param in &self.params {
                param.write_binary(&mut body)?;
            }
            body.crc()
        };
        sink.put(&[BINARY_TERMINATOR, crc])
    }

    fn write_human<S: Sink>(&self, sink: &mut S) -> Result<()> {
        self.identifier().write_human(sink)?;
        for param in &self.params {
            sink.put(b" ")?;
            param.write_human(sink)?;
        }
        sink.put(b"\r\n")
    }
}

/// Space, `\t`, `\n`, `\v`, `\f` or `\r`.
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

fn is_eol(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

fn parse_binary_frame(buf: &[u8], start: usize) -> Result<(Command, usize)> {
    let (id, used) = Param::parse_binary(&buf[start..])?;
    let mut pos = start + used;
    let mut params = Vec::new();

    loop {
        let next = *buf.get(pos).ok_or(CodecError::Buffer)?;
        if next == BINARY_TERMINATOR {
            break;
        }
        let (param, used) = Param::parse_binary(&buf[pos..])?;
        params.push(param);
        pos += used;
    }

    let body_end = pos;
    let received = *buf.get(body_end + 1).ok_or(CodecError::Buffer)?;
    if crc8(&buf[start..body_end], received) != 0 {
        return Err(CodecError::Crc);
    }
    pos = body_end + 2;

    while buf.get(pos).copied().is_some_and(is_space) {
        pos += 1;
    }

    let command = Command {
        letter: id.letter() as u8,
        number: id.value().as_u8(),
        params,
        binary: true,
    };
    Ok((command, pos))
}

fn parse_human_line(buf: &[u8], start: usize) -> Result<(Command, usize)> {
    let eol = buf[start..]
        .iter()
        .position(|&b| is_eol(b))
        .map(|i| start + i)
        .ok_or(CodecError::Buffer)?;
    let content_end = buf[start..eol]
        .iter()
        .position(|&b| b == COMMENT)
        .map_or(eol, |i| start + i);

    if content_end == start {
        return Err(CodecError::Empty);
    }

    // The line is complete, so running out of content is a syntax error.
    let content = &buf[..content_end];
    let (id, used) = parse_human_in_line(&content[start..])?;
    let mut pos = start + used;
    let mut params = Vec::new();

    while pos < content_end {
        if is_space(content[pos]) {
            pos += 1;
            continue;
        }
        let (param, used) = parse_human_in_line(&content[pos..])?;
        params.push(param);
        pos += used;
    }

    let mut consumed = eol + 1;
    if buf[eol] == b'\r' && buf.get(consumed) == Some(&b'\n') {
        consumed += 1;
    }

    let command = Command {
        letter: id.letter() as u8,
        number: id.value().as_u8(),
        params,
        binary: false,
    };
    Ok((command, consumed))
}

fn parse_human_in_line(content: &[u8]) -> Result<(Param, usize)> {
    Param::parse_human(content).map_err(|err| match err {
        CodecError::Buffer => CodecError::Parse,
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamType;

    fn parse(input: &[u8]) -> Result<(Command, usize)> {
        Command::parse(input)
    }

    #[test]
    fn dump_human_without_params() {
        let cmd = Command::new('S', 2).unwrap();
        let mut buf = [0u8; 64];
        let n = cmd.dump_human(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"S2\r\n");
    }

    #[test]
    fn dump_human_with_params() {
        let mut cmd = Command::with_capacity('S', 2, 2).unwrap();
        cmd.push(Param::i16('N', 1234).unwrap());
        cmd.push(Param::string('M', "hi").unwrap());
        let mut buf = [0u8; 64];
        let n = cmd.dump_human(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"S2 N1234 M'hi'\r\n");
    }

    #[test]
    fn dump_human_errors() {
        let mut cmd = Command::new('S', 2).unwrap();
        let mut small = [0u8; 3];
        assert_eq!(cmd.dump_human(&mut small), Err(CodecError::Buffer));

        cmd.push(Param::string('M', "'\"").unwrap());
        let mut buf = [0u8; 64];
        assert_eq!(cmd.dump_human(&mut buf), Err(CodecError::Dump));
    }

    #[test]
    fn dump_binary_vectors() {
        let cmd = Command::new('S', 2).unwrap();
        let mut buf = [0u8; 64];
        let n = cmd.dump_binary(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"\xD3\x02\x00\x8B");

        let cmd = Command::with_params('S', 2, vec![Param::i16('N', 1235).unwrap()]).unwrap();
        let n = cmd.dump_binary(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"\xD3\x02\x8E\xD3\x04\x00\x59");
    }

    #[test]
    fn dump_binary_buffer_too_small() {
        let cmd = Command::new('S', 2).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(cmd.dump_binary(&mut buf), Err(CodecError::Buffer));
    }

    #[test]
    fn parse_human_lines() {
        let (cmd, n) = parse(b"S2\n").unwrap();
        assert_eq!(n, 3);
        assert_eq!((cmd.letter(), cmd.number()), ('S', 2));
        assert!(!cmd.is_binary());
        assert!(cmd.params().is_empty());

        let (cmd, n) = parse(b"S2   N1234\n").unwrap();
        assert_eq!(n, 11);
        assert_eq!(cmd.encoding(), Encoding::Human);
        assert_eq!(cmd.params().len(), 1);
        let p = &cmd.params()[0];
        assert_eq!((p.letter(), p.param_type()), ('N', ParamType::I16));
        assert_eq!(p.value(), &Value::I16(1234));
    }

    #[test]
    fn parse_human_preserves_param_order() {
        let (cmd, _) = parse(b"g1 Y2 X-3.5 Z'up'\r\n").unwrap();
        assert_eq!(cmd.letter(), 'G');
        let letters: Vec<char> = cmd.params().iter().map(Param::letter).collect();
        assert_eq!(letters, ['Y', 'X', 'Z']);
        assert_eq!(cmd.param('x').map(|p| p.value().as_f32()), Some(-3.5));
    }

    #[test]
    fn parse_human_number_is_narrowed() {
        let (cmd, _) = parse(b"M300\n").unwrap();
        assert_eq!(cmd.number(), 300u16 as u8);
    }

    #[test]
    fn parse_binary_frames() {
        let (cmd, n) = parse(b"\xD3\x02\x00\x8B").unwrap();
        assert_eq!(n, 4);
        assert_eq!((cmd.letter(), cmd.number()), ('S', 2));
        assert!(cmd.is_binary());
        assert!(cmd.params().is_empty());

        let (cmd, n) = parse(b"\xD3\x02\x8E\xD3\x04\x00\x59").unwrap();
        assert_eq!(n, 7);
        assert_eq!(cmd.params().len(), 1);
        assert_eq!(cmd.params()[0].letter(), 'N');
        assert_eq!(cmd.params()[0].value(), &Value::I16(1235));
    }

    #[test]
    fn parse_binary_crc_mismatch() {
        assert_eq!(
            parse(b"\xD3\x06\x8E\xD3\x04\x00\x10"),
            Err(CodecError::Crc)
        );
    }

    #[test]
    fn parse_binary_incomplete() {
        let frame = b"\xD3\x02\x8E\xD3\x04\x00\x59";
        for end in 0..frame.len() {
            assert_eq!(parse(&frame[..end]), Err(CodecError::Buffer), "prefix {end}");
        }
    }

    #[test]
    fn parse_binary_bad_param_header() {
        assert_eq!(parse(b"\xD3\x02\xC0\x01\x00\x00"), Err(CodecError::Parse));
    }

    #[test]
    fn parse_incomplete_human_line() {
        assert_eq!(parse(b""), Err(CodecError::Buffer));
        assert_eq!(parse(b"   "), Err(CodecError::Buffer));
        assert_eq!(parse(b"G1 X2"), Err(CodecError::Buffer));
    }

    #[test]
    fn parse_human_syntax_errors() {
        assert_eq!(parse(b"Gg\n"), Err(CodecError::Parse));
        assert_eq!(parse(b"G\n"), Err(CodecError::Parse));
        assert_eq!(parse(b"G1 X'open\n"), Err(CodecError::Parse));
        assert_eq!(parse(b"G1 7\n"), Err(CodecError::Parse));
    }

    #[test]
    fn comments_and_whitespace() {
        assert_eq!(parse(b"  D6\r\n").unwrap().1, 6);
        assert_eq!(parse(b"\t\xD3\x02\x8E\xD3\x04\x00\x59 \nG2\n").unwrap().1, 10);
        assert_eq!(parse(b"    \t;D6\n"), Err(CodecError::Empty));
        assert_eq!(parse(b"    \n;D6\n"), Err(CodecError::Empty));
        assert_eq!(parse(b"D6;\nHello World!").unwrap().1, 4);
        assert_eq!(parse(b"D6\r").unwrap().1, 3);
        assert_eq!(parse(b"D6\n\r").unwrap().1, 3);

        let (cmd, n) = parse(b"D6 ;N2\nHello World!").unwrap();
        assert_eq!(n, 7);
        assert!(cmd.params().is_empty());

        let (cmd, n) = parse(b"D6 ;N2 ;\nHello World!").unwrap();
        assert_eq!(n, 9);
        assert!(cmd.params().is_empty());

        assert_eq!(
            parse(b"\t;\xD3\x02\x8E\xD3\x04\x00\x10\n"),
            Err(CodecError::Empty)
        );
    }

    #[test]
    fn roundtrip_both_encodings() {
        let cmd = Command::with_params(
            'G',
            1,
            vec![
                Param::f32('X', 12.5).unwrap(),
                Param::i32('F', 150_000).unwrap(),
                Param::string('C', "won't").unwrap(),
                Param::i8('E', -3).unwrap(),
            ],
        )
        .unwrap();

        let wire = cmd.to_bytes(Encoding::Binary).unwrap();
        let (back, n) = Command::parse(&wire).unwrap();
        assert_eq!(n, wire.len());
        assert_eq!(back, cmd);

        let line = cmd.to_bytes(Encoding::Human).unwrap();
        assert_eq!(line.as_ref(), b"G1 X12.5 F150000 C\"won't\" E-3\r\n");
        let (mut back, n) = Command::parse(&line).unwrap();
        assert_eq!(n, line.len());
        assert!(!back.is_binary());
        back.set_encoding(Encoding::Binary);
        assert_eq!(back, cmd);
    }
}
