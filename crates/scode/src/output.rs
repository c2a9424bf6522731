use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use scode_codec::{CodecError, Command, Encoding, Param, Value};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CommandOutput {
    command: String,
    encoding: &'static str,
    human: String,
    binary: String,
    params: Vec<ParamOutput>,
}

#[derive(Serialize)]
struct ParamOutput {
    letter: char,
    #[serde(rename = "type")]
    kind: &'static str,
    value: serde_json::Value,
}

/// Print a decoded command in both encodings.
///
/// Fails without printing anything if either encoding cannot represent it.
pub fn print_command(command: &Command, format: OutputFormat) -> Result<(), CodecError> {
    let human = command.to_bytes(Encoding::Human)?;
    let binary = command.to_bytes(Encoding::Binary)?;

    match format {
        OutputFormat::Json => {
            let out = CommandOutput {
                command: identifier(command),
                encoding: command.encoding().name(),
                human: String::from_utf8_lossy(trim_eol(&human)).into_owned(),
                binary: hex(&binary),
                params: command.params().iter().map(param_output).collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "PARAM", "TYPE", "VALUE"]);
            for param in command.params() {
                table.add_row(vec![
                    identifier(command),
                    param.letter().to_string(),
                    param.param_type().name().to_string(),
                    value_text(param.value()),
                ]);
            }
            if command.params().is_empty() {
                table.add_row(vec![
                    identifier(command),
                    String::new(),
                    String::new(),
                    String::new(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(&human);
            let _ = writeln!(out, "{}", escaped(&binary));
            let _ = writeln!(out, "{}", dotted(&binary));
            let _ = out.flush();
        }
    }
    Ok(())
}

fn identifier(command: &Command) -> String {
    format!("{}{}", command.letter(), command.number())
}

fn param_output(param: &Param) -> ParamOutput {
    let value = match param.value() {
        Value::U8(v) => serde_json::Value::from(*v),
        Value::I8(v) => serde_json::Value::from(*v),
        Value::I16(v) => serde_json::Value::from(*v),
        Value::I32(v) => serde_json::Value::from(*v),
        Value::I64(v) => serde_json::Value::from(*v),
        Value::F32(v) => serde_json::Value::from(f64::from(*v)),
        Value::F64(v) => serde_json::Value::from(*v),
        Value::Str(bytes) => {
            serde_json::Value::from(String::from_utf8_lossy(bytes).into_owned())
        }
    };
    ParamOutput {
        letter: param.letter(),
        kind: param.param_type().name(),
        value,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Str(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        other => other.as_i64().to_string(),
    }
}

fn trim_eol(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r\n").unwrap_or(line)
}

/// Printable ASCII as-is, everything else as `\xNN`.
pub fn escaped(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        if (0x20..0x7F).contains(&b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("\\x{b:02X}"));
        }
    }
    out
}

/// Printable ASCII as-is, everything else as `.`.
pub fn dotted(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (0x20..0x7F).contains(&b) { char::from(b) } else { '.' })
        .collect()
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const S2: &[u8] = &[0xD3, 0x02, 0x8E, 0xD3, 0x04, 0x00, 0x59];

    #[test]
    fn escaped_and_dotted_match_demo_output() {
        assert_eq!(escaped(S2), "\\xD3\\x02\\x8E\\xD3\\x04\\x00Y");
        assert_eq!(dotted(S2), "......Y");
    }

    #[test]
    fn hex_is_lowercase_without_separators() {
        assert_eq!(hex(S2), "d3028ed3040059");
    }

    #[test]
    fn param_json_keeps_type_and_value() {
        let out = param_output(&Param::i16('E', -300).unwrap());
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["letter"], "E");
        assert_eq!(json["type"], "i16");
        assert_eq!(json["value"], -300);
    }

    #[test]
    fn value_text_for_strings_and_ints() {
        assert_eq!(value_text(&Value::Str("hi".into())), "hi");
        assert_eq!(value_text(&Value::U8(7)), "7");
        assert_eq!(value_text(&Value::F32(1.5)), "1.5");
    }
}
