use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::cmd::CrcArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{hex, OutputFormat};

#[derive(Serialize)]
struct CrcOutput {
    input: String,
    len: usize,
    seed: u8,
    crc: u8,
}

pub fn run(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = if args.hex {
        decode_hex(&args.text)
            .ok_or_else(|| CliError::new(USAGE, format!("invalid hex input: {}", args.text)))?
    } else {
        args.text.clone().into_bytes()
    };

    let crc = scode_codec::crc8(&bytes, args.seed);

    match format {
        OutputFormat::Json => {
            let out = CrcOutput {
                input: hex(&bytes),
                len: bytes.len(),
                seed: args.seed,
                crc,
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
                .set_header(vec!["BYTES", "SEED", "CRC-8"])
                .add_row(vec![
                    bytes.len().to_string(),
                    format!("0x{:02X}", args.seed),
                    format!("0x{crc:02X}"),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("0x{crc:02X}"),
    }

    Ok(SUCCESS)
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}
