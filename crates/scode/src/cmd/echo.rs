use std::io::{Cursor, Read};

use scode_codec::{CodecConfig, CodecError, CommandReader, StreamError};

use crate::cmd::EchoArgs;
use crate::exit::{stream_error, CliResult, SUCCESS};
use crate::output::{print_command, OutputFormat};

pub fn run(args: EchoArgs, format: OutputFormat) -> CliResult<i32> {
    let config = CodecConfig {
        read_chunk_size: args.chunk_size.max(1),
        ..CodecConfig::default()
    };

    if args.words.is_empty() {
        let stdin = std::io::stdin();
        return decode(CommandReader::with_config(stdin.lock(), config), format);
    }

    let mut line = args.words.join(" ").into_bytes();
    line.push(b'\n');
    decode(CommandReader::with_config(Cursor::new(line), config), format)
}

fn decode<R: Read>(reader: CommandReader<R>, format: OutputFormat) -> CliResult<i32> {
    let mut decoded = 0usize;
    let mut rejected = 0usize;

    for result in reader {
        let outcome = match result {
            Ok(command) => print_command(&command, format),
            Err(StreamError::Codec(err)) => Err(err),
            Err(err) => return Err(stream_error("read failed", err)),
        };
        match outcome {
            Ok(()) => decoded += 1,
            Err(err) => {
                rejected += 1;
                eprintln!("{}", error_label(err));
            }
        }
    }

    tracing::debug!(decoded, rejected, "echo finished");
    Ok(SUCCESS)
}

fn error_label(err: CodecError) -> &'static str {
    match err {
        CodecError::Crc => "CRC Error",
        CodecError::Parse => "Parse Error",
        CodecError::Dump => "Dump Error",
        CodecError::Buffer => "Buffer Error",
        CodecError::Empty => "Empty Line",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_name_the_failed_stage() {
        assert_eq!(error_label(CodecError::Crc), "CRC Error");
        assert_eq!(error_label(CodecError::Parse), "Parse Error");
        assert_eq!(error_label(CodecError::Dump), "Dump Error");
    }

    #[test]
    fn decode_skips_malformed_lines() {
        let reader = CommandReader::new(Cursor::new(b"Gg\nG1 X2\n".to_vec()));
        assert_eq!(decode(reader, OutputFormat::Json).unwrap(), SUCCESS);
    }
}
