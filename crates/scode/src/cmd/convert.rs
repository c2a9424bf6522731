use scode_codec::{CodecConfig, CommandReader, CommandWriter, Encoding, StreamError};

use crate::cmd::ConvertArgs;
use crate::exit::{stream_error, CliResult, SUCCESS};

pub fn run(args: ConvertArgs) -> CliResult<i32> {
    let encoding = Encoding::from(args.to);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    let reader = CommandReader::new(stdin.lock());
    let config = CodecConfig {
        output_encoding: Some(encoding),
        ..CodecConfig::default()
    };
    let mut writer = CommandWriter::with_config(stdout.lock(), config);

    let mut converted = 0usize;
    let mut skipped = 0usize;

    for result in reader {
        let command = match result {
            Ok(command) => command,
            Err(StreamError::Codec(err)) if !args.strict => {
                skipped += 1;
                tracing::warn!(error = %err, "skipping malformed frame");
                continue;
            }
            Err(err) => return Err(stream_error("read failed", err)),
        };

        match writer.write_command(&command) {
            Ok(()) => converted += 1,
            Err(StreamError::Codec(err)) if !args.strict => {
                skipped += 1;
                tracing::warn!(
                    letter = %command.letter(),
                    number = command.number(),
                    error = %err,
                    "command cannot be re-encoded"
                );
            }
            Err(err) => return Err(stream_error("write failed", err)),
        }
    }

    tracing::info!(
        converted,
        skipped,
        encoding = encoding.name(),
        "conversion finished"
    );
    Ok(SUCCESS)
}
