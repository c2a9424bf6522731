use clap::{Args, Subcommand, ValueEnum};

use crate::exit::CliResult;
use crate::output::OutputFormat;
use scode_codec::Encoding;

pub mod convert;
pub mod crc;
pub mod echo;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode commands and print them in both encodings.
    Echo(EchoArgs),
    /// Re-encode a command stream from stdin to stdout.
    Convert(ConvertArgs),
    /// Print the CRC-8 of some bytes.
    Crc(CrcArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args, format),
        Command::Convert(args) => convert::run(args),
        Command::Crc(args) => crc::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Command text to decode. Reads stdin when omitted.
    pub words: Vec<String>,
    /// Bytes requested per read from stdin.
    #[arg(long, default_value = "1024")]
    pub chunk_size: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TargetEncoding {
    Binary,
    Human,
}

impl From<TargetEncoding> for Encoding {
    fn from(value: TargetEncoding) -> Self {
        match value {
            TargetEncoding::Binary => Encoding::Binary,
            TargetEncoding::Human => Encoding::Human,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Encoding written to stdout.
    #[arg(long, value_name = "ENCODING")]
    pub to: TargetEncoding,
    /// Stop at the first malformed frame instead of skipping it.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct CrcArgs {
    /// Input text (or hex digits with --hex).
    pub text: String,
    /// Interpret TEXT as hex-encoded bytes.
    #[arg(long)]
    pub hex: bool,
    /// Value XORed into the final checksum.
    #[arg(long, default_value = "0")]
    pub seed: u8,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
