use std::path::PathBuf;

use anyhow::Result;
use thiserror::Error;

use crate::config::Config;
use crate::convert::Outcome;

pub const USAGE: &str = "Usage: icon-converter <input-image> <output.ico>";

const STATUS_OK: u8 = 0;
const STATUS_FAILED: u8 = 1;
const STATUS_USAGE: u8 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("No input file specified")]
    NoInput,
    #[error("No output file specified")]
    NoOutput,
    #[error("Unexpected extra arguments: {0}")]
    Extra(String),
}

/// Splits the arguments after the program name into input and output paths.
pub fn parse_args(args: &[String]) -> Result<(PathBuf, PathBuf), UsageError> {
    match args {
        [] => Err(UsageError::NoInput),
        [_] => Err(UsageError::NoOutput),
        [input, output] => Ok((PathBuf::from(input), PathBuf::from(output))),
        [_, _, rest @ ..] => Err(UsageError::Extra(rest.join(" "))),
    }
}

/// Status for bad arguments or a missing input file.
pub fn usage_status(config: &Config) -> u8 {
    if config.strict_exit_codes {
        STATUS_USAGE
    } else {
        STATUS_OK
    }
}

/// Logs the result of a conversion and picks the process exit status.
pub fn report(result: &Result<Outcome>, config: &Config) -> u8 {
    match result {
        Ok(Outcome::Written { path, bytes }) => {
            tracing::info!("Wrote {} ({} bytes)", path.display(), bytes);
            STATUS_OK
        }
        Ok(Outcome::MissingInput(path)) => {
            tracing::warn!("Input file {} does not exist", path.display());
            usage_status(config)
        }
        Err(e) => {
            tracing::error!("Conversion failed: {:#}", e);
            STATUS_FAILED
        }
    }
}
