use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use thiserror::Error;

use crate::format::SequenceFormat;
use crate::split::SplitBy;

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
✂️ fastasplit version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   split a FASTA file into chunks of whole records";

const MANUAL: &str = indoc::indoc! {"
    DESCRIPTION
      Splits a FASTA file into several smaller files without ever cutting a record in half.
      The input is checked to really be FASTA (not FASTQ or QUAL) before anything is written.

      Line endings are normalized on the way through: \\r\\n and lone \\r become \\n, and
      blank lines are dropped. Apart from that, joining the chunks in order gives back the
      input.

    OUTPUT
      Chunk k (starting at 1) of INPUT is written to `INPUT_c<k>.fasta`, or to
      `OUTDIR/<file name of INPUT>_c<k>.fasta` when --outdir is given.

    CHUNK SIZES
      With -n N, every chunk holds floor(R / N) + 1 records, where R is the number of records
      in the input. The last chunk holds whatever is left, so fewer than N files may be made.

      With -s MB, the number of chunks is first estimated as floor(0.999999 + bytes / (MB *
      10^6)) and then used in place of N. This mostly rounds up, but a file only just above a
      whole multiple of the chunk size is rounded down.

    NOTES
      Interrupting a split may leave a partially written last chunk behind.
"};

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser, Debug)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    after_long_help = MANUAL,
    arg_required_else_help = true,
    styles = STYLES
)]
pub struct Cli {
    /// the input .fasta file
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// approximate size of each chunk, in megabytes
    #[arg(short, long, value_name = "MB", allow_negative_numbers = true)]
    pub size: Option<f64>,

    /// number of chunks to split the input into
    #[arg(short, long, value_name = "N")]
    pub number: Option<usize>,

    /// directory to write the chunks to, instead of next to the input
    #[arg(short, long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// report progress on stderr
    #[arg(short, long, action)]
    pub verbose: bool,

    /// print the full manual
    #[arg(long, action = ArgAction::HelpLong)]
    pub man: Option<bool>,
}

/// A request to split one input file, checked for consistency.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRequest {
    pub input: PathBuf,
    pub split_by: SplitBy,
    pub outdir: Option<PathBuf>,
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// A flag was missing, unknown or had a value of the wrong type.
    #[error("{0}")]
    Usage(String),

    #[error("only one of -s (chunk size) and -n (number of chunks) may be given")]
    BothSelectors,

    #[error("one of -s (chunk size in MB) or -n (number of chunks) is required")]
    NoSelector,

    #[error("chunk size must be a positive number of megabytes, got {0}")]
    InvalidSize(f64),

    #[error("number of chunks must be a positive integer, got {0}")]
    InvalidCount(usize),

    #[error("input file `{}` does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("input file `{}` is in {detected} format, only fasta can be split", .path.display())]
    NotFasta {
        path: PathBuf,
        detected: SequenceFormat,
    },
}

impl Cli {
    /// Parses the arguments of this process.
    ///
    /// Help, manual and version requests are printed here and end the process. Every other
    /// parse failure is handed back as a [`ValidationError`] so it is reported like the rest.
    pub fn parse_args() -> Result<Self, ValidationError> {
        Self::try_parse().map_err(usage_error)
    }
}

fn usage_error(err: clap::Error) -> ValidationError {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => err.exit(),
        _ => {
            // keep clap's message, but not its `error:` prefix or the usage hint
            let rendered = err.to_string();
            let message = rendered.split("\n\n").next().unwrap_or_default();
            let message = message.strip_prefix("error: ").unwrap_or(message);
            ValidationError::Usage(message.trim_end().to_string())
        }
    }
}

impl TryFrom<&Cli> for SplitRequest {
    type Error = ValidationError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let split_by = match (cli.size, cli.number) {
            (Some(_), Some(_)) => return Err(ValidationError::BothSelectors),
            (None, None) => return Err(ValidationError::NoSelector),
            (Some(mb), None) => {
                if !(mb.is_finite() && mb > 0.0) {
                    return Err(ValidationError::InvalidSize(mb));
                }
                SplitBy::SizeMb(mb)
            }
            (None, Some(n)) => match NonZeroUsize::new(n) {
                Some(n) => SplitBy::Count(n),
                None => return Err(ValidationError::InvalidCount(n)),
            },
        };

        if !cli.input.is_file() {
            return Err(ValidationError::MissingInput(cli.input.clone()));
        }

        Ok(SplitRequest {
            input: cli.input.clone(),
            split_by,
            outdir: cli.outdir.clone(),
        })
    }
}
