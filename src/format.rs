//! Content-based sniffing of sequence file formats.
//!
//! Only the first few non-empty lines of the input are inspected, which is enough to see a
//! header, the line following it, and (for FASTQ) the `+` separator. Three independent
//! candidates track the evidence for FASTA, QUAL and FASTQ; precedence between them is only
//! applied once scanning has finished.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::lines::NormalizedLines;

/// Maximum number of non-empty lines looked at before giving up.
const LINE_BUDGET: usize = 3;

/// FASTA and QUAL records share the same header syntax.
static DEFLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>").expect("valid regex"));

static FASTQ_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(\S+)").expect("valid regex"));

/// Nucleotide or amino-acid codes, including every IUPAC ambiguity letter (`N`, `X`, `B`, `J`,
/// `Z`, ...), the rare residues `U` and `O`, and gap and stop symbols. Groups of residues may be
/// separated by whitespace, as in GenBank-style blocks of ten.
static SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z.*-]+(?:\s+[A-Z.*-]+)*\s*$").expect("valid regex")
});

static QUALITY_SCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+").expect("valid regex"));

/// The `+` line, optionally repeating the read identifier and any description after it.
static FASTQ_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+(\S*)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fasta,
    Fastq,
    Qual,
    Unknown,
}

impl fmt::Display for SequenceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceFormat::Fasta => "fasta",
            SequenceFormat::Fastq => "fastq",
            SequenceFormat::Qual => "qual",
            SequenceFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Progress of a candidate whose records look like `header` followed by one body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeflineCandidate {
    Idle,
    Header,
    Confirmed,
}

impl DeflineCandidate {
    fn advance(self, line: &[u8], body: &Regex) -> Self {
        match self {
            DeflineCandidate::Confirmed => self,
            DeflineCandidate::Header if body.is_match(line) => DeflineCandidate::Confirmed,
            _ if DEFLINE.is_match(line) => DeflineCandidate::Header,
            _ => DeflineCandidate::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FastqCandidate {
    Idle,
    /// Holds the read identifier from the `@` line.
    Header(Vec<u8>),
    Sequence(Vec<u8>),
    Confirmed,
}

impl FastqCandidate {
    fn advance(self, line: &[u8]) -> Self {
        match self {
            FastqCandidate::Confirmed => return FastqCandidate::Confirmed,
            FastqCandidate::Header(id) if SEQUENCE.is_match(line) => {
                return FastqCandidate::Sequence(id)
            }
            FastqCandidate::Sequence(id) => {
                if let Some(caps) = FASTQ_SEPARATOR.captures(line) {
                    let repeated = &caps[1];
                    if repeated.is_empty() || repeated == id.as_slice() {
                        return FastqCandidate::Confirmed;
                    }
                }
            }
            _ => {}
        }

        match FASTQ_HEADER.captures(line) {
            Some(caps) => FastqCandidate::Header(caps[1].to_vec()),
            None => FastqCandidate::Idle,
        }
    }
}

/// The evidence gathered so far for each of the supported formats.
#[derive(Debug)]
struct Sniffer {
    fasta: DeflineCandidate,
    qual: DeflineCandidate,
    fastq: FastqCandidate,
}

impl Sniffer {
    fn new() -> Self {
        Self {
            fasta: DeflineCandidate::Idle,
            qual: DeflineCandidate::Idle,
            fastq: FastqCandidate::Idle,
        }
    }

    fn observe(&mut self, line: &[u8]) {
        self.fasta = self.fasta.advance(line, &SEQUENCE);
        self.qual = self.qual.advance(line, &QUALITY_SCORES);
        let fastq = std::mem::replace(&mut self.fastq, FastqCandidate::Idle);
        self.fastq = fastq.advance(line);
    }

    fn settled(&self) -> bool {
        self.finish() != SequenceFormat::Unknown
    }

    /// FASTA takes precedence over QUAL, which takes precedence over FASTQ.
    fn finish(&self) -> SequenceFormat {
        if self.fasta == DeflineCandidate::Confirmed {
            SequenceFormat::Fasta
        } else if self.qual == DeflineCandidate::Confirmed {
            SequenceFormat::Qual
        } else if self.fastq == FastqCandidate::Confirmed {
            SequenceFormat::Fastq
        } else {
            SequenceFormat::Unknown
        }
    }
}

/// Classifies the content of `reader` by looking at its first few non-empty lines.
///
/// # Errors
///
/// Only read failures are reported; input which matches no format is [`SequenceFormat::Unknown`].
pub fn detect<R: BufRead>(reader: R) -> std::io::Result<SequenceFormat> {
    let mut sniffer = Sniffer::new();

    for line in NormalizedLines::new(reader).take(LINE_BUDGET) {
        sniffer.observe(&line?);
        if sniffer.settled() {
            break;
        }
    }

    Ok(sniffer.finish())
}

/// Opens the file at `path` and sniffs its format. See [`detect`].
pub fn detect_path(path: &Path) -> std::io::Result<SequenceFormat> {
    let file = File::open(path)?;
    detect(BufReader::new(file))
}
