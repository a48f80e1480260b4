use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::lines::NormalizedLines;

const HEADER_BYTE: u8 = b'>';

/// Added to the size ratio before flooring, so that the chunk estimate rounds up.
///
/// This is not a true ceiling: a ratio which lies within `1e-6` above an integer is rounded
/// down instead. Existing split outputs depend on this, so it is kept as is.
const SIZE_ROUNDING_EPSILON: f64 = 0.999_999;

const BYTES_PER_MB: f64 = 1_000_000.0;

/// How the user asked for the input to be divided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitBy {
    /// Aim for this many output files.
    Count(NonZeroUsize),
    /// Aim for output files of roughly this many megabytes (10^6 bytes).
    SizeMb(f64),
}

/// The number of records that go into each output file, fixed before any output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub records_per_chunk: usize,
}

impl ChunkPlan {
    /// Computes the plan for an input with `records` records which is `file_size` bytes long.
    ///
    /// Every chunk receives one record more than the plain quotient, so an uneven division
    /// never leaves a near-empty trailing file behind.
    pub fn new(split_by: SplitBy, records: usize, file_size: u64) -> Self {
        let quotient = match split_by {
            SplitBy::Count(n) => records / n.get(),
            SplitBy::SizeMb(mb) => records / estimated_chunks(file_size, mb),
        };

        Self {
            records_per_chunk: quotient + 1,
        }
    }

    /// The number of files a split of `records` records will produce under this plan.
    ///
    /// An input without any records still produces a single (empty) file.
    pub fn expected_chunks(&self, records: usize) -> usize {
        records.div_ceil(self.records_per_chunk).max(1)
    }
}

/// Estimates how many chunks of `chunk_mb` megabytes a file of `file_size` bytes is cut into.
///
/// Never less than one, even for an empty file.
pub fn estimated_chunks(file_size: u64, chunk_mb: f64) -> usize {
    let ratio = file_size as f64 / (chunk_mb * BYTES_PER_MB);
    let estimate = (SIZE_ROUNDING_EPSILON + ratio).floor() as usize;
    estimate.max(1)
}

/// Counts the records of a FASTA stream, i.e. the number of lines starting with `>`.
pub fn count_records<R: BufRead>(reader: R) -> std::io::Result<usize> {
    let mut lines = NormalizedLines::new(reader);
    let mut line = Vec::new();
    let mut count = 0;

    while lines.next_line(&mut line)? {
        if line.first() == Some(&HEADER_BYTE) {
            count += 1;
        }
    }

    Ok(count)
}

pub fn count_records_path(path: &Path) -> std::io::Result<usize> {
    let file = File::open(path)?;
    count_records(BufReader::new(file))
}

/// The location of the `index`th (1-based) chunk of `input`.
///
/// Without an output directory the chunk sits next to the input as `<input>_c<index>.fasta`;
/// otherwise it is placed in `outdir` using the file name of the input.
pub fn chunk_path(input: &Path, outdir: Option<&Path>, index: usize) -> PathBuf {
    let suffix = format!("_c{index}.fasta");

    match outdir {
        Some(dir) => {
            let mut name = input.file_name().unwrap_or(input.as_os_str()).to_owned();
            name.push(suffix);
            dir.join(name)
        }
        None => {
            let mut name = input.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        }
    }
}

/// A chunk file which has been written and closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenChunk {
    pub path: PathBuf,
    pub records: usize,
}

/// The chunk file currently being written to.
struct OutputChunk {
    path: PathBuf,
    writer: BufWriter<File>,
    records: usize,
}

impl OutputChunk {
    fn create(path: PathBuf) -> std::io::Result<Self> {
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\n")
    }

    /// Flushes and closes the file.
    fn finish(mut self) -> std::io::Result<WrittenChunk> {
        self.writer.flush()?;
        Ok(WrittenChunk {
            path: self.path,
            records: self.records,
        })
    }
}

/// Streams the records of `reader` into consecutive chunk files, placing at most
/// `plan.records_per_chunk` records in each.
///
/// `path_for` is given the 1-based index of each chunk and returns where it should be written.
/// The first chunk is created before anything is read, so an input without records still
/// produces one empty file. Only one chunk file is open at any time.
///
/// # Errors
///
/// Any failure reading the input or creating and writing a chunk aborts the split. Chunks which
/// were completed before the failure are left on disk.
pub fn split<R, F>(
    reader: R,
    plan: &ChunkPlan,
    mut path_for: F,
) -> std::io::Result<Vec<WrittenChunk>>
where
    R: BufRead,
    F: FnMut(usize) -> PathBuf,
{
    let mut written = Vec::new();
    let mut index = 1;
    let mut chunk = OutputChunk::create(path_for(index))?;
    debug!("Writing chunk {index} to {}", chunk.path.display());

    let mut lines = NormalizedLines::new(reader);
    let mut line = Vec::new();

    while lines.next_line(&mut line)? {
        if line.first() == Some(&HEADER_BYTE) {
            // this header starts a record over quota, so it opens the next chunk
            if chunk.records >= plan.records_per_chunk {
                written.push(chunk.finish()?);
                index += 1;
                chunk = OutputChunk::create(path_for(index))?;
                debug!("Writing chunk {index} to {}", chunk.path.display());
            }
            chunk.records += 1;
        }

        chunk.write_line(&line)?;
    }

    written.push(chunk.finish()?);
    Ok(written)
}

/// Splits the file at `input` according to `plan`. See [`split`] and [`chunk_path`].
///
/// When `outdir` is given it is created first if it does not exist yet.
pub fn split_path(
    input: &Path,
    outdir: Option<&Path>,
    plan: &ChunkPlan,
) -> std::io::Result<Vec<WrittenChunk>> {
    if let Some(dir) = outdir {
        create_dir_all(dir)?;
    }

    let file = File::open(input)?;
    split(BufReader::new(file), plan, |index| chunk_path(input, outdir, index))
}
