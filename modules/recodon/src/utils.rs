//! File helpers shared by the pipeline stages
//!
//! FASTA input is memory-mapped and split on line-leading `>` with memchr; records keep
//! their input order because short ids are assigned by position. Output
//! files are always buffered.

use hashbrown::{HashMap, HashSet};
use memchr::memchr;
use memmap2::Mmap;
use smol_str::SmolStr;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::from_utf8;

use crate::consts::{FASTA_LINE_WIDTH, MAP_SEPARATOR};
use crate::error::{RecodonError, Result};

/// One FASTA entry, header without the leading `>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: SmolStr,
    pub seq: Vec<u8>,
}

/// Fails with `MissingInput` unless `path` is an existing file
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(RecodonError::MissingInput(path.to_path_buf()))
    }
}

/// Parses a FASTA file.
///
/// # Arguments
///
/// * `path` - The path to the FASTA file.
///
/// # Returns
///
/// The records in file order, sequence lines concatenated with line breaks
/// removed. A header seen twice is a `DuplicateHeader` error.
///
/// # Example
///
/// ```rust, ignore
/// let records = parse_fa(Path::new("cdna.fa"))?;
/// for record in &records {
///     println!("{} {}", record.header, record.seq.len());
/// }
/// ```
pub fn parse_fa(path: &Path) -> Result<Vec<FastaRecord>> {
    let file = File::open(path).map_err(RecodonError::io(path))?;
    let len = file.metadata().map_err(RecodonError::io(path))?.len();
    if len == 0 {
        return Ok(Vec::new());
    }

    // INFO: the file is only read while mapped
    let mmap = unsafe { Mmap::map(&file) }.map_err(RecodonError::io(path))?;
    let data = mmap.as_ref();

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut pos = 0;

    while let Some(start) = record_start(data, pos) {
        let end = record_start(data, start + 1).unwrap_or(data.len());
        let entry = &data[start + 1..end];
        let header_end = memchr(b'\n', entry).unwrap_or(entry.len());

        let header = from_utf8(&entry[..header_end])
            .map_err(|_| RecodonError::MalformedField {
                field: "FASTA header".to_string(),
                value: String::from_utf8_lossy(&entry[..header_end]).into_owned(),
                record: path.display().to_string(),
            })?
            .trim();

        if !seen.insert(SmolStr::new(header)) {
            return Err(RecodonError::DuplicateHeader {
                header: header.to_string(),
                path: path.to_path_buf(),
            });
        }

        let seq = entry[header_end..]
            .iter()
            .filter(|&&b| !b.is_ascii_whitespace())
            .copied()
            .collect::<Vec<u8>>();

        records.push(FastaRecord {
            header: SmolStr::new(header),
            seq,
        });
        pos = end;
    }

    Ok(records)
}

/// Offset of the next `>` that opens a line, searching from `from`
fn record_start(data: &[u8], mut from: usize) -> Option<usize> {
    while let Some(hit) = memchr(b'>', &data[from..]) {
        let at = from + hit;
        if at == 0 || data[at - 1] == b'\n' {
            return Some(at);
        }
        from = at + 1;
    }
    None
}

/// Creates (or truncates) a buffered output file
pub fn create_file(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(RecodonError::io(path))
}

/// Writes one FASTA record, sequence wrapped at 80 columns
pub fn write_fasta<W: Write>(writer: &mut W, header: &str, seq: &[u8]) -> std::io::Result<()> {
    writeln!(writer, ">{header}")?;
    for line in seq.chunks(FASTA_LINE_WIDTH) {
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Writes one `<original>;<short>` line of the header map
pub fn write_header_map<W: Write>(writer: &mut W, original: &str, short: &str) -> std::io::Result<()> {
    writeln!(writer, "{original}{MAP_SEPARATOR}{short}")
}

/// Reads the header map into `short id -> original header`.
///
/// Original headers may contain `;` themselves, so every line is split on
/// its last separator.
pub fn read_header_map(path: &Path) -> Result<HashMap<SmolStr, SmolStr>> {
    let file = File::open(path).map_err(RecodonError::io(path))?;
    let mut map = HashMap::new();

    for line in BufReader::new(file).lines() {
        let line = line.map_err(RecodonError::io(path))?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let (original, short) =
            line.rsplit_once(MAP_SEPARATOR)
                .ok_or_else(|| RecodonError::MalformedField {
                    field: "header map line".to_string(),
                    value: line.to_string(),
                    record: path.display().to_string(),
                })?;

        map.insert(SmolStr::new(short), SmolStr::new(original));
    }

    Ok(map)
}
