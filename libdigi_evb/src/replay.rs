use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use super::error::ReplayError;
use super::fragment::DppPayload;

const MIN_ENTRIES_PER_LINE: usize = 4; // board, channel, coarse tag, energy
const MAX_ENTRIES_PER_LINE: usize = 5; // + short gate energy
const COMMENT: char = '#';

/// One list-mode record: a decoded trigger as it came off a digitizer input
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayRecord {
    pub board: usize,
    pub channel: usize,
    pub coarse_tag: u64,
    pub payload: DppPayload,
}

impl ReplayRecord {
    /// Parse a single line. Returns `Ok(None)` for blank and comment lines.
    pub fn parse(line: &str, line_number: usize) -> Result<Option<Self>, ReplayError> {
        let content = match line.split_once(COMMENT) {
            Some((before, _)) => before,
            None => line,
        };
        let entries: Vec<&str> = content.split_whitespace().collect();
        if entries.is_empty() {
            return Ok(None);
        }
        if entries.len() < MIN_ENTRIES_PER_LINE || entries.len() > MAX_ENTRIES_PER_LINE {
            return Err(ReplayError::BadLine(line_number, line.trim_end().to_string()));
        }

        let parse_err = |e: std::num::ParseIntError| ReplayError::ParsingError(line_number, e);
        let board: usize = entries[0].parse().map_err(parse_err)?;
        let channel: usize = entries[1].parse().map_err(parse_err)?;
        let coarse_tag: u64 = entries[2].parse().map_err(parse_err)?;
        let energy: u16 = entries[3].parse().map_err(parse_err)?;
        let payload = if entries.len() == MAX_ENTRIES_PER_LINE {
            DppPayload::from_charges(energy, entries[4].parse().map_err(parse_err)?)
        } else {
            DppPayload {
                energy,
                ..Default::default()
            }
        };

        Ok(Some(ReplayRecord {
            board,
            channel,
            coarse_tag,
            payload,
        }))
    }
}

/// ReplayFile reads list-mode records back for offline event building.
///
/// The format is plain text, one record per line:
///
/// ```text
/// # board channel coarse_tag energy [energy_short]
/// 0 0 1000 1520 1200
/// 0 3 1012 880
/// ```
///
/// Anything after a `#` is a comment. Coarse tags are the raw hardware counters and may
/// roll over; the readout widens them.
pub struct ReplayFile {
    reader: Box<dyn BufRead + Send>,
    line_number: usize,
    bytes_read: u64,
    total_size_bytes: u64,
    line: String,
}

impl std::fmt::Debug for ReplayFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayFile")
            .field("line_number", &self.line_number)
            .field("bytes_read", &self.bytes_read)
            .field("total_size_bytes", &self.total_size_bytes)
            .finish()
    }
}

impl ReplayFile {
    /// Open a replay file on disk
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        if !path.exists() {
            return Err(ReplayError::BadFilePath(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let total_size_bytes = file.metadata()?.len();
        let mut replay = Self::from_reader(file);
        replay.total_size_bytes = total_size_bytes;
        Ok(replay)
    }

    /// Read records from any source. The total size is unknown (zero).
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        ReplayFile {
            reader: Box::new(BufReader::new(reader)),
            line_number: 0,
            bytes_read: 0,
            total_size_bytes: 0,
            line: String::new(),
        }
    }

    pub fn get_total_data_size(&self) -> u64 {
        self.total_size_bytes
    }

    pub fn get_bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Fraction of the file consumed so far, 0 if the size is unknown
    pub fn get_progress(&self) -> f32 {
        if self.total_size_bytes == 0 {
            0.0
        } else {
            self.bytes_read as f32 / self.total_size_bytes as f32
        }
    }

    /// Get the next record in the file
    ///
    /// Returns a `Result<Option<ReplayRecord>>`. The Option is None at end of file.
    pub fn get_next_record(&mut self) -> Result<Option<ReplayRecord>, ReplayError> {
        loop {
            self.line.clear();
            let n = self.reader.read_line(&mut self.line)?;
            if n == 0 {
                return Ok(None);
            }
            self.bytes_read += n as u64;
            self.line_number += 1;
            if let Some(record) = ReplayRecord::parse(&self.line, self.line_number)? {
                return Ok(Some(record));
            }
        }
    }
}

impl Iterator for ReplayFile {
    type Item = Result<ReplayRecord, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_next_record().transpose()
    }
}
