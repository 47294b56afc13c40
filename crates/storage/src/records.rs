//! `records.dat`: a zstd stream of length-prefixed MessagePack records.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::collection::Record;
use crate::error::StorageError;

pub const RECORDS_FILE: &str = "records.dat";
const ZSTD_LEVEL: i32 = 3;

/// Sizes reported once a record file is complete.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordFileStats {
    pub record_count: usize,
    pub raw_bytes: u64,
    pub size_bytes: u64,
}

/// Writes a complete record file next to its final location, then renames it
/// into place so readers never observe a half-written file.
pub struct RecordWriter {
    final_path: PathBuf,
    tmp_path: PathBuf,
    encoder: zstd::Encoder<'static, std::io::BufWriter<fs::File>>,
    raw_bytes: u64,
    record_count: usize,
}

impl RecordWriter {
    pub fn create(dir: &Path) -> Result<Self, StorageError> {
        let final_path = dir.join(RECORDS_FILE);
        let tmp_path = dir.join(format!("{RECORDS_FILE}.tmp"));

        let file = fs::File::create(&tmp_path)?;
        let encoder = zstd::Encoder::new(std::io::BufWriter::new(file), ZSTD_LEVEL)?;

        Ok(Self {
            final_path,
            tmp_path,
            encoder,
            raw_bytes: 0,
            record_count: 0,
        })
    }

    pub fn append(&mut self, record: &Record) -> Result<(), StorageError> {
        let encoded = rmp_serde::to_vec(record).map_err(|e| StorageError::Serialize(e.to_string()))?;
        let len = u32::try_from(encoded.len())
            .map_err(|_| StorageError::Serialize(format!("record {} too large", record.id)))?;

        self.encoder.write_all(&len.to_le_bytes())?;
        self.encoder.write_all(&encoded)?;

        self.raw_bytes += 4 + encoded.len() as u64;
        self.record_count += 1;
        Ok(())
    }

    /// Finish the zstd stream and move the file into place.
    pub fn finish(self) -> Result<RecordFileStats, StorageError> {
        let buf_writer = self.encoder.finish()?;
        let file = buf_writer.into_inner().map_err(|e| StorageError::Io(e.into_error()))?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.tmp_path, &self.final_path)?;
        let size_bytes = fs::metadata(&self.final_path).map(|m| m.len()).unwrap_or(0);

        Ok(RecordFileStats {
            record_count: self.record_count,
            raw_bytes: self.raw_bytes,
            size_bytes,
        })
    }
}

/// Reads every record of a collection. A missing file reads as empty.
pub fn read_records(dir: &Path) -> Result<Vec<Record>, StorageError> {
    let path = dir.join(RECORDS_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = fs::File::open(&path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    // Safety: the file is only replaced by rename, never modified in place.
    let mmap = unsafe { Mmap::map(&file)? };
    let data = zstd::decode_all(mmap.as_ref())?;

    RecordIter { data: &data, pos: 0 }.collect()
}

struct RecordIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Iterator for RecordIter<'_> {
    type Item = Result<Record, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }

        let Some(header) = self.data.get(self.pos..self.pos + 4) else {
            self.pos = self.data.len();
            return Some(Err(StorageError::Corrupt("truncated length prefix".into())));
        };
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let start = self.pos + 4;

        let Some(body) = self.data.get(start..start + len) else {
            self.pos = self.data.len();
            return Some(Err(StorageError::Corrupt(format!(
                "record at offset {} runs past end of file",
                self.pos
            ))));
        };

        self.pos = start + len;
        Some(rmp_serde::from_slice(body).map_err(|e| StorageError::Serialize(e.to_string())))
    }
}
