//! Open DAF kernel files and read them through a scoped cursor.
//!
//! [`DafFile`] owns the OS file handle, the parsed [`DafFileRecord`], the
//! detected byte order and a [`DafState`] cursor. The cursor is the only
//! mutable piece: it tracks the forward/backward summary-record pointers and
//! buffers the record read last. A `DafFile` is owned exclusively by the
//! subsystem that opened it and is never shared; the OS handle is released on
//! drop on every exit path, so a forgotten close cannot corrupt subsequent
//! opens of the same path.
//!
//! Word-level reads honor the byte order declared by the file's binary
//! format tag (`"LTL-IEEE"` / `"BIG-IEEE"`).

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicI32, Ordering};

use camino::Utf8Path;
use nom::number::Endianness;

use crate::constants::{FileHandle, RECORD_SIZE_BYTES, WORD_SIZE_BYTES};
use crate::daf::address::address_to_byte_offset;
use crate::daf::file_record::{DafFileRecord, KernelFileInfo};
use crate::errors::SpiceError;

/// Control area of a summary record: `next`, `prev`, `nsum` as doubles.
const SUMMARY_CONTROL_WORDS: usize = 3;

// Handles only need to be unique within the process.
static NEXT_HANDLE: AtomicI32 = AtomicI32::new(1);

/// Read cursor over an open DAF file.
///
/// Structural equality over all fields makes cursor progress diffable in
/// tests. The state is file-handle-scoped, not process-global; it is mutated
/// in place by the owning [`DafFile`] through the setters below.
#[derive(Debug, Clone, PartialEq)]
pub struct DafState {
    handle: FileHandle,
    fward: i32,
    bward: i32,
    /// Record number currently held in `record`; 0 when nothing is buffered.
    record_no: i64,
    record: [u8; RECORD_SIZE_BYTES as usize],
}

impl DafState {
    pub fn new(handle: FileHandle, fward: i32, bward: i32) -> Self {
        DafState {
            handle,
            fward,
            bward,
            record_no: 0,
            record: [0u8; RECORD_SIZE_BYTES as usize],
        }
    }

    pub fn handle(&self) -> FileHandle {
        self.handle
    }

    pub fn fward(&self) -> i32 {
        self.fward
    }

    pub fn bward(&self) -> i32 {
        self.bward
    }

    pub fn record_no(&self) -> i64 {
        self.record_no
    }

    pub fn record(&self) -> &[u8; RECORD_SIZE_BYTES as usize] {
        &self.record
    }

    pub fn set_handle(&mut self, handle: FileHandle) {
        self.handle = handle;
    }

    pub fn set_fward(&mut self, fward: i32) {
        self.fward = fward;
    }

    pub fn set_bward(&mut self, bward: i32) {
        self.bward = bward;
    }

    pub fn set_record(&mut self, record_no: i64, record: [u8; RECORD_SIZE_BYTES as usize]) {
        self.record_no = record_no;
        self.record = record;
    }
}

/// An open DAF kernel file: identification, layout metadata and read cursor.
#[derive(Debug)]
pub struct DafFile {
    reader: BufReader<File>,
    info: KernelFileInfo,
    file_record: DafFileRecord,
    endianness: Endianness,
    state: DafState,
}

impl DafFile {
    /// Open a DAF kernel file and position a fresh cursor on it.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Filesystem location of the kernel.
    ///
    /// Return
    /// ----------
    /// * The open [`DafFile`], or [`SpiceError::UnknownArchitecture`] when
    ///   the id word or binary format tag does not describe a readable DAF
    ///   (this is the "first real read" where an unknown architecture turns
    ///   fatal). I/O failures are propagated as-is.
    pub fn open(path: &Utf8Path) -> Result<Self, SpiceError> {
        let info = KernelFileInfo::from_path(path)?;
        if info.architecture() != "DAF" {
            return Err(SpiceError::UnknownArchitecture(path.to_string()));
        }

        let mut reader = BufReader::new(File::open(path)?);
        let mut first_record = [0u8; RECORD_SIZE_BYTES as usize];
        reader.read_exact(&mut first_record)?;

        let endianness = DafFileRecord::detect_endianness(&first_record)
            .ok_or_else(|| SpiceError::UnknownArchitecture(path.to_string()))?;
        let (_, file_record) = DafFileRecord::parse(&first_record, endianness)?;

        let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        let state = DafState::new(handle, file_record.fward, file_record.bward);

        Ok(DafFile {
            reader,
            info,
            file_record,
            endianness,
            state,
        })
    }

    pub fn info(&self) -> &KernelFileInfo {
        &self.info
    }

    pub fn file_record(&self) -> &DafFileRecord {
        &self.file_record
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn state(&self) -> &DafState {
        &self.state
    }

    pub fn handle(&self) -> FileHandle {
        self.state.handle()
    }

    /// Release the file handle. Dropping the value has the same effect; this
    /// exists so call sites can make the release point explicit.
    pub fn close(self) {}

    /// Read record `record_no` (1-based) into the cursor buffer.
    pub fn read_record(
        &mut self,
        record_no: i64,
    ) -> Result<&[u8; RECORD_SIZE_BYTES as usize], SpiceError> {
        if record_no <= 0 {
            return Err(SpiceError::InvalidArgument(format!(
                "record number must be positive, got {record_no}"
            )));
        }
        if self.state.record_no() != record_no {
            let mut buffer = [0u8; RECORD_SIZE_BYTES as usize];
            self.reader
                .seek(SeekFrom::Start((record_no as u64 - 1) * RECORD_SIZE_BYTES))?;
            self.reader.read_exact(&mut buffer)?;
            self.state.set_record(record_no, buffer);
        }
        Ok(self.state.record())
    }

    /// Read `count` contiguous DP-words starting at a 1-based DAF address.
    ///
    /// The words are decoded with the file's byte order.
    pub fn read_words(&mut self, address: i64, count: usize) -> Result<Vec<f64>, SpiceError> {
        let offset = address_to_byte_offset(address)?;
        let mut buffer = vec![0u8; count * WORD_SIZE_BYTES as usize];
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(&mut buffer)?;

        Ok(buffer
            .chunks_exact(WORD_SIZE_BYTES as usize)
            .map(|chunk| decode_word(chunk, self.endianness))
            .collect())
    }

    /// Collect the raw packed summaries of every segment in the file.
    ///
    /// Walks the doubly-linked summary directory from the forward pointer,
    /// following each record's `next` control word, and slices out `nsum`
    /// packed summaries of `ND + ceil(NI / 2)` words per record.
    pub fn summary_blocks(&mut self) -> Result<Vec<Vec<u8>>, SpiceError> {
        let summary_bytes = self.file_record.summary_word_count() * WORD_SIZE_BYTES as usize;
        let endianness = self.endianness;

        let mut blocks = Vec::new();
        let mut record_no = self.state.fward() as i64;
        while record_no > 0 {
            let record = *self.read_record(record_no)?;

            let next = decode_word(&record[0..8], endianness);
            let nsum = decode_word(&record[16..24], endianness) as usize;

            let control_bytes = SUMMARY_CONTROL_WORDS * WORD_SIZE_BYTES as usize;
            for i in 0..nsum {
                let start = control_bytes + i * summary_bytes;
                let end = start + summary_bytes;
                if end > record.len() {
                    return Err(SpiceError::NomParsingError(format!(
                        "summary record {record_no} declares {nsum} summaries but overflows"
                    )));
                }
                blocks.push(record[start..end].to_vec());
            }

            record_no = next as i64;
        }
        Ok(blocks)
    }
}

fn decode_word(bytes: &[u8], endianness: Endianness) -> f64 {
    let raw: [u8; 8] = bytes.try_into().expect("word slice is 8 bytes");
    match endianness {
        Endianness::Big => f64::from_be_bytes(raw),
        _ => f64::from_le_bytes(raw),
    }
}

#[cfg(test)]
mod test_daf_state {
    use super::*;

    #[test]
    fn test_state_equality_tracks_cursor_progress() {
        let mut a = DafState::new(1, 2, 2);
        let b = DafState::new(1, 2, 2);
        assert_eq!(a, b);

        a.set_record(2, [1u8; RECORD_SIZE_BYTES as usize]);
        assert_ne!(a, b);

        a.set_record(0, [0u8; RECORD_SIZE_BYTES as usize]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_state_setters() {
        let mut state = DafState::new(7, 62, 62);
        state.set_handle(9);
        state.set_fward(63);
        state.set_bward(64);
        assert_eq!(state.handle(), 9);
        assert_eq!(state.fward(), 63);
        assert_eq!(state.bward(), 64);
    }
}
