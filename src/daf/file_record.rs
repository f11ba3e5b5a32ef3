//! DAF file record parsing and kernel architecture detection.
//!
//! The first 1024-byte record of a DAF container holds the structural
//! metadata of the whole file:
//!
//! * **`id_word`**: eight ASCII bytes identifying architecture and type
//!   (e.g. `"DAF/SPK "`). This is the only field consulted to classify a
//!   kernel; unrecognized or corrupted id words classify as `("?", "?")`
//!   rather than failing, so the caller decides whether an unknown
//!   architecture is fatal at the point of first real read.
//! * **`nd`** / **`ni`**: number of double-precision / integer components in
//!   each segment summary (`nd = 2`, `ni = 6` for SPK).
//! * **`fward`** / **`bward`**: record numbers (1-based) of the first and
//!   last summary record, forming the doubly-linked summary directory.
//! * **`free`**: first free DAF address in the file heap.
//! * **`binary_format`**: platform tag (`"LTL-IEEE"` / `"BIG-IEEE"`) telling
//!   how numeric data are encoded *inside the file*. The tag is read first
//!   and every subsequent numeric decode dispatches on it.
//!
//! The remaining reserved bytes and the FTP integrity sentinel are kept as
//! opaque strings.

use std::fmt;
use std::fs::File;
use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use nom::{
    bytes::complete::take,
    number::{complete::i32 as nom_i32, Endianness},
    IResult, Parser,
};

use crate::constants::RECORD_SIZE_BYTES;
use crate::errors::SpiceError;

/// Byte offset of the binary-format tag within the file record.
const BINARY_FORMAT_OFFSET: usize = 88;

/// Classify a kernel file from its leading id word.
///
/// The match is exact (after trimming trailing blanks); anything outside the
/// known table yields the `("?", "?")` sentinel pair.
pub fn identify_architecture(id_word: &str) -> (&'static str, &'static str) {
    match id_word.trim_end() {
        "DAF/SPK" => ("DAF", "SPK"),
        "DAF/PCK" => ("DAF", "PCK"),
        "DAF/CK" => ("DAF", "CK"),
        "DAF/EK" => ("DAF", "EK"),
        "DAS/EK" => ("DAS", "EK"),
        // Pre-N0043 DAF files carry no type in the id word.
        "NAIF/DAF" => ("DAF", "?"),
        "KPL/SCLK" => ("KPL", "SCLK"),
        "KPL/LSK" => ("KPL", "LSK"),
        "KPL/PCK" => ("KPL", "PCK"),
        "KPL/FK" => ("KPL", "FK"),
        "KPL/IK" => ("KPL", "IK"),
        "KPL/MK" => ("KPL", "MK"),
        _ => ("?", "?"),
    }
}

/// In-memory representation of the DAF file record (first 1024-byte record).
///
/// Fields mirror the canonical NAIF layout, trimmed of trailing padding where
/// applicable (`id_word`, `internal_filename`, `binary_format`).
#[derive(Debug, PartialEq, Clone)]
pub struct DafFileRecord {
    /// 8-byte identifier, typically `"DAF/SPK"`.
    pub id_word: String,
    /// 60-byte, padded internal kernel name.
    pub internal_filename: String,
    /// Number of double-precision components in each summary (ND).
    pub nd: i32,
    /// Number of integer components in each summary (NI).
    pub ni: i32,
    /// Record index of the first summary record (forward pointer).
    pub fward: i32,
    /// Record index of the last summary record (backward pointer).
    pub bward: i32,
    /// First free address (in double-precision words, 1-based).
    pub free: i32,
    /// Platform tag describing numeric representation (e.g. `"LTL-IEEE"`).
    pub binary_format: String,
    /// NAIF FTP sentinel string.
    pub ftp_sentinel: String,
}

impl DafFileRecord {
    /// Read the binary-format tag and map it to a byte order.
    ///
    /// Arguments
    /// -----------------
    /// * `record`: The first file record, at least 96 bytes long.
    ///
    /// Return
    /// ----------
    /// * `Some(Endianness)` for the two known tags, `None` otherwise (corrupt
    ///   or non-DAF content).
    pub fn detect_endianness(record: &[u8]) -> Option<Endianness> {
        let tag = record.get(BINARY_FORMAT_OFFSET..BINARY_FORMAT_OFFSET + 8)?;
        match String::from_utf8_lossy(tag).trim_end() {
            "LTL-IEEE" => Some(Endianness::Little),
            "BIG-IEEE" => Some(Endianness::Big),
            _ => None,
        }
    }

    /// Parse the first 1024-byte DAF record into a [`DafFileRecord`].
    ///
    /// Arguments
    /// -----------------
    /// * `input`: A byte slice starting at the beginning of the file, at
    ///   least 1024 bytes long.
    /// * `endianness`: Byte order of the file's integers, as reported by
    ///   [`DafFileRecord::detect_endianness`].
    ///
    /// Return
    /// ----------
    /// * An [`IResult`] whose value is `(remaining, record)`; all string
    ///   fields are trimmed of trailing padding.
    pub fn parse(input: &[u8], endianness: Endianness) -> IResult<&[u8], Self> {
        let (input, id_word) = take(8usize).parse(input)?;
        let (input, nd) = nom_i32(endianness).parse(input)?;
        let (input, ni) = nom_i32(endianness).parse(input)?;
        let (input, ifname) = take(60usize).parse(input)?;
        let (input, fward) = nom_i32(endianness).parse(input)?;
        let (input, bward) = nom_i32(endianness).parse(input)?;
        let (input, free) = nom_i32(endianness).parse(input)?;
        let (input, binary_format) = take(8usize).parse(input)?;
        let (input, _) = take(603usize).parse(input)?; // reserved
        let (input, ftp_sentinel) = take(28usize).parse(input)?;
        Ok((
            input,
            DafFileRecord {
                id_word: String::from_utf8_lossy(id_word).trim_end().to_string(),
                internal_filename: String::from_utf8_lossy(ifname).trim_end().to_string(),
                nd,
                ni,
                fward,
                bward,
                free,
                binary_format: String::from_utf8_lossy(binary_format).trim_end().to_string(),
                ftp_sentinel: String::from_utf8_lossy(ftp_sentinel).to_string(),
            },
        ))
    }

    /// Width of one packed segment summary in DP-words: `ND + ceil(NI / 2)`.
    pub fn summary_word_count(&self) -> usize {
        self.nd as usize + (self.ni as usize).div_ceil(2)
    }
}

impl fmt::Display for DafFileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LABEL_WIDTH: usize = 18;
        const VALUE_WIDTH: usize = 50;

        let border = format!(
            "+{:-<label$}+{:-<value$}+",
            "",
            "",
            label = LABEL_WIDTH + 1,
            value = VALUE_WIDTH + 1
        );

        let fields = [
            ("ID Word", format!("{} (Format ID)", self.id_word)),
            ("Internal Name", self.internal_filename.clone()),
            ("ND (doubles)", format!("{} summary components", self.nd)),
            ("NI (integers)", format!("{} summary components", self.ni)),
            ("Forward Ptr", format!("First summary record: {}", self.fward)),
            ("Backward Ptr", format!("Last summary record: {}", self.bward)),
            ("Free Addr", format!("Next free address: {}", self.free)),
            ("Binary Format", self.binary_format.clone()),
        ];

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "DAF File Record",
            "",
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(f, "{border}")?;
        for (label, value) in fields {
            writeln!(
                f,
                "| {:<label$}| {:<value$}|",
                label,
                value,
                label = LABEL_WIDTH,
                value = VALUE_WIDTH
            )?;
        }
        writeln!(f, "{border}")
    }
}

/// Identification card of an opened kernel file.
///
/// Built once per open and immutable thereafter. The architecture/type pair
/// comes from [`identify_architecture`]; `record_count` is the file length in
/// 1024-byte records (rounded up) and `summary_word_count` is the packed
/// summary width derived from `ND`/`NI` (0 when the file is not a readable
/// DAF).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KernelFileInfo {
    path: Utf8PathBuf,
    architecture: String,
    file_type: String,
    record_count: u64,
    summary_word_count: u64,
}

impl KernelFileInfo {
    /// Build a [`KernelFileInfo`] from already-detected fields.
    ///
    /// Return
    /// ----------
    /// * The info record, or [`SpiceError::InvalidArgument`] if `path` or
    ///   `file_type` is empty. The `"?"` sentinel is a valid (non-empty)
    ///   type.
    pub fn new(
        path: impl Into<Utf8PathBuf>,
        architecture: impl Into<String>,
        file_type: impl Into<String>,
        record_count: u64,
        summary_word_count: u64,
    ) -> Result<Self, SpiceError> {
        let path = path.into();
        let architecture = architecture.into();
        let file_type = file_type.into();
        if path.as_str().is_empty() {
            return Err(SpiceError::InvalidArgument(
                "kernel file path must not be empty".into(),
            ));
        }
        if file_type.is_empty() {
            return Err(SpiceError::InvalidArgument(
                "kernel file type must not be empty".into(),
            ));
        }
        Ok(KernelFileInfo {
            path,
            architecture,
            file_type,
            record_count,
            summary_word_count,
        })
    }

    /// Open `path`, read its id word and classify the file.
    ///
    /// This never fails on unknown content: a text file mistakenly opened
    /// here yields `architecture = "?"`, `file_type = "?"`. Only genuine I/O
    /// failures are propagated.
    pub fn from_path(path: &Utf8Path) -> Result<Self, SpiceError> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();

        let mut record = [0u8; RECORD_SIZE_BYTES as usize];
        let read = file.read(&mut record)?;

        let (architecture, file_type) = if read >= 8 {
            identify_architecture(&String::from_utf8_lossy(&record[..8]))
        } else {
            ("?", "?")
        };

        let summary_word_count = if architecture == "DAF" && read == record.len() {
            match DafFileRecord::detect_endianness(&record) {
                Some(endianness) => DafFileRecord::parse(&record, endianness)
                    .map(|(_, rec)| rec.summary_word_count() as u64)
                    .unwrap_or(0),
                None => 0,
            }
        } else {
            0
        };

        KernelFileInfo::new(
            path,
            architecture,
            file_type,
            file_len.div_ceil(RECORD_SIZE_BYTES),
            summary_word_count,
        )
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn summary_word_count(&self) -> u64 {
        self.summary_word_count
    }
}
