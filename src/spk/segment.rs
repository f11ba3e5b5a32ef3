//! SPK segment descriptors and the segments built from them.
//!
//! A segment summary in an SPK file is `ND = 2` doubles followed by `NI = 6`
//! integers, packed into `ND + ceil(NI / 2) = 5` DP-words: the two epochs
//! occupy one word each, and each pair of integers shares the 8 bytes of one
//! word. [`SegmentDescriptor`] keeps the packed form and unpacks on access,
//! so a descriptor compares and copies as the five words the file stores.
//!
//! Word equality is over **bit patterns**, not float semantics: a packed
//! integer pair may happen to form a NaN, which would otherwise break
//! structural equality.

use std::fmt;

use hifitime::Epoch;
use nom::{
    number::{
        complete::{f64 as nom_f64, i32 as nom_i32},
        Endianness,
    },
    IResult, Parser,
};

use crate::constants::{BodyId, EtSeconds, FileHandle, FrameId, SPK_DESCRIPTOR_WORDS};
use crate::errors::SpiceError;

/// Packed SPK segment descriptor: five DP-words holding
/// `start_et, end_et, (target, center), (frame, data_type),
/// (initial_addr, final_addr)`.
#[derive(Debug, Clone, Copy)]
pub struct SegmentDescriptor {
    words: [f64; SPK_DESCRIPTOR_WORDS],
}

impl PartialEq for SegmentDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl SegmentDescriptor {
    /// Pack the unpacked summary fields into descriptor words.
    #[allow(clippy::too_many_arguments)]
    pub fn pack(
        start_et: EtSeconds,
        end_et: EtSeconds,
        target: BodyId,
        center: BodyId,
        frame_id: FrameId,
        data_type: i32,
        initial_addr: i32,
        final_addr: i32,
    ) -> Self {
        SegmentDescriptor {
            words: [
                start_et,
                end_et,
                pack_pair(target, center),
                pack_pair(frame_id, data_type),
                pack_pair(initial_addr, final_addr),
            ],
        }
    }

    /// Decode one packed summary from raw file bytes.
    ///
    /// Reads `ND` doubles then `NI` integers in the file's byte order and
    /// repacks them natively, so accessors and equality are independent of
    /// the source platform.
    pub fn parse(input: &[u8], endianness: Endianness) -> IResult<&[u8], Self> {
        let (input, start_et) = nom_f64(endianness).parse(input)?;
        let (input, end_et) = nom_f64(endianness).parse(input)?;
        let (input, target) = nom_i32(endianness).parse(input)?;
        let (input, center) = nom_i32(endianness).parse(input)?;
        let (input, frame_id) = nom_i32(endianness).parse(input)?;
        let (input, data_type) = nom_i32(endianness).parse(input)?;
        let (input, initial_addr) = nom_i32(endianness).parse(input)?;
        let (input, final_addr) = nom_i32(endianness).parse(input)?;
        Ok((
            input,
            SegmentDescriptor::pack(
                start_et,
                end_et,
                target,
                center,
                frame_id,
                data_type,
                initial_addr,
                final_addr,
            ),
        ))
    }

    pub fn words(&self) -> &[f64; SPK_DESCRIPTOR_WORDS] {
        &self.words
    }

    pub fn start_et(&self) -> EtSeconds {
        self.words[0]
    }

    pub fn end_et(&self) -> EtSeconds {
        self.words[1]
    }

    pub fn target(&self) -> BodyId {
        unpack_pair(self.words[2]).0
    }

    pub fn center(&self) -> BodyId {
        unpack_pair(self.words[2]).1
    }

    pub fn frame_id(&self) -> FrameId {
        unpack_pair(self.words[3]).0
    }

    pub fn data_type(&self) -> i32 {
        unpack_pair(self.words[3]).1
    }

    /// First DAF address of the segment data (1-based, DP-words).
    pub fn initial_addr(&self) -> i32 {
        unpack_pair(self.words[4]).0
    }

    /// Last DAF address of the segment data (1-based, DP-words).
    pub fn final_addr(&self) -> i32 {
        unpack_pair(self.words[4]).1
    }

    /// Whether `et` falls inside the segment's (closed) time bounds.
    pub fn covers(&self, et: EtSeconds) -> bool {
        self.start_et() <= et && et <= self.end_et()
    }
}

// Two i32 share one DP-word; the first occupies the low half. The packed
// form is process-internal, so the byte order is fixed to little-endian.
fn pack_pair(first: i32, second: i32) -> f64 {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&first.to_le_bytes());
    bytes[4..].copy_from_slice(&second.to_le_bytes());
    f64::from_le_bytes(bytes)
}

fn unpack_pair(word: f64) -> (i32, i32) {
    let bytes = word.to_le_bytes();
    (
        i32::from_le_bytes(bytes[..4].try_into().expect("low half")),
        i32::from_le_bytes(bytes[4..].try_into().expect("high half")),
    )
}

impl fmt::Display for SegmentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = Epoch::from_et_seconds(self.start_et());
        let end = Epoch::from_et_seconds(self.end_et());

        let fields = [
            ("start_epoch", format!("{start}")),
            ("end_epoch", format!("{end}")),
            ("target", self.target().to_string()),
            ("center", self.center().to_string()),
            ("frame_id", self.frame_id().to_string()),
            ("data_type", self.data_type().to_string()),
            ("initial_addr", self.initial_addr().to_string()),
            ("final_addr", self.final_addr().to_string()),
        ];

        let label_width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(10);
        let value_width = fields.iter().map(|(_, v)| v.len()).max().unwrap_or(10);

        let border = format!(
            "+{:-<label$}+{:-<value$}+",
            "",
            "",
            label = label_width + 2,
            value = value_width + 2
        );

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {:<label_width$} | {:<value_width$} |",
            "Field", "Value",
        )?;
        writeln!(f, "{border}")?;
        for (label, value) in fields {
            writeln!(f, "| {:<label_width$} | {:<value_width$} |", label, value)?;
        }
        writeln!(f, "{border}")
    }
}

/// One discovered SPK segment: the handle of the file it lives in, its
/// packed descriptor, and the identifier of the kernel that supplied it.
///
/// Equality is structural over all three fields; two segments built
/// independently from value-equal descriptors are the same segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SpkSegment {
    handle: FileHandle,
    descriptor: SegmentDescriptor,
    source: String,
}

impl SpkSegment {
    pub fn new(
        handle: FileHandle,
        descriptor: SegmentDescriptor,
        source: impl Into<String>,
    ) -> Result<Self, SpiceError> {
        let source = source.into();
        if source.is_empty() {
            return Err(SpiceError::InvalidArgument(
                "segment source id must not be empty".into(),
            ));
        }
        Ok(SpkSegment {
            handle,
            descriptor,
            source,
        })
    }

    pub fn handle(&self) -> FileHandle {
        self.handle
    }

    pub fn descriptor(&self) -> &SegmentDescriptor {
        &self.descriptor
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn body(&self) -> BodyId {
        self.descriptor.target()
    }

    pub fn covers(&self, et: EtSeconds) -> bool {
        self.descriptor.covers(et)
    }
}
