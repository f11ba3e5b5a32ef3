//! Shared fixtures: synthesize small kernel files on disk.
//!
//! The binary fixture is a self-contained little-endian DAF/SPK file with
//! one type 2 segment per requested body, one summary record per segment so
//! the summary-chain walk is exercised. Coefficient values are
//! deterministic (`record * 100 + component * 10 + index`, plus a per-body
//! offset) so a test can check exactly which record and which file a block
//! came from.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use camino::Utf8PathBuf;

const RECORD_SIZE: usize = 1024;
const WORDS_PER_RECORD: usize = 128;

/// Segment geometry of the fixture: 10 records of 100 s each, 4 Chebyshev
/// coefficients per component, type 2 (position only).
pub const FIXTURE_BODY: i32 = 399;
pub const FIXTURE_START_ET: f64 = 0.0;
pub const FIXTURE_END_ET: f64 = 1000.0;
pub const FIXTURE_INTLEN: f64 = 100.0;
pub const FIXTURE_N_RECORDS: usize = 10;
pub const FIXTURE_NCOEFF: usize = 4;

const RSIZE: usize = 2 + 3 * FIXTURE_NCOEFF;
const SEGMENT_WORDS: usize = FIXTURE_N_RECORDS * RSIZE + 4;
/// Each segment's data occupies two whole records.
const RECORDS_PER_SEGMENT: usize = 2;

static FIXTURE_COUNTER: AtomicU32 = AtomicU32::new(0);

fn fixture_path(prefix: &str, extension: &str) -> Utf8PathBuf {
    let n = FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path: PathBuf = std::env::temp_dir().join(format!(
        "spicecore_{prefix}_{}_{n}.{extension}",
        std::process::id()
    ));
    Utf8PathBuf::from_path_buf(path).expect("temp dir is valid UTF-8")
}

fn push_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Two i32 packed into one DP-word, low half first (little-endian file).
fn push_pair(buf: &mut Vec<u8>, first: i32, second: i32) {
    push_i32(buf, first);
    push_i32(buf, second);
}

fn pad_to(buf: &mut Vec<u8>, len: usize) {
    assert!(buf.len() <= len, "fixture overflowed {len} bytes");
    buf.resize(len, 0);
}

/// Expected coefficient value at (record, component, index) for a segment
/// written with `value_offset`.
pub fn expected_coefficient(
    value_offset: f64,
    record: usize,
    component: usize,
    index: usize,
) -> f64 {
    value_offset + (record * 100 + component * 10 + index) as f64
}

/// Write a little-endian DAF/SPK file with one type 2 segment per entry of
/// `bodies` (body id, coefficient value offset) and return its path.
///
/// Every segment covers [`FIXTURE_START_ET`, `FIXTURE_END_ET`]. Summary
/// records are chained one per segment, starting at record 2.
pub fn write_spk(bodies: &[(i32, f64)]) -> Utf8PathBuf {
    assert!(!bodies.is_empty());
    let n = bodies.len();
    let first_data_record = 2 + n;

    let segment_bounds = |i: usize| {
        let initial = ((first_data_record + i * RECORDS_PER_SEGMENT - 1) * WORDS_PER_RECORD
            + 1) as i32;
        (initial, initial + SEGMENT_WORDS as i32 - 1)
    };

    let mut buf = Vec::with_capacity((first_data_record + n * RECORDS_PER_SEGMENT) * RECORD_SIZE);

    // Record 1: file record.
    buf.extend_from_slice(b"DAF/SPK ");
    push_i32(&mut buf, 2); // ND
    push_i32(&mut buf, 6); // NI
    let mut name = [b' '; 60];
    name[..21].copy_from_slice(b"SPICECORE TEST KERNEL");
    buf.extend_from_slice(&name);
    push_i32(&mut buf, 2); // fward
    push_i32(&mut buf, 1 + n as i32); // bward
    push_i32(&mut buf, segment_bounds(n - 1).1 + 1); // free
    buf.extend_from_slice(b"LTL-IEEE");
    pad_to(&mut buf, RECORD_SIZE);

    // Records 2..2+n: one summary record per segment, chained forward.
    for (i, &(body, _)) in bodies.iter().enumerate() {
        let next = if i + 1 < n { 3 + i } else { 0 };
        let prev = if i > 0 { 1 + i } else { 0 };
        push_f64(&mut buf, next as f64);
        push_f64(&mut buf, prev as f64);
        push_f64(&mut buf, 1.0); // nsum
        push_f64(&mut buf, FIXTURE_START_ET);
        push_f64(&mut buf, FIXTURE_END_ET);
        push_pair(&mut buf, body, 0); // target, center
        push_pair(&mut buf, 1, 2); // frame J2000, type 2
        let (initial, last) = segment_bounds(i);
        push_pair(&mut buf, initial, last);
        pad_to(&mut buf, (2 + i) * RECORD_SIZE);
    }

    // Data records: coefficient records followed by the directory footer.
    for (i, &(_, value_offset)) in bodies.iter().enumerate() {
        for record in 0..FIXTURE_N_RECORDS {
            let mid = FIXTURE_START_ET + (record as f64 + 0.5) * FIXTURE_INTLEN;
            push_f64(&mut buf, mid);
            push_f64(&mut buf, FIXTURE_INTLEN / 2.0);
            for component in 0..3 {
                for index in 0..FIXTURE_NCOEFF {
                    push_f64(
                        &mut buf,
                        expected_coefficient(value_offset, record, component, index),
                    );
                }
            }
        }
        push_f64(&mut buf, FIXTURE_START_ET); // init
        push_f64(&mut buf, FIXTURE_INTLEN); // intlen
        push_f64(&mut buf, RSIZE as f64);
        push_f64(&mut buf, FIXTURE_N_RECORDS as f64);
        pad_to(
            &mut buf,
            (first_data_record + (i + 1) * RECORDS_PER_SEGMENT - 1) * RECORD_SIZE,
        );
    }

    let path = fixture_path("spk", "bsp");
    fs::write(&path, &buf).expect("write SPK fixture");
    path
}

/// Single-segment convenience wrapper around [`write_spk`].
pub fn write_type2_spk(value_offset: f64) -> Utf8PathBuf {
    write_spk(&[(FIXTURE_BODY, value_offset)])
}

/// Write a KPL text kernel with the given body and return its path.
pub fn write_text_kernel(body: &str) -> Utf8PathBuf {
    let path = fixture_path("kpl", "tf");
    fs::write(&path, format!("KPL/FK\n\n{body}\n")).expect("write text kernel fixture");
    path
}

/// Write a file that is neither a DAF nor a text kernel.
pub fn write_unknown_file() -> Utf8PathBuf {
    let path = fixture_path("junk", "txt");
    fs::write(&path, "not a kernel at all\n").expect("write junk fixture");
    path
}
