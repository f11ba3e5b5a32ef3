//! Word/record address arithmetic for DAF kernel files.
//!
//! A DAF file is a sequence of fixed-size records (1024 bytes, i.e. 128
//! double-precision words). Data inside the file is located by a **DAF
//! address**: a 1-based index into the file counted in DP-words. This module
//! converts between addresses, `(record, word)` pairs, and byte offsets.
//! Every higher-level read (segment descriptors, summary records, coefficient
//! blocks) ultimately goes through this arithmetic.
//!
//! All functions here are pure; malformed inputs (non-positive counts or
//! addresses) fail with [`SpiceError::InvalidArgument`].

use crate::constants::{RECORD_SIZE_BYTES, WORDS_PER_RECORD, WORD_SIZE_BYTES};
use crate::errors::SpiceError;

/// Convert a record count into the corresponding byte count.
///
/// Arguments
/// -----------------
/// * `record_count`: Number of fixed-size records (must be positive).
///
/// Return
/// ----------
/// * The byte count `record_count * 1024`, or
///   [`SpiceError::InvalidArgument`] if `record_count <= 0`.
pub fn record_count_to_byte_count(record_count: i64) -> Result<u64, SpiceError> {
    if record_count <= 0 {
        return Err(SpiceError::InvalidArgument(format!(
            "record count must be positive, got {record_count}"
        )));
    }
    Ok(record_count as u64 * RECORD_SIZE_BYTES)
}

/// Locate the record holding a DAF address and the word offset inside it.
///
/// Both the returned record number and word offset are 1-based, matching the
/// DAF convention. This is the exact inverse of [`record_word_to_address`].
///
/// Arguments
/// -----------------
/// * `address`: 1-based DAF address in DP-words.
///
/// Return
/// ----------
/// * `(record, word)` with `record >= 1` and `1 <= word <= 128`, or
///   [`SpiceError::InvalidArgument`] if `address <= 0`.
pub fn address_to_record_word(address: i64) -> Result<(u64, u64), SpiceError> {
    if address <= 0 {
        return Err(SpiceError::InvalidArgument(format!(
            "DAF address must be positive, got {address}"
        )));
    }
    let zero_based = (address - 1) as u64;
    Ok((
        zero_based / WORDS_PER_RECORD + 1,
        zero_based % WORDS_PER_RECORD + 1,
    ))
}

/// Rebuild a DAF address from a `(record, word)` pair.
///
/// Arguments
/// -----------------
/// * `record`: 1-based record number.
/// * `word`: 1-based word offset within the record (`1..=128`).
///
/// Return
/// ----------
/// * The 1-based DAF address, or [`SpiceError::InvalidArgument`] if either
///   index is out of range.
pub fn record_word_to_address(record: i64, word: i64) -> Result<u64, SpiceError> {
    if record <= 0 {
        return Err(SpiceError::InvalidArgument(format!(
            "record number must be positive, got {record}"
        )));
    }
    if word <= 0 || word > WORDS_PER_RECORD as i64 {
        return Err(SpiceError::InvalidArgument(format!(
            "word offset must be in 1..={WORDS_PER_RECORD}, got {word}"
        )));
    }
    Ok((record as u64 - 1) * WORDS_PER_RECORD + word as u64)
}

/// Byte offset (from the start of the file) of a 1-based DAF address.
pub fn address_to_byte_offset(address: i64) -> Result<u64, SpiceError> {
    if address <= 0 {
        return Err(SpiceError::InvalidArgument(format!(
            "DAF address must be positive, got {address}"
        )));
    }
    Ok((address as u64 - 1) * WORD_SIZE_BYTES)
}

#[cfg(test)]
mod test_address {
    use super::*;

    #[test]
    fn test_record_byte_conversion() {
        assert_eq!(record_count_to_byte_count(1).unwrap(), 1024);
        assert_eq!(record_count_to_byte_count(62).unwrap(), 63488);

        // Strict monotonicity over a range of positive counts.
        let mut previous = 0;
        for n in 1..256 {
            let bytes = record_count_to_byte_count(n).unwrap();
            assert!(bytes > previous);
            previous = bytes;
        }

        assert!(matches!(
            record_count_to_byte_count(0),
            Err(SpiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            record_count_to_byte_count(-5),
            Err(SpiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_address_to_record_word() {
        assert_eq!(address_to_record_word(1).unwrap(), (1, 1));
        assert_eq!(address_to_record_word(128).unwrap(), (1, 128));
        assert_eq!(address_to_record_word(129).unwrap(), (2, 1));
        // First word of the first summary record of a DE440-like file.
        assert_eq!(address_to_record_word(7809).unwrap(), (62, 1));

        assert!(matches!(
            address_to_record_word(0),
            Err(SpiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            address_to_record_word(-1),
            Err(SpiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_address_round_trip() {
        for address in [1i64, 2, 127, 128, 129, 256, 257, 1024, 3021513, 14974888] {
            let (record, word) = address_to_record_word(address).unwrap();
            let rebuilt = record_word_to_address(record as i64, word as i64).unwrap();
            assert_eq!(rebuilt, address as u64);
        }
    }

    #[test]
    fn test_record_word_bounds() {
        assert!(matches!(
            record_word_to_address(0, 1),
            Err(SpiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            record_word_to_address(1, 0),
            Err(SpiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            record_word_to_address(1, 129),
            Err(SpiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_byte_offset() {
        assert_eq!(address_to_byte_offset(1).unwrap(), 0);
        assert_eq!(address_to_byte_offset(257).unwrap(), 2048);
        assert!(matches!(
            address_to_byte_offset(0),
            Err(SpiceError::InvalidArgument(_))
        ));
    }
}
