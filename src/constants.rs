//! # Constants and type definitions for spicecore
//!
//! This module centralizes the **binary-format constants** of the DAF kernel
//! container and the handful of type aliases shared across the crate.
//!
//! ## Overview
//!
//! - DAF record geometry (record size, word size, words per record)
//! - SPK summary layout (`ND`, `NI`, packed descriptor width)
//! - Angle conversion factors used by the frame catalog
//! - Core type aliases (ET seconds, NAIF ids, file handles)
//!
//! These definitions are used by the addressing layer, the file reader, the
//! segment registry and the frame resolver alike.

// -------------------------------------------------------------------------------------------------
// DAF record geometry
// -------------------------------------------------------------------------------------------------

/// Size of one DAF record in bytes.
pub const RECORD_SIZE_BYTES: u64 = 1024;

/// Size of one DAF word (a double-precision number) in bytes.
pub const WORD_SIZE_BYTES: u64 = 8;

/// Number of double-precision words held by one DAF record.
pub const WORDS_PER_RECORD: u64 = RECORD_SIZE_BYTES / WORD_SIZE_BYTES;

// -------------------------------------------------------------------------------------------------
// SPK summary layout
// -------------------------------------------------------------------------------------------------

/// Number of double-precision components in an SPK segment summary (ND).
pub const SPK_SUMMARY_ND: usize = 2;

/// Number of integer components in an SPK segment summary (NI).
pub const SPK_SUMMARY_NI: usize = 6;

/// Width of a packed SPK segment descriptor in DP-words: `ND + ceil(NI / 2)`.
pub const SPK_DESCRIPTOR_WORDS: usize = SPK_SUMMARY_ND + SPK_SUMMARY_NI.div_ceil(2);

// -------------------------------------------------------------------------------------------------
// Angle conversions
// -------------------------------------------------------------------------------------------------

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648_000.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Epoch expressed in ET (TDB) seconds past J2000.
pub type EtSeconds = f64;

/// NAIF integer id of a solar-system body.
pub type BodyId = i32;

/// Integer id of a reference frame in the catalog.
pub type FrameId = i32;

/// Process-local handle of an open kernel file.
pub type FileHandle = i32;
