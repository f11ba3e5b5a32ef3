//! Raw Chebyshev coefficient extraction for type 2 and type 3 segments.
//!
//! A type 2/3 SPK segment is a run of fixed-size coefficient records
//! followed by a four-word directory footer:
//!
//! * `init` — initial epoch of the first record (ET seconds),
//! * `intlen` — time span of each record (seconds),
//! * `rsize` — record size in **DP-words**, not bytes,
//! * `n_records` — number of records in the segment.
//!
//! Each record holds `mid`, `radius`, then the coefficient runs: three
//! position components for type 2, position plus velocity (six components)
//! for type 3. This module locates and slices the record covering an epoch;
//! **evaluating** the polynomials is the numeric collaborator's job and is
//! deliberately absent here.

use std::fmt;

use hifitime::{Duration, Epoch};
use smallvec::SmallVec;

use crate::constants::EtSeconds;
use crate::daf::DafFile;
use crate::errors::SpiceError;
use crate::spk::segment::SpkSegment;

/// Directory footer of a type 2/3 SPK segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientDirectory {
    pub init: f64,
    pub intlen: f64,
    pub rsize: usize,
    pub n_records: usize,
}

impl CoefficientDirectory {
    /// Read the four directory words from the tail of `segment`.
    pub fn read(daf: &mut DafFile, segment: &SpkSegment) -> Result<Self, SpiceError> {
        let final_addr = segment.descriptor().final_addr() as i64;
        let words = daf.read_words(final_addr - 3, 4)?;
        Ok(CoefficientDirectory {
            init: words[0],
            intlen: words[1],
            rsize: words[2] as usize,
            n_records: words[3] as usize,
        })
    }

    /// Number of Chebyshev coefficients per component for a record of this
    /// size, given the segment's component count.
    pub fn coefficients_per_component(&self, components: usize) -> usize {
        (self.rsize - 2) / components
    }
}

impl fmt::Display for CoefficientDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let epoch = Epoch::from_et_seconds(self.init);
        let record_span = Duration::from_seconds(self.intlen);

        writeln!(f, "+----------------+----------------------------+")?;
        writeln!(f, "| {:<14} | {:<26} |", "Field", "Value")?;
        writeln!(f, "+----------------+----------------------------+")?;
        writeln!(f, "| {:<14} | {:<26} |", "init (epoch)", format!("{epoch}"))?;
        writeln!(f, "| {:<14} | {:<26} |", "intlen", format!("{record_span}"))?;
        writeln!(f, "| {:<14} | {:<26} |", "rsize", self.rsize)?;
        writeln!(f, "| {:<14} | {:<26} |", "n_records", self.n_records)?;
        writeln!(f, "+----------------+----------------------------+")
    }
}

/// The raw coefficient record covering one epoch: record midpoint,
/// half-interval, and one coefficient run per component (x, y, z for type 2;
/// x, y, z, vx, vy, vz for type 3). Ready to hand to a polynomial evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientBlock {
    pub mid: f64,
    pub radius: f64,
    components: SmallVec<[Vec<f64>; 6]>,
}

impl CoefficientBlock {
    pub fn component(&self, index: usize) -> Option<&[f64]> {
        self.components.get(index).map(Vec::as_slice)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn x(&self) -> &[f64] {
        &self.components[0]
    }

    pub fn y(&self) -> &[f64] {
        &self.components[1]
    }

    pub fn z(&self) -> &[f64] {
        &self.components[2]
    }
}

/// Locate and slice the coefficient record of `segment` covering `et`.
///
/// Arguments
/// -----------------
/// * `daf`: The open file the segment was discovered in.
/// * `segment`: The covering segment (per the registry's precedence rules).
/// * `et`: Epoch in ET seconds past J2000.
///
/// Return
/// ----------
/// * `Ok(None)` when `et` lies outside the segment's bounds (a miss, not an
///   error), [`SpiceError::InvalidSpkDataType`] for segment types other
///   than 2 or 3, otherwise the sliced [`CoefficientBlock`].
pub fn coefficient_block(
    daf: &mut DafFile,
    segment: &SpkSegment,
    et: EtSeconds,
) -> Result<Option<CoefficientBlock>, SpiceError> {
    if !segment.covers(et) {
        return Ok(None);
    }

    let component_count = match segment.descriptor().data_type() {
        2 => 3,
        3 => 6,
        other => return Err(SpiceError::InvalidSpkDataType(other)),
    };

    let directory = CoefficientDirectory::read(daf, segment)?;
    if directory.rsize < 2 + component_count || directory.n_records == 0 {
        return Err(SpiceError::NomParsingError(format!(
            "segment directory of {} is inconsistent: rsize = {}, n_records = {}",
            segment.source(),
            directory.rsize,
            directory.n_records
        )));
    }

    // Records tile [init, init + n * intlen]; the end epoch belongs to the
    // last record.
    let mut index = ((et - directory.init) / directory.intlen).floor() as usize;
    if index >= directory.n_records {
        index = directory.n_records - 1;
    }

    let address = segment.descriptor().initial_addr() as i64 + (index * directory.rsize) as i64;
    let words = daf.read_words(address, directory.rsize)?;

    let ncoeff = directory.coefficients_per_component(component_count);
    let components = (0..component_count)
        .map(|c| words[2 + c * ncoeff..2 + (c + 1) * ncoeff].to_vec())
        .collect();

    Ok(Some(CoefficientBlock {
        mid: words[0],
        radius: words[1],
        components,
    }))
}

#[cfg(test)]
mod test_coefficients {
    use super::*;

    #[test]
    fn test_coefficients_per_component() {
        // DE440 Earth-Moon barycenter segment: rsize 41, 13 coefficients per axis.
        let directory = CoefficientDirectory {
            init: -14200747200.0,
            intlen: 1382400.0,
            rsize: 41,
            n_records: 25112,
        };
        assert_eq!(directory.coefficients_per_component(3), 13);
    }

    #[test]
    fn test_display_directory() {
        let directory = CoefficientDirectory {
            init: -14200747200.0,
            intlen: 1382400.0,
            rsize: 41,
            n_records: 25112,
        };
        let output = format!("{directory}");
        assert!(output.contains("| rsize          | 41"));
        assert!(output.contains("| n_records      | 25112"));
    }
}
