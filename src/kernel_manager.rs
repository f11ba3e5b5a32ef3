//! Top-level kernel management façade.
//!
//! [`KernelManager`] owns the pieces a session needs: the kernel pool, the
//! SPK registry, the frame catalog and every open DAF file, keyed by handle.
//! `load` inspects a file, dispatches on the detected architecture and
//! records a [`SpiceKernelInfo`] entry per loaded kernel, so "what is
//! loaded, in which order" is always answerable. All queries flow through
//! the manager; the subsystems stay injectable and individually testable.

use std::collections::HashMap;
use std::fmt;
use std::fs;

use ahash::RandomState;
use camino::Utf8Path;
use nalgebra::Matrix3;

use crate::constants::{BodyId, EtSeconds, FileHandle, FrameId};
use crate::daf::{DafFile, KernelFileInfo};
use crate::errors::SpiceError;
use crate::frames::FrameCatalog;
use crate::kernel_pool::KernelPool;
use crate::spk::{coefficient_block, CoefficientBlock, SpiceKernelInfo, SpkRegistry};

/// Handle recorded for text kernels, which never open a DAF cursor.
const TEXT_KERNEL_HANDLE: FileHandle = 0;

/// One kernel set: pool, registry, frame catalog and the open binary files.
#[derive(Debug, Default)]
pub struct KernelManager {
    pool: KernelPool,
    registry: SpkRegistry,
    catalog: FrameCatalog,
    files: HashMap<FileHandle, DafFile, RandomState>,
    loaded: Vec<SpiceKernelInfo>,
}

impl KernelManager {
    pub fn new() -> Self {
        KernelManager::default()
    }

    /// Load a kernel file, dispatching on its detected architecture.
    ///
    /// * `DAF`/`SPK` files are opened, their segments scanned into the
    ///   registry, and kept open under a fresh handle.
    /// * `KPL` text kernels are parsed into the kernel pool and recorded
    ///   under handle 0.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Filesystem location of the kernel.
    ///
    /// Return
    /// ----------
    /// * The handle the kernel was loaded under, or
    ///   [`SpiceError::UnknownArchitecture`] when the file is neither a
    ///   readable DAF/SPK nor a text kernel. Inspection alone never fails on
    ///   unknown content; loading is the first real use, where it does.
    pub fn load(&mut self, path: &Utf8Path) -> Result<FileHandle, SpiceError> {
        let info = KernelFileInfo::from_path(path)?;

        match (info.architecture(), info.file_type()) {
            ("DAF", "SPK") => {
                let mut daf = DafFile::open(path)?;
                let handle = daf.handle();
                self.registry.scan_file(&mut daf, path.as_str())?;
                self.files.insert(handle, daf);
                self.record_loaded(path.as_str(), "SPK", handle)?;
                Ok(handle)
            }
            ("KPL", kind) => {
                let kind = kind.to_string();
                let text = fs::read_to_string(path)?;
                self.pool.load_text(&text)?;
                self.catalog.refresh(&self.pool);
                self.record_loaded(path.as_str(), &kind, TEXT_KERNEL_HANDLE)?;
                Ok(TEXT_KERNEL_HANDLE)
            }
            _ => Err(SpiceError::UnknownArchitecture(path.to_string())),
        }
    }

    fn record_loaded(
        &mut self,
        file_name: &str,
        kernel_type: &str,
        handle: FileHandle,
    ) -> Result<(), SpiceError> {
        let load_order = self.loaded.len() as i32 + 1;
        self.loaded
            .push(SpiceKernelInfo::new(file_name, kernel_type, handle, load_order)?);
        Ok(())
    }

    /// Kernels loaded so far, in load order.
    pub fn loaded_kernels(&self) -> &[SpiceKernelInfo] {
        &self.loaded
    }

    pub fn pool(&self) -> &KernelPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut KernelPool {
        &mut self.pool
    }

    pub fn registry(&self) -> &SpkRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SpkRegistry {
        &mut self.registry
    }

    /// The raw Chebyshev coefficient record for `body_id` covering `et`.
    ///
    /// Resolution order: covering segment per the registry's precedence
    /// rules (last-registered wins), then the segment's coefficient record.
    /// Unknown bodies and uncovered epochs are `Ok(None)`.
    pub fn coefficients_for(
        &mut self,
        body_id: BodyId,
        et: EtSeconds,
    ) -> Result<Option<CoefficientBlock>, SpiceError> {
        let Some(segment) = self.registry.find_covering_segment(body_id, et).cloned() else {
            return Ok(None);
        };

        let daf = self.files.get_mut(&segment.handle()).ok_or_else(|| {
            SpiceError::InvalidArgument(format!(
                "segment of {} references handle {} which is not open",
                segment.source(),
                segment.handle()
            ))
        })?;
        coefficient_block(daf, &segment, et)
    }

    /// Rotation carrying vector components from frame `from` to frame `to`,
    /// resolved against the built-in catalog and the current pool state.
    pub fn rotation(&mut self, from: FrameId, to: FrameId) -> Result<Matrix3<f64>, SpiceError> {
        self.catalog.rotation_between(&self.pool, from, to)
    }

    /// Map a frame name to its id (0 when unknown).
    pub fn frame_id_of(&self, name: &str) -> FrameId {
        self.catalog.frame_number_of(&self.pool, name)
    }

    /// The loaded-kernel table and session totals, rendered as a string.
    pub fn info(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KernelManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "+-----+--------------------------------------+--------+--------+"
        )?;
        writeln!(
            f,
            "| {:<3} | {:<36} | {:<6} | {:<6} |",
            "Ord", "File", "Type", "Handle"
        )?;
        writeln!(
            f,
            "+-----+--------------------------------------+--------+--------+"
        )?;
        for info in &self.loaded {
            writeln!(
                f,
                "| {:<3} | {:<36} | {:<6} | {:<6} |",
                info.load_order(),
                info.file_name(),
                info.kernel_type(),
                info.handle()
            )?;
        }
        writeln!(
            f,
            "+-----+--------------------------------------+--------+--------+"
        )?;
        writeln!(
            f,
            "{} kernel(s), {} SPK segment(s), {} pool variable(s)",
            self.loaded.len(),
            self.registry.segment_count(),
            self.pool.len()
        )
    }
}

#[cfg(test)]
mod test_kernel_manager {
    use super::*;
    use crate::frames::{FRAME_ECLIPJ2000, FRAME_J2000};

    #[test]
    fn test_empty_manager_answers_queries() {
        let mut manager = KernelManager::new();
        assert!(manager.loaded_kernels().is_empty());
        assert!(manager.coefficients_for(399, 0.0).unwrap().is_none());

        let rotation = manager.rotation(FRAME_J2000, FRAME_ECLIPJ2000).unwrap();
        assert!((rotation.determinant() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pool_backed_frame_lookup() {
        let mut manager = KernelManager::new();
        manager
            .pool_mut()
            .load_text(
                "\\begindata\n   FRAME_LANDER = 1400050\n\\begintext\n",
            )
            .unwrap();
        assert_eq!(manager.frame_id_of("LANDER"), 1400050);
        assert_eq!(manager.frame_id_of("J2000"), 1);
        assert_eq!(manager.frame_id_of("NOT_A_FRAME"), 0);
    }

    #[test]
    fn test_display_lists_loaded_kernels() {
        let manager = KernelManager::new();
        let table = manager.info();
        assert!(table.contains("| Ord | File"));
        assert!(table.contains("0 kernel(s)"));
    }
}
