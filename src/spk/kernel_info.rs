//! Lightweight "which kernel supplies this data" records.

use crate::constants::FileHandle;
use crate::errors::SpiceError;

/// Identification of one loaded kernel: its file name, data type tag, the
/// handle it was opened under (0 for text kernels) and its position in the
/// load sequence. Later load order means higher precedence when segment
/// coverage overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiceKernelInfo {
    file_name: String,
    kernel_type: String,
    handle: FileHandle,
    load_order: i32,
}

impl SpiceKernelInfo {
    pub fn new(
        file_name: impl Into<String>,
        kernel_type: impl Into<String>,
        handle: FileHandle,
        load_order: i32,
    ) -> Result<Self, SpiceError> {
        let file_name = file_name.into();
        let kernel_type = kernel_type.into();
        if file_name.is_empty() {
            return Err(SpiceError::InvalidArgument(
                "kernel file name must not be empty".into(),
            ));
        }
        if kernel_type.is_empty() {
            return Err(SpiceError::InvalidArgument(
                "kernel type must not be empty".into(),
            ));
        }
        Ok(SpiceKernelInfo {
            file_name,
            kernel_type,
            handle,
            load_order,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kernel_type(&self) -> &str {
        &self.kernel_type
    }

    pub fn handle(&self) -> FileHandle {
        self.handle
    }

    pub fn load_order(&self) -> i32 {
        self.load_order
    }
}

#[cfg(test)]
mod test_kernel_info {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = SpiceKernelInfo::new("de440.bsp", "SPK", 1, 1).unwrap();
        let b = SpiceKernelInfo::new("de440.bsp", "SPK", 1, 1).unwrap();
        assert_eq!(a, b);

        assert_ne!(a, SpiceKernelInfo::new("de440.bsp", "SPK", 2, 1).unwrap());
        assert_ne!(a, SpiceKernelInfo::new("de440.bsp", "SPK", 1, 2).unwrap());
        assert_ne!(a, SpiceKernelInfo::new("de440.bsp", "PCK", 1, 1).unwrap());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            SpiceKernelInfo::new("", "SPK", 1, 1),
            Err(SpiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            SpiceKernelInfo::new("de440.bsp", "", 1, 1),
            Err(SpiceError::InvalidArgument(_))
        ));
    }
}
