//! Core reading machinery for binary SPICE ephemeris kernels.
//!
//! `spicecore` opens NAIF DAF/SPK files, walks their summary directories,
//! registers segments per body with last-loaded-wins precedence, slices the
//! raw Chebyshev coefficient records of type 2/3 segments, maintains a
//! text-kernel variable pool with change watchers, and resolves rotations
//! between inertial frames (built-in or pool-defined) by composing through
//! J2000. Polynomial evaluation and light-time corrections are out of
//! scope; the crate stops at faithfully extracted coefficients and exact
//! rotation matrices.
//!
//! Entry point for most uses is [`kernel_manager::KernelManager`]:
//!
//! ```no_run
//! use camino::Utf8Path;
//! use spicecore::kernel_manager::KernelManager;
//!
//! # fn main() -> Result<(), spicecore::errors::SpiceError> {
//! let mut manager = KernelManager::new();
//! manager.load(Utf8Path::new("de440.bsp"))?;
//! if let Some(block) = manager.coefficients_for(3, 0.0)? {
//!     println!("{} coefficients per axis", block.x().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod daf;
pub mod errors;
pub mod frames;
pub mod kernel_manager;
pub mod kernel_pool;
pub mod spk;
