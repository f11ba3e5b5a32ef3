//! SPK segment discovery, registry and raw coefficient access.
//!
//! * [`segment`] — packed segment descriptors and [`segment::SpkSegment`],
//! * [`body`] — per-body reuse-expense bookkeeping,
//! * [`registry`] — the body → segment registry and its expense policy,
//! * [`coefficients`] — type 2/3 coefficient block extraction,
//! * [`kernel_info`] — loaded-kernel identification records.

pub mod body;
pub mod coefficients;
pub mod kernel_info;
pub mod registry;
pub mod segment;

pub use body::SpkBody;
pub use coefficients::{coefficient_block, CoefficientBlock, CoefficientDirectory};
pub use kernel_info::SpiceKernelInfo;
pub use registry::{ExpensePolicy, HalvingExpensePolicy, SpkRegistry};
pub use segment::{SegmentDescriptor, SpkSegment};
