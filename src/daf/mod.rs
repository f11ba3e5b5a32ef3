//! DAF (Double Precision Array File) container access.
//!
//! Three layers, lowest first:
//!
//! * [`address`] — pure word/record/byte address arithmetic,
//! * [`file_record`] — file record parsing and architecture detection,
//! * [`daf_file`] — the open file handle and its [`daf_file::DafState`] cursor.

pub mod address;
pub mod daf_file;
pub mod file_record;

pub use daf_file::{DafFile, DafState};
pub use file_record::{identify_architecture, DafFileRecord, KernelFileInfo};
