//! Output actions performed after grouping.
//!
//! - [`copy`]: copy one representative per similarity group into the
//!   output directory with sequential naming
//! - [`preview`]: render a montage image of a group's members for visual
//!   inspection

pub mod copy;
pub mod preview;

pub use copy::{copy_representatives, CopyStats};
pub use preview::render_montage;
