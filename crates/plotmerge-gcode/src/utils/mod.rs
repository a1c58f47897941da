//! I/O capabilities used by the post-processor

pub mod line_io;

pub use line_io::*;
