//! Spill subsystem
//!
//! Private, non-versioned handoff format between operators: a spill file is
//! a sequence of checksummed page frames, written once and read strictly
//! sequentially. Each file is owned by exactly one `SpillFile` handle and
//! deleted when that handle is removed or dropped.

mod codec;
mod file;
mod namespace;
mod reader;
mod writer;

pub use codec::{decode_frame, encode_page, MIN_FRAME_SIZE};
pub use file::SpillFile;
pub use namespace::{SpillNamespace, SPILL_EXTENSION};
pub use reader::SpillReader;
pub use writer::SpillWriter;
