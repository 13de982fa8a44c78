//! Byte-level plumbing shared by the json-bind codecs.
//!
//! [`Writer`] is an auto-growing output buffer with JSON emit helpers and
//! the size/flush counters that conditional property writers compare to
//! decide whether a separator is owed. [`Reader`] is a pull-token JSON
//! reader: codecs ask for the next significant byte and then consume the
//! value that starts there.

mod error;
mod hash;
mod reader;
mod writer;

pub use error::{ReadError, ReadErrorKind};
pub use hash::{name_hash, FNV_OFFSET_BASIS, FNV_PRIME};
pub use reader::Reader;
pub use writer::Writer;
