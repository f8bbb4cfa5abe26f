//! I/O primitives shared by the grid and directory parsers
//!
//! Everything above this layer reads through a [`BinaryCursor`] obtained
//! from a [`Resource`].

pub mod traits;
pub mod byte_order;
pub mod buffer;
pub mod cursor;
pub mod resource;

pub use traits::{SeekableReader, source_len};
pub use byte_order::{ByteOrder, ByteOrderHandler};
pub use buffer::BufferedReader;
pub use cursor::{BinaryCursor, Rational, SRational, Terminator, TextEncoding};
pub use resource::{FileResource, GzipResource, MemoryResource, Resource, ResourceCursor, open_resource};
