//! ## Link-layer frame codec for the TURN egress offload
//!
//! [RFC791]: https://tools.ietf.org/html/rfc791
//! [RFC768]: https://tools.ietf.org/html/rfc768
//! [RFC1624]: https://tools.ietf.org/html/rfc1624
//! [RFC8656]: https://tools.ietf.org/html/rfc8656#section-12.4
//!
//! A frame handed to the offload is an Ethernet frame carrying an IPv4
//! [RFC791] datagram which in turn carries a UDP [RFC768] datagram. The
//! offload rewrites such frames in place: it may change the UDP destination
//! port and may insert a ChannelData [RFC8656] header between the UDP header
//! and its payload, growing the frame by four bytes. Checksums are never
//! recomputed over the whole datagram on the data path, they are patched
//! incrementally [RFC1624] for every 16-bit word that changes.
//!
//! Every access to the frame goes through a [`cursor::HeaderCursor`], which
//! checks bounds on each dereference. Header views borrow the cursor, so a
//! view obtained before the frame is resized cannot be used after it.

pub mod buffer;
pub mod channel_data;
pub mod checksum;
pub mod cursor;
pub mod header;

use std::array::TryFromSliceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A dereference would exceed the current frame length.
    OutOfBounds,
    /// The frame could not be resized to the requested length.
    ResizeFailed,
    /// A payload relocation needs more than the bounded copy can move.
    ShiftOverflow,
    /// A header field carries a value no valid frame can have.
    Malformed,
    InvalidInput,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<TryFromSliceError> for Error {
    fn from(_: TryFromSliceError) -> Self {
        Self::OutOfBounds
    }
}
