use bytes::BytesMut;

use super::Error;

/// The largest frame a buffer may grow to, the IPv4 total length ceiling.
pub const MAX_FRAME_LEN: usize = 0xffff;

/// A mutable link-layer frame owned by one invocation of the offload.
///
/// This is the seam to whatever hosts the offload: a socket buffer, a ring
/// slot or a plain vector in tests. Resizing may move the underlying bytes,
/// which is why nothing in this crate keeps a reference across a call to
/// [`FrameBuffer::change_tail`].
pub trait FrameBuffer {
    fn as_bytes(&self) -> &[u8];

    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Set the frame length to `len`, zero filling any new tail bytes.
    ///
    /// A length smaller than the current one trims the tail.
    fn change_tail(&mut self, len: usize) -> Result<(), Error>;
}

impl FrameBuffer for BytesMut {
    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self
    }

    fn change_tail(&mut self, len: usize) -> Result<(), Error> {
        if len > MAX_FRAME_LEN {
            return Err(Error::ResizeFailed);
        }

        self.resize(len, 0);
        Ok(())
    }
}

impl FrameBuffer for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self
    }

    fn change_tail(&mut self, len: usize) -> Result<(), Error> {
        if len > MAX_FRAME_LEN {
            return Err(Error::ResizeFailed);
        }

        self.resize(len, 0);
        Ok(())
    }
}

/// A frame with a hard limit on how far it may grow.
///
/// Socket buffers only have so much tailroom; this type models that limit so
/// that a growth failure can be observed outside of the kernel.
///
/// # Test
///
/// ```
/// use turn_offload_codec::buffer::{Frame, FrameBuffer};
///
/// let mut frame = Frame::new(&[0u8; 60], 64);
///
/// assert!(frame.change_tail(64).is_ok());
/// assert_eq!(frame.len(), 64);
/// assert!(frame.change_tail(65).is_err());
/// assert_eq!(frame.len(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct Frame {
    bytes: BytesMut,
    capacity: usize,
}

impl Frame {
    pub fn new(bytes: &[u8], capacity: usize) -> Self {
        Self {
            bytes: BytesMut::from(bytes),
            capacity: capacity.min(MAX_FRAME_LEN),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl FrameBuffer for Frame {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn change_tail(&mut self, len: usize) -> Result<(), Error> {
        if len > self.capacity {
            return Err(Error::ResizeFailed);
        }

        self.bytes.resize(len, 0);
        Ok(())
    }
}
