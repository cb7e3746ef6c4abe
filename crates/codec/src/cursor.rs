use super::{
    Error,
    buffer::FrameBuffer,
    header::{Header, HeaderMut},
};

/// Bytes moved per iteration of the payload shift.
pub const SHIFT_CHUNK_SIZE: usize = 16;

/// The largest payload the shift will relocate: a 1500 byte MTU minus the
/// IPv4 and UDP headers.
pub const MAX_SHIFT_SPAN: usize = 1472;

/// Fixed iteration count of the payload shift.
pub const MAX_SHIFT_CHUNKS: usize = MAX_SHIFT_SPAN / SHIFT_CHUNK_SIZE;

/// Bounds-checked access to a frame.
///
/// Header locations are plain offsets; a typed view is produced on demand
/// and borrows the cursor, so it is gone by the time the frame can be
/// resized again.
///
/// # Test
///
/// ```
/// use turn_offload_codec::cursor::HeaderCursor;
/// use turn_offload_codec::header::{EthernetHeader, Ipv4Header};
///
/// let mut frame = vec![0u8; 20];
/// frame[12] = 0x08;
///
/// let cursor = HeaderCursor::new(&mut frame);
/// let eth = cursor.parse::<EthernetHeader>(0).unwrap();
///
/// assert!(eth.is_ipv4());
/// assert!(cursor.parse::<Ipv4Header>(14).is_err());
/// ```
pub struct HeaderCursor<'a, B: ?Sized> {
    buffer: &'a mut B,
}

impl<'a, B> HeaderCursor<'a, B>
where
    B: FrameBuffer + ?Sized,
{
    pub fn new(buffer: &'a mut B) -> Self {
        Self { buffer }
    }

    pub fn len(&self) -> usize {
        self.buffer.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Typed view of the header at `offset`, if the whole header is inside
    /// the frame.
    pub fn parse<'b, H: Header<'b>>(&'b self, offset: usize) -> Result<H, Error> {
        self.get(offset, H::LEN).map(H::from_bytes)
    }

    pub fn parse_mut<'b, H: HeaderMut<'b>>(&'b mut self, offset: usize) -> Result<H, Error> {
        self.get_mut(offset, H::LEN).map(H::from_bytes_mut)
    }

    pub fn get(&self, offset: usize, size: usize) -> Result<&[u8], Error> {
        let end = offset.checked_add(size).ok_or(Error::OutOfBounds)?;
        self.buffer
            .as_bytes()
            .get(offset..end)
            .ok_or(Error::OutOfBounds)
    }

    pub fn get_mut(&mut self, offset: usize, size: usize) -> Result<&mut [u8], Error> {
        let end = offset.checked_add(size).ok_or(Error::OutOfBounds)?;
        self.buffer
            .as_bytes_mut()
            .get_mut(offset..end)
            .ok_or(Error::OutOfBounds)
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, Error> {
        Ok(u16::from_be_bytes(self.get(offset, 2)?.try_into()?))
    }

    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), Error> {
        self.write(offset, &value.to_be_bytes())
    }

    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Error> {
        self.get_mut(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Resize the frame to `len` bytes.
    ///
    /// Every view obtained before this call is invalid afterwards, which the
    /// `&mut self` receiver enforces.
    pub fn grow(&mut self, len: usize) -> Result<(), Error> {
        self.buffer
            .change_tail(len)
            .map_err(|_| Error::ResizeFailed)
    }

    /// Move every byte from `offset` up to `len - count` forward by `count`,
    /// opening a `count` byte gap at `offset`.
    ///
    /// Must follow a successful [`HeaderCursor::grow`] that made room for
    /// the gap. The copy runs back to front in chunks with a fixed iteration
    /// count and checks bounds on every chunk; a span larger than
    /// [`MAX_SHIFT_SPAN`] is refused before anything is moved.
    ///
    /// # Test
    ///
    /// ```
    /// use turn_offload_codec::cursor::HeaderCursor;
    ///
    /// let mut frame = vec![1u8, 2, 3, 4, 5, 6, 0, 0];
    /// let mut cursor = HeaderCursor::new(&mut frame);
    ///
    /// cursor.shift_payload_right(2, 2).unwrap();
    /// assert_eq!(&cursor.as_bytes()[4..], &[3, 4, 5, 6]);
    /// ```
    pub fn shift_payload_right(&mut self, offset: usize, count: usize) -> Result<(), Error> {
        let len = self.len();
        let span = len
            .checked_sub(count)
            .and_then(|it| it.checked_sub(offset))
            .ok_or(Error::OutOfBounds)?;

        if span > MAX_SHIFT_SPAN {
            return Err(Error::ShiftOverflow);
        }

        let bytes = self.buffer.as_bytes_mut();
        let mut remaining = span;
        for _ in 0..MAX_SHIFT_CHUNKS {
            if remaining == 0 {
                break;
            }

            let size = remaining.min(SHIFT_CHUNK_SIZE);
            let src = offset + remaining - size;
            let dst = src + count;
            if dst + size > bytes.len() {
                return Err(Error::OutOfBounds);
            }

            bytes.copy_within(src..src + size, dst);
            remaining -= size;
        }

        Ok(())
    }
}
