//! Internet checksum arithmetic.
//!
//! The data path only ever patches a checksum for a word that changed
//! ([`ChecksumUpdater`]). The full computations below exist to build and
//! validate frames outside of the data path.

use std::net::Ipv4Addr;

use super::{Error, buffer::FrameBuffer, cursor::HeaderCursor, header::IpProtocol};

/// Fold a 32-bit one's complement sum into 16 bits with end-around carry.
///
/// Two folds are enough for any 32-bit input, so this has no loop.
#[inline(always)]
pub fn fold(sum: u32) -> u16 {
    let sum = (sum & 0xffff) + (sum >> 16);
    ((sum & 0xffff) + (sum >> 16)) as u16
}

/// One's complement sum of `bytes` as big-endian 16-bit words, an odd
/// trailing byte padded with zero.
pub fn sum_words(bytes: &[u8]) -> u32 {
    let mut chunks = bytes.chunks_exact(2);
    let mut sum = chunks.by_ref().fold(0u32, |sum, word| {
        let sum = sum + u16::from_be_bytes([word[0], word[1]]) as u32;
        (sum & 0xffff) + (sum >> 16)
    });

    if let [last] = chunks.remainder() {
        sum += (*last as u32) << 8;
    }

    sum
}

/// # Test
///
/// ```
/// use turn_offload_codec::checksum::checksum;
///
/// // RFC 1071 section 3 example
/// let bytes = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
///
/// assert_eq!(checksum(&bytes), !0xddf2);
/// ```
pub fn checksum(bytes: &[u8]) -> u16 {
    !fold(sum_words(bytes))
}

/// Full UDP checksum over the pseudo-header and `segment` (header plus
/// payload, checksum field zeroed).
pub fn udp_checksum(source: Ipv4Addr, destination: Ipv4Addr, segment: &[u8]) -> u16 {
    let mut sum = sum_words(&source.octets()) + sum_words(&destination.octets());
    sum += u8::from(IpProtocol::Udp) as u32;
    sum += segment.len() as u32;
    sum += sum_words(segment);

    match !fold(sum) {
        0 => 0xffff,
        it => it,
    }
}

/// RFC 1624 eqn. 3: `C' = ~(~C + ~m + m')`.
///
/// # Test
///
/// ```
/// use turn_offload_codec::checksum::{checksum, replace16};
///
/// let mut bytes = [0x45, 0x00, 0x00, 0x1c, 0x12, 0x34];
/// let old = checksum(&bytes);
///
/// bytes[2..4].copy_from_slice(&0x0020u16.to_be_bytes());
///
/// assert_eq!(replace16(old, 0x001c, 0x0020), checksum(&bytes));
/// ```
#[inline(always)]
pub fn replace16(check: u16, old: u16, new: u16) -> u16 {
    !fold(!check as u32 + !old as u32 + new as u32)
}

/// Patches the checksum stored in a frame after a 16-bit field changed.
pub struct ChecksumUpdater;

impl ChecksumUpdater {
    /// Apply the change of one 16-bit word from `old` to `new` to the
    /// checksum stored at `offset`.
    ///
    /// Call once per changed word, in the order the words were changed; each
    /// call assumes the stored checksum already reflects the previous ones.
    ///
    /// With `pseudo_header` set the checksum is a UDP checksum: a stored
    /// zero means the sender disabled it and it stays zero, and a result of
    /// zero is transmitted as `0xffff`. Otherwise it is the IPv4 header
    /// checksum.
    pub fn patch16<B>(
        cursor: &mut HeaderCursor<'_, B>,
        offset: usize,
        old: u16,
        new: u16,
        pseudo_header: bool,
    ) -> Result<(), Error>
    where
        B: FrameBuffer + ?Sized,
    {
        let check = cursor.read_u16(offset)?;
        if old == new || (pseudo_header && check == 0) {
            return Ok(());
        }

        let mut check = replace16(check, old, new);
        if pseudo_header && check == 0 {
            check = 0xffff;
        }

        cursor.write_u16(offset, check)
    }
}
