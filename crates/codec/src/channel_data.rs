use bytes::{BufMut, BytesMut};

use super::Error;

/// The ChannelData Message
///
/// The ChannelData message is used to carry application data between the
/// client and the server.
///
/// The Channel Number field specifies the number of the channel on which
/// the data is traveling, and thus, the address of the peer that is
/// sending or is to receive the data.
///
/// The Length field specifies the length in bytes of the application
/// data field (i.e., it does not include the size of the ChannelData
/// header).  Note that 0 is a valid length.
///
/// The Application Data field carries the data the client is trying to
/// send to the peer, or that the peer is sending to the client.
pub struct ChannelData<'a> {
    pub bytes: &'a [u8],
    pub number: u16,
}

impl<'a> ChannelData<'a> {
    pub fn number(&self) -> u16 {
        self.number
    }

    pub fn encode(self, bytes: &mut BytesMut) {
        bytes.clear();
        bytes.put_u16(self.number);
        bytes.put_u16(self.bytes.len() as u16);
        bytes.extend_from_slice(self.bytes);
    }

    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use turn_offload_codec::channel_data::ChannelData;
    ///
    /// let data: [u8; 4] = [0x40, 0x00, 0x00, 0x40];
    /// let mut bytes = BytesMut::with_capacity(1500);
    ///
    /// ChannelData {
    ///     number: 16384,
    ///     bytes: &data[..],
    /// }
    /// .encode(&mut bytes);
    ///
    /// let ret = ChannelData::decode(&bytes[..]).unwrap();
    ///
    /// assert_eq!(ret.number, 16384);
    /// assert_eq!(ret.bytes, &data[..]);
    /// ```
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        let header = ChannelDataHeader::decode(bytes)?;
        if !(0x4000..0xFFFF).contains(&header.number) {
            return Err(Error::InvalidInput);
        }

        let size = header.length as usize;
        if size > bytes.len() - ChannelDataHeader::LEN {
            return Err(Error::InvalidInput);
        }

        Ok(Self {
            bytes: &bytes[ChannelDataHeader::LEN..ChannelDataHeader::LEN + size],
            number: header.number,
        })
    }
}

/// The fixed four byte prefix of a ChannelData message.
///
/// The offload writes this header in front of a datagram that is already
/// sitting in a frame, so unlike [`ChannelData`] it does not carry the
/// application data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDataHeader {
    pub number: u16,
    pub length: u16,
}

impl ChannelDataHeader {
    pub const LEN: usize = 4;

    /// # Test
    ///
    /// ```
    /// use turn_offload_codec::channel_data::ChannelDataHeader;
    ///
    /// let header = ChannelDataHeader {
    ///     number: 0x4001,
    ///     length: 8,
    /// };
    ///
    /// assert_eq!(header.encode(), [0x40, 0x01, 0x00, 0x08]);
    /// assert_eq!(ChannelDataHeader::decode(&header.encode()).unwrap(), header);
    /// ```
    pub fn encode(&self) -> [u8; Self::LEN] {
        let [a, b] = self.number.to_be_bytes();
        let [c, d] = self.length.to_be_bytes();
        [a, b, c, d]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < Self::LEN {
            return Err(Error::InvalidInput);
        }

        Ok(Self {
            number: u16::from_be_bytes(bytes[..2].try_into()?),
            length: u16::from_be_bytes(bytes[2..4].try_into()?),
        })
    }
}
