use anyhow::Result;
use bytes::BytesMut;
use turn_offload_codec::{
    Error,
    channel_data::{ChannelData, ChannelDataHeader},
};

#[test]
fn test_decode_channel_data() -> Result<()> {
    let mut bytes = BytesMut::new();
    ChannelData {
        bytes: b"relayed",
        number: 0x4001,
    }
    .encode(&mut bytes);

    assert_eq!(&bytes[..4], &[0x40, 0x01, 0x00, 0x07]);

    let message = ChannelData::decode(&bytes)?;
    assert_eq!(message.number(), 0x4001);
    assert_eq!(message.bytes, b"relayed");

    // Trailing bytes past the announced length are not part of the message.
    bytes.extend_from_slice(&[0xff; 3]);
    assert_eq!(ChannelData::decode(&bytes)?.bytes, b"relayed");

    Ok(())
}

#[test]
fn test_decode_rejects_non_channel_data() {
    // Too short for the header.
    assert_eq!(ChannelData::decode(&[0x40, 0x01, 0x00]).err(), Some(Error::InvalidInput));

    // Channel numbers outside 0x4000..0xFFFF.
    for number in [0x0001u16, 0x3fff, 0xffff] {
        let header = ChannelDataHeader { number, length: 0 }.encode();
        assert_eq!(ChannelData::decode(&header).err(), Some(Error::InvalidInput));
    }

    // Length larger than the data that follows.
    let header = ChannelDataHeader {
        number: 0x4001,
        length: 5,
    }
    .encode();

    let mut bytes = header.to_vec();
    bytes.extend_from_slice(&[0; 4]);
    assert_eq!(ChannelData::decode(&bytes).err(), Some(Error::InvalidInput));
}
