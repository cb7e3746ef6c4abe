use std::net::Ipv4Addr;

use num_enum::{IntoPrimitive, TryFromPrimitive};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const IPV4_MIN_HEADER_LEN: usize = 20;
pub const UDP_HEADER_LEN: usize = 8;

pub const IPV4_TOTAL_LEN_OFFSET: usize = 2;
pub const IPV4_CHECKSUM_OFFSET: usize = 10;

pub const UDP_DEST_PORT_OFFSET: usize = 2;
pub const UDP_LENGTH_OFFSET: usize = 4;
pub const UDP_CHECKSUM_OFFSET: usize = 6;

/// Absolute offset of the IPv4 header checksum within a frame.
pub const IP_CHECKSUM_OFFSET: usize = ETHERNET_HEADER_LEN + IPV4_CHECKSUM_OFFSET;

#[repr(u16)]
#[derive(TryFromPrimitive, IntoPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4 = 0x0800,
}

#[repr(u8)]
#[derive(TryFromPrimitive, IntoPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Udp = 17,
}

/// A read-only view of a fixed-size header.
///
/// Views are built by the cursor from a slice that is exactly `LEN` bytes
/// long, so the accessors below never index out of range.
pub trait Header<'a>: Sized {
    const LEN: usize;

    fn from_bytes(bytes: &'a [u8]) -> Self;
}

/// A writable view of a fixed-size header.
pub trait HeaderMut<'a>: Sized {
    const LEN: usize;

    fn from_bytes_mut(bytes: &'a mut [u8]) -> Self;
}

#[inline(always)]
fn be16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline(always)]
fn put_be16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

pub struct EthernetHeader<'a>(&'a [u8]);

impl<'a> Header<'a> for EthernetHeader<'a> {
    const LEN: usize = ETHERNET_HEADER_LEN;

    fn from_bytes(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}

impl EthernetHeader<'_> {
    pub fn destination(&self) -> [u8; 6] {
        [self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]]
    }

    pub fn source(&self) -> [u8; 6] {
        [self.0[6], self.0[7], self.0[8], self.0[9], self.0[10], self.0[11]]
    }

    pub fn ether_type(&self) -> u16 {
        be16(self.0, 12)
    }

    pub fn is_ipv4(&self) -> bool {
        matches!(EtherType::try_from(self.ether_type()), Ok(EtherType::Ipv4))
    }
}

/// The fixed 20-byte part of an IPv4 header.
///
/// Options, when present, follow this part; [`Ipv4Header::header_len`] tells
/// where the transport header starts.
pub struct Ipv4Header<'a>(&'a [u8]);

impl<'a> Header<'a> for Ipv4Header<'a> {
    const LEN: usize = IPV4_MIN_HEADER_LEN;

    fn from_bytes(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}

impl Ipv4Header<'_> {
    pub fn version(&self) -> u8 {
        self.0[0] >> 4
    }

    pub fn is_v4(&self) -> bool {
        self.version() == 4
    }

    pub fn ihl(&self) -> u8 {
        self.0[0] & 0x0f
    }

    /// Header length in bytes, `ihl` counts 32-bit words.
    pub fn header_len(&self) -> usize {
        (self.ihl() as usize) << 2
    }

    pub fn total_len(&self) -> u16 {
        be16(self.0, IPV4_TOTAL_LEN_OFFSET)
    }

    pub fn protocol(&self) -> u8 {
        self.0[9]
    }

    pub fn is_udp(&self) -> bool {
        matches!(IpProtocol::try_from(self.protocol()), Ok(IpProtocol::Udp))
    }

    pub fn checksum(&self) -> u16 {
        be16(self.0, IPV4_CHECKSUM_OFFSET)
    }

    pub fn source(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.0[12], self.0[13], self.0[14], self.0[15])
    }

    pub fn destination(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.0[16], self.0[17], self.0[18], self.0[19])
    }
}

pub struct Ipv4HeaderMut<'a>(&'a mut [u8]);

impl<'a> HeaderMut<'a> for Ipv4HeaderMut<'a> {
    const LEN: usize = IPV4_MIN_HEADER_LEN;

    fn from_bytes_mut(bytes: &'a mut [u8]) -> Self {
        Self(bytes)
    }
}

impl Ipv4HeaderMut<'_> {
    pub fn total_len(&self) -> u16 {
        be16(self.0, IPV4_TOTAL_LEN_OFFSET)
    }

    pub fn set_total_len(&mut self, value: u16) {
        put_be16(self.0, IPV4_TOTAL_LEN_OFFSET, value);
    }
}

pub struct UdpHeader<'a>(&'a [u8]);

impl<'a> Header<'a> for UdpHeader<'a> {
    const LEN: usize = UDP_HEADER_LEN;

    fn from_bytes(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}

impl UdpHeader<'_> {
    pub fn source_port(&self) -> u16 {
        be16(self.0, 0)
    }

    pub fn destination_port(&self) -> u16 {
        be16(self.0, UDP_DEST_PORT_OFFSET)
    }

    /// Length of header plus payload.
    pub fn length(&self) -> u16 {
        be16(self.0, UDP_LENGTH_OFFSET)
    }

    pub fn checksum(&self) -> u16 {
        be16(self.0, UDP_CHECKSUM_OFFSET)
    }
}

pub struct UdpHeaderMut<'a>(&'a mut [u8]);

impl<'a> HeaderMut<'a> for UdpHeaderMut<'a> {
    const LEN: usize = UDP_HEADER_LEN;

    fn from_bytes_mut(bytes: &'a mut [u8]) -> Self {
        Self(bytes)
    }
}

impl UdpHeaderMut<'_> {
    pub fn destination_port(&self) -> u16 {
        be16(self.0, UDP_DEST_PORT_OFFSET)
    }

    pub fn set_destination_port(&mut self, port: u16) {
        put_be16(self.0, UDP_DEST_PORT_OFFSET, port);
    }

    pub fn length(&self) -> u16 {
        be16(self.0, UDP_LENGTH_OFFSET)
    }

    pub fn set_length(&mut self, value: u16) {
        put_be16(self.0, UDP_LENGTH_OFFSET, value);
    }
}
