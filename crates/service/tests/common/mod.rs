#![allow(dead_code)]

use std::net::Ipv4Addr;

use codec::checksum::{checksum, fold, sum_words, udp_checksum};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const UDP_HEADER_LEN: usize = 8;

/// Builds Ethernet/IPv4/UDP frames with valid checksums.
#[derive(Clone)]
pub struct FrameBuilder {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub source_port: u16,
    pub destination_port: u16,
    pub payload: Vec<u8>,
    pub options: Vec<u8>,
    pub ether_type: u16,
    pub protocol: u8,
    pub udp_checksum: bool,
    pub padding: usize,
}

impl FrameBuilder {
    pub fn new(destination: &str, destination_port: u16) -> Self {
        Self {
            source: Ipv4Addr::new(10, 0, 0, 1),
            destination: destination.parse().unwrap(),
            source_port: 52722,
            destination_port,
            payload: (0..8).collect(),
            options: Vec::new(),
            ether_type: 0x0800,
            protocol: 17,
            udp_checksum: true,
            padding: 0,
        }
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    /// IPv4 options, a multiple of four bytes.
    pub fn options(mut self, options: &[u8]) -> Self {
        assert_eq!(options.len() % 4, 0);
        self.options = options.to_vec();
        self
    }

    pub fn ether_type(mut self, ether_type: u16) -> Self {
        self.ether_type = ether_type;
        self
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn without_udp_checksum(mut self) -> Self {
        self.udp_checksum = false;
        self
    }

    /// Link-layer padding after the IPv4 datagram.
    pub fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let ip_header_len = 20 + self.options.len();
        let udp_len = UDP_HEADER_LEN + self.payload.len();

        let mut frame = Vec::with_capacity(ETHERNET_HEADER_LEN + ip_header_len + udp_len);
        frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
        frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        frame.extend_from_slice(&self.ether_type.to_be_bytes());

        let mut ip = Vec::with_capacity(ip_header_len);
        ip.push(0x40 | (ip_header_len / 4) as u8);
        ip.push(0);
        ip.extend_from_slice(&((ip_header_len + udp_len) as u16).to_be_bytes());
        ip.extend_from_slice(&[0x1c, 0x46, 0x40, 0x00, 64, self.protocol, 0, 0]);
        ip.extend_from_slice(&self.source.octets());
        ip.extend_from_slice(&self.destination.octets());
        ip.extend_from_slice(&self.options);

        let check = checksum(&ip);
        ip[10..12].copy_from_slice(&check.to_be_bytes());
        frame.extend_from_slice(&ip);

        let mut udp = Vec::with_capacity(udp_len);
        udp.extend_from_slice(&self.source_port.to_be_bytes());
        udp.extend_from_slice(&self.destination_port.to_be_bytes());
        udp.extend_from_slice(&(udp_len as u16).to_be_bytes());
        udp.extend_from_slice(&[0, 0]);
        udp.extend_from_slice(&self.payload);

        if self.udp_checksum {
            let check = udp_checksum(self.source, self.destination, &udp);
            udp[6..8].copy_from_slice(&check.to_be_bytes());
        }

        frame.extend_from_slice(&udp);
        frame.resize(frame.len() + self.padding, 0);
        frame
    }
}

pub fn read_u16(frame: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([frame[offset], frame[offset + 1]])
}

pub fn ip_header_len(frame: &[u8]) -> usize {
    ((frame[ETHERNET_HEADER_LEN] & 0x0f) as usize) * 4
}

pub fn udp_offset(frame: &[u8]) -> usize {
    ETHERNET_HEADER_LEN + ip_header_len(frame)
}

pub fn ip_total_len(frame: &[u8]) -> u16 {
    read_u16(frame, ETHERNET_HEADER_LEN + 2)
}

pub fn udp_destination_port(frame: &[u8]) -> u16 {
    read_u16(frame, udp_offset(frame) + 2)
}

pub fn udp_length(frame: &[u8]) -> u16 {
    read_u16(frame, udp_offset(frame) + 4)
}

pub fn udp_carried_checksum(frame: &[u8]) -> u16 {
    read_u16(frame, udp_offset(frame) + 6)
}

/// The IPv4 header including its checksum sums to all ones.
pub fn ipv4_checksum_valid(frame: &[u8]) -> bool {
    let header = &frame[ETHERNET_HEADER_LEN..udp_offset(frame)];
    fold(sum_words(header)) == 0xffff
}

/// Recompute the UDP checksum from scratch over the datagram the UDP length
/// field describes.
pub fn udp_recomputed_checksum(frame: &[u8]) -> u16 {
    let offset = udp_offset(frame);
    let mut segment = frame[offset..offset + udp_length(frame) as usize].to_vec();
    segment[6..8].copy_from_slice(&[0, 0]);

    let source = Ipv4Addr::new(frame[26], frame[27], frame[28], frame[29]);
    let destination = Ipv4Addr::new(frame[30], frame[31], frame[32], frame[33]);
    udp_checksum(source, destination, &segment)
}
