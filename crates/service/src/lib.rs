pub mod egress;
pub mod ingress;
pub mod store;

use std::{fmt, net::Ipv4Addr};

use codec::{
    Error,
    buffer::FrameBuffer,
    cursor::HeaderCursor,
    header::{ETHERNET_HEADER_LEN, EthernetHeader, IPV4_MIN_HEADER_LEN, Ipv4Header, UdpHeader},
};

/// What the host should do with a frame once a program returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Forward the frame, unmodified or as rewritten in place.
    Accept,
    /// Discard the frame.
    Drop,
    /// Hand the frame to another interface. Part of the host interface, no
    /// program in this crate produces it.
    Redirect(u32),
}

/// Why a frame was forwarded without being touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    NotIpv4,
    NotUdp,
    NoFlowState,
    PortMismatch,
}

/// The result of running a program over one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PassThrough(PassReason),
    Rewritten {
        port_rewritten: bool,
        channel_inserted: bool,
    },
    /// The ingress classifier recognised the frame.
    Matched { channel: Option<u16> },
}

impl From<Outcome> for Verdict {
    fn from(_: Outcome) -> Self {
        Self::Accept
    }
}

/// A per-frame packet program, invoked once per frame by the host.
///
/// Invocations for different frames may run concurrently, one invocation
/// never suspends and never blocks.
pub trait Program: Send + Sync {
    /// Run the program and report what it did.
    ///
    /// An error means the frame must be dropped; it may already have been
    /// partly rewritten.
    fn run<B>(&self, frame: &mut B) -> Result<Outcome, Error>
    where
        B: FrameBuffer + ?Sized;

    fn process<B>(&self, frame: &mut B) -> Verdict
    where
        B: FrameBuffer + ?Sized,
    {
        match self.run(frame) {
            Ok(outcome) => outcome.into(),
            Err(_) => Verdict::Drop,
        }
    }
}

/// Identifies one invocation in the logs.
///
/// Invocations interleave, so every line a program logs carries the id of
/// the invocation that wrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u32);

impl RequestId {
    pub fn new() -> Self {
        Self(rand::random())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the UDP datagram of an Ethernet/IPv4/UDP frame sits, and where it
/// is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datagram {
    pub ip_header_len: usize,
    pub destination: Ipv4Addr,
    pub destination_port: u16,
}

impl Datagram {
    /// Offset of the UDP header within the frame.
    pub fn udp_offset(&self) -> usize {
        ETHERNET_HEADER_LEN + self.ip_header_len
    }
}

pub enum Classified {
    Udp(Datagram),
    Pass(PassReason),
}

/// Walk the Ethernet, IPv4 and UDP headers of a frame.
///
/// A header that does not fit in the frame, or an IPv4 header length below
/// the minimum, is an error and the frame must be dropped. Anything that is
/// not IPv4 carrying UDP is handed back as a reason to pass it through; that
/// includes an IPv4 ethertype whose header carries another version.
pub fn classify<B>(cursor: &HeaderCursor<'_, B>) -> Result<Classified, Error>
where
    B: FrameBuffer + ?Sized,
{
    if !cursor.parse::<EthernetHeader>(0)?.is_ipv4() {
        return Ok(Classified::Pass(PassReason::NotIpv4));
    }

    let ip = cursor.parse::<Ipv4Header>(ETHERNET_HEADER_LEN)?;
    if !ip.is_v4() {
        return Ok(Classified::Pass(PassReason::NotIpv4));
    }

    if !ip.is_udp() {
        return Ok(Classified::Pass(PassReason::NotUdp));
    }

    let ip_header_len = ip.header_len();
    if ip_header_len < IPV4_MIN_HEADER_LEN {
        return Err(Error::Malformed);
    }

    let destination = ip.destination();
    let udp = cursor.parse::<UdpHeader>(ETHERNET_HEADER_LEN + ip_header_len)?;
    Ok(Classified::Udp(Datagram {
        destination_port: udp.destination_port(),
        ip_header_len,
        destination,
    }))
}
