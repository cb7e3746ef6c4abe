use super::{Classified, Outcome, PassReason, Program, RequestId, classify};

use codec::{
    Error, buffer::FrameBuffer, channel_data::ChannelData, cursor::HeaderCursor,
    header::UDP_HEADER_LEN,
};

/// The port relayed traffic arrives on unless configured otherwise.
pub const DEFAULT_INGRESS_PORT: u16 = 2222;

/// Recognises inbound UDP traffic for a fixed destination port.
///
/// The classifier never modifies a frame. Undoing the ChannelData framing on
/// the way in is not done here, a match is only reported and logged.
#[derive(Debug, Clone, Copy)]
pub struct IngressClassifier {
    port: u16,
}

impl Default for IngressClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INGRESS_PORT)
    }
}

impl IngressClassifier {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn classify<B>(&self, id: RequestId, frame: &mut B) -> Result<Outcome, Error>
    where
        B: FrameBuffer + ?Sized,
    {
        let cursor = HeaderCursor::new(frame);

        let datagram = match classify(&cursor)? {
            Classified::Udp(it) => it,
            Classified::Pass(reason) => return Ok(Outcome::PassThrough(reason)),
        };

        if datagram.destination_port != self.port {
            return Ok(Outcome::PassThrough(PassReason::PortMismatch));
        }

        // The UDP header was parsed, so the payload offset is within the
        // frame.
        let payload = &cursor.as_bytes()[datagram.udp_offset() + UDP_HEADER_LEN..];
        let channel = ChannelData::decode(payload).ok().map(|it| it.number());

        log::debug!(
            "[ingress][{}] found ingress data: destination={}:{}, channel={:?}",
            id,
            datagram.destination,
            datagram.destination_port,
            channel
        );

        Ok(Outcome::Matched { channel })
    }
}

impl Program for IngressClassifier {
    fn run<B>(&self, frame: &mut B) -> Result<Outcome, Error>
    where
        B: FrameBuffer + ?Sized,
    {
        let id = RequestId::new();
        self.classify(id, frame)
            .inspect_err(|e| log::debug!("[ingress][{}] drop: {}", id, e))
    }
}
