use super::{
    Classified, Datagram, Outcome, PassReason, Program, RequestId, classify,
    store::{FlowState, FlowStateStore},
};

use codec::{
    Error,
    buffer::FrameBuffer,
    channel_data::ChannelDataHeader,
    checksum::ChecksumUpdater,
    cursor::HeaderCursor,
    header::{
        ETHERNET_HEADER_LEN, IP_CHECKSUM_OFFSET, Ipv4HeaderMut, UDP_CHECKSUM_OFFSET,
        UDP_HEADER_LEN, UdpHeader, UdpHeaderMut,
    },
};

/// Rewrites outbound UDP datagrams for flows that are relayed through a TURN
/// server.
///
/// For every Ethernet/IPv4/UDP frame the destination port and address are
/// looked up in the flow store. On a hit the destination port may be
/// replaced by the state's local port, and the datagram may be wrapped in a
/// ChannelData message for the state's channel. Frames without state are
/// accepted untouched.
///
/// Every header is re-derived from the frame after each step that can move
/// it, and every checksum change is applied incrementally in the order the
/// fields were written. Any failure part way through drops the frame.
pub struct EgressRewriter<S> {
    store: S,
}

impl<S> EgressRewriter<S>
where
    S: FlowStateStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn rewrite<B>(&self, id: RequestId, frame: &mut B) -> Result<Outcome, Error>
    where
        B: FrameBuffer + ?Sized,
    {
        let mut cursor = HeaderCursor::new(frame);

        let datagram = match classify(&cursor)? {
            Classified::Udp(it) => it,
            Classified::Pass(reason) => return Ok(Outcome::PassThrough(reason)),
        };

        let Some(state) = self
            .store
            .lookup(datagram.destination_port, datagram.destination)
            .filter(|it| !it.is_empty())
        else {
            return Ok(Outcome::PassThrough(PassReason::NoFlowState));
        };

        log::debug!(
            "[egress][{}] found flow state: destination={}:{}, state={:?}",
            id,
            datagram.destination,
            datagram.destination_port,
            state
        );

        if state.local_port != 0 {
            rewrite_port(id, &mut cursor, &datagram, &state)?;
        }

        if state.channel_id != 0 {
            insert_channel_data(id, &mut cursor, &datagram, &state)?;
        }

        Ok(Outcome::Rewritten {
            port_rewritten: state.local_port != 0,
            channel_inserted: state.channel_id != 0,
        })
    }
}

impl<S> Program for EgressRewriter<S>
where
    S: FlowStateStore,
{
    fn run<B>(&self, frame: &mut B) -> Result<Outcome, Error>
    where
        B: FrameBuffer + ?Sized,
    {
        let id = RequestId::new();
        self.rewrite(id, frame)
            .inspect_err(|e| log::debug!("[egress][{}] drop: {}", id, e))
    }
}

fn rewrite_port<B>(
    id: RequestId,
    cursor: &mut HeaderCursor<'_, B>,
    datagram: &Datagram,
    state: &FlowState,
) -> Result<(), Error>
where
    B: FrameBuffer + ?Sized,
{
    let udp_offset = datagram.udp_offset();
    let old_port = {
        let mut udp = cursor.parse_mut::<UdpHeaderMut>(udp_offset)?;
        let old_port = udp.destination_port();
        udp.set_destination_port(state.local_port);
        old_port
    };

    log::debug!(
        "[egress][{}] rewriting destination port: {} => {}",
        id,
        old_port,
        state.local_port
    );

    ChecksumUpdater::patch16(
        cursor,
        udp_offset + UDP_CHECKSUM_OFFSET,
        old_port,
        state.local_port,
        true,
    )
}

/// Open a gap after the UDP header and write a ChannelData header into it.
///
/// The frame grows by the header size, the IPv4 total length and the UDP
/// length grow with it, and the payload moves back by the header size.
fn insert_channel_data<B>(
    id: RequestId,
    cursor: &mut HeaderCursor<'_, B>,
    datagram: &Datagram,
    state: &FlowState,
) -> Result<(), Error>
where
    B: FrameBuffer + ?Sized,
{
    let pad_len = ChannelDataHeader::LEN as u16;
    let udp_offset = datagram.udp_offset();

    let udp_len = cursor.parse::<UdpHeader>(udp_offset)?.length() as usize;
    if udp_len < UDP_HEADER_LEN {
        return Err(Error::Malformed);
    }

    // The datagram must be fully inside the frame, growing must not invent
    // payload.
    if udp_offset + udp_len > cursor.len() {
        return Err(Error::OutOfBounds);
    }

    log::debug!(
        "[egress][{}] inserting turn channel data: channel={}, payload={}",
        id,
        state.channel_id,
        udp_len - UDP_HEADER_LEN
    );

    cursor.grow(udp_offset + udp_len + ChannelDataHeader::LEN)?;

    let (ip_old_len, ip_new_len) = {
        let mut ip = cursor.parse_mut::<Ipv4HeaderMut>(ETHERNET_HEADER_LEN)?;
        let old_len = ip.total_len();
        let new_len = old_len.checked_add(pad_len).ok_or(Error::Malformed)?;
        ip.set_total_len(new_len);
        (old_len, new_len)
    };

    ChecksumUpdater::patch16(cursor, IP_CHECKSUM_OFFSET, ip_old_len, ip_new_len, false)?;

    let (udp_old_len, udp_new_len) = {
        let mut udp = cursor.parse_mut::<UdpHeaderMut>(udp_offset)?;
        let old_len = udp.length();
        let new_len = old_len.checked_add(pad_len).ok_or(Error::Malformed)?;
        udp.set_length(new_len);
        (old_len, new_len)
    };

    let payload_offset = udp_offset + UDP_HEADER_LEN;
    cursor.shift_payload_right(payload_offset, ChannelDataHeader::LEN)?;

    let header = ChannelDataHeader {
        number: state.channel_id,
        length: (udp_len - UDP_HEADER_LEN) as u16,
    };

    cursor.write(payload_offset, &header.encode())?;

    // The UDP length is summed twice, once in the header and once in the
    // pseudo-header. The inserted words replace nothing, their old value
    // is zero.
    let check_offset = udp_offset + UDP_CHECKSUM_OFFSET;
    ChecksumUpdater::patch16(cursor, check_offset, udp_old_len, udp_new_len, true)?;
    ChecksumUpdater::patch16(cursor, check_offset, udp_old_len, udp_new_len, true)?;
    ChecksumUpdater::patch16(cursor, check_offset, 0, header.number, true)?;
    ChecksumUpdater::patch16(cursor, check_offset, 0, header.length, true)?;

    log::trace!(
        "[egress][{}] frame grown: len={}, ip_len={}, udp_len={}",
        id,
        cursor.len(),
        ip_new_len,
        udp_new_len
    );

    Ok(())
}
