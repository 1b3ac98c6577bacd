//! Framing for the radio link to the handheld controller.
//!
//! Packets go over an IEEE 802.15.4 transceiver (MRF24J40).  Outgoing payloads
//! get a fixed MAC header prepended; the receiver reports the header, the
//! payload and a two byte checksum trailer.
#![no_std]

#[cfg(test)]
extern crate std;

/// MAC header expected in front of every payload.
pub const HEADER: [u8; 8] = [0x01, 0x08, 0x00, 0xA1, 0xB2, 0xC3, 0xD4, 0x00];

/// Checksum bytes appended by the transceiver on receive.
pub const TRAILER_LEN: usize = 2;

/// Largest packet the transceiver handles.
pub const MAX_PACKET: usize = 127;

/// Largest payload that still fits a packet once framed.
pub const MAX_PAYLOAD: usize = MAX_PACKET - HEADER.len();

/// Radio channel used by the blade and the handheld.
pub const DEFAULT_CHANNEL: RfChannel = RfChannel(2);

pub type Packet = heapless::Vec<u8, MAX_PACKET>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Payload does not fit into a single packet
    PayloadTooLarge { len: usize },
    /// Channel outside of `0..=15`
    InvalidChannel(u8),
}

/// Transceiver channel, `0` to `15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RfChannel(u8);

impl RfChannel {
    pub const MAX: u8 = 15;

    pub fn new(channel: u8) -> Result<Self, LinkError> {
        if channel > Self::MAX {
            return Err(LinkError::InvalidChannel(channel));
        }
        Ok(Self(channel))
    }

    #[inline]
    pub fn number(self) -> u8 {
        self.0
    }
}

/// Prepend the MAC header to `payload`.
pub fn frame(payload: &[u8]) -> Result<Packet, LinkError> {
    let too_large = LinkError::PayloadTooLarge { len: payload.len() };
    if payload.len() > MAX_PAYLOAD {
        return Err(too_large);
    }

    let mut packet = Packet::new();
    packet.extend_from_slice(&HEADER).map_err(|_| too_large)?;
    packet.extend_from_slice(payload).map_err(|_| too_large)?;
    Ok(packet)
}

/// Strip header and trailer off a received packet, in place.
///
/// `reported_len` is the length given by the transceiver.  On success the
/// payload is moved to the start of `buf` and its length returned.  Packets
/// that are too short, overrun `buf` or carry a foreign header yield `0`.
pub fn unframe(buf: &mut [u8], reported_len: usize) -> usize {
    let overhead = HEADER.len() + TRAILER_LEN;
    if reported_len <= overhead || reported_len > buf.len() {
        return 0;
    }
    if buf[..HEADER.len()] != HEADER {
        return 0;
    }

    let payload_len = reported_len - overhead;
    buf.copy_within(HEADER.len()..HEADER.len() + payload_len, 0);
    payload_len
}
