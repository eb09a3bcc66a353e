//! GTP Echo Request/Response codec
//!
//! Parses the three Echo wire layouts a GSN answers on the GTP-C port and
//! re-serializes the mirrored Echo Response:
//! - GTPv1: 12 bytes, always carries TEID, N-PDU number and next extension
//!   header type (3GPP TS 29.060).
//! - GTPv2 without TEID: 8 bytes (3GPP TS 29.274).
//! - GTPv2 with TEID: 12 bytes.
//!
//! The layout is keyed by the version bits of the first octet plus the
//! datagram length, so the decoded message keeps an explicit layout tag:
//! v1 and v2-with-TEID are both 12 bytes on the wire and cannot be told
//! apart again once the fields are pulled out.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{GtpError, GtpResult};

/// GTP version 1
pub const GTP_VERSION_1: u8 = 1;

/// GTP version 2
pub const GTP_VERSION_2: u8 = 2;

/// Echo Request message type
pub const GTP_ECHO_REQUEST: u8 = 1;

/// Echo Response message type
pub const GTP_ECHO_RESPONSE: u8 = 2;

/// GTPv1 Echo wire size
pub const GTPV1_ECHO_LEN: usize = 12;

/// GTPv2 Echo wire size without TEID
pub const GTPV2_ECHO_LEN: usize = 8;

/// GTPv2 Echo wire size with TEID
pub const GTPV2_ECHO_TEID_LEN: usize = 12;

/// Flags and message-type octets common to every layout
pub const ECHO_COMMON_LEN: usize = 2;

/// Echo wire-layout variant
///
/// Travels with the decoded message; `encode_response` always mirrors the
/// layout the request arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoLayout {
    /// GTPv1, 12 bytes
    V1,
    /// GTPv2, 8 bytes, no TEID
    V2NoTeid,
    /// GTPv2, 12 bytes, with TEID
    V2WithTeid,
}

impl EchoLayout {
    /// Wire size of this layout
    pub fn wire_len(&self) -> usize {
        match self {
            EchoLayout::V1 => GTPV1_ECHO_LEN,
            EchoLayout::V2NoTeid => GTPV2_ECHO_LEN,
            EchoLayout::V2WithTeid => GTPV2_ECHO_TEID_LEN,
        }
    }

    /// Whether this layout carries a TEID field
    pub fn has_teid(&self) -> bool {
        !matches!(self, EchoLayout::V2NoTeid)
    }
}

/// Decoded GTP Echo message
///
/// Every field is echoed verbatim into the response; in particular `flags`
/// keeps the raw first octet (version, protocol type, E/S/PN bits) and
/// `length` is never recomputed, even when it disagrees with the actual
/// datagram size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoMessage {
    /// Wire-layout variant this message was decoded from
    pub layout: EchoLayout,
    /// Version (top 3 bits of the first octet)
    pub version: u8,
    /// Raw first octet
    pub flags: u8,
    /// Message type (1 = Echo Request, 2 = Echo Response)
    pub message_type: u8,
    /// Declared payload length
    pub length: u16,
    /// Tunnel Endpoint Identifier (absent only in the 8-byte v2 layout)
    pub teid: Option<u32>,
    /// Sequence number
    pub sequence_number: u16,
    /// N-PDU number (v1 only)
    pub npdu_number: Option<u8>,
    /// Next extension header type (v1 only)
    pub next_extension_header_type: Option<u8>,
    /// Spare padding (v2 only)
    pub spare: Option<u16>,
}

impl EchoMessage {
    /// Decode an Echo message from a whole datagram
    ///
    /// The datagram length takes part in layout dispatch, so `buf` must
    /// hold exactly one datagram. Decoding succeeds for any message type;
    /// classifying non-Echo-Request traffic is the receive path's job.
    pub fn decode(buf: &mut Bytes) -> GtpResult<Self> {
        let wire_len = buf.remaining();
        if wire_len < ECHO_COMMON_LEN {
            return Err(GtpError::BufferTooShort {
                needed: ECHO_COMMON_LEN,
                available: wire_len,
            });
        }

        let flags = buf.get_u8();
        let message_type = buf.get_u8();
        let version = (flags >> 5) & 0x07;

        match version {
            GTP_VERSION_1 => {
                if wire_len != GTPV1_ECHO_LEN {
                    return Err(GtpError::MalformedPacket(wire_len));
                }
                let length = buf.get_u16();
                let teid = buf.get_u32();
                let sequence_number = buf.get_u16();
                let npdu_number = buf.get_u8();
                let next_extension_header_type = buf.get_u8();
                Ok(Self {
                    layout: EchoLayout::V1,
                    version,
                    flags,
                    message_type,
                    length,
                    teid: Some(teid),
                    sequence_number,
                    npdu_number: Some(npdu_number),
                    next_extension_header_type: Some(next_extension_header_type),
                    spare: None,
                })
            }
            GTP_VERSION_2 => match wire_len {
                GTPV2_ECHO_LEN => {
                    let length = buf.get_u16();
                    let sequence_number = buf.get_u16();
                    let spare = buf.get_u16();
                    Ok(Self {
                        layout: EchoLayout::V2NoTeid,
                        version,
                        flags,
                        message_type,
                        length,
                        teid: None,
                        sequence_number,
                        npdu_number: None,
                        next_extension_header_type: None,
                        spare: Some(spare),
                    })
                }
                GTPV2_ECHO_TEID_LEN => {
                    let length = buf.get_u16();
                    let teid = buf.get_u32();
                    let sequence_number = buf.get_u16();
                    let spare = buf.get_u16();
                    Ok(Self {
                        layout: EchoLayout::V2WithTeid,
                        version,
                        flags,
                        message_type,
                        length,
                        teid: Some(teid),
                        sequence_number,
                        npdu_number: None,
                        next_extension_header_type: None,
                        spare: Some(spare),
                    })
                }
                _ => Err(GtpError::UnsupportedLength(wire_len)),
            },
            _ => Err(GtpError::UnsupportedVersion(version)),
        }
    }

    /// Whether this message is an Echo Request
    pub fn is_echo_request(&self) -> bool {
        self.message_type == GTP_ECHO_REQUEST
    }

    /// Encode the mirrored Echo Response
    ///
    /// Re-serializes the message in the exact layout it was decoded from,
    /// with the message type forced to Echo Response and every other field
    /// unchanged. There is no path that builds a fresh request; responses
    /// are always derived from a parsed one.
    pub fn encode_response(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.layout.wire_len());
        buf.put_u8(self.flags);
        buf.put_u8(GTP_ECHO_RESPONSE);
        buf.put_u16(self.length);

        match self.layout {
            EchoLayout::V1 => {
                buf.put_u32(self.teid.unwrap_or(0));
                buf.put_u16(self.sequence_number);
                buf.put_u8(self.npdu_number.unwrap_or(0));
                buf.put_u8(self.next_extension_header_type.unwrap_or(0));
            }
            EchoLayout::V2NoTeid => {
                buf.put_u16(self.sequence_number);
                buf.put_u16(self.spare.unwrap_or(0));
            }
            EchoLayout::V2WithTeid => {
                buf.put_u32(self.teid.unwrap_or(0));
                buf.put_u16(self.sequence_number);
                buf.put_u16(self.spare.unwrap_or(0));
            }
        }

        buf
    }
}
