//! GTP-C echo path
//!
//! Receive-side handling for the simulator socket:
//! - classify each incoming datagram (Echo Request vs anything else)
//! - encode the matching Echo Response once per request
//! - fan reply instances out per the session delivery policy, sending
//!   due-now instances directly and queueing delayed ones

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Instant;

use bytes::Bytes;
use rand::Rng;

use gsn_core::{DeliveryPolicy, ScheduledDelivery, Scheduler};
use gsn_gtp::{EchoMessage, GtpResult};

/// Outcome of classifying one datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchoRecvResult {
    /// A well-formed Echo Request that wants a reply
    Request(EchoMessage),
    /// Well-formed GTP, but not an Echo Request; ignored without reply
    NotEchoRequest { message_type: u8 },
}

/// Decode one datagram and classify it
///
/// Decode failures bubble up so the caller can drop the datagram; a
/// non-Echo-Request message type is a successful classification, not an
/// error.
pub fn recv_echo(data: &[u8]) -> GtpResult<EchoRecvResult> {
    let mut buf = Bytes::copy_from_slice(data);
    let msg = EchoMessage::decode(&mut buf)?;
    if msg.is_echo_request() {
        Ok(EchoRecvResult::Request(msg))
    } else {
        Ok(EchoRecvResult::NotEchoRequest {
            message_type: msg.message_type,
        })
    }
}

/// Handle one received datagram end to end
///
/// Malformed datagrams and non-Echo-Request messages are logged and
/// dropped; the listener keeps serving. Only a failed immediate send is
/// returned, since the service cannot continue without its transport.
pub fn handle_datagram(
    socket: &UdpSocket,
    sched: &Scheduler,
    policy: DeliveryPolicy,
    rng: &mut impl Rng,
    data: &[u8],
    from: SocketAddr,
) -> io::Result<()> {
    let msg = match recv_echo(data) {
        Ok(EchoRecvResult::Request(msg)) => msg,
        Ok(EchoRecvResult::NotEchoRequest { message_type }) => {
            log::debug!(
                "[DROP] Not an Echo Request (type {}) from [{}]",
                message_type,
                from
            );
            return Ok(());
        }
        Err(e) => {
            log::error!("[DROP] {} from [{}]", e, from);
            return Ok(());
        }
    };

    log::info!(
        "[RECV] Echo Request v{} seq 0x{:04x} ({} bytes) from [{}]",
        msg.version,
        msg.sequence_number,
        data.len(),
        from
    );

    // One encode per request; every instance reuses the same bytes
    let reply = msg.encode_response().freeze();
    let now = Instant::now();
    for due in policy.due_times(now, rng) {
        if due <= now {
            socket.send_to(&reply, from)?;
            log::info!("[SEND] Echo Response ({} bytes) to [{}]", reply.len(), from);
        } else {
            let delay = due - now;
            sched.enqueue(ScheduledDelivery {
                due,
                destination: from,
                payload: reply.clone(),
            });
            log::info!(
                "[QUEUE] Echo Response delayed {}ms to [{}]",
                delay.as_millis(),
                from
            );
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
