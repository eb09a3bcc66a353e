//! GSN Simulator GTP Echo Codec
//!
//! This crate provides parsing and building of GTP Echo Request/Response
//! messages for the GSN simulator. It understands the GTPv1 echo layout
//! (3GPP TS 29.060) and both GTPv2 echo layouts (3GPP TS 29.274) and
//! nothing else: the simulator only models the Echo exchange.

pub mod echo;
pub mod error;


pub use echo::{
    EchoLayout, EchoMessage, GTP_ECHO_REQUEST, GTP_ECHO_RESPONSE, GTPV1_ECHO_LEN, GTPV2_ECHO_LEN,
    GTPV2_ECHO_TEID_LEN, GTP_VERSION_1, GTP_VERSION_2,
};
pub use error::{GtpError, GtpResult};

/// GTP-C UDP port (2123)
pub const GTPC_UDP_PORT: u16 = 2123;
