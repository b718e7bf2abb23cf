//! The probe sent to every pixel address.
//!
//! Every transmission reuses the same ICMPv6 Echo Request bytes. The
//! template is built once at startup and shared read-only by all workers.

use std::fmt::Debug;

use bytes::{BufMut, Bytes, BytesMut};

/// ICMPv6 Echo Request message type.
pub const ICMPV6_ECHO_REQUEST: u8 = 128;

/// Identifier carried by every probe.
pub const ECHO_IDENTIFIER: u16 = 0xFFFF;

/// Sequence number carried by every probe.
pub const ECHO_SEQUENCE: u16 = 1;

/// Header length of an ICMPv6 echo message.
pub const ECHO_HEADER_LENGTH: usize = 8;

/// Immutable probe payload. Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct PacketTemplate {
    bytes: Bytes,
}

impl PacketTemplate {
    /// An ICMPv6 Echo Request with an empty body.
    ///
    /// The checksum is left zero: the kernel fills it in for ICMPv6
    /// sockets since it depends on the per-destination pseudo header.
    pub fn echo_request() -> Self {
        Self::echo_request_with(ECHO_IDENTIFIER, ECHO_SEQUENCE, &[])
    }

    pub fn echo_request_with(identifier: u16, sequence: u16, body: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(ECHO_HEADER_LENGTH + body.len());
        buf.put_u8(ICMPV6_ECHO_REQUEST);
        buf.put_u8(0); // code
        buf.put_u16(0); // checksum
        buf.put_u16(identifier);
        buf.put_u16(sequence);
        buf.put_slice(body);
        Self {
            bytes: buf.freeze(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Default for PacketTemplate {
    fn default() -> Self {
        Self::echo_request()
    }
}

impl Debug for PacketTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketTemplate")
            .field("bytes", &format_args!("{:02x?}", &self.bytes[..]))
            .finish()
    }
}
