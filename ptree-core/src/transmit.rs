//! Transmission channels: "send this packet to this address".
//!
//! Workers own one [`Transmitter`] each and obtain replacements from a
//! shared [`ChannelOpener`]. The in-tree implementation is an ICMPv6
//! socket created with `socket2` and driven by Tokio's `AsyncFd`. Other
//! senders (pcap, PF_RING) plug in behind the same traits.

use std::io;
use std::net::Ipv6Addr;

use async_trait::async_trait;

// ── Traits ───────────────────────────────────────────────────────

/// An open send capability, exclusively owned by one worker.
#[async_trait]
pub trait Transmitter: Send {
    /// Best-effort single send. Nothing is read back.
    async fn transmit(&mut self, packet: &[u8], dst: Ipv6Addr) -> io::Result<()>;
}

/// Creates fresh [`Transmitter`]s, both at worker start and after a
/// failed send.
#[async_trait]
pub trait ChannelOpener: Send + Sync {
    async fn open(&self) -> io::Result<Box<dyn Transmitter>>;
}

// ── SocketType ───────────────────────────────────────────────────

/// Kind of ICMPv6 socket to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SocketType {
    /// `SOCK_RAW`; needs `CAP_NET_RAW` or root.
    #[default]
    Raw,
    /// `SOCK_DGRAM` "ping socket"; needs `net.ipv4.ping_group_range`.
    Dgram,
}

impl SocketType {
    fn as_socket2(self) -> socket2::Type {
        match self {
            SocketType::Raw => socket2::Type::RAW,
            SocketType::Dgram => socket2::Type::DGRAM,
        }
    }
}

// ── IcmpSocketOpener ─────────────────────────────────────────────

/// Opens non-blocking ICMPv6 sockets bound to `::`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcmpSocketOpener {
    socket_type: SocketType,
}

impl IcmpSocketOpener {
    pub fn new(socket_type: SocketType) -> Self {
        Self { socket_type }
    }

    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    fn socket(&self) -> io::Result<socket2::Socket> {
        let socket = socket2::Socket::new(
            socket2::Domain::IPV6,
            self.socket_type.as_socket2(),
            Some(socket2::Protocol::ICMPV6),
        )?;
        socket.set_nonblocking(true)?;
        Ok(socket)
    }
}

#[cfg(unix)]
#[async_trait]
impl ChannelOpener for IcmpSocketOpener {
    async fn open(&self) -> io::Result<Box<dyn Transmitter>> {
        let fd = tokio::io::unix::AsyncFd::new(self.socket()?)?;
        Ok(Box::new(IcmpSocket { fd }))
    }
}

#[cfg(not(unix))]
#[async_trait]
impl ChannelOpener for IcmpSocketOpener {
    async fn open(&self) -> io::Result<Box<dyn Transmitter>> {
        // Creating the socket still surfaces permission errors early.
        let _ = self.socket()?;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "ICMPv6 sockets are only supported on unix",
        ))
    }
}

// ── IcmpSocket ───────────────────────────────────────────────────

/// A single ICMPv6 socket registered with the Tokio reactor.
#[cfg(unix)]
pub struct IcmpSocket {
    fd: tokio::io::unix::AsyncFd<socket2::Socket>,
}

#[cfg(unix)]
#[async_trait]
impl Transmitter for IcmpSocket {
    async fn transmit(&mut self, packet: &[u8], dst: Ipv6Addr) -> io::Result<()> {
        let target = socket2::SockAddr::from(std::net::SocketAddrV6::new(dst, 0, 0, 0));
        loop {
            let mut guard = self.fd.writable().await?;
            match guard.try_io(|inner| inner.get_ref().send_to(packet, &target)) {
                Ok(result) => return result.map(|_| ()),
                Err(_would_block) => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_socket_is_raw() {
        assert_eq!(IcmpSocketOpener::default().socket_type(), SocketType::Raw);
        assert_eq!(SocketType::Dgram.as_socket2(), socket2::Type::DGRAM);
    }
}
