//! DNS over UDP.
//!
//! A [`UdpChannel`] uses a connected UDP socket bound to a random local
//! port. Since anybody can send datagrams to that port, anything that
//! doesn’t parse as a DNS message is ignored.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::channel::{AsyncConnect, Channel, ChannelFuture};
use super::error::TransportError;
use crate::base::Message;
use core::future::Future;
use core::pin::Pin;
use rand::Rng;
use std::boxed::Box;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::trace;

/// How many times do we try a new random port if we get ‘address in use.’
const RETRY_RANDOM_PORT: usize = 10;

/// The size of the receive buffer.
///
/// Responses without EDNS are limited to 512 octets but servers have been
/// seen to ignore that.
const RECV_SIZE: usize = 4096;

//------------ UdpConnect ----------------------------------------------------

/// Create new UDP channels.
#[derive(Clone, Copy, Debug)]
pub struct UdpConnect {
    /// Remote address to connect to.
    addr: SocketAddr,
}

impl UdpConnect {
    /// Create new UDP channels.
    ///
    /// addr is the destination address to connect to.
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

impl AsyncConnect for UdpConnect {
    type Connection = UdpChannel;
    type Fut = Pin<
        Box<
            dyn Future<Output = Result<Self::Connection, std::io::Error>>
                + Send,
        >,
    >;

    fn connect(&self) -> Self::Fut {
        Box::pin(UdpChannel::connect(self.addr))
    }
}

//------------ UdpChannel ----------------------------------------------------

/// A UDP ‘connection’ to a single server.
#[derive(Debug)]
pub struct UdpChannel {
    /// The connected socket.
    sock: UdpSocket,

    /// Whether the channel has been closed.
    closed: AtomicBool,
}

impl UdpChannel {
    /// Creates a new channel to the given server.
    pub async fn connect(addr: SocketAddr) -> Result<Self, io::Error> {
        let sock = Self::udp_bind(addr.is_ipv4()).await?;
        sock.connect(addr).await?;
        trace!(local = ?sock.local_addr().ok(), %addr, "UDP channel connected");
        Ok(Self {
            sock,
            closed: AtomicBool::new(false),
        })
    }

    /// Bind to a random local UDP port.
    ///
    /// If all attempts find the port in use, leaves the choice to the
    /// system.
    async fn udp_bind(v4: bool) -> Result<UdpSocket, io::Error> {
        let mut i = 0;
        loop {
            let port = if i == RETRY_RANDOM_PORT {
                0
            } else {
                rand::thread_rng().gen_range(1024..=u16::MAX)
            };
            let local: SocketAddr = if v4 {
                ([0u8; 4], port).into()
            } else {
                ([0u16; 8], port).into()
            };
            match UdpSocket::bind(&local).await {
                Ok(sock) => return Ok(sock),
                Err(err) => {
                    if i == RETRY_RANDOM_PORT
                        || err.kind() != io::ErrorKind::AddrInUse
                    {
                        return Err(err);
                    } else {
                        i += 1
                    }
                }
            }
        }
    }

    /// Returns the error for using a closed channel.
    fn closed_error() -> TransportError {
        TransportError::Write(Arc::new(io::Error::new(
            io::ErrorKind::NotConnected,
            "channel closed",
        )))
    }
}

impl Channel for UdpChannel {
    fn send<'a>(&'a self, msg: &'a [u8]) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            if self.closed.load(Ordering::Relaxed) {
                return Err(Self::closed_error());
            }
            let sent = self
                .sock
                .send(msg)
                .await
                .map_err(|err| TransportError::Write(Arc::new(err)))?;
            if sent != msg.len() {
                return Err(TransportError::ShortSend);
            }
            Ok(())
        })
    }

    fn receive(&self) -> ChannelFuture<'_, Message> {
        Box::pin(async move {
            loop {
                let mut buf = vec![0; RECV_SIZE];
                let len = self
                    .sock
                    .recv(&mut buf)
                    .await
                    .map_err(|err| TransportError::Read(Arc::new(err)))?;
                buf.truncate(len);
                match Message::from_octets(buf.into()) {
                    Ok(msg) => return Ok(msg),
                    Err(err) => {
                        // Ignore garbage.
                        trace!("ignoring malformed datagram: {}", err);
                    }
                }
            }
        })
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed)
    }

    fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::Relaxed)
    }
}

//============ Tests =========================================================
