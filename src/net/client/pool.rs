//! A pool of transports to name servers.
//!
//! The [`TransportPool`] keeps at most one UDP and one TCP transport for
//! each server address. A transport is handed out again for as long as it
//! is alive. Transports without queries in flight that haven’t seen any
//! traffic for the configured idle timeout are closed and dropped.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::channel::{AsyncConnect, Channel};
use super::error::Error;
use super::tcp::{TcpChannel, TcpConnect};
use super::transport::{Config, MessageTransport};
use super::udp::{UdpChannel, UdpConnect};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

//------------ TransportPool -------------------------------------------------

/// A pool of UDP and TCP transports keyed by server address.
#[derive(Debug)]
pub struct TransportPool {
    /// The config used for new transports.
    config: Config,

    /// How long an unused transport is kept.
    idle_timeout: Duration,

    /// The UDP transports.
    udp: Mutex<HashMap<SocketAddr, MessageTransport<UdpChannel>>>,

    /// The TCP transports.
    tcp: Mutex<HashMap<SocketAddr, MessageTransport<TcpChannel>>>,
}

impl TransportPool {
    /// Creates a new, empty pool.
    pub fn new(config: Config, idle_timeout: Duration) -> Self {
        TransportPool {
            config,
            idle_timeout,
            udp: Mutex::new(HashMap::new()),
            tcp: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Returns a UDP transport to the given server.
    pub async fn udp(
        &self,
        addr: SocketAddr,
    ) -> Result<MessageTransport<UdpChannel>, Error> {
        self.evict_idle();
        Self::get(&self.udp, addr, UdpConnect::new(addr), &self.config).await
    }

    /// Returns a TCP transport to the given server.
    pub async fn tcp(
        &self,
        addr: SocketAddr,
    ) -> Result<MessageTransport<TcpChannel>, Error> {
        self.evict_idle();
        Self::get(&self.tcp, addr, TcpConnect::new(addr), &self.config).await
    }

    /// Returns a live transport from `map` or connects a new one.
    async fn get<A, C>(
        map: &Mutex<HashMap<SocketAddr, MessageTransport<C>>>,
        addr: SocketAddr,
        connect: A,
        config: &Config,
    ) -> Result<MessageTransport<C>, Error>
    where
        A: AsyncConnect<Connection = C>,
        C: Channel,
    {
        if let Some(transport) = map.lock().get(&addr) {
            if transport.is_alive() {
                return Ok(transport.clone());
            }
        }
        debug!(%addr, "connecting new transport");
        let transport =
            MessageTransport::connect(&connect, config.clone()).await?;
        let mut map = map.lock();
        match map.get(&addr) {
            // Someone else was quicker.
            Some(existing) if existing.is_alive() => {
                transport.close();
                Ok(existing.clone())
            }
            _ => {
                map.insert(addr, transport.clone());
                Ok(transport)
            }
        }
    }

    /// Closes and drops dead and idle transports.
    ///
    /// Returns the number of transports dropped.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        Self::evict(&mut self.udp.lock(), now, self.idle_timeout)
            + Self::evict(&mut self.tcp.lock(), now, self.idle_timeout)
    }

    /// Evicts transports from a single map.
    fn evict<C: Channel>(
        map: &mut HashMap<SocketAddr, MessageTransport<C>>,
        now: Instant,
        idle_timeout: Duration,
    ) -> usize {
        let before = map.len();
        map.retain(|addr, transport| {
            if !transport.is_alive() {
                debug!(%addr, "dropping dead transport");
                return false;
            }
            if transport.is_idle()
                && now.saturating_duration_since(transport.last_activity())
                    >= idle_timeout
            {
                debug!(%addr, "closing idle transport");
                transport.close();
                return false;
            }
            true
        });
        before - map.len()
    }

    /// Returns the number of transports in the pool.
    pub fn len(&self) -> usize {
        self.udp.lock().len() + self.tcp.lock().len()
    }

    /// Returns whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes all transports.
    pub fn close(&self) {
        for (_, transport) in self.udp.lock().drain() {
            transport.close()
        }
        for (_, transport) in self.tcp.lock().drain() {
            transport.close()
        }
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use tokio::net::{TcpListener, UdpSocket};

    #[tokio::test]
    async fn reuse() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        let pool = TransportPool::new(Config::new(), Duration::from_secs(60));

        let first = pool.udp(addr).await.unwrap();
        let second = pool.udp(addr).await.unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.evict_idle(), 0);

        // Both handles refer to the same transport.
        second.close();
        assert!(!first.is_alive());
    }

    #[tokio::test]
    async fn evict_idle() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        let pool = TransportPool::new(Config::new(), Duration::ZERO);

        let transport = pool.udp(addr).await.unwrap();
        assert!(transport.is_idle());
        assert_eq!(pool.evict_idle(), 1);
        assert!(!transport.is_alive());
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn replaces_dead() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let pool = TransportPool::new(Config::new(), Duration::from_secs(60));

        let first = pool.tcp(addr).await.unwrap();
        let again = pool.tcp(addr).await.unwrap();
        assert_eq!(pool.len(), 1);
        first.close();
        assert!(!again.is_alive());
        let fresh = pool.tcp(addr).await.unwrap();
        assert!(fresh.is_alive());
        assert_eq!(pool.len(), 1);
        pool.close();
        assert!(!fresh.is_alive());
        assert!(pool.is_empty());
    }
}
