//! A stub resolver.
//!
//! The most simple resolver possible simply relays all questions to one of
//! a set of pre-configured resolvers that will do the actual work. This is
//! equivalent to what the resolver part of the C library does. This module
//! provides such a stub resolver that emulates this C resolver as closely
//! as possible, in particular in the way it is being configured.

use super::conf::{ResolvConf, ResolvOptions};
use super::error::Error;
use super::hosts::Hosts;
use super::lookup::{lookup_addr, lookup_host, FoundAddrs, FoundHosts};
use super::name::{normalize_name, NameError};
use crate::base::iana::{Rcode, Rtype};
use crate::base::message::Message;
use crate::base::name::Dname;
use crate::base::question::Question;
use crate::net::client::pool::TransportPool;
use crate::net::client::transport::Config;
use crate::net::client;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime;
use tracing::{debug, trace};

//------------ StubResolver --------------------------------------------------

/// A DNS stub resolver.
///
/// This type collects all information making it possible to start DNS
/// queries. You can create a new resolver using the system’s configuration
/// using the [`new()`] associate function or using your own configuration
/// with [`from_conf()`].
///
/// Stub resolver values can be cloned relatively cheaply as they keep all
/// information behind an arc. Clones share their transports.
///
/// If you want to run a single query or lookup on a resolver synchronously,
/// you can do so simply by using the [`run()`] or [`run_with_conf()`]
/// associated functions.
///
/// [`new()`]: #method.new
/// [`from_conf()`]: #method.from_conf
/// [`run()`]: #method.run
/// [`run_with_conf()`]: #method.run_with_conf
#[derive(Clone, Debug)]
pub struct StubResolver {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// The resolver configuration.
    conf: ResolvConf,

    /// The static host table.
    hosts: Hosts,

    /// The transports to the servers.
    pool: TransportPool,

    /// Counts queries for rotating through the servers.
    counter: AtomicUsize,
}

impl StubResolver {
    /// Creates a new resolver using the system’s default configuration.
    pub fn new() -> Self {
        Self::with_hosts(ResolvConf::system(), Hosts::system())
    }

    /// Creates a new resolver using the given configuration.
    ///
    /// The resolver will have an empty host table.
    pub fn from_conf(conf: ResolvConf) -> Self {
        Self::with_hosts(conf, Hosts::new())
    }

    /// Creates a new resolver using the given configuration and hosts.
    pub fn with_hosts(conf: ResolvConf, hosts: Hosts) -> Self {
        let mut config = Config::new();
        config.set_recursion_desired(conf.options.recurse);
        let pool = TransportPool::new(config, conf.options.idle_timeout);
        StubResolver {
            inner: Arc::new(Inner {
                conf,
                hosts,
                pool,
                counter: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns the resolver’s options.
    pub fn options(&self) -> &ResolvOptions {
        &self.inner.conf.options
    }

    /// Returns the resolver’s configuration.
    pub fn conf(&self) -> &ResolvConf {
        &self.inner.conf
    }

    /// Returns the resolver’s host table.
    pub fn hosts(&self) -> &Hosts {
        &self.inner.hosts
    }

    /// Returns whether both values are clones of the same resolver.
    pub fn same_as(&self, other: &StubResolver) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Closes all transports of the resolver.
    ///
    /// Queries in flight fail. The resolver can still be used afterwards
    /// and will open new transports as needed.
    pub fn close(&self) {
        self.inner.pool.close()
    }
}

/// # Queries
///
impl StubResolver {
    /// Queries the records of the given type for a domain name.
    ///
    /// The name is normalized and always treated as absolute. The search
    /// list is not applied.
    pub async fn query(&self, name: &str, rtype: Rtype) -> Result<Message, Error> {
        let name = normalize_name(name)?;
        let qname = Dname::from_str(&name).map_err(NameError::from)?;
        self.query_question(&Question::new_in(qname, rtype)).await
    }

    /// Asks a question of the configured servers.
    ///
    /// The servers are tried in order for the configured number of
    /// attempts. A server that fails or answers with a response code
    /// indicating it couldn’t process the question is skipped. If no
    /// server gives a proper answer, the last answer received is
    /// returned or, if there was none, the last error.
    pub async fn query_question(
        &self,
        question: &Question,
    ) -> Result<Message, Error> {
        let servers = self.server_order();
        let mut last_answer = None;
        let mut last_err = None;
        for _ in 0..self.options().attempts.max(1) {
            for &addr in &servers {
                match self.query_server(addr, question).await {
                    Ok(answer) if is_server_failure(answer.header().rcode()) => {
                        debug!(
                            %addr,
                            rcode = %answer.header().rcode(),
                            "server failed, trying next"
                        );
                        last_answer = Some(answer);
                    }
                    Ok(answer) => return Ok(answer),
                    Err(err) => {
                        debug!(%addr, %err, "query failed, trying next");
                        last_err = Some(err);
                    }
                }
            }
        }
        match (last_answer, last_err) {
            (Some(answer), _) => Ok(answer),
            (None, Some(err)) => Err(err.into()),
            (None, None) => Err(Error::NoServers),
        }
    }

    /// Asks a question of a single server.
    ///
    /// Uses UDP unless configured otherwise and repeats the query over
    /// TCP if the UDP answer was truncated.
    async fn query_server(
        &self,
        addr: SocketAddr,
        question: &Question,
    ) -> Result<Message, client::Error> {
        let options = self.options();
        if options.use_vc {
            return self.query_tcp(addr, question).await;
        }
        let answer = self
            .inner
            .pool
            .udp(addr)
            .await?
            .ask(question, options.timeout, None)
            .await?;
        if answer.header().tc() && !options.ign_tc {
            trace!(%addr, %question, "answer truncated, retrying over TCP");
            return self.query_tcp(addr, question).await;
        }
        Ok(answer)
    }

    /// Asks a question of a single server over TCP.
    async fn query_tcp(
        &self,
        addr: SocketAddr,
        question: &Question,
    ) -> Result<Message, client::Error> {
        self.inner
            .pool
            .tcp(addr)
            .await?
            .ask(question, self.options().timeout, None)
            .await
    }

    /// Returns the servers in the order they should be tried.
    fn server_order(&self) -> Vec<SocketAddr> {
        let mut servers = self.inner.conf.servers.clone();
        if self.options().rotate && !servers.is_empty() {
            let start = self.inner.counter.fetch_add(1, Ordering::Relaxed)
                % servers.len();
            servers.rotate_left(start);
        }
        servers
    }
}

/// # Lookups
///
impl StubResolver {
    /// Finds the addresses of a host.
    ///
    /// See [`lookup_host`] for details.
    pub async fn lookup_host(&self, name: &str) -> Result<FoundHosts, Error> {
        lookup_host(self, name).await
    }

    /// Finds the host names of an address.
    ///
    /// See [`lookup_addr`] for details.
    pub async fn lookup_addr(&self, addr: IpAddr) -> Result<FoundAddrs, Error> {
        lookup_addr(self, addr).await
    }
}

/// # Synchronous Use
///
impl StubResolver {
    /// Synchronously perform a DNS operation atop a standard resolver.
    ///
    /// This associated functions removes almost all boiler plate for the
    /// case that you want to perform some DNS operation, either a query or
    /// lookup, on a resolver using the system’s configuration and wait for
    /// the result.
    ///
    /// The only argument is a closure taking a `StubResolver` and
    /// returning a future. Whatever that future resolves to will be
    /// returned. An error is only returned if the runtime can’t be
    /// created.
    pub fn run<R, F>(op: F) -> Result<R::Output, io::Error>
    where
        R: Future,
        F: FnOnce(StubResolver) -> R,
    {
        Self::run_with_conf(ResolvConf::system(), op)
    }

    /// Synchronously perform a DNS operation atop a configured resolver.
    ///
    /// This is like [`run()`] but also takes a resolver configuration for
    /// tailor-making your own resolver.
    ///
    /// [`run()`]: #method.run
    pub fn run_with_conf<R, F>(conf: ResolvConf, op: F) -> Result<R::Output, io::Error>
    where
        R: Future,
        F: FnOnce(StubResolver) -> R,
    {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let resolver = Self::from_conf(conf);
        let res = runtime.block_on(op(resolver.clone()));
        resolver.close();
        Ok(res)
    }
}

impl Default for StubResolver {
    fn default() -> Self {
        Self::new()
    }
}

//------------ Helper Functions ---------------------------------------------

/// Returns whether the response code asks for trying another server.
fn is_server_failure(rcode: Rcode) -> bool {
    rcode == Rcode::SERVFAIL
        || rcode == Rcode::REFUSED
        || rcode == Rcode::NOTIMP
        || rcode == Rcode::FORMERR
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    fn conf(servers: &[&str], rotate: bool) -> ResolvConf {
        let mut conf = ResolvConf::new();
        conf.servers = servers.iter().map(|s| s.parse().unwrap()).collect();
        conf.options.rotate = rotate;
        conf
    }

    #[test]
    fn server_order() {
        let servers = ["192.0.2.1:53", "192.0.2.2:53", "192.0.2.3:53"];
        let resolver = StubResolver::from_conf(conf(&servers, false));
        assert_eq!(resolver.server_order(), resolver.server_order());
        assert_eq!(resolver.server_order()[0], servers[0].parse().unwrap());

        let resolver = StubResolver::from_conf(conf(&servers, true));
        let first: Vec<_> =
            (0..3).map(|_| resolver.server_order()[0]).collect();
        let expected: Vec<SocketAddr> =
            servers.iter().map(|s| s.parse().unwrap()).collect();
        assert_eq!(first, expected);
    }

    #[tokio::test]
    async fn no_servers() {
        let resolver = StubResolver::from_conf(ResolvConf::new());
        let question =
            Question::new_in(Dname::from_str("example.com").unwrap(), Rtype::A);
        assert!(matches!(
            resolver.query_question(&question).await,
            Err(Error::NoServers)
        ));
    }

    #[tokio::test]
    async fn invalid_name() {
        let resolver = StubResolver::from_conf(ResolvConf::new());
        assert!(matches!(
            resolver.query("exa mple.com", Rtype::A).await,
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn server_failures() {
        assert!(is_server_failure(Rcode::SERVFAIL));
        assert!(is_server_failure(Rcode::REFUSED));
        assert!(!is_server_failure(Rcode::NXDOMAIN));
        assert!(!is_server_failure(Rcode::NOERROR));
    }
}
