//! Looking up host names and addresses.
//!
//! [`lookup_host`] finds the addresses of a host name, [`lookup_addr`]
//! finds the host names of an address. Both consult the resolver’s host
//! table before asking the DNS.

use super::error::Error;
use super::name::{normalize_name, NameError};
use super::stub::StubResolver;
use crate::base::{Dname, Message, Question, RecordData, Rtype};
use futures_util::future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use tracing::trace;

//------------ lookup_host ---------------------------------------------------

/// Resolves a host name into its IP addresses.
///
/// If `name` is an IP address in text form, it is returned as is. If the
/// host table has an entry for the name, its addresses are returned.
/// Otherwise the DNS is queried for both A and AAAA records at the same
/// time.
///
/// Names ending in a dot are looked up as given. For other names, the
/// search list is applied: if the name has at least as many dots as the
/// `ndots` option says, it is tried as is first and with each search
/// suffix afterwards, otherwise the suffixes are tried first. The first
/// name that has any addresses wins.
pub async fn lookup_host(
    resolver: &StubResolver,
    name: &str,
) -> Result<FoundHosts, Error> {
    if let Ok(addr) = IpAddr::from_str(name) {
        return Ok(FoundHosts::literal(addr));
    }
    let absolute = name.ends_with('.');
    let normalized = normalize_name(name)?;
    let qname = Dname::from_str(&normalized).map_err(NameError::from)?;

    if let Some(addrs) = resolver.hosts().lookup_host(&qname) {
        trace!(%qname, "found in hosts table");
        return Ok(FoundHosts::new(qname.clone(), qname, addrs.to_vec()));
    }

    let options = resolver.options();
    let mut last = None;
    for candidate in search_names(&qname, absolute, &options.search, options.ndots)
    {
        match lookup_name(resolver, candidate).await {
            Ok(found) if !found.is_empty() => return Ok(found),
            res => last = Some(res),
        }
    }
    last.unwrap_or(Ok(FoundHosts::new(qname.clone(), qname, Vec::new())))
}

/// Queries A and AAAA records for an absolute name.
async fn lookup_name(
    resolver: &StubResolver,
    qname: Dname,
) -> Result<FoundHosts, Error> {
    let a = Question::new_in(qname.clone(), Rtype::A);
    let aaaa = Question::new_in(qname.clone(), Rtype::AAAA);
    let (a, aaaa) =
        future::join(resolver.query_question(&a), resolver.query_question(&aaaa))
            .await;
    let answers = match (a, aaaa) {
        (Err(err), Err(_)) => return Err(err),
        (a, aaaa) => a.into_iter().chain(aaaa).collect::<Vec<_>>(),
    };
    Ok(FoundHosts::from_answers(qname, &answers))
}

/// Returns the names to try for a relative name in order.
fn search_names(
    qname: &Dname,
    absolute: bool,
    search: &[Dname],
    ndots: usize,
) -> Vec<Dname> {
    if absolute {
        return vec![qname.clone()];
    }
    let suffixed = search
        .iter()
        .filter(|suffix| !suffix.is_root())
        .filter_map(|suffix| qname.join(suffix).ok());
    let dots = qname.label_count().saturating_sub(1);
    if dots >= ndots {
        std::iter::once(qname.clone()).chain(suffixed).collect()
    } else {
        let mut res: Vec<_> = suffixed.collect();
        res.push(qname.clone());
        res
    }
}

//------------ FoundHosts ----------------------------------------------------

/// The result of a host name lookup.
#[derive(Clone, Debug)]
pub struct FoundHosts {
    /// The name that was looked up.
    qname: Dname,

    /// The canonical name of the host.
    canonical: Dname,

    /// The addresses of the host.
    addrs: Vec<IpAddr>,
}

impl FoundHosts {
    /// Creates a new value from its parts.
    fn new(qname: Dname, canonical: Dname, addrs: Vec<IpAddr>) -> Self {
        FoundHosts {
            qname,
            canonical,
            addrs,
        }
    }

    /// Creates the result for an address given as the host name.
    ///
    /// There is no name in this case, so the root name is used instead.
    fn literal(addr: IpAddr) -> Self {
        FoundHosts::new(Dname::root(), Dname::root(), vec![addr])
    }

    /// Collects the addresses from the answers to A and AAAA queries.
    ///
    /// CNAME chains are followed and only address records owned by the
    /// canonical name are used.
    fn from_answers(qname: Dname, answers: &[Message]) -> Self {
        let canonical = answers
            .iter()
            .find_map(|answer| answer.canonical_name())
            .cloned()
            .unwrap_or_else(|| qname.clone());
        let mut addrs = Vec::new();
        for answer in answers {
            for record in answer.answer() {
                if *record.owner() != canonical {
                    continue;
                }
                match *record.data() {
                    RecordData::A(addr) => addrs.push(addr.into()),
                    RecordData::Aaaa(addr) => addrs.push(addr.into()),
                    _ => {}
                }
            }
        }
        FoundHosts::new(qname, canonical, addrs)
    }

    /// Returns the name that was looked up.
    pub fn qname(&self) -> &Dname {
        &self.qname
    }

    /// Returns the canonical name of the host.
    pub fn canonical_name(&self) -> &Dname {
        &self.canonical
    }

    /// Returns whether no addresses were found.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Returns an iterator over the addresses.
    pub fn iter(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.addrs.iter().copied()
    }

    /// Returns an iterator over socket addresses with the given port.
    pub fn port_iter(&self, port: u16) -> impl Iterator<Item = SocketAddr> + '_ {
        self.iter().map(move |addr| SocketAddr::new(addr, port))
    }
}

//------------ lookup_addr ---------------------------------------------------

/// Finds the host names for an IP address.
///
/// If the host table has an entry for the address, its name is returned.
/// Otherwise the DNS is queried for the PTR records of the address’s
/// reverse name.
pub async fn lookup_addr(
    resolver: &StubResolver,
    addr: IpAddr,
) -> Result<FoundAddrs, Error> {
    if let Some(name) = resolver.hosts().lookup_addr(addr) {
        return Ok(FoundAddrs {
            names: vec![name.clone()],
        });
    }
    let qname = reverse_name(addr);
    let answer = resolver
        .query_question(&Question::new_in(qname, Rtype::PTR))
        .await?;
    Ok(FoundAddrs::from_answer(&answer))
}

//------------ FoundAddrs ----------------------------------------------------

/// The result of an address lookup.
#[derive(Clone, Debug)]
pub struct FoundAddrs {
    /// The host names.
    names: Vec<Dname>,
}

impl FoundAddrs {
    /// Collects the PTR records owned by the canonical name.
    fn from_answer(answer: &Message) -> Self {
        let names = match answer.canonical_name() {
            Some(canonical) => answer
                .answer()
                .iter()
                .filter(|record| record.owner() == canonical)
                .filter_map(|record| match *record.data() {
                    RecordData::Ptr(ref name) => Some(name.clone()),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        };
        FoundAddrs { names }
    }

    /// Returns whether no names were found.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns an iterator over the host names.
    pub fn iter(&self) -> impl Iterator<Item = &Dname> {
        self.names.iter()
    }
}

//------------ Helper Functions ---------------------------------------------

/// Translates an IP address into its reverse domain name.
pub fn reverse_name(addr: IpAddr) -> Dname {
    match addr {
        IpAddr::V4(addr) => reverse_v4(addr),
        IpAddr::V6(addr) => reverse_v6(addr),
    }
}

/// Translates an IPv4 address into a name under in-addr.arpa.
fn reverse_v4(addr: Ipv4Addr) -> Dname {
    let octets = addr.octets();
    let labels: Vec<String> = octets
        .iter()
        .rev()
        .map(|octet| octet.to_string())
        .chain(["in-addr".into(), "arpa".into()])
        .collect();
    reverse_from_labels(&labels)
}

/// Translates an IPv6 address into a name under ip6.arpa.
fn reverse_v6(addr: Ipv6Addr) -> Dname {
    let labels: Vec<String> = addr
        .octets()
        .iter()
        .rev()
        .flat_map(|octet| [octet & 0x0F, octet >> 4])
        .map(|nibble| format!("{:x}", nibble))
        .chain(["ip6".into(), "arpa".into()])
        .collect();
    reverse_from_labels(&labels)
}

/// Assembles a name from labels that are known to be valid.
fn reverse_from_labels(labels: &[String]) -> Dname {
    // At most 34 labels of one to seven octets always fit.
    Dname::from_labels(labels.iter().map(String::as_bytes))
        .unwrap_or_else(|_| Dname::root())
}

//============ Testing =======================================================
