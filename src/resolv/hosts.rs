//! Static host table
//!
//! The host table maps host names to addresses and addresses back to their
//! canonical host name. It is normally read from `/etc/hosts`.

use super::conf::Error;
use crate::base::name::Dname;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::fs;

//------------ Hosts --------------------------------------------------------

/// A static table of host names and their addresses.
#[derive(Clone, Debug, Default)]
pub struct Hosts {
    /// The addresses for each name.
    forward: HashMap<Dname, Vec<IpAddr>>,

    /// The canonical name of each address.
    reverse: HashMap<IpAddr, Dname>,
}

/// # Creation and Manipulation
///
impl Hosts {
    /// Creates a new, empty host table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a default hosts table for this system.
    ///
    /// This currently only works for Unix-y systems.
    pub fn system() -> Self {
        let mut res = Hosts::new();
        let _ = res.parse_file("/etc/hosts");
        res
    }

    /// Adds a host to IP mapping.
    pub fn add_forward(&mut self, name: Dname, addr: IpAddr) {
        let addrs = self.forward.entry(name).or_default();
        if !addrs.contains(&addr) {
            addrs.push(addr)
        }
    }

    /// Adds a IP to host mapping.
    ///
    /// An existing mapping for the address is kept.
    pub fn add_reverse(&mut self, addr: IpAddr, name: Dname) {
        self.reverse.entry(addr).or_insert(name);
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// # Lookups
///
impl Hosts {
    /// Looks up the addresses of a host.
    pub fn lookup_host(&self, name: &Dname) -> Option<&[IpAddr]> {
        self.forward.get(name).map(Vec::as_slice)
    }

    /// Looks up the hostname of an address.
    pub fn lookup_addr(&self, addr: IpAddr) -> Option<&Dname> {
        self.reverse.get(&addr)
    }
}

/// # Parsing Hosts File
///
impl Hosts {
    /// Adds the hosts listed in a file.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let mut file = fs::File::open(path)?;
        self.parse(&mut file)
    }

    /// Reads hosts from a reader and adds them.
    ///
    /// The format is that of the /etc/hosts file. Lines that can’t be
    /// parsed are skipped.
    pub fn parse<R: io::Read>(&mut self, reader: &mut R) -> Result<(), Error> {
        use std::io::BufRead;

        for line in io::BufReader::new(reader).lines() {
            let _ = self.parse_line(&line?);
        }
        Ok(())
    }

    /// Parses a single line.
    fn parse_line(&mut self, line: &str) -> Result<(), Error> {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let mut words = line.split_whitespace();
        let addr = match words.next() {
            Some(addr) => IpAddr::from_str(addr)?,
            None => return Ok(()),
        };
        let cname = Dname::from_str(words.next().ok_or(Error::ParseError)?)?;
        let names = words
            .map(Dname::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        self.add_forward(cname.clone(), addr);
        self.add_reverse(addr, cname);
        for name in names {
            self.add_forward(name, addr);
        }
        Ok(())
    }
}

//============ Testing ======================================================

#[cfg(test)]
mod test {
    use super::*;

    fn name(s: &str) -> Dname {
        Dname::from_str(s).unwrap()
    }

    #[test]
    fn parse_hosts() {
        let data = "# The usual\n\
                    127.0.0.1 localhost\n\
                    ::1 localhost ip6-localhost # trailing\n\
                    192.0.2.1 Host.Example.com host\n\
                    192.0.2.2 other.example.com host\n\
                    not-an-address foo\n\
                    192.0.2.3\n";
        let mut hosts = Hosts::new();
        hosts.parse(&mut io::Cursor::new(data)).unwrap();

        assert_eq!(
            hosts.lookup_host(&name("localhost")).unwrap(),
            &["127.0.0.1".parse::<IpAddr>().unwrap(), "::1".parse().unwrap()]
        );
        assert_eq!(
            hosts.lookup_host(&name("host.example.com")).unwrap(),
            &["192.0.2.1".parse::<IpAddr>().unwrap()]
        );
        assert_eq!(hosts.lookup_host(&name("host")).unwrap().len(), 2);
        assert!(hosts.lookup_host(&name("foo")).is_none());
        assert_eq!(
            hosts.lookup_addr("192.0.2.1".parse().unwrap()),
            Some(&name("host.example.com"))
        );
        assert!(hosts.lookup_addr("192.0.2.3".parse().unwrap()).is_none());
    }
}
