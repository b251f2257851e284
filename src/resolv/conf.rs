//! Resolver configuration
//!
//! There are two parts to this module: the options that govern how the
//! resolver performs queries and the global resolver configuration
//! (normally read from the system’s `/etc/resolv.conf`) that contains
//! the name servers to query along with those options.
//!
//! Both parts are modeled along the lines of glibc’s resolver.

use crate::base::name::{Dname, DnameError};
use std::io::Read;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr};
use std::num::ParseIntError;
use std::path::Path;
use std::str::{self, FromStr, SplitWhitespace};
use std::time::Duration;
use std::{error, fmt, fs, io};

//------------ ResolvOptions ------------------------------------------------

/// Options for the resolver configuration.
///
/// This type contains the server-independent options of glibc’s resolver
/// that this implementation supports.
#[derive(Clone, Debug)]
pub struct ResolvOptions {
    /// Search list for host-name lookup.
    pub search: Vec<Dname>,

    /// Number of dots before an initial absolute query is made.
    pub ndots: usize,

    /// Timeout to wait for a response.
    pub timeout: Duration,

    /// Number of rounds through the server list before giving up.
    pub attempts: usize,

    /// Always use TCP.
    pub use_vc: bool,

    /// Ignore truncation errors, don’t retry with TCP.
    pub ign_tc: bool,

    /// Set the recursion desired bit in queries.
    ///
    /// Enabled by default.
    pub recurse: bool,

    /// Use round-robin selection of name servers.
    pub rotate: bool,

    /// How long an unused transport to a server is kept open.
    pub idle_timeout: Duration,
}

impl Default for ResolvOptions {
    fn default() -> Self {
        ResolvOptions {
            search: Vec::new(),
            ndots: 1,
            timeout: Duration::from_secs(5),
            attempts: 2,
            use_vc: false,
            ign_tc: false,
            recurse: true,
            rotate: false,
            idle_timeout: Duration::from_secs(10),
        }
    }
}

//------------ ResolvConf ---------------------------------------------------

/// Resolver configuration.
///
/// This type collects all information necessary to configure how a stub
/// resolver talks to its upstream resolvers.
///
/// The type follows the builder pattern. After creating a value with
/// `ResolvConf::new()` you can manipulate the members. Once you are happy
/// with them, you call `finalize()` to make sure the configuration is valid.
/// It mostly just fixes the `servers`.
///
/// Additionally, the type can parse a glibc-style configuration file,
/// commonly known as `/etc/resolv.conf` through the `parse()` and
/// `parse_file()` methods. You still need to call `finalize()` after
/// parsing.
///
/// The easiest way, however, to get the system resolver configuration is
/// through `ResolvConf::system()`. This will parse the configuration file
/// or return a default configuration if that fails.
#[derive(Clone, Debug, Default)]
pub struct ResolvConf {
    /// Addresses of servers to query.
    pub servers: Vec<SocketAddr>,

    /// Default options.
    pub options: ResolvOptions,
}

/// # Management
///
impl ResolvConf {
    /// Creates a new, empty configuration.
    ///
    /// Using an empty configuration will fail since it does not contain
    /// any name servers. Call `self.finalize()` to make it usable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalizes the configuration for actual use.
    ///
    /// The function does two things. If `servers` is empty, it adds
    /// `127.0.0.1:53`. This is exactly what glibc does. If `search` is
    /// empty, it adds the root domain `"."`. This differs from what
    /// glibc does which considers the machine’s host name.
    pub fn finalize(&mut self) {
        if self.servers.is_empty() {
            // glibc just simply uses 127.0.0.1:53. Let's do that, too,
            // and claim it is for compatibility.
            let addr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
            self.servers.push(SocketAddr::new(addr, 53));
        }
        if self.options.search.is_empty() {
            self.options.search.push(Dname::root())
        }
    }

    /// Creates a default configuration for this system.
    ///
    /// This currently only works for Unix-y systems.
    pub fn system() -> Self {
        let mut res = ResolvConf::new();
        let _ = res.parse_file("/etc/resolv.conf");
        res.finalize();
        res
    }
}

/// # Parsing Configuration File
///
impl ResolvConf {
    /// Parses the configuration from a file.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let mut file = fs::File::open(path)?;
        self.parse(&mut file)
    }

    /// Parses the configuration from a reader.
    ///
    /// The format is that of the /etc/resolv.conf file.
    pub fn parse<R: Read>(&mut self, reader: &mut R) -> Result<(), Error> {
        use std::io::BufRead;

        for line in io::BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim_end();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#')
            {
                continue;
            }

            let mut words = line.split_whitespace();
            let keyword = words.next();
            match keyword {
                Some("nameserver") => self.parse_nameserver(words)?,
                Some("domain") => self.parse_domain(words)?,
                Some("search") => self.parse_search(words)?,
                Some("sortlist") => {}
                Some("options") => self.parse_options(words)?,
                _ => return Err(Error::ParseError),
            }
        }
        Ok(())
    }

    fn parse_nameserver(
        &mut self,
        mut words: SplitWhitespace,
    ) -> Result<(), Error> {
        let addr = IpAddr::from_str(next_word(&mut words)?)?;
        self.servers.push(SocketAddr::new(addr, 53));
        no_more_words(words)
    }

    fn parse_domain(&mut self, mut words: SplitWhitespace) -> Result<(), Error> {
        let domain = Dname::from_str(next_word(&mut words)?)?;
        self.options.search = vec![domain];
        no_more_words(words)
    }

    fn parse_search(&mut self, words: SplitWhitespace) -> Result<(), Error> {
        let mut search = Vec::new();
        for word in words {
            search.push(Dname::from_str(word)?)
        }
        self.options.search = search;
        Ok(())
    }

    fn parse_options(&mut self, words: SplitWhitespace) -> Result<(), Error> {
        for word in words {
            match split_arg(word)? {
                ("ndots", Some(n)) => self.options.ndots = n,
                ("timeout", Some(n)) => {
                    self.options.timeout = Duration::from_secs(n as u64)
                }
                ("attempts", Some(n)) => self.options.attempts = n,
                ("rotate", None) => self.options.rotate = true,
                ("use-vc", None) => self.options.use_vc = true,
                ("ign-tc", None) => self.options.ign_tc = true,
                ("no-recurse", None) => self.options.recurse = false,
                // Ignore unknown or misformated options.
                _ => {}
            }
        }
        Ok(())
    }
}

//--- Display

impl fmt::Display for ResolvConf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for server in &self.servers {
            f.write_str("nameserver ")?;
            if server.port() == 53 {
                server.ip().fmt(f)?;
            } else {
                server.fmt(f)?;
            }
            "\n".fmt(f)?;
        }
        if self.options.search.len() == 1 {
            writeln!(f, "domain {}", self.options.search[0])?;
        } else if self.options.search.len() > 1 {
            "search".fmt(f)?;
            for name in &self.options.search {
                write!(f, " {}", name)?;
            }
            "\n".fmt(f)?;
        }

        // Collect options so we only print them if there are any non-default
        // ones.
        let defaults = ResolvOptions::default();
        let mut options = Vec::new();

        if self.options.ndots != defaults.ndots {
            options.push(format!("ndots:{}", self.options.ndots));
        }
        if self.options.timeout != defaults.timeout {
            // This ignores fractional seconds.
            options.push(format!("timeout:{}", self.options.timeout.as_secs()));
        }
        if self.options.attempts != defaults.attempts {
            options.push(format!("attempts:{}", self.options.attempts));
        }
        if self.options.use_vc {
            options.push("use-vc".into())
        }
        if self.options.ign_tc {
            options.push("ign-tc".into())
        }
        if !self.options.recurse {
            options.push("no-recurse".into())
        }
        if self.options.rotate {
            options.push("rotate".into())
        }

        if !options.is_empty() {
            "options".fmt(f)?;
            for option in options {
                write!(f, " {}", option)?;
            }
            "\n".fmt(f)?;
        }

        Ok(())
    }
}

//------------ Private Helpers -----------------------------------------------
//
// These are here to wrap stuff into Results.

/// Returns a reference to the next word or an error.
fn next_word<'a>(words: &'a mut str::SplitWhitespace) -> Result<&'a str, Error> {
    match words.next() {
        Some(word) => Ok(word),
        None => Err(Error::ParseError),
    }
}

/// Returns nothing but errors out if there are words left.
fn no_more_words(mut words: str::SplitWhitespace) -> Result<(), Error> {
    match words.next() {
        Some(..) => Err(Error::ParseError),
        None => Ok(()),
    }
}

/// Splits the name and argument from an option with arguments.
///
/// These options consist of a name followed by a colon followed by a
/// value, which so far is only `usize`, so we do that.
fn split_arg(s: &str) -> Result<(&str, Option<usize>), Error> {
    match s.find(':') {
        Some(idx) => {
            let (left, right) = s.split_at(idx);
            Ok((left, Some(right[1..].parse()?)))
        }
        None => Ok((s, None)),
    }
}

//------------ Error --------------------------------------------------------

/// The error that can happen when parsing `resolv.conf` or `hosts`.
#[derive(Debug)]
pub enum Error {
    /// The file is not a proper file.
    ParseError,

    /// Something happend while reading.
    Io(io::Error),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::ParseError => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<DnameError> for Error {
    fn from(_: DnameError) -> Error {
        Error::ParseError
    }
}

impl From<ParseIntError> for Error {
    fn from(_: ParseIntError) -> Error {
        Error::ParseError
    }
}

impl From<AddrParseError> for Error {
    fn from(_: AddrParseError) -> Error {
        Error::ParseError
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError => f.write_str("error parsing configuration"),
            Error::Io(err) => err.fmt(f),
        }
    }
}

//============ Testing ======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::io;

    #[test]
    fn parse_resolv_conf() {
        let mut conf = ResolvConf::new();
        let data = "nameserver 192.0.2.0\n\
                    nameserver 2001:db8::53\n\
                    ; comment\n\
                    # comment\n\
                    search example.com example.net\n\
                    options use-vc ndots:3 timeout:2 attempts:4 rotate \
                    unknown\n"
            .to_string();
        conf.parse(&mut io::Cursor::new(data)).unwrap();
        assert_eq!(
            conf.servers,
            vec![
                "192.0.2.0:53".parse::<SocketAddr>().unwrap(),
                "[2001:db8::53]:53".parse().unwrap(),
            ]
        );
        assert_eq!(conf.options.search.len(), 2);
        assert!(conf.options.use_vc);
        assert!(conf.options.rotate);
        assert!(!conf.options.ign_tc);
        assert_eq!(conf.options.ndots, 3);
        assert_eq!(conf.options.timeout, Duration::from_secs(2));
        assert_eq!(conf.options.attempts, 4);
    }

    #[test]
    fn parse_errors() {
        let mut conf = ResolvConf::new();
        for data in [
            "nameserver\n",
            "nameserver example.com\n",
            "nameserver 192.0.2.1 192.0.2.2\n",
            "bogus line\n",
            "options ndots:x\n",
        ] {
            assert!(
                conf.parse(&mut io::Cursor::new(data)).is_err(),
                "{}",
                data
            );
        }
    }

    #[test]
    fn finalize_and_display() {
        let mut conf = ResolvConf::new();
        conf.finalize();
        assert_eq!(conf.servers, vec!["127.0.0.1:53".parse().unwrap()]);
        assert_eq!(conf.options.search, vec![Dname::root()]);

        let mut conf = ResolvConf::new();
        conf.parse(&mut io::Cursor::new(
            "nameserver 192.0.2.1\ndomain example.com\noptions ign-tc ndots:2\n",
        ))
        .unwrap();
        assert_eq!(
            conf.to_string(),
            "nameserver 192.0.2.1\n\
             domain example.com\n\
             options ndots:2 ign-tc\n"
        );
    }
}
