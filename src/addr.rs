//! Target address of a SOCKS header.
//!
//! This module defines [`AddrSpec`], the destination (or bound) address and
//! port carried by a SOCKS request or reply. The host is one of:
//! - An IPv4 address (`ATYP = 0x01`).
//! - A domain name (`ATYP = 0x03`).
//! - An IPv6 address (`ATYP = 0x04`).
//!
//! Example usage:
//! ```rust
//! use socks_header::addr::AddrSpec;
//! use std::net::Ipv4Addr;
//!
//! let addr = AddrSpec::v4(Ipv4Addr::new(127, 0, 0, 1), 8080);
//! assert_eq!(addr.dial_string(), "127.0.0.1:8080");
//!
//! let addr = AddrSpec::domain("example.com", 443).with_resolved([93, 184, 216, 34].into());
//! assert_eq!(addr.dial_string(), "93.184.216.34:443");
//! assert_eq!(addr.to_string(), "example.com (93.184.216.34):443");
//!
//! // Domain bytes are kept as received, even when they are not UTF-8.
//! let addr = AddrSpec::domain(&b"caf\xE9"[..], 80);
//! assert_eq!(addr.domain_name().unwrap().as_bytes(), b"caf\xE9");
//! assert_eq!(addr.dial_string(), "caf\u{FFFD}:80");
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::ATYP;

/// Longest domain name the one-byte length prefix can describe.
pub const MAX_DOMAIN_LEN: usize = u8::MAX as usize;

/// Raw bytes of a SOCKS5 domain name.
///
/// The wire format does not constrain the bytes, so neither does this type:
/// it is not checked to be UTF-8 or a legal hostname. `Display` renders it
/// lossily for dial strings and logs; [`as_bytes`](Self::as_bytes) gives the
/// exact bytes that are encoded.
#[derive(PartialEq, Eq, Clone, Hash, Default)]
pub struct DomainName(Vec<u8>);

impl DomainName {
    /// The bytes as they appear on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as text, if it is valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for a zero-length name.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the name, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for DomainName {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for DomainName {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<String> for DomainName {
    fn from(name: String) -> Self {
        Self(name.into_bytes())
    }
}

impl From<&str> for DomainName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl PartialEq<str> for DomainName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

/// Host part of an [`AddrSpec`].
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub enum Host {
    /// An IPv4 address.
    V4(Ipv4Addr),
    /// An IPv6 address.
    V6(Ipv6Addr),
    /// A domain name, kept exactly as received.
    Domain(DomainName),
}

impl Host {
    /// The address type tag written on the wire for this host.
    pub fn atyp(&self) -> ATYP {
        match self {
            Host::V4(_) => ATYP::V4,
            Host::V6(_) => ATYP::V6,
            Host::Domain(_) => ATYP::DomainName,
        }
    }
}

impl From<IpAddr> for Host {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(ip) => Host::V4(ip),
            IpAddr::V6(ip) => Host::V6(ip),
        }
    }
}

/// A SOCKS target: host and port.
///
/// A domain target may additionally carry an IP address resolved by the
/// caller, see [`AddrSpec::with_resolved`]. The codec never sets it and never
/// writes it on the wire.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct AddrSpec {
    /// Host as it appears on the wire.
    pub host: Host,
    /// Port in host byte order.
    pub port: u16,
    resolved: Option<IpAddr>,
}

impl AddrSpec {
    /// Creates a new `AddrSpec`.
    pub fn new(host: Host, port: u16) -> Self {
        Self {
            host,
            port,
            resolved: None,
        }
    }

    /// Creates a new IPv4 `AddrSpec`.
    pub fn v4(ip: Ipv4Addr, port: u16) -> Self {
        Self::new(Host::V4(ip), port)
    }

    /// Creates a new IPv6 `AddrSpec`.
    pub fn v6(ip: Ipv6Addr, port: u16) -> Self {
        Self::new(Host::V6(ip), port)
    }

    /// Creates a new domain `AddrSpec` from text or raw bytes.
    pub fn domain(name: impl Into<DomainName>, port: u16) -> Self {
        Self::new(Host::Domain(name.into()), port)
    }

    /// Attaches an externally resolved IP address.
    ///
    /// Only meaningful for domain targets; the dial string then uses the IP.
    pub fn with_resolved(mut self, ip: IpAddr) -> Self {
        self.resolved = Some(ip);
        self
    }

    /// The IP address resolved by the caller, if any.
    pub fn resolved(&self) -> Option<IpAddr> {
        self.resolved
    }

    /// The address type tag written on the wire for this target.
    pub fn atyp(&self) -> ATYP {
        self.host.atyp()
    }

    /// The domain name, if the host is a domain.
    pub fn domain_name(&self) -> Option<&DomainName> {
        match &self.host {
            Host::Domain(name) => Some(name),
            _ => None,
        }
    }

    /// The IP to dial: the host itself when it is an IP, otherwise the
    /// resolved address.
    pub fn ip(&self) -> Option<IpAddr> {
        match &self.host {
            Host::V4(ip) => Some(IpAddr::V4(*ip)),
            Host::V6(ip) => Some(IpAddr::V6(*ip)),
            Host::Domain(_) => self.resolved,
        }
    }

    /// The socket address to dial, if an IP is known.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip().map(|ip| SocketAddr::new(ip, self.port))
    }

    /// Renders a `host:port` string suitable for dialing.
    ///
    /// An IP is preferred over the domain name. IPv6 hosts, and any host
    /// containing a colon, are wrapped in brackets.
    pub fn dial_string(&self) -> String {
        match (&self.host, self.resolved) {
            (Host::V4(ip), _) => SocketAddr::new(IpAddr::V4(*ip), self.port).to_string(),
            (Host::V6(ip), _) => SocketAddr::new(IpAddr::V6(*ip), self.port).to_string(),
            (Host::Domain(_), Some(ip)) => SocketAddr::new(ip, self.port).to_string(),
            (Host::Domain(name), None) => join_host_port(&name.to_string(), self.port),
        }
    }

    /// Number of bytes [`AddrSpec::encode_into`] appends: `ATYP`, address and port.
    pub(crate) fn encoded_len(&self) -> usize {
        let addr_len = match &self.host {
            Host::V4(_) => 4,
            Host::V6(_) => 16,
            Host::Domain(name) => 1 + name.len().min(MAX_DOMAIN_LEN),
        };
        1 + addr_len + 2
    }

    /// Appends the SOCKS5 address block: `ATYP`, address, port.
    ///
    /// Domain names longer than 255 bytes cannot be represented; they are
    /// a caller error and are cut to 255 bytes so the length prefix stays
    /// consistent with the bytes written.
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.atyp() as u8);

        match &self.host {
            Host::V4(ip) => buf.extend_from_slice(&ip.octets()),
            Host::V6(ip) => buf.extend_from_slice(&ip.octets()),
            Host::Domain(name) => {
                debug_assert!(
                    name.len() <= MAX_DOMAIN_LEN,
                    "domain name is {} bytes, at most {} fit in a SOCKS header",
                    name.len(),
                    MAX_DOMAIN_LEN
                );
                let name = &name.as_bytes()[..name.len().min(MAX_DOMAIN_LEN)];
                buf.push(name.len() as u8);
                buf.extend_from_slice(name);
            }
        }

        buf.extend_from_slice(&self.port.to_be_bytes());
    }

    /// Renders the target for logs: `domain (ip):port` when both a domain
    /// and a resolved IP are known, `host:port` otherwise.
    pub fn display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AddrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.host, self.resolved) {
            (Host::Domain(name), Some(ip)) => write!(f, "{} ({}):{}", name, ip, self.port),
            _ => f.write_str(&self.dial_string()),
        }
    }
}

impl From<SocketAddr> for AddrSpec {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().into(), addr.port())
    }
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
