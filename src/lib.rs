//! Decoder and encoder for the SOCKS4 and SOCKS5 request header.
//!
//! This crate handles the header a client sends to a proxy after any
//! method negotiation: protocol version, command (`CONNECT`, `BIND`,
//! `UDP ASSOCIATE`) and target address (IPv4, IPv6 or domain name plus
//! port), as defined in RFC 1928 §4 and the SOCKS4 protocol. It also covers
//! the SOCKS5 reply (RFC 1928 §6), which shares the address layout.
//!
//! Decoding reads exactly the bytes the format requires from a blocking
//! [`std::io::Read`] or a Tokio [`AsyncRead`](tokio::io::AsyncRead), so the
//! stream is left positioned at the first payload byte. Encoding reproduces
//! the wire form byte for byte.
//!
//! ```rust
//! use socks_header::{CMD, Header};
//!
//! let bytes = [0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x1F, 0x90];
//! let header = Header::parse(&mut &bytes[..]).unwrap();
//! assert_eq!(header.cmd, CMD::Connect);
//! assert_eq!(header.dst.dial_string(), "127.0.0.1:8080");
//! assert_eq!(header.to_bytes(), bytes);
//! ```
//!
//! Listening, dialing, authentication and relaying are left to the caller.

use std::fmt;

pub mod addr;
pub mod conn;
pub mod error;
pub mod parse;

pub use addr::{AddrSpec, DomainName, Host};
pub use conn::reply::{Rep, Reply};
pub use conn::request::{CMD, Header};
pub use error::DecodeError;
pub use parse::HeaderParser;

/// SOCKS protocol version (`VER`).
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// SOCKS4, IPv4 targets only.
    V4 = 0x04,
    /// SOCKS5 (RFC 1928).
    V5 = 0x05,
}

impl TryFrom<u8> for Version {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x04 => Ok(Version::V4),
            0x05 => Ok(Version::V5),
            other => Err(DecodeError::UnsupportedVersion(other)),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V4 => write!(f, "SOCKS4"),
            Version::V5 => write!(f, "SOCKS5"),
        }
    }
}

/// Represents the address type in SOCKS5 messages.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ATYP {
    /// IPv4 address
    V4 = 0x01,
    /// Domain name
    DomainName = 0x03,
    /// IPv6 address
    V6 = 0x04,
}

impl TryFrom<u8> for ATYP {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(ATYP::V4),
            0x03 => Ok(ATYP::DomainName),
            0x04 => Ok(ATYP::V6),
            other => Err(DecodeError::UnsupportedAddressType(other)),
        }
    }
}

impl fmt::Display for ATYP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ATYP::V4 => write!(f, "IPv4"),
            ATYP::V6 => write!(f, "IPv6"),
            ATYP::DomainName => write!(f, "Domain"),
        }
    }
}
