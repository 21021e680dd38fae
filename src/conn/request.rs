//! SOCKS4 and SOCKS5 connection request header.
//!
//! After negotiation, a SOCKS5 client sends a request message (RFC 1928 §4):
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//!
//! o VER      - protocol version: X'05'
//! o CMD      - command code:
//!                0x01 = CONNECT
//!                0x02 = BIND
//!                0x03 = UDP ASSOCIATE
//! o RSV      - reserved, must be 0x00
//! o ATYP     - address type of DST.ADDR
//!                0x01 = IPv4 address
//!                0x03 = Domain name
//!                0x04 = IPv6 address
//! o DST.ADDR - destination address
//! o DST.PORT - destination port in network byte order
//! ```
//!
//! A SOCKS4 request starts with the same two bytes but carries only an IPv4
//! target, port first:
//!
//! ```text
//! +----+-----+----------+----------+
//! |VER | CMD | DST.PORT | DST.IP   |
//! +----+-----+----------+----------+
//! | 1  |  1  |    2     |    4     |
//! +----+-----+----------+----------+
//! ```
//!
//! The NUL-terminated SOCKS4 user id that may follow is not part of the header.

use std::fmt;
use std::io::{self, Write};
use std::net::Ipv4Addr;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::addr::{AddrSpec, Host};
use crate::error::DecodeError;
use crate::parse::HeaderParser;
use crate::{ATYP, Version};

/// The command (`CMD`) of a SOCKS request.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CMD {
    /// CONNECT command (0x01): establishes a TCP connection to the target host.
    Connect = 0x01,
    /// BIND command (0x02): used for inbound connections.
    Bind = 0x02,
    /// UDP ASSOCIATE command (0x03): establishes a UDP relay. SOCKS5 only.
    UdpAssociate = 0x03,
}

impl TryFrom<u8> for CMD {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(CMD::Connect),
            0x02 => Ok(CMD::Bind),
            0x03 => Ok(CMD::UdpAssociate),
            other => Err(DecodeError::UnsupportedCommand(other)),
        }
    }
}

impl fmt::Display for CMD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CMD::Connect => write!(f, "CONNECT"),
            CMD::Bind => write!(f, "BIND"),
            CMD::UdpAssociate => write!(f, "UDP_ASSOCIATE"),
        }
    }
}

/// A SOCKS4 or SOCKS5 request header.
///
/// The address type written on the wire is derived from `dst.host`, so it
/// can never disagree with the address.
///
/// A SOCKS4 header must carry an IPv4 host and must not use
/// [`CMD::UdpAssociate`]. [`Header::parse`] never produces anything else;
/// a hand-built header that breaks this rule is a programming error and is
/// caught by a debug assertion when encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Protocol version (`VER`).
    pub ver: Version,
    /// Command (`CMD`): CONNECT, BIND, or UDP ASSOCIATE.
    pub cmd: CMD,
    /// Reserved byte (`RSV`). Only written for SOCKS5; zero for SOCKS4.
    pub rsv: u8,
    /// Destination address and port (`DST.ADDR`, `DST.PORT`).
    pub dst: AddrSpec,
}

impl Header {
    /// Creates a SOCKS4 request header.
    pub fn socks4(cmd: CMD, ip: Ipv4Addr, port: u16) -> Self {
        debug_assert!(cmd != CMD::UdpAssociate, "SOCKS4 has no UDP ASSOCIATE");
        Self {
            ver: Version::V4,
            cmd,
            rsv: 0x00,
            dst: AddrSpec::v4(ip, port),
        }
    }

    /// Creates a SOCKS5 request header with a zero reserved byte.
    pub fn socks5(cmd: CMD, dst: AddrSpec) -> Self {
        Self {
            ver: Version::V5,
            cmd,
            rsv: 0x00,
            dst,
        }
    }

    /// Reads a header from a blocking stream with the default parser.
    ///
    /// See [`HeaderParser::parse`].
    pub fn parse<R: io::Read>(reader: &mut R) -> Result<Self, DecodeError> {
        HeaderParser::new().parse(reader)
    }

    /// Reads a header from an async stream with the default parser.
    ///
    /// See [`HeaderParser::parse_async`].
    pub async fn parse_async<R>(reader: &mut R) -> Result<Self, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        HeaderParser::new().parse_async(reader).await
    }

    /// The address type of the destination.
    pub fn atyp(&self) -> ATYP {
        self.dst.atyp()
    }

    /// Number of bytes [`Header::to_bytes`] produces.
    pub fn encoded_len(&self) -> usize {
        match self.ver {
            Version::V4 => 8,
            Version::V5 => 3 + self.dst.encoded_len(),
        }
    }

    /// Serializes the header into its wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(self.ver as u8);
        buf.push(self.cmd as u8);

        match self.ver {
            Version::V4 => {
                debug_assert!(
                    matches!(self.dst.host, Host::V4(_)),
                    "SOCKS4 header requires an IPv4 destination, got {}",
                    self.dst
                );
                let ip = match self.dst.host {
                    Host::V4(ip) => ip,
                    _ => Ipv4Addr::UNSPECIFIED,
                };
                buf.extend_from_slice(&self.dst.port.to_be_bytes());
                buf.extend_from_slice(&ip.octets());
            }
            Version::V5 => {
                buf.push(self.rsv);
                self.dst.encode_into(&mut buf);
            }
        }

        buf
    }

    /// Writes the encoded header to a blocking sink.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Writes the encoded header to an async sink.
    pub async fn write_to_async<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.to_bytes()).await
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Request {{", self.ver)?;
        writeln!(f, "  CMD : {}", self.cmd)?;
        writeln!(f, "  ATYP: {}", self.atyp())?;
        writeln!(f, "  DST : {}", self.dst)?;
        writeln!(f, "  RSV : {}", self.rsv)?;
        write!(f, "}}")
    }
}
