//! SOCKS5 server connection reply (RFC 1928 §6).
//!
//! After processing a request, the server replies with:
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//!
//! o VER       - protocol version: X'05'
//! o REP       - reply field, see below
//! o RSV       - reserved, must be 0x00
//! o ATYP      - address type of BND.ADDR
//! o BND.ADDR  - server bound address
//! o BND.PORT  - server bound port in network byte order
//!
//! The BND fields are meaningful in BIND/UDP_ASSOCIATE, but may be ignored in CONNECT.
//! ```

use std::fmt;
use std::io::{self, Write};
use std::net::Ipv4Addr;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::Version;
use crate::addr::AddrSpec;
use crate::error::DecodeError;
use crate::parse::HeaderParser;

/// Reply codes (`REP`) for SOCKS5 connection replies (RFC 1928 §6).
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Rep {
    /// 0x00 - Succeeded
    Succeeded = 0x00,
    /// 0x01 - General SOCKS server failure
    GeneralFailure = 0x01,
    /// 0x02 - Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// 0x03 - Network unreachable
    NetworkUnreachable = 0x03,
    /// 0x04 - Host unreachable
    HostUnreachable = 0x04,
    /// 0x05 - Connection refused by destination host
    ConnectionRefused = 0x05,
    /// 0x06 - TTL expired
    TTLExpired = 0x06,
    /// 0x07 - Command not supported
    CommandNotSupported = 0x07,
    /// 0x08 - Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl TryFrom<u8> for Rep {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(Rep::Succeeded),
            0x01 => Ok(Rep::GeneralFailure),
            0x02 => Ok(Rep::ConnectionNotAllowed),
            0x03 => Ok(Rep::NetworkUnreachable),
            0x04 => Ok(Rep::HostUnreachable),
            0x05 => Ok(Rep::ConnectionRefused),
            0x06 => Ok(Rep::TTLExpired),
            0x07 => Ok(Rep::CommandNotSupported),
            0x08 => Ok(Rep::AddressTypeNotSupported),
            other => Err(DecodeError::UnsupportedReply(other)),
        }
    }
}

impl fmt::Display for Rep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rep::Succeeded => "succeeded",
            Rep::GeneralFailure => "general SOCKS server failure",
            Rep::ConnectionNotAllowed => "connection not allowed by ruleset",
            Rep::NetworkUnreachable => "network unreachable",
            Rep::HostUnreachable => "host unreachable",
            Rep::ConnectionRefused => "connection refused",
            Rep::TTLExpired => "TTL expired",
            Rep::CommandNotSupported => "command not supported",
            Rep::AddressTypeNotSupported => "address type not supported",
        };
        f.write_str(msg)
    }
}

/// Represents a SOCKS5 server reply (RFC 1928 §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply field (`REP`): success or error status.
    pub rep: Rep,
    /// Reserved byte (`RSV`), normally 0x00.
    pub rsv: u8,
    /// Bound address and port (`BND.ADDR`, `BND.PORT`).
    pub bnd: AddrSpec,
}

impl Reply {
    /// Creates a new `Reply`.
    pub fn new(rep: Rep, bnd: AddrSpec) -> Self {
        Self {
            rep,
            rsv: 0x00,
            bnd,
        }
    }

    /// A successful reply announcing the address the server bound.
    pub fn success(bnd: AddrSpec) -> Self {
        Self::new(Rep::Succeeded, bnd)
    }

    /// A failure reply with an unspecified bound address (`0.0.0.0:0`).
    pub fn failure(rep: Rep) -> Self {
        Self::new(rep, AddrSpec::v4(Ipv4Addr::UNSPECIFIED, 0))
    }

    /// Reads a reply from a blocking stream with the default parser.
    pub fn parse<R: io::Read>(reader: &mut R) -> Result<Self, DecodeError> {
        HeaderParser::new().parse_reply(reader)
    }

    /// Reads a reply from an async stream with the default parser.
    pub async fn parse_async<R>(reader: &mut R) -> Result<Self, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        HeaderParser::new().parse_reply_async(reader).await
    }

    /// Serializes the reply into the SOCKS5 wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(3 + self.bnd.encoded_len());
        buf.push(Version::V5 as u8);
        buf.push(self.rep as u8);
        buf.push(self.rsv);
        self.bnd.encode_into(&mut buf);
        buf
    }

    /// Writes the encoded reply to a blocking sink.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Writes the encoded reply to an async sink.
    pub async fn write_to_async<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.to_bytes()).await
    }
}

impl From<&DecodeError> for Reply {
    fn from(err: &DecodeError) -> Self {
        Reply::failure(err.reply_code())
    }
}
