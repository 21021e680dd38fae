//! Stream decoder for SOCKS headers.
//!
//! [`HeaderParser`] reads a SOCKS4/SOCKS5 request header, or a SOCKS5 reply,
//! from a blocking [`Read`] or a Tokio [`AsyncRead`]. Fields are read in wire
//! order with exact-size reads, so nothing past the header is consumed and
//! the stream is left at the first payload byte.
//!
//! Decoding is all-or-nothing: the first malformed field aborts the parse
//! and no partial header is returned. Bytes already consumed cannot be put
//! back, so after an error the stream should be dropped.
//!
//! Example usage:
//! ```rust
//! use socks_header::error::DecodeError;
//! use socks_header::parse::HeaderParser;
//!
//! // SOCKS5 CONNECT to a zero-length domain
//! let buf = [0x05, 0x01, 0x00, 0x03, 0x00, 0x00, 0x50];
//!
//! let header = HeaderParser::new().parse(&mut &buf[..]).unwrap();
//! assert!(header.dst.domain_name().unwrap().is_empty());
//!
//! let err = HeaderParser::new()
//!     .reject_empty_domain()
//!     .parse(&mut &buf[..])
//!     .unwrap_err();
//! assert!(matches!(err, DecodeError::EmptyDomain));
//! ```

use std::io::Read;
use std::net::{Ipv4Addr, Ipv6Addr};

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::addr::AddrSpec;
use crate::conn::reply::{Rep, Reply};
use crate::conn::request::{CMD, Header};
use crate::error::DecodeError;
use crate::{ATYP, Version};

/// Length of the IPv4 address block: address + port.
const V4_ADDR_LEN: usize = 4 + 2;
/// Length of the IPv6 address block: address + port.
const V6_ADDR_LEN: usize = 16 + 2;
/// Length of the SOCKS4 tail after `VER`/`CMD`: port + IPv4 address.
const SOCKS4_TAIL_LEN: usize = 2 + 4;

/// Configurable SOCKS header decoder.
///
/// The default parser accepts every header the wire format allows. The
/// builder methods tighten it:
///
/// - [`reject_empty_domain`](Self::reject_empty_domain): fail with
///   [`DecodeError::EmptyDomain`] when a domain target has length zero.
/// - [`socks5_only`](Self::socks5_only): fail with
///   [`DecodeError::UnsupportedVersion`] on SOCKS4 requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderParser {
    allow_empty_domain: bool,
    allow_socks4: bool,
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self {
            allow_empty_domain: true,
            allow_socks4: true,
        }
    }
}

impl HeaderParser {
    /// Creates a parser with the default, permissive settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject domain targets with a zero length prefix.
    pub fn reject_empty_domain(&mut self) -> &mut Self {
        self.allow_empty_domain = false;
        self
    }

    /// Reject SOCKS4 requests.
    pub fn socks5_only(&mut self) -> &mut Self {
        self.allow_socks4 = false;
        self
    }

    /// Reads a request header from a blocking stream.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Truncated`] if the stream ends early.
    /// - [`DecodeError::UnsupportedVersion`], [`DecodeError::UnsupportedCommand`],
    ///   [`DecodeError::IncompatibleVersionCommand`] or
    ///   [`DecodeError::UnsupportedAddressType`] for malformed fields.
    /// - [`DecodeError::EmptyDomain`] for a zero-length domain when the
    ///   parser rejects them.
    /// - [`DecodeError::Io`] for any other read failure.
    pub fn parse<R: Read>(&self, reader: &mut R) -> Result<Header, DecodeError> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).map_err(reject)?;
        let (ver, cmd) = self.version_command(buf[0], buf[1])?;

        let header = match ver {
            Version::V4 => {
                let mut tail = [0u8; SOCKS4_TAIL_LEN];
                reader.read_exact(&mut tail).map_err(reject)?;
                socks4_header(cmd, tail)
            }
            Version::V5 => {
                reader.read_exact(&mut buf).map_err(reject)?;
                let [rsv, atyp] = buf;
                let atyp = ATYP::try_from(atyp).map_err(reject)?;
                let dst = self.read_addr(reader, atyp)?;
                Header { ver, cmd, rsv, dst }
            }
        };

        trace!(ver = %header.ver, cmd = %header.cmd, dst = %header.dst, "decoded header");
        Ok(header)
    }

    /// Reads a request header from an async stream.
    ///
    /// Same reads and errors as [`HeaderParser::parse`].
    pub async fn parse_async<R>(&self, reader: &mut R) -> Result<Header, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).await.map_err(reject)?;
        let (ver, cmd) = self.version_command(buf[0], buf[1])?;

        let header = match ver {
            Version::V4 => {
                let mut tail = [0u8; SOCKS4_TAIL_LEN];
                reader.read_exact(&mut tail).await.map_err(reject)?;
                socks4_header(cmd, tail)
            }
            Version::V5 => {
                reader.read_exact(&mut buf).await.map_err(reject)?;
                let [rsv, atyp] = buf;
                let atyp = ATYP::try_from(atyp).map_err(reject)?;
                let dst = self.read_addr_async(reader, atyp).await?;
                Header { ver, cmd, rsv, dst }
            }
        };

        trace!(ver = %header.ver, cmd = %header.cmd, dst = %header.dst, "decoded header");
        Ok(header)
    }

    /// Reads a SOCKS5 reply from a blocking stream.
    ///
    /// Fails with [`DecodeError::UnsupportedVersion`] unless `VER` is 0x05
    /// and with [`DecodeError::UnsupportedReply`] for unknown `REP` codes.
    pub fn parse_reply<R: Read>(&self, reader: &mut R) -> Result<Reply, DecodeError> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).map_err(reject)?;
        let rep = reply_code(buf[0], buf[1])?;

        reader.read_exact(&mut buf).map_err(reject)?;
        let [rsv, atyp] = buf;
        let atyp = ATYP::try_from(atyp).map_err(reject)?;
        let bnd = self.read_addr(reader, atyp)?;

        trace!(rep = %rep, bnd = %bnd, "decoded reply");
        Ok(Reply { rep, rsv, bnd })
    }

    /// Reads a SOCKS5 reply from an async stream.
    pub async fn parse_reply_async<R>(&self, reader: &mut R) -> Result<Reply, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).await.map_err(reject)?;
        let rep = reply_code(buf[0], buf[1])?;

        reader.read_exact(&mut buf).await.map_err(reject)?;
        let [rsv, atyp] = buf;
        let atyp = ATYP::try_from(atyp).map_err(reject)?;
        let bnd = self.read_addr_async(reader, atyp).await?;

        trace!(rep = %rep, bnd = %bnd, "decoded reply");
        Ok(Reply { rep, rsv, bnd })
    }

    /// Validates `VER` and `CMD` and their combination.
    fn version_command(&self, ver: u8, cmd: u8) -> Result<(Version, CMD), DecodeError> {
        let ver = Version::try_from(ver).map_err(reject)?;
        if ver == Version::V4 && !self.allow_socks4 {
            return Err(reject(DecodeError::UnsupportedVersion(ver as u8)));
        }

        let cmd = CMD::try_from(cmd).map_err(reject)?;
        if ver == Version::V4 && cmd == CMD::UdpAssociate {
            return Err(reject(DecodeError::IncompatibleVersionCommand));
        }

        Ok((ver, cmd))
    }

    fn read_addr<R: Read>(&self, reader: &mut R, atyp: ATYP) -> Result<AddrSpec, DecodeError> {
        match atyp {
            ATYP::V4 => {
                let mut buf = [0u8; V4_ADDR_LEN];
                reader.read_exact(&mut buf).map_err(reject)?;
                Ok(ipv4_addr(buf))
            }
            ATYP::V6 => {
                let mut buf = [0u8; V6_ADDR_LEN];
                reader.read_exact(&mut buf).map_err(reject)?;
                Ok(ipv6_addr(buf))
            }
            ATYP::DomainName => {
                let mut len = [0u8; 1];
                reader.read_exact(&mut len).map_err(reject)?;
                let mut buf = self.domain_buf(len[0])?;
                reader.read_exact(&mut buf).map_err(reject)?;
                Ok(domain_addr(buf))
            }
        }
    }

    async fn read_addr_async<R>(
        &self,
        reader: &mut R,
        atyp: ATYP,
    ) -> Result<AddrSpec, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        match atyp {
            ATYP::V4 => {
                let mut buf = [0u8; V4_ADDR_LEN];
                reader.read_exact(&mut buf).await.map_err(reject)?;
                Ok(ipv4_addr(buf))
            }
            ATYP::V6 => {
                let mut buf = [0u8; V6_ADDR_LEN];
                reader.read_exact(&mut buf).await.map_err(reject)?;
                Ok(ipv6_addr(buf))
            }
            ATYP::DomainName => {
                let mut len = [0u8; 1];
                reader.read_exact(&mut len).await.map_err(reject)?;
                let mut buf = self.domain_buf(len[0])?;
                reader.read_exact(&mut buf).await.map_err(reject)?;
                Ok(domain_addr(buf))
            }
        }
    }

    /// Buffer for a domain name of `len` bytes followed by the port.
    fn domain_buf(&self, len: u8) -> Result<Vec<u8>, DecodeError> {
        if len == 0 && !self.allow_empty_domain {
            return Err(reject(DecodeError::EmptyDomain));
        }
        Ok(vec![0u8; len as usize + 2])
    }
}

/// Logs a rejected header and converts the cause into a [`DecodeError`].
fn reject(err: impl Into<DecodeError>) -> DecodeError {
    let err = err.into();
    debug!(error = %err, "rejecting SOCKS header");
    err
}

fn reply_code(ver: u8, rep: u8) -> Result<Rep, DecodeError> {
    if ver != Version::V5 as u8 {
        return Err(reject(DecodeError::UnsupportedVersion(ver)));
    }
    Rep::try_from(rep).map_err(reject)
}

fn port(hi: u8, lo: u8) -> u16 {
    (u16::from(hi) << 8) | u16::from(lo)
}

fn socks4_header(cmd: CMD, tail: [u8; SOCKS4_TAIL_LEN]) -> Header {
    let port = port(tail[0], tail[1]);
    let ip = Ipv4Addr::new(tail[2], tail[3], tail[4], tail[5]);
    Header {
        ver: Version::V4,
        cmd,
        rsv: 0x00,
        dst: AddrSpec::v4(ip, port),
    }
}

fn ipv4_addr(buf: [u8; V4_ADDR_LEN]) -> AddrSpec {
    let ip = Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]);
    AddrSpec::v4(ip, port(buf[4], buf[5]))
}

fn ipv6_addr(buf: [u8; V6_ADDR_LEN]) -> AddrSpec {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&buf[..16]);
    AddrSpec::v6(Ipv6Addr::from(octets), port(buf[16], buf[17]))
}

/// Splits `name ++ port` into a domain target. The name bytes are kept as is.
fn domain_addr(mut buf: Vec<u8>) -> AddrSpec {
    let len = buf.len() - 2;
    let port = port(buf[len], buf[len + 1]);
    buf.truncate(len);
    AddrSpec::domain(buf, port)
}
