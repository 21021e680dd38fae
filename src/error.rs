use std::io;

use thiserror::Error;

use crate::conn::reply::Rep;

/// Represents the possible errors that can occur while decoding a SOCKS header.
///
/// Every variant is a distinct classification so a server can answer the
/// client with the matching reply code, see [`DecodeError::reply_code`].
#[derive(Debug, Error)]
pub enum DecodeError {
    // ===== Stream =====
    /// Occurs when the stream ends before a field was fully read.
    #[error("header truncated: stream ended before all fields were read")]
    Truncated,

    /// Occurs when the underlying reader fails for a reason other than EOF.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    // ===== Header fields =====
    /// Occurs when the first byte is not a supported SOCKS version.
    #[error("unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Occurs when the command byte is not CONNECT, BIND or UDP ASSOCIATE.
    #[error("unsupported command: {0}")]
    UnsupportedCommand(u8),

    /// Occurs when a SOCKS4 header asks for UDP ASSOCIATE.
    #[error("command UDP_ASSOCIATE is not available in SOCKS4")]
    IncompatibleVersionCommand,

    /// Occurs when a SOCKS5 header carries an unknown address type.
    #[error("unsupported address type: {0}")]
    UnsupportedAddressType(u8),

    // ===== Address =====
    /// Occurs when the domain name length is zero and the parser rejects it.
    #[error("empty domain name")]
    EmptyDomain,

    // ===== Reply =====
    /// Occurs when a SOCKS5 reply carries an unknown reply code.
    #[error("unsupported reply code: {0}")]
    UnsupportedReply(u8),
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::Truncated,
            _ => DecodeError::Io(err),
        }
    }
}

impl DecodeError {
    /// Returns `true` if the peer closed the stream before the header was complete.
    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::Truncated)
    }

    /// The SOCKS5 reply code a server should send back for this error.
    pub fn reply_code(&self) -> Rep {
        match self {
            DecodeError::UnsupportedCommand(_) | DecodeError::IncompatibleVersionCommand => {
                Rep::CommandNotSupported
            }
            DecodeError::UnsupportedAddressType(_) => Rep::AddressTypeNotSupported,
            _ => Rep::GeneralFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_maps_to_truncated() {
        let err = DecodeError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(err.is_truncated());
    }

    #[test]
    fn other_io_errors_are_kept() {
        let err = DecodeError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        match err {
            DecodeError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reply_codes() {
        assert_eq!(
            DecodeError::UnsupportedAddressType(2).reply_code(),
            Rep::AddressTypeNotSupported
        );
        assert_eq!(
            DecodeError::UnsupportedCommand(9).reply_code(),
            Rep::CommandNotSupported
        );
        assert_eq!(
            DecodeError::IncompatibleVersionCommand.reply_code(),
            Rep::CommandNotSupported
        );
        assert_eq!(DecodeError::Truncated.reply_code(), Rep::GeneralFailure);
        assert_eq!(
            DecodeError::UnsupportedVersion(6).reply_code(),
            Rep::GeneralFailure
        );
    }
}
