use socks_header::error::DecodeError;
use socks_header::{AddrSpec, ATYP, CMD, Header, HeaderParser, Rep, Reply, Version};
use std::io::Cursor;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::AsyncWriteExt;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn domain_request(name: &[u8], port: u16) -> Vec<u8> {
    let mut bytes = vec![0x05, 0x01, 0x00, 0x03, name.len() as u8];
    bytes.extend_from_slice(name);
    bytes.extend_from_slice(&port.to_be_bytes());
    bytes
}

#[test]
fn ipv4_connect_end_to_end() {
    init_tracing();
    let bytes = [0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x1F, 0x90];

    let header = Header::parse(&mut &bytes[..]).unwrap();
    assert_eq!(header.ver, Version::V5);
    assert_eq!(header.cmd, CMD::Connect);
    assert_eq!(header.atyp(), ATYP::V4);
    assert_eq!(header.dst, AddrSpec::v4(Ipv4Addr::new(127, 0, 0, 1), 8080));
    assert_eq!(header.dst.dial_string(), "127.0.0.1:8080");
    assert_eq!(header.to_bytes(), bytes);
}

#[test]
fn domain_connect_end_to_end() {
    init_tracing();
    let bytes = domain_request(b"example.com", 80);

    let header = Header::parse(&mut &bytes[..]).unwrap();
    assert_eq!(header.atyp(), ATYP::DomainName);
    assert_eq!(header.dst.domain_name().unwrap(), "example.com");
    assert_eq!(header.dst.port, 80);
    assert_eq!(header.dst.dial_string(), "example.com:80");
    assert_eq!(header.to_bytes(), bytes);
}

#[test]
fn round_trips_every_address_type() {
    init_tracing();
    let mut ipv6 = vec![0x05, 0x03, 0x00, 0x04];
    ipv6.extend_from_slice(&"2001:db8::1".parse::<Ipv6Addr>().unwrap().octets());
    ipv6.extend_from_slice(&[0x00, 0x35]);

    let cases = vec![
        vec![0x04, 0x01, 0x01, 0xBB, 8, 8, 8, 8],
        vec![0x04, 0x02, 0x00, 0x15, 192, 168, 0, 1],
        vec![0x05, 0x02, 0x00, 0x01, 10, 0, 0, 1, 0x00, 0x16],
        domain_request(b"localhost", 6379),
        ipv6,
    ];

    for bytes in cases {
        let header = Header::parse(&mut &bytes[..]).unwrap();
        assert_eq!(header.to_bytes(), bytes, "{header}");
        assert_eq!(header.encoded_len(), bytes.len());

        let dial = header.dst.dial_string();
        assert!(dial.ends_with(&format!(":{}", header.dst.port)), "{dial}");
    }
}

#[test]
fn port_boundaries() {
    for (hi, lo, port) in [(0xFF, 0xFF, u16::MAX), (0x00, 0x00, 0)] {
        let bytes = [0x05, 0x01, 0x00, 0x01, 1, 1, 1, 1, hi, lo];
        let header = Header::parse(&mut &bytes[..]).unwrap();
        assert_eq!(header.dst.port, port);
        assert_eq!(header.to_bytes(), bytes);
    }
}

#[test]
fn domain_length_boundaries() {
    let header = Header::parse(&mut &domain_request(b"", 0)[..]).unwrap();
    assert!(header.dst.domain_name().unwrap().is_empty());
    assert_eq!(header.dst.dial_string(), ":0");

    let name = vec![b'a'; 255];
    let bytes = domain_request(&name, 443);
    let header = Header::parse(&mut &bytes[..]).unwrap();
    assert_eq!(header.dst.domain_name().map(|name| name.len()), Some(255));
    assert_eq!(header.to_bytes(), bytes);

    // One port byte short.
    let err = Header::parse(&mut &bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, DecodeError::Truncated));
}

#[test]
fn raw_domain_bytes_round_trip() {
    let bytes = domain_request(&[0xC3, 0x28, b'.', 0xFF], 443);

    let header = Header::parse(&mut &bytes[..]).unwrap();
    assert_eq!(
        header.dst.domain_name().unwrap().as_bytes(),
        &[0xC3, 0x28, b'.', 0xFF]
    );
    assert!(!header.dst.dial_string().is_empty());
    assert_eq!(header.to_bytes(), bytes);
}

#[test]
fn rejections() {
    init_tracing();
    let cases: [(&[u8], fn(&DecodeError) -> bool); 4] = [
        (&[0x06, 0x01, 0x00, 0x01], |e| {
            matches!(e, DecodeError::UnsupportedVersion(6))
        }),
        (&[0x04, 0x03, 0x00, 0x50, 1, 2, 3, 4], |e| {
            matches!(e, DecodeError::IncompatibleVersionCommand)
        }),
        (&[0x05, 0x01, 0x00, 0x02, 1, 2, 3, 4, 0, 80], |e| {
            matches!(e, DecodeError::UnsupportedAddressType(2))
        }),
        (&[0x05, 0xFF], |e| matches!(e, DecodeError::UnsupportedCommand(0xFF))),
    ];

    for (bytes, expected) in cases {
        let err = Header::parse(&mut &bytes[..]).unwrap_err();
        assert!(expected(&err), "{bytes:?}: {err:?}");
    }
}

#[test]
fn error_maps_to_reply() {
    let bytes = [0x05, 0x01, 0x00, 0x02];
    let err = Header::parse(&mut &bytes[..]).unwrap_err();
    let reply = Reply::from(&err);
    assert_eq!(reply.rep, Rep::AddressTypeNotSupported);

    let mut sink = Vec::new();
    reply.write_to(&mut sink).unwrap();
    assert_eq!(Reply::parse(&mut &sink[..]).unwrap(), reply);
}

#[test]
fn leaves_payload_unread() {
    let mut bytes = vec![0x04, 0x01, 0x00, 0x50, 93, 184, 216, 34];
    bytes.extend_from_slice(b"GET / HTTP/1.1\r\n");
    let mut cursor = Cursor::new(bytes);

    Header::parse(&mut cursor).unwrap();
    assert_eq!(cursor.position(), 8);
}

#[tokio::test]
async fn async_parse_matches_blocking() {
    init_tracing();
    let bytes = domain_request(b"example.org", 8443);

    let header = Header::parse_async(&mut &bytes[..]).await.unwrap();
    assert_eq!(header, Header::parse(&mut &bytes[..]).unwrap());

    let mut sink = Vec::new();
    header.write_to_async(&mut sink).await.unwrap();
    assert_eq!(sink, bytes);
}

#[tokio::test]
async fn async_truncated_when_peer_closes() {
    let (mut client, mut server) = tokio::io::duplex(64);

    client
        .write_all(&[0x05, 0x01, 0x00, 0x04, 0xFE, 0x80])
        .await
        .unwrap();
    drop(client);

    let err = HeaderParser::new().parse_async(&mut server).await.unwrap_err();
    assert!(err.is_truncated());
}

#[tokio::test]
async fn async_request_and_reply_over_duplex() {
    init_tracing();
    let (mut client, mut server) = tokio::io::duplex(256);

    let request = Header::socks5(CMD::Connect, AddrSpec::v6(Ipv6Addr::LOCALHOST, 22));
    request.write_to_async(&mut client).await.unwrap();

    let received = HeaderParser::new()
        .socks5_only()
        .parse_async(&mut server)
        .await
        .unwrap();
    assert_eq!(received, request);

    let reply = Reply::success(AddrSpec::v4(Ipv4Addr::new(10, 0, 0, 2), 40000));
    reply.write_to_async(&mut server).await.unwrap();

    let got = Reply::parse_async(&mut client).await.unwrap();
    assert_eq!(got, reply);
    assert_eq!(got.bnd.dial_string(), "10.0.0.2:40000");
}
