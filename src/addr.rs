//! Dotted-quad IPv4 text to 32-bit keys.

use crate::error::ParseError;
use std::net::Ipv4Addr;

/// Longest valid record, `255.255.255.255`.
pub const MAX_RECORD_LEN: usize = 15;

/// Bytes a boundary search has to look at to be sure of crossing one separator.
pub const LOOKAHEAD: usize = MAX_RECORD_LEN + 1;

/// Parses one record into its key, `o1 << 24 | o2 << 16 | o3 << 8 | o4`.
///
/// Leading and trailing ASCII whitespace around the whole record is ignored.
/// Anything else that isn't four dot-separated decimal octets in `0..=255`
/// without leading zeros is rejected.
pub fn parse_ipv4(record: &[u8]) -> Result<u32, ParseError> {
    let text = record.trim_ascii();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut key = 0u32;
    let mut octets = 0;
    for group in text.split(|&b| b == b'.') {
        if octets == 4 {
            return Err(ParseError::OctetCount(lossy(text)));
        }
        let value = parse_octet(group).map_err(|fault| fault.into_error(text))?;
        key = key << 8 | u32::from(value);
        octets += 1;
    }
    if octets != 4 {
        return Err(ParseError::OctetCount(lossy(text)));
    }
    Ok(key)
}

/// The address a key stands for.
pub fn to_ipv4(key: u32) -> Ipv4Addr {
    Ipv4Addr::from(key)
}

enum OctetFault {
    Byte(u8),
    Empty,
    TooLong,
    LeadingZero,
    OutOfRange,
}

impl OctetFault {
    fn into_error(self, text: &[u8]) -> ParseError {
        let text = lossy(text);
        match self {
            OctetFault::Byte(byte) => ParseError::InvalidByte { byte, text },
            OctetFault::Empty => ParseError::EmptyOctet(text),
            OctetFault::TooLong => ParseError::OctetTooLong(text),
            OctetFault::LeadingZero => ParseError::LeadingZero(text),
            OctetFault::OutOfRange => ParseError::OutOfRange(text),
        }
    }
}

fn parse_octet(group: &[u8]) -> Result<u8, OctetFault> {
    if let Some(&b) = group.iter().find(|b| !b.is_ascii_digit()) {
        return Err(OctetFault::Byte(b));
    }
    match group {
        [] => Err(OctetFault::Empty),
        [b'0', _, ..] => Err(OctetFault::LeadingZero),
        _ if group.len() > 3 => Err(OctetFault::TooLong),
        _ => {
            let n = group
                .iter()
                .fold(0u16, |n, &b| n * 10 + u16::from(b - b'0'));
            u8::try_from(n).map_err(|_| OctetFault::OutOfRange)
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_addresses() {
        let cases: &[(&str, u32)] = &[
            ("10.0.0.255", 167_772_415),
            ("1.1.1.1", 16_843_009),
            ("255.255.255.255", u32::MAX),
            ("0.0.0.0", 0),
            (" 192.168.0.1 ", 3_232_235_521),
            ("0.0.0.255 ", 255),
            ("\t172.16.0.1\r", 0xAC10_0001),
        ];
        for &(text, want) in cases {
            assert_eq!(parse_ipv4(text.as_bytes()), Ok(want), "{text:?}");
        }
    }

    #[test]
    fn key_decomposes_back_into_octets() {
        for text in ["192.168.1.1", "8.8.4.4", "100.64.0.10", "0.255.0.255"] {
            let key = parse_ipv4(text.as_bytes()).unwrap();
            let octets = [key >> 24, key >> 16, key >> 8, key].map(|o| (o & 0xff) as u8);
            let rebuilt = octets.map(|o| o.to_string()).join(".");
            assert_eq!(rebuilt, text);
            assert_eq!(to_ipv4(key).to_string(), text);
        }
    }

    #[test]
    fn rejects_malformed() {
        let cases = [
            "",
            "   ",
            "192.168.1",
            "192.168.1.1.1",
            "192.168.abc.1",
            "192. 168.0.1",
            "192.168.0.1.",
            ".192.168.0.1",
            "192..168.1",
            "256.0.0.0",
            "0.0.0.256",
            "0.0.0.001",
            "007.1.1.1",
            "1000.1.1.1",
            "1.2.3.-4",
            "invalid_ip",
        ];
        for text in cases {
            assert!(parse_ipv4(text.as_bytes()).is_err(), "{text:?} accepted");
        }
    }

    #[test]
    fn rejection_reasons() {
        assert_eq!(parse_ipv4(b""), Err(ParseError::Empty));
        assert!(matches!(parse_ipv4(b"1.2.3"), Err(ParseError::OctetCount(_))));
        assert!(matches!(parse_ipv4(b"1.2.3.4.5"), Err(ParseError::OctetCount(_))));
        assert!(matches!(
            parse_ipv4(b"1.2.x.4"),
            Err(ParseError::InvalidByte { byte: b'x', .. })
        ));
        assert!(matches!(parse_ipv4(b".1.2.3"), Err(ParseError::EmptyOctet(_))));
        assert!(matches!(parse_ipv4(b"1.2.3.01"), Err(ParseError::LeadingZero(_))));
        assert!(matches!(parse_ipv4(b"1.2.3.1000"), Err(ParseError::OctetTooLong(_))));
        assert!(matches!(parse_ipv4(b"1.2.3.300"), Err(ParseError::OutOfRange(_))));
    }

    #[test]
    fn error_message_names_the_record() {
        let err = parse_ipv4(b"10.0.0.999").unwrap_err();
        assert_eq!(err.to_string(), "octet above 255 in \"10.0.0.999\"");
    }
}
