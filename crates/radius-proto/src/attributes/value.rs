//! Typed attribute values and their wire representation
//!
//! | Type         | Wire format                                        |
//! |--------------|----------------------------------------------------|
//! | `string`     | UTF-8 bytes                                        |
//! | `integer`    | 4 bytes, big-endian                                |
//! | `ipaddr`     | 4 bytes                                            |
//! | `date`       | 4 bytes, seconds since the Unix epoch, big-endian  |
//! | `octets`     | raw bytes                                          |
//! | `ifid`       | 8 bytes                                            |
//! | `ipv6addr`   | 16 bytes                                           |
//! | `ipv6prefix` | reserved (0), prefix length, prefix bytes          |

use crate::attributes::Attribute;
use crate::dictionary::{AttributeDefinition, DataType};
use crate::packet::PacketError;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use thiserror::Error;

/// Caller supplied a value that cannot be encoded for the attribute
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("{attribute} is of type {expected}, cannot encode {found}")]
    TypeMismatch {
        attribute: String,
        expected: DataType,
        found: &'static str,
    },

    #[error("{attribute} value is {length} bytes, at most {max} fit in one attribute")]
    ValueTooLong {
        attribute: String,
        length: usize,
        max: usize,
    },

    #[error("{attribute} has no value named '{name}'")]
    UnknownValueName { attribute: String, name: String },

    #[error("{attribute}: '{value}' is not a valid {expected}")]
    InvalidText {
        attribute: String,
        value: String,
        expected: DataType,
    },

    #[error("IPv6 prefix length {0} exceeds 128")]
    InvalidPrefixLength(u8),

    #[error("Date {0} cannot be represented as 32-bit seconds since the epoch")]
    DateOutOfRange(DateTime<Utc>),

    #[error("Date {0} has a fractional second; RADIUS dates carry whole seconds")]
    DateNotWholeSeconds(DateTime<Utc>),

    #[error("Password is {0} bytes, at most 128 are allowed")]
    PasswordTooLong(usize),

    #[error("{0} is not allowed in this request")]
    NotAllowed(String),

    #[error("Attribute framing: {0}")]
    Framing(#[from] PacketError),
}

/// Wire bytes do not form a valid value of the attribute's type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    #[error("{attribute}: {length} bytes is not a valid {data_type} value")]
    InvalidLength {
        attribute: String,
        data_type: DataType,
        length: usize,
    },

    #[error("{attribute}: string value is not valid UTF-8")]
    InvalidUtf8 { attribute: String },

    #[error("{attribute}: invalid IPv6 prefix")]
    InvalidPrefix { attribute: String },

    #[error("Encrypted password must be a non-empty multiple of 16 bytes, got {0}")]
    InvalidPasswordLength(usize),
}

/// Logical value of one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Integer(u32),
    /// Symbolic name of an enumerated integer, e.g. `Start`
    Named(String),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Ipv6Prefix { prefix: Ipv6Addr, length: u8 },
    Octets(Vec<u8>),
    Date(DateTime<Utc>),
    InterfaceId([u8; 8]),
}

impl AttributeValue {
    /// Short human name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Named(_) => "named value",
            AttributeValue::Ipv4(_) => "IPv4 address",
            AttributeValue::Ipv6(_) => "IPv6 address",
            AttributeValue::Ipv6Prefix { .. } => "IPv6 prefix",
            AttributeValue::Octets(_) => "octets",
            AttributeValue::Date(_) => "date",
            AttributeValue::InterfaceId(_) => "interface id",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Named(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self {
            AttributeValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<Ipv4Addr> for AttributeValue {
    fn from(value: Ipv4Addr) -> Self {
        AttributeValue::Ipv4(value)
    }
}

impl From<Ipv6Addr> for AttributeValue {
    fn from(value: Ipv6Addr) -> Self {
        AttributeValue::Ipv6(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        AttributeValue::Octets(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::Date(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) | AttributeValue::Named(s) => f.write_str(s),
            AttributeValue::Integer(n) => write!(f, "{}", n),
            AttributeValue::Ipv4(addr) => write!(f, "{}", addr),
            AttributeValue::Ipv6(addr) => write!(f, "{}", addr),
            AttributeValue::Ipv6Prefix { prefix, length } => write!(f, "{}/{}", prefix, length),
            AttributeValue::Octets(bytes) => {
                f.write_str("0x")?;
                bytes.iter().try_for_each(|b| write!(f, "{:02x}", b))
            }
            AttributeValue::Date(date) => write!(f, "{}", date.to_rfc3339()),
            AttributeValue::InterfaceId(id) => {
                let groups: Vec<String> = id
                    .chunks(2)
                    .map(|pair| format!("{:02x}{:02x}", pair[0], pair[1]))
                    .collect();
                f.write_str(&groups.join(":"))
            }
        }
    }
}

/// Convert a logical value into wire bytes for `definition`
///
/// Text is accepted for `ipaddr`, `ipv6addr` and `ipv6prefix` attributes
/// (parsed as addresses) and for enumerated integers (as value names).
/// Values longer than one attribute can hold are rejected, never truncated.
pub fn encode_value(
    definition: &AttributeDefinition,
    value: &AttributeValue,
) -> Result<Vec<u8>, EncodingError> {
    let attribute = definition.name();
    let mismatch = || EncodingError::TypeMismatch {
        attribute: attribute.to_string(),
        expected: definition.data_type(),
        found: value.kind(),
    };
    let invalid_text = |text: &str| EncodingError::InvalidText {
        attribute: attribute.to_string(),
        value: text.to_string(),
        expected: definition.data_type(),
    };

    let bytes = match (definition.data_type(), value) {
        (DataType::String, AttributeValue::String(s)) => s.as_bytes().to_vec(),
        (DataType::String | DataType::Octets, AttributeValue::Octets(bytes)) => bytes.clone(),
        (DataType::Octets, AttributeValue::String(s)) => s.as_bytes().to_vec(),

        (DataType::Integer, AttributeValue::Integer(n)) => n.to_be_bytes().to_vec(),
        (DataType::Integer, AttributeValue::Named(name) | AttributeValue::String(name)) => {
            definition
                .value_of(name)
                .ok_or_else(|| EncodingError::UnknownValueName {
                    attribute: attribute.to_string(),
                    name: name.clone(),
                })?
                .to_be_bytes()
                .to_vec()
        }

        (DataType::IpAddr, AttributeValue::Ipv4(addr)) => addr.octets().to_vec(),
        (DataType::IpAddr, AttributeValue::String(s)) => s
            .parse::<Ipv4Addr>()
            .map_err(|_| invalid_text(s))?
            .octets()
            .to_vec(),

        (DataType::Ipv6Addr, AttributeValue::Ipv6(addr)) => addr.octets().to_vec(),
        (DataType::Ipv6Addr, AttributeValue::String(s)) => s
            .parse::<Ipv6Addr>()
            .map_err(|_| invalid_text(s))?
            .octets()
            .to_vec(),

        (DataType::Ipv6Prefix, AttributeValue::Ipv6Prefix { prefix, length }) => {
            encode_ipv6_prefix(*prefix, *length)?
        }
        (DataType::Ipv6Prefix, AttributeValue::String(s)) => {
            let (prefix, length) = s
                .split_once('/')
                .and_then(|(addr, len)| Some((addr.parse().ok()?, len.parse().ok()?)))
                .ok_or_else(|| invalid_text(s))?;
            encode_ipv6_prefix(prefix, length)?
        }

        (DataType::Date, AttributeValue::Date(date)) => {
            if date.timestamp_subsec_nanos() != 0 {
                return Err(EncodingError::DateNotWholeSeconds(*date));
            }
            u32::try_from(date.timestamp())
                .map_err(|_| EncodingError::DateOutOfRange(*date))?
                .to_be_bytes()
                .to_vec()
        }
        (DataType::Date, AttributeValue::Integer(seconds)) => seconds.to_be_bytes().to_vec(),

        (DataType::InterfaceId, AttributeValue::InterfaceId(id)) => id.to_vec(),
        (DataType::InterfaceId, AttributeValue::Octets(bytes)) if bytes.len() == 8 => {
            bytes.clone()
        }

        _ => return Err(mismatch()),
    };

    let max = if definition.vendor().is_some() {
        Attribute::MAX_VSA_VALUE_LENGTH
    } else {
        Attribute::MAX_VALUE_LENGTH
    };
    if bytes.len() > max {
        return Err(EncodingError::ValueTooLong {
            attribute: attribute.to_string(),
            length: bytes.len(),
            max,
        });
    }
    Ok(bytes)
}

/// Interpret wire bytes according to `definition`
///
/// Enumerated integers come back as [`AttributeValue::Named`] when the
/// dictionary has a name for them, otherwise as the raw integer.
pub fn decode_value(
    definition: &AttributeDefinition,
    bytes: &[u8],
) -> Result<AttributeValue, DecodingError> {
    let attribute = definition.name();
    let invalid_length = || DecodingError::InvalidLength {
        attribute: attribute.to_string(),
        data_type: definition.data_type(),
        length: bytes.len(),
    };

    let value = match definition.data_type() {
        DataType::String => AttributeValue::String(
            String::from_utf8(bytes.to_vec()).map_err(|_| DecodingError::InvalidUtf8 {
                attribute: attribute.to_string(),
            })?,
        ),
        DataType::Octets => AttributeValue::Octets(bytes.to_vec()),
        DataType::Integer => {
            let n = u32::from_be_bytes(bytes.try_into().map_err(|_| invalid_length())?);
            match definition.name_of(n) {
                Some(name) => AttributeValue::Named(name.to_string()),
                None => AttributeValue::Integer(n),
            }
        }
        DataType::IpAddr => {
            let octets: [u8; 4] = bytes.try_into().map_err(|_| invalid_length())?;
            AttributeValue::Ipv4(Ipv4Addr::from(octets))
        }
        DataType::Ipv6Addr => {
            let octets: [u8; 16] = bytes.try_into().map_err(|_| invalid_length())?;
            AttributeValue::Ipv6(Ipv6Addr::from(octets))
        }
        DataType::Date => {
            let seconds = u32::from_be_bytes(bytes.try_into().map_err(|_| invalid_length())?);
            let date = Utc
                .timestamp_opt(i64::from(seconds), 0)
                .single()
                .ok_or_else(invalid_length)?;
            AttributeValue::Date(date)
        }
        DataType::InterfaceId => {
            AttributeValue::InterfaceId(bytes.try_into().map_err(|_| invalid_length())?)
        }
        DataType::Ipv6Prefix => {
            decode_ipv6_prefix(bytes).ok_or_else(|| DecodingError::InvalidPrefix {
                attribute: attribute.to_string(),
            })?
        }
    };
    Ok(value)
}

/// RFC 3162 §2.3: only the significant prefix bytes are sent
fn encode_ipv6_prefix(prefix: Ipv6Addr, length: u8) -> Result<Vec<u8>, EncodingError> {
    if length > 128 {
        return Err(EncodingError::InvalidPrefixLength(length));
    }
    let significant = usize::from(length).div_ceil(8);
    let masked = u128::from(prefix) & prefix_mask(length);
    let mut bytes = vec![0, length];
    bytes.extend_from_slice(&masked.to_be_bytes()[..significant]);
    Ok(bytes)
}

fn decode_ipv6_prefix(bytes: &[u8]) -> Option<AttributeValue> {
    let (&reserved, rest) = bytes.split_first()?;
    let (&length, prefix_bytes) = rest.split_first()?;
    if reserved != 0 || length > 128 || prefix_bytes.len() > 16 {
        return None;
    }
    if prefix_bytes.len() < usize::from(length).div_ceil(8) {
        return None;
    }
    let mut octets = [0u8; 16];
    octets[..prefix_bytes.len()].copy_from_slice(prefix_bytes);
    let prefix = u128::from_be_bytes(octets) & prefix_mask(length);
    Some(AttributeValue::Ipv6Prefix {
        prefix: Ipv6Addr::from(prefix),
        length,
    })
}

fn prefix_mask(length: u8) -> u128 {
    match length {
        0 => 0,
        n => u128::MAX << (128 - u32::from(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{AttributeCode, Dictionary};
    use proptest::prelude::*;

    fn def(name: &str) -> std::sync::Arc<AttributeDefinition> {
        let dict = Dictionary::standard();
        dict.lookup_by_name(name).cloned().unwrap()
    }

    fn round_trip(name: &str, value: AttributeValue) {
        let def = def(name);
        let bytes = encode_value(&def, &value).unwrap();
        assert_eq!(decode_value(&def, &bytes).unwrap(), value, "{}", name);
    }

    #[test]
    fn test_round_trips_per_type() {
        round_trip("User-Name", AttributeValue::from("testrunner"));
        round_trip("Session-Timeout", AttributeValue::Integer(3600));
        round_trip("Acct-Status-Type", AttributeValue::Named("Stop".into()));
        round_trip(
            "Framed-IP-Address",
            AttributeValue::Ipv4(Ipv4Addr::new(10, 0, 0, 7)),
        );
        round_trip(
            "NAS-IPv6-Address",
            AttributeValue::Ipv6("2001:db8::1".parse().unwrap()),
        );
        round_trip("Class", AttributeValue::Octets(vec![0, 1, 2, 0xff]));
        round_trip(
            "Event-Timestamp",
            AttributeValue::Date(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
        );
        round_trip(
            "Framed-Interface-Id",
            AttributeValue::InterfaceId([1, 2, 3, 4, 5, 6, 7, 8]),
        );
        round_trip(
            "Framed-IPv6-Prefix",
            AttributeValue::Ipv6Prefix {
                prefix: "2001:db8:40::".parse().unwrap(),
                length: 42,
            },
        );
    }

    #[test]
    fn test_integer_wire_format() {
        let bytes =
            encode_value(&def("Session-Timeout"), &AttributeValue::Integer(3600)).unwrap();
        assert_eq!(bytes, vec![0, 0, 0x0e, 0x10]);
    }

    #[test]
    fn test_named_values() {
        let def = def("Acct-Status-Type");
        assert_eq!(encode_value(&def, &"Start".into()).unwrap(), vec![0, 0, 0, 1]);
        assert_eq!(
            decode_value(&def, &[0, 0, 0, 1]).unwrap(),
            AttributeValue::Named("Start".into())
        );
        // Unnamed integers come back raw
        assert_eq!(
            decode_value(&def, &[0, 0, 0, 99]).unwrap(),
            AttributeValue::Integer(99)
        );
        assert!(matches!(
            encode_value(&def, &"Sometimes".into()),
            Err(EncodingError::UnknownValueName { .. })
        ));
    }

    #[test]
    fn test_address_text() {
        let bytes = encode_value(&def("NAS-IP-Address"), &"127.0.0.1".into()).unwrap();
        assert_eq!(bytes, vec![127, 0, 0, 1]);
        assert!(matches!(
            encode_value(&def("NAS-IP-Address"), &"localhost".into()),
            Err(EncodingError::InvalidText { .. })
        ));

        let bytes =
            encode_value(&def("Framed-IPv6-Prefix"), &"2001:db8::/32".into()).unwrap();
        assert_eq!(bytes, vec![0, 32, 0x20, 0x01, 0x0d, 0xb8]);
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            encode_value(
                &def("Session-Timeout"),
                &AttributeValue::Ipv4(Ipv4Addr::LOCALHOST)
            ),
            Err(EncodingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            encode_value(&def("User-Name"), &AttributeValue::Integer(1)),
            Err(EncodingError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_string_length_boundary() {
        let def = def("Reply-Message");
        let exact = "x".repeat(253);
        assert_eq!(encode_value(&def, &exact.into()).unwrap().len(), 253);

        let over = "x".repeat(254);
        assert!(matches!(
            encode_value(&def, &over.into()),
            Err(EncodingError::ValueTooLong { length: 254, max: 253, .. })
        ));
    }

    #[test]
    fn test_vendor_value_limit() {
        let def = AttributeDefinition::new(
            "Example-Group",
            AttributeCode::vendor(32473, 1),
            DataType::String,
        );
        assert!(encode_value(&def, &"x".repeat(247).into()).is_ok());
        assert!(encode_value(&def, &"x".repeat(248).into()).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        assert!(matches!(
            decode_value(&def("Session-Timeout"), &[0, 1]),
            Err(DecodingError::InvalidLength { length: 2, .. })
        ));
        assert!(decode_value(&def("Framed-IP-Address"), &[10, 0, 0]).is_err());
        assert!(decode_value(&def("User-Name"), &[0xff, 0xfe]).is_err());
        // Prefix length claims more bytes than present
        assert!(decode_value(&def("Framed-IPv6-Prefix"), &[0, 64, 0x20, 0x01]).is_err());
    }

    #[test]
    fn test_prefix_host_bits_are_cleared() {
        let bytes = encode_value(
            &def("Framed-IPv6-Prefix"),
            &AttributeValue::Ipv6Prefix {
                prefix: "2001:db8::ffff".parse().unwrap(),
                length: 64,
            },
        )
        .unwrap();
        assert_eq!(bytes.len(), 2 + 8);
        assert!(encode_ipv6_prefix(Ipv6Addr::UNSPECIFIED, 129).is_err());
    }

    #[test]
    fn test_date_requires_whole_seconds() {
        let def = def("Event-Timestamp");
        let whole = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(
            encode_value(&def, &AttributeValue::Date(whole)).unwrap(),
            vec![0x65, 0x53, 0xf1, 0x00]
        );

        let fractional = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(
            encode_value(&def, &AttributeValue::Date(fractional)),
            Err(EncodingError::DateNotWholeSeconds(fractional))
        );

        let before_epoch = Utc.timestamp_opt(-1, 0).unwrap();
        assert!(matches!(
            encode_value(&def, &AttributeValue::Date(before_epoch)),
            Err(EncodingError::DateOutOfRange(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(AttributeValue::Octets(vec![0xde, 0xad]).to_string(), "0xdead");
        assert_eq!(AttributeValue::Named("PPP".into()).to_string(), "PPP");
        assert_eq!(
            AttributeValue::InterfaceId([0, 1, 2, 3, 4, 5, 6, 7]).to_string(),
            "0001:0203:0405:0607"
        );
    }

    fn arb_value() -> impl Strategy<Value = (DataType, AttributeValue)> {
        prop_oneof![
            "\\PC{0,60}".prop_map(|s| (DataType::String, AttributeValue::String(s))),
            any::<u32>().prop_map(|n| (DataType::Integer, AttributeValue::Integer(n))),
            any::<u32>().prop_map(|n| (DataType::IpAddr, AttributeValue::Ipv4(n.into()))),
            any::<u128>()
                .prop_map(|n| (DataType::Ipv6Addr, AttributeValue::Ipv6(n.into()))),
            (any::<u128>(), 0u8..=128).prop_map(|(bits, length)| {
                let prefix = Ipv6Addr::from(bits & prefix_mask(length));
                (DataType::Ipv6Prefix, AttributeValue::Ipv6Prefix { prefix, length })
            }),
            prop::collection::vec(any::<u8>(), 0..=253)
                .prop_map(|bytes| (DataType::Octets, AttributeValue::Octets(bytes))),
            any::<u32>().prop_map(|secs| {
                let date = Utc.timestamp_opt(i64::from(secs), 0).unwrap();
                (DataType::Date, AttributeValue::Date(date))
            }),
            any::<[u8; 8]>()
                .prop_map(|id| (DataType::InterfaceId, AttributeValue::InterfaceId(id))),
        ]
    }

    proptest! {
        #[test]
        fn value_round_trip((data_type, value) in arb_value()) {
            let def =
                AttributeDefinition::new("Site-Value", AttributeCode::standard(200), data_type);
            let bytes = encode_value(&def, &value).unwrap();
            prop_assert!(bytes.len() <= Attribute::MAX_VALUE_LENGTH);
            prop_assert_eq!(decode_value(&def, &bytes).unwrap(), value);
        }

        #[test]
        fn named_value_round_trip(
            name in prop::sample::select(vec!["Start", "Stop", "Interim-Update", "Accounting-On"])
        ) {
            let def = def("Acct-Status-Type");
            let value = AttributeValue::Named(name.to_string());
            let bytes = encode_value(&def, &value).unwrap();
            prop_assert_eq!(decode_value(&def, &bytes).unwrap(), value);
        }

        #[test]
        fn fractional_dates_are_rejected(secs in any::<u32>(), nanos in 1u32..1_000_000_000) {
            let date = Utc.timestamp_opt(i64::from(secs), nanos).unwrap();
            prop_assert!(matches!(
                encode_value(&def("Event-Timestamp"), &AttributeValue::Date(date)),
                Err(EncodingError::DateNotWholeSeconds(_))
            ));
        }
    }
}
