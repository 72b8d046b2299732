use super::Code;
use crate::attributes::{
    Attribute, AttributeType, AttributeValue, EncodingError, decode_value, encode_value,
};
use crate::dictionary::{AttributeCode, AttributeDefinition, Dictionary};
use std::sync::Arc;
use thiserror::Error;

/// Errors from encoding or decoding the packet framing
///
/// Any of the decode variants means the datagram is malformed and must be
/// discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Invalid packet length: {0}")]
    InvalidLength(usize),
    #[error("Length field says {declared} bytes but datagram has {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("Invalid packet code: {0}")]
    InvalidCode(u8),
    #[error("Invalid attribute length {length} at offset {offset}")]
    InvalidAttributeLength { offset: usize, length: usize },
    #[error("Attribute at offset {offset} claims {length} bytes, only {available} remain")]
    AttributeOverrun {
        offset: usize,
        length: usize,
        available: usize,
    },
    #[error("Attribute error: {0}")]
    AttributeError(String),
    #[error("Packet too large: {0} bytes")]
    PacketTooLarge(usize),
}

/// RADIUS Packet structure as defined in RFC 2865 Section 3
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Code      |  Identifier   |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                         Authenticator                         |
/// |                                                               |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet type (1 byte)
    pub code: Code,
    /// Packet identifier for matching requests/responses (1 byte)
    pub identifier: u8,
    /// Request or Response Authenticator (16 bytes)
    pub authenticator: [u8; 16],
    /// Attributes in wire order; types may repeat
    pub attributes: Vec<Attribute>,
}

impl Packet {
    /// Minimum RADIUS packet size (20 bytes: 1 code + 1 id + 2 length + 16 authenticator)
    pub const MIN_PACKET_SIZE: usize = 20;
    /// Maximum RADIUS packet size (4096 bytes as per RFC 2865)
    pub const MAX_PACKET_SIZE: usize = 4096;
    /// Header size, also the offset of the first attribute
    pub const HEADER_SIZE: usize = 20;

    pub fn new(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Packet {
            code,
            identifier,
            authenticator,
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Encode a value by attribute name and append it
    ///
    /// Vendor attributes are wrapped in a Vendor-Specific (26) attribute.
    pub fn add_value(
        &mut self,
        dictionary: &Dictionary,
        name: &str,
        value: &AttributeValue,
    ) -> Result<(), EncodingError> {
        let definition = dictionary
            .lookup_by_name(name)
            .ok_or_else(|| EncodingError::UnknownAttribute(name.to_string()))?;
        let bytes = encode_value(definition, value)?;
        self.add_attribute(Attribute::framed(definition.code(), bytes)?);
        Ok(())
    }

    /// All values of an attribute, in wire order
    ///
    /// Values that do not decode as the dictionary type are returned as raw
    /// [`AttributeValue::Octets`] rather than dropped.
    pub fn values(&self, dictionary: &Dictionary, name: &str) -> Vec<AttributeValue> {
        let Some(definition) = dictionary.lookup_by_name(name) else {
            return Vec::new();
        };
        self.typed_attributes(dictionary)
            .into_iter()
            .filter(|typed| {
                typed
                    .definition
                    .as_ref()
                    .is_some_and(|d| Arc::ptr_eq(d, definition))
            })
            .map(|typed| typed.value)
            .collect()
    }

    /// Every attribute paired with its definition (if known) and logical value
    ///
    /// Vendor-Specific attributes are expanded into their sub-attributes.
    /// Unknown attributes are returned as raw octets with no definition.
    pub fn typed_attributes(&self, dictionary: &Dictionary) -> Vec<TypedAttribute> {
        let mut typed = Vec::with_capacity(self.attributes.len());
        for attr in &self.attributes {
            if let Some(subs) = attr.vendor_attributes() {
                for sub in subs {
                    let code = AttributeCode::vendor(sub.vendor_id, sub.vendor_type);
                    typed.push(TypedAttribute::resolve(dictionary, code, sub.value));
                }
                continue;
            }
            let code = AttributeCode::standard(attr.attr_type);
            typed.push(TypedAttribute::resolve(dictionary, code, &attr.value));
        }
        typed
    }

    /// Encode packet to bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let mut buffer = Vec::with_capacity(self.length());

        buffer.push(self.code.as_u8());
        buffer.push(self.identifier);
        // Length is filled in once the attributes are written
        buffer.extend_from_slice(&[0, 0]);
        buffer.extend_from_slice(&self.authenticator);

        for attr in &self.attributes {
            attr.encode_into(&mut buffer)?;
        }

        let total_length = buffer.len();
        if total_length > Self::MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLarge(total_length));
        }
        buffer[2..4].copy_from_slice(&(total_length as u16).to_be_bytes());

        Ok(buffer)
    }

    /// Decode packet from one datagram
    ///
    /// The Length field must match the datagram size exactly, and every
    /// attribute must have a length of at least 2 that stays inside the packet.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_PACKET_SIZE {
            return Err(PacketError::InvalidLength(data.len()));
        }
        if data.len() > Self::MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLarge(data.len()));
        }

        let code = Code::from_u8(data[0]).ok_or(PacketError::InvalidCode(data[0]))?;
        let identifier = data[1];
        let length = u16::from_be_bytes([data[2], data[3]]) as usize;
        if length != data.len() {
            return Err(PacketError::LengthMismatch {
                declared: length,
                actual: data.len(),
            });
        }

        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&data[4..Self::HEADER_SIZE]);

        let mut attributes = Vec::new();
        let mut offset = Self::HEADER_SIZE;
        while offset < length {
            let attr = Attribute::decode(&data[offset..length], offset)?;
            offset += attr.encoded_length();
            attributes.push(attr);
        }

        Ok(Packet {
            code,
            identifier,
            authenticator,
            attributes,
        })
    }

    /// Get the length of the encoded packet
    pub fn length(&self) -> usize {
        Self::HEADER_SIZE
            + self
                .attributes
                .iter()
                .map(Attribute::encoded_length)
                .sum::<usize>()
    }

    /// Find first attribute by type
    pub fn find_attribute(&self, attr_type: u8) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.attr_type == attr_type)
    }

    /// Find all attributes by type
    pub fn find_all_attributes(&self, attr_type: u8) -> Vec<&Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.attr_type == attr_type)
            .collect()
    }

    /// Whether the packet carries a Message-Authenticator attribute
    pub fn has_message_authenticator(&self) -> bool {
        self.find_attribute(AttributeType::MessageAuthenticator.as_u8())
            .is_some()
    }
}

/// One attribute of a decoded packet, interpreted through a dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct TypedAttribute {
    /// Wire code, with the vendor id for Vendor-Specific sub-attributes
    pub code: AttributeCode,
    /// `None` when the dictionary does not know the code
    pub definition: Option<Arc<AttributeDefinition>>,
    pub value: AttributeValue,
}

impl TypedAttribute {
    fn resolve(dictionary: &Dictionary, code: AttributeCode, bytes: &[u8]) -> Self {
        let definition = dictionary.lookup_by_code(code.code, code.vendor).cloned();
        let value = definition
            .as_ref()
            .and_then(|def| decode_value(def, bytes).ok())
            .unwrap_or_else(|| AttributeValue::Octets(bytes.to_vec()));
        TypedAttribute {
            code,
            definition,
            value,
        }
    }

    /// Dictionary name, or `Attr-N` / `Vendor-V-Attr-N` for unknown codes
    pub fn name(&self) -> String {
        match (&self.definition, self.code.vendor) {
            (Some(def), _) => def.name().to_string(),
            (None, Some(vendor)) => format!("Vendor-{}-Attr-{}", vendor, self.code.code),
            (None, None) => format!("Attr-{}", self.code.code),
        }
    }
}
