use crate::attributes::AttributeType;
use crate::dictionary::AttributeCode;
use crate::packet::PacketError;

/// RADIUS Attribute structure as defined in RFC 2865 Section 5
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type      |    Length     |  Value ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The value is kept as raw wire bytes; typed access goes through the
/// dictionary (see [`crate::attributes::decode_value`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute type (1 byte)
    pub attr_type: u8,
    /// Attribute value (0-253 bytes)
    pub value: Vec<u8>,
}

/// One vendor sub-attribute carried inside a Vendor-Specific (26) attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorAttribute<'a> {
    pub vendor_id: u32,
    pub vendor_type: u8,
    pub value: &'a [u8],
}

impl Attribute {
    /// Minimum attribute length (type + length fields = 2 bytes)
    pub const MIN_LENGTH: usize = 2;
    /// Maximum attribute length (255 bytes including type and length)
    pub const MAX_LENGTH: usize = 255;
    /// Maximum value length (253 bytes)
    pub const MAX_VALUE_LENGTH: usize = 253;
    /// Vendor-Id (4) + Vendor-Type (1) + Vendor-Length (1)
    pub const VSA_HEADER_LENGTH: usize = 6;
    /// Largest value a single vendor sub-attribute can carry
    pub const MAX_VSA_VALUE_LENGTH: usize = Self::MAX_VALUE_LENGTH - Self::VSA_HEADER_LENGTH;

    pub fn new(attr_type: u8, value: Vec<u8>) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VALUE_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Attribute value too long: {} bytes (max {})",
                value.len(),
                Self::MAX_VALUE_LENGTH
            )));
        }
        Ok(Attribute { attr_type, value })
    }

    /// Frame an encoded value under `code`
    ///
    /// Vendor codes are wrapped in a Vendor-Specific (26) attribute.
    pub fn framed(code: AttributeCode, value: Vec<u8>) -> Result<Self, PacketError> {
        match code.vendor {
            Some(vendor_id) => Self::vendor_specific(vendor_id, code.code, &value),
            None => Self::new(code.code, value),
        }
    }

    /// Build a Vendor-Specific attribute holding one sub-attribute
    ///
    /// ```text
    /// | 26 | Len | Vendor-Id (4) | Vendor-Type | Vendor-Len | Value ...
    /// ```
    pub fn vendor_specific(
        vendor_id: u32,
        vendor_type: u8,
        value: &[u8],
    ) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VSA_VALUE_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Vendor attribute value too long: {} bytes (max {})",
                value.len(),
                Self::MAX_VSA_VALUE_LENGTH
            )));
        }
        let mut payload = Vec::with_capacity(Self::VSA_HEADER_LENGTH + value.len());
        payload.extend_from_slice(&vendor_id.to_be_bytes());
        payload.push(vendor_type);
        payload.push((value.len() + 2) as u8);
        payload.extend_from_slice(value);
        Self::new(AttributeType::VendorSpecific.as_u8(), payload)
    }

    /// Split a Vendor-Specific attribute into its sub-attributes
    ///
    /// Several sub-attributes of the same vendor may share one attribute 26.
    /// Returns `None` if this is not attribute 26 or the payload is not in the
    /// RFC 2865 §5.26 recommended format.
    pub fn vendor_attributes(&self) -> Option<Vec<VendorAttribute<'_>>> {
        if self.attr_type != AttributeType::VendorSpecific.as_u8() || self.value.len() < 4 {
            return None;
        }
        let vendor_id =
            u32::from_be_bytes([self.value[0], self.value[1], self.value[2], self.value[3]]);
        let mut rest = &self.value[4..];
        let mut subs = Vec::new();
        while !rest.is_empty() {
            if rest.len() < 2 {
                return None;
            }
            let length = rest[1] as usize;
            if length < 2 || length > rest.len() {
                return None;
            }
            subs.push(VendorAttribute {
                vendor_id,
                vendor_type: rest[0],
                value: &rest[2..length],
            });
            rest = &rest[length..];
        }
        if subs.is_empty() {
            return None;
        }
        Some(subs)
    }

    /// Encode attribute to bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let mut buffer = Vec::with_capacity(self.encoded_length());
        self.encode_into(&mut buffer)?;
        Ok(buffer)
    }

    /// Append the encoded attribute to `buffer`
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> Result<(), PacketError> {
        let length = self.encoded_length();
        if length > Self::MAX_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Encoded attribute too long: {} bytes",
                length
            )));
        }
        buffer.push(self.attr_type);
        buffer.push(length as u8);
        buffer.extend_from_slice(&self.value);
        Ok(())
    }

    /// Decode one attribute from the front of `data`
    ///
    /// `offset` is the position of `data` within the packet and is only used
    /// for error reporting.
    pub fn decode(data: &[u8], offset: usize) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_LENGTH {
            return Err(PacketError::AttributeOverrun {
                offset,
                length: Self::MIN_LENGTH,
                available: data.len(),
            });
        }

        let attr_type = data[0];
        let length = data[1] as usize;

        if length < Self::MIN_LENGTH {
            return Err(PacketError::InvalidAttributeLength { offset, length });
        }
        if length > data.len() {
            return Err(PacketError::AttributeOverrun {
                offset,
                length,
                available: data.len(),
            });
        }

        Ok(Attribute {
            attr_type,
            value: data[Self::MIN_LENGTH..length].to_vec(),
        })
    }

    /// Get the encoded length of this attribute
    pub fn encoded_length(&self) -> usize {
        Self::MIN_LENGTH + self.value.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_encode_layout() {
        let attr = Attribute::new(1, b"test".to_vec()).unwrap();
        assert_eq!(attr.encode().unwrap(), vec![1, 6, b't', b'e', b's', b't']);
    }

    #[test]
    fn test_attribute_decode_stops_at_length() {
        let data = [18, 4, b'h', b'i', 27, 6, 0, 0, 14, 16];
        let attr = Attribute::decode(&data, 20).unwrap();
        assert_eq!(attr.attr_type, 18);
        assert_eq!(attr.value, b"hi");
        assert_eq!(attr.encoded_length(), 4);
    }

    #[test]
    fn test_attribute_decode_rejects_short_lengths() {
        assert!(matches!(
            Attribute::decode(&[1, 0], 20),
            Err(PacketError::InvalidAttributeLength { offset: 20, length: 0 })
        ));
        assert!(matches!(
            Attribute::decode(&[1, 1, 0], 20),
            Err(PacketError::InvalidAttributeLength { length: 1, .. })
        ));
    }

    #[test]
    fn test_attribute_decode_rejects_overrun() {
        assert!(matches!(
            Attribute::decode(&[1, 10, b'a'], 24),
            Err(PacketError::AttributeOverrun { offset: 24, length: 10, available: 3 })
        ));
        assert!(Attribute::decode(&[1], 24).is_err());
    }

    #[test]
    fn test_max_value_length() {
        assert!(Attribute::new(1, vec![0u8; 253]).is_ok());
        assert!(Attribute::new(1, vec![0u8; 254]).is_err());
    }

    #[test]
    fn test_vendor_specific_layout() {
        let attr = Attribute::vendor_specific(9, 1, b"shell:priv-lvl=15").unwrap();
        assert_eq!(attr.attr_type, 26);
        assert_eq!(&attr.value[..4], &9u32.to_be_bytes());
        assert_eq!(attr.value[4], 1);
        assert_eq!(attr.value[5] as usize, 2 + 17);

        let subs = attr.vendor_attributes().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].vendor_id, 9);
        assert_eq!(subs[0].value, b"shell:priv-lvl=15");
    }

    #[test]
    fn test_vendor_specific_grouped() {
        // Two sub-attributes packed in one attribute 26
        let mut value = 311u32.to_be_bytes().to_vec();
        value.extend_from_slice(&[16, 4, 0xAB, 0xCD]);
        value.extend_from_slice(&[17, 3, 0x01]);
        let attr = Attribute::new(26, value).unwrap();

        let subs = attr.vendor_attributes().unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].vendor_type, 17);
        assert_eq!(subs[1].value, &[0x01]);
    }

    #[test]
    fn test_vendor_specific_limits() {
        assert!(Attribute::vendor_specific(9, 1, &[0u8; 247]).is_ok());
        assert!(Attribute::vendor_specific(9, 1, &[0u8; 248]).is_err());

        let broken = Attribute::new(26, vec![0, 0, 0, 9, 1, 40, 0]).unwrap();
        assert!(broken.vendor_attributes().is_none());
        let not_vsa = Attribute::new(1, vec![0, 0, 0, 9]).unwrap();
        assert!(not_vsa.vendor_attributes().is_none());
    }

    #[test]
    fn test_framed_wraps_vendor_codes() {
        let plain = Attribute::framed(AttributeCode::standard(18), b"hi".to_vec()).unwrap();
        assert_eq!(plain.attr_type, 18);
        assert_eq!(plain.value, b"hi");

        let vsa = Attribute::framed(AttributeCode::vendor(32473, 7), b"hi".to_vec()).unwrap();
        assert_eq!(vsa.attr_type, 26);
        assert_eq!(vsa.value, vec![0, 0, 0x7e, 0xd9, 7, 4, b'h', b'i']);
        let subs = vsa.vendor_attributes().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!((subs[0].vendor_id, subs[0].vendor_type), (32473, 7));
        assert_eq!(subs[0].value, b"hi");

        assert!(Attribute::framed(AttributeCode::vendor(1, 1), vec![0; 248]).is_err());
        assert!(Attribute::framed(AttributeCode::standard(1), vec![0; 254]).is_err());
    }
}
