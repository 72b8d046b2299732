/// Well-known RADIUS attribute types the protocol code refers to directly
///
/// Everything else is resolved through the [`crate::dictionary::Dictionary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttributeType {
    /// User-Password (2) - RFC 2865
    UserPassword = 2,
    /// Vendor-Specific (26) - RFC 2865
    VendorSpecific = 26,
    /// Message-Authenticator (80) - RFC 2869
    MessageAuthenticator = 80,
}

impl AttributeType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
