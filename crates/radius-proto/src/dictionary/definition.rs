use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Attribute data types understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// UTF-8 text
    String,
    /// 32-bit unsigned integer, big-endian
    Integer,
    /// IPv4 address (4 bytes)
    IpAddr,
    /// Seconds since the Unix epoch, 32-bit big-endian
    Date,
    /// Opaque bytes
    Octets,
    /// IPv6 interface identifier (8 bytes) - RFC 3162
    InterfaceId,
    /// IPv6 address (16 bytes) - RFC 3162
    Ipv6Addr,
    /// IPv6 prefix (reserved, length, prefix bytes) - RFC 3162
    Ipv6Prefix,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::IpAddr => "ipaddr",
            DataType::Date => "date",
            DataType::Octets => "octets",
            DataType::InterfaceId => "ifid",
            DataType::Ipv6Addr => "ipv6addr",
            DataType::Ipv6Prefix => "ipv6prefix",
        }
    }
}

impl FromStr for DataType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(DataType::String),
            "integer" => Ok(DataType::Integer),
            "ipaddr" => Ok(DataType::IpAddr),
            "date" => Ok(DataType::Date),
            "octets" => Ok(DataType::Octets),
            "ifid" => Ok(DataType::InterfaceId),
            "ipv6addr" => Ok(DataType::Ipv6Addr),
            "ipv6prefix" => Ok(DataType::Ipv6Prefix),
            _ => Err(()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric key of an attribute: its type code, scoped by vendor for VSAs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeCode {
    /// Vendor-Id (IANA enterprise number) for vendor-specific attributes
    pub vendor: Option<u32>,
    /// Attribute type (or vendor-type inside a Vendor-Specific attribute)
    pub code: u8,
}

impl AttributeCode {
    pub fn standard(code: u8) -> Self {
        AttributeCode { vendor: None, code }
    }

    pub fn vendor(vendor: u32, code: u8) -> Self {
        AttributeCode {
            vendor: Some(vendor),
            code,
        }
    }
}

impl fmt::Display for AttributeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vendor {
            Some(vendor) => write!(f, "{}:{}", vendor, self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// One attribute definition loaded from a dictionary source
///
/// Definitions are frozen once the dictionary finishes loading and are shared
/// behind `Arc`, so lookups by name and by code hand out the same object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    name: String,
    code: AttributeCode,
    data_type: DataType,
    encrypted: bool,
    values: HashMap<String, u32>,
    value_names: HashMap<u32, String>,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, code: AttributeCode, data_type: DataType) -> Self {
        AttributeDefinition {
            name: name.into(),
            code,
            data_type,
            encrypted: false,
            values: HashMap::new(),
            value_names: HashMap::new(),
        }
    }

    /// Mark the attribute as User-Password style obfuscated (`encrypt=1`)
    pub fn with_encryption(mut self) -> Self {
        self.encrypted = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> AttributeCode {
        self.code
    }

    pub fn vendor(&self) -> Option<u32> {
        self.code.vendor
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Whether the value is obfuscated with the RFC 2865 §5.2 algorithm
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Integer for a symbolic value name, e.g. "Start" for Acct-Status-Type
    pub fn value_of(&self, name: &str) -> Option<u32> {
        self.values.get(name).copied()
    }

    /// Symbolic name for an integer value, if the dictionary defines one
    pub fn name_of(&self, value: u32) -> Option<&str> {
        self.value_names.get(&value).map(String::as_str)
    }

    /// Whether two definitions describe the same attribute, ignoring value names
    pub(crate) fn same_shape(&self, other: &AttributeDefinition) -> bool {
        self.name == other.name
            && self.code == other.code
            && self.data_type == other.data_type
            && self.encrypted == other.encrypted
    }

    /// Register a named value. Re-adding the same pair is a no-op.
    pub(crate) fn add_value(&mut self, name: &str, value: u32) -> Result<(), String> {
        match self.values.get(name) {
            Some(&existing) if existing == value => return Ok(()),
            Some(&existing) => {
                return Err(format!(
                    "value {} of {} already defined as {}, not {}",
                    name, self.name, existing, value
                ));
            }
            None => {}
        }
        self.values.insert(name.to_string(), value);
        // First name registered for a number wins on decode
        self.value_names
            .entry(value)
            .or_insert_with(|| name.to_string());
        Ok(())
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.values.iter()
    }
}
