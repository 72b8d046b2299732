//! RADIUS attributes: raw TLVs, well-known types and typed values

mod attribute;
mod types;
mod value;

pub use attribute::{Attribute, VendorAttribute};
pub use types::AttributeType;
pub use value::{AttributeValue, DecodingError, EncodingError, decode_value, encode_value};
