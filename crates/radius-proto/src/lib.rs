//! RADIUS Protocol Implementation
//!
//! This crate provides the protocol core of a RADIUS client as defined in
//! RFC 2865, 2866, 2869, 3162 and 5997.
//!
//! # Features
//!
//! - Dictionary loading (FreeRADIUS format, `$INCLUDE`, vendor blocks)
//! - Typed attribute values, including Vendor-Specific attributes
//! - Packet encoding and strict decoding
//! - MD5-based password encryption
//! - Request/Response Authenticator calculation
//! - Message-Authenticator (HMAC-MD5)
//!
//! # Example
//!
//! ```rust
//! use radius_proto::{Code, Dictionary, Packet};
//! use radius_proto::auth::{encrypt_user_password, generate_request_authenticator};
//! use radius_proto::Attribute;
//!
//! let dict = Dictionary::standard();
//!
//! // Create an Access-Request packet
//! let req_auth = generate_request_authenticator();
//! let mut packet = Packet::new(Code::AccessRequest, 1, req_auth);
//! packet.add_value(&dict, "User-Name", &"alice".into()).unwrap();
//!
//! // Add encrypted User-Password
//! let encrypted_pwd = encrypt_user_password(b"password", b"secret", &req_auth).unwrap();
//! packet.add_attribute(Attribute::new(2, encrypted_pwd).unwrap());
//!
//! // Encode to bytes
//! let bytes = packet.encode().unwrap();
//! assert_eq!(Packet::decode(&bytes).unwrap().identifier, 1);
//! ```

pub mod attributes;
pub mod auth;
pub mod dictionary;
pub mod message_auth;
pub mod packet;

pub use attributes::{
    Attribute, AttributeType, AttributeValue, DecodingError, EncodingError, VendorAttribute,
    decode_value, encode_value,
};
pub use auth::{
    calculate_accounting_request_authenticator, calculate_response_authenticator,
    decrypt_user_password, encrypt_user_password, generate_request_authenticator,
    sign_accounting_request, sign_response, verify_response_authenticator,
};
pub use dictionary::{AttributeCode, AttributeDefinition, DataType, Dictionary, DictionaryError};
pub use message_auth::{calculate_message_authenticator, verify_message_authenticator};
pub use packet::{Code, Packet, PacketError, TypedAttribute};
