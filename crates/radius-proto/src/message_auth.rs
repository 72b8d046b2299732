//! Message-Authenticator Support (RFC 2869, RFC 3579 §3.2, RFC 5997)
//!
//! Message-Authenticator provides integrity protection using HMAC-MD5:
//! - Computed as HMAC-MD5(shared_secret, packet)
//! - Always 16 bytes (128 bits)
//! - Required in Status-Server (RFC 5997 §3) and with EAP-Message
//!
//! The HMAC is computed over the entire RADIUS packet with:
//! - the Request Authenticator in the authenticator field (for replies, the
//!   authenticator of the request being answered)
//! - the Message-Authenticator value set to all zeros

use crate::attributes::AttributeType;
use crate::packet::Packet;
use hmac::{Hmac, Mac};
use md5_digest::Md5;

type HmacMd5 = Hmac<Md5>;

/// Length of the Message-Authenticator value
pub const MESSAGE_AUTHENTICATOR_LENGTH: usize = 16;

/// Calculate Message-Authenticator for a RADIUS packet
///
/// # Arguments
/// * `packet_bytes` - The complete RADIUS packet bytes with Message-Authenticator set to zeros
/// * `secret` - The shared secret
pub fn calculate_message_authenticator(packet_bytes: &[u8], secret: &[u8]) -> [u8; 16] {
    let mut mac = HmacMd5::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(packet_bytes);

    let mut output = [0u8; 16];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}

/// Byte offset of the Message-Authenticator value inside an encoded packet
///
/// Returns `None` if the attribute is absent or has the wrong length.
pub fn find_message_authenticator(packet_bytes: &[u8]) -> Option<usize> {
    let mut offset = Packet::HEADER_SIZE;
    while offset + 2 <= packet_bytes.len() {
        let attr_type = packet_bytes[offset];
        let length = packet_bytes[offset + 1] as usize;
        if length < 2 {
            return None;
        }
        if attr_type == AttributeType::MessageAuthenticator.as_u8() {
            return (length == 2 + MESSAGE_AUTHENTICATOR_LENGTH
                && offset + length <= packet_bytes.len())
            .then_some(offset + 2);
        }
        offset += length;
    }
    None
}

/// Fill in the Message-Authenticator of an encoded request
///
/// The packet must already contain a zeroed Message-Authenticator attribute
/// and its final Request Authenticator. Returns `false` if no
/// Message-Authenticator attribute is present.
pub fn sign_message_authenticator(packet_bytes: &mut [u8], secret: &[u8]) -> bool {
    let Some(offset) = find_message_authenticator(packet_bytes) else {
        return false;
    };
    packet_bytes[offset..offset + MESSAGE_AUTHENTICATOR_LENGTH].fill(0);
    let mac = calculate_message_authenticator(packet_bytes, secret);
    packet_bytes[offset..offset + MESSAGE_AUTHENTICATOR_LENGTH].copy_from_slice(&mac);
    true
}

/// Verify Message-Authenticator in a RADIUS packet
///
/// # Arguments
/// * `packet_bytes` - The complete RADIUS packet bytes
/// * `secret` - The shared secret
/// * `message_auth_offset` - Byte offset where the Message-Authenticator value
///   starts (after type+length)
pub fn verify_message_authenticator(
    packet_bytes: &[u8],
    secret: &[u8],
    message_auth_offset: usize,
) -> bool {
    if message_auth_offset + MESSAGE_AUTHENTICATOR_LENGTH > packet_bytes.len() {
        return false;
    }
    let value_range = message_auth_offset..message_auth_offset + MESSAGE_AUTHENTICATOR_LENGTH;
    let received = &packet_bytes[value_range.clone()];

    let mut packet_copy = packet_bytes.to_vec();
    packet_copy[value_range].fill(0);

    let expected = calculate_message_authenticator(&packet_copy, secret);
    received
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Verify the Message-Authenticator of a reply, if it carries one
///
/// Returns `None` when the reply has no Message-Authenticator.
pub fn verify_reply_message_authenticator(
    reply_bytes: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Option<bool> {
    let offset = find_message_authenticator(reply_bytes)?;
    let mut substituted = reply_bytes.to_vec();
    substituted[4..20].copy_from_slice(request_authenticator);
    Some(verify_message_authenticator(&substituted, secret, offset))
}
