//! Authenticator and User-Password algorithms (RFC 2865 §3, §5.2; RFC 2866 §3)
//!
//! All authenticator functions work on encoded packet bytes so that
//! verification covers exactly what was on the wire.

use crate::attributes::{DecodingError, EncodingError};
use crate::packet::{Packet, PacketError};
use rand::Rng;

/// RFC 2865 §5.2 limits User-Password to 128 octets
pub const MAX_PASSWORD_LENGTH: usize = 128;

const AUTH_RANGE: std::ops::Range<usize> = 4..20;

/// Generate a random Request Authenticator (16 bytes) per RFC 2865 Section 3
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut rng = rand::rng();
    let mut authenticator = [0u8; 16];
    rng.fill(&mut authenticator);
    authenticator
}

/// MD5(Code + ID + Length + `authenticator` + Attributes + Secret)
///
/// The authenticator field already present in `packet_bytes` is ignored.
fn packet_digest(
    packet_bytes: &[u8],
    authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    if packet_bytes.len() < Packet::MIN_PACKET_SIZE {
        return Err(PacketError::InvalidLength(packet_bytes.len()));
    }
    let mut context = md5::Context::new();
    context.consume(&packet_bytes[..AUTH_RANGE.start]);
    context.consume(authenticator);
    context.consume(&packet_bytes[AUTH_RANGE.end..]);
    context.consume(secret);
    Ok(context.compute().0)
}

/// Calculate Response Authenticator per RFC 2865 Section 3
///
/// Response Authenticator = MD5(Code + ID + Length + Request Authenticator + Attributes + Secret)
///
/// Used for Access-Accept, Access-Reject, Access-Challenge and
/// Accounting-Response. Fails with [`PacketError::InvalidLength`] when
/// `reply_bytes` is shorter than a RADIUS header.
pub fn calculate_response_authenticator(
    reply_bytes: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    packet_digest(reply_bytes, request_authenticator, secret)
}

/// Verify the Response Authenticator of a received reply
///
/// A reply that fails this check must be treated as never received.
pub fn verify_response_authenticator(
    reply_bytes: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    match calculate_response_authenticator(reply_bytes, request_authenticator, secret) {
        Ok(expected) => constant_time_eq(&reply_bytes[AUTH_RANGE], &expected),
        Err(_) => false,
    }
}

/// Stamp the Response Authenticator into an encoded reply
pub fn sign_response(
    reply_bytes: &mut [u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<(), PacketError> {
    let authenticator =
        calculate_response_authenticator(reply_bytes, request_authenticator, secret)?;
    reply_bytes[AUTH_RANGE].copy_from_slice(&authenticator);
    Ok(())
}

/// Calculate the Accounting-Request authenticator per RFC 2866 Section 3
///
/// Request Authenticator = MD5(Code + ID + Length + 16 zero octets + Attributes + Secret)
pub fn calculate_accounting_request_authenticator(
    request_bytes: &[u8],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    packet_digest(request_bytes, &[0u8; 16], secret)
}

/// Stamp the Request Authenticator into an encoded Accounting-Request
///
/// Must run after every attribute is in place, since the length and the
/// attributes are covered by the hash.
pub fn sign_accounting_request(
    request_bytes: &mut [u8],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    let authenticator = calculate_accounting_request_authenticator(request_bytes, secret)?;
    request_bytes[AUTH_RANGE].copy_from_slice(&authenticator);
    Ok(authenticator)
}

/// Verify an Accounting-Request authenticator (server side)
pub fn verify_accounting_request_authenticator(request_bytes: &[u8], secret: &[u8]) -> bool {
    match calculate_accounting_request_authenticator(request_bytes, secret) {
        Ok(expected) => constant_time_eq(&request_bytes[AUTH_RANGE], &expected),
        Err(_) => false,
    }
}

/// Encrypt User-Password attribute per RFC 2865 Section 5.2
///
/// The password is padded with NULs to a multiple of 16 bytes, then each
/// block is XORed with MD5(secret + previous ciphertext block), starting from
/// the Request Authenticator.
pub fn encrypt_user_password(
    password: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, EncodingError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(EncodingError::PasswordTooLong(password.len()));
    }

    let padded_len = password.len().div_ceil(16).max(1) * 16;
    let mut result = password.to_vec();
    result.resize(padded_len, 0);

    let mut previous: [u8; 16] = *authenticator;
    for block in result.chunks_mut(16) {
        let mut context = md5::Context::new();
        context.consume(secret);
        context.consume(previous);
        let hash = context.compute();

        for (byte, key) in block.iter_mut().zip(hash.0.iter()) {
            *byte ^= key;
        }
        previous.copy_from_slice(block);
    }

    Ok(result)
}

/// Decrypt User-Password attribute per RFC 2865 Section 5.2
pub fn decrypt_user_password(
    encrypted: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, DecodingError> {
    if encrypted.len() % 16 != 0 || encrypted.is_empty() {
        return Err(DecodingError::InvalidPasswordLength(encrypted.len()));
    }

    let mut result = Vec::with_capacity(encrypted.len());
    let mut previous: &[u8] = authenticator;

    for chunk in encrypted.chunks(16) {
        let mut context = md5::Context::new();
        context.consume(secret);
        context.consume(previous);
        let hash = context.compute();

        result.extend(chunk.iter().zip(hash.0.iter()).map(|(c, k)| c ^ k));
        previous = chunk;
    }

    // Remove padding (null bytes at the end)
    while result.last() == Some(&0) {
        result.pop();
    }

    Ok(result)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
