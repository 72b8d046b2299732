//! Outgoing request construction
//!
//! A [`Request`] collects attributes by name, keeps the plaintext password
//! aside, and produces the final datagram in [`Request::encode`]. The bytes
//! are computed once per send, so every retransmission is identical.

use crate::error::ClientError;
use crate::identifier::IdentifierLease;
use radius_proto::attributes::{Attribute, AttributeType, AttributeValue, EncodingError};
use radius_proto::auth::{
    MAX_PASSWORD_LENGTH, encrypt_user_password, generate_request_authenticator,
    sign_accounting_request,
};
use radius_proto::message_auth::{MESSAGE_AUTHENTICATOR_LENGTH, sign_message_authenticator};
use radius_proto::{AttributeDefinition, Code, Dictionary, Packet};
use std::fmt;
use std::sync::Arc;

/// The kinds of request a client can originate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    AccessRequest,
    AccountingRequest,
    StatusServer,
}

impl RequestKind {
    pub fn code(self) -> Code {
        match self {
            RequestKind::AccessRequest => Code::AccessRequest,
            RequestKind::AccountingRequest => Code::AccountingRequest,
            RequestKind::StatusServer => Code::StatusServer,
        }
    }

    /// Reply codes that may legitimately answer this kind of request
    ///
    /// Status-Server is answered on the authentication port with
    /// Access-Accept (RFC 5997 §3).
    pub fn expected_replies(self) -> &'static [Code] {
        match self {
            RequestKind::AccessRequest => &[
                Code::AccessAccept,
                Code::AccessReject,
                Code::AccessChallenge,
            ],
            RequestKind::AccountingRequest => &[Code::AccountingResponse],
            RequestKind::StatusServer => &[Code::AccessAccept],
        }
    }

    /// Whether the request goes to the accounting port
    pub fn is_accounting(self) -> bool {
        matches!(self, RequestKind::AccountingRequest)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().name())
    }
}

/// How the Request Authenticator is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAuthenticator {
    /// Chosen at build time (Access-Request, Status-Server)
    Random([u8; 16]),
    /// Derived from the encoded packet (Accounting-Request, RFC 2866 §3)
    Deferred,
}

#[derive(Debug, Clone)]
enum Entry {
    Encoded(Attribute),
    /// Plaintext of an `encrypt=1` attribute, obfuscated at encode time
    Hidden {
        definition: Arc<AttributeDefinition>,
        plaintext: Vec<u8>,
    },
}

/// Final wire form of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequest {
    pub bytes: Vec<u8>,
    pub identifier: u8,
    /// The authenticator replies are verified against
    pub authenticator: [u8; 16],
}

/// A request under construction
///
/// Holds its identifier lease for as long as it lives.
pub struct Request {
    kind: RequestKind,
    lease: IdentifierLease,
    authenticator: RequestAuthenticator,
    entries: Vec<Entry>,
    message_authenticator: bool,
    dictionary: Arc<Dictionary>,
    secret: Arc<[u8]>,
}

impl Request {
    /// `message_authenticator` only applies to Access-Request; Status-Server
    /// always carries one and Accounting-Request never does.
    pub(crate) fn new(
        kind: RequestKind,
        lease: IdentifierLease,
        dictionary: Arc<Dictionary>,
        secret: Arc<[u8]>,
        message_authenticator: bool,
    ) -> Self {
        let authenticator = match kind {
            RequestKind::AccountingRequest => RequestAuthenticator::Deferred,
            RequestKind::AccessRequest | RequestKind::StatusServer => {
                RequestAuthenticator::Random(generate_request_authenticator())
            }
        };
        let message_authenticator = match kind {
            RequestKind::AccessRequest => message_authenticator,
            RequestKind::StatusServer => true,
            RequestKind::AccountingRequest => false,
        };
        Request {
            kind,
            lease,
            authenticator,
            entries: Vec::new(),
            message_authenticator,
            dictionary,
            secret,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn identifier(&self) -> u8 {
        self.lease.identifier()
    }

    pub fn authenticator(&self) -> RequestAuthenticator {
        self.authenticator
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    /// Append an attribute by dictionary name
    ///
    /// Attributes flagged `encrypt=1` (User-Password) are routed to
    /// [`set_password`](Self::set_password) semantics. Message-Authenticator
    /// is managed by the request itself and cannot be added by hand.
    pub fn add(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), EncodingError> {
        let definition = self
            .dictionary
            .lookup_by_name(name)
            .ok_or_else(|| EncodingError::UnknownAttribute(name.to_string()))?
            .clone();

        let code = definition.code();
        if code.vendor.is_none() && code.code == AttributeType::MessageAuthenticator.as_u8() {
            return Err(EncodingError::NotAllowed(format!(
                "{} is computed when the request is encoded",
                definition.name()
            )));
        }

        let value = value.into();
        if definition.is_encrypted() {
            let plaintext = match value {
                AttributeValue::String(s) => s.into_bytes(),
                AttributeValue::Octets(bytes) => bytes,
                other => {
                    return Err(EncodingError::TypeMismatch {
                        attribute: definition.name().to_string(),
                        expected: definition.data_type(),
                        found: other.kind(),
                    });
                }
            };
            return self.hide(definition, plaintext);
        }

        let mut scratch = Packet::new(self.kind.code(), 0, [0u8; 16]);
        scratch.add_value(&self.dictionary, name, &value)?;
        self.entries
            .extend(scratch.attributes.into_iter().map(Entry::Encoded));
        Ok(())
    }

    /// Set the User-Password, replacing any earlier one
    pub fn set_password(&mut self, password: impl AsRef<[u8]>) -> Result<(), EncodingError> {
        let definition = self
            .dictionary
            .lookup_by_code(AttributeType::UserPassword.as_u8(), None)
            .cloned()
            .ok_or_else(|| EncodingError::UnknownAttribute("User-Password".to_string()))?;
        self.hide(definition, password.as_ref().to_vec())
    }

    fn hide(
        &mut self,
        definition: Arc<AttributeDefinition>,
        plaintext: Vec<u8>,
    ) -> Result<(), EncodingError> {
        if self.kind.is_accounting() {
            return Err(EncodingError::NotAllowed(format!(
                "{} cannot be sent in an Accounting-Request",
                definition.name()
            )));
        }
        if plaintext.len() > MAX_PASSWORD_LENGTH {
            return Err(EncodingError::PasswordTooLong(plaintext.len()));
        }

        let existing = self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Hidden {
                definition: held,
                plaintext: slot,
            } if Arc::ptr_eq(held, &definition) => Some(slot),
            _ => None,
        });
        match existing {
            Some(slot) => *slot = plaintext,
            None => self.entries.push(Entry::Hidden {
                definition,
                plaintext,
            }),
        }
        Ok(())
    }

    /// Produce the final datagram
    ///
    /// Order of operations: obfuscate hidden attributes with the Request
    /// Authenticator, frame the packet, then either sign it as an
    /// Accounting-Request or fill in the Message-Authenticator.
    pub fn encode(&self) -> Result<EncodedRequest, ClientError> {
        let authenticator = match self.authenticator {
            RequestAuthenticator::Random(auth) => auth,
            RequestAuthenticator::Deferred => [0u8; 16],
        };

        let mut packet = Packet::new(self.kind.code(), self.identifier(), authenticator);
        for entry in &self.entries {
            match entry {
                Entry::Encoded(attr) => packet.add_attribute(attr.clone()),
                Entry::Hidden {
                    definition,
                    plaintext,
                } => {
                    let hidden = encrypt_user_password(plaintext, &self.secret, &authenticator)?;
                    packet.add_attribute(Attribute::framed(definition.code(), hidden)?);
                }
            }
        }

        if self.message_authenticator {
            packet.add_attribute(Attribute::new(
                AttributeType::MessageAuthenticator.as_u8(),
                vec![0u8; MESSAGE_AUTHENTICATOR_LENGTH],
            )?);
        }

        let mut bytes = packet.encode()?;
        let authenticator = match self.authenticator {
            RequestAuthenticator::Random(auth) => {
                if self.message_authenticator {
                    sign_message_authenticator(&mut bytes, &self.secret);
                }
                auth
            }
            RequestAuthenticator::Deferred => {
                sign_accounting_request(&mut bytes, &self.secret)?
            }
        };

        Ok(EncodedRequest {
            bytes,
            identifier: self.identifier(),
            authenticator,
        })
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind)
            .field("identifier", &self.identifier())
            .field("attributes", &self.entries.len())
            .finish_non_exhaustive()
    }
}
