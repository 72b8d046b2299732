use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::identifier::IdentifierPool;
use crate::reply::Reply;
use crate::request::{EncodedRequest, Request, RequestKind};
use crate::transport::{Rejection, Transport};
use radius_proto::auth::verify_response_authenticator;
use radius_proto::message_auth::verify_reply_message_authenticator;
use radius_proto::{AttributeValue, Dictionary, Packet};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// RADIUS client
///
/// Cheap to clone; clones share the identifier pool, so concurrent requests
/// from any clone never reuse an outstanding identifier.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    dictionary: Arc<Dictionary>,
    secret: Arc<[u8]>,
    identifiers: IdentifierPool,
    transport: Transport,
}

impl Client {
    pub fn new(config: ClientConfig, dictionary: Arc<Dictionary>) -> ClientResult<Self> {
        config.validate()?;
        let secret: Arc<[u8]> = Arc::from(config.secret.as_bytes());
        let transport = Transport::new(config.timeout(), config.retries);

        info!(
            server = %config.server,
            auth_port = config.auth_port,
            acct_port = config.acct_port,
            retries = config.retries,
            timeout_ms = config.timeout_ms,
            "RADIUS client configured"
        );

        Ok(Client {
            config: Arc::new(config),
            dictionary,
            secret,
            identifiers: IdentifierPool::new(),
            transport,
        })
    }

    /// Build a client whose dictionary comes from the configuration, or the
    /// built-in one when no dictionary path is set
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let dictionary = match &config.dictionary {
            Some(path) => Dictionary::from_file(path)?,
            None => Dictionary::standard(),
        };
        Self::new(config, Arc::new(dictionary))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    /// Start an empty request with a fresh identifier
    pub fn new_request(&self, kind: RequestKind) -> ClientResult<Request> {
        let lease = self
            .identifiers
            .acquire()
            .ok_or(ClientError::IdentifiersExhausted)?;
        Ok(Request::new(
            kind,
            lease,
            self.dictionary.clone(),
            self.secret.clone(),
            self.config.message_authenticator,
        ))
    }

    /// Start a request pre-filled with `attributes`, in order
    pub fn new_request_with<'a, I>(&self, kind: RequestKind, attributes: I) -> ClientResult<Request>
    where
        I: IntoIterator<Item = (&'a str, AttributeValue)>,
    {
        let mut request = self.new_request(kind)?;
        for (name, value) in attributes {
            request.add(name, value)?;
        }
        Ok(request)
    }

    /// Access-Request with User-Name, User-Password and the configured
    /// NAS-Identifier
    pub fn access_request(&self, user_name: &str, password: &str) -> ClientResult<Request> {
        let mut request = self.new_request(RequestKind::AccessRequest)?;
        request.add("User-Name", user_name)?;
        request.set_password(password)?;
        request.add("NAS-Identifier", self.config.nas_identifier.as_str())?;
        Ok(request)
    }

    /// Status-Server with the configured NAS-Identifier
    pub fn status_request(&self) -> ClientResult<Request> {
        let mut request = self.new_request(RequestKind::StatusServer)?;
        request.add("NAS-Identifier", self.config.nas_identifier.as_str())?;
        Ok(request)
    }

    /// Encode, transmit and wait for a verified reply
    ///
    /// Access-Request and Status-Server go to the authentication port,
    /// Accounting-Request to the accounting port.
    pub async fn send(&self, request: &Request) -> ClientResult<Reply> {
        let encoded = request.encode()?;
        let port = if request.kind().is_accounting() {
            self.config.acct_port
        } else {
            self.config.auth_port
        };
        let server = self.resolve(port).await?;

        debug!(
            server = %server,
            kind = %request.kind(),
            identifier = encoded.identifier,
            "Sending request"
        );

        let kind = request.kind();
        let secret = self.secret.clone();
        let packet = self
            .transport
            .send_and_receive(server, &encoded.bytes, |datagram| {
                verify_reply(datagram, &encoded, kind, &secret)
            })
            .await?;

        debug!(
            server = %server,
            code = %packet.code,
            identifier = packet.identifier,
            "Reply verified"
        );
        Ok(Reply::new(packet, self.dictionary.clone()))
    }

    async fn resolve(&self, port: u16) -> ClientResult<SocketAddr> {
        let host = self.config.server.as_str();
        // Bracketed IPv6 literals are accepted as well as bare ones
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| ClientError::Resolve(format!("{}: {}", host, e)))?
            .next()
            .ok_or_else(|| ClientError::Resolve(host.to_string()))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("server", &self.config.server)
            .field("auth_port", &self.config.auth_port)
            .field("acct_port", &self.config.acct_port)
            .field("transport", &self.transport)
            .field("identifiers", &self.identifiers)
            .finish_non_exhaustive()
    }
}

/// Checks applied to every datagram that matches the outstanding request
fn verify_reply(
    datagram: &[u8],
    request: &EncodedRequest,
    kind: RequestKind,
    secret: &[u8],
) -> Result<Packet, Rejection> {
    let packet = Packet::decode(datagram)?;

    if !verify_response_authenticator(datagram, &request.authenticator, secret) {
        return Err(Rejection::AuthenticatorMismatch);
    }
    if verify_reply_message_authenticator(datagram, &request.authenticator, secret) == Some(false) {
        return Err(Rejection::MessageAuthenticatorMismatch);
    }
    if !kind.expected_replies().contains(&packet.code) {
        return Err(Rejection::UnexpectedCode(packet.code));
    }

    Ok(packet)
}
