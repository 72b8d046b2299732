//! UDP exchange with fixed-interval retransmission
//!
//! One socket per exchange, bound to an ephemeral port of the server's
//! address family. Dropping the returned future closes the socket and
//! cancels the pending deadline.

use crate::error::{ClientError, ClientResult};
use radius_proto::{Code, Packet, PacketError};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

/// Why a datagram from the server was dropped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("malformed reply: {0}")]
    Malformed(#[from] PacketError),
    #[error("response authenticator mismatch")]
    AuthenticatorMismatch,
    #[error("Message-Authenticator mismatch")]
    MessageAuthenticatorMismatch,
    #[error("unexpected reply code {0}")]
    UnexpectedCode(Code),
}

/// Retry policy for one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transport {
    timeout: Duration,
    retries: u32,
}

impl Transport {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Transport { timeout, retries }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Total number of transmissions, the first included
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Send `request` to `server` until `accept` approves a reply
    ///
    /// Datagrams from another source or carrying another identifier are
    /// ignored. Datagrams `accept` rejects are dropped and counted. Neither
    /// extends the current attempt's deadline nor consumes a retry.
    ///
    /// Fails with [`ClientError::Timeout`] if at least one attempt passed
    /// without any candidate reply, and with
    /// [`ClientError::ProtocolViolation`] if every attempt only saw
    /// rejected replies.
    pub async fn send_and_receive<T, F>(
        &self,
        server: SocketAddr,
        request: &[u8],
        mut accept: F,
    ) -> ClientResult<T>
    where
        F: FnMut(&[u8]) -> Result<T, Rejection>,
    {
        let identifier = request
            .get(1)
            .copied()
            .ok_or(PacketError::InvalidLength(request.len()))?;

        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;

        // One spare byte so oversized datagrams fail to decode instead of
        // being silently truncated to a valid length.
        let mut buf = vec![0u8; Packet::MAX_PACKET_SIZE + 1];
        let attempts = self.attempts();
        let mut rejected = 0u32;
        let mut saw_silence = false;

        for attempt in 1..=attempts {
            socket.send_to(request, server).await?;
            debug!(
                server = %server,
                identifier = identifier,
                attempt = attempt,
                bytes = request.len(),
                "Request sent"
            );

            let deadline = Instant::now() + self.timeout;
            let mut rejected_this_attempt = 0u32;

            loop {
                let (len, source) = match timeout_at(deadline, socket.recv_from(&mut buf)).await {
                    Err(_) => break,
                    Ok(Ok(received)) => received,
                    Ok(Err(e))
                        if matches!(
                            e.kind(),
                            ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused
                        ) =>
                    {
                        // ICMP port unreachable surfaces here on some platforms
                        debug!(server = %server, error = %e, "Ignoring ICMP error");
                        continue;
                    }
                    Ok(Err(e)) => return Err(e.into()),
                };

                if source != server {
                    debug!(
                        server = %server,
                        source = %source,
                        "Ignoring datagram from unexpected source"
                    );
                    continue;
                }

                let datagram = &buf[..len];
                if datagram.get(1) != Some(&identifier) {
                    debug!(
                        server = %server,
                        expected = identifier,
                        received = ?datagram.get(1),
                        "Ignoring reply for another identifier"
                    );
                    continue;
                }

                match accept(datagram) {
                    Ok(reply) => {
                        debug!(
                            server = %server,
                            identifier = identifier,
                            attempt = attempt,
                            "Reply accepted"
                        );
                        return Ok(reply);
                    }
                    Err(reason) => {
                        rejected += 1;
                        rejected_this_attempt += 1;
                        debug!(
                            server = %server,
                            identifier = identifier,
                            reason = %reason,
                            "Dropped reply"
                        );
                    }
                }
            }

            if rejected_this_attempt == 0 {
                saw_silence = true;
            }
            if attempt < attempts {
                debug!(
                    server = %server,
                    identifier = identifier,
                    attempt = attempt,
                    "No valid reply, retransmitting"
                );
            }
        }

        warn!(
            server = %server,
            identifier = identifier,
            attempts = attempts,
            rejected = rejected,
            "Retries exhausted"
        );

        if saw_silence {
            Err(ClientError::Timeout {
                server,
                attempts,
            })
        } else {
            Err(ClientError::ProtocolViolation {
                server,
                attempts,
                rejected,
            })
        }
    }
}
