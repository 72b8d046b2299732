//! In-process mock RADIUS server for end-to-end tests
//!
//! Listens on two ephemeral UDP ports (authentication and accounting) and
//! answers each datagram with whatever the supplied handler returns.

#![allow(dead_code)]

use radius_client::ClientConfig;
use radius_proto::auth::{
    decrypt_user_password, sign_response, verify_accounting_request_authenticator,
};
use radius_proto::message_auth::{find_message_authenticator, verify_message_authenticator};
use radius_proto::{AttributeValue, Code, Dictionary, Packet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

pub const SECRET: &[u8] = b"testing123";
pub const USER: &str = "testrunner";
pub const PASSWORD: &str = "run123";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    Auth,
    Acct,
}

#[derive(Debug, Clone)]
pub struct Received {
    pub port: Port,
    pub bytes: Vec<u8>,
}

type Handler = dyn Fn(Port, &[u8], usize) -> Option<Vec<u8>> + Send + Sync;

pub struct MockServer {
    pub auth_addr: SocketAddr,
    pub acct_addr: SocketAddr,
    received: Arc<Mutex<Vec<Received>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl MockServer {
    /// Start a server; `handler(port, datagram, n)` gets the 0-based count
    /// of datagrams received so far and returns the reply to send, if any
    pub async fn start<F>(handler: F) -> MockServer
    where
        F: Fn(Port, &[u8], usize) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        let handler: Arc<Handler> = Arc::new(handler);
        let received = Arc::new(Mutex::new(Vec::new()));

        let auth = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let acct = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let auth_addr = auth.local_addr().unwrap();
        let acct_addr = acct.local_addr().unwrap();

        let tasks = vec![
            tokio::spawn(serve(auth, Port::Auth, handler.clone(), received.clone())),
            tokio::spawn(serve(acct, Port::Acct, handler, received.clone())),
        ];

        MockServer {
            auth_addr,
            acct_addr,
            received,
            tasks,
        }
    }

    /// A server that behaves like a FreeRADIUS test instance
    pub async fn freeradius() -> MockServer {
        Self::start(|port, datagram, _| freeradius_reply(port, datagram)).await
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    pub fn config(&self, timeout_ms: u64, retries: u32) -> ClientConfig {
        ClientConfig {
            server: "127.0.0.1".to_string(),
            secret: String::from_utf8(SECRET.to_vec()).unwrap(),
            auth_port: self.auth_addr.port(),
            acct_port: self.acct_addr.port(),
            retries,
            timeout_ms,
            ..ClientConfig::default()
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn serve(
    socket: UdpSocket,
    port: Port,
    handler: Arc<Handler>,
    received: Arc<Mutex<Vec<Received>>>,
) {
    let mut buf = vec![0u8; 4096];
    loop {
        let Ok((len, from)) = socket.recv_from(&mut buf).await else {
            continue;
        };
        let datagram = buf[..len].to_vec();
        let count = {
            let mut log = received.lock().unwrap();
            log.push(Received {
                port,
                bytes: datagram.clone(),
            });
            log.len() - 1
        };
        if let Some(reply) = handler(port, &datagram, count) {
            let _ = socket.send_to(&reply, from).await;
        }
    }
}

/// Build a signed reply to `request`
pub fn reply(request: &[u8], code: Code, attributes: &[(&str, AttributeValue)]) -> Vec<u8> {
    reply_with_secret(request, code, attributes, SECRET)
}

pub fn reply_with_secret(
    request: &[u8],
    code: Code,
    attributes: &[(&str, AttributeValue)],
    secret: &[u8],
) -> Vec<u8> {
    let dict = Dictionary::standard();
    let mut request_auth = [0u8; 16];
    request_auth.copy_from_slice(&request[4..20]);

    let mut packet = Packet::new(code, request[1], [0u8; 16]);
    for (name, value) in attributes {
        packet.add_value(&dict, name, value).unwrap();
    }
    let mut bytes = packet.encode().unwrap();
    sign_response(&mut bytes, &request_auth, secret).unwrap();
    bytes
}

/// Accept `testrunner`/`run123`, reject everything else, answer accounting,
/// ignore Status-Server
pub fn freeradius_reply(port: Port, datagram: &[u8]) -> Option<Vec<u8>> {
    let dict = Dictionary::standard();
    let request = Packet::decode(datagram).ok()?;

    match (port, request.code) {
        (Port::Auth, Code::AccessRequest) => {
            if let Some(offset) = find_message_authenticator(datagram) {
                if !verify_message_authenticator(datagram, SECRET, offset) {
                    return None;
                }
            }
            let user = request.values(&dict, "User-Name");
            let hidden = request.find_attribute(2)?;
            let password =
                decrypt_user_password(&hidden.value, SECRET, &request.authenticator).ok()?;

            if user == vec![AttributeValue::from(USER)] && password == PASSWORD.as_bytes() {
                Some(reply(
                    datagram,
                    Code::AccessAccept,
                    &[
                        ("Session-Timeout", AttributeValue::Integer(3600)),
                        ("Reply-Message", "Welcome, runner!".into()),
                    ],
                ))
            } else {
                Some(reply(datagram, Code::AccessReject, &[]))
            }
        }
        (Port::Acct, Code::AccountingRequest) => {
            verify_accounting_request_authenticator(datagram, SECRET)
                .then(|| reply(datagram, Code::AccountingResponse, &[]))
        }
        _ => None,
    }
}
