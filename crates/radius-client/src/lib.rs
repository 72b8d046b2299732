//! RADIUS Client Implementation
//!
//! This crate provides an async RADIUS client built on top of the
//! `radius-proto` protocol implementation.
//!
//! # Features
//!
//! - Async UDP transport with Tokio, fixed-interval retransmission
//! - Identifier allocation that never reuses an outstanding identifier
//! - Reply verification (Response Authenticator, Message-Authenticator)
//! - JSON configuration with environment overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use radius_client::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig {
//!         server: "127.0.0.1".to_string(),
//!         ..ClientConfig::default()
//!     };
//!     let client = Client::from_config(config)?;
//!
//!     let request = client.access_request("testrunner", "run123")?;
//!     let reply = client.send(&request).await?;
//!     println!("{}", reply.code());
//!     for message in reply.get("Reply-Message") {
//!         println!("  {}", message);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod identifier;
pub mod reply;
pub mod request;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
pub use identifier::{IdentifierLease, IdentifierPool};
pub use reply::Reply;
pub use request::{EncodedRequest, Request, RequestAuthenticator, RequestKind};
pub use transport::{Rejection, Transport};

pub use radius_proto::{AttributeValue, Code, Dictionary};
