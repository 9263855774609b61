// practrack-api: Async Rust client for the practice-tracker REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod resource;
pub mod transport;
pub mod types;

pub use auth::Credentials;
pub use client::ApiClient;
pub use error::Error;
pub use resource::{ListParams, Resource};
pub use transport::{TlsMode, TransportConfig};
pub use types::{Practice, PracticeResult, PracticeSession};
