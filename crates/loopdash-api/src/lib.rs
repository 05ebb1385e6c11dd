// loopdash-api: Async Rust client for the Loop daemon REST gateway (list swaps)

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::LoopClient;
pub use error::Error;
pub use models::{ListSwapsResponse, SwapStatus};
pub use transport::{TlsMode, TransportConfig};
