// nettopo-api: HTTP persistence client for the nettopo topology backend

pub mod client;
pub mod error;
pub mod transport;

pub use client::RestClient;
pub use error::Error;
pub use transport::TransportConfig;
