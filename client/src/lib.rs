//! Client for the StreamFlow demo program: instruction setup, manual v0
//! transaction assembly and RPC submission.

pub mod config;
pub mod error;
pub mod rpc;
pub mod scenario;
pub mod transaction;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use rpc::StreamFlowClient;
