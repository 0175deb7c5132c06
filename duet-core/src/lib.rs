//! Wire model shared by the duet relay and its clients.

pub mod error;
pub mod model;
pub mod utils;

pub use error::ProtocolError;
pub use model::*;
