//! spv-core
//!
//! Domain models, the views-and-recency ranking rule and the contract a host
//! catalog uses to plug it in.

pub mod catalog;
pub mod error;
pub mod models;
pub mod ranking;
pub mod traits;

// Re-exporting for easier access in other crates
pub use catalog::*;
pub use error::*;
pub use models::*;
pub use ranking::*;
pub use traits::*;
