//! rsinit Common Types
//!
//! Shared types used by the bootstrap and provisioning procedures,
//! including replica-set configuration, member states, status snapshots,
//! user descriptors and the administrative error type.

pub mod dump;
pub mod error;
pub mod replica;
pub mod status;
pub mod user;
pub mod uri;

pub use dump::*;
pub use error::*;
pub use replica::*;
pub use status::*;
pub use user::*;
pub use uri::*;
