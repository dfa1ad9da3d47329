//! Circular replay buffer for off-policy reinforcement learning.
//!
//! This crate re-exports [`revolver_core`], the replay buffer, and
//! [`revolver_table`], the table of named arrays it is built on.
//! See `examples/random_rollout.rs` for a collector/trainer loop driving a buffer.
pub use revolver_core::*;
pub use revolver_table::{Element, TableError};

/// The table of named arrays used for payloads and minibatches.
pub mod table {
    pub use revolver_table::*;
}
