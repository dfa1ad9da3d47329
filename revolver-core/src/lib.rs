#![warn(missing_docs)]
//! Replay buffer for off-policy reinforcement learning with vectorized environments.
//!
//! [`CircularReplayBuffer`] stores rollouts of `n_envs` environments in a table of
//! `[capacity, n_envs, ...]` arrays and draws minibatches of transitions from it.
//! Next observations are not stored; they are read from the row following each
//! sampled transition.
pub mod circular_replay_buffer;
pub mod error;

mod base;
pub use base::{AsFieldTable, ExperienceBufferBase, ReplayBufferBase};
pub use circular_replay_buffer::{CircularReplayBuffer, CircularReplayBufferConfig, ReplayBatch};
pub use error::ReplayBufferError;
pub use revolver_table::{Device, Dtype, FieldArray, FieldTable};

/// Result type of the replay buffer operations.
pub type Result<T> = std::result::Result<T, ReplayBufferError>;
