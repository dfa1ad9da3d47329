//! Fixed-capacity circular replay buffer for vectorized environments.
//!
//! # Key Components
//!
//! - [`CircularReplayBuffer`]: the buffer
//! - [`CircularReplayBufferConfig`]: its configuration, loadable from YAML
//! - [`ReplayBatch`]: a minibatch drawn from the buffer
mod base;
mod batch;
mod config;
pub use base::CircularReplayBuffer;
pub use batch::ReplayBatch;
pub use config::CircularReplayBufferConfig;
