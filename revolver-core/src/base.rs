//! Replay buffer interface.
//!
//! These traits are the seams between a replay buffer and the processes using it:
//! a collector pushes experiences through [`ExperienceBufferBase`] and a trainer
//! draws minibatches through [`ReplayBufferBase`].
use anyhow::Result;
use revolver_table::FieldTable;

/// Interface for buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of experiences in the buffer.
    fn len(&self) -> usize;
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Constructs a batch of experiences for training.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}

/// Payloads that can be added to a replay buffer.
///
/// The payload is viewed as a [`FieldTable`] with batch shape
/// `[sequence_length, n_envs]`.
pub trait AsFieldTable {
    /// Returns the table holding the data.
    fn as_field_table(&self) -> &FieldTable;
}

impl AsFieldTable for FieldTable {
    fn as_field_table(&self) -> &FieldTable {
        self
    }
}
