//! Minibatch sampled from [`CircularReplayBuffer`](super::CircularReplayBuffer).
use ndarray::Array2;
use revolver_table::{FieldArray, FieldTable, TableError};

/// A minibatch of transitions.
///
/// Every field has shape `[batch_size, n_envs, ...]`. Besides the stored fields,
/// the batch holds the next observations reconstructed from the observation field
/// of the buffer. The batch owns its data; it is not affected by later writes
/// to the buffer and changing it does not affect the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayBatch {
    /// Sampled fields.
    pub data: FieldTable,

    /// Row indices of the sampled transitions in the buffer, `[batch_size, n_envs]`.
    /// Entry `[b, e]` is the row of sample `b` of environment column `e`.
    pub ix_sample: Array2<usize>,
}

#[allow(clippy::len_without_is_empty)]
impl ReplayBatch {
    /// Number of samples per environment column.
    pub fn len(&self) -> usize {
        self.ix_sample.nrows()
    }

    /// Returns the sampled field named `key`.
    pub fn get(&self, key: &str) -> Result<&FieldArray, TableError> {
        self.data.get(key)
    }

    /// Returns the sampled field named `key` mutably.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut FieldArray, TableError> {
        self.data.get_mut(key)
    }

    /// Decomposes the batch into the sampled fields and the row indices.
    pub fn unpack(self) -> (FieldTable, Array2<usize>) {
        (self.data, self.ix_sample)
    }

    /// Returns the sampled fields.
    pub fn into_table(self) -> FieldTable {
        self.data
    }
}
