//! Circular replay buffer over a table of named fields.
//!
//! The buffer stores `[capacity, n_envs, ...]` arrays and a write cursor `pos`.
//! Before the buffer wraps, rows `[0, pos)` are valid. After it wraps, every row
//! is valid and row `pos` holds the oldest transition of each column.
//!
//! Next observations are not stored. The next observation of the transition at
//! row `i` is the observation at row `(i + 1) % capacity`, so the transition at
//! row `pos` has no valid successor and is never sampled.
use super::{CircularReplayBufferConfig, ReplayBatch};
use crate::{AsFieldTable, ExperienceBufferBase, ReplayBufferBase, ReplayBufferError, Result};
use log::{debug, info, trace};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use revolver_table::{Device, FieldArray, FieldTable};

/// A fixed-capacity replay buffer for vectorized environments.
///
/// Used by off-policy algorithms. Data is added as sequences of time steps
/// of all environments, i.e., tables with batch shape `[sequence_length, n_envs]`,
/// and overwrites the oldest data once the buffer wraps around.
///
/// # Examples
///
/// ```rust
/// use ndarray::array;
/// use revolver_core::{CircularReplayBuffer, Device, FieldTable};
///
/// let mut buffer = CircularReplayBuffer::new(4, 1, Device::Cpu)?;
///
/// let mut data = FieldTable::new(&[3, 1], Device::Cpu);
/// data.set("observations", array![[[0.0f32]], [[1.0]], [[2.0]]])?;
/// data.set("rewards", array![[0.0f32], [1.0], [0.0]])?;
/// buffer.add(&data)?;
///
/// let batch = buffer.sample(2)?;
/// assert_eq!(batch.get("next_observations")?.shape(), &[2, 1, 1]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct CircularReplayBuffer {
    /// Number of rows per environment column.
    capacity: usize,

    /// Number of environment columns.
    n_envs: usize,

    /// Storage with batch shape `[capacity, n_envs]`.
    buf: FieldTable,

    /// Next row to be written.
    pos: usize,

    /// `true` once the number of written rows has reached the capacity.
    full: bool,

    /// Name of the observation field.
    observation_key: String,

    /// Name of the next observation field in sampled batches.
    next_observation_key: String,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl CircularReplayBuffer {
    /// Creates an empty buffer with the default seed and field names.
    pub fn new(capacity: usize, n_envs: usize, device: Device) -> Result<Self> {
        let config = CircularReplayBufferConfig::default()
            .capacity(capacity)
            .n_envs(n_envs)
            .device(device);
        Self::from_config(&config)
    }

    /// Creates an empty buffer with the given configuration.
    pub fn from_config(config: &CircularReplayBufferConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(ReplayBufferError::InvalidConfig(
                "capacity must be positive".to_string(),
            ));
        }
        if config.n_envs == 0 {
            return Err(ReplayBufferError::InvalidConfig(
                "n_envs must be positive".to_string(),
            ));
        }
        if config.observation_key == config.next_observation_key {
            return Err(ReplayBufferError::InvalidConfig(format!(
                "observation_key and next_observation_key are both {}",
                config.observation_key
            )));
        }
        info!(
            "Construct replay buffer with capacity = {}, n_envs = {}, device = {}",
            config.capacity, config.n_envs, config.device
        );

        Ok(Self {
            capacity: config.capacity,
            n_envs: config.n_envs,
            buf: FieldTable::new(&[config.capacity, config.n_envs], config.device),
            pos: 0,
            full: false,
            observation_key: config.observation_key.clone(),
            next_observation_key: config.next_observation_key.clone(),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// The table backing the buffer, with batch shape `[capacity, n_envs]`.
    ///
    /// Rows that have never been written hold zeros.
    pub fn buffer(&self) -> &FieldTable {
        &self.buf
    }

    /// Number of rows per environment column.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of environment columns.
    pub fn n_envs(&self) -> usize {
        self.n_envs
    }

    /// Returns `true` once the number of written rows has reached the capacity.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Batch shape of the storage, `[capacity, n_envs]`.
    pub fn shape(&self) -> &[usize] {
        self.buf.batch_shape()
    }

    /// Storage location.
    pub fn device(&self) -> Device {
        self.buf.device()
    }

    /// Next row to be written.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of valid rows per environment column.
    pub fn len(&self) -> usize {
        if self.full {
            self.capacity
        } else {
            self.pos
        }
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the observation field.
    pub fn observation_key(&self) -> &str {
        &self.observation_key
    }

    /// Name of the next observation field in sampled batches.
    pub fn next_observation_key(&self) -> &str {
        &self.next_observation_key
    }

    /// Returns the stored array of a field, `[capacity, n_envs, ...]`, without copying.
    pub fn get(&self, key: &str) -> Result<&FieldArray> {
        Ok(self.buf.get(key)?)
    }

    /// Returns the stored array of a field mutably.
    ///
    /// The shape of the array must not be changed.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut FieldArray> {
        Ok(self.buf.get_mut(key)?)
    }

    /// Replaces the stored array of a field, or adds a new field.
    ///
    /// The leading dimensions of `value` must be `[capacity, n_envs]`. A stored
    /// field keeps its element type and shape. The write cursor is not changed.
    pub fn set(&mut self, key: &str, value: impl Into<FieldArray>) -> Result<()> {
        if key == self.next_observation_key {
            return Err(ReplayBufferError::ReservedField(key.to_string()));
        }
        let value = value.into();
        if let Ok(dst) = self.buf.get(key) {
            dst.check_compatible(&value).map_err(|e| e.with_key(key))?;
        }
        Ok(self.buf.set(key, value)?)
    }

    /// Adds a sequence of time steps to the buffer.
    ///
    /// `data` must have batch shape `[sequence_length, n_envs]`. The first call
    /// fixes the set of fields, their element types and their shapes; later calls
    /// must provide exactly the same fields. If `sequence_length` exceeds the
    /// capacity, only the last `capacity` steps remain, at the rows sequential
    /// writes would have put them.
    ///
    /// A payload without fields writes nothing and leaves the cursor unchanged.
    /// Nothing is written if an error is returned.
    pub fn add(&mut self, data: &impl AsFieldTable) -> Result<()> {
        let data = data.as_field_table();
        let shape = data.batch_shape();
        if shape.len() != 2 || shape[1] != self.n_envs {
            return Err(ReplayBufferError::ShapeMismatch {
                what: "batch shape".to_string(),
                expected: vec![shape.first().copied().unwrap_or(0), self.n_envs],
                found: shape.to_vec(),
            });
        }
        self.check_schema(data)?;

        let data_len = shape[0];
        if data_len == 0 || data.is_empty() {
            debug!("Skip adding a payload without steps or fields");
            return Ok(());
        }
        trace!("Add {} steps at pos = {}", data_len, self.pos);
        if self.buf.is_empty() {
            self.allocate(data)?;
        }

        // Steps overwritten within this call are skipped.
        let src_start = data_len.saturating_sub(self.capacity);
        let len = data_len - src_start;
        let start = (self.pos + src_start) % self.capacity;
        let tail_len = len.min(self.capacity - start);
        let head_len = len - tail_len;
        for (key, src) in data {
            let dst = self.buf.get_mut(key)?;
            dst.assign_rows(start, src, src_start, tail_len)?;
            if head_len > 0 {
                dst.assign_rows(0, src, src_start + tail_len, head_len)?;
            }
        }

        let end = self.pos + data_len;
        let next_pos = end % self.capacity;
        if end >= self.capacity {
            if next_pos == self.pos {
                // A multiple of the capacity was written: the cursor is back where
                // it started but every row has been rewritten.
                debug!(
                    "Rewrote the whole buffer with {} steps, pos = {}",
                    data_len, next_pos
                );
            }
            if !self.full {
                debug!("Replay buffer is full");
            }
            self.full = true;
        }
        self.pos = next_pos;

        Ok(())
    }

    /// Samples a minibatch of transitions.
    ///
    /// For every environment column, `batch_size` rows are drawn uniformly with
    /// replacement from the valid rows except `pos`. The batch holds copies of
    /// all stored fields at the drawn rows, `[batch_size, n_envs, ...]`, and the
    /// next observations read from row `(row + 1) % capacity`.
    pub fn sample(&mut self, batch_size: usize) -> Result<ReplayBatch> {
        if batch_size == 0 || batch_size > self.capacity {
            return Err(ReplayBufferError::Bounds {
                batch_size,
                capacity: self.capacity,
            });
        }
        // With a single row, the only written row is always `pos`.
        if (!self.full && self.pos == 0) || (self.full && self.capacity == 1) {
            return Err(ReplayBufferError::EmptyBuffer);
        }
        if !self.buf.contains_key(&self.observation_key) {
            return Err(ReplayBufferError::MissingField(
                self.observation_key.clone(),
            ));
        }

        let ixs = self.sample_indices(batch_size);
        trace!("Sample {} rows per column, pos = {}", batch_size, self.pos);
        self.get_samples(ixs)
    }

    /// Draws `[batch_size, n_envs]` row indices, never `pos`.
    fn sample_indices(&mut self, batch_size: usize) -> Array2<usize> {
        let (capacity, pos, full) = (self.capacity, self.pos, self.full);
        let rng = &mut self.rng;
        Array2::from_shape_simple_fn((batch_size, self.n_envs), || {
            if full {
                (rng.gen_range(1..capacity) + pos) % capacity
            } else {
                rng.gen_range(0..pos)
            }
        })
    }

    fn get_samples(&self, ixs: Array2<usize>) -> Result<ReplayBatch> {
        let mut data = self.buf.gather(&ixs)?;
        let next_ixs = ixs.mapv(|ix| (ix + 1) % self.capacity);
        let next_obs = self
            .buf
            .get(&self.observation_key)?
            .gather(&next_ixs)
            .map_err(|e| e.with_key(&self.observation_key))?;
        data.set(self.next_observation_key.clone(), next_obs)?;

        Ok(ReplayBatch {
            data,
            ix_sample: ixs,
        })
    }

    /// Checks that the fields of `data` can be written to the buffer.
    fn check_schema(&self, data: &FieldTable) -> Result<()> {
        if data.contains_key(&self.next_observation_key) {
            return Err(ReplayBufferError::ReservedField(
                self.next_observation_key.clone(),
            ));
        }
        // Fields may have been resized through `FieldTable::get_mut`.
        let shape = data.batch_shape();
        for (key, src) in data {
            if src.ndim() < shape.len() || src.shape()[..shape.len()] != shape[..] {
                return Err(ReplayBufferError::ShapeMismatch {
                    what: format!("field {}", key),
                    expected: shape.to_vec(),
                    found: src.shape().to_vec(),
                });
            }
        }
        if self.buf.is_empty() {
            return Ok(());
        }
        if let Some(key) = self.buf.keys().find(|key| !data.contains_key(key)) {
            return Err(ReplayBufferError::MissingField(key.to_string()));
        }
        for (key, src) in data {
            let dst = self
                .buf
                .get(key)
                .map_err(|_| ReplayBufferError::UnknownField(key.clone()))?;
            dst.check_compatible(src).map_err(|e| e.with_key(key))?;
        }
        Ok(())
    }

    /// Creates zero-filled storage for the fields of the first payload.
    fn allocate(&mut self, data: &FieldTable) -> Result<()> {
        for (key, src) in data {
            let mut shape = src.shape().to_vec();
            shape[0] = self.capacity;
            debug!("Allocate field {} with shape {:?}, {}", key, shape, src.dtype());
            self.buf
                .set(key.clone(), FieldArray::zeros(src.dtype(), &shape))?;
        }
        Ok(())
    }
}

impl AsFieldTable for CircularReplayBuffer {
    fn as_field_table(&self) -> &FieldTable {
        &self.buf
    }
}

impl ExperienceBufferBase for CircularReplayBuffer {
    type Item = FieldTable;

    fn push(&mut self, tr: Self::Item) -> anyhow::Result<()> {
        Ok(self.add(&tr)?)
    }

    /// Number of valid transitions over all environment columns.
    fn len(&self) -> usize {
        CircularReplayBuffer::len(self) * self.n_envs
    }
}

impl ReplayBufferBase for CircularReplayBuffer {
    type Config = CircularReplayBufferConfig;
    type Batch = ReplayBatch;

    fn build(config: &Self::Config) -> anyhow::Result<Self> {
        Ok(Self::from_config(config)?)
    }

    fn batch(&mut self, size: usize) -> anyhow::Result<Self::Batch> {
        Ok(self.sample(size)?)
    }
}
