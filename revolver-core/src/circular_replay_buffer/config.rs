//! Configuration of [`CircularReplayBuffer`](super::CircularReplayBuffer).
use anyhow::Result;
use revolver_table::Device;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`CircularReplayBuffer`](super::CircularReplayBuffer).
///
/// Missing keys in a YAML file take their default values.
///
/// # Examples
///
/// ```rust
/// use revolver_core::CircularReplayBufferConfig;
///
/// let config = CircularReplayBufferConfig::default()
///     .capacity(100_000)
///     .n_envs(4)
///     .seed(7);
/// assert_eq!(config.capacity, 100_000);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct CircularReplayBufferConfig {
    /// Number of time slots per environment.
    pub capacity: usize,

    /// Number of parallel environments.
    pub n_envs: usize,

    /// Storage location of the buffer.
    pub device: Device,

    /// Random seed used for sampling transitions.
    pub seed: u64,

    /// Name of the observation field.
    pub observation_key: String,

    /// Name of the field holding the next observations in sampled batches.
    pub next_observation_key: String,
}

impl Default for CircularReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            n_envs: 1,
            device: Device::Cpu,
            seed: 42,
            observation_key: "observations".to_string(),
            next_observation_key: "next_observations".to_string(),
        }
    }
}

impl CircularReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of environments.
    pub fn n_envs(mut self, n_envs: usize) -> Self {
        self.n_envs = n_envs;
        self
    }

    /// Sets the storage location.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the name of the observation field.
    pub fn observation_key(mut self, key: impl Into<String>) -> Self {
        self.observation_key = key.into();
        self
    }

    /// Sets the name of the next observation field of sampled batches.
    pub fn next_observation_key(mut self, key: impl Into<String>) -> Self {
        self.next_observation_key = key.into();
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_config() -> Result<()> {
        let config = CircularReplayBufferConfig::default()
            .capacity(128)
            .n_envs(4)
            .seed(7)
            .observation_key("obs")
            .next_observation_key("next_obs");

        let dir = TempDir::new("circular_replay_buffer_config")?;
        let path = dir.path().join("replay_buffer.yaml");
        config.save(&path)?;
        let config_ = CircularReplayBufferConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_partial_yaml() -> Result<()> {
        let config: CircularReplayBufferConfig =
            serde_yaml::from_str("capacity: 16\nn_envs: 2\n")?;
        assert_eq!(config.capacity, 16);
        assert_eq!(config.n_envs, 2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.observation_key, "observations");
        Ok(())
    }
}
