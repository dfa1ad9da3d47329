//! Collects rollouts of random-walk environments into a replay buffer and
//! draws minibatches from it, as an off-policy training loop would.
use anyhow::Result;
use clap::Parser;
use log::info;
use ndarray::{Array2, Array3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use revolver::{CircularReplayBuffer, CircularReplayBufferConfig, Device, FieldTable};

const DIM_OBS: usize = 3;
const DIM_ACT: usize = 1;

/// Fill a circular replay buffer with random rollouts and sample from it
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML configuration of the replay buffer; overrides the options below
    #[arg(long)]
    config: Option<String>,

    /// Capacity of the replay buffer
    #[arg(long, default_value_t = 1000)]
    capacity: usize,

    /// Number of parallel environments
    #[arg(long, default_value_t = 4)]
    n_envs: usize,

    /// Number of rollouts to collect
    #[arg(long, default_value_t = 50)]
    n_rollouts: usize,

    /// Number of steps per rollout
    #[arg(long, default_value_t = 64)]
    rollout_len: usize,

    /// Number of samples per environment in a minibatch
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Random seed of the environments and the buffer
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Vectorized random walk with episodes ending at random.
struct RandomWalk {
    state: Array2<f32>,
    rng: StdRng,
}

impl RandomWalk {
    fn new(n_envs: usize, seed: u64) -> Self {
        Self {
            state: Array2::zeros((n_envs, DIM_OBS)),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Runs `len` steps of all environments with random actions.
    fn rollout(&mut self, len: usize) -> Result<FieldTable> {
        let n_envs = self.state.nrows();
        let mut obs = Array3::<f32>::zeros((len, n_envs, DIM_OBS));
        let mut act = Array3::<f32>::zeros((len, n_envs, DIM_ACT));
        let mut reward = Array2::<f32>::zeros((len, n_envs));
        let mut done = Array2::<bool>::from_elem((len, n_envs), false);

        for t in 0..len {
            for e in 0..n_envs {
                let a: f32 = self.rng.gen_range(-1.0..1.0);
                obs.slice_mut(ndarray::s![t, e, ..]).assign(&self.state.row(e));
                act[[t, e, 0]] = a;
                let mut row = self.state.row_mut(e);
                row.mapv_inplace(|x| x + a);
                reward[[t, e]] = -row.iter().map(|x| x * x).sum::<f32>();
                if self.rng.gen_bool(0.02) {
                    done[[t, e]] = true;
                    row.fill(0.0);
                }
            }
        }

        let mut table = FieldTable::new(&[len, n_envs], Device::Cpu);
        table.set("observations", obs)?;
        table.set("actions", act)?;
        table.set("rewards", reward)?;
        table.set("dones", done)?;
        Ok(table)
    }
}

fn run(args: &Args) -> Result<CircularReplayBuffer> {
    let config = match &args.config {
        Some(path) => CircularReplayBufferConfig::load(path)?,
        None => CircularReplayBufferConfig::default()
            .capacity(args.capacity)
            .n_envs(args.n_envs)
            .seed(args.seed),
    };
    let mut buffer = CircularReplayBuffer::from_config(&config)?;
    let mut env = RandomWalk::new(config.n_envs, args.seed);

    for i in 0..args.n_rollouts {
        buffer.add(&env.rollout(args.rollout_len)?)?;
        let batch_size = args.batch_size.min(buffer.capacity());
        let batch = buffer.sample(batch_size)?;
        let rewards = batch
            .get("rewards")?
            .downcast_ref::<f32>()
            .ok_or_else(|| anyhow::anyhow!("rewards must be f32"))?;
        info!(
            "rollout {:>4}: pos = {:>6}, full = {}, mean sampled reward = {:.3}",
            i,
            buffer.pos(),
            buffer.is_full(),
            rewards.mean().unwrap_or(0.0)
        );
    }

    Ok(buffer)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    run(&args)?;
    Ok(())
}
