use ndarray::{array, Array, ArrayD};
use revolver_core::{
    CircularReplayBuffer, CircularReplayBufferConfig, Device, FieldTable, ReplayBufferError,
    Result,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One step of a single environment.
fn step(obs: f32) -> FieldTable {
    let mut t = FieldTable::new(&[1, 1], Device::Cpu);
    t.set("observations", array![[[obs]]]).unwrap();
    t.set("actions", array![[[obs * 10.0]]]).unwrap();
    t.set("dones", array![[false]]).unwrap();
    t
}

/// `len` steps of `n_envs` environments. The observation of step `t` of
/// environment `e` is `first + t + 100 * e`.
fn rollout(first: usize, len: usize, n_envs: usize) -> FieldTable {
    let obs = Array::from_shape_fn((len, n_envs, 2), |(t, e, k)| {
        ((first + t + 100 * e) * 2 + k) as f32
    });
    let rewards = Array::from_shape_fn((len, n_envs), |(t, e)| (first + t + 100 * e) as i64);
    let mut table = FieldTable::new(&[len, n_envs], Device::Cpu);
    table.set("observations", obs).unwrap();
    table.set("rewards", rewards).unwrap();
    table
}

fn stored_obs(buffer: &CircularReplayBuffer) -> ArrayD<f32> {
    buffer
        .get("observations")
        .unwrap()
        .downcast_ref::<f32>()
        .unwrap()
        .clone()
}

#[test]
fn test_fill_one_step_at_a_time() -> Result<()> {
    init();
    let mut buffer = CircularReplayBuffer::new(4, 1, Device::Cpu)?;
    for i in 0..3 {
        buffer.add(&step(i as f32))?;
        assert!(!buffer.is_full());
        assert_eq!(buffer.pos(), i + 1);
    }
    buffer.add(&step(3.0))?;
    assert!(buffer.is_full());
    assert_eq!(buffer.pos(), 0);
    assert_eq!(stored_obs(&buffer), array![[[0.0f32]], [[1.0]], [[2.0]], [[3.0]]].into_dyn());
    Ok(())
}

#[test]
fn test_overwrite_oldest() -> Result<()> {
    init();
    let mut buffer = CircularReplayBuffer::new(4, 1, Device::Cpu)?;
    for i in 0..5 {
        buffer.add(&step(i as f32))?;
    }
    assert_eq!(buffer.pos(), 1);
    assert!(buffer.is_full());
    assert_eq!(stored_obs(&buffer), array![[[4.0f32]], [[1.0]], [[2.0]], [[3.0]]].into_dyn());
    let actions = buffer.get("actions")?.downcast_ref::<f32>().unwrap();
    assert_eq!(actions[[0, 0, 0]], 40.0);
    assert_eq!(actions[[1, 0, 0]], 10.0);
    Ok(())
}

#[test]
fn test_sample_excludes_pos() -> Result<()> {
    init();
    let mut buffer = CircularReplayBuffer::new(4, 1, Device::Cpu)?;
    for i in 0..5 {
        buffer.add(&step(i as f32))?;
    }
    let mut seen = [false; 4];
    for _ in 0..200 {
        let batch = buffer.sample(3)?;
        let obs = batch.get("observations")?.downcast_ref::<f32>().unwrap();
        let next_obs = batch
            .get("next_observations")?
            .downcast_ref::<f32>()
            .unwrap();
        for (b, &ix) in batch.ix_sample.column(0).iter().enumerate() {
            assert_ne!(ix, 1);
            seen[ix] = true;
            if ix == 0 {
                assert_eq!(obs[[b, 0, 0]], 4.0);
                assert_eq!(next_obs[[b, 0, 0]], 1.0);
            }
        }
    }
    assert_eq!(seen, [true, false, true, true]);
    Ok(())
}

#[test]
fn test_add_wrong_n_envs() -> Result<()> {
    init();
    let mut buffer = CircularReplayBuffer::new(4, 1, Device::Cpu)?;
    let res = buffer.add(&rollout(0, 1, 2));
    assert_eq!(
        res,
        Err(ReplayBufferError::ShapeMismatch {
            what: "batch shape".to_string(),
            expected: vec![1, 1],
            found: vec![1, 2],
        })
    );
    assert!(buffer.buffer().is_empty());
    Ok(())
}

#[test]
fn test_sample_bounds() -> Result<()> {
    init();
    let mut buffer = CircularReplayBuffer::new(4, 1, Device::Cpu)?;
    assert_eq!(buffer.sample(1), Err(ReplayBufferError::EmptyBuffer));
    buffer.add(&step(0.0))?;
    assert!(matches!(
        buffer.sample(5),
        Err(ReplayBufferError::Bounds { .. })
    ));
    assert!(matches!(
        buffer.sample(0),
        Err(ReplayBufferError::Bounds { .. })
    ));
    Ok(())
}

#[test]
fn test_written_rows_read_back() -> Result<()> {
    init();
    let capacity = 10;
    let n_envs = 3;
    let mut buffer = CircularReplayBuffer::new(capacity, n_envs, Device::Cpu)?;
    let mut written = 0;
    for &len in [1, 3, 2, 3].iter() {
        buffer.add(&rollout(written, len, n_envs))?;
        written += len;
        assert!(!buffer.is_full());
        assert_eq!(buffer.pos(), written);

        let obs = stored_obs(&buffer);
        let rewards = buffer.get("rewards")?.downcast_ref::<i64>().unwrap();
        for t in 0..written {
            for e in 0..n_envs {
                assert_eq!(rewards[[t, e]], (t + 100 * e) as i64);
                assert_eq!(obs[[t, e, 1]], ((t + 100 * e) * 2 + 1) as f32);
            }
        }
    }
    buffer.add(&rollout(written, 1, n_envs))?;
    assert!(buffer.is_full());
    Ok(())
}

#[test]
fn test_full_is_permanent() -> Result<()> {
    init();
    let mut buffer = CircularReplayBuffer::new(5, 2, Device::Cpu)?;
    buffer.add(&rollout(0, 7, 2))?;
    assert!(buffer.is_full());
    for i in 0..12 {
        buffer.add(&rollout(7 + i, 1 + i % 3, 2))?;
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 5);
    }
    Ok(())
}

#[test]
fn test_wraparound_overwrites_head() -> Result<()> {
    init();
    let capacity = 6;
    for k in 1..capacity {
        let mut buffer = CircularReplayBuffer::new(capacity, 2, Device::Cpu)?;
        buffer.add(&rollout(0, capacity, 2))?;
        assert_eq!(buffer.pos(), 0);
        buffer.add(&rollout(capacity, k, 2))?;
        assert_eq!(buffer.pos(), k);

        let rewards = buffer.get("rewards")?.downcast_ref::<i64>().unwrap();
        for t in 0..capacity {
            let step = if t < k { capacity + t } else { t };
            assert_eq!(rewards[[t, 0]], step as i64);
            assert_eq!(rewards[[t, 1]], (step + 100) as i64);
        }
    }
    Ok(())
}

#[test]
fn test_next_observations_follow_rows() -> Result<()> {
    init();
    let capacity = 7;
    let config = CircularReplayBufferConfig::default()
        .capacity(capacity)
        .n_envs(3)
        .seed(11);
    let mut buffer = CircularReplayBuffer::from_config(&config)?;
    for (i, &len) in [4, 5, 2, 9, 1].iter().enumerate() {
        buffer.add(&rollout(i * 10, len, 3))?;
        let stored = stored_obs(&buffer);
        let pos = buffer.pos();

        let batch = buffer.sample(capacity)?;
        let next_obs = batch
            .get("next_observations")?
            .downcast_ref::<f32>()
            .unwrap();
        for ((b, e), &ix) in batch.ix_sample.indexed_iter() {
            assert_ne!(ix, pos);
            for k in 0..2 {
                assert_eq!(next_obs[[b, e, k]], stored[[(ix + 1) % capacity, e, k]]);
            }
        }
    }
    Ok(())
}

#[test]
fn test_samples_are_independent_copies() -> Result<()> {
    init();
    let mut buffer = CircularReplayBuffer::new(4, 2, Device::Cpu)?;
    buffer.add(&rollout(0, 3, 2))?;
    let before = buffer.buffer().clone();

    let mut batch = buffer.sample(4)?;
    let snapshot = batch.clone();
    batch
        .get_mut("observations")?
        .downcast_mut::<f32>()
        .unwrap()
        .fill(-1.0);
    batch
        .get_mut("next_observations")?
        .downcast_mut::<f32>()
        .unwrap()
        .fill(-1.0);
    assert_eq!(buffer.buffer(), &before);

    let batch = snapshot.clone();
    buffer.add(&rollout(50, 8, 2))?;
    assert_ne!(buffer.buffer(), &before);
    assert_eq!(batch, snapshot);
    Ok(())
}

#[test]
fn test_exact_multiple_of_capacity() -> Result<()> {
    init();
    let mut buffer = CircularReplayBuffer::new(3, 1, Device::Cpu)?;
    buffer.add(&rollout(0, 6, 1))?;
    assert!(buffer.is_full());
    assert_eq!(buffer.pos(), 0);
    assert!(buffer.sample(2).is_ok());

    buffer.add(&rollout(6, 1, 1))?;
    buffer.add(&rollout(7, 3, 1))?;
    assert_eq!(buffer.pos(), 1);
    let rewards = buffer.get("rewards")?.downcast_ref::<i64>().unwrap();
    assert_eq!(rewards, &array![[9i64], [7], [8]].into_dyn());
    Ok(())
}
