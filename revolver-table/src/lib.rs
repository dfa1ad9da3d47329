#![warn(missing_docs)]
//! Named field table for experience storage.
//!
//! A [`FieldTable`] maps field names to [`FieldArray`]s. Every array in a table
//! shares the same leading batch shape, e.g. `[capacity, n_envs]` for the
//! storage of a replay buffer or `[batch_size, n_envs]` for a minibatch drawn
//! from it. Trailing dimensions and the element type are chosen per field.
//!
//! # Examples
//!
//! ```rust
//! use ndarray::{array, Array2};
//! use revolver_table::{Device, FieldTable};
//!
//! let mut table = FieldTable::new(&[3, 1], Device::Cpu);
//! table.set("observations", array![[[0.0f32, 0.5]], [[1.0, 1.5]], [[2.0, 2.5]]])?;
//! table.set("rewards", array![[1.0f32], [0.0], [-1.0]])?;
//!
//! // Pick rows 2 and 0 of the single environment column.
//! let rows = Array2::from_shape_vec((2, 1), vec![2, 0]).unwrap();
//! let batch = table.gather(&rows)?;
//! assert_eq!(batch.batch_shape(), &[2, 1]);
//! assert_eq!(batch.get("rewards")?.shape(), &[2, 1]);
//! # Ok::<(), revolver_table::TableError>(())
//! ```
mod array;
mod device;
mod error;
mod table;
pub use array::{Dtype, Element, FieldArray};
pub use device::Device;
pub use error::TableError;
pub use table::FieldTable;

/// Result type of the table operations.
pub type Result<T> = std::result::Result<T, TableError>;
