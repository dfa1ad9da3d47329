//! Table of named arrays.
use crate::{Device, FieldArray, Result, TableError};
use log::trace;
use ndarray::Array2;
use std::{collections::btree_map, collections::BTreeMap, ops::Range};

/// A mapping from field names to arrays sharing a leading batch shape.
///
/// [`Clone`] produces an independent deep copy: the arrays own their data.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTable {
    batch_shape: Vec<usize>,
    device: Device,
    fields: BTreeMap<String, FieldArray>,
}

impl FieldTable {
    /// Creates an empty table.
    pub fn new(batch_shape: &[usize], device: Device) -> Self {
        Self {
            batch_shape: batch_shape.to_vec(),
            device,
            fields: BTreeMap::new(),
        }
    }

    /// Leading dimensions shared by all fields.
    pub fn batch_shape(&self) -> &[usize] {
        &self.batch_shape
    }

    /// Storage location of the arrays.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the table has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if the table has a field named `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterates over the fields in ascending order of their names.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldArray> {
        self.fields.iter()
    }

    /// Returns the field named `key`.
    pub fn get(&self, key: &str) -> Result<&FieldArray> {
        self.fields
            .get(key)
            .ok_or_else(|| TableError::MissingField(key.to_string()))
    }

    /// Returns the field named `key` mutably.
    ///
    /// The caller must not change the shape of the array.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut FieldArray> {
        self.fields
            .get_mut(key)
            .ok_or_else(|| TableError::MissingField(key.to_string()))
    }

    /// Inserts or replaces a field.
    ///
    /// The leading dimensions of `array` must equal the batch shape of the table.
    pub fn set(&mut self, key: impl Into<String>, array: impl Into<FieldArray>) -> Result<()> {
        let key = key.into();
        let array = array.into();
        let n = self.batch_shape.len();
        if array.ndim() < n || array.shape()[..n] != self.batch_shape[..] {
            return Err(TableError::ShapeMismatch {
                key,
                expected: self.batch_shape.clone(),
                found: array.shape().to_vec(),
            });
        }
        trace!("Set field {} with shape {:?}", key, array.shape());
        self.fields.insert(key, array);
        Ok(())
    }

    /// Removes a field and returns it.
    pub fn remove(&mut self, key: &str) -> Option<FieldArray> {
        self.fields.remove(key)
    }

    /// Gathers the rows given for every column from all fields.
    ///
    /// The table must have a two-dimensional batch shape `[rows, cols]`
    /// and `rows` must be a `[n_samples, cols]` matrix of row indices.
    /// The returned table has batch shape `[n_samples, cols]` and owns its data.
    pub fn gather(&self, rows: &Array2<usize>) -> Result<Self> {
        if self.batch_shape.len() != 2 || self.batch_shape[1] != rows.ncols() {
            return Err(TableError::ShapeMismatch {
                key: String::new(),
                expected: self.batch_shape.clone(),
                found: rows.shape().to_vec(),
            });
        }
        if let Some(&index) = rows.iter().find(|&&r| r >= self.batch_shape[0]) {
            return Err(TableError::IndexOutOfBounds {
                index,
                len: self.batch_shape[0],
            });
        }

        let fields = self
            .fields
            .iter()
            .map(|(key, array)| {
                let array = array.gather(rows).map_err(|e| e.with_key(key))?;
                Ok((key.clone(), array))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            batch_shape: vec![rows.nrows(), rows.ncols()],
            device: self.device,
            fields,
        })
    }

    /// Returns an owned copy of a contiguous range of rows of all fields.
    pub fn slice_rows(&self, range: Range<usize>) -> Result<Self> {
        let n_rows = self.batch_shape.first().copied().unwrap_or(0);
        if range.start > range.end || range.end > n_rows {
            return Err(TableError::IndexOutOfBounds {
                index: range.end,
                len: n_rows,
            });
        }

        let fields = self
            .fields
            .iter()
            .map(|(key, array)| {
                let array = array
                    .slice_rows(range.clone())
                    .map_err(|e| e.with_key(key))?;
                Ok((key.clone(), array))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let mut batch_shape = self.batch_shape.clone();
        batch_shape[0] = range.end - range.start;

        Ok(Self {
            batch_shape,
            device: self.device,
            fields,
        })
    }
}

impl<'a> IntoIterator for &'a FieldTable {
    type Item = (&'a String, &'a FieldArray);
    type IntoIter = btree_map::Iter<'a, String, FieldArray>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
