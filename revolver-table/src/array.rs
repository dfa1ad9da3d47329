//! Arrays stored in a table.
use crate::{Result, TableError};
use ndarray::{Array, Array2, ArrayD, Axis, Dimension, IxDyn, Slice};
use std::{fmt, ops::Range};

/// Element type of a [`FieldArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `bool`
    Bool,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::Bool => "bool",
        };
        write!(f, "{}", s)
    }
}

/// A dynamically shaped array holding one of the supported element types.
///
/// The first axis indexes rows (time slots of a buffer, samples of a batch),
/// the second axis indexes environment columns, and the remaining axes are
/// the shape of the field itself.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldArray {
    /// Array of `f32`.
    F32(ArrayD<f32>),
    /// Array of `f64`.
    F64(ArrayD<f64>),
    /// Array of `i32`.
    I32(ArrayD<i32>),
    /// Array of `i64`.
    I64(ArrayD<i64>),
    /// Array of `u8`.
    U8(ArrayD<u8>),
    /// Array of `bool`.
    Bool(ArrayD<bool>),
}

/// Applies `$body` to the inner array whatever its element type is.
macro_rules! dispatch {
    ($value:expr, $a:ident => $body:expr) => {
        match $value {
            FieldArray::F32($a) => $body,
            FieldArray::F64($a) => $body,
            FieldArray::I32($a) => $body,
            FieldArray::I64($a) => $body,
            FieldArray::U8($a) => $body,
            FieldArray::Bool($a) => $body,
        }
    };
}

/// Like `dispatch!`, wrapping the resulting array in the same variant.
macro_rules! map_same {
    ($value:expr, $a:ident => $body:expr) => {
        match $value {
            FieldArray::F32($a) => FieldArray::F32($body),
            FieldArray::F64($a) => FieldArray::F64($body),
            FieldArray::I32($a) => FieldArray::I32($body),
            FieldArray::I64($a) => FieldArray::I64($body),
            FieldArray::U8($a) => FieldArray::U8($body),
            FieldArray::Bool($a) => FieldArray::Bool($body),
        }
    };
}

/// Applies `$body` to two inner arrays of the same element type.
macro_rules! zip_same {
    ($lhs:expr, $rhs:expr, ($a:ident, $b:ident) => $body:expr, _ => $mismatch:expr) => {
        match ($lhs, $rhs) {
            (FieldArray::F32($a), FieldArray::F32($b)) => $body,
            (FieldArray::F64($a), FieldArray::F64($b)) => $body,
            (FieldArray::I32($a), FieldArray::I32($b)) => $body,
            (FieldArray::I64($a), FieldArray::I64($b)) => $body,
            (FieldArray::U8($a), FieldArray::U8($b)) => $body,
            (FieldArray::Bool($a), FieldArray::Bool($b)) => $body,
            _ => $mismatch,
        }
    };
}

/// Element types that can be stored in a [`FieldArray`].
pub trait Element: Clone + Default + PartialEq + fmt::Debug + 'static {
    /// Tag of the element type.
    const DTYPE: Dtype;

    /// Wraps an array into the matching variant.
    fn wrap(array: ArrayD<Self>) -> FieldArray;

    /// Returns the inner array if the element type matches.
    fn view(array: &FieldArray) -> Option<&ArrayD<Self>>;

    /// Returns the inner array mutably if the element type matches.
    fn view_mut(array: &mut FieldArray) -> Option<&mut ArrayD<Self>>;

    /// Unwraps the inner array, giving the input back on a type mismatch.
    fn unwrap(array: FieldArray) -> std::result::Result<ArrayD<Self>, FieldArray>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: Dtype = Dtype::$variant;

            fn wrap(array: ArrayD<Self>) -> FieldArray {
                FieldArray::$variant(array)
            }

            fn view(array: &FieldArray) -> Option<&ArrayD<Self>> {
                match array {
                    FieldArray::$variant(a) => Some(a),
                    _ => None,
                }
            }

            fn view_mut(array: &mut FieldArray) -> Option<&mut ArrayD<Self>> {
                match array {
                    FieldArray::$variant(a) => Some(a),
                    _ => None,
                }
            }

            fn unwrap(array: FieldArray) -> std::result::Result<ArrayD<Self>, FieldArray> {
                match array {
                    FieldArray::$variant(a) => Ok(a),
                    a => Err(a),
                }
            }
        }
    };
}

impl_element!(f32, F32);
impl_element!(f64, F64);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(u8, U8);
impl_element!(bool, Bool);

impl<T: Element, D: Dimension> From<Array<T, D>> for FieldArray {
    fn from(array: Array<T, D>) -> Self {
        T::wrap(array.into_dyn())
    }
}

fn filled<T: Element>(shape: &[usize]) -> FieldArray {
    T::wrap(ArrayD::from_elem(IxDyn(shape), T::default()))
}

fn gather_array<T: Clone + Default>(src: &ArrayD<T>, rows: &Array2<usize>) -> ArrayD<T> {
    let mut shape = src.shape().to_vec();
    shape[0] = rows.nrows();
    let mut out = ArrayD::from_elem(IxDyn(&shape), T::default());
    for ((b, e), &r) in rows.indexed_iter() {
        out.index_axis_mut(Axis(0), b)
            .index_axis_move(Axis(0), e)
            .assign(&src.index_axis(Axis(0), r).index_axis_move(Axis(0), e));
    }
    out
}

impl FieldArray {
    /// Creates an array of the given element type filled with its default value
    /// (zero, or `false` for [`Dtype::Bool`]).
    pub fn zeros(dtype: Dtype, shape: &[usize]) -> Self {
        match dtype {
            Dtype::F32 => filled::<f32>(shape),
            Dtype::F64 => filled::<f64>(shape),
            Dtype::I32 => filled::<i32>(shape),
            Dtype::I64 => filled::<i64>(shape),
            Dtype::U8 => filled::<u8>(shape),
            Dtype::Bool => filled::<bool>(shape),
        }
    }

    /// Creates an array from a flat vector in row-major order.
    pub fn from_shape_vec<T: Element>(shape: &[usize], data: Vec<T>) -> Result<Self> {
        let len = data.len();
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(T::wrap)
            .map_err(|_| TableError::ShapeMismatch {
                key: String::new(),
                expected: shape.to_vec(),
                found: vec![len],
            })
    }

    /// Element type of the array.
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::F32(_) => Dtype::F32,
            Self::F64(_) => Dtype::F64,
            Self::I32(_) => Dtype::I32,
            Self::I64(_) => Dtype::I64,
            Self::U8(_) => Dtype::U8,
            Self::Bool(_) => Dtype::Bool,
        }
    }

    /// Shape of the array.
    pub fn shape(&self) -> &[usize] {
        dispatch!(self, a => a.shape())
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of rows, i.e., the length of the first axis.
    pub fn rows(&self) -> usize {
        self.shape().first().copied().unwrap_or(0)
    }

    /// Returns the inner array if its element type is `T`.
    pub fn downcast_ref<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::view(self)
    }

    /// Returns the inner array mutably if its element type is `T`.
    pub fn downcast_mut<T: Element>(&mut self) -> Option<&mut ArrayD<T>> {
        T::view_mut(self)
    }

    /// Consumes the array and returns the inner array of element type `T`.
    pub fn into_array<T: Element>(self) -> Result<ArrayD<T>> {
        T::unwrap(self).map_err(|a| TableError::TypeMismatch {
            key: String::new(),
            expected: T::DTYPE,
            found: a.dtype(),
        })
    }

    /// Gathers one row per (sample, column) pair.
    ///
    /// `rows` has shape `[n_samples, n_cols]`. The output has shape
    /// `[n_samples, n_cols, ...]` where `out[b, e] = self[rows[b, e], e]`.
    /// The output owns its data.
    pub fn gather(&self, rows: &Array2<usize>) -> Result<Self> {
        let shape = self.shape();
        if shape.len() < 2 || shape[1] != rows.ncols() {
            return Err(TableError::ShapeMismatch {
                key: String::new(),
                expected: vec![self.rows(), rows.ncols()],
                found: shape.to_vec(),
            });
        }
        if let Some(&index) = rows.iter().find(|&&r| r >= shape[0]) {
            return Err(TableError::IndexOutOfBounds {
                index,
                len: shape[0],
            });
        }
        Ok(map_same!(self, a => gather_array(a, rows)))
    }

    /// Copies `len` rows of `src` starting at `src_start` into the rows of `self`
    /// starting at `dst_start`.
    ///
    /// Both arrays must have the same element type and the same shape except
    /// for the first axis.
    pub fn assign_rows(
        &mut self,
        dst_start: usize,
        src: &FieldArray,
        src_start: usize,
        len: usize,
    ) -> Result<()> {
        self.check_compatible(src)?;
        for &(start, rows) in [(dst_start, self.rows()), (src_start, src.rows())].iter() {
            if start + len > rows {
                return Err(TableError::IndexOutOfBounds {
                    index: start + len - 1,
                    len: rows,
                });
            }
        }
        zip_same!(self, src, (a, b) => {
            a.slice_axis_mut(Axis(0), Slice::from(dst_start..dst_start + len))
                .assign(&b.slice_axis(Axis(0), Slice::from(src_start..src_start + len)));
            Ok(())
        }, _ => unreachable!("element types were checked above"))
    }

    /// Returns an owned copy of a contiguous range of rows.
    pub fn slice_rows(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.rows() {
            return Err(TableError::IndexOutOfBounds {
                index: range.end,
                len: self.rows(),
            });
        }
        Ok(map_same!(self, a => a.slice_axis(Axis(0), Slice::from(range.clone())).to_owned()))
    }

    /// Checks that `other` has the same element type and the same shape
    /// except for the first axis.
    pub fn check_compatible(&self, other: &FieldArray) -> Result<()> {
        if self.dtype() != other.dtype() {
            return Err(TableError::TypeMismatch {
                key: String::new(),
                expected: self.dtype(),
                found: other.dtype(),
            });
        }
        if self.ndim() == 0 || other.ndim() != self.ndim() || other.shape()[1..] != self.shape()[1..]
        {
            return Err(TableError::ShapeMismatch {
                key: String::new(),
                expected: self.shape().to_vec(),
                found: other.shape().to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_zeros() {
        let a = FieldArray::zeros(Dtype::Bool, &[3, 2, 1]);
        assert_eq!(a.dtype(), Dtype::Bool);
        assert_eq!(a.shape(), &[3, 2, 1]);
        assert!(a.downcast_ref::<bool>().unwrap().iter().all(|&x| !x));
        assert!(a.downcast_ref::<f32>().is_none());
    }

    #[test]
    fn test_gather() -> Result<()> {
        // rows x envs x 1
        let a = FieldArray::from(array![[[0i64], [10]], [[1], [11]], [[2], [12]]]);
        let rows = array![[2, 0], [0, 1]];
        let b = a.gather(&rows)?;
        assert_eq!(b, FieldArray::from(array![[[2i64], [10]], [[0], [11]]]));
        Ok(())
    }

    #[test]
    fn test_gather_scalar_field() -> Result<()> {
        let a = FieldArray::from(array![[0.0f32, 10.0], [1.0, 11.0]]);
        let b = a.gather(&array![[1, 1], [0, 1], [1, 0]])?;
        assert_eq!(
            b,
            FieldArray::from(array![[1.0f32, 11.0], [0.0, 11.0], [1.0, 10.0]])
        );
        Ok(())
    }

    #[test]
    fn test_gather_out_of_bounds() {
        let a = FieldArray::zeros(Dtype::F32, &[3, 1]);
        assert_eq!(
            a.gather(&array![[3]]),
            Err(TableError::IndexOutOfBounds { index: 3, len: 3 })
        );
        assert!(matches!(
            a.gather(&array![[0, 0]]),
            Err(TableError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_assign_rows() -> Result<()> {
        let mut a = FieldArray::zeros(Dtype::I32, &[4, 1]);
        let b = FieldArray::from(array![[7i32], [8], [9]]);
        a.assign_rows(1, &b, 1, 2)?;
        assert_eq!(a, FieldArray::from(array![[0i32], [8], [9], [0]]));
        assert!(matches!(
            a.assign_rows(3, &b, 0, 2),
            Err(TableError::IndexOutOfBounds { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_assign_rows_mismatch() {
        let mut a = FieldArray::zeros(Dtype::F32, &[4, 1, 2]);
        let wrong_type = FieldArray::zeros(Dtype::F64, &[1, 1, 2]);
        let wrong_shape = FieldArray::zeros(Dtype::F32, &[1, 1, 3]);
        assert!(matches!(
            a.assign_rows(0, &wrong_type, 0, 1),
            Err(TableError::TypeMismatch {
                expected: Dtype::F32,
                found: Dtype::F64,
                ..
            })
        ));
        assert!(matches!(
            a.assign_rows(0, &wrong_shape, 0, 1),
            Err(TableError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_slice_rows_is_a_copy() -> Result<()> {
        let a = FieldArray::from(array![[1u8], [2], [3]]);
        let mut b = a.slice_rows(1..3)?;
        b.downcast_mut::<u8>().unwrap().fill(0);
        assert_eq!(a, FieldArray::from(array![[1u8], [2], [3]]));
        assert_eq!(b.shape(), &[2, 1]);
        Ok(())
    }

    #[test]
    fn test_from_shape_vec() -> Result<()> {
        let a = FieldArray::from_shape_vec(&[2, 1, 2], vec![0.0f64, 1.0, 2.0, 3.0])?;
        assert_eq!(a.into_array::<f64>()?, array![[[0.0, 1.0]], [[2.0, 3.0]]].into_dyn());
        assert!(FieldArray::from_shape_vec(&[2, 2], vec![0.0f64]).is_err());
        assert!(matches!(
            FieldArray::from(array![1u8]).into_array::<f32>(),
            Err(TableError::TypeMismatch { .. })
        ));
        Ok(())
    }
}
