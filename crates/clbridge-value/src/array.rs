use crate::value::Value;

/// Multi-dimensional array of values: rank ≥ 1, row-major storage.
///
/// Constructed shapes are always consistent with their data, so the
/// encoder can recurse over axes without failure paths.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<Value>,
}

/// Shape/data mismatch reported by [`NdArray::new`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShapeError {
    /// Zero-rank arrays have no axis to iterate.
    #[error("array rank must be at least 1")]
    ZeroRank,

    /// The shape does not account for the supplied elements.
    #[error("shape {shape:?} implies {expected} elements, got {actual}")]
    LengthMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
}

impl NdArray {
    /// Create an array, validating `shape` against `data`.
    pub fn new(shape: Vec<usize>, data: Vec<Value>) -> Result<Self, ShapeError> {
        if shape.is_empty() {
            return Err(ShapeError::ZeroRank);
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ShapeError::LengthMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Rank-1 array over `data`.
    pub fn vector(data: Vec<Value>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Extent of each axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major element storage.
    pub fn elements(&self) -> &[Value] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_must_match_data() {
        let err = NdArray::new(vec![2, 2], vec![Value::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::LengthMismatch {
                shape: vec![2, 2],
                expected: 4,
                actual: 1,
            }
        );
    }

    #[test]
    fn zero_rank_rejected() {
        assert_eq!(NdArray::new(vec![], vec![]).unwrap_err(), ShapeError::ZeroRank);
    }

    #[test]
    fn empty_axis_is_valid() {
        let array = NdArray::new(vec![2, 0], vec![]).unwrap();
        assert_eq!(array.rank(), 2);
        assert!(array.elements().is_empty());
    }

    #[test]
    fn vector_constructor() {
        let array = NdArray::vector(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(array.rank(), 1);
        assert_eq!(array.shape(), &[2]);
    }
}
