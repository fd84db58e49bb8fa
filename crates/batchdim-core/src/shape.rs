use std::fmt;

// Shape — N-dimensional shape representation
//
// A Shape describes the size of each dimension of a tensor.
// For example:
//   - Scalar: Shape([])          — 0 dimensions, 1 element
//   - Vector: Shape([5])         — 1 dimension, 5 elements
//   - Matrix: Shape([3, 4])      — 2 dimensions, 12 elements
//   - Batch:  Shape([2, 3, 4])   — 3 dimensions, 24 elements
//
// A batched tensor reports a *logical* Shape: the physical shape of its
// underlying value with the batch-consumed dimensions cut out. That is what
// `without_dims` computes.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions (0 for scalar, 1 for vector, 2 for matrix, etc.).
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    /// A scalar shape [] has 1 element; any zero-sized dimension gives 0.
    ///
    /// Saturates at `usize::MAX` when the product does not fit. Tensors and
    /// batched tensors reject such shapes on construction, so for them the
    /// count is exact.
    pub fn elem_count(&self) -> usize {
        if self.0.contains(&0) {
            return 0;
        }
        self.0.iter().fold(1usize, |acc, &d| acc.saturating_mul(d))
    }

    /// Exact element count, or `ShapeOverflow` if it does not fit in usize.
    pub fn checked_elem_count(&self) -> crate::Result<usize> {
        if self.0.contains(&0) {
            return Ok(0);
        }
        self.0
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| crate::Error::ShapeOverflow { shape: self.clone() })
    }

    /// Compute the contiguous (row-major / C-order) strides for this shape.
    ///
    /// For shape [2, 3, 4], strides are [12, 4, 1]:
    ///   - Moving 1 step in dim 0 jumps 12 elements (3*4)
    ///   - Moving 1 step in dim 1 jumps 4 elements
    ///   - Moving 1 step in dim 2 jumps 1 element
    ///
    /// Saturates like `elem_count`; see `checked_stride_contiguous`.
    pub fn stride_contiguous(&self) -> Vec<usize> {
        self.strides_with(|acc, d| Some(acc.saturating_mul(d)))
            .unwrap_or_default()
    }

    /// Row-major strides, or `ShapeOverflow` if any of them does not fit.
    pub fn checked_stride_contiguous(&self) -> crate::Result<Vec<usize>> {
        self.strides_with(usize::checked_mul)
            .ok_or_else(|| crate::Error::ShapeOverflow { shape: self.clone() })
    }

    fn strides_with(&self, mul: impl Fn(usize, usize) -> Option<usize>) -> Option<Vec<usize>> {
        let mut strides = vec![0usize; self.rank()];
        let mut acc = 1usize;
        for i in (0..self.rank()).rev() {
            strides[i] = acc;
            if i > 0 {
                acc = mul(acc, self.0[i])?;
            }
        }
        Some(strides)
    }

    /// Size of a specific dimension.
    pub fn dim(&self, d: usize) -> crate::Result<usize> {
        self.0.get(d).copied().ok_or(crate::Error::InvalidDimension {
            dim: d,
            rank: self.rank(),
        })
    }

    /// The shape with every dimension listed in `removed` cut out.
    ///
    /// Indices refer to *this* shape; the surviving dimensions keep their
    /// relative order. Indices out of range are ignored.
    ///
    ///   [2, 3, 4].without_dims(&[1])    → [2, 4]
    ///   [2, 3, 4].without_dims(&[2, 1]) → [2]
    pub fn without_dims(&self, removed: &[usize]) -> Shape {
        Shape(
            self.0
                .iter()
                .enumerate()
                .filter(|(i, _)| !removed.contains(i))
                .map(|(_, &d)| d)
                .collect(),
        )
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// Shape::from((3, 4)), Shape::from([3, 4]), Shape::from(vec![3, 4]) all work.

impl From<()> for Shape {
    /// Scalar shape (0 dimensions).
    fn from(_: ()) -> Self {
        Shape(vec![])
    }
}

impl From<usize> for Shape {
    /// 1-D shape.
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

macro_rules! shape_from_tuple {
    ($($d:ident),+) => {
        impl From<($(shape_from_tuple!(@usize $d),)+)> for Shape {
            fn from(($($d,)+): ($(shape_from_tuple!(@usize $d),)+)) -> Self {
                Shape(vec![$($d),+])
            }
        }
    };
    (@usize $d:ident) => {
        usize
    };
}

shape_from_tuple!(d0);
shape_from_tuple!(d0, d1);
shape_from_tuple!(d0, d1, d2);
shape_from_tuple!(d0, d1, d2, d3);
shape_from_tuple!(d0, d1, d2, d3, d4);

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape(dims.to_vec())
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Shape(s.to_vec())
    }
}
