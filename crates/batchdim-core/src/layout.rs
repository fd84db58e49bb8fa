use crate::error::{Error, Result};
use crate::shape::Shape;

// Layout — how a tensor's shape maps onto its flat storage
//
// A Layout is (shape, strides, offset). The element at multi-index `idx`
// lives at `offset + Σ idx[i] * strides[i]` in storage.
//
// These three values are exactly what a batched tensor refuses to expose:
// they describe the physical buffer, including the dimensions a batch level
// has hidden, so they have no meaning for the logical view. Plain tensors
// report them freely.
//
// Views that only rewrite the layout (transpose, narrow) share storage with
// their source, which is also how a batched tensor shares its value.

/// Layout describes how a tensor's logical shape maps to flat storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
    /// Offset into the storage buffer where this tensor's data starts.
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major) layout for the given shape.
    /// Fails with `ShapeOverflow` if a stride does not fit in usize.
    pub fn contiguous(shape: Shape) -> Result<Self> {
        let strides = shape.checked_stride_contiguous()?;
        Ok(Layout {
            shape,
            strides,
            offset: 0,
        })
    }

    /// Create a layout with explicit strides and offset (for views).
    pub fn new(shape: Shape, strides: Vec<usize>, offset: usize) -> Self {
        Layout {
            shape,
            strides,
            offset,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// A layout is contiguous if its strides equal the row-major strides
    /// for its shape and it starts at offset 0.
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == self.shape.stride_contiguous()
    }

    /// Swap two dimensions (and their strides). No data moves.
    ///
    /// Example: [2, 3, 4] transpose(0, 2) → [4, 3, 2]
    ///          strides [12, 4, 1]         → [1, 4, 12]
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim0 >= rank || dim1 >= rank {
            return Err(Error::InvalidDimension {
                dim: dim0.max(dim1),
                rank,
            });
        }
        let mut new_dims = self.shape.dims().to_vec();
        let mut new_strides = self.strides.clone();
        new_dims.swap(dim0, dim1);
        new_strides.swap(dim0, dim1);
        Ok(Layout::new(Shape::new(new_dims), new_strides, self.offset))
    }

    /// Narrow (slice) along a dimension: same strides, shrunk shape,
    /// offset advanced by `start * stride[dim]`.
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim >= rank {
            return Err(Error::InvalidDimension { dim, rank });
        }
        let dim_size = self.shape.dims()[dim];
        if start.checked_add(len).map_or(true, |end| end > dim_size) {
            return Err(Error::NarrowOutOfBounds {
                dim,
                start,
                len,
                dim_size,
            });
        }
        let mut new_dims = self.shape.dims().to_vec();
        new_dims[dim] = len;
        let new_offset = start
            .checked_mul(self.strides[dim])
            .and_then(|skip| self.offset.checked_add(skip))
            .ok_or_else(|| Error::msg("narrow: storage offset overflows usize"))?;
        Ok(Layout::new(
            Shape::new(new_dims),
            self.strides.clone(),
            new_offset,
        ))
    }

    /// Flat storage indices of every element, in logical (row-major) order.
    pub fn strided_indices(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        (0..self.elem_count()).map(move |linear| self.unravel(linear))
    }

    /// Storage index of the element at row-major position `linear`.
    fn unravel(&self, mut linear: usize) -> usize {
        let mut flat = self.offset;
        for (&size, &stride) in self.dims().iter().zip(&self.strides).rev() {
            flat += (linear % size) * stride;
            linear /= size;
        }
        flat
    }
}
