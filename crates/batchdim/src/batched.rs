use std::sync::RwLockReadGuard;

use batchdim_core::{bail, Error, Result, Shape, Storage, Tensor, TensorMeta};

// BatchedTensor — a tensor with hidden vmap batch dimensions
//
// A batched tensor wraps a plain Tensor (its *value*) and a list of batch
// dims. Each batch dim pins one vmap level to one physical dimension of the
// value; that dimension disappears from the logical shape.
//
//   value: [2, 3, 4]   bdims: [(level 1, dim 1)]            → logical [2, 4]
//   value: [2, 3, 4]   bdims: [(level 1, dim 1), (2, dim 2)] → logical [2]
//
// STACKING:
//
//   add_batch_dim takes `dim` in terms of the *source's* logical dims, then
//   resolves it to a physical dim of the shared value with `actual_dim`.
//   The second row above comes from adding level 2 at logical dim 1 of the
//   [2, 4] view: the 1st unconsumed physical dim is 2.
//
//   Batched-on-batched never nests. The new view holds the same value and
//   one more bdim, so the logical shape is always "physical shape minus
//   consumed dims" regardless of the order levels were added in.
//
// LAYOUT QUERIES:
//
//   strides / is_contiguous / storage / storage_offset describe the
//   physical buffer including the hidden dims, so a batched tensor returns
//   UnsupportedOnBatchedValue for all four. Code that needs them goes
//   through value().

/// Identifier of a vmap level.
pub type Level = i64;

/// One batch level pinned to a physical dimension of the underlying value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchDim {
    level: Level,
    dim: usize,
}

impl BatchDim {
    pub fn new(level: Level, dim: usize) -> Self {
        BatchDim { level, dim }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Physical dimension of the value consumed by this level.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// A tensor whose batch dimensions are hidden from shape queries.
#[derive(Clone)]
pub struct BatchedTensor {
    value: Tensor,
    bdims: Vec<BatchDim>,
    /// Cached logical shape.
    shape: Shape,
}

impl std::fmt::Debug for BatchedTensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchedTensor")
            .field("value", &self.value)
            .field("bdims", &self.bdims)
            .field("shape", &format_args!("{}", self.shape))
            .finish()
    }
}

/// Physical dimension of `value` behind `logical_dim`: the
/// `logical_dim`-th dimension not consumed by any of `bdims`.
fn actual_dim(physical_rank: usize, bdims: &[BatchDim], logical_dim: usize) -> Result<usize> {
    (0..physical_rank)
        .filter(|d| bdims.iter().all(|b| b.dim != *d))
        .nth(logical_dim)
        .ok_or(Error::InvalidDimension {
            dim: logical_dim,
            rank: physical_rank.saturating_sub(bdims.len()),
        })
}

fn attach(value: &Tensor, bdims: &[BatchDim], level: Level, dim: usize) -> Result<BatchedTensor> {
    if bdims.iter().any(|b| b.level == level) {
        return Err(Error::DuplicateLevel { level });
    }
    let physical = actual_dim(value.layout().rank(), bdims, dim)?;
    let mut new_bdims = Vec::with_capacity(bdims.len() + 1);
    new_bdims.extend_from_slice(bdims);
    new_bdims.push(BatchDim::new(level, physical));
    tracing::trace!(level, dim, physical, "added batch dim");
    BatchedTensor::from_valid_parts(value.clone(), new_bdims)
}

fn unsupported<T>(op: &'static str) -> Result<T> {
    tracing::debug!(op, "rejected physical layout query on batched tensor");
    Err(Error::UnsupportedOnBatchedValue { op })
}

impl BatchedTensor {
    /// Caller guarantees the bdims invariants. Fails only if the logical
    /// element count does not fit in usize, which can happen once a
    /// zero-sized dim is hidden.
    fn from_valid_parts(value: Tensor, bdims: Vec<BatchDim>) -> Result<Self> {
        let consumed: Vec<usize> = bdims.iter().map(BatchDim::dim).collect();
        let shape = value.layout().shape().without_dims(&consumed);
        shape.checked_elem_count()?;
        Ok(BatchedTensor {
            value,
            bdims,
            shape,
        })
    }

    /// Map a logical dimension of this tensor to the physical dimension of
    /// [`value`](Batchable::value).
    pub fn actual_dim(&self, logical_dim: usize) -> Result<usize> {
        actual_dim(self.value.layout().rank(), &self.bdims, logical_dim)
    }

    /// Level ids in the order they were added.
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.bdims.iter().map(BatchDim::level)
    }

    /// Size of the dimension hidden by `level`, if that level is attached.
    pub fn batch_size(&self, level: Level) -> Option<usize> {
        self.bdims
            .iter()
            .find(|b| b.level == level)
            .map(|b| self.value.layout().dims()[b.dim])
    }
}

/// Build a batched tensor from bdims that already name physical dims of
/// `value`.
///
/// Rejects an empty bdims list, physical dims out of range or consumed
/// twice, and repeated levels.
pub fn make_batched(value: Tensor, bdims: Vec<BatchDim>) -> Result<BatchedTensor> {
    if bdims.is_empty() {
        bail!("make_batched: at least one batch dim is required");
    }
    let rank = value.layout().rank();
    for (i, b) in bdims.iter().enumerate() {
        if b.dim >= rank {
            return Err(Error::InvalidDimension { dim: b.dim, rank });
        }
        let earlier = &bdims[..i];
        if earlier.iter().any(|e| e.level == b.level) {
            return Err(Error::DuplicateLevel { level: b.level });
        }
        if earlier.iter().any(|e| e.dim == b.dim) {
            bail!("make_batched: physical dim {} is consumed twice", b.dim);
        }
    }
    BatchedTensor::from_valid_parts(value, bdims)
}

/// Anything a batch dimension can be added to: a plain [`Tensor`] or a
/// [`BatchedTensor`].
pub trait Batchable: TensorMeta {
    /// The plain tensor underneath. A `Tensor` is its own value.
    fn value(&self) -> &Tensor;

    /// Attached batch dims, in the order they were added. Empty for a
    /// plain tensor.
    fn bdims(&self) -> &[BatchDim];

    fn is_batched(&self) -> bool {
        !self.bdims().is_empty()
    }

    /// Hide logical dimension `dim` behind vmap level `level`.
    ///
    /// Returns a new view over the same value; `self` is unchanged.
    ///
    /// # Errors
    /// - [`Error::InvalidDimension`] if `dim >= self.rank()`
    /// - [`Error::DuplicateLevel`] if `level` is already attached
    /// - [`Error::ShapeOverflow`] if the logical element count would not
    ///   fit in usize
    fn add_batch_dim(&self, level: Level, dim: usize) -> Result<BatchedTensor> {
        attach(self.value(), self.bdims(), level, dim)
    }
}

impl Batchable for Tensor {
    fn value(&self) -> &Tensor {
        self
    }

    fn bdims(&self) -> &[BatchDim] {
        &[]
    }
}

impl Batchable for BatchedTensor {
    fn value(&self) -> &Tensor {
        &self.value
    }

    fn bdims(&self) -> &[BatchDim] {
        &self.bdims
    }
}

impl TensorMeta for BatchedTensor {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn strides(&self) -> Result<&[usize]> {
        unsupported("strides")
    }

    fn is_contiguous(&self) -> Result<bool> {
        unsupported("is_contiguous")
    }

    fn storage(&self) -> Result<RwLockReadGuard<'_, Storage>> {
        unsupported("storage")
    }

    fn storage_offset(&self) -> Result<usize> {
        unsupported("storage_offset")
    }
}

/// Free-function form of [`Batchable::add_batch_dim`].
pub fn add_batch_dim<T: Batchable + ?Sized>(
    tensor: &T,
    level: Level,
    dim: usize,
) -> Result<BatchedTensor> {
    tensor.add_batch_dim(level, dim)
}
