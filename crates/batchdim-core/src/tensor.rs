use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::meta::TensorMeta;
use crate::shape::Shape;
use crate::storage::Storage;

// Tensor — the plain (unbatched) value
//
// A Tensor is a layout over a shared storage buffer:
//
//   Tensor ──Arc──▶ TensorInner { id, layout, dtype, storage }
//                                               │
//                                               └──Arc<RwLock<Storage>>
//
// Cloning a Tensor copies one Arc. View operations (transpose, narrow) build
// a new TensorInner with a new layout but the *same* storage Arc, so views
// never copy data. A batched tensor holds a Tensor clone the same way.
//
// The value is never written through this type. The RwLock exists so the
// storage can be handed out as a read guard; a poisoned lock surfaces as
// an Error, not a panic.

/// Process-unique identifier of a tensor handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorId(u64);

impl TensorId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        TensorId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

struct TensorInner {
    id: TensorId,
    storage: Arc<RwLock<Storage>>,
    layout: Layout,
    dtype: DType,
}

/// A dense n-dimensional value with a physical layout.
///
/// # Example
/// ```
/// use batchdim_core::{DType, Tensor, TensorMeta};
///
/// let x = Tensor::ones((2, 3, 4), DType::F32)?;
/// assert_eq!(x.dims(), &[2, 3, 4]);
/// assert_eq!(x.strides()?, &[12, 4, 1]);
/// # Ok::<(), batchdim_core::Error>(())
/// ```
#[derive(Clone)]
pub struct Tensor {
    inner: Arc<TensorInner>,
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tensor(id={:?}, shape={}, dtype={})",
            self.inner.id,
            self.inner.layout.shape(),
            self.inner.dtype,
        )
    }
}

impl Tensor {
    fn from_storage(storage: Storage, layout: Layout) -> Self {
        Tensor {
            inner: Arc::new(TensorInner {
                id: TensorId::next(),
                dtype: storage.dtype(),
                storage: Arc::new(RwLock::new(storage)),
                layout,
            }),
        }
    }

    fn view_with_layout(&self, layout: Layout) -> Self {
        Tensor {
            inner: Arc::new(TensorInner {
                id: TensorId::next(),
                storage: Arc::clone(&self.inner.storage),
                layout,
                dtype: self.inner.dtype,
            }),
        }
    }

    // Creation

    /// A contiguous tensor of `shape` with every element set to `val`.
    pub fn full(shape: impl Into<Shape>, val: f64, dtype: DType) -> Result<Self> {
        let shape = shape.into();
        let count = shape.checked_elem_count()?;
        let layout = Layout::contiguous(shape)?;
        let storage = Storage::full(count, val, dtype)?;
        Ok(Self::from_storage(storage, layout))
    }

    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        Self::full(shape, 0.0, dtype)
    }

    pub fn ones(shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        Self::full(shape, 1.0, dtype)
    }

    /// A contiguous tensor holding `data` in row-major order.
    pub fn from_f64_slice(data: &[f64], shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.checked_elem_count()?;
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        let layout = Layout::contiguous(shape)?;
        let storage = Storage::from_f64_slice(data, dtype)?;
        Ok(Self::from_storage(storage, layout))
    }

    // Accessors

    pub fn id(&self) -> TensorId {
        self.inner.id
    }

    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// The physical layout (shape + strides + offset).
    pub fn layout(&self) -> &Layout {
        &self.inner.layout
    }

    /// Whether `self` and `other` are views of the same storage buffer.
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.inner.storage, &other.inner.storage)
    }

    fn read_storage(&self) -> Result<RwLockReadGuard<'_, Storage>> {
        self.inner
            .storage
            .read()
            .map_err(|_| Error::msg("storage lock poisoned"))
    }

    // Views

    /// Swap two dimensions. Shares storage; the result is usually
    /// non-contiguous.
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Self> {
        let layout = self.inner.layout.transpose(dim0, dim1)?;
        Ok(self.view_with_layout(layout))
    }

    /// Keep `len` entries of `dim` starting at `start`. Shares storage.
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        let layout = self.inner.layout.narrow(dim, start, len)?;
        Ok(self.view_with_layout(layout))
    }

    /// Copy the visible elements to the host, in logical order.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        let storage = self.read_storage()?;
        Ok(storage.to_f64_vec(&self.inner.layout))
    }
}

impl TensorMeta for Tensor {
    fn shape(&self) -> &Shape {
        self.inner.layout.shape()
    }

    fn strides(&self) -> Result<&[usize]> {
        Ok(self.inner.layout.strides())
    }

    fn is_contiguous(&self) -> Result<bool> {
        Ok(self.inner.layout.is_contiguous())
    }

    fn storage(&self) -> Result<RwLockReadGuard<'_, Storage>> {
        self.read_storage()
    }

    fn storage_offset(&self) -> Result<usize> {
        Ok(self.inner.layout.offset())
    }
}
