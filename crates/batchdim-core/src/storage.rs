use crate::dtype::{DType, WithDType};
use crate::error::{Error, Result};
use crate::layout::Layout;

// Storage — the flat host buffer behind a tensor
//
// One variant per DType. A Storage knows nothing about shape; the Layout
// that goes with it decides which elements are visible and in what order.

/// Flat element buffer, tagged by dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    F16(Vec<half::f16>),
    BF16(Vec<half::bf16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    U8(Vec<u8>),
    U32(Vec<u32>),
    I64(Vec<i64>),
}

fn convert<T: WithDType>(data: &[f64]) -> Result<Vec<T>> {
    data.iter()
        .map(|&v| {
            T::try_from_f64(v)
                .ok_or_else(|| Error::msg(format!("value {v} is not representable as {}", T::DTYPE)))
        })
        .collect()
}

fn gather<T: WithDType>(data: &[T], layout: &Layout) -> Vec<f64> {
    layout.strided_indices().map(|i| data[i].as_f64()).collect()
}

impl Storage {
    /// `len` copies of `val`, converted to `dtype`.
    pub fn full(len: usize, val: f64, dtype: DType) -> Result<Self> {
        Self::from_f64_slice(&vec![val; len], dtype)
    }

    /// Convert a flat f64 slice into storage of the given dtype. Fails if
    /// any value is out of range for `dtype`.
    pub fn from_f64_slice(data: &[f64], dtype: DType) -> Result<Self> {
        Ok(match dtype {
            DType::F16 => Storage::F16(convert(data)?),
            DType::BF16 => Storage::BF16(convert(data)?),
            DType::F32 => Storage::F32(convert(data)?),
            DType::F64 => Storage::F64(data.to_vec()),
            DType::U8 => Storage::U8(convert(data)?),
            DType::U32 => Storage::U32(convert(data)?),
            DType::I64 => Storage::I64(convert(data)?),
        })
    }

    pub fn dtype(&self) -> DType {
        match self {
            Storage::F16(_) => DType::F16,
            Storage::BF16(_) => DType::BF16,
            Storage::F32(_) => DType::F32,
            Storage::F64(_) => DType::F64,
            Storage::U8(_) => DType::U8,
            Storage::U32(_) => DType::U32,
            Storage::I64(_) => DType::I64,
        }
    }

    /// Number of elements in the buffer (not the number visible through any
    /// particular layout).
    pub fn len(&self) -> usize {
        match self {
            Storage::F16(v) => v.len(),
            Storage::BF16(v) => v.len(),
            Storage::F32(v) => v.len(),
            Storage::F64(v) => v.len(),
            Storage::U8(v) => v.len(),
            Storage::U32(v) => v.len(),
            Storage::I64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the elements selected by `layout`, in logical order, as f64.
    pub fn to_f64_vec(&self, layout: &Layout) -> Vec<f64> {
        match self {
            Storage::F16(v) => gather(v, layout),
            Storage::BF16(v) => gather(v, layout),
            Storage::F32(v) => gather(v, layout),
            Storage::F64(v) => gather(v, layout),
            Storage::U8(v) => gather(v, layout),
            Storage::U32(v) => gather(v, layout),
            Storage::I64(v) => gather(v, layout),
        }
    }
}
