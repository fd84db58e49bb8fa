use std::fmt;

/// Element type of a tensor's storage.
///
/// Batch bookkeeping never looks at the elements, but the base value still
/// needs a concrete buffer so that `storage()` has something to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    U8,
    U32,
    I64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::U8 => "u8",
            DType::U32 => "u32",
            DType::I64 => "i64",
        };
        write!(f, "{}", s)
    }
}

/// Rust element types that can back a tensor, with their `DType` tag.
///
/// Conversion to and from f64 goes through `num_traits::NumCast`, so a value
/// that does not fit the target type (300.0 as u8, NaN as i64) is reported
/// instead of being silently wrapped or clamped.
pub trait WithDType: Copy + Send + Sync + 'static + num_traits::NumCast + fmt::Debug {
    const DTYPE: DType;

    fn as_f64(self) -> f64 {
        num_traits::cast(self).unwrap_or(f64::NAN)
    }

    /// `None` when `v` is out of range for `Self`.
    fn try_from_f64(v: f64) -> Option<Self> {
        num_traits::cast(v)
    }
}

impl WithDType for half::f16 {
    const DTYPE: DType = DType::F16;
}
impl WithDType for half::bf16 {
    const DTYPE: DType = DType::BF16;
}
impl WithDType for f32 {
    const DTYPE: DType = DType::F32;
}
impl WithDType for f64 {
    const DTYPE: DType = DType::F64;
}
impl WithDType for u8 {
    const DTYPE: DType = DType::U8;
}
impl WithDType for u32 {
    const DTYPE: DType = DType::U32;
}
impl WithDType for i64 {
    const DTYPE: DType = DType::I64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_display() {
        assert_eq!(DType::BF16.to_string(), "bf16");
        assert_eq!(DType::U8.to_string(), "u8");
    }

    #[test]
    fn test_with_dtype_tags() {
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(half::f16::DTYPE, DType::F16);
        assert_eq!(half::bf16::try_from_f64(1.0).unwrap().to_f32(), 1.0);
        assert_eq!(i64::try_from_f64(42.0), Some(42));
        assert_eq!(half::f16::from_f32(0.5).as_f64(), 0.5);
        assert_eq!(7u32.as_f64(), 7.0);
    }

    #[test]
    fn test_out_of_range_casts_are_rejected() {
        assert_eq!(u8::try_from_f64(255.0), Some(255));
        assert_eq!(u8::try_from_f64(300.0), None);
        assert_eq!(u8::try_from_f64(-1.0), None);
        assert_eq!(u32::try_from_f64(f64::INFINITY), None);
        assert_eq!(i64::try_from_f64(f64::NAN), None);
    }
}
