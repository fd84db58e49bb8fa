use crate::shape::Shape;

/// All errors that can occur within batchdim.
///
/// Dimension errors, level bookkeeping errors, and the refusal to expose
/// physical layout through a batched view all share this one enum, so callers
/// match on a variant instead of inspecting types at runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Dimension index out of range for the tensor's (logical) rank.
    #[error("invalid dimension: dim {dim} for tensor with {rank} dimensions")]
    InvalidDimension { dim: usize, rank: usize },

    /// A batch level id that is already attached to the source view.
    #[error("duplicate batch level: level {level} is already attached")]
    DuplicateLevel { level: i64 },

    /// A physical-layout query on a tensor that carries batch dimensions.
    #[error("{op} is not supported on a batched tensor; query the underlying value instead")]
    UnsupportedOnBatchedValue { op: &'static str },

    /// Element count or row-major strides of a shape do not fit in usize.
    #[error("shape {shape} is too large: element count or strides overflow usize")]
    ShapeOverflow { shape: Shape },

    /// Narrow/slice operation out of bounds.
    #[error("narrow out of bounds: dim {dim}, start {start}, len {len}, dim_size {dim_size}")]
    NarrowOutOfBounds {
        dim: usize,
        start: usize,
        len: usize,
        dim_size: usize,
    },

    /// Element count mismatch when creating from a slice.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout batchdim.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bails(flag: bool) -> Result<()> {
        if flag {
            crate::bail!("flag was {}", flag);
        }
        Ok(())
    }

    #[test]
    fn test_display_messages() {
        let e = Error::InvalidDimension { dim: 3, rank: 3 };
        assert_eq!(
            e.to_string(),
            "invalid dimension: dim 3 for tensor with 3 dimensions"
        );
        let e = Error::DuplicateLevel { level: 7 };
        assert!(e.to_string().contains("level 7"));
        let e = Error::UnsupportedOnBatchedValue { op: "strides" };
        assert!(e.to_string().starts_with("strides is not supported"));
    }

    #[test]
    fn test_bail() {
        assert!(bails(false).is_ok());
        match bails(true) {
            Err(Error::Msg(m)) => assert_eq!(m, "flag was true"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
