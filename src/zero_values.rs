use std::fmt;

use crate::{Error, Result, element::MaskElement};

/// Label values which are background in a mask.
///
/// Order and duplicates are kept as given; neither affects the mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroValues(Vec<i64>);

impl ZeroValues {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Result<Self> {
        let values: Vec<_> = values.into_iter().collect();
        if values.is_empty() {
            return Err(Error::EmptyZeroValues);
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[i64] {
        &self.0
    }

    /// Convert to a lookup for elements of type `T`.
    pub fn typed<T: MaskElement>(&self) -> TypedZeroValues<T> {
        let mut values: Vec<T> = Vec::with_capacity(self.0.len());
        for v in self.0.iter().filter_map(|&v| T::from_zero_value(v)) {
            if !values.contains(&v) {
                values.push(v);
            }
        }
        TypedZeroValues(values)
    }
}

impl Default for ZeroValues {
    fn default() -> Self {
        Self(vec![0])
    }
}

impl fmt::Display for ZeroValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Zero values converted into an element type.
///
/// Zero value sets are small, so a linear scan beats hashing.
#[derive(Debug, Clone)]
pub struct TypedZeroValues<T>(Vec<T>);

impl<T: MaskElement> TypedZeroValues<T> {
    pub fn contains(&self, element: &T) -> bool {
        self.0.iter().any(|v| v == element)
    }

    /// 1.0 where an element is not a zero value, 0.0 where it is.
    pub fn mask(&self, elements: &[T]) -> Vec<f32> {
        elements
            .iter()
            .map(|e| if self.contains(e) { 0.0 } else { 1.0 })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
