//! Element types a mask can be derived from.
use zarrs::array::ElementOwned;

/// A numeric array element which can be compared against integer zero values.
pub trait MaskElement: ElementOwned + Copy + PartialEq {
    /// Convert a zero value into this element type.
    ///
    /// Returns `None` if no element of this type can equal the value,
    /// in which case it never contributes to the background.
    fn from_zero_value(value: i64) -> Option<Self>;
}

macro_rules! impl_mask_element_signed {
    ($($t:ty),*) => {
        $(
            impl MaskElement for $t {
                fn from_zero_value(value: i64) -> Option<Self> {
                    <$t>::try_from(value).ok()
                }
            }
        )*
    };
}

// Negative values wrap at the element width, so sentinels such as -1 (TRANSPARENT)
// address the top of the unsigned range.
macro_rules! impl_mask_element_unsigned {
    ($($t:ty => $signed:ty),*) => {
        $(
            impl MaskElement for $t {
                fn from_zero_value(value: i64) -> Option<Self> {
                    <$t>::try_from(value)
                        .ok()
                        .or_else(|| <$signed>::try_from(value).ok().map(|v| v as $t))
                }
            }
        )*
    };
}

impl_mask_element_signed!(i8, i16, i32, i64);
impl_mask_element_unsigned!(u8 => i8, u16 => i16, u32 => i32, u64 => i64);

impl MaskElement for f32 {
    #[allow(clippy::cast_precision_loss)]
    fn from_zero_value(value: i64) -> Option<Self> {
        Some(value as f32)
    }
}

impl MaskElement for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_zero_value(value: i64) -> Option<Self> {
        Some(value as f64)
    }
}
