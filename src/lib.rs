pub mod container;
pub mod element;
mod error;
pub mod generator;
pub mod pattern;
pub mod report;
pub mod zero_values;

pub use zarrs;

pub use error::{Error, Result};
pub use generator::{MaskGenerator, MaskOptions, generate_mask, generate_masks};
pub use pattern::MaskPattern;
pub use zero_values::ZeroValues;
