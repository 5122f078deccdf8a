//! Mask generation for label arrays.
use std::{borrow::Cow, path::Path};

use zarrs::{array::ArraySubset, plugin::ExtensionName};

use crate::{
    Error, Result,
    container::{Container, ContainerArray, ZarrFormat},
    element::MaskElement,
    pattern::{MaskPattern, normalise_path},
    report::{LogReporter, Reporter},
    zero_values::ZeroValues,
};

/// Source data types a mask can be derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl LabelType {
    fn of(array: &ContainerArray) -> Result<Self> {
        let name = array
            .data_type()
            .name_v3()
            .map_or_else(String::new, Cow::into_owned);
        let label_type = match name.as_str() {
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            _ => {
                return Err(Error::UnsupportedDataType {
                    path: array.path().as_str().to_string(),
                    data_type: name,
                });
            }
        };
        Ok(label_type)
    }
}

/// How masks are derived and written.
#[derive(Debug, Clone, Default)]
pub struct MaskOptions {
    pub pattern: MaskPattern,
    pub zero_values: ZeroValues,
    /// Replace an existing array at the mask path.
    pub overwrite: bool,
    /// Gzip level for mask chunks; uncompressed if `None`.
    pub gzip_level: Option<u32>,
}

impl MaskOptions {
    pub fn new(pattern: MaskPattern, zero_values: ZeroValues) -> Self {
        Self {
            pattern,
            zero_values,
            ..Default::default()
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_gzip_level(mut self, gzip_level: Option<u32>) -> Self {
        self.gzip_level = gzip_level;
        self
    }

    /// The normalised mask path for `source_path`.
    ///
    /// Fails if it would replace the source itself.
    pub fn mask_path(&self, source_path: &str) -> Result<String> {
        let source_path = normalise_path(source_path);
        let mask_path = normalise_path(&self.pattern.derive(&source_path));
        if mask_path == source_path {
            return Err(Error::PathCollision {
                source_path,
                mask_path,
                pattern: self.pattern.to_string(),
            });
        }
        Ok(mask_path)
    }
}

/// Writes masks for label arrays into the container holding them.
pub struct MaskGenerator<R = LogReporter> {
    container: Container,
    options: MaskOptions,
    reporter: R,
}

impl MaskGenerator {
    pub fn new(container: Container, options: MaskOptions) -> Self {
        Self {
            container,
            options,
            reporter: LogReporter,
        }
    }
}

impl<R: Reporter> MaskGenerator<R> {
    pub fn with_reporter<R2: Reporter>(self, reporter: R2) -> MaskGenerator<R2> {
        MaskGenerator {
            container: self.container,
            options: self.options,
            reporter,
        }
    }

    pub fn options(&self) -> &MaskOptions {
        &self.options
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Write the mask of the array at `source_path`, returning the mask path.
    ///
    /// Mask elements are 0.0 where the source element is a zero value and 1.0 elsewhere.
    /// Nothing is modified if the mask path collides with the source, if a mask exists and
    /// overwriting is disabled, or if the source is missing or has an unsupported data type.
    pub fn generate(&self, source_path: &str) -> Result<String> {
        let mask_path = self.options.mask_path(source_path)?;
        let source_path = normalise_path(source_path);
        self.reporter
            .debug(&format!("mask for {source_path} will be written to {mask_path}"));

        let mask_exists = self.container.exists(&mask_path)?;
        if mask_exists && !self.options.overwrite {
            return Err(Error::TargetExists(mask_path));
        }
        let source = self.container.open_array(&source_path)?;
        let label_type = LabelType::of(&source)?;

        if mask_exists {
            self.reporter
                .warn(&format!("Overwriting mask array {mask_path}"));
            self.container.erase_array(&mask_path)?;
        }
        self.container
            .ensure_parent_groups(&mask_path, ZarrFormat::of(&source))?;
        let mask =
            self.container
                .create_mask_array(&mask_path, &source, self.options.gzip_level)?;

        match label_type {
            LabelType::Int8 => self.write_chunks::<i8>(&source, &mask),
            LabelType::Int16 => self.write_chunks::<i16>(&source, &mask),
            LabelType::Int32 => self.write_chunks::<i32>(&source, &mask),
            LabelType::Int64 => self.write_chunks::<i64>(&source, &mask),
            LabelType::UInt8 => self.write_chunks::<u8>(&source, &mask),
            LabelType::UInt16 => self.write_chunks::<u16>(&source, &mask),
            LabelType::UInt32 => self.write_chunks::<u32>(&source, &mask),
            LabelType::UInt64 => self.write_chunks::<u64>(&source, &mask),
            LabelType::Float32 => self.write_chunks::<f32>(&source, &mask),
            LabelType::Float64 => self.write_chunks::<f64>(&source, &mask),
        }?;

        Ok(mask_path)
    }

    fn write_chunks<T: MaskElement>(
        &self,
        source: &ContainerArray,
        mask: &ContainerArray,
    ) -> Result<()> {
        let zeros = self.options.zero_values.typed::<T>();
        let chunks = ArraySubset::new_with_shape(source.chunk_grid_shape().to_vec());
        self.reporter.debug(&format!(
            "masking {} chunks of {}",
            chunks.num_elements(),
            source.path().as_str()
        ));
        for chunk_indices in chunks.indices().into_iter() {
            let elements: Vec<T> = source.retrieve_chunk(&chunk_indices)?;
            let masked = zeros.mask(&elements);
            mask.store_chunk(&chunk_indices, masked.as_slice())?;
        }
        Ok(())
    }
}

/// Write masks for each of `source_paths` in order, stopping at the first failure.
///
/// Each source is handled with its own container handle.
pub fn generate_masks<S: AsRef<str>, R: Reporter + ?Sized>(
    container_path: impl AsRef<Path>,
    source_paths: &[S],
    options: &MaskOptions,
    reporter: &R,
) -> Result<Vec<String>> {
    let mut mask_paths = Vec::with_capacity(source_paths.len());
    for source_path in source_paths {
        let source_path = source_path.as_ref();
        reporter.info(&format!(
            "Creating mask for array {source_path} with background values {}",
            options.zero_values
        ));
        options.mask_path(source_path)?;
        let generator = MaskGenerator::new(Container::open(&container_path)?, options.clone())
            .with_reporter(reporter);
        mask_paths.push(generator.generate(source_path)?);
    }
    Ok(mask_paths)
}

/// Write the mask of a single array in the container at `container_path`.
///
/// A mask path colliding with `source_path` is rejected before the container is opened.
pub fn generate_mask(
    container_path: impl AsRef<Path>,
    source_path: &str,
    pattern: &MaskPattern,
    zero_values: &ZeroValues,
    overwrite: bool,
) -> Result<()> {
    let options =
        MaskOptions::new(pattern.clone(), zero_values.clone()).with_overwrite(overwrite);
    options.mask_path(source_path)?;
    MaskGenerator::new(Container::open(container_path)?, options).generate(source_path)?;
    Ok(())
}
