//! A Zarr hierarchy holding label and mask arrays.
use std::{path::Path, sync::Arc};

use zarrs::{
    array::{
        Array, ArrayBuilder, ArrayMetadata, ArrayMetadataOptions, ArrayMetadataV2, ChunkShape,
        FillValueMetadata,
        codec::{
            GzipCodec, api::BytesToBytesCodecTraits, array_to_bytes::sharding::ShardingCodecBuilder,
        },
        data_type,
    },
    filesystem::FilesystemStore,
    group::{Group, GroupBuilder},
    metadata::{
        GroupMetadata,
        v2::{DataTypeMetadataV2, GroupMetadataV2, MetadataV2},
    },
    metadata_ext::codec::sharding::ShardingCodecConfiguration,
    node::{NodePath, node_exists},
    storage::{
        ReadableWritableListableStorage, ReadableWritableListableStorageTraits, StorePrefix,
        WritableStorageTraits,
    },
};

use crate::{Error, Result};

pub type ContainerArray = Array<dyn ReadableWritableListableStorageTraits>;

/// Zarr format version of a node's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZarrFormat {
    V2,
    V3,
}

impl ZarrFormat {
    pub fn of(array: &ContainerArray) -> Self {
        match array.metadata() {
            ArrayMetadata::V2(_) => Self::V2,
            ArrayMetadata::V3(_) => Self::V3,
        }
    }
}

pub struct Container {
    storage: ReadableWritableListableStorage,
}

impl Container {
    pub fn new(storage: ReadableWritableListableStorage) -> Self {
        Self { storage }
    }

    /// Open the hierarchy rooted at an existing directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::general(format!(
                "container {} is not an existing directory",
                path.display()
            )));
        }
        let store = FilesystemStore::new(path).map_err(Error::wrap)?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn storage(&self) -> ReadableWritableListableStorage {
        self.storage.clone()
    }

    /// Whether any array or group exists at `path`.
    pub fn exists(&self, path: &str) -> Result<bool> {
        let node_path = node_path(path)?;
        Ok(node_exists(&self.storage, &node_path)?)
    }

    fn is_group(&self, path: &str) -> bool {
        Group::open(self.storage.clone(), path).is_ok()
    }

    pub fn open_array(&self, path: &str) -> Result<ContainerArray> {
        if !self.exists(path)? {
            return Err(Error::SourceNotFound(path.to_string()));
        }
        match Array::open(self.storage.clone(), path) {
            Ok(array) => Ok(array),
            Err(_) if self.is_group(path) => Err(Error::SourceNotArray(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the metadata and every chunk of the array at `path`.
    pub fn erase_array(&self, path: &str) -> Result<()> {
        let node_path = node_path(path)?;
        if node_path.as_str() == "/" || Array::open(self.storage.clone(), path).is_err() {
            return Err(Error::TargetNotArray(path.to_string()));
        }
        let prefix: StorePrefix = (&node_path).try_into().map_err(Error::wrap)?;
        self.storage.erase_prefix(&prefix)?;
        Ok(())
    }

    /// Write `format` group metadata for every missing ancestor of `path`.
    pub fn ensure_parent_groups(&self, path: &str, format: ZarrFormat) -> Result<()> {
        let mut ancestor = String::new();
        let segments: Vec<_> = path.trim_matches('/').split('/').collect();
        let Some((_, parents)) = segments.split_last() else {
            return Ok(());
        };
        for segment in std::iter::once(&"").chain(parents) {
            if !segment.is_empty() {
                ancestor.push('/');
                ancestor.push_str(segment);
            }
            let group_path = if ancestor.is_empty() { "/" } else { &ancestor };
            if !self.exists(group_path)? {
                log::debug!("creating {format:?} group {group_path}");
                let group = match format {
                    ZarrFormat::V2 => Group::new_with_metadata(
                        self.storage.clone(),
                        group_path,
                        GroupMetadata::V2(GroupMetadataV2::new()),
                    ),
                    ZarrFormat::V3 => GroupBuilder::new().build(self.storage.clone(), group_path),
                }
                .map_err(Error::wrap)?;
                group.store_metadata()?;
            }
        }
        Ok(())
    }

    /// Create a float32 mask array shaped, chunked and attributed like `source`.
    ///
    /// The mask uses the Zarr format of `source`. A sharded V3 source gives a mask
    /// sharded with the same inner chunk shape.
    /// Metadata is written; chunks are not.
    pub fn create_mask_array(
        &self,
        path: &str,
        source: &ContainerArray,
        gzip_level: Option<u32>,
    ) -> Result<ContainerArray> {
        let array = match source.metadata() {
            ArrayMetadata::V2(metadata) => {
                let compressor = gzip_level.map(gzip_metadata_v2).transpose()?;
                let mut mask_metadata = ArrayMetadataV2::new(
                    metadata.shape.clone(),
                    metadata.chunks.clone(),
                    DataTypeMetadataV2::Simple("<f4".to_string()),
                    FillValueMetadata::from(0.0f64),
                    compressor,
                    None,
                );
                mask_metadata.dimension_separator = metadata.dimension_separator.clone();
                mask_metadata.attributes = source.attributes().clone();
                Array::new_with_metadata(
                    self.storage.clone(),
                    path,
                    ArrayMetadata::V2(mask_metadata),
                )?
            }
            ArrayMetadata::V3(_) => {
                let mut builder = ArrayBuilder::new(
                    source.shape().to_vec(),
                    source.chunk_grid().metadata(),
                    data_type::float32(),
                    0.0f32,
                );
                builder.attributes(source.attributes().clone());
                let compression: Vec<Arc<dyn BytesToBytesCodecTraits>> = match gzip_level {
                    Some(level) => vec![Arc::new(GzipCodec::new(level).map_err(Error::wrap)?)],
                    None => Vec::new(),
                };
                match subchunk_shape(source) {
                    Some(subchunk_shape) => {
                        builder.array_to_bytes_codec(Arc::new(
                            ShardingCodecBuilder::new(subchunk_shape, &data_type::float32())
                                .bytes_to_bytes_codecs(compression)
                                .build(),
                        ));
                    }
                    None => {
                        builder.bytes_to_bytes_codecs(compression);
                    }
                }
                builder.build(self.storage.clone(), path)?
            }
        };
        // attributes must match the source exactly, so no `_zarrs` entry
        array.store_metadata_opt(
            &ArrayMetadataOptions::default().with_include_zarrs_metadata(false),
        )?;
        Ok(array)
    }
}

/// Inner chunk shape of a source using the `sharding_indexed` codec.
fn subchunk_shape(source: &ContainerArray) -> Option<ChunkShape> {
    let ArrayMetadata::V3(metadata) = source.metadata() else {
        return None;
    };
    let codec = metadata
        .codecs
        .iter()
        .find(|codec| codec.name() == "sharding_indexed")?;
    match codec.to_typed_configuration::<ShardingCodecConfiguration>() {
        Ok(ShardingCodecConfiguration::V1(configuration)) => Some(configuration.chunk_shape),
        _ => None,
    }
}

fn gzip_metadata_v2(level: u32) -> Result<MetadataV2> {
    Ok(serde_json::from_value(serde_json::json!({
        "id": "gzip",
        "level": level,
    }))?)
}

fn node_path(path: &str) -> Result<NodePath> {
    NodePath::new(path).map_err(|e| Error::InvalidPath {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use zarrs::storage::{ReadableStorageTraits, StoreKey, store::MemoryStore};

    use super::*;

    fn container() -> Container {
        Container::new(Arc::new(MemoryStore::new()))
    }

    fn store_labels(container: &Container, path: &str) {
        container
            .ensure_parent_groups(path, ZarrFormat::V3)
            .unwrap();
        let array = ArrayBuilder::new(vec![4, 4], vec![2, 2], data_type::uint8(), 0u8)
            .build(container.storage(), path)
            .unwrap();
        array.store_metadata().unwrap();
        array.store_chunk(&[0, 0], [1u8, 2, 3, 4].as_slice()).unwrap();
    }

    #[test]
    fn parent_groups_are_created() {
        let container = container();
        container
            .ensure_parent_groups("/a/b/c", ZarrFormat::V3)
            .unwrap();
        assert!(container.exists("/").unwrap());
        assert!(container.exists("/a").unwrap());
        assert!(container.exists("/a/b").unwrap());
        assert!(!container.exists("/a/b/c").unwrap());
    }

    #[test]
    fn erase_removes_array_and_chunks() {
        let container = container();
        store_labels(&container, "/labels/ids");
        store_labels(&container, "/labels/ids_2");
        container.erase_array("/labels/ids").unwrap();
        assert!(!container.exists("/labels/ids").unwrap());
        assert!(container.exists("/labels/ids_2").unwrap());
        assert!(container.exists("/labels").unwrap());
    }

    #[test]
    fn erase_refuses_groups() {
        let container = container();
        store_labels(&container, "/labels/ids");
        assert!(matches!(
            container.erase_array("/labels"),
            Err(Error::TargetNotArray(_))
        ));
        assert!(container.exists("/labels/ids").unwrap());
    }

    #[test]
    fn missing_array_is_not_found() {
        let container = container();
        assert!(matches!(
            container.open_array("/labels/ids"),
            Err(Error::SourceNotFound(_))
        ));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let container = container();
        assert!(matches!(
            container.exists("labels"),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn groups_are_not_source_arrays() {
        let container = container();
        store_labels(&container, "/labels/ids");
        assert!(matches!(
            container.open_array("/labels"),
            Err(Error::SourceNotArray(p)) if p == "/labels"
        ));
    }

    #[test]
    fn v2_parent_groups() {
        let container = container();
        container
            .ensure_parent_groups("/masks/ids", ZarrFormat::V2)
            .unwrap();
        let storage = container.storage();
        for key in [".zgroup", "masks/.zgroup"] {
            assert!(storage.get(&StoreKey::new(key).unwrap()).unwrap().is_some());
        }
        assert!(
            storage
                .get(&StoreKey::new("masks/zarr.json").unwrap())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn sharded_source_gives_sharded_mask() {
        let container = container();
        container
            .ensure_parent_groups("/labels/ids", ZarrFormat::V3)
            .unwrap();
        let subchunks = vec![NonZeroU64::new(2).unwrap(); 2];
        let mut builder = ArrayBuilder::new(vec![8, 8], vec![4, 4], data_type::uint64(), 0u64);
        builder.array_to_bytes_codec(Arc::new(
            ShardingCodecBuilder::new(subchunks.clone(), &data_type::uint64()).build(),
        ));
        let source = builder.build(container.storage(), "/labels/ids").unwrap();
        source.store_metadata().unwrap();

        let mask = container
            .create_mask_array("/masks/ids", &source, None)
            .unwrap();
        assert_eq!(subchunk_shape(&mask), Some(subchunks));
        assert_eq!(mask.chunk_grid().metadata(), source.chunk_grid().metadata());
        assert_eq!(ZarrFormat::of(&mask), ZarrFormat::V3);
    }

    #[test]
    fn unsharded_source_gives_unsharded_mask() {
        let container = container();
        store_labels(&container, "/labels/ids");
        let source = container.open_array("/labels/ids").unwrap();
        let mask = container
            .create_mask_array("/masks/ids", &source, Some(5))
            .unwrap();
        assert_eq!(subchunk_shape(&mask), None);
    }
}
