use crate::device::description::{DescriptionError, DeviceDescription};
use futures::stream::FuturesUnordered;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;
use tracing::{info, instrument, warn};

/// Loads the light descriptions in `directory`, ordered by device id.
///
/// Files are read concurrently. A file that cannot be read, is not a valid light description or
/// repeats the device id of a file earlier in name order is logged and skipped.
#[instrument]
pub async fn load_devices_from(directory: &str, extension: &str) -> Result<Vec<DeviceDescription>, LoaderError> {
    info!("📁 Loading device descriptions...");
    let paths = description_files(Path::new(directory), extension).await?;

    let mut loaded = paths
        .into_iter()
        .map(read_description)
        .collect::<FuturesUnordered<_>>()
        .collect::<Vec<_>>()
        .await;
    loaded.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut devices = BTreeMap::new();
    let mut skipped = 0;
    for (path, result) in loaded {
        let registered = result.and_then(|description| match devices.entry(description.did.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(description);
                Ok(())
            }
            Entry::Occupied(_) => Err(LoaderError::DuplicateDevice { did: description.did, path }),
        });

        if let Err(err) = registered {
            warn!("⚠️ Skipping device description, {}", err);
            skipped += 1;
        }
    }

    info!("📁 Loading device descriptions... OK, {} loaded, {} skipped", devices.len(), skipped);
    Ok(devices.into_values().collect())
}

async fn description_files(directory: &Path, extension: &str) -> Result<Vec<PathBuf>, LoaderError> {
    let entries = fs::read_dir(directory).await.map_err(|source| LoaderError::Directory {
        source,
        path: directory.to_path_buf(),
    })?;

    let mut paths = ReadDirStream::new(entries)
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                warn!("⚠️ Unable to read directory entry: {}", err);
                None
            }
        })
        .filter(|path| path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect::<Vec<_>>()
        .await;
    paths.sort();

    Ok(paths)
}

async fn read_description(path: PathBuf) -> (PathBuf, Result<DeviceDescription, LoaderError>) {
    let result = match fs::read_to_string(&path).await {
        Ok(json) => DeviceDescription::from_json(&json).map_err(|source| LoaderError::Invalid { source, path: path.clone() }),
        Err(source) => Err(LoaderError::Read { source, path: path.clone() }),
    };

    (path, result)
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("unable to list '{}': {source}", path.display())]
    Directory { source: io::Error, path: PathBuf },
    #[error("unable to read '{}': {source}", path.display())]
    Read { source: io::Error, path: PathBuf },
    #[error("'{}' is not a valid light description: {source}", path.display())]
    Invalid { source: DescriptionError, path: PathBuf },
    #[error("'{}' repeats device '{did}'", path.display())]
    DuplicateDevice { did: String, path: PathBuf },
}
