use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tokio::fs::{create_dir_all, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

pub type Snapshot = BTreeMap<String, String>;

pub async fn prepare_io(data_dir: &Path) -> anyhow::Result<()> {
    create_dir_all(data_dir)
        .await
        .with_context(|| format!("creating data directory {}", data_dir.display()))
}

/// Reads the durable scope back from disk. A missing file is an empty scope,
/// an unreadable one is logged and discarded.
pub async fn read_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    if !path.exists() {
        return Ok(Snapshot::new());
    }
    let mut bytes = Vec::new();
    BufReader::new(File::open(path).await?)
        .read_to_end(&mut bytes)
        .await?;
    match postcard::from_bytes::<Snapshot>(&bytes) {
        Ok(snapshot) => Ok(snapshot),
        Err(err) => {
            log::warn!("Discarding unreadable snapshot {}: {}", path.display(), err);
            Ok(Snapshot::new())
        }
    }
}

pub async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    let bytes = postcard::to_allocvec(snapshot)?;
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
