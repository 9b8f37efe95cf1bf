use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_stream::try_stream;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures_util::StreamExt;
use tokio::fs;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::types::{
    ByteStream, ObjectFilter, ObjectId, ObjectPut, StoredObject, DEFAULT_CONTENT_TYPE,
    DEFAULT_FILENAME,
};

/// Sidecar file holding the object's record next to its chunk spans
const RECORD_FILE: &str = "record.json";

fn chunk_file(index: u64) -> String {
    format!("{index:06}.chunk")
}

fn chunk_count(length: u64, chunk_size: u64) -> u64 {
    if length == 0 {
        0
    } else {
        length.div_ceil(chunk_size)
    }
}

/// Chunked object store backed by a directory tree.
///
/// Layout under `<target>/<name>`:
///
/// ```text
/// objects/<id>/record.json     committed record (the catalog entry)
/// objects/<id>/000000.chunk    fixed-size spans, last one may be short
/// staging/<id>/...             in-flight puts, swept at open
/// ```
///
/// A put writes everything under `staging/<id>` and commits with a single
/// rename into `objects/`, so a record is only ever visible once all of its
/// chunks are durable.
#[derive(Clone)]
pub struct GridStore {
    objects: PathBuf,
    staging: PathBuf,
    config: StoreConfig,
}

impl GridStore {
    /// Open (or create) the store rooted at `<target>/<name>`.
    ///
    /// Sweeps any staging leftovers from a previous crash before returning.
    pub async fn open(
        target: impl AsRef<Path>,
        name: &str,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let target = target.as_ref();
        if target.as_os_str().is_empty() {
            return Err(StoreError::connection("store connection target is empty"));
        }
        if name.is_empty() {
            return Err(StoreError::connection("store name is empty"));
        }
        if config.chunk_size_bytes == 0 {
            return Err(StoreError::connection("chunk size must be nonzero"));
        }

        let root = target.join(name);
        let objects = root.join("objects");
        let staging = root.join("staging");

        fs::create_dir_all(&objects)
            .await
            .map_err(|e| StoreError::connection(format!("cannot create {}: {e}", objects.display())))?;
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| StoreError::connection(format!("cannot create {}: {e}", staging.display())))?;

        let store = Self {
            objects,
            staging,
            config,
        };
        store.sweep_staging().await?;

        tracing::info!(root = %root.display(), "object store opened");
        Ok(store)
    }

    /// Remove in-flight put directories left behind by a crash. None of them
    /// were committed, so nothing retrievable is lost.
    async fn sweep_staging(&self) -> StoreResult<()> {
        let mut swept = 0u64;
        let mut entries = fs::read_dir(&self.staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            fs::remove_dir_all(entry.path()).await?;
            swept += 1;
        }
        if swept > 0 {
            tracing::warn!(swept, "removed stale staging entries");
        }
        Ok(())
    }

    /// Store a payload stream as a new object.
    ///
    /// Consumes the stream fully, writing fixed-size spans under staging,
    /// then commits record plus chunks with one rename. On any failure the
    /// staging directory is removed best-effort and no record becomes
    /// visible.
    pub async fn put(&self, request: ObjectPut, payload: ByteStream) -> StoreResult<StoredObject> {
        let id = ObjectId::new();
        let stage = self.staging.join(id.as_str());

        match self.write_object(&id, &stage, request, payload).await {
            Ok(record) => {
                tracing::debug!(id = %record.id, length = record.length, "object committed");
                Ok(record)
            }
            Err(err) => {
                tracing::error!(id = %id, error = %err, "put failed, discarding staging");
                let _ = fs::remove_dir_all(&stage).await;
                Err(err)
            }
        }
    }

    async fn write_object(
        &self,
        id: &ObjectId,
        stage: &Path,
        request: ObjectPut,
        mut payload: ByteStream,
    ) -> StoreResult<StoredObject> {
        fs::create_dir_all(stage).await.map_err(StoreError::write)?;

        let chunk_size = self.config.chunk_size_bytes as usize;
        let mut buffer = BytesMut::with_capacity(chunk_size);
        let mut index: u64 = 0;
        let mut length: u64 = 0;

        while let Some(item) = payload.next().await {
            let bytes = item.map_err(StoreError::write)?;
            length += bytes.len() as u64;
            if length > self.config.max_object_bytes {
                return Err(StoreError::invalid(format!(
                    "payload exceeds max object size of {} bytes",
                    self.config.max_object_bytes
                )));
            }
            buffer.extend_from_slice(&bytes);
            while buffer.len() >= chunk_size {
                let span = buffer.split_to(chunk_size);
                self.write_chunk(stage, index, &span).await?;
                index += 1;
            }
        }
        if !buffer.is_empty() {
            self.write_chunk(stage, index, &buffer).await?;
        }

        let record = StoredObject {
            id: id.clone(),
            filename: request
                .filename
                .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            content_type: request
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            length,
            chunk_size: self.config.chunk_size_bytes,
            upload_date: Utc::now(),
            metadata: request.metadata,
        };

        let json = serde_json::to_vec_pretty(&record)?;
        fs::write(stage.join(RECORD_FILE), json)
            .await
            .map_err(StoreError::write)?;

        // Single rename makes the commit atomic: either the record and all
        // chunks appear together, or none of them do.
        let committed = self.objects.join(id.as_str());
        fs::rename(stage, committed)
            .await
            .map_err(StoreError::write)?;

        Ok(record)
    }

    async fn write_chunk(&self, stage: &Path, index: u64, span: &[u8]) -> StoreResult<()> {
        fs::write(stage.join(chunk_file(index)), span)
            .await
            .map_err(StoreError::write)
    }

    /// Read the object's record without touching its payload.
    pub async fn head(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        let path = self.objects.join(id.as_str()).join(RECORD_FILE);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::not_found(id.as_str()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Stream the object's payload as its chunk spans, in storage order.
    ///
    /// The sequence is lazy and forward-only; dropping it mid-stream leaves
    /// the stored object untouched. Each call produces a fresh sequence from
    /// the first chunk.
    pub async fn get(&self, id: &ObjectId) -> StoreResult<ByteStream> {
        let record = self.head(id).await?;
        let dir = self.objects.join(id.as_str());
        let chunks = chunk_count(record.length, record.chunk_size);

        let stream = try_stream! {
            for index in 0..chunks {
                let bytes = fs::read(dir.join(chunk_file(index))).await?;
                yield Bytes::from(bytes);
            }
        };
        Ok(Box::pin(stream))
    }

    /// Delete the object's record and all of its chunks.
    ///
    /// The record goes first, so a half-deleted object can never be found or
    /// downloaded. An object whose chunks are already partially missing still
    /// deletes cleanly.
    pub async fn delete(&self, id: &ObjectId) -> StoreResult<()> {
        let dir = self.objects.join(id.as_str());
        match fs::remove_file(dir.join(RECORD_FILE)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::not_found(id.as_str()))
            }
            Err(e) => return Err(e.into()),
        }
        fs::remove_dir_all(&dir).await?;
        tracing::debug!(id = %id, "object deleted");
        Ok(())
    }

    /// Return the records whose metadata matches every predicate in
    /// `filter`, sorted by (uploadDate, id) for deterministic listings.
    pub async fn find(&self, filter: &ObjectFilter) -> StoreResult<Vec<StoredObject>> {
        let mut matched = Vec::new();
        let mut entries = fs::read_dir(&self.objects).await?;
        while let Some(entry) = entries.next_entry().await? {
            let bytes = match fs::read(entry.path().join(RECORD_FILE)).await {
                Ok(bytes) => bytes,
                // A concurrent delete can remove the record between the
                // directory scan and the read; such objects are gone.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let record: StoredObject = serde_json::from_slice(&bytes)?;
            if filter.matches(&record) {
                matched.push(record);
            }
        }
        matched.sort_by(|a, b| {
            a.upload_date
                .cmp(&b.upload_date)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        Ok(matched)
    }
}
