use futures::{stream, StreamExt};
use qrp_blob::{
    ByteStream, GridStore, ObjectCatalog, ObjectId, ObjectPut, StoreError, StoredObject,
    TAG_QUESTION_ID, TAG_ROLE,
};

use crate::error::ApiError;

/// Role tag an uploaded image can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Executor,
    Reviewer,
}

impl ImageRole {
    /// Parse the wire value; anything outside the allowed set is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "executor" => Some(Self::Executor),
            "reviewer" => Some(Self::Reviewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executor => "executor",
            Self::Reviewer => "reviewer",
        }
    }
}

fn validate_role(role: Option<&str>) -> Result<Option<ImageRole>, ApiError> {
    match role {
        // An empty query value (`?role=`) means unscoped, same as omitting
        // the parameter.
        None | Some("") => Ok(None),
        Some(value) => ImageRole::parse(value)
            .map(Some)
            .ok_or_else(|| ApiError::validation("Invalid role. Must be executor or reviewer")),
    }
}

/// Domain service for question images: validates role tags and orchestrates
/// the blob store and catalog.
#[derive(Clone)]
pub struct ImageService {
    store: GridStore,
    catalog: ObjectCatalog,
}

impl ImageService {
    pub fn new(store: GridStore) -> Self {
        let catalog = ObjectCatalog::new(store.clone());
        Self { store, catalog }
    }

    /// Store one image for `question_id`.
    ///
    /// The role, when present, must be a valid [`ImageRole`] and is recorded
    /// as a metadata tag; when absent, no role key is stored at all. An empty
    /// payload is rejected before any chunk is written.
    pub async fn upload_image(
        &self,
        question_id: &str,
        payload: ByteStream,
        filename: Option<String>,
        content_type: Option<String>,
        role: Option<&str>,
    ) -> Result<StoredObject, ApiError> {
        let role = validate_role(role)?;
        let payload = self.require_nonempty(payload).await?;

        let mut request = ObjectPut::new().with_tag(TAG_QUESTION_ID, question_id);
        if let Some(filename) = filename {
            request = request.with_filename(filename);
        }
        if let Some(content_type) = content_type {
            request = request.with_content_type(content_type);
        }
        if let Some(role) = role {
            request = request.with_tag(TAG_ROLE, role.as_str());
        }

        let record = self.store.put(request, payload).await?;
        tracing::info!(
            id = %record.id,
            question_id,
            length = record.length,
            "image uploaded"
        );
        Ok(record)
    }

    /// Pull items until the first non-empty chunk, then hand back a stream
    /// that replays it ahead of the rest. Reaching the end first means the
    /// client sent no payload.
    async fn require_nonempty(&self, mut payload: ByteStream) -> Result<ByteStream, ApiError> {
        let first = loop {
            match payload.next().await {
                None => return Err(ApiError::validation("No image file provided")),
                Some(Err(source)) => return Err(StoreError::write(source).into()),
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => break chunk,
            }
        };
        Ok(Box::pin(stream::iter([Ok(first)]).chain(payload)))
    }

    /// List image records for a question, optionally scoped to one role.
    ///
    /// An unrecognized role value is a validation failure, not a silent
    /// fallback to the unscoped listing.
    pub async fn list_images(
        &self,
        question_id: &str,
        role: Option<&str>,
    ) -> Result<Vec<StoredObject>, ApiError> {
        let records = match validate_role(role)? {
            Some(role) => {
                self.catalog
                    .list_by_question_and_role(question_id, role.as_str())
                    .await?
            }
            None => self.catalog.list_by_question(question_id).await?,
        };
        Ok(records)
    }

    /// Resolve the image's content type and open its payload stream.
    ///
    /// Both lookups use the same id, so the type reported always belongs to
    /// the bytes served.
    pub async fn download_image(&self, id: &str) -> Result<(String, ByteStream), ApiError> {
        let id = ObjectId::from_string(id.to_string());
        let record = self.store.head(&id).await?;
        let payload = self.store.get(&id).await?;
        tracing::debug!(id = %id, length = record.length, "image download started");
        Ok((record.content_type, payload))
    }

    pub async fn delete_image(&self, id: &str) -> Result<(), ApiError> {
        let id = ObjectId::from_string(id.to_string());
        self.store.delete(&id).await?;
        tracing::info!(id = %id, "image deleted");
        Ok(())
    }
}
