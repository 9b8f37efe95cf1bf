//! # qrp-blob: chunked binary object storage
//!
//! Streaming-first storage for image blobs attached to questions. Payloads
//! are split into fixed-size chunk spans and committed atomically together
//! with a metadata record; the record doubles as the catalog entry, so
//! listings, downloads, and deletes all resolve against a single identifier
//! space.
//!
//! ```rust,no_run
//! use qrp_blob::{GridStore, ObjectPut, StoreConfig, TAG_QUESTION_ID};
//!
//! # async fn demo(payload: qrp_blob::ByteStream) -> qrp_blob::StoreResult<()> {
//! let store = GridStore::open("/var/lib/qrp", "images", StoreConfig::default()).await?;
//!
//! let record = store
//!     .put(
//!         ObjectPut::new()
//!             .with_filename("diagram.png")
//!             .with_content_type("image/png")
//!             .with_tag(TAG_QUESTION_ID, "question-42"),
//!         payload,
//!     )
//!     .await?;
//!
//! let mut bytes = store.get(&record.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use catalog::{ObjectCatalog, TAG_QUESTION_ID, TAG_ROLE};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::GridStore;
pub use types::{
    ByteStream, ObjectFilter, ObjectId, ObjectPut, StoredObject, DEFAULT_CONTENT_TYPE,
    DEFAULT_FILENAME,
};
