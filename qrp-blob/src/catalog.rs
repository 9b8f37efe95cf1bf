use crate::error::StoreResult;
use crate::store::GridStore;
use crate::types::{ObjectFilter, StoredObject};

/// Metadata tag grouping objects under one question
pub const TAG_QUESTION_ID: &str = "questionId";

/// Metadata tag scoping an object to a role
pub const TAG_ROLE: &str = "role";

/// Metadata-only query view over the store's object records.
///
/// The catalog has no storage of its own: it filters the same records that
/// `head`, `get`, and `delete` resolve, so listings and downloads can never
/// disagree about which objects exist.
#[derive(Clone)]
pub struct ObjectCatalog {
    store: GridStore,
}

impl ObjectCatalog {
    pub fn new(store: GridStore) -> Self {
        Self { store }
    }

    /// All objects tagged with `question_id`, regardless of role.
    pub async fn list_by_question(&self, question_id: &str) -> StoreResult<Vec<StoredObject>> {
        self.store
            .find(&ObjectFilter::new().with_tag(TAG_QUESTION_ID, question_id))
            .await
    }

    /// Objects tagged with `question_id` and exactly `role`.
    ///
    /// The role value is matched verbatim; validating it against the allowed
    /// set is the caller's job.
    pub async fn list_by_question_and_role(
        &self,
        question_id: &str,
        role: &str,
    ) -> StoreResult<Vec<StoredObject>> {
        self.store
            .find(
                &ObjectFilter::new()
                    .with_tag(TAG_QUESTION_ID, question_id)
                    .with_tag(TAG_ROLE, role),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::types::{ByteStream, ObjectPut};
    use bytes::Bytes;
    use futures_util::stream;
    use tempfile::TempDir;

    fn payload(data: &[u8]) -> ByteStream {
        let bytes = Bytes::copy_from_slice(data);
        Box::pin(stream::iter(vec![Ok::<_, std::io::Error>(bytes)]))
    }

    async fn open_catalog() -> (GridStore, ObjectCatalog, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = GridStore::open(dir.path(), "catalog-test", StoreConfig::default())
            .await
            .unwrap();
        let catalog = ObjectCatalog::new(store.clone());
        (store, catalog, dir)
    }

    #[tokio::test]
    async fn listings_scope_by_question_and_role() {
        let (store, catalog, _dir) = open_catalog().await;

        let exec = store
            .put(
                ObjectPut::new()
                    .with_tag(TAG_QUESTION_ID, "q1")
                    .with_tag(TAG_ROLE, "executor"),
                payload(b"e"),
            )
            .await
            .unwrap();
        let rev = store
            .put(
                ObjectPut::new()
                    .with_tag(TAG_QUESTION_ID, "q1")
                    .with_tag(TAG_ROLE, "reviewer"),
                payload(b"r"),
            )
            .await
            .unwrap();
        let _other_question = store
            .put(
                ObjectPut::new().with_tag(TAG_QUESTION_ID, "q2"),
                payload(b"x"),
            )
            .await
            .unwrap();

        let all = catalog.list_by_question("q1").await.unwrap();
        assert_eq!(all.len(), 2);

        let executors = catalog
            .list_by_question_and_role("q1", "executor")
            .await
            .unwrap();
        assert_eq!(executors.len(), 1);
        assert_eq!(executors[0].id, exec.id);

        let reviewers = catalog
            .list_by_question_and_role("q1", "reviewer")
            .await
            .unwrap();
        assert_eq!(reviewers.len(), 1);
        assert_eq!(reviewers[0].id, rev.id);
    }

    #[tokio::test]
    async fn role_scoped_listing_excludes_unscoped_objects() {
        let (store, catalog, _dir) = open_catalog().await;

        store
            .put(
                ObjectPut::new().with_tag(TAG_QUESTION_ID, "q1"),
                payload(b"no role"),
            )
            .await
            .unwrap();

        assert_eq!(catalog.list_by_question("q1").await.unwrap().len(), 1);
        assert!(catalog
            .list_by_question_and_role("q1", "executor")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn deleted_objects_disappear_from_listings() {
        let (store, catalog, _dir) = open_catalog().await;

        let record = store
            .put(
                ObjectPut::new().with_tag(TAG_QUESTION_ID, "q1"),
                payload(b"gone soon"),
            )
            .await
            .unwrap();

        store.delete(&record.id).await.unwrap();
        assert!(catalog.list_by_question("q1").await.unwrap().is_empty());
    }
}
