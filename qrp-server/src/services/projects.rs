use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;

fn not_found(id: &str) -> ApiError {
    ApiError::not_found(format!("Project not found: {id}"))
}

/// In-memory project records, keyed by id.
#[derive(Default)]
pub struct ProjectsTable {
    records: RwLock<HashMap<String, Value>>,
}

impl ProjectsTable {
    pub async fn list(&self) -> Vec<Value> {
        let records = self.records.read().await;
        let mut projects: Vec<(String, Value)> = records
            .iter()
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        projects.sort_by(|a, b| a.0.cmp(&b.0));
        projects.into_iter().map(|(_, value)| value).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        let records = self.records.read().await;
        records.get(id).cloned().ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, data: Value) -> Result<Value, ApiError> {
        let mut obj = data
            .as_object()
            .cloned()
            .ok_or_else(|| ApiError::validation("Project body must be a JSON object"))?;

        let id = format!("project:{}", Uuid::new_v4());
        obj.insert("id".to_string(), Value::String(id.clone()));
        let value = Value::Object(obj);

        let mut records = self.records.write().await;
        records.insert(id, value.clone());
        Ok(value)
    }

    /// Replace the record under `id`, keeping its id field intact.
    pub async fn update(&self, id: &str, data: Value) -> Result<Value, ApiError> {
        let mut obj = data
            .as_object()
            .cloned()
            .ok_or_else(|| ApiError::validation("Project body must be a JSON object"))?;
        obj.insert("id".to_string(), Value::String(id.to_string()));
        let value = Value::Object(obj);

        let mut records = self.records.write().await;
        if !records.contains_key(id) {
            return Err(not_found(id));
        }
        records.insert(id.to_string(), value.clone());
        Ok(value)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let mut records = self.records.write().await;
        records.remove(id).map(|_| ()).ok_or_else(|| not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_assigns_prefixed_id() {
        let table = ProjectsTable::default();

        let created = table.create(json!({"name": "QRP"})).await.unwrap();
        let id = created["id"].as_str().unwrap();
        assert!(id.starts_with("project:"));
        assert_eq!(created["name"], "QRP");

        assert_eq!(table.get(id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_preserves_id_and_requires_existing_record() {
        let table = ProjectsTable::default();

        let created = table.create(json!({"name": "old"})).await.unwrap();
        let id = created["id"].as_str().unwrap();

        let updated = table
            .update(id, json!({"name": "new", "id": "should-be-overwritten"}))
            .await
            .unwrap();
        assert_eq!(updated["id"], id);
        assert_eq!(updated["name"], "new");

        let err = table.update("project:missing", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let table = ProjectsTable::default();

        let created = table.create(json!({"name": "QRP"})).await.unwrap();
        let id = created["id"].as_str().unwrap();

        table.delete(id).await.unwrap();
        assert!(matches!(
            table.get(id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            table.delete(id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_by_id() {
        let table = ProjectsTable::default();
        for name in ["a", "b", "c"] {
            table.create(json!({ "name": name })).await.unwrap();
        }

        let listed = table.list().await;
        assert_eq!(listed.len(), 3);
        let ids: Vec<&str> = listed.iter().map(|p| p["id"].as_str().unwrap()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
