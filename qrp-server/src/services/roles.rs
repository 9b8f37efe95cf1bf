use serde::Serialize;
use tokio::sync::RwLock;

/// One entry in the role registry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoleDefinition {
    pub role_name: String,
    pub description: String,
}

fn seed_roles() -> Vec<RoleDefinition> {
    let define = |role_name: &str, description: &str| RoleDefinition {
        role_name: role_name.to_string(),
        description: description.to_string(),
    };
    vec![
        define("Executor", "Handles assigned tasks"),
        define("Reviewer", "Reviews and approves work"),
        define(
            "TeamLeader",
            "Team Leader / Sectional department head",
        ),
    ]
}

/// Seeded registry of the well-known roles. `reseed` drops whatever is there
/// and recreates the canonical set, so repeated startups converge on the
/// same registry.
#[derive(Default)]
pub struct RoleRegistry {
    roles: RwLock<Vec<RoleDefinition>>,
}

impl RoleRegistry {
    pub async fn reseed(&self) {
        let mut roles = self.roles.write().await;
        let dropped = roles.len();
        *roles = seed_roles();
        tracing::info!(dropped, seeded = roles.len(), "role registry reseeded");
    }

    pub async fn list(&self) -> Vec<RoleDefinition> {
        self.roles.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reseed_is_idempotent() {
        let registry = RoleRegistry::default();

        registry.reseed().await;
        let first = registry.list().await;
        registry.reseed().await;
        let second = registry.list().await;

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        let names: Vec<&str> = first.iter().map(|r| r.role_name.as_str()).collect();
        assert_eq!(names, ["Executor", "Reviewer", "TeamLeader"]);
    }

    #[tokio::test]
    async fn registry_starts_empty_until_seeded() {
        let registry = RoleRegistry::default();
        assert!(registry.list().await.is_empty());
    }
}
