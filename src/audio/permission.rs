use anyhow::Result;
use serde::Deserialize;
use tracing::info;

/// Runtime permissions the session may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    RecordAudio,
}

/// Explanation shown to the user alongside a permission prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rationale {
    pub title: String,
    pub message: String,
}

impl Rationale {
    /// Standard microphone rationale for an app called `app_name`
    pub fn microphone(app_name: &str) -> Self {
        Self {
            title: "Microphone Permission".to_string(),
            message: format!(
                "{} needs access to your microphone so you can record audio.",
                app_name
            ),
        }
    }
}

/// Host permission prompt
#[async_trait::async_trait]
pub trait PermissionService: Send + Sync {
    /// Ask for `permission`. Resolves with whether it was granted.
    async fn request(&self, permission: Permission, rationale: &Rationale) -> Result<bool>;
}

/// Answer configured ahead of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionPolicy {
    Granted,
    Denied,
    /// Platform without runtime permissions: every request succeeds
    NotRequired,
}

/// Permission service that answers from configuration
#[derive(Debug, Clone)]
pub struct StaticPermission {
    policy: PermissionPolicy,
}

impl StaticPermission {
    pub fn new(policy: PermissionPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait::async_trait]
impl PermissionService for StaticPermission {
    async fn request(&self, permission: Permission, rationale: &Rationale) -> Result<bool> {
        let granted = match self.policy {
            PermissionPolicy::NotRequired => return Ok(true),
            PermissionPolicy::Granted => true,
            PermissionPolicy::Denied => false,
        };

        info!(
            "Permission result for {:?} ({}): {}",
            permission, rationale.title, granted
        );

        Ok(granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_permission_policies() {
        let rationale = Rationale::microphone("VoiceMemo");

        for (policy, expected) in [
            (PermissionPolicy::Granted, true),
            (PermissionPolicy::Denied, false),
            (PermissionPolicy::NotRequired, true),
        ] {
            let granted = StaticPermission::new(policy)
                .request(Permission::RecordAudio, &rationale)
                .await
                .unwrap();
            assert_eq!(granted, expected, "{:?}", policy);
        }
    }

    #[test]
    fn test_microphone_rationale() {
        let rationale = Rationale::microphone("VoiceMemo");
        assert_eq!(rationale.title, "Microphone Permission");
        assert!(rationale.message.starts_with("VoiceMemo needs access"));
    }
}
