use serde::{Deserialize, Serialize};

use crate::domain::drawing::Drawing;

/// The identity a workflow runs under.
///
/// The auth collaborator owns credential lifecycle; the engine only ever
/// receives an `Identity` as an explicit parameter. A missing token means
/// "operate in local-only mode" for anything that would require the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub token: Option<String>,
}

impl Identity {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: Some(token.into()),
        }
    }

    /// An identity without a bearer credential.
    pub fn local_only(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: None,
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether this identity owns the given record.
    ///
    /// Records without a tracked owner belong to nobody.
    pub fn owns(&self, drawing: &Drawing) -> bool {
        drawing.owner_username.as_deref() == Some(self.username.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::drawing::StorageLocation;

    fn drawing_owned_by(owner: Option<&str>) -> Drawing {
        Drawing {
            id: 7,
            file_name: "sketch".to_string(),
            file_path: "/tmp".to_string(),
            storage_location: StorageLocation::Local,
            owner_username: owner.map(|s| s.to_string()),
            created_at: 0,
        }
    }

    #[test]
    fn test_ownership() {
        let alice = Identity::new("alice", "t0k3n");
        assert!(alice.owns(&drawing_owned_by(Some("alice"))));
        assert!(!alice.owns(&drawing_owned_by(Some("bob"))));
        assert!(!alice.owns(&drawing_owned_by(None)));
    }

    #[test]
    fn test_local_only_has_no_bearer() {
        let ident = Identity::local_only("alice");
        assert!(ident.bearer().is_none());
        assert_eq!(Identity::new("alice", "t").bearer(), Some("t"));
    }
}
