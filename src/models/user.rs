//! User account model

use serde::{Deserialize, Serialize};

/// A user as seen by the rest of the application (never carries a password)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Partial profile edit; `None` fields are left untouched
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    /// Apply this update to a user
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(picture) = self.profile_picture {
            user.profile_picture = Some(picture);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.profile_picture.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_user() -> User {
        User {
            id: "1".to_string(),
            email: "user@example.com".to_string(),
            name: "Demo User".to_string(),
            profile_picture: None,
        }
    }

    #[test]
    fn test_apply_partial_update() {
        let mut user = demo_user();
        ProfileUpdate {
            name: Some("Renamed".to_string()),
            ..Default::default()
        }
        .apply_to(&mut user);

        assert_eq!(user.name, "Renamed");
        assert_eq!(user.email, "user@example.com");
    }

    #[test]
    fn test_user_json_shape() {
        let json = serde_json::to_string(&demo_user()).unwrap();
        assert_eq!(
            json,
            r#"{"id":"1","email":"user@example.com","name":"Demo User"}"#
        );
    }
}
