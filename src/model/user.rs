use serde::{Deserialize, Serialize};

/// The signed-in user. There is at most one per device session; it is replaced wholesale on
/// sign-in and cleared on sign-out.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: String,
    name: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo: Option<String>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        photo: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            photo,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }
}

#[test]
fn test_user_json_omits_missing_photo() {
    let user = User::new("any_id", "Raphael", "raphael@example.com", None);
    let json = serde_json::to_string(&user).unwrap();
    assert_eq!(
        json,
        r#"{"id":"any_id","name":"Raphael","email":"raphael@example.com"}"#
    );
    let back: User = serde_json::from_str(&json).unwrap();
    assert_eq!(back, user);
}
