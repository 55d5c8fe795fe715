/// The namespace used when `config.json` does not name one.
pub(crate) const DEFAULT_NAMESPACE: &str = "app";

/// Builds the keys under which app state is persisted, e.g. `@app:user` and
/// `@app:transactions_user:<user id>`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Keys {
    namespace: String,
}

impl Keys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The key holding the signed-in `User`.
    pub fn user(&self) -> String {
        format!("@{}:user", self.namespace)
    }

    /// The key holding the list of transactions recorded by the user with `user_id`.
    pub fn transactions(&self, user_id: &str) -> String {
        format!("@{}:transactions_user:{user_id}", self.namespace)
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

#[test]
fn test_default_keys() {
    let keys = Keys::default();
    assert_eq!(keys.user(), "@app:user");
    assert_eq!(
        keys.transactions("any_id"),
        "@app:transactions_user:any_id"
    );
}

#[test]
fn test_custom_namespace() {
    let keys = Keys::new("finboard");
    assert_eq!(keys.namespace(), "finboard");
    assert_eq!(keys.user(), "@finboard:user");
    assert_eq!(keys.transactions("u1"), "@finboard:transactions_user:u1");
}
