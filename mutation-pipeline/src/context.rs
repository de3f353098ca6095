//! Provide a [`CallerContext`] for a mutation call.
//!
//! The context lives for one request. Besides who is calling, it carries the plugin chain
//! attached to the request and a DashMap which allows additional data to be passed back and
//! forth between plugins and the business logic.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::BoxError;

use crate::json_ext::Value;
use crate::permission::Principal;
use crate::plugin::PluginManager;

/// Holds [`CallerContext`] entries.
pub(crate) type Entries = Arc<DashMap<String, Value>>;

/// Per-request state handed to the executor, plugins and business logic.
#[derive(Clone, Debug, Default)]
pub struct CallerContext {
    principal: Option<Principal>,
    app: Option<Principal>,
    plugins: Option<Arc<PluginManager>>,
    entries: Entries,
}

#[buildstructor::buildstructor]
impl CallerContext {
    #[builder(visibility = "pub")]
    fn new(
        principal: Option<Principal>,
        app: Option<Principal>,
        plugins: Option<Arc<PluginManager>>,
    ) -> Self {
        Self {
            principal,
            app,
            plugins,
            entries: Default::default(),
        }
    }

    /// The authenticated user, if any.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// The authenticated app, if any.
    pub fn app(&self) -> Option<&Principal> {
        self.app.as_ref()
    }

    /// The plugin chain attached to this request, if any.
    pub fn plugins(&self) -> Option<&Arc<PluginManager>> {
        self.plugins.as_ref()
    }

    /// Reads the entry stored under `key`, as recorded by a plugin or the business logic.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: DeserializeOwned,
    {
        let Some(entry) = self.entries.get(&key.into()) else {
            return Ok(None);
        };
        Ok(Some(serde_json_bytes::from_value(entry.value().clone())?))
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub fn insert<K, V>(&self, key: K, value: V) -> Result<Option<V>, BoxError>
    where
        K: Into<String>,
        V: DeserializeOwned + Serialize,
    {
        let value = serde_json_bytes::to_value(value)?;
        match self.entries.insert(key.into(), value) {
            Some(previous) => Ok(Some(serde_json_bytes::from_value(previous)?)),
            None => Ok(None),
        }
    }

    /// Replaces the entry under `key` by `update` applied to it, starting from `default()`
    /// when there is none yet.
    ///
    /// The entry is left untouched when it does not hold a `V`.
    pub fn upsert<K, V>(
        &self,
        key: K,
        update: impl FnOnce(V) -> V,
        default: impl FnOnce() -> V,
    ) -> Result<(), BoxError>
    where
        K: Into<String>,
        V: DeserializeOwned + Serialize,
    {
        let mut entry = self.entries.entry(key.into()).or_insert(Value::Null);
        let current = if entry.is_null() {
            default()
        } else {
            serde_json_bytes::from_value(entry.value().clone())?
        };
        *entry = serde_json_bytes::to_value(update(current))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::permission::Permission;

    #[test]
    fn insert_returns_the_replaced_value() {
        let context = CallerContext::default();
        assert_eq!(context.insert("acme.attempts", 2).unwrap(), None);
        assert_eq!(context.insert("acme.attempts", 3).unwrap(), Some(2));
        assert_eq!(context.get("acme.attempts").unwrap(), Some(3));
        assert_eq!(context.get::<_, i32>("acme.missing").unwrap(), None);
    }

    #[test]
    fn upsert_starts_from_the_default() {
        let context = CallerContext::default();
        context.insert("present", 1).unwrap();
        context.upsert("present", |v: i32| v + 1, || 0).unwrap();
        assert_eq!(context.get("present").unwrap(), Some(2));
        context.upsert("absent", |v: i32| v + 1, || 0).unwrap();
        assert_eq!(context.get("absent").unwrap(), Some(1));
    }

    #[test]
    fn mistyped_entries_are_errors() {
        let context = CallerContext::default();
        context.insert("note", "Some value".to_string()).unwrap();
        assert!(context.upsert("note", |v: i32| v + 1, || 0).is_err());
        assert!(context.get::<_, i32>("note").is_err());
        assert_eq!(
            context.get::<_, String>("note").unwrap().as_deref(),
            Some("Some value")
        );
    }

    #[test]
    fn clones_share_entries() {
        let c = CallerContext::builder()
            .principal(
                Principal::user()
                    .id("staff@example.com")
                    .permission(Permission::new("MANAGE_PRODUCTS"))
                    .build(),
            )
            .build();
        let clone = c.clone();
        clone.insert("audited", true).unwrap();
        assert_eq!(c.get("audited").unwrap(), Some(true));
        assert!(c.principal().is_some());
        assert!(c.app().is_none());
        assert!(c.plugins().is_none());
    }
}
