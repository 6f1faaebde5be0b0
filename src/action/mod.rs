//! # Actions
//!
//! An [`Action`] is one operation an entity advertises: a method, a target
//! URL and a list of fields. Actions belong to exactly one entity and keep a
//! weak reference back to it, so an action outliving its entity simply becomes
//! a no-op.
//!
//! Running an action is the job of the [`executor`]: it serializes the owning
//! entity through the action's fields, sends the request and, on success,
//! swaps the response into the owning entity in place.

pub mod executor;

pub use executor::{plan, ActionRequest, ExecuteOptions};

use crate::entity::{Entity, EntityCell};
use crate::error::Result;
use crate::model::{ActionDeclaration, Field};
use crate::transport::{Transport, DEFAULT_CONTENT_TYPE, DEFAULT_METHOD};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};

const BATCH_CLASS: &str = "batch";

pub struct Action {
    pub name: Option<String>,
    pub title: Option<String>,
    pub method: String,
    pub content_type: String,
    pub classes: Vec<String>,
    pub fields: Vec<Field>,
    pub href: String,
    parent: Weak<EntityCell>,
    secure_keys: Mutex<Option<HashMap<String, String>>>,
}

impl Action {
    /// Builds an action owned by `parent`.
    ///
    /// A `batch` action declared without fields takes the fields of the
    /// same-named action on the first of `members`.
    pub(crate) fn new(
        declaration: ActionDeclaration,
        parent: Weak<EntityCell>,
        members: &[Entity],
    ) -> Self {
        let mut fields = declaration.fields;
        let is_batch = declaration.classes.iter().any(|c| c == BATCH_CLASS);
        if is_batch && fields.is_empty() {
            if let Some(inherited) = declaration
                .name
                .as_deref()
                .and_then(|name| members.first()?.action(name))
            {
                fields = inherited.fields.clone();
            }
        }

        Self {
            name: declaration.name,
            title: declaration.title,
            method: declaration
                .method
                .map(|m| m.to_uppercase())
                .unwrap_or_else(|| DEFAULT_METHOD.to_owned()),
            content_type: declaration
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
            classes: declaration.classes,
            fields,
            href: declaration.href,
            parent,
            secure_keys: Mutex::new(None),
        }
    }

    /// An action with no owning entity. Executing it does nothing.
    pub fn detached(declaration: ActionDeclaration) -> Self {
        Self::new(declaration, Weak::new(), &[])
    }

    /// The owning entity, if it is still alive.
    pub fn parent(&self) -> Option<Entity> {
        self.parent.upgrade().map(Entity::from_cell)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sends this action. `None` when the action has no owning entity.
    pub async fn execute(
        &self,
        transport: &dyn Transport,
        options: ExecuteOptions,
    ) -> Option<Result<Entity>> {
        executor::execute(self, transport, options).await
    }

    fn secure_keys(&self) -> MutexGuard<'_, Option<HashMap<String, String>>> {
        self.secure_keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Secure keys live beside the action only. They are never serialized
    // into a request body.

    pub fn set_secure_key(&self, name: impl Into<String>, value: impl Into<String>) {
        self.secure_keys()
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
    }

    pub fn secure_key(&self, name: &str) -> Option<String> {
        self.secure_keys().as_ref()?.get(name).cloned()
    }

    pub fn clear_secure_key(&self, name: &str) {
        if let Some(keys) = self.secure_keys().as_mut() {
            keys.remove(name);
        }
    }

    pub fn clear_secure_keys(&self) {
        *self.secure_keys() = None;
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secure_key_names: Vec<String> = self
            .secure_keys()
            .as_ref()
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("href", &self.href)
            .field("content_type", &self.content_type)
            .field("fields", &self.fields)
            .field("secure_keys", &secure_key_names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration() -> ActionDeclaration {
        ActionDeclaration {
            name: Some("add-item".into()),
            href: "/orders/42/items".into(),
            fields: vec![Field::new("quantity")],
            ..ActionDeclaration::default()
        }
    }

    #[test]
    fn test_defaults() {
        let action = Action::detached(declaration());
        assert_eq!(action.method, "GET");
        assert_eq!(action.content_type, "application/x-www-form-urlencoded");
        assert!(action.field("quantity").is_some());
        assert!(action.field("price").is_none());
        assert!(action.parent().is_none());
    }

    #[test]
    fn test_secure_keys() {
        let action = Action::detached(declaration());
        assert!(action.secure_key("token").is_none());

        action.set_secure_key("token", "s3cret");
        action.set_secure_key("pin", "1234");
        assert_eq!(action.secure_key("token").as_deref(), Some("s3cret"));

        action.clear_secure_key("token");
        assert!(action.secure_key("token").is_none());
        assert_eq!(action.secure_key("pin").as_deref(), Some("1234"));

        action.clear_secure_keys();
        assert!(action.secure_key("pin").is_none());
    }

    #[test]
    fn test_debug_hides_secure_values() {
        let action = Action::detached(declaration());
        action.set_secure_key("token", "s3cret");
        let debug = format!("{action:?}");
        assert!(debug.contains("token"));
        assert!(!debug.contains("s3cret"));
    }

    #[tokio::test]
    async fn test_execute_without_parent_is_a_no_op() {
        let transport = crate::transport::mock::MockTransport::new();
        let action = Action::detached(declaration());
        assert!(action
            .execute(&transport, ExecuteOptions::default())
            .await
            .is_none());
        assert_eq!(transport.total_calls(), 0);
    }
}
