//! # Entities
//!
//! An [`Entity`] is the in-memory form of one Siren representation: a Model,
//! a Collection or an Error. Entities are shared handles (`Clone` is cheap and
//! clones point at the same state), so the same entity can be cached in the
//! [`Store`], nested inside a parent and held by the caller at once.
//!
//! State lives behind an `RwLock` so an action response can replace an entity's
//! data in place: every holder of the handle observes the new data. The URL an
//! entity was created with is kept across such replacements.
//!
//! ## Events
//! Each entity owns a broadcast channel of [`EntityEvent`]s. Action execution
//! emits `Request` / `Synced` / `Failed`, and resolution emits `Resolved` once
//! auto-fetched sub-entities are in place. Subscribe with [`Entity::subscribe`].

pub mod parser;

pub use parser::{parse, parse_value, AutoFetch};

use crate::action::{Action, ExecuteOptions};
use crate::error::{Result, SirenError};
use crate::model::{Field, Link, SirenPayload};
use crate::store::Store;
use crate::transport::{Transport, TransportFailure};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 32;

/// Classification of a representation, decided by its classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Model,
    Collection,
    Error,
}

/// Notifications published on an entity's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    /// An action request was sent.
    Request { action: String },
    /// An action succeeded and the entity now holds the response data.
    Synced { action: String },
    /// An action failed; the entity is unchanged.
    Failed {
        action: String,
        failure: TransportFailure,
    },
    /// Resolution finished, including auto-fetched sub-entities.
    Resolved,
}

/// A sub-entity slot of a model.
#[derive(Debug, Clone)]
pub struct SubEntity {
    pub rel: Vec<String>,
    pub name: Option<String>,
    pub entity: Entity,
}

pub(crate) struct EntityState {
    pub(crate) kind: EntityKind,
    pub(crate) url: String,
    pub(crate) raw: Arc<SirenPayload>,
    pub(crate) is_linked: bool,
    pub(crate) attributes: Map<String, Value>,
    pub(crate) sub_entities: Vec<SubEntity>,
    pub(crate) members: Vec<Entity>,
    pub(crate) actions: Vec<Arc<Action>>,
}

pub(crate) struct EntityCell {
    state: RwLock<EntityState>,
    events: broadcast::Sender<EntityEvent>,
}

impl EntityCell {
    pub(crate) fn new(state: EntityState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(state),
            events,
        }
    }
}

/// Shared handle to one parsed representation.
#[derive(Clone)]
pub struct Entity {
    cell: Arc<EntityCell>,
}

/// Selects sub-entities by class and/or rel. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    pub class: Option<String>,
    pub rel: Option<String>,
}

impl EntityFilter {
    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::default()
        }
    }

    pub fn rel(rel: impl Into<String>) -> Self {
        Self {
            rel: Some(rel.into()),
            ..Self::default()
        }
    }

    fn matches(&self, slot: &SubEntity) -> bool {
        let class_ok = self
            .class
            .as_deref()
            .map_or(true, |class| slot.entity.has_class(class));
        let rel_ok = self
            .rel
            .as_deref()
            .map_or(true, |rel| slot.rel.iter().any(|r| r == rel));
        class_ok && rel_ok
    }
}

/// Selects actions by class and/or name. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    pub class: Option<String>,
    pub name: Option<String>,
}

impl ActionFilter {
    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    fn matches(&self, action: &Action) -> bool {
        let class_ok = self
            .class
            .as_deref()
            .map_or(true, |class| action.has_class(class));
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |name| action.name.as_deref() == Some(name));
        class_ok && name_ok
    }
}

impl Entity {
    pub(crate) fn from_cell(cell: Arc<EntityCell>) -> Self {
        Self { cell }
    }

    fn read(&self) -> RwLockReadGuard<'_, EntityState> {
        self.cell.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EntityState> {
        self.cell.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when both handles point at the same entity.
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Canonical URL, or `""` when the representation has none.
    pub fn url(&self) -> String {
        self.read().url.clone()
    }

    /// An entity without a URL has never been persisted server-side.
    pub fn is_new(&self) -> bool {
        self.read().url.is_empty()
    }

    pub fn kind(&self) -> EntityKind {
        self.read().kind
    }

    pub fn is_collection(&self) -> bool {
        self.kind() == EntityKind::Collection
    }

    pub fn is_error(&self) -> bool {
        self.kind() == EntityKind::Error
    }

    /// True for a reference stub that still needs fetching.
    pub fn is_linked(&self) -> bool {
        self.read().is_linked
    }

    pub fn raw(&self) -> Arc<SirenPayload> {
        self.read().raw.clone()
    }

    pub fn classes(&self) -> Vec<String> {
        self.read().raw.classes.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.read().raw.has_class(class)
    }

    pub fn title(&self) -> Option<String> {
        self.read().raw.title.clone()
    }

    /// The payload's `name`, else its `name:`-prefixed rel.
    pub fn name(&self) -> Option<String> {
        self.read().raw.entity_name()
    }

    pub fn rel(&self) -> Vec<String> {
        self.read().raw.rel.clone()
    }

    pub fn has_rel(&self, rel: &str) -> bool {
        self.read().raw.rel.iter().any(|r| r == rel)
    }

    /// Links, optionally restricted to those carrying `rel`.
    pub fn links(&self, rel: Option<&str>) -> Vec<Link> {
        self.read()
            .raw
            .links
            .iter()
            .filter(|link| rel.map_or(true, |rel| link.rel.iter().any(|r| r == rel)))
            .cloned()
            .collect()
    }

    pub fn link(&self, rel: &str) -> Option<Link> {
        self.links(Some(rel)).into_iter().next()
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.read().attributes.get(name).cloned()
    }

    pub fn properties(&self) -> Map<String, Value> {
        self.read().attributes.clone()
    }

    /// Sets a local attribute. Nothing is sent until an action runs.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.write().attributes.insert(name.into(), value);
    }

    /// A collection's meta value (its `properties`, e.g. paging offsets).
    pub fn meta(&self, name: &str) -> Option<Value> {
        let state = self.read();
        match state.kind {
            EntityKind::Collection => state.attributes.get(name).cloned(),
            _ => None,
        }
    }

    pub fn sub_entity(&self, name: &str) -> Option<Entity> {
        self.read()
            .sub_entities
            .iter()
            .find(|slot| slot.name.as_deref() == Some(name))
            .map(|slot| slot.entity.clone())
    }

    pub fn sub_entities(&self) -> Vec<SubEntity> {
        self.read().sub_entities.clone()
    }

    pub fn entities(&self, filter: &EntityFilter) -> Vec<Entity> {
        self.read()
            .sub_entities
            .iter()
            .filter(|slot| filter.matches(slot))
            .map(|slot| slot.entity.clone())
            .collect()
    }

    /// Collection members in payload order. Empty for models.
    pub fn members(&self) -> Vec<Entity> {
        self.read().members.clone()
    }

    pub fn len(&self) -> usize {
        self.read().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn actions(&self, filter: &ActionFilter) -> Vec<Arc<Action>> {
        self.read()
            .actions
            .iter()
            .filter(|action| filter.matches(action))
            .cloned()
            .collect()
    }

    /// Looks up a named action. Unnamed actions are never returned here.
    pub fn action(&self, name: &str) -> Option<Arc<Action>> {
        self.read()
            .actions
            .iter()
            .find(|action| action.name.as_deref() == Some(name))
            .cloned()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error_property("message")
    }

    pub fn error_code(&self) -> Option<Value> {
        if !self.is_error() {
            return None;
        }
        self.property("code")
    }

    fn error_property(&self, name: &str) -> Option<String> {
        if !self.is_error() {
            return None;
        }
        match self.property(name)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Serializes the entity.
    ///
    /// With an action name that the entity declares, only that action's fields
    /// are emitted. A field's value is its sub-entity (serialized with the
    /// field's own `action`), else its attribute, else the field's declared
    /// `value`; fields with none of these are omitted. Without a matching
    /// action every attribute and named sub-entity is emitted.
    ///
    /// Collections serialize to an array of their members. When an action name
    /// is given each row also carries the member's `id`.
    ///
    /// An entity that contains itself further down (cyclic links that were
    /// auto-fetched) is emitted as its URL on the second visit.
    pub fn to_json(&self, action_name: Option<&str>) -> Value {
        self.serialize_by_action(action_name, &mut Vec::new())
    }

    /// Serializes through an explicit field list. Collection rows carry member
    /// ids whenever an action is involved, and every member goes through
    /// `fields` when they are given.
    pub(crate) fn serialize(&self, action_name: Option<&str>, fields: Option<Vec<Field>>) -> Value {
        self.serialize_within(action_name, fields, &mut Vec::new())
    }

    fn serialize_by_action(&self, action_name: Option<&str>, path: &mut Vec<Entity>) -> Value {
        let fields = action_name
            .and_then(|name| self.action(name))
            .map(|action| action.fields.clone());
        self.serialize_within(action_name, fields, path)
    }

    /// `path` holds the entities currently being serialized above this one.
    fn serialize_within(
        &self,
        action_name: Option<&str>,
        fields: Option<Vec<Field>>,
        path: &mut Vec<Entity>,
    ) -> Value {
        if path.iter().any(|seen| seen.ptr_eq(self)) {
            return Value::String(self.url());
        }
        path.push(self.clone());
        let value = self.serialize_state(action_name, fields, path);
        path.pop();
        value
    }

    fn serialize_state(
        &self,
        action_name: Option<&str>,
        fields: Option<Vec<Field>>,
        path: &mut Vec<Entity>,
    ) -> Value {
        let with_ids = action_name.is_some() || fields.is_some();
        let (kind, attributes, named, members) = {
            let state = self.read();
            let named: Vec<(String, Entity)> = state
                .sub_entities
                .iter()
                .filter_map(|slot| Some((slot.name.clone()?, slot.entity.clone())))
                .collect();
            (
                state.kind,
                state.attributes.clone(),
                named,
                state.members.clone(),
            )
        };

        if kind == EntityKind::Collection {
            let mut rows = Vec::with_capacity(members.len());
            for member in &members {
                let mut row = match &fields {
                    Some(fields) => member.serialize_within(None, Some(fields.clone()), path),
                    None => member.serialize_by_action(action_name, path),
                };
                if with_ids {
                    if let (Value::Object(map), Some(id)) = (&mut row, member.property("id")) {
                        map.insert("id".into(), id);
                    }
                }
                rows.push(row);
            }
            return Value::Array(rows);
        }

        let lookup = |name: &str| named.iter().find(|(n, _)| n == name).map(|(_, e)| e);
        let mut json = Map::new();
        match fields {
            Some(fields) => {
                for field in fields {
                    let value = match lookup(&field.name) {
                        Some(sub) => Some(sub.serialize_by_action(field.action.as_deref(), path)),
                        None => attributes
                            .get(&field.name)
                            .cloned()
                            .or_else(|| field.value.clone()),
                    };
                    if let Some(value) = value {
                        json.insert(field.name.clone(), value);
                    }
                }
            }
            None => {
                json.extend(attributes);
                for (name, sub) in &named {
                    json.insert(name.clone(), sub.serialize_by_action(None, path));
                }
            }
        }
        Value::Object(json)
    }

    /// The values `action_name` would send, or `None` if no such action.
    pub fn all_by_action(&self, action_name: &str) -> Option<Value> {
        self.action(action_name)?;
        Some(self.to_json(Some(action_name)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.cell.events.subscribe()
    }

    pub(crate) fn emit(&self, event: EntityEvent) {
        // No receivers is fine.
        let _ = self.cell.events.send(event);
    }

    /// Runs the named action through `transport`.
    pub async fn invoke(
        &self,
        action_name: &str,
        transport: &dyn Transport,
        options: ExecuteOptions,
    ) -> Result<Entity> {
        let action = self
            .action(action_name)
            .ok_or_else(|| SirenError::ActionNotFound(action_name.to_owned()))?;
        action
            .execute(transport, options)
            .await
            .unwrap_or_else(|| Err(SirenError::ActionNotFound(action_name.to_owned())))
    }

    /// The child a chain segment points at: a collection member whose `id`
    /// (or URL) equals the segment, else the sub-entity of that name.
    pub(crate) fn child(&self, segment: &str) -> Option<Entity> {
        let state = self.read();
        let member = state.members.iter().find(|member| {
            let id_matches = match member.property("id") {
                Some(Value::String(id)) => id == segment,
                Some(Value::Number(id)) => id.to_string() == segment,
                _ => false,
            };
            id_matches || member.url() == segment
        });
        if let Some(member) = member {
            return Some(member.clone());
        }
        state
            .sub_entities
            .iter()
            .find(|slot| slot.name.as_deref() == Some(segment))
            .map(|slot| slot.entity.clone())
    }

    pub(crate) fn replace_sub_entity(&self, index: usize, entity: Entity) {
        if let Some(slot) = self.write().sub_entities.get_mut(index) {
            slot.entity = entity;
        }
    }

    /// Swaps in the data of `payload`, keeping this entity's URL unless it had
    /// none. Nested entities in the payload are registered in `store`.
    pub(crate) fn replace(&self, payload: SirenPayload, store: &Store) {
        let parent = Arc::downgrade(&self.cell);
        let mut next = parser::build_state(payload, store, &parent);
        let mut state = self.write();
        if !state.url.is_empty() {
            next.url = std::mem::take(&mut state.url);
        }
        *state = next;
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Entity")
            .field("kind", &state.kind)
            .field("url", &state.url)
            .field("is_linked", &state.is_linked)
            .field("attributes", &state.attributes)
            .finish()
    }
}
