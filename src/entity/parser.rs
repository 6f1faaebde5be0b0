//! Turns raw payloads into [`Entity`] handles.
//!
//! Classification is by class: `"collection"` wins over `"error"`, anything
//! else is a Model. Embedded payloads become members (for collections) or
//! sub-entities (for everything else). Every hydrated entity built along the
//! way is registered in the store; link stubs are not.

use super::{Entity, EntityCell, EntityKind, EntityState, SubEntity};
use crate::action::Action;
use crate::error::Result;
use crate::model::SirenPayload;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Weak};
use tracing::warn;

/// Which sub-entities a resolution fetches on its own after the root entity
/// arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoFetch {
    /// Leave sub-entities as they came.
    #[default]
    None,
    /// Fetch link stubs only.
    Linked,
    /// Fetch every sub-entity that has a URL.
    All,
}

/// Builds an entity from `payload`, registering it (and its hydrated nested
/// entities) in `store`.
pub fn parse(payload: SirenPayload, store: &Store) -> Entity {
    let is_linked = payload.is_link_stub();
    let cell = Arc::new_cyclic(|parent| EntityCell::new(build_state(payload, store, parent)));
    let entity = Entity::from_cell(cell);
    if !is_linked {
        store.add(&entity);
    }
    entity
}

/// Like [`parse`], from an undecoded JSON value.
pub fn parse_value(value: Value, store: &Store) -> Result<Entity> {
    Ok(parse(SirenPayload::from_value(value)?, store))
}

fn classify(payload: &SirenPayload) -> EntityKind {
    if payload.has_class("collection") {
        EntityKind::Collection
    } else if payload.has_class("error") {
        EntityKind::Error
    } else {
        EntityKind::Model
    }
}

pub(crate) fn build_state(
    payload: SirenPayload,
    store: &Store,
    parent: &Weak<EntityCell>,
) -> EntityState {
    let kind = classify(&payload);
    let url = payload.canonical_url();

    let mut members = Vec::new();
    let mut sub_entities = Vec::new();
    for embedded in &payload.entities {
        let entity = parse(embedded.clone(), store);
        match kind {
            EntityKind::Collection => members.push(entity),
            _ => sub_entities.push(SubEntity {
                rel: embedded.rel.clone(),
                name: embedded.entity_name(),
                entity,
            }),
        }
    }

    let actions = payload
        .actions
        .iter()
        .map(|declaration| {
            if declaration.name.is_none() {
                warn!(%url, href = %declaration.href, "Action is missing a name");
            }
            Arc::new(Action::new(declaration.clone(), parent.clone(), &members))
        })
        .collect();

    EntityState {
        kind,
        is_linked: payload.is_link_stub(),
        attributes: payload.properties.clone().unwrap_or_default(),
        url,
        raw: Arc::new(payload),
        sub_entities,
        members,
        actions,
    }
}

/// Sub-entity slots the policy wants fetched, as `(index, url)`.
pub(crate) fn pending_fetches(entity: &Entity, policy: AutoFetch) -> Vec<(usize, String)> {
    if policy == AutoFetch::None {
        return Vec::new();
    }
    entity
        .sub_entities()
        .into_iter()
        .enumerate()
        .filter(|(_, slot)| policy == AutoFetch::All || slot.entity.is_linked())
        .filter_map(|(index, slot)| {
            let url = slot.entity.url();
            (!url.is_empty()).then_some((index, url))
        })
        .collect()
}
