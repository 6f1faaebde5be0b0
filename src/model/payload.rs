use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::SirenError;

/// A raw Siren representation, as received from the API.
///
/// Every field is optional on the wire. Embedded links (sub-entities that only
/// carry an `href`) and full embedded representations share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SirenPayload {
    #[serde(default, rename = "class", skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rel: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<SirenPayload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// A navigational link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: Vec<String>,
    #[serde(default)]
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// An action as declared in a payload's `actions` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDeclaration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "class", skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

/// One input of an action.
///
/// `action` names the action whose schema is used when the field's value is
/// itself an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl SirenPayload {
    /// Decodes a JSON value. Anything but an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, SirenError> {
        if !value.is_object() {
            return Err(SirenError::Payload(format!(
                "expected a JSON object, got {value}"
            )));
        }
        serde_json::from_value(value).map_err(|e| SirenError::Payload(e.to_string()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// The explicit `href`, else the first link whose rel list contains `self`.
    pub fn self_url(&self) -> Option<&str> {
        if let Some(href) = &self.href {
            return Some(href);
        }
        self.links
            .iter()
            .find(|link| link.rel.iter().any(|rel| rel == "self"))
            .map(|link| link.href.as_str())
    }

    /// Canonical URL of the representation. Falls back to an empty string and
    /// emits a warning when neither `href` nor a `self` link exists.
    pub fn canonical_url(&self) -> String {
        match self.self_url() {
            Some(url) => url.to_owned(),
            None => {
                warn!(classes = ?self.classes, "Missing href or \"self\" link");
                String::new()
            }
        }
    }

    /// The name under which a parent exposes this payload: an explicit
    /// `name`, else the first `name:`-prefixed rel token.
    pub fn entity_name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        self.rel
            .iter()
            .find_map(|rel| rel.strip_prefix("name:"))
            .map(str::to_owned)
    }

    /// True for embedded links: an `href` and no inline properties.
    pub fn is_link_stub(&self) -> bool {
        self.href.is_some() && self.properties.is_none()
    }
}
