//! Permission records and group views.
//!
//! A permission record is the set of scopes one grantee holds over one
//! subject. The vocabulary is fixed: `root` is the implicit self-access entry,
//! `admin` and `custodian` are elevated scopes that let the grantee administer
//! the subject's permissions, `note` and `view` are content scopes. Each scope
//! is a marker value, normally an empty object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// One scope of the fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    Root,
    Admin,
    Custodian,
    Note,
    View,
}

impl Scope {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Admin => "admin",
            Self::Custodian => "custodian",
            Self::Note => "note",
            Self::View => "view",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scopes held by a grantee over a subject.
///
/// A `null` marker deserializes as an absent scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Permissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custodian: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<Value>,
}

/// Records keyed by the user on the other side of the relationship.
pub type GroupView = BTreeMap<String, Permissions>;

fn marker() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Permissions {
    /// The implicit entry a user holds over their own data.
    pub fn root() -> Self {
        Self {
            root: Some(marker()),
            ..Self::default()
        }
    }

    /// Build a record holding the given scopes, each with an empty marker.
    pub fn with_scopes(scopes: &[Scope]) -> Self {
        let mut perms = Self::default();
        for scope in scopes {
            *perms.slot_mut(*scope) = Some(marker());
        }
        perms
    }

    fn slot_mut(&mut self, scope: Scope) -> &mut Option<Value> {
        match scope {
            Scope::Root => &mut self.root,
            Scope::Admin => &mut self.admin,
            Scope::Custodian => &mut self.custodian,
            Scope::Note => &mut self.note,
            Scope::View => &mut self.view,
        }
    }

    /// Whether the record grants nothing.
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
            && self.admin.is_none()
            && self.custodian.is_none()
            && self.note.is_none()
            && self.view.is_none()
    }

    /// Whether the holder may administer the subject's permissions.
    pub const fn is_elevated(&self) -> bool {
        self.admin.is_some() || self.custodian.is_some()
    }

    /// Scopes present in this record, in vocabulary order.
    pub fn scopes(&self) -> Vec<Scope> {
        [
            (Scope::Root, &self.root),
            (Scope::Admin, &self.admin),
            (Scope::Custodian, &self.custodian),
            (Scope::Note, &self.note),
            (Scope::View, &self.view),
        ]
        .into_iter()
        .filter_map(|(scope, slot)| slot.as_ref().map(|_| scope))
        .collect()
    }

    /// Parse a stored or submitted JSON document.
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| Error::Permission(e.to_string()))?;
        if !value.is_object() {
            return Err(Error::Permission(
                "permissions must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| Error::Permission(e.to_string()))
    }

    /// Check that a submitted record only carries grantable scopes.
    ///
    /// `root` is implied by identity and cannot be granted.
    pub fn validate_grant(&self) -> Result<()> {
        if self.root.is_some() {
            return Err(Error::Permission("root cannot be granted".to_string()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
