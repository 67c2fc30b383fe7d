//! Core access control types

use crate::error::{AccessError, Result};
use crate::notation::AttributeGlob;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Key under which a role's extended (inherited) roles are stored
pub const EXTEND_KEY: &str = "$extend";

/// Names that can never be used for roles, resources or action keys
pub const RESERVED_KEYWORDS: [&str; 4] = ["*", "!", "$", EXTEND_KEY];

/// Action performed on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    /// All actions, in canonical order
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl FromStr for Action {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(AccessError::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an action applies to the actor's own resource instances or to any
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Possession {
    Own,
    #[default]
    Any,
}

impl Possession {
    pub fn as_str(&self) -> &'static str {
        match self {
            Possession::Own => "own",
            Possession::Any => "any",
        }
    }
}

impl FromStr for Possession {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "own" => Ok(Possession::Own),
            "any" => Ok(Possession::Any),
            _ => Err(AccessError::InvalidPossession(s.to_string())),
        }
    }
}

impl fmt::Display for Possession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized `"<action>:<possession>"` key of a resource entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionKey {
    pub action: Action,
    pub possession: Possession,
}

impl ActionKey {
    pub fn new(action: Action, possession: Possession) -> Self {
        Self { action, possession }
    }

    /// Normalize an action (optionally compound, e.g. `"Create:Own"`) and an
    /// optional explicit possession. The explicit possession takes precedence
    /// over the compound part; when both are missing, `any` is assumed.
    pub fn normalize(action: &str, possession: Option<&str>) -> Result<Self> {
        let mut parts = action.splitn(2, ':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(AccessError::InvalidAction(format!("\"{}\"", action)));
        }
        let action = name.parse::<Action>()?;

        let possession = match possession.or_else(|| parts.next()) {
            Some(p) if !p.trim().is_empty() => p.parse::<Possession>()?,
            _ => Possession::Any,
        };

        Ok(Self { action, possession })
    }

    /// Same action, `any` possession
    pub fn as_any(&self) -> Self {
        Self::new(self.action, Possession::Any)
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.possession)
    }
}

impl FromStr for ActionKey {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        Self::normalize(s, None)
    }
}

impl Serialize for ActionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn delimiter() -> &'static Regex {
    static DELIMITER: OnceLock<Regex> = OnceLock::new();
    DELIMITER.get_or_init(|| Regex::new(r"\s*[,;]\s*").expect("static delimiter pattern"))
}

/// Split a comma / semicolon delimited string into trimmed parts
pub fn split_names(value: &str) -> Vec<String> {
    delimiter()
        .split(value.trim())
        .map(|s| s.to_string())
        .collect()
}

/// Conversion of the accepted "one or many names" arguments into a list.
///
/// A single string is split on `,` / `;` so `"admin, user"` names two roles.
pub trait IntoNames {
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        split_names(self)
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        split_names(&self)
    }
}

impl IntoNames for &String {
    fn into_names(self) -> Vec<String> {
        split_names(self)
    }
}

impl IntoNames for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(|s| s.trim().to_string()).collect()
    }
}

impl IntoNames for &[String] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.trim().to_string()).collect()
    }
}

impl IntoNames for Vec<&str> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(|s| s.trim().to_string()).collect()
    }
}

impl IntoNames for &[&str] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.trim().to_string()).collect()
    }
}

impl<const N: usize> IntoNames for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.trim().to_string()).collect()
    }
}

/// Whether `name` is usable as a role, resource or action key
pub fn is_valid_name(name: &str) -> bool {
    validate_name("", name).is_ok()
}

/// Validate a single name, `kind` is used in the error message
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AccessError::InvalidName(format!(
            "{} name cannot be empty",
            kind
        )));
    }
    if RESERVED_KEYWORDS.contains(&name.trim()) {
        return Err(AccessError::InvalidName(format!(
            "Cannot use reserved name for {}: \"{}\"",
            kind, name
        )));
    }
    if name.trim() != name {
        return Err(AccessError::InvalidName(format!(
            "{} name has surrounding whitespace: \"{}\"",
            kind, name
        )));
    }
    Ok(())
}

/// Validate a non-empty list of names
pub fn validate_names(kind: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(AccessError::InvalidName(format!("No {} name given", kind)));
    }
    names.iter().try_for_each(|name| validate_name(kind, name))
}

/// Validate an attribute list: empty, or non-empty strings that parse as globs
pub fn validate_attributes(context: &str, attributes: &[String]) -> Result<()> {
    for attr in attributes {
        if attr.trim().is_empty() {
            return Err(AccessError::InvalidAttributes(format!(
                "empty attribute for \"{}\"",
                context
            )));
        }
        AttributeGlob::parse(attr)?;
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_names(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => split_names(&s),
            OneOrMany::Many(v) => v.into_names(),
        }
    }
}

fn names_de<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(Option::<OneOrMany>::deserialize(deserializer)?
        .map(OneOrMany::into_names)
        .unwrap_or_default())
}

fn opt_names_de<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error> {
    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(OneOrMany::into_names))
}

/// Flat grant record, as used by bulk loading and the `Access` builder draft
///
/// ```json
/// { "role": "admin", "resource": ["video", "photo"], "action": "create:any",
///   "attributes": ["*", "!views"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessInfo {
    /// Role(s) the grant applies to
    #[serde(default, alias = "subject", deserialize_with = "names_de")]
    pub role: Vec<String>,

    /// Resource(s) the grant applies to
    #[serde(default, deserialize_with = "names_de")]
    pub resource: Vec<String>,

    /// Action, optionally compound (`"create:own"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Explicit possession, overrides the compound part of `action`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possession: Option<String>,

    /// Granted attribute globs; `None` means all attributes
    #[serde(
        default,
        deserialize_with = "opt_names_de",
        skip_serializing_if = "Option::is_none"
    )]
    pub attributes: Option<Vec<String>>,

    /// Whether this record denies rather than grants
    #[serde(default)]
    pub denied: bool,
}

impl AccessInfo {
    pub fn new(role: impl IntoNames, resource: impl IntoNames, action: impl Into<String>) -> Self {
        Self {
            role: role.into_names(),
            resource: resource.into_names(),
            action: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn with_possession(mut self, possession: impl Into<String>) -> Self {
        self.possession = Some(possession.into());
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoNames) -> Self {
        self.attributes = Some(attributes.into_names());
        self
    }

    pub fn denied(mut self) -> Self {
        self.denied = true;
        self
    }

    /// Nothing set at all
    pub fn is_empty(&self) -> bool {
        self.role.is_empty()
            && self.resource.is_empty()
            && self.action.is_none()
            && self.possession.is_none()
            && self.attributes.is_none()
    }

    /// Role, resource and action are all present, so the record can be committed
    pub fn is_fulfilled(&self) -> bool {
        !self.role.is_empty() && !self.resource.is_empty() && self.action.is_some()
    }

    /// Attribute list this record commits: `[]` when denied, `["*"]` when
    /// unspecified, the trimmed list otherwise.
    pub fn normalized_attributes(&self) -> Result<Vec<String>> {
        if self.denied {
            return Ok(Vec::new());
        }
        let attributes: Vec<String> = match &self.attributes {
            None => return Ok(vec!["*".to_string()]),
            Some(list) if list.is_empty() => return Ok(vec!["*".to_string()]),
            Some(list) => list.iter().map(|a| a.trim().to_string()).collect(),
        };
        validate_attributes(&self.resource.join(","), &attributes)?;
        Ok(attributes)
    }

    /// Validate roles and resources and normalize attributes. The action key
    /// is normalized too when present.
    pub(crate) fn normalize(&self) -> Result<NormalizedAccess> {
        validate_names("role", &self.role)?;
        validate_names("resource", &self.resource)?;
        let attributes = self.normalized_attributes()?;
        let key = self
            .action
            .as_deref()
            .map(|action| ActionKey::normalize(action, self.possession.as_deref()))
            .transpose()?;

        Ok(NormalizedAccess {
            roles: self.role.clone(),
            resources: self.resource.clone(),
            key,
            attributes,
        })
    }
}

/// Validated form of an [`AccessInfo`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedAccess {
    pub roles: Vec<String>,
    pub resources: Vec<String>,
    pub key: Option<ActionKey>,
    pub attributes: Vec<String>,
}

/// Permission query record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryInfo {
    /// Role(s) to resolve the permission for
    #[serde(default, alias = "subject", deserialize_with = "names_de")]
    pub role: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possession: Option<String>,
}

impl QueryInfo {
    pub fn new(role: impl IntoNames, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            role: role.into_names(),
            resource: Some(resource.into()),
            action: Some(action.into()),
            possession: None,
        }
    }

    pub fn with_possession(mut self, possession: impl Into<String>) -> Self {
        self.possession = Some(possession.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.role.is_empty()
            && self.resource.is_none()
            && self.action.is_none()
            && self.possession.is_none()
    }

    pub(crate) fn normalize(&self) -> Result<NormalizedQuery> {
        if self.role.is_empty() || self.role.iter().any(|r| r.trim().is_empty()) {
            return Err(AccessError::InvalidName(format!(
                "Invalid role(s): {:?}",
                self.role
            )));
        }
        let resource = match self.resource.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => {
                return Err(AccessError::InvalidName(format!(
                    "Invalid resource: {:?}",
                    self.resource
                )))
            }
        };
        let action = self
            .action
            .as_deref()
            .ok_or_else(|| AccessError::InvalidAction("no action given".to_string()))?;
        let key = ActionKey::normalize(action, self.possession.as_deref())?;

        Ok(NormalizedQuery {
            roles: self.role.clone(),
            resource,
            key,
        })
    }
}

/// Validated form of a [`QueryInfo`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedQuery {
    pub roles: Vec<String>,
    pub resource: String,
    pub key: ActionKey,
}
