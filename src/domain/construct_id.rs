// Copyright (c) 2025 - Cowboy AI, Inc.
//! Construct Identity Value Objects
//!
//! Every declared resource is addressed three ways:
//!
//! - [`ConstructId`] - the short, user-facing id (`WebServer1`)
//! - [`ConstructPath`] - the id's position in the construct tree
//!   (`CdkWorkshopStack/WebServer1/Instance`)
//! - [`LogicalId`] - the stable key of the resource inside the synthesized
//!   template (`WebServer1Instance8F3A21C0`)
//!
//! Logical ids are a pure function of the path, so re-synthesizing the same
//! declaration always yields the same template keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Construct id validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstructIdError {
    #[error("Construct id is empty")]
    Empty,

    #[error("Construct id exceeds maximum length of 255 characters: {0}")]
    TooLong(usize),

    #[error("Invalid character in construct id: {0:?}")]
    InvalidCharacter(char),

    #[error("Construct path has no stack component")]
    EmptyPath,
}

/// Construct id value object
///
/// Invariants:
/// - Non-empty
/// - At most 255 characters
/// - No path separator (`/`) and no control characters
///
/// # Examples
///
/// ```rust
/// use cim_blog_stack::domain::ConstructId;
///
/// let id = ConstructId::new("WebServer1").unwrap();
/// assert_eq!(id.as_str(), "WebServer1");
///
/// assert!(ConstructId::new("").is_err());
/// assert!(ConstructId::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConstructId(String);

impl ConstructId {
    /// Maximum length of a single construct id
    pub const MAX_LENGTH: usize = 255;

    /// Create a new construct id with validation
    pub fn new(id: impl Into<String>) -> Result<Self, ConstructIdError> {
        let id = id.into();

        if id.is_empty() {
            return Err(ConstructIdError::Empty);
        }

        if id.len() > Self::MAX_LENGTH {
            return Err(ConstructIdError::TooLong(id.len()));
        }

        if let Some(ch) = id.chars().find(|c| *c == '/' || c.is_control()) {
            return Err(ConstructIdError::InvalidCharacter(ch));
        }

        Ok(Self(id))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConstructId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ConstructId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConstructId {
    type Error = ConstructIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ConstructId {
    type Error = ConstructIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConstructId> for String {
    fn from(id: ConstructId) -> Self {
        id.0
    }
}

/// Position of a construct in the construct tree
///
/// The first component is always the stack. Paths are built top-down with
/// [`ConstructPath::child`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<ConstructId>", into = "Vec<ConstructId>")]
pub struct ConstructPath(Vec<ConstructId>);

impl TryFrom<Vec<ConstructId>> for ConstructPath {
    type Error = ConstructIdError;

    fn try_from(components: Vec<ConstructId>) -> Result<Self, Self::Error> {
        if components.is_empty() {
            return Err(ConstructIdError::EmptyPath);
        }
        Ok(Self(components))
    }
}

impl From<ConstructPath> for Vec<ConstructId> {
    fn from(path: ConstructPath) -> Self {
        path.0
    }
}

impl ConstructPath {
    /// Path of a stack (the tree root)
    pub fn root(stack: ConstructId) -> Self {
        Self(vec![stack])
    }

    /// Path of a direct child of this construct
    pub fn child(&self, id: &ConstructId) -> Self {
        let mut components = self.0.clone();
        components.push(id.clone());
        Self(components)
    }

    /// Child path from a literal id known to be valid
    ///
    /// Used for the fixed inner ids of constructs (`Instance`,
    /// `SecurityGroup`, ...). Invalid literals fall back to an id with the
    /// offending characters replaced.
    pub fn child_named(&self, id: &str) -> Self {
        let id = ConstructId::new(id).unwrap_or_else(|_| {
            let cleaned: String = id
                .chars()
                .map(|c| if c == '/' || c.is_control() { '-' } else { c })
                .collect();
            ConstructId(if cleaned.is_empty() { "Default".to_string() } else { cleaned })
        });
        self.child(&id)
    }

    /// Components from the root down
    pub fn components(&self) -> &[ConstructId] {
        &self.0
    }

    /// The stack this path belongs to
    pub fn stack(&self) -> &ConstructId {
        &self.0[0]
    }

    /// The last component
    pub fn leaf(&self) -> &ConstructId {
        &self.0[self.0.len() - 1]
    }

    /// Components below the stack joined with `/` (`WebServer1/Instance`)
    pub fn relative(&self) -> String {
        let below: Vec<&str> = self.0[1..].iter().map(|c| c.as_str()).collect();
        below.join("/")
    }

    /// Number of components including the stack
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Check whether `other` is this path or lives beneath it
    pub fn is_ancestor_of(&self, other: &ConstructPath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Derive the template logical id for this path
    pub fn logical_id(&self) -> LogicalId {
        LogicalId::from_path(self)
    }
}

impl fmt::Display for ConstructPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(|c| c.as_str()).collect();
        write!(f, "{}", joined.join("/"))
    }
}

/// Namespace for name-based logical id suffixes
const LOGICAL_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6a1c_58e2_3f0d_4b7a_9c41_d2e8_7b50_aa13);

/// Key of a resource inside a synthesized template
///
/// Format: the alphanumeric characters of every path component below the
/// stack (with `Default` components and repeated neighbours dropped),
/// followed by eight upper-case hex digits derived from the full path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Maximum length accepted by the provisioning engine
    pub const MAX_LENGTH: usize = 255;

    const HASH_LENGTH: usize = 8;

    fn from_path(path: &ConstructPath) -> Self {
        let below_stack: Vec<&str> = path.components()[1..]
            .iter()
            .map(|c| c.as_str())
            .collect();

        let mut human = String::new();
        let mut previous: Option<&str> = None;
        for component in &below_stack {
            if *component == "Default" || previous == Some(*component) {
                continue;
            }
            human.extend(component.chars().filter(|c| c.is_ascii_alphanumeric()));
            previous = Some(component);
        }

        if human.is_empty() {
            human.extend(path.stack().as_str().chars().filter(|c| c.is_ascii_alphanumeric()));
        }

        human.truncate(Self::MAX_LENGTH - Self::HASH_LENGTH);

        let digest = Uuid::new_v5(&LOGICAL_ID_NAMESPACE, path.to_string().as_bytes());
        let suffix = digest.simple().to_string()[..Self::HASH_LENGTH].to_uppercase();

        Self(format!("{human}{suffix}"))
    }

    /// Get the logical id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<LogicalId> for String {
    fn from(id: LogicalId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(components: &[&str]) -> ConstructPath {
        let mut iter = components.iter();
        let mut path = ConstructPath::root(ConstructId::new(*iter.next().unwrap()).unwrap());
        for c in iter {
            path = path.child(&ConstructId::new(*c).unwrap());
        }
        path
    }

    #[test]
    fn test_valid_construct_ids() {
        assert!(ConstructId::new("BlogVpc").is_ok());
        assert!(ConstructId::new("Web Server 1").is_ok());
        assert!(ConstructId::new("a").is_ok());
    }

    #[test]
    fn test_invalid_construct_ids() {
        assert_eq!(ConstructId::new(""), Err(ConstructIdError::Empty));
        assert_eq!(
            ConstructId::new("Stack/Vpc"),
            Err(ConstructIdError::InvalidCharacter('/'))
        );
        assert!(matches!(
            ConstructId::new("x".repeat(256)),
            Err(ConstructIdError::TooLong(256))
        ));
    }

    #[test]
    fn test_path_display_and_relations() {
        let stack = path(&["CdkWorkshopStack"]);
        let instance = path(&["CdkWorkshopStack", "WebServer1", "Instance"]);

        assert_eq!(instance.to_string(), "CdkWorkshopStack/WebServer1/Instance");
        assert_eq!(instance.depth(), 3);
        assert_eq!(instance.relative(), "WebServer1/Instance");
        assert_eq!(instance.leaf().as_str(), "Instance");
        assert_eq!(instance.stack().as_str(), "CdkWorkshopStack");
        assert!(stack.is_ancestor_of(&instance));
        assert!(!instance.is_ancestor_of(&stack));
    }

    #[test]
    fn test_logical_id_is_stable() {
        let a = path(&["CdkWorkshopStack", "WebServer1", "Instance"]).logical_id();
        let b = path(&["CdkWorkshopStack", "WebServer1", "Instance"]).logical_id();
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("WebServer1Instance"));
        assert_eq!(a.as_str().len(), "WebServer1Instance".len() + 8);
    }

    #[test]
    fn test_logical_id_distinguishes_stacks() {
        let a = path(&["StackA", "Vpc"]).logical_id();
        let b = path(&["StackB", "Vpc"]).logical_id();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("Vpc"));
        assert!(b.as_str().starts_with("Vpc"));
    }

    #[test]
    fn test_logical_id_drops_default_and_repeats() {
        let id = path(&["S", "Bucket", "Default"]).logical_id();
        assert!(id.as_str().starts_with("Bucket"));
        assert_eq!(id.as_str().len(), "Bucket".len() + 8);

        let id = path(&["S", "Group", "Group"]).logical_id();
        assert_eq!(id.as_str().len(), "Group".len() + 8);
    }

    #[test]
    fn test_logical_id_strips_punctuation() {
        let id = path(&["S", "from 0.0.0.0/0:80".replace('/', "_").as_str()]).logical_id();
        assert!(id.as_str().starts_with("from0000080"));
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_child_named_sanitizes() {
        let root = path(&["S"]);
        let child = root.child_named("a/b");
        assert_eq!(child.leaf().as_str(), "a-b");
    }

    #[test]
    fn test_path_serde_round_trip() {
        let original = path(&["S", "WebServer1", "Instance"]);
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, r#"["S","WebServer1","Instance"]"#);

        let parsed: ConstructPath = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.stack().as_str(), "S");
    }

    #[test]
    fn test_empty_path_rejected_on_deserialize() {
        let err = serde_json::from_str::<ConstructPath>("[]").unwrap_err();
        assert!(err.to_string().contains("no stack component"));
    }

    #[test]
    fn test_invalid_component_rejected_on_deserialize() {
        assert!(serde_json::from_str::<ConstructPath>(r#"["S","a/b"]"#).is_err());
    }
}
