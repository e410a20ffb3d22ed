//! Domain entities: the goal tree node variants and the persisted document
//!
//! A goal forest is a list of root nodes, each owning its subtree. Nodes come
//! in two variants, discriminated on the wire by a `type` tag: plain subgoal
//! nodes (`Base`) and strategy nodes (`DAPP_Child`) that carry ATP, signpost
//! and trigger lists.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::update::{FieldUpdate, ListField};

/// Lifecycle status of a goal or strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "ON_HOLD")]
    OnHold,
    #[serde(rename = "CANCELLED")]
    Cancelled,
    #[serde(rename = "FAILED")]
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::InProgress => "IN_PROGRESS",
            Status::Completed => "COMPLETED",
            Status::OnHold => "ON_HOLD",
            Status::Cancelled => "CANCELLED",
            Status::Failed => "FAILED",
        }
    }
}

/// Decomposition mode of a node's children.
///
/// `Leaf` means no children yet. The first child addition locks the mode to
/// `Rrtd` (subgoal children) or `Dapp` (strategy children); it never changes
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChildrenType {
    #[default]
    #[serde(rename = "LEAF")]
    Leaf,
    #[serde(rename = "RRTD")]
    Rrtd,
    #[serde(rename = "DAPP")]
    Dapp,
}

/// Decomposition choice made when a node receives its first child.
///
/// Two-valued on purpose: a caller cannot request `Leaf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildMode {
    /// Plain subgoal children (locks the parent to `Rrtd`).
    Subgoals,
    /// Strategy children with ATP/signposts/triggers (locks to `Dapp`).
    Strategies,
}

impl From<ChildMode> for ChildrenType {
    fn from(mode: ChildMode) -> Self {
        match mode {
            ChildMode::Subgoals => ChildrenType::Rrtd,
            ChildMode::Strategies => ChildrenType::Dapp,
        }
    }
}

fn new_node_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_atp() -> Vec<String> {
    vec![String::new()]
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Plain goal node, decomposed into subgoals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardNode {
    #[serde(default = "new_node_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub completion_condition: String,
    #[serde(default)]
    pub children_type: ChildrenType,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub progress_board: String,
    #[serde(default)]
    pub content_board: String,
    // pre-timestamp documents get both defaulted at load
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Strategy node, carrying ATP, signpost and trigger lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyNode {
    #[serde(default = "new_node_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub completion_condition: String,
    #[serde(default)]
    pub children_type: ChildrenType,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub progress_board: String,
    #[serde(default)]
    pub content_board: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Invariant: never empty
    #[serde(default = "default_atp")]
    pub atp: Vec<String>,
    #[serde(default)]
    pub signposts: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
}

impl StandardNode {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_node_id(),
            name: name.into(),
            description: String::new(),
            status: Status::default(),
            completion_condition: String::new(),
            children_type: ChildrenType::default(),
            children: Vec::new(),
            progress_board: String::new(),
            content_board: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl StrategyNode {
    /// Create a strategy node with the default single empty ATP entry.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_node_id(),
            name: name.into(),
            description: String::new(),
            status: Status::default(),
            completion_condition: String::new(),
            children_type: ChildrenType::default(),
            children: Vec::new(),
            progress_board: String::new(),
            content_board: String::new(),
            created_at: now,
            updated_at: now,
            atp: default_atp(),
            signposts: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Create a strategy node with explicit ATP entries.
    pub fn with_atp(name: impl Into<String>, atp: Vec<String>) -> Result<Self, DomainError> {
        let mut node = Self::new(name);
        if atp.is_empty() {
            return Err(DomainError::EmptyAtp { id: node.id });
        }
        node.atp = atp;
        Ok(node)
    }

    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::Atp => &self.atp,
            ListField::Signposts => &self.signposts,
            ListField::Triggers => &self.triggers,
        }
    }

    pub fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::Atp => &mut self.atp,
            ListField::Signposts => &mut self.signposts,
            ListField::Triggers => &mut self.triggers,
        }
    }
}

/// One entry in the goal forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    #[serde(rename = "Base")]
    Standard(StandardNode),
    #[serde(rename = "DAPP_Child")]
    Strategy(StrategyNode),
}

/// Dispatch an expression over both node variants.
macro_rules! with_node {
    ($node:expr, $n:ident => $body:expr) => {
        match $node {
            Node::Standard($n) => $body,
            Node::Strategy($n) => $body,
        }
    };
}

impl Node {
    pub fn id(&self) -> &str {
        with_node!(self, n => &n.id)
    }

    pub fn name(&self) -> &str {
        with_node!(self, n => &n.name)
    }

    pub fn status(&self) -> Status {
        with_node!(self, n => n.status)
    }

    pub fn description(&self) -> &str {
        with_node!(self, n => &n.description)
    }

    pub fn completion_condition(&self) -> &str {
        with_node!(self, n => &n.completion_condition)
    }

    pub fn progress_board(&self) -> &str {
        with_node!(self, n => &n.progress_board)
    }

    pub fn content_board(&self) -> &str {
        with_node!(self, n => &n.content_board)
    }

    pub fn children_type(&self) -> ChildrenType {
        with_node!(self, n => n.children_type)
    }

    pub fn children(&self) -> &[Node] {
        with_node!(self, n => &n.children)
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        with_node!(self, n => &mut n.children)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        with_node!(self, n => n.created_at)
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        with_node!(self, n => n.updated_at)
    }

    pub fn as_strategy(&self) -> Option<&StrategyNode> {
        match self {
            Node::Strategy(n) => Some(n),
            Node::Standard(_) => None,
        }
    }

    pub fn as_strategy_mut(&mut self) -> Option<&mut StrategyNode> {
        match self {
            Node::Strategy(n) => Some(n),
            Node::Standard(_) => None,
        }
    }

    /// Refresh the modification timestamp.
    pub fn touch(&mut self) {
        with_node!(self, n => n.updated_at = Utc::now());
    }

    /// Lock the children mode on first use.
    ///
    /// Only a `Leaf` node takes the requested mode; afterwards the stored
    /// mode wins and the request is advisory. Returns the effective mode.
    pub fn resolve_children_type(&mut self, requested: ChildrenType) -> ChildrenType {
        let current = self.children_type();
        if current == ChildrenType::Leaf && requested != ChildrenType::Leaf {
            with_node!(self, n => n.children_type = requested);
            requested
        } else {
            current
        }
    }

    /// Apply a field update and refresh `updated_at`.
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Name(v) => with_node!(self, n => n.name = v),
            FieldUpdate::Description(v) => with_node!(self, n => n.description = v),
            FieldUpdate::Status(v) => with_node!(self, n => n.status = v),
            FieldUpdate::CompletionCondition(v) => {
                with_node!(self, n => n.completion_condition = v)
            }
            FieldUpdate::ProgressBoard(v) => with_node!(self, n => n.progress_board = v),
            FieldUpdate::ContentBoard(v) => with_node!(self, n => n.content_board = v),
        }
        self.touch();
    }
}

/// The persisted document: version tag, write timestamp and the goal forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppData {
    pub version: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub roots: Vec<Node>,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            version: default_version(),
            last_modified: None,
            roots: Vec::new(),
        }
    }
}

impl AppData {
    /// Check the structural invariants of the whole forest.
    ///
    /// Fails on duplicate node ids and on strategy nodes with an empty ATP
    /// list. Called by the persistence gateway after deserialization.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&Node> = self.roots.iter().collect();

        while let Some(node) = stack.pop() {
            if !seen.insert(node.id()) {
                return Err(DomainError::DuplicateId {
                    id: node.id().to_string(),
                });
            }
            if let Some(strategy) = node.as_strategy() {
                if strategy.atp.is_empty() {
                    return Err(DomainError::EmptyAtp {
                        id: strategy.id.clone(),
                    });
                }
            }
            stack.extend(node.children().iter());
        }
        Ok(())
    }
}
