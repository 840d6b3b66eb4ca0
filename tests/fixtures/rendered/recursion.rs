// Generated by familiar-typegen - DO NOT EDIT

use serde::{Deserialize, Serialize};

/// A node with children and an optional parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub value: serde_json::Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Tree>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Tree>>,
}
