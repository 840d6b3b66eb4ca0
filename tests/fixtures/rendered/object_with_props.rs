// Generated by familiar-typegen - DO NOT EDIT

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectWithProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p0: Option<String>,
    pub p1: serde_json::Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p2: Option<P2>,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P2 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<String>,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}
