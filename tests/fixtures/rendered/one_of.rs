// Generated by familiar-typegen - DO NOT EDIT

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct A {
    pub b: Option<B>,
    pub c: Option<C>,
    pub d: Option<D>,
}

impl serde::Serialize for A {
    fn serialize<__S>(&self, serializer: __S) -> ::std::result::Result<__S::Ok, __S::Error>
    where
        __S: serde::Serializer,
    {
        let present = usize::from(self.b.is_some()) + usize::from(self.c.is_some()) + usize::from(self.d.is_some());
        if present == 1 {
            if let Some(value) = &self.b {
                return value.serialize(serializer);
            }
            if let Some(value) = &self.c {
                return value.serialize(serializer);
            }
            if let Some(value) = &self.d {
                return value.serialize(serializer);
            }
        }
        Err(serde::ser::Error::custom("tagged union type must have exactly 1 non-absent field value"))
    }
}

impl<'de> serde::Deserialize<'de> for A {
    fn deserialize<__D>(deserializer: __D) -> ::std::result::Result<Self, __D::Error>
    where
        __D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value.get("type").and_then(serde_json::Value::as_str).map(str::to_owned);
        match tag.as_deref() {
            Some("b") => serde_json::from_value(value)
                .map(|v| Self { b: Some(v), ..Self::default() })
                .map_err(serde::de::Error::custom),
            Some("c") => serde_json::from_value(value)
                .map(|v| Self { c: Some(v), ..Self::default() })
                .map_err(serde::de::Error::custom),
            Some("d") => serde_json::from_value(value)
                .map(|v| Self { d: Some(v), ..Self::default() })
                .map_err(serde::de::Error::custom),
            Some(other) => Err(serde::de::Error::custom(format!("{}, got {:?}", "tagged union type must have a \"type\" property whose value is one of [\"b\", \"c\", \"d\"]", other))),
            None => Err(serde::de::Error::custom("tagged union type must have a \"type\" property whose value is one of [\"b\", \"c\", \"d\"]")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<String>,
    pub r#type: String,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct C {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<bool>,
    pub r#type: String,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct D {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Number>,
    pub r#type: String,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

/// oneOf to implement a tagged union type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneOf {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<Vec<A>>,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}
