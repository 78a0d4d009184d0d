use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Province record exchanged with the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProvinceData {
    pub name: String,
    pub id: String,
    pub position: (f32, f32),
    #[serde(default)]
    pub selected: bool,
}

impl ProvinceData {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: (f32, f32)) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            position,
            selected: false,
        }
    }
}
