use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEntry {
    pub name: String,
    pub color: String,
}

impl Tag {
    pub fn entry(&self) -> TagEntry {
        TagEntry {
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

impl TagEntry {
    pub fn with_id(self, id: i32) -> Tag {
        Tag {
            id,
            name: self.name,
            color: self.color,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTag {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl UpdateTag {
    pub fn apply_to(&self, tag: &mut Tag) {
        if let Some(name) = &self.name {
            tag.name = name.clone();
        }
        if let Some(color) = &self.color {
            tag.color = color.clone();
        }
    }
}
