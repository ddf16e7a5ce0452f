use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminator for directory items referenced polymorphically by reviews,
/// favorites and working times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EntityType {
    Doctor = 1,
    Hospital = 2,
}

impl EntityType {
    /// Collection holding documents of this type.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityType::Doctor => "doctors",
            EntityType::Hospital => "hospitals",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Doctor => "Doctor",
            EntityType::Hospital => "Hospital",
        }
    }
}

impl TryFrom<u8> for EntityType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EntityType::Doctor),
            2 => Ok(EntityType::Hospital),
            other => Err(format!("Unknown entity type: {}", other)),
        }
    }
}

impl From<EntityType> for u8 {
    fn from(value: EntityType) -> Self {
        value as u8
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}
