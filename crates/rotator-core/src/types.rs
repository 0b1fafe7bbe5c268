use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// OutfitRef
// ---------------------------------------------------------------------------

/// An outfit id plus display name. Position in the config list is rotation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutfitRef {
    pub id: u64,
    pub name: String,
}

impl OutfitRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Config files written by older versions store bare ids instead of objects.
impl<'de> Deserialize<'de> for OutfitRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(u64),
            Full {
                id: u64,
                #[serde(default)]
                name: Option<String>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bare(id) => OutfitRef::new(id, id.to_string()),
            Repr::Full { id, name } => {
                OutfitRef::new(id, name.unwrap_or_else(|| id.to_string()))
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Outfit details (GET /v3/outfits/{id}/details)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_avatar_type: Option<String>,
    #[serde(
        default,
        rename = "bodyColor3s",
        skip_serializing_if = "Option::is_none"
    )]
    pub body_colors: Option<BodyColors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<Asset>>,
}

/// Hex body colors, re-sent verbatim to `set-body-colors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyColors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_color3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torso_color3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_arm_color3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_arm_color3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_leg_color3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_leg_color3: Option<String>,
}

/// A worn asset. Only `id` and `meta` survive the round-trip to `set-wearing-assets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// AvatarType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarType {
    R6,
    R15,
}

impl AvatarType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "R6" => Some(AvatarType::R6),
            "R15" => Some(AvatarType::R15),
            _ => None,
        }
    }

    /// Numeric enum value expected by `set-player-avatar-type`.
    pub fn wire_value(self) -> u8 {
        match self {
            AvatarType::R6 => 1,
            AvatarType::R15 => 3,
        }
    }
}

impl fmt::Display for AvatarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvatarType::R6 => write!(f, "R6"),
            AvatarType::R15 => write!(f, "R15"),
        }
    }
}

// ---------------------------------------------------------------------------
// Users API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// One entry from the outfits listing. Only `Avatar` outfits are rotatable.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OutfitListing {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub outfit_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OutfitPage {
    #[serde(default)]
    pub data: Vec<OutfitListing>,
}
