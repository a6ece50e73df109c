//! Magazine model and request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One published magazine issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Magazine {
    pub id: String,
    pub image_file: Option<String>,
    /// Admin who owns the issue
    pub owner: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub likes: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a new magazine.
///
/// Nothing is validated here; missing required columns are rejected by the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMagazineRequest {
    /// Caller-chosen identifier; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub is_published: Option<bool>,
    /// Defaults to the time of creation
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for a partial magazine update.
///
/// Absent fields keep their value. For the text columns an explicit `null` is
/// written through: it clears a nullable column and fails the store's NOT NULL
/// check for `title`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMagazineRequest {
    #[serde(default, deserialize_with = "present")]
    pub image_file: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub owner: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Marks a field as supplied, keeping `null` as `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Response body for a successful update.
#[derive(Debug, Clone, Serialize)]
pub struct MagazineUpdated {
    pub message: &'static str,
    pub magazine: Magazine,
}

/// Response body for a successful delete.
#[derive(Debug, Clone, Serialize)]
pub struct MagazineDeleted {
    pub message: &'static str,
}
