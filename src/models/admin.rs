//! Admin model for the admin directory.

/// An operator allowed to publish, edit and remove magazines.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: String,
}
