use crate::foundation::core::ImageUri;
use crate::transform::state::TransformState;

/// Placeholder content of a freshly added text box.
pub const DEFAULT_TEXT: &str = "Write your text";

/// Identifies an overlay for removal and gesture routing.
///
/// Image overlays are keyed by their source URI, which is not unique: two
/// overlays added from the same URI share a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OverlayKey {
    Text(u64),
    Image(ImageUri),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextOverlay {
    pub id: u64,
    pub content: String,
    /// Whether the text box currently holds edit focus.
    #[serde(default)]
    pub editing: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageOverlay {
    pub source_uri: ImageUri,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayContent {
    Text(TextOverlay),
    Image(ImageOverlay),
}

/// Unique per-collection handle; unlike [`OverlayKey`] it never aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayHandle(pub(crate) u64);

/// A positionable element on the canvas plus its transform.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Overlay {
    pub content: OverlayContent,
    #[serde(default)]
    pub transform: TransformState,
    #[serde(skip)]
    pub(crate) handle: Option<OverlayHandle>,
}

impl Overlay {
    pub fn text(id: u64, content: impl Into<String>) -> Self {
        Self {
            content: OverlayContent::Text(TextOverlay {
                id,
                content: content.into(),
                editing: false,
            }),
            transform: TransformState::default(),
            handle: None,
        }
    }

    pub fn image(source_uri: ImageUri) -> Self {
        Self {
            content: OverlayContent::Image(ImageOverlay { source_uri }),
            transform: TransformState::default(),
            handle: None,
        }
    }

    /// `None` until the overlay has been inserted into a collection.
    pub fn handle(&self) -> Option<OverlayHandle> {
        self.handle
    }

    pub fn key(&self) -> OverlayKey {
        match &self.content {
            OverlayContent::Text(t) => OverlayKey::Text(t.id),
            OverlayContent::Image(i) => OverlayKey::Image(i.source_uri.clone()),
        }
    }

    pub fn matches(&self, key: &OverlayKey) -> bool {
        match (&self.content, key) {
            (OverlayContent::Text(t), OverlayKey::Text(id)) => t.id == *id,
            (OverlayContent::Image(i), OverlayKey::Image(uri)) => i.source_uri == *uri,
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&TextOverlay> {
        match &self.content {
            OverlayContent::Text(t) => Some(t),
            OverlayContent::Image(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextOverlay> {
        match &mut self.content {
            OverlayContent::Text(t) => Some(t),
            OverlayContent::Image(_) => None,
        }
    }
}
