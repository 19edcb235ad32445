//! The editable canvas and its frozen, serializable snapshot.

use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{AspectRatio, ImageUri};
use crate::foundation::error::{MemeError, MemeResult};
use crate::overlay::collection::{OverlayCollection, TextIdPolicy};
use crate::overlay::model::Overlay;

/// Background template plus the overlays stacked on it.
#[derive(Clone, Debug)]
pub struct Canvas {
    pub background_uri: ImageUri,
    /// `None` until the dimension probe has reported a usable ratio.
    pub aspect_ratio: Option<AspectRatio>,
    pub overlays: OverlayCollection,
}

impl Canvas {
    pub fn new(background_uri: ImageUri, policy: TextIdPolicy) -> Self {
        Self {
            background_uri,
            aspect_ratio: None,
            overlays: OverlayCollection::with_policy(policy),
        }
    }

    /// Ratio used for layout: the probed one, or the default box.
    pub fn layout_aspect(&self) -> AspectRatio {
        self.aspect_ratio.unwrap_or(AspectRatio::DEFAULT)
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            background_uri: self.background_uri.clone(),
            aspect_ratio: self.layout_aspect(),
            overlays: self.overlays.list().to_vec(),
        }
    }

    /// Rebuild an editable canvas from a snapshot, keeping overlay transforms.
    pub fn from_snapshot(snapshot: CanvasSnapshot, policy: TextIdPolicy) -> Self {
        let mut canvas = Self::new(snapshot.background_uri, policy);
        canvas.aspect_ratio = Some(snapshot.aspect_ratio);
        for overlay in snapshot.overlays {
            canvas.overlays.push(overlay);
        }
        canvas
    }
}

/// Owned copy of a canvas taken at freeze time; the rasterizer's input and the
/// CLI scene format.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSnapshot {
    pub background_uri: ImageUri,
    #[serde(default = "default_aspect")]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
}

fn default_aspect() -> AspectRatio {
    AspectRatio::DEFAULT
}

impl CanvasSnapshot {
    pub fn validate(&self) -> MemeResult<()> {
        if self.background_uri.as_str().trim().is_empty() {
            return Err(MemeError::validation("scene background_uri must be non-empty"));
        }
        if AspectRatio::new(self.aspect_ratio.get()).is_none() {
            return Err(MemeError::validation("scene aspect_ratio must be finite and > 0"));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> MemeResult<Self> {
        let scene: Self = serde_json::from_str(s)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn from_json_file(path: &Path) -> MemeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read scene '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> MemeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
