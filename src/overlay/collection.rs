use crate::foundation::core::ImageUri;
use crate::overlay::model::{DEFAULT_TEXT, Overlay, OverlayHandle, OverlayKey, TextOverlay};
use crate::transform::state::TransformState;

/// How new text overlay ids are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextIdPolicy {
    /// Strictly increasing counter; ids are never reused.
    #[default]
    Monotonic,
    /// `number of text overlays + 1`. Collides once removals interleave with adds.
    LengthPlusOne,
}

/// Ordered set of overlays on one canvas. List order is paint order.
#[derive(Clone, Debug)]
pub struct OverlayCollection {
    overlays: Vec<Overlay>,
    policy: TextIdPolicy,
    next_text_id: u64,
    next_handle: u64,
    min_scale: Option<f64>,
}

impl Default for OverlayCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayCollection {
    pub fn new() -> Self {
        Self::with_policy(TextIdPolicy::default())
    }

    pub fn with_policy(policy: TextIdPolicy) -> Self {
        Self {
            overlays: Vec::new(),
            policy,
            next_text_id: 1,
            next_handle: 1,
            min_scale: None,
        }
    }

    /// Scale floor given to overlays inserted from now on.
    pub fn set_min_scale(&mut self, floor: Option<f64>) {
        self.min_scale = floor.filter(|f| f.is_finite() && *f > 0.0);
    }

    pub fn policy(&self) -> TextIdPolicy {
        self.policy
    }

    /// Append a text box with the default content; returns its id.
    pub fn add_text(&mut self) -> u64 {
        let id = match self.policy {
            TextIdPolicy::Monotonic => {
                let id = self.next_text_id;
                self.next_text_id += 1;
                id
            }
            TextIdPolicy::LengthPlusOne => self.text_count() as u64 + 1,
        };
        self.push(Overlay::text(id, DEFAULT_TEXT));
        id
    }

    /// Append an image overlay keyed by its source URI; duplicates co-exist.
    pub fn add_image(&mut self, uri: ImageUri) -> ImageUri {
        self.push(Overlay::image(uri.clone()));
        uri
    }

    /// Insert an already-built overlay (scene loading), keeping its transform.
    pub fn push(&mut self, mut overlay: Overlay) -> OverlayHandle {
        let handle = OverlayHandle(self.next_handle);
        self.next_handle += 1;
        overlay.handle = Some(handle);
        if overlay.transform.min_scale.is_none() {
            overlay.transform.min_scale = self.min_scale;
        }
        if let Some(t) = overlay.as_text()
            && self.policy == TextIdPolicy::Monotonic
        {
            self.next_text_id = self.next_text_id.max(t.id + 1);
        }
        self.overlays.push(overlay);
        handle
    }

    /// Remove every overlay matching `key`; a missing key is a no-op.
    ///
    /// Returns how many overlays were removed. Image keys alias, so removing
    /// a URI that was added twice removes both copies.
    pub fn remove(&mut self, key: &OverlayKey) -> usize {
        let before = self.overlays.len();
        self.overlays.retain(|o| !o.matches(key));
        before - self.overlays.len()
    }

    /// Remove exactly one overlay by handle.
    pub fn remove_handle(&mut self, handle: OverlayHandle) -> bool {
        let before = self.overlays.len();
        self.overlays.retain(|o| o.handle != Some(handle));
        before != self.overlays.len()
    }

    pub fn list(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn handles(&self) -> Vec<OverlayHandle> {
        self.overlays.iter().filter_map(|o| o.handle).collect()
    }

    pub fn handles_for(&self, key: &OverlayKey) -> Vec<OverlayHandle> {
        self.overlays
            .iter()
            .filter(|o| o.matches(key))
            .filter_map(|o| o.handle)
            .collect()
    }

    pub fn get(&self, handle: OverlayHandle) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.handle == Some(handle))
    }

    pub fn transform_mut(&mut self, handle: OverlayHandle) -> Option<&mut TransformState> {
        self.overlays
            .iter_mut()
            .find(|o| o.handle == Some(handle))
            .map(|o| &mut o.transform)
    }

    /// Replace the content of every text box with `id`. Returns whether one matched.
    pub fn set_text(&mut self, id: u64, content: &str) -> bool {
        self.for_each_text(id, |t| t.content = content.to_owned())
    }

    pub fn set_editing(&mut self, id: u64, editing: bool) -> bool {
        self.for_each_text(id, |t| t.editing = editing)
    }

    /// Drop edit focus from every text box.
    pub fn clear_editing(&mut self) {
        for t in self.overlays.iter_mut().filter_map(Overlay::as_text_mut) {
            t.editing = false;
        }
    }

    pub fn clear(&mut self) {
        self.overlays.clear();
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    fn text_count(&self) -> usize {
        self.overlays.iter().filter(|o| o.as_text().is_some()).count()
    }

    fn for_each_text(&mut self, id: u64, mut f: impl FnMut(&mut TextOverlay)) -> bool {
        let mut hit = false;
        for t in self.overlays.iter_mut().filter_map(Overlay::as_text_mut) {
            if t.id == id {
                f(t);
                hit = true;
            }
        }
        hit
    }
}
