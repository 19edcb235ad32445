use crate::foundation::core::ImageUri;
use crate::foundation::error::MemeResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Images,
}

/// Constraints handed to the platform image picker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickRequest {
    pub media: MediaKind,
    pub allow_editing: bool,
    /// Crop aspect as `(width, height)`.
    pub aspect: (u32, u32),
    /// Export quality in `[0, 1]`.
    pub quality: f32,
}

impl Default for PickRequest {
    fn default() -> Self {
        Self {
            media: MediaKind::Images,
            allow_editing: true,
            aspect: (4, 3),
            quality: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickOutcome {
    Cancelled,
    Selected(ImageUri),
}

/// Gallery selection capability supplied by the embedding UI.
pub trait ImagePicker {
    fn pick(&mut self, request: &PickRequest) -> MemeResult<PickOutcome>;
}

impl<F> ImagePicker for F
where
    F: FnMut(&PickRequest) -> MemeResult<PickOutcome>,
{
    fn pick(&mut self, request: &PickRequest) -> MemeResult<PickOutcome> {
        self(request)
    }
}
