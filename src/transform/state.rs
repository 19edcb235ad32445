use crate::foundation::core::{Affine, Point, Size, Vec2};
use crate::transform::gesture::GestureEvent;

/// Translation, scale and rotation of one overlay.
///
/// `translation` is `committed_offset + delta` while a pan is in flight; ending
/// the pan folds the delta into `committed_offset`. Scale and rotation are
/// absolute values overwritten by each pinch/rotate sample, not composed across
/// gestures.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformState {
    pub translation: Vec2,
    pub committed_offset: Vec2,
    pub scale: f64,
    pub rotation_rad: f64,
    /// Optional floor applied to incoming scale samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f64>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            committed_offset: Vec2::ZERO,
            scale: 1.0,
            rotation_rad: 0.0,
            min_scale: None,
        }
    }
}

impl TransformState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity transform whose scale samples never drop below `floor`.
    pub fn with_min_scale(floor: f64) -> Self {
        Self {
            min_scale: (floor.is_finite() && floor > 0.0).then_some(floor),
            ..Self::default()
        }
    }

    /// `translation = committed_offset + (dx, dy)`.
    pub fn apply_pan_delta(&mut self, dx: f64, dy: f64) {
        self.translation = self.committed_offset + Vec2::new(dx, dy);
    }

    pub fn commit_pan(&mut self) {
        self.committed_offset = self.translation;
    }

    pub fn apply_scale(&mut self, s: f64) {
        if !s.is_finite() {
            return;
        }
        self.scale = match self.min_scale {
            Some(floor) => s.max(floor),
            None => s,
        };
    }

    pub fn apply_rotation(&mut self, radians: f64) {
        if radians.is_finite() {
            self.rotation_rad = radians;
        }
    }

    /// Route one gesture sample into the matching setter.
    pub fn apply(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::Pan { dx, dy } => self.apply_pan_delta(dx, dy),
            GestureEvent::PanEnd => self.commit_pan(),
            GestureEvent::Pinch { scale } => self.apply_scale(scale),
            GestureEvent::Rotate { radians } => self.apply_rotation(radians),
        }
    }

    /// Pure form of [`TransformState::apply`].
    pub fn reduce(mut self, event: GestureEvent) -> Self {
        self.apply(event);
        self
    }

    /// `Translate(translation) * Scale(scale) * RotateZ(rotation)`.
    pub fn current_matrix(&self) -> Affine {
        Affine::translate(self.translation)
            * Affine::scale(self.scale)
            * Affine::rotate(self.rotation_rad)
    }

    /// Map overlay-local coordinates into canvas space.
    ///
    /// `origin` is the untransformed top-left of the overlay box; the transform
    /// pivots around the box centre.
    pub fn placement_matrix(&self, origin: Point, size: Size) -> Affine {
        let half = Vec2::new(size.width * 0.5, size.height * 0.5);
        Affine::translate(origin.to_vec2() + half) * self.current_matrix() * Affine::translate(-half)
    }
}
