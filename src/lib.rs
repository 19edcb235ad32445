//! memekit is a headless meme composition engine.
//!
//! A caller picks a template image, stacks text and image overlays on it,
//! drives each overlay with pan/pinch/rotate gesture samples, and flattens the
//! result into a single exported bitmap.
//!
//! # Pieces
//!
//! 1. [`TransformState`]: per-overlay translation, scale and rotation, resolved
//!    into one [`Affine`] by [`TransformState::current_matrix`].
//! 2. [`gesture_channel`]: per-overlay stream of [`GestureEvent`] samples from
//!    the platform recognizer, drained into the transform without blocking.
//! 3. [`OverlayCollection`]: ordered text/image overlays on a [`Canvas`].
//! 4. [`Rasterizer`]: the capture capability; [`CpuRasterizer`] implements it
//!    in software.
//! 5. [`MemeEditor`]: the screen state machine tying template selection,
//!    overlays, freeze/settle/capture and [`GeneratedImageHistory`] together.
#![forbid(unsafe_code)]

mod assets;
mod canvas;
mod foundation;
mod overlay;
mod render;
mod session;
mod settings;
mod transform;

pub use assets::catalog::{Template, TemplateCatalog};
pub use assets::decode::{AspectProbe, FsAspectProbe, PreparedImage, decode_image, load_image};
pub use assets::picker::{ImagePicker, MediaKind, PickOutcome, PickRequest};
pub use canvas::{Canvas, CanvasSnapshot};
pub use foundation::core::{Affine, AspectRatio, ImageUri, Point, Rect, Rgba8Premul, Size, Vec2};
pub use foundation::error::{MemeError, MemeResult};
pub use overlay::collection::{OverlayCollection, TextIdPolicy};
pub use overlay::model::{
    DEFAULT_TEXT, ImageOverlay, Overlay, OverlayContent, OverlayHandle, OverlayKey, TextOverlay,
};
pub use render::composite::{Fit, Sprite, draw_sprite, over};
pub use render::cpu::CpuRasterizer;
pub use render::text::TextRenderer;
pub use render::{
    CaptureFormat, CaptureOptions, FrameRGBA, MAX_FRAME_EDGE, MAX_FRAME_PIXELS, Rasterizer,
};
pub use session::capture::CaptureTicket;
pub use session::editor::{GeneratedImage, GenerationStatus, MemeEditor, SUCCESS_MESSAGE};
pub use session::history::GeneratedImageHistory;
pub use settings::{EditorSettings, RasterSettings, TextStyle};
pub use transform::gesture::{GestureEvent, GestureInbox, GestureSender, gesture_channel};
pub use transform::state::TransformState;
