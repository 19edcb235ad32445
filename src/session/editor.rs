use std::collections::HashMap;
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crate::assets::catalog::Template;
use crate::assets::decode::AspectProbe;
use crate::assets::picker::{ImagePicker, PickOutcome, PickRequest};
use crate::canvas::Canvas;
use crate::foundation::core::{AspectRatio, ImageUri};
use crate::foundation::error::{MemeError, MemeResult};
use crate::overlay::model::{Overlay, OverlayHandle, OverlayKey};
use crate::render::{CaptureOptions, Rasterizer};
use crate::session::capture::{CaptureCompletion, CaptureJob, CaptureTicket, CaptureWorker};
use crate::session::history::GeneratedImageHistory;
use crate::settings::EditorSettings;
use crate::transform::gesture::{GestureEvent, GestureInbox, GestureSender, gesture_channel};
use crate::transform::state::TransformState;

/// Message shown once a capture has landed.
pub const SUCCESS_MESSAGE: &str = "Congrats! Your meme has been generated.";

/// Outcome of the most recent generation request.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerationStatus {
    Idle,
    /// Captures requested but not yet resolved.
    Capturing { pending: usize },
    Succeeded(ImageUri),
    Failed(String),
}

/// The last captured image, as displayed under the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedImage {
    pub uri: ImageUri,
    pub aspect_ratio: Option<AspectRatio>,
}

/// Meme screen state: template canvas, overlays, gestures and generation.
///
/// Input is frozen while captures are pending. A successful capture appends
/// to the shared history and clears the canvas; a failed one leaves the
/// canvas intact so the user can retry.
pub struct MemeEditor {
    settings: EditorSettings,
    capture_options: CaptureOptions,
    canvas: Option<Canvas>,
    template_picker_open: bool,
    pending: usize,
    next_ticket: u64,
    status: GenerationStatus,
    generated: Option<GeneratedImage>,
    history: GeneratedImageHistory,
    probe: Box<dyn AspectProbe>,
    gestures: HashMap<OverlayHandle, GestureInbox>,
    worker: CaptureWorker,
}

impl MemeEditor {
    pub fn new(
        settings: EditorSettings,
        rasterizer: impl Rasterizer + 'static,
        probe: impl AspectProbe + 'static,
        history: GeneratedImageHistory,
    ) -> MemeResult<Self> {
        let worker = CaptureWorker::spawn(Box::new(rasterizer), history.clone())?;
        Ok(Self {
            settings,
            capture_options: CaptureOptions::default(),
            canvas: None,
            template_picker_open: false,
            pending: 0,
            next_ticket: 1,
            status: GenerationStatus::Idle,
            generated: None,
            history,
            probe: Box::new(probe),
            gestures: HashMap::new(),
            worker,
        })
    }

    pub fn with_capture_options(mut self, opts: CaptureOptions) -> Self {
        self.capture_options = opts;
        self
    }

    pub fn toggle_template_picker(&mut self) {
        self.template_picker_open = !self.template_picker_open;
    }

    pub fn template_picker_open(&self) -> bool {
        self.template_picker_open
    }

    /// Start a fresh canvas on `template` and close the picker.
    #[tracing::instrument(skip(self, template), fields(template = %template.id))]
    pub fn select_template(&mut self, template: &Template) -> MemeResult<()> {
        self.select_background(template.image_uri.clone())?;
        self.template_picker_open = false;
        Ok(())
    }

    /// Start a fresh canvas on an arbitrary background image.
    pub fn select_background(&mut self, uri: ImageUri) -> MemeResult<()> {
        self.ensure_unfrozen()?;
        let known_aspect = self
            .canvas
            .as_ref()
            .filter(|c| c.background_uri == uri)
            .and_then(|c| c.aspect_ratio);

        let aspect_ratio = known_aspect.or_else(|| self.probe.aspect_ratio(&uri));
        let mut canvas = Canvas::new(uri, self.settings.text_id_policy);
        canvas.aspect_ratio = aspect_ratio;
        canvas.overlays.set_min_scale(self.settings.min_overlay_scale);
        tracing::debug!(
            background = %canvas.background_uri,
            aspect = canvas.aspect_ratio.map(AspectRatio::get),
            "canvas created"
        );

        self.canvas = Some(canvas);
        self.gestures.clear();
        self.generated = None;
        self.status = GenerationStatus::Idle;
        Ok(())
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn overlays(&self) -> &[Overlay] {
        self.canvas
            .as_ref()
            .map(|c| c.overlays.list())
            .unwrap_or(&[])
    }

    pub fn add_text(&mut self) -> MemeResult<u64> {
        let id = self.editable_canvas()?.overlays.add_text();
        tracing::debug!(id, "text overlay added");
        Ok(id)
    }

    pub fn add_image(&mut self, uri: ImageUri) -> MemeResult<ImageUri> {
        let uri = self.editable_canvas()?.overlays.add_image(uri);
        tracing::debug!(%uri, "image overlay added");
        Ok(uri)
    }

    /// Ask the gallery for an image; cancellation changes nothing.
    pub fn pick_image(&mut self, picker: &mut dyn ImagePicker) -> MemeResult<Option<ImageUri>> {
        self.editable_canvas()?;
        match picker.pick(&PickRequest::default())? {
            PickOutcome::Cancelled => Ok(None),
            PickOutcome::Selected(uri) => self.add_image(uri).map(Some),
        }
    }

    /// Remove every overlay matching `key`; returns how many went away.
    pub fn remove(&mut self, key: &OverlayKey) -> MemeResult<usize> {
        let removed = self.editable_canvas()?.overlays.remove(key);
        self.prune_gestures();
        Ok(removed)
    }

    pub fn remove_handle(&mut self, handle: OverlayHandle) -> MemeResult<bool> {
        let removed = self.editable_canvas()?.overlays.remove_handle(handle);
        self.prune_gestures();
        Ok(removed)
    }

    pub fn focus_text(&mut self, id: u64) -> MemeResult<bool> {
        Ok(self.editable_canvas()?.overlays.set_editing(id, true))
    }

    pub fn blur_text(&mut self, id: u64) -> MemeResult<bool> {
        Ok(self.editable_canvas()?.overlays.set_editing(id, false))
    }

    pub fn set_text(&mut self, id: u64, content: &str) -> MemeResult<bool> {
        Ok(self.editable_canvas()?.overlays.set_text(id, content))
    }

    /// Open a gesture stream for one overlay. Replaces any previous stream.
    pub fn attach_gestures(&mut self, handle: OverlayHandle) -> Option<GestureSender> {
        self.canvas.as_ref()?.overlays.get(handle)?;
        let (tx, inbox) = gesture_channel();
        self.gestures.insert(handle, inbox);
        Some(tx)
    }

    /// Apply one sample directly. Dropped while frozen or for unknown overlays.
    pub fn apply_gesture(&mut self, handle: OverlayHandle, event: GestureEvent) -> bool {
        if self.is_frozen() {
            return false;
        }
        match self.transform_mut(handle) {
            Some(t) => {
                t.apply(event);
                true
            }
            None => false,
        }
    }

    /// Drain every attached gesture stream into its overlay.
    ///
    /// While frozen the samples are discarded. Returns how many were applied.
    pub fn pump_gestures(&mut self) -> usize {
        let frozen = self.is_frozen();
        let Some(canvas) = self.canvas.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        for (handle, inbox) in &self.gestures {
            if frozen {
                inbox.discard();
                continue;
            }
            if let Some(t) = canvas.overlays.transform_mut(*handle) {
                applied += inbox.drain_into(t);
            }
        }
        applied
    }

    pub fn transform(&self, handle: OverlayHandle) -> Option<&TransformState> {
        self.canvas
            .as_ref()?
            .overlays
            .get(handle)
            .map(|o| &o.transform)
    }

    fn transform_mut(&mut self, handle: OverlayHandle) -> Option<&mut TransformState> {
        self.canvas.as_mut()?.overlays.transform_mut(handle)
    }

    /// Freeze the canvas and queue a capture of it.
    ///
    /// Returns immediately; the settle delay and capture run on the capture
    /// worker. Pending gesture samples are applied before the freeze.
    #[tracing::instrument(skip(self))]
    pub fn generate(&mut self) -> MemeResult<CaptureTicket> {
        self.pump_gestures();
        let Some(canvas) = self.canvas.as_mut() else {
            return Err(MemeError::validation("select a template before generating"));
        };
        canvas.overlays.clear_editing();
        let scene = canvas.snapshot();

        let ticket = CaptureTicket(self.next_ticket);
        self.next_ticket += 1;
        self.worker.submit(CaptureJob {
            ticket,
            scene,
            opts: self.capture_options.clone(),
            settle: self.settings.settle_delay,
        })?;
        self.pending += 1;
        self.status = GenerationStatus::Capturing {
            pending: self.pending,
        };
        tracing::info!(ticket = ticket.0, pending = self.pending, "capture queued");
        Ok(ticket)
    }

    /// Apply finished captures without blocking; returns how many were applied.
    pub fn poll_generation(&mut self) -> usize {
        let mut n = 0;
        while self.pending > 0 {
            match self.worker.try_completion() {
                Ok(done) => {
                    self.complete(done);
                    n += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    n += self.fail_pending();
                    break;
                }
            }
        }
        n
    }

    /// Block until every pending capture resolved or `timeout` elapsed.
    pub fn wait_generation(&mut self, timeout: Duration) -> MemeResult<&GenerationStatus> {
        let deadline = Instant::now() + timeout;
        while self.pending > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.worker.wait_completion(left) {
                Ok(done) => self.complete(done),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(MemeError::capture(format!(
                        "{} capture(s) still pending after {timeout:?}",
                        self.pending
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.fail_pending();
                }
            }
        }
        Ok(&self.status)
    }

    /// Resolve every pending capture as failed once the worker is gone.
    fn fail_pending(&mut self) -> usize {
        let n = std::mem::take(&mut self.pending);
        tracing::error!(pending = n, "capture worker stopped");
        self.status = GenerationStatus::Failed("capture worker stopped".to_string());
        n
    }

    fn complete(&mut self, done: CaptureCompletion) {
        self.pending = self.pending.saturating_sub(1);
        match done.result {
            Ok(uri) => {
                tracing::info!(ticket = done.ticket.0, %uri, "meme generated");
                let aspect_ratio = self.probe.aspect_ratio(&uri);
                self.generated = Some(GeneratedImage {
                    uri: uri.clone(),
                    aspect_ratio,
                });
                self.canvas = None;
                self.gestures.clear();
                self.status = GenerationStatus::Succeeded(uri);
            }
            Err(err) => {
                self.status = GenerationStatus::Failed(err.to_string());
            }
        }
        if self.pending > 0 {
            self.status = GenerationStatus::Capturing {
                pending: self.pending,
            };
        }
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    /// Text shown under the canvas, if any.
    pub fn status_message(&self) -> Option<String> {
        match &self.status {
            GenerationStatus::Idle => None,
            GenerationStatus::Capturing { .. } => Some("Generating your meme...".to_string()),
            GenerationStatus::Succeeded(_) => Some(SUCCESS_MESSAGE.to_string()),
            GenerationStatus::Failed(reason) => Some(format!("Generation failed: {reason}")),
        }
    }

    pub fn generated_image(&self) -> Option<&GeneratedImage> {
        self.generated.as_ref()
    }

    pub fn history(&self) -> &GeneratedImageHistory {
        &self.history
    }

    pub fn is_frozen(&self) -> bool {
        self.pending > 0
    }

    fn ensure_unfrozen(&self) -> MemeResult<()> {
        if self.is_frozen() {
            return Err(MemeError::validation("canvas is frozen while a capture is pending"));
        }
        Ok(())
    }

    fn editable_canvas(&mut self) -> MemeResult<&mut Canvas> {
        self.ensure_unfrozen()?;
        self.canvas
            .as_mut()
            .ok_or_else(|| MemeError::validation("no template selected"))
    }

    fn prune_gestures(&mut self) {
        let Some(canvas) = self.canvas.as_ref() else {
            self.gestures.clear();
            return;
        };
        self.gestures
            .retain(|handle, _| canvas.overlays.get(*handle).is_some());
    }
}
