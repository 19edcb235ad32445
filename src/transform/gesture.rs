use std::sync::mpsc;

use crate::transform::state::TransformState;

/// One sample from the external multi-touch recognizer.
///
/// Pan deltas are relative to the start of the current pan; pinch and rotation
/// values are absolute for the current gesture session.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureEvent {
    Pan { dx: f64, dy: f64 },
    PanEnd,
    Pinch { scale: f64 },
    Rotate { radians: f64 },
}

/// Producer half held by the recognizer binding. Sending never blocks.
#[derive(Clone, Debug)]
pub struct GestureSender {
    tx: mpsc::Sender<GestureEvent>,
}

impl GestureSender {
    /// Returns `false` once the inbox has been dropped.
    pub fn send(&self, event: GestureEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer half, drained once per render tick into the overlay's state.
#[derive(Debug)]
pub struct GestureInbox {
    rx: mpsc::Receiver<GestureEvent>,
}

impl GestureInbox {
    /// Apply every queued sample in arrival order; returns how many were applied.
    pub fn drain_into(&self, state: &mut TransformState) -> usize {
        let mut n = 0;
        for event in self.rx.try_iter() {
            state.apply(event);
            n += 1;
        }
        n
    }

    /// Like [`GestureInbox::drain_into`] but discards the samples.
    pub fn discard(&self) -> usize {
        self.rx.try_iter().count()
    }
}

/// Per-overlay gesture stream.
pub fn gesture_channel() -> (GestureSender, GestureInbox) {
    let (tx, rx) = mpsc::channel();
    (GestureSender { tx }, GestureInbox { rx })
}
