use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::canvas::CanvasSnapshot;
use crate::foundation::core::ImageUri;
use crate::foundation::error::{MemeError, MemeResult};
use crate::render::{CaptureOptions, Rasterizer};
use crate::session::history::GeneratedImageHistory;

/// Identifies one requested capture, in request order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureTicket(pub u64);

pub(crate) struct CaptureJob {
    pub(crate) ticket: CaptureTicket,
    pub(crate) scene: CanvasSnapshot,
    pub(crate) opts: CaptureOptions,
    pub(crate) settle: Duration,
}

#[derive(Debug)]
pub(crate) struct CaptureCompletion {
    pub(crate) ticket: CaptureTicket,
    pub(crate) result: MemeResult<ImageUri>,
}

/// Single FIFO thread running captures one at a time.
///
/// Successful captures are appended to the history from this thread, so
/// history order is request order.
pub(crate) struct CaptureWorker {
    jobs: Option<mpsc::Sender<CaptureJob>>,
    done: mpsc::Receiver<CaptureCompletion>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    pub(crate) fn spawn(
        mut rasterizer: Box<dyn Rasterizer>,
        history: GeneratedImageHistory,
    ) -> MemeResult<Self> {
        let (job_tx, job_rx) = mpsc::channel::<CaptureJob>();
        let (done_tx, done_rx) = mpsc::channel::<CaptureCompletion>();

        let thread = std::thread::Builder::new()
            .name("memekit-capture".to_string())
            .spawn(move || {
                for job in job_rx {
                    if !job.settle.is_zero() {
                        std::thread::sleep(job.settle);
                    }
                    let capture = AssertUnwindSafe(|| rasterizer.capture(&job.scene, &job.opts));
                    let result = catch_unwind(capture).unwrap_or_else(|payload| {
                        Err(MemeError::capture(format!(
                            "rasterizer panicked: {}",
                            panic_message(payload.as_ref())
                        )))
                    });
                    match &result {
                        Ok(uri) => history.append(uri.clone()),
                        Err(err) => {
                            tracing::warn!(ticket = job.ticket.0, error = %err, "capture failed")
                        }
                    }
                    let completion = CaptureCompletion {
                        ticket: job.ticket,
                        result,
                    };
                    if done_tx.send(completion).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| MemeError::capture(format!("spawn capture worker: {e}")))?;

        Ok(Self {
            jobs: Some(job_tx),
            done: done_rx,
            thread: Some(thread),
        })
    }

    pub(crate) fn submit(&self, job: CaptureJob) -> MemeResult<()> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| MemeError::capture("capture worker stopped"))?;
        jobs.send(job)
            .map_err(|_| MemeError::capture("capture worker stopped"))
    }

    pub(crate) fn try_completion(&self) -> Result<CaptureCompletion, mpsc::TryRecvError> {
        self.done.try_recv()
    }

    pub(crate) fn wait_completion(
        &self,
        timeout: Duration,
    ) -> Result<CaptureCompletion, mpsc::RecvTimeoutError> {
        self.done.recv_timeout(timeout)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("capture worker panicked");
        }
    }
}
