//! Serialized inference worker.
//!
//! Backends are `Send` but not `Sync`, so a single owner thread runs all
//! inference. Callers submit pixel buffers over a channel and block on a
//! per-job reply channel with a deadline; requests queue behind each other
//! rather than contending for the model.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawDetection;

struct InferenceJob {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    reply: mpsc::Sender<Result<Vec<RawDetection>>>,
}

/// Handle to the inference thread. Dropping it drains the queue and joins.
pub struct InferenceWorker {
    jobs: Option<mpsc::Sender<InferenceJob>>,
    join: Option<JoinHandle<()>>,
}

impl InferenceWorker {
    /// Move `backend` onto a dedicated thread and start serving jobs.
    pub fn spawn(mut backend: Box<dyn DetectorBackend>) -> Result<Self> {
        let (jobs, queue) = mpsc::channel::<InferenceJob>();
        let join = thread::Builder::new()
            .name("inference".into())
            .spawn(move || {
                log::info!("inference worker started (backend {})", backend.name());
                if let Err(err) = backend.warm_up() {
                    log::warn!("backend warm-up failed: {:#}", err);
                }
                while let Ok(job) = queue.recv() {
                    let result = backend.detect(&job.pixels, job.width, job.height);
                    // Caller may have timed out and dropped its receiver.
                    let _ = job.reply.send(result);
                }
                log::debug!("inference worker exiting");
            })
            .context("failed to spawn inference thread")?;

        Ok(Self {
            jobs: Some(jobs),
            join: Some(join),
        })
    }

    /// Run one detection, waiting at most `timeout` for the result.
    ///
    /// A timeout abandons this job's reply but leaves the worker running;
    /// the in-flight inference still completes on the worker thread.
    pub fn infer(
        &self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        timeout: Duration,
    ) -> Result<Vec<RawDetection>> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| anyhow!("inference worker is stopped"))?;
        let (reply_tx, reply_rx) = mpsc::channel();
        jobs.send(InferenceJob {
            pixels,
            width,
            height,
            reply: reply_tx,
        })
        .map_err(|_| anyhow!("inference worker is gone"))?;

        match reply_rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(anyhow!("inference timed out after {:?}", timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(anyhow!("inference worker crashed")),
        }
    }
}

impl Drop for InferenceWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.jobs.take();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::StubBackend;

    struct SlowBackend;

    impl DetectorBackend for SlowBackend {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn detect(&mut self, _pixels: &[u8], _w: u32, _h: u32) -> Result<Vec<RawDetection>> {
            thread::sleep(Duration::from_millis(200));
            Ok(Vec::new())
        }
    }

    struct FailingBackend;

    impl DetectorBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn detect(&mut self, _p: &[u8], _w: u32, _h: u32) -> Result<Vec<RawDetection>> {
            Err(anyhow!("sensor on fire"))
        }
    }

    #[test]
    fn worker_runs_jobs_on_its_own_thread() -> Result<()> {
        let worker = InferenceWorker::spawn(Box::new(StubBackend::new()))?;
        let detections = worker.infer(vec![0u8; 12], 2, 2, Duration::from_secs(5))?;
        assert_eq!(detections.len(), 2);
        Ok(())
    }

    #[test]
    fn slow_inference_times_out() -> Result<()> {
        let worker = InferenceWorker::spawn(Box::new(SlowBackend))?;
        let result = worker.infer(vec![0u8; 12], 2, 2, Duration::from_millis(10));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn backend_errors_propagate_to_the_caller() -> Result<()> {
        let worker = InferenceWorker::spawn(Box::new(FailingBackend))?;
        let result = worker.infer(vec![0u8; 3], 1, 1, Duration::from_secs(5));
        assert!(result.is_err());
        Ok(())
    }
}
