//! Background work that must not stall the UI thread: vector document
//! rasterization and the final snapshot capture.
//!
//! Jobs run on plain spawned threads and push their outcome into a
//! shared queue; the app drains the queue once per frame. Outcomes
//! carry enough context for the drain site to apply a stale-write
//! guard (the target may have been deleted while the job ran).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use egui::{Color32, Context};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::config::CanvasConfig;
use crate::element::{Bitmap, DesignElement};
use crate::generator;
use crate::render::snapshot;

#[derive(Debug)]
pub enum JobOutcome {
    /// A rasterized vector document, ready to become an element.
    Document {
        source_name: String,
        result: Result<Bitmap, String>,
    },
    /// The flattened save preview as a PNG data URI.
    Snapshot { result: Result<String, String> },
}

/// Shared handle to the background queue. Cloning is cheap; all clones
/// drain the same results.
#[derive(Clone)]
pub struct JobQueue {
    results: Arc<Mutex<Vec<JobOutcome>>>,
    in_flight: Arc<AtomicUsize>,
    ctx: Context,
}

impl JobQueue {
    pub fn new(ctx: Context) -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            ctx,
        }
    }

    /// True while any job is still running or undrained.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Rasterize SVG bytes off-thread.
    pub fn spawn_document(&self, source_name: String, bytes: Vec<u8>) {
        let queue = self.clone();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        thread::spawn(move || {
            debug!("rasterizing document {source_name}");
            let result = generator::rasterize_svg(&bytes).map_err(|e| e.to_string());
            if let Err(err) = &result {
                warn!("document rasterization failed: {err}");
            }
            queue.push(JobOutcome::Document {
                source_name,
                result,
            });
        });
    }

    /// Flatten the design off-thread. Elements are cloned at spawn
    /// time, so later edits cannot tear the capture.
    pub fn spawn_snapshot(
        &self,
        config: CanvasConfig,
        background: Option<Color32>,
        elements: Vec<DesignElement>,
    ) {
        let queue = self.clone();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        thread::spawn(move || {
            let result =
                snapshot::capture(&config, background, &elements).map_err(|e| e.to_string());
            if let Err(err) = &result {
                warn!("snapshot capture failed: {err}");
            }
            queue.push(JobOutcome::Snapshot { result });
        });
    }

    /// Take all finished outcomes. Called once per frame.
    pub fn drain(&self) -> Vec<JobOutcome> {
        let outcomes = std::mem::take(&mut *self.results.lock());
        if !outcomes.is_empty() {
            self.in_flight.fetch_sub(outcomes.len(), Ordering::SeqCst);
        }
        outcomes
    }

    fn push(&self, outcome: JobOutcome) {
        self.results.lock().push(outcome);
        // Wake the UI so the result is drained promptly.
        self.ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for_outcomes(queue: &JobQueue, count: usize) -> Vec<JobOutcome> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut outcomes = Vec::new();
        while outcomes.len() < count {
            outcomes.extend(queue.drain());
            assert!(Instant::now() < deadline, "job timed out");
            thread::sleep(Duration::from_millis(5));
        }
        outcomes
    }

    #[test]
    fn document_job_rasterizes_svg() {
        let queue = JobQueue::new(Context::default());
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
            <circle cx="5" cy="5" r="4" fill="#000"/>
        </svg>"##;
        queue.spawn_document("logo.svg".to_owned(), svg.to_vec());
        assert!(queue.is_busy());

        let outcomes = wait_for_outcomes(&queue, 1);
        let JobOutcome::Document {
            source_name,
            result,
        } = &outcomes[0]
        else {
            panic!("expected document outcome");
        };
        assert_eq!(source_name, "logo.svg");
        assert!(result.is_ok());
        assert!(!queue.is_busy());
    }

    #[test]
    fn document_job_reports_parse_errors() {
        let queue = JobQueue::new(Context::default());
        queue.spawn_document("broken.svg".to_owned(), b"not an svg".to_vec());
        let outcomes = wait_for_outcomes(&queue, 1);
        let JobOutcome::Document { result, .. } = &outcomes[0] else {
            panic!("expected document outcome");
        };
        assert!(result.is_err());
    }

    #[test]
    fn snapshot_job_returns_data_uri() {
        let queue = JobQueue::new(Context::default());
        let config = CanvasConfig::new(40.0, 20.0);
        let elements = vec![generator::new_text(&config)];
        queue.spawn_snapshot(config, None, elements);

        let outcomes = wait_for_outcomes(&queue, 1);
        let JobOutcome::Snapshot { result } = &outcomes[0] else {
            panic!("expected snapshot outcome");
        };
        assert!(result.as_ref().unwrap().starts_with("data:image/png;base64,"));
    }
}
