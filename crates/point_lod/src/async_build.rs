//! One-shot background index builds.
//!
//! Building a multi-million point index takes hundreds of milliseconds, so
//! callers run it off the render thread and poll once per frame.
//!
//! # Flow
//!
//! ```text
//! Render thread                     rayon pool
//! ┌────────────────┐
//! │ start(points)  │────────────────►┌──────────────────┐
//! └────────────────┘                 │ SpatialIndex::   │
//!                                    │   build()        │
//! ┌────────────────┐                 └────────┬─────────┘
//! │ poll_results() │◄─────────────────────────┘
//! │ → set_index()  │
//! └────────────────┘
//! ```
//!
//! A build is never interrupted. [`AsyncIndexBuild::cancel`] only drops the
//! receiving end; the finished index is then discarded.
//!
//! # Usage
//!
//! ```ignore
//! let mut build = AsyncIndexBuild::new();
//! build.start(points, IndexConfig::DEFAULT);
//!
//! // Each frame
//! if let Some(result) = build.poll_results() {
//!     engine.set_index(result?);
//! }
//! ```

use crossbeam_channel::{self as channel, Receiver, TryRecvError};
use tracing::debug;
use web_time::Instant;

use crate::{IndexConfig, IndexError, PointSet, SpatialIndex};

/// Result of one background build.
pub type BuildResult = Result<SpatialIndex, IndexError>;

/// Non-blocking index build on rayon's thread pool.
#[derive(Default)]
pub struct AsyncIndexBuild {
	receiver: Option<Receiver<BuildResult>>,
}

impl AsyncIndexBuild {
	pub fn new() -> Self {
		Self { receiver: None }
	}

	/// Check if a build is running or finished but not yet polled.
	pub fn is_busy(&self) -> bool {
		self.receiver.is_some()
	}

	/// Start building an index over `points`.
	///
	/// Returns `true` if started, `false` if a build is already pending.
	pub fn start(&mut self, points: PointSet, config: IndexConfig) -> bool {
		if self.is_busy() {
			return false;
		}

		let (sender, receiver) = channel::bounded(1);
		self.receiver = Some(receiver);

		rayon::spawn(move || {
			let start = Instant::now();
			let result = SpatialIndex::build(points, config);
			debug!(
				ok = result.is_ok(),
				elapsed_ms = start.elapsed().as_millis() as u64,
				"background index build finished"
			);
			// Receiver dropped = cancelled
			let _ = sender.send(result);
		});

		true
	}

	/// Poll for the result (non-blocking).
	///
	/// Returns `Some` once the build completed, `None` while it is running or
	/// when nothing is pending.
	pub fn poll_results(&mut self) -> Option<BuildResult> {
		let receiver = self.receiver.as_ref()?;

		match receiver.try_recv() {
			Ok(result) => {
				self.receiver = None;
				Some(result)
			}
			Err(TryRecvError::Empty) => None,
			Err(TryRecvError::Disconnected) => {
				self.receiver = None;
				None
			}
		}
	}

	/// Block until the pending build finishes.
	pub fn wait(&mut self) -> Option<BuildResult> {
		let receiver = self.receiver.take()?;
		receiver.recv().ok()
	}

	/// Discard the pending build's result.
	pub fn cancel(&mut self) {
		self.receiver = None;
	}
}
