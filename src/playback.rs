//! Playback Queue Manager
//!
//! An ordered, cancellable queue of synthesized utterances drained by a single
//! background worker thread. The queue, the `playback_enabled` gate and the
//! cancellation generation live under one mutex, so enqueue, interrupt, pause
//! and resume are atomic with respect to the worker.
//!
//! Every artifact is released exactly once: by the worker after it finished
//! (or was cancelled mid-play), or by whoever discarded it from the queue.

use crate::audio::AudioOutput;
use crate::error::{VoiceError, VoiceResult};
use crate::session::Settings;
use crate::tts::{Artifact, Synthesizer};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the worker checks whether the device finished
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Delay before the single retry of a failed release
const RELEASE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Opaque token identifying a playback request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Queued behind whatever is already pending
    Normal,
    /// Stops current playback and replaces the whole queue
    Interrupt,
}

/// A spoken response waiting to be played
#[derive(Debug)]
pub struct PlaybackRequest {
    pub id: RequestId,
    pub artifact: Artifact,
    pub priority: Priority,
    /// Settings as they were when the request was made
    pub settings: Settings,
    pub text: String,
}

impl PlaybackRequest {
    /// Content that keeps replaying while loop mode was on at enqueue time
    fn loops(&self) -> bool {
        self.settings.loop_enabled && self.priority == Priority::Interrupt
    }
}

/// A view of a queued request for inspection
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedRequest {
    pub id: RequestId,
    pub priority: Priority,
    pub text: String,
}

struct QueueState {
    pending: VecDeque<PlaybackRequest>,
    playback_enabled: bool,
    /// Bumped by every cancellation; an in-flight artifact started under an
    /// older generation has been stopped and must be abandoned.
    generation: u64,
    shutdown: bool,
    next_id: u64,
}

struct Shared {
    state: Mutex<QueueState>,
    wake: Condvar,
}

impl Shared {
    /// The queue state stays consistent across a panic elsewhere, so a
    /// poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle to the playback queue and its worker
pub struct PlaybackQueue {
    shared: Arc<Shared>,
    synthesizer: Arc<dyn Synthesizer>,
    output: Arc<dyn AudioOutput>,
    worker: Option<JoinHandle<()>>,
}

impl PlaybackQueue {
    /// Create the queue and start its worker thread
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        output: Arc<dyn AudioOutput>,
    ) -> VoiceResult<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                playback_enabled: true,
                generation: 0,
                shutdown: false,
                next_id: 1,
            }),
            wake: Condvar::new(),
        });

        let worker = Worker {
            shared: Arc::clone(&shared),
            synthesizer: Arc::clone(&synthesizer),
            output: Arc::clone(&output),
        };
        let handle = thread::Builder::new()
            .name("playback-worker".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            shared,
            synthesizer,
            output,
            worker: Some(handle),
        })
    }

    /// Synthesize `text` and queue it for playback.
    ///
    /// An `Interrupt` request first stops playback and discards everything
    /// queued, then becomes the only queue member.
    pub fn enqueue(
        &self,
        text: &str,
        settings: &Settings,
        priority: Priority,
    ) -> VoiceResult<RequestId> {
        if priority == Priority::Interrupt {
            self.stop_all();
        }

        let artifact = self.synthesizer.synthesize(text, settings)?;

        let mut state = self.shared.lock();
        if state.shutdown {
            drop(state);
            release(self.synthesizer.as_ref(), artifact);
            return Err(VoiceError::Audio("playback queue is shut down".to_string()));
        }

        let discarded: Vec<PlaybackRequest> = if priority == Priority::Interrupt {
            state.generation += 1;
            self.output.stop();
            state.pending.drain(..).collect()
        } else {
            Vec::new()
        };

        let id = RequestId(state.next_id);
        state.next_id += 1;
        debug_assert!(
            state.pending.iter().all(|r| r.id != id),
            "duplicate playback request id {:?}",
            id
        );

        debug!("📥 Queued {:?} ({:?}): '{}'", id, priority, text);
        state.pending.push_back(PlaybackRequest {
            id,
            artifact,
            priority,
            settings: *settings,
            text: text.to_string(),
        });
        self.shared.wake.notify_all();
        drop(state);

        self.release_all(discarded);
        Ok(id)
    }

    /// Freeze playback; the worker makes no progress until `resume`
    pub fn pause(&self) {
        let mut state = self.shared.lock();
        if state.playback_enabled {
            info!("⏸️ Playback paused");
            state.playback_enabled = false;
            self.output.pause();
        }
    }

    /// Lift the pause gate and wake the worker
    pub fn resume(&self) {
        let mut state = self.shared.lock();
        if !state.playback_enabled {
            info!("▶️ Playback resumed");
            state.playback_enabled = true;
            self.output.resume();
        }
        self.shared.wake.notify_all();
    }

    /// Stop current playback and discard the whole queue
    pub fn stop_all(&self) {
        let discarded: Vec<PlaybackRequest> = {
            let mut state = self.shared.lock();
            state.generation += 1;
            self.output.stop();
            self.shared.wake.notify_all();
            state.pending.drain(..).collect()
        };

        if !discarded.is_empty() {
            info!("🛑 Discarding {} queued utterance(s)", discarded.len());
        }
        self.release_all(discarded);
    }

    /// Drop one queued request before it plays. Returns false if it is no
    /// longer queued (already playing, played or discarded).
    pub fn cancel(&self, id: RequestId) -> bool {
        let removed = {
            let mut state = self.shared.lock();
            let position = state.pending.iter().position(|r| r.id == id);
            position.and_then(|index| state.pending.remove(index))
        };

        match removed {
            Some(request) => {
                debug!("🗑️ Cancelled queued {:?}", request.id);
                release(self.synthesizer.as_ref(), request.artifact);
                true
            }
            None => false,
        }
    }

    pub fn is_playback_enabled(&self) -> bool {
        self.shared.lock().playback_enabled
    }

    /// Number of requests waiting to be played (the one playing is not counted)
    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Queued requests in playback order
    pub fn snapshot(&self) -> Vec<QueuedRequest> {
        self.shared
            .lock()
            .pending
            .iter()
            .map(|r| QueuedRequest {
                id: r.id,
                priority: r.priority,
                text: r.text.clone(),
            })
            .collect()
    }

    /// Cancel the worker and release everything not yet played. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        let discarded: Vec<PlaybackRequest> = {
            let mut state = self.shared.lock();
            state.shutdown = true;
            state.generation += 1;
            self.output.stop();
            self.shared.wake.notify_all();
            state.pending.drain(..).collect()
        };

        if handle.join().is_err() {
            error!("❌ Playback worker panicked");
        }
        self.release_all(discarded);
        info!("🔇 Playback queue shut down");
    }

    fn release_all(&self, requests: Vec<PlaybackRequest>) {
        for request in requests {
            debug!("🗑️ Discarded {:?}", request.id);
            release(self.synthesizer.as_ref(), request.artifact);
        }
    }
}

impl Drop for PlaybackQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Release an artifact, retrying once after a short delay.
///
/// Consumes the artifact, so no caller can release it twice.
fn release(synthesizer: &dyn Synthesizer, artifact: Artifact) {
    if let Err(first) = synthesizer.release(&artifact) {
        debug!("Release of {:?} failed ({}), retrying", artifact.id(), first);
        thread::sleep(RELEASE_RETRY_DELAY);
        if let Err(e) = synthesizer.release(&artifact) {
            warn!("⚠️ Abandoning artifact {:?}: {}", artifact.path(), e);
        }
    }
}

enum Outcome {
    Finished,
    Cancelled,
    Failed,
}

struct Worker {
    shared: Arc<Shared>,
    synthesizer: Arc<dyn Synthesizer>,
    output: Arc<dyn AudioOutput>,
}

impl Worker {
    fn run(self) {
        debug!("Playback worker started");

        while let Some((request, generation, started)) = self.next_request() {
            let outcome = if started {
                self.wait_for_completion(&request, generation)
            } else {
                Outcome::Failed
            };

            match outcome {
                Outcome::Finished => debug!("✅ Finished {:?}", request.id),
                Outcome::Cancelled => debug!("⏹️ Cancelled {:?}", request.id),
                Outcome::Failed => debug!("Skipped {:?} after a playback error", request.id),
            }
            release(self.synthesizer.as_ref(), request.artifact);
        }

        debug!("Playback worker stopped");
    }

    /// Block until a request can be played, then start it under the lock so a
    /// concurrent interrupt cannot slip in between pop and play.
    fn next_request(&self) -> Option<(PlaybackRequest, u64, bool)> {
        let mut state = self.shared.lock();
        loop {
            if state.shutdown {
                return None;
            }
            if state.playback_enabled {
                if let Some(request) = state.pending.pop_front() {
                    let started = self.start(&request);
                    return Some((request, state.generation, started));
                }
            }
            state = self
                .shared
                .wake
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    fn start(&self, request: &PlaybackRequest) -> bool {
        info!("🗣️ Speaking: '{}'", request.text);
        self.output.set_volume(request.settings.volume);
        match self.output.play(&request.artifact) {
            Ok(()) => true,
            Err(e) => {
                error!("❌ Playback failed for {:?}: {}", request.id, e);
                false
            }
        }
    }

    fn wait_for_completion(&self, request: &PlaybackRequest, generation: u64) -> Outcome {
        let mut state = self.shared.lock();
        loop {
            if state.shutdown || state.generation != generation {
                // Whoever bumped the generation already stopped the device
                return Outcome::Cancelled;
            }

            if !state.playback_enabled {
                state = self
                    .shared
                    .wake
                    .wait(state)
                    .unwrap_or_else(|e| e.into_inner());
                continue;
            }

            if !self.output.is_busy() {
                if request.loops() && state.pending.is_empty() {
                    debug!("🔁 Looping {:?}", request.id);
                    if !self.start(request) {
                        return Outcome::Failed;
                    }
                } else {
                    return Outcome::Finished;
                }
            }

            state = self
                .shared
                .wake
                .wait_timeout(state, POLL_INTERVAL)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }
}
