// ── Frame scheduler ──
//
// Shared animation clock. A single ticker task runs while at least one
// subscription is alive and stops when the last one is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Default frame interval (~60 fps).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// One tick of the animation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// Frames emitted since the ticker last started.
    pub frame: u64,
    pub at: Instant,
}

#[derive(Default)]
struct TickerState {
    subscribers: usize,
    cancel: Option<CancellationToken>,
}

struct SchedulerInner {
    interval: Duration,
    tx: broadcast::Sender<FrameTick>,
    state: Mutex<TickerState>,
}

impl SchedulerInner {
    fn state(&self) -> MutexGuard<'_, TickerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Injectable frame clock. Cheap to clone; clones share one ticker.
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Arc<SchedulerInner>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl FrameScheduler {
    pub fn new(interval: Duration) -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(SchedulerInner {
                interval,
                tx,
                state: Mutex::new(TickerState::default()),
            }),
        }
    }

    /// Register interest in frames. The first live subscription starts
    /// the ticker; must be called from within a Tokio runtime.
    pub fn subscribe(&self) -> FrameSubscription {
        let rx = self.inner.tx.subscribe();
        let mut state = self.inner.state();
        state.subscribers += 1;
        if state.cancel.is_none() {
            let cancel = CancellationToken::new();
            tokio::spawn(ticker(
                self.inner.interval,
                self.inner.tx.clone(),
                cancel.clone(),
            ));
            debug!(interval = ?self.inner.interval, "frame ticker started");
            state.cancel = Some(cancel);
        }
        FrameSubscription {
            rx,
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.state().cancel.is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state().subscribers
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }
}

async fn ticker(interval: Duration, tx: broadcast::Sender<FrameTick>, cancel: CancellationToken) {
    let mut clock = tokio::time::interval(interval);
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frame: u64 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            at = clock.tick() => {
                frame += 1;
                // No receivers between the last drop and cancellation is fine.
                let _ = tx.send(FrameTick { frame, at });
            }
        }
    }
    trace!(frames = frame, "frame ticker stopped");
}

/// A live interest in frames. Dropping it releases the interest.
pub struct FrameSubscription {
    rx: broadcast::Receiver<FrameTick>,
    inner: Arc<SchedulerInner>,
}

impl FrameSubscription {
    /// Wait for the next frame. Frames missed by a slow consumer are
    /// skipped, not queued.
    pub async fn tick(&mut self) -> Option<FrameTick> {
        loop {
            match self.rx.recv().await {
                Ok(tick) => return Some(tick),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for FrameSubscription {
    fn drop(&mut self) {
        let mut state = self.inner.state();
        state.subscribers = state.subscribers.saturating_sub(1);
        if state.subscribers == 0 {
            if let Some(cancel) = state.cancel.take() {
                cancel.cancel();
                debug!("frame ticker released");
            }
        }
    }
}
