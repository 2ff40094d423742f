// Single-flight coordination per subject.
//
// The first caller for a subject spawns the pipeline and parks a shared
// future in the in-flight map; later callers clone that future instead of
// starting new work. The spawned task owns a guard that clears the entry when
// the task ends, whether it returned Ok, Err, or panicked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info};
use tweetrewind_common::{PipelineResult, Subject};

use crate::error::PipelineError;
use crate::fanout::FanoutCoordinator;

type PipelineOutcome = Result<PipelineResult, PipelineError>;
type SharedPipeline = Shared<BoxFuture<'static, PipelineOutcome>>;

struct InFlightEntry {
    id: u64,
    pending: SharedPipeline,
}

#[derive(Default)]
struct CoalescerState {
    next_id: u64,
    in_flight: HashMap<Subject, InFlightEntry>,
}

fn lock(state: &Mutex<CoalescerState>) -> MutexGuard<'_, CoalescerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes its entry on drop, unless a newer entry has replaced it.
struct InFlightGuard {
    state: Arc<Mutex<CoalescerState>>,
    subject: Subject,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if state
            .in_flight
            .get(&self.subject)
            .is_some_and(|entry| entry.id == self.id)
        {
            state.in_flight.remove(&self.subject);
            debug!(subject = %self.subject, "coalescer: entry cleared");
        }
    }
}

pub struct RequestCoalescer {
    coordinator: Arc<FanoutCoordinator>,
    state: Arc<Mutex<CoalescerState>>,
}

impl RequestCoalescer {
    pub fn new(coordinator: Arc<FanoutCoordinator>) -> Self {
        Self {
            coordinator,
            state: Arc::new(Mutex::new(CoalescerState::default())),
        }
    }

    /// Run the pipeline for `subject`, or join the one already running.
    /// Every caller attached to one run sees the same outcome.
    pub async fn request(&self, subject: Subject) -> PipelineOutcome {
        self.attach_or_start(subject).await
    }

    pub fn is_in_flight(&self, subject: &Subject) -> bool {
        lock(&self.state).in_flight.contains_key(subject)
    }

    pub fn in_flight_count(&self) -> usize {
        lock(&self.state).in_flight.len()
    }

    fn attach_or_start(&self, subject: Subject) -> SharedPipeline {
        // Held across check and insert so two callers cannot both start.
        let mut state = lock(&self.state);

        if let Some(entry) = state.in_flight.get(&subject) {
            debug!(subject = %subject, "coalescer: joining in-flight pipeline");
            return entry.pending.clone();
        }

        let id = state.next_id;
        state.next_id += 1;

        let guard = InFlightGuard {
            state: self.state.clone(),
            subject: subject.clone(),
            id,
        };
        let coordinator = self.coordinator.clone();
        let task_subject = subject.clone();
        // Spawned so a caller that goes away does not stop the run.
        let task = tokio::spawn(async move {
            let _guard = guard;
            coordinator.run(&task_subject).await
        });

        let pending = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(PipelineError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        info!(subject = %subject, "coalescer: pipeline started");
        state.in_flight.insert(
            subject,
            InFlightEntry {
                id,
                pending: pending.clone(),
            },
        );
        pending
    }
}
