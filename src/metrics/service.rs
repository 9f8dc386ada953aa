use crate::date_provider::DateProvider;
use crate::error::ProgressError;
use crate::metrics::{DerivedMetrics, compute_metrics};
use crate::store::ProgressStore;
use chrono::FixedOffset;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct ServiceState {
    latest: Option<DerivedMetrics>,
    applied_ticket: u64,
    last_error: Option<String>,
}

/// Fetches a user's attempt history and keeps the most recent metrics snapshot.
///
/// `refetch` may be called from several threads at once. Each call takes a ticket when
/// it begins; its result replaces the cached snapshot only if no later call has already
/// published one.
pub struct MetricsService {
    user_id: String,
    store: Arc<dyn ProgressStore>,
    clock: Arc<dyn DateProvider>,
    offset: FixedOffset,
    next_ticket: AtomicU64,
    mounted: AtomicBool,
    state: Mutex<ServiceState>,
}

impl MetricsService {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn ProgressStore>,
        clock: Arc<dyn DateProvider>,
        offset: FixedOffset,
    ) -> Self {
        MetricsService {
            user_id: user_id.into(),
            store,
            clock,
            offset,
            next_ticket: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
            state: Mutex::new(ServiceState::default()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn refetch(&self) -> Result<DerivedMetrics, ProgressError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        match self.store.quiz_attempts(&self.user_id, None) {
            Ok(attempts) => {
                let now = self.clock.get_current_time().with_timezone(&self.offset);
                let metrics = compute_metrics(&self.user_id, &attempts, &now);
                self.publish(ticket, |state| {
                    state.latest = Some(metrics.clone());
                    state.last_error = None;
                });
                Ok(metrics)
            }
            Err(source) => {
                let err = ProgressError::Fetch {
                    user_id: self.user_id.clone(),
                    source,
                };
                warn!("{}: {}", err, describe_source(&err));
                let message = err.to_string();
                self.publish(ticket, |state| state.last_error = Some(message));
                Err(err)
            }
        }
    }

    /// Most recently published snapshot
    pub fn latest(&self) -> Option<DerivedMetrics> {
        self.state().latest.clone()
    }

    /// Message of the failure published most recently, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Stop publishing: fetches still in flight complete but their results are dropped
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    fn publish(&self, ticket: u64, apply: impl FnOnce(&mut ServiceState)) {
        if !self.is_mounted() {
            debug!("Dropping metrics fetch {} for {}: unmounted", ticket, self.user_id);
            return;
        }
        let mut state = self.state();
        if ticket < state.applied_ticket {
            debug!(
                "Dropping metrics fetch {} for {}: {} already applied",
                ticket, self.user_id, state.applied_ticket
            );
            return;
        }
        state.applied_ticket = ticket;
        apply(&mut state);
    }

    fn state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn describe_source(err: &ProgressError) -> String {
    std::error::Error::source(err)
        .map(|source| source.to_string())
        .unwrap_or_default()
}
