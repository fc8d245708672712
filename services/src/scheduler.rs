//! Periodic background work: window generation and the overdue sweep.
//!
//! The scheduler is an explicit service owned by the process entry point:
//! `start()` spawns the workers, `stop()` shuts them down via a watch
//! channel. Both periodic bodies are exposed as plain async methods
//! (`generate_upcoming`, `sweep_overdue`) so tests drive them directly
//! instead of sleeping through timer ticks.

use crate::error::ServiceError;
use crate::evaluation_service::{CreateDefinition, EvaluationService};
use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// The single authoritative set of scheduling constants.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Cadence of the overdue-attempt sweep.
    pub sweep_interval: Duration,
    /// Cadence of the window-generation pass.
    pub generation_interval: Duration,
    pub window_duration_minutes: i64,
    /// Weekly cadence: windows open on this weekday at `window_time` UTC.
    pub window_weekday: Weekday,
    pub window_time: NaiveTime,
    /// How many future windows to keep materialized.
    pub upcoming_windows: usize,
    pub mcq_per_window: usize,
    pub coding_per_window: usize,
}

impl SchedulerConfig {
    pub fn from_config() -> Self {
        let weekday =
            Weekday::from_str(&util::config::window_weekday()).unwrap_or(Weekday::Fri);
        let hour = util::config::window_hour().min(23);
        Self {
            sweep_interval: Duration::from_secs(util::config::sweep_interval_secs().max(1)),
            generation_interval: Duration::from_secs(
                util::config::window_generation_interval_secs().max(1),
            ),
            window_duration_minutes: util::config::window_duration_minutes(),
            window_weekday: weekday,
            window_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN),
            upcoming_windows: util::config::upcoming_windows(),
            mcq_per_window: util::config::mcq_per_window(),
            coding_per_window: util::config::coding_per_window(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(600),
            generation_interval: Duration::from_secs(3600),
            window_duration_minutes: 60,
            window_weekday: Weekday::Fri,
            window_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            upcoming_windows: 2,
            mcq_per_window: 3,
            coding_per_window: 2,
        }
    }
}

pub struct Scheduler {
    service: Arc<EvaluationService>,
    config: SchedulerConfig,
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(service: Arc<EvaluationService>, config: SchedulerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            service,
            config,
            shutdown,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the two periodic workers. A second call while running is a
    /// no-op.
    pub async fn start(&self) {
        let mut handles = self.handles.lock().await;
        if !handles.is_empty() {
            return;
        }

        {
            let service = self.service.clone();
            let config = self.config.clone();
            let mut shutdown = self.shutdown.subscribe();
            handles.push(tokio::spawn(async move {
                let mut ticker = interval(config.generation_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            match generate_upcoming(&service, &config).await {
                                Ok(created) if created > 0 => {
                                    log::info!("materialized {} upcoming evaluation window(s)", created)
                                }
                                Ok(_) => {}
                                Err(err) => log::warn!("window generation pass failed: {}", err),
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            }));
        }

        {
            let service = self.service.clone();
            let mut shutdown = self.shutdown.subscribe();
            let sweep_interval = self.config.sweep_interval;
            handles.push(tokio::spawn(async move {
                let mut ticker = interval(sweep_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            match sweep_overdue(&service).await {
                                Ok(forced) if forced > 0 => {
                                    log::info!("force-completed {} overdue attempt(s)", forced)
                                }
                                Ok(_) => {}
                                Err(err) => log::warn!("overdue sweep failed: {}", err),
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            }));
        }
    }

    /// Signals both workers and waits for them to finish.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    /// One window-generation pass; returns how many windows were created.
    pub async fn generate_upcoming(&self) -> Result<usize, ServiceError> {
        generate_upcoming(&self.service, &self.config).await
    }

    /// One sweep pass; returns how many attempts were force-completed.
    pub async fn sweep_overdue(&self) -> Result<usize, ServiceError> {
        sweep_overdue(&self.service).await
    }
}

/// Materializes the next N weekly windows that do not exist yet.
/// Existence is checked right before writing; a duplicate firing sees the
/// covered dates and skips them silently.
async fn generate_upcoming(
    service: &EvaluationService,
    config: &SchedulerConfig,
) -> Result<usize, ServiceError> {
    let definitions = service.store().definitions().await?;
    let mut created = 0;
    for start in upcoming_window_starts(config, Utc::now()) {
        let date = start.date_naive();
        if definitions.iter().any(|d| d.covers_date(date)) {
            continue;
        }
        match service
            .create_definition(CreateDefinition {
                scheduled_start: start,
                duration_minutes: config.window_duration_minutes,
                mcq_count: config.mcq_per_window,
                coding_count: config.coding_per_window,
            })
            .await
        {
            Ok(_) => created += 1,
            Err(err) => {
                // One failed date never blocks the others.
                log::warn!("failed to create evaluation window for {}: {}", date, err);
            }
        }
    }
    Ok(created)
}

/// Force-completes every in-progress attempt whose deadline has passed.
/// Losing the completion race to a user-driven `complete` is a no-op.
async fn sweep_overdue(service: &EvaluationService) -> Result<usize, ServiceError> {
    let store = service.store();
    let attempts = store.in_progress_attempts().await?;
    let now = Utc::now();
    let mut forced = 0;
    for attempt in attempts {
        let definition = match store.definition(attempt.definition_id).await {
            Ok(definition) => definition,
            Err(err) => {
                log::warn!("skipping attempt {}: {}", attempt.id, err);
                continue;
            }
        };
        if now <= attempt.deadline(definition.duration_minutes) {
            continue;
        }
        match service.force_complete(attempt.id).await {
            // penalty_applied tells us the forced write actually won.
            Ok(record) if record.penalty_applied => {
                forced += 1;
                log::info!(
                    "force-completed overdue attempt {} at {:.1}%",
                    attempt.id,
                    record.score_percentage
                );
            }
            Ok(_) => {
                log::debug!(
                    "attempt {} was completed by the user before the sweep reached it",
                    attempt.id
                );
            }
            Err(ServiceError::AttemptNotInProgress) | Err(ServiceError::AlreadyCompleted) => {
                log::debug!("attempt {} completed concurrently; skipping", attempt.id);
            }
            Err(err) => {
                log::warn!("failed to force-complete attempt {}: {}", attempt.id, err);
            }
        }
    }
    Ok(forced)
}

/// The next `upcoming_windows` occurrences of the weekly cadence strictly
/// after `from`.
fn upcoming_window_starts(config: &SchedulerConfig, from: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::with_capacity(config.upcoming_windows);
    let mut date = from.date_naive();
    while starts.len() < config.upcoming_windows {
        if date.weekday() == config.window_weekday {
            let start = date.and_time(config.window_time).and_utc();
            if start > from {
                starts.push(start);
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::testing::RecordingNotifier;
    use crate::question_generator::TemplateQuestionGenerator;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use db::models::{Attempt, AttemptState, EvaluationDefinition, EvaluationQuestion, QuestionKind, SubmittedAnswer};
    use db::store::{EvaluationStore, MemoryStore};

    fn scheduler_with(store: Arc<MemoryStore>, config: SchedulerConfig) -> Scheduler {
        let service = Arc::new(EvaluationService::new(
            store,
            Arc::new(TemplateQuestionGenerator),
            Arc::new(RecordingNotifier::default()),
        ));
        Scheduler::new(service, config)
    }

    fn mcq_question(correct: &str) -> EvaluationQuestion {
        EvaluationQuestion::new(
            "Pick one",
            10,
            QuestionKind::Mcq {
                options: vec!["a".into(), correct.into()],
                correct_answer: correct.into(),
            },
        )
    }

    #[test]
    fn upcoming_starts_follow_the_weekly_cadence() {
        let config = SchedulerConfig::default();
        // Monday 2025-06-02 00:00 UTC.
        let from = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let starts = upcoming_window_starts(&config, from);

        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0], Utc.with_ymd_and_hms(2025, 6, 6, 17, 0, 0).unwrap());
        assert_eq!(starts[1], Utc.with_ymd_and_hms(2025, 6, 13, 17, 0, 0).unwrap());
        for start in &starts {
            assert_eq!(start.weekday(), Weekday::Fri);
            assert!(*start > from);
        }
    }

    #[test]
    fn upcoming_starts_skip_todays_elapsed_slot() {
        let config = SchedulerConfig::default();
        // Friday 2025-06-06 at 18:00, one hour after the slot opened.
        let from = Utc.with_ymd_and_hms(2025, 6, 6, 18, 0, 0).unwrap();
        let starts = upcoming_window_starts(&config, from);
        assert_eq!(starts[0], Utc.with_ymd_and_hms(2025, 6, 13, 17, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn generation_is_idempotent_across_passes() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler_with(store.clone(), SchedulerConfig::default());

        let created = scheduler.generate_upcoming().await.unwrap();
        assert_eq!(created, 2);
        assert_eq!(store.definitions().await.unwrap().len(), 2);

        // A duplicate firing sees the covered dates and skips silently.
        let created = scheduler.generate_upcoming().await.unwrap();
        assert_eq!(created, 0);
        assert_eq!(store.definitions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sweep_force_completes_only_overdue_attempts() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler_with(store.clone(), SchedulerConfig::default());

        // Window opened three hours ago with a 60-minute duration.
        let definition = EvaluationDefinition::new(
            Utc::now() - ChronoDuration::hours(3),
            60,
            vec![mcq_question("b")],
        );
        store.insert_definition(definition.clone()).await.unwrap();

        // Overdue attempt: started two hours ago, answered correctly,
        // never completed.
        let mut overdue = Attempt::start(1, definition.id);
        overdue.started_at = Utc::now() - ChronoDuration::hours(2);
        overdue.answers.insert(
            definition.questions[0].id,
            SubmittedAnswer {
                answer: "b".into(),
                language: None,
                submitted_at: overdue.started_at,
            },
        );
        let overdue = store.create_attempt(overdue).await.unwrap();

        // Fresh attempt by another user, still inside its window.
        let fresh = store
            .create_attempt(Attempt::start(2, definition.id))
            .await
            .unwrap();

        let forced = scheduler.sweep_overdue().await.unwrap();
        assert_eq!(forced, 1);

        let swept = store.attempt(overdue.id).await.unwrap();
        assert_eq!(swept.state, AttemptState::AutoSubmitted);
        // 100% minus the 10% late penalty, applied exactly once.
        assert_eq!(swept.score_percentage, Some(90.0));
        assert!(swept.completed_at.unwrap() >= swept.started_at);

        let untouched = store.attempt(fresh.id).await.unwrap();
        assert_eq!(untouched.state, AttemptState::InProgress);

        // Re-sweeping finds nothing left to force.
        let forced = scheduler.sweep_overdue().await.unwrap();
        assert_eq!(forced, 0);
    }

    #[tokio::test]
    async fn sweep_treats_user_completion_as_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler_with(store.clone(), SchedulerConfig::default());

        let definition = EvaluationDefinition::new(
            Utc::now() - ChronoDuration::hours(3),
            60,
            vec![mcq_question("b")],
        );
        store.insert_definition(definition.clone()).await.unwrap();

        let mut attempt = Attempt::start(1, definition.id);
        attempt.started_at = Utc::now() - ChronoDuration::hours(2);
        let attempt = store.create_attempt(attempt).await.unwrap();

        // The user's complete lands first.
        scheduler.service.complete(attempt.id).await.unwrap();

        let forced = scheduler.sweep_overdue().await.unwrap();
        assert_eq!(forced, 0);

        let stored = store.attempt(attempt.id).await.unwrap();
        assert_eq!(stored.state, AttemptState::Completed);
    }

    #[tokio::test]
    async fn start_and_stop_shut_down_cleanly() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler_with(
            store,
            SchedulerConfig {
                sweep_interval: Duration::from_secs(3600),
                generation_interval: Duration::from_secs(3600),
                ..SchedulerConfig::default()
            },
        );

        scheduler.start().await;
        scheduler.stop().await;
    }
}
