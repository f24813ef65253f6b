//! The exam session state machine.
//!
//! One engine instance drives at most one session at a time through the
//! phases `Home -> InProgress -> Complete -> Home`. All actions are
//! dispatched through a single transition function together with the
//! caller's current `Instant`; the timer is a logical clock sampled on
//! each externally driven `Tick`, not an independent thread. The only
//! side effect, the one-shot flush to the result sink, happens on entry
//! to `Complete` and is guarded by the session's `flushed` flag.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use uuid::Uuid;

use crate::bank::QuestionBank;
use crate::error::VivaError;
use crate::model::{AnswerRecord, Question, Selection};
use crate::sampler::sample_questions;
use crate::traits::ResultSink;

/// Engine phase, as observed between transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Home,
    InProgress,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Home => f.write_str("home"),
            Phase::InProgress => f.write_str("in progress"),
            Phase::Complete => f.write_str("complete"),
        }
    }
}

/// An externally driven event against the session.
#[derive(Debug, Clone)]
pub enum Action {
    /// Begin a session for the given candidate.
    Start { candidate_id: String },
    /// Move forward one question, clamped at the last index.
    Next,
    /// Move back one question, clamped at zero.
    Back,
    /// Record (or revise) the answer slot at `index`.
    SelectAnswer { index: usize, label: String },
    /// Sample the clock; forces completion once the duration has elapsed.
    Tick,
    /// Complete the session; only valid on the last question.
    Finish,
    /// Discard the session and return to `Home`. Persisted history is
    /// untouched.
    Reset,
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Action::Start { .. } => "start",
            Action::Next => "next",
            Action::Back => "back",
            Action::SelectAnswer { .. } => "select answer",
            Action::Tick => "tick",
            Action::Finish => "finish",
            Action::Reset => "reset",
        }
    }
}

/// Per-candidate, ephemeral session state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique id for this session, stamped at start.
    pub id: Uuid,
    /// The exam-taker this session belongs to.
    pub candidate_id: String,
    /// The sampled questions, in presentation order. Ids are distinct.
    pub questions: Vec<Question>,
    /// Current position, always within `0..questions.len()`.
    pub position: usize,
    /// One revisable slot per question; `None` until first selected.
    pub answers: Vec<Option<String>>,
    /// When the session started, per the caller's clock.
    pub started_at: Instant,
    /// One-shot guard: set once the rows have reached the sink.
    pub flushed: bool,
}

impl Session {
    /// Remaining time under the given duration, saturating at zero.
    pub fn remaining(&self, now: Instant, duration: Duration) -> Duration {
        duration.saturating_sub(now.duration_since(self.started_at))
    }

    /// Build the finalized rows: exactly one per sampled question, with
    /// the sentinel standing in for unset slots.
    pub fn to_records(&self) -> Vec<AnswerRecord> {
        self.questions
            .iter()
            .zip(&self.answers)
            .map(|(question, slot)| AnswerRecord {
                candidate_id: self.candidate_id.clone(),
                question_id: question.id.clone(),
                selected_option: match slot {
                    Some(label) => Selection::answered(label),
                    None => Selection::NotAnswered,
                },
            })
            .collect()
    }
}

/// Engine tunables from the configuration surface.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of questions sampled per session (N).
    pub questions_per_session: usize,
    /// Wall-clock budget for one session.
    pub duration: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            questions_per_session: 5,
            duration: Duration::from_secs(300),
        }
    }
}

enum State {
    Home,
    InProgress(Session),
    Complete(Session),
}

/// The exam state machine. Single-occupancy: one session per engine, all
/// actions serialized against it.
pub struct SessionEngine<R: Rng> {
    bank: Arc<QuestionBank>,
    sink: Arc<dyn ResultSink>,
    config: SessionConfig,
    rng: R,
    state: State,
}

impl<R: Rng> SessionEngine<R> {
    pub fn new(
        bank: Arc<QuestionBank>,
        sink: Arc<dyn ResultSink>,
        config: SessionConfig,
        rng: R,
    ) -> Self {
        Self {
            bank,
            sink,
            config,
            rng,
            state: State::Home,
        }
    }

    /// The single transition function. `now` is the logical clock sample
    /// for this event. Invalid (phase, action) pairs fail with a
    /// `Validation` error and leave the state untouched.
    pub async fn dispatch(&mut self, action: Action, now: Instant) -> Result<Phase, VivaError> {
        match (self.phase(), action) {
            (Phase::Home, Action::Start { candidate_id }) => self.start(candidate_id, now),

            (Phase::InProgress, Action::Next) => {
                let session = self.in_progress_mut();
                session.position = (session.position + 1).min(session.questions.len() - 1);
                Ok(Phase::InProgress)
            }
            (Phase::InProgress, Action::Back) => {
                let session = self.in_progress_mut();
                session.position = session.position.saturating_sub(1);
                Ok(Phase::InProgress)
            }
            (Phase::InProgress, Action::SelectAnswer { index, label }) => {
                let session = self.in_progress_mut();
                let question = session.questions.get(index).ok_or_else(|| {
                    VivaError::Validation(format!(
                        "question index {index} is out of range (0..{})",
                        session.questions.len()
                    ))
                })?;
                if !question.has_option(&label) {
                    return Err(VivaError::Validation(format!(
                        "'{label}' is not an option for question {}",
                        question.id
                    )));
                }
                session.answers[index] = Some(label.to_ascii_uppercase());
                Ok(Phase::InProgress)
            }
            (Phase::InProgress, Action::Tick) => {
                let duration = self.config.duration;
                let session = self.in_progress_mut();
                if session.remaining(now, duration) == Duration::ZERO {
                    tracing::info!(session = %session.id, "time expired, forcing completion");
                    self.complete().await
                } else {
                    Ok(Phase::InProgress)
                }
            }
            (Phase::InProgress, Action::Finish) => {
                let session = self.in_progress_mut();
                if session.position != session.questions.len() - 1 {
                    return Err(VivaError::Validation(
                        "finish is only available on the last question".into(),
                    ));
                }
                self.complete().await
            }

            // Redundant delivery of the completion trigger: re-run the
            // idempotent entry handler. This is also the retry path after
            // a failed flush.
            (Phase::Complete, Action::Tick) | (Phase::Complete, Action::Finish) => {
                self.complete().await
            }
            (Phase::Complete, Action::Reset) => {
                if let Some(session) = self.session() {
                    tracing::info!(session = %session.id, "session reset");
                }
                self.state = State::Home;
                Ok(Phase::Home)
            }

            (phase, action) => Err(VivaError::Validation(format!(
                "'{}' is not valid while the session is {phase}",
                action.describe()
            ))),
        }
    }

    /// The live session while in progress. Callers hold the phase
    /// invariant; reaching this in any other phase is a bug.
    fn in_progress_mut(&mut self) -> &mut Session {
        match &mut self.state {
            State::InProgress(session) => session,
            _ => unreachable!("in_progress_mut outside InProgress"),
        }
    }

    fn start(&mut self, candidate_id: String, now: Instant) -> Result<Phase, VivaError> {
        let candidate_id = candidate_id.trim().to_string();
        if candidate_id.is_empty() {
            return Err(VivaError::Validation("candidate id cannot be blank".into()));
        }
        let n = self.config.questions_per_session;
        if n == 0 {
            return Err(VivaError::Validation(
                "questions per session must be at least 1".into(),
            ));
        }

        let questions = sample_questions(&self.bank, n, &mut self.rng)?;
        let session = Session {
            id: Uuid::new_v4(),
            candidate_id,
            answers: vec![None; questions.len()],
            questions,
            position: 0,
            started_at: now,
            flushed: false,
        };
        tracing::info!(
            session = %session.id,
            candidate = %session.candidate_id,
            questions = n,
            "session started"
        );
        self.state = State::InProgress(session);
        Ok(Phase::InProgress)
    }

    /// Entry action for `Complete`: flush exactly once. Safe to re-run;
    /// once `flushed` is set this is a no-op, and a failed append leaves
    /// the session intact for retry.
    async fn complete(&mut self) -> Result<Phase, VivaError> {
        // The phase changes first; the flush guard lives on the session.
        self.state = match std::mem::replace(&mut self.state, State::Home) {
            State::InProgress(session) | State::Complete(session) => State::Complete(session),
            State::Home => State::Home,
        };

        let State::Complete(session) = &self.state else {
            return Err(VivaError::Validation(
                "no session is ready to complete".into(),
            ));
        };
        if session.flushed {
            return Ok(Phase::Complete);
        }

        let rows = session.to_records();
        let session_id = session.id;
        let sink = Arc::clone(&self.sink);
        if let Err(e) = sink.append(&rows).await {
            tracing::warn!(session = %session_id, error = %e, "flush failed, answers retained");
            return Err(VivaError::Persistence(e.to_string()));
        }

        if let State::Complete(session) = &mut self.state {
            session.flushed = true;
            tracing::info!(session = %session.id, rows = rows.len(), "answers flushed");
        }
        Ok(Phase::Complete)
    }

    pub fn phase(&self) -> Phase {
        match &self.state {
            State::Home => Phase::Home,
            State::InProgress(_) => Phase::InProgress,
            State::Complete(_) => Phase::Complete,
        }
    }

    /// The live session, if any.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            State::Home => None,
            State::InProgress(s) | State::Complete(s) => Some(s),
        }
    }

    /// The question at the current position, while in progress.
    pub fn current_question(&self) -> Option<&Question> {
        match &self.state {
            State::InProgress(s) => s.questions.get(s.position),
            _ => None,
        }
    }

    /// Remaining time as of `now`, while in progress.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            State::InProgress(s) => Some(s.remaining(now, self.config.duration)),
            _ => None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    /// In-crate test sink recording rows and append calls, with a
    /// one-shot failure switch.
    struct RecordingSink {
        rows: Mutex<Vec<AnswerRecord>>,
        append_calls: AtomicU32,
        fail_next: AtomicBool,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                rows: Mutex::new(Vec::new()),
                append_calls: AtomicU32::new(0),
                fail_next: AtomicBool::new(false),
            })
        }

        fn rows(&self) -> Vec<AnswerRecord> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResultSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn append(&self, rows: &[AnswerRecord]) -> anyhow::Result<()> {
            self.append_calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_next.swap(false, Ordering::Relaxed) {
                anyhow::bail!("sink unreachable");
            }
            self.rows.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }

        async fn read_all(&self) -> anyhow::Result<Vec<AnswerRecord>> {
            Ok(self.rows())
        }
    }

    fn bank_of(n: usize) -> Arc<QuestionBank> {
        let questions: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    r#"{{"id": "Q{i}", "question": "prompt {i}", "options": {{"A": "x", "B": "y", "C": "z"}}, "answer": "A"}}"#
                )
            })
            .collect();
        let doc = format!(r#"{{"All": [{}]}}"#, questions.join(","));
        Arc::new(QuestionBank::from_json_str(&doc).unwrap())
    }

    fn engine(
        bank_size: usize,
        n: usize,
        duration: Duration,
    ) -> (SessionEngine<StdRng>, Arc<RecordingSink>) {
        let sink = RecordingSink::new();
        let engine = SessionEngine::new(
            bank_of(bank_size),
            sink.clone(),
            SessionConfig {
                questions_per_session: n,
                duration,
            },
            StdRng::seed_from_u64(11),
        );
        (engine, sink)
    }

    fn start(candidate: &str) -> Action {
        Action::Start {
            candidate_id: candidate.into(),
        }
    }

    #[tokio::test]
    async fn start_samples_distinct_questions_and_empty_slots() {
        let (mut engine, _) = engine(10, 5, Duration::from_secs(300));
        let t0 = Instant::now();
        let phase = engine.dispatch(start("E001"), t0).await.unwrap();
        assert_eq!(phase, Phase::InProgress);

        let session = engine.session().unwrap();
        assert_eq!(session.candidate_id, "E001");
        assert_eq!(session.position, 0);
        assert_eq!(session.questions.len(), 5);
        assert!(session.answers.iter().all(Option::is_none));
        assert!(!session.flushed);

        let ids: HashSet<&str> = session.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn start_rejects_blank_candidate() {
        let (mut engine, _) = engine(10, 5, Duration::from_secs(300));
        let err = engine.dispatch(start("   "), Instant::now()).await.unwrap_err();
        assert!(matches!(err, VivaError::Validation(_)));
        assert_eq!(engine.phase(), Phase::Home);
    }

    #[tokio::test]
    async fn start_rejects_undersized_bank() {
        let (mut engine, _) = engine(3, 5, Duration::from_secs(300));
        let err = engine
            .dispatch(start("E001"), Instant::now())
            .await
            .unwrap_err();
        assert!(matches!(err, VivaError::Validation(_)));
        assert_eq!(engine.phase(), Phase::Home);
    }

    #[tokio::test]
    async fn next_and_back_clamp_at_the_bounds() {
        let (mut engine, _) = engine(10, 3, Duration::from_secs(300));
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();

        engine.dispatch(Action::Back, t0).await.unwrap();
        assert_eq!(engine.session().unwrap().position, 0);

        for _ in 0..5 {
            engine.dispatch(Action::Next, t0).await.unwrap();
        }
        assert_eq!(engine.session().unwrap().position, 2);

        engine.dispatch(Action::Back, t0).await.unwrap();
        assert_eq!(engine.session().unwrap().position, 1);
    }

    #[tokio::test]
    async fn answers_are_revisable_before_completion() {
        let (mut engine, _) = engine(10, 3, Duration::from_secs(300));
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();

        engine
            .dispatch(
                Action::SelectAnswer {
                    index: 0,
                    label: "a".into(),
                },
                t0,
            )
            .await
            .unwrap();
        assert_eq!(engine.session().unwrap().answers[0].as_deref(), Some("A"));

        engine
            .dispatch(
                Action::SelectAnswer {
                    index: 0,
                    label: "C".into(),
                },
                t0,
            )
            .await
            .unwrap();
        assert_eq!(engine.session().unwrap().answers[0].as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn select_answer_validates_index_and_label() {
        let (mut engine, _) = engine(10, 3, Duration::from_secs(300));
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();

        let err = engine
            .dispatch(
                Action::SelectAnswer {
                    index: 9,
                    label: "A".into(),
                },
                t0,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VivaError::Validation(_)));

        let err = engine
            .dispatch(
                Action::SelectAnswer {
                    index: 0,
                    label: "Z".into(),
                },
                t0,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VivaError::Validation(_)));
        assert!(engine.session().unwrap().answers[0].is_none());
    }

    #[tokio::test]
    async fn finish_requires_the_last_position() {
        let (mut engine, sink) = engine(10, 3, Duration::from_secs(300));
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();

        let err = engine.dispatch(Action::Finish, t0).await.unwrap_err();
        assert!(matches!(err, VivaError::Validation(_)));
        assert_eq!(engine.phase(), Phase::InProgress);

        engine.dispatch(Action::Next, t0).await.unwrap();
        engine.dispatch(Action::Next, t0).await.unwrap();
        let phase = engine.dispatch(Action::Finish, t0).await.unwrap();
        assert_eq!(phase, Phase::Complete);
        assert_eq!(sink.rows().len(), 3);
    }

    #[tokio::test]
    async fn flush_writes_one_row_per_question_with_sentinel() {
        let (mut engine, sink) = engine(10, 3, Duration::from_secs(300));
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();
        engine
            .dispatch(
                Action::SelectAnswer {
                    index: 1,
                    label: "b".into(),
                },
                t0,
            )
            .await
            .unwrap();
        engine.dispatch(Action::Next, t0).await.unwrap();
        engine.dispatch(Action::Next, t0).await.unwrap();
        engine.dispatch(Action::Finish, t0).await.unwrap();

        let rows = sink.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.candidate_id == "E001"));
        assert_eq!(rows[0].selected_option, Selection::NotAnswered);
        assert_eq!(rows[1].selected_option, Selection::answered("B"));
        assert_eq!(rows[2].selected_option, Selection::NotAnswered);
    }

    #[tokio::test]
    async fn timer_expiry_forces_completion_mid_session() {
        let duration = Duration::from_secs(300);
        let (mut engine, sink) = engine(10, 5, duration);
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();

        // A tick inside the budget changes nothing.
        let phase = engine
            .dispatch(Action::Tick, t0 + Duration::from_secs(299))
            .await
            .unwrap();
        assert_eq!(phase, Phase::InProgress);

        // Expiry completes regardless of position or unanswered slots.
        let phase = engine.dispatch(Action::Tick, t0 + duration).await.unwrap();
        assert_eq!(phase, Phase::Complete);
        let rows = sink.rows();
        assert_eq!(rows.len(), 5);
        assert!(rows
            .iter()
            .all(|r| r.selected_option == Selection::NotAnswered));
    }

    #[tokio::test]
    async fn duplicate_completion_triggers_are_noops() {
        let (mut engine, sink) = engine(10, 2, Duration::from_secs(300));
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();
        engine.dispatch(Action::Next, t0).await.unwrap();
        engine.dispatch(Action::Finish, t0).await.unwrap();

        // A stale tick and a repeated finish arrive after completion.
        engine
            .dispatch(Action::Tick, t0 + Duration::from_secs(301))
            .await
            .unwrap();
        engine.dispatch(Action::Finish, t0).await.unwrap();

        assert_eq!(sink.rows().len(), 2, "no duplicate rows");
        assert_eq!(sink.append_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn failed_flush_retains_answers_for_retry() {
        let (mut engine, sink) = engine(10, 2, Duration::from_secs(300));
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();
        engine
            .dispatch(
                Action::SelectAnswer {
                    index: 0,
                    label: "A".into(),
                },
                t0,
            )
            .await
            .unwrap();
        engine.dispatch(Action::Next, t0).await.unwrap();

        sink.fail_next.store(true, Ordering::Relaxed);
        let err = engine.dispatch(Action::Finish, t0).await.unwrap_err();
        assert!(matches!(err, VivaError::Persistence(_)));
        assert_eq!(engine.phase(), Phase::Complete);
        assert!(!engine.session().unwrap().flushed);
        assert!(sink.rows().is_empty());

        // The retry delivers the same row set exactly once.
        engine.dispatch(Action::Finish, t0).await.unwrap();
        assert!(engine.session().unwrap().flushed);
        assert_eq!(sink.rows().len(), 2);
        assert_eq!(sink.append_calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn reset_returns_home_without_touching_history() {
        let (mut engine, sink) = engine(10, 2, Duration::from_secs(300));
        let t0 = Instant::now();
        engine.dispatch(start("E001"), t0).await.unwrap();
        engine.dispatch(Action::Next, t0).await.unwrap();
        engine.dispatch(Action::Finish, t0).await.unwrap();

        let phase = engine.dispatch(Action::Reset, t0).await.unwrap();
        assert_eq!(phase, Phase::Home);
        assert!(engine.session().is_none());
        assert_eq!(sink.rows().len(), 2, "history survives reset");
    }

    #[tokio::test]
    async fn phase_gates_reject_out_of_order_actions() {
        let (mut engine, _) = engine(10, 2, Duration::from_secs(300));
        let t0 = Instant::now();

        for action in [Action::Next, Action::Finish, Action::Reset, Action::Tick] {
            let err = engine.dispatch(action, t0).await.unwrap_err();
            assert!(matches!(err, VivaError::Validation(_)));
        }

        engine.dispatch(start("E001"), t0).await.unwrap();
        let err = engine.dispatch(start("E002"), t0).await.unwrap_err();
        assert!(matches!(err, VivaError::Validation(_)));

        engine.dispatch(Action::Next, t0).await.unwrap();
        engine.dispatch(Action::Finish, t0).await.unwrap();
        let err = engine
            .dispatch(
                Action::SelectAnswer {
                    index: 0,
                    label: "A".into(),
                },
                t0,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VivaError::Validation(_)));
    }

    #[tokio::test]
    async fn remaining_time_is_sampled_from_the_clock() {
        let (mut engine, _) = engine(10, 2, Duration::from_secs(300));
        let t0 = Instant::now();
        assert!(engine.remaining(t0).is_none());

        engine.dispatch(start("E001"), t0).await.unwrap();
        assert_eq!(
            engine.remaining(t0 + Duration::from_secs(100)),
            Some(Duration::from_secs(200))
        );
        assert_eq!(
            engine.remaining(t0 + Duration::from_secs(400)),
            Some(Duration::ZERO)
        );
    }
}
