//! Assistant session engine.
//!
//! Owns the Session, the message log and the satisfaction sub-flow for one
//! widget activation. Callers dispatch intents and render the snapshots the
//! engine publishes after every state change.
//!
//! # Turn lifecycle
//!
//! 1. Take the input lock (a second intent while held is ignored)
//! 2. Stage the user turn as `pending_user_turn`
//! 3. Call the transport
//! 4. Show the typing indicator for the pacing delay
//! 5. Commit the user and bot turns together, update the Session
//!
//! A transport failure at step 3 drops the staged turn and releases the
//! lock; nothing is appended.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

use super::scheduler::{InputGuard, TurnScheduler};
use super::snapshot::{EngineSnapshot, IgnoreReason, TurnOutcome};
use crate::domain::conversation::{
    dispatch, FlowType, InputType, InteractionMode, MessageLog, Session, SessionStatus,
    StepOutcome, Turn, TurnFlags,
};
use crate::domain::foundation::{DialogueSessionId, ValidationError};
use crate::domain::satisfaction::{SatisfactionFlow, SatisfactionSubmission};
use crate::ports::{
    DialogueTransport, PacingPolicy, RespondRequest, SatisfactionRequest, SatisfactionResponse,
    StartRequest, TransportError, TurnResponse,
};

/// Label recorded as the user turn when the user confirms satisfaction.
pub const SATISFIED_LABEL: &str = "Yes, I'm satisfied";

const DEFAULT_USER_AGENT: &str = concat!("rental-assistant/", env!("CARGO_PKG_VERSION"));

/// Errors surfaced to the caller. Local guard rejections are never errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The dialogue call failed; nothing was committed.
    #[error("dialogue transport failed: {0}")]
    Transport(#[from] TransportError),

    /// A response could not be applied to the current state.
    #[error("invalid state: {0}")]
    InvalidState(#[from] ValidationError),
}

impl EngineError {
    /// Returns true if re-offering the same input may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Transport(e) => e.is_retryable(),
            EngineError::InvalidState(_) => false,
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    session: Option<Session>,
    log: MessageLog,
    pending_user_turn: Option<Turn>,
    is_typing: bool,
    satisfaction: Option<SatisfactionFlow>,
}

impl EngineState {
    fn mode(&self) -> InteractionMode {
        match &self.session {
            None => InteractionMode::Blocked,
            Some(session) if !session.is_active() => InteractionMode::Terminal,
            Some(_) => self
                .log
                .last_bot_turn()
                .map(dispatch)
                .unwrap_or(InteractionMode::Blocked),
        }
    }

    fn active_session(&self) -> Result<&Session, IgnoreReason> {
        let session = self.session.as_ref().ok_or(IgnoreReason::NotStarted)?;
        if session.is_active() {
            Ok(session)
        } else {
            Err(IgnoreReason::SessionNotActive)
        }
    }

    /// Stages a user turn answering the latest bot turn.
    fn stage_user_turn(
        &mut self,
        input_type: InputType,
        content: &str,
    ) -> Result<DialogueSessionId, IgnoreReason> {
        let session = self.session.as_ref().ok_or(IgnoreReason::NotStarted)?;
        let turn = Turn::user(session.current_step(), input_type, content)
            .map_err(|_| IgnoreReason::InputNotAccepted)?;
        let session_id = session.session_id().clone();
        tracing::debug!(turn_id = %turn.id(), step = turn.step_number(), "staged user turn");
        self.pending_user_turn = Some(turn);
        Ok(session_id)
    }

    fn stage_response(&mut self, text: &str) -> Result<DialogueSessionId, IgnoreReason> {
        self.active_session()?;
        if !self.mode().accepts(text) {
            return Err(IgnoreReason::InputNotAccepted);
        }
        let input_type = self.prompt_type();
        self.stage_user_turn(input_type, text)
    }

    fn stage_item(&mut self, item_id: &str) -> Result<DialogueSessionId, IgnoreReason> {
        self.active_session()?;
        let mode = self.mode();
        if !matches!(mode, InteractionMode::Results { .. }) {
            return Err(IgnoreReason::InputNotAccepted);
        }
        if mode.item(item_id).is_none() {
            return Err(IgnoreReason::UnknownItem);
        }
        self.stage_user_turn(InputType::StructuredResults, item_id)
    }

    fn stage_satisfied(
        &mut self,
    ) -> Result<(DialogueSessionId, SatisfactionSubmission), IgnoreReason> {
        let submission = self
            .satisfaction
            .as_ref()
            .and_then(|flow| flow.choose_satisfied().ok())
            .ok_or(IgnoreReason::SatisfactionUnavailable)?;
        let session_id = self.stage_user_turn(InputType::Choice, SATISFIED_LABEL)?;
        Ok((session_id, submission))
    }

    fn stage_feedback(
        &mut self,
        text: &str,
    ) -> Result<(DialogueSessionId, SatisfactionSubmission), IgnoreReason> {
        let flow = self
            .satisfaction
            .as_ref()
            .ok_or(IgnoreReason::SatisfactionUnavailable)?;
        let submission = flow.prepare_feedback(text).map_err(|e| match e {
            ValidationError::EmptyField { .. } => IgnoreReason::EmptyFeedback,
            _ => IgnoreReason::SatisfactionUnavailable,
        })?;
        let session_id = self.stage_user_turn(InputType::FreeText, submission.feedback_text())?;
        Ok((session_id, submission))
    }

    fn prompt_type(&self) -> InputType {
        self.log
            .last_bot_turn()
            .map(Turn::input_type)
            .unwrap_or(InputType::FreeText)
    }

    /// Applies a `respond` result and commits the staged and bot turns.
    fn commit_exchange(&mut self, response: &TurnResponse) -> Result<StepOutcome, ValidationError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ValidationError::empty_field("session"))?;
        let outcome = session.apply_step(&response.step_update())?;
        let bot_turn = response.to_bot_turn(session.current_step());

        if outcome == StepOutcome::Completed {
            self.satisfaction = Some(SatisfactionFlow::new());
        }
        if let Some(user_turn) = self.pending_user_turn.take() {
            self.log.append(user_turn);
        }
        self.log.append(bot_turn);
        self.is_typing = false;
        Ok(outcome)
    }

    /// Installs a fresh Session from a `start` result.
    fn commit_session(&mut self, response: &TurnResponse) -> Result<&Session, EngineError> {
        let mut session = Session::start(response.require_session_id()?);
        let outcome = session.apply_step(&response.step_update())?;

        self.log.append(response.to_bot_turn(session.current_step()));
        self.satisfaction = (outcome == StepOutcome::Completed).then(SatisfactionFlow::new);
        self.pending_user_turn = None;
        self.is_typing = false;
        Ok(&*self.session.insert(session))
    }

    /// Closes the satisfaction flow and commits the staged and bot turns.
    fn commit_satisfaction(
        &mut self,
        submission: SatisfactionSubmission,
        response: &SatisfactionResponse,
    ) -> Result<SessionStatus, ValidationError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ValidationError::empty_field("session"))?;
        let flow = self
            .satisfaction
            .as_mut()
            .ok_or_else(|| ValidationError::empty_field("satisfaction"))?;

        flow.close(submission, response.escalated)?;
        if response.escalated {
            session.escalate()?;
        }

        if let Some(user_turn) = self.pending_user_turn.take() {
            self.log.append(user_turn);
        }
        let bot_turn = Turn::bot(
            session.current_step(),
            InputType::TerminalMessage,
            response.message.clone(),
        )
        .with_flags(TurnFlags {
            conversation_completed: true,
            ..Default::default()
        });
        if bot_turn.content().is_some() {
            self.log.append(bot_turn);
        }
        self.is_typing = false;
        Ok(session.status())
    }
}

/// The assistant session engine.
///
/// Intents take `&self`; share the engine behind an `Arc` to dispatch from
/// several tasks. The input lock decides which intent proceeds.
pub struct AssistantEngine {
    transport: Arc<dyn DialogueTransport>,
    scheduler: TurnScheduler,
    user_agent: String,
    state: Mutex<EngineState>,
    snapshots: watch::Sender<EngineSnapshot>,
}

impl AssistantEngine {
    pub fn new(transport: Arc<dyn DialogueTransport>, pacing: Arc<dyn PacingPolicy>) -> Self {
        let scheduler = TurnScheduler::new(pacing);
        let state = EngineState::default();
        let initial = build_snapshot(&state, false);
        let (snapshots, _) = watch::channel(initial);
        Self {
            transport,
            scheduler,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            state: Mutex::new(state),
            snapshots,
        }
    }

    /// Sets the user agent sent with `start`.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Current state.
    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.lock_state();
        build_snapshot(&state, self.scheduler.is_locked())
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshots.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dialogue intents
    // ─────────────────────────────────────────────────────────────────────────

    /// Opens a session, optionally resuming a known session id.
    pub async fn start(
        &self,
        resume: Option<DialogueSessionId>,
    ) -> Result<TurnOutcome, EngineError> {
        let Some(input) = self.scheduler.try_lock() else {
            return Ok(ignore(IgnoreReason::InputLocked));
        };
        if self.lock_state().session.is_some() {
            return Ok(ignore(IgnoreReason::AlreadyStarted));
        }
        self.open_session(input, resume).await
    }

    /// Discards the current Session and requests a fresh one. The message
    /// log is kept.
    pub async fn restart(&self) -> Result<TurnOutcome, EngineError> {
        let Some(input) = self.scheduler.try_lock() else {
            return Ok(ignore(IgnoreReason::InputLocked));
        };
        tracing::info!("restart requested");
        self.open_session(input, None).await
    }

    /// Sends free text or an offered option.
    pub async fn respond(&self, text: &str) -> Result<TurnOutcome, EngineError> {
        let Some(input) = self.scheduler.try_lock() else {
            return Ok(ignore(IgnoreReason::InputLocked));
        };
        let text = text.trim();
        let session_id = {
            let mut state = self.lock_state();
            match state.stage_response(text) {
                Ok(session_id) => {
                    self.publish(&state);
                    session_id
                }
                Err(reason) => return Ok(ignore(reason)),
            }
        };

        self.exchange(input, session_id, text.to_string()).await
    }

    /// Selects a presented result item; its id is sent verbatim.
    pub async fn select_item(&self, item_id: &str) -> Result<TurnOutcome, EngineError> {
        let Some(input) = self.scheduler.try_lock() else {
            return Ok(ignore(IgnoreReason::InputLocked));
        };
        let session_id = {
            let mut state = self.lock_state();
            match state.stage_item(item_id) {
                Ok(session_id) => {
                    self.publish(&state);
                    session_id
                }
                Err(reason) => return Ok(ignore(reason)),
            }
        };

        self.exchange(input, session_id, item_id.to_string()).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Satisfaction intents
    // ─────────────────────────────────────────────────────────────────────────

    /// Closes the satisfaction flow as satisfied.
    pub async fn choose_satisfied(&self) -> Result<TurnOutcome, EngineError> {
        let Some(input) = self.scheduler.try_lock() else {
            return Ok(ignore(IgnoreReason::InputLocked));
        };
        let (session_id, submission) = {
            let mut state = self.lock_state();
            match state.stage_satisfied() {
                Ok(staged) => {
                    self.publish(&state);
                    staged
                }
                Err(reason) => return Ok(ignore(reason)),
            }
        };

        self.submit(input, session_id, submission).await
    }

    /// Moves to feedback collection. Local only.
    pub fn choose_unsatisfied(&self) -> Result<TurnOutcome, EngineError> {
        self.local_satisfaction_step(SatisfactionFlow::choose_unsatisfied)
    }

    /// Returns from feedback collection to the initial choice. Local only.
    pub fn cancel_feedback(&self) -> Result<TurnOutcome, EngineError> {
        self.local_satisfaction_step(SatisfactionFlow::cancel_feedback)
    }

    /// Submits unsatisfied feedback. Blank feedback is ignored; overlong
    /// feedback is truncated.
    pub async fn submit_feedback(&self, text: &str) -> Result<TurnOutcome, EngineError> {
        let Some(input) = self.scheduler.try_lock() else {
            return Ok(ignore(IgnoreReason::InputLocked));
        };
        let (session_id, submission) = {
            let mut state = self.lock_state();
            match state.stage_feedback(text) {
                Ok(staged) => {
                    self.publish(&state);
                    staged
                }
                Err(reason) => return Ok(ignore(reason)),
            }
        };

        self.submit(input, session_id, submission).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Exchanges
    // ─────────────────────────────────────────────────────────────────────────

    async fn open_session(
        &self,
        input: InputGuard<'_>,
        resume: Option<DialogueSessionId>,
    ) -> Result<TurnOutcome, EngineError> {
        let in_flight = InFlight::new(self, input);
        let request = StartRequest::new(resume, self.user_agent.clone());

        let response = match self.transport.start(request).await.and_then(|response| {
            response.check()?;
            response.require_session_id()?;
            Ok(response)
        }) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "start failed");
                return Err(e.into());
            }
        };

        self.reveal().await;
        {
            let mut state = self.lock_state();
            let session = state.commit_session(&response)?;
            tracing::info!(
                session_id = %session.session_id(),
                step = session.current_step(),
                flow_type = session.flow_type().map(FlowType::as_str),
                "session started"
            );
        }
        Ok(TurnOutcome::Applied(in_flight.finish()))
    }

    async fn exchange(
        &self,
        input: InputGuard<'_>,
        session_id: DialogueSessionId,
        user_response: String,
    ) -> Result<TurnOutcome, EngineError> {
        let in_flight = InFlight::new(self, input);
        let request = RespondRequest {
            session_id,
            user_response,
        };

        let response = match self.transport.respond(request).await.and_then(|response| {
            response.check()?;
            Ok(response)
        }) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "respond failed");
                return Err(e.into());
            }
        };

        self.reveal().await;
        {
            let mut state = self.lock_state();
            let outcome = state.commit_exchange(&response)?;
            let step = state.session.as_ref().map(Session::current_step);
            match outcome {
                StepOutcome::Continued => tracing::debug!(?step, "turn committed"),
                StepOutcome::Restarted => tracing::info!("session restarted by dialogue service"),
                StepOutcome::Completed => tracing::info!(?step, "session completed"),
            }
        }
        Ok(TurnOutcome::Applied(in_flight.finish()))
    }

    async fn submit(
        &self,
        input: InputGuard<'_>,
        session_id: DialogueSessionId,
        submission: SatisfactionSubmission,
    ) -> Result<TurnOutcome, EngineError> {
        let in_flight = InFlight::new(self, input);
        let request = SatisfactionRequest {
            session_id,
            is_satisfied: submission.is_satisfied(),
            feedback: submission.feedback_text().to_string(),
        };

        let response = match self
            .transport
            .submit_satisfaction(request)
            .await
            .and_then(|response| {
                response.check()?;
                Ok(response)
            }) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "satisfaction submit failed");
                return Err(e.into());
            }
        };

        self.reveal().await;
        {
            let mut state = self.lock_state();
            let status = state.commit_satisfaction(submission, &response)?;
            if status == SessionStatus::Escalated {
                tracing::info!("session escalated for human follow-up");
            } else {
                tracing::info!("satisfaction recorded");
            }
        }
        Ok(TurnOutcome::Applied(in_flight.finish()))
    }

    fn local_satisfaction_step(
        &self,
        step: fn(&mut SatisfactionFlow) -> Result<(), ValidationError>,
    ) -> Result<TurnOutcome, EngineError> {
        let Some(input) = self.scheduler.try_lock() else {
            return Ok(ignore(IgnoreReason::InputLocked));
        };
        let mut state = self.lock_state();
        let applied = state
            .satisfaction
            .as_mut()
            .map(|flow| step(flow).is_ok())
            .unwrap_or(false);
        drop(input);
        if !applied {
            return Ok(ignore(IgnoreReason::SatisfactionUnavailable));
        }
        Ok(TurnOutcome::Applied(self.publish(&state)))
    }

    /// Shows the typing indicator for the pacing delay.
    async fn reveal(&self) {
        {
            let mut state = self.lock_state();
            state.is_typing = true;
            self.publish(&state);
        }
        self.scheduler.hold().await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State access
    // ─────────────────────────────────────────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &EngineState) -> EngineSnapshot {
        let snapshot = build_snapshot(state, self.scheduler.is_locked());
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

impl std::fmt::Debug for AssistantEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantEngine")
            .field("scheduler", &self.scheduler)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

fn build_snapshot(state: &EngineState, input_locked: bool) -> EngineSnapshot {
    EngineSnapshot {
        session: state.session.clone(),
        turns: state.log.turns().to_vec(),
        pending_user_turn: state.pending_user_turn.clone(),
        mode: state.mode(),
        is_typing: state.is_typing,
        input_locked,
        satisfaction: state.satisfaction.clone(),
    }
}

fn ignore(reason: IgnoreReason) -> TurnOutcome {
    tracing::warn!(%reason, "intent ignored");
    TurnOutcome::Ignored(reason)
}

/// An outstanding call. Dropping it without `finish` rolls back the staged
/// turn and typing indicator, then releases the input lock.
struct InFlight<'a> {
    engine: &'a AssistantEngine,
    input: Option<InputGuard<'a>>,
}

impl<'a> InFlight<'a> {
    fn new(engine: &'a AssistantEngine, input: InputGuard<'a>) -> Self {
        Self {
            engine,
            input: Some(input),
        }
    }

    fn finish(mut self) -> EngineSnapshot {
        self.release()
    }

    fn release(&mut self) -> EngineSnapshot {
        let mut state = self.engine.lock_state();
        if state.pending_user_turn.take().is_some() {
            tracing::debug!("dropped staged user turn");
        }
        state.is_typing = false;
        // Release while the state lock is held so the next intent sees a
        // clean state.
        drop(self.input.take());
        self.engine.publish(&state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.input.is_some() {
            self.release();
        }
    }
}
