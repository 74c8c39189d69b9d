//! Async front door for adapters: one lock per player, cached sessions and
//! delayed opponent replies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::db::{LeaderboardQuery, PlayerAggregate, UserStats};
use crate::games::tictactoe::{Difficulty, GameError, Session, Turn};
use crate::orchestrator::{Orchestrator, TurnOutcome, TurnReport};
use crate::store::{SessionStore, StoreError};

/// Something that happened outside a request, for the adapter to render.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// A scheduled opponent reply was played.
    OpponentMoved {
        /// Player whose game it was.
        player_id: String,
        /// Session after the reply.
        session: Session,
        /// The reply.
        report: TurnReport,
    },
    /// A scheduled opponent reply could not be played.
    ReplyFailed {
        /// Player whose game it was.
        player_id: String,
        /// Why.
        error: GameError,
    },
}

type Slot = Arc<AsyncMutex<Option<Session>>>;

#[derive(Debug)]
struct Inner {
    store: Arc<dyn SessionStore>,
    orchestrator: Orchestrator,
    slots: Mutex<HashMap<String, Slot>>,
    pending: Mutex<HashMap<String, AbortHandle>>,
    thinking_delay: Duration,
    default_difficulty: Difficulty,
    events: UnboundedSender<GameEvent>,
}

/// Handles player actions.
///
/// The cached session is authoritative for the life of the process; the
/// store is written after every change and read only on first access.
/// Actions for one player are serialized by that player's lock, actions
/// for different players run independently.
#[derive(Debug, Clone)]
pub struct GameService {
    inner: Arc<Inner>,
}

impl GameService {
    /// Creates the service and the receiver for its [`GameEvent`]s.
    #[instrument(skip(store, orchestrator))]
    pub fn new(
        store: Arc<dyn SessionStore>,
        orchestrator: Orchestrator,
        thinking_delay: Duration,
        default_difficulty: Difficulty,
    ) -> (Self, UnboundedReceiver<GameEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        info!("Creating game service");
        let service = Self {
            inner: Arc::new(Inner {
                store,
                orchestrator,
                slots: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                thinking_delay,
                default_difficulty,
                events,
            }),
        };
        (service, rx)
    }

    /// Starts a fresh game, keeping the player's difficulty.
    ///
    /// Any scheduled opponent reply is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Store`] if the stored session cannot be read.
    #[instrument(skip(self, player_name))]
    pub async fn new_game(
        &self,
        player_id: &str,
        player_name: Option<String>,
    ) -> Result<Session, GameError> {
        let slot = self.slot(player_id);
        let mut guard = slot.lock().await;
        self.cancel_reply(player_id);

        let session = self.ensure_loaded(&mut guard, player_id)?;
        session.reset();
        session.set_player_name(player_name);
        self.persist(session);
        Ok(session.clone())
    }

    /// Plays the player's mark at `cell` (0-8).
    ///
    /// When the opponent is to move afterwards, its reply is scheduled
    /// after the thinking delay and reported as [`GameEvent::OpponentMoved`].
    ///
    /// # Errors
    ///
    /// [`GameError::GameAlreadyOver`], [`GameError::OutOfTurn`] (also while
    /// a reply is pending) or [`GameError::InvalidMove`]; nothing changes on
    /// error. [`GameError::Store`] if the stored session cannot be read.
    #[instrument(skip(self, player_name))]
    pub async fn make_move(
        &self,
        player_id: &str,
        player_name: Option<String>,
        cell: usize,
    ) -> Result<(Session, TurnReport), GameError> {
        let slot = self.slot(player_id);
        let mut guard = slot.lock().await;
        let session = self.ensure_loaded(&mut guard, player_id)?;
        session.set_player_name(player_name);

        let report = match self.inner.orchestrator.apply_player_move(session, cell) {
            Ok(report) => report,
            Err(GameError::OutOfTurn) => {
                if !self.has_pending_reply(player_id) {
                    warn!("Opponent reply was never scheduled, resuming it");
                    self.schedule_reply(player_id);
                }
                return Err(GameError::OutOfTurn);
            }
            Err(e) => return Err(e),
        };

        self.persist(session);
        if *report.outcome() == TurnOutcome::OpponentToMove {
            self.schedule_reply(player_id);
        }
        Ok((session.clone(), report))
    }

    /// Changes the player's difficulty. Allowed in any state.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Store`] if the stored session cannot be read.
    #[instrument(skip(self))]
    pub async fn set_difficulty(
        &self,
        player_id: &str,
        difficulty: Difficulty,
    ) -> Result<Session, GameError> {
        let slot = self.slot(player_id);
        let mut guard = slot.lock().await;
        let session = self.ensure_loaded(&mut guard, player_id)?;
        session.set_difficulty(difficulty);
        self.persist(session);
        Ok(session.clone())
    }

    /// Current session, created on first access.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Store`] if the stored session cannot be read.
    #[instrument(skip(self))]
    pub async fn session(&self, player_id: &str) -> Result<Session, GameError> {
        let slot = self.slot(player_id);
        let mut guard = slot.lock().await;
        Ok(self.ensure_loaded(&mut guard, player_id)?.clone())
    }

    /// Ranked aggregates.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Ledger`] on a database error.
    #[instrument(skip(self))]
    pub fn leaderboard(&self, query: &LeaderboardQuery) -> Result<Vec<PlayerAggregate>, GameError> {
        Ok(self.inner.orchestrator.ledger().leaderboard(query)?)
    }

    /// A player's statistics bundle.
    ///
    /// # Errors
    ///
    /// [`GameError::NotFound`] if the player has never finished a game,
    /// [`GameError::Ledger`] on a database error.
    #[instrument(skip(self))]
    pub fn user_stats(
        &self,
        player_id: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<UserStats, GameError> {
        self.inner
            .orchestrator
            .ledger()
            .user_stats(player_id, difficulty)?
            .ok_or_else(|| GameError::NotFound(player_id.to_string()))
    }

    /// True while an opponent reply is scheduled for `player_id`.
    pub fn has_pending_reply(&self, player_id: &str) -> bool {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(player_id)
            .is_some_and(|handle| !handle.is_finished())
    }

    fn slot(&self, player_id: &str) -> Slot {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(player_id.to_string())
            .or_default()
            .clone()
    }

    /// Fills an empty slot from the store, starting fresh when nothing
    /// usable is stored.
    fn ensure_loaded<'a>(
        &self,
        slot: &'a mut Option<Session>,
        player_id: &str,
    ) -> Result<&'a mut Session, GameError> {
        let session = match slot.take() {
            Some(session) => session,
            None => self.load_or_create(player_id)?,
        };
        Ok(slot.insert(session))
    }

    fn load_or_create(&self, player_id: &str) -> Result<Session, GameError> {
        match self.inner.store.load(player_id) {
            Ok(session) => {
                debug!(player_id, "Session restored from store");
                Ok(session)
            }
            Err(StoreError::NotFound(_)) => {
                Ok(Session::new(player_id, self.inner.default_difficulty))
            }
            Err(StoreError::Corrupted { reason, .. }) => {
                warn!(player_id, %reason, "Discarding corrupted session");
                if let Err(e) = self.inner.store.delete(player_id) {
                    error!(player_id, error = %e, "Failed to remove corrupted session");
                }
                Ok(Session::new(player_id, self.inner.default_difficulty))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.inner.store.save(session) {
            error!(player_id = %session.player_id(), error = %e, "Failed to save session");
        }
    }

    fn cancel_reply(&self, player_id: &str) {
        let removed = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(player_id);
        if let Some(handle) = removed {
            debug!(player_id, "Cancelling scheduled reply");
            handle.abort();
        }
    }

    /// Spawns the delayed reply. Callers hold the player's lock, so the
    /// task cannot run ahead of the bookkeeping below.
    fn schedule_reply(&self, player_id: &str) {
        let service = self.clone();
        let id = player_id.to_string();
        let task = tokio::spawn(async move { service.run_reply(id).await });
        debug!(player_id, delay_ms = self.inner.thinking_delay.as_millis() as u64, "Reply scheduled");
        let previous = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player_id.to_string(), task.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    #[instrument(skip(self))]
    async fn run_reply(self, player_id: String) {
        tokio::time::sleep(self.inner.thinking_delay).await;

        let slot = self.slot(&player_id);
        let mut guard = slot.lock().await;
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&player_id);

        let Some(session) = guard.as_mut() else {
            debug!("Session gone, reply dropped");
            return;
        };
        if session.is_terminal() || session.whose_turn() != Turn::Opponent {
            debug!("Session no longer waiting on the opponent");
            return;
        }

        let event = match self.inner.orchestrator.apply_opponent_move(session) {
            Ok(report) => {
                self.persist(session);
                info!(cell = report.cell(), outcome = ?report.outcome(), "Opponent replied");
                GameEvent::OpponentMoved {
                    player_id: player_id.clone(),
                    session: session.clone(),
                    report,
                }
            }
            Err(error) => {
                error!(error = %error, "Opponent reply failed");
                GameEvent::ReplyFailed {
                    player_id: player_id.clone(),
                    error,
                }
            }
        };
        if self.inner.events.send(event).is_err() {
            debug!("No event listener");
        }
    }
}
