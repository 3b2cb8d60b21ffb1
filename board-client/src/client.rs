//! BoardClient - the main interface for the kanban board.
//!
//! This module provides [`BoardClient`], which applies user intents to the
//! board immediately and reconciles them with the remote store in the
//! background.
//!
//! # Architecture
//!
//! BoardClient uses the pure [`Session`] reducer (from board-core) for all
//! board logic and interprets the effects it returns via the
//! [`RemoteGateway`] trait.
//!
//! ```text
//! Application → BoardClient → RemoteGateway → Network
//!                   ↓
//!              board-core (pure reducer)
//! ```
//!
//! Every intent is applied synchronously under a short lock, then the remote
//! call runs on a spawned task. Observers see each new [`Snapshot`] through
//! [`BoardClient::subscribe`].
//!
//! # Example
//!
//! ```ignore
//! use board_client::{BoardClient, MockGateway};
//!
//! let client = BoardClient::new(MockGateway::new());
//! client.activate().await?;
//!
//! let list_id = client.board().lists()[0].id.clone();
//! let in_flight = client.create_card(&list_id, "Write tests")?;
//! // The card is already on the board, flagged as pending.
//! let outcome = in_flight.settled().await?;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use board_core::{
    Board, Dispatch, Effect, Intent, IntentError, LoadStep, MoveIntent, Outcome, Phase, Session,
    Settlement, Snapshot,
};
use board_types::{CardId, GatewayError, ListId};
use futures_util::future::{try_join, try_join_all};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::gateway::RemoteGateway;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The board has not been activated, or was deactivated.
    #[error("board is not active")]
    NotActive,

    /// The intent addressed something that does not exist.
    #[error("invalid intent: {0}")]
    Intent(IntentError),

    /// A gateway call made during activation failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A newer activation or a deactivation replaced this activation.
    #[error("activation superseded")]
    Superseded,

    /// The background task running a remote call panicked or was aborted.
    #[error("remote call task failed: {0}")]
    TaskFailed(String),
}

impl From<IntentError> for ClientError {
    fn from(err: IntentError) -> Self {
        match err {
            IntentError::NotActive => ClientError::NotActive,
            other => ClientError::Intent(other),
        }
    }
}

/// A remote call started by an intent.
///
/// The optimistic change is already visible when this is returned. Dropping
/// the handle does not cancel the call.
#[derive(Debug)]
pub struct InFlight {
    card_id: CardId,
    handle: JoinHandle<Outcome>,
}

impl InFlight {
    /// The card the call is for. For a create this is the temporary id.
    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    /// Wait until the call has settled and been reconciled.
    pub async fn settled(self) -> Result<Outcome, ClientError> {
        self.handle
            .await
            .map_err(|e| ClientError::TaskFailed(e.to_string()))
    }
}

/// State shared between the client and its in-flight tasks.
struct Shared {
    session: Mutex<Session>,
    snapshots: watch::Sender<Snapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        // Transitions assign whole values, so a poisoned session is consistent.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a session transition and publish the resulting snapshot if it
    /// changed anything.
    fn mutate<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.lock();
        let result = f(&mut session);
        let snapshot = session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
        result
    }
}

/// The main board client.
///
/// Owns the board and pending flags for one board page. Cloning is cheap and
/// clones drive the same board.
pub struct BoardClient<G: RemoteGateway + 'static> {
    gateway: Arc<G>,
    shared: Arc<Shared>,
}

impl<G: RemoteGateway + 'static> Clone for BoardClient<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<G: RemoteGateway + 'static> BoardClient<G> {
    /// Create an inactive client.
    pub fn new(gateway: G) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::default());
        Self {
            gateway: Arc::new(gateway),
            shared: Arc::new(Shared {
                session: Mutex::new(Session::new()),
                snapshots,
            }),
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Load the board from the remote store.
    ///
    /// Lists and cards are fetched concurrently. If the store has no lists,
    /// the default lists are created first. On failure the client stays
    /// inactive and the gateway error is returned. If another activation or
    /// a deactivation happens meanwhile, this one returns
    /// [`ClientError::Superseded`] without touching the board.
    pub async fn activate(&self) -> Result<(), ClientError> {
        let epoch = self.shared.mutate(Session::begin_activation);
        debug!(epoch, "activating board");

        let (lists, cards) = match try_join(self.gateway.load_lists(), self.gateway.load_cards()).await {
            Ok(loaded) => loaded,
            Err(err) => return Err(self.abandon(epoch, err)),
        };

        let mut step = self.shared.mutate(|s| s.on_loaded(epoch, lists, cards));
        if let LoadStep::CreateDefaults(defaults) = step {
            info!(count = defaults.len(), "remote store is empty, creating default lists");
            let created = match try_join_all(defaults.into_iter().map(|list| self.gateway.create_list(list))).await {
                Ok(created) => created,
                Err(err) => return Err(self.abandon(epoch, err)),
            };
            let lists: Vec<_> = created.into_iter().flatten().collect();
            step = self.shared.mutate(|s| s.on_defaults_created(epoch, lists));
        }
        if step == LoadStep::Superseded {
            debug!(epoch, "activation superseded");
            return Err(ClientError::Superseded);
        }

        let board = self.board();
        info!(lists = board.len(), cards = board.card_count(), "board active");
        Ok(())
    }

    fn abandon(&self, epoch: u64, err: GatewayError) -> ClientError {
        warn!(epoch, error = %err, "board load failed");
        self.shared.mutate(|s| s.on_load_failed(epoch));
        ClientError::Gateway(err)
    }

    /// Drop the board and pending flags and stop accepting intents.
    ///
    /// Calls still in flight complete remotely but no longer touch the board.
    pub fn deactivate(&self) {
        self.shared.mutate(Session::deactivate);
        debug!("board deactivated");
    }

    // -----------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------

    /// Append a new card to a list.
    pub fn create_card(&self, list_id: &ListId, title: impl Into<String>) -> Result<InFlight, ClientError> {
        self.dispatch(Intent::CreateCard {
            list_id: list_id.clone(),
            title: title.into(),
        })
    }

    /// Rename a card.
    pub fn edit_card(
        &self,
        list_id: &ListId,
        card_id: &CardId,
        title: impl Into<String>,
    ) -> Result<InFlight, ClientError> {
        self.dispatch(Intent::EditCard {
            list_id: list_id.clone(),
            card_id: card_id.clone(),
            title: title.into(),
        })
    }

    /// Delete a card.
    pub fn delete_card(&self, list_id: &ListId, card_id: &CardId) -> Result<InFlight, ClientError> {
        self.dispatch(Intent::DeleteCard {
            list_id: list_id.clone(),
            card_id: card_id.clone(),
        })
    }

    /// Apply a drag-and-drop result.
    pub fn move_card(&self, intent: MoveIntent) -> Result<InFlight, ClientError> {
        self.dispatch(Intent::MoveCard(intent))
    }

    /// Apply an intent optimistically and start its remote call.
    ///
    /// The returned handle settles once the call, and any follow-up calls
    /// it caused, have been reconciled. Must be called from within a tokio
    /// runtime.
    pub fn dispatch(&self, intent: Intent) -> Result<InFlight, ClientError> {
        let dispatch = self
            .shared
            .mutate(|s| s.on_intent(intent, CardId::temporary()))?;

        let card_id = dispatch.effect.card_id().clone();
        if dispatch.crowded {
            warn!(card_id = %card_id, "no sort key strictly between neighbours; order may tie");
        }
        debug!(epoch = dispatch.epoch, card_id = %card_id, effect = ?dispatch.effect, "applied optimistically");

        let gateway = Arc::clone(&self.gateway);
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let (outcome, mut follow_ups) = settle(&*gateway, &shared, dispatch).await;
            while let Some(follow_up) = follow_ups.pop() {
                debug!(card_id = %follow_up.effect.card_id(), "replaying local change under server id");
                let (_, more) = settle(&*gateway, &shared, follow_up).await;
                follow_ups.extend(more);
            }
            outcome
        });

        Ok(InFlight { card_id, handle })
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Latest board and pending flags.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Latest board.
    pub fn board(&self) -> Board {
        self.shared.snapshots.borrow().board.clone()
    }

    /// Whether a card has a remote call in flight.
    pub fn is_pending(&self, card_id: &CardId) -> bool {
        self.shared.snapshots.borrow().pending.is_pending(card_id)
    }

    /// Observe every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Whether intents are currently accepted.
    pub fn is_active(&self) -> bool {
        self.shared.lock().phase() == Phase::Active
    }

    /// Get a reference to the underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

/// Perform one dispatch and reconcile it. Returns the outcome and any
/// follow-up calls the reconciliation queued.
async fn settle<G: RemoteGateway + ?Sized>(
    gateway: &G,
    shared: &Shared,
    dispatch: Dispatch,
) -> (Outcome, Vec<Dispatch>) {
    let Dispatch { epoch, effect, .. } = dispatch;
    let settlement = perform(gateway, effect).await;
    let (outcome, follow_ups) = shared.mutate(|s| {
        let outcome = s.on_settled(epoch, settlement);
        (outcome, s.take_follow_ups())
    });
    match &outcome {
        Outcome::Success => debug!(epoch, "remote call settled"),
        Outcome::Failure(err) => warn!(epoch, error = %err, "remote call failed"),
    }
    (outcome, follow_ups)
}

/// Run one effect against the gateway and describe how it settled.
async fn perform<G: RemoteGateway + ?Sized>(gateway: &G, effect: Effect) -> Settlement {
    match effect {
        Effect::CreateCard { temp_id, new_card } => {
            let list_id = new_card.list_id.clone();
            Settlement::Created {
                temp_id,
                list_id,
                result: gateway.create_card(new_card).await,
            }
        }
        Effect::UpdateCard { update } => {
            let card_id = update.id.clone();
            Settlement::Updated {
                card_id,
                result: gateway.update_card(update).await,
            }
        }
        Effect::DeleteCard { card_id } => {
            let result = gateway.delete_card(&card_id).await;
            Settlement::Deleted { card_id, result }
        }
    }
}
