//! Optimistic-update reducer.
//!
//! [`Session`] owns the board and the pending tracker together and is the
//! only thing that mutates them. It is pure: it takes intents and
//! settlements as input and returns the remote [`Effect`] to perform, without
//! doing any I/O. The async orchestrator in board-client interprets the
//! effects and feeds their results back through [`Session::on_settled`].
//!
//! Per card mutation the lifecycle is `Idle -> Optimistic -> Settled`:
//!
//! ```text
//! on_intent:  board mutated, card marked pending, Effect returned
//! on_settled: board reconciled (create only rolls back), pending cleared
//! ```
//!
//! Only creation is compensated on failure. Edits, deletes and moves keep
//! their optimistic state when the remote call fails.
//!
//! A card may be edited, moved or deleted while its create call is still in
//! flight. Those calls address the temporary id, which the server never
//! knows. When the create then succeeds, the local state of the card is
//! replayed under the server id as a follow-up [`Dispatch`], collected with
//! [`Session::take_follow_ups`].

use board_types::{
    Card, CardId, CardPatch, CardRecord, CardUpdate, GatewayError, List, ListId, ListRecord,
    NewCard, NewList, RemoteError,
};
use serde::Serialize;
use thiserror::Error;

use crate::board::Board;
use crate::ordering::{has_room, order_between};
use crate::pending::PendingTracker;

/// Lists created when the remote store is found empty: title and sort key.
pub const DEFAULT_LISTS: [(&str, f64); 3] = [("To Do", 1000.0), ("In Progress", 2000.0), ("Done", 3000.0)];

/// Why an intent was rejected before anything was applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// The session has not finished loading, or was deactivated.
    #[error("board is not active")]
    NotActive,

    /// The addressed list does not exist.
    #[error("unknown list: {0}")]
    UnknownList(ListId),

    /// The addressed card does not exist anywhere on the board.
    #[error("unknown card: {0}")]
    UnknownCard(CardId),
}

/// Activation phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Not activated, or deactivated.
    Inactive,
    /// Initial load (and possibly default-list creation) in progress.
    Loading,
    /// Board loaded; intents are accepted.
    Active,
}

/// A user request to mutate the board.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Create a card at the end of a list.
    CreateCard {
        /// Target list.
        list_id: ListId,
        /// Title of the new card.
        title: String,
    },
    /// Rename a card.
    EditCard {
        /// List the card was seen in.
        list_id: ListId,
        /// Card to rename.
        card_id: CardId,
        /// New title.
        title: String,
    },
    /// Delete a card.
    DeleteCard {
        /// List the card was seen in.
        list_id: ListId,
        /// Card to delete.
        card_id: CardId,
    },
    /// Drag a card to a new position, in the same list or another one.
    MoveCard(MoveIntent),
}

/// A drag-and-drop result as reported by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveIntent {
    /// Card being dragged.
    pub card_id: CardId,
    /// List the drag started in.
    pub from_list_id: ListId,
    /// Index the drag started at.
    pub from_index: usize,
    /// List the card was dropped in.
    pub to_list_id: ListId,
    /// Index the card was dropped at.
    pub to_index: usize,
}

impl MoveIntent {
    /// Whether source and destination are the same list.
    pub fn is_reorder(&self) -> bool {
        self.from_list_id == self.to_list_id
    }
}

/// Remote call to issue after an optimistic update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Insert a card row; the temporary card is swapped on success.
    CreateCard {
        /// Id of the optimistic card.
        temp_id: CardId,
        /// Payload for the gateway.
        new_card: NewCard,
    },
    /// Update a card row.
    UpdateCard {
        /// Payload for the gateway.
        update: CardUpdate,
    },
    /// Delete a card row.
    DeleteCard {
        /// Row to delete.
        card_id: CardId,
    },
}

impl Effect {
    /// The card whose pending flag this effect holds.
    pub fn card_id(&self) -> &CardId {
        match self {
            Effect::CreateCard { temp_id, .. } => temp_id,
            Effect::UpdateCard { update } => &update.id,
            Effect::DeleteCard { card_id } => card_id,
        }
    }
}

/// Result of accepting an intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Activation the intent was applied in.
    pub epoch: u64,
    /// Remote call to perform.
    pub effect: Effect,
    /// A move landed in a gap too narrow for a strictly-between key.
    pub crowded: bool,
}

/// A settled remote call, fed back into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// `create_card` finished.
    Created {
        /// Id of the optimistic card.
        temp_id: CardId,
        /// List the card was created in.
        list_id: ListId,
        /// Gateway result.
        result: Result<Option<CardRecord>, GatewayError>,
    },
    /// `update_card` finished.
    Updated {
        /// Card that was updated.
        card_id: CardId,
        /// Gateway result.
        result: Result<Option<CardRecord>, GatewayError>,
    },
    /// `delete_card` finished.
    Deleted {
        /// Card that was deleted.
        card_id: CardId,
        /// Gateway result.
        result: Result<(), GatewayError>,
    },
}

/// How a remote call settled from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The call succeeded with a usable result.
    Success,
    /// The call failed or returned no row.
    Failure(RemoteError),
}

impl Outcome {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// What the orchestrator must do after the initial load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStep {
    /// The board is ready.
    Ready,
    /// The remote store is empty; create these lists and report back via
    /// [`Session::on_defaults_created`].
    CreateDefaults(Vec<NewList>),
    /// A newer activation or a deactivation replaced this one. Nothing was
    /// installed.
    Superseded,
}

/// Board plus pending flags, as published to observers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// The rendered board.
    pub board: Board,
    /// Cards with an operation in flight.
    pub pending: PendingTracker,
}

/// Board state for one activation of the board page.
#[derive(Debug, Clone)]
pub struct Session {
    board: Board,
    pending: PendingTracker,
    phase: Phase,
    epoch: u64,
    follow_ups: Vec<Dispatch>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh, inactive session.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            pending: PendingTracker::new(),
            phase: Phase::Inactive,
            epoch: 0,
            follow_ups: Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Start a new activation: clear all state and enter `Loading`.
    ///
    /// Returns the new epoch. Settlements tagged with an older epoch are
    /// ignored from now on.
    pub fn begin_activation(&mut self) -> u64 {
        self.reset(Phase::Loading)
    }

    /// Install the loaded lists and cards.
    ///
    /// Cards are grouped by `list_id`; cards referencing an unknown list are
    /// dropped. Returns [`LoadStep::CreateDefaults`] when no lists exist.
    pub fn on_loaded(&mut self, epoch: u64, lists: Vec<ListRecord>, cards: Vec<CardRecord>) -> LoadStep {
        if !self.is_loading(epoch) {
            return LoadStep::Superseded;
        }

        let lists: Vec<List> = lists
            .into_iter()
            .map(|record| {
                let mut list_cards: Vec<Card> = cards
                    .iter()
                    .filter(|card| card.list_id == record.id)
                    .cloned()
                    .map(Card::from)
                    .collect();
                list_cards.sort_by(|a, b| a.sort_order.total_cmp(&b.sort_order));
                List::from(record).with_cards(list_cards)
            })
            .collect();

        self.board = self.board.initialize(lists);

        if self.board.is_empty() {
            LoadStep::CreateDefaults(
                DEFAULT_LISTS
                    .iter()
                    .map(|(title, sort_order)| NewList {
                        title: (*title).to_string(),
                        sort_order: *sort_order,
                    })
                    .collect(),
            )
        } else {
            self.phase = Phase::Active;
            LoadStep::Ready
        }
    }

    /// Install the default lists created remotely and finish activation.
    ///
    /// Returns [`LoadStep::Ready`], or [`LoadStep::Superseded`] if the
    /// activation was replaced while the lists were being created.
    pub fn on_defaults_created(&mut self, epoch: u64, lists: Vec<ListRecord>) -> LoadStep {
        if !self.is_loading(epoch) {
            return LoadStep::Superseded;
        }
        self.board = self
            .board
            .bootstrap_defaults(lists.into_iter().map(List::from).collect());
        self.phase = Phase::Active;
        LoadStep::Ready
    }

    /// Abandon a failed activation.
    pub fn on_load_failed(&mut self, epoch: u64) {
        if self.is_loading(epoch) {
            self.phase = Phase::Inactive;
        }
    }

    fn is_loading(&self, epoch: u64) -> bool {
        epoch == self.epoch && self.phase == Phase::Loading
    }

    /// Tear down: clear all state and stop accepting intents.
    pub fn deactivate(&mut self) {
        self.reset(Phase::Inactive);
    }

    fn reset(&mut self, phase: Phase) -> u64 {
        self.board = Board::new();
        self.pending = PendingTracker::new();
        self.follow_ups.clear();
        self.phase = phase;
        self.epoch += 1;
        self.epoch
    }

    // -----------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------

    /// Apply an intent optimistically and return the remote call to make.
    ///
    /// `temp_id` is used only for [`Intent::CreateCard`]. On error nothing
    /// is applied.
    pub fn on_intent(&mut self, intent: Intent, temp_id: CardId) -> Result<Dispatch, IntentError> {
        if self.phase != Phase::Active {
            return Err(IntentError::NotActive);
        }

        let (effect, crowded) = match intent {
            Intent::CreateCard { list_id, title } => (self.create(list_id, title, temp_id)?, false),
            Intent::EditCard {
                list_id,
                card_id,
                title,
            } => (self.edit(list_id, card_id, title)?, false),
            Intent::DeleteCard { list_id, card_id } => (self.delete(list_id, card_id)?, false),
            Intent::MoveCard(intent) => self.move_card(intent)?,
        };

        self.pending.mark_pending(effect.card_id().clone());

        Ok(Dispatch {
            epoch: self.epoch,
            effect,
            crowded,
        })
    }

    fn create(&mut self, list_id: ListId, title: String, temp_id: CardId) -> Result<Effect, IntentError> {
        let list = self
            .board
            .list(&list_id)
            .ok_or_else(|| IntentError::UnknownList(list_id.clone()))?;

        let sort_order = order_between(list.last_card().map(|card| card.sort_order), None);
        let card = Card::new(temp_id.clone(), title.clone(), sort_order);
        self.board = self.board.insert_card(&list_id, card);

        Ok(Effect::CreateCard {
            temp_id,
            new_card: NewCard {
                title,
                list_id,
                sort_order,
            },
        })
    }

    fn edit(&mut self, list_id: ListId, card_id: CardId, title: String) -> Result<Effect, IntentError> {
        let list_id = self.locate(&list_id, &card_id)?;
        self.board = self
            .board
            .update_card(&card_id, &list_id, &CardPatch::title(title.clone()));
        Ok(Effect::UpdateCard {
            update: CardUpdate::title(card_id, title),
        })
    }

    fn delete(&mut self, list_id: ListId, card_id: CardId) -> Result<Effect, IntentError> {
        let list_id = self.locate(&list_id, &card_id)?;
        self.board = self.board.remove_card(&list_id, &card_id);
        Ok(Effect::DeleteCard { card_id })
    }

    fn move_card(&mut self, intent: MoveIntent) -> Result<(Effect, bool), IntentError> {
        let (source, from_index) = self.resolve_source(&intent)?;
        let dest = self
            .board
            .list(&intent.to_list_id)
            .ok_or_else(|| IntentError::UnknownList(intent.to_list_id.clone()))?;

        // Neighbours are read from the destination as rendered, without the
        // moved card, i.e. the slots the card is dropped between.
        let keys: Vec<f64> = dest
            .cards
            .iter()
            .filter(|card| card.id != intent.card_id)
            .map(|card| card.sort_order)
            .collect();
        let to_index = intent.to_index.min(keys.len());
        let prev = to_index.checked_sub(1).map(|i| keys[i]);
        let next = keys.get(to_index).copied();
        let sort_order = order_between(prev, next);
        let crowded = !has_room(prev, next);

        let dest_id = intent.to_list_id;
        let moved = if source == dest_id {
            self.board.reorder_within_list(&source, from_index, to_index)
        } else {
            self.board
                .move_across_lists(&source, &dest_id, from_index, to_index)
        };
        self.board = moved.update_card(&intent.card_id, &dest_id, &CardPatch::sort_order(sort_order));

        Ok((
            Effect::UpdateCard {
                update: CardUpdate::placement(intent.card_id, dest_id, sort_order),
            },
            crowded,
        ))
    }

    /// Resolve where the dragged card actually is.
    ///
    /// The reported index is trusted only if it still points at the card;
    /// otherwise the card is found by id in the latest board.
    fn resolve_source(&self, intent: &MoveIntent) -> Result<(ListId, usize), IntentError> {
        let reported = self
            .board
            .list(&intent.from_list_id)
            .and_then(|list| list.cards.get(intent.from_index))
            .is_some_and(|card| card.id == intent.card_id);
        if reported {
            return Ok((intent.from_list_id.clone(), intent.from_index));
        }
        self.board
            .find_card(&intent.card_id)
            .map(|(list_id, index, _)| (list_id.clone(), index))
            .ok_or_else(|| IntentError::UnknownCard(intent.card_id.clone()))
    }

    /// The list that currently holds `card_id`, preferring the reported one.
    fn locate(&self, list_id: &ListId, card_id: &CardId) -> Result<ListId, IntentError> {
        if self
            .board
            .list(list_id)
            .is_some_and(|list| list.position(card_id).is_some())
        {
            return Ok(list_id.clone());
        }
        self.board
            .find_card(card_id)
            .map(|(found, _, _)| found.clone())
            .ok_or_else(|| IntentError::UnknownCard(card_id.clone()))
    }

    // -----------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------

    /// Reconcile a settled remote call and clear its pending flag.
    ///
    /// Settlements from an earlier activation only report their outcome.
    pub fn on_settled(&mut self, epoch: u64, settlement: Settlement) -> Outcome {
        let current = epoch == self.epoch;

        match settlement {
            Settlement::Created {
                temp_id,
                list_id,
                result,
            } => {
                let (outcome, confirmed) = match result {
                    Ok(Some(record)) => (Outcome::Success, Some(record)),
                    Ok(None) => (Outcome::Failure(RemoteError::NullResult), None),
                    Err(err) => (Outcome::Failure(err.into()), None),
                };
                if current {
                    match confirmed {
                        Some(record) => self.confirm_create(&temp_id, record),
                        None => {
                            let home = self.home_of(&temp_id, list_id);
                            self.board = self.board.remove_card(&home, &temp_id);
                        }
                    }
                    self.pending.clear_pending(&temp_id);
                }
                outcome
            }
            Settlement::Updated { card_id, result } => {
                let outcome = match result {
                    Ok(Some(record)) => {
                        if current {
                            self.merge_echo(&card_id, &record);
                        }
                        Outcome::Success
                    }
                    Ok(None) => Outcome::Failure(RemoteError::NullResult),
                    Err(err) => Outcome::Failure(err.into()),
                };
                if current {
                    self.pending.clear_pending(&card_id);
                }
                outcome
            }
            Settlement::Deleted { card_id, result } => {
                let outcome = match result {
                    Ok(()) => {
                        if current {
                            self.board = self.board.purge_card(&card_id);
                        }
                        Outcome::Success
                    }
                    Err(err) => Outcome::Failure(err.into()),
                };
                if current {
                    self.pending.clear_pending(&card_id);
                }
                outcome
            }
        }
    }

    /// Swap a confirmed temporary card for its server id.
    ///
    /// If the card was changed or deleted locally while the create was in
    /// flight, the local state wins and is queued for replay under the
    /// server id.
    fn confirm_create(&mut self, temp_id: &CardId, record: CardRecord) {
        let Some((home, _, local)) = self.board.find_card(temp_id) else {
            self.queue_follow_up(Effect::DeleteCard { card_id: record.id });
            return;
        };
        let home = home.clone();

        let unchanged = home == record.list_id
            && local.title == record.title
            && local.sort_order == record.sort_order;
        if unchanged {
            self.board = self.board.replace_card(&home, temp_id, Card::from(record));
            return;
        }

        let card = Card::new(record.id.clone(), local.title.clone(), local.sort_order);
        let update = CardUpdate {
            id: record.id,
            title: Some(card.title.clone()),
            list_id: Some(home.clone()),
            sort_order: Some(card.sort_order),
        };
        self.board = self.board.replace_card(&home, temp_id, card);
        self.queue_follow_up(Effect::UpdateCard { update });
    }

    fn queue_follow_up(&mut self, effect: Effect) {
        self.pending.mark_pending(effect.card_id().clone());
        self.follow_ups.push(Dispatch {
            epoch: self.epoch,
            effect,
            crowded: false,
        });
    }

    /// Merge a server echo into the card, repositioning it by sort key when
    /// the echo places it elsewhere. A card deleted locally stays deleted.
    fn merge_echo(&mut self, card_id: &CardId, record: &CardRecord) {
        if let Some((_, _, card)) = self.board.find_card(card_id) {
            let merged = CardPatch::from(record).apply_to(card);
            self.board = self.board.place_card(&record.list_id, merged);
        }
    }

    /// Remote calls queued by settlements, to be performed like any other
    /// dispatch.
    pub fn take_follow_ups(&mut self) -> Vec<Dispatch> {
        std::mem::take(&mut self.follow_ups)
    }

    /// The list currently holding `card_id`, or `fallback` if it is gone.
    fn home_of(&self, card_id: &CardId, fallback: ListId) -> ListId {
        self.board
            .find_card(card_id)
            .map(|(list_id, _, _)| list_id.clone())
            .unwrap_or(fallback)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The current pending flags.
    pub fn pending(&self) -> &PendingTracker {
        &self.pending
    }

    /// Whether a card has an operation in flight.
    pub fn is_pending(&self, card_id: &CardId) -> bool {
        self.pending.is_pending(card_id)
    }

    /// Current activation phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current activation epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Copy of board and pending flags.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            pending: self.pending.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn list_record(id: &str, title: &str, sort_order: f64) -> ListRecord {
        ListRecord {
            id: ListId::new(id),
            title: title.into(),
            sort_order,
            created_at: None,
        }
    }

    fn card_record(id: &str, list_id: &str, sort_order: f64) -> CardRecord {
        CardRecord {
            id: CardId::new(id),
            title: format!("card {id}"),
            list_id: ListId::new(list_id),
            sort_order,
            created_at: None,
        }
    }

    /// To Do: a(1000), b(2000); In Progress: x(500); Done: empty.
    fn active_session() -> Session {
        let mut session = Session::new();
        let epoch = session.begin_activation();
        let step = session.on_loaded(
            epoch,
            vec![
                list_record("todo", "To Do", 1000.0),
                list_record("doing", "In Progress", 2000.0),
                list_record("done", "Done", 3000.0),
            ],
            vec![
                card_record("a", "todo", 1000.0),
                card_record("x", "doing", 500.0),
                card_record("b", "todo", 2000.0),
            ],
        );
        assert_eq!(step, LoadStep::Ready);
        session
    }

    fn ids(session: &Session, list_id: &str) -> Vec<String> {
        session
            .board()
            .list(&ListId::new(list_id))
            .unwrap()
            .cards
            .iter()
            .map(|card| card.id.to_string())
            .collect()
    }

    fn create(session: &mut Session, list_id: &str, title: &str, temp: &str) -> Dispatch {
        session
            .on_intent(
                Intent::CreateCard {
                    list_id: ListId::new(list_id),
                    title: title.into(),
                },
                CardId::new(temp),
            )
            .unwrap()
    }

    fn move_intent(card: &str, from: &str, from_index: usize, to: &str, to_index: usize) -> Intent {
        Intent::MoveCard(MoveIntent {
            card_id: CardId::new(card),
            from_list_id: ListId::new(from),
            from_index,
            to_list_id: ListId::new(to),
            to_index,
        })
    }

    fn unused_temp() -> CardId {
        CardId::new("tmp-unused")
    }

    // ===========================================
    // Activation Tests
    // ===========================================

    #[test]
    fn starts_inactive_and_rejects_intents() {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::Inactive);
        let result = session.on_intent(
            Intent::CreateCard {
                list_id: ListId::new("todo"),
                title: "early".into(),
            },
            unused_temp(),
        );
        assert_eq!(result, Err(IntentError::NotActive));
    }

    #[test]
    fn intents_rejected_while_loading() {
        let mut session = Session::new();
        session.begin_activation();
        assert_eq!(session.phase(), Phase::Loading);
        let result = session.on_intent(move_intent("a", "todo", 0, "todo", 1), unused_temp());
        assert_eq!(result, Err(IntentError::NotActive));
    }

    #[test]
    fn load_groups_and_sorts_cards_per_list() {
        let session = active_session();
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(ids(&session, "todo"), vec!["a", "b"]);
        assert_eq!(ids(&session, "doing"), vec!["x"]);
        assert!(ids(&session, "done").is_empty());
    }

    #[test]
    fn cards_of_unknown_lists_are_dropped() {
        let mut session = Session::new();
        let epoch = session.begin_activation();
        session.on_loaded(
            epoch,
            vec![list_record("todo", "To Do", 1000.0)],
            vec![card_record("orphan", "gone", 1.0)],
        );
        assert_eq!(session.board().card_count(), 0);
    }

    #[test]
    fn empty_store_bootstraps_three_default_lists() {
        let mut session = Session::new();
        let epoch = session.begin_activation();

        let step = session.on_loaded(epoch, vec![], vec![]);
        let LoadStep::CreateDefaults(defaults) = step else {
            panic!("expected default lists, got {step:?}");
        };
        let titles: Vec<&str> = defaults.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["To Do", "In Progress", "Done"]);
        assert_eq!(session.phase(), Phase::Loading);

        session.on_defaults_created(
            epoch,
            vec![
                list_record("l1", "To Do", 1000.0),
                list_record("l2", "In Progress", 2000.0),
                list_record("l3", "Done", 3000.0),
            ],
        );

        assert_eq!(session.phase(), Phase::Active);
        let board = session.board();
        assert_eq!(board.len(), 3);
        assert!(board.lists().iter().all(|list| list.cards.is_empty()));
    }

    #[test]
    fn failed_load_returns_to_inactive() {
        let mut session = Session::new();
        let epoch = session.begin_activation();
        session.on_load_failed(epoch);
        assert_eq!(session.phase(), Phase::Inactive);
    }

    #[test]
    fn deactivate_resets_board_and_pending() {
        let mut session = active_session();
        create(&mut session, "todo", "new", "tmp-1");
        assert!(!session.pending().is_empty());

        session.deactivate();

        assert_eq!(session.phase(), Phase::Inactive);
        assert!(session.board().is_empty());
        assert!(session.pending().is_empty());
    }

    #[test]
    fn stale_load_is_ignored() {
        let mut session = Session::new();
        let old = session.begin_activation();
        let current = session.begin_activation();
        assert_ne!(old, current);

        let step = session.on_loaded(old, vec![list_record("todo", "To Do", 1000.0)], vec![]);
        assert_eq!(step, LoadStep::Superseded);
        assert!(session.board().is_empty());
        assert_eq!(session.phase(), Phase::Loading);
    }

    #[test]
    fn defaults_created_after_deactivate_are_superseded() {
        let mut session = Session::new();
        let epoch = session.begin_activation();
        assert!(matches!(session.on_loaded(epoch, vec![], vec![]), LoadStep::CreateDefaults(_)));

        session.deactivate();
        let step = session.on_defaults_created(epoch, vec![list_record("l1", "To Do", 1000.0)]);

        assert_eq!(step, LoadStep::Superseded);
        assert_eq!(session.phase(), Phase::Inactive);
        assert!(session.board().is_empty());
    }

    // ===========================================
    // Create Tests
    // ===========================================

    #[test]
    fn create_appends_with_tail_order() {
        let mut session = active_session();
        let dispatch = create(&mut session, "todo", "Write tests", "tmp-1");

        assert_eq!(ids(&session, "todo"), vec!["a", "b", "tmp-1"]);
        assert!(session.is_pending(&CardId::new("tmp-1")));
        match dispatch.effect {
            Effect::CreateCard { temp_id, new_card } => {
                assert_eq!(temp_id, CardId::new("tmp-1"));
                assert_eq!(new_card.sort_order, 3000.0);
                assert_eq!(new_card.list_id, ListId::new("todo"));
                assert_eq!(new_card.title, "Write tests");
            }
            other => panic!("expected CreateCard, got {other:?}"),
        }
    }

    #[test]
    fn create_in_empty_list_uses_initial_order() {
        let mut session = active_session();
        let dispatch = create(&mut session, "done", "first", "tmp-1");
        let Effect::CreateCard { new_card, .. } = dispatch.effect else {
            panic!("expected CreateCard");
        };
        assert_eq!(new_card.sort_order, 10_000.0);
    }

    #[test]
    fn create_in_unknown_list_is_rejected_without_changes() {
        let mut session = active_session();
        let before = session.snapshot();
        let result = session.on_intent(
            Intent::CreateCard {
                list_id: ListId::new("nope"),
                title: "x".into(),
            },
            CardId::new("tmp-1"),
        );
        assert_eq!(result, Err(IntentError::UnknownList(ListId::new("nope"))));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn create_success_swaps_temp_for_server_record_in_place() {
        let mut session = active_session();
        let dispatch = create(&mut session, "todo", "Write tests", "tmp-1");

        let outcome = session.on_settled(
            dispatch.epoch,
            Settlement::Created {
                temp_id: CardId::new("tmp-1"),
                list_id: ListId::new("todo"),
                result: Ok(Some(card_record("srv-9", "todo", 3000.0))),
            },
        );

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(ids(&session, "todo"), vec!["a", "b", "srv-9"]);
        assert!(session.pending().is_empty());
    }

    #[test]
    fn create_failure_restores_previous_board() {
        let mut session = active_session();
        let before = session.snapshot();
        let dispatch = create(&mut session, "todo", "doomed", "tmp-1");

        let outcome = session.on_settled(
            dispatch.epoch,
            Settlement::Created {
                temp_id: CardId::new("tmp-1"),
                list_id: ListId::new("todo"),
                result: Err(GatewayError::Request("offline".into())),
            },
        );

        assert!(matches!(outcome, Outcome::Failure(RemoteError::Failure(_))));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn create_null_result_is_a_failure() {
        let mut session = active_session();
        let before = session.snapshot();
        let dispatch = create(&mut session, "todo", "doomed", "tmp-1");

        let outcome = session.on_settled(
            dispatch.epoch,
            Settlement::Created {
                temp_id: CardId::new("tmp-1"),
                list_id: ListId::new("todo"),
                result: Ok(None),
            },
        );

        assert_eq!(outcome, Outcome::Failure(RemoteError::NullResult));
        assert_eq!(session.snapshot(), before);
    }

    // ===========================================
    // Edit / Delete Tests
    // ===========================================

    #[test]
    fn edit_applies_immediately_and_keeps_patch_on_failure() {
        let mut session = active_session();
        let dispatch = session
            .on_intent(
                Intent::EditCard {
                    list_id: ListId::new("todo"),
                    card_id: CardId::new("b"),
                    title: "Renamed".into(),
                },
                unused_temp(),
            )
            .unwrap();

        assert_eq!(
            dispatch.effect,
            Effect::UpdateCard {
                update: CardUpdate::title(CardId::new("b"), "Renamed")
            }
        );
        assert!(session.is_pending(&CardId::new("b")));

        session.on_settled(
            dispatch.epoch,
            Settlement::Updated {
                card_id: CardId::new("b"),
                result: Err(GatewayError::Rejected("denied".into())),
            },
        );

        let (_, _, card) = session.board().find_card(&CardId::new("b")).unwrap();
        assert_eq!(card.title, "Renamed");
        assert!(!session.is_pending(&CardId::new("b")));
    }

    #[test]
    fn edit_merges_server_record() {
        let mut session = active_session();
        let dispatch = session
            .on_intent(
                Intent::EditCard {
                    list_id: ListId::new("todo"),
                    card_id: CardId::new("a"),
                    title: "Draft".into(),
                },
                unused_temp(),
            )
            .unwrap();

        let mut echo = card_record("a", "todo", 1000.0);
        echo.title = "Draft (server)".into();
        let outcome = session.on_settled(
            dispatch.epoch,
            Settlement::Updated {
                card_id: CardId::new("a"),
                result: Ok(Some(echo)),
            },
        );

        assert_eq!(outcome, Outcome::Success);
        let (_, _, card) = session.board().find_card(&CardId::new("a")).unwrap();
        assert_eq!(card.title, "Draft (server)");
    }

    #[test]
    fn edit_with_stale_list_finds_card_by_id() {
        let mut session = active_session();
        session
            .on_intent(
                Intent::EditCard {
                    list_id: ListId::new("done"),
                    card_id: CardId::new("x"),
                    title: "Found".into(),
                },
                unused_temp(),
            )
            .unwrap();
        let (list_id, _, card) = session.board().find_card(&CardId::new("x")).unwrap();
        assert_eq!(list_id, &ListId::new("doing"));
        assert_eq!(card.title, "Found");
    }

    #[test]
    fn edit_of_unknown_card_is_rejected() {
        let mut session = active_session();
        let result = session.on_intent(
            Intent::EditCard {
                list_id: ListId::new("todo"),
                card_id: CardId::new("ghost"),
                title: "x".into(),
            },
            unused_temp(),
        );
        assert_eq!(result, Err(IntentError::UnknownCard(CardId::new("ghost"))));
    }

    #[test]
    fn delete_failure_does_not_reinsert() {
        let mut session = active_session();
        let dispatch = session
            .on_intent(
                Intent::DeleteCard {
                    list_id: ListId::new("todo"),
                    card_id: CardId::new("a"),
                },
                unused_temp(),
            )
            .unwrap();
        assert_eq!(ids(&session, "todo"), vec!["b"]);
        assert!(session.is_pending(&CardId::new("a")));

        let outcome = session.on_settled(
            dispatch.epoch,
            Settlement::Deleted {
                card_id: CardId::new("a"),
                result: Err(GatewayError::Request("timeout".into())),
            },
        );

        assert!(!outcome.is_success());
        assert_eq!(ids(&session, "todo"), vec!["b"]);
        assert!(!session.is_pending(&CardId::new("a")));
    }

    // ===========================================
    // Move Tests
    // ===========================================

    #[test]
    fn cross_list_move_to_head_steps_below_first_card() {
        let mut session = active_session();
        let dispatch = session
            .on_intent(move_intent("b", "todo", 1, "doing", 0), unused_temp())
            .unwrap();

        assert_eq!(ids(&session, "todo"), vec!["a"]);
        assert_eq!(ids(&session, "doing"), vec!["b", "x"]);
        assert_eq!(
            dispatch.effect,
            Effect::UpdateCard {
                update: CardUpdate::placement(CardId::new("b"), ListId::new("doing"), -500.0)
            }
        );
        let (_, _, card) = session.board().find_card(&CardId::new("b")).unwrap();
        assert_eq!(card.sort_order, -500.0);
        assert!(session.is_pending(&CardId::new("b")));
    }

    #[test]
    fn reorder_to_tail_keeps_order_consistent() {
        let mut session = active_session();
        let dispatch = session
            .on_intent(move_intent("a", "todo", 0, "todo", 1), unused_temp())
            .unwrap();

        assert_eq!(ids(&session, "todo"), vec!["b", "a"]);
        let Effect::UpdateCard { update } = dispatch.effect else {
            panic!("expected UpdateCard");
        };
        assert_eq!(update.sort_order, Some(3000.0));
        assert!(session.board().check_invariants().is_ok());
    }

    #[test]
    fn move_between_neighbours_uses_midpoint() {
        let mut session = active_session();
        session
            .on_intent(move_intent("x", "doing", 0, "todo", 1), unused_temp())
            .unwrap();

        assert_eq!(ids(&session, "todo"), vec!["a", "x", "b"]);
        let (_, _, card) = session.board().find_card(&CardId::new("x")).unwrap();
        assert_eq!(card.sort_order, 1500.0);
    }

    #[test]
    fn move_with_stale_index_relocates_by_id() {
        let mut session = active_session();
        // "b" is reported at index 0, but it is at index 1.
        session
            .on_intent(move_intent("b", "todo", 0, "done", 0), unused_temp())
            .unwrap();

        assert_eq!(ids(&session, "todo"), vec!["a"]);
        assert_eq!(ids(&session, "done"), vec!["b"]);
    }

    #[test]
    fn move_of_unknown_card_is_rejected() {
        let mut session = active_session();
        let before = session.snapshot();
        let result = session.on_intent(move_intent("ghost", "todo", 0, "done", 0), unused_temp());
        assert_eq!(result, Err(IntentError::UnknownCard(CardId::new("ghost"))));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn move_failure_keeps_visual_move() {
        let mut session = active_session();
        let dispatch = session
            .on_intent(move_intent("a", "todo", 0, "done", 0), unused_temp())
            .unwrap();
        session.on_settled(
            dispatch.epoch,
            Settlement::Updated {
                card_id: CardId::new("a"),
                result: Err(GatewayError::Request("offline".into())),
            },
        );
        assert_eq!(ids(&session, "done"), vec!["a"]);
        assert!(session.pending().is_empty());
    }

    #[test]
    fn move_into_exhausted_gap_is_flagged() {
        let mut session = Session::new();
        let epoch = session.begin_activation();
        session.on_loaded(
            epoch,
            vec![list_record("l", "L", 1.0)],
            vec![
                card_record("lo", "l", 1.0),
                card_record("hi", "l", 1.0 + f64::EPSILON),
                card_record("m", "l", 5.0),
            ],
        );
        let dispatch = session
            .on_intent(move_intent("m", "l", 2, "l", 1), unused_temp())
            .unwrap();
        assert!(dispatch.crowded);
    }

    // ===========================================
    // Settlement Bookkeeping Tests
    // ===========================================

    #[test]
    fn settlement_from_previous_activation_is_ignored() {
        let mut session = active_session();
        let dispatch = create(&mut session, "todo", "late", "tmp-1");

        // Page reactivated while the call was in flight.
        let epoch = session.begin_activation();
        session.on_loaded(epoch, vec![list_record("todo", "To Do", 1000.0)], vec![]);

        let outcome = session.on_settled(
            dispatch.epoch,
            Settlement::Created {
                temp_id: CardId::new("tmp-1"),
                list_id: ListId::new("todo"),
                result: Ok(Some(card_record("srv-1", "todo", 3000.0))),
            },
        );

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(session.board().card_count(), 0);
    }

    #[test]
    fn successful_delete_sweeps_every_list() {
        let mut session = active_session();
        let dispatch = session
            .on_intent(
                Intent::DeleteCard {
                    list_id: ListId::new("todo"),
                    card_id: CardId::new("a"),
                },
                unused_temp(),
            )
            .unwrap();
        // A late echo re-inserted the card elsewhere.
        let mut echo = session.snapshot();
        echo.board = echo
            .board
            .insert_card(&ListId::new("done"), Card::new(CardId::new("a"), "a", 1.0));
        session.board = echo.board;

        session.on_settled(
            dispatch.epoch,
            Settlement::Deleted {
                card_id: CardId::new("a"),
                result: Ok(()),
            },
        );
        assert!(session.board().find_card(&CardId::new("a")).is_none());
    }

    // ===========================================
    // Concurrent Call Tests
    // ===========================================

    fn update_of(dispatch: &Dispatch) -> CardUpdate {
        match &dispatch.effect {
            Effect::UpdateCard { update } => update.clone(),
            other => panic!("expected UpdateCard, got {other:?}"),
        }
    }

    fn server_card(id: &str, title: &str, list_id: &str, sort_order: f64) -> CardRecord {
        CardRecord {
            id: CardId::new(id),
            title: title.into(),
            list_id: ListId::new(list_id),
            sort_order,
            created_at: None,
        }
    }

    #[test]
    fn card_moved_before_create_settles_keeps_its_placement() {
        let mut session = active_session();
        let created = create(&mut session, "todo", "n", "tmp-1");
        let moved = session
            .on_intent(move_intent("tmp-1", "todo", 2, "doing", 0), unused_temp())
            .unwrap();
        assert_eq!(
            update_of(&moved),
            CardUpdate::placement(CardId::new("tmp-1"), ListId::new("doing"), -500.0)
        );

        let outcome = session.on_settled(
            created.epoch,
            Settlement::Created {
                temp_id: CardId::new("tmp-1"),
                list_id: ListId::new("todo"),
                result: Ok(Some(server_card("srv-1", "n", "todo", 3000.0))),
            },
        );
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(ids(&session, "doing"), vec!["srv-1", "x"]);
        assert_eq!(ids(&session, "todo"), vec!["a", "b"]);
        session.board().check_invariants().unwrap();

        // The local placement is replayed under the server id.
        let follow_ups = session.take_follow_ups();
        assert_eq!(follow_ups.len(), 1);
        let replay = update_of(&follow_ups[0]);
        assert_eq!(replay.id, CardId::new("srv-1"));
        assert_eq!(replay.list_id, Some(ListId::new("doing")));
        assert_eq!(replay.sort_order, Some(-500.0));
        assert_eq!(replay.title.as_deref(), Some("n"));
        assert!(session.is_pending(&CardId::new("srv-1")));
        assert!(session.take_follow_ups().is_empty());

        // The server never knew the temporary id.
        let outcome = session.on_settled(
            moved.epoch,
            Settlement::Updated {
                card_id: CardId::new("tmp-1"),
                result: Ok(None),
            },
        );
        assert_eq!(outcome, Outcome::Failure(RemoteError::NullResult));
        session.board().check_invariants().unwrap();

        let outcome = session.on_settled(
            follow_ups[0].epoch,
            Settlement::Updated {
                card_id: CardId::new("srv-1"),
                result: Ok(Some(server_card("srv-1", "n", "doing", -500.0))),
            },
        );
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(ids(&session, "doing"), vec!["srv-1", "x"]);
        assert!(session.pending().is_empty());
        session.board().check_invariants().unwrap();
    }

    #[test]
    fn card_renamed_before_create_settles_replays_title() {
        let mut session = active_session();
        let created = create(&mut session, "todo", "draft", "tmp-1");
        session
            .on_intent(
                Intent::EditCard {
                    list_id: ListId::new("todo"),
                    card_id: CardId::new("tmp-1"),
                    title: "final".into(),
                },
                unused_temp(),
            )
            .unwrap();

        session.on_settled(
            created.epoch,
            Settlement::Created {
                temp_id: CardId::new("tmp-1"),
                list_id: ListId::new("todo"),
                result: Ok(Some(server_card("srv-1", "draft", "todo", 3000.0))),
            },
        );

        assert_eq!(ids(&session, "todo"), vec!["a", "b", "srv-1"]);
        let (_, _, card) = session.board().find_card(&CardId::new("srv-1")).unwrap();
        assert_eq!(card.title, "final");
        let follow_ups = session.take_follow_ups();
        assert_eq!(update_of(&follow_ups[0]).title.as_deref(), Some("final"));
    }

    #[test]
    fn card_deleted_before_create_settles_is_deleted_remotely() {
        let mut session = active_session();
        let created = create(&mut session, "todo", "oops", "tmp-1");
        session
            .on_intent(
                Intent::DeleteCard {
                    list_id: ListId::new("todo"),
                    card_id: CardId::new("tmp-1"),
                },
                unused_temp(),
            )
            .unwrap();

        session.on_settled(
            created.epoch,
            Settlement::Created {
                temp_id: CardId::new("tmp-1"),
                list_id: ListId::new("todo"),
                result: Ok(Some(server_card("srv-1", "oops", "todo", 3000.0))),
            },
        );

        assert!(session.board().find_card(&CardId::new("srv-1")).is_none());
        let follow_ups = session.take_follow_ups();
        assert_eq!(follow_ups.len(), 1);
        assert_eq!(
            follow_ups[0].effect,
            Effect::DeleteCard {
                card_id: CardId::new("srv-1")
            }
        );
    }

    #[test]
    fn untouched_create_queues_no_follow_up() {
        let mut session = active_session();
        let created = create(&mut session, "todo", "n", "tmp-1");
        session.on_settled(
            created.epoch,
            Settlement::Created {
                temp_id: CardId::new("tmp-1"),
                list_id: ListId::new("todo"),
                result: Ok(Some(server_card("srv-1", "n", "todo", 3000.0))),
            },
        );
        assert!(session.take_follow_ups().is_empty());
        assert!(session.pending().is_empty());
    }

    #[test]
    fn out_of_order_move_echoes_keep_lists_sorted() {
        let mut session = active_session();
        let first = session
            .on_intent(move_intent("a", "todo", 0, "done", 0), unused_temp())
            .unwrap();
        let second = session
            .on_intent(move_intent("a", "done", 0, "doing", 1), unused_temp())
            .unwrap();
        assert_eq!(ids(&session, "doing"), vec!["x", "a"]);

        let echo = |update: CardUpdate| {
            let mut row = card_record("a", "todo", 1000.0);
            update.apply_to(&mut row);
            row
        };

        // The later call settles first.
        session.on_settled(
            second.epoch,
            Settlement::Updated {
                card_id: CardId::new("a"),
                result: Ok(Some(echo(update_of(&second)))),
            },
        );
        session.board().check_invariants().unwrap();

        // The earlier echo arrives last and wins, at a consistent position.
        session.on_settled(
            first.epoch,
            Settlement::Updated {
                card_id: CardId::new("a"),
                result: Ok(Some(echo(update_of(&first)))),
            },
        );
        session.board().check_invariants().unwrap();
        assert_eq!(ids(&session, "done"), vec!["a"]);
        assert_eq!(ids(&session, "doing"), vec!["x"]);
        assert!(session.pending().is_empty());
    }

    #[test]
    fn echo_for_locally_deleted_card_is_not_reinserted() {
        let mut session = active_session();
        let moved = session
            .on_intent(move_intent("a", "todo", 0, "done", 0), unused_temp())
            .unwrap();
        session
            .on_intent(
                Intent::DeleteCard {
                    list_id: ListId::new("done"),
                    card_id: CardId::new("a"),
                },
                unused_temp(),
            )
            .unwrap();

        session.on_settled(
            moved.epoch,
            Settlement::Updated {
                card_id: CardId::new("a"),
                result: Ok(Some(card_record("a", "done", 10_000.0))),
            },
        );

        assert!(session.board().find_card(&CardId::new("a")).is_none());
    }

    // ===========================================
    // Random Walk Tests
    // ===========================================

    /// Deterministic xorshift so the walk is reproducible.
    struct Rng(u64);

    impl Rng {
        fn next(&mut self, bound: usize) -> usize {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 % bound as u64) as usize
        }
    }

    /// Rows of the remote `cards` table, executing each call when it settles.
    struct Server {
        rows: HashMap<CardId, CardRecord>,
    }

    impl Server {
        fn seeded() -> Self {
            let rows = [
                card_record("a", "todo", 1000.0),
                card_record("x", "doing", 500.0),
                card_record("b", "todo", 2000.0),
            ]
            .into_iter()
            .map(|row| (row.id.clone(), row))
            .collect();
            Self { rows }
        }

        fn execute(&mut self, effect: Effect, fail: bool) -> Settlement {
            let offline = || GatewayError::Request("offline".into());
            match effect {
                Effect::CreateCard { temp_id, new_card } => {
                    let list_id = new_card.list_id.clone();
                    let result = if fail {
                        Err(offline())
                    } else {
                        let row = CardRecord {
                            id: CardId::new(temp_id.as_str().replacen("tmp-", "srv-", 1)),
                            title: new_card.title,
                            list_id: new_card.list_id,
                            sort_order: new_card.sort_order,
                            created_at: None,
                        };
                        self.rows.insert(row.id.clone(), row.clone());
                        Ok(Some(row))
                    };
                    Settlement::Created {
                        temp_id,
                        list_id,
                        result,
                    }
                }
                Effect::UpdateCard { update } => {
                    let result = if fail {
                        Err(offline())
                    } else {
                        Ok(self.rows.get_mut(&update.id).map(|row| {
                            update.apply_to(row);
                            row.clone()
                        }))
                    };
                    Settlement::Updated {
                        card_id: update.id,
                        result,
                    }
                }
                Effect::DeleteCard { card_id } => {
                    let result = if fail {
                        Err(offline())
                    } else {
                        self.rows.remove(&card_id);
                        Ok(())
                    };
                    Settlement::Deleted { card_id, result }
                }
            }
        }

        fn sorted_rows(&self) -> Vec<(String, String, String, f64)> {
            let mut rows: Vec<_> = self
                .rows
                .values()
                .map(|row| {
                    (
                        row.id.to_string(),
                        row.list_id.to_string(),
                        row.title.clone(),
                        row.sort_order,
                    )
                })
                .collect();
            rows.sort_by(|a, b| a.0.cmp(&b.0));
            rows
        }
    }

    fn local_rows(session: &Session) -> Vec<(String, String, String, f64)> {
        let mut rows: Vec<_> = session
            .board()
            .lists()
            .iter()
            .flat_map(|list| {
                list.cards.iter().map(|card| {
                    (
                        card.id.to_string(),
                        list.id.to_string(),
                        card.title.clone(),
                        card.sort_order,
                    )
                })
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    fn random_intent(session: &Session, rng: &mut Rng, n: usize) -> Intent {
        let lists = ["todo", "doing", "done"];
        let all: Vec<(String, usize, CardId)> = session
            .board()
            .lists()
            .iter()
            .flat_map(|list| {
                list.cards
                    .iter()
                    .enumerate()
                    .map(|(i, card)| (list.id.to_string(), i, card.id.clone()))
            })
            .collect();

        match (rng.next(5), all.is_empty()) {
            (0, _) | (_, true) => Intent::CreateCard {
                list_id: ListId::new(lists[rng.next(3)]),
                title: format!("t{n}"),
            },
            (1, false) => {
                let (list, _, card) = &all[rng.next(all.len())];
                Intent::DeleteCard {
                    list_id: ListId::new(list.as_str()),
                    card_id: card.clone(),
                }
            }
            (2, false) => {
                let (list, _, card) = &all[rng.next(all.len())];
                Intent::EditCard {
                    list_id: ListId::new(list.as_str()),
                    card_id: card.clone(),
                    title: format!("e{n}"),
                }
            }
            _ => {
                let (list, index, card) = &all[rng.next(all.len())];
                let to = lists[rng.next(3)];
                let to_len = session.board().list(&ListId::new(to)).unwrap().cards.len();
                move_intent(card.as_str(), list, *index, to, rng.next(to_len + 1))
            }
        }
    }

    /// Interleave intents with settlements of any outstanding call, in random
    /// order. `fail_one_in` of zero means every call succeeds.
    fn walk(seed: u64, fail_one_in: usize) -> (Session, Server) {
        let mut rng = Rng(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut session = active_session();
        let mut server = Server::seeded();
        let mut outstanding: Vec<Dispatch> = Vec::new();

        let mut settle_one = |session: &mut Session, outstanding: &mut Vec<Dispatch>, rng: &mut Rng| {
            let dispatch = outstanding.swap_remove(rng.next(outstanding.len()));
            let fail = fail_one_in > 0 && rng.next(fail_one_in) == 0;
            let settlement = server.execute(dispatch.effect, fail);
            session.on_settled(dispatch.epoch, settlement);
            outstanding.extend(session.take_follow_ups());
            session.board().check_invariants().unwrap();
        };

        for n in 1..=300 {
            if outstanding.is_empty() || rng.next(2) == 0 {
                let intent = random_intent(&session, &mut rng, n);
                let dispatch = session
                    .on_intent(intent, CardId::new(format!("tmp-{n}")))
                    .unwrap();
                session.board().check_invariants().unwrap();
                outstanding.push(dispatch);
            } else {
                settle_one(&mut session, &mut outstanding, &mut rng);
            }
        }
        while !outstanding.is_empty() {
            settle_one(&mut session, &mut outstanding, &mut rng);
        }

        assert!(session.pending().is_empty(), "pending must clear once every call settles");
        (session, server)
    }

    #[test]
    fn random_walk_with_failures_preserves_uniqueness_order_and_pending_lifecycle() {
        for seed in 1..=20u64 {
            walk(seed, 4);
        }
    }

    #[test]
    fn random_walk_without_failures_converges_with_server() {
        for seed in 1..=20u64 {
            let (session, server) = walk(seed, 0);
            assert_eq!(local_rows(&session), server.sorted_rows(), "seed {seed}");
        }
    }
}
