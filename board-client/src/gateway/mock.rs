//! Mock gateway for testing.
//!
//! Keeps `lists` and `cards` tables in memory, issues server ids, and lets
//! tests inject failures, null results and held (in-flight) calls.

use super::{GatewayOp, RemoteGateway};
use async_trait::async_trait;
use board_types::{
    CardId, CardRecord, CardUpdate, GatewayError, ListId, ListRecord, NewCard, NewList,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// A call received by the mock, with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    /// `load_lists()`
    LoadLists,
    /// `load_cards()`
    LoadCards,
    /// `create_list(list)`
    CreateList(NewList),
    /// `create_card(card)`
    CreateCard(NewCard),
    /// `update_card(update)`
    UpdateCard(CardUpdate),
    /// `delete_card(id)`
    DeleteCard(CardId),
}

impl GatewayCall {
    /// Which operation this call was.
    pub fn op(&self) -> GatewayOp {
        match self {
            GatewayCall::LoadLists => GatewayOp::LoadLists,
            GatewayCall::LoadCards => GatewayOp::LoadCards,
            GatewayCall::CreateList(_) => GatewayOp::CreateList,
            GatewayCall::CreateCard(_) => GatewayOp::CreateCard,
            GatewayCall::UpdateCard(_) => GatewayOp::UpdateCard,
            GatewayCall::DeleteCard(_) => GatewayOp::DeleteCard,
        }
    }
}

/// Mock gateway for testing.
///
/// Clones share state, so a test can keep a handle while the client owns
/// another.
#[derive(Debug, Default)]
pub struct MockGateway {
    inner: Arc<Mutex<MockGatewayInner>>,
}

#[derive(Debug, Default)]
struct MockGatewayInner {
    lists: Vec<ListRecord>,
    cards: Vec<CardRecord>,
    next_id: u64,
    operations: Vec<GatewayCall>,
    fail_next: HashMap<GatewayOp, String>,
    null_next: HashSet<GatewayOp>,
    held: HashMap<GatewayOp, Arc<Semaphore>>,
}

impl MockGatewayInner {
    fn issue_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// What a call should do once it is allowed to proceed.
enum Armed {
    Fail(String),
    Null,
    Normal,
}

impl MockGateway {
    /// Create a mock with empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a list row directly, bypassing the call log.
    pub fn seed_list(&self, title: &str, sort_order: f64) -> ListRecord {
        let mut inner = self.inner.lock().unwrap();
        let record = ListRecord {
            id: ListId::new(inner.issue_id("list")),
            title: title.to_string(),
            sort_order,
            created_at: None,
        };
        inner.lists.push(record.clone());
        record
    }

    /// Insert a card row directly, bypassing the call log.
    pub fn seed_card(&self, list_id: &ListId, title: &str, sort_order: f64) -> CardRecord {
        let mut inner = self.inner.lock().unwrap();
        let record = CardRecord {
            id: CardId::new(inner.issue_id("card")),
            title: title.to_string(),
            list_id: list_id.clone(),
            sort_order,
            created_at: None,
        };
        inner.cards.push(record.clone());
        record
    }

    /// Current `lists` table, in insertion order.
    pub fn lists(&self) -> Vec<ListRecord> {
        let inner = self.inner.lock().unwrap();
        inner.lists.clone()
    }

    /// Current `cards` table, in insertion order.
    pub fn cards(&self) -> Vec<CardRecord> {
        let inner = self.inner.lock().unwrap();
        inner.cards.clone()
    }

    /// Look up a stored card.
    pub fn card(&self, card_id: &CardId) -> Option<CardRecord> {
        let inner = self.inner.lock().unwrap();
        inner.cards.iter().find(|card| &card.id == card_id).cloned()
    }

    /// Every call received so far, in arrival order.
    pub fn operations(&self) -> Vec<GatewayCall> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// The most recent call.
    pub fn last_operation(&self) -> Option<GatewayCall> {
        let inner = self.inner.lock().unwrap();
        inner.operations.last().cloned()
    }

    /// Number of calls received for one operation.
    pub fn count(&self, op: GatewayOp) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.operations.iter().filter(|call| call.op() == op).count()
    }

    /// Cause the next call of `op` to fail with the given error.
    pub fn fail_next(&self, op: GatewayOp, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next.insert(op, error.to_string());
    }

    /// Cause the next call of `op` to succeed without returning a row.
    ///
    /// No table is changed by that call.
    pub fn null_next(&self, op: GatewayOp) {
        let mut inner = self.inner.lock().unwrap();
        inner.null_next.insert(op);
    }

    /// Keep every call of `op` started from now on in flight until
    /// [`release`](Self::release).
    pub fn hold(&self, op: GatewayOp) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .held
            .entry(op)
            .or_insert_with(|| Arc::new(Semaphore::new(0)));
    }

    /// Let held calls of `op` complete.
    pub fn release(&self, op: GatewayOp) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(gate) = inner.held.remove(&op) {
            gate.close();
        }
    }

    /// Clear all state (tables, log, injected behaviour). Held calls are
    /// released.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        for gate in inner.held.values() {
            gate.close();
        }
        *inner = MockGatewayInner::default();
    }

    /// Log the call, take any injected behaviour, then wait at the gate.
    async fn enter(&self, call: GatewayCall) -> Armed {
        let op = call.op();
        let (armed, gate) = {
            let mut inner = self.inner.lock().unwrap();
            inner.operations.push(call);
            let armed = if let Some(error) = inner.fail_next.remove(&op) {
                Armed::Fail(error)
            } else if inner.null_next.remove(&op) {
                Armed::Null
            } else {
                Armed::Normal
            };
            (armed, inner.held.get(&op).cloned())
        };

        if let Some(gate) = gate {
            // Closed on release; the error is the wake-up signal.
            let _ = gate.acquire().await;
        }
        armed
    }
}

impl Clone for MockGateway {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    async fn load_lists(&self) -> Result<Vec<ListRecord>, GatewayError> {
        if let Armed::Fail(error) = self.enter(GatewayCall::LoadLists).await {
            return Err(GatewayError::Request(error));
        }
        let mut lists = self.lists();
        lists.sort_by(|a, b| a.sort_order.total_cmp(&b.sort_order));
        Ok(lists)
    }

    async fn load_cards(&self) -> Result<Vec<CardRecord>, GatewayError> {
        if let Armed::Fail(error) = self.enter(GatewayCall::LoadCards).await {
            return Err(GatewayError::Request(error));
        }
        let mut cards = self.cards();
        cards.sort_by(|a, b| a.sort_order.total_cmp(&b.sort_order));
        Ok(cards)
    }

    async fn create_list(&self, list: NewList) -> Result<Option<ListRecord>, GatewayError> {
        match self.enter(GatewayCall::CreateList(list.clone())).await {
            Armed::Fail(error) => Err(GatewayError::Request(error)),
            Armed::Null => Ok(None),
            Armed::Normal => {
                let mut inner = self.inner.lock().unwrap();
                let record = ListRecord {
                    id: ListId::new(inner.issue_id("list")),
                    title: list.title,
                    sort_order: list.sort_order,
                    created_at: None,
                };
                inner.lists.push(record.clone());
                Ok(Some(record))
            }
        }
    }

    async fn create_card(&self, card: NewCard) -> Result<Option<CardRecord>, GatewayError> {
        match self.enter(GatewayCall::CreateCard(card.clone())).await {
            Armed::Fail(error) => Err(GatewayError::Request(error)),
            Armed::Null => Ok(None),
            Armed::Normal => {
                let mut inner = self.inner.lock().unwrap();
                if !inner.lists.iter().any(|list| list.id == card.list_id) {
                    return Err(GatewayError::Rejected(format!(
                        "list {} does not exist",
                        card.list_id
                    )));
                }
                let record = CardRecord {
                    id: CardId::new(inner.issue_id("card")),
                    title: card.title,
                    list_id: card.list_id,
                    sort_order: card.sort_order,
                    created_at: None,
                };
                inner.cards.push(record.clone());
                Ok(Some(record))
            }
        }
    }

    async fn update_card(&self, update: CardUpdate) -> Result<Option<CardRecord>, GatewayError> {
        match self.enter(GatewayCall::UpdateCard(update.clone())).await {
            Armed::Fail(error) => Err(GatewayError::Request(error)),
            Armed::Null => Ok(None),
            Armed::Normal => {
                let mut inner = self.inner.lock().unwrap();
                let stored = inner.cards.iter_mut().find(|card| card.id == update.id);
                Ok(stored.map(|card| {
                    update.apply_to(card);
                    card.clone()
                }))
            }
        }
    }

    async fn delete_card(&self, card_id: &CardId) -> Result<(), GatewayError> {
        match self.enter(GatewayCall::DeleteCard(card_id.clone())).await {
            Armed::Fail(error) => Err(GatewayError::Request(error)),
            Armed::Null | Armed::Normal => {
                let mut inner = self.inner.lock().unwrap();
                inner.cards.retain(|card| &card.id != card_id);
                Ok(())
            }
        }
    }
}
