//! JSON-file gateway.
//!
//! Stores the `lists` and `cards` tables in one JSON document so the board
//! can be driven from the command line without a server:
//!
//! ```json
//! { "next_id": 6, "lists": [...], "cards": [...] }
//! ```
//!
//! Every call reads the file, applies the change and writes it back through
//! a temporary file and rename. Calls are serialized by an async mutex.

use async_trait::async_trait;
use board_client::RemoteGateway;
use board_types::{
    CardId, CardRecord, CardUpdate, GatewayError, ListId, ListRecord, NewCard, NewList,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::debug;

/// On-disk document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    lists: Vec<ListRecord>,
    #[serde(default)]
    cards: Vec<CardRecord>,
}

impl Tables {
    fn issue_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// Gateway backed by a local JSON file.
#[derive(Debug)]
pub struct JsonFileGateway {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileGateway {
    /// Use the document at `path`. A missing file is an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Tables, GatewayError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| GatewayError::Decode(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Tables::default()),
            Err(e) => Err(GatewayError::Io(e.to_string())),
        }
    }

    async fn write(&self, tables: &Tables) -> Result<(), GatewayError> {
        let content = serde_json::to_string_pretty(tables).map_err(|e| GatewayError::Encode(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| GatewayError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| GatewayError::Io(e.to_string()))
    }

    /// Read, modify and write back under the lock.
    async fn update<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R, GatewayError>) -> Result<R, GatewayError> {
        let _guard = self.lock.lock().await;
        let mut tables = self.read().await?;
        let result = f(&mut tables)?;
        self.write(&tables).await?;
        Ok(result)
    }
}

fn timestamp() -> Option<String> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(secs.to_string())
}

fn by_sort_order<T>(rows: &mut [T], key: impl Fn(&T) -> f64) {
    rows.sort_by(|a, b| key(a).total_cmp(&key(b)));
}

#[async_trait]
impl RemoteGateway for JsonFileGateway {
    async fn load_lists(&self) -> Result<Vec<ListRecord>, GatewayError> {
        let _guard = self.lock.lock().await;
        let mut lists = self.read().await?.lists;
        by_sort_order(&mut lists, |list| list.sort_order);
        Ok(lists)
    }

    async fn load_cards(&self) -> Result<Vec<CardRecord>, GatewayError> {
        let _guard = self.lock.lock().await;
        let mut cards = self.read().await?.cards;
        by_sort_order(&mut cards, |card| card.sort_order);
        Ok(cards)
    }

    async fn create_list(&self, list: NewList) -> Result<Option<ListRecord>, GatewayError> {
        self.update(|tables| {
            let record = ListRecord {
                id: ListId::new(tables.issue_id("list")),
                title: list.title,
                sort_order: list.sort_order,
                created_at: timestamp(),
            };
            debug!(list_id = %record.id, "stored list");
            tables.lists.push(record.clone());
            Ok(Some(record))
        })
        .await
    }

    async fn create_card(&self, card: NewCard) -> Result<Option<CardRecord>, GatewayError> {
        self.update(|tables| {
            if !tables.lists.iter().any(|list| list.id == card.list_id) {
                return Err(GatewayError::Rejected(format!("list {} does not exist", card.list_id)));
            }
            let record = CardRecord {
                id: CardId::new(tables.issue_id("card")),
                title: card.title,
                list_id: card.list_id,
                sort_order: card.sort_order,
                created_at: timestamp(),
            };
            debug!(card_id = %record.id, "stored card");
            tables.cards.push(record.clone());
            Ok(Some(record))
        })
        .await
    }

    async fn update_card(&self, update: CardUpdate) -> Result<Option<CardRecord>, GatewayError> {
        self.update(|tables| {
            let stored = tables.cards.iter_mut().find(|card| card.id == update.id);
            Ok(stored.map(|card| {
                update.apply_to(card);
                card.clone()
            }))
        })
        .await
    }

    async fn delete_card(&self, card_id: &CardId) -> Result<(), GatewayError> {
        self.update(|tables| {
            tables.cards.retain(|card| &card.id != card_id);
            Ok(())
        })
        .await
    }
}
