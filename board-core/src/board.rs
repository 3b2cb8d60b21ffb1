//! Canonical in-memory board.
//!
//! [`Board`] is an immutable value: every transition takes `&self` and
//! returns the next board, so consumers can hold on to and compare snapshots.
//! Transitions that address a missing list or card return an unchanged copy.

use std::collections::HashSet;

use board_types::{Card, CardId, CardPatch, List, ListId};
use serde::Serialize;

/// Ordered lists of ordered cards. Single source of truth for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Board {
    lists: Vec<List>,
}

/// A broken board invariant, reported by [`Board::check_invariants`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    /// The same card id appears more than once across the board.
    #[error("card {card_id} appears more than once")]
    DuplicateCard {
        /// The duplicated id.
        card_id: CardId,
    },

    /// Cards of a list are not in ascending sort order.
    #[error("list {list_id} is out of order at index {index}")]
    OutOfOrder {
        /// The offending list.
        list_id: ListId,
        /// Index of the first card whose key is below its predecessor's.
        index: usize,
    },

    /// Two lists share an id.
    #[error("list {list_id} appears more than once")]
    DuplicateList {
        /// The duplicated id.
        list_id: ListId,
    },
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire board with loaded data.
    pub fn initialize(&self, lists: Vec<List>) -> Board {
        Board { lists }
    }

    /// Install default lists, but only when the board is still empty.
    ///
    /// Cards of the given lists are discarded. A non-empty board is returned
    /// unchanged; the guard is the board length, not a separate flag.
    pub fn bootstrap_defaults(&self, lists: Vec<List>) -> Board {
        if !self.lists.is_empty() {
            return self.clone();
        }
        Board {
            lists: lists
                .into_iter()
                .map(|list| List {
                    cards: Vec::new(),
                    ..list
                })
                .collect(),
        }
    }

    /// Append a card to the end of a list.
    pub fn insert_card(&self, list_id: &ListId, card: Card) -> Board {
        self.map_list(list_id, |list| list.cards.push(card))
    }

    /// Merge `patch` into the card `card_id` of list `list_id`.
    pub fn update_card(&self, card_id: &CardId, list_id: &ListId, patch: &CardPatch) -> Board {
        self.map_list(list_id, |list| {
            if let Some(card) = list.cards.iter_mut().find(|card| &card.id == card_id) {
                *card = patch.apply_to(card);
            }
        })
    }

    /// Remove a card from a list.
    pub fn remove_card(&self, list_id: &ListId, card_id: &CardId) -> Board {
        self.map_list(list_id, |list| list.cards.retain(|card| &card.id != card_id))
    }

    /// Remove every instance of a card id, whichever list holds it.
    pub fn purge_card(&self, card_id: &CardId) -> Board {
        let mut next = self.clone();
        for list in &mut next.lists {
            list.cards.retain(|card| &card.id != card_id);
        }
        next
    }

    /// Swap the record identified by `old_id` for `new_card`, keeping its index.
    pub fn replace_card(&self, list_id: &ListId, old_id: &CardId, new_card: Card) -> Board {
        self.map_list(list_id, |list| {
            if let Some(slot) = list.cards.iter_mut().find(|card| &card.id == old_id) {
                *slot = new_card;
            }
        })
    }

    /// Put `card` into `list_id` at the position its sort key calls for.
    ///
    /// Any existing instance of the card id is removed first. A card that
    /// keeps its list and key stays at its index. Nothing changes if the list
    /// is missing.
    pub fn place_card(&self, list_id: &ListId, card: Card) -> Board {
        let Some(dst_pos) = self.list_index(list_id) else {
            return self.clone();
        };
        if let Some((home, index, current)) = self.find_card(&card.id) {
            if home == list_id && current.sort_order == card.sort_order {
                return self.map_list(list_id, |list| list.cards[index] = card);
            }
        }

        let mut next = self.purge_card(&card.id);
        let cards = &mut next.lists[dst_pos].cards;
        let at = cards.partition_point(|c| c.sort_order <= card.sort_order);
        cards.insert(at, card);
        next
    }

    /// Move the card at `from_index` to `to_index` within one list.
    ///
    /// Index based: the caller is responsible for the indices matching the
    /// snapshot it observed. `to_index` is clamped to the list length.
    pub fn reorder_within_list(&self, list_id: &ListId, from_index: usize, to_index: usize) -> Board {
        self.map_list(list_id, |list| {
            if from_index >= list.cards.len() {
                return;
            }
            let card = list.cards.remove(from_index);
            let to_index = to_index.min(list.cards.len());
            list.cards.insert(to_index, card);
        })
    }

    /// Move the card at `from_index` of `source` to `to_index` of `dest`.
    ///
    /// `to_index` is clamped to the destination length. Nothing changes if
    /// either list is missing or `from_index` is out of range.
    pub fn move_across_lists(
        &self,
        source: &ListId,
        dest: &ListId,
        from_index: usize,
        to_index: usize,
    ) -> Board {
        if source == dest {
            return self.reorder_within_list(source, from_index, to_index);
        }
        let (Some(src_pos), Some(dst_pos)) = (self.list_index(source), self.list_index(dest)) else {
            return self.clone();
        };
        if from_index >= self.lists[src_pos].cards.len() {
            return self.clone();
        }

        let mut next = self.clone();
        let card = next.lists[src_pos].cards.remove(from_index);
        let dest_cards = &mut next.lists[dst_pos].cards;
        let to_index = to_index.min(dest_cards.len());
        dest_cards.insert(to_index, card);
        next
    }

    /// All lists in display order.
    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    /// Look up a list by id.
    pub fn list(&self, list_id: &ListId) -> Option<&List> {
        self.lists.iter().find(|list| &list.id == list_id)
    }

    /// Locate a card anywhere on the board.
    ///
    /// Returns the owning list id, the card's index, and the card.
    pub fn find_card(&self, card_id: &CardId) -> Option<(&ListId, usize, &Card)> {
        self.lists.iter().find_map(|list| {
            list.position(card_id)
                .map(|index| (&list.id, index, &list.cards[index]))
        })
    }

    /// Whether the board has no lists.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Number of lists.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Number of cards across all lists.
    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|list| list.cards.len()).sum()
    }

    /// Check list/card uniqueness and per-list ascending order.
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seen_lists = HashSet::new();
        let mut seen_cards = HashSet::new();

        for list in &self.lists {
            if !seen_lists.insert(&list.id) {
                return Err(InvariantViolation::DuplicateList {
                    list_id: list.id.clone(),
                });
            }
            for (index, card) in list.cards.iter().enumerate() {
                if !seen_cards.insert(&card.id) {
                    return Err(InvariantViolation::DuplicateCard {
                        card_id: card.id.clone(),
                    });
                }
                if index > 0 && card.sort_order < list.cards[index - 1].sort_order {
                    return Err(InvariantViolation::OutOfOrder {
                        list_id: list.id.clone(),
                        index,
                    });
                }
            }
        }
        Ok(())
    }

    fn list_index(&self, list_id: &ListId) -> Option<usize> {
        self.lists.iter().position(|list| &list.id == list_id)
    }

    fn map_list(&self, list_id: &ListId, f: impl FnOnce(&mut List)) -> Board {
        let mut next = self.clone();
        if let Some(list) = next.lists.iter_mut().find(|list| &list.id == list_id) {
            f(list);
        }
        next
    }
}
