// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The Cashbook Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Storage seam for the two ledger tables.
//!
//! [`LedgerStore`] is the relational table pair as a black box: ordered
//! scans, top-row lookups, insert/update/delete returning what they
//! touched, and id sequences that rewind after a last-row delete.
//! [`MemoryStore`] is the in-process implementation backing the CLI, the
//! demo server, and tests.

use crate::base::{ActorId, EntryId};
use crate::entry::{EntryDraft, EntryKind, PendingEntry, PostedEntry};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Row payload for inserting a posted entry. The store assigns the id;
/// everything else, timestamps included, is decided by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPostedEntry {
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    pub balance: Decimal,
    pub actor: ActorId,
    pub executed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Row payload for inserting a pending entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPendingEntry {
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    pub actor: ActorId,
    pub created_at: DateTime<Utc>,
}

/// The posted and pending tables as seen by the ledger service.
///
/// Implementations must keep each method atomic with respect to the
/// others: scans never observe torn rows, and an insert that returns
/// `Ok` is durable within the store's own terms. Serialization of
/// balance reads against writes is not the store's job; the service
/// holds its write gate across read-then-insert sequences.
pub trait LedgerStore: Send + Sync {
    /// All posted entries in ascending id order.
    fn posted(&self) -> Result<Vec<PostedEntry>, StoreError>;

    /// The highest-id posted entry, if any.
    fn last_posted(&self) -> Result<Option<PostedEntry>, StoreError>;

    /// Appends a posted entry under the next sequence id and returns the
    /// stored row.
    fn insert_posted(&self, row: NewPostedEntry) -> Result<PostedEntry, StoreError>;

    /// Replaces only the description of the given posted entry,
    /// returning the updated row, or `None` if no row has that id.
    fn amend_posted_description(
        &self,
        id: EntryId,
        description: &str,
    ) -> Result<Option<PostedEntry>, StoreError>;

    /// Deletes the highest-id posted entry and rewinds the posted
    /// sequence by one, so the next insert reuses the freed id. Returns
    /// the deleted id, or `None` if the table is empty.
    fn delete_last_posted(&self) -> Result<Option<EntryId>, StoreError>;

    /// All pending entries in ascending id order.
    fn pending(&self) -> Result<Vec<PendingEntry>, StoreError>;

    /// The highest-id pending entry, if any.
    fn last_pending(&self) -> Result<Option<PendingEntry>, StoreError>;

    /// Appends a pending entry under the next sequence id and returns
    /// the stored row.
    fn insert_pending(&self, row: NewPendingEntry) -> Result<PendingEntry, StoreError>;

    /// Replaces kind, amount, description, and actor of the given
    /// pending entry, preserving `created_at`. Returns the updated row,
    /// or `None` if no row has that id.
    fn update_pending(
        &self,
        id: EntryId,
        draft: &EntryDraft,
    ) -> Result<Option<PendingEntry>, StoreError>;

    /// Deletes the given pending entry, returning its id, or `None` if
    /// no row has that id. Deleting the top row rewinds the pending
    /// sequence by one; mid-table deletes leave a gap.
    fn delete_pending(&self, id: EntryId) -> Result<Option<EntryId>, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    posted: BTreeMap<EntryId, PostedEntry>,
    pending: BTreeMap<EntryId, PendingEntry>,
    posted_seq: i64,
    pending_seq: i64,
}

impl Tables {
    fn assert_invariants(&self) {
        debug_assert_eq!(
            self.posted_seq,
            self.posted.last_key_value().map(|(id, _)| id.0).unwrap_or(0),
            "posted sequence must track the top posted id"
        );
        debug_assert!(
            self.pending_seq >= self.pending.last_key_value().map(|(id, _)| id.0).unwrap_or(0),
            "pending sequence must never fall behind the top pending id"
        );
    }
}

/// In-memory [`LedgerStore`]: BTreeMap tables and sequence counters
/// behind a single read-write lock. Never actually fails; every method
/// returns `Ok`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore { tables: RwLock::new(Tables::default()) }
    }
}

impl LedgerStore for MemoryStore {
    fn posted(&self) -> Result<Vec<PostedEntry>, StoreError> {
        Ok(self.tables.read().posted.values().cloned().collect())
    }

    fn last_posted(&self) -> Result<Option<PostedEntry>, StoreError> {
        Ok(self.tables.read().posted.last_key_value().map(|(_, row)| row.clone()))
    }

    fn insert_posted(&self, row: NewPostedEntry) -> Result<PostedEntry, StoreError> {
        let mut tables = self.tables.write();
        tables.posted_seq += 1;
        let id = EntryId(tables.posted_seq);
        let stored = PostedEntry {
            id,
            kind: row.kind,
            amount: row.amount,
            description: row.description,
            balance: row.balance,
            actor: row.actor,
            executed_at: row.executed_at,
            created_at: row.created_at,
        };
        tables.posted.insert(id, stored.clone());
        tables.assert_invariants();
        Ok(stored)
    }

    fn amend_posted_description(
        &self,
        id: EntryId,
        description: &str,
    ) -> Result<Option<PostedEntry>, StoreError> {
        let mut tables = self.tables.write();
        Ok(tables.posted.get_mut(&id).map(|row| {
            row.description = description.to_string();
            row.clone()
        }))
    }

    fn delete_last_posted(&self) -> Result<Option<EntryId>, StoreError> {
        let mut tables = self.tables.write();
        match tables.posted.pop_last() {
            Some((id, _)) => {
                tables.posted_seq -= 1;
                tables.assert_invariants();
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    fn pending(&self) -> Result<Vec<PendingEntry>, StoreError> {
        Ok(self.tables.read().pending.values().cloned().collect())
    }

    fn last_pending(&self) -> Result<Option<PendingEntry>, StoreError> {
        Ok(self.tables.read().pending.last_key_value().map(|(_, row)| row.clone()))
    }

    fn insert_pending(&self, row: NewPendingEntry) -> Result<PendingEntry, StoreError> {
        let mut tables = self.tables.write();
        tables.pending_seq += 1;
        let id = EntryId(tables.pending_seq);
        let stored = PendingEntry {
            id,
            kind: row.kind,
            amount: row.amount,
            description: row.description,
            actor: row.actor,
            created_at: row.created_at,
        };
        tables.pending.insert(id, stored.clone());
        tables.assert_invariants();
        Ok(stored)
    }

    fn update_pending(
        &self,
        id: EntryId,
        draft: &EntryDraft,
    ) -> Result<Option<PendingEntry>, StoreError> {
        let mut tables = self.tables.write();
        Ok(tables.pending.get_mut(&id).map(|row| {
            row.kind = draft.kind;
            row.amount = draft.amount;
            row.description = draft.description.clone();
            row.actor = draft.actor;
            row.clone()
        }))
    }

    fn delete_pending(&self, id: EntryId) -> Result<Option<EntryId>, StoreError> {
        let mut tables = self.tables.write();
        match tables.pending.remove(&id) {
            Some(_) => {
                // Only a top-row delete rewinds the sequence; gaps left
                // by mid-table deletes stay unused, like a database
                // sequence.
                if id.0 == tables.pending_seq {
                    tables.pending_seq -= 1;
                }
                tables.assert_invariants();
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LedgerStore, MemoryStore, NewPendingEntry, NewPostedEntry};
    use crate::base::{ActorId, EntryId};
    use crate::entry::{EntryDraft, EntryKind};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn posted_row(amount: rust_decimal::Decimal, balance: rust_decimal::Decimal) -> NewPostedEntry {
        let now = Utc::now();
        NewPostedEntry {
            kind: EntryKind::Input,
            amount,
            description: "haulage".into(),
            balance,
            actor: ActorId(1),
            executed_at: now,
            created_at: now,
        }
    }

    fn pending_row(description: &str) -> NewPendingEntry {
        NewPendingEntry {
            kind: EntryKind::Output,
            amount: dec!(5),
            description: description.into(),
            actor: ActorId(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn posted_ids_are_sequential_and_scans_ordered() {
        let store = MemoryStore::new();
        let a = store.insert_posted(posted_row(dec!(10), dec!(10))).unwrap();
        let b = store.insert_posted(posted_row(dec!(5), dec!(15))).unwrap();
        assert_eq!(a.id, EntryId(1));
        assert_eq!(b.id, EntryId(2));
        let ids: Vec<_> = store.posted().unwrap().into_iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![EntryId(1), EntryId(2)]);
        assert_eq!(store.last_posted().unwrap().map(|row| row.id), Some(EntryId(2)));
    }

    #[test]
    fn delete_last_frees_the_id_for_reuse() {
        let store = MemoryStore::new();
        store.insert_posted(posted_row(dec!(10), dec!(10))).unwrap();
        store.insert_posted(posted_row(dec!(5), dec!(15))).unwrap();
        assert_eq!(store.delete_last_posted().unwrap(), Some(EntryId(2)));
        let again = store.insert_posted(posted_row(dec!(7), dec!(17))).unwrap();
        assert_eq!(again.id, EntryId(2));
    }

    #[test]
    fn delete_last_on_empty_table_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.delete_last_posted().unwrap(), None);
    }

    #[test]
    fn amend_description_touches_only_that_field() {
        let store = MemoryStore::new();
        let row = store.insert_posted(posted_row(dec!(10), dec!(10))).unwrap();
        let updated = store
            .amend_posted_description(row.id, "diesel, north route")
            .unwrap()
            .unwrap();
        assert_eq!(updated.description, "diesel, north route");
        assert_eq!(updated.amount, row.amount);
        assert_eq!(updated.balance, row.balance);
        assert_eq!(updated.created_at, row.created_at);
        assert_eq!(store.amend_posted_description(EntryId(99), "x").unwrap(), None);
    }

    #[test]
    fn pending_sequence_rewinds_only_on_top_row_delete() {
        let store = MemoryStore::new();
        store.insert_pending(pending_row("a")).unwrap();
        store.insert_pending(pending_row("b")).unwrap();
        store.insert_pending(pending_row("c")).unwrap();

        // Mid-table delete leaves a gap and keeps the sequence.
        assert_eq!(store.delete_pending(EntryId(2)).unwrap(), Some(EntryId(2)));
        let d = store.insert_pending(pending_row("d")).unwrap();
        assert_eq!(d.id, EntryId(4));

        // Top-row delete rewinds, so the id is reused.
        assert_eq!(store.delete_pending(EntryId(4)).unwrap(), Some(EntryId(4)));
        let e = store.insert_pending(pending_row("e")).unwrap();
        assert_eq!(e.id, EntryId(4));

        assert_eq!(store.delete_pending(EntryId(99)).unwrap(), None);
    }

    #[test]
    fn update_pending_preserves_created_at() {
        let store = MemoryStore::new();
        let row = store.insert_pending(pending_row("tyres")).unwrap();
        let draft = EntryDraft::new(EntryKind::Input, dec!(12), "tyres refunded", ActorId(2));
        let updated = store.update_pending(row.id, &draft).unwrap().unwrap();
        assert_eq!(updated.kind, EntryKind::Input);
        assert_eq!(updated.amount, dec!(12));
        assert_eq!(updated.description, "tyres refunded");
        assert_eq!(updated.actor, ActorId(2));
        assert_eq!(updated.created_at, row.created_at);
        assert_eq!(store.update_pending(EntryId(42), &draft).unwrap(), None);
    }
}
