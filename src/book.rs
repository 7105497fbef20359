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

//! The cash book service.
//!
//! [`Cashbook`] ties the pieces together: drafts are validated in a fixed
//! order, the balance accumulator decides acceptance, and accepted rows go
//! to the [`LedgerStore`]. Actor references are checked against an
//! [`ActorDirectory`] the ledger never writes to.

use crate::actor::ActorDirectory;
use crate::balance::next_balance;
use crate::base::EntryId;
use crate::entry::{EntryDraft, PendingEntry, PostedEntry};
use crate::error::LedgerError;
use crate::store::{LedgerStore, MemoryStore, NewPendingEntry, NewPostedEntry};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One business-wide ledger of posted entries with a staging tray of
/// pending entries.
///
/// # Operations
///
/// | Operation | Behavior |
/// |-----------|----------|
/// | [`post`](Self::post) | Validates a draft, applies it to the running balance, appends |
/// | [`posted`](Self::posted) / [`last_posted_id`](Self::last_posted_id) / [`balance`](Self::balance) | Read the committed ledger |
/// | [`amend_description`](Self::amend_description) | Rewords a posted entry (anchor excluded) |
/// | [`delete_last`](Self::delete_last) | Removes the newest posted entry, freeing its id |
/// | [`reverse_last`](Self::reverse_last) | Moves the newest posted entry back to pending |
/// | [`stage`](Self::stage) / [`pending`](Self::pending) / [`last_pending_id`](Self::last_pending_id) | The staging tray |
/// | [`update_pending`](Self::update_pending) / [`delete_pending`](Self::delete_pending) | Rework or drop staged entries |
///
/// # Invariants
///
/// - The balance column is a prefix sum of accepted entries in id order.
/// - The balance never goes negative; an overdraw is rejected unwritten.
/// - The anchor row (id 1) in either table is never amended or deleted.
/// - Only the newest posted row is deletable, and deleting it frees its
///   id for the next post.
///
/// # Thread Safety
///
/// Balance-mutating operations (`post`, `delete_last`, `reverse_last`)
/// serialize through one write gate, so every accepted entry reads the
/// balance its predecessor wrote. Reads and pending operations run
/// concurrently with them; per-row consistency is the store's contract.
pub struct Cashbook {
    store: Arc<dyn LedgerStore>,
    actors: Arc<dyn ActorDirectory>,
    /// Serializes read-balance-then-write sequences.
    write_gate: Mutex<()>,
}

impl Cashbook {
    pub fn new(store: Arc<dyn LedgerStore>, actors: Arc<dyn ActorDirectory>) -> Self {
        Cashbook { store, actors, write_gate: Mutex::new(()) }
    }

    /// A book over a fresh [`MemoryStore`].
    pub fn in_memory(actors: Arc<dyn ActorDirectory>) -> Self {
        Self::new(Arc::new(MemoryStore::new()), actors)
    }

    /// Validates draft fields in the order callers are promised:
    /// amount, description, actor reference, actor existence. Kind is
    /// already typed; invalid kind strings never reach a draft.
    fn validate_draft(&self, draft: &EntryDraft) -> Result<(), LedgerError> {
        if draft.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if draft.description.trim().is_empty() {
            return Err(LedgerError::MissingDescription);
        }
        if draft.actor.0 <= 0 {
            return Err(LedgerError::MissingActor);
        }
        if !self.actors.contains(draft.actor) {
            return Err(LedgerError::ActorNotFound);
        }
        Ok(())
    }

    /// Rejects ids that may never be mutated: non-positive ids are
    /// ill-formed, the anchor is protected.
    fn guard_mutable_id(id: EntryId) -> Result<(), LedgerError> {
        if id.0 <= 0 {
            return Err(LedgerError::InvalidId);
        }
        if id.is_anchor() {
            return Err(LedgerError::ProtectedEntry);
        }
        Ok(())
    }

    // === Committed ledger ===

    /// All posted entries in id order.
    pub fn posted(&self) -> Result<Vec<PostedEntry>, LedgerError> {
        Ok(self.store.posted()?)
    }

    /// Validates the draft and appends it to the ledger with its new
    /// running balance, returning the stored row.
    ///
    /// # Errors
    ///
    /// Checks run in a fixed order, so callers see deterministic
    /// failures:
    ///
    /// - [`LedgerError::InvalidAmount`] - amount is zero or negative
    /// - [`LedgerError::MissingDescription`] - description is empty
    /// - [`LedgerError::MissingActor`] - actor reference is not positive
    /// - [`LedgerError::ActorNotFound`] - actor is not in the directory
    /// - [`LedgerError::InsufficientBalance`] - output would overdraw;
    ///   nothing is written
    /// - [`LedgerError::Storage`] - the store failed
    pub fn post(&self, draft: EntryDraft) -> Result<PostedEntry, LedgerError> {
        self.validate_draft(&draft)?;

        let _gate = self.write_gate.lock();
        let base = self
            .store
            .last_posted()?
            .map(|entry| entry.balance)
            .unwrap_or(Decimal::ZERO);
        let balance = next_balance(base, draft.kind, draft.amount)?;
        debug_assert!(balance >= Decimal::ZERO, "accepted balance must not be negative");

        let now = Utc::now();
        let row = self.store.insert_posted(NewPostedEntry {
            kind: draft.kind,
            amount: draft.amount,
            description: draft.description,
            balance,
            actor: draft.actor,
            executed_at: now,
            created_at: now,
        })?;
        debug!(id = %row.id, kind = %row.kind, balance = %row.balance, "posted entry");
        Ok(row)
    }

    /// Replaces the description of a posted entry.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidId`] - id is zero or negative
    /// - [`LedgerError::ProtectedEntry`] - id names the anchor row
    /// - [`LedgerError::MissingDescription`] - replacement is empty
    /// - [`LedgerError::EntryNotFound`] - no posted entry has this id
    pub fn amend_description(
        &self,
        id: EntryId,
        description: &str,
    ) -> Result<PostedEntry, LedgerError> {
        Self::guard_mutable_id(id)?;
        if description.trim().is_empty() {
            return Err(LedgerError::MissingDescription);
        }
        self.store
            .amend_posted_description(id, description)?
            .ok_or(LedgerError::EntryNotFound)
    }

    /// Deletes the newest posted entry and frees its id for the next
    /// post.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EmptyLedger`] - no deletable row: the ledger is
    ///   empty or holds only the anchor
    pub fn delete_last(&self) -> Result<EntryId, LedgerError> {
        let _gate = self.write_gate.lock();
        let last = self.deletable_last()?;
        match self.store.delete_last_posted()? {
            Some(id) => {
                info!(%id, balance = %last.balance, "deleted last posted entry");
                Ok(id)
            }
            None => Err(LedgerError::EmptyLedger),
        }
    }

    /// Moves the newest posted entry back to the pending tray: stages a
    /// copy carrying the same kind, amount, description, actor, and
    /// creation time, then deletes the posted row, rewinding the id
    /// sequence. Returns the staged copy.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EmptyLedger`] - no reversible row, as for
    ///   [`delete_last`](Self::delete_last)
    pub fn reverse_last(&self) -> Result<PendingEntry, LedgerError> {
        let _gate = self.write_gate.lock();
        let last = self.deletable_last()?;
        let staged = self.store.insert_pending(NewPendingEntry {
            kind: last.kind,
            amount: last.amount,
            description: last.description.clone(),
            actor: last.actor,
            created_at: last.created_at,
        })?;
        // The copy lands before the delete; if the delete faults, the
        // posted row stays authoritative and the caller sees the fault.
        if let Err(fault) = self.store.delete_last_posted() {
            warn!(posted = %last.id, staged = %staged.id, %fault,
                "reversal fault after staging copy; posted row retained");
            return Err(fault.into());
        }
        info!(posted = %last.id, staged = %staged.id, "reversed last posted entry");
        Ok(staged)
    }

    /// Id of the newest posted entry, or `None` for an empty ledger.
    pub fn last_posted_id(&self) -> Result<Option<EntryId>, LedgerError> {
        Ok(self.store.last_posted()?.map(|entry| entry.id))
    }

    /// The current running balance: the newest posted entry's balance,
    /// or zero for an empty ledger.
    pub fn balance(&self) -> Result<Decimal, LedgerError> {
        Ok(self
            .store
            .last_posted()?
            .map(|entry| entry.balance)
            .unwrap_or(Decimal::ZERO))
    }

    /// The newest posted entry provided it may be deleted or reversed.
    fn deletable_last(&self) -> Result<PostedEntry, LedgerError> {
        let last = self.store.last_posted()?.ok_or(LedgerError::EmptyLedger)?;
        if last.id.is_anchor() {
            return Err(LedgerError::EmptyLedger);
        }
        Ok(last)
    }

    // === Pending tray ===

    /// All pending entries in id order.
    pub fn pending(&self) -> Result<Vec<PendingEntry>, LedgerError> {
        Ok(self.store.pending()?)
    }

    /// Validates the draft and stages it as a pending entry. No balance
    /// is computed or checked; the tray holds intent, not money.
    ///
    /// # Errors
    ///
    /// As for [`post`](Self::post), minus
    /// [`LedgerError::InsufficientBalance`].
    pub fn stage(&self, draft: EntryDraft) -> Result<PendingEntry, LedgerError> {
        self.validate_draft(&draft)?;
        let row = self.store.insert_pending(NewPendingEntry {
            kind: draft.kind,
            amount: draft.amount,
            description: draft.description,
            actor: draft.actor,
            created_at: Utc::now(),
        })?;
        debug!(id = %row.id, kind = %row.kind, "staged pending entry");
        Ok(row)
    }

    /// Replaces kind, amount, description, and actor of a pending entry,
    /// keeping its creation time.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidId`] / [`LedgerError::ProtectedEntry`] -
    ///   as for [`delete_pending`](Self::delete_pending)
    /// - draft validation as for [`stage`](Self::stage)
    /// - [`LedgerError::EntryNotFound`] - no pending entry has this id
    pub fn update_pending(
        &self,
        id: EntryId,
        draft: EntryDraft,
    ) -> Result<PendingEntry, LedgerError> {
        Self::guard_mutable_id(id)?;
        self.validate_draft(&draft)?;
        self.store
            .update_pending(id, &draft)?
            .ok_or(LedgerError::EntryNotFound)
    }

    /// Deletes a pending entry by id. Any row except the anchor may go.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidId`] - id is zero or negative
    /// - [`LedgerError::ProtectedEntry`] - id names the anchor row,
    ///   whatever the row holds
    /// - [`LedgerError::EntryNotFound`] - no pending entry has this id
    pub fn delete_pending(&self, id: EntryId) -> Result<EntryId, LedgerError> {
        Self::guard_mutable_id(id)?;
        match self.store.delete_pending(id)? {
            Some(deleted) => {
                debug!(id = %deleted, "deleted pending entry");
                Ok(deleted)
            }
            None => Err(LedgerError::EntryNotFound),
        }
    }

    /// Id of the newest pending entry, or `None` for an empty tray.
    pub fn last_pending_id(&self) -> Result<Option<EntryId>, LedgerError> {
        Ok(self.store.last_pending()?.map(|entry| entry.id))
    }

    /// Point-in-time counts and balance for reports. Each table is read
    /// once; the two reads are not a single snapshot.
    pub fn totals(&self) -> Result<BookTotals, LedgerError> {
        let posted = self.store.posted()?;
        let pending = self.store.pending()?;
        let balance = posted.last().map(|entry| entry.balance).unwrap_or(Decimal::ZERO);
        let last_posted_id = posted.last().map(|entry| entry.id);
        Ok(BookTotals {
            posted_entries: posted.len(),
            pending_entries: pending.len(),
            balance,
            last_posted_id,
        })
    }
}

/// Summary of the book for reports and status endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookTotals {
    pub posted_entries: usize,
    pub pending_entries: usize,
    pub balance: Decimal,
    pub last_posted_id: Option<EntryId>,
}

impl BookTotals {
    /// Money is reported to the cent.
    const CASH_PRECISION: u32 = 2;
}

impl Serialize for BookTotals {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("BookTotals", 4)?;
        state.serialize_field("posted_entries", &self.posted_entries)?;
        state.serialize_field("pending_entries", &self.pending_entries)?;
        state.serialize_field("balance", &self.balance.round_dp(Self::CASH_PRECISION))?;
        state.serialize_field("last_posted_id", &self.last_posted_id)?;
        state.end()
    }
}
