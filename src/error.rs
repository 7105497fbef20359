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

//! Error types for ledger operations and the storage seam.

use thiserror::Error;

/// Ledger operation errors.
///
/// Every failure is reported before any row is written; a returned error
/// means the book is exactly as it was. Callers match on the variant, not
/// on the message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Entry kind string is not `input` or `output`
    #[error("invalid entry kind (must be input or output)")]
    InvalidKind,

    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Description is empty or whitespace
    #[error("missing description")]
    MissingDescription,

    /// Actor reference is zero or negative
    #[error("missing actor reference")]
    MissingActor,

    /// Referenced actor does not exist in the directory
    #[error("actor not found")]
    ActorNotFound,

    /// Output would drive the running balance below zero
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Operation targets the protected anchor row
    #[error("entry is protected")]
    ProtectedEntry,

    /// Entry id is zero or negative
    #[error("invalid entry id")]
    InvalidId,

    /// No entry with the given id
    #[error("entry not found")]
    EntryNotFound,

    /// No deletable entry (book is empty or holds only the anchor)
    #[error("ledger is empty")]
    EmptyLedger,

    /// Backing store failed; the operation did not complete
    #[error("storage fault: {0}")]
    Storage(String),
}

/// Opaque failure from a [`LedgerStore`](crate::LedgerStore)
/// implementation.
///
/// Store backends do not know the ledger taxonomy; they report what broke
/// in their own words and the service surfaces it as
/// [`LedgerError::Storage`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError(message.into())
    }
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        LedgerError::Storage(error.0)
    }
}
