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

//! Core identifier types for ledger entries and actors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a ledger entry, posted or pending.
///
/// Wraps an `i64` to match the signed id columns of the backing store.
/// Ids handed out by a store are always positive; id 1 is the anchor
/// row and is protected from mutation (see [`EntryId::ANCHOR`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl EntryId {
    /// The opening-balance row. Once present it can never be amended,
    /// deleted, or reversed; the same protection applies to the pending
    /// row with this id.
    pub const ANCHOR: EntryId = EntryId(1);

    /// Whether this id names the protected anchor row.
    pub fn is_anchor(self) -> bool {
        self == Self::ANCHOR
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an actor in the directory.
///
/// Wraps an `i64`; well-formed actor references are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ActorId(pub i64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
