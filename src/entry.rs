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

//! Ledger entry types.
//!
//! An entry lives in one of two tables:
//! - posted: executed, carries the running balance after itself
//! - pending: staged, no balance until it is posted
//!
//! [`EntryDraft`] is the payload for creating either.

use crate::base::{ActorId, EntryId};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a ledger entry: money in or money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Increases the running balance.
    Input,
    /// Decreases the running balance.
    Output,
}

impl EntryKind {
    /// Wire name, matching the stored `type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    /// The amount with this kind's sign applied: `+amount` for input,
    /// `-amount` for output.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Input => amount,
            Self::Output => -amount,
        }
    }
}

impl FromStr for EntryKind {
    type Err = LedgerError;

    /// Parses the wire names `input` and `output`. Anything else,
    /// including the empty string, is [`LedgerError::InvalidKind`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            _ => Err(LedgerError::InvalidKind),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An executed entry in the committed ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    /// Running balance immediately after this entry.
    pub balance: Decimal,
    pub actor: ActorId,
    pub executed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PostedEntry {
    /// The creation payload this entry came from, for re-posting a
    /// reversed entry with identical fields.
    pub fn draft(&self) -> EntryDraft {
        EntryDraft {
            kind: self.kind,
            amount: self.amount,
            description: self.description.clone(),
            actor: self.actor,
        }
    }
}

/// A staged entry awaiting commitment. Carries no balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    pub actor: ActorId,
    pub created_at: DateTime<Utc>,
}

impl PendingEntry {
    /// The creation payload this entry came from.
    pub fn draft(&self) -> EntryDraft {
        EntryDraft {
            kind: self.kind,
            amount: self.amount,
            description: self.description.clone(),
            actor: self.actor,
        }
    }
}

/// Payload for creating or replacing an entry.
///
/// Validation happens in [`Cashbook`](crate::Cashbook), not here; a draft
/// is just data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    pub actor: ActorId,
}

impl EntryDraft {
    pub fn new(
        kind: EntryKind,
        amount: Decimal,
        description: impl Into<String>,
        actor: ActorId,
    ) -> Self {
        EntryDraft { kind, amount, description: description.into(), actor }
    }
}

#[cfg(test)]
mod tests {
    use super::EntryKind;
    use crate::error::LedgerError;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_wire_names() {
        assert_eq!("input".parse::<EntryKind>(), Ok(EntryKind::Input));
        assert_eq!("output".parse::<EntryKind>(), Ok(EntryKind::Output));
    }

    #[test]
    fn rejects_unknown_kinds() {
        assert_eq!("".parse::<EntryKind>(), Err(LedgerError::InvalidKind));
        assert_eq!("Input".parse::<EntryKind>(), Err(LedgerError::InvalidKind));
        assert_eq!("transfer".parse::<EntryKind>(), Err(LedgerError::InvalidKind));
    }

    #[test]
    fn signed_amounts_follow_kind() {
        assert_eq!(EntryKind::Input.signed(dec!(25)), dec!(25));
        assert_eq!(EntryKind::Output.signed(dec!(25)), dec!(-25));
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(EntryKind::Input.to_string(), "input");
        assert_eq!(EntryKind::Output.to_string(), "output");
    }
}
