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

//! # Cashbook
//!
//! This library keeps the running-balance cash book of a haulage back
//! office: a committed ledger of posted entries, a pending tray of staged
//! entries, and a reversal path moving the newest posted entry back to
//! pending.
//!
//! ## Core Components
//!
//! - [`Cashbook`]: The ledger service, validating drafts and applying the
//!   running balance
//! - [`EntryDraft`] / [`PostedEntry`] / [`PendingEntry`]: What goes in and
//!   what comes back
//! - [`LedgerStore`]: The posted/pending table pair as a black box, with
//!   [`MemoryStore`] as the in-process implementation
//! - [`ActorDirectory`]: Existence checks for the parties entries
//!   reference, with [`ActorRegistry`] as the in-process implementation
//! - [`LedgerError`]: Failure taxonomy for every operation
//!
//! ## Example
//!
//! ```
//! use cashbook::{ActorKind, ActorProfile, ActorRegistry, Cashbook, EntryDraft, EntryKind};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let actors = Arc::new(ActorRegistry::new());
//! let contractee = actors
//!     .register(ActorProfile::new(ActorKind::Contractee, "Quarry Ltd"))
//!     .unwrap();
//!
//! let book = Cashbook::in_memory(actors);
//!
//! // Post a payment received for a haul.
//! let draft = EntryDraft::new(EntryKind::Input, dec!(100.00), "haul 17, gravel", contractee.id);
//! let entry = book.post(draft).unwrap();
//!
//! assert_eq!(entry.balance, dec!(100.00));
//! assert_eq!(book.balance().unwrap(), dec!(100.00));
//! ```
//!
//! ## Thread Safety
//!
//! Balance-mutating operations serialize through a per-book write gate, so
//! the balance column is always a valid prefix sum in id order. Reads and
//! pending-tray operations run concurrently with them.

pub mod actor;
mod balance;
mod base;
mod book;
mod entry;
pub mod error;
mod store;

pub use actor::{Actor, ActorDirectory, ActorKind, ActorProfile, ActorRegistry, RegistryError};
pub use balance::next_balance;
pub use base::{ActorId, EntryId};
pub use book::{BookTotals, Cashbook};
pub use entry::{EntryDraft, EntryKind, PendingEntry, PostedEntry};
pub use error::{LedgerError, StoreError};
pub use store::{LedgerStore, MemoryStore, NewPendingEntry, NewPostedEntry};
