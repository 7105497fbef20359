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

//! Actors and the directory the ledger checks them against.
//!
//! Actors are owned elsewhere in the back office; the ledger only ever
//! asks whether a referenced actor exists. [`ActorRegistry`] is the
//! in-process directory used by the CLI, the demo server, and tests.

use crate::base::ActorId;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;

/// What kind of counterparty an actor is to the haulage business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    /// Drivers, mechanics, office staff.
    Personnel,
    /// Outside parties: fuel stations, workshops, suppliers.
    Third,
    /// A mine the trucks haul from.
    Mine,
    /// A contractee the business hauls for.
    Contractee,
}

impl ActorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personnel => "personnel",
            Self::Third => "third",
            Self::Mine => "mine",
            Self::Contractee => "contractee",
        }
    }
}

impl FromStr for ActorKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personnel" => Ok(Self::Personnel),
            "third" => Ok(Self::Third),
            "mine" => Ok(Self::Mine),
            "contractee" => Ok(Self::Contractee),
            _ => Err(RegistryError::UnknownKind),
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A party that ledger entries reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub name: String,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    pub fn new(id: ActorId, kind: ActorKind, name: impl Into<String>) -> Self {
        Actor {
            id,
            kind,
            name: name.into(),
            national_id: None,
            address: None,
            notes: None,
            created_at: Utc::now(),
        }
    }
}

/// Payload for registering an actor without choosing its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub kind: ActorKind,
    pub name: String,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl ActorProfile {
    pub fn new(kind: ActorKind, name: impl Into<String>) -> Self {
        ActorProfile {
            kind,
            name: name.into(),
            national_id: None,
            address: None,
            notes: None,
        }
    }
}

/// Errors from [`ActorRegistry`]. These are directory bookkeeping
/// failures, deliberately separate from the ledger taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Actor name is empty or whitespace
    #[error("actor name must not be empty")]
    EmptyName,

    /// Another actor already carries this name
    #[error("actor name already registered")]
    DuplicateName,

    /// Another actor already carries this id
    #[error("actor id already registered")]
    DuplicateId,

    /// Actor id is zero or negative
    #[error("actor id must be positive")]
    InvalidId,

    /// Kind string is not personnel, third, mine, or contractee
    #[error("unknown actor kind")]
    UnknownKind,
}

/// Existence lookups the ledger performs against the actor component.
///
/// The ledger never creates, mutates, or deletes actors through this
/// trait; it only verifies references before writing an entry.
pub trait ActorDirectory: Send + Sync {
    fn contains(&self, id: ActorId) -> bool;
}

/// Concurrent in-process actor directory.
///
/// Names are unique and non-empty; uniqueness is enforced with an
/// atomic check-and-insert on the name index, so two racing
/// registrations of the same name cannot both succeed.
#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: DashMap<ActorId, Actor>,
    names: DashMap<String, ActorId>,
    next_id: AtomicI64,
}

impl ActorRegistry {
    pub fn new() -> Self {
        ActorRegistry {
            actors: DashMap::new(),
            names: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Registers a new actor under the next free id.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EmptyName`] if the trimmed name is empty
    /// - [`RegistryError::DuplicateName`] if the name is taken
    pub fn register(&self, profile: ActorProfile) -> Result<Actor, RegistryError> {
        let name = profile.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        match self.names.entry(name.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateName),
            Entry::Vacant(slot) => {
                let id = ActorId(self.next_id.fetch_add(1, Ordering::SeqCst));
                let actor = Actor {
                    id,
                    kind: profile.kind,
                    name,
                    national_id: profile.national_id,
                    address: profile.address,
                    notes: profile.notes,
                    created_at: Utc::now(),
                };
                self.actors.insert(id, actor.clone());
                slot.insert(id);
                Ok(actor)
            }
        }
    }

    /// Inserts an actor with a caller-chosen id, for seeding the
    /// directory from a file. Future [`register`](Self::register) calls
    /// continue above the highest seeded id.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidId`] if the id is not positive
    /// - [`RegistryError::EmptyName`] if the trimmed name is empty
    /// - [`RegistryError::DuplicateName`] / [`RegistryError::DuplicateId`]
    ///   on collisions
    pub fn insert(&self, actor: Actor) -> Result<(), RegistryError> {
        if actor.id.0 <= 0 {
            return Err(RegistryError::InvalidId);
        }
        let name = actor.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        // Lock order is names then actors, same as register.
        match self.names.entry(name.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateName),
            Entry::Vacant(slot) => match self.actors.entry(actor.id) {
                Entry::Occupied(_) => Err(RegistryError::DuplicateId),
                Entry::Vacant(actor_slot) => {
                    let id = actor.id;
                    actor_slot.insert(Actor { name: name.clone(), ..actor });
                    slot.insert(id);
                    self.next_id.fetch_max(id.0 + 1, Ordering::SeqCst);
                    Ok(())
                }
            },
        }
    }

    pub fn get(&self, id: ActorId) -> Option<Actor> {
        self.actors.get(&id).map(|entry| entry.value().clone())
    }

    /// All actors, ordered by id.
    pub fn actors(&self) -> Vec<Actor> {
        let mut all: Vec<Actor> = self.actors.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by_key(|actor| actor.id);
        all
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl ActorDirectory for ActorRegistry {
    fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }
}
