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

use cashbook::{
    Actor, ActorId, ActorKind, ActorRegistry, Cashbook, EntryDraft, EntryId, EntryKind,
    PostedEntry,
};
use chrono::Utc;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Cashbook - replay a back-office journal into the ledger
///
/// Seeds the actor directory from one CSV, replays journal rows into the
/// book, and prints the posted ledger to stdout.
#[derive(Parser, Debug)]
#[command(name = "cashbook")]
#[command(about = "A cash book that replays haulage journal CSVs", long_about = None)]
struct Args {
    /// Path to the journal CSV
    ///
    /// Expected format: op,type,amount,description,actor
    /// Example: cargo run -- --actors actors.csv journal.csv > book.csv
    #[arg(value_name = "JOURNAL")]
    journal: PathBuf,

    /// Path to the actor seed CSV
    ///
    /// Expected format: id,kind,name,national_id,address,notes
    #[arg(long, value_name = "FILE")]
    actors: PathBuf,
}

fn main() {
    // Logs go to stderr; stdout carries the book CSV.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let registry = Arc::new(ActorRegistry::new());
    let actors_file = match File::open(&args.actors) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening actors file '{}': {}", args.actors.display(), e);
            process::exit(1);
        }
    };
    let seeded = match seed_actors(&registry, BufReader::new(actors_file)) {
        Ok(count) => count,
        Err(e) => {
            eprintln!("Error reading actors: {}", e);
            process::exit(1);
        }
    };

    let journal_file = match File::open(&args.journal) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening journal '{}': {}", args.journal.display(), e);
            process::exit(1);
        }
    };

    let book = Cashbook::in_memory(registry);
    let outcome = match replay_journal(&book, BufReader::new(journal_file)) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error replaying journal: {}", e);
            process::exit(1);
        }
    };

    let entries = match book.posted() {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading the book: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = write_book(entries, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }

    match book.balance() {
        Ok(balance) => eprintln!(
            "{} actors seeded; {} posted, {} staged, {} rejected; closing balance {}",
            seeded, outcome.posted, outcome.staged, outcome.rejected, balance
        ),
        Err(e) => eprintln!(
            "{} actors seeded; {} posted, {} staged, {} rejected; balance unavailable: {}",
            seeded, outcome.posted, outcome.staged, outcome.rejected, e
        ),
    }
}

/// Raw actor seed row matching the input format.
///
/// Fields: `id, kind, name, national_id, address, notes`; the trailing
/// three may be omitted.
#[derive(Debug, Deserialize)]
struct ActorRecord {
    id: i64,
    kind: String,
    name: String,
    #[serde(default)]
    national_id: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl ActorRecord {
    /// Converts the row to an actor.
    ///
    /// Returns `None` for unknown kinds.
    fn into_actor(self) -> Option<Actor> {
        let kind: ActorKind = self.kind.to_lowercase().parse().ok()?;
        Some(Actor {
            id: ActorId(self.id),
            kind,
            name: self.name,
            national_id: self.national_id,
            address: self.address,
            notes: self.notes,
            created_at: Utc::now(),
        })
    }
}

/// Raw journal row matching the input format.
///
/// Fields: `op, type, amount, description, actor`
#[derive(Debug, Deserialize)]
struct JournalRecord {
    op: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    description: String,
    actor: i64,
}

enum JournalOp {
    Post(EntryDraft),
    Stage(EntryDraft),
}

impl JournalRecord {
    /// Converts the row to a book operation.
    ///
    /// Returns `None` for unknown ops, bad entry kinds, or a missing
    /// amount.
    fn into_op(self) -> Option<JournalOp> {
        let kind: EntryKind = self.kind.to_lowercase().parse().ok()?;
        let amount = self.amount?;
        let draft = EntryDraft::new(kind, amount, self.description, ActorId(self.actor));
        match self.op.to_lowercase().as_str() {
            "post" => Some(JournalOp::Post(draft)),
            "stage" => Some(JournalOp::Stage(draft)),
            _ => None,
        }
    }
}

/// Seeds the registry from an actor CSV.
///
/// Streaming parse; malformed rows, unknown kinds, and registry
/// collisions are skipped so one bad line never blocks the rest.
///
/// # Errors
///
/// Returns a CSV error if the reader itself fails.
fn seed_actors<R: Read>(registry: &ActorRegistry, reader: R) -> Result<usize, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut seeded = 0;
    for result in rdr.deserialize::<ActorRecord>() {
        match result {
            Ok(record) => {
                let Some(actor) = record.into_actor() else {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping actor row with unknown kind");
                    continue;
                };
                match registry.insert(actor) {
                    Ok(()) => seeded += 1,
                    Err(_e) => {
                        #[cfg(debug_assertions)]
                        eprintln!("Skipping actor row: {}", _e);
                    }
                }
            }
            Err(_e) => {
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed actor row: {}", _e);
                continue;
            }
        }
    }

    Ok(seeded)
}

/// Tally of a journal replay.
#[derive(Debug, Default)]
struct ReplayOutcome {
    posted: usize,
    staged: usize,
    rejected: usize,
}

/// Replays journal rows into the book.
///
/// This function uses streaming parsing, so a day's journal of any size
/// replays in constant memory. Malformed rows and operations the book
/// rejects (overdraws, unknown actors, bad fields) are counted and
/// skipped; the batch never aborts on one bad line.
///
/// # CSV Format
///
/// Expected columns: `op, type, amount, description, actor`
/// - `op`: `post` (committed ledger) or `stage` (pending tray)
/// - `type`: `input` or `output`
/// - `amount`: positive decimal
/// - `description`: free text, must not be empty
/// - `actor`: id of a seeded actor
///
/// # Example
///
/// ```csv
/// op,type,amount,description,actor
/// post,input,100.0,haul 17 gravel,2
/// post,output,30.0,diesel,1
/// stage,output,12.5,tyre repair,1
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader itself fails.
fn replay_journal<R: Read>(book: &Cashbook, reader: R) -> Result<ReplayOutcome, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut outcome = ReplayOutcome::default();
    for result in rdr.deserialize::<JournalRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_op() else {
                    outcome.rejected += 1;
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid journal row");
                    continue;
                };
                match op {
                    JournalOp::Post(draft) => match book.post(draft) {
                        Ok(_) => outcome.posted += 1,
                        Err(_e) => {
                            outcome.rejected += 1;
                            #[cfg(debug_assertions)]
                            eprintln!("Skipping journal row: {}", _e);
                        }
                    },
                    JournalOp::Stage(draft) => match book.stage(draft) {
                        Ok(_) => outcome.staged += 1,
                        Err(_e) => {
                            outcome.rejected += 1;
                            #[cfg(debug_assertions)]
                            eprintln!("Skipping journal row: {}", _e);
                        }
                    },
                }
            }
            Err(_e) => {
                // Skip malformed rows
                outcome.rejected += 1;
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", _e);
                continue;
            }
        }
    }

    Ok(outcome)
}

/// Output row for the posted book.
///
/// Columns: `id, type, amount, description, balance, actor`
#[derive(Debug, Serialize)]
struct BookRow {
    id: EntryId,
    #[serde(rename = "type")]
    kind: EntryKind,
    amount: Decimal,
    description: String,
    balance: Decimal,
    actor: ActorId,
}

impl From<PostedEntry> for BookRow {
    fn from(entry: PostedEntry) -> Self {
        BookRow {
            id: entry.id,
            kind: entry.kind,
            amount: entry.amount,
            description: entry.description,
            balance: entry.balance,
            actor: entry.actor,
        }
    }
}

/// Writes the posted book to a CSV writer.
///
/// # Example
///
/// ```csv
/// id,type,amount,description,balance,actor
/// 1,input,100.0,haul 17 gravel,100.0,2
/// 2,output,30.0,diesel,70.0,1
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_book<W: Write>(entries: Vec<PostedEntry>, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for entry in entries {
        wtr.serialize(BookRow::from(entry))?;
    }

    wtr.flush()?;
    Ok(())
}
