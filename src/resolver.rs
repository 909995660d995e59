use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use uuid::Uuid;

use crate::kpm::KpmNo;
use crate::models::{PlayerBatch, PlayerRow};

/// Lowercase, trim, collapse internal whitespace. All heuristic matching goes
/// through this so `" Asha  RAO "` and `"asha rao"` land on the same key.
pub fn normalize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    lower.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn alias_key(name: &str, branch: Option<&str>) -> String {
    format!("{}|{}", normalize(name), normalize(branch.unwrap_or("")))
}

/// One reconciled player across all ingested year batches.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPlayer {
    pub master_id: String,
    /// True when no upstream row carried a masterId and we generated one.
    pub minted_master_id: bool,
    pub display_name: String,
    pub branch: Option<String>,
    /// Per-year row ids, in ingestion order.
    pub player_ids: Vec<String>,
    pub kpm_nos: Vec<String>,
    /// Base pair for the computed academic-year fallback: the year in which
    /// this player was in `base_diploma_year`.
    pub base_year: Option<i32>,
    pub base_diploma_year: Option<i32>,
    /// Explicit participation-year -> diploma-year mappings.
    pub year_details: HashMap<i32, i32>,
}

#[derive(Debug, Clone, Copy)]
enum NameSlot {
    Unique(usize),
    Ambiguous,
}

/// Union-find-lite over year-partitioned player rows.
///
/// Lookup priority when placing a row: masterId, then playerId, then the
/// normalized `name|branch` composite. The first row to claim a key seeds a
/// canonical record; later rows sharing any of those identifiers merge into
/// it. There is no backward correction: if two already-seeded records turn
/// out to share an identifier that only shows up later, they stay separate
/// and the conflict is logged at debug level.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    players: Vec<CanonicalPlayer>,
    master_to_idx: HashMap<String, usize>,
    player_id_to_idx: HashMap<String, usize>,
    kpm_to_idx: HashMap<String, usize>,
    alias_to_idx: HashMap<String, usize>,
    name_to_idx: HashMap<String, NameSlot>,
}

/// Returns true when the key now points at `idx` (fresh insert or already
/// ours). A key held by a different record stays put.
fn bind(map: &mut HashMap<String, usize>, key: String, idx: usize, kind: &'static str) -> bool {
    match map.entry(key) {
        Entry::Vacant(v) => {
            v.insert(idx);
            true
        }
        Entry::Occupied(o) => {
            if *o.get() != idx {
                // Missed-merge territory. First binding wins.
                tracing::debug!(
                    "{} {:?} already bound to a different player; keeping first binding",
                    kind,
                    o.key()
                );
                false
            } else {
                true
            }
        }
    }
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest all batches, oldest year first so base pairs come from the
    /// earliest data we have for each player.
    pub fn ingest_batches(&mut self, batches: &[PlayerBatch]) {
        let mut ordered: Vec<&PlayerBatch> = batches.iter().collect();
        ordered.sort_by_key(|b| b.year);
        for batch in ordered {
            self.ingest_batch(batch.year, &batch.players);
        }
    }

    pub fn ingest_batch(&mut self, year: i32, rows: &[PlayerRow]) {
        for row in rows {
            self.ingest_row(year, row);
        }
    }

    fn ingest_row(&mut self, year: i32, row: &PlayerRow) {
        let hit = row
            .master_id
            .as_deref()
            .and_then(|m| self.master_to_idx.get(m).copied())
            .or_else(|| {
                row.id
                    .as_deref()
                    .and_then(|p| self.player_id_to_idx.get(p).copied())
            })
            .or_else(|| {
                self.alias_to_idx
                    .get(&alias_key(&row.name, row.branch.as_deref()))
                    .copied()
            });

        let idx = match hit {
            Some(idx) => idx,
            None => self.seed(row),
        };
        self.absorb(idx, year, row);
    }

    /// Create a fresh canonical record for a row no existing record claims.
    fn seed(&mut self, row: &PlayerRow) -> usize {
        let idx = self.players.len();
        let (master_id, minted) = match &row.master_id {
            Some(m) => (m.clone(), false),
            None => (Uuid::new_v4().to_string(), true),
        };
        self.players.push(CanonicalPlayer {
            master_id,
            minted_master_id: minted,
            display_name: row.name.trim().to_string(),
            branch: row.branch.clone(),
            player_ids: Vec::new(),
            kpm_nos: Vec::new(),
            base_year: None,
            base_diploma_year: None,
            year_details: HashMap::new(),
        });
        idx
    }

    /// Merge a row into the canonical record at `idx`: register its
    /// identifiers (first binding wins) and fold in any year/diploma data.
    fn absorb(&mut self, idx: usize, batch_year: i32, row: &PlayerRow) {
        if let Some(master) = &row.master_id {
            bind(&mut self.master_to_idx, master.clone(), idx, "masterId");
        } else {
            let minted = self.players[idx].master_id.clone();
            bind(&mut self.master_to_idx, minted, idx, "masterId");
        }
        if let Some(player_id) = &row.id {
            // Roster aliases mirror the lookup table: an id another record
            // already owns is not listed here as well.
            if bind(&mut self.player_id_to_idx, player_id.clone(), idx, "playerId") {
                let record = &mut self.players[idx];
                if !record.player_ids.iter().any(|p| p == player_id) {
                    record.player_ids.push(player_id.clone());
                }
            }
        }
        if let Some(kpm) = &row.kpm_no {
            if bind(&mut self.kpm_to_idx, normalize(kpm), idx, "kpmNo") {
                let record = &mut self.players[idx];
                if !record.kpm_nos.iter().any(|k| k == kpm) {
                    record.kpm_nos.push(kpm.clone());
                }
            }
        }
        bind(
            &mut self.alias_to_idx,
            alias_key(&row.name, row.branch.as_deref()),
            idx,
            "name|branch",
        );
        match self.name_to_idx.entry(normalize(&row.name)) {
            Entry::Vacant(v) => {
                v.insert(NameSlot::Unique(idx));
            }
            Entry::Occupied(mut o) => {
                if let NameSlot::Unique(other) = *o.get() {
                    if other != idx {
                        o.insert(NameSlot::Ambiguous);
                    }
                }
            }
        }

        let participation = row.participation_year.unwrap_or(batch_year);
        let record = &mut self.players[idx];
        if let Some(dy) = row.diploma_year {
            record.year_details.entry(participation).or_insert(dy);
        }
        for (raw_year, detail) in &row.year_details {
            if let (Ok(y), Some(dy)) = (raw_year.parse::<i32>(), detail.diploma_year) {
                record.year_details.entry(y).or_insert(dy);
            }
        }
        if record.base_year.is_none() {
            if let Some(dy) = row.diploma_year.filter(|d| (1..=3).contains(d)) {
                record.base_year = Some(participation);
                record.base_diploma_year = Some(dy);
            } else if let Some(kpm) = row.kpm_no.as_deref().and_then(KpmNo::parse) {
                // The code pins the admission year; admission means year 1.
                record.base_year = Some(kpm.admission_year);
                record.base_diploma_year = Some(1);
            }
        }
    }

    /// Result-side lookup: playerId, then kpmNo, then bare name. Bare names
    /// only resolve while they are unambiguous across branches.
    pub fn resolve(
        &self,
        player_id: Option<&str>,
        kpm_no: Option<&str>,
        name: Option<&str>,
    ) -> Option<usize> {
        if let Some(idx) = player_id.and_then(|p| self.player_id_to_idx.get(p).copied()) {
            return Some(idx);
        }
        if let Some(idx) = kpm_no.and_then(|k| self.kpm_to_idx.get(&normalize(k)).copied()) {
            return Some(idx);
        }
        match name.and_then(|n| self.name_to_idx.get(&normalize(n))) {
            Some(NameSlot::Unique(idx)) => Some(*idx),
            _ => None,
        }
    }

    pub fn players(&self) -> &[CanonicalPlayer] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
