use serde::Serialize;
use std::collections::HashMap;

use crate::models::{GroupMemberRef, GroupResult, IndividualResult, Medal};
use crate::resolver::{CanonicalPlayer, IdentityResolver};

/// Which diploma-year bucket (0-based index into `buckets`) a result year
/// falls in for a given player: explicit per-year mapping, then the result's
/// own diplomaYear, then the computed fallback off the player's base pair.
/// Anything outside 1..=3 is dropped, not clamped.
pub fn diploma_year_bucket(
    player: &CanonicalPlayer,
    result_year: i32,
    result_diploma_year: Option<i32>,
) -> Option<usize> {
    let dy = player
        .year_details
        .get(&result_year)
        .copied()
        .or(result_diploma_year)
        .or_else(|| match (player.base_year, player.base_diploma_year) {
            (Some(base_year), Some(base_dy)) => Some(base_dy + (result_year - base_year)),
            _ => None,
        })?;
    if (1..=3).contains(&dy) {
        Some((dy - 1) as usize)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketTally {
    pub points: u32,
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

impl BucketTally {
    fn credit(&mut self, medal: Medal, points: u32) {
        self.points += points;
        match medal {
            Medal::Gold => self.gold += 1,
            Medal::Silver => self.silver += 1,
            Medal::Bronze => self.bronze += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPerformance {
    pub master_id: String,
    pub display_name: String,
    pub branch: Option<String>,
    /// Diploma years 1..=3.
    pub buckets: [BucketTally; 3],
    pub total_points: u32,
}

/// What the original frontend dropped silently. Skipped contributions still
/// score nothing; here they are at least counted.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationCounts {
    pub unmatched_individual: u32,
    pub unmatched_group_members: u32,
    pub dropped_out_of_range: u32,
    pub unknown_medals: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub generated_ts: i64,
    pub players: Vec<PlayerPerformance>,
    pub counts: ReconciliationCounts,
    pub total_points_awarded: u64,
}

fn member_parts<'a>(
    group: &'a GroupResult,
    index: usize,
) -> (Option<&'a str>, Option<&'a str>, Option<&'a str>) {
    let mut id = None;
    let mut kpm = None;
    let mut name = None;
    match group.members.get(index) {
        Some(GroupMemberRef::Name(n)) => name = Some(n.as_str()),
        Some(GroupMemberRef::Detailed(d)) => {
            name = d.name.as_deref();
            id = d.id.as_deref();
            kpm = d.kpm_no.as_deref();
        }
        None => {}
    }
    // The parallel arrays fill in whatever the member entry itself lacks.
    if id.is_none() {
        id = group.member_ids.get(index).and_then(|v| v.as_deref());
    }
    if kpm.is_none() {
        kpm = group.member_kpm_nos.get(index).and_then(|v| v.as_deref());
    }
    (id, kpm, name)
}

/// Walk individual then group results, crediting medal points to each
/// resolved player's diploma-year bucket. Group medals are credited in full
/// to every resolved member.
pub fn aggregate(
    resolver: &IdentityResolver,
    individuals: &[IndividualResult],
    groups: &[GroupResult],
) -> PerformanceReport {
    let mut tallies: HashMap<usize, [BucketTally; 3]> = HashMap::new();
    let mut counts = ReconciliationCounts::default();
    let mut total_awarded: u64 = 0;

    for result in individuals {
        let Some(medal) = Medal::parse(&result.medal) else {
            counts.unknown_medals += 1;
            continue;
        };
        let Some(idx) = resolver.resolve(
            result.player_id.as_deref(),
            result.kpm_no.as_deref(),
            result.name.as_deref(),
        ) else {
            counts.unmatched_individual += 1;
            continue;
        };
        let player = &resolver.players()[idx];
        let Some(bucket) = diploma_year_bucket(player, result.year, result.diploma_year) else {
            counts.dropped_out_of_range += 1;
            continue;
        };
        let points = medal.individual_points();
        tallies.entry(idx).or_default()[bucket].credit(medal, points);
        total_awarded += u64::from(points);
    }

    for group in groups {
        let Some(medal) = Medal::parse(&group.medal) else {
            counts.unknown_medals += 1;
            continue;
        };
        let member_count = group
            .members
            .len()
            .max(group.member_ids.len())
            .max(group.member_kpm_nos.len());
        for index in 0..member_count {
            let (id, kpm, name) = member_parts(group, index);
            let Some(idx) = resolver.resolve(id, kpm, name) else {
                counts.unmatched_group_members += 1;
                continue;
            };
            let player = &resolver.players()[idx];
            let Some(bucket) = diploma_year_bucket(player, group.year, None) else {
                counts.dropped_out_of_range += 1;
                continue;
            };
            let points = medal.group_points();
            tallies.entry(idx).or_default()[bucket].credit(medal, points);
            total_awarded += u64::from(points);
        }
    }

    let mut players: Vec<PlayerPerformance> = resolver
        .players()
        .iter()
        .enumerate()
        .map(|(idx, player)| {
            let buckets = tallies.get(&idx).copied().unwrap_or_default();
            let total_points = buckets.iter().map(|b| b.points).sum();
            PlayerPerformance {
                master_id: player.master_id.clone(),
                display_name: player.display_name.clone(),
                branch: player.branch.clone(),
                buckets,
                total_points,
            }
        })
        .collect();
    players.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    if counts.unmatched_individual > 0
        || counts.unmatched_group_members > 0
        || counts.dropped_out_of_range > 0
        || counts.unknown_medals > 0
    {
        tracing::warn!(
            "reconciliation skipped contributions: {} individual unmatched, {} group members unmatched, {} out of range, {} unknown medals",
            counts.unmatched_individual,
            counts.unmatched_group_members,
            counts.dropped_out_of_range,
            counts.unknown_medals
        );
    }

    PerformanceReport {
        generated_ts: chrono::Utc::now().timestamp(),
        players,
        counts,
        total_points_awarded: total_awarded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlayerBatch, PlayerRow};

    fn roster() -> IdentityResolver {
        let mut resolver = IdentityResolver::new();
        let players = vec![
            PlayerRow {
                id: Some("p-1".into()),
                master_id: Some("m-1".into()),
                name: "Asha Rao".into(),
                branch: Some("Athletics".into()),
                diploma_year: Some(1),
                ..PlayerRow::default()
            },
            PlayerRow {
                id: Some("p-2".into()),
                master_id: Some("m-2".into()),
                name: "Dev Nair".into(),
                branch: Some("Swimming".into()),
                diploma_year: Some(2),
                ..PlayerRow::default()
            },
        ];
        resolver.ingest_batches(&[PlayerBatch {
            year: 2023,
            players,
        }]);
        resolver
    }

    fn individual(player_id: &str, medal: &str, year: i32) -> IndividualResult {
        IndividualResult {
            player_id: Some(player_id.into()),
            event: "100m".into(),
            medal: medal.into(),
            year,
            ..IndividualResult::default()
        }
    }

    fn find<'a>(report: &'a PerformanceReport, master: &str) -> &'a PlayerPerformance {
        report
            .players
            .iter()
            .find(|p| p.master_id == master)
            .expect("player present in report")
    }

    #[test]
    fn individual_point_table() {
        let resolver = roster();
        let results = vec![
            individual("p-1", "Gold", 2023),
            individual("p-1", "silver", 2023),
            individual("p-1", "Bronze", 2023),
        ];
        let report = aggregate(&resolver, &results, &[]);
        let asha = find(&report, "m-1");
        assert_eq!(asha.buckets[0].points, 9);
        assert_eq!(asha.buckets[0].gold, 1);
        assert_eq!(asha.buckets[0].silver, 1);
        assert_eq!(asha.buckets[0].bronze, 1);
        assert_eq!(asha.total_points, 9);
        assert_eq!(report.total_points_awarded, 9);
    }

    #[test]
    fn explicit_year_mapping_beats_result_field() {
        let resolver = roster();
        // p-1 was in diploma year 1 during 2023; the result claims year 2.
        let mut result = individual("p-1", "Gold", 2023);
        result.diploma_year = Some(2);
        let report = aggregate(&resolver, &[result], &[]);
        let asha = find(&report, "m-1");
        assert_eq!(asha.buckets[0].points, 5);
        assert_eq!(asha.buckets[1].points, 0);
    }

    #[test]
    fn computed_fallback_walks_forward_from_base_pair() {
        let resolver = roster();
        // Base pair for p-1 is (2023, 1): a 2025 result lands in year 3.
        let report = aggregate(&resolver, &[individual("p-1", "Gold", 2025)], &[]);
        let asha = find(&report, "m-1");
        assert_eq!(asha.buckets[2].points, 5);

        // 2026 would be year 4: dropped, not clamped.
        let report = aggregate(&resolver, &[individual("p-1", "Gold", 2026)], &[]);
        let asha = find(&report, "m-1");
        assert_eq!(asha.total_points, 0);
        assert_eq!(report.counts.dropped_out_of_range, 1);
        assert_eq!(report.total_points_awarded, 0);
    }

    #[test]
    fn group_medals_credit_every_resolved_member_in_full() {
        let resolver = roster();
        let group = GroupResult {
            team_name: "Relay A".into(),
            members: vec![
                GroupMemberRef::Name("Asha Rao".into()),
                GroupMemberRef::Name("Dev Nair".into()),
                GroupMemberRef::Name("Nobody Known".into()),
            ],
            event: "4x100m".into(),
            medal: "Gold".into(),
            year: 2023,
            ..GroupResult::default()
        };
        let report = aggregate(&resolver, &[], &[group]);
        assert_eq!(find(&report, "m-1").total_points, 10);
        assert_eq!(find(&report, "m-2").total_points, 10);
        assert_eq!(report.counts.unmatched_group_members, 1);
        assert_eq!(report.total_points_awarded, 20);
    }

    #[test]
    fn parallel_id_arrays_fill_in_for_name_only_members() {
        let resolver = roster();
        let group = GroupResult {
            team_name: "Relay B".into(),
            // Misspelled name would never match; the parallel id array does.
            members: vec![GroupMemberRef::Name("Aysha Rao".into())],
            member_ids: vec![Some("p-1".into())],
            event: "4x400m".into(),
            medal: "Silver".into(),
            year: 2023,
            ..GroupResult::default()
        };
        let report = aggregate(&resolver, &[], &[group]);
        assert_eq!(find(&report, "m-1").buckets[0].points, 7);
        assert_eq!(report.counts.unmatched_group_members, 0);
    }

    #[test]
    fn unknown_medals_and_unmatched_results_are_counted_not_scored() {
        let resolver = roster();
        let results = vec![
            individual("p-1", "platinum", 2023),
            individual("p-404", "Gold", 2023),
        ];
        let report = aggregate(&resolver, &results, &[]);
        assert_eq!(report.counts.unknown_medals, 1);
        assert_eq!(report.counts.unmatched_individual, 1);
        assert_eq!(report.total_points_awarded, 0);
    }

    #[test]
    fn total_awarded_never_exceeds_the_medal_value_bound() {
        let resolver = roster();
        let individuals = vec![
            individual("p-1", "Gold", 2023),
            individual("p-404", "Gold", 2023),
        ];
        let group = GroupResult {
            team_name: "Relay A".into(),
            members: vec![
                GroupMemberRef::Name("Asha Rao".into()),
                GroupMemberRef::Name("Nobody Known".into()),
            ],
            event: "4x100m".into(),
            medal: "Bronze".into(),
            year: 2023,
            ..GroupResult::default()
        };
        let report = aggregate(&resolver, &individuals, &[group]);
        // Bound: 2 individual golds + bronze times 2 members = 10 + 8.
        let bound = 2 * 5 + 2 * 4;
        assert!(report.total_points_awarded <= bound);
        // Exactly one gold and one bronze member actually resolved.
        assert_eq!(report.total_points_awarded, 5 + 4);
    }

    #[test]
    fn fully_resolved_input_hits_the_bound_exactly() {
        let resolver = roster();
        let individuals = vec![
            individual("p-1", "Gold", 2023),
            individual("p-2", "Silver", 2023),
        ];
        let report = aggregate(&resolver, &individuals, &[]);
        assert_eq!(report.total_points_awarded, 8);
        let summed: u64 = report
            .players
            .iter()
            .map(|p| u64::from(p.total_points))
            .sum();
        assert_eq!(summed, report.total_points_awarded);
    }
}
