use std::cmp::Ordering;

use serde::Serialize;

use super::repo_types::LeaderboardEntry;

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    /// 1-based; `None` until the hunt is completed.
    pub rank: Option<u32>,
    pub elapsed_seconds: Option<f64>,
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
}

fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    match (a.elapsed(), b.elapsed()) {
        (Some(ea), Some(eb)) => ea
            .cmp(&eb)
            .then(a.attempts.cmp(&b.attempts))
            .then(a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .time_started
            .cmp(&b.time_started)
            .then(a.id.cmp(&b.id)),
    }
}

/// Finishers first by elapsed time, then attempts. Unfinished runs trail in
/// start order without a rank.
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>) -> Vec<RankedEntry> {
    entries.sort_by(compare);

    let mut next_rank = 0u32;
    entries
        .into_iter()
        .map(|entry| {
            let elapsed = entry.elapsed();
            let rank = elapsed.map(|_| {
                next_rank += 1;
                next_rank
            });
            RankedEntry {
                rank,
                elapsed_seconds: elapsed.map(|d| d.as_seconds_f64()),
                entry,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};

    fn entry(id: i64, started_min: i64, took_min: Option<i64>, attempts: i64) -> LeaderboardEntry {
        let start = OffsetDateTime::UNIX_EPOCH + Duration::minutes(started_min);
        LeaderboardEntry {
            id,
            user_id: id,
            hunt_id: 1,
            time_started: start,
            time_completed: took_min.map(|m| start + Duration::minutes(m)),
            attempts,
        }
    }

    fn ids(ranked: &[RankedEntry]) -> Vec<i64> {
        ranked.iter().map(|r| r.entry.id).collect()
    }

    #[test]
    fn fastest_finisher_ranks_first() {
        let ranked = rank_entries(vec![
            entry(1, 0, Some(30), 1),
            entry(2, 5, Some(10), 4),
            entry(3, 2, Some(20), 0),
        ]);
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
        assert_eq!(
            ranked.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(3)]
        );
        assert_eq!(ranked[0].elapsed_seconds, Some(600.0));
    }

    #[test]
    fn attempts_break_time_ties() {
        let ranked = rank_entries(vec![entry(1, 0, Some(15), 3), entry(2, 0, Some(15), 1)]);
        assert_eq!(ids(&ranked), vec![2, 1]);
    }

    #[test]
    fn unfinished_runs_trail_without_rank() {
        let ranked = rank_entries(vec![
            entry(1, 10, None, 2),
            entry(2, 0, Some(90), 9),
            entry(3, 5, None, 0),
        ]);
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
        assert_eq!(ranked[0].rank, Some(1));
        assert_eq!(ranked[1].rank, None);
        assert_eq!(ranked[2].rank, None);
        assert_eq!(ranked[2].elapsed_seconds, None);
    }

    #[test]
    fn empty_board() {
        assert!(rank_entries(Vec::new()).is_empty());
    }
}
