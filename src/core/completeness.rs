//! Season and series completeness.
//!
//! Pure functions comparing local episode counts (keyed by season number)
//! against the remote catalog's counts. Season 0 holds specials: it gets a
//! cell of its own but never counts toward the series ratio.

use crate::models::catalog::RemoteShowInfo;
use crate::models::report::{CompletionCell, CompletionStatus};
use std::collections::BTreeMap;

fn local_count(local: &BTreeMap<u32, u32>, season: u32) -> u32 {
    local.get(&season).copied().unwrap_or(0)
}

/// Status of a season the remote catalog lists with `remote > 0` episodes.
pub fn classify(local: u32, remote: u32) -> CompletionStatus {
    if local >= remote {
        CompletionStatus::Complete
    } else if local > 0 {
        CompletionStatus::Partial
    } else {
        CompletionStatus::Missing
    }
}

/// Completeness cell for one season.
pub fn season_cell(
    season: u32,
    local: &BTreeMap<u32, u32>,
    remote: Option<&RemoteShowInfo>,
) -> CompletionCell {
    let have = local_count(local, season);

    let Some(remote) = remote else {
        if have > 0 {
            return CompletionCell::new(format!("{}/?", have), CompletionStatus::Attention);
        }
        let beyond_local = local.keys().next_back().map_or(true, |&max| season > max);
        return if beyond_local {
            CompletionCell::blank(CompletionStatus::Neutral)
        } else {
            CompletionCell::blank(CompletionStatus::Missing)
        };
    };

    match remote.episode_count(season) {
        None if have > 0 => CompletionCell::new(format!("{}/?", have), CompletionStatus::Attention),
        None => CompletionCell::blank(CompletionStatus::Neutral),
        Some(0) => {
            let status = if have == 0 {
                CompletionStatus::Neutral
            } else {
                CompletionStatus::Attention
            };
            CompletionCell::new(format!("{}/0", have), status)
        }
        Some(want) => CompletionCell::new(format!("{}/{}", have, want), classify(have, want)),
    }
}

/// Series completeness cell: complete regular seasons over regular remote seasons.
pub fn series_cell(local: &BTreeMap<u32, u32>, remote: Option<&RemoteShowInfo>) -> CompletionCell {
    let Some(remote) = remote else {
        let regular = local.keys().filter(|&&s| s > 0).count();
        let status = if regular > 0 {
            CompletionStatus::Attention
        } else {
            CompletionStatus::Neutral
        };
        return CompletionCell::new(format!("{}/?", regular), status);
    };

    let denominator = remote.regular_seasons().count();
    let numerator = remote
        .regular_seasons()
        .filter(|s| {
            s.episode_count > 0 && local_count(local, s.season_number) >= s.episode_count
        })
        .count();

    let status = if denominator == 0 {
        CompletionStatus::Neutral
    } else if numerator == denominator {
        CompletionStatus::Complete
    } else if numerator > 0 {
        CompletionStatus::Partial
    } else {
        CompletionStatus::Attention
    };
    CompletionCell::new(format!("{}/{}", numerator, denominator), status)
}
