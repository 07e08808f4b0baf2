use std::cmp::Ordering;

use updraft_backend::ReleaseCandidate;

use crate::version::{compare_versions, is_newer_version};

/// Pick the release to offer from a parsed feed.
///
/// Candidates whose compatibility floor is above `server_version` are dropped.
/// The rest are sorted oldest-first (stable, so feed order breaks ties). The
/// oldest critical release that is still newer than `current_version` wins;
/// without one, the newest release is returned. An empty `server_version`
/// rejects every candidate that declares a floor.
#[must_use]
pub fn select_candidate(
    candidates: Vec<ReleaseCandidate>,
    current_version: &str,
    server_version: &str,
) -> Option<ReleaseCandidate> {
    let mut applicable: Vec<ReleaseCandidate> = candidates
        .into_iter()
        .filter(|candidate| {
            compare_versions(&candidate.min_server_version, server_version) != Ordering::Greater
        })
        .collect();

    if applicable.is_empty() {
        return None;
    }

    applicable.sort_by(|a, b| compare_versions(&a.version, &b.version));

    let critical = applicable.iter().position(|candidate| {
        candidate.critical_update && is_newer_version(&candidate.version, current_version)
    });

    match critical {
        Some(index) => Some(applicable.swap_remove(index)),
        None => applicable.pop(),
    }
}

#[cfg(test)]
mod tests {
    use updraft_backend::ReleaseCandidate;

    use super::select_candidate;

    fn versions(candidates: &[ReleaseCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.version.as_str()).collect()
    }

    #[test]
    fn first_newer_critical_release_wins_over_newest() {
        let feed = vec![
            ReleaseCandidate::new("1.0"),
            ReleaseCandidate::new("2.0").critical(),
            ReleaseCandidate::new("3.0"),
        ];

        let selected = select_candidate(feed, "0.9", "").expect("a candidate should be selected");

        assert_eq!(selected.version, "2.0");
    }

    #[test]
    fn lowest_qualifying_critical_release_is_chosen() {
        let feed = vec![
            ReleaseCandidate::new("4.0").critical(),
            ReleaseCandidate::new("1.0").critical(),
            ReleaseCandidate::new("3.0").critical(),
            ReleaseCandidate::new("5.0"),
        ];

        let selected = select_candidate(feed, "2.0", "").expect("a candidate should be selected");

        assert_eq!(selected.version, "3.0");
    }

    #[test]
    fn critical_release_not_newer_than_current_is_ignored() {
        let feed = vec![
            ReleaseCandidate::new("1.0").critical(),
            ReleaseCandidate::new("1.5"),
        ];

        let selected = select_candidate(feed, "1.0", "").expect("a candidate should be selected");

        assert_eq!(selected.version, "1.5");
    }

    #[test]
    fn newest_release_selected_without_critical_candidates() {
        let feed = vec![
            ReleaseCandidate::new("1.10"),
            ReleaseCandidate::new("1.2"),
            ReleaseCandidate::new("1.9"),
        ];

        let selected = select_candidate(feed, "1.0", "").expect("a candidate should be selected");

        assert_eq!(selected.version, "1.10");
    }

    #[test]
    fn candidates_above_server_floor_are_excluded() {
        let feed = vec![
            ReleaseCandidate::new("2.0").with_min_server_version("3.1"),
            ReleaseCandidate::new("3.0").with_min_server_version("4.0"),
            ReleaseCandidate::new("1.5").with_min_server_version("3.0"),
        ];

        let selected =
            select_candidate(feed, "1.0", "3.1").expect("a candidate should be selected");

        assert_eq!(selected.version, "2.0");
    }

    #[test]
    fn everything_filtered_returns_none() {
        let feed = vec![ReleaseCandidate::new("2.0").with_min_server_version("9.0")];

        assert_eq!(select_candidate(feed, "1.0", "3.0"), None);
        assert_eq!(select_candidate(Vec::new(), "1.0", "3.0"), None);
    }

    #[test]
    fn empty_server_version_rejects_candidates_with_a_floor() {
        let feed = vec![
            ReleaseCandidate::new("3.0").with_min_server_version("1.0"),
            ReleaseCandidate::new("2.0"),
        ];

        let selected = select_candidate(feed, "1.0", "").expect("unfloored candidate remains");

        assert_eq!(selected.version, "2.0");
    }

    #[test]
    fn equal_versions_keep_feed_order() {
        let feed = vec![
            ReleaseCandidate::new("2.0").with_download_url("https://example.com/a.msi"),
            ReleaseCandidate::new("1.0"),
            ReleaseCandidate::new("2.0").with_download_url("https://example.com/b.msi"),
        ];

        let selected = select_candidate(feed, "1.0", "").expect("a candidate should be selected");

        assert_eq!(selected.download_url, "https://example.com/b.msi");
    }

    #[test]
    fn stable_sort_orders_oldest_first() {
        let mut feed = vec![
            ReleaseCandidate::new("1.5"),
            ReleaseCandidate::new("1.5b3"),
            ReleaseCandidate::new("1.5.1"),
        ];
        feed.sort_by(|a, b| super::compare_versions(&a.version, &b.version));

        assert_eq!(versions(&feed), vec!["1.5b3", "1.5", "1.5.1"]);
    }
}
