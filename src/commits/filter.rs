use crate::commits::CommitRecord;
use chrono::NaiveDate;

/// Keeps the commits authored on `date`, in their original order.
///
/// Records whose timestamp cannot be parsed never match.
pub fn commits_on_date(commits: Vec<CommitRecord>, date: NaiveDate) -> Vec<CommitRecord> {
    commits
        .into_iter()
        .filter(|commit| commit.authored_date() == Some(date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::commits_on_date;
    use crate::commits::sample;
    use chrono::NaiveDate;

    fn day(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("date")
    }

    #[test]
    fn matches_single_record_on_its_day_only() {
        let commits = vec![sample("abc", "2024-01-01T10:00:00Z")];

        let same_day = commits_on_date(commits.clone(), day("2024-01-01"));
        assert_eq!(same_day, commits);

        assert!(commits_on_date(commits, day("2024-01-02")).is_empty());
    }

    #[test]
    fn preserves_order_and_skips_other_days() {
        let commits = vec![
            sample("c3", "2024-03-02T09:00:00Z"),
            sample("c2", "2024-03-01T18:00:00Z"),
            sample("c1", "2024-03-02T01:00:00Z"),
        ];

        let ids = commits_on_date(commits, day("2024-03-02"))
            .into_iter()
            .map(|commit| commit.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, vec!["c3", "c1"]);
    }

    #[test]
    fn short_timestamps_are_excluded_without_panicking() {
        let commits = vec![
            sample("short", "2024-01"),
            sample("empty", ""),
            sample("ok", "2024-01-01T00:00:00Z"),
        ];

        let kept = commits_on_date(commits, day("2024-01-01"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "ok");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(commits_on_date(Vec::new(), day("2024-01-01")).is_empty());
    }
}
