use crate::domain::{Entry, EntryMinimal};

/// Which entries survive the first pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    None,
    Unread,
    Starred,
}

impl FilterMode {
    pub fn next(self) -> Self {
        match self {
            FilterMode::None => FilterMode::Unread,
            FilterMode::Unread => FilterMode::Starred,
            FilterMode::Starred => FilterMode::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::None => "all",
            FilterMode::Unread => "unread",
            FilterMode::Starred => "starred",
        }
    }
}

/// Final-stage ordering of the minimal list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    ByDate,
    UnreadFirst,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::ByDate => SortOrder::UnreadFirst,
            SortOrder::UnreadFirst => SortOrder::ByDate,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::ByDate => "by date",
            SortOrder::UnreadFirst => "unread first",
        }
    }
}

/// Stage 1: keep entries matching the mode. Order preserved.
pub fn filter_entries(entries: &[Entry], mode: FilterMode) -> Vec<Entry> {
    entries
        .iter()
        .filter(|e| match mode {
            FilterMode::None => true,
            FilterMode::Unread => !e.is_read,
            FilterMode::Starred => e.is_starred,
        })
        .cloned()
        .collect()
}

/// Stage 2: case-insensitive title substring match. Empty query is identity.
/// Runs over the filtered set, not the raw one: filter and query compose.
pub fn query_entries(entries: Vec<Entry>, query: &str) -> Vec<Entry> {
    if query.is_empty() {
        return entries;
    }
    let needle = query.to_lowercase();
    entries
        .into_iter()
        .filter(|e| e.title.to_lowercase().contains(&needle))
        .collect()
}

/// Stage 3a: project surviving entries to display records.
pub fn to_minimal(entries: &[Entry]) -> Vec<EntryMinimal> {
    entries.iter().map(EntryMinimal::from).collect()
}

/// Stage 3b: order the minimal list.
///
/// ByDate sorts publish date descending with undated entries after all dated
/// ones, keeping relative order among the undated. UnreadFirst is a stable
/// partition, not a re-sort: relative order within each group is preserved.
pub fn sort_minimal(mut list: Vec<EntryMinimal>, order: SortOrder) -> Vec<EntryMinimal> {
    match order {
        SortOrder::ByDate => {
            list.sort_by(|a, b| match (&a.published, &b.published) {
                (Some(a), Some(b)) => b.cmp(a),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }
        SortOrder::UnreadFirst => {
            list.sort_by_key(|e| e.is_read);
        }
    }
    list
}

/// True iff every displayed entry is read. Vacuously true on empty. A full
/// scan on purpose: the displayed list carries no ordering guarantee that
/// would make an early exit sound.
pub fn all_read(list: &[EntryMinimal]) -> bool {
    list.iter().all(|e| e.is_read)
}

/// True iff every displayed entry is starred. Vacuously true on empty.
pub fn all_starred(list: &[EntryMinimal]) -> bool {
    list.iter().all(|e| e.is_starred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn entry(url: &str, title: &str, read: bool, starred: bool) -> Entry {
        let mut entry = Entry::new(url.into(), "https://example.com/feed.xml".into());
        entry.title = title.into();
        entry.is_read = read;
        entry.is_starred = starred;
        entry
    }

    fn date(s: &str) -> Option<DateTime<Utc>> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn filter_none_passes_everything() {
        let entries = vec![
            entry("u/a", "A", true, false),
            entry("u/b", "B", false, true),
        ];
        let result = filter_entries(&entries, FilterMode::None);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].url, "u/a");
    }

    #[test]
    fn filter_unread_and_starred() {
        let entries = vec![
            entry("u/a", "A", true, true),
            entry("u/b", "B", false, false),
            entry("u/c", "C", false, true),
        ];

        let unread = filter_entries(&entries, FilterMode::Unread);
        assert_eq!(
            unread.iter().map(|e| e.url.as_str()).collect::<Vec<_>>(),
            vec!["u/b", "u/c"]
        );

        let starred = filter_entries(&entries, FilterMode::Starred);
        assert_eq!(
            starred.iter().map(|e| e.url.as_str()).collect::<Vec<_>>(),
            vec!["u/a", "u/c"]
        );
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let entries = vec![
            entry("u/a", "Big News", false, false),
            entry("u/b", "Sports", false, false),
        ];
        let result = query_entries(entries, "NEWS");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Big News");
    }

    #[test]
    fn empty_query_is_identity() {
        let entries = vec![entry("u/a", "A", false, false)];
        assert_eq!(query_entries(entries.clone(), ""), entries);
    }

    #[test]
    fn filter_then_query_composes() {
        // filter=UNREAD, query="news": only unread titles containing "news".
        let entries = vec![
            entry("u/a", "Big News", false, false),
            entry("u/b", "Old News", true, false),
            entry("u/c", "Sports", false, false),
        ];
        let result = query_entries(filter_entries(&entries, FilterMode::Unread), "news");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Big News");
    }

    #[test]
    fn sort_by_date_descending_undated_last() {
        let mut a = entry("u/a", "A", false, false);
        a.published = date("2024-01-01T00:00:00Z");
        let mut b = entry("u/b", "B", false, false);
        b.published = date("2024-06-01T00:00:00Z");
        let undated1 = entry("u/u1", "U1", false, false);
        let undated2 = entry("u/u2", "U2", false, false);

        let list = to_minimal(&[undated1, a, undated2, b]);
        let sorted = sort_minimal(list, SortOrder::ByDate);

        let urls: Vec<&str> = sorted.iter().map(|e| e.url.as_str()).collect();
        // Dated descending first, then undated in their original relative order.
        assert_eq!(urls, vec!["u/b", "u/a", "u/u1", "u/u2"]);
    }

    #[test]
    fn unread_first_is_a_stable_partition() {
        let list = to_minimal(&[
            entry("u/r1", "R1", true, false),
            entry("u/u1", "U1", false, false),
            entry("u/r2", "R2", true, false),
            entry("u/u2", "U2", false, false),
        ]);
        let sorted = sort_minimal(list, SortOrder::UnreadFirst);

        let urls: Vec<&str> = sorted.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["u/u1", "u/u2", "u/r1", "u/r2"]);
    }

    #[test]
    fn all_flags_vacuously_true_on_empty() {
        assert!(all_read(&[]));
        assert!(all_starred(&[]));
    }

    #[test]
    fn all_flags_require_every_element() {
        // A matching prefix must not short-circuit to true.
        let list = to_minimal(&[
            entry("u/a", "A", true, true),
            entry("u/b", "B", false, false),
            entry("u/c", "C", true, true),
        ]);
        assert!(!all_read(&list));
        assert!(!all_starred(&list));
    }
}
