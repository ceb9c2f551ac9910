//! View projection: the filtered, pinned-first, sorted list the user sees.
//!
//! The projection borrows from the collection and never mutates it.
use std::cmp::Ordering;

use log::trace;

use crate::{Note, SortOption};

/// Projects `notes` for display.
///
/// 1. Keeps notes whose title or content contains `query`, ignoring case.
///    An empty query keeps every note.
/// 2. Puts pinned notes before unpinned ones.
/// 3. Orders each partition by `sort`. The sort is stable, so equal keys keep
///    their collection order.
pub fn project<'a>(notes: &'a [Note], query: &str, sort: SortOption) -> Vec<&'a Note> {
    let needle = query.to_lowercase();

    let mut visible: Vec<&Note> = notes
        .iter()
        .filter(|note| note.matches_lowercase(&needle))
        .collect();

    visible.sort_by(|a, b| b.is_pinned.cmp(&a.is_pinned).then_with(|| compare(a, b, sort)));

    trace!(
        "Projected {} of {} notes (query '{}', sort {})",
        visible.len(),
        notes.len(),
        query,
        sort
    );
    visible
}

fn compare(a: &Note, b: &Note, sort: SortOption) -> Ordering {
    match sort {
        SortOption::CreatedNewest => b.created_at.cmp(&a.created_at),
        SortOption::CreatedOldest => a.created_at.cmp(&b.created_at),
        SortOption::ModifiedRecent => b.last_modified.cmp(&a.last_modified),
        SortOption::AlphabeticalTitle => a.title.cmp(&b.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, title: &str, content: &str, created: i64, modified: i64) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            is_pinned: false,
            created_at: created,
            last_modified: modified,
            color: None,
        }
    }

    fn ids(view: &[&Note]) -> Vec<String> {
        view.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn each_sort_option_orders_unpinned_notes() {
        let notes = vec![
            note("b", "beta", "", 2, 30),
            note("a", "Alpha", "", 1, 10),
            note("c", "alpha", "", 3, 20),
        ];

        assert_eq!(ids(&project(&notes, "", SortOption::CreatedNewest)), ["c", "b", "a"]);
        assert_eq!(ids(&project(&notes, "", SortOption::CreatedOldest)), ["a", "b", "c"]);
        assert_eq!(ids(&project(&notes, "", SortOption::ModifiedRecent)), ["b", "c", "a"]);
        // Uppercase sorts before lowercase.
        assert_eq!(ids(&project(&notes, "", SortOption::AlphabeticalTitle)), ["a", "c", "b"]);
    }

    #[test]
    fn pinned_notes_always_come_first() {
        let mut notes = vec![
            note("old", "z", "", 1, 1),
            note("new", "a", "", 5, 5),
            note("mid", "m", "", 3, 3),
        ];
        notes[0].is_pinned = true;

        for sort in [
            SortOption::CreatedNewest,
            SortOption::CreatedOldest,
            SortOption::ModifiedRecent,
            SortOption::AlphabeticalTitle,
        ] {
            let view = project(&notes, "", sort);
            assert_eq!(view[0].id, "old", "sort {}", sort);
            assert!(view[1..].iter().all(|n| !n.is_pinned));
        }
    }

    #[test]
    fn equal_keys_keep_collection_order() {
        let notes = vec![
            note("first", "", "", 1, 100),
            note("second", "", "", 2, 100),
            note("third", "", "", 3, 50),
        ];
        let view = project(&notes, "", SortOption::ModifiedRecent);
        assert_eq!(ids(&view), ["first", "second", "third"]);
    }

    #[test]
    fn filter_is_case_insensitive_over_title_and_content() {
        let notes = vec![
            note("a", "Groceries", "milk, EGGS", 1, 1),
            note("b", "Eggplant recipe", "", 2, 2),
            note("c", "Plan", "trip", 3, 3),
        ];
        let view = project(&notes, "eGg", SortOption::CreatedOldest);
        assert_eq!(ids(&view), ["a", "b"]);
        assert!(project(&notes, "nothing", SortOption::CreatedOldest).is_empty());
        assert_eq!(project(&notes, "", SortOption::CreatedOldest).len(), 3);
    }
}
