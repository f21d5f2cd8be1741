//! Small helpers shared by core modules.

/// Items where any of the fields contains `query`, case-insensitively. Order is preserved.
/// An empty or blank query matches everything.
pub fn filter_by_query<'a, T, F, const N: usize>(
    items: impl IntoIterator<Item = &'a T>,
    query: &str,
    fields: F,
) -> Vec<&'a T>
where
    T: ?Sized + 'a,
    F: Fn(&'a T) -> [&'a str; N],
{
    let q = query.trim().to_lowercase();
    items
        .into_iter()
        .filter(|item| q.is_empty() || fields(*item).iter().any(|f| f.to_lowercase().contains(&q)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry {
        id: &'static str,
        name: &'static str,
    }

    const ENTRIES: [Entry; 3] = [
        Entry { id: "gpt-4o", name: "GPT-4o" },
        Entry { id: "claude", name: "Claude" },
        Entry { id: "meta-llama/Llama-3", name: "Llama 3 Instruct" },
    ];

    fn ids(query: &str) -> Vec<&'static str> {
        filter_by_query(&ENTRIES, query, |e| [e.id, e.name])
            .into_iter()
            .map(|e| e.id)
            .collect()
    }

    #[test]
    fn blank_query_returns_all_in_order() {
        assert_eq!(ids(""), vec!["gpt-4o", "claude", "meta-llama/Llama-3"]);
        assert_eq!(ids("   ").len(), 3);
    }

    #[test]
    fn matches_either_field_case_insensitively() {
        assert_eq!(ids("CLAUDE"), vec!["claude"]);
        assert_eq!(ids("instruct"), vec!["meta-llama/Llama-3"]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(ids("mistral").is_empty());
    }
}
