use serde::Deserialize;

/// Exact-match status filter shared by every list screen. `active` means
/// is_active for people/clients and `pending` for audits; `inactive` is the
/// complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filter: StatusFilter,
}

/// Collections are filtered in memory after fetching the full set; there is
/// no pagination or server-side search.
pub trait Filterable {
    /// Fields the case-insensitive substring search runs over.
    fn search_fields(&self) -> Vec<&str>;
    /// Whether the row counts as "active" for the status filter.
    fn is_active_like(&self) -> bool;
}

pub fn matches_search(term: &str, fields: &[&str]) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    fields.iter().any(|f| f.to_lowercase().contains(&term))
}

pub fn apply<T: Filterable>(items: Vec<T>, query: &ListQuery) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| {
            let matches_term = matches_search(&query.search, &item.search_fields());
            let matches_status = match query.filter {
                StatusFilter::All => true,
                StatusFilter::Active => item.is_active_like(),
                StatusFilter::Inactive => !item.is_active_like(),
            };
            matches_term && matches_status
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: &'static str,
        email: &'static str,
        active: bool,
    }

    impl Filterable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.name, self.email]
        }
        fn is_active_like(&self) -> bool {
            self.active
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Maria Silva", email: "maria@exemplo.com", active: true },
            Row { name: "João Souza", email: "joao@exemplo.com", active: false },
            Row { name: "Ana Pereira", email: "ana@outro.com", active: true },
        ]
    }

    #[test]
    fn empty_search_and_all_is_identity() {
        let query = ListQuery::default();
        let filtered = apply(rows(), &query);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let query = ListQuery {
            search: "MARIA".into(),
            filter: StatusFilter::All,
        };
        let filtered = apply(rows(), &query);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Maria Silva");
    }

    #[test]
    fn search_covers_secondary_fields() {
        let query = ListQuery {
            search: "exemplo.com".into(),
            filter: StatusFilter::All,
        };
        assert_eq!(apply(rows(), &query).len(), 2);
    }

    #[test]
    fn status_filter_partitions_collection() {
        let active = apply(
            rows(),
            &ListQuery { search: String::new(), filter: StatusFilter::Active },
        );
        let inactive = apply(
            rows(),
            &ListQuery { search: String::new(), filter: StatusFilter::Inactive },
        );
        assert_eq!(active.len(), 2);
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].name, "João Souza");
    }

    #[test]
    fn search_and_filter_combine() {
        let query = ListQuery {
            search: "exemplo".into(),
            filter: StatusFilter::Inactive,
        };
        let filtered = apply(rows(), &query);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "João Souza");
    }
}
