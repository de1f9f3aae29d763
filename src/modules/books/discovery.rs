//! Book discovery: match a free-text term, apply structured filters, then sort.
//!
//! Every stage is a pure function over a catalog snapshot. Nothing here can
//! fail; unparseable inputs degrade to "no constraint".

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use super::models::{Book, ReadingStatus, StatusMap};
use crate::utils::{coerce_int, leading_int};

/// Status filter value meaning "books the tracker has no entry for".
pub const NO_STATUS: &str = "sem status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Title,
    Author,
    Year,
    Rating,
    Pages,
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "author" => Ok(SortField::Author),
            "year" => Ok(SortField::Year),
            "rating" => Ok(SortField::Rating),
            "pages" => Ok(SortField::Pages),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Reading-status constraint, checked against the status tracker map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    /// Books without a tracked status.
    NoStatus,
    Is(ReadingStatus),
    /// A label that is not a known status; matches nothing.
    Unknown(String),
}

impl StatusFilter {
    /// `None` for an empty value (no constraint).
    pub fn parse(value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        if value == NO_STATUS {
            return Some(StatusFilter::NoStatus);
        }
        Some(match value.parse() {
            Ok(status) => StatusFilter::Is(status),
            Err(_) => StatusFilter::Unknown(value.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Exact, case-sensitive genre display name.
    pub genre: Option<String>,
    pub status: Option<StatusFilter>,
    pub min_rating: Option<i64>,
}

impl Filters {
    /// Build filters from raw form values; empty values mean "no filter".
    pub fn from_raw(genre: &str, status: &str, min_rating: &str) -> Self {
        Self {
            genre: (!genre.is_empty()).then(|| genre.to_string()),
            status: StatusFilter::parse(status),
            min_rating: parse_threshold(min_rating),
        }
    }
}

/// Rating threshold from a form value, read like a leading integer
/// (`"4.5"` is 4, `"5 estrelas"` is 5). No digits at all means no threshold.
pub fn parse_threshold(raw: &str) -> Option<i64> {
    coerce_int(&Value::from(raw)).or_else(|| leading_int(raw))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryQuery {
    pub term: String,
    pub filters: Filters,
    pub sort: SortSpec,
}

/// Query-string form of a discovery request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryParams {
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub min_rating: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
}

impl From<DiscoveryParams> for DiscoveryQuery {
    fn from(params: DiscoveryParams) -> Self {
        let field = params
            .sort
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let direction = params
            .direction
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or_default();

        Self {
            term: params.term.unwrap_or_default(),
            filters: Filters::from_raw(
                params.genre.as_deref().unwrap_or_default(),
                params.status.as_deref().unwrap_or_default(),
                params.min_rating.as_deref().unwrap_or_default(),
            ),
            sort: SortSpec::new(field, direction),
        }
    }
}

/// Run the whole pipeline over a catalog snapshot.
pub fn discover(catalog: &[Book], query: &DiscoveryQuery, statuses: &StatusMap) -> Vec<Book> {
    let term = query.term.to_lowercase();

    let mut found: Vec<Book> = catalog
        .iter()
        .filter(|book| matches_term(book, &term))
        .filter(|book| passes_filters(book, &query.filters, statuses))
        .cloned()
        .collect();

    sort_books(&mut found, &query.sort);
    found
}

/// Whether the lowercased `term` occurs in any searchable field.
pub fn matches_term(book: &Book, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }

    let contains = |text: &str| text.to_lowercase().contains(term);

    contains(&book.title)
        || contains(&book.author)
        || contains(book.genre_name())
        || book.year.is_some_and(|year| year.to_string().contains(term))
        || book.pages.is_some_and(|pages| pages.to_string().contains(term))
        || book.synopsis.as_deref().is_some_and(contains)
}

/// All filters must pass.
pub fn passes_filters(book: &Book, filters: &Filters, statuses: &StatusMap) -> bool {
    let genre_ok = filters
        .genre
        .as_deref()
        .map_or(true, |genre| book.genre_name() == genre);

    let status_ok = match &filters.status {
        None => true,
        Some(StatusFilter::NoStatus) => !statuses.contains_key(&book.id),
        Some(StatusFilter::Is(wanted)) => statuses.get(&book.id) == Some(wanted),
        Some(StatusFilter::Unknown(_)) => false,
    };

    let rating_ok = filters
        .min_rating
        .map_or(true, |min| book.rating.is_some_and(|r| i64::from(r) >= min));

    genre_ok && status_ok && rating_ok
}

/// Stable sort; ties keep their incoming order in both directions.
pub fn sort_books(books: &mut [Book], sort: &SortSpec) {
    books.sort_by(|a, b| {
        let ordering = compare_by(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_by(a: &Book, b: &Book, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
        SortField::Year => a.year.unwrap_or(0).cmp(&b.year.unwrap_or(0)),
        SortField::Rating => a.rating.unwrap_or(0).cmp(&b.rating.unwrap_or(0)),
        SortField::Pages => a.pages.unwrap_or(0).cmp(&b.pages.unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::GenreField;

    fn book(id: &str, title: &str, author: &str, genre: &str) -> Book {
        let mut book = Book::new(id, title, author);
        book.genre = Some(GenreField::from(genre));
        book
    }

    fn catalog() -> Vec<Book> {
        let mut pride = book("1", "Orgulho e Preconceito", "Jane Austen", "Romance");
        pride.year = Some(1813);
        pride.rating = Some(5);
        pride.pages = Some(424);
        pride.synopsis = Some("Elizabeth Bennet e o orgulhoso Sr. Darcy.".to_string());

        let mut potter = book("2", "Harry Potter e a Pedra Filosofal", "J.K. Rowling", "Fantasia");
        potter.year = Some(1997);
        potter.rating = Some(4);
        potter.pages = Some(264);

        let mut dune = book("3", "Duna", "Frank Herbert", "Ficção Científica");
        dune.year = Some(1965);
        dune.rating = Some(5);
        dune.pages = Some(688);
        dune.synopsis = Some("Paul Atreides em Arrakis.".to_string());

        let untitled = Book::new("4", "anotações", "Autor Desconhecido");

        vec![pride, potter, dune, untitled]
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.id.as_str()).collect()
    }

    fn query(term: &str) -> DiscoveryQuery {
        DiscoveryQuery {
            term: term.to_string(),
            ..DiscoveryQuery::default()
        }
    }

    #[test]
    fn empty_query_returns_every_book_sorted_by_title() {
        let found = discover(&catalog(), &DiscoveryQuery::default(), &StatusMap::new());
        assert_eq!(ids(&found), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn term_matches_any_searchable_field_case_insensitively() {
        let books = catalog();
        let statuses = StatusMap::new();

        assert_eq!(ids(&discover(&books, &query("DUNA"), &statuses)), vec!["3"]);
        assert_eq!(ids(&discover(&books, &query("austen"), &statuses)), vec!["1"]);
        assert_eq!(ids(&discover(&books, &query("fantasia"), &statuses)), vec!["2"]);
        assert_eq!(ids(&discover(&books, &query("1965"), &statuses)), vec!["3"]);
        assert_eq!(ids(&discover(&books, &query("264"), &statuses)), vec!["2"]);
        assert_eq!(ids(&discover(&books, &query("arrakis"), &statuses)), vec!["3"]);
        assert!(discover(&books, &query("tolkien"), &statuses).is_empty());
    }

    #[test]
    fn every_match_contains_the_term() {
        let books = catalog();
        let term = "e";
        for found in discover(&books, &query(term), &StatusMap::new()) {
            let haystack = [
                found.title.to_lowercase(),
                found.author.to_lowercase(),
                found.genre_name().to_lowercase(),
                found.year.map(|y| y.to_string()).unwrap_or_default(),
                found.pages.map(|p| p.to_string()).unwrap_or_default(),
                found.synopsis.clone().unwrap_or_default().to_lowercase(),
            ];
            assert!(haystack.iter().any(|field| field.contains(term)));
        }
    }

    #[test]
    fn genre_filter_is_exact_and_case_sensitive() {
        let books = catalog();
        let mut q = DiscoveryQuery::default();
        q.filters.genre = Some("Fantasia".to_string());
        assert_eq!(ids(&discover(&books, &q, &StatusMap::new())), vec!["2"]);

        q.filters.genre = Some("fantasia".to_string());
        assert!(discover(&books, &q, &StatusMap::new()).is_empty());
    }

    #[test]
    fn status_filter_uses_tracker_map() {
        let books = catalog();
        let mut statuses = StatusMap::new();
        statuses.insert("1".to_string(), ReadingStatus::Finished);
        statuses.insert("3".to_string(), ReadingStatus::Reading);

        let filtered = |status: &str| {
            let q = DiscoveryQuery {
                filters: Filters::from_raw("", status, ""),
                ..DiscoveryQuery::default()
            };
            let mut found = ids(&discover(&books, &q, &statuses))
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>();
            found.sort();
            found
        };

        assert_eq!(filtered("lido"), vec!["1"]);
        assert_eq!(filtered("lendo"), vec!["3"]);
        assert_eq!(filtered("sem status"), vec!["2", "4"]);
        assert!(filtered("relendo").is_empty());
        assert_eq!(filtered("").len(), 4);
    }

    #[test]
    fn min_rating_filter() {
        let mut four = Book::new("a", "Quatro", "Autor");
        four.rating = Some(4);
        let mut five = Book::new("b", "Cinco", "Autor");
        five.rating = Some(5);
        let unrated = Book::new("c", "Sem nota", "Autor");
        let books = vec![four, five, unrated];

        let q = DiscoveryQuery {
            filters: Filters::from_raw("", "", "5"),
            ..DiscoveryQuery::default()
        };
        assert_eq!(ids(&discover(&books, &q, &StatusMap::new())), vec!["b"]);

        let q = DiscoveryQuery {
            filters: Filters::from_raw("", "", "4"),
            sort: SortSpec::new(SortField::Rating, SortDirection::Asc),
            ..DiscoveryQuery::default()
        };
        assert_eq!(ids(&discover(&books, &q, &StatusMap::new())), vec!["a", "b"]);
    }

    #[test]
    fn threshold_reads_leading_integer() {
        assert_eq!(parse_threshold("4.5"), Some(4));
        assert_eq!(parse_threshold("5 estrelas"), Some(5));
        assert_eq!(parse_threshold(" 3 "), Some(3));

        let mut five = Book::new("b", "Cinco", "Autor");
        five.rating = Some(5);
        let mut four = Book::new("a", "Quatro", "Autor");
        four.rating = Some(4);
        let q = DiscoveryQuery {
            filters: Filters::from_raw("", "", "5 estrelas"),
            ..DiscoveryQuery::default()
        };
        assert_eq!(ids(&discover(&[four, five], &q, &StatusMap::new())), vec!["b"]);
    }

    #[test]
    fn unparseable_threshold_is_no_filter() {
        let filters = Filters::from_raw("", "", "cinco");
        assert_eq!(filters.min_rating, None);

        let q = DiscoveryQuery {
            filters,
            ..DiscoveryQuery::default()
        };
        assert_eq!(discover(&catalog(), &q, &StatusMap::new()).len(), 4);
    }

    #[test]
    fn missing_values_sort_first_ascending() {
        let q = DiscoveryQuery {
            sort: SortSpec::new(SortField::Year, SortDirection::Asc),
            ..DiscoveryQuery::default()
        };
        assert_eq!(
            ids(&discover(&catalog(), &q, &StatusMap::new())),
            vec!["4", "1", "3", "2"]
        );
    }

    #[test]
    fn ties_keep_catalog_order_in_both_directions() {
        let books = catalog();
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let q = DiscoveryQuery {
                filters: Filters::from_raw("", "", "5"),
                sort: SortSpec::new(SortField::Rating, direction),
                ..DiscoveryQuery::default()
            };
            assert_eq!(ids(&discover(&books, &q, &StatusMap::new())), vec!["1", "3"]);
        }
    }

    #[test]
    fn sorting_is_idempotent_and_reversible() {
        let fields = [
            SortField::Title,
            SortField::Author,
            SortField::Year,
            SortField::Pages,
        ];
        for field in fields {
            let spec = SortSpec::new(field, SortDirection::Asc);
            let mut once = catalog();
            sort_books(&mut once, &spec);
            let mut twice = once.clone();
            sort_books(&mut twice, &spec);
            assert_eq!(ids(&once), ids(&twice));

            let mut reversed = catalog();
            sort_books(
                &mut reversed,
                &SortSpec::new(field, spec.direction.reversed()),
            );
            let mut expected = ids(&once);
            expected.reverse();
            assert_eq!(ids(&reversed), expected, "{field:?}");
        }
    }

    #[test]
    fn params_fall_back_to_defaults() {
        let q: DiscoveryQuery = DiscoveryParams {
            sort: Some("popularity".to_string()),
            direction: Some("sideways".to_string()),
            min_rating: Some("4".to_string()),
            ..DiscoveryParams::default()
        }
        .into();
        assert_eq!(q.sort, SortSpec::default());
        assert_eq!(q.filters.min_rating, Some(4));
        assert_eq!(q.term, "");
    }
}
