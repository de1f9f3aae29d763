//! Related-book suggestions from a fixed additive score.

use serde::Serialize;

use super::models::Book;

pub const DEFAULT_K: usize = 4;

const SAME_GENRE: u32 = 3;
const SAME_AUTHOR: u32 = 5;
const CLOSE_RATING: u32 = 2;
const CLOSE_YEAR: u32 = 1;
const WELL_RATED: u32 = 1;

/// Max rating distance for `CLOSE_RATING`.
const RATING_WINDOW: i32 = 1;
/// Max year distance for `CLOSE_YEAR`.
const SCORE_YEAR_WINDOW: i32 = 10;
/// Max year distance for the "Época similar" reason. Narrower than the scoring window.
const REASON_YEAR_WINDOW: i32 = 5;
const WELL_RATED_MIN: u8 = 4;

const MAX_REASONS: usize = 2;
const REASON_SEPARATOR: &str = " • ";
const FALLBACK_REASON: &str = "Recomendado para você";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub book: Book,
    pub score: u32,
    pub reason: String,
}

/// Up to `k` books related to `focal`, best first.
///
/// The focal book is excluded by id. Equal scores keep catalog order. An empty
/// result is a normal outcome.
pub fn recommend(catalog: &[Book], focal: &Book, k: usize) -> Vec<Recommendation> {
    let mut scored: Vec<(&Book, u32)> = catalog
        .iter()
        .filter(|candidate| candidate.id != focal.id)
        .map(|candidate| (candidate, score(candidate, focal)))
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .take(k)
        .map(|(book, score)| Recommendation {
            book: book.clone(),
            score,
            reason: reason_line(book, focal),
        })
        .collect()
}

fn same_genre(candidate: &Book, focal: &Book) -> bool {
    let genre = candidate.genre_name();
    !genre.is_empty() && genre == focal.genre_name()
}

fn within(a: Option<i32>, b: Option<i32>, window: i32) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a.abs_diff(b) <= window.unsigned_abs())
}

fn is_well_rated(book: &Book) -> bool {
    book.rating.is_some_and(|r| r >= WELL_RATED_MIN)
}

pub fn score(candidate: &Book, focal: &Book) -> u32 {
    let mut score = 0;

    if same_genre(candidate, focal) {
        score += SAME_GENRE;
    }
    if candidate.author == focal.author {
        score += SAME_AUTHOR;
    }
    if within(
        candidate.rating.map(i32::from),
        focal.rating.map(i32::from),
        RATING_WINDOW,
    ) {
        score += CLOSE_RATING;
    }
    if within(candidate.year, focal.year, SCORE_YEAR_WINDOW) {
        score += CLOSE_YEAR;
    }
    if is_well_rated(candidate) {
        score += WELL_RATED;
    }

    score
}

/// Every justification that applies, in display order.
pub fn reasons(candidate: &Book, focal: &Book) -> Vec<String> {
    let mut reasons = Vec::new();

    if same_genre(candidate, focal) {
        reasons.push(format!("Mesmo gênero: {}", candidate.genre_name()));
    }
    if candidate.author == focal.author {
        reasons.push("Mesmo autor".to_string());
    }
    if let Some(rating) = candidate.rating.filter(|&r| r >= WELL_RATED_MIN) {
        reasons.push(format!("Bem avaliado ({rating}★)"));
    }
    if within(candidate.year, focal.year, REASON_YEAR_WINDOW) {
        reasons.push("Época similar".to_string());
    }

    reasons
}

/// At most two reasons joined for display, or the generic fallback.
pub fn reason_line(candidate: &Book, focal: &Book) -> String {
    let reasons = reasons(candidate, focal);
    if reasons.is_empty() {
        return FALLBACK_REASON.to_string();
    }
    reasons
        .into_iter()
        .take(MAX_REASONS)
        .collect::<Vec<_>>()
        .join(REASON_SEPARATOR)
}
