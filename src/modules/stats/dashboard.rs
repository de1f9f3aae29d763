//! Aggregate figures shown on the reading dashboard.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::modules::books::models::{Book, ReadingStatus, StatusMap};

/// Shown as the favourite genre when no book has one.
pub const NO_GENRE: &str = "Nenhum";

const WORDS_PER_PAGE: f64 = 250.0;
const WORDS_PER_MINUTE: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreSlice {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingBucket {
    pub rating: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearBucket {
    pub year: i32,
    pub books: usize,
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: ReadingStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_books: usize,
    pub total_pages: u64,
    pub average_rating: f64,
    pub average_pages: u64,
    pub genre_distribution: Vec<GenreSlice>,
    pub rating_distribution: Vec<RatingBucket>,
    pub yearly_data: Vec<YearBucket>,
    pub reading_time_hours: u64,
    pub most_read_genre: String,
    /// From each book's own status field.
    pub status_counts: Vec<StatusCount>,
    /// From the reading-status tracker, for books still in the catalog.
    pub tracked_status_counts: Vec<StatusCount>,
}

pub fn compute_stats(books: &[Book], statuses: &StatusMap) -> DashboardStats {
    let total_books = books.len();
    let total_pages: u64 = books.iter().map(|b| u64::from(b.pages.unwrap_or(0))).sum();

    let ratings: Vec<u8> = books.iter().filter_map(|b| b.rating).collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64
    };

    let average_pages = if total_books == 0 {
        0
    } else {
        (total_pages as f64 / total_books as f64).round() as u64
    };

    let genre_distribution = genre_distribution(books);
    let most_read_genre = genre_distribution
        .first()
        .map(|slice| slice.name.clone())
        .unwrap_or_else(|| NO_GENRE.to_string());

    DashboardStats {
        total_books,
        total_pages,
        average_rating,
        average_pages,
        genre_distribution,
        rating_distribution: rating_distribution(&ratings),
        yearly_data: yearly_data(books),
        reading_time_hours: reading_time_hours(total_pages),
        most_read_genre,
        status_counts: count_statuses(books.iter().filter_map(|b| b.status)),
        tracked_status_counts: count_statuses(
            books.iter().filter_map(|b| statuses.get(&b.id).copied()),
        ),
    }
}

/// Count per genre, most read first; ties keep first-appearance order.
fn genre_distribution(books: &[Book]) -> Vec<GenreSlice> {
    let mut slices: Vec<GenreSlice> = Vec::new();
    for name in books.iter().map(Book::genre_name).filter(|n| !n.is_empty()) {
        match slices.iter_mut().find(|s| s.name == name) {
            Some(slice) => slice.value += 1,
            None => slices.push(GenreSlice {
                name: name.to_string(),
                value: 1,
            }),
        }
    }
    slices.sort_by(|a, b| b.value.cmp(&a.value));
    slices
}

fn rating_distribution(ratings: &[u8]) -> Vec<RatingBucket> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for &rating in ratings {
        *counts.entry(rating).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(rating, count)| RatingBucket { rating, count })
        .collect()
}

fn yearly_data(books: &[Book]) -> Vec<YearBucket> {
    let mut years: BTreeMap<i32, (usize, u64)> = BTreeMap::new();
    for book in books {
        if let Some(year) = book.year {
            let entry = years.entry(year).or_default();
            entry.0 += 1;
            entry.1 += u64::from(book.pages.unwrap_or(0));
        }
    }
    years
        .into_iter()
        .map(|(year, (books, pages))| YearBucket { year, books, pages })
        .collect()
}

fn reading_time_hours(total_pages: u64) -> u64 {
    (total_pages as f64 * WORDS_PER_PAGE / WORDS_PER_MINUTE / 60.0).round() as u64
}

fn count_statuses(found: impl Iterator<Item = ReadingStatus>) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = ReadingStatus::ALL
        .iter()
        .map(|&status| StatusCount { status, count: 0 })
        .collect();
    for status in found {
        if let Some(entry) = counts.iter_mut().find(|c| c.status == status) {
            entry.count += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::GenreField;

    fn book(id: &str, genre: &str, year: i32, pages: u32, rating: Option<u8>) -> Book {
        let mut book = Book::new(id, format!("Livro {id}"), "Autor");
        book.genre = Some(GenreField::from(genre));
        book.year = Some(year);
        book.pages = Some(pages);
        book.rating = rating;
        book
    }

    #[test]
    fn empty_catalog_yields_zeroes() {
        let stats = compute_stats(&[], &StatusMap::new());
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.total_pages, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.average_pages, 0);
        assert_eq!(stats.reading_time_hours, 0);
        assert_eq!(stats.most_read_genre, NO_GENRE);
        assert!(stats.genre_distribution.is_empty());
        assert!(stats.status_counts.iter().all(|c| c.count == 0));
    }

    #[test]
    fn totals_and_averages() {
        let books = vec![
            book("1", "Ficção Científica", 1965, 412, Some(5)),
            book("2", "Mistério", 2003, 454, Some(4)),
            book("3", "Ficção Científica", 1969, 256, None),
        ];
        let stats = compute_stats(&books, &StatusMap::new());

        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.total_pages, 1122);
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(stats.average_pages, 374);
        // 1122 * 250 / 200 / 60 = 23.375
        assert_eq!(stats.reading_time_hours, 23);
    }

    #[test]
    fn genre_distribution_orders_by_count_then_first_seen() {
        let books = vec![
            book("1", "Mistério", 2000, 100, None),
            book("2", "Romance", 2000, 100, None),
            book("3", "Romance", 2001, 100, None),
            book("4", "Fantasia", 2002, 100, None),
        ];
        let stats = compute_stats(&books, &StatusMap::new());

        let names: Vec<&str> = stats
            .genre_distribution
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Romance", "Mistério", "Fantasia"]);
        assert_eq!(stats.most_read_genre, "Romance");
    }

    #[test]
    fn books_without_genre_are_not_counted() {
        let mut loose = Book::new("9", "Sem gênero", "Autor");
        loose.pages = Some(10);
        let stats = compute_stats(&[loose], &StatusMap::new());

        assert!(stats.genre_distribution.is_empty());
        assert_eq!(stats.most_read_genre, NO_GENRE);
        assert!(stats.yearly_data.is_empty());
        assert_eq!(stats.total_pages, 10);
    }

    #[test]
    fn rating_and_year_buckets_are_ascending() {
        let books = vec![
            book("1", "A", 2010, 300, Some(5)),
            book("2", "A", 1990, 200, Some(3)),
            book("3", "A", 2010, 100, Some(5)),
        ];
        let stats = compute_stats(&books, &StatusMap::new());

        assert_eq!(
            stats.rating_distribution,
            vec![
                RatingBucket { rating: 3, count: 1 },
                RatingBucket { rating: 5, count: 2 },
            ]
        );
        assert_eq!(
            stats.yearly_data,
            vec![
                YearBucket { year: 1990, books: 1, pages: 200 },
                YearBucket { year: 2010, books: 2, pages: 400 },
            ]
        );
    }

    #[test]
    fn status_counts_cover_every_status() {
        let mut reading = book("1", "A", 2000, 100, None);
        reading.status = Some(ReadingStatus::Reading);
        let mut done = book("2", "A", 2000, 100, None);
        done.status = Some(ReadingStatus::Finished);
        let mut also_done = book("3", "A", 2000, 100, None);
        also_done.status = Some(ReadingStatus::Finished);

        let stats = compute_stats(&[reading, done, also_done], &StatusMap::new());
        assert_eq!(stats.status_counts.len(), ReadingStatus::ALL.len());

        let count = |status| {
            stats
                .status_counts
                .iter()
                .find(|c| c.status == status)
                .map(|c| c.count)
        };
        assert_eq!(count(ReadingStatus::Finished), Some(2));
        assert_eq!(count(ReadingStatus::Reading), Some(1));
        assert_eq!(count(ReadingStatus::Paused), Some(0));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(compute_stats(&[], &StatusMap::new())).unwrap();
        assert!(json.get("totalBooks").is_some());
        assert!(json.get("readingTimeHours").is_some());
        assert_eq!(json["mostReadGenre"], "Nenhum");
    }

    #[test]
    fn tracked_counts_come_from_the_status_map() {
        let books = vec![
            book("1", "A", 2000, 100, None),
            book("2", "A", 2000, 100, None),
            book("3", "A", 2000, 100, None),
        ];
        let statuses: StatusMap = [
            ("1".to_string(), ReadingStatus::Finished),
            ("2".to_string(), ReadingStatus::Finished),
            ("3".to_string(), ReadingStatus::Reading),
            ("gone".to_string(), ReadingStatus::Reading),
        ]
        .into_iter()
        .collect();

        let stats = compute_stats(&books, &statuses);
        let tracked = |status| {
            stats
                .tracked_status_counts
                .iter()
                .find(|c| c.status == status)
                .map(|c| c.count)
        };
        assert_eq!(tracked(ReadingStatus::Finished), Some(2));
        assert_eq!(tracked(ReadingStatus::Reading), Some(1));
        assert_eq!(tracked(ReadingStatus::WantToRead), Some(0));
        assert!(stats.status_counts.iter().all(|c| c.count == 0));
    }
}
