//! Client-side filtering and sorting of movie lists
//!
//! Used on search results and browse rows. Within one dimension the
//! selections are OR-ed (any genre, any year, any rating band); dimensions
//! are AND-ed. An empty dimension does not filter.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::Movie;

/// Genres offered by the filter panel
pub const GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Animation",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Family",
    "Fantasy",
    "History",
    "Horror",
    "Music",
    "Mystery",
    "Romance",
    "Science Fiction",
    "Thriller",
    "War",
    "Western",
];

/// Rating bands (inclusive bounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingBand {
    NinePlus,
    Eights,
    Sevens,
    Sixes,
    BelowSix,
}

impl RatingBand {
    pub const ALL: [RatingBand; 5] = [
        RatingBand::NinePlus,
        RatingBand::Eights,
        RatingBand::Sevens,
        RatingBand::Sixes,
        RatingBand::BelowSix,
    ];

    pub fn bounds(&self) -> (f32, f32) {
        match self {
            RatingBand::NinePlus => (9.0, 10.0),
            RatingBand::Eights => (8.0, 8.9),
            RatingBand::Sevens => (7.0, 7.9),
            RatingBand::Sixes => (6.0, 6.9),
            RatingBand::BelowSix => (0.0, 5.9),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingBand::NinePlus => "9.0+",
            RatingBand::Eights => "8.0 - 8.9",
            RatingBand::Sevens => "7.0 - 7.9",
            RatingBand::Sixes => "6.0 - 6.9",
            RatingBand::BelowSix => "Below 6.0",
        }
    }

    pub fn contains(&self, rating: f32) -> bool {
        let (min, max) = self.bounds();
        rating >= min && rating <= max
    }
}

/// Sort orders offered by the filter panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Keep backend order
    #[default]
    Trending,
    Newest,
    Oldest,
    RatingHigh,
    RatingLow,
    Alphabetical,
    AlphabeticalDesc,
}

impl SortBy {
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Trending => "Trending",
            SortBy::Newest => "Newest First",
            SortBy::Oldest => "Oldest First",
            SortBy::RatingHigh => "Highest Rated",
            SortBy::RatingLow => "Lowest Rated",
            SortBy::Alphabetical => "A-Z",
            SortBy::AlphabeticalDesc => "Z-A",
        }
    }

    fn compare(&self, a: &Movie, b: &Movie) -> Ordering {
        match self {
            SortBy::Trending => Ordering::Equal,
            SortBy::Newest => b.year.cmp(&a.year),
            SortBy::Oldest => a.year.cmp(&b.year),
            SortBy::RatingHigh => b.rating.total_cmp(&a.rating),
            SortBy::RatingLow => a.rating.total_cmp(&b.rating),
            SortBy::Alphabetical => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortBy::AlphabeticalDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
        }
    }
}

/// Active filter selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub genres: Vec<String>,
    pub years: Vec<u16>,
    pub ratings: Vec<RatingBand>,
    pub sort_by: SortBy,
}

impl Filters {
    /// Number of active selections (sort order not counted)
    pub fn active_count(&self) -> usize {
        self.genres.len() + self.years.len() + self.ratings.len()
    }

    pub fn has_active(&self) -> bool {
        self.active_count() > 0
    }

    pub fn toggle_genre(&mut self, genre: &str) {
        toggle(&mut self.genres, genre.to_string());
    }

    pub fn toggle_year(&mut self, year: u16) {
        toggle(&mut self.years, year);
    }

    pub fn toggle_rating(&mut self, band: RatingBand) {
        toggle(&mut self.ratings, band);
    }

    /// Reset selections and sort order
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        let genre_ok = self.genres.is_empty()
            || movie
                .genre
                .iter()
                .any(|g| self.genres.iter().any(|sel| sel.eq_ignore_ascii_case(g)));
        let year_ok =
            self.years.is_empty() || movie.year.map(|y| self.years.contains(&y)).unwrap_or(false);
        let rating_ok =
            self.ratings.is_empty() || self.ratings.iter().any(|b| b.contains(movie.rating));
        genre_ok && year_ok && rating_ok
    }

    /// Filter then stable-sort
    pub fn apply(&self, movies: &[Movie]) -> Vec<Movie> {
        let mut out: Vec<Movie> = movies.iter().filter(|m| self.matches(m)).cloned().collect();
        if self.sort_by != SortBy::Trending {
            out.sort_by(|a, b| self.sort_by.compare(a, b));
        }
        out
    }
}

fn toggle<T: PartialEq>(items: &mut Vec<T>, value: T) {
    if let Some(pos) = items.iter().position(|v| *v == value) {
        items.remove(pos);
    } else {
        items.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, year: u16, rating: f32, genres: &[&str]) -> Movie {
        serde_json::from_value(serde_json::json!({
            "_id": title,
            "title": title,
            "year": year,
            "rating": rating,
            "genre": genres,
        }))
        .unwrap()
    }

    fn sample() -> Vec<Movie> {
        vec![
            movie("Inception", 2010, 8.8, &["Action", "Science Fiction"]),
            movie("Up", 2009, 8.3, &["Animation", "Family"]),
            movie("Cats", 2019, 2.8, &["Comedy", "Family"]),
            movie("Alien", 1979, 8.5, &["Horror", "Science Fiction"]),
        ]
    }

    #[test]
    fn test_no_filters_keeps_order() {
        let out = Filters::default().apply(&sample());
        let titles: Vec<_> = out.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Inception", "Up", "Cats", "Alien"]);
    }

    #[test]
    fn test_genre_any_match() {
        let mut f = Filters::default();
        f.toggle_genre("Family");
        f.toggle_genre("Horror");
        let out = f.apply(&sample());
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_dimensions_combine() {
        let mut f = Filters::default();
        f.toggle_genre("Family");
        f.toggle_rating(RatingBand::Eights);
        let out = f.apply(&sample());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Up");
    }

    #[test]
    fn test_toggle_twice_removes() {
        let mut f = Filters::default();
        f.toggle_year(2010);
        assert_eq!(f.active_count(), 1);
        f.toggle_year(2010);
        assert!(!f.has_active());
    }

    #[test]
    fn test_rating_band_edges() {
        assert!(RatingBand::Eights.contains(8.0));
        assert!(RatingBand::Eights.contains(8.9));
        assert!(!RatingBand::Eights.contains(8.95));
        assert!(RatingBand::NinePlus.contains(10.0));
        assert!(RatingBand::BelowSix.contains(0.0));
    }

    #[test]
    fn test_sorts() {
        let mut f = Filters {
            sort_by: SortBy::Newest,
            ..Filters::default()
        };
        assert_eq!(f.apply(&sample())[0].title, "Cats");

        f.sort_by = SortBy::RatingHigh;
        assert_eq!(f.apply(&sample())[0].title, "Inception");

        f.sort_by = SortBy::Alphabetical;
        assert_eq!(f.apply(&sample())[0].title, "Alien");

        f.sort_by = SortBy::AlphabeticalDesc;
        assert_eq!(f.apply(&sample())[0].title, "Up");
    }

    #[test]
    fn test_clear_resets_sort() {
        let mut f = Filters {
            sort_by: SortBy::Oldest,
            ..Filters::default()
        };
        f.toggle_genre("Drama");
        f.clear();
        assert_eq!(f, Filters::default());
    }
}
