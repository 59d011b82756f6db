//! Catalog loading and row layout
//!
//! The backend serves the whole catalog as one flat list. The browse screen
//! splits it into fixed category rows, picks a hero banner, and shows a
//! page-specific subset of rows.

use rand::Rng;
use serde::Serialize;

use crate::api::{ApiClient, ApiResult};
use crate::models::{Category, Movie};

/// How many titles the "more like this" strip shows
pub const SIMILAR_LIMIT: usize = 6;

/// One titled row of movies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub category: Category,
    pub title: String,
    pub movies: Vec<Movie>,
}

/// Catalog split into category rows, in the fixed category order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    rows: Vec<Row>,
}

impl Catalog {
    /// Partition a flat list by exact category-key match.
    /// Movies with unknown keys land in no row.
    pub fn partition(movies: &[Movie]) -> Self {
        let rows = Category::ALL
            .iter()
            .map(|cat| Row {
                category: *cat,
                title: cat.title().to_string(),
                movies: movies
                    .iter()
                    .filter(|m| m.category == cat.key())
                    .cloned()
                    .collect(),
            })
            .collect();
        Self { rows }
    }

    /// All rows including empty ones
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, category: Category) -> Option<&Row> {
        self.rows.iter().find(|r| r.category == category)
    }

    /// Movies in a category (empty slice if none)
    pub fn movies_in(&self, category: Category) -> &[Movie] {
        self.row(category).map(|r| r.movies.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.movies.is_empty())
    }

    /// Uniform random pick from trending, else the first entry of the first
    /// non-empty row
    pub fn pick_hero<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Movie> {
        let trending = self.movies_in(Category::Trending);
        if !trending.is_empty() {
            return trending.get(rng.random_range(0..trending.len()));
        }
        self.rows
            .iter()
            .find(|r| !r.movies.is_empty())
            .and_then(|r| r.movies.first())
    }

    /// Non-empty rows shown on a page, titled for that page
    pub fn rows_for(&self, page: Page) -> Vec<Row> {
        page.layout()
            .into_iter()
            .filter_map(|(cat, title)| {
                let movies = self.movies_in(cat);
                (!movies.is_empty()).then(|| Row {
                    category: cat,
                    title: title.to_string(),
                    movies: movies.to_vec(),
                })
            })
            .collect()
    }
}

/// Browse pages; each shows its own subset of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    Home,
    TvShows,
    Movies,
    NewPopular,
    Kids,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::TvShows,
        Page::Movies,
        Page::NewPopular,
        Page::Kids,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::TvShows => "TV Shows",
            Page::Movies => "Movies",
            Page::NewPopular => "New & Popular",
            Page::Kids => "Kids & Family",
        }
    }

    /// Only the home page shows the hero banner and continue watching
    pub fn shows_hero(&self) -> bool {
        matches!(self, Page::Home)
    }

    /// Next page in tab order (wraps)
    pub fn next(&self) -> Page {
        let idx = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Category rows and their titles for this page
    pub fn layout(&self) -> Vec<(Category, &'static str)> {
        match self {
            Page::Home => Category::ALL.iter().map(|c| (*c, c.title())).collect(),
            Page::TvShows => vec![
                (Category::Trending, "Trending TV Shows"),
                (Category::TopRated, "Top Rated Series"),
            ],
            Page::Movies => vec![
                (Category::Action, "Action Movies"),
                (Category::Comedy, "Comedy Movies"),
                (Category::Horror, "Horror Movies"),
            ],
            Page::NewPopular => vec![
                (Category::Trending, "Trending Now"),
                (Category::TopRated, "New Releases"),
            ],
            Page::Kids => vec![
                (Category::Kids, "Kids & Family Movies"),
                (Category::Comedy, "Family Comedies"),
            ],
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Fetch and partition the full catalog
pub async fn load(api: &ApiClient) -> ApiResult<Catalog> {
    let movies = api.movies().await?;
    let catalog = Catalog::partition(&movies);
    tracing::info!(
        total = movies.len(),
        rows = catalog.rows().iter().filter(|r| !r.movies.is_empty()).count(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Titles sharing a movie's category, excluding the movie itself
pub async fn similar(api: &ApiClient, movie: &Movie) -> ApiResult<Vec<Movie>> {
    let movies = api.movies_by_category(&movie.category).await?;
    Ok(movies
        .into_iter()
        .filter(|m| m.id != movie.id)
        .take(SIMILAR_LIMIT)
        .collect())
}

/// Search; blank queries return nothing without a request
pub async fn search(api: &ApiClient, query: &str) -> ApiResult<Vec<Movie>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    api.search(query).await
}
