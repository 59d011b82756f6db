//! My-list membership and rating state
//!
//! List mutations are optimistic: membership flips as soon as the user acts,
//! the request runs in the background, and the mutation is then confirmed or
//! rolled back. Like/dislike reactions never leave the client; star ratings
//! are persisted. The two are intentionally kept separate.

use serde::Serialize;
use std::collections::HashMap;

use crate::api::{ApiClient, ApiResult};
use crate::models::Movie;

// =============================================================================
// My List
// =============================================================================

/// Direction of a membership change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOp {
    Add,
    Remove,
}

impl ListOp {
    /// Send the change to the backend
    pub async fn commit(self, api: &ApiClient, movie_id: &str) -> ApiResult<()> {
        match self {
            ListOp::Add => api.add_to_list(movie_id).await,
            ListOp::Remove => api.remove_from_list(movie_id).await,
        }
    }
}

/// Lifecycle of one optimistic mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationState {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
struct Mutation {
    op: ListOp,
    state: MutationState,
    /// Entry to restore if a removal fails
    removed: Option<(usize, Movie)>,
}

/// Saved-movie set with optimistic updates
#[derive(Debug, Clone, Default)]
pub struct MyList {
    movies: Vec<Movie>,
    mutations: HashMap<String, Mutation>,
}

impl MyList {
    pub fn new(movies: Vec<Movie>) -> Self {
        let mut list = Self::default();
        list.replace(movies);
        list
    }

    /// Replace contents with a fresh backend listing (duplicates dropped).
    ///
    /// Changes still in flight are laid back over the listing.
    pub fn replace(&mut self, movies: Vec<Movie>) {
        let previous = std::mem::take(&mut self.movies);
        for movie in movies {
            if !self.contains(&movie.id) {
                self.movies.push(movie);
            }
        }
        self.mutations.retain(|_, m| m.state == MutationState::Pending);
        for (id, m) in &self.mutations {
            match m.op {
                ListOp::Add => {
                    if !self.movies.iter().any(|movie| &movie.id == id) {
                        if let Some(movie) = previous.iter().find(|movie| &movie.id == id) {
                            self.movies.push(movie.clone());
                        }
                    }
                }
                ListOp::Remove => self.movies.retain(|movie| &movie.id != id),
            }
        }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn contains(&self, movie_id: &str) -> bool {
        self.movies.iter().any(|m| m.id == movie_id)
    }

    pub fn mutation_state(&self, movie_id: &str) -> Option<MutationState> {
        self.mutations.get(movie_id).map(|m| m.state)
    }

    pub fn is_pending(&self, movie_id: &str) -> bool {
        self.mutation_state(movie_id) == Some(MutationState::Pending)
    }

    /// Optimistically add. Returns the op to commit, or None when the movie
    /// is already a member or a change for it is still in flight.
    pub fn begin_add(&mut self, movie: &Movie) -> Option<ListOp> {
        if self.is_pending(&movie.id) || self.contains(&movie.id) {
            return None;
        }
        self.movies.push(movie.clone());
        self.mutations.insert(
            movie.id.clone(),
            Mutation {
                op: ListOp::Add,
                state: MutationState::Pending,
                removed: None,
            },
        );
        Some(ListOp::Add)
    }

    /// Optimistically remove. None when absent or in flight.
    pub fn begin_remove(&mut self, movie_id: &str) -> Option<ListOp> {
        if self.is_pending(movie_id) {
            return None;
        }
        let pos = self.movies.iter().position(|m| m.id == movie_id)?;
        let movie = self.movies.remove(pos);
        self.mutations.insert(
            movie_id.to_string(),
            Mutation {
                op: ListOp::Remove,
                state: MutationState::Pending,
                removed: Some((pos, movie)),
            },
        );
        Some(ListOp::Remove)
    }

    /// Add when absent, remove when present
    pub fn begin_toggle(&mut self, movie: &Movie) -> Option<ListOp> {
        if self.contains(&movie.id) {
            self.begin_remove(&movie.id)
        } else {
            self.begin_add(movie)
        }
    }

    /// Backend accepted the change
    pub fn confirm(&mut self, movie_id: &str) {
        if let Some(m) = self.mutations.get_mut(movie_id) {
            m.state = MutationState::Confirmed;
            m.removed = None;
        }
    }

    /// Backend refused the change: undo the optimistic flip
    pub fn fail(&mut self, movie_id: &str) {
        let Some(m) = self.mutations.get_mut(movie_id) else {
            return;
        };
        if m.state != MutationState::Pending {
            return;
        }
        m.state = MutationState::Failed;
        match m.op {
            ListOp::Add => self.movies.retain(|movie| movie.id != movie_id),
            ListOp::Remove => {
                if let Some((pos, movie)) = m.removed.take() {
                    let pos = pos.min(self.movies.len());
                    self.movies.insert(pos, movie);
                }
            }
        }
        tracing::warn!(movie = movie_id, op = ?m.op, "my list change rolled back");
    }

    /// Settle a mutation from the request result
    pub fn settle(&mut self, movie_id: &str, result: &ApiResult<()>) {
        match result {
            Ok(()) => self.confirm(movie_id),
            Err(e) => {
                tracing::warn!(movie = movie_id, error = %e, "my list request failed");
                self.fail(movie_id);
            }
        }
    }
}

/// Toggle and commit in one go (CLI and tests); returns the new membership
pub async fn toggle(api: &ApiClient, list: &mut MyList, movie: &Movie) -> ApiResult<bool> {
    if let Some(op) = list.begin_toggle(movie) {
        let result = op.commit(api, &movie.id).await;
        list.settle(&movie.id, &result);
        result?;
    }
    Ok(list.contains(&movie.id))
}

// =============================================================================
// Reactions (local only)
// =============================================================================

/// Thumbs up/down on a card or detail view; never sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

#[derive(Debug, Clone, Default)]
pub struct Reactions {
    by_movie: HashMap<String, Reaction>,
}

impl Reactions {
    pub fn get(&self, movie_id: &str) -> Option<Reaction> {
        self.by_movie.get(movie_id).copied()
    }

    /// Like, or clear an existing like
    pub fn like(&mut self, movie_id: &str) -> Option<Reaction> {
        self.toggle(movie_id, Reaction::Like)
    }

    /// Dislike, or clear an existing dislike
    pub fn dislike(&mut self, movie_id: &str) -> Option<Reaction> {
        self.toggle(movie_id, Reaction::Dislike)
    }

    fn toggle(&mut self, movie_id: &str, reaction: Reaction) -> Option<Reaction> {
        if self.get(movie_id) == Some(reaction) {
            self.by_movie.remove(movie_id);
            None
        } else {
            self.by_movie.insert(movie_id.to_string(), reaction);
            Some(reaction)
        }
    }
}

// =============================================================================
// Star rating (persisted)
// =============================================================================

/// Star widget state for one movie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarRating {
    /// 0 = not rated yet
    pub rating: u8,
    pub submitting: bool,
}

impl StarRating {
    pub const QUICK_LIKE: u8 = 5;
    pub const QUICK_DISLIKE: u8 = 1;

    pub fn new(rating: u8) -> Self {
        Self {
            rating: rating.min(5),
            submitting: false,
        }
    }

    /// Start a submission; None when out of range or one is in flight
    pub fn begin(&mut self, stars: u8) -> Option<u8> {
        if self.submitting || !(1..=5).contains(&stars) {
            return None;
        }
        self.submitting = true;
        Some(stars)
    }

    /// Record the outcome; the shown rating only changes on success
    pub fn finish(&mut self, stars: u8, ok: bool) {
        self.submitting = false;
        if ok {
            self.rating = stars;
        }
    }

    pub fn is_liked(&self) -> bool {
        self.rating >= 4
    }

    pub fn is_disliked(&self) -> bool {
        (1..=2).contains(&self.rating)
    }

    /// "★★★☆☆"
    pub fn stars(&self) -> String {
        (1..=5)
            .map(|i| if i <= self.rating { '★' } else { '☆' })
            .collect()
    }
}

/// Submit a rating through the widget. Ok(false) when the widget refused
/// (out of range or another submission in flight).
pub async fn rate(
    api: &ApiClient,
    movie_id: &str,
    widget: &mut StarRating,
    stars: u8,
) -> ApiResult<bool> {
    let Some(stars) = widget.begin(stars) else {
        return Ok(false);
    };
    let result = api.rate(movie_id, stars).await;
    widget.finish(stars, result.is_ok());
    result.map(|_| true)
}
