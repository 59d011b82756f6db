//! App state and core application logic
//!
//! Manages the screen state machine, navigation stack and per-view state.
//! Key presses and background results both come through here; anything that
//! needs the network is returned as an [`Action`] for the worker to run.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::api::auth::MIN_PASSWORD_LEN;
use crate::api::auth_failure_message;
use crate::catalog::{Catalog, Page};
use crate::downloads::{DownloadManager, DownloadUpdate};
use crate::events::{Action, AppEvent};
use crate::filters::{Filters, RatingBand, SortBy, GENRES};
use crate::library::{MyList, Reactions, StarRating};
use crate::models::*;
use crate::player::{KeyOutcome, MediaEvent, PlayerController};
use crate::profiles::Profiles;

// =============================================================================
// App State Enum
// =============================================================================

/// Application state enum representing current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Sign-in form
    #[default]
    Login,
    /// Sign-up form
    Register,
    /// "Who's watching?" picker
    Profiles,
    /// Hero banner and category rows
    Browse,
    /// Search box, results and filters
    Search,
    /// Single movie with rating, list and download actions
    Detail,
    /// Saved movies
    MyList,
    /// Download records and running downloads
    Downloads,
    /// mpv playback controls
    Player,
}

// =============================================================================
// Input Mode
// =============================================================================

/// Current input mode for keyboard handling
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Text input mode (search box or form focused)
    Editing,
}

// =============================================================================
// Loading State
// =============================================================================

/// Loading state for async operations
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    /// Idle - no loading in progress
    #[default]
    Idle,
    /// Loading with optional message
    Loading(Option<String>),
    /// Error with message
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadingState::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoadingState::Loading(Some(msg)) => Some(msg),
            LoadingState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

// =============================================================================
// Selection State (per-view)
// =============================================================================

/// Selection state for list views
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Currently selected index
    pub selected: usize,
    /// Scroll offset for viewport
    pub offset: usize,
    /// Total number of items
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            len,
        }
    }

    /// Move selection up
    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.offset {
                self.offset = self.selected;
            }
        }
    }

    /// Move selection down
    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    /// Jump to first item
    pub fn first(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    /// Jump to last item
    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Update offset to keep selected item visible
    pub fn scroll_into_view(&mut self, visible: usize) {
        if visible == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + visible {
            self.offset = self.selected + 1 - visible;
        }
    }

    /// Update length (e.g., when new results come in)
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = 0;
            self.offset = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

// =============================================================================
// Text Input
// =============================================================================

/// Single-line text field; the cursor counts characters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Insert character at cursor
    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    /// Delete character at cursor
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.char_len();
    }

    /// Text split at the cursor, for rendering
    pub fn split(&self) -> (&str, &str) {
        self.value.split_at(self.byte_index(self.cursor))
    }

    /// Apply an editing key; false when the key is not an edit
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.home(),
            KeyCode::End => self.end(),
            _ => return false,
        }
        true
    }
}

// =============================================================================
// View-Specific State
// =============================================================================

/// Login and register form
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub name: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    /// Focused field index (register: name, email, password)
    pub focus: usize,
    pub submitting: bool,
    pub error: Option<String>,
}

/// Which text field of the auth form is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Password,
}

impl AuthForm {
    pub fn fields(register: bool) -> &'static [AuthField] {
        if register {
            &[AuthField::Name, AuthField::Email, AuthField::Password]
        } else {
            &[AuthField::Email, AuthField::Password]
        }
    }

    pub fn focused(&self, register: bool) -> AuthField {
        let fields = Self::fields(register);
        fields[self.focus.min(fields.len() - 1)]
    }

    fn input_mut(&mut self, field: AuthField) -> &mut TextInput {
        match field {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    fn next(&mut self, register: bool) {
        self.focus = (self.focus + 1) % Self::fields(register).len();
    }

    fn prev(&mut self, register: bool) {
        let n = Self::fields(register).len();
        self.focus = (self.focus + n - 1) % n;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What the profile name editor is for
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileEdit {
    New,
    Rename(String),
}

/// Profile picker state
#[derive(Debug, Clone, Default)]
pub struct ProfilesState {
    pub profiles: Profiles,
    pub list: ListState,
    pub loading: LoadingState,
    pub editor: Option<(ProfileEdit, TextInput)>,
    pub message: Option<String>,
}

impl ProfilesState {
    pub fn selected(&self) -> Option<&Profile> {
        self.profiles.items().get(self.list.selected)
    }

    fn set(&mut self, profiles: Profiles) {
        self.list.set_len(profiles.len());
        self.profiles = profiles;
        self.loading = LoadingState::Idle;
    }
}

/// One rendered row on the browse screen
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseRow {
    pub title: String,
    pub movies: Vec<Movie>,
}

pub const CONTINUE_WATCHING: &str = "Continue Watching";

/// Browse screen state
#[derive(Debug, Clone, Default)]
pub struct BrowseState {
    pub page: Page,
    pub catalog: Catalog,
    pub hero: Option<Movie>,
    pub continue_watching: Vec<ContinueWatchingItem>,
    pub rows: Vec<BrowseRow>,
    /// Selected row
    pub row: usize,
    /// Selected column per row
    pub cols: Vec<usize>,
    /// Hero banner has focus instead of a row
    pub hero_focused: bool,
    pub loading: LoadingState,
}

impl BrowseState {
    /// Recompute rows for the current page
    pub fn rebuild(&mut self) {
        let mut rows = Vec::new();
        if self.page.shows_hero() {
            let movies: Vec<Movie> = self
                .continue_watching
                .iter()
                .filter_map(|item| item.movie.clone())
                .collect();
            if !movies.is_empty() {
                rows.push(BrowseRow {
                    title: CONTINUE_WATCHING.to_string(),
                    movies,
                });
            }
        }
        rows.extend(self.catalog.rows_for(self.page).into_iter().map(|r| BrowseRow {
            title: r.title,
            movies: r.movies,
        }));

        self.cols = rows.iter().map(|_| 0).collect();
        self.rows = rows;
        if self.row >= self.rows.len() {
            self.row = self.rows.len().saturating_sub(1);
        }
        if !self.page.shows_hero() || self.hero.is_none() {
            self.hero_focused = false;
        }
    }

    pub fn selected_movie(&self) -> Option<&Movie> {
        if self.hero_focused {
            return self.hero.as_ref();
        }
        let row = self.rows.get(self.row)?;
        row.movies.get(self.cols.get(self.row).copied().unwrap_or(0))
    }

    fn up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
        } else if self.page.shows_hero() && self.hero.is_some() {
            self.hero_focused = true;
        }
    }

    fn down(&mut self) {
        if self.hero_focused {
            self.hero_focused = false;
        } else if self.row + 1 < self.rows.len() {
            self.row += 1;
        }
    }

    fn left(&mut self) {
        if let Some(col) = self.cols.get_mut(self.row) {
            *col = col.saturating_sub(1);
        }
    }

    fn right(&mut self) {
        let len = self.rows.get(self.row).map(|r| r.movies.len()).unwrap_or(0);
        if let Some(col) = self.cols.get_mut(self.row) {
            if *col + 1 < len {
                *col += 1;
            }
        }
    }
}

/// Entry in the search filter panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterItem {
    Sort(SortBy),
    Genre(&'static str),
    Year(u16),
    Rating(RatingBand),
    Clear,
}

/// Search screen state
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub input: TextInput,
    /// Query of the request whose results are shown
    pub last_query: String,
    /// Unfiltered results
    pub results: Vec<Movie>,
    /// Results after filters and sort
    pub visible: Vec<Movie>,
    pub filters: Filters,
    pub list: ListState,
    pub loading: LoadingState,
    /// Filter panel selection, when the panel is open
    pub panel: Option<ListState>,
}

impl SearchState {
    /// Set results and update list state
    pub fn set_results(&mut self, results: Vec<Movie>) {
        self.results = results;
        self.loading = LoadingState::Idle;
        self.refilter();
    }

    pub fn refilter(&mut self) {
        self.visible = self.filters.apply(&self.results);
        self.list.set_len(self.visible.len());
    }

    pub fn selected_result(&self) -> Option<&Movie> {
        self.visible.get(self.list.selected)
    }

    /// Panel entries: sorts, genres, years present in the results, bands
    pub fn filter_items(&self) -> Vec<FilterItem> {
        let mut items: Vec<FilterItem> = [
            SortBy::Trending,
            SortBy::Newest,
            SortBy::Oldest,
            SortBy::RatingHigh,
            SortBy::RatingLow,
            SortBy::Alphabetical,
            SortBy::AlphabeticalDesc,
        ]
        .into_iter()
        .map(FilterItem::Sort)
        .collect();
        items.extend(GENRES.iter().copied().map(FilterItem::Genre));

        let mut years: Vec<u16> = self.results.iter().filter_map(|m| m.year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        items.extend(years.into_iter().map(FilterItem::Year));

        items.extend(RatingBand::ALL.into_iter().map(FilterItem::Rating));
        items.push(FilterItem::Clear);
        items
    }

    pub fn is_item_active(&self, item: &FilterItem) -> bool {
        match item {
            FilterItem::Sort(s) => self.filters.sort_by == *s,
            FilterItem::Genre(g) => self.filters.genres.iter().any(|x| x == g),
            FilterItem::Year(y) => self.filters.years.contains(y),
            FilterItem::Rating(b) => self.filters.ratings.contains(b),
            FilterItem::Clear => false,
        }
    }

    fn toggle_item(&mut self, item: FilterItem) {
        match item {
            FilterItem::Sort(s) => self.filters.sort_by = s,
            FilterItem::Genre(g) => self.filters.toggle_genre(g),
            FilterItem::Year(y) => self.filters.toggle_year(y),
            FilterItem::Rating(b) => self.filters.toggle_rating(b),
            FilterItem::Clear => self.filters.clear(),
        }
        self.refilter();
    }
}

/// Detail view state
#[derive(Debug, Clone)]
pub struct DetailState {
    pub movie: Movie,
    pub similar: Vec<Movie>,
    pub similar_list: ListState,
    pub ratings: Option<RatingSummary>,
    pub stars: StarRating,
}

impl DetailState {
    pub fn new(movie: Movie) -> Self {
        Self {
            movie,
            similar: Vec::new(),
            similar_list: ListState::default(),
            ratings: None,
            stars: StarRating::default(),
        }
    }
}

/// Downloads screen state
#[derive(Debug, Clone, Default)]
pub struct DownloadsState {
    pub records: Vec<DownloadRecord>,
    pub list: ListState,
    pub loading: LoadingState,
}

/// Open player
#[derive(Debug)]
pub struct PlayerView {
    pub movie: Movie,
    /// None until the media element is up
    pub controller: Option<PlayerController>,
    pub loading: LoadingState,
}

// =============================================================================
// Main Application State
// =============================================================================

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Current state/screen
    pub state: AppState,
    /// Navigation history stack
    pub nav_stack: Vec<AppState>,
    /// Whether the app is running
    pub running: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Global error message
    pub error: Option<String>,
    /// Transient one-line notice
    pub notice: Option<String>,

    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,

    // View-specific states
    pub auth: AuthForm,
    pub profiles: ProfilesState,
    pub browse: BrowseState,
    pub search: SearchState,
    pub detail: Option<DetailState>,
    pub my_list_view: ListState,
    pub downloads_view: DownloadsState,
    pub player: Option<PlayerView>,

    // Shared state
    pub my_list: MyList,
    pub reactions: Reactions,
    pub downloads: DownloadManager,
    /// Last known position per movie, for resume
    pub resume: HashMap<String, f64>,

    controls_hide_after: Duration,
    rng: StdRng,
}

impl Default for App {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

impl App {
    /// Create a new App instance
    pub fn new(controls_hide_after: Duration) -> Self {
        Self::with_rng(controls_hide_after, StdRng::from_os_rng())
    }

    /// App with a fixed RNG (hero pick)
    pub fn with_rng(controls_hide_after: Duration, rng: StdRng) -> Self {
        Self {
            state: AppState::Login,
            nav_stack: Vec::new(),
            running: true,
            input_mode: InputMode::Editing,
            error: None,
            notice: None,
            user: None,
            profile: None,
            auth: AuthForm::default(),
            profiles: ProfilesState::default(),
            browse: BrowseState::default(),
            search: SearchState::default(),
            detail: None,
            my_list_view: ListState::default(),
            downloads_view: DownloadsState::default(),
            player: None,
            my_list: MyList::default(),
            reactions: Reactions::default(),
            downloads: DownloadManager::default(),
            resume: HashMap::new(),
            controls_hide_after,
            rng,
        }
    }

    /// First screen: the profile picker when a session was restored
    pub fn start(&mut self, user: Option<AuthUser>) -> Vec<Action> {
        match user {
            Some(user) => {
                self.user = Some(user);
                self.reset_to(AppState::Profiles)
            }
            None => self.reset_to(AppState::Login),
        }
    }

    /// Navigate to a new state, pushing current to stack
    pub fn navigate(&mut self, state: AppState) {
        if self.state != state {
            self.nav_stack.push(self.state);
            self.state = state;
        }
        self.input_mode = InputMode::Normal;
    }

    /// Go back to previous state
    pub fn back(&mut self) -> bool {
        if self.input_mode == InputMode::Editing {
            self.input_mode = InputMode::Normal;
            return true;
        }

        if let Some(prev) = self.nav_stack.pop() {
            self.state = prev;
            true
        } else {
            false
        }
    }

    /// Replace the whole history with one screen
    pub fn reset_to(&mut self, state: AppState) -> Vec<Action> {
        self.nav_stack.clear();
        self.state = state;
        self.input_mode = if matches!(state, AppState::Login | AppState::Register) {
            InputMode::Editing
        } else {
            InputMode::Normal
        };
        self.on_enter()
    }

    /// Loads a screen needs every time it is shown
    pub fn on_enter(&mut self) -> Vec<Action> {
        match self.state {
            AppState::Profiles => {
                self.profiles.loading = LoadingState::Loading(Some("Loading profiles...".into()));
                vec![Action::LoadProfiles]
            }
            AppState::Browse => {
                self.browse.loading = LoadingState::Loading(Some("Loading catalog...".into()));
                vec![Action::LoadBrowse, Action::LoadMyList]
            }
            AppState::MyList => vec![Action::LoadMyList],
            AppState::Downloads => {
                self.downloads_view.loading = LoadingState::Loading(None);
                vec![Action::LoadDownloads]
            }
            _ => Vec::new(),
        }
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Set error message
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some(msg.into());
    }

    /// The backend rejected our token: drop everything and show login
    pub fn force_login(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.player.take().is_some() {
            actions.push(Action::ClosePlayer);
        }
        let on_auth_screen = matches!(self.state, AppState::Login | AppState::Register);
        self.user = None;
        self.profile = None;
        self.my_list = MyList::default();
        self.detail = None;
        self.downloads.cancel_all();
        if !on_auth_screen {
            self.auth.reset();
            self.auth.error = Some("Session expired. Please sign in again.".into());
            actions.extend(self.reset_to(AppState::Login));
        }
        actions
    }

    /// Any movie the app currently knows about, by id
    pub fn find_movie(&self, movie_id: &str) -> Option<&Movie> {
        self.detail
            .as_ref()
            .map(|d| &d.movie)
            .filter(|m| m.id == movie_id)
            .or_else(|| self.my_list.movies().iter().find(|m| m.id == movie_id))
            .or_else(|| {
                self.browse
                    .rows
                    .iter()
                    .flat_map(|r| r.movies.iter())
                    .find(|m| m.id == movie_id)
            })
            .or_else(|| self.search.results.iter().find(|m| m.id == movie_id))
    }

    /// Periodic housekeeping (controls auto-hide)
    pub fn tick(&mut self, now: Instant) {
        if let Some(ctl) = self.player.as_mut().and_then(|p| p.controller.as_mut()) {
            ctl.tick(now);
        }
    }

    // -------------------------------------------------------------------------
    // Shared operations
    // -------------------------------------------------------------------------

    fn open_detail(&mut self, movie: Movie) -> Vec<Action> {
        self.detail = Some(DetailState::new(movie.clone()));
        self.navigate(AppState::Detail);
        vec![Action::LoadDetail(movie)]
    }

    fn play(&mut self, movie: Movie) -> Vec<Action> {
        let resume = self.resume.get(&movie.id).copied().unwrap_or(0.0);
        self.player = Some(PlayerView {
            movie: movie.clone(),
            controller: None,
            loading: LoadingState::Loading(Some("Starting player...".into())),
        });
        self.navigate(AppState::Player);
        vec![Action::Play { movie, resume }]
    }

    fn close_player(&mut self) -> Vec<Action> {
        if let Some(mut view) = self.player.take() {
            if let Some(ctl) = view.controller.as_mut() {
                ctl.close();
            }
        }
        let mut actions = vec![Action::ClosePlayer];
        if self.state == AppState::Player {
            self.back();
            actions.extend(self.on_enter());
        }
        actions
    }

    fn toggle_list(&mut self, movie: &Movie) -> Vec<Action> {
        match self.my_list.begin_toggle(movie) {
            Some(op) => vec![Action::CommitList {
                op,
                movie_id: movie.id.clone(),
            }],
            None => Vec::new(),
        }
    }

    fn remove_from_list(&mut self, movie_id: &str) -> Vec<Action> {
        match self.my_list.begin_remove(movie_id) {
            Some(op) => vec![Action::CommitList {
                op,
                movie_id: movie_id.to_string(),
            }],
            None => Vec::new(),
        }
    }

    fn start_download(&mut self, movie_id: &str) -> Vec<Action> {
        match self.downloads.begin(movie_id) {
            Some(cancel) => vec![Action::StartDownload {
                movie_id: movie_id.to_string(),
                cancel,
            }],
            None => Vec::new(),
        }
    }

    fn rate(&mut self, stars: u8) -> Vec<Action> {
        let Some(detail) = self.detail.as_mut() else {
            return Vec::new();
        };
        match detail.stars.begin(stars) {
            Some(stars) => vec![Action::Rate {
                movie_id: detail.movie.id.clone(),
                stars,
            }],
            None => Vec::new(),
        }
    }

    fn focus_search(&mut self) {
        self.navigate(AppState::Search);
        self.input_mode = InputMode::Editing;
        self.search.input.end();
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle keyboard event; returns background work to start
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        self.error = None;
        self.notice = None;

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return Vec::new();
        }

        match self.state {
            AppState::Login | AppState::Register => return self.handle_auth_key(key),
            AppState::Player => return self.handle_player_key(key),
            _ => {}
        }

        if self.input_mode == InputMode::Editing {
            return self.handle_editing_key(key);
        }

        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return Vec::new();
            }
            KeyCode::Esc => {
                if self.state == AppState::Search && self.search.panel.is_some() {
                    self.search.panel = None;
                    return Vec::new();
                }
                if self.back() {
                    return self.on_enter();
                }
                return Vec::new();
            }
            _ => {}
        }

        match self.state {
            AppState::Profiles => self.handle_profiles_key(key),
            AppState::Browse => self.handle_browse_key(key),
            AppState::Search => self.handle_search_key(key),
            AppState::Detail => self.handle_detail_key(key),
            AppState::MyList => self.handle_my_list_key(key),
            AppState::Downloads => self.handle_downloads_key(key),
            AppState::Login | AppState::Register | AppState::Player => Vec::new(),
        }
    }

    fn handle_auth_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let register = self.state == AppState::Register;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('r') if ctrl && !register => {
                self.auth.reset();
                self.state = AppState::Register;
            }
            KeyCode::Char('l') if ctrl && register => {
                self.auth.reset();
                self.state = AppState::Login;
            }
            KeyCode::Tab | KeyCode::Down => self.auth.next(register),
            KeyCode::BackTab | KeyCode::Up => self.auth.prev(register),
            KeyCode::Enter => return self.submit_auth(register),
            code => {
                if !self.auth.submitting {
                    let field = self.auth.focused(register);
                    self.auth.input_mut(field).handle_key(code);
                }
            }
        }
        Vec::new()
    }

    fn submit_auth(&mut self, register: bool) -> Vec<Action> {
        if self.auth.submitting {
            return Vec::new();
        }
        let email = self.auth.email.value.trim().to_string();
        let password = self.auth.password.value.clone();
        if email.is_empty() || password.is_empty() {
            self.auth.error = Some("Email and password are required".into());
            return Vec::new();
        }
        self.auth.error = None;

        if register {
            let name = self.auth.name.value.trim().to_string();
            if name.is_empty() {
                self.auth.error = Some("Name is required".into());
                return Vec::new();
            }
            if password.chars().count() < MIN_PASSWORD_LEN {
                self.auth.error = Some("Password must be at least 6 characters long".into());
                return Vec::new();
            }
            self.auth.submitting = true;
            vec![Action::Register {
                name,
                email,
                password,
            }]
        } else {
            self.auth.submitting = true;
            vec![Action::Login { email, password }]
        }
    }

    fn handle_player_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let now = Instant::now();
        let outcome = match self.player.as_mut().and_then(|p| p.controller.as_mut()) {
            Some(ctl) => ctl.handle_key(key.code, now),
            // Still starting: only Esc does anything
            None if key.code == KeyCode::Esc => KeyOutcome::Closed,
            None => KeyOutcome::Ignored,
        };
        match outcome {
            KeyOutcome::Closed => self.close_player(),
            KeyOutcome::Handled => Vec::new(),
            KeyOutcome::Ignored => {
                if key.code == KeyCode::Char('q') {
                    let actions = self.close_player();
                    self.quit();
                    return actions;
                }
                Vec::new()
            }
        }
    }

    /// Handle keys in editing (text input) mode
    fn handle_editing_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match self.state {
            AppState::Search => match key.code {
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    Vec::new()
                }
                KeyCode::Enter | KeyCode::Down => {
                    self.input_mode = InputMode::Normal;
                    self.submit_search()
                }
                code => {
                    self.search.input.handle_key(code);
                    Vec::new()
                }
            },
            AppState::Profiles => self.handle_profile_editor_key(key),
            _ => {
                self.input_mode = InputMode::Normal;
                Vec::new()
            }
        }
    }

    fn submit_search(&mut self) -> Vec<Action> {
        let query = self.search.input.value.trim().to_string();
        self.search.last_query = query.clone();
        if query.is_empty() {
            self.search.set_results(Vec::new());
            return Vec::new();
        }
        self.search.loading = LoadingState::Loading(Some("Searching...".into()));
        vec![Action::Search(query)]
    }

    fn handle_profile_editor_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Esc => {
                self.profiles.editor = None;
                self.input_mode = InputMode::Normal;
                Vec::new()
            }
            KeyCode::Enter => {
                let Some((edit, input)) = self.profiles.editor.take() else {
                    return Vec::new();
                };
                self.input_mode = InputMode::Normal;
                match edit {
                    ProfileEdit::New => match self.profiles.profiles.prepare_new(&input.value) {
                        Ok(body) => vec![Action::CreateProfile(body)],
                        Err(e) => {
                            self.profiles.message = Some(e.to_string());
                            Vec::new()
                        }
                    },
                    ProfileEdit::Rename(id) => {
                        let name = input.value.trim().to_string();
                        if name.is_empty() {
                            self.profiles.message = Some("Profile name cannot be empty".into());
                            return Vec::new();
                        }
                        vec![Action::RenameProfile { id, name }]
                    }
                }
            }
            code => {
                if let Some((_, input)) = self.profiles.editor.as_mut() {
                    input.handle_key(code);
                }
                Vec::new()
            }
        }
    }

    fn handle_profiles_key(&mut self, key: KeyEvent) -> Vec<Action> {
        self.profiles.message = None;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Left | KeyCode::Char('h') => {
                self.profiles.list.up()
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Right | KeyCode::Char('l') => {
                self.profiles.list.down()
            }
            KeyCode::Enter => {
                if let Some(profile) = self.profiles.selected().cloned() {
                    tracing::info!(profile = %profile.name, "profile selected");
                    self.profile = Some(profile);
                    return self.reset_to(AppState::Browse);
                }
            }
            KeyCode::Char('a') => {
                if self.profiles.profiles.can_add() {
                    self.profiles.editor = Some((ProfileEdit::New, TextInput::default()));
                    self.input_mode = InputMode::Editing;
                } else {
                    self.profiles.message = Some(format!(
                        "Profile limit reached ({})",
                        Profile::MAX_PER_ACCOUNT
                    ));
                }
            }
            KeyCode::Char('r') => {
                if let Some(p) = self.profiles.selected() {
                    let mut input = TextInput::default();
                    input.set(p.name.clone());
                    self.profiles.editor = Some((ProfileEdit::Rename(p.id.clone()), input));
                    self.input_mode = InputMode::Editing;
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(id) = self.profiles.selected().map(|p| p.id.clone()) {
                    match self.profiles.profiles.check_delete(&id) {
                        Ok(()) => return vec![Action::DeleteProfile { id }],
                        Err(e) => self.profiles.message = Some(e.to_string()),
                    }
                }
            }
            KeyCode::Char('o') => return self.logout(),
            _ => {}
        }
        Vec::new()
    }

    fn logout(&mut self) -> Vec<Action> {
        let mut actions = vec![Action::Logout];
        if self.player.is_some() {
            actions.extend(self.close_player());
        }
        self.user = None;
        self.profile = None;
        self.my_list = MyList::default();
        self.downloads.cancel_all();
        self.auth.reset();
        actions.extend(self.reset_to(AppState::Login));
        actions
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.browse.up(),
            KeyCode::Down | KeyCode::Char('j') => self.browse.down(),
            KeyCode::Left | KeyCode::Char('h') => self.browse.left(),
            KeyCode::Right | KeyCode::Char('l') => self.browse.right(),
            KeyCode::Tab => {
                self.browse.page = self.browse.page.next();
                self.browse.row = 0;
                self.browse.rebuild();
            }
            KeyCode::Enter | KeyCode::Char('i') => {
                if let Some(movie) = self.browse.selected_movie().cloned() {
                    return self.open_detail(movie);
                }
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                if let Some(movie) = self.browse.selected_movie().cloned() {
                    return self.play(movie);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                if let Some(movie) = self.browse.selected_movie().cloned() {
                    return self.toggle_list(&movie);
                }
            }
            KeyCode::Char('/') | KeyCode::Char('s') => self.focus_search(),
            KeyCode::Char('m') => {
                self.navigate(AppState::MyList);
                return self.on_enter();
            }
            KeyCode::Char('d') => {
                self.navigate(AppState::Downloads);
                return self.on_enter();
            }
            KeyCode::Char('P') => return self.reset_to(AppState::Profiles),
            KeyCode::Char('r') => return self.on_enter(),
            KeyCode::Char('o') => return self.logout(),
            _ => {}
        }
        Vec::new()
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if let Some(panel) = self.search.panel.as_mut() {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => panel.up(),
                KeyCode::Down | KeyCode::Char('j') => panel.down(),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    let idx = panel.selected;
                    if let Some(item) = self.search.filter_items().get(idx).copied() {
                        self.search.toggle_item(item);
                    }
                    let len = self.search.filter_items().len();
                    if let Some(panel) = self.search.panel.as_mut() {
                        panel.set_len(len);
                    }
                }
                KeyCode::Char('f') => self.search.panel = None,
                _ => {}
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.search.list.selected == 0 {
                    self.input_mode = InputMode::Editing;
                } else {
                    self.search.list.up();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.search.list.down(),
            KeyCode::Home => self.search.list.first(),
            KeyCode::End => self.search.list.last(),
            KeyCode::Char('/') | KeyCode::Char('s') => self.focus_search(),
            KeyCode::Char('f') => {
                self.search.panel = Some(ListState::new(self.search.filter_items().len()));
            }
            KeyCode::Char('c') => {
                self.search.filters.clear();
                self.search.refilter();
            }
            KeyCode::Enter | KeyCode::Char('i') => {
                if let Some(movie) = self.search.selected_result().cloned() {
                    return self.open_detail(movie);
                }
            }
            KeyCode::Char('p') => {
                if let Some(movie) = self.search.selected_result().cloned() {
                    return self.play(movie);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                if let Some(movie) = self.search.selected_result().cloned() {
                    return self.toggle_list(&movie);
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let Some(movie) = self.detail.as_ref().map(|d| d.movie.clone()) else {
            return Vec::new();
        };
        match key.code {
            KeyCode::Enter | KeyCode::Char('p') | KeyCode::Char(' ') => return self.play(movie),
            KeyCode::Char('+') | KeyCode::Char('a') => return self.toggle_list(&movie),
            KeyCode::Char('l') => {
                self.reactions.like(&movie.id);
            }
            KeyCode::Char('d') => {
                self.reactions.dislike(&movie.id);
            }
            KeyCode::Char(c @ '1'..='5') => return self.rate(c as u8 - b'0'),
            KeyCode::Char('u') => return self.rate(StarRating::QUICK_LIKE),
            KeyCode::Char('n') => return self.rate(StarRating::QUICK_DISLIKE),
            KeyCode::Char('w') => return self.start_download(&movie.id),
            KeyCode::Left | KeyCode::Char('h') => {
                if let Some(d) = self.detail.as_mut() {
                    d.similar_list.up();
                }
            }
            KeyCode::Right => {
                if let Some(d) = self.detail.as_mut() {
                    d.similar_list.down();
                }
            }
            KeyCode::Char('o') => {
                let similar = self
                    .detail
                    .as_ref()
                    .and_then(|d| d.similar.get(d.similar_list.selected).cloned());
                if let Some(next) = similar {
                    return self.open_detail(next);
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_my_list_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let selected = self
            .my_list
            .movies()
            .get(self.my_list_view.selected)
            .cloned();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.my_list_view.up(),
            KeyCode::Down | KeyCode::Char('j') => self.my_list_view.down(),
            KeyCode::Enter | KeyCode::Char('i') => {
                if let Some(movie) = selected {
                    return self.open_detail(movie);
                }
            }
            KeyCode::Char('p') => {
                if let Some(movie) = selected {
                    return self.play(movie);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(movie) = selected {
                    let actions = self.remove_from_list(&movie.id);
                    self.my_list_view.set_len(self.my_list.len());
                    return actions;
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_downloads_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let selected = self
            .downloads_view
            .records
            .get(self.downloads_view.list.selected)
            .cloned();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.downloads_view.list.up(),
            KeyCode::Down | KeyCode::Char('j') => self.downloads_view.list.down(),
            KeyCode::Enter | KeyCode::Char('p') => {
                if let Some(record) = selected {
                    return self.play(record.movie);
                }
            }
            KeyCode::Char('i') => {
                if let Some(record) = selected {
                    return self.open_detail(record.movie);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(record) = selected {
                    return vec![Action::DeleteDownload { id: record.id }];
                }
            }
            _ => {}
        }
        Vec::new()
    }

    // -------------------------------------------------------------------------
    // Background results
    // -------------------------------------------------------------------------

    /// Fold a background result into state; may start follow-up work
    pub fn apply(&mut self, event: AppEvent) -> Vec<Action> {
        match event {
            AppEvent::Authenticated(result) => {
                self.auth.submitting = false;
                match result {
                    Ok(resp) => {
                        self.user = Some(resp.user);
                        self.auth.reset();
                        return self.reset_to(AppState::Profiles);
                    }
                    Err(e) => {
                        let fallback = if self.state == AppState::Register {
                            "Registration failed"
                        } else {
                            "Login failed"
                        };
                        self.auth.error = Some(auth_failure_message(&e, fallback));
                    }
                }
            }

            AppEvent::ProfilesLoaded(result) => match result {
                Ok(profiles) => self.profiles.set(profiles),
                Err(e) => self.profiles.loading = LoadingState::Error(e.to_string()),
            },
            AppEvent::ProfileCreated(result) => match result {
                Ok(profile) => {
                    let mut items = self.profiles.profiles.items().to_vec();
                    items.push(profile);
                    self.profiles.set(Profiles::new(items));
                }
                Err(e) => self.profiles.message = Some(e.to_string()),
            },
            AppEvent::ProfileRenamed { id, name, result } => match result {
                Ok(()) => {
                    let items = self
                        .profiles
                        .profiles
                        .items()
                        .iter()
                        .cloned()
                        .map(|mut p| {
                            if p.id == id {
                                p.name = name.clone();
                            }
                            p
                        })
                        .collect();
                    self.profiles.set(Profiles::new(items));
                }
                Err(e) => self.profiles.message = Some(e.to_string()),
            },
            AppEvent::ProfileDeleted { id, result } => match result {
                Ok(()) => {
                    let items = self
                        .profiles
                        .profiles
                        .items()
                        .iter()
                        .filter(|p| p.id != id)
                        .cloned()
                        .collect();
                    self.profiles.set(Profiles::new(items));
                }
                Err(e) => self.profiles.message = Some(e.to_string()),
            },

            AppEvent::CatalogLoaded(result) => match result {
                Ok(catalog) => {
                    self.browse.hero = catalog.pick_hero(&mut self.rng).cloned();
                    self.browse.catalog = catalog;
                    self.browse.loading = LoadingState::Idle;
                    self.browse.rebuild();
                }
                Err(e) => {
                    self.browse.catalog = Catalog::default();
                    self.browse.hero = None;
                    self.browse.rebuild();
                    self.browse.loading = LoadingState::Error(e.to_string());
                }
            },
            AppEvent::ContinueWatchingLoaded(items) => {
                for item in &items {
                    if let Some(movie) = &item.movie {
                        self.resume.insert(movie.id.clone(), item.current_time);
                    }
                }
                self.browse.continue_watching = items;
                self.browse.rebuild();
            }
            AppEvent::MyListLoaded(result) => {
                if let Ok(movies) = result {
                    self.my_list.replace(movies);
                }
                self.my_list_view.set_len(self.my_list.len());
            }
            AppEvent::SearchResults { query, result } => {
                if query == self.search.last_query {
                    self.search.set_results(result.unwrap_or_default());
                }
            }
            AppEvent::SimilarLoaded { movie_id, movies } => {
                if let Some(d) = self.detail.as_mut().filter(|d| d.movie.id == movie_id) {
                    d.similar_list.set_len(movies.len());
                    d.similar = movies;
                }
            }
            AppEvent::RatingsLoaded { movie_id, summary } => {
                if let Some(d) = self.detail.as_mut().filter(|d| d.movie.id == movie_id) {
                    d.ratings = Some(summary);
                }
            }

            AppEvent::ListCommitted { movie_id, result } => {
                if result.is_err() {
                    self.notice = Some("Could not update My List".into());
                }
                self.my_list.settle(&movie_id, &result);
                self.my_list_view.set_len(self.my_list.len());
            }
            AppEvent::Rated {
                movie_id,
                stars,
                result,
            } => {
                if let Some(d) = self.detail.as_mut().filter(|d| d.movie.id == movie_id) {
                    d.stars.finish(stars, result.is_ok());
                }
                match result {
                    Ok(()) => return vec![Action::LoadRatings(movie_id)],
                    Err(e) => self.notice = Some(format!("Rating failed: {}", e)),
                }
            }

            AppEvent::Download(update) => {
                self.downloads.apply(&update);
                match update {
                    DownloadUpdate::Completed { .. } => return vec![Action::LoadDownloads],
                    DownloadUpdate::Failed { message, .. } => {
                        self.notice = Some(format!("Download failed: {}", message));
                    }
                    _ => {}
                }
            }
            AppEvent::DownloadsLoaded(result) => {
                match result {
                    Ok(records) => {
                        self.downloads_view.records = records;
                        self.downloads_view.loading = LoadingState::Idle;
                    }
                    Err(e) => self.downloads_view.loading = LoadingState::Error(e.to_string()),
                }
                let len = self.downloads_view.records.len();
                self.downloads_view.list.set_len(len);
            }
            AppEvent::DownloadDeleted { id, result } => match result {
                Ok(()) => {
                    tracing::info!(download = %id, "download removed");
                    return vec![Action::LoadDownloads];
                }
                Err(e) => self.set_error(format!("Could not delete download: {}", e)),
            },

            AppEvent::PlayerReady {
                movie,
                element,
                sources,
                resume,
            } => {
                let Some(view) = self.player.as_mut().filter(|v| v.movie.id == movie.id) else {
                    // Player was closed while starting; dropping the element stops it
                    return Vec::new();
                };
                match PlayerController::open(
                    movie,
                    element,
                    &sources,
                    resume,
                    self.controls_hide_after,
                ) {
                    Ok(mut ctl) => {
                        ctl.toggle_play();
                        ctl.activity(Instant::now());
                        view.controller = Some(ctl);
                        view.loading = LoadingState::Idle;
                    }
                    Err(e) => {
                        self.set_error(e.to_string());
                        return self.close_player();
                    }
                }
            }
            AppEvent::PlayerFailed(message) => {
                if self.player.is_some() {
                    self.set_error(message);
                    return self.close_player();
                }
            }
            AppEvent::Media { movie_id, event } => {
                // A closed or replaced player may still have events in flight
                let progress = self
                    .player
                    .as_mut()
                    .filter(|view| view.movie.id == movie_id)
                    .and_then(|view| view.controller.as_mut())
                    .and_then(|ctl| ctl.handle_event(event));
                if let Some(progress) = progress {
                    self.resume
                        .insert(progress.movie_id.clone(), progress.current_time);
                    return vec![Action::ReportProgress(progress)];
                }
                if event == MediaEvent::Ended {
                    tracing::debug!("playback ended");
                }
            }
        }
        Vec::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::library::ListOp;
    use crate::player::{MediaElement, PlayerError};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn movie(id: &str, category: &str) -> Movie {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": format!("Movie {}", id),
            "category": category,
        }))
        .unwrap()
    }

    fn app() -> App {
        App::with_rng(Duration::from_secs(3), StdRng::seed_from_u64(42))
    }

    fn browsing() -> App {
        let mut app = app();
        app.start(Some(AuthUser {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }));
        app.reset_to(AppState::Browse);
        let catalog = Catalog::partition(&[
            movie("t1", "trending"),
            movie("t2", "trending"),
            movie("a1", "action"),
        ]);
        app.apply(AppEvent::CatalogLoaded(Ok(catalog)));
        app
    }

    // -------------------------------------------------------------------------
    // ListState Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_list_state_navigation() {
        let mut list = ListState::new(5);
        list.down();
        list.down();
        list.down();
        list.down();
        list.down();
        assert_eq!(list.selected, 4);

        list.up();
        assert_eq!(list.selected, 3);

        list.first();
        assert_eq!(list.selected, 0);

        list.last();
        assert_eq!(list.selected, 4);
    }

    #[test]
    fn test_list_state_set_len() {
        let mut list = ListState::new(10);
        list.selected = 8;
        list.set_len(5);
        assert_eq!(list.selected, 4);
        list.set_len(0);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_list_state_scroll_into_view() {
        let mut list = ListState::new(20);
        list.selected = 12;
        list.scroll_into_view(5);
        assert_eq!(list.offset, 8);
    }

    // -------------------------------------------------------------------------
    // TextInput Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_text_input_editing() {
        let mut input = TextInput::default();
        for c in "hello".chars() {
            input.insert(c);
        }
        input.left();
        input.left();
        input.insert('X');
        assert_eq!(input.value, "helXlo");

        input.backspace();
        assert_eq!(input.value, "hello");

        input.home();
        input.delete();
        assert_eq!(input.value, "ello");
    }

    #[test]
    fn test_text_input_multibyte() {
        let mut input = TextInput::default();
        input.set("Amélie");
        input.backspace();
        input.left();
        input.backspace();
        assert_eq!(input.value, "Amée");
        assert_eq!(input.split(), ("Amé", "e"));
    }

    // -------------------------------------------------------------------------
    // Auth Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_login_form_submits() {
        let mut app = app();
        assert_eq!(app.state, AppState::Login);
        for c in "a@b.c".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Tab));
        for c in "secret".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let actions = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            actions.as_slice(),
            [Action::Login { email, password }] if email == "a@b.c" && password == "secret"
        ));
        assert!(app.auth.submitting);
    }

    #[test]
    fn test_register_rejects_short_password() {
        let mut app = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert_eq!(app.state, AppState::Register);

        app.auth.name.set("Ada");
        app.auth.email.set("ada@example.com");
        app.auth.password.set("12345");
        let actions = app.handle_key(key(KeyCode::Enter));
        assert!(actions.is_empty());
        assert_eq!(
            app.auth.error.as_deref(),
            Some("Password must be at least 6 characters long")
        );
    }

    #[test]
    fn test_login_failure_message() {
        let mut app = app();
        app.auth.submitting = true;
        app.apply(AppEvent::Authenticated(Err(ApiError::Rejected {
            status: 400,
            message: "Invalid credentials".into(),
        })));
        assert!(!app.auth.submitting);
        assert_eq!(app.auth.error.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn test_login_success_goes_to_profiles() {
        let mut app = app();
        let actions = app.apply(AppEvent::Authenticated(Ok(AuthResponse {
            token: "t".into(),
            user: AuthUser {
                id: "u".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        })));
        assert_eq!(app.state, AppState::Profiles);
        assert!(matches!(actions.as_slice(), [Action::LoadProfiles]));
    }

    #[test]
    fn test_force_login_from_anywhere() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Detail);

        app.force_login();
        assert_eq!(app.state, AppState::Login);
        assert!(app.nav_stack.is_empty());
        assert!(app.user.is_none());
        assert!(app.auth.error.as_deref().unwrap().contains("Session expired"));
    }

    // -------------------------------------------------------------------------
    // Browse Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_browse_entry_loads_catalog() {
        let mut app = app();
        let actions = app.reset_to(AppState::Browse);
        assert!(matches!(
            actions.as_slice(),
            [Action::LoadBrowse, Action::LoadMyList]
        ));
        assert!(app.browse.loading.is_loading());
    }

    #[test]
    fn test_browse_rows_and_hero() {
        let app = browsing();
        let titles: Vec<_> = app.browse.rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Trending Now", "Action Thrillers"]);
        assert_eq!(app.browse.hero.as_ref().unwrap().category, "trending");
    }

    #[test]
    fn test_browse_navigation_and_detail() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.browse.selected_movie().unwrap().id, "t2");
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.browse.selected_movie().unwrap().id, "a1");

        let actions = app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Detail);
        assert!(matches!(actions.as_slice(), [Action::LoadDetail(m)] if m.id == "a1"));

        let actions = app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Browse);
        assert!(matches!(actions.first(), Some(Action::LoadBrowse)));
    }

    #[test]
    fn test_browse_up_focuses_hero() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Up));
        assert!(app.browse.hero_focused);
        assert_eq!(app.browse.selected_movie(), app.browse.hero.as_ref());
    }

    #[test]
    fn test_continue_watching_row_and_resume() {
        let mut app = browsing();
        app.apply(AppEvent::ContinueWatchingLoaded(vec![ContinueWatchingItem {
            movie: Some(movie("a1", "action")),
            current_time: 120.0,
            duration: 600.0,
        }]));
        assert_eq!(app.browse.rows[0].title, CONTINUE_WATCHING);

        let actions = app.handle_key(key(KeyCode::Char('p')));
        assert!(matches!(
            actions.as_slice(),
            [Action::Play { movie, resume }] if movie.id == "a1" && *resume == 120.0
        ));
        assert_eq!(app.state, AppState::Player);
    }

    #[test]
    fn test_page_switch_hides_continue_watching() {
        let mut app = browsing();
        app.apply(AppEvent::ContinueWatchingLoaded(vec![ContinueWatchingItem {
            movie: Some(movie("a1", "action")),
            current_time: 1.0,
            duration: 2.0,
        }]));
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.browse.page, Page::TvShows);
        assert!(app.browse.rows.iter().all(|r| r.title != CONTINUE_WATCHING));
    }

    #[test]
    fn test_catalog_error_degrades_to_empty() {
        let mut app = browsing();
        app.apply(AppEvent::CatalogLoaded(Err(ApiError::ServerError(500))));
        assert!(app.browse.rows.is_empty());
        assert!(app.browse.hero.is_none());
        assert!(app.browse.loading.is_error());
    }

    // -------------------------------------------------------------------------
    // My List Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_list_toggle_is_optimistic_and_rolls_back() {
        let mut app = browsing();
        let actions = app.handle_key(key(KeyCode::Char('+')));
        assert!(matches!(
            actions.as_slice(),
            [Action::CommitList { op: ListOp::Add, movie_id }] if movie_id == "t1"
        ));
        assert!(app.my_list.contains("t1"));

        app.apply(AppEvent::ListCommitted {
            movie_id: "t1".into(),
            result: Err(ApiError::ServerError(500)),
        });
        assert!(!app.my_list.contains("t1"));
        assert!(app.notice.is_some());
    }

    #[test]
    fn test_list_add_twice_single_request() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Char('+')));
        app.apply(AppEvent::ListCommitted {
            movie_id: "t1".into(),
            result: Ok(()),
        });
        assert_eq!(app.my_list.len(), 1);
        assert_eq!(app.my_list.begin_add(&movie("t1", "trending")), None);
    }

    // -------------------------------------------------------------------------
    // Detail Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_detail_reactions_are_local() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Enter));
        let actions = app.handle_key(key(KeyCode::Char('l')));
        assert!(actions.is_empty());
        assert_eq!(app.reactions.get("t1"), Some(crate::library::Reaction::Like));
    }

    #[test]
    fn test_detail_star_rating_single_flight() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Enter));
        let first = app.handle_key(key(KeyCode::Char('u')));
        assert!(matches!(first.as_slice(), [Action::Rate { stars: 5, .. }]));
        let second = app.handle_key(key(KeyCode::Char('3')));
        assert!(second.is_empty());

        let follow = app.apply(AppEvent::Rated {
            movie_id: "t1".into(),
            stars: 5,
            result: Ok(()),
        });
        assert_eq!(app.detail.as_ref().unwrap().stars.rating, 5);
        assert!(matches!(follow.as_slice(), [Action::LoadRatings(id)] if id == "t1"));
    }

    #[test]
    fn test_detail_download_ignores_duplicate() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.handle_key(key(KeyCode::Char('w'))).len(), 1);
        assert!(app.handle_key(key(KeyCode::Char('w'))).is_empty());

        let follow = app.apply(AppEvent::Download(DownloadUpdate::Completed {
            movie_id: "t1".into(),
        }));
        assert!(matches!(follow.as_slice(), [Action::LoadDownloads]));
    }

    #[test]
    fn test_stale_similar_ignored() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Enter));
        app.apply(AppEvent::SimilarLoaded {
            movie_id: "other".into(),
            movies: vec![movie("x", "trending")],
        });
        assert!(app.detail.as_ref().unwrap().similar.is_empty());
    }

    // -------------------------------------------------------------------------
    // Search Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_search_blank_query_no_request() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Char('/')));
        assert_eq!(app.state, AppState::Search);
        assert_eq!(app.input_mode, InputMode::Editing);

        app.handle_key(key(KeyCode::Char(' ')));
        let actions = app.handle_key(key(KeyCode::Enter));
        assert!(actions.is_empty());
        assert!(app.search.visible.is_empty());
    }

    #[test]
    fn test_search_submit_and_stale_results() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Char('/')));
        for c in "dune".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let actions = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(actions.as_slice(), [Action::Search(q)] if q == "dune"));

        app.apply(AppEvent::SearchResults {
            query: "old".into(),
            result: Ok(vec![movie("x", "trending")]),
        });
        assert!(app.search.visible.is_empty());

        app.apply(AppEvent::SearchResults {
            query: "dune".into(),
            result: Ok(vec![movie("d1", "scifi")]),
        });
        assert_eq!(app.search.visible.len(), 1);
    }

    #[test]
    fn test_search_failure_shows_nothing() {
        let mut app = browsing();
        app.search.last_query = "q".into();
        app.apply(AppEvent::SearchResults {
            query: "q".into(),
            result: Err(ApiError::ServerError(502)),
        });
        assert!(app.search.visible.is_empty());
        assert!(!app.search.loading.is_loading());
    }

    #[test]
    fn test_search_filter_panel_sort() {
        let mut app = browsing();
        app.navigate(AppState::Search);
        app.search.last_query = "q".into();
        app.search.set_results(vec![movie("b", "x"), movie("a", "x")]);

        app.handle_key(key(KeyCode::Char('f')));
        assert!(app.search.panel.is_some());
        // Sort entries come first: Trending, Newest, Oldest, High, Low, A-Z
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Down));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.search.filters.sort_by, SortBy::Alphabetical);
        assert_eq!(app.search.visible[0].id, "a");

        app.handle_key(key(KeyCode::Esc));
        assert!(app.search.panel.is_none());
        assert_eq!(app.state, AppState::Search);
    }

    // -------------------------------------------------------------------------
    // Profiles Tests
    // -------------------------------------------------------------------------

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.into(),
            name: id.to_uppercase(),
            avatar: String::new(),
            is_kids: false,
        }
    }

    #[test]
    fn test_profile_select_enters_browse() {
        let mut app = app();
        app.reset_to(AppState::Profiles);
        app.apply(AppEvent::ProfilesLoaded(Ok(Profiles::new(vec![
            profile("a"),
            profile("b"),
        ]))));
        app.handle_key(key(KeyCode::Down));
        let actions = app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Browse);
        assert_eq!(app.profile.as_ref().unwrap().id, "b");
        assert!(matches!(actions.first(), Some(Action::LoadBrowse)));
    }

    #[test]
    fn test_profile_delete_last_refused() {
        let mut app = app();
        app.reset_to(AppState::Profiles);
        app.apply(AppEvent::ProfilesLoaded(Ok(Profiles::new(vec![profile("a")]))));
        let actions = app.handle_key(key(KeyCode::Char('x')));
        assert!(actions.is_empty());
        assert!(app.profiles.message.is_some());
    }

    #[test]
    fn test_profile_create_via_editor() {
        let mut app = app();
        app.reset_to(AppState::Profiles);
        app.apply(AppEvent::ProfilesLoaded(Ok(Profiles::new(vec![profile("a")]))));
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.input_mode, InputMode::Editing);
        for c in "Kid".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let actions = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            actions.as_slice(),
            [Action::CreateProfile(p)] if p.name == "Kid" && p.avatar == DEFAULT_AVATARS[1]
        ));
    }

    // -------------------------------------------------------------------------
    // Player Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_player_esc_while_starting_closes() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Char('p')));
        assert_eq!(app.state, AppState::Player);

        let actions = app.handle_key(key(KeyCode::Esc));
        assert!(matches!(actions.first(), Some(Action::ClosePlayer)));
        assert_eq!(app.state, AppState::Browse);
        assert!(app.player.is_none());
    }

    #[test]
    fn test_player_failure_returns() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Char('p')));
        app.apply(AppEvent::PlayerFailed("Player 'mpv' not found".into()));
        assert_eq!(app.state, AppState::Browse);
        assert!(app.error.is_some());
    }

    #[test]
    fn test_quit_key() {
        let mut app = browsing();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    // -------------------------------------------------------------------------
    // Player Tests
    // -------------------------------------------------------------------------

    struct SilentElement;

    impl MediaElement for SilentElement {
        fn load(&mut self, _: &[String], _: f64) -> Result<(), PlayerError> {
            Ok(())
        }
        fn play(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }
        fn pause(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }
        fn seek(&mut self, _: f64) -> Result<(), PlayerError> {
            Ok(())
        }
        fn set_volume(&mut self, _: f64) -> Result<(), PlayerError> {
            Ok(())
        }
        fn set_muted(&mut self, _: bool) -> Result<(), PlayerError> {
            Ok(())
        }
        fn set_fullscreen(&mut self, _: bool) -> Result<(), PlayerError> {
            Ok(())
        }
        fn close(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }
    }

    fn playing(app: &mut App, id: &str) {
        let m = movie(id, "action");
        app.play(m.clone());
        app.apply(AppEvent::PlayerReady {
            movie: m,
            element: Box::new(SilentElement),
            sources: vec!["http://backend/stream".into()],
            resume: 0.0,
        });
    }

    fn current_time(app: &App) -> Option<f64> {
        app.player
            .as_ref()
            .and_then(|view| view.controller.as_ref())
            .map(|ctl| ctl.state().current_time)
    }

    #[test]
    fn test_media_events_from_previous_player_are_ignored() {
        let mut app = browsing();
        playing(&mut app, "t1");
        app.close_player();
        playing(&mut app, "a1");
        assert_eq!(current_time(&app), Some(0.0));

        // Still queued from the first player
        let actions = app.apply(AppEvent::Media {
            movie_id: "t1".into(),
            event: MediaEvent::TimeUpdate(500.0),
        });
        assert!(actions.is_empty());
        assert_eq!(current_time(&app), Some(0.0));
        assert!(!app.resume.contains_key("t1"));

        let actions = app.apply(AppEvent::Media {
            movie_id: "a1".into(),
            event: MediaEvent::TimeUpdate(42.0),
        });
        assert!(matches!(
            actions.as_slice(),
            [Action::ReportProgress(p)] if p.movie_id == "a1"
        ));
        assert_eq!(current_time(&app), Some(42.0));
    }
}
