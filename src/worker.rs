//! Background worker
//!
//! Runs [`Action`]s on tokio tasks and posts results back as [`AppEvent`]s.
//! Each screen gets a cancellation token; leaving the screen cancels it so
//! late replies never reach a view that is gone.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::app::AppState;
use crate::catalog;
use crate::config::Config;
use crate::downloads::{self, DownloadTiming};
use crate::events::{Action, AppEvent, EventSender};
use crate::player::{self, MediaEvent, ProgressReporter};
use crate::profiles::Profiles;

/// Executes UI actions against the backend
#[derive(Debug)]
pub struct Worker {
    api: ApiClient,
    config: Config,
    tx: EventSender,
    /// Cancels everything on drop
    root: CancellationToken,
    browse: CancellationToken,
    search: CancellationToken,
    detail: CancellationToken,
    player: Option<CancellationToken>,
    reporter: Option<ProgressReporter>,
}

impl Worker {
    pub fn new(api: ApiClient, config: Config, tx: EventSender) -> Self {
        let root = CancellationToken::new();
        Self {
            api,
            config,
            tx,
            browse: root.child_token(),
            search: root.child_token(),
            detail: root.child_token(),
            root,
            player: None,
            reporter: None,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// A screen was left; drop its in-flight work
    pub fn leave(&mut self, state: AppState) {
        match state {
            AppState::Browse => Self::renew(&self.root, &mut self.browse),
            AppState::Search => Self::renew(&self.root, &mut self.search),
            AppState::Detail => Self::renew(&self.root, &mut self.detail),
            AppState::Player => self.stop_player(),
            _ => {}
        }
    }

    fn renew(root: &CancellationToken, token: &mut CancellationToken) {
        token.cancel();
        *token = root.child_token();
    }

    /// Spawn a future whose result is sent unless `token` fires first
    fn spawn_with<F>(&self, token: CancellationToken, fut: F)
    where
        F: std::future::Future<Output = Option<AppEvent>> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                event = fut => {
                    if let Some(event) = event {
                        let _ = tx.send(event);
                    }
                }
            }
        });
    }

    /// Start one action
    pub fn dispatch(&mut self, action: Action) {
        tracing::debug!(?action, "dispatch");
        let api = self.api.clone();
        let root = self.root.clone();

        match action {
            Action::Login { email, password } => self.spawn_with(root, async move {
                let result = api.login(&email, &password).await;
                Some(AppEvent::Authenticated(store_session(&api, result)))
            }),
            Action::Register {
                name,
                email,
                password,
            } => self.spawn_with(root, async move {
                let result = api.register(&name, &email, &password).await;
                Some(AppEvent::Authenticated(store_session(&api, result)))
            }),
            Action::Logout => {
                self.stop_player();
                Self::renew(&self.root, &mut self.browse);
                Self::renew(&self.root, &mut self.search);
                Self::renew(&self.root, &mut self.detail);
                self.api.session().logout();
            }

            Action::LoadProfiles => self.spawn_with(root, async move {
                Some(AppEvent::ProfilesLoaded(Profiles::load(&api).await))
            }),
            Action::CreateProfile(body) => self.spawn_with(root, async move {
                Some(AppEvent::ProfileCreated(api.create_profile(&body).await))
            }),
            Action::RenameProfile { id, name } => self.spawn_with(root, async move {
                let update = crate::api::ProfileUpdate {
                    name: Some(name.clone()),
                    ..Default::default()
                };
                let result = api.update_profile(&id, &update).await;
                Some(AppEvent::ProfileRenamed { id, name, result })
            }),
            Action::DeleteProfile { id } => self.spawn_with(root, async move {
                let result = api.delete_profile(&id).await;
                Some(AppEvent::ProfileDeleted { id, result })
            }),

            Action::LoadBrowse => {
                let token = self.browse.clone();
                let cw_api = api.clone();
                self.spawn_with(token.clone(), async move {
                    Some(AppEvent::CatalogLoaded(catalog::load(&api).await))
                });
                self.spawn_with(token, async move {
                    // Optional row; any failure just hides it
                    let items = match cw_api.continue_watching().await {
                        Ok(items) => items,
                        Err(e) => {
                            tracing::debug!(error = %e, "continue watching unavailable");
                            Vec::new()
                        }
                    };
                    Some(AppEvent::ContinueWatchingLoaded(items))
                });
            }
            Action::LoadMyList => self.spawn_with(root, async move {
                Some(AppEvent::MyListLoaded(api.my_list().await))
            }),
            Action::Search(query) => {
                let token = self.search.clone();
                self.spawn_with(token, async move {
                    let result = catalog::search(&api, &query).await;
                    if let Err(e) = &result {
                        tracing::warn!(query, error = %e, "search failed");
                    }
                    Some(AppEvent::SearchResults { query, result })
                });
            }
            Action::LoadDetail(movie) => {
                let token = self.detail.clone();
                let ratings_api = api.clone();
                let movie_id = movie.id.clone();
                self.spawn_with(token.clone(), async move {
                    let movies = catalog::similar(&api, &movie).await.unwrap_or_else(|e| {
                        tracing::debug!(movie = %movie.id, error = %e, "no similar titles");
                        Vec::new()
                    });
                    Some(AppEvent::SimilarLoaded {
                        movie_id: movie.id,
                        movies,
                    })
                });
                self.spawn_with(token, load_ratings(ratings_api, movie_id));
            }
            Action::LoadRatings(movie_id) => {
                let token = self.detail.clone();
                self.spawn_with(token, load_ratings(api, movie_id));
            }

            Action::CommitList { op, movie_id } => self.spawn_with(root, async move {
                let result = op.commit(&api, &movie_id).await;
                Some(AppEvent::ListCommitted { movie_id, result })
            }),
            Action::Rate { movie_id, stars } => self.spawn_with(root, async move {
                let result = api.rate(&movie_id, stars).await;
                Some(AppEvent::Rated {
                    movie_id,
                    stars,
                    result,
                })
            }),

            Action::StartDownload { movie_id, cancel } => {
                let tx = self.tx.clone();
                let timing = DownloadTiming::from(&self.config);
                tokio::spawn(async move {
                    downloads::simulate(&api, &movie_id, timing, &cancel, |update| {
                        let _ = tx.send(AppEvent::Download(update));
                    })
                    .await;
                });
            }
            Action::LoadDownloads => self.spawn_with(root, async move {
                Some(AppEvent::DownloadsLoaded(api.downloads().await))
            }),
            Action::DeleteDownload { id } => self.spawn_with(root, async move {
                let result = api.delete_download(&id).await;
                Some(AppEvent::DownloadDeleted { id, result })
            }),

            Action::Play { movie, resume } => self.start_player(movie, resume),
            Action::ReportProgress(progress) => match &self.reporter {
                Some(reporter) => reporter.report(progress),
                None => tracing::debug!("progress with no open player"),
            },
            Action::ClosePlayer => self.stop_player(),
        }
    }

    fn start_player(&mut self, movie: crate::models::Movie, resume: f64) {
        self.stop_player();
        let token = self.root.child_token();
        self.player = Some(token.clone());
        self.reporter = Some(ProgressReporter::spawn(
            self.api.clone(),
            token.child_token(),
        ));

        let sources = player::sources_for(
            self.api.stream_url(&movie.id),
            &movie,
            &self.config.fallback_sources(),
        );
        let program = self.config.player_command();
        let tx = self.tx.clone();

        let (media_tx, mut media_rx) = mpsc::unbounded_channel::<MediaEvent>();
        let forward_token = token.clone();
        let forward_tx = tx.clone();
        let movie_id = movie.id.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = forward_token.cancelled() => break,
                    next = media_rx.recv() => match next {
                        Some(event) => {
                            let tagged = AppEvent::Media {
                                movie_id: movie_id.clone(),
                                event,
                            };
                            if forward_tx.send(tagged).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        self.spawn_with(token, async move {
            #[cfg(unix)]
            {
                match player::MpvElement::spawn(&program, media_tx).await {
                    Ok(element) => Some(AppEvent::PlayerReady {
                        movie,
                        element: Box::new(element),
                        sources,
                        resume,
                    }),
                    Err(e) => {
                        tracing::error!(program, error = %e, "player failed to start");
                        Some(AppEvent::PlayerFailed(e.to_string()))
                    }
                }
            }
            #[cfg(not(unix))]
            {
                let _ = (movie, sources, resume, media_tx);
                Some(AppEvent::PlayerFailed(format!(
                    "Playback through '{}' is only supported on Unix",
                    program
                )))
            }
        });
    }

    fn stop_player(&mut self) {
        if let Some(token) = self.player.take() {
            token.cancel();
        }
        if let Some(reporter) = self.reporter.take() {
            reporter.close();
        }
    }

    /// Cancel everything still running
    pub fn shutdown(&mut self) {
        self.stop_player();
        self.root.cancel();
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

fn store_session(
    api: &ApiClient,
    result: crate::api::ApiResult<crate::models::AuthResponse>,
) -> crate::api::ApiResult<crate::models::AuthResponse> {
    if let Ok(resp) = &result {
        if let Err(e) = api.session().login(resp.clone()) {
            // Signed in for this run; only persistence failed
            tracing::warn!(error = %e, "could not store session");
        }
    }
    result
}

async fn load_ratings(api: ApiClient, movie_id: String) -> Option<AppEvent> {
    match api.ratings(&movie_id).await {
        Ok(summary) => Some(AppEvent::RatingsLoaded { movie_id, summary }),
        Err(e) => {
            tracing::debug!(movie = %movie_id, error = %e, "ratings unavailable");
            None
        }
    }
}
