//! Application bootstrap: storage, session, router, HTTP pipeline.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::client::EventClient;
use crate::config::Config;
use crate::http::{BearerAuth, HttpClient, UnauthorizedRedirect};
use crate::notify::{ConsoleNotifier, Notifier, NotifierOptions};
use crate::routing::{Navigation, Navigator, Router, HOME_PATH};
use crate::session::AuthSession;
use crate::store::{FileSnapshotRepository, SnapshotRepository};

/// Everything a command needs, wired together once per process.
pub struct App {
    pub session: Arc<AuthSession>,
    pub router: Arc<Router>,
    pub client: EventClient,
    pub notifier: Arc<dyn Notifier>,
}

impl App {
    /// Wire the application with file-backed session storage.
    pub fn bootstrap(config: &Config) -> Result<Self> {
        let dir = config
            .resolve_storage_dir()
            .context("Failed to locate session storage")?;
        tracing::debug!(dir = %dir.display(), "Using session storage");

        let repository = Arc::new(FileSnapshotRepository::new(dir));
        let notifier = Arc::new(ConsoleNotifier::new(NotifierOptions::default()));
        Self::with_repository(config, repository, notifier)
    }

    /// Wire the application on top of any snapshot repository.
    pub fn with_repository(
        config: &Config,
        repository: Arc<dyn SnapshotRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let session = Arc::new(AuthSession::open(repository));
        let router = Arc::new(Router::new(session.clone()));
        let navigator: Arc<dyn Navigator> = router.clone();

        let http = HttpClient::builder(&config.api_url)
            .timeout(config.timeout)
            .request_middleware(BearerAuth::new(session.clone()))
            .response_middleware(UnauthorizedRedirect::new(session.clone(), navigator))
            .build()
            .context("Failed to build HTTP client")?;

        let client = EventClient::new(Arc::new(http), session.clone());

        Ok(Self {
            session,
            router,
            client,
            notifier,
        })
    }

    /// Enter the home route. `false` when the guard sent the user to login.
    pub fn enter_home(&self) -> bool {
        !matches!(self.router.push(HOME_PATH), Navigation::Redirect { .. })
    }
}
