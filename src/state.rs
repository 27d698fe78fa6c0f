use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::drive::{self, DriveClient, DriveError, RemoteStore};
use crate::error::{self, Context};
use crate::extract::Extractor;
use crate::index::{self, IndexStore, Snapshot};
use crate::notify::{ChatNotifier, Notifier};

pub struct Shared {
    store: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    extractor: Extractor,
    index: IndexStore,
    root_folder: String,
    bearer_token: Option<String>,
    request_timeout: Duration,
    assets: PathBuf,
    sync: config::Sync,
}

pub type ArcShared = Arc<Shared>;

impl Shared {
    pub async fn from_config(config: &config::Config) -> error::Result<Shared> {
        tracing::debug!("creating Shared state");

        let settings = &config.settings;

        let credentials = settings.drive.credentials.as_deref()
            .context("missing drive credentials")?;
        let key = drive::auth::parse_credentials(credentials)?;
        let client = DriveClient::new(key, settings.drive.timeout).await?;

        let notifier = ChatNotifier::from_settings(&settings.notify)
            .map_err(|err| error::Error::from(err).message("failed to create notification client"))?;

        Ok(Shared::new(
            Arc::new(client),
            Arc::new(notifier),
            settings,
        ))
    }

    pub fn new(
        store: Arc<dyn RemoteStore>,
        notifier: Arc<dyn Notifier>,
        settings: &config::Settings,
    ) -> Shared {
        if settings.http.bearer_token.is_none() {
            tracing::warn!("no bearer token configured. every gated request will be rejected");
        }

        Shared {
            store,
            notifier,
            extractor: Extractor::from_settings(&settings.ocr),
            index: IndexStore::new(),
            root_folder: settings.drive.root_folder.clone(),
            bearer_token: settings.http.bearer_token.clone(),
            request_timeout: settings.http.timeout,
            assets: settings.assets.clone(),
            sync: config::Sync {
                poll: settings.sync.poll,
                notify_limit: settings.sync.notify_limit,
            },
        }
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    pub fn root_folder(&self) -> &str {
        &self.root_folder
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn assets(&self) -> &Path {
        &self.assets
    }

    pub fn sync(&self) -> &config::Sync {
        &self.sync
    }

    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, DriveError> {
        self.index.get_or_build(|| index::build(self.store(), &self.root_folder)).await
    }
}
