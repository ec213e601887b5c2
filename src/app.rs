//! Application orchestrator.
//!
//! The [`App`] owns one [`AdapterPage`] (component tree plus its document) per
//! backend adapter, runs a poll loop per adapter, routes write intents to the
//! transport and owns the error banner.
//!
//! # Lifecycle
//!
//! 1. [`App::load`] fetches every adapter's metadata concurrently, then builds and
//!    mounts a tree for each one that answered. An adapter whose metadata cannot be
//!    fetched gets no page; the others carry on.
//! 2. [`App::start_polling`] spawns one loop per page: fetch values, apply them
//!    (or show the failure on the banner), sleep, repeat. The delay is measured
//!    from the end of a fetch, so ticks of one adapter never overlap.
//! 3. [`App::handle_event`] dispatches document events; a resulting write goes to
//!    [`App::put`].
//! 4. [`App::stop`] signals every loop and waits for them to finish.
//!
//! Each page sits behind a `tokio::sync::Mutex`, so an update fan-out and an event
//! on the same tree never interleave.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::banner::ErrorBanner;
use crate::config::DashboardConfig;
use crate::dom::{escape, Patch, PatchDocument, UiEvent};
use crate::error::{DashboardError, DashboardResult};
use crate::metadata;
use crate::registry::WidgetRegistry;
use crate::transport::Transport;
use crate::tree::Tree;
use crate::widgets::WriteIntent;

/// Default delay between the end of one poll and the start of the next.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(200);

/// Tree and document of one adapter.
#[derive(Debug)]
pub struct AdapterPage {
    /// Component tree built from the adapter metadata.
    pub tree: Tree,
    /// Document the tree is mounted in.
    pub document: PatchDocument,
}

/// Shared handle to a page.
pub type SharedPage = Arc<Mutex<AdapterPage>>;

/// A patch tagged with the adapter whose document it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterPatch {
    /// Adapter name.
    pub adapter: String,
    /// The patch itself.
    #[serde(flatten)]
    pub patch: Patch,
}

/// Dashboard application.
pub struct App {
    transport: Arc<dyn Transport>,
    registry: WidgetRegistry,
    pages: IndexMap<String, SharedPage>,
    banner: Arc<RwLock<ErrorBanner>>,
    delay_tx: watch::Sender<Duration>,
    stop_tx: watch::Sender<bool>,
    current: Option<String>,
    tasks: IndexMap<String, JoinHandle<()>>,
}

impl App {
    /// App over `transport` using the standard widget registry and default timings.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (delay_tx, _) = watch::channel(DEFAULT_POLL_DELAY);
        let (stop_tx, _) = watch::channel(false);
        Self {
            transport,
            registry: WidgetRegistry::standard(),
            pages: IndexMap::new(),
            banner: Arc::new(RwLock::new(ErrorBanner::default())),
            delay_tx,
            stop_tx,
            current: None,
            tasks: IndexMap::new(),
        }
    }

    /// App with the timings of `config`.
    pub fn from_config(transport: Arc<dyn Transport>, config: &DashboardConfig) -> Self {
        Self::new(transport)
            .with_poll_delay(config.poll_delay())
            .with_banner_timeout(config.banner_timeout())
    }

    /// Replace the widget registry used for trees built afterwards.
    #[must_use]
    pub fn with_registry(mut self, registry: WidgetRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the initial poll delay.
    #[must_use]
    pub fn with_poll_delay(self, delay: Duration) -> Self {
        self.delay_tx.send_replace(delay);
        self
    }

    /// Set how long banner errors stay visible.
    #[must_use]
    pub fn with_banner_timeout(mut self, timeout: Duration) -> Self {
        self.banner = Arc::new(RwLock::new(ErrorBanner::new(timeout)));
        self
    }

    /// Fetch metadata for `adapters` and build a mounted page for each that answers.
    ///
    /// Returns the number of pages built.
    pub async fn load(&mut self, adapters: &[String]) -> DashboardResult<usize> {
        let fetches = adapters
            .iter()
            .map(|adapter| self.transport.fetch_metadata(adapter));
        let results = join_all(fetches).await;

        let mut loaded = 0;
        for (adapter, result) in adapters.iter().zip(results) {
            let meta = match result {
                Ok(meta) => meta,
                Err(e) => {
                    error!(adapter = %adapter, error = %e, "Metadata fetch failed; adapter skipped");
                    continue;
                }
            };
            let name = meta
                .get("name")
                .and_then(Value::as_str)
                .map_or_else(|| metadata::humanize(adapter), str::to_owned);
            let mut tree = Tree::build(&self.registry, &name, &meta);
            let mut document = PatchDocument::new();
            tree.mount(&mut document)?;
            info!(adapter = %adapter, name = %name, "Adapter page mounted");

            self.pages.insert(
                adapter.clone(),
                Arc::new(Mutex::new(AdapterPage { tree, document })),
            );
            if self.current.is_none() {
                self.current = Some(adapter.clone());
            }
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Spawn the poll loop of every page that is not polling yet.
    pub fn start_polling(&mut self) {
        if self.tasks.is_empty() {
            self.stop_tx.send_replace(false);
        }
        for (adapter, page) in &self.pages {
            if self.tasks.contains_key(adapter) {
                debug!(adapter = %adapter, "Polling already running");
                continue;
            }
            let task = tokio::spawn(poll_loop(
                adapter.clone(),
                Arc::clone(page),
                Arc::clone(&self.transport),
                Arc::clone(&self.banner),
                self.delay_tx.subscribe(),
                self.stop_tx.subscribe(),
            ));
            self.tasks.insert(adapter.clone(), task);
        }
    }

    /// Signal every poll loop to stop and wait for them.
    pub async fn stop(&mut self) {
        self.stop_tx.send_replace(true);
        for result in join_all(self.tasks.drain(..).map(|(_, task)| task)).await {
            if let Err(e) = result {
                warn!(error = %e, "Poll task ended abnormally");
            }
        }
    }

    /// Whether poll loops are running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Change the poll delay. Takes effect at the next scheduled sleep.
    pub fn set_poll_delay(&self, delay: Duration) {
        debug!(?delay, "Poll delay changed");
        self.delay_tx.send_replace(delay);
    }

    /// Change the poll rate in updates per second.
    ///
    /// # Errors
    ///
    /// [`DashboardError::InvalidInput`] for a rate that is not a finite positive
    /// number, or so small that its delay does not fit a [`Duration`].
    pub fn set_poll_frequency(&self, hz: f64) -> DashboardResult<()> {
        let invalid = || DashboardError::InvalidInput {
            path: "poll_frequency".to_string(),
            input: hz.to_string(),
        };
        if !(hz.is_finite() && hz > 0.0) {
            return Err(invalid());
        }
        let delay = Duration::try_from_secs_f64(1.0 / hz).map_err(|_| invalid())?;
        self.set_poll_delay(delay);
        Ok(())
    }

    /// Current poll delay.
    #[must_use]
    pub fn poll_delay(&self) -> Duration {
        *self.delay_tx.borrow()
    }

    /// Adapters with a page, in load order.
    pub fn adapters(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Page of `adapter`.
    #[must_use]
    pub fn page(&self, adapter: &str) -> Option<SharedPage> {
        self.pages.get(adapter).cloned()
    }

    /// Adapter currently shown.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Show `adapter`. Polling of every adapter continues.
    pub fn set_current(&mut self, adapter: &str) -> DashboardResult<()> {
        if !self.pages.contains_key(adapter) {
            return Err(DashboardError::UnknownAdapter(adapter.to_string()));
        }
        self.current = Some(adapter.to_string());
        Ok(())
    }

    /// Shared banner state.
    #[must_use]
    pub fn banner(&self) -> Arc<RwLock<ErrorBanner>> {
        Arc::clone(&self.banner)
    }

    /// Banner text currently shown.
    pub async fn banner_text(&self) -> Option<String> {
        self.banner.read().await.current().map(str::to_owned)
    }

    /// Route a document event of `adapter` and send any resulting write.
    ///
    /// Rejected operator input is returned as an error; the write itself is
    /// fire-and-forget and reports failures on the banner.
    pub async fn handle_event(
        &self,
        adapter: &str,
        event: &UiEvent,
    ) -> DashboardResult<Option<WriteIntent>> {
        let page = self
            .page(adapter)
            .ok_or_else(|| DashboardError::UnknownAdapter(adapter.to_string()))?;
        let intent = {
            let mut page = page.lock().await;
            let AdapterPage { tree, document } = &mut *page;
            tree.dispatch(event, document)?
        };
        if let Some(intent) = &intent {
            self.put(adapter, &intent.path, &intent.value).await;
        }
        Ok(intent)
    }

    /// Write `value` to `path` of `adapter`. Failures go to the banner; no retry.
    pub async fn put(&self, adapter: &str, path: &str, value: &Value) {
        match self.transport.write_value(adapter, path, value).await {
            Ok(()) => debug!(adapter, path, %value, "Write accepted"),
            Err(e) => {
                warn!(adapter, path, error = %e, "Write failed");
                self.banner.write().await.set_error(&e.to_string());
            }
        }
    }

    /// Whole page: the banner followed by one container per adapter.
    pub async fn page_html(&self) -> String {
        let mut html = self.banner.read().await.html();
        for (adapter, page) in &self.pages {
            let active = if self.current.as_deref() == Some(adapter.as_str()) {
                " active"
            } else {
                ""
            };
            let page = page.lock().await;
            html.push_str(&format!(
                "\n<div class=\"adapter-page{active}\" id=\"adapter-{}\">\n{}\n</div>",
                escape(adapter),
                page.document.markup()
            ));
        }
        html
    }

    /// Take every pending patch of every page.
    pub async fn drain_patches(&self) -> Vec<AdapterPatch> {
        let mut patches = Vec::new();
        for (adapter, page) in &self.pages {
            let drained = page.lock().await.document.drain();
            patches.extend(drained.into_iter().map(|patch| AdapterPatch {
                adapter: adapter.clone(),
                patch,
            }));
        }
        patches
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}

async fn poll_loop(
    adapter: String,
    page: SharedPage,
    transport: Arc<dyn Transport>,
    banner: Arc<RwLock<ErrorBanner>>,
    delay_rx: watch::Receiver<Duration>,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!(adapter = %adapter, "Polling started");
    loop {
        if *stop_rx.borrow() {
            break;
        }

        match transport.fetch_values(&adapter).await {
            Ok(values) => {
                let mut page = page.lock().await;
                let AdapterPage { tree, document } = &mut *page;
                if let Err(e) = tree.apply_update(&values, document) {
                    warn!(adapter = %adapter, error = %e, "Update not applied");
                }
            }
            Err(e) => {
                warn!(adapter = %adapter, error = %e, "Value fetch failed");
                banner.write().await.set_error(&e.to_string());
            }
        }

        let delay = *delay_rx.borrow();
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            () = tokio::time::sleep(delay) => {}
        }
    }
    info!(adapter = %adapter, "Polling stopped");
}
