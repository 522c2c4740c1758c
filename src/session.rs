//! Fetch-then-layout lifecycle of one process graph view.
//!
//! Each fetch carries the generation it was started under. Only the latest
//! generation may replace the view state, so a slow response to a superseded
//! request cannot overwrite a newer one.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::client::ApiClient;
use crate::config::LayoutConfig;
use crate::layout::{Layout, compute_layout};
use crate::model::{GraphPayload, Toggles};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// No data yet for the current generation.
    Loading,
    /// The fetch failed; the message is shown as-is.
    Failed(String),
    Ready(Layout),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    toggles: Toggles,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }
}

#[derive(Debug)]
struct ViewInner {
    toggles: Toggles,
    state: ViewState,
}

#[derive(Debug)]
pub struct GraphView {
    process_id: i64,
    config: LayoutConfig,
    generation: AtomicU64,
    inner: Mutex<ViewInner>,
}

impl GraphView {
    pub fn new(process_id: i64, toggles: Toggles, config: LayoutConfig) -> Self {
        Self {
            process_id,
            config,
            generation: AtomicU64::new(0),
            inner: Mutex::new(ViewInner {
                toggles,
                state: ViewState::Loading,
            }),
        }
    }

    pub fn process_id(&self) -> i64 {
        self.process_id
    }

    pub fn toggles(&self) -> Toggles {
        self.lock().toggles
    }

    pub fn state(&self) -> ViewState {
        self.lock().state.clone()
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Starts a new generation; any fetch still in flight becomes stale.
    pub fn begin_fetch(&self) -> FetchTicket {
        let mut inner = self.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        inner.state = ViewState::Loading;
        FetchTicket {
            generation,
            toggles: inner.toggles,
        }
    }

    /// Replaces the toggles and starts the generation that refetches with them.
    pub fn set_toggles(&self, toggles: Toggles) -> FetchTicket {
        self.lock().toggles = toggles;
        self.begin_fetch()
    }

    /// Applies a fetch result. Returns false when the ticket is stale and the
    /// result was dropped.
    pub fn complete<E: Display>(&self, ticket: FetchTicket, result: Result<GraphPayload, E>) -> bool {
        let mut inner = self.lock();
        let current = self.generation.load(Ordering::SeqCst);
        if ticket.generation != current {
            tracing::debug!(
                process_id = self.process_id,
                stale = ticket.generation,
                current,
                "dropping superseded graph fetch"
            );
            return false;
        }
        inner.state = match result {
            Ok(payload) => ViewState::Ready(compute_layout(&payload, ticket.toggles, &self.config)),
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(process_id = self.process_id, error = %message, "graph fetch failed");
                ViewState::Failed(message)
            }
        };
        true
    }

    /// One fetch of the graph for the current toggles. Failures are stored,
    /// not retried.
    pub async fn refresh(&self, client: &ApiClient) -> ViewState {
        let ticket = self.begin_fetch();
        let result = client.fetch_graph(self.process_id, ticket.toggles).await;
        self.complete(ticket, result);
        self.state()
    }

    fn lock(&self) -> MutexGuard<'_, ViewInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
