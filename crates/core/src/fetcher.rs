// crates/core/src/fetcher.rs
//! The panel data fetcher: one instance per hosted panel.
//!
//! Composes the substitutor, the clause rewriter, the refresh controller,
//! and the request slot around a query transport, and owns the panel's
//! visual state. All locking is short std-mutex critical sections; nothing
//! is held across an await.

use std::sync::{Arc, Mutex, MutexGuard};

use houseview_types::{
    ColumnMeta, PaginationMode, PanelDescriptor, PanelVisualState, QuerySettings, RefreshOptions,
    ResultSet, Row, SortSpec,
};

use crate::error::PanelError;
use crate::refresh::{RefreshController, RefreshDecision};
use crate::shape::{self, PanelData};
use crate::slot::RequestSlot;
use crate::sqlrw::{apply_limit_offset, replace_order_by};
use crate::timespan::substitute_time_span;
use crate::transport::QueryTransport;
use crate::visibility::VisibilityProvider;

/// Placeholder for the panel's free-text filter input.
const FILTER_TOKEN: &str = "{filter:String}";

/// What a refresh entry point ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fetch ran; its result (rows or error) is in the visual state.
    Fetched,
    /// Skipped: identical to the last executed refresh.
    Deduplicated,
    /// Parked until the panel is expanded and in view.
    Deferred,
    /// The event changed no state.
    Idle,
}

/// Result rows plus the bookkeeping a later page or re-sort needs.
struct Inner {
    visual: PanelVisualState,
    meta: Vec<ColumnMeta>,
    sort: Option<SortSpec>,
    page: u32,
    has_more_pages: bool,
    last_options: Option<RefreshOptions>,
}

pub struct PanelFetcher {
    descriptor: PanelDescriptor,
    transport: Arc<dyn QueryTransport>,
    settings: QuerySettings,
    timezone: String,
    controller: Mutex<RefreshController>,
    slot: RequestSlot,
    inner: Mutex<Inner>,
}

impl PanelFetcher {
    pub fn new(
        descriptor: PanelDescriptor,
        transport: Arc<dyn QueryTransport>,
        settings: QuerySettings,
        timezone: impl Into<String>,
        visibility: Arc<dyn VisibilityProvider>,
    ) -> Self {
        let sort = descriptor.default_sort.clone();
        Self {
            descriptor,
            transport,
            settings,
            timezone: timezone.into(),
            controller: Mutex::new(RefreshController::new(visibility)),
            slot: RequestSlot::new(),
            inner: Mutex::new(Inner {
                visual: PanelVisualState::default(),
                meta: Vec::new(),
                sort,
                page: 0,
                has_more_pages: false,
                last_options: None,
            }),
        }
    }

    pub fn descriptor(&self) -> &PanelDescriptor {
        &self.descriptor
    }

    /// Snapshot of the panel's visual state.
    pub fn visual_state(&self) -> PanelVisualState {
        self.inner().visual.clone()
    }

    pub fn has_more_pages(&self) -> bool {
        self.inner().has_more_pages
    }

    pub fn current_page(&self) -> u32 {
        self.inner().page
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.inner().sort.clone()
    }

    /// Shape the fetched rows for this panel's kind. `None` until a fetch
    /// has delivered data.
    pub fn shaped(&self) -> Option<Result<PanelData, PanelError>> {
        let inner = self.inner();
        let rows = inner.visual.data.as_ref()?;
        let rs = ResultSet {
            meta: inner.meta.clone(),
            data: rows.clone(),
            rows: Some(rows.len() as u64),
            statistics: None,
        };
        // Server-mode rows arrive pre-sorted by SQL; only client mode sorts
        // in memory.
        let sort = match self.descriptor.pagination {
            PaginationMode::Client => inner.sort.clone(),
            PaginationMode::Server => None,
        };
        drop(inner);
        Some(shape::shape(
            self.descriptor.kind,
            &rs,
            &self.descriptor.hints,
            sort.as_ref(),
        ))
    }

    /// Ask for a refresh. Dedup, force bypass, and deferral semantics live
    /// in the [`RefreshController`]; this only acts on its decision.
    pub async fn request_refresh(&self, options: RefreshOptions) -> RefreshOutcome {
        let decision = self.controller().request_refresh(options);
        self.act(decision).await
    }

    /// Collapse or expand the panel.
    pub async fn set_collapsed(&self, collapsed: bool) -> RefreshOutcome {
        self.inner().visual.is_collapsed = collapsed;
        let decision = self.controller().set_collapsed(collapsed);
        self.act(decision).await
    }

    /// The host reports the panel's node entered the viewport.
    pub async fn notify_in_view(&self) -> RefreshOutcome {
        let decision = self.controller().notify_in_view();
        self.act(decision).await
    }

    /// Fetch the next server-mode page and append its rows.
    pub async fn fetch_next_page(&self) -> Result<RefreshOutcome, PanelError> {
        if self.descriptor.pagination != PaginationMode::Server {
            return Err(PanelError::Config(
                "Panel is not server-paginated".to_string(),
            ));
        }
        let (options, page) = {
            let inner = self.inner();
            if !inner.has_more_pages {
                return Ok(RefreshOutcome::Idle);
            }
            (inner.last_options.clone().unwrap_or_default(), inner.page + 1)
        };
        self.run_fetch(options, page, true).await;
        Ok(RefreshOutcome::Fetched)
    }

    /// Change the sort. Server mode re-queries from page zero (the order
    /// lives in SQL); client mode re-sorts in memory at shaping time.
    pub async fn set_sort(&self, sort: Option<SortSpec>) -> RefreshOutcome {
        let last = {
            let mut inner = self.inner();
            inner.sort = sort;
            inner.last_options.clone()
        };
        match (self.descriptor.pagination, last) {
            (PaginationMode::Server, Some(options)) => {
                // Sort is not part of the options cache key, so force past
                // dedup.
                self.request_refresh(options.forced()).await
            }
            _ => RefreshOutcome::Idle,
        }
    }

    /// Cancel any in-flight request (panel removal).
    pub fn abort(&self) {
        self.slot.abort();
    }

    async fn act(&self, decision: RefreshDecision) -> RefreshOutcome {
        match decision {
            RefreshDecision::Execute(options) => {
                self.run_fetch(options, 0, false).await;
                RefreshOutcome::Fetched
            }
            RefreshDecision::Deferred => RefreshOutcome::Deferred,
            RefreshDecision::Deduplicated => RefreshOutcome::Deduplicated,
            RefreshDecision::Idle => RefreshOutcome::Idle,
        }
    }

    fn build_sql(&self, options: &RefreshOptions, page: u32) -> Result<String, PanelError> {
        let template = self
            .descriptor
            .query
            .as_deref()
            .ok_or_else(PanelError::no_query)?;
        let mut sql = substitute_time_span(
            template,
            options.selected_time_span.as_ref(),
            &self.timezone,
        )?;
        if sql.contains(FILTER_TOKEN) {
            let literal = quote_literal(options.input_filter.as_deref().unwrap_or(""));
            sql = sql.replace(FILTER_TOKEN, &literal);
        }
        if self.descriptor.pagination == PaginationMode::Server {
            if let Some(sort) = self.inner().sort.clone() {
                sql = replace_order_by(&sql, Some(&sort.column), Some(sort.direction));
            }
            let page_size = u64::from(self.descriptor.page_size);
            sql = apply_limit_offset(&sql, page_size, u64::from(page) * page_size);
        }
        Ok(sql)
    }

    async fn run_fetch(&self, options: RefreshOptions, page: u32, append: bool) {
        let sql = match self.build_sql(&options, page) {
            Ok(sql) => sql,
            Err(err) => {
                // Configuration errors surface without a network round-trip.
                tracing::warn!(panel = %self.descriptor.id, error = %err, "panel misconfigured");
                let mut inner = self.inner();
                inner.visual.error = Some(err.to_string());
                inner.visual.is_loading = false;
                self.controller().settle();
                return;
            }
        };

        let token = self.slot.begin();
        {
            let mut inner = self.inner();
            inner.visual.is_loading = true;
            inner.visual.error = None;
        }

        tracing::debug!(
            panel = %self.descriptor.id,
            kind = self.descriptor.kind.as_str(),
            transport = self.transport.name(),
            page,
            "issuing query"
        );
        let pending = self.transport.query(&sql, &self.settings);
        let abort = pending.abort.clone();

        let result = tokio::select! {
            _ = token.cancelled() => {
                abort.cancel();
                // Superseded or removed. If nothing else is in flight the
                // panel is no longer loading; a successor owns the flag
                // otherwise.
                if !self.slot.has_live() {
                    self.inner().visual.is_loading = false;
                }
                return;
            }
            result = pending.response => result,
        };

        // The token can have been cancelled while the response settled.
        if token.is_cancelled() {
            tracing::debug!(panel = %self.descriptor.id, "discarding superseded response");
            return;
        }
        self.slot.finish(&token);

        let outcome = result
            .map_err(PanelError::from)
            .and_then(|response| response.result_set().map_err(PanelError::from));

        let mut inner = self.inner();
        match outcome {
            Ok(rs) => {
                let fetched = rs.data.len();
                self.apply_rows(&mut inner, rs, page, append);
                inner.last_options = Some(options);
                inner.visual.error = None;
                tracing::debug!(panel = %self.descriptor.id, rows = fetched, page, "query complete");
            }
            Err(err) if err.is_cancellation() => {
                tracing::debug!(panel = %self.descriptor.id, "query cancelled");
            }
            Err(err) => {
                tracing::warn!(panel = %self.descriptor.id, error = %err, "query failed");
                inner.visual.error = Some(err.to_string());
            }
        }
        inner.visual.is_loading = false;
        drop(inner);
        self.controller().settle();
    }

    fn apply_rows(&self, inner: &mut MutexGuard<'_, Inner>, rs: ResultSet, page: u32, append: bool) {
        let page_rows: Vec<Row> = rs.data;
        if self.descriptor.pagination == PaginationMode::Server {
            inner.has_more_pages = page_rows.len() as u64 == u64::from(self.descriptor.page_size);
        } else {
            inner.has_more_pages = false;
        }
        inner.page = page;
        if !rs.meta.is_empty() || !append {
            inner.meta = rs.meta;
        }
        match (&mut inner.visual.data, append) {
            (Some(existing), true) => existing.extend(page_rows),
            (slot, _) => *slot = Some(page_rows),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("panel fetcher lock")
    }

    fn controller(&self) -> MutexGuard<'_, RefreshController> {
        self.controller.lock().expect("refresh controller lock")
    }
}

/// Single-quote a string literal for interpolation into SQL.
fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}
