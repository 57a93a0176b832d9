//! Decides, tick by tick, which fetches to issue and how their results change
//! the selection.
//!
//! The reconciler never performs IO. `evaluate` hands out the ids that need
//! fetching; the caller runs them however it likes and reports back through
//! `apply`. Results that no longer match the current target are dropped on
//! arrival, which is the only cancellation there is.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};

use crate::comic::{Comic, ComicId};
use crate::error::ComicError;
use crate::selection::{Mode, SelectionState, resolve_target};

pub const DEFAULT_REFRESH_INTERVAL: TimeDelta = TimeDelta::seconds(60);

/// Whether the upper bound should be queried again.
///
/// A timestamp ahead of `now` (clock change, file from another machine)
/// counts as due.
pub fn refresh_due(last: Option<DateTime<Utc>>, now: DateTime<Utc>, interval: TimeDelta) -> bool {
    match last {
        None => true,
        Some(last) if last > now => true,
        Some(last) => now - last >= interval,
    }
}

/// What a successful `apply` did to the state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The comic is now the one on display.
    Loaded(u32),
    /// Only the known latest number moved (or was confirmed).
    BoundUpdated(u32),
    /// The response no longer matched the target and was thrown away.
    Discarded,
}

/// What the presentation layer should draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View<'a> {
    Loading,
    Comic {
        title: &'a str,
        image_url: &'a str,
        alt_text: &'a str,
    },
}

#[derive(Debug)]
pub struct Reconciler {
    state: SelectionState,
    interval: TimeDelta,
    in_flight: HashSet<ComicId>,
    last_refresh_attempt: Option<DateTime<Utc>>,
    failed_load: Option<(ComicId, DateTime<Utc>)>,
}

impl Reconciler {
    pub fn new(state: SelectionState, interval: TimeDelta) -> Self {
        Self {
            state,
            interval,
            in_flight: HashSet::new(),
            last_refresh_attempt: None,
            failed_load: None,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn target(&self) -> ComicId {
        resolve_target(&self.state)
    }

    pub fn is_in_flight(&self, id: ComicId) -> bool {
        self.in_flight.contains(&id)
    }

    /// Returns the fetches to start now and marks them in flight.
    pub fn evaluate(&mut self, now: DateTime<Utc>) -> Vec<ComicId> {
        let mut issue = Vec::new();

        let persisted = self.state.last_refreshed_at.filter(|at| *at <= now);
        let last_refresh = persisted.max(self.last_refresh_attempt);
        if refresh_due(last_refresh, now, self.interval) && !self.is_in_flight(ComicId::Latest) {
            tracing::debug!(?last_refresh, "refreshing latest comic number");
            issue.push(ComicId::Latest);
        }

        let target = self.target();
        let satisfied = self
            .state
            .loaded_comic
            .as_ref()
            .is_some_and(|comic| target.matches(comic, self.state.known_latest));
        let backing_off = self
            .failed_load
            .is_some_and(|(id, at)| id == target && !refresh_due(Some(at), now, self.interval));

        if !satisfied && !backing_off && !self.is_in_flight(target) && !issue.contains(&target) {
            issue.push(target);
        }

        for id in &issue {
            if *id == ComicId::Latest {
                self.last_refresh_attempt = Some(now);
            }
            tracing::info!(%id, "fetch issued");
            self.in_flight.insert(*id);
        }
        issue
    }

    /// Folds a finished fetch back into the state.
    ///
    /// On error nothing but the failure bookkeeping changes, and the error is
    /// returned for display.
    pub fn apply(
        &mut self,
        id: ComicId,
        result: Result<Comic, ComicError>,
        now: DateTime<Utc>,
    ) -> Result<Applied, ComicError> {
        self.in_flight.remove(&id);

        let comic = match result {
            Ok(comic) => comic,
            Err(err) => {
                tracing::warn!(%id, error = %err, "fetch failed");
                self.mark_failed(id, now);
                return Err(err);
            }
        };

        if id == ComicId::Latest && !self.state.raise_known_latest(comic.identifier, now) {
            let err = ComicError::Regression {
                known: self.state.known_latest.unwrap_or_default(),
                reported: comic.identifier,
            };
            tracing::warn!(error = %err, "ignoring regressed latest comic");
            self.mark_failed(id, now);
            return Err(err);
        }

        let target = self.target();
        let wanted = match target {
            ComicId::Latest => id == ComicId::Latest,
            ComicId::Number(n) => n == comic.identifier,
        };

        if wanted {
            let number = comic.identifier;
            tracing::info!(number, title = %comic.title, "comic loaded");
            self.state.loaded_comic = Some(comic);
            self.failed_load = None;
            Ok(Applied::Loaded(number))
        } else if id == ComicId::Latest {
            tracing::debug!(latest = comic.identifier, "latest comic number updated");
            Ok(Applied::BoundUpdated(comic.identifier))
        } else {
            tracing::debug!(%id, %target, "discarding stale response");
            Ok(Applied::Discarded)
        }
    }

    pub fn select_number(&mut self, raw: &str) -> Result<u32, ComicError> {
        let number = self.state.select_number(raw)?;
        self.failed_load = None;
        Ok(number)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.state.mode != mode {
            self.state.set_mode(mode);
            self.failed_load = None;
        }
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.state.mode.toggled());
    }

    pub fn view(&self) -> View<'_> {
        match &self.state.loaded_comic {
            Some(comic) if self.target().matches(comic, self.state.known_latest) => View::Comic {
                title: &comic.title,
                image_url: &comic.image_url,
                alt_text: &comic.alt_text,
            },
            _ => View::Loading,
        }
    }

    fn mark_failed(&mut self, id: ComicId, now: DateTime<Utc>) {
        if id == ComicId::Latest {
            self.last_refresh_attempt = Some(now);
        }
        if id == self.target() {
            self.failed_load = Some((id, now));
        }
    }
}
