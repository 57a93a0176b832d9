use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use ratatui::style::Color;
use tokio::sync::mpsc;

use crate::attributes::{self, WidgetAttributes};
use crate::comic::{Comic, ComicId};
use crate::config;
use crate::error::ComicError;
use crate::gateway::ComicGateway;
use crate::reconcile::{Applied, Reconciler, View};
use crate::selection::Mode;
use crate::ui;

pub const LOAD_FAILED: &str = "Comic couldn't be loaded";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Fetch(ComicId),
}

#[derive(Debug)]
pub enum NetworkEvent {
    Fetched {
        id: ComicId,
        result: Result<Comic, ComicError>,
    },
    ThemeUpdate(Color),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Comic,
    Settings,
    EditingNumber,
}

#[derive(Debug)]
pub struct App {
    pub panel: Panel,
    pub input: String,
    pub theme: Color,
    pub notice: Option<String>,
    pub reconciler: Reconciler,
    attributes_path: Option<PathBuf>,
    dirty: bool,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        reconciler: Reconciler,
        theme: Color,
        attributes_path: Option<PathBuf>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            panel: Panel::Comic,
            input: String::new(),
            theme,
            notice: None,
            reconciler,
            attributes_path,
            dirty: false,
            action_tx,
        }
    }

    /// Applies a network event, if any, then lets the reconciler issue the
    /// fetches it needs.
    pub fn on_tick(&mut self, event: Option<NetworkEvent>, now: DateTime<Utc>) {
        if let Some(network_event) = event {
            match network_event {
                NetworkEvent::Fetched { id, result } => match self.reconciler.apply(id, result, now) {
                    Ok(Applied::Loaded(_)) => {
                        self.notice = None;
                        self.dirty = true;
                    }
                    // a bound-only update must not hide a failed load
                    Ok(Applied::BoundUpdated(_)) => self.dirty = true,
                    Ok(Applied::Discarded) => {}
                    Err(err) => self.notice = Some(format!("{LOAD_FAILED}: {err}")),
                },
                NetworkEvent::ThemeUpdate(color) => self.theme = color,
            }
        }

        for id in self.reconciler.evaluate(now) {
            let _ = self.action_tx.send(Action::Fetch(id));
        }
        self.persist();
    }

    /// Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.panel {
            Panel::EditingNumber => match key {
                KeyCode::Esc => {
                    self.input.clear();
                    self.panel = Panel::Settings;
                }
                KeyCode::Enter => {
                    match self.reconciler.select_number(&self.input) {
                        Ok(number) => {
                            tracing::info!(number, "comic pinned");
                            self.notice = None;
                            self.dirty = true;
                        }
                        Err(err) => self.notice = Some(err.to_string()),
                    }
                    self.input.clear();
                    self.panel = Panel::Settings;
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => self.input.push(c),
                _ => {}
            },
            Panel::Settings => match key {
                KeyCode::Char('q') => return true,
                KeyCode::Esc | KeyCode::Char('s') => self.panel = Panel::Comic,
                KeyCode::Char('t') | KeyCode::Char(' ') => self.toggle_mode(),
                KeyCode::Char('e') | KeyCode::Enter => self.start_editing(),
                _ => {}
            },
            Panel::Comic => match key {
                KeyCode::Char('q') => return true,
                KeyCode::Char('s') => self.panel = Panel::Settings,
                KeyCode::Char('t') => self.toggle_mode(),
                KeyCode::Char('e') => self.start_editing(),
                _ => {}
            },
        }
        self.persist();
        false
    }

    fn toggle_mode(&mut self) {
        self.reconciler.toggle_mode();
        self.notice = None;
        tracing::info!(mode = ?self.reconciler.state().mode, "mode toggled");
        self.dirty = true;
    }

    fn start_editing(&mut self) {
        if self.reconciler.state().mode == Mode::Pinned {
            self.input.clear();
            self.panel = Panel::EditingNumber;
        }
    }

    fn persist(&mut self) {
        if !std::mem::take(&mut self.dirty) {
            return;
        }
        if let Some(path) = &self.attributes_path {
            let attrs = WidgetAttributes::from(self.reconciler.state());
            if let Err(e) = attributes::save(path, &attrs) {
                tracing::error!(error = %e, "failed to save widget attributes");
            }
        }
    }
}

/// Runs fetches as they are requested, each on its own task.
pub async fn run_network_loop<G: ComicGateway>(
    gateway: Arc<G>,
    mut action_rx: mpsc::UnboundedReceiver<Action>,
    event_tx: mpsc::UnboundedSender<NetworkEvent>,
) {
    while let Some(action) = action_rx.recv().await {
        let gateway = Arc::clone(&gateway);
        let event_tx = event_tx.clone();

        tokio::spawn(async move {
            match action {
                Action::Fetch(id) => {
                    let result = gateway.fetch(id).await;
                    let _ = event_tx.send(NetworkEvent::Fetched { id, result });
                }
            }
        });
    }
}

pub async fn run_config_watcher(event_tx: mpsc::UnboundedSender<NetworkEvent>) {
    let mut last_color = config::load_theme();
    let mut interval = tokio::time::interval(Duration::from_secs(1));

    loop {
        interval.tick().await;
        let new_color = config::load_theme();
        if new_color != last_color {
            last_color = new_color;
            if event_tx.send(NetworkEvent::ThemeUpdate(new_color)).is_err() {
                break;
            }
        }
    }
}

/// One-shot render without a terminal: settle the effective target once and
/// return its markup, or the failure text.
pub async fn render_once<G: ComicGateway>(
    gateway: &G,
    reconciler: &mut Reconciler,
    now: DateTime<Utc>,
) -> String {
    for id in reconciler.evaluate(now) {
        let result = gateway.fetch(id).await;
        if let Err(err) = reconciler.apply(id, result, now) {
            tracing::warn!(%id, error = %err, "headless fetch failed");
        }
    }

    match reconciler.view() {
        View::Comic { title, image_url, alt_text } => ui::markup(title, image_url, alt_text),
        View::Loading => LOAD_FAILED.to_string(),
    }
}
