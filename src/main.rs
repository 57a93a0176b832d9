use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use rxkcd::app::{self, App};
use rxkcd::attributes;
use rxkcd::config::Config;
use rxkcd::gateway::HttpGateway;
use rxkcd::{Mode, Reconciler, SelectionState};

/// Shows the latest xkcd, or a chosen one, in the terminal
#[derive(Parser, Debug)]
#[command(name = "rxkcd", version, about)]
struct Cli {
    /// Pin a specific comic number
    #[arg(long, conflicts_with = "latest")]
    comic: Option<String>,

    /// Always show the most recent comic
    #[arg(long)]
    latest: bool,

    /// Where widget attributes are stored
    #[arg(long)]
    state: Option<PathBuf>,

    /// Print the comic as HTML and exit
    #[arg(long)]
    print: bool,
}

fn init_logging() {
    // Log to /tmp/rxkcd.log when RXKCD_DEBUG=1..3 (1=warn, 2=info, 3=debug)
    let debug_level = std::env::var("RXKCD_DEBUG")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(0);

    if debug_level > 0 {
        let level = match debug_level {
            1 => tracing::Level::WARN,
            2 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        };

        let file_appender = tracing_appender::rolling::never(std::env::temp_dir(), "rxkcd.log");
        tracing_subscriber::fmt()
            .with_writer(file_appender)
            .with_max_level(level)
            .with_ansi(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::load();

    let attributes_path = cli.state.clone().unwrap_or_else(attributes::default_path);
    let attrs = match attributes::load(&attributes_path) {
        Ok(attrs) => attrs,
        Err(e) => {
            tracing::warn!(error = %e, "starting from default widget attributes");
            Default::default()
        }
    };

    let mut state = SelectionState::from(attrs);
    if cli.latest {
        state.set_mode(Mode::FollowLatest);
    }
    if let Some(raw) = &cli.comic {
        state.select_number(raw).context("Invalid --comic value")?;
    }

    let reconciler = Reconciler::new(state, config.refresh_interval);
    let gateway = HttpGateway::new(config.api_url.clone(), config.timeout);

    if cli.print {
        let mut reconciler = reconciler;
        println!("{}", app::render_once(&gateway, &mut reconciler, chrono::Utc::now()).await);
        return Ok(());
    }

    run_tui(reconciler, gateway, config, attributes_path).await
}

async fn run_tui(
    reconciler: Reconciler,
    gateway: HttpGateway,
    config: Config,
    attributes_path: PathBuf,
) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut app = App::new(reconciler, config.theme, Some(attributes_path), action_tx);
    tokio::spawn(app::run_network_loop(Arc::new(gateway), action_rx, event_tx.clone()));
    tokio::spawn(app::run_config_watcher(event_tx));

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    app.on_tick(None, chrono::Utc::now());

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|f| rxkcd::ui::draw(f, &app)) {
            break Err(e.into());
        }
        let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or(Duration::ZERO);
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key.code) {
                        break Ok(());
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }
        while let Ok(e) = event_rx.try_recv() {
            app.on_tick(Some(e), chrono::Utc::now());
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick(None, chrono::Utc::now());
            last_tick = Instant::now();
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}
