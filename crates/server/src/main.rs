mod arena;
mod config;
mod events;
mod server;
mod simulation;
mod tui;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use holdpoint::{ReplicationMode, Team};

use config::ServerConfig;
use events::ServerEvent;
use server::MatchServer;
use tui::TuiState;

#[derive(Parser)]
#[command(name = "holdpoint-server")]
#[command(about = "Local control point match with replicated observers")]
struct Args {
    #[arg(short, long, help = "TOML config file; flags override it")]
    config: Option<PathBuf>,

    #[arg(short, long)]
    tick_rate: Option<u32>,

    #[arg(short, long)]
    bots: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_parser = parse_mode, help = "snapshot or delta")]
    mode: Option<ReplicationMode>,

    #[arg(long, help = "Full resync every N ticks")]
    resync_interval: Option<u32>,

    #[arg(long, help = "Keep occupancy of players who leave without exiting")]
    keep_occupancy_on_leave: bool,

    #[arg(long)]
    headless: bool,

    #[arg(long, help = "Stop after this many seconds")]
    duration_secs: Option<u64>,

    #[arg(long, help = "Enable delivery fault simulation")]
    simulate_faults: bool,

    #[arg(long, help = "Packet loss percentage (0-100)")]
    loss_percent: Option<f32>,

    #[arg(long, help = "Duplicate delivery percentage (0-100)")]
    duplicate_percent: Option<f32>,

    #[arg(long, help = "Out of order delivery percentage (0-100)")]
    reorder_percent: Option<f32>,
}

fn parse_mode(value: &str) -> Result<ReplicationMode, String> {
    match value {
        "snapshot" => Ok(ReplicationMode::Snapshot),
        "delta" => Ok(ReplicationMode::Delta),
        other => Err(format!("unknown replication mode '{}'", other)),
    }
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };

        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate = tick_rate;
        }
        if let Some(bots) = self.bots {
            config.bots = bots;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(mode) = self.mode {
            config.game.replication_mode = mode;
        }
        if let Some(interval) = self.resync_interval {
            config.game.resync_interval_ticks = Some(interval);
        }
        if self.keep_occupancy_on_leave {
            config.game.purge_occupancy_on_leave = false;
        }
        if self.simulate_faults {
            config.delivery.enabled = true;
        }
        if let Some(loss) = self.loss_percent {
            config.delivery.loss_percent = loss;
        }
        if let Some(duplicate) = self.duplicate_percent {
            config.delivery.duplicate_percent = duplicate;
        }
        if let Some(reorder) = self.reorder_percent {
            config.delivery.reorder_percent = reorder;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let headless = args.headless;
    let limit = args.duration_secs.map(Duration::from_secs);
    let config = args.into_config()?;

    if headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut server = MatchServer::new(config);

    if headless {
        log::info!("Match started");
        server.run(limit);
        let stats = server.stats();
        log::info!(
            "Match over at tick {}: red {} blue {} ({} applied, {} stale, {} dropped)",
            stats.tick,
            stats.scores.red,
            stats.scores.blue,
            stats.received.packets_applied,
            stats.received.stale_ignored,
            stats.hub.packets_dropped
        );
    } else {
        run_with_tui(&mut server, limit)?;
    }

    Ok(())
}

fn run_with_tui(server: &mut MatchServer, limit: Option<Duration>) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let running = server.running();
    let mut tui_state = TuiState::new();
    tui_state.log_info("Match started");

    while running.load(Ordering::SeqCst) {
        server.tick_once();

        for event in server.drain_events() {
            match event {
                ServerEvent::Error { .. } => tui_state.log_error(event.describe()),
                ServerEvent::Diverged { .. } => tui_state.log_warn(event.describe()),
                _ => tui_state.log_info(event.describe()),
            }
        }

        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::SeqCst);
                        }
                        KeyCode::Char('+') => server.add_bot(),
                        KeyCode::Char('-') => server.remove_bot(),
                        KeyCode::Char('f') | KeyCode::Char('F') => {
                            let enabled = server.toggle_faults();
                            tui_state.log_warn(format!(
                                "Delivery faults {}",
                                if enabled { "on" } else { "off" }
                            ));
                        }
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        _ => {}
                    }
                }
            }
        }

        let stats = server.stats();
        if limit.is_some_and(|limit| stats.uptime_secs >= limit.as_secs()) {
            running.store(false, Ordering::SeqCst);
        }

        let control_points = server.control_points();
        let red = server.team_players(Team::Red);
        let blue = server.team_players(Team::Blue);
        let view = tui::View {
            stats: &stats,
            control_points: &control_points,
            red: &red,
            blue: &blue,
        };
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &view);
        })?;
    }

    server.shutdown();

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
