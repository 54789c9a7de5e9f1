use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use holdpoint::{ControlPointState, PlayerId, Team};

use crate::server::{ControlPointView, MatchStats};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Default)]
pub struct TuiState {
    logs: VecDeque<LogEntry>,
    scroll: usize,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            logs: VecDeque::with_capacity(MAX_LOG_LINES),
            scroll: 0,
        }
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        if self.logs.len() == MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry { level, message });
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 5).min(self.logs.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(5);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    /// Newest-last window of `height` entries, offset by the scroll position.
    pub fn visible_logs(&self, height: usize) -> impl Iterator<Item = &LogEntry> {
        let end = self.logs.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        self.logs.range(start..end)
    }
}

pub struct View<'a> {
    pub stats: &'a MatchStats,
    pub control_points: &'a [ControlPointView],
    pub red: &'a [PlayerId],
    pub blue: &'a [PlayerId],
}

pub fn render(frame: &mut Frame, state: &TuiState, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(view.control_points.len() as u16 + 2),
            Constraint::Length(6),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], view.stats);
    render_sync(frame, chunks[1], view.stats);
    render_control_points(frame, chunks[2], view);
    render_teams_and_network(frame, chunks[3], view);
    render_log(frame, chunks[4], state);
    render_help(frame, chunks[5]);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &MatchStats) {
    let title = format!(" Holdpoint - Uptime: {} ", format_duration(stats.uptime_secs));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = Line::from(vec![
        Span::raw(format!("Tick: {}  |  Mode: {:?}  |  Score ", stats.tick, stats.mode)),
        Span::styled(
            format!("{}", stats.scores.red),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" : "),
        Span::styled(
            format!("{}", stats.scores.blue),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  |  Pending signals: {}", stats.queue_len)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_sync(frame: &mut Frame, area: Rect, stats: &MatchStats) {
    let block = Block::default()
        .title(" Replicas in sync ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let ratio = if stats.replica_count == 0 {
        1.0
    } else {
        stats.in_sync as f64 / stats.replica_count as f64
    };
    let color = if ratio < 1.0 { Color::Yellow } else { Color::Green };
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color))
        .ratio(ratio.min(1.0))
        .label(format!("{}/{}", stats.in_sync, stats.replica_count));

    frame.render_widget(gauge, area);
}

fn render_control_points(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default()
        .title(" Control points ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines: Vec<Line> = view
        .control_points
        .iter()
        .map(|cp| {
            Line::from(vec![
                Span::styled(format!("#{:<3}", cp.id), Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("{:<16}", cp.state.as_str()),
                    Style::default().fg(state_color(cp.state)),
                ),
                Span::raw(format!(
                    "red {:>2}  blue {:>2}  agree {}/{}",
                    cp.red, cp.blue, cp.agreeing, view.stats.replica_count
                )),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_teams_and_network(frame: &mut Frame, area: Rect, view: &View) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let teams = vec![
        team_line(Team::Red, view.red),
        team_line(Team::Blue, view.blue),
    ];
    let block = Block::default()
        .title(format!(
            " Teams {} / {} ",
            view.stats.counts.red, view.stats.counts.blue
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    frame.render_widget(Paragraph::new(teams).block(block), columns[0]);

    let hub = &view.stats.hub;
    let received = &view.stats.received;
    let delivery = &view.stats.delivery;
    let faults = if delivery.enabled {
        format!(
            "loss {:.0}% dup {:.0}% reorder {:.0}%",
            delivery.loss_percent, delivery.duplicate_percent, delivery.reorder_percent
        )
    } else {
        "off".to_string()
    };
    let lines = vec![
        stat_line(
            "Sent: ",
            format!("{} pkts / {}", hub.packets_sent, format_bytes(hub.bytes_sent)),
        ),
        stat_line(
            "Delivered: ",
            format!(
                "{} (dropped {}, dup {}, reordered {})",
                hub.packets_delivered,
                hub.packets_dropped,
                hub.packets_duplicated,
                hub.packets_reordered
            ),
        ),
        stat_line(
            "Applied: ",
            format!(
                "{} (stale {}, rejected {})",
                received.packets_applied, received.stale_ignored, received.rejected
            ),
        ),
        stat_line("Faults: ", faults),
    ];
    let block = Block::default()
        .title(" Replication ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(Paragraph::new(lines).block(block), columns[1]);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Events ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .visible_logs(height)
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Info => Color::White,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Error => Color::Red,
            };
            Line::from(Span::styled(entry.message.as_str(), Style::default().fg(color)))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("q/ESC quit  +/- add/remove bot  f toggle faults  PgUp/PgDn/End scroll")
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn team_line(team: Team, players: &[PlayerId]) -> Line<'static> {
    let color = match team {
        Team::Red => Color::Red,
        Team::Blue => Color::Blue,
    };
    let list = players
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    Line::from(vec![
        Span::styled(format!("{:<5}", team.as_str()), Style::default().fg(color)),
        Span::raw(list),
    ])
}

fn stat_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn state_color(state: ControlPointState) -> Color {
    let rgb = state.color().rgb() * 255.0;
    Color::Rgb(rgb.x as u8, rgb.y as u8, rgb.z as u8)
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1}GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
