//! Terminal surfaces for the gallery and the player

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    prelude::*,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use indicatif::ProgressBar;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

use super::snapshot::{EntryRow, GallerySnapshot, PlayerSnapshot, ViewSync};
use crate::ingest::{IngestReport, Ingestor};
use crate::media::Progress;
use crate::store::RecordId;
use crate::widget::{GalleryController, PlayerController, WidgetKind};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Highlight, status line and hit areas shared by both surfaces
#[derive(Default)]
struct SurfaceState {
    list_state: ListState,
    status_message: String,
    status_message_time: Option<Instant>,
    /// Where the progress gauge was last drawn, for click-to-seek
    gauge_area: Option<Rect>,
    /// Path prompt opened with `a`
    add_mode: bool,
    add_input: String,
}

impl SurfaceState {
    fn new(len: usize) -> Self {
        let mut state = Self::default();
        if len > 0 {
            state.list_state.select(Some(0));
        }
        state
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.status_message_time = Some(Instant::now());
    }

    /// Clear the status message after 3 seconds
    fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time
            && time.elapsed() > Duration::from_secs(3)
        {
            self.status_message.clear();
            self.status_message_time = None;
        }
    }

    fn highlighted(&self) -> Option<usize> {
        self.list_state.selected()
    }

    fn move_up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i > 0 => i - 1,
            _ => len - 1,
        };
        self.list_state.select(Some(i));
    }

    fn move_down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    fn open_add_prompt(&mut self) {
        self.add_mode = true;
        self.add_input.clear();
    }

    /// Feed a key to the path prompt; yields the paths once submitted
    fn handle_add_key(&mut self, code: KeyCode) -> Option<Vec<PathBuf>> {
        match code {
            KeyCode::Esc => {
                self.add_mode = false;
                self.add_input.clear();
                None
            }
            KeyCode::Enter => {
                self.add_mode = false;
                let paths = parse_paths(&self.add_input);
                self.add_input.clear();
                (!paths.is_empty()).then_some(paths)
            }
            KeyCode::Backspace => {
                self.add_input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.add_input.push(c);
                None
            }
            _ => None,
        }
    }

    /// Keep the highlight inside a list that may have shrunk
    fn clamp(&mut self, len: usize) {
        match (self.list_state.selected(), len) {
            (_, 0) => self.list_state.select(None),
            (Some(i), len) if i >= len => self.list_state.select(Some(len - 1)),
            (None, _) => self.list_state.select(Some(0)),
            _ => {}
        }
    }
}

fn enter_terminal(mouse: bool) -> Result<Term> {
    // Keep log lines off the alternate screen
    crate::utils::set_tui_mode(true);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if mouse {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn leave_terminal(terminal: &mut Term, mouse: bool) -> Result<()> {
    disable_raw_mode()?;
    if mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    crate::utils::set_tui_mode(false);
    Ok(())
}

/// Run the slideshow until the user quits
pub async fn run_gallery(gallery: &mut GalleryController, ingestor: &Ingestor) -> Result<()> {
    let mut terminal = enter_terminal(false)?;
    let result = run_gallery_loop(&mut terminal, gallery, ingestor).await;
    leave_terminal(&mut terminal, false)?;
    result
}

async fn run_gallery_loop(
    terminal: &mut Term,
    gallery: &mut GalleryController,
    ingestor: &Ingestor,
) -> Result<()> {
    let mut state = SurfaceState::new(gallery.shelf().view().len());
    let mut sync = ViewSync::new();

    loop {
        let now = Instant::now();
        if gallery.tick(now) {
            debug!("Slideshow advanced");
        }
        state.check_status_timeout();

        let countdown = gallery.slideshow().due_in(now);
        let snapshot = sync.sync(gallery.shelf().revision(), || GallerySnapshot::build(gallery));
        terminal.draw(|f| draw_gallery(f, snapshot, countdown, &mut state))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if state.add_mode {
            if let Some(paths) = state.handle_add_key(key.code) {
                let status = add_to_gallery(gallery, ingestor, paths).await;
                state.set_status(status);
                state.clamp(gallery.shelf().view().len());
            }
            continue;
        }

        let len = gallery.shelf().view().len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                debug!("Gallery closed after {} view rebuilds", sync.rebuilds());
                return Ok(());
            }
            KeyCode::Up | KeyCode::Char('k') => state.move_up(len),
            KeyCode::Down | KeyCode::Char('j') => state.move_down(len),
            KeyCode::Enter => {
                if let Some(index) = state.highlighted()
                    && let Err(e) = gallery.select(index, Instant::now())
                {
                    state.set_status(e.to_string());
                }
            }
            KeyCode::Char('a') => state.open_add_prompt(),
            KeyCode::Char('d') => {
                let Some(id) = highlighted_id(&state, gallery.shelf().view().iter().map(|e| e.id))
                else {
                    continue;
                };
                match gallery.delete(id, Instant::now()).await {
                    Ok(_) => state.set_status("Image deleted"),
                    Err(e) => state.set_status(format!("Delete failed: {}", e)),
                }
                state.clamp(gallery.shelf().view().len());
            }
            _ => {}
        }
    }
}

/// Run the player until the user quits
pub async fn run_player(player: &mut PlayerController, ingestor: &Ingestor) -> Result<()> {
    let mut terminal = enter_terminal(true)?;
    let result = run_player_loop(&mut terminal, player, ingestor).await;
    leave_terminal(&mut terminal, true)?;
    result
}

async fn run_player_loop(
    terminal: &mut Term,
    player: &mut PlayerController,
    ingestor: &Ingestor,
) -> Result<()> {
    let mut state = SurfaceState::new(player.shelf().view().len());
    let mut sync = ViewSync::new();

    loop {
        if let Err(e) = player.tick() {
            state.set_status(e.to_string());
        }
        state.check_status_timeout();

        let progress = player.progress();
        let snapshot = sync.sync(player.shelf().revision(), || PlayerSnapshot::build(player));
        terminal.draw(|f| draw_player(f, snapshot, &progress, &mut state))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            Event::Mouse(mouse) => {
                handle_gauge_click(&state, player, mouse);
                continue;
            }
            _ => continue,
        };

        if state.add_mode {
            if let Some(paths) = state.handle_add_key(key.code) {
                let status = add_to_player(player, ingestor, paths).await;
                state.set_status(status);
                state.clamp(player.shelf().view().len());
            }
            continue;
        }

        let len = player.shelf().view().len();
        let outcome = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                debug!("Player closed after {} view rebuilds", sync.rebuilds());
                return Ok(());
            }
            KeyCode::Up | KeyCode::Char('k') => {
                state.move_up(len);
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.move_down(len);
                Ok(())
            }
            KeyCode::Enter => match state.highlighted() {
                Some(index) => player.play_index(index),
                None => Ok(()),
            },
            KeyCode::Char(' ') => player.toggle_play(),
            KeyCode::Char('s') => {
                player.stop();
                Ok(())
            }
            KeyCode::Left => {
                player.skip_backward();
                Ok(())
            }
            KeyCode::Right => {
                player.skip_forward();
                Ok(())
            }
            KeyCode::Char('n') => player.next(),
            KeyCode::Char('p') => player.previous(),
            KeyCode::Char('z') => {
                let on = player.toggle_shuffle();
                state.set_status(format!("Shuffle {}", if on { "on" } else { "off" }));
                Ok(())
            }
            KeyCode::Char('r') => {
                let on = player.toggle_repeat();
                state.set_status(format!("Repeat {}", if on { "on" } else { "off" }));
                Ok(())
            }
            KeyCode::Char('a') => {
                state.open_add_prompt();
                Ok(())
            }
            KeyCode::Char('d') => {
                let Some(id) = highlighted_id(&state, player.shelf().view().iter().map(|e| e.id))
                else {
                    continue;
                };
                let result = player.delete(id).await.map(|_| {
                    state.set_status("Track deleted");
                });
                state.clamp(player.shelf().view().len());
                result
            }
            _ => Ok(()),
        };

        if let Err(e) = outcome {
            state.set_status(e.to_string());
        }
    }
}

/// Read `paths` and store them in the gallery; returns the status line
async fn add_to_gallery(
    gallery: &mut GalleryController,
    ingestor: &Ingestor,
    paths: Vec<PathBuf>,
) -> String {
    let batch = ingestor.read_batch(paths, &ProgressBar::hidden()).await;
    let was_running = gallery.slideshow().is_running();
    let report = gallery.ingest(batch, Instant::now()).await;

    let mut status = ingest_status(&report, WidgetKind::Gallery.noun());
    if !was_running && gallery.slideshow().is_running() {
        status.push_str(", slideshow started");
    }
    status
}

/// Read `paths` and append them to the playlist; returns the status line
async fn add_to_player(
    player: &mut PlayerController,
    ingestor: &Ingestor,
    paths: Vec<PathBuf>,
) -> String {
    let batch = ingestor.read_batch(paths, &ProgressBar::hidden()).await;
    let report = player.ingest(batch).await;
    ingest_status(&report, WidgetKind::Player.noun())
}

fn ingest_status(report: &IngestReport, noun: &str) -> String {
    match (report.added.len(), report.failed.as_slice()) {
        (0, []) => "Nothing added".to_string(),
        (0, [failure]) => format!("Could not add {}: {}", failure.path.display(), failure.error),
        (0, failed) => format!("Could not add any of {} files", failed.len()),
        (added, []) => format!("Added {} {}(s)", added, noun),
        (added, failed) => format!("Added {} {}(s), skipped {}", added, noun, failed.len()),
    }
}

/// Split the prompt into paths, expanding a leading `~`
fn parse_paths(input: &str) -> Vec<PathBuf> {
    input
        .split_whitespace()
        .map(|word| match (word.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(word),
        })
        .collect()
}

fn highlighted_id(
    state: &SurfaceState,
    mut ids: impl Iterator<Item = RecordId>,
) -> Option<RecordId> {
    state.highlighted().and_then(|index| ids.nth(index))
}

fn handle_gauge_click(state: &SurfaceState, player: &mut PlayerController, mouse: MouseEvent) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let Some(area) = state.gauge_area else {
        return;
    };
    if !area.contains(Position::new(mouse.column, mouse.row)) {
        return;
    }

    // The bar sits inside a one-cell border
    let inner_width = area.width.saturating_sub(2);
    let x = mouse.column.saturating_sub(area.x + 1).min(inner_width);
    player.seek_click(f64::from(x), f64::from(inner_width));
}

fn entry_items(rows: &[EntryRow]) -> Vec<ListItem<'static>> {
    rows.iter()
        .map(|row| {
            if row.active {
                ListItem::new(format!("> {}", row.label))
                    .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(format!("  {}", row.label))
            }
        })
        .collect()
}

fn draw_list(f: &mut Frame, area: Rect, title: &str, rows: &[EntryRow], state: &mut SurfaceState) {
    let list = List::new(entry_items(rows))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray));
    f.render_stateful_widget(list, area, &mut state.list_state);
}

fn draw_empty(f: &mut Frame, area: Rect, message: &str) {
    let text: Vec<Line> = message.lines().map(|l| Line::from(l.to_string())).collect();
    let empty = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(empty, area);
}

fn draw_footer(f: &mut Frame, area: Rect, help: &str) {
    let footer = Paragraph::new(help.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(footer, area);
}

fn draw_status(f: &mut Frame, state: &SurfaceState) {
    if state.status_message.is_empty() {
        return;
    }
    let status = Paragraph::new(state.status_message.clone())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    let area = centered_rect(50, 3, f.area());
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(status, area);
}

fn draw_add_prompt(f: &mut Frame, state: &SurfaceState) {
    if !state.add_mode {
        return;
    }
    let prompt = Paragraph::new(format!("Add: {}\u{2588}", state.add_input))
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Paths separated by spaces (Enter: add, Esc: cancel)"),
        );
    let area = centered_rect(70, 3, f.area());
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(prompt, area);
}

fn draw_gallery(
    f: &mut Frame,
    snapshot: &GallerySnapshot,
    countdown: Option<Duration>,
    state: &mut SurfaceState,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Body
            Constraint::Length(3), // Footer/help
        ])
        .split(f.area());

    let header = Paragraph::new(format!("Gallery ({} images)", snapshot.rows.len()))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    if let Some(message) = snapshot.empty {
        draw_empty(f, chunks[1], message);
    } else {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(chunks[1]);
        draw_list(f, body[0], "Images", &snapshot.rows, state);

        let mut lines = Vec::new();
        if let Some(main) = &snapshot.main {
            lines.push(Line::styled(
                main.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(format!("File:   {}", main.source)));
            lines.push(Line::from(format!("Type:   {}", main.media_type)));
            let size = match main.dimensions {
                Some((w, h)) => format!("Size:   {} x {} px, {} bytes", w, h, main.size),
                None => format!("Size:   {} bytes", main.size),
            };
            lines.push(Line::from(size));
            lines.push(Line::from(format!(
                "Image {} of {}",
                main.position + 1,
                main.total
            )));
        }
        if let Some(remaining) = countdown {
            lines.push(Line::from(""));
            lines.push(Line::styled(
                format!("Next image in {}s", remaining.as_secs() + 1),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let main = Paragraph::new(lines)
            .block(Block::default().title("Now Showing").borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        f.render_widget(main, body[1]);
    }

    draw_footer(f, chunks[2], "j/k: move  Enter: show  a: add  d: delete  q: quit");
    draw_add_prompt(f, state);
    draw_status(f, state);
}

fn draw_player(
    f: &mut Frame,
    snapshot: &PlayerSnapshot,
    progress: &Progress,
    state: &mut SurfaceState,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Now playing
            Constraint::Min(6),    // Tracks
            Constraint::Length(1), // Controls
            Constraint::Length(3), // Progress
            Constraint::Length(3), // Footer/help
        ])
        .split(f.area());

    let header_text = if snapshot.stopped_at_end {
        format!("{} (end of playlist)", snapshot.now_playing)
    } else {
        snapshot.now_playing.clone()
    };
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    if let Some(message) = snapshot.empty {
        draw_empty(f, chunks[1], message);
        state.gauge_area = None;
    } else {
        draw_list(f, chunks[1], "Playlist", &snapshot.rows, state);

        let on = Style::default().fg(Color::Green);
        let off = Style::default().fg(Color::DarkGray);
        let toggle = |enabled: bool| if enabled { on } else { off };
        let controls = Line::from(vec![
            Span::styled("[p] prev ", toggle(snapshot.navigation.has_previous)),
            Span::styled(
                if snapshot.playing { "[space] pause " } else { "[space] play " },
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled("[n] next ", toggle(snapshot.navigation.has_next)),
            Span::styled("[z] shuffle ", toggle(snapshot.shuffle)),
            Span::styled("[r] repeat", toggle(snapshot.repeat)),
        ]);
        f.render_widget(Paragraph::new(controls), chunks[2]);

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(progress.fraction.clamp(0.0, 1.0))
            .label(format!("{} / -{}", progress.elapsed, progress.remaining));
        f.render_widget(gauge, chunks[3]);
        state.gauge_area = Some(chunks[3]);
    }

    draw_footer(
        f,
        chunks[4],
        "Enter: play  space: play/pause  s: stop  \u{2190}/\u{2192}: skip  n/p: next/prev  z: shuffle  r: repeat  a: add  d: delete  q: quit",
    );
    draw_add_prompt(f, state);
    draw_status(f, state);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - height) / 2),
            Constraint::Length(height),
            Constraint::Percentage((100 - height) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
