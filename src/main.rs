use std::io::stdout;
use std::time::Duration;

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::game::{CellView, PRESETS, Preset, Session, SessionSnapshot};

mod error;
mod game;
mod grid;

const CELL_WIDTH: u16 = 3;

fn main() -> Result<()> {
    let preset = match std::env::args().nth(1) {
        Some(arg) => {
            let index: usize = arg.parse().context("preset should be an index")?;
            Preset::from_index(index).ok_or_else(|| eyre!("preset index should be 0, 1 or 2"))?
        }
        None => PRESETS[0],
    };

    color_eyre::install()?;
    let session = Session::new(preset)?;
    let terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let result = App::new(session).run(terminal);
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}

pub struct App {
    running: bool,
    session: Session,
    cursor: (usize, usize),
    board_area: Rect,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            running: false,
            session,
            cursor: (0, 0),
            board_area: Rect::default(),
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events()?;
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let view = self.session.snapshot();
        let [status_area, board_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Fill(1)])
            .areas(frame.area());
        // remembered for pointer-to-grid mapping
        self.board_area = board_area;
        self.render_status(frame, &view, status_area);
        self.render_board(frame, &view, board_area);
    }

    fn render_status(&self, frame: &mut Frame, view: &SessionSnapshot, area: Rect) {
        let counters = format!(
            "Mines: {}/{}  Time: {}s",
            view.flag_count,
            view.mine_count,
            view.elapsed.as_secs()
        );
        let message = if view.is_over {
            if view.is_victory {
                Line::from("Victory! press r or 1-3 for a new game").green()
            } else {
                Line::from("Game over! press r or 1-3 for a new game").red()
            }
        } else {
            Line::from("arrows move, space reveals, f flags, q quits").dark_gray()
        };
        frame.render_widget(Paragraph::new(vec![Line::from(counters), message]), area);
    }

    fn render_board(&self, frame: &mut Frame, view: &SessionSnapshot, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..view.width).map(|_| Constraint::Length(CELL_WIDTH)))
            .split(area);

        for (x, column) in columns.iter().enumerate() {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints((0..view.height).map(|_| Constraint::Length(1)))
                .split(*column);

            for (y, cell_area) in rows.iter().enumerate() {
                frame.render_widget(self.cell_widget(view, x, y), *cell_area);
            }
        }
    }

    fn cell_widget(&self, view: &SessionSnapshot, x: usize, y: usize) -> Paragraph<'static> {
        let (symbol, fg) = cell_symbol(view.cell(x, y));
        let mut bg = if x % 2 == y % 2 {
            Color::DarkGray
        } else {
            Color::Gray
        };
        if view.hit_mine == Some((x, y)) {
            bg = Color::LightRed;
        }
        if self.cursor == (x, y) && !view.is_over {
            bg = Color::Yellow;
        }
        Paragraph::new(Span::styled(symbol, Style::default().fg(fg))).block(Block::new().bg(bg))
    }

    fn handle_crossterm_events(&mut self) -> Result<()> {
        // short poll so the clock in the status line keeps ticking
        if !event::poll(Duration::from_millis(250))? {
            return Ok(());
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
            Event::Mouse(mouse) => self.on_mouse_event(mouse),
            Event::Resize(_, _) => {}
            _ => {}
        }
        Ok(())
    }

    fn on_key_event(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char(c @ '1'..='3')) => self.new_session(c as usize - '1' as usize),
            (_, KeyCode::Char('r')) => self.session.restart(),
            (_, KeyCode::Up | KeyCode::Char('k')) => self.move_cursor(0, -1),
            (_, KeyCode::Down | KeyCode::Char('j')) => self.move_cursor(0, 1),
            (_, KeyCode::Left | KeyCode::Char('h')) => self.move_cursor(-1, 0),
            (_, KeyCode::Right | KeyCode::Char('l')) => self.move_cursor(1, 0),
            (_, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.reveal_at(self.cursor.0, self.cursor.1)
            }
            (_, KeyCode::Char('f')) => self.flag_at(self.cursor.0, self.cursor.1),
            _ => {}
        }
    }

    fn on_mouse_event(&mut self, mouse: MouseEvent) {
        let MouseEventKind::Down(button) = mouse.kind else {
            return;
        };
        let Some((x, y)) = self.grid_position(mouse.column, mouse.row) else {
            return;
        };
        self.cursor = (x, y);
        match button {
            MouseButton::Left => self.reveal_at(x, y),
            MouseButton::Right => self.flag_at(x, y),
            MouseButton::Middle => {}
        }
    }

    fn grid_position(&self, column: u16, row: u16) -> Option<(usize, usize)> {
        let area = self.board_area;
        if column < area.x || row < area.y {
            return None;
        }
        let x = usize::from((column - area.x) / CELL_WIDTH);
        let y = usize::from(row - area.y);
        let preset = self.session.preset();
        (x < preset.width && y < preset.height).then_some((x, y))
    }

    fn new_session(&mut self, index: usize) {
        let Some(preset) = Preset::from_index(index) else {
            return;
        };
        if let Ok(session) = Session::new(preset) {
            self.session = session;
            self.cursor = (0, 0);
        }
    }

    fn reveal_at(&mut self, x: usize, y: usize) {
        if self.session.is_over() {
            return;
        }
        let _ = self.session.reveal(x, y);
    }

    fn flag_at(&mut self, x: usize, y: usize) {
        if self.session.is_over() {
            return;
        }
        let _ = self.session.toggle_flag(x, y);
    }

    fn move_cursor(&mut self, dx: isize, dy: isize) {
        let preset = self.session.preset();
        self.cursor = (
            self.cursor
                .0
                .saturating_add_signed(dx)
                .min(preset.width - 1),
            self.cursor
                .1
                .saturating_add_signed(dy)
                .min(preset.height - 1),
        );
    }

    fn quit(&mut self) {
        self.running = false;
    }
}

fn cell_symbol(cell: &CellView) -> (&'static str, Color) {
    match *cell {
        CellView { flagged: true, .. } => ("⚑", Color::Red),
        CellView { revealed: false, mine: true, .. } => ("*", Color::Black),
        CellView { revealed: false, .. } => ("-", Color::Black),
        CellView { mine: true, .. } => ("*", Color::Red),
        CellView { clue: 0, .. } => (" ", Color::Black),
        CellView { clue, .. } => clue_symbol(clue),
    }
}

fn clue_symbol(clue: u8) -> (&'static str, Color) {
    match clue {
        1 => ("1", Color::Blue),
        2 => ("2", Color::Green),
        3 => ("3", Color::Red),
        4 => ("4", Color::LightBlue),
        5 => ("5", Color::LightRed),
        6 => ("6", Color::Cyan),
        7 => ("7", Color::Black),
        _ => ("8", Color::White),
    }
}
