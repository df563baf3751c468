use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use enrollment_forms::{
    Association, Entity, EntityId, HeadlessPicker, SelectionSynchronizer, TableEvent,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Picker,
    Table,
}

impl Focus {
    pub fn toggle(&self) -> Self {
        match self {
            Focus::Picker => Focus::Table,
            Focus::Table => Focus::Picker,
        }
    }
}

pub struct App {
    pub sync: SelectionSynchronizer<HeadlessPicker>,
    pub focus: Focus,
    pub picker_state: ListState,
    pub table_state: TableState,
}

impl App {
    pub fn new(
        association: Association,
        candidates: Vec<Entity>,
        preselected: &[EntityId],
    ) -> Self {
        let sync =
            SelectionSynchronizer::new(association, candidates, preselected, HeadlessPicker::new());

        let mut app = Self {
            sync,
            focus: Focus::Picker,
            picker_state: ListState::default(),
            table_state: TableState::default(),
        };
        app.clamp_selection();
        app
    }

    fn match_count(&self) -> usize {
        self.sync.pool().picker().matches().len()
    }

    /// Keep both highlights inside their lists after any change
    fn clamp_selection(&mut self) {
        let matches = self.match_count();
        self.picker_state.select(match (matches, self.picker_state.selected()) {
            (0, _) => None,
            (n, Some(i)) => Some(i.min(n - 1)),
            (_, None) => Some(0),
        });

        let rows = self.sync.table().len();
        self.table_state.select(match (rows, self.table_state.selected()) {
            (0, _) => None,
            (n, Some(i)) => Some(i.min(n - 1)),
            (_, None) => Some(0),
        });
    }

    pub fn type_char(&mut self, c: char) {
        let picker = self.sync.pool_mut().picker_mut();
        let mut query = picker.query().to_string();
        query.push(c);
        picker.set_query(query);
        self.picker_state.select(Some(0));
        self.clamp_selection();
    }

    pub fn backspace(&mut self) {
        let picker = self.sync.pool_mut().picker_mut();
        let mut query = picker.query().to_string();
        query.pop();
        picker.set_query(query);
        self.clamp_selection();
    }

    /// Pick the highlighted match
    pub fn select_highlighted(&mut self) {
        let Some(position) = self.picker_state.selected() else {
            return;
        };
        if let Some(event) = self.sync.pool().picker().pick(position) {
            self.sync.handle_picker_event(event);
        }
        self.clamp_selection();
    }

    /// Remove the highlighted table row
    pub fn remove_highlighted(&mut self) {
        let Some(row) = self
            .table_state
            .selected()
            .and_then(|i| self.sync.table().rows().get(i))
        else {
            return;
        };
        let event = TableEvent::Remove {
            data_id: row.data_id().to_string(),
        };
        self.sync.handle_table_event(event);
        self.clamp_selection();
    }

    pub fn next(&mut self) {
        let (len, selected) = match self.focus {
            Focus::Picker => (self.match_count(), self.picker_state.selected()),
            Focus::Table => (self.sync.table().len(), self.table_state.selected()),
        };
        if len == 0 {
            return;
        }
        let i = match selected {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        match self.focus {
            Focus::Picker => self.picker_state.select(Some(i)),
            Focus::Table => self.table_state.select(Some(i)),
        }
    }

    pub fn previous(&mut self) {
        let (len, selected) = match self.focus {
            Focus::Picker => (self.match_count(), self.picker_state.selected()),
            Focus::Table => (self.sync.table().len(), self.table_state.selected()),
        };
        if len == 0 {
            return;
        }
        let i = match selected {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        match self.focus {
            Focus::Picker => self.picker_state.select(Some(i)),
            Focus::Table => self.table_state.select(Some(i)),
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.focus = app.focus.toggle(),
                KeyCode::Down => app.next(),
                KeyCode::Up => app.previous(),
                KeyCode::Enter if app.focus == Focus::Picker => app.select_highlighted(),
                KeyCode::Enter | KeyCode::Delete if app.focus == Focus::Table => {
                    app.remove_highlighted()
                }
                KeyCode::Backspace if app.focus == Focus::Picker => app.backspace(),
                KeyCode::Char(c) if app.focus == Focus::Picker => app.type_char(c),
                KeyCode::Char('q') => return Ok(()),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Picker | table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_search(f, chunks[0], app);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    render_picker(f, content[0], app);
    render_table(f, content[1], app);
    render_status_bar(f, chunks[2], app);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_search(f: &mut Frame, area: Rect, app: &App) {
    let query = app.sync.pool().picker().query();
    let text = if query.is_empty() {
        Span::styled("type to search...", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(query.to_string(), Style::default().fg(Color::White))
    };

    let search = Paragraph::new(Line::from(vec![Span::raw(" 🔎 "), text])).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(app.focus == Focus::Picker))
            .title(" Search "),
    );

    f.render_widget(search, area);
}

fn render_picker(f: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .sync
        .pool()
        .picker()
        .matches()
        .iter()
        .map(|e| ListItem::new(e.label.clone()))
        .collect();

    let title = format!(" Available ({}) ", app.sync.pool().len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app.focus == Focus::Picker))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, &mut app.picker_state);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(["Id", "Name"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.sync.table().rows().iter().map(|row| {
        Row::new(vec![
            Cell::from(row.entity_id.to_string()),
            Cell::from(row.display_label.clone()),
        ])
        .height(1)
    });

    let title = format!(
        " Selected ({}) → {} ",
        app.sync.table().len(),
        app.sync.association().hidden_field_name()
    );
    let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(20)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app.focus == Focus::Table))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let partition = if app.sync.partition_holds() {
        Span::styled("✓ in sync", Style::default().fg(Color::Green))
    } else {
        Span::styled("✗ out of sync", Style::default().fg(Color::Red))
    };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        partition,
        Span::raw(" | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Switch | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Select/Remove | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_app() -> App {
        App::new(
            Association::StudentsOfCourse,
            vec![
                Entity::new("1", "Zapata, Ana"),
                Entity::new("2", "Alvarez, Ben"),
                Entity::new("3", "Pérez, José"),
            ],
            &[],
        )
    }

    #[test]
    fn test_search_then_select() {
        let mut app = create_app();
        for c in "jose".chars() {
            app.type_char(c);
        }
        app.select_highlighted();

        assert_eq!(app.sync.table().rows()[0].display_label, "Pérez, José");
        assert_eq!(app.sync.pool().picker().query(), "");
        assert!(app.sync.partition_holds());
    }

    #[test]
    fn test_remove_from_table() {
        let mut app = create_app();
        app.select_highlighted();
        app.focus = Focus::Table;
        app.remove_highlighted();

        assert!(app.sync.table().is_empty());
        assert_eq!(app.sync.pool().len(), 3);
        assert_eq!(app.table_state.selected(), None);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = create_app();
        app.previous();
        assert_eq!(app.picker_state.selected(), Some(2));
        app.next();
        assert_eq!(app.picker_state.selected(), Some(0));
    }
}
