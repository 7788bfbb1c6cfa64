use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fastmoney::{
    CategoryBox, HomepageContent, ListingEngine, ListingState, ListingView, ResultsSnapshot,
    WebResult,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    Results,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Landing => Page::Results,
            Page::Results => Page::Landing,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Landing => "FastMoney",
            Page::Results => "Web Results",
        }
    }
}

pub struct App {
    pub homepage: HomepageContent,
    pub categories: Vec<CategoryBox>,
    pub results: Vec<WebResult>,
    pub load_error: Option<String>,
    pub engine: ListingEngine,
    pub listing: ListingState,
    pub current_page: Page,
    pub category_state: TableState,
    pub results_state: TableState,
    pub show_detail: bool,
    pub searching: bool,
}

impl App {
    pub fn new(
        homepage: HomepageContent,
        categories: Vec<CategoryBox>,
        snapshot: ResultsSnapshot,
        engine: ListingEngine,
    ) -> Self {
        let mut category_state = TableState::default();
        if !categories.is_empty() {
            category_state.select(Some(0));
        }

        let mut app = Self {
            homepage,
            categories,
            results: snapshot.results,
            load_error: snapshot.load_error,
            engine,
            listing: ListingState::default(),
            current_page: Page::Landing,
            category_state,
            results_state: TableState::default(),
            show_detail: false,
            searching: false,
        };
        app.reset_selection();
        app
    }

    pub fn view(&self) -> ListingView<'_> {
        self.engine.view(&self.results, &self.listing)
    }

    pub fn selected_category(&self) -> Option<&CategoryBox> {
        self.category_state.selected().and_then(|i| self.categories.get(i))
    }

    pub fn selected_result(&self) -> Option<&WebResult> {
        let index = self.results_state.selected()?;
        self.view().page_items.get(index).copied()
    }

    fn reset_selection(&mut self) {
        let has_items = !self.view().page_items.is_empty();
        self.results_state.select(if has_items { Some(0) } else { None });
    }

    /// Apply one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.searching {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.searching = false,
                KeyCode::Backspace => {
                    let mut query = self.listing.query.clone();
                    query.pop();
                    self.listing.set_query(query);
                    self.reset_selection();
                }
                KeyCode::Char(c) => {
                    let query = format!("{}{}", self.listing.query, c);
                    self.listing.set_query(query);
                    self.reset_selection();
                }
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.current_page = self.current_page.next();
                self.show_detail = false;
            }
            KeyCode::Char('/') => {
                self.current_page = Page::Results;
                self.searching = true;
            }
            KeyCode::Enter => match self.current_page {
                // Category boxes lead to the results page
                Page::Landing => {
                    self.current_page = Page::Results;
                    self.show_detail = false;
                }
                Page::Results => self.show_detail = !self.show_detail,
            },
            KeyCode::Char('d') if self.current_page == Page::Landing => {
                self.show_detail = !self.show_detail;
            }
            KeyCode::Left | KeyCode::Char('h') if self.current_page == Page::Results => {
                self.listing.previous_page();
                self.reset_selection();
            }
            KeyCode::Right | KeyCode::Char('l') if self.current_page == Page::Results => {
                let total_pages = self.view().total_pages;
                self.listing.next_page(total_pages);
                self.reset_selection();
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            _ => {}
        }

        false
    }

    fn move_selection(&mut self, delta: isize) {
        let (len, state) = match self.current_page {
            Page::Landing => (self.categories.len(), &mut self.category_state),
            Page::Results => {
                let len = self.engine.view(&self.results, &self.listing).page_items.len();
                (len, &mut self.results_state)
            }
        };

        if len == 0 {
            return;
        }

        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len as isize) as usize;
        state.select(Some(next));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "ui loop failed");
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
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Landing => render_landing(f, chunks[1], app),
        Page::Results => render_results(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Landing, Page::Results].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    if app.current_page == Page::Results {
        let search_style = if app.searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::raw("  |  Search: "));
        spans.push(Span::styled(format!("{}▏", app.listing.query), search_style));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    f.render_widget(header, area);
}

fn render_landing(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    let intro = Paragraph::new(vec![
        Line::from(Span::styled(
            app.homepage.heading.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            app.homepage.paragraph.clone(),
            Style::default().fg(Color::Gray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(intro, chunks[0]);

    let rows = app.categories.iter().map(|category| {
        Row::new(vec![Cell::from(category.title.clone()), Cell::from("›")]).height(1)
    });

    let table = Table::new(rows, [Constraint::Min(20), Constraint::Length(3)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Related categories "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.category_state);

    if app.show_detail {
        if let Some(category) = app.selected_category() {
            let popup = centered_rect(60, 40, area);
            let detail = Paragraph::new(category.description.clone())
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Cyan))
                        .title(format!(" {} ", category.title)),
                );
            f.render_widget(Clear, popup);
            f.render_widget(detail, popup);
        }
    }
}

fn render_results(f: &mut Frame, area: Rect, app: &mut App) {
    let view = app.engine.view(&app.results, &app.listing);

    let featured_height = if view.featured.is_some() { 6 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(featured_height),
            Constraint::Min(0),
            Constraint::Length(1), // Pagination
        ])
        .split(area);

    if let Some(featured) = view.featured {
        f.render_widget(featured_card(featured), chunks[0]);
    }

    let list_area = if app.show_detail {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        let selected = app.results_state.selected().and_then(|i| view.page_items.get(i).copied());
        render_detail_panel(f, split[1], selected);
        split[0]
    } else {
        chunks[1]
    };

    if view.is_empty() {
        let empty = Paragraph::new("No results found")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Web Results "));
        f.render_widget(empty, list_area);
    } else {
        let header = Row::new(["Name", "Title", "Description"].iter().map(|h| {
            Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

        let rows = view.page_items.iter().map(|result| {
            let title_style = if result.is_clickable() {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            Row::new(vec![
                Cell::from(truncate(&result.name, 22)),
                Cell::from(truncate(&result.title, 40)).style(title_style),
                Cell::from(truncate(&result.description, 60)),
            ])
            .height(1)
        });

        let table = Table::new(
            rows,
            [Constraint::Length(24), Constraint::Length(42), Constraint::Min(10)],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Web Results "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

        f.render_stateful_widget(table, list_area, &mut app.results_state);
    }

    f.render_widget(pagination_line(&view), chunks[2]);
}

fn featured_card(result: &WebResult) -> Paragraph<'_> {
    let mut lines = vec![Line::from(vec![
        Span::styled(result.name.clone(), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(
            " Sponsored ",
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
    ])];
    if let Some(link) = &result.link {
        lines.push(Line::from(Span::styled(link.clone(), Style::default().fg(Color::DarkGray))));
    }
    lines.push(Line::from(Span::styled(
        result.title.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(result.description.clone()));

    Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    )
}

fn pagination_line(view: &ListingView<'_>) -> Paragraph<'static> {
    let numbers = view.page_numbers();
    if numbers.is_empty() {
        return Paragraph::new("");
    }

    let mut spans = vec![Span::styled(
        " ‹ ",
        if view.has_previous() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        },
    )];
    for number in numbers {
        let style = if number as i64 == view.page {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(format!(" {} ", number), style));
    }
    spans.push(Span::styled(
        " › ",
        if view.has_next() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        },
    ));

    Paragraph::new(Line::from(spans))
}

fn render_detail_panel(f: &mut Frame, area: Rect, result: Option<&WebResult>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Result Details ");

    let result = match result {
        Some(r) => r,
        None => {
            f.render_widget(Paragraph::new("No result selected").block(block), area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Name: ", label), Span::raw(result.name.clone())]),
        Line::from(""),
        Line::from(vec![Span::styled("  Title: ", label), Span::raw(result.title.clone())]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Link: ", label),
            Span::raw(result.link.clone().unwrap_or_else(|| "(none)".to_string())),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Logo: ", label),
            Span::raw(result.logo_url.clone().unwrap_or_else(|| "(placeholder)".to_string())),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", result.description),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content).wrap(Wrap { trim: false }).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(err) = &app.load_error {
        status_spans.push(Span::styled(
            format!(" Load failed: {} ", err),
            Style::default().fg(Color::Red),
        ));
        status_spans.push(Span::raw("|"));
    }

    let hints: &[(&str, &str)] = if app.searching {
        &[("Enter", " Done "), ("Backspace", " Delete ")]
    } else {
        match app.current_page {
            Page::Landing => &[
                ("Enter", " Results | "),
                ("d", " Details | "),
                ("Tab", " Page | "),
                ("q", " Quit"),
            ],
            Page::Results => &[
                ("/", " Search | "),
                ("←/→", " Page | "),
                ("Enter", " Details | "),
                ("Tab", " Home | "),
                ("q", " Quit"),
            ],
        }
    };

    status_spans.push(Span::raw(" "));
    for (key, label) in hints {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*label));
    }

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastmoney::ResultKind;

    fn create_test_result(id: usize, kind: ResultKind) -> WebResult {
        WebResult {
            id: id.to_string(),
            category_id: None,
            name: format!("site{}.com", id),
            title: format!("Result {}", id),
            description: String::new(),
            link: None,
            logo_url: None,
            kind,
            display_order: id as i64,
        }
    }

    fn create_test_app(organic: usize) -> App {
        let mut results = vec![create_test_result(0, ResultKind::Sponsored)];
        results.extend((1..=organic).map(|i| create_test_result(i, ResultKind::Organic)));

        let categories = vec![CategoryBox {
            id: "c1".to_string(),
            title: "Loans".to_string(),
            description: "Loan offers".to_string(),
            order_index: 0,
        }];

        App::new(
            HomepageContent::fallback(),
            categories,
            ResultsSnapshot {
                results,
                load_error: None,
            },
            ListingEngine::new(10),
        )
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_enter_on_category_opens_results() {
        let mut app = create_test_app(3);
        assert_eq!(app.current_page, Page::Landing);

        press(&mut app, KeyCode::Enter);

        assert_eq!(app.current_page, Page::Results);
        assert_eq!(app.selected_result().map(|r| r.id.as_str()), Some("1"));
    }

    #[test]
    fn test_typing_filters_results() {
        let mut app = create_test_app(12);

        press(&mut app, KeyCode::Char('/'));
        for c in "result 1".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert!(!app.searching);
        assert_eq!(app.listing.query, "result 1");
        // "Result 1", "Result 10", "Result 11", "Result 12"
        assert_eq!(app.view().page_items.len(), 4);

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.listing.query, "result ");
    }

    #[test]
    fn test_page_keys_stay_in_bounds() {
        let mut app = create_test_app(25);
        app.current_page = Page::Results;

        for _ in 0..5 {
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(app.listing.page, 3);
        assert_eq!(app.view().page_items.len(), 5);

        for _ in 0..5 {
            press(&mut app, KeyCode::Left);
        }
        assert_eq!(app.listing.page, 1);
    }

    #[test]
    fn test_selection_wraps_within_page() {
        let mut app = create_test_app(3);
        app.current_page = Page::Results;

        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_result().map(|r| r.id.as_str()), Some("3"));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_result().map(|r| r.id.as_str()), Some("1"));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = create_test_app(1);
        assert!(!press(&mut app, KeyCode::Char('x')));
        assert!(press(&mut app, KeyCode::Char('q')));

        // 'q' is just text while searching
        press(&mut app, KeyCode::Char('/'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.listing.query, "q");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
