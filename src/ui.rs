use crate::db::{DATE_FORMAT, SUGGESTED_CATEGORIES};
use crate::entry::{submit_expense, ExpenseInput};
use crate::error::{Result, TrackerError};
use crate::export::export_csv;
use crate::money::Money;
use crate::report::{request_report, Report, ReportOptions};
use crate::store::ExpenseStore;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::fs::File;
use std::io;
use std::path::PathBuf;

/// File written by the export key
pub const EXPORT_FILE_NAME: &str = "expenses.csv";

/// Budget step for `+` / `-`
const BUDGET_STEP: Money = Money::from_cents(10_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Expenses,
    AddExpense,
    Insights,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Expenses => Page::AddExpense,
            Page::AddExpense => Page::Insights,
            Page::Insights => Page::Expenses,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Expenses => Page::Insights,
            Page::AddExpense => Page::Expenses,
            Page::Insights => Page::AddExpense,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Expenses => "Expense History",
            Page::AddExpense => "Add New Expense",
            Page::Insights => "Expense Insights",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Date,
    Category,
    Amount,
    Description,
}

impl FormField {
    const ALL: [FormField; 4] = [
        FormField::Date,
        FormField::Category,
        FormField::Amount,
        FormField::Description,
    ];

    fn label(&self) -> &str {
        match self {
            FormField::Date => "Date",
            FormField::Category => "Category",
            FormField::Amount => "Amount",
            FormField::Description => "Description",
        }
    }
}

/// Entry form state; category is picked from the suggested list
#[derive(Debug, Clone)]
pub struct ExpenseForm {
    pub date: String,
    pub category_index: usize,
    pub amount: String,
    pub description: String,
    pub focus: usize,
}

impl ExpenseForm {
    pub fn new(today: &str) -> Self {
        ExpenseForm {
            date: today.to_string(),
            category_index: 0,
            amount: String::new(),
            description: String::new(),
            focus: 0,
        }
    }

    pub fn focused(&self) -> FormField {
        FormField::ALL[self.focus]
    }

    pub fn category(&self) -> &str {
        SUGGESTED_CATEGORIES[self.category_index]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FormField::ALL.len();
    }

    pub fn focus_previous(&mut self) {
        self.focus = (self.focus + FormField::ALL.len() - 1) % FormField::ALL.len();
    }

    pub fn cycle_category(&mut self, forward: bool) {
        let len = SUGGESTED_CATEGORIES.len();
        self.category_index = if forward {
            (self.category_index + 1) % len
        } else {
            (self.category_index + len - 1) % len
        };
    }

    fn field_mut(&mut self) -> Option<&mut String> {
        match self.focused() {
            FormField::Date => Some(&mut self.date),
            FormField::Amount => Some(&mut self.amount),
            FormField::Description => Some(&mut self.description),
            FormField::Category => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.field_mut() {
            field.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.field_mut() {
            field.pop();
        }
    }

    pub fn to_input(&self) -> ExpenseInput {
        ExpenseInput::new(&self.date, self.category(), &self.amount, &self.description)
    }

    /// Clear amount and description after a successful submit; keep date and category
    fn reset_after_submit(&mut self) {
        self.amount.clear();
        self.description.clear();
        self.focus = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

pub struct App<'a> {
    store: &'a dyn ExpenseStore,
    pub report: Report,
    pub budget: Money,
    pub current_page: Page,
    pub state: TableState,
    pub form: ExpenseForm,
    pub notice: Option<Notice>,
    pub export_path: PathBuf,
}

impl<'a> App<'a> {
    pub fn new(store: &'a dyn ExpenseStore, budget: Money) -> Result<Self> {
        let report = request_report(store, budget, ReportOptions::default())?;
        let today = chrono::Local::now().date_naive().format(DATE_FORMAT).to_string();

        let mut app = App {
            store,
            report,
            budget,
            current_page: Page::Expenses,
            state: TableState::default(),
            form: ExpenseForm::new(&today),
            notice: None,
            export_path: PathBuf::from(EXPORT_FILE_NAME),
        };
        app.reset_selection();
        Ok(app)
    }

    /// Re-read the store and recompute every metric
    pub fn refresh(&mut self) -> Result<()> {
        self.report = request_report(self.store, self.budget, ReportOptions::default())?;
        self.reset_selection();
        Ok(())
    }

    fn reset_selection(&mut self) {
        if self.report.records.is_empty() {
            self.state.select(None);
        } else {
            let last = self.report.records.len() - 1;
            let selected = self.state.selected().unwrap_or(0).min(last);
            self.state.select(Some(selected));
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.report.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.report.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn submit(&mut self) {
        match submit_expense(self.store, &self.form.to_input()) {
            Ok(id) => {
                self.form.reset_after_submit();
                self.notice = Some(Notice::Success(format!("Expense #{} added successfully!", id)));
                if let Err(e) = self.refresh() {
                    self.notice = Some(Notice::Error(e.to_string()));
                }
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    pub fn export(&mut self) {
        let result = File::create(&self.export_path)
            .map_err(TrackerError::from)
            .and_then(|file| export_csv(&self.report.records, file));

        self.notice = Some(match result {
            Ok(()) => Notice::Success(format!(
                "Exported {} expenses to {}",
                self.report.records.len(),
                self.export_path.display()
            )),
            Err(e) => Notice::Error(format!("Export failed: {}", e)),
        });
    }

    pub fn adjust_budget(&mut self, increase: bool) {
        self.budget = if increase {
            self.budget + BUDGET_STEP
        } else if self.budget > BUDGET_STEP {
            self.budget - BUDGET_STEP
        } else {
            Money::zero()
        };
        // Budget only changes derived numbers, the snapshot stays
        let records = std::mem::take(&mut self.report.records);
        self.report = Report::from_records(records, self.budget, ReportOptions::default());
    }

    /// Apply one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match key.code {
            KeyCode::Tab => {
                self.next_page();
                return false;
            }
            KeyCode::BackTab => {
                self.previous_page();
                return false;
            }
            _ => {}
        }

        if self.current_page == Page::AddExpense {
            self.handle_form_key(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('a') => self.current_page = Page::AddExpense,
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_budget(true),
            KeyCode::Char('-') => self.adjust_budget(false),
            KeyCode::Char('r') => {
                if let Err(e) = self.refresh() {
                    self.notice = Some(Notice::Error(e.to_string()));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => {
                if !self.report.records.is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !self.report.records.is_empty() {
                    self.state.select(Some(self.report.records.len() - 1));
                }
            }
            _ => {}
        }

        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.current_page = Page::Expenses,
            KeyCode::Enter => self.submit(),
            KeyCode::Down => self.form.focus_next(),
            KeyCode::Up => self.form.focus_previous(),
            KeyCode::Left if self.form.focused() == FormField::Category => self.form.cycle_category(false),
            KeyCode::Right | KeyCode::Char(' ') if self.form.focused() == FormField::Category => {
                self.form.cycle_category(true)
            }
            KeyCode::Backspace => self.form.pop_char(),
            KeyCode::Char(c) => self.form.push_char(c),
            _ => {}
        }
    }
}

pub fn run(store: &dyn ExpenseStore, budget: Money) -> Result<()> {
    let mut app = App::new(store, budget)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal before reporting anything
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
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
        Page::Expenses => render_table(f, chunks[1], app),
        Page::AddExpense => render_form(f, chunks[1], app),
        Page::Insights => render_insights(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Expenses, Page::AddExpense, Page::Insights];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    let remaining_color = if app.report.over_budget { Color::Red } else { Color::Green };

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Spent: {}", app.report.total),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Budget: {}", app.budget),
        Style::default().fg(Color::Cyan),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Left: {}", app.report.remaining),
        Style::default().fg(remaining_color),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Personal Expense Tracker "),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    if app.report.records.is_empty() {
        let empty = Paragraph::new("\n  No expenses recorded yet. Press 'a' to add one.").block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Expense History "),
        );
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["ID", "Date", "Category", "Amount", "Description"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.report.records.iter().map(|r| {
        Row::new(vec![
            Cell::from(r.id.to_string()),
            Cell::from(r.date.format(DATE_FORMAT).to_string()),
            Cell::from(truncate(&r.category, 16)),
            Cell::from(r.amount.to_string()).style(Style::default().fg(Color::Red)),
            Cell::from(truncate(&r.description, 40)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expense History "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![Line::from("")];

    for (i, field) in FormField::ALL.iter().enumerate() {
        let focused = i == app.form.focus;
        let marker = if focused {
            Span::styled("→ ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            Span::raw("  ")
        };

        let value = match field {
            FormField::Date => app.form.date.clone(),
            FormField::Category => format!("◀ {} ▶", app.form.category()),
            FormField::Amount => app.form.amount.clone(),
            FormField::Description => app.form.description.clone(),
        };
        let value_style = if focused {
            Style::default().fg(Color::White).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Gray)
        };

        content.push(Line::from(vec![
            Span::raw("  "),
            marker,
            Span::styled(
                format!("{:<12}", field.label()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(value, value_style),
        ]));
        content.push(Line::from(""));
    }

    content.push(Line::from(vec![
        Span::styled("  Hint: ", Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC)),
        Span::styled(
            "↑/↓ field, ←/→ category, Enter add expense, Esc back",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ]));

    let form = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Add New Expense "),
    );

    f.render_widget(form, area);
}

fn render_insights(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let report = &app.report;

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Total Expenses:   ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(report.total.to_string()),
        ]),
        Line::from(vec![
            Span::styled("  Remaining Budget: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(
                report.remaining.to_string(),
                Style::default().fg(if report.over_budget { Color::Red } else { Color::Green }),
            ),
        ]),
    ];
    if report.over_budget {
        lines.push(Line::from(Span::styled(
            "  ⚠ You have exceeded your budget!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Distribution by Category",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));
    if report.shares.is_empty() {
        lines.push(Line::from("  No expenses recorded yet."));
    }
    for share in &report.shares {
        lines.push(Line::from(vec![
            Span::raw(format!("  {:<16}", truncate(&share.category, 16))),
            Span::raw(format!("{:>12}", share.total.to_string())),
            Span::styled(format!("{:>8.1}%", share.percent), Style::default().fg(Color::Cyan)),
        ]));
    }

    let summary = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expense Insights "),
    );
    f.render_widget(summary, chunks[0]);

    // Whole currency units: the chart only needs relative heights
    let labels: Vec<String> = report.by_month.iter().map(|m| m.label()).collect();
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(&report.by_month)
        .map(|(label, m)| (label.as_str(), (m.total.cents().max(0) / 100) as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Monthly Spending Trend "),
        )
        .data(data.as_slice())
        .bar_width(7)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::LightBlue))
        .value_style(Style::default().fg(Color::Black).bg(Color::LightBlue));
    f.render_widget(chart, chunks[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} expenses ", app.report.records.len()),
        Style::default().fg(Color::Cyan),
    )];

    match &app.notice {
        Some(Notice::Success(msg)) => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Green)));
        }
        Some(Notice::Error(msg)) => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Red)));
        }
        None => {}
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    if app.current_page != Page::AddExpense {
        status_spans.push(Span::styled("a", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Add | "));
        status_spans.push(Span::styled("e", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Export CSV | "));
        status_spans.push(Span::styled("+/-", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Budget | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    } else {
        status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Back"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
