// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use chipdesk_app::{
    AppCommand, AppMode, AppState, FormFields, FormKind, NotificationCenter, SearchDisplay,
    TabKind, Tone, form_hint,
};
use chipdesk_panel::{
    ActionKind, AdminPanel, Confirm, ListKind, ListSynchronizer, RenderedRow,
    Resource, SubmitButton,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::io;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const FALLBACK_DELETE_PROMPT: &str = "delete this row?";

/// Terminal-only state layered over the panel: row cursors, the active form
/// field, and an unanswered delete prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub chip_row: usize,
    pub cc_row: usize,
    pub field: usize,
    pub pending: Option<PendingDelete>,
    pub help_visible: bool,
}

/// The prompt is tied to the row key, not to a render, so a reload that
/// lands before the answer cannot retarget or swallow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub list: ListKind,
    pub key: String,
    pub prompt: &'static str,
}

/// The key the user pressed at the delete prompt.
#[derive(Debug, Clone, Copy)]
struct KeyAnswer(bool);

impl Confirm for KeyAnswer {
    fn confirm(&mut self, prompt: &str) -> bool {
        tracing::debug!(prompt, answer = self.0, "delete prompt answered");
        self.0
    }
}

pub fn run_app(panel: &mut AdminPanel) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view = ViewState::default();
    panel.start();

    let mut result = Ok(());
    loop {
        let now = Instant::now();
        panel.pump(now);
        panel.tick(now);

        if let Err(error) = terminal.draw(|frame| render(frame, panel, &view)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(POLL_INTERVAL).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(panel, &mut view, key, Instant::now()) {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Apply one key press. Returns true when the app should quit.
pub fn handle_key_event(
    panel: &mut AdminPanel,
    view: &mut ViewState,
    key: KeyEvent,
    now: Instant,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if let Some(pending) = view.pending.take() {
        answer_delete(panel, &pending, matches!(key.code, KeyCode::Char('y')), now);
        return false;
    }

    if view.help_visible {
        view.help_visible = false;
        return false;
    }

    match panel.state.mode {
        AppMode::Nav => handle_nav_key(panel, view, key, now),
        AppMode::Form(kind) => {
            handle_form_key(panel, view, kind, key, now);
            false
        }
    }
}

fn handle_nav_key(
    panel: &mut AdminPanel,
    view: &mut ViewState,
    key: KeyEvent,
    now: Instant,
) -> bool {
    let tab = panel.state.active_tab;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view.help_visible = true,
        KeyCode::Char('f') | KeyCode::Right | KeyCode::Tab => {
            panel.state.dispatch(AppCommand::NextTab);
        }
        KeyCode::Char('b') | KeyCode::Left | KeyCode::BackTab => {
            panel.state.dispatch(AppCommand::PrevTab);
        }
        KeyCode::Char(digit @ '1'..='5') => {
            let index = usize::from(digit as u8 - b'1');
            if let Some(tab) = TabKind::ALL.get(index) {
                panel.state.dispatch(AppCommand::SelectTab(*tab));
            }
        }
        KeyCode::Char('j') | KeyCode::Down => move_row(panel, view, 1),
        KeyCode::Char('k') | KeyCode::Up => move_row(panel, view, -1),
        KeyCode::Char('x') => dismiss_all(panel),
        KeyCode::Char('r') => match tab {
            TabKind::Chips => panel.reload_chips(),
            TabKind::CcEmails => panel.reload_cc_emails(),
            _ => {}
        },
        KeyCode::Char('a') => match tab {
            TabKind::Chips => open_form(panel, view, FormKind::AddChip),
            TabKind::CcEmails => open_form(panel, view, FormKind::AddCcEmail),
            _ => {}
        },
        KeyCode::Char('e') if tab == TabKind::Chips => edit_selected_chip(panel, view),
        KeyCode::Char('t') if tab == TabKind::CcEmails => {
            if let Some(handle) = panel.cc_emails().handle(view.cc_row, ActionKind::Toggle) {
                panel.toggle_cc_email(handle);
            }
        }
        KeyCode::Char('d') => begin_delete(panel, view),
        KeyCode::Char('i') if tab == TabKind::Search => {
            if panel.inquire() {
                open_form(panel, view, FormKind::Contact);
            }
        }
        KeyCode::Char('s') if tab == TabKind::Search => {
            panel.submit_search(now);
        }
        KeyCode::Enter | KeyCode::Char('/') => match tab {
            TabKind::Search => open_form(panel, view, FormKind::Search),
            TabKind::Chips => edit_selected_chip(panel, view),
            TabKind::CcEmails => open_form(panel, view, FormKind::AddCcEmail),
            TabKind::Settings => open_form(panel, view, FormKind::EmailSettings),
            TabKind::Contact => open_form(panel, view, FormKind::Contact),
        },
        _ => {}
    }
    false
}

fn handle_form_key(
    panel: &mut AdminPanel,
    view: &mut ViewState,
    kind: FormKind,
    key: KeyEvent,
    now: Instant,
) {
    let field_count = form_fields(panel, kind).map_or(0, |fields| fields.labels().len());
    match key.code {
        KeyCode::Esc => close_form(panel, kind),
        KeyCode::Down | KeyCode::Tab => {
            if field_count > 0 {
                view.field = (view.field + 1) % field_count;
            }
        }
        KeyCode::Up | KeyCode::BackTab => {
            if field_count > 0 {
                view.field = (view.field + field_count - 1) % field_count;
            }
        }
        KeyCode::Enter => submit_form(panel, kind, now),
        KeyCode::Backspace => {
            if let Some(value) = form_fields_mut(panel, kind).and_then(|f| f.field_mut(view.field))
            {
                value.pop();
            }
        }
        KeyCode::Char(ch) => {
            if let Some(value) = form_fields_mut(panel, kind).and_then(|f| f.field_mut(view.field))
            {
                value.push(ch);
            }
        }
        _ => {}
    }
}

fn submit_form(panel: &mut AdminPanel, kind: FormKind, now: Instant) {
    let leave = match kind {
        FormKind::Search => {
            panel.submit_search(now);
            !panel.search.take_focus_request()
        }
        FormKind::AddChip => panel.add_chip(now),
        // The editor closes itself once the update lands.
        FormKind::EditChip => {
            panel.save_chip_edit(now);
            false
        }
        FormKind::AddCcEmail => panel.add_cc_email(now),
        FormKind::EmailSettings => panel.update_email_settings(now),
        FormKind::Contact => panel.submit_contact(now),
    };
    if leave {
        panel.state.dispatch(AppCommand::ExitToNav);
    }
}

/// The editor form opens once the fetched chip arrives.
fn edit_selected_chip(panel: &mut AdminPanel, view: &mut ViewState) {
    if let Some(handle) = panel.chips().handle(view.chip_row, ActionKind::Edit) {
        view.field = 0;
        panel.open_chip_editor(handle);
    }
}

fn open_form(panel: &mut AdminPanel, view: &mut ViewState, kind: FormKind) {
    view.field = 0;
    panel.state.dispatch(AppCommand::OpenForm(kind));
}

fn close_form(panel: &mut AdminPanel, kind: FormKind) {
    if kind == FormKind::EditChip {
        panel.close_chip_editor();
    } else {
        panel.state.dispatch(AppCommand::ExitToNav);
    }
}

fn dismiss_all(panel: &mut AdminPanel) {
    let names = panel
        .notices()
        .visible()
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    for name in names {
        panel.dismiss(name);
    }
}

fn move_row(panel: &AdminPanel, view: &mut ViewState, delta: isize) {
    let (row, len) = match panel.state.active_tab {
        TabKind::Chips => (&mut view.chip_row, panel.chips().rows().len()),
        TabKind::CcEmails => (&mut view.cc_row, panel.cc_emails().rows().len()),
        _ => return,
    };
    *row = step(*row, len, delta);
}

fn step(row: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    row.min(max).saturating_add_signed(delta).min(max)
}

fn begin_delete(panel: &AdminPanel, view: &mut ViewState) {
    let pending = match panel.state.active_tab {
        TabKind::Chips => pending_delete(panel.chips(), ListKind::Chips, view.chip_row),
        TabKind::CcEmails => pending_delete(panel.cc_emails(), ListKind::CcEmails, view.cc_row),
        _ => None,
    };
    view.pending = pending;
}

fn pending_delete<R: Resource>(
    list: &ListSynchronizer<R>,
    kind: ListKind,
    row: usize,
) -> Option<PendingDelete> {
    let handle = list.handle(row, ActionKind::Delete)?;
    let key = list.rows().get(row).and_then(RenderedRow::key)?.to_owned();
    let prompt = list
        .action(handle)
        .and_then(|action| action.confirm)
        .unwrap_or(FALLBACK_DELETE_PROMPT);
    Some(PendingDelete {
        list: kind,
        key,
        prompt,
    })
}

fn answer_delete(panel: &mut AdminPanel, pending: &PendingDelete, accepted: bool, now: Instant) {
    if !accepted {
        tracing::debug!(key = %pending.key, "delete declined");
        return;
    }
    let mut answer = KeyAnswer(accepted);
    panel.delete_row(pending.list, &pending.key, &mut answer, now);
}

fn form_fields(panel: &AdminPanel, kind: FormKind) -> Option<&dyn FormFields> {
    match kind {
        FormKind::Search => Some(&panel.search.input),
        FormKind::AddChip => Some(&panel.chip_form),
        FormKind::EditChip => panel
            .editor()
            .map(|surface| &surface.form as &dyn FormFields),
        FormKind::AddCcEmail => Some(&panel.cc_form),
        FormKind::EmailSettings => Some(&panel.settings.form),
        FormKind::Contact => Some(&panel.contact.form),
    }
}

fn form_fields_mut(panel: &mut AdminPanel, kind: FormKind) -> Option<&mut dyn FormFields> {
    match kind {
        FormKind::Search => Some(&mut panel.search.input),
        FormKind::AddChip => Some(&mut panel.chip_form),
        FormKind::EditChip => panel
            .editor_mut()
            .map(|surface| &mut surface.form as &mut dyn FormFields),
        FormKind::AddCcEmail => Some(&mut panel.cc_form),
        FormKind::EmailSettings => Some(&mut panel.settings.form),
        FormKind::Contact => Some(&mut panel.contact.form),
    }
}

fn render(frame: &mut ratatui::Frame<'_>, panel: &AdminPanel, view: &ViewState) {
    let notices = notice_lines(panel.notices());
    let status_height = u16::try_from(notices.len()).unwrap_or(u16::MAX).saturating_add(3);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(status_height),
        ])
        .split(frame.area());

    let selected = TabKind::ALL
        .iter()
        .position(|tab| *tab == panel.state.active_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(tab_titles())
        .block(Block::default().title("chipdesk").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    let active = |kind: FormKind| (panel.state.form() == Some(kind)).then_some(view.field);
    match panel.state.active_tab {
        TabKind::Search => {
            let mut lines = form_lines(&panel.search.input, active(FormKind::Search));
            lines.extend(search_detail_lines(
                panel.search.display(),
                panel.search.button(),
            ));
            render_text(frame, layout[1], "search", lines);
        }
        TabKind::Chips => render_list(frame, layout[1], panel.chips(), view.chip_row),
        TabKind::CcEmails => render_list(frame, layout[1], panel.cc_emails(), view.cc_row),
        TabKind::Settings => {
            let lines = form_lines(&panel.settings.form, active(FormKind::EmailSettings));
            render_text(frame, layout[1], "email settings", lines);
        }
        TabKind::Contact => {
            let lines = form_lines(&panel.contact.form, active(FormKind::Contact));
            render_text(frame, layout[1], "contact", lines);
        }
    }

    let mut status = notices
        .into_iter()
        .map(|(tone, text)| Line::styled(text, tone_style(tone)))
        .collect::<Vec<_>>();
    status.push(Line::styled(
        status_text(&panel.state, view),
        Style::default().fg(Color::Yellow),
    ));
    let status_widget = Paragraph::new(status).block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(kind) = panel.state.form().filter(|kind| is_overlay_form(*kind))
        && let Some(fields) = form_fields(panel, kind)
    {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let form = Paragraph::new(form_lines(fields, Some(view.field)).join("\n")).block(
            Block::default()
                .title(kind.label())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(form, area);
    }

    if let Some(pending) = &view.pending {
        let area = centered_rect(40, 20, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(format!("{} (y/n)", pending.prompt)).block(
            Block::default()
                .title("confirm")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(prompt, area);
    }

    if view.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_text(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str, lines: Vec<String>) {
    let body = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title(title.to_owned()));
    frame.render_widget(body, area);
}

fn render_list<R: Resource>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    list: &ListSynchronizer<R>,
    selected: usize,
) {
    if !list.is_loaded() {
        let loading = Paragraph::new("loading...")
            .block(Block::default().borders(Borders::ALL).title(R::TITLE));
        frame.render_widget(loading, area);
        return;
    }

    let header_cells = R::COLUMNS.iter().copied().chain(["actions"]).map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells);
    let selected = step(selected, list.rows().len(), 0);

    let rows = table_text(list.rows())
        .into_iter()
        .enumerate()
        .map(|(row_index, cells)| {
            let placeholder = matches!(list.rows().get(row_index), Some(RenderedRow::Placeholder(_)));
            let mut style = Style::default();
            if placeholder {
                style = style.fg(Color::DarkGray);
            } else if row_index == selected {
                style = style.bg(Color::DarkGray);
            }
            Row::new(cells.into_iter().map(Cell::from)).style(style)
        })
        .collect::<Vec<_>>();

    let widths = vec![Constraint::Min(8); R::COLUMNS.len() + 1];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().borders(Borders::ALL).title(R::TITLE));
    frame.render_widget(table, area);
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Success => Style::default().fg(Color::Green),
        Tone::Failure => Style::default().fg(Color::Red),
    }
}

const fn is_overlay_form(kind: FormKind) -> bool {
    matches!(
        kind,
        FormKind::AddChip | FormKind::EditChip | FormKind::AddCcEmail
    )
}

fn tab_titles() -> Vec<String> {
    TabKind::ALL
        .iter()
        .enumerate()
        .map(|(index, tab)| format!("{} {}", index + 1, tab.label()))
        .collect()
}

/// One line per field; the active one is marked and shows a cursor.
fn form_lines(fields: &dyn FormFields, active: Option<usize>) -> Vec<String> {
    fields
        .labels()
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let value = fields.field(index).unwrap_or_default();
            if active == Some(index) {
                format!("> {label}: {value}_")
            } else {
                format!("  {label}: {value}")
            }
        })
        .collect()
}

fn search_detail_lines(display: Option<&SearchDisplay>, button: &SubmitButton) -> Vec<String> {
    let mut lines = vec![String::new(), format!("[ {} ]", button.label())];
    let Some(display) = display else {
        return lines;
    };
    lines.push(String::new());
    lines.push(format!("model:       {}", display.model));
    lines.push(format!("description: {}", display.description));
    lines.push(format!(
        "stock:       {} ({})",
        display.stock_text(),
        display.tier.label()
    ));
    lines.push(format!("price:       {}", display.price_text));
    if display.has_model() {
        lines.push(String::new());
        lines.push("press i to ask for a quote".to_owned());
    }
    lines
}

fn table_text(rows: &[RenderedRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| match row {
            RenderedRow::Placeholder(text) => vec![(*text).to_owned()],
            RenderedRow::Item(item) => {
                let actions = item
                    .actions
                    .iter()
                    .map(|action| action.label)
                    .collect::<Vec<_>>()
                    .join(" / ");
                item.cells.iter().cloned().chain([actions]).collect()
            }
        })
        .collect()
}

fn notice_lines(notices: &NotificationCenter) -> Vec<(Tone, String)> {
    notices
        .visible()
        .map(|(_, state)| (state.tone, state.message.clone()))
        .collect()
}

fn status_text(state: &AppState, view: &ViewState) -> String {
    if let Some(pending) = &view.pending {
        return format!("{} (y/n)", pending.prompt);
    }
    match state.form() {
        Some(kind) => form_hint(kind).to_owned(),
        None => match state.active_tab {
            TabKind::Search => "enter type model | s search | i inquire | ? help | q quit",
            TabKind::Chips => "j/k rows | a add | e edit | d delete | r reload | ? help",
            TabKind::CcEmails => "j/k rows | a add | t toggle | d delete | r reload | ? help",
            TabKind::Settings | TabKind::Contact => "enter edit form | b/f tabs | ? help",
        }
        .to_owned(),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help | x dismiss notices\n\
nav: b/f or left/right tabs | 1-5 jump to tab | j/k rows | q quit\n\
search: enter type model | s search | i inquire about the result\n\
chips: a add | e or enter edit | d delete | r reload\n\
cc emails: a add | t activate/deactivate | d delete | r reload\n\
form: up/down field | enter submit | esc cancel\n\
delete prompt: y confirm | any other key cancels"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
