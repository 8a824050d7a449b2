use crate::app::{ActiveInput, App, Focus};
use crate::models::Task;
use crate::state::ViewState;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

// Fixed-size rect centred in `area`, clipped to it.
fn popup_area(width: u16, height: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    popup
}

fn key_style() -> Style {
    Style::default().fg(Color::Red)
}

fn get_legend(focus: Focus) -> Text<'static> {
    match focus {
        Focus::List => Text::from(Line::from(vec![
            Span::styled(" q ", key_style()),
            Span::raw(": Quit "),
            Span::styled(" j/k ", key_style()),
            Span::raw(": Move "),
            Span::styled(" a ", key_style()),
            Span::raw(": Add "),
            Span::styled(" e ", key_style()),
            Span::raw(": Edit "),
            Span::styled(" Space ", key_style()),
            Span::raw(": Toggle Done "),
            Span::styled(" d ", key_style()),
            Span::raw(": Delete "),
            Span::styled(" r ", key_style()),
            Span::raw(": Reload "),
        ])),
        Focus::Create(_) => Text::from(Line::from(vec![
            Span::styled(" Enter ", key_style()),
            Span::raw(": Add "),
            Span::styled(" Tab ", key_style()),
            Span::raw(": Switch Field "),
            Span::styled(" Esc ", key_style()),
            Span::raw(": Back to List "),
        ])),
        Focus::Edit(_) => Text::from(Line::from(vec![
            Span::styled(" Enter ", key_style()),
            Span::raw(": Save "),
            Span::styled(" Tab ", key_style()),
            Span::raw(": Switch Field "),
            Span::styled(" Esc ", key_style()),
            Span::raw(": Cancel "),
        ])),
    }
}

fn input_line<'a>(label: &'a str, value: &'a str, placeholder: &'a str, active: bool) -> Line<'a> {
    let label_style = if active {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let value_span = if value.is_empty() {
        Span::styled(placeholder, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(value)
    };
    let mut spans = vec![Span::styled(label, label_style), value_span];
    if active {
        spans.push(Span::styled("_", Style::default().fg(Color::Green)));
    }
    Line::from(spans)
}

fn task_item<'a>(state: &'a ViewState, focus: Focus, task: &'a Task) -> ListItem<'a> {
    let mut title_style = Style::default().add_modifier(Modifier::BOLD);
    if task.completed {
        title_style = title_style
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    let checkbox = if task.completed { "[x] " } else { "[ ] " };
    let mut lines = vec![Line::from(vec![
        Span::raw(checkbox),
        Span::styled(task.title.as_str(), title_style),
    ])];

    if state.is_editing(task.id) {
        let active = match focus {
            Focus::Edit(active) => Some(active),
            _ => None,
        };
        lines.push(input_line(
            "    Title: ",
            &state.edit_draft_title,
            "",
            active == Some(ActiveInput::Title),
        ));
        lines.push(input_line(
            "    Description: ",
            &state.edit_draft_description,
            "",
            active == Some(ActiveInput::Description),
        ));
    } else {
        if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(Line::from(format!("    {}", desc)));
        }
        lines.push(Line::from(Span::styled(
            format!("    Created: {}", task.created_display()),
            Style::default().fg(Color::DarkGray),
        )));
    }
    ListItem::new(lines)
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    let header = Paragraph::new(Span::styled(
        "ToDo App",
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    // Creation form
    let create_active = match app.focus {
        Focus::Create(active) => Some(active),
        _ => None,
    };
    let form_border = if create_active.is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let form = Paragraph::new(vec![
        input_line(
            "Title: ",
            &app.state.draft_title,
            "Title",
            create_active == Some(ActiveInput::Title),
        ),
        input_line(
            "Description: ",
            &app.state.draft_description,
            "Description (optional)",
            create_active == Some(ActiveInput::Description),
        ),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(form_border)
            .title("New Todo"),
    );
    f.render_widget(form, chunks[1]);

    // Task list
    let list_block = Block::default().borders(Borders::ALL).title("Todos");
    if app.state.loading {
        f.render_widget(Paragraph::new("Loading...").block(list_block), chunks[2]);
    } else if app.state.tasks.is_empty() {
        f.render_widget(Paragraph::new("No todos yet.").block(list_block), chunks[2]);
    } else {
        let items: Vec<ListItem> = app
            .state
            .tasks
            .iter()
            .map(|task| task_item(&app.state, app.focus, task))
            .collect();
        let list = List::new(items)
            .block(list_block)
            .highlight_style(Style::default().fg(Color::Green))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, chunks[2], &mut app.list_state);
    }

    let legend = Paragraph::new(get_legend(app.focus))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(legend, chunks[3]);

    if app.state.pending_delete.is_some() {
        render_popup(f, "Confirm", "Delete this todo? (y/n)", Color::Yellow);
    }
    if let Some(notice) = &app.state.notice {
        render_popup(f, "Notice (any key to close)", notice, Color::Red);
    }
}

fn render_popup(f: &mut Frame, title: &str, message: &str, color: Color) {
    let size = f.area();
    let width = std::cmp::min(size.width, 50);
    let inner_width = width.saturating_sub(2).max(1);
    let lines_required = calculate_wrapped_lines(message, inner_width).max(1) as u16;
    let height = std::cmp::min(lines_required + 2, size.height);
    let area = popup_area(width, height, size);

    let popup = Paragraph::new(message.to_string())
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_input(key) {
                    return Ok(());
                }
            }
        }

        app.drain_completions();
    }
}

fn calculate_wrapped_lines(text: &str, max_width: u16) -> usize {
    let mut line_count = 0;
    for line in text.lines() {
        let line_width = line.chars().count() as u16;
        line_count += std::cmp::max(1, line_width.div_ceil(max_width)) as usize;
    }
    line_count
}
