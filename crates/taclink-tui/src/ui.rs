use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::app::{message_line_count, App};
use taclink_core::{Mode, Message};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_settings {
        render_settings(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mode_label = match app.engine.mode() {
        Mode::Image => " IMAGE ",
        Mode::Video => " VIDEO ",
    };

    let title = Line::from(vec![
        Span::styled(
            " TACLINK // DATA UPLINK ",
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(mode_label, Style::default().bg(Color::Cyan).fg(Color::Black)),
        Span::raw(" "),
        Span::styled(
            app.engine.endpoint_url().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Transmission Log ");

    let inner_area = block.inner(area);
    app.chat_height = inner_area.height;
    app.chat_width = inner_area.width;

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.engine.messages() {
        push_message_lines(&mut lines, msg);
    }

    if app.engine.is_waiting() {
        lines.push(role_line(false));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("PROCESSING REQUEST{dots}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines: u16 = app
        .engine
        .messages()
        .iter()
        .map(|m| message_line_count(m, app.chat_width.max(1) as usize))
        .sum::<u16>()
        .saturating_add(if app.engine.is_waiting() { 2 } else { 0 });

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    if total_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn role_line(is_user: bool) -> Line<'static> {
    if is_user {
        Line::from(Span::styled(
            "YOU //",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(
            "TACLINK //",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    }
}

fn push_message_lines(lines: &mut Vec<Line<'static>>, msg: &Message) {
    lines.push(role_line(msg.is_user));

    if let Some(text) = &msg.text {
        for line in text.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    if let Some(image) = &msg.image {
        lines.push(Line::from(Span::styled(
            format!("[image] {image}"),
            Style::default().fg(Color::Green),
        )));
    }
    if let Some(video) = &msg.video {
        lines.push(Line::from(Span::styled(
            format!("[video] {video}"),
            Style::default().fg(Color::Magenta),
        )));
    }

    lines.push(Line::default());
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.show_settings {
        Color::DarkGray
    } else {
        Color::Yellow
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Prompt ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if !app.show_settings {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.show_settings {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" confirm ", label_style),
            Span::styled(" Ctrl+R ", key_style),
            Span::styled(" default ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" mode ", label_style),
            Span::styled(" Ctrl+O ", key_style),
            Span::styled(" endpoint ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Ctrl+C ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    let waiting_indicator = if app.engine.is_waiting() {
        Span::styled(" LINK BUSY ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        Span::styled(" LINK IDLE ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let footer_content = Line::from(
        vec![waiting_indicator, Span::styled(" ", label_style)]
            .into_iter()
            .chain(hints)
            .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_settings(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = 7;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Endpoint Configuration ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions =
        Paragraph::new("Target endpoint URL. Enter to confirm, Ctrl+R for default, Esc to cancel.")
            .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    // Input field with horizontal scrolling so the cursor stays visible
    let field_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let field_width = field_area.width as usize;

    let scroll_offset = if field_width == 0 {
        0
    } else if app.settings_cursor >= field_width {
        app.settings_cursor - field_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .settings_input
        .chars()
        .skip(scroll_offset)
        .take(field_width)
        .collect();

    let field = Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan));
    frame.render_widget(field, field_area);

    let cursor_x = (app.settings_cursor - scroll_offset).min(field_width) as u16;
    frame.set_cursor_position((field_area.x + cursor_x, field_area.y));

    let note = Paragraph::new("Changes to the endpoint are persisted on confirm.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(note, Rect::new(inner.x, inner.y + 4, inner.width, 1));
}
