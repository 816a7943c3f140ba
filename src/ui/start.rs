use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;
use crate::models::TextSource;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(11),
        Constraint::Fill(1),
    ])
    .split(area);

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "PAGE QUIZ",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
    ];

    if app.has_preloaded_questions() {
        content.push(Line::from("Questions loaded from file".fg(Color::DarkGray)));
        content.push(Line::from(""));
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(
            "ENTER",
            Style::default().fg(Color::Green).bold(),
        )));
        content.push(Line::from("to start".fg(Color::DarkGray)));
    } else {
        content.push(Line::from("Generate a quiz from".fg(Color::DarkGray)));
        content.push(Line::from(""));
        content.push(source_line(app, TextSource::FullPage, 'f'));
        content.push(source_line(app, TextSource::Selection, 's'));
        content.push(Line::from(""));
        content.push(Line::from(
            "j/k choose  ·  enter start  ·  q quit".fg(Color::DarkGray),
        ));
    }

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );

    frame.render_widget(widget, chunks[1]);
}

fn source_line(app: &App, source: TextSource, key: char) -> Line<'static> {
    let is_selected = app.source() == source;
    let style = if is_selected {
        Style::default().fg(Color::Green).bold()
    } else {
        Style::default().fg(Color::Gray)
    };
    let marker = if is_selected { ">" } else { " " };

    Line::from(vec![
        Span::styled(format!("{} [{}] ", marker, key), style),
        Span::styled(source.label(), style),
    ])
}
