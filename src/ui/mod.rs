mod loading;
mod quiz;
mod result;
mod start;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::models::AppState;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match app.state {
        AppState::Start => start::render(frame, area, app),
        AppState::Loading => loading::render(frame, area, app),
        AppState::Quiz => quiz::render(frame, area, app),
        AppState::Result => result::render(frame, area, app),
    }

    if let Some(alert) = app.alert() {
        render_alert(frame, area, alert);
    }
}

/// Modal message box; any key dismisses it.
fn render_alert(frame: &mut Frame, area: Rect, message: &str) {
    let [_, row, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(7),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, popup, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Percentage(60),
        Constraint::Fill(1),
    ])
    .areas(row);

    let content = vec![
        Line::from(message.fg(Color::White)),
        Line::from(""),
        Line::from("press any key".fg(Color::DarkGray)),
    ];
    let widget = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Color::Yellow)
                .padding(Padding::uniform(1)),
        );

    frame.render_widget(Clear, popup);
    frame.render_widget(widget, popup);
}
