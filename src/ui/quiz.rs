use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};

use crate::app::App;
use crate::models::Question;
use crate::session::{Phase, QuizSession};

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(session) = app.session() else {
        return;
    };
    let question = session.current_question();

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .margin(2)
    .split(area);

    render_progress(frame, chunks[0], session);
    render_question_text(frame, chunks[1], &question.question);
    render_options(frame, chunks[2], question, session, app.cursor());
    render_feedback(frame, chunks[3], question, session);
    render_controls(frame, chunks[4], session.phase());
}

fn render_progress(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let progress = format!(
        "Question {} of {}  ·  score {}",
        session.current_question_number(),
        session.total(),
        session.score()
    );
    let widget = Paragraph::new(progress)
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn option_style(index: usize, question: &Question, session: &QuizSession, cursor: usize) -> Style {
    let is_selected = session.selected() == Some(index);
    match session.phase() {
        Phase::Answering if is_selected => Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
        Phase::Answering if index == cursor => Style::default().fg(Color::Cyan).bold(),
        Phase::Answering => Style::default().fg(Color::Gray),
        _ if question.is_correct(index) => Style::default().fg(Color::Green).bold(),
        _ if session.answers()[session.current_index()] == Some(index) => {
            Style::default().fg(Color::Red).bold()
        }
        _ => Style::default().fg(Color::DarkGray),
    }
}

fn render_options(
    frame: &mut Frame,
    area: Rect,
    question: &Question,
    session: &QuizSession,
    cursor: usize,
) {
    let mut lines: Vec<Line> = Vec::with_capacity(question.answers.len() * 2);
    let answering = session.phase() == Phase::Answering;

    for (index, answer) in question.answers.iter().enumerate() {
        let style = option_style(index, question, session, cursor);
        let marker = if answering && index == cursor { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(format!("{}. ", OPTION_LABELS[index]), style),
            Span::styled(answer.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_feedback(frame: &mut Frame, area: Rect, question: &Question, session: &QuizSession) {
    if session.phase() == Phase::Answering {
        return;
    }
    let chosen = session.answers()[session.current_index()];
    let line = if chosen.is_some_and(|c| question.is_correct(c)) {
        Line::from("Correct!".fg(Color::Green).bold())
    } else {
        Line::from(vec![
            "Incorrect. ".fg(Color::Red).bold(),
            Span::raw(format!(
                "The answer is {}. {}",
                OPTION_LABELS[question.correct],
                question.correct_answer()
            )),
        ])
    };
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

fn render_controls(frame: &mut Frame, area: Rect, phase: Phase) {
    let hint = match phase {
        Phase::Answering => "j/k navigate  ·  1-4 pick  ·  enter select/submit  ·  q quit",
        Phase::Revealed => "enter/n next question  ·  q quit",
        Phase::Finished => "enter results  ·  q quit",
    };
    let widget = Paragraph::new(hint)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
