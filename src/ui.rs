use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Panel};
use crate::reconcile::View;
use crate::selection::Mode;

pub fn draw(f: &mut Frame, app: &App) {
    let [main_area, bottom_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(f.area());

    let (comic_area, side_area) = if app.panel == Panel::Comic {
        (main_area, None)
    } else {
        let [comic, side] =
            Layout::horizontal([Constraint::Min(40), Constraint::Length(36)]).areas(main_area);
        (comic, Some(side))
    };

    render_comic(f, app, comic_area);
    if let Some(area) = side_area {
        render_settings(f, app, area);
    }
    render_status(f, app, bottom_area);
}

fn border(theme: Color, title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme))
        .title(Span::styled(format!(" {title} "), Style::default().fg(theme)))
}

fn render_comic(f: &mut Frame, app: &App, area: Rect) {
    let state = app.reconciler.state();
    let heading = match &state.loaded_comic {
        Some(comic) if matches!(app.reconciler.view(), View::Comic { .. }) => {
            format!("xkcd #{}", comic.identifier)
        }
        _ => "xkcd".to_string(),
    };
    let block = border(app.theme, &heading);
    let inner = block.inner(area);
    f.render_widget(block, area);

    match app.reconciler.view() {
        View::Loading => {
            f.render_widget(
                Paragraph::new("Loading")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(app.theme).add_modifier(Modifier::RAPID_BLINK)),
                inner,
            );
        }
        View::Comic { title, image_url, alt_text } => {
            let width = usize::from(inner.width.saturating_sub(1)).max(1);
            let mut lines = vec![
                Line::from(Span::styled(
                    title.to_string(),
                    Style::default().fg(app.theme).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    image_url.to_string(),
                    Style::default().add_modifier(Modifier::UNDERLINED),
                )),
                Line::from(""),
            ];
            lines.extend(
                textwrap::wrap(alt_text, width)
                    .into_iter()
                    .map(|w| Line::from(Span::styled(w.into_owned(), Style::default().add_modifier(Modifier::ITALIC)))),
            );
            f.render_widget(Paragraph::new(lines), inner);
        }
    }
}

fn render_settings(f: &mut Frame, app: &App, area: Rect) {
    let focused = if app.panel == Panel::EditingNumber { Color::Cyan } else { app.theme };
    let block = border(focused, "Comic settings");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let state = app.reconciler.state();
    let check = if state.mode == Mode::FollowLatest { "[x]" } else { "[ ]" };
    let mut lines = vec![Line::from(format!("{check} Display most recent comic?")), Line::from("")];

    if state.mode == Mode::Pinned {
        let label = match state.known_latest {
            Some(max) => format!("Comic number (max {max})"),
            None => "Comic number".to_string(),
        };
        lines.push(Line::from(Span::styled(label, Style::default().add_modifier(Modifier::BOLD))));

        let value = if app.panel == Panel::EditingNumber {
            Span::styled(format!("{}_", app.input), Style::default().fg(Color::Cyan))
        } else {
            Span::raw(state.pinned_number.map(|n| n.to_string()).unwrap_or_default())
        };
        lines.push(Line::from(value));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let bar = match &app.notice {
        Some(msg) => Paragraph::new(format!(" {msg} ")).style(Style::default().fg(Color::Red)),
        None => {
            let keys = match app.panel {
                Panel::EditingNumber => " [ 0-9: Type ] [ Enter: Apply ] [ Esc: Cancel ] ",
                Panel::Settings => " [ t: Toggle latest ] [ e: Comic number ] [ Esc: Close ] [ q: Quit ] ",
                Panel::Comic => " [ s: Settings ] [ t: Toggle latest ] [ q: Quit ] ",
            };
            Paragraph::new(keys).style(Style::default().bg(app.theme).fg(Color::Black))
        }
    };
    f.render_widget(bar, area);
}

/// HTML for embedding the comic in a page. Values are escaped here; the
/// reconciler hands them over verbatim.
pub fn markup(title: &str, image_url: &str, alt_text: &str) -> String {
    format!(
        "<div class=\"xkcd-comic\"><div class=\"xkcd-comic__title\">{}</div><img src=\"{}\" alt=\"{}\"/></div>",
        escape_html(title),
        escape_html(image_url),
        escape_html(alt_text),
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
