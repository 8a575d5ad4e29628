use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// First index to draw so that `selected` stays inside a window of
/// `capacity` rows over `len` items.
pub(crate) fn window_start(selected: usize, capacity: usize, len: usize) -> usize {
    let capacity = capacity.max(1);
    let mut start = if selected >= capacity {
        selected + 1 - capacity
    } else {
        0
    };
    if start + capacity > len {
        start = len.saturating_sub(capacity);
    }
    start
}

/// Footer line of `[key] Action` pairs.
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (idx, (key, action)) in hints.iter().enumerate() {
        let separator = if idx + 1 < hints.len() { "   " } else { "" };
        spans.push(Span::styled(format!("[{key}]"), key_style));
        spans.push(Span::raw(format!(" {action}{separator}")));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn window_keeps_selection_visible() {
        assert_eq!(window_start(0, 4, 10), 0);
        assert_eq!(window_start(3, 4, 10), 0);
        assert_eq!(window_start(4, 4, 10), 1);
        assert_eq!(window_start(9, 4, 10), 6);
        assert_eq!(window_start(2, 4, 3), 0);
        assert_eq!(window_start(5, 0, 10), 5);
    }

    #[test]
    fn surfaces_innermost_cause() {
        let err = Err::<(), _>(anyhow::anyhow!("Song not found"))
            .context("failed to delete song")
            .unwrap_err();
        assert_eq!(surface_error(&err), "Song not found");
    }

    #[test]
    fn hints_alternate_keys_and_actions() {
        let line = key_hints(&[("q", "Quit"), ("f", "Favorite")]);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "[q] Quit   [f] Favorite");
    }
}
