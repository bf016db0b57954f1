//! Styles for the qnote CLI.
//!
//! Renderers never pick colors directly. They ask for a semantic style (an
//! index, a time, a warning) and this module decides what it looks like, so
//! the look can change in one place.
//!
//! Styles are applied with `force_styling`, which lets the renderer decide
//! whether to emit ANSI codes (terminal) or not (pipes, tests).

use console::{Style, StyledObject};

/// Semantic style identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleName {
    Regular,
    Muted,
    Faint,
    Title,
    Time,
    Pinned,
    ListIndex,
    Synced,
    Pending,
    LocalOnly,
    Public,
    Info,
    Success,
    Warning,
    Error,
}

fn style_for(name: StyleName) -> Style {
    let muted = Style::new().color256(244);
    match name {
        StyleName::Regular => Style::new(),
        StyleName::Muted => muted,
        StyleName::Faint => Style::new().color256(249),
        StyleName::Title => Style::new().bold(),
        StyleName::Time => muted.italic(),
        StyleName::Pinned => Style::new().color256(178).bold(),
        StyleName::ListIndex => Style::new().color256(178),
        StyleName::Synced => Style::new().green(),
        StyleName::Pending => Style::new().yellow(),
        StyleName::LocalOnly => Style::new().magenta(),
        StyleName::Public => Style::new().cyan(),
        StyleName::Info => muted,
        StyleName::Success => Style::new().green(),
        StyleName::Warning => Style::new().yellow().bold(),
        StyleName::Error => Style::new().red().bold(),
    }
}

/// Applies `name` to `text`, emitting ANSI codes only when `color` is set.
pub fn paint<D>(name: StyleName, text: D, color: bool) -> StyledObject<D> {
    style_for(name).force_styling(color).apply_to(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_without_color_is_plain() {
        let painted = paint(StyleName::Warning, "careful", false).to_string();
        assert_eq!(painted, "careful");
    }

    #[test]
    fn test_paint_with_color_adds_codes() {
        let painted = paint(StyleName::Error, "broken", true).to_string();
        assert!(painted.contains("broken"));
        assert!(painted.contains('\u{1b}'));
    }
}
