// Toolbar-facing state
//
// `SelectionStyle` describes what is already in the document under the
// selection. `InputStyle` is what the next typed characters will get.
// `ToolbarState` is the cache the toolbar paints from; the engine refreshes it
// from whichever of the two applies after every command.

use super::color::Color;
use super::rich_document::{LineHeight, StyleKind, TextRun, TextStyle};

/// State of one boolean attribute across a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrState {
    On,
    Off,
    Mixed,
}

impl AttrState {
    pub fn is_on(self) -> bool {
        self == AttrState::On
    }
}

/// Summary of the styles found in a selection
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStyle {
    pub bold: AttrState,
    pub italic: AttrState,
    pub underline: AttrState,
    /// Common color, `None` when runs differ or none is set
    pub color: Option<Color>,
}

impl SelectionStyle {
    /// Summarize the given runs. Returns `None` if there are no text runs.
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a TextRun>) -> Option<Self> {
        let styles: Vec<TextStyle> = runs.into_iter().map(|r| r.style).collect();
        let first = *styles.first()?;

        let attr = |kind: StyleKind| {
            let on = styles.iter().filter(|s| s.get(kind)).count();
            if on == styles.len() {
                AttrState::On
            } else if on == 0 {
                AttrState::Off
            } else {
                AttrState::Mixed
            }
        };

        let uniform_color = styles.iter().all(|s| s.color == first.color);

        Some(SelectionStyle {
            bold: attr(StyleKind::Bold),
            italic: attr(StyleKind::Italic),
            underline: attr(StyleKind::Underline),
            color: if uniform_color { first.color } else { None },
        })
    }

    pub fn get(&self, kind: StyleKind) -> AttrState {
        match kind {
            StyleKind::Bold => self.bold,
            StyleKind::Italic => self.italic,
            StyleKind::Underline => self.underline,
        }
    }
}

/// What the toolbar buttons currently show as active
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<Color>,
    pub line_height: LineHeight,
}

impl ToolbarState {
    pub fn is_active(&self, kind: StyleKind) -> bool {
        match kind {
            StyleKind::Bold => self.bold,
            StyleKind::Italic => self.italic,
            StyleKind::Underline => self.underline,
        }
    }

    /// Mirror the style the next keystroke will get
    pub fn reflect_input(&mut self, style: &TextStyle, line_height: LineHeight) {
        self.bold = style.bold;
        self.italic = style.italic;
        self.underline = style.underline;
        self.color = style.color;
        self.line_height = line_height;
    }

    /// Mirror a selection; mixed attributes show as inactive
    pub fn reflect_selection(&mut self, style: &SelectionStyle, line_height: LineHeight) {
        self.bold = style.bold.is_on();
        self.italic = style.italic.is_on();
        self.underline = style.underline.is_on();
        self.color = style.color;
        self.line_height = line_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_style_mixed() {
        let runs = [
            TextRun::new("a", TextStyle::bold()),
            TextRun::new("b", TextStyle::plain()),
        ];
        let style = SelectionStyle::from_runs(&runs).unwrap();
        assert_eq!(style.bold, AttrState::Mixed);
        assert_eq!(style.italic, AttrState::Off);
        assert_eq!(style.color, None);
    }

    #[test]
    fn test_selection_style_uniform_color() {
        let red = Color::rgb(255, 0, 0);
        let runs = [
            TextRun::new("a", TextStyle::bold().with_color(red)),
            TextRun::new("b", TextStyle::bold().with_color(red).with_font_size(18.0)),
        ];
        let style = SelectionStyle::from_runs(&runs).unwrap();
        assert_eq!(style.bold, AttrState::On);
        assert_eq!(style.color, Some(red));
    }

    #[test]
    fn test_selection_style_empty() {
        assert!(SelectionStyle::from_runs(std::iter::empty()).is_none());
    }

    #[test]
    fn test_toolbar_reflects_mixed_as_inactive() {
        let mut toolbar = ToolbarState::default();
        let style = SelectionStyle {
            bold: AttrState::Mixed,
            italic: AttrState::On,
            underline: AttrState::Off,
            color: None,
        };
        toolbar.reflect_selection(&style, LineHeight::Double);
        assert!(!toolbar.is_active(StyleKind::Bold));
        assert!(toolbar.is_active(StyleKind::Italic));
        assert_eq!(toolbar.line_height, LineHeight::Double);
    }
}
