// Toolbar Script
// Toolbar actions in a line-oriented text form, used by the `richpad` binary
// to drive the editor the way the toolbar and file input would. One action
// per line, `#` starts a comment:
//
//     type Hello world
//     select 6 11
//     bold
//     color #ff0000
//     font +1
//     line-height 1.5
//     image picture.png
//     show
//
// Everything after `type ` is typed verbatim, including trailing spaces.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::error::{EditError, EditResult};
use crate::image_upload::ImageFile;
use crate::richtext::color::Color;
use crate::richtext::rich_document::{LineHeight, StyleKind};
use crate::richtext::rich_editor::RichEditor;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    Type(String),
    Select { start: usize, end: usize },
    SelectAll,
    SelectWord(usize),
    Cursor(usize),
    Toggle(StyleKind),
    Color(Color),
    FontSize(i32),
    LineHeight(LineHeight),
    /// `None` models a file input change with no file chosen
    Image(Option<PathBuf>),
    Backspace,
    Delete,
    Clear,
    Show,
    Dump,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("`{action}` expects {expected}")]
    BadArgument {
        action: String,
        expected: &'static str,
    },
}

/// Outcome of applying one action
#[derive(Debug, PartialEq)]
pub enum Applied {
    Done,
    /// The script asked to see the rendered view
    Show,
    /// The script asked for the debug dump
    Dump,
}

fn bad(action: &str, expected: &'static str) -> ParseError {
    ParseError::BadArgument {
        action: action.to_string(),
        expected,
    }
}

fn parse_offset(action: &str, raw: Option<&str>) -> Result<usize, ParseError> {
    raw.and_then(|s| s.parse().ok())
        .ok_or_else(|| bad(action, "a character offset"))
}

impl FromStr for ToolbarAction {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start().trim_end_matches(['\r', '\n']);
        let (action, raw) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = raw.trim();
        let mut args = rest.split_whitespace();

        let parsed = match action {
            "type" => ToolbarAction::Type(raw.replace("\\n", "\n")),
            "select" => {
                let start = parse_offset(action, args.next())?;
                let end = parse_offset(action, args.next())?;
                ToolbarAction::Select { start, end }
            }
            "select-all" => ToolbarAction::SelectAll,
            "word" => ToolbarAction::SelectWord(parse_offset(action, args.next())?),
            "cursor" => ToolbarAction::Cursor(parse_offset(action, args.next())?),
            "bold" => ToolbarAction::Toggle(StyleKind::Bold),
            "italic" => ToolbarAction::Toggle(StyleKind::Italic),
            "underline" => ToolbarAction::Toggle(StyleKind::Underline),
            "color" => ToolbarAction::Color(rest.parse().map_err(|_| bad(action, "a color"))?),
            "font" => ToolbarAction::FontSize(
                rest.trim_start_matches('+')
                    .parse()
                    .map_err(|_| bad(action, "a signed px delta"))?,
            ),
            "line-height" => ToolbarAction::LineHeight(
                rest.parse()
                    .map_err(|_| bad(action, "normal, 1.5 or 2"))?,
            ),
            "image" => ToolbarAction::Image((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "backspace" => ToolbarAction::Backspace,
            "delete" => ToolbarAction::Delete,
            "clear" => ToolbarAction::Clear,
            "show" => ToolbarAction::Show,
            "dump" => ToolbarAction::Dump,
            other => return Err(ParseError::UnknownAction(other.to_string())),
        };
        Ok(parsed)
    }
}

impl fmt::Display for ToolbarAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolbarAction::Type(text) => write!(f, "type {}", text.replace('\n', "\\n")),
            ToolbarAction::Select { start, end } => write!(f, "select {} {}", start, end),
            ToolbarAction::SelectAll => write!(f, "select-all"),
            ToolbarAction::SelectWord(offset) => write!(f, "word {}", offset),
            ToolbarAction::Cursor(offset) => write!(f, "cursor {}", offset),
            ToolbarAction::Toggle(StyleKind::Bold) => write!(f, "bold"),
            ToolbarAction::Toggle(StyleKind::Italic) => write!(f, "italic"),
            ToolbarAction::Toggle(StyleKind::Underline) => write!(f, "underline"),
            ToolbarAction::Color(color) => write!(f, "color {}", color),
            ToolbarAction::FontSize(delta) => write!(f, "font {:+}", delta),
            ToolbarAction::LineHeight(lh) => write!(f, "line-height {}", lh),
            ToolbarAction::Image(Some(path)) => write!(f, "image {}", path.display()),
            ToolbarAction::Image(None) => write!(f, "image"),
            ToolbarAction::Backspace => write!(f, "backspace"),
            ToolbarAction::Delete => write!(f, "delete"),
            ToolbarAction::Clear => write!(f, "clear"),
            ToolbarAction::Show => write!(f, "show"),
            ToolbarAction::Dump => write!(f, "dump"),
        }
    }
}

/// Parse a whole script. Blank lines and `#` comments are skipped.
/// Errors carry the 1-based line number.
pub fn parse_script(source: &str) -> Result<Vec<ToolbarAction>, (usize, ParseError)> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| line.parse().map_err(|err| (i + 1, err)))
        .collect()
}

/// Guess the MIME type the browser would report for a picked file
pub fn mime_for_path(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

fn read_image_file(path: &Path) -> std::io::Result<ImageFile> {
    let bytes = fs::read(path)?;
    Ok(ImageFile::new(bytes, mime_for_path(path)))
}

impl ToolbarAction {
    /// Apply the action. Image files are read here; a file that cannot be
    /// read is treated like an empty file input.
    pub fn apply(&self, editor: &mut RichEditor) -> Result<Applied, EditError> {
        let result: EditResult = match self {
            ToolbarAction::Type(text) => editor.insert_text(text),
            ToolbarAction::Select { start, end } => {
                editor.set_selection(*start, *end);
                Ok(())
            }
            ToolbarAction::SelectAll => {
                editor.select_all();
                Ok(())
            }
            ToolbarAction::SelectWord(offset) => {
                editor.select_word_at(*offset);
                Ok(())
            }
            ToolbarAction::Cursor(offset) => {
                editor.set_cursor(*offset);
                Ok(())
            }
            ToolbarAction::Toggle(kind) => editor.toggle_style(*kind),
            ToolbarAction::Color(color) => editor.set_color(*color),
            ToolbarAction::FontSize(delta) => editor.adjust_font_size(*delta),
            ToolbarAction::LineHeight(lh) => editor.set_line_height(*lh),
            ToolbarAction::Image(path) => {
                let file = path.as_deref().and_then(|path| match read_image_file(path) {
                    Ok(file) => Some(file),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), "cannot read image: {err}");
                        None
                    }
                });
                editor.insert_image(file)
            }
            ToolbarAction::Backspace => editor.delete_backward(),
            ToolbarAction::Delete => editor.delete_forward(),
            ToolbarAction::Clear => {
                editor.clear();
                Ok(())
            }
            ToolbarAction::Show => return Ok(Applied::Show),
            ToolbarAction::Dump => return Ok(Applied::Dump),
        };
        result.map(|()| Applied::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            "type Hello world".parse(),
            Ok(ToolbarAction::Type("Hello world".to_string()))
        );
        assert_eq!(
            "select 6 11".parse(),
            Ok(ToolbarAction::Select { start: 6, end: 11 })
        );
        assert_eq!("font +1".parse(), Ok(ToolbarAction::FontSize(1)));
        assert_eq!("font -2".parse(), Ok(ToolbarAction::FontSize(-2)));
        assert_eq!(
            "line-height 1.5".parse(),
            Ok(ToolbarAction::LineHeight(LineHeight::OneAndHalf))
        );
        assert_eq!("image".parse(), Ok(ToolbarAction::Image(None)));
        assert_eq!(
            "color #00ff00".parse(),
            Ok(ToolbarAction::Color(Color::rgb(0, 255, 0)))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "wiggle".parse::<ToolbarAction>(),
            Err(ParseError::UnknownAction("wiggle".to_string()))
        );
        assert!(matches!(
            "select 1".parse::<ToolbarAction>(),
            Err(ParseError::BadArgument { .. })
        ));
        assert!("font big".parse::<ToolbarAction>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for line in ["type a\\nb", "select 1 4", "font +3", "font -1", "line-height 2", "color #123456"] {
            let action: ToolbarAction = line.parse().unwrap();
            assert_eq!(action.to_string(), line);
        }
    }

    #[test]
    fn test_type_keeps_surrounding_spaces() {
        assert_eq!(
            "type Hello ".parse(),
            Ok(ToolbarAction::Type("Hello ".to_string()))
        );
        assert_eq!(
            "type  indented".parse(),
            Ok(ToolbarAction::Type(" indented".to_string()))
        );

        let mut editor = RichEditor::new();
        for action in parse_script("type Hello \ntype world\n").unwrap() {
            action.apply(&mut editor).unwrap();
        }
        assert_eq!(editor.document().to_plain_text(), "Hello world");
    }

    #[test]
    fn test_parse_script_reports_line() {
        let script = "# intro\ntype hi\n\nbogus\n";
        assert_eq!(
            parse_script(script),
            Err((4, ParseError::UnknownAction("bogus".to_string())))
        );
    }

    #[test]
    fn test_apply_script() {
        let actions = parse_script("type Hello world\nselect 6 11\nbold\nfont +1\nshow\n").unwrap();
        let mut editor = RichEditor::new();
        let outcomes: Vec<_> = actions
            .iter()
            .map(|a| a.apply(&mut editor).unwrap())
            .collect();
        assert_eq!(outcomes.last(), Some(&Applied::Show));
        assert_eq!(editor.selected_text(), "world");
        assert_eq!(editor.document().content().len(), 2);
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "application/octet-stream");
    }

    #[test]
    fn test_missing_image_file_is_no_file() {
        let mut editor = RichEditor::new();
        let action = ToolbarAction::Image(Some(PathBuf::from("/definitely/not/here.png")));
        assert_eq!(
            action.apply(&mut editor),
            Err(EditError::NoFileChosen)
        );
    }
}
