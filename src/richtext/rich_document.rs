// Rich Document Model
// A flat, ordered list of styled text runs and embedded images.
// All offsets are character offsets; an image occupies exactly one position.

use super::color::Color;
use std::cmp::min;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Character used for an image when the document is flattened to text
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// Text styling attributes carried by a run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<Color>,
    /// Explicit font size override in px; `None` inherits the editor default
    pub font_size: Option<f32>,
}

impl TextStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        TextStyle {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        TextStyle {
            italic: true,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn get(&self, kind: StyleKind) -> bool {
        match kind {
            StyleKind::Bold => self.bold,
            StyleKind::Italic => self.italic,
            StyleKind::Underline => self.underline,
        }
    }

    pub fn set(&mut self, kind: StyleKind, value: bool) {
        match kind {
            StyleKind::Bold => self.bold = value,
            StyleKind::Italic => self.italic = value,
            StyleKind::Underline => self.underline = value,
        }
    }

    /// Font size this style renders at, given the default
    pub fn effective_font_size(&self, default_size: f32) -> f32 {
        self.font_size.unwrap_or(default_size)
    }
}

/// The boolean attributes a toolbar button can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Bold,
    Italic,
    Underline,
}

impl StyleKind {
    pub const ALL: [StyleKind; 3] = [StyleKind::Bold, StyleKind::Italic, StyleKind::Underline];
}

/// Convert a character offset into a byte index of `text`
fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// A run of styled text (a contiguous piece of text with uniform styling)
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        TextRun {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::plain())
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Characters in [start..end)
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let from = byte_index(&self.text, start);
        let to = byte_index(&self.text, end);
        &self.text[from..to]
    }
}

/// An embedded image with a fixed display size
#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    /// Inline data URL, `data:<mime>;base64,<payload>`
    pub src: String,
    pub mime_type: String,
    pub display_width: u32,
    pub display_height: u32,
    /// Pixel size of the decoded image, when the bytes could be probed
    pub intrinsic_size: Option<(u32, u32)>,
}

/// Inline content of the document
#[derive(Debug, Clone, PartialEq)]
pub enum InlineContent {
    Text(TextRun),
    Image(ImageNode),
}

impl InlineContent {
    /// Get the length of this inline content in document positions
    pub fn text_len(&self) -> usize {
        match self {
            InlineContent::Text(run) => run.len(),
            InlineContent::Image(_) => 1,
        }
    }

    /// Flatten to plain text
    pub fn to_plain_text(&self) -> String {
        match self {
            InlineContent::Text(run) => run.text.clone(),
            InlineContent::Image(_) => OBJECT_REPLACEMENT.to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            InlineContent::Text(run) => Some(run),
            InlineContent::Image(_) => None,
        }
    }
}

/// Line spacing of the whole editable region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineHeight {
    #[default]
    Normal,
    OneAndHalf,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid line height `{0}`, expected normal, 1.5 or 2")]
pub struct LineHeightParseError(pub String);

impl LineHeight {
    /// Value as written in a CSS `line-height` declaration
    pub fn css_value(&self) -> &'static str {
        match self {
            LineHeight::Normal => "normal",
            LineHeight::OneAndHalf => "1.5",
            LineHeight::Double => "2",
        }
    }
}

impl FromStr for LineHeight {
    type Err = LineHeightParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(LineHeight::Normal),
            "1.5" => Ok(LineHeight::OneAndHalf),
            "2" | "2.0" => Ok(LineHeight::Double),
            _ => Err(LineHeightParseError(s.to_string())),
        }
    }
}

impl fmt::Display for LineHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_value())
    }
}

/// Split content into three parts: before the range, within it, after it
pub fn split_content_for_range(
    content: &[InlineContent],
    start_offset: usize,
    end_offset: usize,
) -> (Vec<InlineContent>, Vec<InlineContent>, Vec<InlineContent>) {
    let mut before = Vec::new();
    let mut selected = Vec::new();
    let mut after = Vec::new();

    let mut current_offset = 0;

    for item in content {
        let item_len = item.text_len();
        let item_start = current_offset;
        let item_end = current_offset + item_len;

        if item_end <= start_offset && item_len > 0 {
            before.push(item.clone());
        } else if item_start >= end_offset {
            after.push(item.clone());
        } else if item_start >= start_offset && item_end <= end_offset {
            selected.push(item.clone());
        } else {
            // Partial overlap; only text runs can be cut
            match item {
                InlineContent::Text(run) => {
                    let sel_start_in_run = start_offset.saturating_sub(item_start);
                    let sel_end_in_run = min(end_offset.saturating_sub(item_start), item_len);

                    if sel_start_in_run > 0 {
                        before.push(InlineContent::Text(TextRun::new(
                            run.slice(0, sel_start_in_run),
                            run.style,
                        )));
                    }
                    if sel_end_in_run > sel_start_in_run {
                        selected.push(InlineContent::Text(TextRun::new(
                            run.slice(sel_start_in_run, sel_end_in_run),
                            run.style,
                        )));
                    }
                    if sel_end_in_run < item_len {
                        after.push(InlineContent::Text(TextRun::new(
                            run.slice(sel_end_in_run, item_len),
                            run.style,
                        )));
                    }
                }
                InlineContent::Image(_) => {
                    if item_start < start_offset {
                        before.push(item.clone());
                    } else {
                        after.push(item.clone());
                    }
                }
            }
        }

        current_offset += item_len;
    }

    (before, selected, after)
}

/// Drop empty text runs and merge neighbours that share a style
pub fn normalize_content(content: Vec<InlineContent>) -> Vec<InlineContent> {
    let mut out: Vec<InlineContent> = Vec::with_capacity(content.len());
    for item in content {
        if let InlineContent::Text(run) = &item {
            if run.is_empty() {
                continue;
            }
            if let Some(InlineContent::Text(prev)) = out.last_mut()
                && prev.style == run.style
            {
                prev.text.push_str(&run.text);
                continue;
            }
        }
        out.push(item);
    }
    out
}

/// The document owned by the formatting engine
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichDocument {
    content: Vec<InlineContent>,
    line_height: LineHeight,
}

impl RichDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document holding one unstyled run
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.content = normalize_content(vec![InlineContent::Text(TextRun::plain(text))]);
        doc
    }

    /// Create a document from arbitrary content
    pub fn from_content(content: Vec<InlineContent>) -> Self {
        RichDocument {
            content: normalize_content(content),
            line_height: LineHeight::Normal,
        }
    }

    pub fn content(&self) -> &[InlineContent] {
        &self.content
    }

    /// Total length in document positions
    pub fn len(&self) -> usize {
        self.content.iter().map(|c| c.text_len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn line_height(&self) -> LineHeight {
        self.line_height
    }

    pub fn set_line_height(&mut self, line_height: LineHeight) {
        self.line_height = line_height;
    }

    /// Remove all content
    pub fn clear(&mut self) {
        self.content.clear();
    }

    /// Text runs only, in order
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.content.iter().filter_map(InlineContent::as_text)
    }

    /// Images only, in order
    pub fn images(&self) -> impl Iterator<Item = &ImageNode> {
        self.content.iter().filter_map(|c| match c {
            InlineContent::Image(image) => Some(image),
            InlineContent::Text(_) => None,
        })
    }

    /// Convert to plain text; images become U+FFFC
    pub fn to_plain_text(&self) -> String {
        self.content.iter().map(|c| c.to_plain_text()).collect()
    }

    /// Plain text in [start..end)
    pub fn text_in_range(&self, start: usize, end: usize) -> String {
        let (_, selected, _) = split_content_for_range(&self.content, start, end);
        selected.iter().map(|c| c.to_plain_text()).collect()
    }

    /// Clone of the content in [start..end), cut at the boundaries
    pub fn content_in_range(&self, start: usize, end: usize) -> Vec<InlineContent> {
        let (_, selected, _) = split_content_for_range(&self.content, start, end);
        selected
    }

    /// Apply `apply` to every text run in [start..end).
    /// Runs straddling a boundary are split first so unselected text keeps its style.
    pub fn map_style_in_range<F>(&mut self, start: usize, end: usize, mut apply: F)
    where
        F: FnMut(&mut TextStyle),
    {
        let end = min(end, self.len());
        if start >= end {
            return;
        }

        let (before, selected, after) = split_content_for_range(&self.content, start, end);
        let styled = selected.into_iter().map(|item| match item {
            InlineContent::Text(mut run) => {
                apply(&mut run.style);
                InlineContent::Text(run)
            }
            other => other,
        });

        self.content = normalize_content(before.into_iter().chain(styled).chain(after).collect());
    }

    /// Insert text with the given style at `offset`
    pub fn insert_text(&mut self, offset: usize, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        let offset = min(offset, self.len());
        let (before, _, after) = split_content_for_range(&self.content, offset, offset);
        let inserted = InlineContent::Text(TextRun::new(text, style));
        self.content = normalize_content(
            before
                .into_iter()
                .chain(std::iter::once(inserted))
                .chain(after)
                .collect(),
        );
    }

    /// Delete content in [start..end)
    pub fn delete_range(&mut self, start: usize, end: usize) {
        let end = min(end, self.len());
        if start >= end {
            return;
        }
        let (before, _, after) = split_content_for_range(&self.content, start, end);
        self.content = normalize_content(before.into_iter().chain(after).collect());
    }

    /// Append an image after all existing content
    pub fn append_image(&mut self, image: ImageNode) {
        self.content.push(InlineContent::Image(image));
    }

    /// Style typed text would pick up at `offset`: the character before it,
    /// or the one after it at the very start.
    pub fn style_at(&self, offset: usize) -> TextStyle {
        let offset = min(offset, self.len());
        let mut pos = 0;
        let mut following = None;
        for item in &self.content {
            let len = item.text_len();
            if let InlineContent::Text(run) = item {
                if offset > pos && offset <= pos + len {
                    return run.style;
                }
                if following.is_none() && pos >= offset {
                    following = Some(run.style);
                }
            }
            pos += len;
        }
        if offset == 0 {
            following.unwrap_or_default()
        } else {
            TextStyle::default()
        }
    }
}

impl fmt::Display for RichDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RichDocument ({} nodes, line-height {}):",
            self.content.len(),
            self.line_height
        )?;
        for (i, item) in self.content.iter().enumerate() {
            write!(f, "  [{}] ", i)?;
            match item {
                InlineContent::Text(run) => {
                    let s = &run.style;
                    let mut flags = String::new();
                    if s.bold {
                        flags.push('B');
                    }
                    if s.italic {
                        flags.push('I');
                    }
                    if s.underline {
                        flags.push('U');
                    }
                    write!(f, "Text({:?}", run.text)?;
                    if !flags.is_empty() {
                        write!(f, ", {}", flags)?;
                    }
                    if let Some(color) = s.color {
                        write!(f, ", {}", color)?;
                    }
                    if let Some(size) = s.font_size {
                        write!(f, ", {}px", size)?;
                    }
                    writeln!(f, ")")?;
                }
                InlineContent::Image(image) => writeln!(
                    f,
                    "Image({}, {}x{})",
                    image.mime_type, image.display_width, image.display_height
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: &str) -> ImageNode {
        ImageNode {
            src: format!("data:image/png;base64,{tag}"),
            mime_type: "image/png".to_string(),
            display_width: 200,
            display_height: 200,
            intrinsic_size: None,
        }
    }

    #[test]
    fn test_text_run_slice_is_char_based() {
        let run = TextRun::plain("héllo wörld");
        assert_eq!(run.len(), 11);
        assert_eq!(run.slice(0, 6), "héllo ");
        assert_eq!(run.slice(6, 11), "wörld");
    }

    #[test]
    fn test_split_content_for_range_cuts_partial_runs() {
        let content = vec![
            InlineContent::Text(TextRun::plain("Hello ")),
            InlineContent::Text(TextRun::new("world", TextStyle::bold())),
        ];
        let (before, selected, after) = split_content_for_range(&content, 3, 8);
        let text = |items: &[InlineContent]| -> String {
            items.iter().map(|c| c.to_plain_text()).collect()
        };
        assert_eq!(text(&before), "Hel");
        assert_eq!(text(&selected), "lo wo");
        assert_eq!(text(&after), "rld");
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_image_counts_as_one_position() {
        let mut doc = RichDocument::with_text("ab");
        doc.append_image(image("x"));
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.text_in_range(1, 3), format!("b{OBJECT_REPLACEMENT}"));
    }

    #[test]
    fn test_map_style_merges_back() {
        let mut doc = RichDocument::with_text("Hello world");
        doc.map_style_in_range(6, 11, |s| s.bold = true);
        assert_eq!(doc.content().len(), 2);

        doc.map_style_in_range(6, 11, |s| s.bold = false);
        assert_eq!(
            doc.content(),
            &[InlineContent::Text(TextRun::plain("Hello world"))]
        );
    }

    #[test]
    fn test_map_style_skips_images() {
        let mut doc = RichDocument::with_text("ab");
        doc.append_image(image("x"));
        doc.map_style_in_range(0, 3, |s| s.italic = true);
        assert!(doc.runs().all(|r| r.style.italic));
        assert_eq!(doc.images().count(), 1);
    }

    #[test]
    fn test_insert_and_delete() {
        let mut doc = RichDocument::with_text("Hello");
        doc.insert_text(5, " world", TextStyle::plain());
        assert_eq!(doc.content().len(), 1);
        assert_eq!(doc.to_plain_text(), "Hello world");

        doc.insert_text(0, ">", TextStyle::bold());
        assert_eq!(doc.content().len(), 2);

        doc.delete_range(0, 1);
        assert_eq!(doc.content().len(), 1);

        doc.delete_range(5, 100);
        assert_eq!(doc.to_plain_text(), "Hello");
    }

    #[test]
    fn test_style_at_prefers_preceding_run() {
        let doc = RichDocument::from_content(vec![
            InlineContent::Text(TextRun::new("ab", TextStyle::bold())),
            InlineContent::Text(TextRun::new("cd", TextStyle::italic())),
        ]);
        assert_eq!(doc.style_at(0), TextStyle::bold());
        assert_eq!(doc.style_at(2), TextStyle::bold());
        assert_eq!(doc.style_at(3), TextStyle::italic());
        assert_eq!(doc.style_at(4), TextStyle::italic());
    }

    #[test]
    fn test_line_height_parse() {
        assert_eq!("normal".parse::<LineHeight>(), Ok(LineHeight::Normal));
        assert_eq!("1.5".parse::<LineHeight>(), Ok(LineHeight::OneAndHalf));
        assert_eq!("2".parse::<LineHeight>(), Ok(LineHeight::Double));
        assert!("3".parse::<LineHeight>().is_err());
    }

    #[test]
    fn test_display() {
        let mut doc = RichDocument::with_text("Hi ");
        doc.insert_text(3, "there", TextStyle::bold().with_font_size(17.0));
        let shown = doc.to_string();
        assert!(shown.contains("Text(\"Hi \")"));
        assert!(shown.contains("Text(\"there\", B, 17px)"));
    }
}
