// Rich Editor
// The formatting engine: owns the document, the selection and the style
// for upcoming input, and applies toolbar commands to them.

use super::color::Color;
use super::rich_document::*;
use super::toolbar_state::{AttrState, SelectionStyle, ToolbarState};
use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::image_upload::{DecodedImage, ImageFile, ImageUploads};
use std::cmp::min;
use unicode_segmentation::UnicodeSegmentation;

/// A range over the document, always `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(a: usize, b: usize) -> Self {
        Selection {
            start: min(a, b),
            end: a.max(b),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The formatting engine
pub struct RichEditor {
    document: RichDocument,
    cursor: usize,
    selection: Option<Selection>,
    /// Style the next typed characters get
    input_style: TextStyle,
    toolbar: ToolbarState,
    config: EditorConfig,
    uploads: ImageUploads,
    focus_requested: bool,
}

impl RichEditor {
    /// Create a new editor with an empty document and default config
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let mut document = RichDocument::new();
        document.set_line_height(config.line_height);
        let mut editor = RichEditor {
            document,
            cursor: 0,
            selection: None,
            input_style: TextStyle::default(),
            toolbar: ToolbarState::default(),
            config,
            uploads: ImageUploads::new(),
            focus_requested: false,
        };
        editor.refresh_toolbar();
        editor
    }

    /// Create an editor with an existing document
    pub fn with_document(document: RichDocument) -> Self {
        Self::with_document_and_config(document, EditorConfig::default())
    }

    /// Create an editor with an existing document. The document keeps its
    /// own line height.
    pub fn with_document_and_config(document: RichDocument, config: EditorConfig) -> Self {
        let mut editor = Self::with_config(config);
        editor.document = document;
        editor.input_style = editor.document.style_at(0);
        editor.refresh_toolbar();
        editor
    }

    pub fn document(&self) -> &RichDocument {
        &self.document
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The active selection, if it covers at least one position
    pub fn selection(&self) -> Option<Selection> {
        self.selection.filter(|s| !s.is_collapsed())
    }

    pub fn input_style(&self) -> TextStyle {
        self.input_style
    }

    pub fn toolbar_state(&self) -> &ToolbarState {
        &self.toolbar
    }

    /// Whether a toolbar command asked for focus to return to the editable
    /// region since the last call
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    /// Set cursor position (clamped). Collapses the selection and picks up
    /// the style of the text at the new position for further typing.
    pub fn set_cursor(&mut self, offset: usize) {
        self.cursor = min(offset, self.document.len());
        self.selection = None;
        self.input_style = self.document.style_at(self.cursor);
        self.refresh_toolbar();
    }

    /// Set selection range (clamped). A zero-length range places the cursor.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.document.len();
        let selection = Selection::new(min(start, len), min(end, len));
        if selection.is_collapsed() {
            self.set_cursor(selection.start);
            return;
        }
        self.selection = Some(selection);
        self.cursor = selection.end;
        self.sync_input_style();
        self.refresh_toolbar();
    }

    pub fn clear_selection(&mut self) {
        self.set_cursor(self.cursor);
    }

    /// Select all content in the document
    pub fn select_all(&mut self) {
        self.set_selection(0, self.document.len());
    }

    /// Select the word (or run of whitespace/punctuation) at the given position
    pub fn select_word_at(&mut self, offset: usize) {
        let text = self.document.to_plain_text();
        let mut pos = 0;
        for segment in text.split_word_bounds() {
            let len = segment.chars().count();
            if offset < pos + len {
                self.set_selection(pos, pos + len);
                return;
            }
            pos += len;
        }
    }

    /// Plain text of the selection
    pub fn selected_text(&self) -> String {
        match self.selection() {
            Some(sel) => self.document.text_in_range(sel.start, sel.end),
            None => String::new(),
        }
    }

    /// Styles found under the selection. `None` without a selection or when
    /// it holds no text.
    pub fn selection_style(&self) -> Option<SelectionStyle> {
        let sel = self.selection()?;
        let content = self.document.content_in_range(sel.start, sel.end);
        SelectionStyle::from_runs(content.iter().filter_map(InlineContent::as_text))
    }

    /// Toggle bold style on the current selection
    pub fn toggle_bold(&mut self) -> EditResult {
        self.toggle_style(StyleKind::Bold)
    }

    /// Toggle italic style on the current selection
    pub fn toggle_italic(&mut self) -> EditResult {
        self.toggle_style(StyleKind::Italic)
    }

    /// Toggle underline style on the current selection
    pub fn toggle_underline(&mut self) -> EditResult {
        self.toggle_style(StyleKind::Underline)
    }

    /// Toggle a style attribute.
    ///
    /// With a selection, the attribute is cleared if every selected run
    /// already has it and set on all of them otherwise. Without one, only the
    /// style for the next typed text changes.
    pub fn toggle_style(&mut self, kind: StyleKind) -> EditResult {
        let Some(sel) = self.selection() else {
            let value = !self.input_style.get(kind);
            self.input_style.set(kind, value);
            tracing::debug!(?kind, value, "toggled input style at cursor");
            self.finish_command();
            return Ok(());
        };

        let target = match self.selection_style() {
            Some(style) => style.get(kind) != AttrState::On,
            // Only images selected, nothing to restyle
            None => !self.input_style.get(kind),
        };
        self.document
            .map_style_in_range(sel.start, sel.end, |style| style.set(kind, target));
        self.sync_input_style();
        self.finish_command();
        Ok(())
    }

    /// Apply a foreground color to the selection, or to upcoming input
    pub fn set_color(&mut self, color: Color) -> EditResult {
        match self.selection() {
            Some(sel) => {
                self.document
                    .map_style_in_range(sel.start, sel.end, |style| style.color = Some(color));
                self.sync_input_style();
            }
            None => self.input_style.color = Some(color),
        }
        self.finish_command();
        Ok(())
    }

    /// Grow or shrink the selected text by `delta` px.
    ///
    /// Each selected run gets its effective size plus `delta` as an explicit
    /// size, never below the configured minimum. A result equal to the default
    /// size drops the override. The selection keeps covering the same content
    /// so repeated adjustments add up.
    pub fn adjust_font_size(&mut self, delta: i32) -> EditResult {
        self.finish_command();
        let Some(sel) = self.selection() else {
            tracing::debug!(delta, "font size change without selection ignored");
            return Err(EditError::NoSelection);
        };

        let default_size = self.config.default_font_size;
        let min_size = self.config.min_font_size;
        self.document.map_style_in_range(sel.start, sel.end, |style| {
            let size = (style.effective_font_size(default_size) + delta as f32).max(min_size);
            style.font_size = if size == default_size { None } else { Some(size) };
        });

        self.selection = Some(sel);
        self.cursor = sel.end;
        self.sync_input_style();
        self.refresh_toolbar();
        Ok(())
    }

    pub fn increase_font_size(&mut self) -> EditResult {
        self.adjust_font_size(1)
    }

    pub fn decrease_font_size(&mut self) -> EditResult {
        self.adjust_font_size(-1)
    }

    /// Set the line height of the whole editable region
    pub fn set_line_height(&mut self, line_height: LineHeight) -> EditResult {
        self.document.set_line_height(line_height);
        self.finish_command();
        Ok(())
    }

    /// Start inserting an image file. The image lands at the end of the
    /// document once decoding finishes; see [`RichEditor::poll_uploads`].
    pub fn insert_image(&mut self, file: Option<ImageFile>) -> EditResult {
        let Some(file) = file else {
            tracing::debug!("image upload without a file ignored");
            return Err(EditError::NoFileChosen);
        };
        if !file.is_image() {
            return Err(EditError::UnsupportedMime(file.mime_type));
        }
        let ticket = self.uploads.submit(file);
        tracing::debug!(ticket, "image upload started");
        Ok(())
    }

    /// Number of image uploads still decoding
    pub fn pending_uploads(&self) -> usize {
        self.uploads.pending()
    }

    /// Append every image that finished decoding. Returns how many landed.
    pub fn poll_uploads(&mut self) -> usize {
        let mut landed = 0;
        while let Some(decoded) = self.uploads.try_next() {
            self.append_decoded(decoded);
            landed += 1;
        }
        landed
    }

    /// Block until every pending upload has landed. Returns how many did.
    pub fn wait_for_uploads(&mut self) -> usize {
        let mut landed = 0;
        while let Some(decoded) = self.uploads.wait_next() {
            self.append_decoded(decoded);
            landed += 1;
        }
        landed
    }

    fn append_decoded(&mut self, decoded: DecodedImage) {
        tracing::debug!(ticket = decoded.ticket, "appending decoded image");
        self.document.append_image(ImageNode {
            src: decoded.data_url,
            mime_type: decoded.mime_type,
            display_width: self.config.image_width,
            display_height: self.config.image_height,
            intrinsic_size: decoded.intrinsic_size,
        });
    }

    /// Empty the document and drop the selection
    pub fn clear(&mut self) {
        self.document.clear();
        self.cursor = 0;
        self.selection = None;
        self.input_style = TextStyle::default();
        self.finish_command();
    }

    /// Insert typed text at the cursor, replacing the selection if any
    pub fn insert_text(&mut self, text: &str) -> EditResult {
        if self.selection().is_some() {
            let style = self.input_style;
            self.delete_selection()?;
            self.input_style = style;
        }
        self.document
            .insert_text(self.cursor, text, self.input_style);
        self.cursor += text.chars().count();
        self.selection = None;
        self.refresh_toolbar();
        Ok(())
    }

    /// Delete the selected content
    pub fn delete_selection(&mut self) -> EditResult {
        let Some(sel) = self.selection() else {
            return Err(EditError::NoSelection);
        };
        self.document.delete_range(sel.start, sel.end);
        self.set_cursor(sel.start);
        Ok(())
    }

    /// Delete the selection, or the position before the cursor
    pub fn delete_backward(&mut self) -> EditResult {
        if self.selection().is_some() {
            return self.delete_selection();
        }
        if self.cursor == 0 {
            return Ok(());
        }
        self.document.delete_range(self.cursor - 1, self.cursor);
        self.cursor -= 1;
        self.clamp_state();
        self.refresh_toolbar();
        Ok(())
    }

    /// Delete the selection, or the position after the cursor
    pub fn delete_forward(&mut self) -> EditResult {
        if self.selection().is_some() {
            return self.delete_selection();
        }
        if self.cursor >= self.document.len() {
            return Ok(());
        }
        self.document.delete_range(self.cursor, self.cursor + 1);
        self.clamp_state();
        self.refresh_toolbar();
        Ok(())
    }

    /// Keep cursor and selection inside the document
    fn clamp_state(&mut self) {
        let len = self.document.len();
        self.cursor = min(self.cursor, len);
        self.selection = self
            .selection
            .map(|s| Selection::new(min(s.start, len), min(s.end, len)))
            .filter(|s| !s.is_collapsed());
    }

    /// Typing over a selection continues the style of its first run
    fn sync_input_style(&mut self) {
        if let Some(sel) = self.selection() {
            let content = self.document.content_in_range(sel.start, sel.end);
            if let Some(run) = content.iter().find_map(InlineContent::as_text) {
                self.input_style = run.style;
            }
        }
    }

    fn refresh_toolbar(&mut self) {
        let line_height = self.document.line_height();
        match self.selection_style() {
            Some(style) => self.toolbar.reflect_selection(&style, line_height),
            None => self.toolbar.reflect_input(&self.input_style, line_height),
        }
    }

    /// Bookkeeping shared by every toolbar command
    fn finish_command(&mut self) {
        self.clamp_state();
        self.refresh_toolbar();
        self.focus_requested = true;
    }
}

impl Default for RichEditor {
    fn default() -> Self {
        Self::new()
    }
}
