// Library exports for richpad

pub mod config;
pub mod error;
pub mod image_upload;
pub mod richtext;
pub mod script;

pub use config::EditorConfig;
pub use error::{EditError, EditResult};
pub use image_upload::ImageFile;
pub use richtext::color::Color;
pub use richtext::html_render::render_html;
pub use richtext::rich_document::{
    ImageNode, InlineContent, LineHeight, RichDocument, StyleKind, TextRun, TextStyle,
};
pub use richtext::rich_editor::{RichEditor, Selection};
pub use richtext::toolbar_state::{AttrState, SelectionStyle, ToolbarState};
