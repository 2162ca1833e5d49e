pub mod color;
pub mod html_render;
pub mod rich_document;
pub mod rich_editor;
pub mod toolbar_state;
