// HTML view of a document, as a content-editable region would show it

use super::rich_document::{ImageNode, InlineContent, RichDocument, TextRun};
use std::fmt::Write;

fn escape_html(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

fn render_run(run: &TextRun, out: &mut String) {
    let style = &run.style;

    let mut css = Vec::new();
    if let Some(color) = style.color {
        css.push(format!("color:{}", color));
    }
    if let Some(size) = style.font_size {
        css.push(format!("font-size:{}px", size));
    }

    let mut closing: Vec<&str> = Vec::new();
    if !css.is_empty() {
        let _ = write!(out, "<span style=\"{}\">", css.join(";"));
        closing.push("</span>");
    }
    if style.bold {
        out.push_str("<b>");
        closing.push("</b>");
    }
    if style.italic {
        out.push_str("<i>");
        closing.push("</i>");
    }
    if style.underline {
        out.push_str("<u>");
        closing.push("</u>");
    }

    escape_html(&run.text, out);

    for tag in closing.iter().rev() {
        out.push_str(tag);
    }
}

fn render_image(image: &ImageNode, out: &mut String) {
    out.push_str("<img src=\"");
    escape_html(&image.src, out);
    let _ = write!(
        out,
        "\" style=\"width:{}px;height:{}px\">",
        image.display_width, image.display_height
    );
}

/// Render the editable region's markup
pub fn render_html(document: &RichDocument) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<div contenteditable=\"true\" style=\"white-space:pre-wrap;line-height:{}\">",
        document.line_height().css_value()
    );
    for item in document.content() {
        match item {
            InlineContent::Text(run) => render_run(run, &mut out),
            InlineContent::Image(image) => render_image(image, &mut out),
        }
    }
    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::color::Color;
    use crate::richtext::rich_document::TextStyle;

    #[test]
    fn test_escapes_text() {
        let doc = RichDocument::with_text("a < b & \"c\"");
        assert!(render_html(&doc).contains("a &lt; b &amp; &quot;c&quot;"));
    }

    #[test]
    fn test_nests_tags_in_order() {
        let mut out = String::new();
        let style = TextStyle {
            bold: true,
            underline: true,
            ..TextStyle::plain()
        }
        .with_color(Color::rgb(255, 0, 0))
        .with_font_size(17.0);
        render_run(&TextRun::new("x", style), &mut out);
        assert_eq!(
            out,
            "<span style=\"color:#ff0000;font-size:17px\"><b><u>x</u></b></span>"
        );
    }
}
