// Snapshot tests for the HTML view of edited documents

use insta::assert_snapshot;
use richpad::script::parse_script;
use richpad::{Color, ImageFile, LineHeight, RichDocument, RichEditor, StyleKind, render_html};

fn run_script(source: &str) -> RichEditor {
    let mut editor = RichEditor::new();
    for action in parse_script(source).unwrap() {
        let _ = action.apply(&mut editor);
    }
    editor.wait_for_uploads();
    editor
}

#[test]
fn empty_document() {
    let editor = RichEditor::new();
    assert_snapshot!(
        render_html(editor.document()),
        @r#"<div contenteditable="true" style="white-space:pre-wrap;line-height:normal"></div>"#
    );
}

#[test]
fn bold_word() {
    let mut editor = RichEditor::with_document(RichDocument::with_text("Hello world"));
    editor.set_selection(6, 11);
    editor.toggle_style(StyleKind::Bold).unwrap();
    assert_snapshot!(
        render_html(editor.document()),
        @r#"<div contenteditable="true" style="white-space:pre-wrap;line-height:normal">Hello <b>world</b></div>"#
    );
}

#[test]
fn mixed_formatting() {
    let mut editor = RichEditor::with_document(RichDocument::with_text("one two three"));
    editor.set_selection(0, 3);
    editor.set_color(Color::rgb(255, 0, 0)).unwrap();
    editor.set_selection(4, 7);
    editor.toggle_style(StyleKind::Italic).unwrap();
    editor.toggle_style(StyleKind::Underline).unwrap();
    editor.set_selection(8, 13);
    editor.adjust_font_size(2).unwrap();
    editor.set_line_height(LineHeight::OneAndHalf).unwrap();

    assert_snapshot!(
        render_html(editor.document()),
        @r#"<div contenteditable="true" style="white-space:pre-wrap;line-height:1.5"><span style="color:#ff0000">one</span> <i><u>two</u></i> <span style="font-size:18px">three</span></div>"#
    );
}

#[test]
fn image_appended_after_text() {
    let mut editor = RichEditor::with_document(RichDocument::with_text("pic:"));
    editor
        .insert_image(Some(ImageFile::new(b"abc".to_vec(), "image/png")))
        .unwrap();
    editor.wait_for_uploads();
    assert_snapshot!(
        render_html(editor.document()),
        @r#"<div contenteditable="true" style="white-space:pre-wrap;line-height:normal">pic:<img src="data:image/png;base64,YWJj" style="width:200px;height:200px"></div>"#
    );
}

#[test]
fn scripted_session_debug_dump() {
    let editor = run_script(
        "type Hello world\n\
         select 0 5\n\
         bold\n\
         font +1\n\
         font +1\n\
         word 7\n\
         color #0000ff\n\
         line-height 2\n",
    );
    assert_snapshot!(editor.document().to_string().trim_end(), @r#"
    RichDocument (3 nodes, line-height 2):
      [0] Text("Hello", B, 18px)
      [1] Text(" ")
      [2] Text("world", #0000ff)
    "#);
}
