use mailblocks::block::{ColumnsProps, TextProps};
use mailblocks::presets::{find_preset, PRESETS};
use mailblocks::tree::{collect_ids, find_block};
use mailblocks::{
    compile, compile_json, compile_with, parse_template, Block, BlockProps, BlockType,
    DragSource, DropTarget, EditorState, FileTemplateStore, MailError, MailblocksConfig,
    SavedTemplate, Template, TemplateStore,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;

fn get_fixture_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("fixtures");
    path.push(filename);
    path
}

fn read_fixture(filename: &str) -> String {
    fs::read_to_string(get_fixture_path(filename)).unwrap()
}

/// Everything between the opening content table and its closing tag
fn content(html: &str) -> &str {
    let start = html.find("margin: 0 auto;\">").unwrap() + "margin: 0 auto;\">".len();
    let end = html.rfind("</table>\n</td>\n</tr>\n</table>").unwrap();
    &html[start..end]
}

fn text(id: &str) -> Block {
    Block::with_id(id, BlockProps::Text(TextProps::plain(id)))
}

// Parsing

#[test]
fn test_parse_simple_fixture() {
    let template = parse_template(&read_fixture("simple_text.json")).unwrap();
    assert_eq!(template.version, "1.0");
    assert_eq!(collect_ids(&template), vec!["t1"]);
    assert_eq!(template.children()[0].block_type(), BlockType::Text);
}

#[test]
fn test_invalid_json_reports_position() {
    let err = parse_template(&read_fixture("invalid_json.txt")).unwrap_err();
    match err {
        MailError::InvalidJson { line, .. } => assert_eq!(line, 6),
        other => panic!("expected InvalidJson, got {:?}", other),
    }
}

#[test]
fn test_unknown_block_type_is_shape_error() {
    let err = parse_template(&read_fixture("wrong_shape.json")).unwrap_err();
    assert!(matches!(err, MailError::InvalidShape(_)), "{:?}", err);
    assert!(err.is_document_error());
}

#[test]
fn test_duplicate_ids_rejected_on_parse() {
    let err = parse_template(&read_fixture("duplicate_ids.json")).unwrap_err();
    match err {
        MailError::DuplicateId { id } => assert_eq!(id, "same"),
        other => panic!("expected DuplicateId, got {:?}", other),
    }
}

#[test]
fn test_duplicate_ids_repaired_by_editor() {
    // Parsing rejects the document, but a host may still hand it to the editor directly
    let json = read_fixture("duplicate_ids.json");
    let raw: Template = serde_json::from_str(&json).unwrap();
    let state = EditorState::new(raw);
    let ids = collect_ids(state.template());
    assert_eq!(ids.len(), 3);
    assert_eq!(ids.iter().filter(|id| **id == "same").count(), 1);
}

#[test]
fn test_json_round_trip_preserves_document() {
    for name in ["simple_text.json", "columns_five.json", "malicious.json"] {
        let template = parse_template(&read_fixture(name)).unwrap();
        let again = parse_template(&template.to_json_pretty().unwrap()).unwrap();
        assert_eq!(again, template, "{}", name);
    }
}

// Compiling

#[test]
fn test_simple_export() {
    let html = compile(&parse_template(&read_fixture("simple_text.json")).unwrap());
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.ends_with("</html>"));
    let body = content(&html);
    assert_eq!(body.matches("<tr>").count(), 1);
    assert!(body.contains(";\">Hi</td>"));
}

#[test]
fn test_columns_export_splits_children() {
    let html = compile(&parse_template(&read_fixture("columns_five.json")).unwrap());
    let first = html.find("item0").unwrap();
    let second_cell = html.find("padding-left: 5px; padding-right: 0;").unwrap();
    assert!(first < second_cell);
    assert!(html.find("item2").unwrap() < second_cell);
    assert!(html.find("item3").unwrap() > second_cell);
    assert!(html.find("item4").unwrap() > second_cell);
    assert!(html.find("after").unwrap() > html.find("item4").unwrap());
    assert!(html.contains("font-family: Arial, sans-serif;"));
}

#[test]
fn test_malicious_document_is_neutralized() {
    let html = compile(&parse_template(&read_fixture("malicious.json")).unwrap());
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("javascript:"));
    assert!(html.contains("href=\"#\""));
    assert!(html.contains(">Click &quot;me&quot;</a>"));
    assert!(!html.contains("onerror=\""));
    assert!(!html.contains("<img"));
}

#[test]
fn test_compile_json_with_config_file() {
    let config = MailblocksConfig::load(get_fixture_path("config.yaml")).unwrap();
    let html = compile_json(&read_fixture("simple_text.json"), &config).unwrap();
    assert!(html.contains("<title>Acme digest</title>"));
    assert!(html.contains("width=\"640\" style=\"max-width: 640px;"));
}

#[test]
fn test_all_presets_compile() {
    for preset in PRESETS {
        let template = preset.template().unwrap();
        let html = compile(&template);
        assert!(html.contains("</html>"), "{}", preset.id);
        assert_eq!(compile(&template), html, "{}", preset.id);
    }
}

// Editing

#[test]
fn test_delete_selected_then_reselect() {
    let mut state = EditorState::new(Template::with_children(vec![text("a"), text("b")]));
    assert!(state.select_block(Some("a")));
    assert!(state.delete_block("a"));
    assert_eq!(state.selected_block_id(), None);

    assert!(!state.select_block(Some("a")));
    assert!(state.select_block(Some("b")));
    assert_eq!(state.selected_block().map(|b| b.id.as_str()), Some("b"));
}

#[test]
fn test_move_into_second_column_and_compile() {
    let columns = Block::with_id(
        "cols",
        BlockProps::Columns(ColumnsProps {
            column_count: Some(2.0),
            ..Default::default()
        }),
    )
    .with_children(vec![text("c0"), text("c1"), text("c2"), text("c3")]);
    let mut state = EditorState::new(Template::with_children(vec![columns, text("loose")]));

    assert!(state.move_block_into_column("loose", "cols", 1, Some(0)));
    let cols = find_block(state.template(), "cols").unwrap();
    let ids: Vec<&str> = cols.children().iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["c0", "c1", "loose", "c2", "c3"]);
    assert_eq!(state.template().children().len(), 1);

    // Five children rebalance as 3/2, so the moved block renders at the end of column 0
    let html = compile(state.template());
    let second_cell = html.find("padding-left: 5px; padding-right: 0;").unwrap();
    assert!(html.find(">loose</td>").unwrap() < second_cell);
    assert!(html.find(">c2</td>").unwrap() > second_cell);
}

#[test]
fn test_palette_drop_on_canvas_selects_new_block() {
    let mut state = EditorState::new(Template::with_children(vec![text("a")]));
    state.set_drag(Some(DragSource::Palette(BlockType::Button)));
    assert!(state.apply_drop(Some(DropTarget::Canvas)));

    let selected = state.selected_block().unwrap();
    assert_eq!(selected.block_type(), BlockType::Button);
    assert_eq!(state.template().children().last().unwrap().id, selected.id);
    assert!(state.drag().is_none());
}

#[test]
fn test_edit_then_compile_uses_new_props() {
    let mut state = EditorState::new(parse_template(&read_fixture("simple_text.json")).unwrap());
    let patch = serde_json::json!({ "text": "Hello <you>", "color": "#ff0000" });
    assert!(state.update_block("t1", patch.as_object().unwrap()));
    let html = compile(state.template());
    assert!(html.contains("color: #ff0000;"));
    assert!(html.contains(">Hello &lt;you&gt;</td>"));
}

// Storage

#[test]
fn test_saved_preset_survives_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileTemplateStore::new(dir.path().join("templates.json"));

    let template = find_preset("welcome").unwrap().template().unwrap();
    let saved = store
        .save(SavedTemplate::new("My welcome", template.clone()))
        .unwrap();

    let loaded = store.get(&saved.id).unwrap();
    assert_eq!(loaded.template, template);
    assert_eq!(
        compile_with(&loaded.template, &Default::default()),
        compile(&template)
    );
}
