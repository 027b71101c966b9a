use super::*;
use crate::extract::{self, ExtractOptions};
use crate::fixtures::{FixtureCell, FixtureTable, Item, cell, grid, model, text};
use crate::model::{Block, NodePath};
use proptest::prelude::*;

fn mixed() -> StructureModel {
    model(&[
        vec![text("alpha"), Item::Tab, text("beta")],
        vec![Item::Table(FixtureTable {
            rows: 1,
            cols: 2,
            cells: vec![
                cell(0, 0, "gamma"),
                FixtureCell {
                    paragraphs: vec![vec![Item::Table(grid(1, 1))]],
                    ..cell(0, 1, "")
                },
            ],
        })],
        vec![
            Item::Footnote("note body".into()),
            Item::Link("https://x.example".into(), "link".into()),
            Item::Memo("flagged".into(), "memo body".into()),
        ],
    ])
}

fn body_text(model: &StructureModel) -> Vec<String> {
    model
        .blocks()
        .iter()
        .filter_map(Block::as_paragraph)
        .map(|p| p.text())
        .collect()
}

#[test]
fn test_scope_from_locations() {
    assert_eq!(Scope::from_locations(&["body"]).unwrap(), Scope::BODY);
    assert_eq!(Scope::from_locations(&["Table"]).unwrap(), Scope::TABLE);
    assert_eq!(Scope::from_locations(&["body", "table"]).unwrap(), Scope::ALL);
    assert!(Scope::from_locations::<&str>(&[]).unwrap().is_empty());
    assert!(matches!(
        Scope::from_locations(&["header"]),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_scope_serializes_as_flag_names() {
    let json = serde_json::to_string(&Scope::TABLE).unwrap();
    assert_eq!(json, "\"TABLE\"");
    assert_eq!(serde_json::from_str::<Scope>(&json).unwrap(), Scope::TABLE);

    let all: Scope = serde_json::from_str("\"BODY | TABLE\"").unwrap();
    assert_eq!(all, Scope::ALL);
    let back: Scope = serde_json::from_str(&serde_json::to_string(&Scope::ALL).unwrap()).unwrap();
    assert_eq!(back, Scope::ALL);
    assert!(serde_json::from_str::<Scope>("\"HEADER\"").is_err());
}

#[test]
fn test_uppercase_is_idempotent_per_scope() {
    let mut model = mixed();
    let mut replacer = TextReplacer::new(&mut model);

    // alpha, beta, link, flagged
    assert_eq!(replacer.replace_all(str::to_uppercase, Scope::BODY), 4);
    assert_eq!(replacer.replace_all(str::to_uppercase, Scope::BODY), 0);
    // gamma, nested r0c0
    assert_eq!(replacer.replace_all(str::to_uppercase, Scope::TABLE), 2);
    assert_eq!(replacer.replace_all(str::to_uppercase, Scope::ALL), 0);
    assert!(model.is_dirty());
}

#[test]
fn test_table_scope_leaves_body_untouched() {
    let mut model = mixed();
    let before = body_text(&model);

    let count = TextReplacer::new(&mut model).replace_in_tables(|s| format!("[{s}]"));
    assert_eq!(count, 2);
    assert_eq!(body_text(&model), before);

    let table = model.table(&NodePath::root(2)).unwrap();
    assert_eq!(
        extract::blocks_text(table.cells()[0].blocks(), &ExtractOptions::default()),
        "[gamma]"
    );
}

#[test]
fn test_annotations_stay_attached() {
    let mut model = mixed();
    let before = extract::extract_all(&model, &ExtractOptions::default());

    TextReplacer::new(&mut model).replace_all(|s| s.replace('a', "4"), Scope::ALL);
    let after = extract::extract_all(&model, &ExtractOptions::default());

    assert_eq!(after.footnotes.len(), before.footnotes.len());
    assert_eq!(after.footnotes[0].anchor, before.footnotes[0].anchor);
    assert_eq!(after.footnotes[0].text, "note body");
    assert_eq!(after.hyperlinks[0].url, "https://x.example");
    assert_eq!(after.hyperlinks[0].text, "link");
    assert_eq!(after.memos[0].text, "memo body");
    assert_eq!(after.memos[0].anchor, before.memos[0].anchor);
    assert!(after.text.starts_with("4lph4\tbet4"));
}

#[test]
fn test_transform_sees_runs_in_document_order() {
    let mut model = mixed();
    let mut seen = Vec::new();
    let count = TextReplacer::new(&mut model).replace_all(
        |s| {
            seen.push(s.to_string());
            s.to_string()
        },
        Scope::ALL,
    );
    assert_eq!(count, 0);
    assert_eq!(seen, vec!["alpha", "beta", "gamma", "r0c0", "link", "flagged"]);
    assert!(!model.is_dirty());
}

#[test]
fn test_transform_reads_cells_in_grid_order() {
    let mut model = model(&[vec![Item::Table(FixtureTable {
        rows: 2,
        cols: 2,
        cells: vec![
            cell(1, 1, "d"),
            cell(0, 1, "b"),
            cell(1, 0, "c"),
            cell(0, 0, "a"),
        ],
    })]]);
    let extracted = extract::extract_text(&model, &ExtractOptions::default());

    let mut seen = Vec::new();
    TextReplacer::new(&mut model).replace_all(
        |s| {
            seen.push(s.to_string());
            s.to_string()
        },
        Scope::TABLE,
    );
    assert_eq!(seen, vec!["a", "b", "c", "d"]);
    let extracted: String = extracted.chars().filter(|c| c.is_alphabetic()).collect();
    assert_eq!(extracted, seen.concat());
}

#[test]
fn test_empty_scope_is_a_no_op() {
    let mut model = mixed();
    let count = TextReplacer::new(&mut model).replace_all(|_| "x".into(), Scope::empty());
    assert_eq!(count, 0);
    assert!(!model.is_dirty());
}

proptest! {
    #[test]
    fn prop_second_pass_of_idempotent_transform_changes_nothing(
        texts in prop::collection::vec("[a-zA-Z0-9 ]{0,6}", 1..6),
    ) {
        let paragraphs: Vec<Vec<Item>> = texts.iter().map(|t| vec![text(t)]).collect();
        let mut model = model(&paragraphs);
        let mut replacer = TextReplacer::new(&mut model);

        let first = replacer.replace_all(str::to_uppercase, Scope::BODY);
        let expected = texts.iter().filter(|t| t.to_uppercase() != **t).count();
        prop_assert_eq!(first, expected);
        prop_assert_eq!(replacer.replace_all(str::to_uppercase, Scope::BODY), 0);
    }
}
