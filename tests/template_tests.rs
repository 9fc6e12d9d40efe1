/// Template integration tests: parsing through the public API.

use encounter_forge::core::template::{Node, ParseErrorKind, Template};
use encounter_forge::parse_template;

#[test]
fn parse_fixture_template() {
    let raw = std::fs::read_to_string("tests/fixtures/encounter.txt").unwrap();
    let template = parse_template(&raw).unwrap();

    assert_eq!(
        template.variable_names(),
        vec!["color", "lair", "weapon", "creature", "loot"]
    );

    let mut conditionals = 0;
    let mut option_titles = Vec::new();
    template.for_each_node(|node| match node {
        Node::Conditional { .. } => conditionals += 1,
        Node::OptionGroup { options, .. } => {
            option_titles.extend(options.iter().map(|o| o.title.clone()))
        }
        _ => {}
    });
    assert_eq!(conditionals, 1);
    assert_eq!(option_titles, vec!["Fight", "Sneak", "Bargain"]);
}

#[test]
fn error_positions_are_one_based() {
    let cases = [
        ("line one\nline {{two", ParseErrorKind::UnterminatedVariable, 2, 6),
        ("{{#if a == 1}}\n  open", ParseErrorKind::UnclosedConditional, 1, 1),
        ("ok\n\n   {{else}}", ParseErrorKind::UnexpectedElse, 3, 4),
        ("x{{/if}}", ParseErrorKind::UnmatchedEndIf, 1, 2),
        ("[[options]]\n[[option title=\"a\"]]b", ParseErrorKind::UnclosedOptionGroup, 2, 1),
    ];
    for (src, kind, line, column) in cases {
        let err = parse_template(src).unwrap_err();
        assert_eq!(err.kind, kind, "wrong kind for {:?}", src);
        assert_eq!((err.line, err.column), (line, column), "wrong position for {:?}", src);
    }
}

#[test]
fn error_message_names_position() {
    let err = parse_template("{{name").unwrap_err();
    assert_eq!(
        err.to_string(),
        "template parse error at line 1, column 1: unterminated tag: '{{' without a closing '}}'"
    );
}

#[test]
fn columns_count_characters_not_bytes() {
    let err = parse_template("héllo {{oops").unwrap_err();
    assert_eq!((err.line, err.column), (1, 7));
}

#[test]
fn ast_serializes_to_json() {
    let template = parse_template("Hi {{name}}{{#if a == 1}}!{{/if}}").unwrap();
    let json = serde_json::to_string(&template).unwrap();
    let back: Template = serde_json::from_str(&json).unwrap();
    assert_eq!(back, template);
    assert!(json.contains("\"Variable\":\"name\""));
}

#[test]
fn static_template_keeps_whitespace() {
    let src = "\n\n   Nothing to expand here.\t\n";
    let template = parse_template(src).unwrap();
    assert!(template.is_static());
    assert_eq!(template.nodes, vec![Node::Literal(src.to_string())]);
}
