//! Parsing properties checked against realistic multi-file fixtures

use markcheck_fixture::{parse_fixture, FixtureParser, OptionRegistry};
use pretty_assertions::assert_eq;

const TWO_FILES: &str = r#"// @strict: true
// @filename: /exporter.ts
export function [|/*decl*/helper|](n: number) {
    return n * 2;
}
// @filename: /importer.ts
// @emitThisFile: true
import { helper } from "./exporter";
const a = /*use1*/helper(1);
const b = [|{| "name": "use2", "kind": "call" |}helper|](2);
"#;

#[test]
fn test_parsing_is_idempotent() {
    let first = parse_fixture("two_files", TWO_FILES).expect("parse");
    let second = parse_fixture("two_files", TWO_FILES).expect("parse");
    assert_eq!(first, second);
}

#[test]
fn test_files_options_and_markers() {
    let fixture = parse_fixture("two_files", TWO_FILES).expect("parse");

    let paths: Vec<_> = fixture.files().iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["/exporter.ts", "/importer.ts"]);
    assert!(!fixture.files()[0].emit);
    assert!(fixture.files()[1].emit);
    assert_eq!(
        fixture.options().global.get("strict").map(String::as_str),
        Some("true")
    );

    assert_eq!(fixture.marker_names(), vec!["decl", "use1", "use2"]);
    assert_eq!(fixture.ranges().len(), 2);
    assert_eq!(fixture.ranges()[0].name.as_deref(), Some("decl"));
    assert_eq!(fixture.ranges()[1].name.as_deref(), Some("use2"));

    let importer = &fixture.files()[1].content;
    assert!(!importer.contains("/*"));
    assert!(!importer.contains("[|"));
    assert!(!importer.contains("{|"));
}

/// The character right after each annotation in the raw text must sit at the
/// marker's offset in the stripped text.
#[test]
fn test_marker_offsets_point_at_following_character() {
    let fixture = parse_fixture("two_files", TWO_FILES).expect("parse");
    for marker in fixture.markers() {
        let file = fixture.file(&marker.file).expect("marker file exists");
        let following = file.content[marker.offset..].chars().next();
        assert_eq!(following, Some('h'), "marker {:?}", marker.name);
    }
    for range in fixture.ranges() {
        let file = fixture.file(&range.file).expect("range file exists");
        assert_eq!(&file.content[range.range.start..range.range.end], "helper");
    }
}

#[test]
fn test_named_range_inside_string_literal() {
    let fixture = parse_fixture(
        "literal",
        r#"declare function f(x: "alpha" | "beta"): void;
f("[|{| "name": "lit" |}al/*caret*/|]");"#,
    )
    .expect("parse");

    let file = &fixture.files()[0];
    assert_eq!(file.path, "/literal.ts");
    let range = &fixture.ranges()[0];
    assert_eq!(range.name.as_deref(), Some("caret"));
    assert_eq!(&file.content[range.range.start..range.range.end], "al");
    let caret = fixture.marker("caret").expect("caret marker");
    assert_eq!(caret.offset, range.range.end);
}

#[test]
fn test_anonymous_markers_keep_declaration_order() {
    let fixture = parse_fixture("anon", "a./**/\nb./**/").expect("parse");
    let offsets: Vec<_> = fixture.markers().iter().map(|m| m.offset).collect();
    assert_eq!(offsets, vec![2, 5]);
    assert!(fixture.marker_names().is_empty());
}

#[test]
fn test_parse_errors_name_file_and_position() {
    let err = parse_fixture("bad", "// @filename: /a.ts\nok\n  |] oops").unwrap_err();
    assert_eq!(
        err.to_string(),
        "/a.ts (2,4): Found range end with no matching start."
    );
}

#[test]
fn test_extra_options_are_accepted() {
    let parser = FixtureParser::new(OptionRegistry::builtin().with_extra(["customFlag"]));
    let fixture = parser
        .parse("extra", "// @customFlag: on\nx", "extra.ts")
        .expect("parse");
    assert_eq!(
        fixture.options().global.get("customflag").map(String::as_str),
        Some("on")
    );

    let err = parse_fixture("extra", "// @customFlag: on\nx").unwrap_err();
    assert!(err.to_string().contains("Unknown option pragma '@customFlag'"));
}
