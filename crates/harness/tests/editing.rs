//! Session editing and navigation against the in-memory service

use markcheck_core::{Result, TextRange};
use markcheck_harness::{ProjectBuilder, Session};
use markcheck_service::mock::{CallLog, MockLanguageService};
use markcheck_service::LanguageService;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn session(content: &str) -> (Session, CallLog) {
    let calls = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&calls);
    let builder = ProjectBuilder::new(move || -> Result<Box<dyn LanguageService>> {
        let service = MockLanguageService::new();
        *slot.borrow_mut() = Some(service.calls());
        Ok(Box::new(service))
    });
    let session = builder.session("editing", content).expect("session");
    let log = calls.borrow().clone().expect("service created");
    (session, log)
}

#[test]
fn insertion_shifts_only_markers_at_or_after_it() {
    let (mut session, _) = session("/*a*/ab/*b*/cd/*c*/");
    session.go_to_marker("b").expect("marker");
    session.insert("XY").expect("insert");

    let offsets: Vec<usize> = ["a", "b", "c"]
        .iter()
        .map(|n| session.marker(n).expect("marker").offset)
        .collect();
    assert_eq!(offsets, vec![0, 4, 6]);
    assert_eq!(session.active_content().expect("content"), "abXYcd");
    assert_eq!(session.cursor(), 4);
}

#[test]
fn selection_is_replaced_and_inner_markers_collapse() {
    let (mut session, _) = session("one /*s*/t/*m*/wo/*e*/ three");
    session.go_to_select("s", "e").expect("select");
    assert_eq!(session.selection(), Some(TextRange::new(4, 7)));
    session.insert("2").expect("insert");

    assert_eq!(session.active_content().expect("content"), "one 2 three");
    assert_eq!(session.marker("s").expect("s").offset, 4);
    assert_eq!(session.marker("m").expect("m").offset, 4);
    assert_eq!(session.marker("e").expect("e").offset, 5);
    assert_eq!(session.selection(), None);
}

#[test]
fn ranges_follow_edits_before_them() {
    let (mut session, _) = session("let x = 1;\nlet [|y|] = x;");
    session.go_to_bof().expect("bof");
    session.insert_line("// header").expect("insert");
    let range = session.ranges()[0].range;
    let content = session.active_content().expect("content");
    assert_eq!(&content[range.start..range.end], "y");
}

#[test]
fn replace_line_keeps_other_lines() {
    let (mut session, _) = session("first\nsecond\nthird");
    session.replace_line(1, "2nd").expect("replace");
    assert_eq!(
        session.active_content().expect("content"),
        "first\n2nd\nthird"
    );
    assert!(session.select_line(3).is_err());
}

#[test]
fn replace_moves_cursor_with_the_text() {
    let (mut session, _) = session("abcdef/*1*/");
    session.go_to_marker("1").expect("marker");
    session.replace(0, 3, "z").expect("replace");
    assert_eq!(session.active_content().expect("content"), "zdef");
    assert_eq!(session.cursor(), 4);
}

#[test]
fn paste_leaves_cursor_in_place() {
    let (mut session, _) = session("ab/*1*/");
    session.go_to_marker("1").expect("marker");
    session.paste("cd").expect("paste");
    assert_eq!(session.cursor(), 2);
    assert_eq!(session.active_content().expect("content"), "abcd");
}

#[test]
fn backspace_cannot_pass_the_start_of_the_file() {
    let (mut session, _) = session("ab/*1*/");
    session.go_to_marker("1").expect("marker");
    let err = session.backspace(3).unwrap_err();
    assert_eq!(err.kind(), "NavigationError");
    assert_eq!(session.active_content().expect("content"), "ab");
}

#[test]
fn backspace_removes_whole_characters() {
    let (mut session, _) = session("héllo/*1*/");
    session.go_to_marker("1").expect("marker");
    session.backspace(4).expect("backspace");
    assert_eq!(session.active_content().expect("content"), "h");
    assert_eq!(session.cursor(), 1);
}

#[test]
fn every_edit_bumps_the_document_version() {
    let (mut session, calls) = session("x/*1*/");
    session.go_to_marker("1").expect("marker");
    session.insert("y").expect("insert");
    session.backspace(1).expect("backspace");
    assert_eq!(session.adapter().document("/editing.ts").expect("doc").version(), 3);

    let changes: Vec<String> = calls
        .borrow()
        .iter()
        .filter(|c| c.starts_with("didChange"))
        .cloned()
        .collect();
    assert_eq!(
        changes,
        vec![
            "didChange /editing.ts v2".to_string(),
            "didChange /editing.ts v3".to_string()
        ]
    );
}

#[test]
fn navigation_errors() {
    let (mut session, _) = session("// @filename: /a.ts\nabc\n// @filename: /b.ts\nd/*1*/");
    assert_eq!(session.go_to_position(4).unwrap_err().kind(), "NavigationError");
    assert_eq!(session.go_to_marker("zz").unwrap_err().kind(), "NavigationError");
    assert_eq!(session.go_to_file("/c.ts").unwrap_err().kind(), "NavigationError");
    assert_eq!(session.go_to_file_number(2).unwrap_err().kind(), "NavigationError");

    session.go_to_marker("1").expect("marker");
    assert_eq!(session.active_file(), "/b.ts");
    session.go_to_file_number(0).expect("file");
    session.go_to_eof().expect("eof");
    assert_eq!(session.cursor(), 3);
}

#[test]
fn anonymous_markers_are_reachable_by_index() {
    let (mut session, _) = session("a/**/b/*n*/c/**/");
    assert_eq!(session.marker_names(), vec!["n"]);
    session.go_to_marker_at(2).expect("marker");
    assert_eq!(session.cursor(), 3);
    assert!(session.go_to_marker_at(3).is_err());
}
