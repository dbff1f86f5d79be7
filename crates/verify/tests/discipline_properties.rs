use markcheck_core::TextRange;
use markcheck_service::{CompletionResponse, EditSpan, ItemDefaults, ItemEdit, ResponseItem};
use markcheck_verify::{
    no_resolve, verify_completion_list, ExpectedCompletion, ExpectedItem, ExpectedItemDefaults,
    ExpectedItems, ExpectedList, Field, DEFAULT_COMMIT_CHARACTERS,
};

fn item(label: &str, kind: &str, sort_text: &str) -> ResponseItem {
    ResponseItem {
        label: label.to_string(),
        kind: Some(kind.to_string()),
        detail: None,
        documentation: None,
        sort_text: Some(sort_text.to_string()),
        filter_text: None,
        insert_text: None,
        edit: None,
        commit_characters: None,
        label_detail: None,
        label_description: None,
        deprecated: false,
        preselect: None,
        raw: Default::default(),
    }
}

fn response() -> CompletionResponse {
    let mut quoted = item("beta", "constant", "11");
    quoted.edit = Some(ItemEdit {
        new_text: "beta".to_string(),
        span: EditSpan::from(TextRange::new(3, 5)),
    });
    CompletionResponse {
        is_incomplete: false,
        item_defaults: Some(ItemDefaults {
            commit_characters: Some(DEFAULT_COMMIT_CHARACTERS.clone()),
            edit_range: Some(EditSpan::from(TextRange::new(3, 5))),
        }),
        items: vec![
            item("alpha", "field", "11"),
            quoted,
            item("gamma", "method", "11"),
            item("class", "keyword", "15"),
        ],
    }
}

fn expected_items() -> Vec<ExpectedItem> {
    vec![
        ExpectedCompletion::new("alpha").kind("field").into(),
        ExpectedCompletion::new("beta")
            .kind("constant")
            .edit("beta", TextRange::new(3, 5))
            .into(),
        "gamma".into(),
        ExpectedCompletion::new("class")
            .kind("keyword")
            .sort_text("15")
            .into(),
    ]
}

fn list(items: ExpectedItems) -> ExpectedList {
    ExpectedList::new(items).with_item_defaults(ExpectedItemDefaults::standard())
}

fn passes(expected: &ExpectedList) -> bool {
    verify_completion_list("", Some(&response()), Some(expected), &mut no_resolve).is_ok()
}

#[test]
fn exact_passing_implies_unsorted_and_includes_pass() {
    let items = expected_items();
    assert!(passes(&list(ExpectedItems::exact(items.clone()))));

    let mut reversed = items.clone();
    reversed.reverse();
    assert!(passes(&list(ExpectedItems::unsorted(reversed.clone()))));
    assert!(passes(&list(ExpectedItems::includes(reversed))));

    for item in &items {
        assert!(passes(&list(ExpectedItems::includes([item.clone()]))));
    }
}

#[test]
fn passing_excludes_means_no_excluded_label_is_present() {
    let actual = response();
    for excluded in ["delta", "epsilon"] {
        assert!(passes(&list(ExpectedItems::excludes([excluded]))));
        assert!(actual.items.iter().all(|i| i.label != excluded));
    }
    for present in actual.items.iter().map(|i| i.label.clone()) {
        assert!(!passes(&list(ExpectedItems::excludes([present]))));
    }
}

#[test]
fn wildcard_requires_presence_only() {
    let mut beta = ExpectedCompletion::new("beta");
    beta.edit_range = Field::Ignored;
    beta.kind = Field::Ignored;
    assert!(passes(&list(ExpectedItems::includes([beta.clone()]))));

    beta.detail = Field::Ignored;
    let err = verify_completion_list(
        "At marker '1': ",
        Some(&response()),
        Some(&list(ExpectedItems::includes([beta]))),
        &mut no_resolve,
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("detail: expected <any value>, actual <absent>"));
}

#[test]
fn wrong_sort_text_default_is_reported() {
    let keyword = ExpectedCompletion::new("class").kind("keyword");
    assert!(!passes(&list(ExpectedItems::includes([keyword]))));
}
