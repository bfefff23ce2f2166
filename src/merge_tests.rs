use super::{combine, with_disclaimer, DescriptionHandling, AI_DISCLAIMER};

#[test]
fn empty_new_text_is_identity_for_every_policy() {
    for handling in [
        DescriptionHandling::Append,
        DescriptionHandling::Prepend,
        DescriptionHandling::Replace,
    ] {
        assert_eq!(combine("curated text", "", handling), "curated text");
        assert_eq!(combine("", "", handling), "");
    }
}

#[test]
fn replace_ignores_old_text() {
    assert_eq!(
        combine("anything at all", "B", DescriptionHandling::Replace),
        "B"
    );
}

#[test]
fn prepend_puts_new_text_first() {
    assert_eq!(
        combine("old tail", "new head ", DescriptionHandling::Prepend),
        "new head old tail"
    );
}

#[test]
fn append_concatenates_when_no_marker_present() {
    assert_eq!(
        combine("Curated intro. ", "Generated.", DescriptionHandling::Append),
        "Curated intro. Generated."
    );
    assert_eq!(combine("", "Generated.", DescriptionHandling::Append), "Generated.");
}

#[test]
fn append_replaces_everything_after_the_marker() {
    let old = format!("Curated intro. {}", with_disclaimer("first generation"));
    let merged = combine(&old, &with_disclaimer("second generation"), DescriptionHandling::Append);
    assert_eq!(
        merged,
        format!("Curated intro. {}", with_disclaimer("second generation"))
    );
}

#[test]
fn repeated_appends_keep_a_single_disclaimer_tail() {
    let mut text = "Hand-written preamble. ".to_string();
    for generation in ["one", "two", "three"] {
        text = combine(&text, &with_disclaimer(generation), DescriptionHandling::Append);
    }
    assert_eq!(text.matches(AI_DISCLAIMER).count(), 1);
    assert!(text.starts_with("Hand-written preamble. "));
    assert!(text.ends_with("three"));
}
