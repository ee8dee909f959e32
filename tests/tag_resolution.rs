use parliament_pipeline::translate::resolve_tag;

const DEFAULT: &str = "hin_Deva";

#[test]
fn case_and_region_do_not_matter() {
    let a = resolve_tag(Some("hi"), DEFAULT);
    assert_eq!(a, resolve_tag(Some("HI"), DEFAULT));
    assert_eq!(a, resolve_tag(Some("hi-IN"), DEFAULT));
    assert_eq!(a, resolve_tag(Some("hi_IN"), DEFAULT));
    assert_eq!(a, "hin_Deva");
}

#[test]
fn unknown_or_absent_yields_default() {
    assert_eq!(resolve_tag(None, DEFAULT), DEFAULT);
    assert_eq!(resolve_tag(Some("xx"), DEFAULT), DEFAULT);
    assert_eq!(resolve_tag(Some(""), DEFAULT), DEFAULT);
    assert_eq!(resolve_tag(Some("xx"), "mar_Deva"), "mar_Deva");
}

#[test]
fn three_and_two_letter_codes_resolve() {
    assert_eq!(resolve_tag(Some("ben"), DEFAULT), "ben_Beng");
    assert_eq!(resolve_tag(Some("bn"), DEFAULT), "ben_Beng");
    assert_eq!(resolve_tag(Some("mr"), DEFAULT), "mar_Deva");
    assert_eq!(resolve_tag(Some("en"), DEFAULT), "eng_Latn");
    assert_eq!(resolve_tag(Some("maithili"), DEFAULT), "mai_Deva");
}

#[test]
fn prefixes_are_tried_after_full_code() {
    // "tamil" is not in the table, but its 3-letter prefix is.
    assert_eq!(resolve_tag(Some("tamil"), DEFAULT), "tam_Taml");
    // "urx" misses, its 2-letter prefix "ur" hits.
    assert_eq!(resolve_tag(Some("urx"), DEFAULT), "urd_Arab");
}
