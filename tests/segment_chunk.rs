use parliament_pipeline::segment::{TargetScript, batches, chunk, segment};

const DEVA: TargetScript = TargetScript::Devanagari;

fn rejoin(text: &str) -> String {
    segment(text, DEVA)
        .into_iter()
        .map(|s| s.text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn segments_alternate_by_script() {
    let text = "Mr. Speaker: Order.\nअध्यक्ष महोदय: कृपया बैठिए।\nदूसरी पंक्ति\nThe House adjourned.";
    let segs = segment(text, DEVA);
    assert_eq!(segs.len(), 3);
    assert!(!segs[0].is_target_script);
    assert!(segs[1].is_target_script);
    assert_eq!(segs[1].text, "अध्यक्ष महोदय: कृपया बैठिए।\nदूसरी पंक्ति");
    assert!(!segs[2].is_target_script);
}

#[test]
fn segmentation_round_trip_is_exact() {
    let samples = [
        "plain english",
        "नमस्ते",
        "a\nनमस्ते\nb\n",
        "\n\nनमस्ते\n\n",
        "trailing spaces   \n  मिश्रित English पंक्ति\r\nnext",
        "\n",
    ];
    for text in samples {
        assert_eq!(rejoin(text), text, "round trip failed for {text:?}");
    }
}

#[test]
fn empty_text_has_no_segments() {
    assert!(segment("", DEVA).is_empty());
}

#[test]
fn mixed_line_counts_as_target_script() {
    let segs = segment("Question No. 12 प्रश्न", DEVA);
    assert_eq!(segs.len(), 1);
    assert!(segs[0].is_target_script);
}

#[test]
fn chunks_respect_budget_and_rejoin() {
    let lines: Vec<String> = (0..40).map(|i| format!("पंक्ति संख्या {i}")).collect();
    let text = lines.join("\n");
    let chunks = chunk(&text, 60);
    assert!(chunks.len() > 1);
    for c in &chunks {
        assert!(c.chars().count() <= 60, "chunk too long: {}", c.chars().count());
    }
    assert_eq!(chunks.join("\n"), text);
}

#[test]
fn oversized_line_forms_its_own_chunk() {
    let long = "क".repeat(30);
    let text = format!("छोटा\n{long}\nछोटा");
    let chunks = chunk(&text, 10);
    assert_eq!(chunks, vec!["छोटा".to_string(), long.clone(), "छोटा".to_string()]);
}

#[test]
fn separator_counts_toward_budget() {
    // "abcd" + "\n" + "efgh" is nine characters.
    assert_eq!(chunk("abcd\nefgh", 9), vec!["abcd\nefgh"]);
    assert_eq!(chunk("abcd\nefgh", 8), vec!["abcd", "efgh"]);
}

#[test]
fn empty_segment_has_no_chunks() {
    assert!(chunk("", 512).is_empty());
}

#[test]
fn batches_are_fixed_size() {
    let items: Vec<u32> = (0..10).collect();
    let sizes: Vec<usize> = batches(&items, 4).map(<[u32]>::len).collect();
    assert_eq!(sizes, vec![4, 4, 2]);
    assert_eq!(batches(&items, 0).count(), 10);
}

#[test]
fn other_scripts_use_their_own_range() {
    assert!(TargetScript::Bengali.matches("বাংলা"));
    assert!(!TargetScript::Bengali.matches("हिन्दी"));
    assert!(TargetScript::Tamil.matches("தமிழ்"));
}
