/// Best-effort language guess for a page.
///
/// Returns an ISO 639-1 code when the language has one (`hi`, `en`), the
/// ISO 639-3 code otherwise, and `None` for blank or undetectable text.
pub fn detect_language(text: &str) -> Option<String> {
    let snippet = text.trim().replace('\n', " ");
    if snippet.is_empty() {
        return None;
    }

    let info = whatlang::detect(&snippet)?;
    let code = info.lang().code();
    let short = isolang::Language::from_639_3(code).and_then(|l| l.to_639_1());
    Some(short.unwrap_or(code).to_string())
}
