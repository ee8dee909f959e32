//! Language-code to IndicTrans2 tag resolution.

const LANGUAGE_TAGS: &[(&str, &str)] = &[
    ("hi", "hin_Deva"),
    ("hin", "hin_Deva"),
    ("mr", "mar_Deva"),
    ("mar", "mar_Deva"),
    ("bn", "ben_Beng"),
    ("ben", "ben_Beng"),
    ("ta", "tam_Taml"),
    ("tam", "tam_Taml"),
    ("te", "tel_Telu"),
    ("tel", "tel_Telu"),
    ("ml", "mal_Mlym"),
    ("mal", "mal_Mlym"),
    ("gu", "guj_Gujr"),
    ("guj", "guj_Gujr"),
    ("pa", "pan_Guru"),
    ("pan", "pan_Guru"),
    ("kn", "kan_Knda"),
    ("kan", "kan_Knda"),
    ("ka", "kan_Knda"),
    ("or", "ory_Orya"),
    ("ory", "ory_Orya"),
    ("od", "ory_Orya"),
    ("ne", "npi_Deva"),
    ("npi", "npi_Deva"),
    ("as", "asm_Beng"),
    ("asm", "asm_Beng"),
    ("ur", "urd_Arab"),
    ("urd", "urd_Arab"),
    ("sd", "snd_Deva"),
    ("snd", "snd_Deva"),
    ("mai", "mai_Deva"),
    ("maithili", "mai_Deva"),
    ("mag", "mag_Deva"),
    ("bho", "bho_Deva"),
    ("gom", "gom_Deva"),
    ("doi", "doi_Deva"),
    ("en", "eng_Latn"),
];

fn lookup(code: &str) -> Option<&'static str> {
    LANGUAGE_TAGS
        .iter()
        .find(|(k, _)| *k == code)
        .map(|(_, tag)| *tag)
}

/// Maps a detected language code (`hi`, `HI`, `hi-IN`, `hin`) to the model's
/// source tag. Tries the full base code, then its 3- and 2-letter prefixes,
/// and falls back to `default_tag`.
pub fn resolve_tag<'a>(language: Option<&str>, default_tag: &'a str) -> &'a str {
    let Some(language) = language else {
        return default_tag;
    };

    let lowered = language.trim().to_lowercase();
    let base = lowered.split(['-', '_']).next().unwrap_or_default();
    let prefix = |n: usize| base.chars().take(n).collect::<String>();

    [base.to_string(), prefix(3), prefix(2)]
        .iter()
        .filter(|c| !c.is_empty())
        .find_map(|c| lookup(c))
        .unwrap_or(default_tag)
}
