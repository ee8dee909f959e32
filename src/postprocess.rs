use crate::config::Config;
use unicode_normalization::UnicodeNormalization;

/// Normalizes raw OCR or text-layer output for one page.
pub fn clean_page_text(cfg: &Config, raw: &str) -> String {
    let mut text = raw.replace('\u{000C}', "");
    text = normalize_newlines(&text);

    if cfg.postprocess.normalize_unicode {
        // OCR engines mix precomposed and combining forms.
        text = text.nfc().collect::<String>();
    }

    if cfg.postprocess.trim_trailing_whitespace {
        text = text
            .split('\n')
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
    }

    text.trim().to_string()
}

fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}
