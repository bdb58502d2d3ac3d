//! Page source loading: file bytes, charset sniffing, page URL.

use encoding_rs::Encoding;
use std::path::Path;
use url::Url;

const CHARSET_SNIFF_BYTES: usize = 8192;

pub(crate) struct PageSource {
    pub(crate) markup: String,
    pub(crate) url: String,
}

pub(crate) fn read_page(path: &Path) -> Result<PageSource, String> {
    let bytes = std::fs::read(path)
        .map_err(|error| format!("failed to read page `{}`: {error}", path.display()))?;
    let absolute = std::fs::canonicalize(path)
        .map_err(|error| format!("failed to resolve page `{}`: {error}", path.display()))?;
    let url = Url::from_file_path(&absolute)
        .map_err(|()| format!("`{}` cannot be expressed as a file URL", absolute.display()))?;

    tracing::info!(%url, bytes = bytes.len(), "page source read");
    Ok(PageSource {
        markup: decode_html(&bytes),
        url: url.to_string(),
    })
}

/// Decodes with the `<meta charset>` label when one is declared, UTF-8 otherwise.
pub(crate) fn decode_html(body: &[u8]) -> String {
    let encoding = parse_charset_from_html_prefix(body)
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    match encoding {
        Some(encoding) => {
            let (decoded, actual, had_errors) = encoding.decode(body);
            if had_errors {
                tracing::warn!(encoding = actual.name(), "page contained malformed sequences");
            }
            decoded.into_owned()
        }
        None => String::from_utf8_lossy(body).into_owned(),
    }
}

fn parse_charset_from_html_prefix(body: &[u8]) -> Option<String> {
    let prefix = String::from_utf8_lossy(&body[..body.len().min(CHARSET_SNIFF_BYTES)]);
    let lower = prefix.to_ascii_lowercase();

    lower
        .match_indices("charset=")
        .find_map(|(index, needle)| parse_charset_label(&prefix[index + needle.len()..]))
}

fn parse_charset_label(input: &str) -> Option<String> {
    let trimmed = input.trim_start();
    let label = match trimmed.chars().next()? {
        quote @ ('"' | '\'') => {
            let rest = &trimmed[1..];
            &rest[..rest.find(quote)?]
        }
        _ => {
            let end = trimmed
                .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '<' | '>' | '/'))
                .unwrap_or(trimmed.len());
            &trimmed[..end]
        }
    };
    let label = label.trim();
    (!label.is_empty()).then(|| label.to_owned())
}
