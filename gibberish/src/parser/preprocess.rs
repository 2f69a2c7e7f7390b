use tracing::debug;

use crate::line::LineStore;

const COMMENT: char = '#';

/// Split source text into the cleaned lines the interpreter consumes.
///
/// Leading whitespace and a trailing `\r` are stripped; blank lines and lines
/// starting with `#` are dropped. Each kept line remembers its 1-based source
/// line and the byte span of its cleaned text.
pub(crate) fn clean_lines(source: &str) -> LineStore {
    let bom = if source.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut store = LineStore::new();
    let mut offset = bom;
    for (i, raw) in source[bom..].split('\n').enumerate() {
        let line_start = offset;
        offset += raw.len() + 1;

        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let text = raw.trim_start();
        if text.is_empty() || text.starts_with(COMMENT) {
            continue;
        }

        let start = line_start + (raw.len() - text.len());
        store.push(text, i + 1, start..start + text.len());
    }

    debug!(lines = store.len(), "preprocessed source");
    store
}
