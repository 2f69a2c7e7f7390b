use std::ops::{Index, Range};
use std::slice;

/// The depth-marker character. A body line at nesting depth D starts with D of these.
pub const DEPTH_MARKER: u8 = b'>';

/// A single cleaned source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Position in the line store. This is the "line index" errors refer to.
    pub index: usize,
    /// Line text with leading whitespace removed.
    pub text: String,
    /// 1-based line number in the original source.
    pub source_line: usize,
    /// Byte span of `text` in the original source.
    pub span: Range<usize>,
}

impl Line {
    /// Number of leading depth markers.
    pub fn depth(&self) -> usize {
        self.text.bytes().take_while(|&b| b == DEPTH_MARKER).count()
    }

    /// The text with up to `depth` leading markers removed.
    pub fn content_at(&self, depth: usize) -> &str {
        let markers = self.depth().min(depth);
        &self.text[markers..]
    }
}

/// Ordered, read-only store of the program's lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStore {
    lines: Vec<Line>,
}

impl LineStore {
    pub fn new() -> Self {
        LineStore { lines: Vec::new() }
    }

    /// Build a store from texts that need no cleaning. Spans are laid out as if
    /// the texts were joined with `\n`.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = LineStore::new();
        let mut offset = 0;
        for (i, text) in texts.into_iter().enumerate() {
            let text = text.into();
            let len = text.len();
            store.push(text, i + 1, offset..offset + len);
            offset += len + 1;
        }
        store
    }

    /// Append a line; its index is assigned from the current length.
    pub fn push(&mut self, text: impl Into<String>, source_line: usize, span: Range<usize>) {
        self.lines.push(Line {
            index: self.lines.len(),
            text: text.into(),
            source_line,
            span,
        });
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// View of the lines in `range`, clamped to the store.
    pub fn slice(&self, range: Range<usize>) -> &[Line] {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);
        &self.lines[start..end]
    }

    pub fn iter(&self) -> slice::Iter<'_, Line> {
        self.lines.iter()
    }
}

impl Index<usize> for LineStore {
    type Output = Line;

    fn index(&self, index: usize) -> &Line {
        &self.lines[index]
    }
}

impl<'a> IntoIterator for &'a LineStore {
    type Item = &'a Line;
    type IntoIter = slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
