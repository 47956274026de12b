//! Paragraph splitting for the map step.
//!
//! Documents are cut on blank lines (`"\n\n"`). Text that has line breaks but never a blank
//! line is one paragraph whose surrounding whitespace is noise, so it is trimmed. Text that
//! does use blank lines is kept byte-for-byte apart from the separators themselves.

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split `text` into ordered, non-empty paragraph chunks.
///
/// Single newlines inside a paragraph are never split. Empty input yields no chunks.
pub fn split_document_into_chunks(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let has_single_newline = text.contains('\n');
    let has_blank_line = text.contains(PARAGRAPH_SEPARATOR);

    if has_single_newline && !has_blank_line {
        return text
            .split(PARAGRAPH_SEPARATOR)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect();
    }

    text.split(PARAGRAPH_SEPARATOR)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}
