//! Lexical helpers for the classifier.
//!
//! D source is never parsed. Instead comments and the contents of string and
//! character literals are blanked out so that braces, semicolons and keywords
//! inside them cannot confuse the patterns. Blanking keeps byte offsets
//! intact, so spans found on the masked text slice the original text.

/// Replace comments and literal contents with spaces, keeping newlines and
/// literal delimiters.
pub(crate) fn mask(source: &str) -> Vec<u8> {
    let src = source.as_bytes();
    let mut out = src.to_vec();
    let mut i = 0;

    while i < src.len() {
        match src[i] {
            b'/' if src.get(i + 1) == Some(&b'/') => {
                let end = find_byte(src, i, b'\n').unwrap_or(src.len());
                blank(&mut out, i, end);
                i = end;
            }
            b'/' if src.get(i + 1) == Some(&b'*') => {
                let end = find_seq(src, i + 2, b"*/").map_or(src.len(), |p| p + 2);
                blank(&mut out, i, end);
                i = end;
            }
            b'/' if src.get(i + 1) == Some(&b'+') => {
                let end = nesting_comment_end(src, i);
                blank(&mut out, i, end);
                i = end;
            }
            b'r' if src.get(i + 1) == Some(&b'"') && !is_ident_byte(prev(src, i)) => {
                let end = find_byte(src, i + 2, b'"').map_or(src.len(), |p| p + 1);
                blank(&mut out, i + 2, end.saturating_sub(1).max(i + 2));
                i = end;
            }
            b'`' => {
                let end = find_byte(src, i + 1, b'`').map_or(src.len(), |p| p + 1);
                blank(&mut out, i + 1, end.saturating_sub(1).max(i + 1));
                i = end;
            }
            b'"' => {
                let end = escaped_end(src, i + 1, b'"', false);
                blank(&mut out, i + 1, end.saturating_sub(1).max(i + 1));
                i = end;
            }
            b'\'' => {
                let end = escaped_end(src, i + 1, b'\'', true);
                blank(&mut out, i + 1, end.saturating_sub(1).max(i + 1));
                i = end;
            }
            _ => i += 1,
        }
    }

    out
}

/// Positions at brace depth zero where a new top-level statement or
/// declaration begins (first non-whitespace byte after a boundary).
pub(crate) fn statement_starts(masked: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut depth: usize = 0;
    let mut boundary = true;

    for (i, &b) in masked.iter().enumerate() {
        if boundary && !b.is_ascii_whitespace() {
            if depth == 0 {
                starts.push(i);
            }
            boundary = false;
        }
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                boundary = depth == 0;
            }
            b';' if depth == 0 => boundary = true,
            _ => {}
        }
    }

    starts
}

/// Index of the `}` matching the `{` at `open`, if balanced.
pub(crate) fn matching_brace(masked: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in masked.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the first `;` at or after `from` outside any braces or parens.
pub(crate) fn statement_end(masked: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in masked.iter().enumerate().skip(from) {
        match b {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn blank(out: &mut [u8], start: usize, end: usize) {
    let end = end.min(out.len());
    for b in out.iter_mut().take(end).skip(start) {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

fn prev(src: &[u8], i: usize) -> u8 {
    if i == 0 { b' ' } else { src[i - 1] }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find_byte(src: &[u8], from: usize, needle: u8) -> Option<usize> {
    src.iter().skip(from).position(|&b| b == needle).map(|p| p + from)
}

fn find_seq(src: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= src.len() {
        return None;
    }
    src[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// End (exclusive) of a literal closed by `quote`, honouring backslash
/// escapes. Character literals also stop at a newline.
fn escaped_end(src: &[u8], mut i: usize, quote: u8, single_line: bool) -> usize {
    while i < src.len() {
        match src[i] {
            b'\\' => i += 2,
            b'\n' if single_line => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    src.len()
}

/// End (exclusive) of a `/+ +/` comment, which nests in D.
fn nesting_comment_end(src: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < src.len() {
        match (src[i], src[i + 1]) {
            (b'/', b'+') => {
                depth += 1;
                i += 2;
            }
            (b'+', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    src.len()
}
