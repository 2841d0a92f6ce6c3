//! Best-effort document title detection.

/// Title used when the document does not open with a recognisable heading.
pub const DEFAULT_TITLE: &str = "";

/// Guess a title from the first non-blank line of `input`.
///
/// Two forms are recognised: an ATX-style `# Title` line, and a line
/// underlined by a run of `=`. Only the first non-blank line is considered.
pub fn sniff_title(input: &[u8]) -> String {
    let mut i = 0usize;

    while i < input.len() && is_line_end(input[i]) {
        i += 1;
    }
    if i >= input.len() {
        return DEFAULT_TITLE.to_string();
    }

    let start = i;
    while i < input.len() && !is_line_end(input[i]) {
        i += 1;
    }
    let line1 = &input[start..i];

    if i < input.len() {
        if input[i] == b'\r' && input.get(i + 1) == Some(&b'\n') {
            i += 1;
        }
        i += 1;
    }

    if line1.len() >= 3 && line1[0] == b'#' && is_blank(line1[1]) {
        return trimmed(&line1[2..]);
    }

    if input.get(i) != Some(&b'=') {
        return DEFAULT_TITLE.to_string();
    }
    while input.get(i) == Some(&b'=') {
        i += 1;
    }
    while input.get(i).is_some_and(|&b| is_blank(b)) {
        i += 1;
    }
    match input.get(i) {
        None => trimmed(line1),
        Some(&b) if is_line_end(b) => trimmed(line1),
        Some(_) => DEFAULT_TITLE.to_string(),
    }
}

fn is_line_end(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

fn trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
