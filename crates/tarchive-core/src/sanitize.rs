//! Token id sanitizing.

/// Characters that never survive into an archive filename.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '[', ']', '(', ')'];

/// Turn a token id into a filesystem-safe file stem.
///
/// Each run of forbidden characters collapses into a single `_`. Both path
/// separators are in the forbidden set, so the result never names another
/// directory.
pub fn sanitize_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut in_run = false;

    for c in id.chars() {
        if FORBIDDEN.contains(&c) {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }

    out
}
