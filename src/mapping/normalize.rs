// location normalization: raw trace locations -> project-relative file ids

pub const SEPARATOR: char = '/';
pub const FRAGMENT_DELIMITER: char = '#';

/// Canonicalize a raw location into a project-relative file identifier.
///
/// 1. `\` becomes `/` and runs of separators collapse to one.
/// 2. Everything from the first `#` on is dropped (`a.js#L10` -> `a.js`).
/// 3. If `project_root` appears as a path segment followed by more segments, only the
///    part after its last such occurrence is kept.
///
/// Never fails: without the root segment the separator-normalized, fragment-free input
/// is returned. Normalizing an already normalized path returns it unchanged.
pub fn normalize_path(raw: &str, project_root: &str) -> String {
    let without_fragment = raw.split(FRAGMENT_DELIMITER).next().unwrap_or_default();

    let mut path = String::with_capacity(without_fragment.len());
    for ch in without_fragment.chars() {
        let ch = if ch == '\\' { SEPARATOR } else { ch };
        if ch == SEPARATOR && path.ends_with(SEPARATOR) {
            continue;
        }
        path.push(ch);
    }

    if project_root.is_empty() {
        return path;
    }

    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    let last_root = segments
        .iter()
        .enumerate()
        .rev()
        .skip(1) //the root must be followed by at least one segment
        .find(|(_, s)| **s == project_root)
        .map(|(i, _)| i);

    match last_root {
        Some(i) => segments[i + 1..].join("/"),
        None => path,
    }
}
