//! Table path normalization.
//!
//! A path is a lowercase, space-free, slash-separated key such as
//! `places/castle/name`. Lookups are case-insensitive because every path is
//! normalized before it touches the registry.

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Prefix marking a path relative to the calling table's parent.
pub const RELATIVE_PREFIX: &str = "./";

/// Normalize a path: trim, lowercase, drop spaces, and strip leading or
/// trailing separators.
pub fn normalize(path: &str) -> String {
    let lowered: String = path
        .trim()
        .chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect();
    lowered.trim_matches(SEPARATOR).to_string()
}

/// Join segments into a normalized path, skipping empty segments.
pub fn join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Everything before the last segment, or `""` for a top-level path.
pub fn parent(path: &str) -> &str {
    path.rsplit_once(SEPARATOR).map_or("", |(parent, _)| parent)
}

/// Resolve `target` as seen from the table at `caller`.
///
/// A leading `./` is replaced by the caller's parent segments, so
/// `./subnest/table` from `nested/table` becomes `nested/subnest/table`.
/// Other targets are returned normalized.
pub fn resolve_relative(target: &str, caller: &str) -> String {
    match target.trim().strip_prefix(RELATIVE_PREFIX) {
        Some(rest) => join([parent(caller), rest]),
        None => normalize(target),
    }
}
