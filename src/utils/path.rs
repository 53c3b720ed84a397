use std::path::{Path, PathBuf};

/// Expand a leading tilde (~) to the current user's home directory.
///
/// Supports `~` and `~/path`. Other forms (including `~user/path`) are
/// returned unchanged; scope templates only ever use the current user's
/// home.
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_str()?;

    if !path_str.starts_with('~') {
        return Some(path.to_path_buf());
    }

    let after_tilde = &path_str[1..];
    if after_tilde.is_empty() || after_tilde.starts_with('/') {
        let home = std::env::var("HOME").ok()?;
        return Some(PathBuf::from(home).join(after_tilde.trim_start_matches('/')));
    }

    Some(path.to_path_buf())
}

/// Join two `/`-separated source-relative paths, dropping empty segments.
pub fn join_rel(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}/{}", base.trim_end_matches('/'), rest.trim_start_matches('/')),
    }
}

/// Last `/`-separated component of a source-relative path.
pub fn basename(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

/// Basename with its final extension removed.
pub fn stem(rel: &str) -> &str {
    let base = basename(rel);
    match base.rfind('.') {
        Some(0) | None => base,
        Some(idx) => &base[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_plain_path() {
        let path = expand_tilde("/etc/hosts").unwrap();
        assert_eq!(path, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn test_expand_tilde_home() {
        let home = std::env::var("HOME").unwrap();
        let path = expand_tilde("~/Documents").unwrap();
        assert_eq!(path, PathBuf::from(home).join("Documents"));
    }

    #[test]
    fn test_expand_tilde_bare() {
        let home = std::env::var("HOME").unwrap();
        let path = expand_tilde("~").unwrap();
        assert_eq!(path, PathBuf::from(home));
    }

    #[test]
    fn test_join_rel() {
        assert_eq!(join_rel("agents", "architect.md"), "agents/architect.md");
        assert_eq!(join_rel("", "architect.md"), "architect.md");
        assert_eq!(join_rel("agents/", "/architect.md"), "agents/architect.md");
        assert_eq!(join_rel("agents", ""), "agents");
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("agents/architect.md"), "architect");
        assert_eq!(stem("no-extension"), "no-extension");
        assert_eq!(stem(".hidden"), ".hidden");
    }
}
