use std::path::MAIN_SEPARATOR;

/// Keep at most the last `n` segments of `path`.
///
/// Untrimmed: `/home/user/src/acme/app/worker.rs`
/// Trimmed (3): `acme/app/worker.rs`
///
/// A limit of zero or below disables trimming, and paths that already have
/// `n` segments or fewer are returned as they are.
pub fn limit_path(path: &str, n: i32) -> String {
    if n <= 0 {
        return path.to_string();
    }

    let n = n as usize;
    let parts: Vec<&str> = path.split(MAIN_SEPARATOR).collect();
    if parts.len() <= n {
        return path.to_string();
    }

    parts[parts.len() - n..].join(&MAIN_SEPARATOR.to_string())
}
