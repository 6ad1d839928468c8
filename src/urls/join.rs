//! Absolute URL assembly.

/// Join `scheme`, `host` and `path` into an absolute URL.
///
/// An empty or absent path becomes `/`. Nothing is validated or resolved;
/// the inputs are only concatenated.
pub fn url_join(host: &str, scheme: &str, path: Option<&str>) -> String {
    match path {
        Some(path) if path.starts_with('/') => format!("{}://{}{}", scheme, host, path),
        Some(path) if !path.is_empty() => format!("{}://{}/{}", scheme, host, path),
        _ => format!("{}://{}/", scheme, host),
    }
}
