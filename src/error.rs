pub use crate::types::FinderError;

pub type Result<T> = std::result::Result<T, FinderError>;

/// Attaches a lazily built message to a foreign error, producing the
/// variant chosen by `wrap`.
pub trait ErrorContext<T> {
    fn with_context<F>(self, wrap: fn(String) -> FinderError, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_context<F>(self, wrap: fn(String) -> FinderError, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(format!("{}: {}", f(), e)))
    }
}

/// Cuts a response body down to something fit for a log line.
pub fn body_snippet(body: &str) -> String {
    const MAX: usize = 512;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
