//! Result cache.
//!
//! A finished validation result is persisted as `<folder>/cache.json`
//! together with the revision it was computed at. A later run at the same
//! clean revision with the same options may serve that result instead of
//! validating again.
//!
//! ```text
//! CruiseOptions + RevisionData ──► coordinator::evaluate ──► CacheVerdict
//!                                         │
//!                                  store::read_cache
//! ```

pub mod coordinator;
pub mod store;

pub use coordinator::{can_serve, evaluate, judge, CacheVerdict};
pub use store::{read_cache, write_cache, CacheWriteError};

/// File name of the cache document inside the cache folder.
pub const CACHE_FILE_NAME: &str = "cache.json";

/// Normalize path-selection arguments: forward slashes, no trailing slash,
/// joined by single spaces in the given order.
///
/// ```
/// use cruise_kernel::cache::normalize_args;
///
/// assert_eq!(normalize_args(["src\\app\\", "test/"]), "src/app test");
/// ```
pub fn normalize_args<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .filter_map(|arg| {
            let arg = arg.as_ref().replace('\\', "/");
            let trimmed = arg.trim_end_matches('/');
            // A lone "/" stays the root.
            let arg = if trimmed.is_empty() && !arg.is_empty() { "/" } else { trimmed };
            (!arg.is_empty()).then(|| arg.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
