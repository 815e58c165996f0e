//! Cache admissibility.
//!
//! A cached result may be served only when all of these hold:
//!
//! 1. a cache with revision data exists in the configured folder;
//! 2. its base SHA1 equals the current one exactly;
//! 3. neither the current nor the cached working tree had uncommitted
//!    changes;
//! 4. it records the options it was produced with, and those equal the
//!    current ones (normalized arguments, collapse pattern, reporter
//!    options) along with the rule set.
//!
//! Anything else, including a superset of the cached arguments, is a miss.

use std::fmt;
use tracing::debug;

use super::store::read_cache;
use crate::types::{CacheDocument, CruiseOptions, RevisionData};

/// Why a cache lookup did or did not hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheVerdict {
    /// The cached result may be served.
    Serve,
    /// Caching is off, or no cache with revision data exists.
    NoCache,
    /// The cache was made at another commit.
    ShaMismatch,
    /// The working tree has uncommitted changes.
    UncommittedChanges,
    /// The cache was made with other options or another rule set.
    OptionsIncompatible,
}

impl CacheVerdict {
    /// True for [`CacheVerdict::Serve`].
    pub fn can_serve(self) -> bool {
        self == CacheVerdict::Serve
    }
}

impl fmt::Display for CacheVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CacheVerdict::Serve => "serve",
            CacheVerdict::NoCache => "no cache",
            CacheVerdict::ShaMismatch => "revision differs",
            CacheVerdict::UncommittedChanges => "uncommitted changes",
            CacheVerdict::OptionsIncompatible => "options differ",
        };
        f.write_str(reason)
    }
}

/// Judge an already loaded cache document against the current invocation.
pub fn judge(cached: &CacheDocument, options: &CruiseOptions, revision: &RevisionData) -> CacheVerdict {
    let Some(cached_revision) = &cached.revision_data else {
        return CacheVerdict::NoCache;
    };
    if cached_revision.sha1 != revision.sha1 {
        return CacheVerdict::ShaMismatch;
    }
    // Results computed on a dirty tree are written but never served.
    if !revision.is_clean() || !cached_revision.is_clean() {
        return CacheVerdict::UncommittedChanges;
    }

    let Some(used) = &cached.summary.options_used else {
        return CacheVerdict::OptionsIncompatible;
    };
    if *used != options.options_used() || cached.summary.rule_set_used != options.rule_set {
        return CacheVerdict::OptionsIncompatible;
    }
    CacheVerdict::Serve
}

/// Read the cache named by `options` and judge it.
pub fn evaluate(options: &CruiseOptions, revision: &RevisionData) -> (CacheVerdict, Option<CacheDocument>) {
    let Some(folder) = options.cache.as_deref() else {
        return (CacheVerdict::NoCache, None);
    };

    let cached = read_cache(folder);
    let verdict = judge(&cached, options, revision);
    debug!(cache = %folder.display(), verdict = %verdict, "cache lookup");

    if verdict.can_serve() {
        (verdict, Some(cached))
    } else {
        (verdict, None)
    }
}

/// Whether the cache named by `options` may be served at `revision`.
pub fn can_serve(options: &CruiseOptions, revision: &RevisionData) -> bool {
    evaluate(options, revision).0.can_serve()
}
