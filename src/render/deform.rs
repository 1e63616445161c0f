use crate::expression::Formula;
use crate::foundation::cache::BoundedCache;
use crate::transform::path::{PathSegment, SegmentKind};
use std::sync::{Mutex, PoisonError};

/// Default number of compiled formula pairs kept by a [`FormulaCache`].
pub const DEFAULT_FORMULA_CACHE_CAPACITY: usize = 32;

/// Compiled `x`/`y` deform formulas.
#[derive(Debug, Clone)]
pub(crate) struct DeformProgram {
    x: Formula,
    y: Formula,
}

impl DeformProgram {
    fn compile(x: &str, y: &str) -> Option<Self> {
        match (Formula::compile(x), Formula::compile(y)) {
            (Ok(x), Ok(y)) => Some(Self { x, y }),
            (Err(err), _) | (_, Err(err)) => {
                tracing::debug!(%err, "deform formula rejected");
                None
            }
        }
    }
}

/// Compiled deform programs keyed by formula pair. Failed compilations are cached as `None`.
///
/// Formulas carry their evaluation stack, so the lock covers evaluation as well as lookup.
pub struct FormulaCache {
    inner: Mutex<BoundedCache<(String, String), Option<DeformProgram>>>,
}

impl FormulaCache {
    /// Create a cache holding at most `capacity` formula pairs.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    /// Number of cached formula pairs.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no formula pair has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::new(DEFAULT_FORMULA_CACHE_CAPACITY)
    }
}

/// Replace every non-close point of `path` with `(x_formula, y_formula)` evaluated at that point
/// and `t = progress`.
///
/// A point whose evaluation fails keeps its coordinates. Returns the number of deformed points.
pub fn path_deform(
    path: &mut [PathSegment],
    x_formula: &str,
    y_formula: &str,
    progress: f64,
    cache: &FormulaCache,
) -> usize {
    let key = (x_formula.to_owned(), y_formula.to_owned());
    let mut guard = cache.inner.lock().unwrap_or_else(PoisonError::into_inner);
    if !guard.contains(&key) {
        let program = DeformProgram::compile(x_formula, y_formula);
        guard.add(key.clone(), program);
    }
    let Some(Some(program)) = guard.get_mut(&key) else {
        return 0;
    };

    let mut deformed = 0;
    for seg in path.iter_mut().filter(|s| s.kind != SegmentKind::Close) {
        let x = program.x.eval(seg.x, seg.y, progress);
        let y = program.y.eval(seg.x, seg.y, progress);
        match (x, y) {
            (Ok(x), Ok(y)) => {
                seg.x = x;
                seg.y = y;
                deformed += 1;
            }
            (Err(err), _) | (_, Err(err)) => {
                tracing::trace!(%err, x = seg.x, y = seg.y, "deform left point unchanged");
            }
        }
    }
    deformed
}

#[cfg(test)]
#[path = "../../tests/unit/render/deform.rs"]
mod tests;
