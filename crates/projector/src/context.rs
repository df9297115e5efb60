//! Processing context for a projection run
//!
//! The context carries the environment facts a projection needs: the target
//! software version and the set of provisioned feature modules. It is built
//! by the caller and read-only to the engine.

use std::collections::HashSet;

/// Environment facts for one projection run
#[derive(Debug, Clone, Default)]
pub struct Context {
    target_version: String,
    provisioned: HashSet<String>,
}

impl Context {
    /// Create a context for the given target version with no modules
    pub fn new(target_version: impl Into<String>) -> Self {
        Self {
            target_version: target_version.into(),
            provisioned: HashSet::new(),
        }
    }

    /// Add provisioned feature modules
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provisioned.extend(modules.into_iter().map(Into::into));
        self
    }

    /// The target software version
    pub fn target_version(&self) -> &str {
        &self.target_version
    }

    /// Check whether a feature module is provisioned
    pub fn is_module_active(&self, module: &str) -> bool {
        self.provisioned.contains(module)
    }

    /// Check whether the target version is below `min`
    pub fn version_before(&self, min: &str) -> bool {
        version_less_than(&self.target_version, min)
    }
}

/// Compare two dot-separated version strings
///
/// Segments compare numerically; missing segments count as zero, as do
/// segments that are not numbers.
pub fn version_less_than(a: &str, b: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|seg| seg.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };

    let left = parse(a);
    let right = parse(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        if l != r {
            return l < r;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        assert!(version_less_than("13.0", "14.1"));
        assert!(version_less_than("14.0.9", "14.1"));
        assert!(!version_less_than("14.1", "14.1"));
        assert!(!version_less_than("15.0", "14.1"));
    }

    #[test]
    fn test_version_missing_segments_are_zero() {
        assert!(!version_less_than("14.1", "14.1.0"));
        assert!(!version_less_than("14.1.0", "14.1"));
        assert!(version_less_than("14.1", "14.1.1"));
    }

    #[test]
    fn test_module_membership() {
        let ctx = Context::new("14.1").with_modules(["afm", "asm"]);
        assert!(ctx.is_module_active("afm"));
        assert!(!ctx.is_module_active("gtm"));
    }

    #[test]
    fn test_version_before() {
        let ctx = Context::new("13.0");
        assert!(ctx.version_before("14.1"));
        assert!(!ctx.version_before("12.0"));
    }
}
