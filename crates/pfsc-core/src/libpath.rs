use smol_str::SmolStr;
use std::fmt;

/// A dotted library path, e.g. `test.foo.bar.Thm.C`.
///
/// Libpaths are immutable and cloned constantly while resolving imports and
/// targets, so the backing storage is a `SmolStr` rather than a heap-growing
/// `String`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Libpath(SmolStr);

impl Libpath {
    pub fn new(s: impl AsRef<str>) -> Self {
        Libpath(SmolStr::new(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Join this libpath with a trailing segment: `a.b`.join(`c`) = `a.b.c`.
    pub fn join(&self, segment: &str) -> Libpath {
        Libpath(SmolStr::new(format!("{}.{}", self.0, segment)))
    }

    /// The first `n` segments, joined back into a libpath. Used when climbing
    /// from a target's libpath to its owning deduction or module.
    pub fn prefix(&self, n: usize) -> Option<Libpath> {
        let joined: Vec<&str> = self.segments().take(n).collect();
        if joined.len() < n {
            None
        } else {
            Some(Libpath(SmolStr::new(joined.join("."))))
        }
    }

    pub fn num_segments(&self) -> usize {
        self.segments().count()
    }

    /// The final segment, e.g. `C` for `test.foo.bar.Thm.C`.
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(self.0.as_str())
    }

    /// The libpath of the immediate parent, or `None` for a single-segment
    /// (repo-root) libpath.
    pub fn parent(&self) -> Option<Libpath> {
        let n = self.num_segments();
        if n <= 1 {
            None
        } else {
            self.prefix(n - 1)
        }
    }

    /// True if `other` is this libpath, or a (possibly indirect) module-path
    /// descendant of it (segment-wise prefix, not a raw string prefix).
    pub fn is_prefix_of(&self, other: &Libpath) -> bool {
        let a = self.0.as_str();
        let b = other.0.as_str();
        if a.len() > b.len() {
            return false;
        }
        b == a || (b.starts_with(a) && b.as_bytes().get(a.len()) == Some(&b'.'))
    }

    /// The repopath: the first three segments (domain, user/org, repo name),
    /// matching the convention that module paths under a repo always begin
    /// `domain.owner.repo`.
    pub fn repopath(&self) -> Option<Libpath> {
        self.prefix(3)
    }
}

impl fmt::Display for Libpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for Libpath {
    fn from(s: &str) -> Self {
        Libpath::new(s)
    }
}

impl From<String> for Libpath {
    fn from(s: String) -> Self {
        Libpath(SmolStr::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_boundary_is_segment_wise() {
        let a = Libpath::new("a.b1");
        let sibling = Libpath::new("a.b10");
        assert!(!a.is_prefix_of(&sibling));
        let child = Libpath::new("a.b1.c1");
        assert!(a.is_prefix_of(&child));
        assert!(a.is_prefix_of(&a));
    }

    #[test]
    fn parent_and_prefix() {
        let lp = Libpath::new("a.b1.c1.d");
        assert_eq!(lp.parent().unwrap().as_str(), "a.b1.c1");
        assert_eq!(lp.prefix(2).unwrap().as_str(), "a.b1");
        assert_eq!(lp.last_segment(), "d");
        assert_eq!(lp.repopath().unwrap().as_str(), "a.b1.c1");
    }
}
