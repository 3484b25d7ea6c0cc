//! Progress reporting: every suspension point (file read/write, graph-store
//! RPC, VCS checkout) reports through a monitor callback, mirroring the
//! original's `(op_code, cur, max, message)` signature while adding
//! structured `tracing` spans the way the rest of this stack does.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOp {
    Checkout,
    Walk,
    Parse,
    Write,
    Index,
}

impl BuildOp {
    fn as_str(self) -> &'static str {
        match self {
            BuildOp::Checkout => "checkout",
            BuildOp::Walk => "walk",
            BuildOp::Parse => "parse",
            BuildOp::Write => "write",
            BuildOp::Index => "index",
        }
    }
}

/// A sink for build progress. The default `tracing`-backed implementation is
/// almost always what callers want; a caller driving a UI progress bar can
/// supply its own.
pub trait ProgressMonitor: Send + Sync {
    fn report(&self, op: BuildOp, cur: usize, max: usize, message: &str);

    fn crashed(&self, message: &str) {
        tracing::error!(target = "pfsc.build", message, "build crashed");
    }
}

/// Emits each progress report as a `tracing::debug!` event; the default for
/// callers that don't need anything fancier.
#[derive(Debug, Default)]
pub struct TracingProgressMonitor;

impl ProgressMonitor for TracingProgressMonitor {
    fn report(&self, op: BuildOp, cur: usize, max: usize, message: &str) {
        tracing::debug!(target = "pfsc.build", op = op.as_str(), cur, max, message, "build progress");
    }
}

/// Discards every report; useful in tests that don't care about progress.
#[derive(Debug, Default)]
pub struct NoopProgressMonitor;

impl ProgressMonitor for NoopProgressMonitor {
    fn report(&self, _op: BuildOp, _cur: usize, _max: usize, _message: &str) {}
}
