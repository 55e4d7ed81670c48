//! Backend selection with a capability probe.
use super::{MatrixSolver, PortableSolver};
use crate::matrix::DenseMatrix;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// The accelerated backend when it is usable, the portable one otherwise.
    #[default]
    Auto,
    Portable,
    Accelerated,
}

/// Creates the solver for the requested kind. The accelerated backend is
/// only used when it was compiled in and passes the probe; otherwise the
/// portable solver is returned and a warning is logged.
pub fn create_solver(kind: SolverKind) -> Arc<dyn MatrixSolver> {
    match kind {
        SolverKind::Portable => Arc::new(PortableSolver),
        SolverKind::Auto | SolverKind::Accelerated => match accelerated() {
            Some(solver) => solver,
            None => {
                if kind == SolverKind::Accelerated {
                    tracing::warn!("accelerated solver not available; falling back to the portable solver");
                } else {
                    tracing::debug!("using the portable solver");
                }
                Arc::new(PortableSolver)
            }
        },
    }
}

#[cfg(feature = "accelerated")]
fn accelerated() -> Option<Arc<dyn MatrixSolver>> {
    let solver: Arc<dyn MatrixSolver> = Arc::new(super::AcceleratedSolver);
    if probe(solver.as_ref()) {
        Some(solver)
    } else {
        tracing::warn!("accelerated solver failed its self test");
        None
    }
}

#[cfg(not(feature = "accelerated"))]
fn accelerated() -> Option<Arc<dyn MatrixSolver>> {
    None
}

/// Solves a small known system and compares with the exact solution.
pub(crate) fn probe(solver: &dyn MatrixSolver) -> bool {
    let a = match DenseMatrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]) {
        Ok(a) => a,
        Err(_) => return false,
    };
    match solver.solve(&a, 0, 1.0) {
        Ok(x) => (x[0] - 0.6).abs() < 1e-12 && (x[1] + 0.2).abs() < 1e-12,
        Err(_) => false,
    }
}
