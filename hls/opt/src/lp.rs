//! Glue between the passes and the integer programming solver.
use good_lp::{ResolutionError, Solution, Variable};
use hls_utils::Error;

/// Turn a failed solve of `model` into a [Error::Solver].
pub(crate) fn solver_error(model: &str, err: ResolutionError) -> Error {
    let reason = match err {
        ResolutionError::Infeasible => "model is infeasible".to_string(),
        ResolutionError::Unbounded => "model is unbounded".to_string(),
        other => other.to_string(),
    };
    Error::solver(format!("{model}: {reason}"))
}

/// Value of an integer variable, rounded to absorb solver tolerance.
pub(crate) fn int_value<S: Solution>(sol: &S, var: Variable) -> i64 {
    sol.value(var).round() as i64
}
