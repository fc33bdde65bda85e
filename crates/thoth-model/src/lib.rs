mod solver;
pub use solver::{SOLVER_PREFIX, SolverInfo, SolverNameError};
