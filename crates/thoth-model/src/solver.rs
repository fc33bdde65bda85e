use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix carried by solver deployments in the infra namespace.
pub const SOLVER_PREFIX: &str = "solver-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverNameError {
    #[error("solver name {0:?} is not in format solver-<os_name>-<os_version>-py<python_version>")]
    Format(String),
    #[error("solver name {name:?} has python version {version:?}, expected py<major><minor>")]
    PythonVersion { name: String, version: String },
}

/// Environment a solver resolves packages for.
///
/// Decomposed from solver names such as `solver-fedora-31-py38`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverInfo {
    /// Operating system name (e.g. `fedora`, `rhel`).
    pub os_name: String,
    /// Operating system version as found in the name (e.g. `31`, `8`).
    pub os_version: String,
    /// Dotted python version (e.g. `3.8`, `3.10`).
    pub python_version: String,
}

impl SolverInfo {
    pub fn new(
        os_name: impl Into<String>,
        os_version: impl Into<String>,
        python_version: impl Into<String>,
    ) -> Self {
        Self {
            os_name: os_name.into(),
            os_version: os_version.into(),
            python_version: python_version.into(),
        }
    }

    /// Parse a solver name into its environment triple.
    ///
    /// The `solver-` prefix is optional. The OS name may itself contain dashes,
    /// so the name is split from the right.
    pub fn from_solver_name(name: &str) -> Result<Self, SolverNameError> {
        let ident = name.strip_prefix(SOLVER_PREFIX).unwrap_or(name);

        let mut parts = ident.rsplitn(3, '-');
        let (Some(py), Some(os_version), Some(os_name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SolverNameError::Format(name.to_string()));
        };
        if os_name.is_empty() || os_version.is_empty() {
            return Err(SolverNameError::Format(name.to_string()));
        }

        let python_version = parse_python_version(py).ok_or_else(|| {
            SolverNameError::PythonVersion {
                name: name.to_string(),
                version: py.to_string(),
            }
        })?;

        Ok(Self::new(os_name, os_version, python_version))
    }
}

impl FromStr for SolverInfo {
    type Err = SolverNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_solver_name(s)
    }
}

impl fmt::Display for SolverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compact: String = self.python_version.chars().filter(|c| *c != '.').collect();
        write!(
            f,
            "{SOLVER_PREFIX}{}-{}-py{compact}",
            self.os_name, self.os_version
        )
    }
}

// `py38` -> `3.8`, `py310` -> `3.10`.
fn parse_python_version(raw: &str) -> Option<String> {
    let digits = raw.strip_prefix("py")?;
    if digits.len() < 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (major, minor) = digits.split_at(1);
    Some(format!("{major}.{minor}"))
}
