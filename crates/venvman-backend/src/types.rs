use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DRIVER_KIND: &str = "driver";
pub const DRIVER_NAMESPACE: &str = "venv_management.driver";
pub const DRIVER_VERSION: &str = "1.0.0";

/// Fixed identity of a driver, independent of how it was constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DriverIdentity {
    pub kind: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

impl DriverIdentity {
    #[must_use]
    pub const fn driver(name: &'static str) -> Self {
        Self {
            kind: DRIVER_KIND,
            name,
            version: DRIVER_VERSION,
        }
    }
}

impl fmt::Display for DriverIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.name, self.version)
    }
}

/// Whether, and which version of, a bootstrap package is seeded into a new
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageDirective {
    #[default]
    Latest,
    DoNotInstall,
    Bundled,
    Exact(String),
}

impl PackageDirective {
    /// The `virtualenv` style seed flag for `package`, or `None` when the tool
    /// default already matches the directive.
    #[must_use]
    pub fn seed_flag(&self, package: &str) -> Option<String> {
        match self {
            Self::Latest => None,
            Self::DoNotInstall => Some(format!("--no-{package}")),
            Self::Bundled => Some(format!("--{package}=bundle")),
            Self::Exact(version) => Some(format!("--{package}={version}")),
        }
    }

    /// A `pip`/`conda` requirement pinning `package`, for exact directives only.
    #[must_use]
    pub fn pinned_requirement(&self, package: &str, separator: &str) -> Option<String> {
        match self {
            Self::Exact(version) => Some(format!("{package}{separator}{version}")),
            _ => None,
        }
    }
}

impl fmt::Display for PackageDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::DoNotInstall => f.write_str("none"),
            Self::Bundled => f.write_str("bundled"),
            Self::Exact(version) => f.write_str(version),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Empty package directive")]
pub struct PackageDirectiveParseError;

impl FromStr for PackageDirective {
    type Err = PackageDirectiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" => Err(PackageDirectiveParseError),
            "latest" | "true" | "yes" => Ok(Self::Latest),
            "none" | "false" | "no" => Ok(Self::DoNotInstall),
            "bundled" | "bundle" | "embed" => Ok(Self::Bundled),
            _ => Ok(Self::Exact(s.to_string())),
        }
    }
}

/// Options forwarded to a driver when creating an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOptions {
    /// Interpreter selector: an executable name such as `python3.11`, a full
    /// path, or a bare version for tools that accept one.
    pub python: Option<String>,
    pub project_path: Option<PathBuf>,
    pub packages: Vec<String>,
    pub requirements_file: Option<PathBuf>,
    pub system_site_packages: bool,
    pub pip: PackageDirective,
    pub setuptools: PackageDirective,
    pub wheel: PackageDirective,
}

impl CreateOptions {
    #[must_use]
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = Some(python.into());
        self
    }

    /// Bootstrap directives paired with their package names.
    #[must_use]
    pub fn bootstrap(&self) -> [(&'static str, &PackageDirective); 3] {
        [
            ("pip", &self.pip),
            ("setuptools", &self.setuptools),
            ("wheel", &self.wheel),
        ]
    }
}
