use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PREFIX: &str = "Fmt";

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub acme: AcmeSettings,
    #[serde(default)]
    pub tempfile: TempSettings,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AcmeSettings {
    /// Where acme's file tree is mounted.
    pub mount: Option<PathBuf>,
}

/// Where the formatter's output is staged.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TempSettings {
    /// Directory for the staging file; the OS temp dir when unset.
    pub dir: Option<PathBuf>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for TempSettings {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: default_prefix(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if let Some(mount) = &self.acme.mount {
            if mount.as_os_str().is_empty() {
                issues.push(ValidationIssue::Empty {
                    field: "acme.mount",
                });
            }
        }
        if let Some(dir) = &self.tempfile.dir {
            if dir.as_os_str().is_empty() {
                issues.push(ValidationIssue::Empty {
                    field: "tempfile.dir",
                });
            }
        }

        let prefix = &self.tempfile.prefix;
        if prefix.is_empty() {
            issues.push(ValidationIssue::Empty {
                field: "tempfile.prefix",
            });
        } else if prefix.contains(std::path::is_separator) {
            issues.push(ValidationIssue::Invalid {
                field: "tempfile.prefix",
                message: format!("{prefix:?} contains a path separator"),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    Empty { field: &'static str },
    Invalid { field: &'static str, message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Empty { field } => write!(f, "{field} must not be empty"),
            ValidationIssue::Invalid { field, message } => write!(f, "{field}: {message}"),
        }
    }
}

impl std::error::Error for ValidationError {}
