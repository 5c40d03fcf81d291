//! Environment check declarations (`conf/checks.toml`).
//!
//! Each top-level table is one check, keyed by its id:
//!
//! ```toml
//! [pthread_header]
//! kind = "header"
//! header = "pthread.h"
//! define = "HAVE_PTHREAD_H"
//! ```
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::toml_loader::load_config;
use crate::error::ManifestError;
use crate::platform::{Arch, Os};

/// Id of the implicit C compiler check.
pub const CC_CHECK: &str = "cc";
/// Id of the implicit C++ compiler check.
pub const CXX_CHECK: &str = "cxx";

/// Source language of a compile test or compiler check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lang {
    /// C.
    #[default]
    #[serde(rename = "c")]
    C,
    /// C++.
    #[serde(rename = "c++", alias = "cxx", alias = "cpp")]
    Cxx,
}

impl Lang {
    /// File extension for probe sources.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cxx => "cpp",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::C => write!(f, "C"),
            Self::Cxx => write!(f, "C++"),
        }
    }
}

/// What a check inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CheckKind {
    /// A detected compiler for `lang`.
    Compiler {
        /// Language of the compiler.
        lang: Lang,
    },
    /// A header under the include search paths.
    Header {
        /// Header path relative to an include directory.
        header: String,
    },
    /// A library under the library search paths.
    Library {
        /// Library name without prefix or extension.
        library: String,
    },
    /// An executable on the tool search paths or `PATH`.
    Program {
        /// Program name.
        program: String,
    },
    /// A pkg-config package.
    PkgConfig {
        /// Package name.
        package: String,
        /// Minimum acceptable version.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_version: Option<String>,
    },
    /// A snippet that must compile (and optionally link).
    Compile {
        /// Snippet language.
        #[serde(default)]
        lang: Lang,
        /// Source code.
        code: String,
        /// Extra compiler flags.
        #[serde(default)]
        flags: Vec<String>,
        /// Whether to link an executable rather than compile an object.
        #[serde(default)]
        link: bool,
    },
    /// A target-platform predicate; empty lists match anything.
    Platform {
        /// Accepted operating systems.
        #[serde(default)]
        os: Vec<Os>,
        /// Accepted architectures.
        #[serde(default)]
        arch: Vec<Arch>,
    },
    /// A file or directory, relative to the project root unless absolute.
    File {
        /// Path to test.
        path: PathBuf,
    },
    /// An environment variable that must be set and non-empty.
    Env {
        /// Variable name.
        var: String,
    },
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compiler { lang } => write!(f, "{lang} compiler"),
            Self::Header { header } => write!(f, "header <{header}>"),
            Self::Library { library } => write!(f, "library {library}"),
            Self::Program { program } => write!(f, "program {program}"),
            Self::PkgConfig {
                package,
                min_version: Some(v),
            } => write!(f, "package {package} >= {v}"),
            Self::PkgConfig { package, .. } => write!(f, "package {package}"),
            Self::Compile { lang, link, .. } => {
                write!(f, "{lang} {} test", if *link { "link" } else { "compile" })
            }
            Self::Platform { os, arch } => write!(f, "platform {os:?} {arch:?}"),
            Self::File { path } => write!(f, "file {}", path.display()),
            Self::Env { var } => write!(f, "environment variable {var}"),
        }
    }
}

/// One declared environment check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    /// Check id (the table key in `checks.toml`).
    #[serde(skip_deserializing)]
    pub id: String,
    /// A failing hard check blocks explicit enables of dependent features.
    #[serde(default)]
    pub hard: bool,
    /// Preprocessor symbol defined (as `SYMBOL=1`) when the check passes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub define: Option<String>,
    /// What to inspect.
    #[serde(flatten)]
    pub kind: CheckKind,
}

impl CheckSpec {
    /// Build a check programmatically.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: CheckKind) -> Self {
        Self {
            id: id.into(),
            hard: false,
            define: None,
            kind,
        }
    }

    /// Mark the check as hard.
    #[must_use]
    pub const fn hard(mut self) -> Self {
        self.hard = true;
        self
    }

    /// Set the define symbol.
    #[must_use]
    pub fn with_define(mut self, define: impl Into<String>) -> Self {
        self.define = Some(define.into());
        self
    }
}

/// The implicit compiler checks every manifest has.
#[must_use]
pub fn implicit_checks() -> Vec<CheckSpec> {
    vec![
        CheckSpec::new(CC_CHECK, CheckKind::Compiler { lang: Lang::C }).hard(),
        CheckSpec::new(CXX_CHECK, CheckKind::Compiler { lang: Lang::Cxx }).hard(),
    ]
}

/// Load checks from `path`, sorted by id, with the implicit compiler checks
/// added unless the file declares its own `cc`/`cxx`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<CheckSpec>, ManifestError> {
    let table: BTreeMap<String, CheckSpec> = load_config(path)?;
    Ok(with_implicit(table))
}

pub(super) fn with_implicit(mut table: BTreeMap<String, CheckSpec>) -> Vec<CheckSpec> {
    for check in implicit_checks() {
        table.entry(check.id.clone()).or_insert(check);
    }
    table
        .into_iter()
        .map(|(id, mut check)| {
            check.id = id;
            check
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::toml_loader::parse_config;

    fn parse(content: &str) -> Vec<CheckSpec> {
        let table: BTreeMap<String, CheckSpec> =
            parse_config(Path::new("checks.toml"), content).unwrap();
        with_implicit(table)
    }

    #[test]
    fn empty_file_has_compiler_checks() {
        let checks = parse("");
        let ids: Vec<_> = checks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["cc", "cxx"]);
        assert!(checks.iter().all(|c| c.hard));
    }

    #[test]
    fn parses_header_check() {
        let checks = parse(
            "[pthread_header]\nkind = \"header\"\nheader = \"pthread.h\"\ndefine = \"HAVE_PTHREAD_H\"\n",
        );
        let check = checks.iter().find(|c| c.id == "pthread_header").unwrap();
        assert_eq!(
            check.kind,
            CheckKind::Header {
                header: "pthread.h".to_string()
            }
        );
        assert_eq!(check.define.as_deref(), Some("HAVE_PTHREAD_H"));
        assert!(!check.hard);
    }

    #[test]
    fn parses_pkg_config_and_compile() {
        let checks = parse(concat!(
            "[libxml2]\nkind = \"pkg-config\"\npackage = \"libxml-2.0\"\nmin_version = \"2.9\"\n",
            "[int128]\nkind = \"compile\"\nlang = \"c++\"\ncode = \"__int128 x;\"\n",
        ));
        let xml = checks.iter().find(|c| c.id == "libxml2").unwrap();
        assert!(matches!(
            &xml.kind,
            CheckKind::PkgConfig { min_version: Some(v), .. } if v == "2.9"
        ));
        let int128 = checks.iter().find(|c| c.id == "int128").unwrap();
        assert!(matches!(
            int128.kind,
            CheckKind::Compile {
                lang: Lang::Cxx,
                link: false,
                ..
            }
        ));
    }

    #[test]
    fn parses_platform_check() {
        let checks = parse("[linux_only]\nkind = \"platform\"\nos = [\"linux\"]\n");
        let check = checks.iter().find(|c| c.id == "linux_only").unwrap();
        assert_eq!(
            check.kind,
            CheckKind::Platform {
                os: vec![Os::Linux],
                arch: vec![]
            }
        );
    }

    #[test]
    fn declared_cxx_replaces_implicit() {
        let checks = parse("[cxx]\nkind = \"compiler\"\nlang = \"c++\"\nhard = false\n");
        let cxx = checks.iter().find(|c| c.id == "cxx").unwrap();
        assert!(!cxx.hard);
    }

    #[test]
    fn unknown_kind_is_parse_error() {
        let result: Result<BTreeMap<String, CheckSpec>, _> =
            parse_config(Path::new("checks.toml"), "[x]\nkind = \"telepathy\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn display_describes_check() {
        let kind = CheckKind::Library {
            library: "gsl".to_string(),
        };
        assert_eq!(kind.to_string(), "library gsl");
    }
}
