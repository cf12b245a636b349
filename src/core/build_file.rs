//! BUILD.toml parsing.
//!
//! The build description is a flat list of `[[library]]` tables. It is read
//! as plain data; nothing in it is evaluated.
//!
//! ```toml
//! [[library]]
//! name = "foo"
//! public_hdrs = ["include/foo/foo.h"]
//! srcs = ["src/foo/*.cc"]
//! deps = ["bar"]
//! external_deps = ["absl/strings"]
//! tags = ["avoid_dep"]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use thiserror::Error;

use crate::core::target::Target;
use crate::util::diagnostic::Diagnostic;
use crate::util::fs;

/// Canonical build description file name.
pub const BUILD_FILE_NAME: &str = "BUILD.toml";

/// Error loading a build description.
#[derive(Debug, Error)]
pub enum BuildFileError {
    #[error("no BUILD.toml found in {} or any parent directory", .dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(Box<BuildFileSyntaxError>),

    #[error("library `{name}` is declared more than once")]
    DuplicateTarget { name: String },

    #[error("invalid file pattern `{pattern}` in library `{target}`")]
    BadPattern { target: String, pattern: String },
}

impl BuildFileError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            BuildFileError::NotFound { .. } => diag.with_suggestion(format!(
                "Run from a directory containing {}, or pass --build-file",
                BUILD_FILE_NAME
            )),
            BuildFileError::Read { path, source } => {
                diag.with_location(path).with_context(source.to_string())
            }
            BuildFileError::Parse(err) => diag.with_location(&err.path),
            BuildFileError::DuplicateTarget { name } => {
                diag.with_suggestion(format!("Rename or merge the `{}` entries", name))
            }
            BuildFileError::BadPattern { .. } => {
                diag.with_suggestion("Check the glob syntax of the file list")
            }
        }
    }
}

/// A build file that is not valid TOML or does not match the schema.
///
/// Rendered by miette with the offending span of the file when the parser
/// reported one.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("failed to parse {}: {message}", .path.display())]
#[diagnostic(
    code(autodeps::build_file::parse),
    help("Each [[library]] needs a `name`; file and dependency fields are lists of strings")
)]
pub struct BuildFileSyntaxError {
    pub path: PathBuf,
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl BuildFileSyntaxError {
    fn new(path: &Path, contents: &str, err: &toml::de::Error) -> Self {
        BuildFileSyntaxError {
            path: path.to_path_buf(),
            message: err.message().to_string(),
            src: NamedSource::new(fs::display_path(path), contents.to_string()),
            span: err.span().map(SourceSpan::from),
        }
    }
}

/// Raw `[[library]]` entry as it appears on disk.
#[derive(Debug, Deserialize)]
struct RawLibrary {
    name: String,
    #[serde(default)]
    hdrs: Vec<String>,
    #[serde(default)]
    public_hdrs: Vec<String>,
    #[serde(default)]
    srcs: Vec<String>,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default)]
    external_deps: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    select_deps: Option<toml::Value>,
}

#[derive(Debug, Deserialize)]
struct RawBuildFile {
    #[serde(default)]
    library: Vec<RawLibrary>,
}

/// A loaded build description.
#[derive(Debug, Clone)]
pub struct BuildFile {
    path: PathBuf,
    root: PathBuf,
    targets: BTreeMap<String, Target>,
}

impl BuildFile {
    /// Load and parse a build file from disk.
    pub fn load(path: &Path) -> Result<Self, BuildFileError> {
        let contents = std::fs::read_to_string(path).map_err(|source| BuildFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse(&contents, path, &root)
    }

    /// Parse build file contents. File patterns are expanded against `root`.
    pub fn parse(contents: &str, path: &Path, root: &Path) -> Result<Self, BuildFileError> {
        let raw: RawBuildFile = toml::from_str(contents).map_err(|e| {
            BuildFileError::Parse(Box::new(BuildFileSyntaxError::new(path, contents, &e)))
        })?;

        let mut targets = BTreeMap::new();
        for lib in raw.library {
            if targets.contains_key(&lib.name) {
                return Err(BuildFileError::DuplicateTarget { name: lib.name });
            }

            let expand = |patterns: &[String]| {
                fs::expand_patterns(root, patterns).map_err(|pattern| BuildFileError::BadPattern {
                    target: lib.name.clone(),
                    pattern,
                })
            };

            let target = Target {
                name: lib.name.clone(),
                public_hdrs: expand(&lib.public_hdrs)?,
                hdrs: expand(&lib.hdrs)?,
                srcs: expand(&lib.srcs)?,
                deps: lib.deps.into_iter().collect(),
                external_deps: lib.external_deps.into_iter().collect(),
                tags: lib.tags.into_iter().collect::<BTreeSet<_>>(),
                has_select_deps: lib.select_deps.is_some(),
            };
            targets.insert(lib.name, target);
        }

        tracing::debug!("loaded {} libraries from {}", targets.len(), path.display());

        Ok(BuildFile {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
            targets,
        })
    }

    /// Path of the build file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory all file lists are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Targets in lexicographic order of name.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    /// Look up a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the build file declares no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Find the build file starting from `start` and searching upward.
pub fn find_build_file(start: &Path) -> Result<PathBuf, BuildFileError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(BUILD_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(BuildFileError::NotFound {
                dir: start.to_path_buf(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::diagnostic::render_report;
    use tempfile::TempDir;

    fn parse(contents: &str) -> Result<BuildFile, BuildFileError> {
        BuildFile::parse(contents, Path::new("BUILD.toml"), Path::new("."))
    }

    #[test]
    fn test_parse_libraries() {
        let build = parse(
            r#"
[[library]]
name = "foo"
public_hdrs = ["include/foo.h"]
hdrs = ["src/foo_impl.h"]
srcs = ["src/foo.cc"]
deps = ["bar", "baz", "bar"]
external_deps = ["absl/strings"]
tags = ["avoid_dep"]

[[library]]
name = "bar"
"#,
        )
        .unwrap();

        assert_eq!(build.len(), 2);
        let names: Vec<_> = build.targets().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["bar", "foo"]);

        let foo = build.target("foo").unwrap();
        assert_eq!(foo.public_hdrs, vec!["include/foo.h"]);
        assert_eq!(foo.deps.len(), 2);
        assert!(foo.external_deps.contains("absl/strings"));
        assert!(foo.has_tag("avoid_dep"));
        assert!(!foo.has_select_deps);
    }

    #[test]
    fn test_select_deps_marks_target() {
        let build = parse(
            r#"
[[library]]
name = "foo"
select_deps = { "//conditions:default" = ["bar"] }
"#,
        )
        .unwrap();

        assert!(build.target("foo").unwrap().has_select_deps);
    }

    #[test]
    fn test_duplicate_library_rejected() {
        let err = parse(
            r#"
[[library]]
name = "foo"

[[library]]
name = "foo"
"#,
        )
        .unwrap_err();

        assert!(matches!(err, BuildFileError::DuplicateTarget { name } if name == "foo"));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let err = parse("[[library]]\nhdrs = 3\n").unwrap_err();
        assert!(matches!(err, BuildFileError::Parse(_)));
        assert!(err.to_diagnostic().format(false).contains("BUILD.toml"));
    }

    #[test]
    fn test_parse_error_points_at_source() {
        let contents = "[[library]]\nname = \"foo\"\nsrcs = \"foo.cc\"\n";
        let err = match parse(contents) {
            Err(BuildFileError::Parse(err)) => err,
            other => panic!("expected a parse error, got {:?}", other),
        };
        assert!(err.span.is_some());

        let rendered = render_report(&*err, false);
        assert!(rendered.contains("failed to parse"));
        assert!(rendered.contains("srcs = \"foo.cc\""));
        assert!(rendered.contains("autodeps::build_file::parse"));
    }

    #[test]
    fn test_glob_patterns_expand_against_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        std::fs::write(tmp.path().join("src/b.cc"), "").unwrap();
        std::fs::write(tmp.path().join("src/a.cc"), "").unwrap();

        let build = BuildFile::parse(
            "[[library]]\nname = \"foo\"\nsrcs = [\"src/*.cc\", \"src/literal.cc\"]\n",
            &tmp.path().join(BUILD_FILE_NAME),
            tmp.path(),
        )
        .unwrap();

        assert_eq!(
            build.target("foo").unwrap().srcs,
            vec!["src/a.cc", "src/b.cc", "src/literal.cc"]
        );
    }

    #[test]
    fn test_find_build_file_walks_up() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(BUILD_FILE_NAME), "").unwrap();

        let found = find_build_file(&nested).unwrap();
        assert_eq!(found, tmp.path().join(BUILD_FILE_NAME));
    }
}
