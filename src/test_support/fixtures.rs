//! Test fixtures for source trees.
//!
//! A [`TreeFixture`] writes a `BUILD.toml` plus header and source files into
//! a temporary directory that lives as long as the fixture.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::{BuildFile, BUILD_FILE_NAME};

/// A temporary source tree with a build description.
#[derive(Debug)]
pub struct TreeFixture {
    dir: TempDir,
}

impl TreeFixture {
    /// Create an empty tree.
    pub fn new() -> Self {
        TreeFixture {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Write a file relative to the tree root, creating parent directories.
    pub fn file(self, path: impl AsRef<Path>, content: &str) -> Self {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dirs");
        }
        std::fs::write(&full, content).expect("failed to write fixture file");
        self
    }

    /// Write the build description.
    pub fn build_file(self, content: &str) -> Self {
        self.file(BUILD_FILE_NAME, content)
    }

    /// Path of the build description.
    pub fn build_file_path(&self) -> PathBuf {
        self.dir.path().join(BUILD_FILE_NAME)
    }

    /// Parse the build description as it currently is on disk.
    pub fn load(&self) -> BuildFile {
        BuildFile::load(&self.build_file_path()).expect("fixture BUILD.toml should parse")
    }

    /// Single-provider tree: `foo` includes `bar/bar.h` and `<string>`.
    pub fn single_provider() -> Self {
        TreeFixture::new()
            .build_file(
                r#"
[[library]]
name = "bar"
hdrs = ["bar/bar.h"]

[[library]]
name = "foo"
hdrs = ["foo.h"]
"#,
            )
            .file("bar/bar.h", "#pragma once\nint bar();\n")
            .file("foo.h", "#include \"bar/bar.h\"\n#include <string>\n")
    }

    /// Ambiguous-provider tree: `iface.h` is declared by `impl_a` and
    /// `impl_b`, and `consumer` already depends on `impl_b`.
    pub fn ambiguous_provider() -> Self {
        TreeFixture::new()
            .build_file(
                r#"
[[library]]
name = "impl_a"
hdrs = ["iface.h"]
srcs = ["impl_a.cc"]

[[library]]
name = "impl_b"
hdrs = ["iface.h"]
srcs = ["impl_b.cc"]

[[library]]
name = "consumer"
srcs = ["consumer.cc"]
deps = ["impl_b"]
"#,
            )
            .file("iface.h", "#pragma once\nvoid run();\n")
            .file("impl_a.cc", "#include \"iface.h\"\n")
            .file("impl_b.cc", "#include \"iface.h\"\n")
            .file("consumer.cc", "#include \"iface.h\"\n")
    }
}

impl Default for TreeFixture {
    fn default() -> Self {
        Self::new()
    }
}
