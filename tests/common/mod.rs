//! # Testator Test Fixtures
//!
//! Builds throwaway project trees (`bin/`, `testing/testcases/`, catalogs)
//! inside a temporary directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::create_dir_all(dir.path().join("testing/testcases")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn examples(&self) -> PathBuf {
        self.root().join("testing/testcases")
    }

    pub fn example(&self, name: &str) -> PathBuf {
        self.examples().join(name)
    }

    pub fn write_catalog(&self, name: &str, yaml: &str) {
        fs::write(self.root().join("testing").join(name), yaml).unwrap();
    }

    pub fn write_model(&self, name: &str) {
        fs::write(self.example(name), "(* model *)\n").unwrap();
    }

    pub fn read_log(&self, name: &str) -> String {
        fs::read_to_string(self.root().join("testing").join(name)).unwrap()
    }

    /// Installs an executable shell script as `bin/<name>`.
    #[cfg(unix)]
    pub fn install_engine(&self, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.root().join("bin").join(name);
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    /// Installs a non-executable placeholder, enough for the existence check.
    pub fn install_placeholder(&self, name: &str) {
        fs::write(self.root().join("bin").join(name), "").unwrap();
    }
}

/// An engine that writes `<model-dir>/<model-stem>.res` with a fixed body and exits with `code`.
pub fn result_writing_engine(body: &str, code: i32) -> String {
    format!(
        "#!/bin/sh\n\
         model=\"$1\"\n\
         out=\"${{model%.*}}.res\"\n\
         printf '%s\\n' '{body}' > \"$out\"\n\
         echo \"engine: analysed $model\"\n\
         echo \"engine: warning on stderr\" 1>&2\n\
         exit {code}\n"
    )
}

pub const CHECKSYNTAX_CATALOG: &str = r#"
- purpose: "Test the L/U-nature (L-PTA)"
  input_files: ["testL.imi"]
  options: "-mode checksyntax -output-result"
  expectations:
    - file: "testL.res"
      content: |
        L/U subclass                            : L-PTA
"#;
