//! Shared fixtures for integration tests: an on-disk Modelica library in a
//! temp directory, loaded into a fresh project.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use mols::base::Position;
use mols::Project;

pub const PACKAGE_MO: &str = "package TestLibrary\nend TestLibrary;\n";

pub const CONSTANTS_MO: &str = "\
within TestLibrary;
package Constants
  constant Real e  = 2.71828;
  constant Real pi = 3.14159;
end Constants;
";

pub const TEST_CLASS_MO: &str = "\
within TestLibrary.TestPackage;
import TestLibrary.Constants.pi;
function TestClass
  input Real twoE  = 2 * Constants.e;
  input Real tau    = 2 * pi;
  input Real notTau = tau / twoE;
end TestClass;
";

pub const WILDCARD_USER_MO: &str = "\
within TestLibrary;
function WildcardUser
  import TestLibrary.Constants.*;
  input Real x = 2 * pi;
end WildcardUser;
";

pub const ALIAS_USER_MO: &str = "\
within TestLibrary;
function AliasUser
  import C = TestLibrary.Constants;
  input Real x = C.e;
end AliasUser;
";

pub const MULTI_USER_MO: &str = "\
within TestLibrary;
function MultiUser
  import TestLibrary.Constants.{e, pi};
  input Real x = e * pi;
end MultiUser;
";

pub const SHADOW_USER_MO: &str = "\
within TestLibrary;
function ShadowUser
  import TestLibrary.Constants.pi;
  constant Real pi = 3;
  input Real x = 2 * pi;
end ShadowUser;
";

pub const INHERITANCE_MO: &str = "\
within TestLibrary;
package Inheritance
  model Base
    Real shared;
  end Base;
  model Child
    extends Base;
  equation
    shared = 1;
  end Child;
end Inheritance;
";

pub const RECORDS_MO: &str = "\
within TestLibrary;
package Records
  record Point
    Real x;
    Real y;
  end Point;
  model Use
    Point p;
  equation
    p.x = 1;
  end Use;
end Records;
";

/// A project with the TestLibrary fixture loaded from a temp directory.
pub struct Fixture {
    /// Keeps the directory alive for the test's duration.
    pub dir: TempDir,
    pub project: Project,
    pub root: PathBuf,
}

impl Fixture {
    /// Absolute path of a file relative to the library root.
    pub fn file(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Build the library layout from the specification's seed fixture, plus a
/// few files exercising imports, inheritance, and type traversal.
pub fn test_library() -> Fixture {
    let dir = TempDir::new().expect("create temp dir");
    let root = dir.path().join("TestLibrary");
    let files = [
        ("package.mo", PACKAGE_MO),
        ("Constants.mo", CONSTANTS_MO),
        ("TestPackage/TestClass.mo", TEST_CLASS_MO),
        ("WildcardUser.mo", WILDCARD_USER_MO),
        ("AliasUser.mo", ALIAS_USER_MO),
        ("MultiUser.mo", MULTI_USER_MO),
        ("ShadowUser.mo", SHADOW_USER_MO),
        ("Inheritance.mo", INHERITANCE_MO),
        ("Records.mo", RECORDS_MO),
    ];
    for (relative, content) in files {
        write_file(&root.join(relative), content);
    }

    let mut project = Project::new();
    project
        .load_library(&root, false)
        .expect("load test library");
    Fixture { dir, project, root }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directories");
    }
    fs::write(path, content).expect("write fixture file");
}

/// Position of the first occurrence of `needle`, plus `delta` columns.
pub fn position_in(text: &str, needle: &str, delta: usize) -> Position {
    let offset = text
        .find(needle)
        .unwrap_or_else(|| panic!("fixture should contain {needle:?}"));
    let line = text[..offset].matches('\n').count();
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    Position::new(line, offset - line_start + delta)
}

/// Convenience: a symbol path from string literals.
pub fn path(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
