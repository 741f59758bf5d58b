//! A loaded Modelica library
//!
//! A library is a named root directory plus the documents found under it.
//! Its name is the basename of the root, and that name is the first
//! component of every contained document's package path.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::base::{DocumentId, LibraryId};
use crate::base::constants::{MODELICA_EXT, PACKAGE_FILE};

#[derive(Debug)]
pub struct Library {
    id: LibraryId,
    name: String,
    root: PathBuf,
    is_workspace: bool,
    documents: IndexMap<PathBuf, DocumentId>,
}

impl Library {
    pub(crate) fn new(id: LibraryId, name: String, root: PathBuf, is_workspace: bool) -> Self {
        Self {
            id,
            name,
            root,
            is_workspace,
            documents: IndexMap::new(),
        }
    }

    pub fn id(&self) -> LibraryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether this library is a user workspace (metadata only; resolution
    /// does not distinguish workspaces from installed libraries).
    pub fn is_workspace(&self) -> bool {
        self.is_workspace
    }

    /// Whether `path` lies under this library's root.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    pub fn document_id(&self, path: &Path) -> Option<DocumentId> {
        self.documents.get(path).copied()
    }

    pub fn document_ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.documents.values().copied()
    }

    pub fn document_paths(&self) -> impl Iterator<Item = &Path> {
        self.documents.keys().map(|p| p.as_path())
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn insert_document(&mut self, path: PathBuf, id: DocumentId) {
        self.documents.insert(path, id);
    }

    pub(crate) fn remove_document(&mut self, path: &Path) -> Option<DocumentId> {
        self.documents.shift_remove(path)
    }

    /// The package path implied by a file's location under this library:
    /// `<root>/A/B/C.mo` → `[name, A, B, C]`; a `package.mo` drops its own
    /// file name, so `<root>/A/B/package.mo` → `[name, A, B]`.
    pub fn package_path_for(&self, path: &Path) -> Option<Vec<String>> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut package_path = vec![self.name.clone()];
        let components: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        let (file_name, directories) = components.split_last()?;
        for dir in directories {
            package_path.push((*dir).to_string());
        }
        if *file_name != PACKAGE_FILE {
            let stem = file_name
                .strip_suffix(&format!(".{MODELICA_EXT}"))
                .unwrap_or(file_name);
            package_path.push(stem.to_string());
        }
        Some(package_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(root: &str) -> Library {
        Library::new(
            LibraryId::new(0),
            "TestLibrary".to_string(),
            PathBuf::from(root),
            false,
        )
    }

    #[test]
    fn test_package_path_plain_file() {
        let lib = library("/lib/TestLibrary");
        assert_eq!(
            lib.package_path_for(Path::new("/lib/TestLibrary/A/B/C.mo")),
            Some(vec![
                "TestLibrary".to_string(),
                "A".to_string(),
                "B".to_string(),
                "C".to_string()
            ])
        );
    }

    #[test]
    fn test_package_path_package_file() {
        let lib = library("/lib/TestLibrary");
        assert_eq!(
            lib.package_path_for(Path::new("/lib/TestLibrary/A/B/package.mo")),
            Some(vec![
                "TestLibrary".to_string(),
                "A".to_string(),
                "B".to_string()
            ])
        );
    }

    #[test]
    fn test_package_path_root_package() {
        let lib = library("/lib/TestLibrary");
        assert_eq!(
            lib.package_path_for(Path::new("/lib/TestLibrary/package.mo")),
            Some(vec!["TestLibrary".to_string()])
        );
    }

    #[test]
    fn test_package_path_outside_root() {
        let lib = library("/lib/TestLibrary");
        assert_eq!(lib.package_path_for(Path::new("/other/C.mo")), None);
    }
}
