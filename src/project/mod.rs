//! Project model — loaded libraries and their documents.
//!
//! The project owns the parser (a single-owner resource) and a document
//! arena; libraries reference documents by id, and documents carry ids back
//! to their library, so there are no ownership cycles.

pub mod document;
pub mod error;
pub mod library;

pub use document::Document;
pub use error::ProjectError;
pub use library::Library;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::base::constants::MODELICA_EXT;
use crate::base::{DocumentId, LibraryId, Span};
use crate::syntax::Parser;

/// Result of [`Project::add_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(DocumentId),
    /// The document was already present; adding again is a no-op.
    AlreadyPresent(DocumentId),
}

impl AddOutcome {
    pub fn id(self) -> DocumentId {
        match self {
            AddOutcome::Added(id) | AddOutcome::AlreadyPresent(id) => id,
        }
    }
}

#[derive(Debug, Default)]
pub struct Project {
    parser: Parser,
    libraries: Vec<Library>,
    documents: Vec<Option<Document>>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Libraries
    // ------------------------------------------------------------------

    /// Load a library by walking `root` for `.mo` files, parsing each one.
    /// Library names must be unique within the project.
    pub fn load_library(
        &mut self,
        root: &Path,
        is_workspace: bool,
    ) -> Result<LibraryId, ProjectError> {
        if !root.is_dir() {
            return Err(ProjectError::InvalidLibraryRoot(root.to_path_buf()));
        }
        let name = library_name_of(root)
            .ok_or_else(|| ProjectError::InvalidLibraryRoot(root.to_path_buf()))?;
        if self.library_by_name(&name).is_some() {
            return Err(ProjectError::DuplicateLibrary(name));
        }

        let id = LibraryId::new(self.libraries.len() as u32);
        self.libraries
            .push(Library::new(id, name.clone(), root.to_path_buf(), is_workspace));

        let mut loaded = 0usize;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                match e.into_io_error() {
                    Some(io) => ProjectError::io(path, io),
                    None => ProjectError::InvalidLibraryRoot(root.to_path_buf()),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MODELICA_EXT) {
                continue;
            }
            match self.load_document(id, path.to_path_buf()) {
                Ok(_) => loaded += 1,
                Err(err) => {
                    // One unreadable file should not sink the library.
                    warn!(path = %path.display(), error = %err, "skipping unreadable file");
                }
            }
        }
        info!(library = %name, documents = loaded, "loaded library");
        Ok(id)
    }

    pub fn library(&self, id: LibraryId) -> Option<&Library> {
        self.libraries.get(id.raw() as usize)
    }

    pub fn library_by_name(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|lib| lib.name() == name)
    }

    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.iter()
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Add a document from disk. The owning library is the one whose root
    /// is an ancestor of `path` (the longest match when roots nest). A file
    /// under no known root becomes a standalone single-file library, but
    /// only if its `within` clause is empty — otherwise it belongs to some
    /// library we have not loaded, and the add fails.
    pub fn add_document(&mut self, path: &Path) -> Result<AddOutcome, ProjectError> {
        if let Some(id) = self.document_id(path) {
            return Ok(AddOutcome::AlreadyPresent(id));
        }

        let owner = self
            .libraries
            .iter()
            .filter(|lib| lib.contains(path))
            .max_by_key(|lib| lib.root().components().count())
            .map(|lib| lib.id());

        if let Some(library) = owner {
            let id = self.load_document(library, path.to_path_buf())?;
            return Ok(AddOutcome::Added(id));
        }

        // No matching library: consider the containing directory a
        // standalone library, for files that claim no enclosing package.
        let text = read_file(path)?;
        let parse = self.parser.parse(&text, None);
        let has_within = parse
            .tree
            .root()
            .children()
            .filter(|c| c.kind() == crate::syntax::SyntaxKind::WithinClause)
            .any(|c| c.child_by_field(crate::syntax::Field::Name).is_some());
        if has_within {
            return Err(ProjectError::NoMatchingLibrary(path.to_path_buf()));
        }
        let root = path
            .parent()
            .ok_or_else(|| ProjectError::NoMatchingLibrary(path.to_path_buf()))?;
        let name = library_name_of(root)
            .ok_or_else(|| ProjectError::NoMatchingLibrary(path.to_path_buf()))?;
        if self.library_by_name(&name).is_some() {
            return Err(ProjectError::DuplicateLibrary(name));
        }
        debug!(path = %path.display(), library = %name, "standalone document library");
        let library = LibraryId::new(self.libraries.len() as u32);
        self.libraries
            .push(Library::new(library, name, root.to_path_buf(), true));
        let id = self.insert_document(library, path.to_path_buf(), &text);
        Ok(AddOutcome::Added(id))
    }

    /// Look up a document without loading.
    pub fn get_document(&self, path: &Path) -> Option<&Document> {
        self.document_id(path).and_then(|id| self.document(id))
    }

    /// Look up a document, attempting a lazy [`Self::add_document`] on miss.
    /// A file that belongs to no known library yields `Ok(None)`; I/O
    /// failures are reported.
    pub fn get_or_load_document(
        &mut self,
        path: &Path,
    ) -> Result<Option<DocumentId>, ProjectError> {
        if let Some(id) = self.document_id(path) {
            return Ok(Some(id));
        }
        match self.add_document(path) {
            Ok(outcome) => Ok(Some(outcome.id())),
            Err(ProjectError::NoMatchingLibrary(_)) | Err(ProjectError::DuplicateLibrary(_)) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Update a document in place; `None` range replaces the whole text.
    /// Returns false if the document is not loaded.
    pub fn update_document(&mut self, path: &Path, text: &str, range: Option<Span>) -> bool {
        let Some(id) = self.document_id(path) else {
            return false;
        };
        let Self {
            parser, documents, ..
        } = self;
        match documents
            .get_mut(id.raw() as usize)
            .and_then(|slot| slot.as_mut())
        {
            Some(document) => {
                document.update(parser, text, range);
                true
            }
            None => false,
        }
    }

    /// Remove a document from its library. Returns whether anything was
    /// removed.
    pub fn remove_document(&mut self, path: &Path) -> bool {
        let Some(id) = self.document_id(path) else {
            return false;
        };
        for library in &mut self.libraries {
            library.remove_document(path);
        }
        if let Some(slot) = self.documents.get_mut(id.raw() as usize) {
            *slot = None;
        }
        true
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.raw() as usize).and_then(|d| d.as_ref())
    }

    pub fn document_id(&self, path: &Path) -> Option<DocumentId> {
        self.libraries.iter().find_map(|lib| lib.document_id(path))
    }

    pub fn document_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_some()).count()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn load_document(
        &mut self,
        library: LibraryId,
        path: PathBuf,
    ) -> Result<DocumentId, ProjectError> {
        let text = read_file(&path)?;
        Ok(self.insert_document(library, path, &text))
    }

    fn insert_document(&mut self, library: LibraryId, path: PathBuf, text: &str) -> DocumentId {
        let id = DocumentId::new(self.documents.len() as u32);
        let package_path = self.libraries[library.raw() as usize]
            .package_path_for(&path)
            .unwrap_or_else(|| vec![self.libraries[library.raw() as usize].name().to_string()]);
        let document = Document::new(&mut self.parser, id, library, path.clone(), package_path, text);
        self.documents.push(Some(document));
        self.libraries[library.raw() as usize].insert_document(path, id);
        id
    }
}

fn library_name_of(root: &Path) -> Option<String> {
    root.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

fn read_file(path: &Path) -> Result<String, ProjectError> {
    std::fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))
}
