//! LSP server over the project core.
//!
//! Thin boundary layer: converts LSP positions (UTF-16 columns) to the byte
//! columns the core uses, forwards document lifecycle notifications, and
//! maps core results back to LSP responses. The core itself is serialized
//! behind one lock; it is never re-entered while an operation is in flight.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::request::{GotoDeclarationParams, GotoDeclarationResponse};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::base;
use crate::ide::{self, ClassKind};
use crate::project::Project;
use crate::semantic::ResolveError;

pub struct Backend {
    client: Client,
    project: Mutex<Project>,
    /// Roots collected at initialize, loaded at initialized.
    pending_roots: Mutex<Vec<(PathBuf, bool)>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            project: Mutex::new(Project::new()),
            pending_roots: Mutex::new(Vec::new()),
        }
    }

    async fn publish_diagnostics(&self, uri: Url, path: &Path) {
        let diagnostics = {
            let project = self.project.lock().await;
            let Some(document) = project.get_document(path) else {
                return;
            };
            let text = document.text();
            document
                .parse_errors()
                .iter()
                .map(|error| {
                    let line = error.position.line as u32;
                    let character = byte_col_to_utf16(
                        line_text(text, error.position.line),
                        error.position.column,
                    );
                    let position = Position::new(line, character);
                    Diagnostic {
                        range: Range::new(position, position),
                        severity: Some(DiagnosticSeverity::ERROR),
                        source: Some("mols".to_string()),
                        message: error.message.clone(),
                        ..Default::default()
                    }
                })
                .collect()
        };
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    #[allow(deprecated)] // root_uri is the fallback for older clients
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let mut roots = Vec::new();
        if let Some(folders) = &params.workspace_folders {
            for folder in folders {
                if let Ok(path) = folder.uri.to_file_path() {
                    roots.push((path, true));
                }
            }
        } else if let Some(root_uri) = &params.root_uri {
            if let Ok(path) = root_uri.to_file_path() {
                roots.push((path, true));
            }
        }
        if let Some(options) = &params.initialization_options {
            for path in library_paths_from_options(options) {
                roots.push((path, false));
            }
        }
        *self.pending_roots.lock().await = roots;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                declaration_provider: Some(DeclarationCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "mols".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let roots = std::mem::take(&mut *self.pending_roots.lock().await);
        let mut project = self.project.lock().await;
        for (root, is_workspace) in roots {
            match project.load_library(&root, is_workspace) {
                Ok(id) => {
                    let count = project
                        .library(id)
                        .map(|lib| lib.document_count())
                        .unwrap_or(0);
                    info!(root = %root.display(), documents = count, "library loaded");
                }
                Err(err) => {
                    warn!(root = %root.display(), error = %err, "failed to load library");
                }
            }
        }
        info!(documents = project.document_count(), "workspace ready");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let Ok(path) = uri.to_file_path() else {
            warn!(uri = %uri, "ignoring non-file URI");
            return;
        };
        {
            let mut project = self.project.lock().await;
            if let Err(err) = project.add_document(&path) {
                debug!(path = %path.display(), error = %err, "open without backing library");
            }
            project.update_document(&path, &params.text_document.text, None);
        }
        self.publish_diagnostics(uri, &path).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Ok(path) = uri.to_file_path() else {
            return;
        };
        {
            let mut project = self.project.lock().await;
            for change in &params.content_changes {
                let range = match change.range {
                    Some(range) => {
                        let Some(document) = project.get_document(&path) else {
                            continue;
                        };
                        Some(lsp_range_to_span(document.text(), range))
                    }
                    None => None,
                };
                project.update_document(&path, &change.text, range);
            }
        }
        self.publish_diagnostics(uri, &path).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        // Documents stay loaded: they remain part of their library.
        debug!(uri = %params.text_document.uri, "closed");
    }

    async fn goto_declaration(
        &self,
        params: GotoDeclarationParams,
    ) -> Result<Option<GotoDeclarationResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Ok(path) = uri.to_file_path() else {
            return Ok(None);
        };
        let position = params.text_document_position_params.position;

        let mut project = self.project.lock().await;
        let Some(core_position) = lsp_position_to_core(&project, &path, position) else {
            return Ok(None);
        };
        match ide::find_declaration(&mut project, &path, core_position) {
            Ok(Some(location)) => {
                let range = project
                    .get_document(&location.path)
                    .map(|doc| span_to_lsp_range(doc.text(), location.selection))
                    .unwrap_or_default();
                let target = Url::from_file_path(&location.path)
                    .map_err(|()| Error::internal_error())?;
                Ok(Some(GotoDeclarationResponse::Scalar(Location::new(
                    target, range,
                ))))
            }
            Ok(None) => Ok(None),
            Err(ResolveError::Unsupported) => {
                Err(Error::invalid_params("declaration mode not available"))
            }
            Err(err) => {
                warn!(error = %err, "declaration lookup failed");
                Ok(None)
            }
        }
    }

    async fn goto_definition(
        &self,
        _params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        // Only declaration lookup is implemented; make that explicit rather
        // than silently returning nothing.
        Err(Error::invalid_params(
            "definition resolution is not supported; use textDocument/declaration",
        ))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let Ok(path) = uri.to_file_path() else {
            return Ok(None);
        };
        let mut project = self.project.lock().await;
        // Lazily admit files opened outside the workspace folders.
        let _ = project.get_or_load_document(&path);
        let Some(declarations) = ide::declarations_for_path(&project, &path) else {
            return Ok(None);
        };
        let Some(document) = project.get_document(&path) else {
            return Ok(None);
        };
        let text = document.text();
        let symbols = declarations
            .into_iter()
            .map(|decl| {
                #[allow(deprecated)]
                DocumentSymbol {
                    name: decl.name,
                    detail: None,
                    kind: symbol_kind(decl.kind),
                    tags: None,
                    deprecated: None,
                    range: span_to_lsp_range(text, decl.span),
                    selection_range: span_to_lsp_range(text, decl.selection),
                    children: None,
                }
            })
            .collect();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

fn symbol_kind(kind: ClassKind) -> SymbolKind {
    match kind {
        ClassKind::Package => SymbolKind::PACKAGE,
        ClassKind::Model | ClassKind::Block | ClassKind::Connector => SymbolKind::CLASS,
        ClassKind::Record => SymbolKind::STRUCT,
        ClassKind::Function | ClassKind::Operator => SymbolKind::FUNCTION,
        ClassKind::Type => SymbolKind::TYPE_PARAMETER,
        ClassKind::Class => SymbolKind::CLASS,
    }
}

fn library_paths_from_options(options: &serde_json::Value) -> Vec<PathBuf> {
    options
        .get("libraryPaths")
        .and_then(|v| v.as_array())
        .map(|paths| {
            paths
                .iter()
                .filter_map(|p| p.as_str())
                .map(PathBuf::from)
                .collect()
        })
        .unwrap_or_default()
}

// ----------------------------------------------------------------------
// Position conversion (UTF-16 ↔ byte columns)
// ----------------------------------------------------------------------

fn line_text(text: &str, line: usize) -> &str {
    text.split('\n').nth(line).unwrap_or("")
}

fn byte_col_to_utf16(line: &str, byte_col: usize) -> u32 {
    let clamped = line
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line.len()))
        .take_while(|&i| i <= byte_col)
        .last()
        .unwrap_or(0);
    line[..clamped].encode_utf16().count() as u32
}

fn utf16_col_to_byte(line: &str, utf16_col: u32) -> usize {
    let mut utf16 = 0u32;
    for (byte_idx, c) in line.char_indices() {
        if utf16 >= utf16_col {
            return byte_idx;
        }
        utf16 += c.len_utf16() as u32;
    }
    line.len()
}

fn lsp_position_to_core(project: &Project, path: &Path, position: Position) -> Option<base::Position> {
    let document = project.get_document(path)?;
    let line = position.line as usize;
    let column = utf16_col_to_byte(line_text(document.text(), line), position.character);
    Some(base::Position::new(line, column))
}

fn lsp_range_to_span(text: &str, range: Range) -> base::Span {
    let start_line = range.start.line as usize;
    let end_line = range.end.line as usize;
    base::Span::from_coords(
        start_line,
        utf16_col_to_byte(line_text(text, start_line), range.start.character),
        end_line,
        utf16_col_to_byte(line_text(text, end_line), range.end.character),
    )
}

fn span_to_lsp_range(text: &str, span: base::Span) -> Range {
    Range::new(
        Position::new(
            span.start.line as u32,
            byte_col_to_utf16(line_text(text, span.start.line), span.start.column),
        ),
        Position::new(
            span.end.line as u32,
            byte_col_to_utf16(line_text(text, span.end.line), span.end.column),
        ),
    )
}
