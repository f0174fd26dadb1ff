//! Language-server boundary
//!
//! Thin tower-lsp layer over the engine. Editor lifecycle events are
//! handled by `Workspace`, a plain struct over in-memory storage and the
//! diagnostics store; every mutation triggers a versioned recheck whose
//! result flows back as a `Publication` for the client. The diagnostics
//! store's supersede contract guarantees a stale recheck never overwrites
//! a newer one.

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use crate::code_action::CodeActionEngine;
use crate::config::Config;
use crate::convert;
use crate::diagnostics::DiagnosticsStore;
use crate::engine::{check_document, CheckFailure};
use crate::offense::Offense;
use crate::storage::{InMemoryStorage, Storage};

/// One diagnostics publication the caller must forward to the client.
#[derive(Debug)]
pub struct Publication {
    pub path: PathBuf,
    /// Document text the offense spans index into; empty when clearing.
    pub text: String,
    pub offenses: Vec<Offense>,
    /// Checks that crashed during the recheck, surfaced as log messages.
    pub failures: Vec<CheckFailure>,
}

impl Publication {
    fn clear(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            text: String::new(),
            offenses: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Session state behind the protocol layer: editor buffers are the truth
/// while the session is live.
pub struct Workspace {
    storage: InMemoryStorage,
    diagnostics: DiagnosticsStore,
    config: Config,
}

impl Workspace {
    pub fn new(config: Config) -> Self {
        Self {
            storage: InMemoryStorage::new(),
            diagnostics: DiagnosticsStore::new(),
            config,
        }
    }

    pub fn storage(&self) -> &InMemoryStorage {
        &self.storage
    }

    pub fn diagnostics(&self) -> &DiagnosticsStore {
        &self.diagnostics
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check the current storage content for `path`. Returns `None` when
    /// the path is absent or a newer recheck began in the meantime.
    fn recheck(&self, path: &Path) -> Option<Publication> {
        let version = self.diagnostics.begin(path);

        let text = self.storage.read(path)?;
        let report = check_document(path, &text, &self.config);

        if !self.diagnostics.publish(path, version, report.offenses.clone()) {
            tracing::debug!("dropping stale diagnostics for {}", path.display());
            return None;
        }

        Some(Publication {
            path: path.to_path_buf(),
            text,
            offenses: report.offenses,
            failures: report.failures,
        })
    }

    /// Document opened or fully replaced in the editor.
    pub fn update(&self, path: &Path, text: &str) -> Option<Publication> {
        let _ = self.storage.write(path, text);
        self.recheck(path)
    }

    /// Buffer closed; disk content under `root` is the truth again. A file
    /// that no longer exists on disk clears the entry.
    pub fn close(&self, root: &Path, path: &Path) -> Option<Publication> {
        match std::fs::read_to_string(root.join(path)) {
            Ok(text) => self.update(path, &text),
            Err(_) => Some(self.delete(path)),
        }
    }

    /// File created on disk outside the editor buffer.
    pub fn create(&self, root: &Path, path: &Path) -> Option<Publication> {
        let text = std::fs::read_to_string(root.join(path)).ok()?;
        self.update(path, &text)
    }

    /// File deleted; clears state and publishes an empty set.
    pub fn delete(&self, path: &Path) -> Publication {
        let _ = self.storage.remove(path);
        self.diagnostics.remove(path);
        Publication::clear(path)
    }

    /// File renamed: carry the in-memory buffer to the new path without
    /// re-reading disk, clear the old path, recheck the new.
    pub fn rename(&self, old: &Path, new: &Path) -> (Publication, Option<Publication>) {
        if let Some(text) = self.storage.read(old) {
            let _ = self.storage.write(new, &text);
        }
        (self.delete(old), self.recheck(new))
    }
}

pub struct Backend {
    client: Client,
    /// Project root, learned at initialize.
    root: RwLock<Option<PathBuf>>,
    workspace: Workspace,
}

impl Backend {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            root: RwLock::new(None),
            workspace: Workspace::new(config),
        }
    }

    async fn root(&self) -> PathBuf {
        self.root.read().await.clone().unwrap_or_default()
    }

    async fn path_for(&self, uri: &Url) -> Option<PathBuf> {
        convert::uri_to_path(&self.root().await, uri)
    }

    async fn forward(&self, uri: &Url, publication: Option<Publication>) {
        let Some(publication) = publication else {
            return;
        };

        for failure in &publication.failures {
            self.client
                .log_message(
                    MessageType::WARNING,
                    format!(
                        "check {} failed on {}: {}",
                        failure.check,
                        publication.path.display(),
                        failure.message
                    ),
                )
                .await;
        }

        let lsp_diagnostics: Vec<_> = publication
            .offenses
            .iter()
            .map(|offense| convert::to_lsp_diagnostic(&publication.text, offense))
            .collect();
        self.client
            .publish_diagnostics(uri.clone(), lsp_diagnostics, None)
            .await;
    }
}

/// File-operation filter covering every template in the workspace.
fn liquid_file_filter() -> FileOperationRegistrationOptions {
    FileOperationRegistrationOptions {
        filters: vec![FileOperationFilter {
            scheme: Some("file".to_string()),
            pattern: FileOperationPattern {
                glob: "**/*.liquid".to_string(),
                matches: None,
                options: None,
            },
        }],
    }
}

fn capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: None,
                will_save_wait_until: None,
                save: None,
            },
        )),
        code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
        workspace: Some(WorkspaceServerCapabilities {
            workspace_folders: None,
            file_operations: Some(WorkspaceFileOperationsServerCapabilities {
                did_create: Some(liquid_file_filter()),
                will_create: None,
                did_rename: None,
                will_rename: Some(liquid_file_filter()),
                did_delete: Some(liquid_file_filter()),
                will_delete: None,
            }),
        }),
        ..ServerCapabilities::default()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("sleet language server initializing");

        if let Some(root_uri) = params.root_uri {
            if let Ok(root_path) = root_uri.to_file_path() {
                *self.root.write().await = Some(root_path);
            }
        }

        Ok(InitializeResult {
            capabilities: capabilities(),
            server_info: Some(ServerInfo {
                name: "sleet".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("sleet language server initialized");
        self.client
            .log_message(MessageType::INFO, "sleet ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("sleet language server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(path) = self.path_for(&uri).await else {
            return;
        };

        tracing::debug!("opened {}", path.display());
        let publication = self.workspace.update(&path, &params.text_document.text);
        self.forward(&uri, publication).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(path) = self.path_for(&uri).await else {
            return;
        };

        // full sync: the last change carries the whole document
        if let Some(change) = params.content_changes.into_iter().last() {
            let publication = self.workspace.update(&path, &change.text);
            self.forward(&uri, publication).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(path) = self.path_for(&uri).await else {
            return;
        };

        tracing::debug!("closed {}", path.display());
        let publication = self.workspace.close(&self.root().await, &path);
        self.forward(&uri, publication).await;
    }

    async fn did_create_files(&self, params: CreateFilesParams) {
        for file in params.files {
            let Ok(uri) = Url::parse(&file.uri) else {
                continue;
            };
            let Some(path) = self.path_for(&uri).await else {
                continue;
            };
            let publication = self.workspace.create(&self.root().await, &path);
            self.forward(&uri, publication).await;
        }
    }

    async fn did_delete_files(&self, params: DeleteFilesParams) {
        for file in params.files {
            let Ok(uri) = Url::parse(&file.uri) else {
                continue;
            };
            let Some(path) = self.path_for(&uri).await else {
                continue;
            };
            let publication = self.workspace.delete(&path);
            self.forward(&uri, Some(publication)).await;
        }
    }

    async fn will_rename_files(&self, params: RenameFilesParams) -> Result<Option<WorkspaceEdit>> {
        for rename in params.files {
            let (Ok(old_uri), Ok(new_uri)) =
                (Url::parse(&rename.old_uri), Url::parse(&rename.new_uri))
            else {
                continue;
            };
            let (Some(old_path), Some(new_path)) =
                (self.path_for(&old_uri).await, self.path_for(&new_uri).await)
            else {
                continue;
            };

            let (cleared, rechecked) = self.workspace.rename(&old_path, &new_path);
            self.forward(&old_uri, Some(cleared)).await;
            self.forward(&new_uri, rechecked).await;
        }

        Ok(None)
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let Some(path) = self.path_for(&uri).await else {
            return Ok(None);
        };
        let Some(text) = self.workspace.storage().read(&path) else {
            return Ok(None);
        };

        let engine = CodeActionEngine::new(
            self.workspace.storage(),
            self.workspace.diagnostics(),
            self.workspace.config(),
        );
        let actions = engine.code_actions(
            &path,
            (params.range.start.line, params.range.start.character),
            (params.range.end.line, params.range.end.character),
        );

        if actions.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            actions
                .iter()
                .map(|action| {
                    CodeActionOrCommand::CodeAction(convert::to_lsp_code_action(
                        &uri, &text, action,
                    ))
                })
                .collect(),
        ))
    }
}

/// Run the language server over stdio until the client disconnects.
pub async fn serve(config: Config) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::new(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::new(Config::default())
    }

    #[test]
    fn test_update_publishes_offenses() {
        let workspace = workspace();
        let path = Path::new("snippets/a.liquid");

        let publication = workspace.update(path, "{{x}}").unwrap();
        assert_eq!(publication.offenses.len(), 1);
        assert_eq!(publication.offenses[0].check, "SpaceInsideBraces");
        assert_eq!(publication.text, "{{x}}");
        assert_eq!(workspace.diagnostics().get(path).unwrap().len(), 1);
    }

    #[test]
    fn test_update_replaces_previous_set() {
        let workspace = workspace();
        let path = Path::new("snippets/a.liquid");

        workspace.update(path, "{{x}}").unwrap();
        let publication = workspace.update(path, "{{ x }}").unwrap();
        assert!(publication.offenses.is_empty());
        assert_eq!(workspace.diagnostics().get(path).unwrap().len(), 0);
    }

    #[test]
    fn test_delete_clears_entry() {
        let workspace = workspace();
        let path = Path::new("snippets/a.liquid");
        workspace.update(path, "{{x}}").unwrap();

        let publication = workspace.delete(path);
        assert!(publication.offenses.is_empty());
        assert!(workspace.storage().read(path).is_none());
        assert!(workspace.diagnostics().get(path).is_none());
    }

    #[test]
    fn test_rename_carries_buffer_without_disk() {
        let workspace = workspace();
        let old = Path::new("snippets/old.liquid");
        let new = Path::new("snippets/new.liquid");
        workspace.update(old, "{{x}}").unwrap();

        // neither path exists on disk; the buffer alone must move
        let (cleared, rechecked) = workspace.rename(old, new);
        assert_eq!(cleared.path, old);
        assert!(cleared.offenses.is_empty());

        let rechecked = rechecked.unwrap();
        assert_eq!(rechecked.path, new);
        assert_eq!(rechecked.text, "{{x}}");
        assert_eq!(rechecked.offenses.len(), 1);

        assert!(workspace.storage().read(old).is_none());
        assert_eq!(workspace.storage().read(new).unwrap(), "{{x}}");
        assert!(workspace.diagnostics().get(old).is_none());
        assert_eq!(workspace.diagnostics().get(new).unwrap().len(), 1);
    }

    #[test]
    fn test_rename_of_unknown_path_still_clears_old() {
        let workspace = workspace();
        let (cleared, rechecked) =
            workspace.rename(Path::new("ghost.liquid"), Path::new("new.liquid"));
        assert!(cleared.offenses.is_empty());
        assert!(rechecked.is_none());
    }

    #[test]
    fn test_close_reverts_to_disk_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = Path::new("a.liquid");
        std::fs::write(dir.path().join(path), "{{ clean }}").unwrap();

        let workspace = workspace();
        // dirty buffer has an offense, disk does not
        assert_eq!(workspace.update(path, "{{dirty}}").unwrap().offenses.len(), 1);

        let publication = workspace.close(dir.path(), path).unwrap();
        assert!(publication.offenses.is_empty());
        assert_eq!(publication.text, "{{ clean }}");
        assert_eq!(workspace.storage().read(path).unwrap(), "{{ clean }}");
    }

    #[test]
    fn test_close_without_disk_file_clears_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = Path::new("a.liquid");

        let workspace = workspace();
        workspace.update(path, "{{x}}").unwrap();

        let publication = workspace.close(dir.path(), path).unwrap();
        assert!(publication.offenses.is_empty());
        assert!(workspace.storage().read(path).is_none());
        assert!(workspace.diagnostics().get(path).is_none());
    }

    #[test]
    fn test_create_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = Path::new("a.liquid");
        std::fs::write(dir.path().join(path), "{{x}}").unwrap();

        let workspace = workspace();
        let publication = workspace.create(dir.path(), path).unwrap();
        assert_eq!(publication.offenses.len(), 1);
        assert_eq!(workspace.storage().read(path).unwrap(), "{{x}}");
    }

    #[test]
    fn test_create_of_missing_file_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = workspace();
        assert!(workspace.create(dir.path(), Path::new("ghost.liquid")).is_none());
    }

    #[test]
    fn test_capabilities_advertise_code_actions() {
        let caps = capabilities();
        assert!(matches!(
            caps.code_action_provider,
            Some(CodeActionProviderCapability::Simple(true))
        ));
    }

    #[test]
    fn test_capabilities_use_full_sync() {
        let caps = capabilities();
        let Some(TextDocumentSyncCapability::Options(options)) = caps.text_document_sync else {
            panic!("expected sync options");
        };
        assert_eq!(options.change, Some(TextDocumentSyncKind::FULL));
    }

    #[test]
    fn test_file_operation_filter_targets_templates() {
        let filter = liquid_file_filter();
        assert_eq!(filter.filters[0].pattern.glob, "**/*.liquid");
    }
}
