//! Offset-based facade over a [`LanguageService`]

use crate::documents::{Document, DocumentStore};
use crate::response::{CompletionResponse, LocationSpan, QuickInfo, ResponseItem, SignatureHelpInfo};
use crate::service::{language_id, LanguageService};
use lsp_types::Position;
use markcheck_core::{Error, LinePosition, PositionEncoding, Result, TextRange};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Owns one test's service instance and the documents it has been sent
pub struct ServiceAdapter {
    service: Box<dyn LanguageService>,
    documents: DocumentStore,
}

impl ServiceAdapter {
    pub fn new(service: Box<dyn LanguageService>) -> Self {
        Self {
            service,
            documents: DocumentStore::new(),
        }
    }

    pub fn encoding(&self) -> PositionEncoding {
        self.service.position_encoding()
    }

    pub fn configure(&mut self, options: &BTreeMap<String, String>) -> Result<()> {
        debug!(options = options.len(), "Configuring service");
        self.service.configure(options)
    }

    /// Registers a file with the service; opening a file twice is a no-op
    pub fn open(&mut self, path: &str, content: &str) -> Result<()> {
        if !self.documents.open(path, content) {
            return Ok(());
        }
        trace!(path, "didOpen");
        self.service.did_open(path, language_id(path), 1, content)
    }

    /// Replaces the byte span `[start, end)` of `path` and notifies the service
    pub fn apply_edit(&mut self, path: &str, start: usize, end: usize, text: &str) -> Result<()> {
        if end < start {
            return Err(Error::navigation(format!(
                "Edit end {end} is before its start {start}"
            )));
        }
        let encoding = self.encoding();
        let (range, version) =
            self.documents
                .apply_edit(path, TextRange::new(start, end), text, encoding)?;
        trace!(path, version, start, end, inserted = text.len(), "didChange");
        self.service.did_change(path, version, range, text)
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn document(&self, path: &str) -> Result<&Document> {
        self.documents.require(path)
    }

    pub fn content(&self, path: &str) -> Result<&str> {
        Ok(self.document(path)?.content())
    }

    pub fn position_of(&self, path: &str, offset: usize) -> Result<LinePosition> {
        let document = self.document(path)?;
        Ok(document
            .line_map()
            .offset_to_position(document.content(), offset, self.encoding()))
    }

    fn request_position(&self, path: &str, offset: usize) -> Result<Position> {
        let document = self.document(path)?;
        if offset > document.content().len() {
            return Err(Error::navigation(format!(
                "Offset {offset} is past the end of {path} (length {})",
                document.content().len()
            )));
        }
        Ok(document.position(offset, self.encoding()))
    }

    pub fn completions(&mut self, path: &str, offset: usize) -> Result<Option<CompletionResponse>> {
        let position = self.request_position(path, offset)?;
        let list = self.service.completion(path, position)?;
        let encoding = self.encoding();
        let document = self.document(path)?;
        Ok(list.map(|list| CompletionResponse::from_lsp(list, document, encoding)))
    }

    /// Resolves an item previously returned for `path`
    pub fn resolve(&mut self, path: &str, item: &ResponseItem) -> Result<ResponseItem> {
        let resolved = self.service.resolve_completion(item.raw.clone())?;
        let encoding = self.encoding();
        Ok(ResponseItem::from_lsp(resolved, self.document(path)?, encoding))
    }

    pub fn quick_info(&mut self, path: &str, offset: usize) -> Result<Option<QuickInfo>> {
        let position = self.request_position(path, offset)?;
        let hover = self.service.hover(path, position)?;
        let encoding = self.encoding();
        let document = self.document(path)?;
        Ok(hover.map(|hover| QuickInfo::from_lsp(hover, document, encoding)))
    }

    pub fn definition(&mut self, path: &str, offset: usize) -> Result<Vec<LocationSpan>> {
        let position = self.request_position(path, offset)?;
        let locations = self.service.definition(path, position)?;
        let encoding = self.encoding();
        locations
            .iter()
            .map(|loc| LocationSpan::from_lsp(loc, &self.documents, encoding))
            .collect()
    }

    pub fn references(&mut self, path: &str, offset: usize) -> Result<Vec<LocationSpan>> {
        let position = self.request_position(path, offset)?;
        // Declarations are requested too so reference baselines show the
        // defining span alongside its uses
        let locations = self.service.references(path, position, true)?;
        let encoding = self.encoding();
        locations
            .iter()
            .map(|loc| LocationSpan::from_lsp(loc, &self.documents, encoding))
            .collect()
    }

    pub fn signature_help(&mut self, path: &str, offset: usize) -> Result<Option<SignatureHelpInfo>> {
        let position = self.request_position(path, offset)?;
        Ok(self
            .service
            .signature_help(path, position)?
            .map(SignatureHelpInfo::from_lsp))
    }

    pub fn shutdown(mut self) -> Result<()> {
        debug!("Shutting down service");
        self.service.shutdown()
    }
}
