//! Virtual project construction
//!
//! Every test gets its own project: a fresh service instance from the
//! factory, configured with the fixture's resolved options and sent every
//! file. Nothing built here is shared between tests.

use crate::session::Session;
use markcheck_core::{BaselineConfig, Config, Result, ServerConfig};
use markcheck_fixture::{default_file_name, Fixture, FixtureParser, OptionRegistry, OptionScope};
use markcheck_service::{LanguageService, LspClient, ServiceAdapter, ServiceFactory};
use markcheck_verify::BaselineStore;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Default extension of a fixture's implicit file
const DEFAULT_EXTENSION: &str = "ts";

/// Builds a [`Session`] per test from fixture text
pub struct ProjectBuilder {
    parser: FixtureParser,
    factory: Box<dyn ServiceFactory>,
    baselines: BaselineStore,
    default_extension: String,
}

/// Factory spawning a language server process per test
pub fn lsp_factory(config: ServerConfig) -> impl ServiceFactory {
    move || -> Result<Box<dyn LanguageService>> { Ok(Box::new(LspClient::from_config(&config)?)) }
}

impl ProjectBuilder {
    pub fn new(factory: impl ServiceFactory + 'static) -> Self {
        Self {
            parser: FixtureParser::default(),
            factory: Box::new(factory),
            baselines: BaselineStore::from_config(&BaselineConfig::default()),
            default_extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Builder using the configured fixture options and baseline directories
    pub fn from_config(config: &Config, factory: impl ServiceFactory + 'static) -> Self {
        let registry = OptionRegistry::builtin().with_extra(&config.fixtures.extra_options);
        Self {
            parser: FixtureParser::new(registry),
            factory: Box::new(factory),
            baselines: BaselineStore::from_config(&config.baselines),
            default_extension: config.fixtures.default_extension.clone(),
        }
    }

    pub fn with_baselines(mut self, baselines: BaselineStore) -> Self {
        self.baselines = baselines;
        self
    }

    pub fn with_registry(mut self, registry: OptionRegistry) -> Self {
        self.parser = FixtureParser::new(registry);
        self
    }

    pub fn registry(&self) -> &OptionRegistry {
        self.parser.registry()
    }

    pub fn parse(&self, test_name: &str, content: &str) -> Result<Fixture> {
        let default_name = default_file_name(test_name, &self.default_extension);
        self.parser.parse(test_name, content, &default_name)
    }

    /// Global options after filling in registry defaults
    pub fn resolved_options(&self, fixture: &Fixture) -> BTreeMap<String, String> {
        self.registry()
            .resolve(OptionScope::Global, &fixture.options().global)
    }

    /// Starts a service for `fixture` and opens every file in it
    pub fn build(&self, fixture: Fixture) -> Result<Session> {
        let options = self.resolved_options(&fixture);
        let mut adapter = ServiceAdapter::new(self.factory.create()?);
        adapter.configure(&options)?;

        for file in fixture.files() {
            adapter.open(&file.path, &file.content)?;
        }
        for symlink in &fixture.options().symlinks {
            if let Some(target) = fixture.file(&symlink.target) {
                debug!(link = %symlink.link, target = %symlink.target, "Opening symlinked file");
                adapter.open(&symlink.link, &target.content)?;
            }
        }

        info!(
            test = fixture.name(),
            files = fixture.files().len(),
            options = options.len(),
            "Project ready"
        );
        Ok(Session::new(fixture, adapter, self.baselines.clone(), options))
    }

    /// Parses `content` and builds its project
    pub fn session(&self, test_name: &str, content: &str) -> Result<Session> {
        let fixture = self.parse(test_name, content)?;
        self.build(fixture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markcheck_service::mock::{CallLog, MockLanguageService};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn builder() -> (ProjectBuilder, Rc<RefCell<Option<CallLog>>>) {
        let log = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&log);
        let builder = ProjectBuilder::new(move || -> Result<Box<dyn LanguageService>> {
            let service = MockLanguageService::new();
            *slot.borrow_mut() = Some(service.calls());
            Ok(Box::new(service))
        });
        (builder, log)
    }

    #[test]
    fn test_files_are_opened_after_configuration() {
        let (builder, log) = builder();
        let session = builder
            .session(
                "two",
                "// @strict: true\n// @filename: /a.ts\nconst a = 1;\n// @filename: /b.tsx\nlet b = a;",
            )
            .expect("session");
        let calls = log.borrow().clone().expect("service created").borrow().clone();
        assert_eq!(
            calls,
            vec![
                "configure skipdefaultlibcheck=true,strict=true".to_string(),
                "didOpen /a.ts typescript v1".to_string(),
                "didOpen /b.tsx typescriptreact v1".to_string(),
            ]
        );
        assert_eq!(session.active_file(), "/a.ts");
        session.dispose().expect("dispose");
    }

    #[test]
    fn test_each_build_gets_a_fresh_service() {
        let (builder, log) = builder();
        let first = builder.session("one", "const x = 1;").expect("session");
        let first_log = log.borrow().clone().expect("log");
        let second = builder.session("one", "const x = 1;").expect("session");
        let second_log = log.borrow().clone().expect("log");
        assert!(!Rc::ptr_eq(&first_log, &second_log));
        first.dispose().expect("dispose");
        second.dispose().expect("dispose");
        assert_eq!(first_log.borrow().last().map(String::as_str), Some("shutdown"));
    }

    #[test]
    fn test_symlinks_are_opened_with_target_content() {
        let (builder, _) = builder();
        let session = builder
            .session(
                "link",
                "// @filename: /src/a.ts\nexport const a = 1;\n// @link: /src/a.ts -> /node_modules/a/index.ts",
            )
            .expect("session");
        assert_eq!(
            session.file_content("/node_modules/a/index.ts").expect("linked"),
            session.file_content("/src/a.ts").expect("target")
        );
    }

    #[test]
    fn test_lsp_factory_requires_a_command() {
        let Err(err) = lsp_factory(ServerConfig::default()).create() else {
            panic!("no server command is configured");
        };
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_parse_errors_surface_before_the_service_starts() {
        let (builder, log) = builder();
        let Err(err) = builder.session("bad", "[| unterminated") else {
            panic!("unterminated range should not parse");
        };
        assert_eq!(err.kind(), "FixtureParseError");
        assert!(log.borrow().is_none());
    }
}
