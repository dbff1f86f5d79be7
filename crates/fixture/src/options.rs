//! Registry of option pragmas a fixture may declare

use serde::Serialize;
use std::collections::BTreeMap;

/// Structural pragmas handled by the parser itself
pub const FILENAME_PRAGMA: &str = "filename";
pub const LINK_PRAGMA: &str = "link";
pub const CURRENT_DIRECTORY_PRAGMA: &str = "currentdirectory";

/// File-scoped directive that marks a file for emit
pub const EMIT_THIS_FILE: &str = "emitthisfile";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptionScope {
    /// Applies to the whole project
    Global,
    /// Applies to the file whose section it appears in
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSpec {
    pub name: String,
    pub scope: OptionScope,
    pub default: Option<String>,
}

const BUILTIN: &[(&str, OptionScope, Option<&str>)] = &[
    (EMIT_THIS_FILE, OptionScope::File, Some("false")),
    ("skipdefaultlibcheck", OptionScope::Global, Some("true")),
    ("allowimportingtsextensions", OptionScope::Global, None),
    ("allowjs", OptionScope::Global, None),
    ("allowsyntheticdefaultimports", OptionScope::Global, None),
    ("allowunreachablecode", OptionScope::Global, None),
    ("allowunusedlabels", OptionScope::Global, None),
    ("baseurl", OptionScope::Global, None),
    ("checkjs", OptionScope::Global, None),
    ("composite", OptionScope::Global, None),
    ("customconditions", OptionScope::Global, None),
    ("declaration", OptionScope::Global, None),
    ("declarationdir", OptionScope::Global, None),
    ("downleveliteration", OptionScope::Global, None),
    ("esmoduleinterop", OptionScope::Global, None),
    ("exactoptionalpropertytypes", OptionScope::Global, None),
    ("experimentaldecorators", OptionScope::Global, None),
    ("importhelpers", OptionScope::Global, None),
    ("isolatedmodules", OptionScope::Global, None),
    ("jsx", OptionScope::Global, None),
    ("jsxfactory", OptionScope::Global, None),
    ("jsximportsource", OptionScope::Global, None),
    ("lib", OptionScope::Global, None),
    ("maxnodemodulejsdepth", OptionScope::Global, None),
    ("module", OptionScope::Global, None),
    ("moduledetection", OptionScope::Global, None),
    ("moduleresolution", OptionScope::Global, None),
    ("newline", OptionScope::Global, None),
    ("noemit", OptionScope::Global, None),
    ("noimplicitany", OptionScope::Global, None),
    ("noimplicitreturns", OptionScope::Global, None),
    ("noimplicitthis", OptionScope::Global, None),
    ("nolib", OptionScope::Global, None),
    ("noresolve", OptionScope::Global, None),
    ("nouncheckedindexedaccess", OptionScope::Global, None),
    ("nounusedlocals", OptionScope::Global, None),
    ("nounusedparameters", OptionScope::Global, None),
    ("outdir", OptionScope::Global, None),
    ("outfile", OptionScope::Global, None),
    ("paths", OptionScope::Global, None),
    ("preserveconstenums", OptionScope::Global, None),
    ("resolvejsonmodule", OptionScope::Global, None),
    ("rootdir", OptionScope::Global, None),
    ("sourcemap", OptionScope::Global, None),
    ("strict", OptionScope::Global, None),
    ("strictnullchecks", OptionScope::Global, None),
    ("stripinternal", OptionScope::Global, None),
    ("target", OptionScope::Global, None),
    ("traceresolution", OptionScope::Global, None),
    ("typeroots", OptionScope::Global, None),
    ("types", OptionScope::Global, None),
    ("usedefineforclassfields", OptionScope::Global, None),
    ("useunknownincatchvariables", OptionScope::Global, None),
    ("verbatimmodulesyntax", OptionScope::Global, None),
];

/// Known option pragmas with their scope and declared default
#[derive(Debug, Clone)]
pub struct OptionRegistry {
    specs: BTreeMap<String, OptionSpec>,
}

impl Default for OptionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OptionRegistry {
    pub fn builtin() -> Self {
        let specs = BUILTIN
            .iter()
            .map(|&(name, scope, default)| {
                (
                    name.to_string(),
                    OptionSpec {
                        name: name.to_string(),
                        scope,
                        default: default.map(str::to_string),
                    },
                )
            })
            .collect();
        Self { specs }
    }

    /// Adds global options without defaults, e.g. from `fixtures.extra_options`
    pub fn with_extra<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().to_ascii_lowercase();
            self.specs.entry(name.clone()).or_insert(OptionSpec {
                name,
                scope: OptionScope::Global,
                default: None,
            });
        }
        self
    }

    /// Registers or replaces one option
    pub fn register(&mut self, spec: OptionSpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.specs.get(name)
    }

    pub fn scope(&self, name: &str) -> Option<OptionScope> {
        self.get(name).map(|spec| spec.scope)
    }

    /// Explicit values of `scope`, completed with each declared default not set explicitly
    pub fn resolve(
        &self,
        scope: OptionScope,
        explicit: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut resolved = explicit.clone();
        for spec in self.specs.values().filter(|spec| spec.scope == scope) {
            if let Some(default) = &spec.default {
                resolved
                    .entry(spec.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_scopes() {
        let registry = OptionRegistry::builtin();
        assert_eq!(registry.scope(EMIT_THIS_FILE), Some(OptionScope::File));
        assert_eq!(registry.scope("strict"), Some(OptionScope::Global));
        assert_eq!(registry.scope("nonsense"), None);
    }

    #[test]
    fn test_resolve_fills_defaults_without_overwriting() {
        let registry = OptionRegistry::builtin();
        let explicit = BTreeMap::from([
            ("skipdefaultlibcheck".to_string(), "false".to_string()),
            ("target".to_string(), "es2015".to_string()),
        ]);
        let resolved = registry.resolve(OptionScope::Global, &explicit);
        assert_eq!(resolved.get("skipdefaultlibcheck").map(String::as_str), Some("false"));
        assert_eq!(resolved.get("target").map(String::as_str), Some("es2015"));
        assert!(!resolved.contains_key(EMIT_THIS_FILE));

        let file = registry.resolve(OptionScope::File, &BTreeMap::new());
        assert_eq!(file.get(EMIT_THIS_FILE).map(String::as_str), Some("false"));
    }

    #[test]
    fn test_with_extra_keeps_builtin_specs() {
        let registry = OptionRegistry::builtin().with_extra(["EmitThisFile", "myFlag"]);
        assert_eq!(registry.scope(EMIT_THIS_FILE), Some(OptionScope::File));
        assert_eq!(registry.scope("myflag"), Some(OptionScope::Global));
    }
}
