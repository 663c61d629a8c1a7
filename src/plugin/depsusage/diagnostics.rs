//! Per-file module liveness.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::lang::Import;

/// Identifier recorded on evidence produced by a wildcard import.
pub const WILDCARD_IDENTIFIER: &str = "*";

/// One name through which a module's contents can be referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierItem {
    /// Usage identifier key.
    pub identifier: String,
    /// Module path as written in the import.
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Imported item with the `<base>.` prefix removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_hint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleUsage {
    pub used: bool,
    /// Package hint of the first import seen for the module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_hint: Option<String>,
    /// Identifiers in import order.
    pub identifiers: Vec<IdentifierItem>,
}

/// A reference that marked a module as used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageEvidence {
    pub identifier: String,
    pub module_base: String,
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_hint: Option<String>,
    pub is_wildcard: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    base: String,
    item: IdentifierItem,
}

/// Module liveness for one file.
///
/// Modules are keyed by base module name and iterate in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageDiagnostics {
    file: String,
    modules: BTreeMap<String, ModuleUsage>,
    #[serde(skip)]
    bindings: BTreeMap<String, Binding>,
    evidence: Vec<UsageEvidence>,
}

impl UsageDiagnostics {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    /// Build the module index from a file's imports.
    pub fn from_imports(file: impl Into<String>, imports: &[Import]) -> Self {
        let mut diagnostics = Self::new(file);
        for import in imports {
            diagnostics.add_import(import);
        }
        diagnostics
    }

    pub fn add_import(&mut self, import: &Import) {
        let base = import.base_module_name().to_string();
        let module = self.modules.entry(base.clone()).or_default();
        if module.package_hint.is_none() {
            module.package_hint = import.package_hint.clone();
        }

        // Wildcards may bind anything; assume the module is used.
        if import.is_wildcard {
            module.used = true;
            self.evidence.push(UsageEvidence {
                identifier: WILDCARD_IDENTIFIER.to_string(),
                module_base: base,
                module: import.module_name.clone(),
                module_item: None,
                alias: import.module_alias.clone(),
                package_hint: import.package_hint.clone(),
                is_wildcard: true,
                line: import.line,
            });
            return;
        }

        let item = IdentifierItem {
            identifier: import.usage_key().to_string(),
            module: import.module_name.clone(),
            alias: import.module_alias.clone(),
            item_name: import.item_name().map(str::to_string),
            package_hint: import.package_hint.clone(),
        };
        module.identifiers.push(item.clone());
        self.bindings
            .insert(item.identifier.clone(), Binding { base, item });
    }

    /// Mark the module bound to `identifier` as used. Returns false if the
    /// identifier does not name an import.
    pub fn mark_used(&mut self, identifier: &str, line: usize) -> bool {
        let Some(binding) = self.bindings.get(identifier) else {
            return false;
        };
        if let Some(module) = self.modules.get_mut(&binding.base) {
            module.used = true;
        }
        self.evidence.push(UsageEvidence {
            identifier: identifier.to_string(),
            module_base: binding.base.clone(),
            module: binding.item.module.clone(),
            module_item: binding.item.item_name.clone(),
            alias: binding.item.alias.clone(),
            package_hint: binding.item.package_hint.clone(),
            is_wildcard: false,
            line,
        });
        true
    }

    /// Whether the module bound to `identifier` has been marked used.
    pub fn is_used(&self, identifier: &str) -> bool {
        self.module_for(identifier)
            .and_then(|base| self.modules.get(base))
            .is_some_and(|module| module.used)
    }

    /// Base module name an identifier key resolves to.
    pub fn module_for(&self, identifier: &str) -> Option<&str> {
        self.bindings.get(identifier).map(|b| b.base.as_str())
    }

    pub fn module(&self, base: &str) -> Option<&ModuleUsage> {
        self.modules.get(base)
    }

    pub fn modules(&self) -> impl Iterator<Item = (&str, &ModuleUsage)> {
        self.modules.iter().map(|(base, usage)| (base.as_str(), usage))
    }

    pub fn unused_modules(&self) -> Vec<&str> {
        self.modules()
            .filter(|(_, usage)| !usage.used)
            .map(|(base, _)| base)
            .collect()
    }

    pub fn evidence(&self) -> &[UsageEvidence] {
        &self.evidence
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(module: &str) -> Import {
        Import::new(module, "a.py", 1)
    }

    #[test]
    fn test_index_and_reverse_map() {
        let imports = vec![
            import("os").finish(None),
            import("os.path").with_item("join").with_alias("j").finish(None),
            import("xml").with_item("xml.dom").finish(None),
            import("math").wildcard().finish(None),
        ];
        let diag = UsageDiagnostics::from_imports("a.py", &imports);

        let bases: Vec<&str> = diag.modules().map(|(b, _)| b).collect();
        assert_eq!(bases, vec!["math", "os", "xml"]);

        let os = diag.module("os").unwrap();
        assert!(!os.used);
        assert_eq!(os.identifiers.len(), 2);
        assert_eq!(os.identifiers[1].identifier, "j");
        assert_eq!(os.identifiers[1].item_name.as_deref(), Some("join"));
        assert_eq!(diag.module("xml").unwrap().identifiers[0].item_name.as_deref(), Some("dom"));

        assert!(diag.module("math").unwrap().used);
        assert_eq!(diag.module_for("j"), Some("os"));

        for (_, usage) in diag.modules() {
            for item in &usage.identifiers {
                assert!(diag.module_for(&item.identifier).is_some());
            }
        }
    }

    #[test]
    fn test_mark_used_records_evidence() {
        let imports = vec![import("os").finish(None), import("sys").finish(None)];
        let mut diag = UsageDiagnostics::from_imports("a.py", &imports);

        assert!(diag.mark_used("os", 3));
        assert!(!diag.mark_used("print", 3));

        assert!(diag.is_used("os"));
        assert!(!diag.is_used("sys"));
        assert_eq!(diag.unused_modules(), vec!["sys"]);
        assert_eq!(
            diag.evidence(),
            &[UsageEvidence {
                identifier: "os".to_string(),
                module_base: "os".to_string(),
                module: "os".to_string(),
                module_item: None,
                alias: None,
                package_hint: None,
                is_wildcard: false,
                line: 3,
            }]
        );
    }

    #[test]
    fn test_duplicate_key_overwrites_but_keeps_flags() {
        let mut diag = UsageDiagnostics::new("a.py");
        diag.add_import(&import("json").finish(None));
        diag.mark_used("json", 2);
        diag.add_import(&import("simplejson").with_alias("json").finish(None));

        assert_eq!(diag.module_for("json"), Some("simplejson"));
        assert!(diag.module("json").unwrap().used);
        assert!(!diag.module("simplejson").unwrap().used);
    }

    #[test]
    fn test_wildcard_imports_leave_evidence() {
        let imports = vec![
            Import::new("math", "a.py", 1)
                .wildcard()
                .finish(Some("math".to_string())),
            Import::new("yaml", "a.py", 2).finish(Some("yaml".to_string())),
        ];
        let diag = UsageDiagnostics::from_imports("a.py", &imports);

        assert_eq!(diag.evidence().len(), 1);
        let star = &diag.evidence()[0];
        assert!(star.is_wildcard);
        assert_eq!(star.identifier, WILDCARD_IDENTIFIER);
        assert_eq!(star.module, "math");
        assert_eq!(star.package_hint.as_deref(), Some("math"));
        assert_eq!(star.line, 1);
        assert!(diag.module("math").unwrap().used);
        assert!(!diag.module("yaml").unwrap().used);
    }

    #[test]
    fn test_package_hints_reach_modules_and_evidence() {
        let imports = vec![Import::new("google.protobuf", "a.py", 1)
            .with_item("message")
            .with_alias("msg")
            .finish(Some("google".to_string()))];
        let mut diag = UsageDiagnostics::from_imports("a.py", &imports);

        let google = diag.module("google").unwrap();
        assert_eq!(google.package_hint.as_deref(), Some("google"));
        assert_eq!(google.identifiers[0].module, "google.protobuf");
        assert_eq!(google.identifiers[0].package_hint.as_deref(), Some("google"));

        assert!(diag.mark_used("msg", 4));
        let evidence = &diag.evidence()[0];
        assert_eq!(evidence.module, "google.protobuf");
        assert_eq!(evidence.module_item.as_deref(), Some("message"));
        assert_eq!(evidence.alias.as_deref(), Some("msg"));
        assert_eq!(evidence.package_hint.as_deref(), Some("google"));
        assert!(!evidence.is_wildcard);
    }
}
