//! Normalized import records.

use serde::Serialize;

/// One imported entity, as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    /// Fully qualified module path as written (`os.path`, `react-dom`, `fmt`).
    pub module_name: String,
    /// Imported member, for `from m import item` style imports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_item: Option<String>,
    /// Local name the import is bound to, when one is given or implied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_alias: Option<String>,
    pub is_wildcard: bool,
    /// Distributable package the module most likely belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_hint: Option<String>,
    /// Usage identifier key. Absent for wildcards that bind no name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Name of the file the import was found in.
    pub file: String,
    /// 1-based source line.
    pub line: usize,
}

impl Import {
    /// Start a record for `module_name`; finish it with [`Import::finish`].
    pub fn new(module_name: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        Self {
            module_name: module_name.into(),
            module_item: None,
            module_alias: None,
            is_wildcard: false,
            package_hint: None,
            identifier: None,
            file: file.into(),
            line,
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.module_item = Some(item.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.module_alias = Some(alias.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Mark as a wildcard import. Any item is dropped.
    pub fn wildcard(mut self) -> Self {
        self.is_wildcard = true;
        self.module_item = None;
        self
    }

    /// Fill in the derived fields.
    pub fn finish(mut self, package_hint: Option<String>) -> Self {
        self.package_hint = package_hint;
        self.identifier = if self.is_wildcard && self.module_alias.is_none() {
            None
        } else {
            Some(self.usage_key().to_string())
        };
        self
    }

    /// Prefix of the module path up to the first `.`.
    pub fn base_module_name(&self) -> &str {
        base_module_name(&self.module_name)
    }

    /// First non-empty of alias, item and module name.
    pub fn usage_key(&self) -> &str {
        [&self.module_alias, &self.module_item]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(&self.module_name)
    }

    /// `module_item` with a leading `<base>.` removed.
    pub fn item_name(&self) -> Option<&str> {
        let item = self.module_item.as_deref()?;
        let base = self.base_module_name();
        Some(
            item.strip_prefix(base)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(item),
        )
    }
}

/// Base module name of a dotted path.
///
/// Leading dots of a relative module are kept: `..pkg.mod` has base `..pkg`.
pub fn base_module_name(module_name: &str) -> &str {
    let rest = module_name.trim_start_matches('.');
    let prefix_len = module_name.len() - rest.len();
    match rest.find('.') {
        Some(idx) => &module_name[..prefix_len + idx],
        None => module_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_module_name() {
        assert_eq!(base_module_name("os"), "os");
        assert_eq!(base_module_name("os.path"), "os");
        assert_eq!(base_module_name("a.b.c"), "a");
        assert_eq!(base_module_name("."), ".");
        assert_eq!(base_module_name("..pkg.mod"), "..pkg");
        assert_eq!(base_module_name("github.com/x/y"), "github");
    }

    #[test]
    fn test_usage_key_precedence() {
        let plain = Import::new("os", "a.py", 1).finish(None);
        assert_eq!(plain.usage_key(), "os");
        assert_eq!(plain.identifier.as_deref(), Some("os"));

        let item = Import::new("os.path", "a.py", 2).with_item("join").finish(None);
        assert_eq!(item.usage_key(), "join");

        let aliased = Import::new("os.path", "a.py", 3)
            .with_item("join")
            .with_alias("j")
            .finish(None);
        assert_eq!(aliased.usage_key(), "j");
    }

    #[test]
    fn test_wildcard_drops_item_and_identifier() {
        let star = Import::new("math", "a.py", 1)
            .with_item("ignored")
            .wildcard()
            .finish(Some("math".to_string()));
        assert!(star.is_wildcard);
        assert_eq!(star.module_item, None);
        assert_eq!(star.identifier, None);

        let namespace = Import::new("lodash", "a.js", 1)
            .with_alias("_")
            .wildcard()
            .finish(None);
        assert_eq!(namespace.identifier.as_deref(), Some("_"));
    }

    #[test]
    fn test_item_name_strips_base_prefix() {
        let imp = Import::new("xml", "a.py", 1).with_item("xml.dom").finish(None);
        assert_eq!(imp.item_name(), Some("dom"));

        let imp = Import::new("xml", "a.py", 1).with_item("xmlrpc").finish(None);
        assert_eq!(imp.item_name(), Some("xmlrpc"));

        let imp = Import::new("os", "a.py", 1).finish(None);
        assert_eq!(imp.item_name(), None);
    }
}
