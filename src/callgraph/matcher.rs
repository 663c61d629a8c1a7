//! Matching catalog signatures against the calls in a tree.
//!
//! Callees are resolved through the file's imports into dotted namespaces, so
//! `np.zeros` under `import numpy as np` becomes `numpy.zeros` and Go's
//! `exec.Command` becomes `os/exec.Command`. Only direct calls are looked at;
//! no call graph is built.

use std::collections::BTreeMap;

use phf::{phf_map, phf_set};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tree_sitter::Node;

use super::{ArgumentConstraint, Catalog, LanguageMatcher, MatchStrategy, Signature};
use crate::error::Result;
use crate::fs::{check_cancelled, FileRef};
use crate::lang::query::{line_of, unquote};
use crate::lang::{Import, LanguageCode};
use crate::parser::ParseTree;
use crate::plugin::{Plugin, SupportedLanguages, TreePlugin};

/// Call node kinds mapped to the field holding the callee.
static CALL_NODE_KINDS: phf::Map<&'static str, &'static str> = phf_map! {
    "call" => "function",
    "call_expression" => "function",
    "new_expression" => "constructor",
    "method_invocation" => "name",
};

static STRING_NODE_KINDS: phf::Set<&'static str> = phf_set! {
    "string",
    "template_string",
    "string_literal",
    "interpreted_string_literal",
    "raw_string_literal",
};

/// Namespace of unqualified Python calls that no import binds.
const PYTHON_BUILTINS: &str = "builtins";

const CANCEL_CHECK_INTERVAL: usize = 1024;

/// A call that satisfied one condition of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallEvidence {
    /// Condition value as written in the catalog.
    pub condition: String,
    /// Resolved callee namespace.
    pub namespace: String,
    pub line: usize,
}

/// A signature found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureMatch {
    pub signature: String,
    pub file: String,
    pub language: LanguageCode,
    /// Matching calls ordered by line.
    pub evidence: Vec<CallEvidence>,
}

/// Receives every signature matched in a file.
pub type MatchSink<'a> = dyn FnMut(&FileRef, SignatureMatch) -> Result<()> + 'a;

pub struct SignatureMatcherPlugin<'a> {
    catalog: &'a Catalog,
    sink: Box<MatchSink<'a>>,
}

impl<'a> SignatureMatcherPlugin<'a> {
    pub const NAME: &'static str = "signature-matcher";

    pub fn new(
        catalog: &'a Catalog,
        sink: impl FnMut(&FileRef, SignatureMatch) -> Result<()> + 'a,
    ) -> Self {
        Self {
            catalog,
            sink: Box::new(sink),
        }
    }
}

impl Plugin for SignatureMatcherPlugin<'_> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn supported_languages(&self) -> SupportedLanguages {
        SupportedLanguages::Only(
            LanguageCode::ALL
                .into_iter()
                .filter(|code| !self.catalog.for_language(*code).is_empty())
                .collect(),
        )
    }

    fn as_tree_plugin(&mut self) -> Option<&mut dyn TreePlugin> {
        Some(self)
    }
}

impl TreePlugin for SignatureMatcherPlugin<'_> {
    fn analyze_tree(&mut self, cancel: &CancellationToken, tree: &ParseTree) -> Result<()> {
        let code = tree.language().code();
        let catalog = self.catalog;
        let signatures = catalog.for_language(code);
        if signatures.is_empty() {
            return Ok(());
        }

        let imports = tree.language().resolvers().resolve_imports(tree)?;
        let scope = Scope::new(code, &imports);
        let calls = scope.call_sites(cancel, tree)?;
        tracing::debug!(file = tree.file().name(), calls = calls.len(), "call sites collected");

        for signature in signatures {
            let Some(matcher) = signature.matcher(code) else {
                continue;
            };
            if let Some(found) = evaluate(signature, matcher, &calls, tree.file().name(), code) {
                (self.sink)(tree.file(), found)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Argument {
    Literal(String),
    Namespace(String),
    Other,
}

#[derive(Debug, Clone)]
struct CallSite {
    namespace: String,
    arguments: Vec<Argument>,
    line: usize,
}

/// Names bound by a file's imports.
struct Scope {
    language: LanguageCode,
    bindings: BTreeMap<String, String>,
}

impl Scope {
    fn new(language: LanguageCode, imports: &[Import]) -> Self {
        let bindings = imports
            .iter()
            .filter_map(|import| Some((import.identifier.clone()?, import_target(import))))
            .collect();
        Self { language, bindings }
    }

    /// Rewrite the longest bound prefix of `dotted` to its import target.
    fn resolve(&self, dotted: &str) -> String {
        let segments: Vec<&str> = dotted.split('.').collect();
        for end in (1..=segments.len()).rev() {
            if let Some(target) = self.bindings.get(&segments[..end].join(".")) {
                let mut namespace = target.clone();
                for rest in &segments[end..] {
                    namespace.push('.');
                    namespace.push_str(rest);
                }
                return namespace;
            }
        }

        if self.language == LanguageCode::Python && segments.len() == 1 {
            return format!("{PYTHON_BUILTINS}.{dotted}");
        }
        dotted.to_string()
    }

    fn call_sites(&self, cancel: &CancellationToken, tree: &ParseTree) -> Result<Vec<CallSite>> {
        let mut calls = Vec::new();
        let mut cursor = tree.root_node().walk();
        let mut visited = 0usize;

        loop {
            visited += 1;
            if visited % CANCEL_CHECK_INTERVAL == 0 {
                check_cancelled(cancel)?;
            }

            let node = cursor.node();
            if let Some(callee) = callee(tree, node) {
                calls.push(CallSite {
                    namespace: self.resolve(&callee),
                    arguments: self.arguments(tree, node),
                    line: line_of(node),
                });
            }

            if cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    return Ok(calls);
                }
            }
        }
    }

    fn arguments(&self, tree: &ParseTree, call: Node<'_>) -> Vec<Argument> {
        let Some(list) = call.child_by_field_name("arguments") else {
            return Vec::new();
        };
        let mut cursor = list.walk();
        list.named_children(&mut cursor)
            .filter(|arg| arg.kind() != "comment")
            .map(|arg| self.argument(tree, arg))
            .collect()
    }

    fn argument(&self, tree: &ParseTree, node: Node<'_>) -> Argument {
        // Python `Loader=yaml.Loader`
        let value = if node.kind() == "keyword_argument" {
            match node.child_by_field_name("value") {
                Some(value) => value,
                None => return Argument::Other,
            }
        } else {
            node
        };

        if STRING_NODE_KINDS.contains(value.kind()) {
            return Argument::Literal(unquote(tree.node_text(value)).to_string());
        }
        match dotted(tree.node_text(value)) {
            Some(path) => Argument::Namespace(self.resolve(&path)),
            None => Argument::Other,
        }
    }
}

fn import_target(import: &Import) -> String {
    match &import.module_item {
        Some(item) if import.module_name.ends_with('.') => format!("{}{item}", import.module_name),
        Some(item) => format!("{}.{item}", import.module_name),
        None => import.module_name.clone(),
    }
}

/// Dotted callee text of a call node, if the callee is a plain name path.
fn callee(tree: &ParseTree, node: Node<'_>) -> Option<String> {
    let field = *CALL_NODE_KINDS.get(node.kind())?;
    let target = tree.node_text(node.child_by_field_name(field)?);

    // Java keeps the receiver apart from the method name.
    if node.kind() == "method_invocation" {
        return match node.child_by_field_name("object") {
            Some(object) => dotted(&format!("{}.{target}", tree.node_text(object))),
            None => dotted(target),
        };
    }
    dotted(target)
}

/// `a.b.c` with whitespace removed, or `None` for anything that is not a
/// chain of identifiers.
fn dotted(text: &str) -> Option<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let valid = !compact.is_empty()
        && compact.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        });
    valid.then_some(compact)
}

fn satisfies(constraint: &ArgumentConstraint, arguments: &[Argument]) -> bool {
    if constraint.values.is_empty() && constraint.resolves_to.is_empty() {
        return true;
    }
    match arguments.get(constraint.index) {
        Some(Argument::Literal(value)) => constraint.values.contains(value),
        Some(Argument::Namespace(namespace)) => constraint.resolves_to.contains(namespace),
        _ => false,
    }
}

fn evaluate(
    signature: &Signature,
    matcher: &LanguageMatcher,
    calls: &[CallSite],
    file: &str,
    language: LanguageCode,
) -> Option<SignatureMatch> {
    let mut evidence = Vec::new();
    let mut matched_conditions = 0;

    for condition in &matcher.conditions {
        let before = evidence.len();
        evidence.extend(
            calls
                .iter()
                .filter(|call| condition.matches_namespace(&call.namespace))
                .filter(|call| condition.args.iter().all(|c| satisfies(c, &call.arguments)))
                .map(|call| CallEvidence {
                    condition: condition.value.clone(),
                    namespace: call.namespace.clone(),
                    line: call.line,
                }),
        );
        if evidence.len() > before {
            matched_conditions += 1;
        }
    }

    let matched = match matcher.strategy {
        MatchStrategy::Any => matched_conditions > 0,
        MatchStrategy::All => matched_conditions > 0 && matched_conditions == matcher.conditions.len(),
    };
    if !matched {
        return None;
    }

    evidence.sort_by_key(|e| e.line);
    Some(SignatureMatch {
        signature: signature.id.clone(),
        file: file.to_string(),
        language,
        evidence,
    })
}
