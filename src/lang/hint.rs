//! Package hints: which distributable package an imported module comes from.

use lazy_static::lazy_static;
use phf::phf_map;
use regex::Regex;

use super::LanguageCode;

/// Number of path segments that name a module on well-known Go hosts.
static GO_HOST_QUALIFIERS: phf::Map<&'static str, usize> = phf_map! {
    "github.com" => 3,
    "bitbucket.org" => 3,
    "gopkg.in" => 3,
    "golang.org" => 3,
    "gocv.io" => 3,
    "go.etcd.io" => 3,
};

lazy_static! {
    static ref GO_MAJOR_VERSION: Regex = Regex::new(r"^v\d+$").unwrap();
}

/// Derive the package hint for `module_name` in `language`.
pub fn package_hint(language: LanguageCode, module_name: &str) -> Option<String> {
    if module_name.is_empty() {
        return None;
    }
    match language {
        LanguageCode::Python => python_hint(module_name),
        LanguageCode::JavaScript | LanguageCode::TypeScript => javascript_hint(module_name),
        LanguageCode::Go => go_hint(module_name),
        LanguageCode::Java => java_hint(module_name),
    }
}

fn python_hint(module_name: &str) -> Option<String> {
    if module_name.starts_with('.') {
        return None;
    }
    module_name.split('.').next().map(str::to_string)
}

fn javascript_hint(module_name: &str) -> Option<String> {
    if module_name.starts_with('.') {
        return Some(module_name.to_string());
    }

    let trimmed = module_name.trim_matches('/');
    let parts: Vec<&str> = trimmed.split('/').collect();
    if trimmed.starts_with('@') {
        return Some(parts[..parts.len().min(2)].join("/"));
    }
    parts.first().map(|p| p.to_string())
}

fn go_hint(module_name: &str) -> Option<String> {
    let trimmed = module_name.trim_matches('/');
    let parts: Vec<&str> = trimmed.split('/').collect();
    let domain = parts.first()?.trim();

    // Standard library paths have no host.
    if !domain.contains('.') {
        return Some(domain.to_string());
    }

    let qualifiers = GO_HOST_QUALIFIERS.get(domain).copied().unwrap_or(2);
    if parts.len() > qualifiers && GO_MAJOR_VERSION.is_match(parts[qualifiers]) {
        return Some(parts[..=qualifiers].join("/"));
    }
    Some(parts[..parts.len().min(qualifiers)].join("/"))
}

fn java_hint(module_name: &str) -> Option<String> {
    let parts: Vec<&str> = module_name.split('.').collect();
    match parts.first() {
        Some(&"java") | Some(&"jdk") => Some(parts[..parts.len().min(2)].join(".")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(language: LanguageCode, module: &str) -> Option<String> {
        package_hint(language, module)
    }

    #[test]
    fn test_python_hints() {
        assert_eq!(hint(LanguageCode::Python, "os.path").as_deref(), Some("os"));
        assert_eq!(hint(LanguageCode::Python, "yaml").as_deref(), Some("yaml"));
        assert_eq!(hint(LanguageCode::Python, "..pkg"), None);
        assert_eq!(hint(LanguageCode::Python, ""), None);
    }

    #[test]
    fn test_javascript_hints() {
        let js = LanguageCode::JavaScript;
        assert_eq!(hint(js, "express").as_deref(), Some("express"));
        assert_eq!(hint(js, "chalk/ansi-styles").as_deref(), Some("chalk"));
        assert_eq!(
            hint(js, "@gilbarbara/eslint-config/base").as_deref(),
            Some("@gilbarbara/eslint-config")
        );
        assert_eq!(hint(js, "./utils.js").as_deref(), Some("./utils.js"));
        assert_eq!(
            hint(LanguageCode::TypeScript, "../lib/x").as_deref(),
            Some("../lib/x")
        );
    }

    #[test]
    fn test_go_hints() {
        let go = LanguageCode::Go;
        assert_eq!(hint(go, "fmt").as_deref(), Some("fmt"));
        assert_eq!(hint(go, "net/http").as_deref(), Some("net"));
        assert_eq!(
            hint(go, "github.com/spf13/cobra/doc").as_deref(),
            Some("github.com/spf13/cobra")
        );
        assert_eq!(
            hint(go, "github.com/jackc/pgx/v5/pgxpool").as_deref(),
            Some("github.com/jackc/pgx/v5")
        );
        assert_eq!(
            hint(go, "google.golang.org/grpc/codes").as_deref(),
            Some("google.golang.org/grpc")
        );
        assert_eq!(
            hint(go, "k8s.io/client-go/v2/kubernetes").as_deref(),
            Some("k8s.io/client-go/v2")
        );
        assert_eq!(hint(go, "gopkg.in/yaml.v3").as_deref(), Some("gopkg.in/yaml.v3"));
    }

    #[test]
    fn test_java_hints() {
        let java = LanguageCode::Java;
        assert_eq!(hint(java, "java.util.List").as_deref(), Some("java.util"));
        assert_eq!(hint(java, "jdk.internal.misc").as_deref(), Some("jdk.internal"));
        assert_eq!(hint(java, "org.apache.commons.Lang"), None);
    }
}
