//! Import specifier normalization.
//!
//! Maps a raw module specifier to the package that provides it, or to
//! nothing when the specifier does not name an installable package.

/// Modules shipped with the Node.js runtime, sub-path modules included.
const NODE_BUILTINS: &[&str] = &[
    "_http_agent",
    "_http_client",
    "_http_common",
    "_http_incoming",
    "_http_outgoing",
    "_http_server",
    "_stream_duplex",
    "_stream_passthrough",
    "_stream_readable",
    "_stream_transform",
    "_stream_wrap",
    "_stream_writable",
    "_tls_common",
    "_tls_wrap",
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "inspector/promises",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Returns true if `specifier` names a runtime built-in module.
///
/// `node:`-prefixed specifiers are always built-ins, including the ones
/// only reachable through the prefix (`node:test`).
pub fn is_builtin(specifier: &str) -> bool {
    specifier.starts_with("node:") || NODE_BUILTINS.binary_search(&specifier).is_ok()
}

/// Returns true if `specifier` is a relative or absolute path.
pub fn is_path(specifier: &str) -> bool {
    specifier.starts_with('.') || specifier.starts_with('/')
}

/// Reduces a specifier to its package root.
///
/// Returns `@scope/name` or `name`, dropping any sub-path. Relative and
/// absolute paths, built-ins, package-internal `#imports` and URL-like
/// specifiers (`https:`, `virtual:`) yield `None`, as does a scope without a
/// package name.
///
/// # Example
///
/// ```
/// use ghost_imports::analysis::package_root;
///
/// assert_eq!(package_root("lodash/fp"), Some("lodash"));
/// assert_eq!(package_root("@tanstack/react-query/devtools"), Some("@tanstack/react-query"));
/// assert_eq!(package_root("./utils"), None);
/// assert_eq!(package_root("fs/promises"), None);
/// ```
pub fn package_root(specifier: &str) -> Option<&str> {
    if specifier.is_empty() || is_path(specifier) || specifier.starts_with('#') {
        return None;
    }

    if is_builtin(specifier) {
        return None;
    }

    let first_segment = specifier.split('/').next().unwrap_or(specifier);
    if first_segment.contains(':') {
        return None;
    }

    if let Some(scoped) = specifier.strip_prefix('@') {
        let mut parts = scoped.splitn(3, '/');
        let scope = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if scope.is_empty() || name.is_empty() {
            return None;
        }
        return Some(&specifier[..1 + scope.len() + 1 + name.len()]);
    }

    Some(first_segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_table_is_sorted() {
        let mut sorted = NODE_BUILTINS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, NODE_BUILTINS);
    }

    #[test]
    fn test_is_builtin() {
        assert!(is_builtin("fs"));
        assert!(is_builtin("fs/promises"));
        assert!(is_builtin("node:path"));
        assert!(is_builtin("node:test"));
        assert!(!is_builtin("lodash"));
        assert!(!is_builtin("fs-extra"));
    }

    #[test]
    fn test_package_root_simple() {
        assert_eq!(package_root("react"), Some("react"));
        assert_eq!(package_root("lodash/debounce"), Some("lodash"));
        assert_eq!(package_root("lodash/fp/map"), Some("lodash"));
    }

    #[test]
    fn test_package_root_scoped() {
        assert_eq!(package_root("@babel/core"), Some("@babel/core"));
        assert_eq!(
            package_root("@tanstack/react-query/devtools"),
            Some("@tanstack/react-query")
        );
        assert_eq!(package_root("@scope"), None);
        assert_eq!(package_root("@scope/"), None);
        assert_eq!(package_root("@/components"), None);
    }

    #[test]
    fn test_package_root_rejects_non_packages() {
        assert_eq!(package_root("./utils"), None);
        assert_eq!(package_root("../lib/a"), None);
        assert_eq!(package_root("/abs/path"), None);
        assert_eq!(package_root(""), None);
        assert_eq!(package_root("#internal/util"), None);
        assert_eq!(package_root("https://cdn.example.com/x.js"), None);
        assert_eq!(package_root("virtual:module"), None);
    }

    #[test]
    fn test_package_root_builtins() {
        assert_eq!(package_root("fs"), None);
        assert_eq!(package_root("node:fs/promises"), None);
        assert_eq!(package_root("child_process"), None);
    }

    #[test]
    fn test_single_character_package() {
        assert_eq!(package_root("q"), Some("q"));
        assert_eq!(package_root("q/lib"), Some("q"));
    }
}
