//! Shared pattern sets and fixed keyword lists used by the detectors.
//!
//! Everything here is a named constant so the detector contracts can be
//! audited (and pinned by tests) in one place.

use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Configuration file name searched for in the project root.
pub const CONFIG_FILENAME: &str = ".pyaudit.toml";

/// Keywords that mark an assignment target as sensitive when contained in
/// its lowercased name.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key",
    "api_key",
    "access_token",
    "secret_key",
];

/// Keywords that additionally tag a sensitive variable as API-key shaped.
pub const API_KEY_KEYWORDS: &[&str] = &["api_key", "access_token"];

/// Member names whose calls are treated as SQL execution sinks.
pub const SQL_SINK_MEMBERS: &[&str] = &["execute", "executemany", "raw"];

/// Member names whose calls are treated as template-render sinks.
pub const RENDER_MEMBERS: &[&str] = &["render", "render_to_string"];

/// Call names treated as direct response construction.
pub const RESPONSE_CONSTRUCTORS: &[&str] = &["HttpResponse", "Response"];

/// Dotted call paths flagged as weak hashing/encryption primitives.
pub const WEAK_CRYPTO_CALLS: &[&str] = &[
    "hashlib.md5",
    "hashlib.sha1",
    "Crypto.Cipher.DES.new",
    "Crypto.Cipher.ARC4.new",
];

/// Dotted call paths flagged as (reviewable) strong hashing/encryption primitives.
pub const STRONG_CRYPTO_CALLS: &[&str] = &[
    "hashlib.sha256",
    "hashlib.sha512",
    "hashlib.new",
    "hmac.new",
    "bcrypt.hashpw",
    "bcrypt.gensalt",
    "cryptography.fernet.Fernet",
    "Crypto.Cipher.AES.new",
    "pycryptodome.Cipher",
    "pycryptodome.Encrypt",
    "pycryptodome.Decrypt",
];

/// Decorator names recognized as CSRF protection.
///
/// `csrf_exempt` is deliberately absent: it turns protection off, so an
/// exempted state-changing view must still be flagged.
pub fn csrf_decorators() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert("csrf_protect");
        s.insert("requires_csrf_token");
        s.insert("ensure_csrf_cookie");
        s
    })
}

/// Member names whose calls mark a function body as state-changing HTTP usage.
pub const STATE_CHANGING_MEMBERS: &[&str] = &["post", "put", "delete"];

/// Call names recognized as authorization checks inside a conditional block.
pub const AUTHORIZATION_CALLS: &[&str] = &["has_permission", "has_role", "is_authenticated"];

/// Attribute names whose dereference marks a conditional block as
/// request/user handling.
pub const REQUEST_ATTRIBUTES: &[&str] = &["user", "request"];

/// Call names recognized as input validation.
pub const VALIDATION_CALLS: &[&str] = &["validate", "clean", "sanitize"];

/// Parameter names that mark a decorated function as an HTTP endpoint
/// receiving external input.
pub const REQUEST_PARAMETERS: &[&str] = &["request", "query_params"];

/// Regex matching decorator names that mark a function as an HTTP endpoint.
///
/// Covers Django (`require_http_methods`, `require_GET`, ...), DRF
/// (`api_view`, `action`) and Flask/FastAPI routing members
/// (`app.route`, `app.get`, ...).
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn http_decorator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"(?x)^(
            api_view |
            action |
            route |
            get | post | put | delete | patch |
            require_http_methods |
            require_GET | require_POST | require_safe
        )$")
        .expect("Invalid HTTP decorator regex pattern")
    })
}

/// Default folder names excluded from the file walk.
pub fn default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        for folder in [
            ".git",
            ".venv",
            "venv",
            "env",
            "__pycache__",
            "node_modules",
            "build",
            "dist",
            ".tox",
            ".mypy_cache",
            ".pytest_cache",
        ] {
            s.insert(folder);
        }
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_decorator_regex_matches_common_names() {
        let re = http_decorator_re();
        for name in ["api_view", "route", "post", "require_http_methods"] {
            assert!(re.is_match(name), "expected match for {name}");
        }
        assert!(!re.is_match("login_required"));
    }
}
