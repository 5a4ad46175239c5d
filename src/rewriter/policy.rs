//! Content-Security-Policy template.

use crate::rewriter::Nonce;

/// Third-party script origin allowed alongside nonce-bearing scripts.
pub const DEFAULT_SCRIPT_ALLOW_ORIGIN: &str = "https://challenges.cloudflare.com";

/// Strict, nonce-based policy: same-origin defaults, nonce + `strict-dynamic`
/// for scripts, no plugins, and forced HTTPS upgrades.
#[derive(Debug, Clone)]
pub struct CspPolicy {
    script_allow_origin: String,
}

impl CspPolicy {
    pub fn new(script_allow_origin: impl Into<String>) -> Self {
        Self {
            script_allow_origin: script_allow_origin.into(),
        }
    }

    /// Render the header value for one response.
    pub fn render(&self, nonce: &Nonce) -> String {
        format!(
            "default-src 'self'; script-src 'nonce-{nonce}' 'strict-dynamic' {origin}; object-src 'none'; upgrade-insecure-requests;",
            origin = self.script_allow_origin,
        )
    }
}

impl Default for CspPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_ALLOW_ORIGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_template() {
        let nonce = Nonce::generate().unwrap();
        let value = CspPolicy::default().render(&nonce);

        assert_eq!(
            value,
            format!(
                "default-src 'self'; script-src 'nonce-{}' 'strict-dynamic' https://challenges.cloudflare.com; object-src 'none'; upgrade-insecure-requests;",
                nonce.as_str()
            )
        );
    }

    #[test]
    fn custom_allow_origin() {
        let nonce = Nonce::generate().unwrap();
        let policy = CspPolicy::new("https://scripts.example.com");

        let value = policy.render(&nonce);
        assert!(value.contains("'strict-dynamic' https://scripts.example.com;"));
        assert!(!value.contains("challenges.cloudflare.com"));
    }
}
