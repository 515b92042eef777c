//! Settings shared by every expression a language instance compiles.

/// Compilation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Reuse compiled expressions keyed by their source text.
    pub cache_enabled: bool,
    /// Resolve `\n`, `\t`, `\'` and friends inside literal text.
    pub allow_escape: bool,
    /// Nested functions starting with this prefix are static references and
    /// are kept as text when an enclosing function is recomposed.
    pub static_reference_prefix: String,
    /// Functions starting with one of these prefixes take an argument list,
    /// so values spliced into them are quoted.
    pub call_style_prefixes: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            allow_escape: true,
            static_reference_prefix: "type:".to_string(),
            call_style_prefixes: vec!["bean:".to_string(), "method:".to_string()],
        }
    }
}

impl LanguageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_escape(mut self, allow: bool) -> Self {
        self.allow_escape = allow;
        self
    }

    pub fn with_static_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_reference_prefix = prefix.into();
        self
    }

    pub fn with_call_style_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.call_style_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_static_reference(&self, text: &str) -> bool {
        !self.static_reference_prefix.is_empty() && text.starts_with(&self.static_reference_prefix)
    }

    pub fn is_call_style(&self, text: &str) -> bool {
        self.call_style_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
    }
}
