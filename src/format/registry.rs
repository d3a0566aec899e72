use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::debug;

use super::core::{JsonFormat, OutputFormat, TextFormat};

/// Slug used when a request carries no format suffix.
pub const DEFAULT_FORMAT: &str = "JSON";

/// Read-only table of output formats keyed by upper-case slug.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn OutputFormat>>,
    default_slug: String,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut slugs: Vec<&String> = self.formats.keys().collect();
        slugs.sort();
        f.debug_struct("FormatRegistry")
            .field("formats", &slugs)
            .field("default", &self.default_slug)
            .finish()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FormatRegistry {
    #[must_use]
    pub fn builder() -> FormatRegistryBuilder {
        FormatRegistryBuilder::new()
    }

    /// `JSON` and `TEXT` (plus the `TXT` alias), defaulting to `JSON`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let json: Arc<dyn OutputFormat> = Arc::new(JsonFormat);
        let text: Arc<dyn OutputFormat> = Arc::new(TextFormat);
        let mut formats = HashMap::new();
        formats.insert("JSON".to_string(), json);
        formats.insert("TEXT".to_string(), Arc::clone(&text));
        formats.insert("TXT".to_string(), text);
        Self {
            formats,
            default_slug: DEFAULT_FORMAT.to_string(),
        }
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<Arc<dyn OutputFormat>> {
        self.formats.get(&slug.to_ascii_uppercase()).cloned()
    }

    #[must_use]
    pub fn contains(&self, slug: &str) -> bool {
        self.formats.contains_key(&slug.to_ascii_uppercase())
    }

    #[must_use]
    pub fn default_slug(&self) -> &str {
        &self.default_slug
    }

    /// The default format. Always registered; enforced by the builder.
    #[must_use]
    pub fn default_format(&self) -> Arc<dyn OutputFormat> {
        match self.formats.get(&self.default_slug) {
            Some(f) => Arc::clone(f),
            None => Arc::new(JsonFormat),
        }
    }

    /// Registered format, or the default one for unknown slugs.
    #[must_use]
    pub fn get_or_default(&self, slug: &str) -> Arc<dyn OutputFormat> {
        self.get(slug).unwrap_or_else(|| self.default_format())
    }

    /// All registered slugs, sorted.
    #[must_use]
    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.formats.keys().cloned().collect();
        slugs.sort();
        slugs
    }
}

/// Builds a [`FormatRegistry`] in priority layers: base, module, application.
pub struct FormatRegistryBuilder {
    base: Vec<Arc<dyn OutputFormat>>,
    modules: Vec<Arc<dyn OutputFormat>>,
    app: Vec<Arc<dyn OutputFormat>>,
    aliases: Vec<(String, String)>,
    default_slug: String,
}

impl Default for FormatRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistryBuilder {
    /// Starts with the base set (`JSON`, `TEXT`) and the `TXT` alias.
    #[must_use]
    pub fn new() -> Self {
        let json: Arc<dyn OutputFormat> = Arc::new(JsonFormat);
        let text: Arc<dyn OutputFormat> = Arc::new(TextFormat);
        Self {
            base: vec![json, text],
            modules: Vec::new(),
            app: Vec::new(),
            aliases: vec![("TXT".to_string(), "TEXT".to_string())],
            default_slug: DEFAULT_FORMAT.to_string(),
        }
    }

    /// Format contributed by an installed module.
    #[must_use]
    pub fn module_format(mut self, format: Arc<dyn OutputFormat>) -> Self {
        self.modules.push(format);
        self
    }

    /// Format contributed by the application; overrides module formats.
    #[must_use]
    pub fn app_format(mut self, format: Arc<dyn OutputFormat>) -> Self {
        self.app.push(format);
        self
    }

    /// Make `alias` select the same renderer as `target`.
    #[must_use]
    pub fn alias(mut self, alias: &str, target: &str) -> Self {
        self.aliases
            .push((alias.to_ascii_uppercase(), target.to_ascii_uppercase()));
        self
    }

    #[must_use]
    pub fn default_slug(mut self, slug: &str) -> Self {
        self.default_slug = slug.to_ascii_uppercase();
        self
    }

    /// Fails when the default slug is not registered.
    pub fn build(self) -> Result<FormatRegistry> {
        let mut formats: HashMap<String, Arc<dyn OutputFormat>> = HashMap::new();
        for (layer, list) in [("base", self.base), ("module", self.modules), ("app", self.app)] {
            for format in list {
                let slug = format.slug().to_ascii_uppercase();
                if formats.insert(slug.clone(), format).is_some() {
                    debug!(slug = %slug, layer = layer, "Output format overridden");
                }
            }
        }
        for (alias, target) in self.aliases {
            if let Some(format) = formats.get(&target).cloned() {
                formats.entry(alias).or_insert(format);
            }
        }
        if !formats.contains_key(&self.default_slug) {
            bail!(
                "default output format \"{}\" is not registered",
                self.default_slug
            );
        }
        Ok(FormatRegistry {
            formats,
            default_slug: self.default_slug,
        })
    }
}
