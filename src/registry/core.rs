use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::controller::{Controller, ControllerDescriptor};
use crate::error::DiscoveryError;
use crate::format::{FormatRegistry, OutputFormat};

/// Namespace owned by the application itself.
pub const APP_NAMESPACE: &str = "app";

/// API metadata of one installed module.
#[derive(Clone, Default)]
pub struct ModuleManifest {
    slug: String,
    namespace: Option<String>,
    controller_map: Vec<(String, String)>,
    controllers: Vec<ControllerDescriptor>,
    formats: Vec<Arc<dyn OutputFormat>>,
}

impl fmt::Debug for ModuleManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleManifest")
            .field("slug", &self.slug)
            .field("namespace", &self.namespace)
            .field("controller_map", &self.controller_map)
            .field("controllers", &self.controllers)
            .field("formats", &self.formats.iter().map(|f| f.slug()).collect::<Vec<_>>())
            .finish()
    }
}

impl ModuleManifest {
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Self::default()
        }
    }

    /// Manifest of the application; its namespace is always `app`.
    #[must_use]
    pub fn app() -> Self {
        Self::new(APP_NAMESPACE).namespace(APP_NAMESPACE)
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn controller<C: Controller>(mut self) -> Self {
        self.controllers.push(ControllerDescriptor::of::<C>());
        self
    }

    #[must_use]
    pub fn controller_descriptor(mut self, descriptor: ControllerDescriptor) -> Self {
        self.controllers.push(descriptor);
        self
    }

    /// Expose controller `target` under `alias` only.
    #[must_use]
    pub fn remap(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.controller_map.push((alias.into(), target.into()));
        self
    }

    /// Output format contributed by this module.
    #[must_use]
    pub fn format(mut self, format: Arc<dyn OutputFormat>) -> Self {
        self.formats.push(format);
        self
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Declared namespace; empty strings count as undeclared.
    #[must_use]
    pub fn declared_namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    #[must_use]
    pub fn controllers(&self) -> &[ControllerDescriptor] {
        &self.controllers
    }
}

/// Controllers registered under one namespace.
#[derive(Debug, Clone)]
pub struct Namespace {
    name: String,
    owner: String,
    /// Keyed by lower-cased controller name
    controllers: HashMap<String, ControllerDescriptor>,
    controller_map: Vec<(String, String)>,
}

impl Namespace {
    fn from_manifest(name: &str, manifest: ModuleManifest) -> Result<Self, DiscoveryError> {
        let mut controllers = HashMap::with_capacity(manifest.controllers.len());
        for descriptor in manifest.controllers {
            let controller = descriptor.name();
            if controllers
                .insert(controller.to_ascii_lowercase(), descriptor)
                .is_some()
            {
                return Err(DiscoveryError::DuplicateController {
                    namespace: name.to_string(),
                    controller: controller.to_string(),
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            owner: manifest.slug,
            controllers,
            controller_map: manifest.controller_map,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slug of the module that owns this namespace
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Apply the controller map to a requested name.
    ///
    /// `None` when `requested` is the target of a mapping and so may only be
    /// reached through its alias. Entries mapping a name onto itself block
    /// nothing.
    #[must_use]
    pub fn remap<'a>(&'a self, requested: &'a str) -> Option<&'a str> {
        let mut name = requested;
        if let Some((_, target)) = self
            .controller_map
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(requested))
        {
            name = target.as_str();
        }
        let blocked = self
            .controller_map
            .iter()
            .any(|(alias, target)| {
                target.eq_ignore_ascii_case(requested) && !alias.eq_ignore_ascii_case(target)
            });
        if blocked {
            debug!(namespace = %self.name, requested, "Canonical controller name requested directly");
            return None;
        }
        Some(name)
    }

    /// Resolve a requested controller name (case-insensitive).
    #[must_use]
    pub fn resolve(&self, requested: &str) -> Option<&ControllerDescriptor> {
        let name = self.remap(requested)?;
        self.controllers.get(&name.to_ascii_lowercase())
    }
}

/// Process-wide namespace table, read-only after discovery.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTable {
    namespaces: HashMap<String, Namespace>,
}

impl NamespaceTable {
    /// Namespace by exact (case-sensitive) name.
    #[must_use]
    pub fn get(&self, namespace: &str) -> Option<&Namespace> {
        self.namespaces.get(namespace)
    }

    /// Controller for the `{module}/{controller}` segments of a request.
    #[must_use]
    pub fn resolve(&self, namespace: &str, controller: &str) -> Option<&ControllerDescriptor> {
        self.get(namespace)?.resolve(controller)
    }

    /// Namespace names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.namespaces.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

/// Build the namespace table from the application manifest and the
/// manifests of installed modules.
///
/// # Errors
///
/// Any [`DiscoveryError`]; these are configuration errors and should stop
/// the process.
pub fn discover(
    app: Option<ModuleManifest>,
    modules: Vec<ModuleManifest>,
) -> Result<NamespaceTable, DiscoveryError> {
    let mut namespaces: HashMap<String, Namespace> = HashMap::new();

    if let Some(app) = app {
        let ns = Namespace::from_manifest(APP_NAMESPACE, app)?;
        namespaces.insert(APP_NAMESPACE.to_string(), ns);
    }

    for module in modules {
        let Some(name) = module.declared_namespace().map(str::to_string) else {
            if module.controllers.is_empty() {
                continue;
            }
            return Err(DiscoveryError::MissingNamespace {
                module: module.slug,
            });
        };
        if let Some(existing) = namespaces.get(&name) {
            return Err(DiscoveryError::NamespaceConflict {
                namespace: name,
                module: module.slug,
                existing: existing.owner.clone(),
            });
        }
        let ns = Namespace::from_manifest(&name, module)?;
        debug!(namespace = %name, owner = %ns.owner, controllers = ns.controller_count(), "API namespace registered");
        namespaces.insert(name, ns);
    }

    info!(namespaces = namespaces.len(), "API namespaces discovered");
    Ok(NamespaceTable { namespaces })
}

/// Build the format registry from the base set, module formats and
/// application formats, in increasing priority.
///
/// # Errors
///
/// When `default_slug` names no registered format.
pub fn build_formats(
    app: Option<&ModuleManifest>,
    modules: &[ModuleManifest],
    default_slug: &str,
) -> anyhow::Result<FormatRegistry> {
    let mut builder = FormatRegistry::builder().default_slug(default_slug);
    for module in modules {
        for format in &module.formats {
            builder = builder.module_format(Arc::clone(format));
        }
    }
    if let Some(app) = app {
        for format in &app.formats {
            builder = builder.app_format(Arc::clone(format));
        }
    }
    builder.build()
}
