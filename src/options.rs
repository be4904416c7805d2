//! Factory configuration.

/// Options shared by the injector factories.
///
/// ```
/// use injector::InjectorOptions;
///
/// let options = InjectorOptions::default().with_name_prefix("Ctor");
/// assert_eq!(options.name_prefix(), "Ctor");
/// assert!(options.tag_names());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectorOptions {
    /// Prefix of every synthesized injector name
    name_prefix: String,
    /// Append a unique tag to each name
    tag_names: bool,
}

/// Default prefix for injector names.
pub const DEFAULT_NAME_PREFIX: &str = "DynamicInjector";

impl Default for InjectorOptions {
    fn default() -> Self {
        Self {
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            tag_names: true,
        }
    }
}

impl InjectorOptions {
    /// Set the name prefix.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Enable or disable unique name tags. Untagged injectors are all named
    /// after the bare prefix.
    pub fn with_tag_names(mut self, tag_names: bool) -> Self {
        self.tag_names = tag_names;
        self
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn tag_names(&self) -> bool {
        self.tag_names
    }
}
