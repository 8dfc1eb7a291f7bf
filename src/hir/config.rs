//! Analysis settings.

use smol_str::SmolStr;

/// Settings read by the finishing pass and the workspace loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Packages imported into every class.
    pub auto_imports: Vec<SmolStr>,
    /// Simple name of the superclass given to classes without `extends`.
    /// Interfaces never get one.
    pub default_superclass: SmolStr,
    /// Extensions of the files the loader picks up.
    pub extensions: Vec<SmolStr>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            auto_imports: vec![SmolStr::new("java.lang")],
            default_superclass: SmolStr::new("Object"),
            extensions: vec![SmolStr::new("java")],
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_imports<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.auto_imports = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_superclass(mut self, name: impl Into<SmolStr>) -> Self {
        self.default_superclass = name.into();
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the loader should pick up a file with this extension.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.auto_imports, vec![SmolStr::new("java.lang")]);
        assert_eq!(config.default_superclass, "Object");
        assert!(config.accepts_extension("java"));
        assert!(!config.accepts_extension("class"));
    }

    #[test]
    fn test_builders_replace_values() {
        let config = AnalysisConfig::new()
            .with_auto_imports(["java.lang", "java.util"])
            .with_extensions(["java", "jav"]);
        assert_eq!(config.auto_imports.len(), 2);
        assert!(config.accepts_extension("jav"));
    }
}
