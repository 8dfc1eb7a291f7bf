//! JSON class indexes.
//!
//! A class index is a JSON array of [`ClassInfo`] records.

use std::io::{Read, Write};

use thiserror::Error;

use super::{ClassInfo, StaticClassProvider};

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("malformed class index: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StaticClassProvider {
    pub fn from_json_str(json: &str) -> Result<Self, InterchangeError> {
        let classes: Vec<ClassInfo> = serde_json::from_str(json)?;
        Ok(Self::from_classes(classes))
    }

    pub fn from_json_reader(reader: impl Read) -> Result<Self, InterchangeError> {
        let classes: Vec<ClassInfo> = serde_json::from_reader(reader)?;
        Ok(Self::from_classes(classes))
    }

    /// Write the index sorted by class name.
    pub fn to_json_writer(&self, writer: impl Write) -> Result<(), InterchangeError> {
        let mut classes: Vec<&ClassInfo> = self.classes().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        serde_json::to_writer_pretty(writer, &classes)?;
        Ok(())
    }

    fn from_classes(classes: Vec<ClassInfo>) -> Self {
        let mut provider = Self::new();
        for info in classes {
            provider.insert(info);
        }
        provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::external::ClassInfoProvider;

    #[test]
    fn test_load_minimal_index() {
        let json = r#"[
            { "name": "com.acme.Widget", "superclass": "java.lang.Object",
              "methods": [ { "name": "spin", "parameters": ["int"], "return_type": "void" } ] }
        ]"#;
        let provider = StaticClassProvider::from_json_str(json).unwrap();
        let widget = provider.lookup("com.acme.Widget").unwrap();
        assert_eq!(widget.methods[0].name, "spin");
        assert!(widget.methods[0].exceptions.is_empty());
        assert!(provider.is_package("com.acme"));
    }

    #[test]
    fn test_write_then_read_keeps_classes() {
        let original = StaticClassProvider::new().with(ClassInfo::interface("x.Y").method("go", &[], "void"));
        let mut buffer = Vec::new();
        original.to_json_writer(&mut buffer).unwrap();
        let loaded = StaticClassProvider::from_json_reader(buffer.as_slice()).unwrap();
        assert_eq!(loaded.lookup("x.Y"), original.lookup("x.Y"));
    }

    #[test]
    fn test_malformed_index_is_an_error() {
        assert!(matches!(
            StaticClassProvider::from_json_str("{"),
            Err(InterchangeError::Json(_))
        ));
    }
}
