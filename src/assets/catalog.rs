use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;

use crate::foundation::core::ImageUri;
use crate::foundation::error::{MemeError, MemeResult};

/// One pickable meme template.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Template {
    pub id: String,
    pub title: String,
    #[serde(alias = "img")]
    pub image_uri: ImageUri,
}

/// Ordered, externally supplied template list. Read-only for the session.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<Template>) -> MemeResult<Self> {
        let catalog = Self { templates };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> MemeResult<()> {
        let mut seen = HashSet::new();
        for t in &self.templates {
            if t.id.trim().is_empty() {
                return Err(MemeError::validation("template id must be non-empty"));
            }
            if !seen.insert(t.id.as_str()) {
                return Err(MemeError::validation(format!(
                    "duplicate template id '{}'",
                    t.id
                )));
            }
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> MemeResult<Self> {
        let catalog: Self = serde_json::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    #[tracing::instrument]
    pub fn from_json_file(path: &Path) -> MemeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read template catalog '{}'", path.display()))?;
        let catalog = Self::from_json_str(&text)?;
        tracing::debug!(count = catalog.len(), "loaded template catalog");
        Ok(catalog)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_in_order_and_accepts_img_alias() {
        let c = TemplateCatalog::from_json_str(
            r#"[
                {"id":"1","title":"Drake","image_uri":"drake.jpg"},
                {"id":"2","title":"Distracted","img":"file:///t/distracted.jpg"}
            ]"#,
        )
        .unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.templates()[0].title, "Drake");
        assert_eq!(c.get("2").unwrap().image_uri.as_str(), "file:///t/distracted.jpg");
        assert!(c.get("3").is_none());
    }

    #[test]
    fn rejects_duplicate_and_empty_ids() {
        let dup = r#"[{"id":"a","title":"x","img":"a"},{"id":"a","title":"y","img":"b"}]"#;
        assert!(matches!(
            TemplateCatalog::from_json_str(dup),
            Err(MemeError::Validation(_))
        ));
        let empty = r#"[{"id":" ","title":"x","img":"a"}]"#;
        assert!(TemplateCatalog::from_json_str(empty).is_err());
        assert!(matches!(
            TemplateCatalog::from_json_str("{"),
            Err(MemeError::Serde(_))
        ));
    }
}
