//! HTML templates
//!
//! Tera templates are loaded once from the template directory. Pages extend
//! `layouts/main.html`.

use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

/// Loaded template set
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Load every `*.html` under `dir`, named by their path relative to it
    pub fn load(dir: &Path) -> Result<Self> {
        let pattern = dir.join("**").join("*.html");
        let tera = Tera::new(&pattern.to_string_lossy())?;

        let count = tera.get_template_names().count();
        if count == 0 {
            tracing::warn!("No templates found in {}", dir.display());
        } else {
            tracing::info!("Loaded {} templates from {}", count, dir.display());
        }

        Ok(Templates { tera })
    }

    /// Render `name` with the serialized page model as context
    pub fn render<T: Serialize>(&self, name: &str, page: &T) -> Result<String> {
        let context = Context::from_serialize(page)?;
        Ok(self.tera.render(name, &context)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    pub(crate) fn bundled() -> Templates {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
        Templates::load(&dir).unwrap()
    }

    #[test]
    fn test_bundled_templates_load() {
        let templates = bundled();
        let mut names: Vec<&str> = templates.tera.get_template_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec!["home.html", "layouts/main.html", "miniDetail.html", "setDetail.html"]
        );
    }

    #[test]
    fn test_missing_template_is_error() {
        let templates = bundled();
        let err = templates.render("nope.html", &serde_json::json!({}));
        assert!(err.is_err());
    }
}
