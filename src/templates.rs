use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Handlebars templates read from `dir` on every render, so edits show up
/// without a restart and a missing file is a per-request error.
pub struct Templates {
    dir: PathBuf,
    hbs: Handlebars<'static>,
}

impl Templates {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(false);
        Self {
            dir: dir.as_ref().to_path_buf(),
            hbs,
        }
    }

    pub async fn render<T: Serialize>(&self, name: &str, data: &T) -> AppResult<String> {
        let path = self.dir.join(name);
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::Template(format!("{}: {}", path.display(), e)))?;
        self.hbs
            .render_template(&source, data)
            .map_err(|e| AppError::Template(format!("{name}: {e}")))
    }
}
