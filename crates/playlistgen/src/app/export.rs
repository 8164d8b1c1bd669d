//! Playlist rendering and writing.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Result, anyhow};
use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::domain::errors::PipelineError;
use crate::domain::model::FullyQualifiedName;

/// Property name the runner uses to match a test by its normalized full name.
pub const MATCH_PROPERTY: &str = "TestWithNormalizedFullyQualifiedName";

const PLAYLIST_TEMPLATE_NAME: &str = "playlist.xml";

/// Renders playlists and writes them to disk.
pub struct Exporter {
    env: Environment<'static>,
}

impl Exporter {
    /// Create a new exporter with the playlist template loaded.
    pub fn new() -> Result<Self> {
        Ok(Self {
            env: default_environment()?,
        })
    }

    /// Render `names` into the playlist document.
    pub fn render(&self, names: &[FullyQualifiedName]) -> Result<String> {
        let context = TemplateContext {
            property: MATCH_PROPERTY,
            names,
        };
        self.env
            .get_template(PLAYLIST_TEMPLATE_NAME)
            .and_then(|template| template.render(&context))
            .map_err(|err| anyhow!("failed to render playlist: {err}"))
    }

    /// Render `names` and replace `destination` with the result.
    ///
    /// The document is written to a sibling temporary file and renamed into place, so readers
    /// never see a partial playlist. The parent directory must already exist.
    pub fn emit(
        &self,
        names: &[FullyQualifiedName],
        destination: &Path,
    ) -> Result<(), PipelineError> {
        let failure = |reason: String| PipelineError::EmitFailure {
            path: destination.to_path_buf(),
            reason,
        };

        let rendered = self.render(names).map_err(|err| failure(err.to_string()))?;

        let dir = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut staged = NamedTempFile::new_in(dir).map_err(|err| failure(err.to_string()))?;
        write_staged(&mut staged, rendered.as_bytes()).map_err(|err| failure(err.to_string()))?;
        staged
            .persist(destination)
            .map_err(|err| failure(err.error.to_string()))?;

        tracing::debug!(
            path = %destination.display(),
            entries = names.len(),
            "playlist written"
        );
        Ok(())
    }
}

fn write_staged(staged: &mut NamedTempFile, bytes: &[u8]) -> io::Result<()> {
    staged.write_all(bytes)?;
    staged.flush()?;
    staged.as_file().sync_all()
}

fn default_environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    // Values go through the `xml` filter; `.xml` names would otherwise get HTML escaping.
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_filter("xml", xml_escape);
    env.add_template(PLAYLIST_TEMPLATE_NAME, PLAYLIST_TEMPLATE)
        .map_err(|err| anyhow!("failed to register playlist template: {err}"))?;
    Ok(env)
}

/// Escape an attribute value the way XML writers do. `/` and `'` stay as they are.
fn xml_escape(value: String) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\t' => escaped.push_str("&#x9;"),
            '\n' => escaped.push_str("&#xA;"),
            '\r' => escaped.push_str("&#xD;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    property: &'a str,
    names: &'a [FullyQualifiedName],
}

const PLAYLIST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Playlist Version="2.0">
{% if names %}
  <Rule Match="Any">
{% for name in names %}
    <Property Name="{{ property|xml }}" Value="{{ name|xml }}" />
{% endfor %}
  </Rule>
{% else %}
  <Rule Match="Any" />
{% endif %}
</Playlist>
"#;
