//! Scaffold a portfolio project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use folio_static::assembler::{DEFAULT_LOADER_SCRIPT, DEFAULT_SECTIONS};

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing folio...");

    write_file(config_path, DEFAULT_CONFIG, yes)?;
    write_file(Path::new("index.html"), &base_document(DEFAULT_SECTIONS), yes)?;
    write_file(
        Path::new(DEFAULT_LOADER_SCRIPT),
        &loader_script(DEFAULT_SECTIONS),
        yes,
    )?;

    let sections_dir = Path::new("sections");
    fs::create_dir_all(sections_dir).context("Failed to create sections directory")?;
    for section in DEFAULT_SECTIONS {
        let path = sections_dir.join(format!("{}.html", section));
        write_file(&path, &fragment_stub(section), yes)?;
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'folio build' to assemble dist/.");

    Ok(())
}

/// Write `content` unless the file exists and `overwrite` is off.
fn write_file(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());
    Ok(())
}

fn base_document(sections: &[&str]) -> String {
    let placeholders: String = sections
        .iter()
        .map(|s| {
            format!(
                "  <div id=\"{s}-content\">\n    <!-- {s} content will be loaded dynamically -->\n  </div>\n"
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Portfolio</title>
  <meta name="description" content="Personal portfolio" />
</head>
<body>
{placeholders}  <script src="{DEFAULT_LOADER_SCRIPT}"></script>
</body>
</html>
"#
    )
}

/// Browser-side loader used while previewing the unassembled source tree.
fn loader_script(sections: &[&str]) -> String {
    let calls = sections
        .iter()
        .map(|s| format!("    loadSection('{s}-content', 'sections/{s}.html')"))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"// Load sections dynamically
async function loadSection(sectionId, filePath) {{
  try {{
    const response = await fetch(filePath);
    const element = document.getElementById(sectionId);
    if (element) {{
      element.innerHTML = await response.text();
    }}
  }} catch (error) {{
    console.error(`Error loading section ${{sectionId}}:`, error);
  }}
}}

document.addEventListener('DOMContentLoaded', async () => {{
  await Promise.all([
{calls}
  ]);
}});
"#
    )
}

fn fragment_stub(section: &str) -> String {
    format!("<section class=\"{section}\">\n  <h2>{section}</h2>\n</section>\n")
}

const DEFAULT_CONFIG: &str = r#"# Folio Configuration

[site]
# Base document with placeholder regions
base = "index.html"

# One <section>.html fragment per section
sections_dir = "sections"

# Output directory and file name
output = "dist"
output_file = "index.html"

# Loader script stripped from the built page
loader_script = "js/sections.js"

sections = ["hero", "highlights", "about", "skills", "experience", "resume", "target-role", "contact"]

[publish]
# Domain alias file copied verbatim (empty to disable)
alias_file = "CNAME"

[[publish.assets]]
from = "assets"

[[publish.assets]]
from = "images"
"#;
