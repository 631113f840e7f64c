//! Fragment substitution into the base document.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::builder::BuildError;

/// Script tag source of the in-browser section loader.
pub const DEFAULT_LOADER_SCRIPT: &str = "js/sections.js";

/// Sections of the portfolio page, in substitution order.
pub const DEFAULT_SECTIONS: &[&str] = &[
    "hero",
    "highlights",
    "about",
    "skills",
    "experience",
    "resume",
    "target-role",
    "contact",
];

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->\s*").expect("Invalid comment regex"));

static DYNAMIC_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)loaded dynamically").expect("Invalid phrase regex"));

/// Source of fragment text keyed by section name.
pub trait FragmentSource {
    /// Load the fragment for a section.
    fn load(&self, section: &str) -> Result<String, BuildError>;
}

/// Fragments stored as `<dir>/<section>.html`.
#[derive(Debug, Clone)]
pub struct FragmentDir {
    dir: PathBuf,
}

impl FragmentDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the fragment file for a section.
    pub fn path_for(&self, section: &str) -> PathBuf {
        self.dir.join(format!("{}.html", section))
    }
}

impl FragmentSource for FragmentDir {
    fn load(&self, section: &str) -> Result<String, BuildError> {
        let path = self.path_for(section);
        fs::read_to_string(&path).map_err(|source| BuildError::MissingFragment {
            section: section.to_string(),
            path,
            source,
        })
    }
}

impl FragmentSource for HashMap<String, String> {
    fn load(&self, section: &str) -> Result<String, BuildError> {
        self.get(section)
            .cloned()
            .ok_or_else(|| BuildError::MissingFragment {
                section: section.to_string(),
                path: PathBuf::from(section),
                source: io::Error::new(io::ErrorKind::NotFound, "no fragment registered"),
            })
    }
}

/// Output of a successful assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    /// Composed document
    pub html: String,

    /// Sections whose placeholder was found and filled
    pub substituted: Vec<String>,
}

/// Substitutes fragments into placeholder regions and strips the dynamic loader.
#[derive(Debug, Clone)]
pub struct Assembler {
    sections: Vec<String>,
    loader_script: String,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl Assembler {
    /// Create an assembler for the given section order.
    pub fn new(sections: Vec<String>) -> Self {
        Self {
            sections,
            loader_script: DEFAULT_LOADER_SCRIPT.to_string(),
        }
    }

    /// Override the loader script source that gets stripped.
    pub fn with_loader_script(mut self, src: impl Into<String>) -> Self {
        self.loader_script = src.into();
        self
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Compose the output document.
    ///
    /// All fragments are loaded before any substitution, so a missing one
    /// aborts the run with nothing produced.
    pub fn assemble(
        &self,
        base: &str,
        fragments: &impl FragmentSource,
    ) -> Result<Assembled, BuildError> {
        for section in &self.sections {
            validate_section(section)?;
        }

        let mut loaded = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            loaded.push((section.as_str(), fragments.load(section)?));
        }

        let mut html = base.to_string();
        let mut substituted = Vec::with_capacity(loaded.len());

        for (section, content) in loaded {
            if fill_placeholder(&mut html, section, &content)? {
                tracing::debug!("Substituted section {}", section);
                substituted.push(section.to_string());
            } else {
                tracing::warn!("No placeholder for section '{}' in base document", section);
            }
        }

        let html = strip_loader_script(&html, &self.loader_script)?;
        let html = strip_dynamic_comments(&html);

        Ok(Assembled { html, substituted })
    }
}

/// Compose `base` from `fragments` in `sections` order using the default loader script.
pub fn assemble(
    base: &str,
    fragments: &impl FragmentSource,
    sections: &[String],
) -> Result<String, BuildError> {
    Assembler::new(sections.to_vec())
        .assemble(base, fragments)
        .map(|a| a.html)
}

/// Replace the first `<div id="<section>-content">...</div>` region.
///
/// Matches up to the first closing `</div>`; nested divs inside a
/// placeholder are not balanced.
fn fill_placeholder(html: &mut String, section: &str, content: &str) -> Result<bool, BuildError> {
    let pattern = format!(
        r#"(?is)<div\s+id="{}-content"[^>]*>.*?</div>"#,
        regex::escape(section)
    );
    let re = Regex::new(&pattern).map_err(|e| BuildError::Pattern(e.to_string()))?;

    let Some(range) = re.find(html).map(|m| m.range()) else {
        return Ok(false);
    };

    let replacement = format!(r#"<div id="{}-content">{}</div>"#, section, content);
    html.replace_range(range, &replacement);
    Ok(true)
}

/// Remove every exact `<script src="..."></script>` reference plus trailing whitespace.
fn strip_loader_script(html: &str, src: &str) -> Result<String, BuildError> {
    let tag = format!(r#"<script src="{}"></script>"#, src);
    let re = Regex::new(&format!(r"{}\s*", regex::escape(&tag)))
        .map_err(|e| BuildError::Pattern(e.to_string()))?;
    Ok(re.replace_all(html, "").into_owned())
}

/// Remove comments mentioning "loaded dynamically", leaving other comments intact.
fn strip_dynamic_comments(html: &str) -> String {
    COMMENT_RE
        .replace_all(html, |caps: &regex::Captures| {
            if DYNAMIC_PHRASE_RE.is_match(&caps[1]) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Section names become file names and element ids.
fn validate_section(section: &str) -> Result<(), BuildError> {
    let valid = !section.is_empty()
        && section
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(BuildError::InvalidSection(format!(
            "'{}' (allowed: letters, digits, '-', '_')",
            section
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fragments(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sections(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn substitutes_placeholder_with_fragment() {
        let base = r#"<div id="about-content"><!-- about content will be loaded dynamically --></div>"#;
        let html = assemble(
            base,
            &fragments(&[("about", "<p>Bio text</p>")]),
            &sections(&["about"]),
        )
        .unwrap();

        assert_eq!(html, r#"<div id="about-content"><p>Bio text</p></div>"#);
    }

    #[test]
    fn keeps_placeholder_position() {
        let base = concat!(
            r#"<main><div id="contact-content"></div>"#,
            r#"<div id="hero-content" class="pt-8">"#,
            "\n  <!-- hero content will be loaded dynamically -->\n",
            "</div></main>",
        );
        let html = assemble(
            base,
            &fragments(&[("hero", "H"), ("contact", "C")]),
            &sections(&["hero", "contact"]),
        )
        .unwrap();

        assert_eq!(
            html,
            r#"<main><div id="contact-content">C</div><div id="hero-content">H</div></main>"#
        );
    }

    #[test]
    fn inserts_fragment_verbatim() {
        let base = r#"<div id="resume-content"></div>"#;
        let html = assemble(
            base,
            &fragments(&[("resume", "Costs $1 and ${name} \\1")]),
            &sections(&["resume"]),
        )
        .unwrap();

        assert_eq!(html, r#"<div id="resume-content">Costs $1 and ${name} \1</div>"#);
    }

    #[test]
    fn missing_fragment_names_section() {
        let base = r#"<div id="hero-content"></div><div id="about-content"></div>"#;
        let err = assemble(
            base,
            &fragments(&[("hero", "H")]),
            &sections(&["hero", "about"]),
        )
        .unwrap_err();

        assert!(matches!(
            &err,
            BuildError::MissingFragment { section, .. } if section == "about"
        ));
        assert!(err.to_string().contains("Error processing section about"));
    }

    #[test]
    fn skips_section_without_placeholder() {
        let base = r#"<div id="hero-content"></div>"#;
        let assembled = Assembler::new(sections(&["hero", "skills"]))
            .assemble(base, &fragments(&[("hero", "H"), ("skills", "S")]))
            .unwrap();

        assert_eq!(assembled.html, r#"<div id="hero-content">H</div>"#);
        assert_eq!(assembled.substituted, vec!["hero".to_string()]);
    }

    #[test]
    fn section_names_match_exactly() {
        let base = r#"<div id="role-content"></div><div id="target-role-content"></div>"#;
        let html = assemble(
            base,
            &fragments(&[("target-role", "T")]),
            &sections(&["target-role"]),
        )
        .unwrap();

        assert_eq!(
            html,
            r#"<div id="role-content"></div><div id="target-role-content">T</div>"#
        );
    }

    #[test]
    fn removes_loader_script() {
        let base = "<body>\n<script src=\"js/sections.js\"></script>\n  <script src=\"js/app.js\"></script>\n</body>";
        let html = assemble(base, &fragments(&[]), &[]).unwrap();

        assert_eq!(html, "<body>\n<script src=\"js/app.js\"></script>\n</body>");
    }

    #[test]
    fn loader_script_variants_are_left_alone() {
        let base = r#"<script  src="js/sections.js" defer></script>"#;
        let html = assemble(base, &fragments(&[]), &[]).unwrap();

        assert_eq!(html, base);
    }

    #[test]
    fn custom_loader_script() {
        let base = r#"<script src="static/load.js"></script><p>x</p>"#;
        let assembled = Assembler::new(vec![])
            .with_loader_script("static/load.js")
            .assemble(base, &fragments(&[]))
            .unwrap();

        assert_eq!(assembled.html, "<p>x</p>");
    }

    #[test]
    fn removes_dynamic_comments_only() {
        let base = concat!(
            "<!-- Navigation -->\n<nav></nav>\n",
            "<!-- Sections are\n  LOADED DYNAMICALLY by js -->\n",
            "<footer></footer>",
        );
        let html = assemble(base, &fragments(&[]), &[]).unwrap();

        assert_eq!(html, "<!-- Navigation -->\n<nav></nav>\n<footer></footer>");
    }

    #[test]
    fn rejects_path_like_section_names() {
        let err = assemble("", &fragments(&[]), &sections(&["../secret"])).unwrap_err();
        assert!(matches!(err, BuildError::InvalidSection(_)));
    }

    #[test]
    fn reads_fragments_from_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("skills.html"), "<ul></ul>").unwrap();

        let dir = FragmentDir::new(temp.path());
        assert_eq!(dir.load("skills").unwrap(), "<ul></ul>");
        assert!(matches!(
            dir.load("contact"),
            Err(BuildError::MissingFragment { .. })
        ));
    }

    #[test]
    fn default_assembler_uses_portfolio_sections() {
        let assembler = Assembler::default();
        assert_eq!(assembler.sections().len(), 8);
        assert_eq!(assembler.sections()[0], "hero");
        assert_eq!(assembler.sections()[7], "contact");
    }

    #[test]
    fn nested_div_ends_placeholder_early() {
        // The matcher stops at the first closing tag, leaving the outer one behind.
        let base = r#"<div id="a-content"><div>x</div>tail</div>"#;
        let html = assemble(base, &fragments(&[("a", "F")]), &sections(&["a"])).unwrap();

        assert_eq!(html, r#"<div id="a-content">F</div>tail</div>"#);
    }
}
