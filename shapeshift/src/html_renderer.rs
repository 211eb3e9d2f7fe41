//! HTML rendering of the page
//!
//! This module projects a [`Document`] into a single HTML page:
//! - One fragment per section, in document order, chosen by section type
//! - Section styles as an inline `style` attribute
//! - Global styles as CSS custom properties on `:root`
//!
//! Content comes from the assistant and is treated as untrusted: every text
//! and attribute value is escaped, and missing or ill-typed fields render
//! as empty strings.

use crate::document_model::{Content, Document, Section, SectionType, StyleMap};
use serde_json::Value;

/// One projection function per section type
pub trait SectionRenderer {
    fn header(&self, section: &Section) -> String;
    fn hero(&self, section: &Section) -> String;
    fn text(&self, section: &Section) -> String;
    fn image_gallery(&self, section: &Section) -> String;
    fn footer(&self, section: &Section) -> String;

    /// Dispatch on the section type
    fn render_section(&self, section: &Section) -> String {
        match section.section_type {
            SectionType::Header => self.header(section),
            SectionType::Hero => self.hero(section),
            SectionType::Text => self.text(section),
            SectionType::ImageGallery => self.image_gallery(section),
            SectionType::Footer => self.footer(section),
        }
    }
}

/// Renders the markup the bundled stylesheet expects
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl SectionRenderer for HtmlRenderer {
    fn header(&self, section: &Section) -> String {
        let nav: String = list_field(&section.content, "nav")
            .iter()
            .map(|item| format!("<li><a href=\"#\">{}</a></li>", escape_html(item)))
            .collect();
        format!(
            "<header{}>\n<div class=\"container-inner\">\n<h1 class=\"site-title\">{}</h1>\n<nav>\n<ul>{}</ul>\n</nav>\n</div>\n</header>\n",
            section_attrs(section, "header-section"),
            escape_html(&text_field(&section.content, "title")),
            nav
        )
    }

    fn hero(&self, section: &Section) -> String {
        format!(
            "<section{}>\n<div class=\"container-inner\">\n<h2>{}</h2>\n<p>{}</p>\n<button class=\"btn primary-btn\">{}</button>\n</div>\n</section>\n",
            section_attrs(section, "hero-section"),
            escape_html(&text_field(&section.content, "title")),
            escape_html(&text_field(&section.content, "subtitle")),
            escape_html(&text_field(&section.content, "buttonText"))
        )
    }

    fn text(&self, section: &Section) -> String {
        format!(
            "<section{}>\n<div class=\"container-inner\">\n<h3>{}</h3>\n<p>{}</p>\n</div>\n</section>\n",
            section_attrs(section, "text-section"),
            escape_html(&text_field(&section.content, "title")),
            escape_html(&text_field(&section.content, "text"))
        )
    }

    fn image_gallery(&self, section: &Section) -> String {
        let mut items = String::new();
        let images = section
            .content
            .get("images")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for image in images.iter().filter_map(Value::as_object) {
            items.push_str(&format!(
                "<div class=\"gallery-item\">\n<img src=\"{}\" alt=\"{}\">\n<p>{}</p>\n</div>\n",
                escape_html(&text_field(image, "src")),
                escape_html(&text_field(image, "alt")),
                escape_html(&text_field(image, "caption"))
            ));
        }
        format!(
            "<section{}>\n<div class=\"container-inner\">\n<h3>{}</h3>\n<div class=\"gallery-grid\">\n{}</div>\n</div>\n</section>\n",
            section_attrs(section, "gallery-section"),
            escape_html(&text_field(&section.content, "title")),
            items
        )
    }

    fn footer(&self, section: &Section) -> String {
        format!(
            "<footer{}>\n<div class=\"container-inner\">\n<p>{}</p>\n</div>\n</footer>\n",
            section_attrs(section, "footer-section"),
            escape_html(&text_field(&section.content, "text"))
        )
    }
}

/// Render a complete HTML page for the document
///
/// # Parameters
/// * `renderer` - Section fragment renderer
/// * `document` - The document to render
/// * `title` - Text for the `<title>` element
///
/// # Returns
/// * `String` - The page; identical input always yields identical output
pub fn render_page<R: SectionRenderer + ?Sized>(
    renderer: &R,
    document: &Document,
    title: &str,
) -> String {
    let mut output = String::new();

    write_html_header(&mut output, title, &document.global_styles);

    output.push_str("<body>\n");
    output.push_str("<main id=\"website-content\">\n");
    for section in &document.sections {
        output.push_str(&renderer.render_section(section));
    }
    output.push_str("</main>\n");
    output.push_str("</body>\n");
    output.push_str("</html>\n");

    output
}

/// Write HTML head with the stylesheet and global style variables
fn write_html_header(output: &mut String, title: &str, global_styles: &StyleMap) {
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html lang=\"en\">\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    output.push_str("<style>\n");
    output.push_str(&root_variables(global_styles));
    output.push_str(CSS_STYLES);
    output.push_str("</style>\n");
    output.push_str("</head>\n");
}

/// Global styles as a `:root` rule, in map order
fn root_variables(global_styles: &StyleMap) -> String {
    let mut rule = String::from(":root {\n");
    for (name, value) in global_styles {
        let name = css_name(name);
        if name.is_empty() {
            continue;
        }
        rule.push_str(&format!("    {}: {};\n", name, css_value(value)));
    }
    rule.push_str("}\n");
    rule
}

/// ` id="..." class="section <class>"` plus an inline style when present
fn section_attrs(section: &Section, class: &str) -> String {
    let mut attrs = format!(
        " id=\"{}\" class=\"section {}\"",
        escape_html(&section.id),
        class
    );
    let style = inline_style(&section.styles);
    if !style.is_empty() {
        attrs.push_str(&format!(" style=\"{}\"", escape_html(&style)));
    }
    attrs
}

fn inline_style(styles: &StyleMap) -> String {
    styles
        .iter()
        .filter_map(|(name, value)| {
            let name = css_name(name);
            (!name.is_empty()).then(|| format!("{}: {};", name, css_value(value)))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalise a property name: camelCase becomes kebab-case, custom
/// properties (`--x`) are kept, and anything outside `[A-Za-z0-9_-]` is dropped
fn css_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        return name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        }
    }
    out
}

/// Strip characters that would let a value escape its declaration
fn css_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | ';' | '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// String view of a content field; absent or structured values are empty
fn text_field(content: &Content, key: &str) -> String {
    content.get(key).map(scalar_text).unwrap_or_default()
}

fn list_field(content: &Content, key: &str) -> Vec<String> {
    content
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(scalar_text)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Escape HTML special characters
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Page stylesheet; colours and fonts come from the `:root` variables
const CSS_STYLES: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: var(--font-family);
    line-height: 1.6;
    color: var(--text-color);
    background-color: var(--background-color);
}

.container-inner {
    max-width: 1100px;
    margin: 0 auto;
    padding: 0 20px;
}

.section {
    padding: 60px 0;
}

.header-section {
    background-color: var(--header-bg);
    color: var(--header-text);
    padding: 20px 0;
}

.header-section .container-inner {
    display: flex;
    justify-content: space-between;
    align-items: center;
}

.header-section nav ul {
    list-style: none;
    display: flex;
    gap: 20px;
}

.header-section nav a {
    color: var(--header-text);
    text-decoration: none;
}

.hero-section {
    text-align: center;
    background-color: var(--primary-color);
    color: #ffffff;
}

.hero-section h2 {
    font-size: 2.5em;
    margin-bottom: 10px;
}

.btn {
    display: inline-block;
    margin-top: 20px;
    padding: 10px 24px;
    border: none;
    border-radius: 4px;
    cursor: pointer;
}

.primary-btn {
    background-color: var(--accent-color);
    color: #ffffff;
}

.text-section h3,
.gallery-section h3 {
    margin-bottom: 15px;
    color: var(--primary-color);
}

.gallery-grid {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(250px, 1fr));
    gap: 20px;
}

.gallery-item {
    background-color: var(--card-bg);
    border: 1px solid var(--border-color);
    border-radius: 6px;
    overflow: hidden;
}

.gallery-item img {
    width: 100%;
    display: block;
}

.gallery-item p {
    padding: 10px;
}

.footer-section {
    background-color: var(--footer-bg);
    color: var(--footer-text);
    text-align: center;
    padding: 20px 0;
}

@media screen and (max-width: 768px) {
    .header-section .container-inner {
        flex-direction: column;
        gap: 10px;
    }

    .hero-section h2 {
        font-size: 1.8em;
    }
}
"#;
