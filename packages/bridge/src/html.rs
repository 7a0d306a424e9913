//! Deterministic renderings of the AST for the export boundary.
//!
//! The host owns file writing and format conversion; this module only
//! produces the text it hands over. Rendering is a pure function of the
//! tree — same root, same bytes.

use pulpit_ast::{derive_reference, DocumentRootNode, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target format tag passed through to the host exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Md,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Md => "md",
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "txt" => Ok(ExportFormat::Txt),
            "md" => Ok(ExportFormat::Md),
            "docx" => Ok(ExportFormat::Docx),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Render the body the host needs for `format`. Text-shaped targets get
/// their own rendering; docx and pdf are produced by the host from HTML.
pub fn render_for(root: &DocumentRootNode, format: ExportFormat) -> String {
    match format {
        ExportFormat::Txt => render_plain_text(root),
        ExportFormat::Md => render_markdown(root),
        ExportFormat::Docx | ExportFormat::Pdf => render_html(root),
    }
}

struct HtmlWriter {
    buffer: String,
    depth: usize,
}

impl HtmlWriter {
    fn new() -> Self {
        Self {
            buffer: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buffer.push_str("  ");
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }
}

/// Render the document as a standalone HTML article.
pub fn render_html(root: &DocumentRootNode) -> String {
    let mut writer = HtmlWriter::new();
    writer.line("<article>");
    writer.depth += 1;

    if root.meta.title.is_some() || root.meta.speaker.is_some() {
        writer.line("<header>");
        writer.depth += 1;
        if let Some(title) = &root.meta.title {
            writer.line(&format!("<h1>{}</h1>", escape_html(title)));
        }
        if let Some(speaker) = &root.meta.speaker {
            writer.line(&format!(
                "<p class=\"speaker\">{}</p>",
                escape_html(speaker)
            ));
        }
        writer.depth -= 1;
        writer.line("</header>");
    }

    for node in &root.children {
        render_node_html(node, &mut writer);
    }

    writer.depth -= 1;
    writer.line("</article>");
    writer.buffer
}

fn render_node_html(node: &Node, writer: &mut HtmlWriter) {
    match node {
        Node::Text { text, .. } => writer.line(&escape_html(text)),

        Node::Paragraph { id, .. } => {
            writer.line(&format!(
                "<p data-node-id=\"{}\">{}</p>",
                escape_html(id.as_str()),
                escape_html(&node.plain_text())
            ));
        }

        Node::Heading { id, level, .. } => {
            let level = (*level).clamp(1, 6);
            writer.line(&format!(
                "<h{} data-node-id=\"{}\">{}</h{}>",
                level,
                escape_html(id.as_str()),
                escape_html(&node.plain_text()),
                level
            ));
        }

        Node::Passage { id, reference, .. } => {
            let opening = match derive_reference(reference) {
                Some(display) => format!(
                    "<blockquote data-node-id=\"{}\" data-reference=\"{}\">",
                    escape_html(id.as_str()),
                    escape_html(&display)
                ),
                None => format!(
                    "<blockquote data-node-id=\"{}\">",
                    escape_html(id.as_str())
                ),
            };
            writer.line(&opening);
            writer.depth += 1;
            writer.line(&format!("<p>{}</p>", escape_html(&node.plain_text())));
            if let Some(display) = derive_reference(reference) {
                writer.line(&format!("<cite>{}</cite>", escape_html(&display)));
            }
            writer.depth -= 1;
            writer.line("</blockquote>");
        }
    }
}

/// Render the document as Markdown.
pub fn render_markdown(root: &DocumentRootNode) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if let Some(title) = &root.meta.title {
        blocks.push(format!("# {}", title));
    }
    if let Some(speaker) = &root.meta.speaker {
        blocks.push(format!("*{}*", speaker));
    }

    for node in &root.children {
        match node {
            Node::Text { text, .. } => blocks.push(text.clone()),
            Node::Paragraph { .. } => blocks.push(node.plain_text()),
            Node::Heading { level, .. } => {
                let level = (*level).clamp(1, 6) as usize;
                blocks.push(format!("{} {}", "#".repeat(level), node.plain_text()));
            }
            Node::Passage { reference, .. } => {
                let mut quote = format!("> {}", node.plain_text());
                if let Some(display) = derive_reference(reference) {
                    quote.push_str(&format!("\n>\n> — {}", display));
                }
                blocks.push(quote);
            }
        }
    }

    let mut output = blocks.join("\n\n");
    output.push('\n');
    output
}

/// Render the bare transcript text.
pub fn render_plain_text(root: &DocumentRootNode) -> String {
    root.plain_text()
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
