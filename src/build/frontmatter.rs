//! Markdown frontmatter splitting and rendering.

use crate::error::{InstallError, Result};

/// A markdown document split into frontmatter and body.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub frontmatter: serde_yaml::Mapping,
    pub body: String,
}

/// Split a markdown document at its `---` fences.
///
/// Documents without a frontmatter block parse as an empty mapping plus the
/// whole text as body. Malformed frontmatter YAML is a render error.
pub fn split_document(text: &str) -> Result<Document> {
    let Some(rest) = text.strip_prefix("---\n").or_else(|| text.strip_prefix("---\r\n")) else {
        return Ok(Document {
            frontmatter: serde_yaml::Mapping::new(),
            body: text.to_string(),
        });
    };

    let Some(end) = find_closing_fence(rest) else {
        // An opening fence with no closing one is body text, not
        // frontmatter.
        return Ok(Document {
            frontmatter: serde_yaml::Mapping::new(),
            body: text.to_string(),
        });
    };

    let (yaml, body) = rest.split_at(end.yaml_len);
    let frontmatter: serde_yaml::Mapping = if yaml.trim().is_empty() {
        serde_yaml::Mapping::new()
    } else {
        serde_yaml::from_str(yaml)
            .map_err(|e| InstallError::Render(format!("Malformed frontmatter: {}", e)))?
    };

    Ok(Document {
        frontmatter,
        body: body[end.fence_len..].trim_start_matches('\n').to_string(),
    })
}

struct Fence {
    yaml_len: usize,
    fence_len: usize,
}

fn find_closing_fence(rest: &str) -> Option<Fence> {
    if rest.starts_with("---\n") {
        return Some(Fence {
            yaml_len: 0,
            fence_len: 4,
        });
    }
    let idx = rest.find("\n---")?;
    let after = &rest[idx + 4..];
    if after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n") {
        Some(Fence {
            yaml_len: idx + 1,
            fence_len: 3,
        })
    } else {
        None
    }
}

/// Render a document back to markdown. An empty mapping renders as bare
/// body with no fences.
pub fn render_document(doc: &Document) -> Result<String> {
    if doc.frontmatter.is_empty() {
        return Ok(doc.body.clone());
    }
    let yaml = serde_yaml::to_string(&doc.frontmatter)
        .map_err(|e| InstallError::Render(format!("Cannot render frontmatter: {}", e)))?;
    if doc.body.is_empty() {
        Ok(format!("---\n{}---\n", yaml))
    } else {
        Ok(format!("---\n{}---\n\n{}", yaml, doc.body))
    }
}
