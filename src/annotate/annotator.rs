use crate::session::types::{SearchResult, extract_int};

/// Text attached to a displayed result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Rich (HTML) annotation shown in the viewer.
    pub full: Option<String>,
    pub non_html: Option<String>,
    pub tooltip: Option<String>,
    /// Label under the thumbnail.
    pub one_line: Option<String>,
    pub verbose: Option<String>,
}

/// Produces annotation texts for results.
///
/// Only `annotate` is required; the other forms fall back to it.
pub trait Annotator: Send + Sync {
    fn annotate(&self, result: &SearchResult) -> Option<String>;

    fn annotate_non_html(&self, result: &SearchResult) -> Option<String> {
        self.annotate(result)
    }

    fn annotate_tooltip(&self, result: &SearchResult) -> Option<String> {
        self.annotate_non_html(result)
    }

    fn annotate_one_line(&self, result: &SearchResult) -> Option<String> {
        self.annotate_non_html(result)
            .and_then(|text| text.lines().next().map(str::to_string))
    }

    fn annotate_verbose(&self, result: &SearchResult) -> Option<String> {
        self.annotate(result)
    }

    fn annotations(&self, result: &SearchResult) -> Annotations {
        Annotations {
            full: self.annotate(result),
            non_html: self.annotate_non_html(result),
            tooltip: self.annotate_tooltip(result),
            one_line: self.annotate_one_line(result),
            verbose: self.annotate_verbose(result),
        }
    }
}

/// Lists a fixed set of attributes as `name = value` pairs.
///
/// Attributes ending in `.int` are decoded as integers, everything else as UTF-8 text.
/// The verbose form lists every attribute the result carries.
#[derive(Debug, Clone)]
pub struct AttributeAnnotator {
    names: Vec<String>,
}

impl AttributeAnnotator {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    fn render(result: &SearchResult, name: &str) -> Option<String> {
        let bytes = result.value(name)?;

        let value = if name.ends_with(".int") {
            extract_int(bytes).map(|v| v.to_string())
        } else {
            None
        };

        let value = value
            .or_else(|| result.string_value(name).map(str::to_string))
            .unwrap_or_else(|| format!("<{} bytes>", bytes.len()));

        Some(format!("{} = {}", name, value))
    }

    fn pairs(&self, result: &SearchResult) -> Vec<String> {
        self.names
            .iter()
            .filter_map(|name| Self::render(result, name))
            .collect()
    }
}

impl Annotator for AttributeAnnotator {
    fn annotate(&self, result: &SearchResult) -> Option<String> {
        let pairs = self.pairs(result);
        if pairs.is_empty() {
            return None;
        }
        Some(format!("<html>{}</html>", pairs.join("<br>")))
    }

    fn annotate_non_html(&self, result: &SearchResult) -> Option<String> {
        let pairs = self.pairs(result);
        if pairs.is_empty() {
            return None;
        }
        Some(pairs.join("\n"))
    }

    fn annotate_one_line(&self, result: &SearchResult) -> Option<String> {
        let pairs = self.pairs(result);
        if pairs.is_empty() {
            return None;
        }
        Some(pairs.join(", "))
    }

    fn annotate_verbose(&self, result: &SearchResult) -> Option<String> {
        let lines: Vec<String> = result
            .attribute_names()
            .into_iter()
            .filter_map(|name| Self::render(result, name))
            .collect();

        Some(format!("{}\n{}", result.object_id(), lines.join("\n")))
    }
}
