//! Request templates and rendered fuzz requests

use serde::{Deserialize, Serialize};

/// Placeholder substituted with a word
pub const FUZZ_MARKER: &str = "FUZZ";

/// One template string (URL, body, or a header line) and its marker count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateComponent {
    raw: String,
    markers: usize,
}

impl TemplateComponent {
    /// Scan `raw` for markers
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let markers = raw.matches(FUZZ_MARKER).count();
        Self { raw, markers }
    }

    /// The template text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of markers in this component
    pub fn marker_count(&self) -> usize {
        self.markers
    }

    /// True if rendering changes the text
    pub fn needs_substitution(&self) -> bool {
        self.markers > 0
    }

    fn render_into(&self, out: &mut String, values: &mut ValueCursor<'_>) {
        out.clear();
        if !self.needs_substitution() {
            out.push_str(&self.raw);
            return;
        }

        let mut pieces = self.raw.split(FUZZ_MARKER);
        if let Some(first) = pieces.next() {
            out.push_str(first);
        }
        for piece in pieces {
            out.push_str(values.take().unwrap_or(FUZZ_MARKER));
            out.push_str(piece);
        }
    }
}

/// Hands out tuple elements to markers in source order
struct ValueCursor<'a> {
    values: &'a [String],
    next: usize,
    singular: bool,
}

impl<'a> ValueCursor<'a> {
    fn take(&mut self) -> Option<&'a str> {
        if self.singular {
            return self.values.first().map(String::as_str);
        }
        let value = self.values.get(self.next).map(String::as_str);
        self.next += 1;
        value
    }
}

/// The URL/body/header templates a run fuzzes
///
/// Immutable once the engine starts; shared by every request context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTemplate {
    method: String,
    url: TemplateComponent,
    body: Option<TemplateComponent>,
    headers: Vec<TemplateComponent>,
}

impl RequestTemplate {
    /// A `GET` template for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: TemplateComponent::new(url),
            body: None,
            headers: Vec::new(),
        }
    }

    /// Set the HTTP method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the body template
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(TemplateComponent::new(body));
        self
    }

    /// Append a `Name: value` header template
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(TemplateComponent::new(header));
        self
    }

    /// HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// URL template
    pub fn url(&self) -> &TemplateComponent {
        &self.url
    }

    /// Body template, if any
    pub fn body(&self) -> Option<&TemplateComponent> {
        self.body.as_ref()
    }

    /// Header templates in order
    pub fn headers(&self) -> &[TemplateComponent] {
        &self.headers
    }

    /// Markers across URL, body and headers
    pub fn marker_count(&self) -> usize {
        self.url.marker_count()
            + self.body.as_ref().map_or(0, TemplateComponent::marker_count)
            + self
                .headers
                .iter()
                .map(TemplateComponent::marker_count)
                .sum::<usize>()
    }

    /// Render `values` into `out`, reusing its buffers
    ///
    /// Markers consume values left to right across URL, body, then
    /// headers. With `singular` set, every marker receives `values[0]`.
    /// A marker without a value is left as the literal marker.
    pub fn render_into(&self, values: &[String], singular: bool, out: &mut FuzzRequest) {
        let mut cursor = ValueCursor {
            values,
            next: 0,
            singular,
        };

        out.method.clear();
        out.method.push_str(&self.method);

        self.url.render_into(&mut out.url, &mut cursor);

        match &self.body {
            Some(body) => body.render_into(out.body.get_or_insert_with(String::new), &mut cursor),
            None => out.body = None,
        }

        out.headers.truncate(self.headers.len());
        out.headers.resize_with(self.headers.len(), String::new);
        for (header, rendered) in self.headers.iter().zip(out.headers.iter_mut()) {
            header.render_into(rendered, &mut cursor);
        }
    }

    /// Render into a fresh request
    pub fn render(&self, values: &[String], singular: bool) -> FuzzRequest {
        let mut request = FuzzRequest::default();
        self.render_into(values, singular, &mut request);
        request
    }
}

/// A fully substituted request, owned by one request context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzRequest {
    /// HTTP method
    pub method: String,
    /// Target URL
    pub url: String,
    /// Request body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Header lines (`Name: value`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
}

impl FuzzRequest {
    /// Headers split into name/value pairs; lines without `:` are skipped
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim(), value.trim()))
    }

    /// Drop rendered contents, keeping allocations
    pub fn clear(&mut self) {
        self.method.clear();
        self.url.clear();
        if let Some(body) = self.body.as_mut() {
            body.clear();
        }
        for header in &mut self.headers {
            header.clear();
        }
    }
}
