use crate::envelope::Envelope;

/// A pluggable renderer for one output format.
pub trait OutputFormat: Send + Sync {
    /// Upper-case slug that selects this format (`JSON`)
    fn slug(&self) -> &str;

    /// Content type sent with rendered bodies
    fn content_type(&self) -> &'static str;

    /// Render an envelope. `pretty` is set outside production.
    fn render(&self, envelope: &Envelope, pretty: bool) -> Result<Vec<u8>, serde_json::Error>;
}

fn render_json(envelope: &Envelope, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
    if pretty {
        serde_json::to_vec_pretty(envelope)
    } else {
        serde_json::to_vec(envelope)
    }
}

/// `application/json` renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl OutputFormat for JsonFormat {
    fn slug(&self) -> &str {
        "JSON"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render(&self, envelope: &Envelope, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
        render_json(envelope, pretty)
    }
}

/// JSON body served as `text/html`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormat;

impl OutputFormat for TextFormat {
    fn slug(&self) -> &str {
        "TEXT"
    }

    fn content_type(&self) -> &'static str {
        "text/html"
    }

    fn render(&self, envelope: &Envelope, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
        render_json(envelope, pretty)
    }
}

/// Rendered body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Render an envelope with `format`.
///
/// A pre-rendered `body` on the envelope is emitted verbatim and skips the
/// renderer; the content type still comes from the format.
pub fn render_envelope(
    format: &dyn OutputFormat,
    envelope: &Envelope,
    pretty: bool,
) -> Result<Rendered, serde_json::Error> {
    let bytes = match &envelope.body {
        Some(body) => body.clone().into_bytes(),
        None => format.render(envelope, pretty)?,
    };
    Ok(Rendered {
        content_type: format.content_type(),
        bytes,
    })
}
