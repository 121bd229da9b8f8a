//! Tracing setup for the binary.
//!
//! Every formatted line passes through [`RedactingWriter`] before it reaches
//! stderr, so bearer tokens and xAI keys never land in logs.

use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Arc;

use regex::Regex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Replacement text for secrets
pub const REDACTED: &str = "[REDACTED]";

/// Rewrites secret-looking substrings
#[derive(Debug, Clone)]
pub struct Redactor {
    patterns: Vec<Regex>,
}

impl Redactor {
    /// Redactor for `Bearer <token>` and `xai-...` keys.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: vec![
                Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+")?,
                Regex::new(r"\bxai-[A-Za-z0-9_-]+")?,
            ],
        })
    }

    /// `line` with every match replaced by [`REDACTED`]
    pub fn redact<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(line);
        for re in &self.patterns {
            if re.is_match(&out) {
                out = Cow::Owned(re.replace_all(&out, REDACTED).into_owned());
            }
        }
        out
    }
}

/// `MakeWriter` wrapper that redacts each event before forwarding it
#[derive(Debug, Clone)]
pub struct RedactingWriter<M> {
    inner: M,
    redactor: Arc<Redactor>,
}

impl<M> RedactingWriter<M> {
    /// Wraps `inner`
    pub fn new(inner: M, redactor: Redactor) -> Self {
        Self {
            inner,
            redactor: Arc::new(redactor),
        }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for RedactingWriter<M> {
    type Writer = RedactedEvent<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactedEvent {
            inner: self.inner.make_writer(),
            redactor: Arc::clone(&self.redactor),
            buf: Vec::new(),
        }
    }
}

/// Buffers one event and writes it redacted on flush or drop
pub struct RedactedEvent<W: Write> {
    inner: W,
    redactor: Arc<Redactor>,
    buf: Vec<u8>,
}

impl<W: Write> RedactedEvent<W> {
    fn emit(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let raw = std::mem::take(&mut self.buf);
        let text = String::from_utf8_lossy(&raw);
        self.inner.write_all(self.redactor.redact(&text).as_bytes())
    }
}

impl<W: Write> Write for RedactedEvent<W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for RedactedEvent<W> {
    fn drop(&mut self) {
        // Nowhere to report a failed log write
        let _ = self.emit();
    }
}

fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "grok_tools=info,grok_async=warn",
        1 => "grok_tools=debug,grok_async=debug",
        _ => "grok_tools=trace,grok_async=trace,rmcp=debug",
    }
}

/// Installs the global subscriber writing redacted lines to stderr.
///
/// `-v` flags win over `RUST_LOG`; without either, only warnings from the
/// client and info from the tools are shown.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = if verbosity > 0 {
        EnvFilter::new(default_directives(verbosity))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(0)))
    };

    let writer = RedactingWriter::new(io::stderr, Redactor::new()?);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Sink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Sink {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn redacts_bearer_tokens_and_keys() {
        let r = Redactor::new().unwrap();
        assert_eq!(
            r.redact("authorization: Bearer abc.DEF-123_x"),
            "authorization: [REDACTED]"
        );
        assert_eq!(
            r.redact("using key xai-AbC123_def456 now"),
            "using key [REDACTED] now"
        );
        assert!(matches!(r.redact("nothing secret"), Cow::Borrowed(_)));
    }

    #[test]
    fn writer_redacts_whole_event_on_drop() {
        let sink = Sink::default();
        let make = {
            let sink = sink.clone();
            move || sink.clone()
        };
        let writer = RedactingWriter::new(make, Redactor::new().unwrap());

        {
            let mut w = writer.make_writer();
            // Split mid-token: redaction must see the whole line
            w.write_all(b"header Bearer sk").unwrap();
            w.write_all(b"-secret-token\n").unwrap();
        }

        assert_eq!(sink.contents(), "header [REDACTED]\n");
    }

    #[test]
    fn subscriber_output_is_redacted() {
        let sink = Sink::default();
        let make = {
            let sink = sink.clone();
            move || sink.clone()
        };
        let subscriber = tracing_subscriber::fmt()
            .with_writer(RedactingWriter::new(make, Redactor::new().unwrap()))
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(key = "xai-0123456789abcdef", "sending Bearer xai-0123456789abcdef");
        });

        let out = sink.contents();
        assert!(!out.contains("0123456789abcdef"), "leaked: {out}");
        assert!(out.contains(REDACTED));
    }

    #[test]
    fn verbosity_maps_to_directives() {
        assert!(default_directives(0).contains("grok_async=warn"));
        assert!(default_directives(1).contains("grok_async=debug"));
        assert!(default_directives(5).contains("trace"));
    }
}
