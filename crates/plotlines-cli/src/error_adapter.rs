//! Error adapter for converting PlotlinesError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. TOML parse errors
//! carry their source text and are rendered with a labelled span; every other
//! variant is reported with a stable code.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use plotlines::PlotlinesError;

/// Adapter for a TOML parse error and the text it was raised on.
pub struct ParseAdapter<'a> {
    err: &'a toml::de::Error,
    src: &'a str,
}

impl<'a> ParseAdapter<'a> {
    pub fn new(err: &'a toml::de::Error, src: &'a str) -> Self {
        Self { err, src }
    }
}

impl fmt::Debug for ParseAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for ParseAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.err.message())
    }
}

impl std::error::Error for ParseAdapter<'_> {}

impl MietteDiagnostic for ParseAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("plotlines::parse"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("check the TOML syntax and field types"))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.err.span()?;
        let span = SourceSpan::new(span.start.into(), span.len());
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            span,
        ))))
    }
}

/// Adapter for non-parse [`PlotlinesError`] variants.
///
/// This adapter handles errors that don't have rich diagnostic information,
/// such as I/O errors, configuration errors, graph errors, layout errors,
/// and export errors.
pub struct ErrorAdapter<'a>(pub &'a PlotlinesError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            PlotlinesError::Io(_) => "plotlines::io",
            PlotlinesError::Parse { .. } => "plotlines::parse",
            PlotlinesError::Config(_) => "plotlines::config",
            PlotlinesError::Graph(_) => "plotlines::graph",
            PlotlinesError::Layout(_) => "plotlines::layout",
            PlotlinesError::Export(_) => "plotlines::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            PlotlinesError::Config(_) => Some(Box::new("colors accept any CSS color string")),
            _ => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A parse error with source location information.
    Parse(ParseAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Parse(p) => fmt::Display::fmt(p, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Parse(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Parse(p) => p.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Parse(p) => p.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Parse(p) => p.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Parse(p) => p.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`PlotlinesError`] into a list of reportable errors.
pub fn to_reportables(err: &PlotlinesError) -> Vec<Reportable<'_>> {
    match err {
        PlotlinesError::Parse { err, src } => vec![Reportable::Parse(ParseAdapter::new(err, src))],
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error(src: &str) -> PlotlinesError {
        let err = toml::from_str::<toml::Table>(src).unwrap_err();
        PlotlinesError::new_parse_error(err, src)
    }

    #[test]
    fn test_parse_error_has_span() {
        let err = parse_error("[graph]\nlimit = = 3\n");
        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        let labels: Vec<_> = reportables[0].labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].primary());
        assert!(labels[0].offset() >= "[graph]\n".len());
        assert_eq!(
            reportables[0].code().unwrap().to_string(),
            "plotlines::parse"
        );
        assert!(reportables[0].source_code().is_some());
    }

    #[test]
    fn test_non_parse_error() {
        let err = PlotlinesError::Layout("no room".to_string());
        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Layout error: no room");
                assert_eq!(e.code().unwrap().to_string(), "plotlines::layout");
                assert!(e.labels().is_none());
            }
            Reportable::Parse(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_config_error_has_help() {
        let err = PlotlinesError::Config("invalid color".to_string());
        let reportables = to_reportables(&err);
        assert!(reportables[0].help().is_some());
        assert_eq!(
            reportables[0].code().unwrap().to_string(),
            "plotlines::config"
        );
    }

    #[test]
    fn test_report_renders() {
        let err = parse_error("[layout\nwidth = 1\n");
        let reporter = miette::GraphicalReportHandler::new();
        let mut writer = String::new();
        for reportable in to_reportables(&err) {
            reporter.render_report(&mut writer, &reportable).unwrap();
        }
        assert!(writer.contains("plotlines::parse"));
    }
}
