//! Report Export
//!
//! Renders a delivered reading into a printable document. Export is
//! idempotent and feeds nothing back into the flow; the user can download
//! as many times as they like.

use crate::model::{AnalysisResult, BirthSubject};

/// Renders a reading plus subject display fields into a document
pub trait ReportExporter: Send + Sync {
    /// Produce the document bytes
    fn export(&self, analysis: &AnalysisResult, subject: &BirthSubject) -> Vec<u8>;

    /// MIME type of the produced document
    fn content_type(&self) -> &'static str;

    /// Suggested download filename
    fn filename(&self, analysis: &AnalysisResult) -> String;
}

/// Printable HTML document exporter
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlReportExporter;

impl HtmlReportExporter {
    fn render(analysis: &AnalysisResult, subject: &BirthSubject) -> String {
        let body = escape(&analysis.content).replace('\n', "<br>\n");

        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
<title>Professional Astro Horoscope</title>\n</head>\n<body>\n\
<h1>Professional Astro Horoscope</h1>\n\
<p><strong>Analysis Type:</strong> {tier}</p>\n\
<p><strong>Generated:</strong> {generated}</p>\n\
<p><strong>For:</strong> {name}</p>\n\
<p><strong>Birth Date:</strong> {date}</p>\n\
<p><strong>Location:</strong> {location}</p>\n\
<hr>\n<div>\n{body}\n</div>\n\
<hr>\n<p>Generated by AI Astrology</p>\n</body>\n</html>\n",
            tier = analysis.analysis_type.display(),
            generated = analysis.generated_at.format("%Y-%m-%d %H:%M UTC"),
            name = escape(&subject.name),
            date = subject.date,
            location = escape(&subject.location),
        )
    }
}

impl ReportExporter for HtmlReportExporter {
    fn export(&self, analysis: &AnalysisResult, subject: &BirthSubject) -> Vec<u8> {
        Self::render(analysis, subject).into_bytes()
    }

    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    fn filename(&self, analysis: &AnalysisResult) -> String {
        format!(
            "professional-astro-horoscope-{}-{}.html",
            analysis.analysis_type,
            analysis.generated_at.timestamp_millis()
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
