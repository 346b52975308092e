use crate::domain::trend::{Quadrant, Trend};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::Writer;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExportedTrend {
    pub id: String,
    pub label: String,
    pub summary: String,
    pub quadrant: String,
    pub ring: String,
    pub impact: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Trend> for ExportedTrend {
    fn from(trend: &Trend) -> Self {
        ExportedTrend {
            id: trend.id().to_string(),
            label: trend.label().to_string(),
            summary: trend.summary().to_string(),
            quadrant: trend.quadrant().to_string(),
            ring: trend.ring().to_string(),
            impact: trend.impact().to_string(),
            created_at: trend.created_at(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            _ => None,
        }
    }
}

/// Writes out whatever the radar is currently showing.
pub struct ExportService;

impl ExportService {
    /// Export trends to JSON format
    pub fn export_to_json<T: AsRef<Trend>>(trends: &[T]) -> Result<String> {
        let exported: Vec<ExportedTrend> = trends.iter().map(|t| ExportedTrend::from(t.as_ref())).collect();
        Ok(serde_json::to_string_pretty(&exported)?)
    }

    /// Export trends to CSV format
    pub fn export_to_csv<T: AsRef<Trend>>(trends: &[T]) -> Result<String> {
        let mut wtr = Writer::from_writer(vec![]);

        wtr.write_record(["ID", "Label", "Quadrant", "Ring", "Impact", "Summary", "Created At"])?;

        for trend in trends {
            let trend = trend.as_ref();
            wtr.write_record([
                trend.id().to_string(),
                trend.label().to_string(),
                trend.quadrant().to_string(),
                trend.ring().to_string(),
                trend.impact().to_string(),
                trend.summary().to_string(),
                trend.created_at().to_rfc3339(),
            ])?;
        }

        let data = wtr.into_inner()?;
        Ok(String::from_utf8(data)?)
    }

    /// Export trends to Markdown, one section per quadrant
    pub fn export_to_markdown<T: AsRef<Trend>>(domain: &str, trends: &[T]) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Trend Radar: {}\n\n", domain));
        output.push_str(&format!("Generated: {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")));

        for quadrant in Quadrant::ALL {
            let in_quadrant: Vec<&Trend> = trends
                .iter()
                .map(|t| -> &Trend { t.as_ref() })
                .filter(|t| t.quadrant() == quadrant)
                .collect();
            if in_quadrant.is_empty() {
                continue;
            }

            output.push_str(&format!("\n## {} ({})\n\n", quadrant, in_quadrant.len()));
            for trend in in_quadrant {
                output.push_str(&format!("### {}\n", trend.label()));
                output.push_str(&format!("{}\n", trend.summary()));
                output.push_str(&format!("- **Timeline:** {}\n", trend.ring()));
                output.push_str(&format!("- **Impact:** {}\n\n", trend.impact()));
            }
        }

        output
    }

    pub fn export<T: AsRef<Trend>>(domain: &str, trends: &[T], format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Self::export_to_json(trends),
            ExportFormat::Csv => Self::export_to_csv(trends),
            ExportFormat::Markdown => Ok(Self::export_to_markdown(domain, trends)),
        }
    }

    /// Save export to file
    pub fn export_to_file<T: AsRef<Trend>>(
        domain: &str,
        trends: &[T],
        format: ExportFormat,
        path: &Path,
    ) -> Result<()> {
        let content = Self::export(domain, trends, format)?;

        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        file.write_all(content.as_bytes())?;

        Ok(())
    }

    /// Plain-text sheet for the detail view of one trend.
    pub fn trend_detail_sheet(trend: &Trend) -> String {
        format!(
            "{}\n{}\n\nQuadrant: {}\nTimeline: {}\nImpact:   {}\n\n{}\n",
            trend.label(),
            "=".repeat(trend.label().chars().count()),
            trend.quadrant(),
            trend.ring(),
            trend.impact(),
            trend.summary(),
        )
    }
}
