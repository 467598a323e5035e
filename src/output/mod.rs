use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcribe::{CollectionReport, TranscriptRecord};

/// Render records in the requested format
pub fn render(records: &[TranscriptRecord], format: &OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(records)?,
        OutputFormat::Text => format_as_text(records),
    };
    Ok(content)
}

/// One block per video: URL line, transcript, blank line
pub fn format_as_text(records: &[TranscriptRecord]) -> String {
    records
        .iter()
        .map(|record| format!("{}\n{}\n", record.video_url, record.transcript))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Save collection result to file
pub async fn save_to_file(report: &CollectionReport, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(&report.records, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print collection result to console
pub fn print_to_console(report: &CollectionReport, format: &OutputFormat) -> Result<()> {
    let content = render(&report.records, format)?;
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<TranscriptRecord> {
        vec![
            TranscriptRecord {
                video_url: "https://youtu.be/v1".to_string(),
                transcript: "first video".to_string(),
            },
            TranscriptRecord {
                video_url: "https://youtu.be/v2".to_string(),
                transcript: "second video".to_string(),
            },
        ]
    }

    #[test]
    fn test_render_json_matches_http_shape() {
        let json = render(&records(), &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["video_url"], "https://youtu.be/v1");
        assert_eq!(value[1]["transcript"], "second video");
    }

    #[test]
    fn test_render_text() {
        let text = render(&records(), &OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "https://youtu.be/v1\nfirst video\n\nhttps://youtu.be/v2\nsecond video\n"
        );
        assert_eq!(render(&[], &OutputFormat::Text).unwrap(), "");
        assert_eq!(render(&[], &OutputFormat::Json).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let report = CollectionReport {
            records: records(),
            ..CollectionReport::default()
        };

        save_to_file(&report, &path, &OutputFormat::Json).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("https://youtu.be/v2"));
    }
}
