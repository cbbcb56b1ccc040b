// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Incident report trigger - aggregates the rolling log into one reasoning request

use tracing::{info, warn};

use crate::sensors::CapturedFrame;
use crate::service::ReportGenerator;

/// Text displayed while a report is in flight
pub const REPORT_PENDING: &str = "Generating incident report...";

/// Text returned when generation fails
pub const REPORT_FAILED: &str = "Unable to generate incident report. Please try again.";

const REPORT_INSTRUCTIONS: &str = "Write a concise incident report for a personal safety log. \
Include a one-paragraph summary, a timeline of notable risk changes, the highest risk observed, \
and recommended follow-up steps. If an image is attached, describe anything relevant it shows. \
Do not invent events that are not in the log.";

/// Build the aggregated prompt from the rolling log
pub fn build_prompt(log: &[String]) -> String {
    let mut prompt = String::from(REPORT_INSTRUCTIONS);
    prompt.push_str("\n\nMonitoring log (oldest first):\n");

    if log.is_empty() {
        prompt.push_str("(no entries were recorded during this session)\n");
    } else {
        for line in log {
            prompt.push_str(line);
            prompt.push('\n');
        }
    }

    prompt
}

/// Request a report for the given log and final frame. Never fails.
pub async fn generate_report(
    generator: &dyn ReportGenerator,
    log: &[String],
    last_frame: Option<&CapturedFrame>,
) -> String {
    let prompt = build_prompt(log);

    match generator.generate(&prompt, last_frame).await {
        Ok(text) => {
            info!("Incident report generated ({} log entries)", log.len());
            text
        }
        Err(e) => {
            warn!("Incident report generation failed: {}", e);
            REPORT_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use crate::service::ServiceError;

    struct RecordingGenerator {
        fail: bool,
        seen: Mutex<Vec<(String, bool)>>,
    }

    #[async_trait]
    impl ReportGenerator for RecordingGenerator {
        async fn generate(&self, prompt: &str, frame: Option<&CapturedFrame>) -> Result<String, ServiceError> {
            self.seen.lock().push((prompt.to_string(), frame.is_some()));
            if self.fail {
                Err(ServiceError::EmptyResponse)
            } else {
                Ok("report body".to_string())
            }
        }
    }

    #[test]
    fn test_prompt_keeps_log_order() {
        let log = vec!["[10:00:00] Risk: SAFE - a".to_string(), "[10:00:06] Risk: SUSPICIOUS - b".to_string()];
        let prompt = build_prompt(&log);
        let first = prompt.find("Risk: SAFE").unwrap();
        let second = prompt.find("Risk: SUSPICIOUS").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_prompt_for_empty_log() {
        assert!(build_prompt(&[]).contains("no entries were recorded"));
    }

    #[tokio::test]
    async fn test_report_passes_frame() {
        let generator = RecordingGenerator { fail: false, seen: Mutex::new(Vec::new()) };
        let frame = CapturedFrame::new("image/jpeg", vec![1, 2, 3]);

        let text = generate_report(&generator, &["entry".to_string()], Some(&frame)).await;

        assert_eq!(text, "report body");
        let seen = generator.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.contains("entry"));
        assert!(seen[0].1);
    }

    #[tokio::test]
    async fn test_report_failure_text() {
        let generator = RecordingGenerator { fail: true, seen: Mutex::new(Vec::new()) };
        let text = generate_report(&generator, &[], None).await;
        assert_eq!(text, REPORT_FAILED);
    }
}
