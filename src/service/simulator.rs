// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Simulated assessment service for demo mode

use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::prelude::*;

use super::{PlaceFinder, ReportGenerator, RiskAssessor, ServiceError};
use crate::assessment::{AudioAnalysis, ContextAnalysis, RiskAssessment, RiskLevel};
use crate::places::PlaceRef;
use crate::sensors::{CapturedFrame, Coordinates, SensorSnapshot};

/// Produces plausible assessments without a network dependency
pub struct SimulatedService {
    rng: Mutex<StdRng>,
    latency: Duration,
    failure_probability: f64,
}

impl SimulatedService {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            latency: Duration::from_millis(800),
            failure_probability: 0.05,
        }
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..Self::new()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failure_probability(mut self, probability: f64) -> Self {
        self.failure_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn roll_assessment(&self, snapshot: &SensorSnapshot) -> Result<RiskAssessment, ServiceError> {
        let mut rng = self.rng.lock();

        if rng.gen::<f64>() < self.failure_probability {
            return Err(ServiceError::EmptyResponse);
        }

        // Mostly calm streets with the occasional incident
        let roll: f64 = rng.gen();
        let (level, score, reason, action, threats): (_, u8, _, _, Vec<&str>) = if roll < 0.70 {
            (RiskLevel::Safe, rng.gen_range(0..20), "Normal surroundings", "Continue as planned", vec![])
        } else if roll < 0.85 {
            (RiskLevel::Uncertain, rng.gen_range(20..45), "Low visibility limits the assessment", "Stay on well-lit routes", vec!["low light"])
        } else if roll < 0.95 {
            (RiskLevel::Suspicious, rng.gen_range(45..70), "Someone has been following at a steady distance", "Head toward a populated area", vec!["follower"])
        } else if roll < 0.99 {
            (RiskLevel::Dangerous, rng.gen_range(70..90), "Raised voices and aggressive movement nearby", "Leave the area and call for help", vec!["aggression", "shouting"])
        } else {
            (RiskLevel::Critical, rng.gen_range(90..=100), "Physical confrontation detected", "Call emergency services now", vec!["assault"])
        };

        let audio_analysis = snapshot.audio_base64.as_ref().map(|_| AudioAnalysis {
            transcription: None,
            detected_sounds: if threats.is_empty() { vec!["traffic".to_string()] } else { vec!["voices".to_string()] },
            vocal_stress: Some(if level.is_alarming() { "high" } else { "low" }.to_string()),
        });

        Ok(RiskAssessment {
            risk_level: level,
            score,
            reason: reason.to_string(),
            recommended_action: action.to_string(),
            detected_threats: threats.into_iter().map(String::from).collect(),
            audio_analysis,
            context_analysis: Some(ContextAnalysis {
                time_risk: None,
                location_risk: None,
                crowd_density: Some(if rng.gen_bool(0.5) { "sparse" } else { "moderate" }.to_string()),
            }),
        })
    }
}

impl Default for SimulatedService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RiskAssessor for SimulatedService {
    async fn assess(&self, snapshot: &SensorSnapshot) -> Result<RiskAssessment, ServiceError> {
        tokio::time::sleep(self.latency).await;
        self.roll_assessment(snapshot)
    }
}

#[async_trait]
impl ReportGenerator for SimulatedService {
    async fn generate(&self, prompt: &str, frame: Option<&CapturedFrame>) -> Result<String, ServiceError> {
        tokio::time::sleep(self.latency).await;

        let entries = prompt.lines().filter(|l| l.starts_with('[')).count();
        Ok(format!(
            "INCIDENT REPORT (simulated)\n\nSummary: {} monitoring entries reviewed. {}\n\nRecommendation: Retain this report with the monitoring log.",
            entries,
            if frame.is_some() { "A final camera frame was attached." } else { "No camera frame was available." }
        ))
    }
}

#[async_trait]
impl PlaceFinder for SimulatedService {
    async fn find_places(&self, at: Coordinates, _query: &str) -> Result<Vec<PlaceRef>, ServiceError> {
        tokio::time::sleep(self.latency).await;

        let names = ["District Police Station", "General Hospital", "24h Pharmacy", "Fire Station"];
        Ok(names
            .iter()
            .enumerate()
            .map(|(i, name)| PlaceRef {
                title: name.to_string(),
                uri: Some(format!(
                    "https://maps.google.com/?q={:.5},{:.5}",
                    at.latitude + 0.002 * (i as f64 + 1.0),
                    at.longitude - 0.001 * (i as f64 + 1.0)
                )),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SensorSnapshot {
        SensorSnapshot {
            image_base64: None,
            image_mime: None,
            audio_base64: Some("AAAA".to_string()),
            audio_mime: Some("audio/wav".to_string()),
            location_context: "ctx".to_string(),
        }
    }

    #[test]
    fn test_seeded_sequence_is_reproducible() {
        let a = SimulatedService::seeded(7);
        let b = SimulatedService::seeded(7);

        for _ in 0..20 {
            let left = a.roll_assessment(&snapshot()).ok();
            let right = b.roll_assessment(&snapshot()).ok();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_scores_within_range() {
        let service = SimulatedService::seeded(42).with_failure_probability(0.0);
        for _ in 0..200 {
            let assessment = service.roll_assessment(&snapshot()).unwrap();
            assert!(assessment.score <= 100);
            assert!(assessment.audio_analysis.is_some());
        }
    }

    #[test]
    fn test_always_failing() {
        let service = SimulatedService::seeded(1).with_failure_probability(1.0);
        assert!(service.roll_assessment(&snapshot()).is_err());
    }
}
