// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Risk assessment model - levels, assessments and response validation

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::service::ServiceError;

/// Closed set of risk levels returned by the assessment service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Safe,
    #[serde(alias = "CAUTION")]
    Uncertain,
    Suspicious,
    #[serde(alias = "DANGER")]
    Dangerous,
    Critical,
}

impl RiskLevel {
    /// All levels, lowest severity first
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Safe,
        RiskLevel::Uncertain,
        RiskLevel::Suspicious,
        RiskLevel::Dangerous,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Uncertain => "UNCERTAIN",
            RiskLevel::Suspicious => "SUSPICIOUS",
            RiskLevel::Dangerous => "DANGEROUS",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Parse a wire name, accepting the 4-level aliases
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SAFE" => Some(RiskLevel::Safe),
            "UNCERTAIN" | "CAUTION" => Some(RiskLevel::Uncertain),
            "SUSPICIOUS" => Some(RiskLevel::Suspicious),
            "DANGEROUS" | "DANGER" => Some(RiskLevel::Dangerous),
            "CRITICAL" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    /// Levels that trigger local alerting
    pub fn is_alarming(&self) -> bool {
        matches!(self, RiskLevel::Dangerous | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio findings attached to an assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default)]
    pub detected_sounds: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocal_stress: Option<String>,
}

/// Situational findings attached to an assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_risk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_risk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crowd_density: Option<String>,
}

/// Result of one assessment cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub score: u8,
    pub reason: String,
    pub recommended_action: String,
    pub detected_threats: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_analysis: Option<AudioAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_analysis: Option<ContextAnalysis>,
}

impl RiskAssessment {
    fn fixed(level: RiskLevel, score: u8, reason: &str, action: &str) -> Self {
        Self {
            risk_level: level,
            score,
            reason: reason.to_string(),
            recommended_action: action.to_string(),
            detected_threats: Vec::new(),
            audio_analysis: None,
            context_analysis: None,
        }
    }

    /// Placeholder shown before the first cycle
    pub fn standby() -> Self {
        Self::fixed(
            RiskLevel::Safe,
            0,
            "System standby",
            "Start monitoring to begin assessment",
        )
    }

    /// Neutral baseline shown after monitoring stops
    pub fn paused() -> Self {
        Self::fixed(
            RiskLevel::Safe,
            0,
            "Monitoring paused",
            "Resume monitoring when needed",
        )
    }

    /// Degraded value used when the service fails
    pub fn fallback() -> Self {
        Self::fixed(
            RiskLevel::Uncertain,
            30,
            "Risk assessment service unavailable",
            "Stay alert and keep to well-lit, populated areas",
        )
    }

    /// Validate a structured JSON payload returned by the service.
    ///
    /// The level must be one of the closed set and the score is clamped to 0-100.
    pub fn from_json_str(payload: &str) -> Result<Self, ServiceError> {
        let raw: RawAssessment = serde_json::from_str(payload.trim())
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;
        raw.validate()
    }
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self::standby()
    }
}

/// Unvalidated service payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssessment {
    risk_level: String,
    score: serde_json::Number,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    recommended_action: String,
    #[serde(default)]
    detected_threats: Vec<String>,
    #[serde(default)]
    audio_analysis: Option<AudioAnalysis>,
    #[serde(default)]
    context_analysis: Option<ContextAnalysis>,
}

impl RawAssessment {
    fn validate(self) -> Result<RiskAssessment, ServiceError> {
        let risk_level = RiskLevel::parse(&self.risk_level)
            .ok_or_else(|| ServiceError::UnknownRiskLevel(self.risk_level.clone()))?;

        let score = self
            .score
            .as_f64()
            .filter(|s| s.is_finite())
            .ok_or_else(|| ServiceError::Malformed(format!("invalid score {}", self.score)))?;

        Ok(RiskAssessment {
            risk_level,
            score: clamp_score(score),
            reason: self.reason,
            recommended_action: self.recommended_action,
            detected_threats: self.detected_threats,
            audio_analysis: self.audio_analysis,
            context_analysis: self.context_analysis,
        })
    }
}

/// Round and clamp a raw score into 0-100
pub fn clamp_score(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let payload = r#"{
            "riskLevel": "SUSPICIOUS",
            "score": 62,
            "reason": "Person following closely",
            "recommendedAction": "Move toward the lit storefronts",
            "detectedThreats": ["follower", "isolated street"],
            "audioAnalysis": { "transcription": "hey", "detectedSounds": ["footsteps"], "vocalStress": "low" },
            "contextAnalysis": { "timeRisk": "late night", "crowdDensity": "sparse" }
        }"#;

        let assessment = RiskAssessment::from_json_str(payload).unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::Suspicious);
        assert_eq!(assessment.score, 62);
        assert_eq!(assessment.detected_threats, vec!["follower", "isolated street"]);
        let audio = assessment.audio_analysis.unwrap();
        assert_eq!(audio.detected_sounds, vec!["footsteps"]);
        assert_eq!(assessment.context_analysis.unwrap().location_risk, None);
    }

    #[test]
    fn test_score_is_clamped() {
        let high = r#"{"riskLevel":"CRITICAL","score":250.4,"reason":"r","recommendedAction":"a","detectedThreats":[]}"#;
        let low = r#"{"riskLevel":"SAFE","score":-12,"reason":"r","recommendedAction":"a","detectedThreats":[]}"#;

        assert_eq!(RiskAssessment::from_json_str(high).unwrap().score, 100);
        assert_eq!(RiskAssessment::from_json_str(low).unwrap().score, 0);
    }

    #[test]
    fn test_four_level_aliases() {
        let caution = r#"{"riskLevel":"CAUTION","score":40,"reason":"r","recommendedAction":"a","detectedThreats":[]}"#;
        let danger = r#"{"riskLevel":"danger","score":80,"reason":"r","recommendedAction":"a","detectedThreats":[]}"#;

        assert_eq!(RiskAssessment::from_json_str(caution).unwrap().risk_level, RiskLevel::Uncertain);
        assert_eq!(RiskAssessment::from_json_str(danger).unwrap().risk_level, RiskLevel::Dangerous);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let payload = r#"{"riskLevel":"SPOOKY","score":10,"reason":"r","recommendedAction":"a","detectedThreats":[]}"#;

        match RiskAssessment::from_json_str(payload) {
            Err(ServiceError::UnknownRiskLevel(level)) => assert_eq!(level, "SPOOKY"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            RiskAssessment::from_json_str("not json"),
            Err(ServiceError::Malformed(_))
        ));
        assert!(matches!(
            RiskAssessment::from_json_str(r#"{"score": 10}"#),
            Err(ServiceError::Malformed(_))
        ));
    }

    #[test]
    fn test_alarming_levels() {
        let alarming: Vec<_> = RiskLevel::ALL.iter().filter(|l| l.is_alarming()).collect();
        assert_eq!(alarming, vec![&RiskLevel::Dangerous, &RiskLevel::Critical]);
    }

    #[test]
    fn test_serialized_wire_names() {
        let json = serde_json::to_string(&RiskAssessment::fallback()).unwrap();
        assert!(json.contains(r#""riskLevel":"UNCERTAIN""#));
        assert!(json.contains(r#""recommendedAction""#));
        assert!(!json.contains("audioAnalysis"));
    }
}
