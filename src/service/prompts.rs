// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Prompt text and structured-output schema for the assessment model

use serde_json::{json, Value};

use crate::assessment::RiskLevel;

pub(crate) const ASSESSMENT_INSTRUCTIONS: &str = "You are a personal safety monitor. \
Fuse the attached camera frame, ambient audio clip and situational context into a single risk assessment \
for the person carrying the device. Score 0 means no risk and 100 means immediate danger. \
Use SAFE for normal surroundings, UNCERTAIN when the evidence is insufficient, SUSPICIOUS for \
unusual behaviour or sounds, DANGEROUS for an active threat and CRITICAL when harm is imminent. \
Keep the reason and recommended action to one short sentence each.";

/// Response schema enforcing the closed level set
pub(crate) fn assessment_schema() -> Value {
    let levels: Vec<&str> = RiskLevel::ALL.iter().map(|l| l.as_str()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "riskLevel": { "type": "STRING", "enum": levels },
            "score": { "type": "INTEGER" },
            "reason": { "type": "STRING" },
            "recommendedAction": { "type": "STRING" },
            "detectedThreats": { "type": "ARRAY", "items": { "type": "STRING" } },
            "audioAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "transcription": { "type": "STRING" },
                    "detectedSounds": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "vocalStress": { "type": "STRING" }
                }
            },
            "contextAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "timeRisk": { "type": "STRING" },
                    "locationRisk": { "type": "STRING" },
                    "crowdDensity": { "type": "STRING" }
                }
            }
        },
        "required": ["riskLevel", "score", "reason", "recommendedAction", "detectedThreats"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_enumerates_all_levels() {
        let schema = assessment_schema();
        let levels = schema["properties"]["riskLevel"]["enum"].as_array().unwrap();
        assert_eq!(levels.len(), 5);
        assert!(levels.contains(&json!("SUSPICIOUS")));
    }
}
