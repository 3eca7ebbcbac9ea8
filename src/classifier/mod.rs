// src/classifier/mod.rs
// Request classification gate: an ordered rule table mapping a RequestSignal to a
// deny / challenge / allow verdict. The first matching rule wins.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ScoreThresholds;
use crate::signals::user_agent::is_suspicious_user_agent;
use crate::signals::RequestSignal;

pub mod response;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allowed,
    Challenged,
    Denied,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allowed => "allowed",
            Verdict::Challenged => "challenged",
            Verdict::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClassificationResult {
    pub verdict: Verdict,
    pub score: u8,
    pub timestamp: String,
    /// Name of the policy rule that produced the verdict.
    pub rule: &'static str,
    pub client_address: String,
}

/// One row of the policy table.
pub struct PolicyRule {
    pub name: &'static str,
    pub verdict: Verdict,
    applies: fn(&RequestSignal, &ScoreThresholds) -> bool,
}

impl PolicyRule {
    pub fn applies(&self, signal: &RequestSignal, thresholds: &ScoreThresholds) -> bool {
        (self.applies)(signal, thresholds)
    }
}

/// Identity signals come before reputation: a denylisted client string is
/// rejected even when the request is verified with a clean score.
pub static POLICY_RULES: [PolicyRule; 4] = [
    PolicyRule {
        name: "suspicious_user_agent",
        verdict: Verdict::Denied,
        applies: |signal, _| is_suspicious_user_agent(&signal.user_agent),
    },
    PolicyRule {
        name: "high_confidence_automation",
        verdict: Verdict::Denied,
        applies: |signal, thresholds| {
            signal.reputation_score > thresholds.deny_above && !signal.verified
        },
    },
    PolicyRule {
        name: "ambiguous_traffic",
        verdict: Verdict::Challenged,
        applies: |signal, thresholds| {
            signal.reputation_score > thresholds.challenge_above
                && signal.reputation_score <= thresholds.deny_above
        },
    },
    PolicyRule {
        name: "default_allow",
        verdict: Verdict::Allowed,
        applies: |_, _| true,
    },
];

/// Find the first rule that matches. The last rule always matches.
pub fn evaluate_policy(signal: &RequestSignal, thresholds: &ScoreThresholds) -> &'static PolicyRule {
    POLICY_RULES
        .iter()
        .find(|rule| rule.applies(signal, thresholds))
        .unwrap_or(&POLICY_RULES[POLICY_RULES.len() - 1])
}

pub fn classify(signal: &RequestSignal, thresholds: &ScoreThresholds) -> ClassificationResult {
    classify_at(signal, thresholds, Utc::now())
}

pub fn classify_at(
    signal: &RequestSignal,
    thresholds: &ScoreThresholds,
    now: DateTime<Utc>,
) -> ClassificationResult {
    let rule = evaluate_policy(signal, thresholds);
    ClassificationResult {
        verdict: rule.verdict,
        score: signal.reputation_score,
        timestamp: crate::iso_timestamp(now),
        rule: rule.name,
        client_address: signal.client_address.clone(),
    }
}
