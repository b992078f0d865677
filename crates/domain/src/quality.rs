use serde::{Deserialize, Serialize};

use crate::signals::QualitySignals;
use crate::trust::TrustTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityDecision {
    Pass,
    Quarantine,
    Reject,
}

// 质检结论随版本落库后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub score: u8,
    pub decision: QualityDecision,
    pub reason: Option<String>,
    pub trust_tier: TrustTier,
    pub similar_recent_count: u32,
    pub signals: QualitySignals,
}

const REASON_TEMPLATE_SPAM: &str = "repeated template spam";
const REASON_THIN_CONTENT: &str = "thin/templated content";

// 各档阈值：档位越高越宽松
fn min_words(tier: TrustTier) -> usize {
    match tier {
        TrustTier::Low => 45,
        TrustTier::Medium => 35,
        TrustTier::Trusted => 28,
    }
}

fn min_chars(tier: TrustTier) -> usize {
    match tier {
        TrustTier::Low => 260,
        TrustTier::Medium => 180,
        TrustTier::Trusted => 140,
    }
}

fn duplicate_ceiling(tier: TrustTier) -> u32 {
    match tier {
        TrustTier::Low => 5,
        TrustTier::Medium => 8,
        TrustTier::Trusted => 12,
    }
}

fn quarantine_floor(tier: TrustTier) -> u8 {
    match tier {
        TrustTier::Low => 72,
        TrustTier::Medium => 60,
        TrustTier::Trusted => 50,
    }
}

pub fn assess(
    signals: QualitySignals,
    trust_tier: TrustTier,
    similar_recent_count: u32,
) -> QualityAssessment {
    let mut score: i32 = 100;
    if signals.char_count < 250 {
        score -= 28;
    }
    if signals.word_count < 80 {
        score -= 24;
    }
    if signals.unique_word_ratio < 0.45 {
        score -= 14;
    }
    if signals.heading_count < 2 {
        score -= 10;
    }
    if signals.bullet_count < 3 {
        score -= 8;
    }
    score -= ((signals.marketing_phrase_hits.min(3) as i32) * 9).min(28);
    if signals.generic_summary {
        score -= 20;
    }
    let score = score.max(0) as u8;

    // 硬拒绝与得分无关
    let duplicate_spam = similar_recent_count >= duplicate_ceiling(trust_tier);
    let too_thin = signals.word_count < min_words(trust_tier)
        || signals.char_count < min_chars(trust_tier)
        || (signals.marketing_phrase_hits >= 3 && signals.word_count < 120);

    let (decision, reason) = if duplicate_spam {
        (QualityDecision::Reject, Some(REASON_TEMPLATE_SPAM.into()))
    } else if too_thin {
        (QualityDecision::Reject, Some(REASON_THIN_CONTENT.into()))
    } else if score < quarantine_floor(trust_tier) {
        (QualityDecision::Quarantine, None)
    } else {
        (QualityDecision::Pass, None)
    };

    QualityAssessment {
        score,
        decision,
        reason,
        trust_tier,
        similar_recent_count,
        signals,
    }
}
