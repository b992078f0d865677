use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Low,
    Medium,
    Trusted,
}

/// 账号可信度分档：账龄 + 历史发布量。每次发布现算，不落库。
pub fn classify(account_age: Duration, prior_skill_count: u32) -> TrustTier {
    if account_age < Duration::days(30) || prior_skill_count < 10 {
        TrustTier::Low
    } else if account_age < Duration::days(90) || prior_skill_count < 50 {
        TrustTier::Medium
    } else {
        TrustTier::Trusted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_table() {
        assert_eq!(classify(Duration::days(5), 100), TrustTier::Low);
        assert_eq!(classify(Duration::days(400), 3), TrustTier::Low);
        assert_eq!(classify(Duration::days(45), 20), TrustTier::Medium);
        assert_eq!(classify(Duration::days(400), 20), TrustTier::Medium);
        assert_eq!(classify(Duration::days(91), 50), TrustTier::Trusted);
    }

    #[test]
    fn boundaries() {
        // 恰好 30 天 / 10 个技能仍算 medium 的下界
        assert_eq!(classify(Duration::days(30), 10), TrustTier::Medium);
        assert_eq!(classify(Duration::days(90), 50), TrustTier::Trusted);
    }
}
