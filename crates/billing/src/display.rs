//! Usage display formatting
//!
//! Pure functions shared by every usage indicator so that meters, badges,
//! and labels agree on the numbers.

use serde::Serialize;

/// Percentage threshold at and above which usage renders as critical
pub const CRITICAL_THRESHOLD: f64 = 90.0;
/// Percentage threshold at and above which usage renders as a warning
pub const WARNING_THRESHOLD: f64 = 75.0;

/// Usage against a cap as a percentage clamped to [0, 100].
///
/// A zero limit yields 0 rather than dividing; the fixed plan tables never
/// produce one, but future plans must not panic here.
pub fn usage_percentage(current: u32, limit: u32) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    ((f64::from(current) / f64::from(limit)) * 100.0).min(100.0)
}

/// Label shown beside a usage value, e.g. `"20 / 20"`
pub fn format_usage(current: u32, limit: u32) -> String {
    format!("{} / {}", current, limit)
}

/// Three-tier severity used uniformly across usage indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl UsageLevel {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if percentage >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    pub fn for_usage(current: u32, limit: u32) -> Self {
        Self::for_percentage(usage_percentage(current, limit))
    }

    /// Style hook consumed by the UI
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Normal => "usage-normal",
            Self::Warning => "usage-warning",
            Self::Critical => "usage-critical",
        }
    }
}

impl std::fmt::Display for UsageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_endpoints() {
        assert!((usage_percentage(0, 20)).abs() < f64::EPSILON);
        assert!((usage_percentage(20, 20) - 100.0).abs() < f64::EPSILON);
        // Clamped, not 200
        assert!((usage_percentage(40, 20) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_zero_limit_does_not_divide() {
        assert!((usage_percentage(5, 0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(UsageLevel::for_percentage(0.0), UsageLevel::Normal);
        assert_eq!(UsageLevel::for_percentage(74.9), UsageLevel::Normal);
        assert_eq!(UsageLevel::for_percentage(75.0), UsageLevel::Warning);
        assert_eq!(UsageLevel::for_percentage(89.9), UsageLevel::Warning);
        assert_eq!(UsageLevel::for_percentage(90.0), UsageLevel::Critical);
        assert_eq!(UsageLevel::for_percentage(100.0), UsageLevel::Critical);
    }

    #[test]
    fn test_full_daily_usage_renders_critical() {
        // 20 of 20 on the free tier reads "20 / 20" in the critical tier
        assert_eq!(format_usage(20, 20), "20 / 20");
        assert_eq!(UsageLevel::for_usage(20, 20), UsageLevel::Critical);
    }

    #[test]
    fn test_level_for_usage_examples() {
        assert_eq!(UsageLevel::for_usage(10, 100), UsageLevel::Normal);
        assert_eq!(UsageLevel::for_usage(80, 100), UsageLevel::Warning);
        assert_eq!(UsageLevel::for_usage(95, 100), UsageLevel::Critical);
    }
}
