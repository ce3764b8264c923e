use serde::Serialize;

use crate::models::{Confidence, ScanOutcome};

const SCAN_SUMMARY: &str = "Report analysis completed. Please review findings below.";
const SCAN_CONFIDENCE: i64 = 85;

const ANALYSIS_SUMMARY: &str = "AI analysis of your medical report";
const ANALYSIS_CONFIDENCE: u8 = 87;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnalysis {
    pub summary: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub risk_level: String,
    pub confidence: u8,
}

/// Fixed analysis. Report type and extracted text do not influence the result.
pub fn analyze_report(_report_type: Option<&str>, _extracted_text: Option<&str>) -> ReportAnalysis {
    ReportAnalysis {
        summary: ANALYSIS_SUMMARY.to_string(),
        findings: vec![
            "Finding 1 based on AI analysis".to_string(),
            "Finding 2 based on AI analysis".to_string(),
        ],
        recommendations: vec![
            "Recommendation 1 from AI".to_string(),
            "Recommendation 2 from AI".to_string(),
        ],
        risk_level: "Low".to_string(),
        confidence: ANALYSIS_CONFIDENCE,
    }
}

/// Content written to a report when its deferred scan completes.
pub fn scan_outcome() -> ScanOutcome {
    ScanOutcome {
        ai_summary: SCAN_SUMMARY.to_string(),
        findings: vec!["Finding 1".into(), "Finding 2".into(), "Finding 3".into()],
        recommendations: vec!["Recommendation 1".into(), "Recommendation 2".into()],
        confidence: Confidence::new(SCAN_CONFIDENCE).unwrap_or(Confidence::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_is_fixed() {
        let a = analyze_report(Some("X-Ray"), Some("opacity in left lobe"));
        assert_eq!(a, analyze_report(None, None));
        assert_eq!(a.risk_level, "Low");
        assert_eq!(a.confidence, 87);
        assert_eq!(a.findings.len(), 2);
    }

    #[test]
    fn scan_outcome_shape() {
        let outcome = scan_outcome();
        assert_eq!(outcome.findings.len(), 3);
        assert_eq!(outcome.recommendations.len(), 2);
        assert_eq!(outcome.confidence.value(), 85);
    }
}
