use crate::core::{PatternEntry, PatternExample, PatternReport};

pub const TOP_PATTERN_LIMIT: usize = 5;
pub const NO_PATTERN: &str = "None";

/// 統計已解決案件的解決模式
///
/// Patterns are grouped in first-seen order; the stable sort keeps that order
/// among patterns with equal counts.
pub fn analyze_patterns(entries: &[PatternEntry]) -> PatternReport {
    let mut frequency: Vec<(String, usize)> = Vec::new();
    let mut examples: Vec<(String, Vec<PatternExample>)> = Vec::new();

    for entry in entries {
        let example = PatternExample {
            order_id: entry.case_id.clone(),
            summary: entry.summary.clone(),
        };

        match frequency.iter().position(|(pattern, _)| *pattern == entry.pattern) {
            Some(index) => {
                frequency[index].1 += 1;
                examples[index].1.push(example);
            }
            None => {
                frequency.push((entry.pattern.clone(), 1));
                examples.push((entry.pattern.clone(), vec![example]));
            }
        }
    }

    frequency.sort_by(|a, b| b.1.cmp(&a.1));

    let top_patterns: Vec<String> = frequency
        .iter()
        .take(TOP_PATTERN_LIMIT)
        .map(|(pattern, _)| pattern.clone())
        .collect();

    let most_common = top_patterns.first().map(String::as_str).unwrap_or(NO_PATTERN);
    let analysis_summary = format!("Most common resolution pattern: {}", most_common);

    PatternReport {
        total_resolved: entries.len(),
        pattern_frequency: frequency,
        pattern_examples: examples,
        top_patterns,
        analysis_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(case_id: &str, pattern: &str) -> PatternEntry {
        PatternEntry {
            case_id: case_id.to_string(),
            pattern: pattern.to_string(),
            summary: format!("summary {}", case_id),
        }
    }

    #[test]
    fn test_empty_input() {
        let report = analyze_patterns(&[]);

        assert_eq!(report.total_resolved, 0);
        assert!(report.pattern_frequency.is_empty());
        assert!(report.pattern_examples.is_empty());
        assert!(report.top_patterns.is_empty());
        assert_eq!(report.analysis_summary, "Most common resolution pattern: None");
    }

    #[test]
    fn test_counts_sum_to_total_and_sorted() {
        let entries = vec![
            entry("1", "Refund"),
            entry("2", "Sync"),
            entry("3", "Sync"),
            entry("4", "Manual"),
            entry("5", "Sync"),
            entry("6", "Refund"),
        ];
        let report = analyze_patterns(&entries);

        let sum: usize = report.pattern_frequency.iter().map(|(_, c)| c).sum();
        assert_eq!(sum, report.total_resolved);
        assert_eq!(
            report.pattern_frequency,
            vec![
                ("Sync".to_string(), 3),
                ("Refund".to_string(), 2),
                ("Manual".to_string(), 1)
            ]
        );
        assert_eq!(report.top_patterns, vec!["Sync", "Refund", "Manual"]);
        assert_eq!(report.analysis_summary, "Most common resolution pattern: Sync");
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let entries = vec![entry("1", "B"), entry("2", "A"), entry("3", "C"), entry("4", "A")];
        let report = analyze_patterns(&entries);

        assert_eq!(report.top_patterns, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_top_patterns_capped_at_five() {
        let entries: Vec<PatternEntry> = (0..8)
            .map(|i| entry(&i.to_string(), &format!("P{}", i)))
            .collect();
        let report = analyze_patterns(&entries);

        assert_eq!(report.pattern_frequency.len(), 8);
        assert_eq!(report.top_patterns, vec!["P0", "P1", "P2", "P3", "P4"]);
    }

    #[test]
    fn test_examples_preserve_encounter_order() {
        let entries = vec![entry("9", "Refund"), entry("3", "Sync"), entry("1", "Refund")];
        let report = analyze_patterns(&entries);

        let (pattern, examples) = &report.pattern_examples[0];
        assert_eq!(pattern, "Refund");
        let ids: Vec<&str> = examples.iter().map(|e| e.order_id.as_str()).collect();
        assert_eq!(ids, vec!["9", "1"]);
    }
}
