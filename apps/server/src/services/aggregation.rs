//! Aggregation of individual test results into container counters and scores.

use std::collections::btree_map::Entry;

use uuid::Uuid;

use crate::models::{
    ClassMethodIndexMap, NewTestResultContainer, Score, ScoreCategory, SeverityLevel,
    TestResultSummary, TestStatus,
};

/// Everything a container derives from its test results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContainerAggregate {
    pub test_results: Vec<Uuid>,
    pub test_result_class_method_index_map: ClassMethodIndexMap,
    pub failed_tests: i32,
    pub succeeded_tests: i32,
    pub disabled_tests: i32,
    pub score: Score,
}

impl ContainerAggregate {
    /// Fold test result summaries, in order, into counters, index map and score.
    ///
    /// Disabled tests are counted but never scored. A succeeded test adds its
    /// severity weight to both `Reached` and `Total` of each category it is
    /// tagged with; a failed one only to `Total`. When two summaries share a
    /// "Class.method" key the first one keeps the index.
    pub fn from_summaries(summaries: &[TestResultSummary]) -> Self {
        let mut aggregate = Self::default();
        let mut security = Tally::default();
        let mut interoperability = Tally::default();

        for (index, summary) in summaries.iter().enumerate() {
            aggregate.test_results.push(summary.id);

            if let Entry::Vacant(slot) = aggregate
                .test_result_class_method_index_map
                .entry(summary.class_method_key())
            {
                slot.insert(index as u32);
            }

            match summary.status {
                TestStatus::Succeeded => aggregate.succeeded_tests += 1,
                TestStatus::Failed => aggregate.failed_tests += 1,
                TestStatus::Disabled => aggregate.disabled_tests += 1,
            }

            security.add(summary.status, summary.security);
            interoperability.add(summary.status, summary.interoperability);
        }

        aggregate.score = Score::new(security.finish(), interoperability.finish());
        aggregate
    }

    /// Copy the aggregate onto a create request.
    pub fn apply_to(self, request: &mut NewTestResultContainer) {
        request.test_results = self.test_results;
        request.test_result_class_method_index_map = self.test_result_class_method_index_map;
        request.failed_tests = self.failed_tests;
        request.succeeded_tests = self.succeeded_tests;
        request.disabled_tests = self.disabled_tests;
        request.score = self.score;
    }
}

#[derive(Default)]
struct Tally {
    reached: i32,
    total: i32,
}

impl Tally {
    fn add(&mut self, status: TestStatus, severity: Option<SeverityLevel>) {
        let Some(severity) = severity else {
            return;
        };
        let weight = severity.weight();
        match status {
            TestStatus::Succeeded => {
                self.reached += weight;
                self.total += weight;
            }
            TestStatus::Failed => self.total += weight,
            TestStatus::Disabled => {}
        }
    }

    fn finish(self) -> ScoreCategory {
        ScoreCategory::new(self.reached, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(
        class_name: &str,
        method_name: &str,
        status: TestStatus,
        security: Option<SeverityLevel>,
        interoperability: Option<SeverityLevel>,
    ) -> TestResultSummary {
        TestResultSummary {
            id: Uuid::now_v7(),
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            status,
            security,
            interoperability,
        }
    }

    #[test]
    fn test_empty_input() {
        let aggregate = ContainerAggregate::from_summaries(&[]);
        assert_eq!(aggregate, ContainerAggregate::default());
        assert_eq!(aggregate.score.security.percentage, 0.0);
    }

    #[test]
    fn test_counters_and_order() {
        let summaries = vec![
            summary("AlertProtocol", "closeNotify", TestStatus::Succeeded, None, None),
            summary("AlertProtocol", "unknownAlert", TestStatus::Failed, None, None),
            summary("Cookie", "echoCookie", TestStatus::Disabled, None, None),
        ];

        let aggregate = ContainerAggregate::from_summaries(&summaries);

        assert_eq!(aggregate.succeeded_tests, 1);
        assert_eq!(aggregate.failed_tests, 1);
        assert_eq!(aggregate.disabled_tests, 1);
        assert_eq!(
            aggregate.test_results,
            summaries.iter().map(|s| s.id).collect::<Vec<_>>()
        );
        assert_eq!(
            aggregate.test_result_class_method_index_map["Cookie.echoCookie"],
            2
        );
    }

    #[test]
    fn test_scores_weighted_by_severity() {
        let summaries = vec![
            summary("A", "high", TestStatus::Succeeded, Some(SeverityLevel::High), None),
            summary("A", "medium", TestStatus::Failed, Some(SeverityLevel::Medium), Some(SeverityLevel::Low)),
            summary("A", "low", TestStatus::Succeeded, None, Some(SeverityLevel::Low)),
            summary("A", "skipped", TestStatus::Disabled, Some(SeverityLevel::Critical), None),
        ];

        let score = ContainerAggregate::from_summaries(&summaries).score;

        assert_eq!(score.security, ScoreCategory::new(100, 160));
        assert!((score.security.percentage - 62.5).abs() < f64::EPSILON);
        assert_eq!(score.interoperability, ScoreCategory::new(20, 40));
        assert_eq!(score.interoperability.percentage, 50.0);
    }

    #[test]
    fn test_duplicate_key_keeps_first_index() {
        let summaries = vec![
            summary("A", "m", TestStatus::Failed, None, None),
            summary("A", "m", TestStatus::Succeeded, None, None),
        ];

        let aggregate = ContainerAggregate::from_summaries(&summaries);

        assert_eq!(aggregate.test_result_class_method_index_map.len(), 1);
        assert_eq!(aggregate.test_result_class_method_index_map["A.m"], 0);
        assert_eq!(aggregate.test_results.len(), 2);
    }

    #[test]
    fn test_applied_request_is_consistent() {
        let summaries = vec![
            summary("A", "one", TestStatus::Succeeded, Some(SeverityLevel::Low), None),
            summary("A", "two", TestStatus::Failed, Some(SeverityLevel::Low), None),
        ];
        let mut request = NewTestResultContainer::new("run-42");

        ContainerAggregate::from_summaries(&summaries).apply_to(&mut request);

        assert!(request.is_consistent());
        assert!(request.validate().is_ok());
        assert_eq!(request.score.security.percentage, 50.0);
    }
}
