use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::models::{
    CategoryCount, GroundTruth, Institution, InstitutionType, StatisticsSummary, ValidationChecks,
    ValidationMetadata,
};

pub const R1_PREFIX: &str = "R1:";
pub const R2_PREFIX: &str = "R2:";

/// Formats `count / total` as a percentage string; a zero total renders as "0%".
pub fn format_percentage(count: usize, total: usize, decimals: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let value = count as f64 / total as f64 * 100.0;
    format!("{value:.decimals$}%")
}

/// Short chart label for a Carnegie classification.
pub fn simplify_carnegie(classification: &str) -> String {
    let trimmed = classification.trim();
    let label = match trimmed {
        c if c.starts_with("R1") => "R1",
        c if c.starts_with("R2") => "R2",
        c if c.starts_with("D/PU") => "D/PU",
        c if c.starts_with("M1") => "Master's (L)",
        c if c.starts_with("M2") => "Master's (M)",
        c if c.starts_with("M3") => "Master's (S)",
        c if c.starts_with("Baccalaureate Colleges: Arts") => "Baccalaureate (A&S)",
        c if c.starts_with("Baccalaureate Colleges: Diverse") => "Baccalaureate (Diverse)",
        c if c.starts_with("Baccalaureate") => "Baccalaureate",
        c if c.starts_with("Associate") => "Associate's",
        c if c.starts_with("Special Focus") => "Special Focus",
        c => return c.split(':').next().unwrap_or(c).trim().to_string(),
    };
    label.to_string()
}

pub fn breakdown<'a, I>(values: I, total: usize) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut map: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *map.entry(value).or_insert(0) += 1;
    }

    let mut counts: Vec<CategoryCount> = map
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
            percentage: format_percentage(count, total, 1),
        })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

pub fn compute_statistics(records: &[Institution], with_validation: bool) -> StatisticsSummary {
    let total = records.len();

    let with_wac = records
        .iter()
        .filter(|r| r.has_wac_program == Some(true))
        .count();
    let with_centers = records
        .iter()
        .filter(|r| r.has_writing_center == Some(true))
        .count();

    let average_enrollment = if total == 0 {
        0.0
    } else {
        let sum: u64 = records.iter().map(|r| u64::from(r.total_enrollment)).sum();
        (sum as f64 / total as f64).round()
    };

    let budgets: Vec<f64> = records.iter().filter_map(|r| r.wac_budget).collect();
    let average_wac_budget = if budgets.is_empty() {
        None
    } else {
        Some((budgets.iter().sum::<f64>() / budgets.len() as f64).round())
    };

    let total_writing_intensive_courses = records
        .iter()
        .filter_map(|r| r.writing_intensive_courses)
        .sum();

    let simplified: Vec<String> = records
        .iter()
        .map(|r| simplify_carnegie(&r.carnegie_classification))
        .collect();

    let mut summary = StatisticsSummary {
        total_institutions: total,
        with_wac_programs: with_wac,
        wac_program_percentage: format_percentage(with_wac, total, 1),
        with_writing_centers: with_centers,
        writing_center_percentage: format_percentage(with_centers, total, 1),
        average_enrollment,
        average_wac_budget,
        total_writing_intensive_courses,
        by_type: breakdown(records.iter().map(|r| r.institution_type.label()), total),
        by_carnegie: breakdown(
            records.iter().map(|r| r.carnegie_classification.as_str()),
            total,
        ),
        by_carnegie_simplified: breakdown(simplified.iter().map(String::as_str), total),
        by_state: breakdown(records.iter().map(|r| r.state.as_str()), total),
        validation: None,
    };

    if with_validation {
        summary.validation = Some(validate(records, &summary));
    }

    summary
}

fn validate(records: &[Institution], summary: &StatisticsSummary) -> ValidationMetadata {
    let total = records.len();
    let mut ids = HashSet::new();
    let ids_unique = records.iter().all(|r| ids.insert(r.id.as_str()));

    let sums_to_total = |counts: &[CategoryCount]| {
        counts.iter().map(|c| c.count).sum::<usize>() == total
    };

    let checks = ValidationChecks {
        all_have_wac_flag: records.iter().all(|r| r.has_wac_program.is_some()),
        all_have_writing_center_flag: records.iter().all(|r| r.has_writing_center.is_some()),
        all_have_valid_coordinates: records
            .iter()
            .all(|r| r.coordinates.is_some_and(|c| c.is_valid())),
        ids_unique,
        enrollment_consistent: records.iter().all(|r| {
            u64::from(r.undergraduate_enrollment) + u64::from(r.graduate_enrollment)
                <= u64::from(r.total_enrollment)
        }),
        breakdowns_sum_to_total: sums_to_total(&summary.by_type)
            && sums_to_total(&summary.by_carnegie)
            && sums_to_total(&summary.by_carnegie_simplified)
            && sums_to_total(&summary.by_state),
    };

    let of_type = |kind: InstitutionType| {
        records
            .iter()
            .filter(|r| r.institution_type == kind)
            .count()
    };
    let with_prefix = |prefix: &str| {
        records
            .iter()
            .filter(|r| r.carnegie_classification.starts_with(prefix))
            .count()
    };

    let ground_truth = GroundTruth {
        total,
        public: of_type(InstitutionType::Public),
        private: of_type(InstitutionType::Private),
        community: of_type(InstitutionType::Community),
        r1: with_prefix(R1_PREFIX),
        r2: with_prefix(R2_PREFIX),
        with_wac_programs: summary.with_wac_programs,
        with_writing_centers: summary.with_writing_centers,
        minority_serving: records.iter().filter(|r| r.msi.any()).count(),
    };

    ValidationMetadata {
        generated_at: Utc::now(),
        checks,
        ground_truth,
    }
}
