use crate::models::{FilterCriteria, Institution};

/// Returns the records satisfying every active constraint, in input order.
pub fn apply_filters(records: &[Institution], criteria: &FilterCriteria) -> Vec<Institution> {
    let needle = criteria.search.trim().to_lowercase();

    records
        .iter()
        .filter(|record| matches(record, criteria, &needle))
        .cloned()
        .collect()
}

fn matches(record: &Institution, criteria: &FilterCriteria, needle: &str) -> bool {
    if !needle.is_empty() && !search_text(record).contains(needle) {
        return false;
    }

    if !one_of(&criteria.states, &record.state)
        || !one_of(&criteria.institution_types, &record.institution_type)
        || !one_of(&criteria.carnegie_classifications, &record.carnegie_classification)
        || !one_of(&criteria.sizes, &record.size)
        || !one_of(&criteria.funding_models, &record.funding_model)
        || !one_of(&criteria.mission_types, &record.mission_type)
        || !one_of_optional(&criteria.program_structures, record.program_structure.as_ref())
        || !one_of_optional(
            &criteria.administration_models,
            record.administration_model.as_ref(),
        )
    {
        return false;
    }

    if let Some(range) = &criteria.enrollment {
        if !range.accepts(Some(record.total_enrollment)) {
            return false;
        }
    }
    if let Some(range) = &criteria.budget {
        if !range.accepts(record.wac_budget) {
            return false;
        }
    }
    if let Some(range) = &criteria.established_year {
        if !range.accepts(record.wac_established_year) {
            return false;
        }
    }

    let courses = &criteria.course_offerings;
    let offered = &record.course_offerings;
    let flags_ok = criteria.has_wac_program.accepts(record.has_wac_program)
        && criteria.has_writing_center.accepts(record.has_writing_center)
        && criteria
            .writing_fellows_program
            .accepts(record.writing_fellows_program)
        && criteria
            .faculty_development_program
            .accepts(record.faculty_development_program)
        && courses
            .first_year_composition
            .accepts(offered.first_year_composition)
        && courses
            .writing_in_disciplines
            .accepts(offered.writing_in_disciplines)
        && courses
            .writing_intensive_requirement
            .accepts(offered.writing_intensive_requirement)
        && courses
            .advanced_composition
            .accepts(offered.advanced_composition);
    if !flags_ok {
        return false;
    }

    let msi = &criteria.msi;
    (!msi.hbcu || record.msi.hbcu)
        && (!msi.hsi || record.msi.hsi)
        && (!msi.aanapisi || record.msi.aanapisi)
        && (!msi.tribal || record.msi.tribal)
        && (!msi.other || record.msi.other)
}

/// Lowercased haystack for free-text search.
fn search_text(record: &Institution) -> String {
    format!(
        "{} {} {} {} {} {}",
        record.name,
        record.short_name,
        record.city,
        record.state,
        record.institution_type.label(),
        record.carnegie_classification
    )
    .to_lowercase()
}

fn one_of<T: PartialEq>(allowed: &[T], value: &T) -> bool {
    allowed.is_empty() || allowed.contains(value)
}

// An active selection never matches a record that has no value.
fn one_of_optional<T: PartialEq>(allowed: &[T], value: Option<&T>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.contains(v))
}
