use std::cmp::Ordering;

use crate::models::{Institution, SortDirection, SortField, SortSpecification};

/// A field value reduced to something comparable.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
    Flag(bool),
    Unordered,
    Missing,
}

fn sort_key(record: &Institution, field: SortField) -> SortKey<'_> {
    fn number<T: Into<f64>>(value: Option<T>) -> SortKey<'static> {
        value.map_or(SortKey::Missing, |v| SortKey::Number(v.into()))
    }
    fn flag(value: Option<bool>) -> SortKey<'static> {
        value.map_or(SortKey::Missing, SortKey::Flag)
    }

    match field {
        SortField::Name => SortKey::Text(&record.name),
        SortField::ShortName => SortKey::Text(&record.short_name),
        SortField::State => SortKey::Text(&record.state),
        SortField::City => SortKey::Text(&record.city),
        SortField::Coordinates => match record.coordinates {
            Some(_) => SortKey::Unordered,
            None => SortKey::Missing,
        },
        SortField::InstitutionType => SortKey::Text(record.institution_type.label()),
        SortField::CarnegieClassification => SortKey::Text(&record.carnegie_classification),
        SortField::Size => SortKey::Text(record.size.label()),
        SortField::FundingModel => SortKey::Text(record.funding_model.label()),
        SortField::MissionType => SortKey::Text(record.mission_type.label()),
        SortField::TotalEnrollment => number(Some(record.total_enrollment)),
        SortField::UndergraduateEnrollment => number(Some(record.undergraduate_enrollment)),
        SortField::GraduateEnrollment => number(Some(record.graduate_enrollment)),
        SortField::FoundedYear => number(Some(record.founded_year)),
        SortField::WacEstablishedYear => number(record.wac_established_year),
        SortField::WacBudget => number(record.wac_budget),
        SortField::WritingIntensiveCourses => number(record.writing_intensive_courses),
        SortField::WritingCenterStaff => number(record.writing_center_staff),
        SortField::Tutors => number(record.tutors),
        SortField::FacultyWorkshopsPerYear => number(record.faculty_workshops_per_year),
        SortField::HasWacProgram => flag(record.has_wac_program),
        SortField::HasWritingCenter => flag(record.has_writing_center),
        SortField::WritingFellowsProgram => flag(record.writing_fellows_program),
        SortField::FacultyDevelopmentProgram => flag(record.faculty_development_program),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_keys(a: SortKey<'_>, b: SortKey<'_>, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        // Missing values sink regardless of direction.
        (SortKey::Missing, SortKey::Missing) => return Ordering::Equal,
        (SortKey::Missing, _) => return Ordering::Greater,
        (_, SortKey::Missing) => return Ordering::Less,
        (SortKey::Text(a), SortKey::Text(b)) => compare_text(a, b),
        (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (SortKey::Flag(a), SortKey::Flag(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    };

    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Stable sort into a new vector; records with missing values always come last.
pub fn sort_institutions(records: &[Institution], spec: SortSpecification) -> Vec<Institution> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        compare_keys(
            sort_key(a, spec.field),
            sort_key(b, spec.field),
            spec.direction,
        )
    });
    sorted
}
