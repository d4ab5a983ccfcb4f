use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::models::Institution;
use crate::stats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Dataset only.
    #[default]
    Standard,
    /// Dataset plus ground-truth counts the model must reconcile its answers against.
    Verified,
}

#[derive(Debug, Clone, Default)]
pub struct PromptConfig {
    pub mode: PromptMode,
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "not surveyed",
    }
}

fn or_unreported<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "not reported".to_string(), |v| v.to_string())
}

fn describe(output: &mut String, record: &Institution) {
    let _ = writeln!(
        output,
        "- {} ({}), {}, {}: {} {}, {}",
        record.name,
        record.short_name,
        record.city,
        record.state,
        record.institution_type.label(),
        record.size.label(),
        record.carnegie_classification
    );
    let _ = writeln!(
        output,
        "  enrollment {} ({} undergraduate, {} graduate), founded {}",
        record.total_enrollment,
        record.undergraduate_enrollment,
        record.graduate_enrollment,
        record.founded_year
    );
    let _ = writeln!(
        output,
        "  WAC program: {}, established {}, budget {}, WI courses {}",
        yes_no(record.has_wac_program),
        or_unreported(record.wac_established_year),
        or_unreported(record.wac_budget),
        or_unreported(record.writing_intensive_courses)
    );
    let _ = writeln!(
        output,
        "  writing center: {}, staff {}, tutors {}, fellows: {}, \
         faculty development: {}, workshops/year {}",
        yes_no(record.has_writing_center),
        or_unreported(record.writing_center_staff),
        or_unreported(record.tutors),
        yes_no(record.writing_fellows_program),
        yes_no(record.faculty_development_program),
        or_unreported(record.faculty_workshops_per_year)
    );
    let courses = &record.course_offerings;
    let _ = writeln!(
        output,
        "  courses: first-year composition: {}, writing in the disciplines: {}, \
         WI requirement: {}, advanced composition: {}",
        yes_no(courses.first_year_composition),
        yes_no(courses.writing_in_disciplines),
        yes_no(courses.writing_intensive_requirement),
        yes_no(courses.advanced_composition)
    );
    let wpa = &record.wpa_credentials;
    let _ = writeln!(
        output,
        "  WPA: PhD in rhetoric/composition: {}, tenure-line: {}, dedicated WPA: {}",
        yes_no(wpa.phd_rhet_comp),
        yes_no(wpa.tenure_line),
        yes_no(wpa.dedicated_wpa)
    );

    let mut designations = Vec::new();
    if record.msi.hbcu {
        designations.push("HBCU");
    }
    if record.msi.hsi {
        designations.push("HSI");
    }
    if record.msi.aanapisi {
        designations.push("AANAPISI");
    }
    if record.msi.tribal {
        designations.push("Tribal");
    }
    if record.msi.other {
        designations.push("other MSI");
    }
    if !designations.is_empty() {
        let _ = writeln!(output, "  minority-serving: {}", designations.join(", "));
    }
    if let Some(affiliation) = &record.religious_affiliation {
        let _ = writeln!(output, "  religious affiliation: {affiliation}");
    }
}

/// Flattens the dataset into the chat system prompt.
pub fn build_system_prompt(records: &[Institution], config: &PromptConfig) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "You are an assistant answering questions about \
         Writing Across the Curriculum (WAC) programs."
    );
    let _ = writeln!(
        output,
        "Answer only from the {} institutions listed below. \
         Say so when the data does not cover a question.",
        records.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Institutions");

    if records.is_empty() {
        let _ = writeln!(output, "No institutions loaded.");
    }
    for record in records {
        describe(&mut output, record);
    }

    if config.mode == PromptMode::Verified {
        let summary = stats::compute_statistics(records, true);
        if let Some(validation) = summary.validation {
            let truth = validation.ground_truth;
            let _ = writeln!(output);
            let _ = writeln!(output, "## Verified Counts");
            let _ = writeln!(
                output,
                "Any count you report must agree with these figures (computed {}):",
                validation.generated_at.format("%Y-%m-%d %H:%M UTC")
            );
            let _ = writeln!(output, "- total institutions: {}", truth.total);
            let _ = writeln!(
                output,
                "- public {}, private {}, community {}",
                truth.public, truth.private, truth.community
            );
            let _ = writeln!(output, "- R1 {}, R2 {}", truth.r1, truth.r2);
            let _ = writeln!(
                output,
                "- with WAC programs {} ({})",
                truth.with_wac_programs, summary.wac_program_percentage
            );
            let _ = writeln!(
                output,
                "- with writing centers {} ({})",
                truth.with_writing_centers, summary.writing_center_percentage
            );
            let _ = writeln!(output, "- minority-serving {}", truth.minority_serving);
        }
    }

    output
}
