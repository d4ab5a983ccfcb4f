use anyhow::Context;
use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::models::Institution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Exportable columns. Every column has a fixed label and renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ExportField {
    Id,
    Name,
    ShortName,
    State,
    City,
    Latitude,
    Longitude,
    InstitutionType,
    CarnegieClassification,
    Size,
    FundingModel,
    MissionType,
    ReligiousAffiliation,
    Specialization,
    ProgramStructure,
    AdministrationModel,
    TotalEnrollment,
    UndergraduateEnrollment,
    GraduateEnrollment,
    FoundedYear,
    WacEstablishedYear,
    WacBudget,
    WritingIntensiveCourses,
    WritingCenterStaff,
    Tutors,
    FacultyWorkshopsPerYear,
    HasWacProgram,
    HasWritingCenter,
    WritingFellowsProgram,
    FacultyDevelopmentProgram,
    FirstYearComposition,
    WritingInDisciplines,
    WritingIntensiveRequirement,
    AdvancedComposition,
    WpaPhdRhetComp,
    WpaTenureLine,
    DedicatedWpa,
    Hbcu,
    Hsi,
    Aanapisi,
    Tribal,
    OtherMsi,
}

pub const DEFAULT_FIELDS: &[ExportField] = &[
    ExportField::Name,
    ExportField::State,
    ExportField::City,
    ExportField::InstitutionType,
    ExportField::CarnegieClassification,
    ExportField::TotalEnrollment,
    ExportField::HasWacProgram,
    ExportField::WacEstablishedYear,
    ExportField::WacBudget,
    ExportField::HasWritingCenter,
    ExportField::WritingIntensiveCourses,
];

enum Cell {
    Text(String),
    Number(f64),
    Flag(bool),
    Empty,
}

impl Cell {
    fn render(self) -> String {
        match self {
            Cell::Text(value) => value,
            Cell::Number(value) => value.to_string(),
            Cell::Flag(true) => "Yes".to_string(),
            Cell::Flag(false) => "No".to_string(),
            Cell::Empty => String::new(),
        }
    }

    fn into_json(self) -> Value {
        match self {
            Cell::Text(value) => Value::String(value),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
                Value::from(value as i64)
            }
            Cell::Number(value) => Value::from(value),
            Cell::Flag(value) => Value::Bool(value),
            Cell::Empty => Value::Null,
        }
    }
}

fn text(value: impl Into<String>) -> Cell {
    Cell::Text(value.into())
}

fn number<T: Into<f64>>(value: Option<T>) -> Cell {
    value.map_or(Cell::Empty, |v| Cell::Number(v.into()))
}

fn flag(value: Option<bool>) -> Cell {
    value.map_or(Cell::Empty, Cell::Flag)
}

impl ExportField {
    pub fn label(self) -> &'static str {
        match self {
            ExportField::Id => "ID",
            ExportField::Name => "Institution",
            ExportField::ShortName => "Short Name",
            ExportField::State => "State",
            ExportField::City => "City",
            ExportField::Latitude => "Latitude",
            ExportField::Longitude => "Longitude",
            ExportField::InstitutionType => "Type",
            ExportField::CarnegieClassification => "Carnegie Classification",
            ExportField::Size => "Size",
            ExportField::FundingModel => "Funding Model",
            ExportField::MissionType => "Mission",
            ExportField::ReligiousAffiliation => "Religious Affiliation",
            ExportField::Specialization => "Specialization",
            ExportField::ProgramStructure => "Program Structure",
            ExportField::AdministrationModel => "Administration Model",
            ExportField::TotalEnrollment => "Total Enrollment",
            ExportField::UndergraduateEnrollment => "Undergraduate Enrollment",
            ExportField::GraduateEnrollment => "Graduate Enrollment",
            ExportField::FoundedYear => "Founded",
            ExportField::WacEstablishedYear => "WAC Established",
            ExportField::WacBudget => "WAC Budget",
            ExportField::WritingIntensiveCourses => "WI Courses",
            ExportField::WritingCenterStaff => "Writing Center Staff",
            ExportField::Tutors => "Tutors",
            ExportField::FacultyWorkshopsPerYear => "Faculty Workshops / Year",
            ExportField::HasWacProgram => "WAC Program",
            ExportField::HasWritingCenter => "Writing Center",
            ExportField::WritingFellowsProgram => "Writing Fellows",
            ExportField::FacultyDevelopmentProgram => "Faculty Development",
            ExportField::FirstYearComposition => "First-Year Composition",
            ExportField::WritingInDisciplines => "Writing in the Disciplines",
            ExportField::WritingIntensiveRequirement => "WI Requirement",
            ExportField::AdvancedComposition => "Advanced Composition",
            ExportField::WpaPhdRhetComp => "WPA PhD in Rhet/Comp",
            ExportField::WpaTenureLine => "WPA Tenure-Line",
            ExportField::DedicatedWpa => "Dedicated WPA",
            ExportField::Hbcu => "HBCU",
            ExportField::Hsi => "HSI",
            ExportField::Aanapisi => "AANAPISI",
            ExportField::Tribal => "Tribal",
            ExportField::OtherMsi => "Other MSI",
        }
    }

    fn cell(self, record: &Institution) -> Cell {
        match self {
            ExportField::Id => text(&record.id),
            ExportField::Name => text(&record.name),
            ExportField::ShortName => text(&record.short_name),
            ExportField::State => text(&record.state),
            ExportField::City => text(&record.city),
            ExportField::Latitude => number(record.coordinates.map(|c| c.lat)),
            ExportField::Longitude => number(record.coordinates.map(|c| c.lng)),
            ExportField::InstitutionType => text(record.institution_type.label()),
            ExportField::CarnegieClassification => text(&record.carnegie_classification),
            ExportField::Size => text(record.size.label()),
            ExportField::FundingModel => text(record.funding_model.label()),
            ExportField::MissionType => text(record.mission_type.label()),
            ExportField::ReligiousAffiliation => {
                record.religious_affiliation.as_deref().map_or(Cell::Empty, text)
            }
            ExportField::Specialization => text(record.specialization.label()),
            ExportField::ProgramStructure => record
                .program_structure
                .map_or(Cell::Empty, |p| text(p.label())),
            ExportField::AdministrationModel => record
                .administration_model
                .map_or(Cell::Empty, |a| text(a.label())),
            ExportField::TotalEnrollment => number(Some(record.total_enrollment)),
            ExportField::UndergraduateEnrollment => number(Some(record.undergraduate_enrollment)),
            ExportField::GraduateEnrollment => number(Some(record.graduate_enrollment)),
            ExportField::FoundedYear => number(Some(record.founded_year)),
            ExportField::WacEstablishedYear => number(record.wac_established_year),
            ExportField::WacBudget => number(record.wac_budget),
            ExportField::WritingIntensiveCourses => number(record.writing_intensive_courses),
            ExportField::WritingCenterStaff => number(record.writing_center_staff),
            ExportField::Tutors => number(record.tutors),
            ExportField::FacultyWorkshopsPerYear => number(record.faculty_workshops_per_year),
            ExportField::HasWacProgram => flag(record.has_wac_program),
            ExportField::HasWritingCenter => flag(record.has_writing_center),
            ExportField::WritingFellowsProgram => flag(record.writing_fellows_program),
            ExportField::FacultyDevelopmentProgram => flag(record.faculty_development_program),
            ExportField::FirstYearComposition => {
                flag(record.course_offerings.first_year_composition)
            }
            ExportField::WritingInDisciplines => {
                flag(record.course_offerings.writing_in_disciplines)
            }
            ExportField::WritingIntensiveRequirement => {
                flag(record.course_offerings.writing_intensive_requirement)
            }
            ExportField::AdvancedComposition => flag(record.course_offerings.advanced_composition),
            ExportField::WpaPhdRhetComp => flag(record.wpa_credentials.phd_rhet_comp),
            ExportField::WpaTenureLine => flag(record.wpa_credentials.tenure_line),
            ExportField::DedicatedWpa => flag(record.wpa_credentials.dedicated_wpa),
            ExportField::Hbcu => flag(Some(record.msi.hbcu)),
            ExportField::Hsi => flag(Some(record.msi.hsi)),
            ExportField::Aanapisi => flag(Some(record.msi.aanapisi)),
            ExportField::Tribal => flag(Some(record.msi.tribal)),
            ExportField::OtherMsi => flag(Some(record.msi.other)),
        }
    }

    pub fn render(self, record: &Institution) -> String {
        self.cell(record).render()
    }

    /// Record key used in JSON output, e.g. `wacBudget`.
    pub fn key(self) -> String {
        match serde_json::to_value(self) {
            Ok(Value::String(key)) => key,
            _ => format!("{self:?}"),
        }
    }
}

pub fn to_csv(records: &[Institution], fields: &[ExportField]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(fields.iter().map(|field| field.label()))?;

    for record in records {
        writer.write_record(fields.iter().map(|field| field.render(record)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv writer: {}", err.error()))?;
    String::from_utf8(bytes).context("csv output was not valid UTF-8")
}

pub fn to_json(records: &[Institution]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(records).context("failed to serialize institutions")
}

/// A record reduced to the selected fields. Keys are written in field order.
struct Projection<'a> {
    record: &'a Institution,
    fields: &'a [ExportField],
}

impl Serialize for Projection<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in self.fields {
            map.serialize_entry(&field.key(), &field.cell(self.record).into_json())?;
        }
        map.end()
    }
}

pub fn to_json_fields(records: &[Institution], fields: &[ExportField]) -> anyhow::Result<String> {
    let rows: Vec<Projection<'_>> = records
        .iter()
        .map(|record| Projection { record, fields })
        .collect();
    serde_json::to_string_pretty(&rows).context("failed to serialize institutions")
}

/// An empty field list means the default columns for CSV and whole records for JSON.
pub fn export(
    records: &[Institution],
    format: ExportFormat,
    fields: &[ExportField],
) -> anyhow::Result<String> {
    match (format, fields.is_empty()) {
        (ExportFormat::Csv, true) => to_csv(records, DEFAULT_FIELDS),
        (ExportFormat::Csv, false) => to_csv(records, fields),
        (ExportFormat::Json, true) => to_json(records),
        (ExportFormat::Json, false) => to_json_fields(records, fields),
    }
}

pub fn export_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!("wac-institutions-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fixtures::institution, InstitutionStore};

    fn parse(raw: &str) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(raw.as_bytes());
        reader
            .records()
            .map(|row| row.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn quotes_names_with_commas() {
        let first = institution("a", "Example, University");
        let second = institution("b", "Plain College");
        let output = to_csv(&[first, second], &[ExportField::Name, ExportField::State]).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Institution,State");
        assert_eq!(lines[1], "\"Example, University\",MI");
        assert_eq!(lines[2], "Plain College,MI");

        let rows = parse(&output);
        assert_eq!(rows[1][0], "Example, University");
    }

    #[test]
    fn round_trips_delimiters_and_quotes() {
        let mut record = institution("a", "The \"Writing\" College, East");
        record.city = "Quote\"s, Town".to_string();
        let output = to_csv(&[record.clone()], &[ExportField::Name, ExportField::City]).unwrap();

        let rows = parse(&output);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![record.name, record.city]);
    }

    #[test]
    fn renders_flags_numbers_and_missing_values() {
        let mut record = institution("a", "Alpha");
        record.has_wac_program = Some(true);
        record.has_writing_center = Some(false);
        record.writing_fellows_program = None;
        record.wac_budget = None;
        record.total_enrollment = 12_345;

        let fields = [
            ExportField::HasWacProgram,
            ExportField::HasWritingCenter,
            ExportField::WritingFellowsProgram,
            ExportField::WacBudget,
            ExportField::TotalEnrollment,
            ExportField::ReligiousAffiliation,
        ];
        let rows = parse(&to_csv(&[record], &fields).unwrap());
        assert_eq!(rows[1], vec!["Yes", "No", "", "", "12345", ""]);
    }

    #[test]
    fn budget_renders_as_plain_number() {
        let mut record = institution("a", "Alpha");
        record.wac_budget = Some(450_000.0);
        assert_eq!(ExportField::WacBudget.render(&record), "450000");
        record.wac_budget = Some(1_250.5);
        assert_eq!(ExportField::WacBudget.render(&record), "1250.5");
    }

    #[test]
    fn json_preserves_order_and_fields() {
        let store = InstitutionStore::bundled().unwrap();
        let subset = &store.records()[..3];
        let output = to_json(subset).unwrap();
        let parsed: Vec<Institution> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, subset);

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(value[0].get("wacBudget").is_some());
        assert!(value[0].get("totalEnrollment").is_some());
    }

    #[test]
    fn json_with_fields_keeps_only_those_keys_in_order() {
        let store = InstitutionStore::bundled().unwrap();
        let fields = [
            ExportField::WacBudget,
            ExportField::Name,
            ExportField::HasWacProgram,
            ExportField::DedicatedWpa,
        ];
        let output = export(&store.records()[..2], ExportFormat::Json, &fields).unwrap();

        let rows: Vec<Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(rows.len(), 2);
        let mut keys: Vec<&str> = rows[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["dedicatedWpa", "hasWacProgram", "name", "wacBudget"]);

        let first = output.split('}').next().unwrap();
        let positions: Vec<usize> = ["wacBudget", "name", "hasWacProgram", "dedicatedWpa"]
            .iter()
            .map(|key| first.find(&format!("\"{key}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        assert_eq!(rows[0]["name"], "University of Michigan");
        assert_eq!(rows[0]["wacBudget"], 450000);
        assert_eq!(rows[0]["hasWacProgram"], true);
    }

    #[test]
    fn json_without_fields_is_whole_records() {
        let store = InstitutionStore::bundled().unwrap();
        let output = export(&store.records()[..1], ExportFormat::Json, &[]).unwrap();
        let parsed: Vec<Institution> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, &store.records()[..1]);
    }

    #[test]
    fn json_fields_keep_nulls_for_unreported_values() {
        let mut record = institution("a", "Alpha");
        record.wac_budget = None;
        record.wpa_credentials.tenure_line = None;
        let output =
            to_json_fields(&[record], &[ExportField::WacBudget, ExportField::WpaTenureLine])
                .unwrap();
        let rows: Vec<Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(rows[0]["wacBudget"], Value::Null);
        assert_eq!(rows[0]["wpaTenureLine"], Value::Null);
    }

    #[test]
    fn course_and_wpa_columns_render() {
        let store = InstitutionStore::bundled().unwrap();
        let mit = store.get("mit").unwrap();
        let fields = [
            ExportField::FirstYearComposition,
            ExportField::WritingInDisciplines,
            ExportField::WritingIntensiveRequirement,
            ExportField::AdvancedComposition,
            ExportField::WpaPhdRhetComp,
            ExportField::WpaTenureLine,
            ExportField::DedicatedWpa,
        ];
        let rows = parse(&to_csv(std::slice::from_ref(mit), &fields).unwrap());
        assert_eq!(rows[0][0], "First-Year Composition");
        assert_eq!(rows[1], vec!["No", "Yes", "Yes", "No", "Yes", "Yes", "Yes"]);

        let miami = store.get("miamidade").unwrap();
        assert_eq!(ExportField::WpaPhdRhetComp.render(miami), "");
    }

    #[test]
    fn empty_field_list_uses_default_csv_columns() {
        let output = export(&[], ExportFormat::Csv, &[]).unwrap();
        let header = output.lines().next().unwrap();
        assert!(header.starts_with("Institution,State,City"));
    }

    #[test]
    fn file_name_embeds_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        assert_eq!(
            export_file_name(ExportFormat::Csv, date),
            "wac-institutions-2026-02-03.csv"
        );
        assert_eq!(
            export_file_name(ExportFormat::Json, date),
            "wac-institutions-2026-02-03.json"
        );
    }

    #[test]
    fn header_only_for_empty_subset() {
        let output = to_csv(&[], DEFAULT_FIELDS).unwrap();
        assert_eq!(output.lines().count(), 1);
    }
}
