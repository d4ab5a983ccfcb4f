use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InstitutionType {
    Public,
    Private,
    Community,
}

impl InstitutionType {
    pub fn label(self) -> &'static str {
        match self {
            InstitutionType::Public => "public",
            InstitutionType::Private => "private",
            InstitutionType::Community => "community",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
}

impl SizeCategory {
    pub fn label(self) -> &'static str {
        match self {
            SizeCategory::Small => "small",
            SizeCategory::Medium => "medium",
            SizeCategory::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FundingModel {
    Public,
    PrivateNonprofit,
    PrivateForProfit,
}

impl FundingModel {
    pub fn label(self) -> &'static str {
        match self {
            FundingModel::Public => "public",
            FundingModel::PrivateNonprofit => "private-nonprofit",
            FundingModel::PrivateForProfit => "private-for-profit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MissionType {
    Research,
    Comprehensive,
    LiberalArts,
    CommunityCollege,
    Specialized,
}

impl MissionType {
    pub fn label(self) -> &'static str {
        match self {
            MissionType::Research => "research",
            MissionType::Comprehensive => "comprehensive",
            MissionType::LiberalArts => "liberal-arts",
            MissionType::CommunityCollege => "community-college",
            MissionType::Specialized => "specialized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Specialization {
    Generalist,
    Specialized,
}

impl Specialization {
    pub fn label(self) -> &'static str {
        match self {
            Specialization::Generalist => "generalist",
            Specialization::Specialized => "specialized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramStructure {
    Centralized,
    Decentralized,
    Hybrid,
}

impl ProgramStructure {
    pub fn label(self) -> &'static str {
        match self {
            ProgramStructure::Centralized => "centralized",
            ProgramStructure::Decentralized => "decentralized",
            ProgramStructure::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AdministrationModel {
    WritingCenter,
    EnglishDepartment,
    AcademicAffairs,
    StandaloneProgram,
    FacultyCommittee,
}

impl AdministrationModel {
    pub fn label(self) -> &'static str {
        match self {
            AdministrationModel::WritingCenter => "writing-center",
            AdministrationModel::EnglishDepartment => "english-department",
            AdministrationModel::AcademicAffairs => "academic-affairs",
            AdministrationModel::StandaloneProgram => "standalone-program",
            AdministrationModel::FacultyCommittee => "faculty-committee",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseOfferings {
    pub first_year_composition: Option<bool>,
    pub writing_in_disciplines: Option<bool>,
    pub writing_intensive_requirement: Option<bool>,
    pub advanced_composition: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WpaCredentials {
    pub phd_rhet_comp: Option<bool>,
    pub tenure_line: Option<bool>,
    pub dedicated_wpa: Option<bool>,
}

/// Minority-serving designations. Absent means not designated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsiFlags {
    pub hbcu: bool,
    pub hsi: bool,
    pub aanapisi: bool,
    pub tribal: bool,
    pub other: bool,
}

impl MsiFlags {
    pub fn any(&self) -> bool {
        self.hbcu || self.hsi || self.aanapisi || self.tribal || self.other
    }
}

/// One institution's WAC program profile, as authored in the bundled dataset.
///
/// Nullable flags mean "not surveyed", never "false".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub state: String,
    pub city: String,
    pub coordinates: Option<Coordinates>,

    pub institution_type: InstitutionType,
    pub carnegie_classification: String,
    pub size: SizeCategory,
    pub funding_model: FundingModel,
    pub mission_type: MissionType,
    pub religious_affiliation: Option<String>,
    pub specialization: Specialization,
    pub program_structure: Option<ProgramStructure>,
    pub administration_model: Option<AdministrationModel>,

    pub total_enrollment: u32,
    pub undergraduate_enrollment: u32,
    pub graduate_enrollment: u32,
    pub founded_year: i32,
    pub wac_established_year: Option<i32>,
    pub wac_budget: Option<f64>,
    pub writing_intensive_courses: Option<u32>,
    pub writing_center_staff: Option<u32>,
    pub tutors: Option<u32>,
    pub faculty_workshops_per_year: Option<u32>,

    pub has_wac_program: Option<bool>,
    pub has_writing_center: Option<bool>,
    pub writing_fellows_program: Option<bool>,
    pub faculty_development_program: Option<bool>,
    #[serde(default)]
    pub course_offerings: CourseOfferings,
    #[serde(default)]
    pub wpa_credentials: WpaCredentials,
    #[serde(default)]
    pub msi: MsiFlags,
}

/// Three-way constraint for a nullable boolean field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TriState {
    #[default]
    Unset,
    RequireTrue,
    RequireFalse,
}

impl TriState {
    /// An unset constraint accepts anything; an active one requires an exact,
    /// non-null match.
    pub fn accepts(self, value: Option<bool>) -> bool {
        match self {
            TriState::Unset => true,
            TriState::RequireTrue => value == Some(true),
            TriState::RequireFalse => value == Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange<T> {
    pub min: T,
    pub max: T,
    /// Whether a record without a value passes this range.
    pub include_unreported: bool,
}

impl<T: PartialOrd + Copy> NumericRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self {
            min,
            max,
            include_unreported: true,
        }
    }

    pub fn excluding_unreported(mut self) -> Self {
        self.include_unreported = false;
        self
    }

    pub fn accepts(&self, value: Option<T>) -> bool {
        match value {
            Some(v) => v >= self.min && v <= self.max,
            None => self.include_unreported,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseOfferingFilters {
    pub first_year_composition: TriState,
    pub writing_in_disciplines: TriState,
    pub writing_intensive_requirement: TriState,
    pub advanced_composition: TriState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsiFilters {
    pub hbcu: bool,
    pub hsi: bool,
    pub aanapisi: bool,
    pub tribal: bool,
    pub other: bool,
}

/// Filter snapshot. `Default` is the most permissive configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub search: String,
    pub states: Vec<String>,
    pub institution_types: Vec<InstitutionType>,
    pub carnegie_classifications: Vec<String>,
    pub sizes: Vec<SizeCategory>,
    pub funding_models: Vec<FundingModel>,
    pub mission_types: Vec<MissionType>,
    pub program_structures: Vec<ProgramStructure>,
    pub administration_models: Vec<AdministrationModel>,
    pub enrollment: Option<NumericRange<u32>>,
    pub budget: Option<NumericRange<f64>>,
    pub established_year: Option<NumericRange<i32>>,
    pub has_wac_program: TriState,
    pub has_writing_center: TriState,
    pub writing_fellows_program: TriState,
    pub faculty_development_program: TriState,
    pub course_offerings: CourseOfferingFilters,
    pub msi: MsiFilters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    ShortName,
    State,
    City,
    Coordinates,
    InstitutionType,
    CarnegieClassification,
    Size,
    FundingModel,
    MissionType,
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
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpecification {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpecification {
    fn default() -> Self {
        Self {
            field: SortField::Name,
            direction: SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationChecks {
    pub all_have_wac_flag: bool,
    pub all_have_writing_center_flag: bool,
    pub all_have_valid_coordinates: bool,
    pub ids_unique: bool,
    pub enrollment_consistent: bool,
    pub breakdowns_sum_to_total: bool,
}

/// Ground-truth counts for cross-checking generated answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub total: usize,
    pub public: usize,
    pub private: usize,
    pub community: usize,
    pub r1: usize,
    pub r2: usize,
    pub with_wac_programs: usize,
    pub with_writing_centers: usize,
    pub minority_serving: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    pub generated_at: DateTime<Utc>,
    pub checks: ValidationChecks,
    pub ground_truth: GroundTruth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_institutions: usize,
    pub with_wac_programs: usize,
    pub wac_program_percentage: String,
    pub with_writing_centers: usize,
    pub writing_center_percentage: String,
    pub average_enrollment: f64,
    pub average_wac_budget: Option<f64>,
    pub total_writing_intensive_courses: u32,
    pub by_type: Vec<CategoryCount>,
    pub by_carnegie: Vec<CategoryCount>,
    pub by_carnegie_simplified: Vec<CategoryCount>,
    pub by_state: Vec<CategoryCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationMetadata>,
}
