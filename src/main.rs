use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod data;
mod error;
mod export;
mod filter;
mod models;
mod prompt;
mod relay;
mod sort;
mod stats;

use data::InstitutionStore;
use export::{ExportField, ExportFormat};
use models::{
    AdministrationModel, CourseOfferingFilters, FilterCriteria, FundingModel, Institution,
    InstitutionType, MissionType, NumericRange, ProgramStructure, SizeCategory, SortDirection,
    SortField, SortSpecification, TriState,
};
use prompt::{PromptConfig, PromptMode};

#[derive(Parser)]
#[command(name = "wac-dashboard")]
#[command(
    about = "Explore Writing Across the Curriculum program data and relay chat questions",
    long_about = None
)]
struct Cli {
    /// Load institutions from this JSON file instead of the bundled dataset
    #[arg(long, global = true, env = "WAC_DATA")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the filtered, sorted institutions
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        sort: SortArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Summarize the filtered institutions
    Stats {
        #[command(flatten)]
        filters: FilterArgs,
        /// Include integrity checks and ground-truth counts
        #[arg(long)]
        validate: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the filtered, sorted institutions to a CSV or JSON file
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        sort: SortArgs,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Columns to export, in order. Without any, CSV gets the default
        /// columns and JSON gets whole records.
        #[arg(long = "field", value_enum)]
        fields: Vec<ExportField>,
        /// Defaults to a date-stamped name in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show selected institutions side by side
    Compare {
        /// Institution ids, e.g. umich ucb
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
        #[arg(long = "field", value_enum)]
        fields: Vec<ExportField>,
    },
    /// Print the chat system prompt built from the dataset
    Prompt {
        #[arg(long, value_enum, default_value_t = PromptMode::Standard)]
        mode: PromptMode,
    },
    /// Run the chat relay server
    Serve {
        #[arg(long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
        port: u16,
        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[arg(long, env = "WAC_UPSTREAM_URL", default_value = config::DEFAULT_UPSTREAM_URL)]
        upstream_url: String,
        #[arg(long, env = "ANTHROPIC_VERSION", default_value = config::DEFAULT_API_VERSION)]
        api_version: String,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Case-insensitive match on name, city, state, type and classification
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long = "state")]
    states: Vec<String>,
    #[arg(long = "type", value_enum)]
    types: Vec<InstitutionType>,
    #[arg(long = "carnegie")]
    carnegie: Vec<String>,
    #[arg(long = "size", value_enum)]
    sizes: Vec<SizeCategory>,
    #[arg(long = "funding", value_enum)]
    funding: Vec<FundingModel>,
    #[arg(long = "mission", value_enum)]
    missions: Vec<MissionType>,
    #[arg(long = "structure", value_enum)]
    structures: Vec<ProgramStructure>,
    #[arg(long = "admin", value_enum)]
    admins: Vec<AdministrationModel>,
    #[arg(long)]
    min_enrollment: Option<u32>,
    #[arg(long)]
    max_enrollment: Option<u32>,
    #[arg(long)]
    min_budget: Option<f64>,
    #[arg(long)]
    max_budget: Option<f64>,
    #[arg(long)]
    min_established: Option<i32>,
    #[arg(long)]
    max_established: Option<i32>,
    /// Drop institutions that did not report a value for an active range
    #[arg(long)]
    exclude_unreported: bool,
    #[arg(long, value_enum, default_value_t = TriState::Unset)]
    has_wac: TriState,
    #[arg(long, value_enum, default_value_t = TriState::Unset)]
    has_writing_center: TriState,
    #[arg(long, value_enum, default_value_t = TriState::Unset)]
    has_fellows: TriState,
    #[arg(long, value_enum, default_value_t = TriState::Unset)]
    has_faculty_development: TriState,
    #[arg(long, value_enum, default_value_t = TriState::Unset)]
    first_year_comp: TriState,
    /// Writing in the disciplines courses
    #[arg(long, value_enum, default_value_t = TriState::Unset)]
    wid: TriState,
    /// Writing-intensive graduation requirement
    #[arg(long, value_enum, default_value_t = TriState::Unset)]
    wi_requirement: TriState,
    #[arg(long, value_enum, default_value_t = TriState::Unset)]
    advanced_comp: TriState,
    #[arg(long)]
    hbcu: bool,
    #[arg(long)]
    hsi: bool,
    #[arg(long)]
    aanapisi: bool,
    #[arg(long)]
    tribal: bool,
    #[arg(long)]
    other_msi: bool,
}

fn range<T: PartialOrd + Copy>(
    min: Option<T>,
    max: Option<T>,
    floor: T,
    ceiling: T,
    exclude_unreported: bool,
) -> Option<NumericRange<T>> {
    if min.is_none() && max.is_none() {
        return None;
    }
    let range = NumericRange::new(min.unwrap_or(floor), max.unwrap_or(ceiling));
    Some(if exclude_unreported {
        range.excluding_unreported()
    } else {
        range
    })
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria {
            search: self.search.clone(),
            states: self.states.iter().map(|s| s.to_uppercase()).collect(),
            institution_types: self.types.clone(),
            carnegie_classifications: self.carnegie.clone(),
            sizes: self.sizes.clone(),
            funding_models: self.funding.clone(),
            mission_types: self.missions.clone(),
            program_structures: self.structures.clone(),
            administration_models: self.admins.clone(),
            enrollment: range(
                self.min_enrollment,
                self.max_enrollment,
                0,
                u32::MAX,
                self.exclude_unreported,
            ),
            budget: range(
                self.min_budget,
                self.max_budget,
                0.0,
                f64::MAX,
                self.exclude_unreported,
            ),
            established_year: range(
                self.min_established,
                self.max_established,
                i32::MIN,
                i32::MAX,
                self.exclude_unreported,
            ),
            has_wac_program: self.has_wac,
            has_writing_center: self.has_writing_center,
            writing_fellows_program: self.has_fellows,
            faculty_development_program: self.has_faculty_development,
            ..FilterCriteria::default()
        };
        criteria.course_offerings = CourseOfferingFilters {
            first_year_composition: self.first_year_comp,
            writing_in_disciplines: self.wid,
            writing_intensive_requirement: self.wi_requirement,
            advanced_composition: self.advanced_comp,
        };
        criteria.msi.hbcu = self.hbcu;
        criteria.msi.hsi = self.hsi;
        criteria.msi.aanapisi = self.aanapisi;
        criteria.msi.tribal = self.tribal;
        criteria.msi.other = self.other_msi;
        criteria
    }
}

#[derive(Args, Debug)]
struct SortArgs {
    #[arg(long, value_enum, default_value_t = SortField::Name)]
    sort: SortField,
    #[arg(long)]
    desc: bool,
}

impl SortArgs {
    fn specification(&self) -> SortSpecification {
        SortSpecification {
            field: self.sort,
            direction: if self.desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
        }
    }
}

fn load_store(path: Option<&PathBuf>) -> anyhow::Result<InstitutionStore> {
    match path {
        Some(path) => InstitutionStore::from_path(path),
        None => InstitutionStore::bundled(),
    }
}

fn select(
    store: &InstitutionStore,
    filters: &FilterArgs,
    order: Option<&SortArgs>,
) -> Vec<Institution> {
    let criteria = filters.criteria();
    let filtered = filter::apply_filters(store.records(), &criteria);
    tracing::debug!(
        total = store.len(),
        matched = filtered.len(),
        "applied filters"
    );
    match order {
        Some(order) => sort::sort_institutions(&filtered, order.specification()),
        None => filtered,
    }
}

fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn comparison_rows(selected: &[&Institution], fields: &[ExportField]) -> Vec<String> {
    let width = fields
        .iter()
        .map(|field| field.label().len())
        .max()
        .unwrap_or(0);

    fields
        .iter()
        .map(|field| {
            let values: Vec<String> = selected
                .iter()
                .map(|record| {
                    let value = field.render(record);
                    if value.is_empty() {
                        "-".to_string()
                    } else {
                        value
                    }
                })
                .collect();
            format!("{:<width$} | {}", field.label(), values.join(" | "))
        })
        .collect()
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wac_dashboard=info,tower_http=debug,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let store = load_store(cli.data.as_ref()).context("failed to load institution data")?;

    match cli.command {
        Commands::List {
            filters,
            sort,
            limit,
        } => {
            let records = select(&store, &filters, Some(&sort));

            if records.is_empty() {
                println!("No institutions match these filters.");
                return Ok(());
            }

            println!("{} of {} institutions:", records.len(), store.len());
            for record in records.iter().take(limit.unwrap_or(usize::MAX)) {
                println!(
                    "- {} ({}, {}) {} | enrollment {} | WAC {} | budget {}",
                    record.name,
                    record.city,
                    record.state,
                    stats::simplify_carnegie(&record.carnegie_classification),
                    record.total_enrollment,
                    or_dash(record.wac_established_year),
                    or_dash(record.wac_budget)
                );
            }
        }
        Commands::Stats {
            filters,
            validate,
            json,
        } => {
            let records = select(&store, &filters, None);
            let summary = stats::compute_statistics(&records, validate);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("Institutions: {}", summary.total_institutions);
            println!(
                "With WAC programs: {} ({})",
                summary.with_wac_programs, summary.wac_program_percentage
            );
            println!(
                "With writing centers: {} ({})",
                summary.with_writing_centers, summary.writing_center_percentage
            );
            println!("Average enrollment: {:.0}", summary.average_enrollment);
            println!(
                "Average WAC budget: {}",
                summary
                    .average_wac_budget
                    .map_or_else(|| "not reported".to_string(), |b| format!("{b:.0}"))
            );
            println!(
                "Writing-intensive courses: {}",
                summary.total_writing_intensive_courses
            );
            for (title, counts) in [
                ("By type", &summary.by_type),
                ("By classification", &summary.by_carnegie_simplified),
                ("By state", &summary.by_state),
            ] {
                println!();
                println!("{title}:");
                for entry in counts {
                    println!("- {}: {} ({})", entry.label, entry.count, entry.percentage);
                }
            }
            if let Some(validation) = &summary.validation {
                println!();
                println!("Validation ({}):", validation.generated_at.to_rfc3339());
                println!("{}", serde_json::to_string_pretty(&validation.checks)?);
            }
        }
        Commands::Export {
            filters,
            sort,
            format,
            fields,
            out,
        } => {
            let records = select(&store, &filters, Some(&sort));
            let output = export::export(&records, format, &fields)?;
            let out = out.unwrap_or_else(|| {
                PathBuf::from(export::export_file_name(
                    format,
                    chrono::Local::now().date_naive(),
                ))
            });
            std::fs::write(&out, output)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported {} institutions to {}.", records.len(), out.display());
        }
        Commands::Compare { ids, fields } => {
            let selected = ids
                .iter()
                .map(|id| {
                    store
                        .get(id)
                        .with_context(|| format!("no institution with id {id:?}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let fields = if fields.is_empty() {
                export::DEFAULT_FIELDS.to_vec()
            } else {
                fields
            };
            for line in comparison_rows(&selected, &fields) {
                println!("{line}");
            }
        }
        Commands::Prompt { mode } => {
            let config = PromptConfig { mode };
            print!("{}", prompt::build_system_prompt(store.records(), &config));
        }
        Commands::Serve {
            port,
            api_key,
            upstream_url,
            api_version,
        } => {
            let config = config::RelayConfig::new(api_key, upstream_url, api_version);
            relay::serve(config, port).await?;
        }
    }

    Ok(())
}
