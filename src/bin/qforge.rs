//! qforge — render Spark SQL from the command line
//!
//! # Usage
//!
//! ```bash
//! # Projection builder with the built-in defaults
//! qforge select
//!
//! # Add an optional column and a filter
//! qforge select --column amount --filter "country_code = GB" --limit 10
//!
//! # Anomaly rule, annotated variant
//! qforge anomaly --variant 3 --protocol SMS --training-period 7
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use qforge::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qforge")]
#[command(version)]
#[command(about = "Schema-constrained Spark SQL template renderer", long_about = None)]
#[command(after_help = "EXAMPLES:
    qforge select --column amount --filter 'country_code = GB'
    qforge anomaly --variant 3 --reference-date 2026-02-01
    qforge render /2 --format json")]
struct Cli {
    /// Configuration file (defaults to ./qforge.toml, then the user config dir)
    #[arg(long, global = true, env = "QFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "sql", global = true)]
    format: OutputFormat,

    /// Write the rendered output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Report suspicious field values; exits with status 2 on errors
    #[arg(long, global = true)]
    check: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Sql,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the SELECT/WHERE/LIMIT projection query
    Select(SelectArgs),
    /// Render the anomaly-rule CTE template
    Anomaly(AnomalyArgs),
    /// Render a variant by hub path (/1, /2, /3) with configured defaults
    Render {
        /// Variant path or number
        variant: Variant,
    },
    /// Show the input and output schema
    Schema,
    /// List the builder variants
    Variants,
}

#[derive(Args, Default)]
struct SelectArgs {
    /// Optional output column to select (repeatable)
    #[arg(short, long = "column", value_name = "COLUMN")]
    columns: Vec<String>,

    /// Optional output column to deselect (repeatable)
    #[arg(long = "drop", value_name = "COLUMN")]
    drop: Vec<String>,

    /// Filter expression such as "amount > 10" (repeatable, applied in order)
    #[arg(long = "filter", value_name = "EXPR")]
    filters: Vec<String>,

    /// Remove the default and configured filters before applying --filter
    #[arg(long)]
    clear_filters: bool,

    /// Row limit (interpolated as given)
    #[arg(short = 'n', long)]
    limit: Option<String>,
}

#[derive(Args, Default)]
struct AnomalyArgs {
    /// Base variant: 2 (compact) or 3 (annotated)
    #[arg(long)]
    variant: Option<Variant>,

    #[arg(long)]
    rule_name: Option<String>,

    /// Lookback window in days
    #[arg(long)]
    training_period: Option<String>,

    /// Reference date (YYYY-MM-DD)
    #[arg(long)]
    reference_date: Option<String>,

    /// VOICE, SMS or DATA
    #[arg(long)]
    protocol: Option<Protocol>,

    /// Exact number of unique destinations that flags a target
    #[arg(long)]
    threshold: Option<String>,

    #[arg(long)]
    group_id: Option<String>,

    #[arg(long)]
    group_name: Option<String>,

    /// compact or annotated
    #[arg(long)]
    style: Option<TemplateStyle>,

    /// Table expression to read call records from
    #[arg(long)]
    data_source: Option<String>,

    /// Replace the target catalog; TEL=NAME (repeatable)
    #[arg(long = "target", value_name = "TEL=NAME")]
    targets: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Select(args)) => run_select(&cli, args),
        Some(Commands::Anomaly(args)) => run_anomaly(&cli, args),
        Some(Commands::Render { variant }) => run_variant(&cli, *variant),
        Some(Commands::Schema) => show_schema(&cli),
        Some(Commands::Variants) => {
            show_variants();
            Ok(())
        }
        None => {
            println!("{}", "qforge — Spark SQL template renderer".cyan().bold());
            println!();
            show_variants();
            println!();
            println!("Try: qforge --help");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "qforge=debug" } else { "qforge=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ForgeConfig> {
    let (config, path) = ForgeConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        match path {
            Some(path) => eprintln!("{} {}", "Config:".dimmed(), path.display().to_string().yellow()),
            None => eprintln!("{} {}", "Config:".dimmed(), "built-in defaults".yellow()),
        }
    }
    Ok(config)
}

fn run_variant(cli: &Cli, variant: Variant) -> anyhow::Result<()> {
    match variant {
        Variant::CoreQuery => run_select(cli, &SelectArgs::default()),
        _ => run_anomaly(
            cli,
            &AnomalyArgs {
                variant: Some(variant),
                ..Default::default()
            },
        ),
    }
}

fn run_select(cli: &Cli, args: &SelectArgs) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let mut query = ProjectionQuery::default();
    config
        .projection
        .apply(&mut query)
        .context("applying [projection] config")?;

    for column in &args.columns {
        query.select_column(column)?;
    }
    for column in &args.drop {
        if query.output_schema().is_required(column) {
            eprintln!(
                "{} {} is required and stays selected",
                "⚠".yellow(),
                column.cyan()
            );
        } else if query.is_selected(column) {
            query.toggle_column(column)?;
        }
    }
    if args.clear_filters {
        query.clear_filters();
    }
    for expr in &args.filters {
        let parsed = qforge::parse_filter(expr).with_context(|| format!("--filter '{}'", expr))?;
        query.push_filter(&parsed.column, parsed.operator, parsed.value)?;
    }
    if let Some(limit) = &args.limit {
        query.set_limit(limit);
    }

    let findings = if cli.check { query.lint() } else { Vec::new() };
    emit(cli, Variant::CoreQuery, &query.to_sql(), &query, &findings)
}

fn run_anomaly(cli: &Cli, args: &AnomalyArgs) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let variant = args.variant.unwrap_or(Variant::AnomalyTemplate);
    let mut rule = variant
        .anomaly_rule()
        .with_context(|| format!("{} is not an anomaly variant", variant.info().path))?;
    config
        .anomaly
        .apply(&mut rule)
        .context("applying [anomaly] config")?;

    let p = &mut rule.params;
    if let Some(v) = &args.rule_name {
        p.rule_name = v.clone();
    }
    if let Some(v) = &args.training_period {
        p.training_period = v.clone();
    }
    if let Some(v) = &args.reference_date {
        p.reference_date = v.clone();
    }
    if let Some(v) = args.protocol {
        p.protocol = v;
    }
    if let Some(v) = &args.threshold {
        p.threshold = v.clone();
    }
    if let Some(v) = &args.group_id {
        p.group_id = v.clone();
    }
    if let Some(v) = &args.group_name {
        p.group_name = v.clone();
    }
    if let Some(style) = args.style {
        rule.style = style;
    }
    if let Some(source) = &args.data_source {
        rule.data_source = source.clone();
    }
    if !args.targets.is_empty() {
        rule.catalog = TargetCatalog::new(
            args.targets
                .iter()
                .map(String::as_str)
                .map(parse_target)
                .collect::<anyhow::Result<Vec<_>>>()?,
        );
    }

    if cli.verbose {
        match rule.training_window() {
            Some((start, end)) => eprintln!(
                "{} {} .. {}",
                "Training window:".dimmed(),
                start.to_string().cyan(),
                end.to_string().cyan()
            ),
            None => eprintln!("{} {}", "Training window:".dimmed(), "unresolved".yellow()),
        }
    }

    let findings = if cli.check { rule.lint() } else { Vec::new() };
    emit(cli, variant, &rule.to_sql(), &rule, &findings)
}

fn parse_target(text: &str) -> anyhow::Result<Target> {
    let (tel, name) = text
        .split_once('=')
        .with_context(|| format!("--target '{}' must look like TEL=NAME", text))?;
    Ok(Target::new(tel.trim(), name.trim()))
}

#[derive(Serialize)]
struct Rendered<'a, S: Serialize> {
    variant: &'static str,
    sql: &'a str,
    state: &'a S,
    #[serde(skip_serializing_if = "no_findings")]
    findings: &'a [Finding],
}

fn no_findings(findings: &&[Finding]) -> bool {
    findings.is_empty()
}

fn emit<S: Serialize>(
    cli: &Cli,
    variant: Variant,
    sql: &str,
    state: &S,
    findings: &[Finding],
) -> anyhow::Result<()> {
    let body = match cli.format {
        OutputFormat::Sql => format!("{}\n", sql),
        OutputFormat::Json => {
            let rendered = Rendered {
                variant: variant.info().path,
                sql,
                state,
                findings,
            };
            format!("{}\n", serde_json::to_string_pretty(&rendered)?)
        }
    };

    match &cli.output {
        Some(path) => write_output(path, &body)?,
        None => print!("{}", body),
    }

    report_findings(findings)
}

fn write_output(path: &Path, body: &str) -> anyhow::Result<()> {
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    eprintln!("{} Wrote SQL to {}", "✓".green(), path.display().to_string().cyan());
    Ok(())
}

fn report_findings(findings: &[Finding]) -> anyhow::Result<()> {
    if findings.is_empty() {
        return Ok(());
    }

    eprintln!();
    for finding in findings {
        let label = match finding.severity {
            Severity::Warning => "warning".yellow().bold(),
            Severity::Error => "error".red().bold(),
        };
        eprintln!("{} {} {}", label, format!("[{}]", finding.field).dimmed(), finding.message);
    }

    if findings.iter().any(|f| f.severity == Severity::Error) {
        std::process::exit(2);
    }
    Ok(())
}

fn show_schema(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let input = config.projection.input_schema();
    let output = OutputSchema::reporting_standard();

    println!("{} {}", "Source table:".dimmed(), input.table_name.cyan().bold());
    println!("{} {}", "Output schema:".dimmed(), output.name.white().bold());
    println!();
    println!(
        "{:14} {:9} {:10} {}",
        "Column".white().bold(),
        "Type".white().bold(),
        "Output".white().bold(),
        "Values / Description".white().bold()
    );
    println!("{}", "─".repeat(72).dimmed());

    for col in &input.columns {
        let role = if output.is_required(&col.name) {
            "required".green()
        } else if output.is_optional(&col.name) {
            "optional".yellow()
        } else {
            "—".dimmed()
        };
        let detail = match (&col.options, &col.description) {
            (Some(options), _) => options.join(" | "),
            (None, Some(desc)) => desc.clone(),
            (None, None) => String::new(),
        };
        println!(
            "{:14} {:9} {:10} {}",
            col.name.cyan(),
            col.column_type.to_string().yellow(),
            role,
            detail.dimmed()
        );
    }
    Ok(())
}

fn show_variants() {
    for info in &VARIANTS {
        println!(
            "  {}  {} {}",
            info.path.cyan().bold(),
            info.title.white().bold(),
            format!("[{}]", info.tag).dimmed()
        );
        println!("      {}", info.description.dimmed());
    }
}
