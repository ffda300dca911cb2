//! tfbulk CLI entrypoint.
//!
//! This is the main entrypoint for the tfbulk command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tfbulk::cli::{Cli, Commands, OutputFormat, OutputFormatter};
use tfbulk::config::{find_plan_file, ForEachBlock, ImportPlan, PlanParser, PlanValidator};
use tfbulk::error::Result;
use tfbulk::pipeline::{CompiledStep, ImportExecutor, RunReport};
use tfbulk::state::{ResourceIndex, StateSnapshot};
use tfbulk::terraform::{Terraform, TerraformClient};

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose, cli.output == OutputFormat::Json);

    // Run on a current-thread runtime
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", formatter.format_error(&format!("Error: {e}")));
            if e.is_external() {
                eprintln!(
                    "Resources imported before the failure stay imported; re-running the same plan is safe."
                );
            }
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    match &cli.command {
        Commands::FromFile { config } => {
            let plan = load_plan(&cli, config.as_deref())?;
            let steps = CompiledStep::compile_all(&plan.steps)?;
            execute(&cli, &steps, formatter).await
        }
        Commands::FromResource {
            resource_type,
            resource_attr,
            templates,
        } => {
            let selector = ForEachBlock {
                resource: resource_type.clone(),
                attribute: resource_attr.clone(),
                values: Vec::new(),
            };
            let step = CompiledStep::fan_out(selector, templates)?;
            execute(&cli, std::slice::from_ref(&step), formatter).await
        }
        Commands::Validate { config, warnings } => {
            cmd_validate(&cli, config.as_deref(), *warnings, formatter)
        }
    }
}

/// Locates, parses and validates a plan file.
fn load_plan(cli: &Cli, config: Option<&Path>) -> Result<ImportPlan> {
    let path = resolve_plan_path(cli, config)?;
    let plan = PlanParser::new().load_file(&path)?;

    let validation = PlanValidator::new().validate(&plan)?;
    for warning in &validation.warnings {
        warn!("{warning}");
    }

    Ok(plan)
}

/// Uses the given plan path or searches the working directory for one.
fn resolve_plan_path(cli: &Cli, config: Option<&Path>) -> Result<PathBuf> {
    config.map_or_else(|| find_plan_file(&cli.working_dir), |p| Ok(p.to_path_buf()))
}

/// Validate a plan file.
fn cmd_validate(
    cli: &Cli,
    config: Option<&Path>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let path = resolve_plan_path(cli, config)?;
    let plan = PlanParser::new().load_file(&path)?;
    let result = PlanValidator::new().check(&plan);

    println!("{}", formatter.format_validation(&plan, &result, show_warnings));

    if result.is_valid() {
        Ok(())
    } else {
        PlanValidator::new().validate(&plan).map(|_| ())
    }
}

/// Reads the state and runs the compiled steps against it.
async fn execute(cli: &Cli, steps: &[CompiledStep], formatter: &OutputFormatter) -> Result<()> {
    let parser = PlanParser::new().with_base_path(&cli.working_dir);
    parser.load_dotenv()?;

    let client = TerraformClient::new(&cli.terraform_bin, &cli.working_dir);
    let snapshot = load_state(cli, &client).await?;
    let mut index = ResourceIndex::new(&snapshot);

    let mut executor = ImportExecutor::new(&client)
        .with_dry_run(cli.dry_run)
        .with_binary_label(client.binary());
    if cli.backup {
        executor = executor.with_backup(&cli.backup_dir);
    }

    let report = executor.run_steps(steps, &mut index).await?;
    print_report(formatter, &report);
    Ok(())
}

/// Loads the state snapshot from `--state-file` or from the binary.
async fn load_state(cli: &Cli, client: &TerraformClient) -> Result<StateSnapshot> {
    if let Some(path) = &cli.state_file {
        info!("Reading state from: {}", path.display());
        return StateSnapshot::from_file(path).await;
    }

    if cli.skip_init {
        debug!("Skipping init");
    } else {
        client.init().await?;
    }

    info!("Reading state from {} in {}", client.binary(), client.working_dir().display());
    client.show_state().await
}

/// Prints the run report.
fn print_report(formatter: &OutputFormatter, report: &RunReport) {
    println!("{}", formatter.format_report(report));
}
