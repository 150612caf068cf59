//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::{Dataset, SeriesReport, SnapshotReport};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings, LOCAL_CONFIG_FILE};
use crate::domain::{MetricView, MonthKey, RegionQuery, TreeNodeConvert};
use crate::infrastructure::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            print_completions(*shell);
            Ok(())
        }
        Some(Commands::Config { command }) => config_command(cli, command),
        Some(Commands::Snapshot {
            month,
            view,
            region,
            top,
            json,
        }) => _snapshot(
            &container(cli)?,
            month,
            view.as_deref(),
            region.as_deref(),
            *top,
            *json,
        ),
        Some(Commands::Series {
            view,
            region,
            from,
            to,
            countries,
            json,
        }) => _series(
            &container(cli)?,
            SeriesArgs {
                view: view.as_deref(),
                region: region.as_deref(),
                from: from.as_deref(),
                to: to.as_deref(),
                countries,
                json: *json,
            },
        ),
        Some(Commands::Tree { region }) => _tree(&container(cli)?, region.as_deref()),
        Some(Commands::Regions) => _regions(&container(cli)?),
        Some(Commands::Months) => _months(&container(cli)?),
        None => Ok(()),
    }
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Settings from all config layers, with `--data` on top.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data) = &cli.data {
        settings.data_file = Some(data.clone());
    }
    debug!(?settings, "settings loaded");
    Ok(settings)
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(load_settings(cli)?)?)
}

fn load_dataset(container: &ServiceContainer) -> CliResult<Dataset> {
    Ok(container.dataset_service().load()?)
}

fn resolve_view(view: Option<&str>, settings: &Settings) -> CliResult<MetricView> {
    match view {
        Some(v) => Ok(v.parse()?),
        None => Ok(settings.view),
    }
}

fn parse_month(month: Option<&str>) -> CliResult<Option<MonthKey>> {
    Ok(month.map(str::parse::<MonthKey>).transpose()?)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize output".to_string(),
        source: Box::new(e),
    })?;
    output::info(&json);
    Ok(())
}

#[instrument(skip(container))]
fn _snapshot(
    container: &ServiceContainer,
    month: &str,
    view: Option<&str>,
    region: Option<&str>,
    top: Option<usize>,
    json: bool,
) -> CliResult<()> {
    let settings = &container.settings;
    let month: MonthKey = month.parse()?;
    let view = resolve_view(view, settings)?;
    let region = region.unwrap_or(&settings.region);

    let dataset = load_dataset(container)?;
    let report = dataset.snapshot(region, view, month, top.or(settings.top))?;
    if json {
        print_json(&report)
    } else {
        print_snapshot(&report);
        Ok(())
    }
}

fn print_snapshot(report: &SnapshotReport) {
    output::header(&format!(
        "{}: {} in {}",
        report.region, report.view, report.month
    ));
    if report.rows.is_empty() {
        output::warning("no countries in region");
        return;
    }
    let width = output::column_width(report.rows.iter().map(|r| r.country.as_str()));
    for row in &report.rows {
        output::row(&row.country, width, &output::format_value(report.view, row.value));
    }
}

#[derive(Debug)]
struct SeriesArgs<'a> {
    view: Option<&'a str>,
    region: Option<&'a str>,
    from: Option<&'a str>,
    to: Option<&'a str>,
    countries: &'a [String],
    json: bool,
}

#[instrument(skip(container))]
fn _series(container: &ServiceContainer, args: SeriesArgs<'_>) -> CliResult<()> {
    let settings = &container.settings;
    let view = resolve_view(args.view, settings)?;
    let region = args.region.unwrap_or(&settings.region);
    let from = parse_month(args.from)?.or(settings.timeline.start);
    let to = parse_month(args.to)?.or(settings.timeline.end);
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(CliError::InvalidArgs(format!(
                "--from {} is after --to {}",
                from, to
            )));
        }
    }

    let dataset = load_dataset(container)?;
    let months = dataset.timeline(from, to);
    let report = dataset.series(region, view, &months, args.countries)?;
    if args.json {
        print_json(&report)
    } else {
        print_series(&report);
        Ok(())
    }
}

fn print_series(report: &SeriesReport) {
    output::header(&format!("{}: {}", report.region, report.view));
    for (month, snapshot) in &report.months {
        output::info(&month);
        let width = output::column_width(snapshot.keys().map(String::as_str));
        for (country, value) in snapshot {
            output::row(country, width, &output::format_value(report.view, *value));
        }
    }
}

#[instrument(skip(container))]
fn _tree(container: &ServiceContainer, region: Option<&str>) -> CliResult<()> {
    let region = region.unwrap_or(&container.settings.region);
    let dataset = load_dataset(container)?;
    let scope = dataset.scope(region)?;
    output::info(&scope.to_tree_string());
    Ok(())
}

#[instrument(skip(container))]
fn _regions(container: &ServiceContainer) -> CliResult<()> {
    let dataset = load_dataset(container)?;
    let regions = dataset.regions();
    let width = output::column_width(regions.iter().map(|r| r.name.as_str()));
    for region in &regions {
        output::row(&region.name, width, &region.countries.to_string());
    }
    Ok(())
}

#[instrument(skip(container))]
fn _months(container: &ServiceContainer) -> CliResult<()> {
    let dataset = load_dataset(container)?;
    for month in dataset.tree().available_months() {
        output::info(&month);
    }
    Ok(())
}

fn config_command(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            output::header("Config paths");
            match global_config_path() {
                Some(path) => output::detail(&format!("global: {}", describe_path(&path))),
                None => output::detail(&"global: (no home directory)"),
            }
            let local = cli
                .config
                .clone()
                .unwrap_or_else(|| Path::new(LOCAL_CONFIG_FILE).to_path_buf());
            output::detail(&format!("local:  {}", describe_path(&local)));
        }
    }
    Ok(())
}

fn describe_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}
