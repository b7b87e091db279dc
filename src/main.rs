// Entry point and high-level CLI flow.
//
// - `sectors`, `summary`, `detail` and `export` are one-shot commands.
// - `interactive` keeps one sector loaded and mirrors the dashboard's
//   dropdowns: pick a group, optionally narrow it, and read the details.
//   The file can be reloaded without restarting.
mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use sector_progress::config::SectorRegistry;
use sector_progress::detail::Selection;
use sector_progress::output;
use sector_progress::reports::{
    group_options, group_overview, item_options, status_table, subgroup_options,
};
use sector_progress::store::SectorStore;
use sector_progress::types::SectorRow;
use sector_progress::util::format_int;
use std::io::{self, Write};
use std::path::Path;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, DetailArgs, ExportArgs, InteractiveArgs, SummaryArgs};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let registry = match &cli.config {
        Some(path) => SectorRegistry::load(path)
            .with_context(|| format!("failed to load sector registry: {}", path.display()))?,
        None => SectorRegistry::builtin(),
    };
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        Commands::Sectors => handle_sectors(&registry),
        Commands::Summary(args) => handle_summary(&registry, data_dir, args),
        Commands::Detail(args) => handle_detail(&registry, data_dir, args),
        Commands::Export(args) => handle_export(&registry, data_dir, args),
        Commands::Interactive(args) => handle_interactive(&registry, data_dir, args),
    }
}

fn open_store(
    registry: &SectorRegistry,
    data_dir: Option<&Path>,
    slug: &str,
) -> Result<SectorStore> {
    let config = registry.get(slug)?.clone();
    Ok(SectorStore::open(config, data_dir))
}

fn handle_sectors(registry: &SectorRegistry) -> Result<()> {
    let rows: Vec<SectorRow> = registry
        .iter()
        .map(|s| SectorRow {
            slug: s.slug.clone(),
            name: s.name.clone(),
            path: s.path.display().to_string(),
            levels: s.levels(),
        })
        .collect();
    println!("Number of sectors: {}\n", format_int(registry.len()));
    println!("{}", output::render_table(&rows));
    Ok(())
}

fn handle_summary(
    registry: &SectorRegistry,
    data_dir: Option<&Path>,
    args: SummaryArgs,
) -> Result<()> {
    let store = open_store(registry, data_dir, &args.sector)?;
    let sector = store.snapshot();
    let summary = sector.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        output::print_notices(&sector);
    } else {
        output::print_summary(&sector, &summary);
    }
    Ok(())
}

fn handle_detail(
    registry: &SectorRegistry,
    data_dir: Option<&Path>,
    args: DetailArgs,
) -> Result<()> {
    let store = open_store(registry, data_dir, &args.sector)?;
    let sector = store.snapshot();
    output::print_notices(&sector);
    let selection = Selection {
        group: Some(args.group),
        subgroup: args.subgroup,
        item: args.item,
    };
    let detail = sector.detail(&selection);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        output::print_detail(detail.as_ref());
    }
    Ok(())
}

fn handle_export(
    registry: &SectorRegistry,
    data_dir: Option<&Path>,
    args: ExportArgs,
) -> Result<()> {
    let store = open_store(registry, data_dir, &args.sector)?;
    let sector = store.snapshot();
    output::print_notices(&sector);
    let written = output::export_sector(&sector, &args.out_dir)
        .with_context(|| format!("failed to export to {}", args.out_dir.display()))?;
    for path in written {
        println!("Saved {}", path.display());
    }
    Ok(())
}

/// Read one trimmed line after printing `prompt`. `None` on end of input.
fn read_choice(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the menu. `false` for `N` or end of input.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_choice("Back to Menu (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

enum Pick {
    Value(String),
    /// Leave unselected and let the cascade choose.
    First,
    Quit,
}

fn pick_from(label: &str, options: &[String], allow_first: bool) -> Pick {
    if options.is_empty() {
        println!("No {} available.\n", label);
        return Pick::Quit;
    }
    println!("Select {}:", label);
    for (idx, opt) in options.iter().enumerate() {
        println!("[{}] {}", idx + 1, opt);
    }
    if allow_first {
        println!("(press Enter for the first {})", label);
    }
    loop {
        let Some(choice) = read_choice("Enter choice: ") else {
            return Pick::Quit;
        };
        if choice.is_empty() && allow_first {
            return Pick::First;
        }
        match choice.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Pick::Value(options[n - 1].clone()),
            _ => println!("Invalid choice. Please enter 1 to {}.", options.len()),
        }
    }
}

fn select_and_show(store: &SectorStore) {
    let sector = store.snapshot();
    if let Some(incomplete) = sector.schema_incomplete() {
        println!("Error: {}\n", incomplete);
        return;
    }

    let group = match pick_from("group", &group_options(&sector.records, &sector.schema), false) {
        Pick::Value(g) => g,
        Pick::First | Pick::Quit => return,
    };
    let overview = group_overview(&sector.records, &sector.schema, &group);
    println!(
        "\n{}: {} subgroup(s), {} item(s)",
        overview.group,
        format_int(overview.subgroup_count),
        format_int(overview.item_count)
    );
    println!(
        "{}\n",
        output::render_table(&status_table(&overview.near, &overview.far))
    );

    let mut selection = Selection::group(group.as_str());
    if sector.schema.has_subgroup_level() {
        let options = subgroup_options(&sector.records, &sector.schema, &group);
        match pick_from("subgroup", &options, true) {
            Pick::Value(s) => selection.subgroup = Some(s),
            Pick::First => {}
            Pick::Quit => return,
        }
    }
    if selection.subgroup.is_some() || !sector.schema.has_subgroup_level() {
        let options = item_options(
            &sector.records,
            &sector.schema,
            selection.group.as_deref(),
            selection.subgroup.as_deref(),
        );
        match pick_from("item", &options, true) {
            Pick::Value(i) => selection.item = Some(i),
            Pick::First => {}
            Pick::Quit => return,
        }
    }

    output::print_detail(sector.detail(&selection).as_ref());
}

fn handle_interactive(
    registry: &SectorRegistry,
    data_dir: Option<&Path>,
    args: InteractiveArgs,
) -> Result<()> {
    let store = open_store(registry, data_dir, &args.sector)?;
    output::print_notices(&store.snapshot());

    loop {
        println!("{}", store.config().name);
        println!("[1] Show summary");
        println!("[2] Select indicator");
        println!("[3] Reload the file\n");
        let Some(choice) = read_choice("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => {
                let sector = store.snapshot();
                output::print_summary(&sector, &sector.summary());
            }
            "2" => {
                println!();
                select_and_show(&store);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                let sector = store.reload();
                println!(
                    "Reloaded {} ({} rows kept of {}).\n",
                    sector.name,
                    format_int(sector.report.kept_rows),
                    format_int(sector.report.total_rows)
                );
                output::print_notices(&sector);
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
    Ok(())
}
