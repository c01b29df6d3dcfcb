use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use log::{debug, info, warn, LevelFilter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ifc_audit::analysis::{count_walls, list_storeys, run_check};
use ifc_audit::bcf::{write_bcfzip, BcfProject};
use ifc_audit::config::{load_config, AuditConfig};
use ifc_audit::console;
use ifc_audit::discovery::{discover_groups, select_group};
use ifc_audit::export::{export_csv, export_json};
use ifc_audit::model::IfcModel;
use ifc_audit::parser::parse_ifc_file;
use ifc_audit::ui::App;

#[derive(Parser, Debug)]
#[command(name = "ifc-audit")]
#[command(about = "IFC Audit - wall counts per storey and structural checks exported as BCF")]
#[command(version)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count structural walls per storey
    Walls {
        /// Path to IFC file
        file: PathBuf,

        /// Export to CSV (optional output path)
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Export to JSON (optional output path)
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// Only count walls of this type name
        #[arg(long, value_name = "NAME")]
        wall_type: Option<String>,
    },

    /// List building storeys sorted by elevation
    Storeys {
        /// Path to IFC file
        file: PathBuf,
    },

    /// Classify structural elements, check floor placement and write a BCF archive
    Check {
        /// Structural model; picked interactively from --dir when omitted
        #[arg(long = "str", value_name = "FILE")]
        structural: Option<PathBuf>,

        /// Architectural model providing the floor reference
        #[arg(long = "arch", value_name = "FILE")]
        architectural: Option<PathBuf>,

        /// Directory searched for <prefix>-STR.ifc / <prefix>-ARCH.ifc pairs
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Group in --dir to check, by 1-based index or prefix; skips the picker
        #[arg(short, long, value_name = "GROUP")]
        group: Option<String>,

        /// Output BCF archive
        #[arg(short, long, value_name = "FILE", default_value = "structural_issues.bcfzip")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    debug!(args:?; "Parsed arguments");

    let mut config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Walls {
            file,
            csv,
            json,
            wall_type,
        } => {
            if wall_type.is_some() {
                config.walls.wall_type = wall_type;
            }
            walls(&config, &file, csv.as_deref(), json.as_deref())
        }
        Command::Storeys { file } => storeys(&file),
        Command::Check {
            structural,
            architectural,
            dir,
            group,
            output,
        } => check(&config, structural, architectural, dir, group.as_deref(), &output),
    }
}

fn walls(config: &AuditConfig, file: &Path, csv: Option<&Path>, json: Option<&Path>) -> Result<()> {
    let model = parse_ifc_file(file)?;
    let tally = count_walls(&model, &config.walls);

    println!("{}", console::wall_tally(&tally));

    if let Some(csv_path) = csv {
        export_csv(&tally, csv_path)?;
        println!("Exported to CSV: {}", csv_path.display());
    }

    if let Some(json_path) = json {
        export_json(&tally, &model.file_path, json_path)?;
        println!("Exported to JSON: {}", json_path.display());
    }

    Ok(())
}

fn storeys(file: &Path) -> Result<()> {
    let model = parse_ifc_file(file)?;
    let file_name = file
        .file_name()
        .map_or_else(|| model.file_path.clone(), |f| f.to_string_lossy().to_string());

    println!("{}", console::storey_table(&file_name, &list_storeys(&model)));
    Ok(())
}

/// Picks a model group from `dir`, by `choice` when given, otherwise in
/// the terminal picker.
fn pick_models(dir: &Path, choice: Option<&str>) -> Result<Option<(PathBuf, Option<PathBuf>)>> {
    let groups = discover_groups(dir)?;

    let group = match choice {
        Some(choice) => Some(
            select_group(&groups, choice)
                .cloned()
                .ok_or_else(|| eyre!("no model group '{choice}' in {}", dir.display()))?,
        ),
        None => {
            let terminal = ratatui::init();
            let result = App::new(dir.to_path_buf(), groups).run(terminal);
            ratatui::restore();
            result?
        }
    };

    Ok(group.and_then(|group| group.structural.map(|s| (s, group.architectural))))
}

fn load_architectural(path: &Path) -> Option<IfcModel> {
    match parse_ifc_file(path) {
        Ok(model) => Some(model),
        Err(err) => {
            warn!(path = path.display().to_string(), error = err.to_string(); "Continuing without architectural model");
            eprintln!("Warning: couldn't open architectural IFC: {err}");
            None
        }
    }
}

fn check(
    config: &AuditConfig,
    structural: Option<PathBuf>,
    architectural: Option<PathBuf>,
    dir: Option<PathBuf>,
    group: Option<&str>,
    output: &Path,
) -> Result<()> {
    let (structural, architectural) = match structural {
        Some(path) => (path, architectural),
        None => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            match pick_models(&dir, group)? {
                Some((s, a)) => (s, architectural.or(a)),
                None => return Err(eyre!("no structural IFC selected")),
            }
        }
    };

    info!(
        structural = structural.display().to_string(),
        architectural = architectural.as_ref().map(|p| p.display().to_string());
        "Running structural check"
    );

    println!("Opening structural IFC {}", structural.display());
    let model = parse_ifc_file(&structural)?;
    let arch_model = architectural.as_deref().and_then(load_architectural);

    let report = run_check(&model, arch_model.as_ref(), config);
    println!("{}", console::check_summary(&report));

    let project = BcfProject::from_check(&model, &report, &config.bcf);
    write_bcfzip(&project, output)?;
    println!("Wrote BCF: {}", output.display());

    Ok(())
}
