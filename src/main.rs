use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use transync::mt::ServiceRegistry;
use transync::{
    InterpolationMatcher, ResourceFormat, ResourceLocation, SyncDriver, SyncError, SyncPass,
    SyncResult, cache_path_for,
};

fn cli() -> Command {
    Command::new("transync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate only what changed in your localization files")
        .arg(
            Arg::new("src-file")
                .long("src-file")
                .help("Source resource file")
                .required(true),
        )
        .arg(
            Arg::new("src-lng")
                .long("src-lng")
                .help("Language code of the source file (e.g., en)")
                .required(true),
        )
        .arg(
            Arg::new("src-format")
                .long("src-format")
                .help("Source file format: flat-json or nested-json")
                .default_value("flat-json"),
        )
        .arg(
            Arg::new("target-file")
                .long("target-file")
                .help("Comma-separated list of target files")
                .required(true),
        )
        .arg(
            Arg::new("target-lng")
                .long("target-lng")
                .help("Comma-separated list of target language codes, one per target file")
                .required(true),
        )
        .arg(
            Arg::new("target-format")
                .long("target-format")
                .help("Target file format: flat-json or nested-json")
                .default_value("flat-json"),
        )
        .arg(
            Arg::new("service")
                .long("service")
                .help(format!(
                    "Translation service ({})",
                    ServiceRegistry::service_ids().join(", ")
                ))
                .required(true),
        )
        .arg(
            Arg::new("service-config")
                .long("service-config")
                .help("Provider credentials, e.g. an API key (defaults to the provider's environment variable)"),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .help("Directory holding the translation caches")
                .default_value("translate-cache"),
        )
        .arg(
            Arg::new("matcher")
                .long("matcher")
                .help("Placeholder syntax: none, icu, i18next, sprintf or regex:<pattern>")
                .default_value("icu"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every sync phase to stderr")
                .action(ArgAction::SetTrue),
        )
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,transync=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn string_arg<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

/// Turn the command line into one validated pass per target file
fn build_passes(matches: &ArgMatches) -> SyncResult<Vec<SyncPass>> {
    let arg = |name: &str| string_arg(matches, name);

    let target_files = split_list(arg("target-file"));
    let target_lngs = split_list(arg("target-lng"));
    if target_files.is_empty() {
        return Err(SyncError::config("at least one target file is required"));
    }
    if target_files.len() != target_lngs.len() {
        return Err(SyncError::config(format!(
            "{} target files but {} target languages",
            target_files.len(),
            target_lngs.len()
        )));
    }

    let src_format: ResourceFormat = arg("src-format").parse()?;
    let target_format: ResourceFormat = arg("target-format").parse()?;
    let matcher: InterpolationMatcher = arg("matcher").parse()?;
    let service = arg("service");
    ServiceRegistry::validate(service)?;

    let src_file = PathBuf::from(arg("src-file"));
    if !src_file.is_file() {
        return Err(SyncError::config(format!(
            "source file '{}' does not exist",
            src_file.display()
        )));
    }
    let cache_dir = Path::new(arg("cache-dir"));

    let passes: Vec<SyncPass> = target_files
        .iter()
        .zip(&target_lngs)
        .map(|(file, lng)| {
            let target = PathBuf::from(file);
            SyncPass {
                source: ResourceLocation::new(&src_file, src_format),
                cache_path: cache_path_for(cache_dir, &src_file, &target),
                target: ResourceLocation::new(target, target_format),
                src_lng: arg("src-lng").to_string(),
                target_lng: lng.clone(),
                service: service.to_string(),
                service_config: matches.get_one::<String>("service-config").cloned(),
                matcher: matcher.clone(),
            }
        })
        .collect();

    for pass in &passes {
        pass.validate()?;
    }
    Ok(passes)
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let passes = match build_passes(&matches) {
        Ok(passes) => passes,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!(passes = passes.len(), "command line accepted");

    let mut driver = SyncDriver::new();
    let result = driver
        .sync_all(&passes, |report| {
            for line in &report.lines {
                println!("{}", line);
            }
        })
        .await;

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
