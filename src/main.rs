//! # config-report CLI
//!
//! Usage:
//!   config-report --rows rows.json --system-xml system.xml -o report.pdf
//!   config-report --rows rows.json --system-xml system.xml --config report.json
//!   config-report --print-default-config > report.json

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;

use config_report::config::ReportConfig;
use config_report::error::Result;
use config_report::metadata::FieldMetadata;
use config_report::source::JsonFileConfigSource;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON dump of the config table: [{"path": ..., "value": ...}, ...]
    #[arg(long, required_unless_present = "print_default_config")]
    rows: Option<PathBuf>,

    /// The module's adminhtml system.xml
    #[arg(long, required_unless_present = "print_default_config")]
    system_xml: Option<PathBuf>,

    /// Report configuration (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only export rows whose path contains this text
    #[arg(long)]
    filter: Option<String>,

    /// Output PDF path
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Print the default report configuration as JSON and exit
    #[arg(long, default_value_t = false)]
    print_default_config: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.print_default_config {
        println!("{}", serde_json::to_string_pretty(&ReportConfig::default())?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => ReportConfig::from_json_file(path)?,
        None => ReportConfig::default(),
    };
    if let Some(filter) = args.filter {
        config.path_filter = filter;
    }

    // clap guarantees both are present unless printing the config
    let (Some(rows), Some(system_xml)) = (args.rows, args.system_xml) else {
        return Ok(());
    };

    let metadata = FieldMetadata::from_xml_file(&system_xml)?;
    let source = JsonFileConfigSource::new(rows);
    let pdf_bytes = config_report::render_report(&config, &source, &metadata)?;

    fs::write(&args.output, &pdf_bytes)?;
    eprintln!(
        "✓ Written {} bytes to {}",
        pdf_bytes.len(),
        args.output.display()
    );
    Ok(())
}
