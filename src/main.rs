use clap::{Args, Parser, Subcommand};
use std::{fs, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

use repovision_lib::{
    analyzer::Analyzer,
    config::{AnalyzerConfig, CloneMethod},
    report::{export_json, export_pdf, report_lines, schema_as_json_string, AnalysisReport},
    server,
};

#[derive(Parser)]
#[command(name = "repovision", version, about = "Explain a GitHub repository")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clone a GitHub repository and analyze it
    Analyze {
        /// https://github.com/<owner>/<repo>[/tree/<ref>]
        url: String,
        #[command(flatten)]
        opts: AnalyzeOpts,
        /// Clone with `git` instead of downloading the zip archive
        #[arg(long)]
        git: bool,
    },
    /// Analyze a directory already on disk
    Scan {
        dir: PathBuf,
        #[command(flatten)]
        opts: AnalyzeOpts,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        ollama_url: Option<String>,
        #[arg(long)]
        no_llm: bool,
    },
    /// Write the report JSON schema
    Schema { path: PathBuf },
}

#[derive(Args)]
struct AnalyzeOpts {
    /// Also write the report as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
    /// Also write the report as PDF
    #[arg(long, value_name = "PATH")]
    pdf: Option<PathBuf>,
    /// Print the JSON report instead of the text summary
    #[arg(long)]
    print_json: bool,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    ollama_url: Option<String>,
    /// Skip the language model and use the rule-based narrative
    #[arg(long)]
    no_llm: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn config_with(model: Option<String>, ollama_url: Option<String>) -> AnalyzerConfig {
    let mut config = AnalyzerConfig::from_env();
    if let Some(model) = model {
        config.ollama_model = model;
    }
    if let Some(url) = ollama_url {
        config.ollama_base_url = url;
    }
    config
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Schema { path } => {
            if let Err(e) = fs::write(&path, schema_as_json_string().as_bytes()) {
                eprintln!("cannot write schema: {}", e);
                return ExitCode::from(2);
            }
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Command::Serve {
            bind,
            model,
            ollama_url,
            no_llm,
        } => {
            let analyzer = match Analyzer::from_config(config_with(model, ollama_url), !no_llm) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            match server::serve(analyzer, &bind).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("server error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Analyze { url, opts, git } => {
            let mut config = config_with(opts.model.clone(), opts.ollama_url.clone());
            if git {
                config.clone_method = CloneMethod::Git;
            }
            let analyzer = match Analyzer::from_config(config, !opts.no_llm) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            finish(analyzer.analyze(&url).await, &opts)
        }
        Command::Scan { dir, opts } => {
            let config = config_with(opts.model.clone(), opts.ollama_url.clone());
            let analyzer = match Analyzer::from_config(config, !opts.no_llm) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            finish(analyzer.analyze_local(&dir).await, &opts)
        }
    }
}

fn finish(result: Result<AnalysisReport, repovision_lib::error::AnalyzeError>, opts: &AnalyzeOpts) -> ExitCode {
    let report = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("analysis failed: {}", e);
            return match e.code() {
                "invalid_input" => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            };
        }
    };

    if opts.print_json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("cannot serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for line in report_lines(&report) {
            println!("{}", line);
        }
    }

    let mut status = ExitCode::SUCCESS;
    if let Some(path) = &opts.json {
        match export_json(path, &report) {
            Ok(()) => eprintln!("wrote {}", path.display()),
            Err(e) => {
                eprintln!("JSON export failed: {}", e);
                status = ExitCode::from(2);
            }
        }
    }
    if let Some(path) = &opts.pdf {
        match export_pdf(path, &report) {
            Ok(()) => eprintln!("wrote {}", path.display()),
            Err(e) => {
                eprintln!("PDF export failed: {}", e);
                status = ExitCode::from(2);
            }
        }
    }
    status
}
