//! # Sello CLI
//!
//! Command-line interface for batch certificate generation.
//!
//! ## Usage
//!
//! ```bash
//! # Generate one PDF per CSV row
//! sello generate --job job.json --data participants.csv
//!
//! # Render on all cores into a chosen directory
//! sello generate --job job.json --data participants.csv --out spring --parallel
//!
//! # Preview row 3 as PNG
//! sello preview --job job.json --data participants.csv --row 3 --png row3.png
//!
//! # Preview with sample text, no data needed
//! sello preview --job job.json --png layout.png
//!
//! # Check the email webhook
//! sello test-email --webhook https://hooks.example.com/send --to me@example.com
//! ```

use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::{Path, PathBuf};

use sello::{
    BatchGenerator, CancelFlag, JobConfig, SelloError,
    batch::{EmailJob, output_dir_or_default},
    data::{DataSource, load_csv},
    email::{DEFAULT_TIMEOUT_SECS, WebhookDispatcher, send_test_email},
    render::{Template, compose, resolve_row, sample_row},
    text::FontLibrary,
};

/// Sello - certificate generator
#[derive(Parser, Debug)]
#[command(name = "sello")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate one certificate per data row
    Generate {
        /// Job file (fields, verification, email settings)
        #[arg(long, value_name = "FILE")]
        job: PathBuf,

        /// CSV file with a header row
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Template image (overrides the job file)
        #[arg(long, value_name = "FILE")]
        template: Option<PathBuf>,

        /// Output directory (defaults to certificates_<timestamp>)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Render rows in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Render a single certificate to PNG
    Preview {
        #[arg(long, value_name = "FILE")]
        job: PathBuf,

        /// CSV file; without it every field shows its sample text
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Row to preview, starting at 1
        #[arg(long, default_value = "1")]
        row: usize,

        #[arg(long, value_name = "FILE")]
        template: Option<PathBuf>,

        /// Output PNG path
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },

    /// Send a test certificate through the email webhook
    TestEmail {
        /// Webhook URL
        #[arg(long)]
        webhook: String,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SelloError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            job,
            data,
            template,
            out,
            parallel,
        } => {
            let job = load_job(&job)?;
            job.check_ready()?;
            let template = load_template(template.as_deref(), &job)?;
            let table = load_csv(&data)?;
            let output_dir = output_dir_or_default(out.as_deref().or(job.output_dir.as_deref()));

            let dispatcher = match &job.email {
                Some(settings) => Some(WebhookDispatcher::new(
                    settings.webhook_url.clone(),
                    settings.timeout_secs,
                )?),
                None => None,
            };

            let cancel = CancelFlag::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\nStopping after the current row...");
                    on_ctrl_c.cancel();
                }
            });

            let mut generator = BatchGenerator::new(&template, &job.fields)
                .verification(job.verification.as_ref())
                .parallel(parallel || job.parallel)
                .cancel_flag(cancel)
                .on_progress(|done, total| eprint!("\rProcessed {}/{}", done, total));
            if let (Some(settings), Some(dispatcher)) = (&job.email, &dispatcher) {
                generator = generator.email(EmailJob {
                    settings,
                    dispatcher,
                });
            }

            let result = generator.generate(&table, &output_dir).await?;
            eprintln!();
            print!("{}", result);
            println!("Output folder: {}", output_dir.display());
            Ok(())
        }

        Commands::Preview {
            job,
            data,
            row,
            template,
            png,
        } => {
            let job = load_job(&job)?;
            let template = load_template(template.as_deref(), &job)?;
            let fonts = FontLibrary::new();

            let image = match data {
                Some(path) => {
                    let table = load_csv(&path)?;
                    if row == 0 || row > table.row_count() {
                        return Err(SelloError::Data(format!(
                            "row {} out of range (1-{})",
                            row,
                            table.row_count()
                        )));
                    }
                    let resolved =
                        resolve_row(&job.fields, job.verification.as_ref(), &table, row - 1);
                    compose(&template, &resolved, &fonts)
                }
                None => {
                    let resolved = sample_row(&job.fields, job.verification.as_ref());
                    compose(&template, &resolved, &fonts)
                }
            };

            image
                .save(&png)
                .map_err(|e| SelloError::Io(std::io::Error::other(e)))?;
            println!("Saved preview to {}", png.display());
            Ok(())
        }

        Commands::TestEmail {
            webhook,
            to,
            timeout,
        } => {
            let dispatcher = WebhookDispatcher::new(webhook, timeout)?;
            send_test_email(&dispatcher, &to).await?;
            println!("Test email sent successfully!");
            Ok(())
        }
    }
}

/// Load a job file, resolving its relative paths against the file's directory.
fn load_job(path: &Path) -> Result<JobConfig, SelloError> {
    let mut job = JobConfig::load(path)?;
    if let Some(dir) = path.parent() {
        job.resolve_paths(dir);
    }
    Ok(job)
}

fn load_template(cli_path: Option<&Path>, job: &JobConfig) -> Result<Template, SelloError> {
    let path = cli_path.or(job.template.as_deref()).ok_or_else(|| {
        SelloError::Config("no template image given (use --template or set \"template\")".into())
    })?;
    Template::load(path)
}
