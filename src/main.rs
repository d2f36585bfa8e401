use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use console::style;
use pagespeed_audit::audit::run_audits;
use pagespeed_audit::input::{load_api_key, load_urls};
use pagespeed_audit::network::{PageSpeedClient, build_client};
use pagespeed_audit::options::{Cli, ConfigFile};
use pagespeed_audit::report::write_csv_report;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse terminal arguments.
    let mut options = Cli::parse();

    // Load config file and apply values (CLI args take priority).
    let config = ConfigFile::load(options.config.as_ref()).unwrap_or_else(|e| {
        eprintln!("{} {}", style("[ERROR]").red(), e);
        std::process::exit(1);
    });
    options.apply_config(&config).unwrap_or_else(|e| {
        eprintln!("{} {}", style("[ERROR]").red(), e);
        std::process::exit(1);
    });

    // From here on every failure is reported and ends the run quietly.
    let settings = match options.settings() {
        Ok(settings) => settings,
        Err(e) => {
            println!("{} {}", style("[ERROR]").red(), e);
            return ExitCode::SUCCESS;
        }
    };

    println!("{} 📄 Load URLs and API key...", style("[1/3]").dim());
    let urls = match load_urls(&settings.urls, &settings.domain) {
        Ok(urls) => urls,
        Err(e) => {
            println!("{} {}", style("[ERROR]").red(), e);
            return ExitCode::SUCCESS;
        }
    };
    let api_key = match load_api_key(&settings.key) {
        Ok(key) => key,
        Err(e) => {
            println!("{} {}", style("[ERROR]").red(), e);
            return ExitCode::SUCCESS;
        }
    };

    if urls.is_empty() {
        println!(
            "{} No URL in {} starts with '{}'",
            style("[WARN]").yellow(),
            settings.urls.display(),
            settings.domain
        );
        return ExitCode::SUCCESS;
    }

    let client = match build_client(&settings.user_agent) {
        Ok(client) => client,
        Err(e) => {
            println!("{} {}", style("[ERROR]").red(), e);
            return ExitCode::SUCCESS;
        }
    };
    let fetcher = Arc::new(PageSpeedClient::new(client, settings.endpoint.clone()));

    println!(
        "{} Auditing {} unique URLs with strategy {}",
        style("[+]").green(),
        urls.len(),
        style(settings.strategy).bold()
    );
    let report = run_audits(&urls, &api_key, settings.strategy, settings.mode, fetcher).await;
    report.show_text_report();

    println!("{} 💾 Write results...", style("[3/3]").dim());
    match write_csv_report(&report.records, &settings.result) {
        Ok(path) => println!(
            "\n📊 Written file in {}",
            style(path.display()).underlined().cyan()
        ),
        Err(e) => println!(
            "{} Something went wrong when writing the file {}: {}",
            style("[ERROR]").red(),
            settings.result,
            e
        ),
    }

    ExitCode::SUCCESS
}
