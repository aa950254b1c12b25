use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "eoka-invite")]
#[command(about = "Quota-bounded invite-to-follow selection for company pages")]
#[command(version)]
struct Cli {
    /// Config file to run
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Start one run right after the page loads instead of waiting for a click
    #[arg(long, conflicts_with = "once")]
    auto: bool,

    /// Exit after the first run triggered from the page
    #[arg(long)]
    once: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> eoka_invite::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let params = eoka_invite::Params::from_args(&cli.params)?;
    let mut config = eoka_invite::Config::load_with_params(&cli.config, &params)?;

    if cli.check {
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!(
            "  Panel: {} (show more: '{}')",
            config.page.results_container, config.page.show_more_label
        );
        println!(
            "  Delays: settle {}ms, batch {}ms, scroll {}ms, page {}ms",
            config.driver.settle_delay_ms,
            config.driver.batch_delay_ms,
            config.driver.scroll_delay_ms,
            config.driver.pagination_delay_ms
        );
        println!("  Idle ceiling: {}", config.driver.idle_ceiling);
        if !config.params.is_empty() {
            println!("  Parameters: {}", config.params.len());
            for (name, def) in &config.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }

    println!("Running: {}", config.name);

    let runner = eoka_invite::Runner::new(&config).await?;
    runner.open().await?;

    let mut summary = eoka_invite::WatchSummary::default();
    if cli.auto {
        summary.reports.push(runner.run_once().await);
    } else {
        println!(
            "Waiting for '{}' clicks on the page (Ctrl-C to stop)",
            config.entry_point.label
        );
        let mut options = runner.watch_options();
        options.once = cli.once;
        summary = runner.watch(options).await?;
        println!("  Runs: {}", summary.reports.len());
    }

    println!();
    let aborted = match summary.last_run() {
        Some(report) => {
            let mark = if report.outcome.is_aborted() { "✗" } else { "✓" };
            println!("{} {}", mark, report.outcome);
            println!("  Selected: {}/{}", report.selected, report.planned);
            println!("  Batches: {}", report.batches);
            println!("  Pages: {}", report.pages);
            println!("  Duration: {}ms", report.duration_ms);
            report.outcome.is_aborted()
        }
        None => {
            println!("No run was started");
            false
        }
    };

    runner.close().await?;

    if aborted {
        std::process::exit(1);
    }

    Ok(())
}
