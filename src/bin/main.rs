use clap::Parser;
use eoka_shelf::price::format_usd;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "eoka-shelf")]
#[command(about = "Check the price of the second Best Sellers item in a store category")]
#[command(version)]
struct Cli {
    /// Scenario config file
    #[arg(default_value = "configs/bestseller.yaml")]
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Price threshold (shorthand for -P PRICE_THRESHOLD=...)
    #[arg(long)]
    threshold: Option<String>,

    /// Delivery ZIP (shorthand for -P ZIP=...)
    #[arg(long)]
    zip: Option<String>,

    /// Storefront base URL (shorthand for -P BASE_URL=...)
    #[arg(long)]
    base_url: Option<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> eoka_shelf::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
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

    let mut params = eoka_shelf::Params::from_args(&cli.params)?;
    for (key, value) in [
        ("PRICE_THRESHOLD", &cli.threshold),
        ("ZIP", &cli.zip),
        ("BASE_URL", &cli.base_url),
    ] {
        if let Some(value) = value {
            params = params.set(key, value);
        }
    }

    let mut config = eoka_shelf::Config::load_with_params(&cli.config, &params)?;

    if cli.check {
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!("  ZIP: {}", config.location.zip);
        println!(
            "  Path: /{}/ > /{}/",
            config.navigation.department, config.navigation.category
        );
        println!("  Threshold: {}", format_usd(config.extraction.threshold));
        if !config.cookies.is_empty() {
            println!("  Cookies: {}", config.cookies.len());
        }
        if !config.params.is_empty() {
            println!("  Parameters: {}", config.params.len());
            for (name, def) in &config.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        if let Some(ref on_failure) = config.on_failure {
            if let Some(ref retry) = on_failure.retry {
                println!("  Retry attempts: {}", retry.attempts);
            }
        }
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }

    println!("Running: {}", config.name);

    let mut runner = eoka_shelf::Runner::new(&config.browser).await?;
    let result = runner.run(&config).await?;

    println!();
    if result.success {
        println!("✓ Success");
    } else {
        println!("✗ Failed");
        if let Some(ref phase) = result.phase {
            println!("  Phase: {}", phase);
        }
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
    if let Some(price) = result.price {
        println!(
            "  Price: {} (threshold {})",
            format_usd(price),
            format_usd(result.threshold)
        );
    }
    println!("  Duration: {}ms", result.duration_ms);
    if result.retries > 0 {
        println!("  Retries: {}", result.retries);
    }

    runner.close().await?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
