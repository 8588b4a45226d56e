use clap::Parser;
use sitescribe::crawlers::web;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let config = args.into_config();

    ::log::info!("Starting crawl of {}", config.start_url);

    println!("Note: crawling requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
    );

    match web::run(&config).await {
        Ok(processed) => {
            ::log::info!(
                "Recorded {} pages under {}",
                processed,
                config.outdir.display()
            );
        }
        Err(e) => {
            ::log::error!("Crawl failed: {}", e);
            std::process::exit(1);
        }
    }
}
