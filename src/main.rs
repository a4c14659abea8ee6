use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::process::ExitCode;

use html_assets_localizer::{init_logging, HtmlAssetsLocalizer, LocalizeCommand, LocalizeError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = LocalizeCommand::parse();
    init_logging(args.verbose);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            let code = e.downcast_ref::<LocalizeError>().map_or(1, LocalizeError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(args: &LocalizeCommand) -> Result<()> {
    let config = args.to_config();

    if !args.json {
        println!("🚀 Localizing assets for: {}", config.input.display().to_string().blue());
        println!("📁 Asset directory: {:?}", config.asset_root);
    }

    let localizer = HtmlAssetsLocalizer::new(config)?.with_progress(!args.json);
    let summary = localizer.process().await?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", json);
    } else {
        summary.print();
        if !summary.nothing_to_do() {
            println!("✅ Asset localization completed successfully!");
        }
    }
    Ok(())
}
