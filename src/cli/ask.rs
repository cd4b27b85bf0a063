//! CLI `ask` command: retrieve passages and stream a generated answer.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

use wreck::config::WreckConfig;
use wreck::context::assemble_prompt;
use wreck::error::Error;
use wreck::generation;

pub async fn ask(config: &WreckConfig, query: &str, matches: Option<i64>) -> Result<()> {
    let retrieval = super::open_retrieval(config)?;
    let completion = generation::create_provider(&config.generation)?;
    let api_key = super::require_api_key(config)?;
    let matches = matches.unwrap_or(config.retrieval.default_matches);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .context("invalid spinner template")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("searching passages...");

    let results = retrieval.retrieve(query, matches, api_key).await?;
    let prompt = assemble_prompt(query, &results);

    spinner.set_message("waiting for answer...");
    let mut stream = completion.stream_answer(&prompt, api_key).await?;
    spinner.finish_and_clear();

    let mut stdout = std::io::stdout();
    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                stdout.write_all(fragment.as_bytes())?;
                stdout.flush()?;
            }
            Err(Error::MidStreamFailure(reason)) => {
                eprintln!("\n[answer truncated: {reason}]");
                break;
            }
            Err(other) => return Err(other.into()),
        }
    }
    println!();

    println!();
    println!("Passages:");
    for (i, result) in results.iter().enumerate() {
        let p = result.passage;
        println!("  {}. {} ({}) score {:.4}", i + 1, p.post_title, p.post_url, result.score);
    }

    Ok(())
}
