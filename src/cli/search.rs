use anyhow::Result;

use wreck::config::WreckConfig;

/// Run a passage search from the terminal.
pub async fn search(config: &WreckConfig, query: &str, matches: Option<i64>) -> Result<()> {
    let retrieval = super::open_retrieval(config)?;
    let api_key = super::require_api_key(config)?;
    let matches = matches.unwrap_or(config.retrieval.default_matches);

    let results = retrieval.retrieve(query, matches, api_key).await?;

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} passage(s)\n", results.len());

    for (i, result) in results.iter().enumerate() {
        let p = result.passage;
        println!(
            "  {}. {} [{}] (score: {:.4})",
            i + 1,
            p.post_title,
            p.post_type,
            result.score,
        );
        match p.post_date {
            Some(ref date) => println!("     {} | {date}", p.post_url),
            None => println!("     {}", p.post_url),
        }
        println!("     {}", super::preview(&p.content, 160));
        println!();
    }

    Ok(())
}
