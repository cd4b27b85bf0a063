use anyhow::Result;

use wreck::config::WreckConfig;

/// Display corpus statistics in the terminal.
pub fn stats(config: &WreckConfig) -> Result<()> {
    let corpus = super::load_corpus(config)?;
    let stats = corpus.stats();

    println!("Corpus Statistics");
    println!("{}", "=".repeat(40));
    println!("  Source:              {}", config.resolved_corpus_path().display());
    if let Some(ref author) = stats.author {
        println!("  Author:              {author}");
    }
    println!("  Posts:               {}", stats.posts);
    println!("  Passages:            {}", stats.passages);
    match stats.dimensions {
        Some(d) => println!("  Dimensions:          {d}"),
        None => println!("  Dimensions:          (empty corpus)"),
    }
    println!();

    println!("By Type:");
    for (kind, count) in &stats.by_type {
        println!("  {:<12} {}", kind, count);
    }
    println!();

    println!("Total tokens:          {}", stats.total_tokens);
    println!("Total characters:      {}", stats.total_characters);

    Ok(())
}
