//! Pipeline command handlers for the CLI.
//!
//! Each handler runs one pipeline operation recorded in the run ledger with
//! trigger source `cli` and prints its report.

use kpulse_pipeline::{Pipeline, TriggerSource};

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!("errors:");
    for error in errors {
        println!("  - {error}");
    }
}

/// # Errors
///
/// Returns an error only if the run ledger machinery itself fails.
pub(crate) async fn run_collect(pipeline: &Pipeline) -> anyhow::Result<()> {
    let report = pipeline.collect_tracked(TriggerSource::Cli).await?;
    println!(
        "collected {} articles from {} feeds ({} new sources)",
        report.collected, report.feeds_checked, report.new_sources
    );
    for result in &report.feed_results {
        println!("  {:<32}{}", result.feed, result.count);
    }
    print_errors(&report.errors);
    Ok(())
}

/// # Errors
///
/// Returns an error if no model is configured or the backlog cannot be read.
pub(crate) async fn run_translate(
    pipeline: &Pipeline,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let report = pipeline.translate_tracked(limit, TriggerSource::Cli).await?;
    println!("translated {} of {} articles", report.translated, report.total);
    print_errors(&report.errors);
    Ok(())
}

/// # Errors
///
/// Returns an error if no model is configured or target groups cannot be read.
pub(crate) async fn run_roundup(pipeline: &Pipeline) -> anyhow::Result<()> {
    let report = pipeline.roundup_tracked(TriggerSource::Cli).await?;
    println!(
        "generated {} of {} roundups for week of {}",
        report.generated, report.total, report.week
    );
    print_errors(&report.errors);
    Ok(())
}

pub(crate) async fn run_news(pipeline: &Pipeline) {
    let report = pipeline.run_news_cycle(TriggerSource::Cli).await;
    if let Some(collect) = &report.collect {
        println!("collected {} articles", collect.collected);
    }
    if let Some(translate) = &report.translate {
        println!(
            "translated {} of {} articles",
            translate.translated, translate.total
        );
    }
    print_errors(&report.errors);
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_status(pipeline: &Pipeline) -> anyhow::Result<()> {
    let status = pipeline.status().await?;
    println!("articles:     {}", status.total_articles);
    println!("translated:   {}", status.translated_articles);
    println!("untranslated: {}", status.untranslated_articles);
    println!("sources:      {}", status.total_sources);

    if status.recent_articles.is_empty() {
        return Ok(());
    }
    println!();
    println!("{:<18}{:<12}TITLE", "PUBLISHED", "TRANSLATED");
    for article in &status.recent_articles {
        println!(
            "{:<18}{:<12}{}",
            article.published_at.format("%Y-%m-%d %H:%M"),
            if article.is_translated { "yes" } else { "no" },
            truncate_title(&article.original_title)
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = kpulse_db::list_pipeline_runs(pool, limit.clamp(1, 100)).await?;
    if runs.is_empty() {
        println!("no pipeline runs recorded yet");
        return Ok(());
    }

    println!(
        "{:<8}{:<11}{:<11}{:<11}{:<9}CREATED",
        "ID", "TYPE", "TRIGGER", "STATUS", "RECORDS"
    );
    for run in &runs {
        println!(
            "{:<8}{:<11}{:<11}{:<11}{:<9}{}",
            run.id,
            run.run_type,
            run.trigger_source,
            run.status,
            run.records_processed,
            run.created_at.format("%Y-%m-%d %H:%M")
        );
        if let Some(message) = &run.error_message {
            println!("        error: {message}");
        }
    }
    Ok(())
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > 60 {
        format!("{}...", title.chars().take(60).collect::<String>())
    } else {
        title.to_string()
    }
}
