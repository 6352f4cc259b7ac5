//! Operator CLI: run migrations, trigger a pipeline pass, and inspect
//! stored topics, posts, and activity without going through the HTTP API.

use clap::{Parser, Subcommand};
use postpilot_core::AppConfig;
use sqlx::PgPool;

#[derive(Debug, Parser)]
#[command(name = "postpilot-cli")]
#[command(about = "postpilot command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Run one full pipeline pass (collect, filter, generate, review, schedule).
    Run,
    /// Process pending comments (sentiment + response drafts).
    Comments {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// List trend topics, highest relevance first.
    Trends {
        #[arg(long, default_value_t = false)]
        include_inactive: bool,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// List posts, newest first.
    Posts {
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// List recent agent activity, newest first.
    Activity {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = postpilot_core::load_app_config_from_env()?;

    let pool_config = postpilot_db::PoolConfig::from_app_config(&config);
    let pool = postpilot_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = postpilot_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Run => {
            let pipeline = build_pipeline(&config, pool)?;
            let report = pipeline.run().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success {
                anyhow::bail!("pipeline run failed");
            }
        }
        Commands::Comments { limit } => {
            let pipeline = build_pipeline(&config, pool)?;
            let outcome = pipeline.process_comments(limit).await?;
            println!(
                "processed {} comment(s), {} flagged for response",
                outcome.processed, outcome.flagged
            );
        }
        Commands::Trends {
            include_inactive,
            limit,
        } => {
            let rows = postpilot_db::list_trend_topics(&pool, !include_inactive, limit).await?;
            for row in rows {
                println!(
                    "{:>6}  {:.2}  {}  {}  [{}]",
                    row.id,
                    row.relevance_score,
                    if row.is_active { "active  " } else { "inactive" },
                    row.topic,
                    row.hashtags.0.join(", "),
                );
            }
        }
        Commands::Posts { status, limit } => {
            let rows = postpilot_db::list_posts(&pool, status.as_deref(), limit).await?;
            for row in rows {
                let preview: String = row.content.chars().take(60).collect();
                println!(
                    "{:>6}  {:<9}  {}  {}",
                    row.id,
                    row.status,
                    row.scheduled_at
                        .map_or_else(|| "unscheduled".to_string(), |t| t.to_rfc3339()),
                    preview,
                );
            }
        }
        Commands::Activity { agent, limit } => {
            let rows =
                postpilot_db::list_activities(&pool, agent.as_deref(), None, limit).await?;
            for row in rows {
                println!(
                    "{}  {:<11}  {:<20}  {:<7}  {}",
                    row.executed_at.to_rfc3339(),
                    row.agent_name,
                    row.activity_type,
                    row.status,
                    row.error_message.as_deref().unwrap_or(""),
                );
            }
        }
    }

    Ok(())
}

fn build_pipeline(
    config: &AppConfig,
    pool: PgPool,
) -> anyhow::Result<postpilot_pipeline::Pipeline<postpilot_llm::LlmClient>> {
    let llm = postpilot_llm::LlmClient::new(&config.llm)?;
    let news = postpilot_news::NewsClient::new(&config.feed)?;
    let sources = postpilot_core::load_sources(&config.sources_path)?.enabled();

    Ok(postpilot_pipeline::Pipeline::new(
        pool,
        llm,
        news,
        sources,
        config.pipeline.clone(),
        config.feed.lookback_hours,
    ))
}
