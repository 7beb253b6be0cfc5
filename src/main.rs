// Command-line interface: run the pipeline one-shot against a local
// database file, printing each stage.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use askdb::config::Config;
use askdb::error::PipelineError;
use askdb::executor;
use askdb::llm::gateway_from_config;
use askdb::prompts::QUERY_PROMPT;
use askdb::schema::extract_schema;
use askdb::sql_format::normalize_query;
use askdb::summarize;

#[derive(Parser)]
#[command(name = "askdb")]
#[command(about = "Ask natural-language questions about a SQLite database")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, execute and interpret a query for a question
    Ask {
        /// The question in natural language
        question: String,

        /// Path to the SQLite database file
        #[arg(short, long, default_value = "uploaded_database.db")]
        db: PathBuf,
    },
    /// Print the schema extracted from a database file
    Schema {
        /// Path to the SQLite database file
        #[arg(short, long, default_value = "uploaded_database.db")]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askdb=warn".into()),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    match args.command {
        Commands::Schema { db } => {
            let schema = extract_schema(&db)?;
            println!("{}", schema);
        }
        Commands::Ask { question, db } => {
            let gateway = gateway_from_config(&config);

            let schema = extract_schema(&db)?;
            println!("Database Schema:\n{}", schema);

            let prompt = QUERY_PROMPT.render(&question, &schema);
            let raw = gateway.generate(&prompt, config.query_max_tokens).await?;
            let query = normalize_query(QUERY_PROMPT.extract_response(&raw));
            println!("Generated SQL Query:\n{}", query);

            match executor::execute_query(&query, &db) {
                Err(PipelineError::Execution(message)) => {
                    println!("Error: {}", message);
                }
                Err(e) => return Err(e.into()),
                Ok(result) => {
                    println!("Query Result:\n{}", summarize::render_text_table(&result));

                    let interpretation = summarize::summarize(
                        gateway.as_ref(),
                        &result,
                        &question,
                        config.summary_max_tokens,
                    )
                    .await?;
                    println!("Natural Language Description:\n{}", interpretation);
                }
            }
        }
    }

    Ok(())
}
