use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-review",
    version,
    about = "Classify review text with a hosted sentiment model and keep a history of results",
    long_about = "sentiment-review sends text to a Hugging Face inference endpoint, normalizes the class scores to Negative/Neutral/Positive and stores every analyzed review in a local SQLite database. Output is JSON on stdout; logs go to stderr."
)]
pub struct Args {
    /// Inference endpoint URL (overrides SENTIMENT_API_URL)
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// SQLite database URL (overrides SENTIMENT_DATABASE_URL)
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// 输出调试日志
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Analyze a piece of text and store the result
    Analyze {
        /// Text to classify, passed through unmodified
        text: String,
    },
    /// Show the most recently analyzed reviews
    History {
        /// Number of reviews to show (default: SENTIMENT_HISTORY_LIMIT or 10)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show store statistics and health
    Stats,
}
