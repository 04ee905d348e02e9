use std::env;
use std::path::PathBuf;

use crate::infrastructure::error::SentimentError;

pub const DEFAULT_API_URL: &str =
    "https://router.huggingface.co/hf-inference/models/cardiffnlp/twitter-roberta-base-sentiment";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./reviews.db";
pub const DEFAULT_TABLE_NAME: &str = "reviews";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 内存数据库在进程退出后丢失全部记录
pub fn is_in_memory_database(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    url.contains(":memory:") || url.contains("mode=memory")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_token: Option<String>,
    pub api_url: String,
    pub database_url: String,
    pub table_name: String,
    pub history_limit: usize,
    pub request_timeout_secs: u64,
    pub max_concurrency: Option<usize>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrency: None,
            debug: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();

        // 加载配置文件
        #[cfg(not(test))]
        config.load_from_env_file();
        // 加载环境变量（覆盖配置文件）
        config.load_from_env();

        config
    }

    pub fn load_from_env_file(&mut self) {
        if let Ok(home) = env::var("HOME") {
            let user_env_path = PathBuf::from(format!("{}/.sentiment-review/.env", home));
            if user_env_path.exists() {
                dotenvy::from_path(user_env_path).ok();
            }
        }

        dotenvy::dotenv().ok();
    }

    pub fn load_from_env(&mut self) {
        self.load_from(|key| env::var(key).ok());
    }

    /// 从任意键值来源加载配置，空值视为未设置
    pub fn load_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) =
            get("HUGGINGFACE_API_TOKEN").or_else(|| get("REACT_APP_HUGGINGFACE_API_TOKEN"))
        {
            self.api_token = Some(token);
        }
        if let Some(url) = get("SENTIMENT_API_URL") {
            self.api_url = url;
        }
        if let Some(url) = get("SENTIMENT_DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(table) = get("SENTIMENT_TABLE_NAME") {
            self.table_name = table;
        }
        if let Some(limit) = get("SENTIMENT_HISTORY_LIMIT").and_then(|v| v.parse().ok()) {
            self.history_limit = limit;
        }
        if let Some(timeout) = get("SENTIMENT_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = timeout;
        }
        if let Some(max) = get("SENTIMENT_MAX_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.max_concurrency = Some(max);
        }
        if let Some(debug) = get("SENTIMENT_DEBUG") {
            self.debug = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn update_from_args(&mut self, args: &crate::cli::args::Args) {
        // 命令行参数优先级最高
        if let Some(url) = &args.api_url {
            self.api_url = url.clone();
        }
        if let Some(url) = &args.database_url {
            self.database_url = url.clone();
        }
        if args.debug {
            self.debug = true;
        }
    }

    /// 缺少 token 不在这里报错，首次分类时才返回 MissingCredential
    pub fn validate(&self) -> Result<(), SentimentError> {
        if self.api_url.trim().is_empty() {
            return Err(SentimentError::config("SENTIMENT_API_URL must not be empty"));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(SentimentError::config(format!(
                "SENTIMENT_API_URL must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }
        if !self.database_url.starts_with("sqlite:") {
            return Err(SentimentError::config(format!(
                "Unsupported database URL '{}'; only sqlite is supported",
                self.database_url
            )));
        }
        if is_in_memory_database(&self.database_url) {
            return Err(SentimentError::config(format!(
                "In-memory database '{}' is not durable; use a file path",
                self.database_url
            )));
        }
        if self.table_name.is_empty()
            || !self
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SentimentError::config(format!(
                "Invalid table name '{}'",
                self.table_name
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(SentimentError::config("SENTIMENT_TIMEOUT_SECS must be positive"));
        }
        if self.max_concurrency == Some(0) {
            return Err(SentimentError::config("SENTIMENT_MAX_CONCURRENCY must be positive"));
        }
        Ok(())
    }
}
