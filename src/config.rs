use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the trained model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// CSV export of historical survey responses used for training
    #[serde(default = "default_survey_csv_path")]
    pub survey_csv_path: PathBuf,

    /// Number of nearest respondents considered per query
    #[serde(default = "default_similar_top_k")]
    pub similar_top_k: usize,

    /// Categorical fields used for similarity, comma separated
    #[serde(default = "default_features")]
    pub features: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("ml_models")
}

fn default_survey_csv_path() -> PathBuf {
    PathBuf::from("data/survey_data.csv")
}

fn default_similar_top_k() -> usize {
    5
}

fn default_features() -> Vec<String> {
    [
        "age_group",
        "gender",
        "companion",
        "location_type",
        "vacation_type",
        "next_vacation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_dir: default_model_dir(),
            survey_csv_path: default_survey_csv_path(),
            similar_top_k: default_similar_top_k(),
            features: default_features(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.similar_top_k == 0 {
            anyhow::bail!("SIMILAR_TOP_K must be at least 1");
        }

        Ok(config)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
