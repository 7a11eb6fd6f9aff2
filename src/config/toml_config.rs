use crate::config::StkConfig;
use crate::utils::error::{Result, StkError};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

impl StkConfig {
    /// 從 TOML 檔案載入配置（未列出的欄位使用預設值）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| StkError::config(format!("TOML parsing error: {}", e)))
    }

    /// 依序套用：預設值、可選的設定檔、STK_MCP_* 環境變數
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        let vars: HashMap<String, String> = std::env::vars().collect();
        config.apply_env(&vars)?;
        Ok(config)
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

/// 替換環境變數 (例如 ${STK_HOST})，找不到的變數保留原樣
fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
}
