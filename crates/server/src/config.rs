use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub content: ContentSettings,
    #[serde(default)]
    pub stats: StatsSettings,
    pub security: SecuritySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct ContentSettings {
    // 技能文档的内容根目录
    pub root: String,
}

#[derive(Deserialize, Clone, Default)]
pub struct StatsSettings {
    // 计数器服务端点；缺省时统计上报为空操作
    pub endpoint: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub actor_token_secret: String,
    // 启动时引导的管理员账号 ID（可选）
    pub bootstrap_admin: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/skilldock.db")?
            .set_default("content.root", "data/content")?
            .set_default("security.actor_token_secret", "change_me_please")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .expect("Environment variables should serialize to JSON"),
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("SKILLDOCK_"))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches("SKILLDOCK_")
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
