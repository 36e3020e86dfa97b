use config::{Config, ConfigError, Environment, File};
use std::env;
use vigil_core::config::AppConfig;

/// 覆盖配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "VIGIL_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/vigil.toml";

/// # Summary
/// 按默认位置加载应用配置。
///
/// # Logic
/// 1. 配置文件路径取 `VIGIL_CONFIG`，未设置时为 `config/vigil.toml`。
/// 2. 委托 `load_from` 完成分层合并。
pub fn load() -> Result<AppConfig, ConfigError> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_from(&path)
}

/// # Summary
/// 分层合并配置：内置默认值 < 配置文件 < 环境变量。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 作为最底层来源。
/// 2. 叠加可选的 TOML 文件，文件不存在时跳过。
/// 3. 叠加 `VIGIL__` 前缀的环境变量，`__` 分隔层级，例如 `VIGIL__BROKER__ACCESS_TOKEN`。
///
/// # Arguments
/// * `path`: 配置文件路径。
///
/// # Returns
/// 合并并反序列化后的配置。
pub fn load_from(path: &str) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("VIGIL")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_from("does/not/exist.toml").unwrap();
        assert_eq!(config.market.timezone, "Asia/Kolkata");
        assert_eq!(config.market.lookback_days, 4);
        assert_eq!(config.market.symbols.len(), 2);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
dry_run = false

[market]
cutoff_hour = 15
symbols = [{{ name = "FINNIFTY", token = "257801", reference_token = "256265" }}]

[email]
to = "a@example.com,b@example.com"
"#
        )
        .unwrap();

        let config = load_from(file.path().to_str().unwrap()).unwrap();

        assert!(!config.dry_run);
        assert_eq!(config.market.cutoff_hour, 15);
        // 未覆盖的字段保留默认值
        assert_eq!(config.market.cutoff_minute, 30);
        assert_eq!(config.market.symbols.len(), 1);
        assert_eq!(config.market.symbols[0].name, "FINNIFTY");
        assert_eq!(config.recipients().len(), 2);
        assert_eq!(config.email.host, "smtp.gmail.com");
    }
}
