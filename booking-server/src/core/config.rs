use std::path::PathBuf;

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::auth::JwtConfig;
use crate::utils::time::parse_clock;

/// 服务器配置 - 预订服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/booking | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | BUSINESS_TZ | UTC | 业务时区 (IANA) |
/// | PAYMENT_TIMEOUT_SECS | 300 | 未支付预订的保留时长(秒) |
/// | PEAK_HOUR_START | 19:00 | 高峰时段起点 |
/// | DEFAULT_CURRENCY | USD | 场所未指定时的币种 |
/// | VENUE_CACHE_TTL_SECS | 60 | 场所缓存有效期(秒) |
/// | VENUE_CACHE_CAPACITY | 1024 | 场所缓存容量 |
/// | NOTIFICATION_WEBHOOK_URL | - | 通知 webhook，未设置时仅记录日志 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
///
/// JWT 相关变量见 [`JwtConfig`]。
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/booking HTTP_PORT=8080 BUSINESS_TZ=Asia/Manila cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,

    // === 预订业务配置 ===
    /// 业务时区：日期、周末与高峰时段按此时区判断
    pub business_tz: Tz,
    /// 未支付预订的过期时长 (秒)
    pub payment_timeout_secs: u64,
    /// 结束时刻不早于此时刻的时段预订计入高峰
    pub peak_hour_start: NaiveTime,
    pub default_currency: String,
    pub venue_cache_ttl_secs: u64,
    pub venue_cache_capacity: usize,
    pub notification_webhook_url: Option<String>,

    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

fn default_peak_start() -> NaiveTime {
    NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/booking".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),

            business_tz: std::env::var("BUSINESS_TZ")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::UTC),
            payment_timeout_secs: std::env::var("PAYMENT_TIMEOUT_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(300),
            peak_hour_start: std::env::var("PEAK_HOUR_START")
                .map(|v| parse_clock(&v, default_peak_start()))
                .unwrap_or_else(|_| default_peak_start()),
            default_currency: std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "USD".into()),
            venue_cache_ttl_secs: std::env::var("VENUE_CACHE_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            venue_cache_capacity: std::env::var("VENUE_CACHE_CAPACITY")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1024),
            notification_webhook_url: std::env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),

            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库目录
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("bookings.redb")
    }

    /// 日志目录
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 创建工作目录结构
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_and_paths() {
        let config = Config::with_overrides("/tmp/booking-test", 8088);
        assert_eq!(config.http_port, 8088);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/booking-test/database/bookings.redb")
        );
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/booking-test/logs"));
    }

    #[test]
    fn test_default_peak_start() {
        assert_eq!(default_peak_start(), NaiveTime::from_hms_opt(19, 0, 0).unwrap());
    }
}
