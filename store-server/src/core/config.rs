use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// MoMo 电子钱包配置
#[derive(Debug, Clone)]
pub struct MomoConfig {
    /// Create-payment endpoint
    pub endpoint: String,
    pub partner_code: String,
    pub access_key: String,
    pub secret_key: String,
}

/// PayOS 配置
#[derive(Debug, Clone)]
pub struct PayOsConfig {
    pub base_url: String,
    pub client_id: String,
    pub api_key: String,
    pub checksum_key: String,
}

/// 服务器配置 - 店铺订单服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 默认日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | LOG_DIR | (无) | 设置后按天滚动写入日志文件 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | EVENT_CHANNEL_CAPACITY | 1024 | 通知总线容量 |
/// | PUBLIC_BASE_URL | http://localhost:3000 | 支付回调使用的外部地址 |
/// | PAYMENT_RETURN_URL | http://localhost:5173/checkout/result | 支付完成跳转 |
/// | PAYMENT_CANCEL_URL | http://localhost:5173/checkout/cancel | 支付取消跳转 |
/// | MOMO_* / PAYOS_* | sandbox | 支付渠道凭据 |
///
/// 支付渠道密钥在非 development 环境下必须设置。
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/store HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// 日志文件目录，未设置时输出到 stdout
    pub log_dir: Option<String>,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
    /// 通知广播通道容量
    pub event_channel_capacity: usize,
    /// 对外可访问的服务地址，拼接 IPN 回调 URL
    pub public_base_url: String,
    pub payment_return_url: String,
    pub payment_cancel_url: String,
    pub momo: MomoConfig,
    pub payos: PayOsConfig,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn env_or(name: &str, default: &str) -> String {
        std::env::var(name).unwrap_or_else(|_| default.into())
    }

    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值；非开发环境缺少密钥时返回错误
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = Self::env_or("ENVIRONMENT", "development");

        Ok(Self {
            work_dir: Self::env_or("WORK_DIR", "./data"),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: Self::env_or("LOG_LEVEL", "info"),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(1024),
            public_base_url: Self::env_or("PUBLIC_BASE_URL", "http://localhost:3000"),
            payment_return_url: Self::env_or(
                "PAYMENT_RETURN_URL",
                "http://localhost:5173/checkout/result",
            ),
            payment_cancel_url: Self::env_or(
                "PAYMENT_CANCEL_URL",
                "http://localhost:5173/checkout/cancel",
            ),
            momo: MomoConfig {
                endpoint: Self::env_or(
                    "MOMO_ENDPOINT",
                    "https://test-payment.momo.vn/v2/gateway/api/create",
                ),
                partner_code: Self::env_or("MOMO_PARTNER_CODE", "MOMO"),
                access_key: Self::require_secret("MOMO_ACCESS_KEY", &environment)?,
                secret_key: Self::require_secret("MOMO_SECRET_KEY", &environment)?,
            },
            payos: PayOsConfig {
                base_url: Self::env_or("PAYOS_BASE_URL", "https://api-merchant.payos.vn"),
                client_id: Self::require_secret("PAYOS_CLIENT_ID", &environment)?,
                api_key: Self::require_secret("PAYOS_API_KEY", &environment)?,
                checksum_key: Self::require_secret("PAYOS_CHECKSUM_KEY", &environment)?,
            },
            environment,
        })
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景，不读取环境变量
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port,
            ..Self::default()
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// MoMo IPN 回调地址
    pub fn momo_ipn_url(&self) -> String {
        format!(
            "{}/api/v1/payments/momo/ipn",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

/// Development defaults, used by tests
impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "./data".into(),
            http_port: 3000,
            environment: "development".into(),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            request_timeout_ms: 30000,
            shutdown_timeout_ms: 10000,
            event_channel_capacity: 1024,
            public_base_url: "http://localhost:3000".into(),
            payment_return_url: "http://localhost:5173/checkout/result".into(),
            payment_cancel_url: "http://localhost:5173/checkout/cancel".into(),
            momo: MomoConfig {
                endpoint: "https://test-payment.momo.vn/v2/gateway/api/create".into(),
                partner_code: "MOMO".into(),
                access_key: "dev-MOMO_ACCESS_KEY-not-for-production".into(),
                secret_key: "dev-MOMO_SECRET_KEY-not-for-production".into(),
            },
            payos: PayOsConfig {
                base_url: "https://api-merchant.payos.vn".into(),
                client_id: "dev-PAYOS_CLIENT_ID-not-for-production".into(),
                api_key: "dev-PAYOS_API_KEY-not-for-production".into(),
                checksum_key: "dev-PAYOS_CHECKSUM_KEY-not-for-production".into(),
            },
        }
    }
}
