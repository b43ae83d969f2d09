//! Booking Server - 多业态预订服务 (酒店 / 咖啡馆 / 餐厅 / 宴会厅)
//!
//! # 架构概述
//!
//! - **定价** (`pricing`): 按业态计算数量、加价倍率、优惠与税费
//! - **资源占用** (`availability`): 桌台/房间/分区的并发占用与释放
//! - **预订生命周期** (`bookings`): 状态机、支付超时、通知
//! - **存储** (`storage`): 嵌入式 redb，单写事务保证占用原子性
//! - **认证** (`auth`): JWT (HS256) + 角色
//! - **HTTP API** (`api`): axum 路由和处理器
//!
//! # 模块结构
//!
//! ```text
//! booking-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── auth/          # JWT 认证
//! ├── api/           # HTTP 路由和处理器
//! ├── bookings/      # 预订生命周期
//! ├── pricing/       # 定价引擎
//! ├── availability/  # 资源占用
//! ├── coupons/       # 优惠券
//! ├── venues/        # 场所注册与缓存
//! ├── storage/       # redb 存储层
//! ├── services/      # 通知
//! └── utils/         # 日志、时间、校验
//! ```

pub mod api;
pub mod auth;
pub mod availability;
pub mod bookings;
pub mod cache;
pub mod core;
pub mod coupons;
pub mod pricing;
pub mod services;
pub mod storage;
pub mod utils;
pub mod venues;
pub mod window;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use bookings::BookingService;
pub use core::{Config, Server, ServerState};
pub use pricing::PricingEngine;
pub use storage::BookingStorage;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境: 加载 .env、创建工作目录、初始化日志
///
/// 生产环境日志写入 `{work_dir}/logs`，其他环境输出到终端。
pub fn setup_environment() -> crate::core::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let logs_dir = config.logs_dir();
    let log_dir = if config.is_production() {
        logs_dir.to_str()
    } else {
        None
    };
    init_logger_with_file(Some(&config.log_level), config.log_json, log_dir);

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____              __   _
   / __ )____  ____  / /__(_)___  ____ _
  / __  / __ \/ __ \/ //_/ / __ \/ __ `/
 / /_/ / /_/ / /_/ / ,< / / / / / /_/ /
/_____/\____/\____/_/|_/_/_/ /_/\__, /
                               /____/
    "#
    );
}
