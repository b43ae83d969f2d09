use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::auth::JwtService;
use crate::bookings::expiry::{SWEEP_INTERVAL, run_sweeper};
use crate::bookings::{BookingService, BookingSettings, ExpiryScheduler, ExpiryWorker};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result};
use crate::coupons::CouponService;
use crate::pricing::PricingEngine;
use crate::services::NotificationDispatcher;
use crate::storage::BookingStorage;
use crate::venues::VenueService;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是浅拷贝 (Arc / Clone 句柄)，可以直接作为 axum State。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | storage | redb 存储 |
/// | jwt_service | JWT 认证服务 |
/// | venues | 场所注册 + 缓存 |
/// | bookings | 预订生命周期 |
/// | coupons | 优惠券管理 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: BookingStorage,
    pub jwt_service: Arc<JwtService>,
    pub venues: VenueService,
    pub bookings: BookingService,
    pub coupons: CouponService,
    /// Fired-timer channel, taken once by the expiry worker
    expiry_rx: Arc<Mutex<Option<UnboundedReceiver<i64>>>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 创建工作目录并打开 `{work_dir}/database/bookings.redb`。
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;
        let db_path = config.database_path();
        let storage = BookingStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Storage opened");
        Ok(Self::with_storage(config.clone(), storage))
    }

    /// 基于现有存储构建状态 (测试使用内存存储)
    pub fn with_storage(config: Config, storage: BookingStorage) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let venues = VenueService::new(
            storage.clone(),
            Duration::from_secs(config.venue_cache_ttl_secs),
            config.venue_cache_capacity,
            config.default_currency.clone(),
        );
        let (scheduler, expiry_rx) = ExpiryScheduler::new();
        let settings = BookingSettings {
            business_tz: config.business_tz,
            payment_timeout: Duration::from_secs(config.payment_timeout_secs),
        };
        let bookings = BookingService::new(
            storage.clone(),
            venues.clone(),
            PricingEngine::new(config.peak_hour_start),
            Arc::new(scheduler),
            NotificationDispatcher::from_webhook_url(config.notification_webhook_url.as_deref()),
            settings,
        );
        let coupons = CouponService::new(storage.clone());

        Self {
            config,
            storage,
            jwt_service,
            venues,
            bookings,
            coupons,
            expiry_rx: Arc::new(Mutex::new(Some(expiry_rx))),
        }
    }

    pub fn expiry(&self) -> &Arc<ExpiryScheduler> {
        self.bookings.expiry()
    }

    /// 启动后台任务
    ///
    /// - Warmup: 从存储恢复未支付预订的计时器
    /// - Worker: 处理到期计时器
    /// - Periodic: 定期扫描漏掉的过期预订
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let scheduler = self.expiry().clone();
        let storage = self.storage.clone();
        tasks.spawn("expiry_rearm", TaskKind::Warmup, async move {
            match scheduler.rearm(&storage) {
                Ok(0) => {}
                Ok(n) => tracing::info!(count = n, "Re-armed payment timers"),
                Err(e) => tracing::error!(error = %e, "Failed to re-arm payment timers"),
            }
        });

        match self.expiry_rx.lock().take() {
            Some(rx) => {
                let worker = ExpiryWorker::new(self.bookings.clone(), rx);
                let token = tasks.shutdown_token();
                tasks.spawn("expiry_worker", TaskKind::Worker, worker.run(token));
            }
            None => tracing::warn!("Expiry worker already started"),
        }

        let sweeper = run_sweeper(
            self.expiry().clone(),
            self.storage.clone(),
            SWEEP_INTERVAL,
            tasks.shutdown_token(),
        );
        tasks.spawn("expiry_sweeper", TaskKind::Periodic, sweeper);

        tasks.log_summary();
        tasks
    }
}
