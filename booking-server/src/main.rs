use anyhow::Context;
use booking_server::{Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    let config = setup_environment().context("failed to set up environment")?;

    // 打印横幅
    print_banner();

    tracing::info!(
        environment = %config.environment,
        business_tz = %config.business_tz,
        "Booking server starting..."
    );

    // 2. 初始化服务器状态
    let state = ServerState::initialize(&config).context("failed to initialize server state")?;

    // 3. 启动 HTTP 服务器 (Server::run 会自动启动后台任务)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
