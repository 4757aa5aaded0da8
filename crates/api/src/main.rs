use anyhow::Context;

use gatehouse_api::app::{self, AppServices};
use gatehouse_api::config::ServerConfig;
use gatehouse_auth::{RbacPolicy, RbacRegistry, TokenManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gatehouse_observability::init();

    let config = ServerConfig::from_env().context("failed to load configuration")?;

    let tokens = TokenManager::new(config.tokens).context("invalid token configuration")?;

    let rbac = match &config.policy_path {
        Some(path) => {
            let policy = RbacPolicy::from_json_file(path).context("failed to read role policy")?;
            RbacRegistry::from_policy(&policy).context("failed to apply role policy")?
        }
        None => {
            tracing::warn!("GATEHOUSE_POLICY_PATH not set; starting with no roles (all requests denied)");
            RbacRegistry::new()
        }
    };

    let app = app::build_app(AppServices::new(tokens, rbac));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
