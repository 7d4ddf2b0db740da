use std::sync::Arc;

use schelper_api::app::{self, AppServices};
use schelper_api::config::Settings;
use schelper_api::lifecycle::{AppLifespan, Lifecycle};
use schelper_api::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logs = schelper_observability::init();

    let settings = Settings::from_env()?;
    if settings.uses_default_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let services = Arc::new(AppServices::from_settings(&settings)?);
    let lifespan = AppLifespan::new(services.db.clone(), logs);
    let router = app::build_app(services);
    tracing::info!(title = app::APP_TITLE, "application built");

    Lifecycle::new(lifespan)
        .run(server::serve(router, server::bind_addr()))
        .await?;
    Ok(())
}
