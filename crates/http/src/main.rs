use minions_http::HttpConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HttpConfig::from_env()?;
    minions_observability::init_with(config.log_format);

    if config.template_reload {
        tracing::warn!("template reload enabled; templates are re-read on every render");
    }

    let app = minions_http::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        templates = %config.template_dir.display(),
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
