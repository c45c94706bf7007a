use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sitecraft_backend::api::{self, AppState};
use sitecraft_backend::config::{Config, LogFormat};
use sitecraft_backend::services::mail_service::{
    MailDispatcher, OutgoingMessage, SmtpMailTransport, TransportOverrides,
};
use sitecraft_backend::services::settings_service::SettingsService;

#[derive(Parser)]
#[command(name = "sitecraft", version, about = "Sitecraft site backend")]
struct Cli {
    /// Overrides BIND_ADDRESS
    #[arg(long, env = "BIND_ADDRESS")]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run migrations and serve HTTP (default)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Send a test message using the stored mail settings
    SendTestEmail {
        #[arg(long)]
        to: String,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sitecraft_backend=info,tower_http=info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }

    init_tracing(config.log_format);

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            sqlx::migrate!("./migrations").run(&db).await?;
            tracing::info!("Migrations applied");
        }
        Command::SendTestEmail { to } => {
            let settings = SettingsService::new(db);
            let dispatcher = MailDispatcher::connect(
                &settings,
                &TransportOverrides::default(),
                Arc::new(SmtpMailTransport::new(config.smtp_timeout)),
            )
            .await?;
            dispatcher
                .send(
                    OutgoingMessage::new("Test email", vec![to.clone()])
                        .with_body("This is a test message from your site's mail settings."),
                )
                .await?;
            tracing::info!(to = %to, host = %dispatcher.config().host, "Test email sent");
        }
        Command::Serve => {
            sqlx::migrate!("./migrations").run(&db).await?;

            let metrics = match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Prometheus recorder not installed");
                    None
                }
            };

            let addr: SocketAddr = config.bind_address.parse()?;
            let state = Arc::new(AppState::new(db, config, metrics)?);
            let app = api::router(state);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "Sitecraft listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
