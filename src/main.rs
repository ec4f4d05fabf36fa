use anyhow::Context;
use devbook::{
    auth::jwt::{TokenIssuer, TokenVerifier},
    build_app,
    cli::{output::Output, Cli, Commands},
    db::SqliteClient,
    utils::toml_config::{Config, LogFormat, ServerConfig},
    AppState,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<()> {
    // A missing .env is fine; the variables may come from the environment
    dotenvy::dotenv().ok();

    match cli.command {
        Some(Commands::Config { validate }) => show_config(&cli.config, validate, output),
        Some(Commands::HashPassword { plaintext }) => {
            let config = load_unvalidated(&cli.config)?;
            let hash = config.password_hasher()?.hash(&plaintext)?;
            println!("{}", hash);
            Ok(())
        }
        None => serve(&cli.config, cli.verbose, output).await,
    }
}

/// Reads the config file if present, without requiring the signing secret.
fn load_unvalidated(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Config::parse(&content)?)
}

fn show_config(path: &Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    let config = load_unvalidated(path)?;

    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    output.kv("listen", &config.bind_address());
    output.kv("log_level", &config.server.log_level);
    output.kv("secret env", &config.auth.jwt_secret_env);
    output.kv("token ttl (s)", &config.auth.token_ttl_secs.to_string());
    output.kv("database", &config.database.url);

    if validate {
        if !path.exists() {
            anyhow::bail!("Configuration file not found: {}", path.display());
        }
        config.validate()?;
        output.success("Configuration is valid");
    } else {
        output.hint("Run with --validate to also check the signing secret");
    }
    Ok(())
}

fn init_tracing(server: &ServerConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match server.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn serve(path: &Path, verbose: bool, output: &Output) -> anyhow::Result<()> {
    // Fails before anything binds when the secret is missing or empty
    let config =
        Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?;

    init_tracing(&config.server, verbose);
    output.banner();

    let secret = config.signing_secret()?;
    let hasher = config.password_hasher()?;
    let store = Arc::new(SqliteClient::new_local(&config.database.url).await?);

    let state = AppState::new(
        store,
        TokenIssuer::new(&secret, config.token_ttl()?),
        hasher,
    );
    let app = build_app(state, Arc::new(TokenVerifier::new(&secret)));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    output.info(&format!("Listening on http://{}", address));
    tracing::info!(%address, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
