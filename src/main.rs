use clap::Parser;
use tracing_subscriber::EnvFilter;

use agora::api::users::Credentials;
use agora::api::ApiClient;
use agora::config::{Cli, Command, Config};
use agora::notifications::{NotificationConfig, NotificationStream};
use agora::session::{Navigator, SessionManager, TokenStore};

/// Console rendition of the redirect capability: just log the target.
struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!("redirect: {}", path);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    let config = Config::load(&cli)?;

    let api = ApiClient::new(&config.api.base_url);
    let session = SessionManager::new(api, TokenStore::new(config.token_path().clone()));

    match cli.command {
        Some(Command::Whoami) => match session.check_logged_in().await? {
            Some(user) => println!("{} (id {})", user.username, user.id),
            None => println!("not logged in"),
        },
        Some(Command::Login { username, password }) => {
            let credentials = Credentials { username, password };
            match session.login(&credentials, &LogNavigator, None).await {
                Ok(user) => println!("logged in as {} (id {})", user.username, user.id),
                Err(agora::Error::EmailNotVerified) => {
                    println!("email is not verified; check your inbox for the activation link");
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Some(Command::Tail) | None => {
            let stream = NotificationStream::new(NotificationConfig {
                url: config.stream.url.clone(),
                ping_interval: std::time::Duration::from_secs(config.stream.ping_interval_secs),
                ..NotificationConfig::default()
            });
            let _listener = stream.add_listener(|event| {
                if let Ok(line) = serde_json::to_string(event) {
                    println!("{}", line);
                }
            });

            stream.connect();
            tracing::info!("tailing {} (ctrl-c to stop)", config.stream.url);
            tokio::signal::ctrl_c().await?;
            stream.disconnect();

            let status = stream.status();
            println!(
                "received {} messages, {} reconnect attempts",
                status.message_count, status.reconnect_attempts
            );
        }
    }

    Ok(())
}
