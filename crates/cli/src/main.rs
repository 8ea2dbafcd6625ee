mod host;

use clap::{Parser, Subcommand};
use lib::chat::{ChatCategory, ChatMessage};
use lib::config::{ConfigSource, SharedConfig};
use lib::events::{ChatBridge, EventBus};
use lib::notify::{ConsoleNotifier, Notifier};
use lib::profile::{LodestoneResolver, ProfileResolver};
use lib::relay::{RelayDeps, WebhookRelay};
use lib::webhook::DiscordWebhook;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long `run` keeps draining the queue after stdin closes.
const DRAIN_ON_EOF: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "chatbridge")]
#[command(about = "Relay game chat to a Discord webhook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Relay events read from stdin (one JSON object per line) until EOF or Ctrl+C. SIGHUP reloads the config file.
    Run {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Home world of the local player, used for senders without a world.
        #[arg(long, value_name = "WORLD")]
        home_world: Option<String>,
    },

    /// Send a single message through the relay and wait for it to be delivered.
    Send {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        #[arg(long)]
        sender: String,

        /// Sender's home world.
        #[arg(long)]
        group: String,

        #[arg(long, short)]
        message: String,

        /// Chat category id (10 = Say).
        #[arg(long, default_value_t = 10)]
        category: u16,

        /// Give up waiting for delivery after this many seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Look up a character's avatar URL.
    Avatar {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        name: String,

        world: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("chatbridge {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run { config, home_world }) => {
            if let Err(e) = run_relay(config, home_world).await {
                log::error!("run failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            sender,
            group,
            message,
            category,
            timeout,
        }) => {
            let msg = ChatMessage::new(sender, group, message, ChatCategory(category));
            if let Err(e) = run_send(config, msg, Duration::from_secs(timeout)).await {
                log::error!("send failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Avatar { config, name, world }) => {
            if let Err(e) = run_avatar(config, &name, &world).await {
                log::error!("avatar lookup failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", path.display());
    Ok(())
}

/// Console notifier that also counts failures, so `send` can report them in its exit status.
#[derive(Default)]
struct CountingNotifier {
    failures: AtomicUsize,
}

impl Notifier for CountingNotifier {
    fn notify_error(&self, text: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        ConsoleNotifier.notify_error(text);
    }
}

fn relay_deps(shared: &SharedConfig, notifier: Arc<dyn Notifier>) -> RelayDeps {
    let config: Arc<dyn ConfigSource> = Arc::new(shared.clone());
    RelayDeps {
        config: config.clone(),
        resolver: Arc::new(LodestoneResolver::from_config(config)),
        publisher: Arc::new(DiscordWebhook::new()),
        notifier,
    }
}

async fn run_relay(config_path: Option<PathBuf>, home_world: Option<String>) -> anyhow::Result<()> {
    let (config, path) = lib::config::load_config(config_path)?;
    if config.destination().is_none() {
        log::warn!("no webhook URL configured; messages will queue until one is set");
    }
    let shared = SharedConfig::new(config);
    let relay = WebhookRelay::start(relay_deps(&shared, Arc::new(ConsoleNotifier)));

    let bus = Arc::new(EventBus::new());
    let mut bridge = ChatBridge::new(Arc::new(shared.clone()), relay.sender(), bus.clone());
    bridge.set_home_group(home_world);
    bridge.attach();

    #[cfg(unix)]
    spawn_reload_on_hangup(shared.clone(), path.clone());

    let (eof_tx, eof_rx) = tokio::sync::oneshot::channel::<()>();
    host::spawn_stdin_reader(bus, move || {
        let _ = eof_tx.send(());
    });
    log::info!("relaying events from stdin (config {})", path.display());

    let drain = tokio::select! {
        _ = shutdown_signal() => {
            log::info!("shutdown signal received");
            false
        }
        _ = eof_rx => true,
    };

    bridge.detach();
    if drain && !relay.wait_idle(DRAIN_ON_EOF).await {
        log::warn!("{} message(s) still queued at exit", relay.pending());
    }
    relay.shutdown().await;
    Ok(())
}

async fn run_send(config_path: Option<PathBuf>, msg: ChatMessage, timeout: Duration) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    if config.destination().is_none() {
        anyhow::bail!("no webhook URL configured (set webhookUrl or CHATBRIDGE_WEBHOOK_URL)");
    }
    if !config.enabled {
        anyhow::bail!("bridge is disabled in config");
    }
    let shared = SharedConfig::new(config);
    let notifier = Arc::new(CountingNotifier::default());
    let relay = WebhookRelay::start(relay_deps(&shared, notifier.clone()));
    relay.enqueue(msg);
    let idle = relay.wait_idle(timeout).await;
    relay.shutdown().await;
    if !idle {
        anyhow::bail!("message not delivered within {:?}", timeout);
    }
    if notifier.failures.load(Ordering::SeqCst) > 0 {
        anyhow::bail!("delivery failed");
    }
    println!("sent");
    Ok(())
}

async fn run_avatar(config_path: Option<PathBuf>, name: &str, world: &str) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let resolver = LodestoneResolver::new(config.lodestone.base_url);
    let url = resolver.resolve(name, world).await;
    if url.is_empty() {
        anyhow::bail!("no avatar found for {} @ {}", name, world);
    }
    println!("{}", url);
    Ok(())
}

/// Reload the config file into the shared handle on every SIGHUP.
#[cfg(unix)]
fn spawn_reload_on_hangup(shared: SharedConfig, path: PathBuf) {
    use tokio::signal::unix::{signal, SignalKind};
    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("SIGHUP handler not installed: {}", e);
            return;
        }
    };
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match lib::config::load_config(Some(path.clone())) {
                Ok((config, _)) => {
                    shared.replace(config);
                    log::info!("config reloaded from {}", path.display());
                }
                Err(e) => log::error!("config reload failed: {:#}", e),
            }
        }
    });
}

/// Completes on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
