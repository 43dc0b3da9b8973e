//! CLI for topicq
//!
//! Subcommands:
//! - `server`: run the broker
//! - `publish`: send messages to a topic (useful for smoke tests)
//! - `consume`: print messages from a topic

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use topicq::broker::TopicRegistry;
use topicq::client::{Producer, Subscriber};
use topicq::config::{load_config, load_config_from};
use topicq::transport::start_tcp_server;
use topicq::utils::error::Result;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "topicq")]
enum Command {
    /// Start the broker
    Server {
        /// Config file to read instead of config/default.*
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Publish each MESSAGE to a topic
    Publish {
        /// Broker address
        #[arg(long, default_value = "127.0.0.1:10000")]
        addr: String,
        #[arg(long)]
        topic: String,
        #[arg(required = true)]
        messages: Vec<String>,
    },
    /// Print messages received from a topic
    Consume {
        /// Broker address
        #[arg(long, default_value = "127.0.0.1:10000")]
        addr: String,
        #[arg(long)]
        topic: String,
        /// Stop after this many messages
        #[arg(long)]
        count: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let result = match cmd {
        Command::Server { config } => run_server(config).await,
        Command::Publish {
            addr,
            topic,
            messages,
        } => {
            topicq::utils::logging::init("info");
            run_publish(&addr, &topic, &messages).await
        }
        Command::Consume { addr, topic, count } => {
            topicq::utils::logging::init("warn");
            run_consume(&addr, &topic, count).await
        }
    };

    if let Err(e) = result {
        // config errors happen before a subscriber is installed
        if tracing::dispatcher::has_been_set() {
            error!("{e}");
        } else {
            eprintln!("topicq: {e}");
        }
        std::process::exit(1);
    }
}

async fn run_server(config: Option<PathBuf>) -> Result<()> {
    let settings = match config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    topicq::utils::logging::init(&settings.logging.level);

    let registry = Arc::new(TopicRegistry::new());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received. Exiting gracefully.");
    };

    start_tcp_server(settings.server.bind_addr(), registry, settings, shutdown).await
}

async fn run_publish(addr: &str, topic: &str, messages: &[String]) -> Result<()> {
    let mut producer = Producer::connect(addr, topic).await?;
    for message in messages {
        if producer.publish(message).await? {
            info!(topic, "published {message:?}");
        } else {
            warn!(topic, "broker did not acknowledge {message:?}");
        }
    }
    producer.close().await;
    Ok(())
}

async fn run_consume(addr: &str, topic: &str, count: Option<usize>) -> Result<()> {
    let mut subscriber = Subscriber::connect(addr, topic).await?;
    let mut seen = 0usize;
    subscriber
        .consume_until(|message| {
            println!("{}", String::from_utf8_lossy(&message));
            seen += 1;
            match count {
                Some(limit) if seen >= limit => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        })
        .await?;
    subscriber.close().await;
    Ok(())
}
