mod cli;
mod command;
mod config;
mod discord;
mod model;
mod riot;
mod tally;

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = cli::parse();
    if args.help {
        cli::print_help();
        return Ok(());
    }

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let cfg = config::Config::load(args.config.as_deref());
    cfg.validate()?;
    let secrets = config::Secrets::from_env()?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let riot = riot::RiotClient::new(
        http.clone(),
        cfg.riot_host.clone(),
        secrets.riot_api_key.clone(),
    );
    let rest = discord::Rest::new(http, secrets.discord_token.clone());

    info!(
        "starting: host={} queue={} prefix={}",
        cfg.riot_host, cfg.queue_id, cfg.command_prefix
    );

    let mut backoff = Duration::from_secs(1);
    loop {
        let mut gateway = tokio::select! {
            g = discord::Gateway::connect(&secrets.discord_token, discord::MESSAGE_INTENTS) => {
                match g {
                    Ok(g) => g,
                    Err(e) => {
                        warn!("gateway connect failed: {:#}", e);
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(Duration::from_secs(30));
                        continue;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };
        backoff = Duration::from_secs(1);

        loop {
            tokio::select! {
                msg = gateway.next_message() => match msg {
                    Ok(Some(msg)) => {
                        if msg.author.bot || !command::is_trigger(&msg.content, &cfg.command_prefix) {
                            continue;
                        }
                        debug!("{} invoked by {}", cfg.command_prefix, msg.author.id);
                        // one task per invocation; a slow Riot call must not
                        // stall heartbeats or other commands
                        let cfg = cfg.clone();
                        let riot = riot.clone();
                        let rest = rest.clone();
                        tokio::spawn(async move {
                            let reply = command::handle(&cfg, &riot, &msg.content).await;
                            if let Err(e) = rest.create_message(&msg.channel_id, &reply).await {
                                warn!("reply failed: {:#}", e);
                            }
                        });
                    }
                    Ok(None) => {
                        warn!("gateway closed, reconnecting");
                        break;
                    }
                    Err(e) => {
                        warn!("gateway error: {:#}, reconnecting", e);
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down");
                    if let Err(e) = gateway.close().await {
                        warn!("gateway close failed: {:#}", e);
                    }
                    return Ok(());
                }
            }
        }
    }
}
