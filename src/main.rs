use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use eventpilot::adapters::{EventPlatform, FeatureOptions};
use eventpilot::cli::{Cli, Command};
use eventpilot::config::Config;
use eventpilot::event::EventData;
use eventpilot::gateway::{GatewayClient, Retrying};
use eventpilot::sanitize::sanitize_url;
use eventpilot::social::{SocialPlatform, SocialPromoter};
use eventpilot::state_machine::CheckpointStore;
use eventpilot::ui::{self, RunProgress};
use eventpilot::workflow::{EventCreationWorkflow, WorkflowOptions};

fn init_tracing(config: &Config, verbose: bool) {
    let fallback = if verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn live_client(config: &Config) -> Result<Retrying<GatewayClient>> {
    config.validate()?;
    let client = GatewayClient::from_config(config).context("building gateway client")?;
    Ok(Retrying::new(client, config.retry_policy()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load().context("loading configuration")?;
    if let Some(max_retries) = cli.max_retries {
        config.max_retries = max_retries;
    }
    init_tracing(&config, cli.verbose);

    match cli.command {
        Command::Create {
            event,
            platforms,
            skip,
            meetup_group_url,
            image_url,
            descriptions,
            features,
            tenant,
            checkpoint,
        } => {
            let mut event = EventData::load(&event)?;
            if let Some(url) = meetup_group_url {
                event.meetup_group_url = sanitize_url(&url);
            }
            let mut options = WorkflowOptions {
                tenant,
                ..Default::default()
            };
            if let Some(path) = descriptions {
                options.descriptions = read_json::<HashMap<String, String>>(&path)?;
            }
            if let Some(path) = features {
                options.features = read_json::<FeatureOptions>(&path)?;
            }
            if let Some(url) = image_url {
                options.features.image_url = sanitize_url(&url);
            }
            let platforms: Vec<EventPlatform> = if platforms.is_empty() {
                EventPlatform::ALL.to_vec()
            } else {
                platforms.into_iter().map(Into::into).collect()
            };
            let skip: Vec<EventPlatform> = skip.into_iter().map(Into::into).collect();

            let client = live_client(&config)?;
            let store = CheckpointStore::new(config.checkpoint_dir());
            let progress = RunProgress::start(&format!("Creating \"{}\"", event.title));
            let mut workflow = EventCreationWorkflow::new(&client).with_observer(&progress);
            if checkpoint {
                workflow = workflow.with_checkpoints(&store);
            }
            let report = workflow.run(&event, &platforms, &skip, &options).await;
            progress.finish();
            ui::print_report(&report?);
        }
        Command::Promote {
            event,
            event_url,
            image_url,
            copies,
            skip,
        } => {
            let event = EventData::load(&event)?;
            let copies = match copies {
                Some(path) => read_json::<HashMap<String, String>>(&path)?,
                None => HashMap::new(),
            };
            let skip: Vec<SocialPlatform> = skip.into_iter().map(Into::into).collect();
            let image_url = image_url.map(|u| sanitize_url(&u)).unwrap_or_default();

            let client = live_client(&config)?;
            let results = SocialPromoter::new(&client, config.max_workers)
                .promote(&event, &copies, &image_url, &sanitize_url(&event_url), &skip)
                .await;
            ui::print_social(&results);
        }
        Command::Checkpoints { tenant } => {
            let store = CheckpointStore::new(config.checkpoint_dir());
            let checkpoints = store.list(tenant.as_deref())?;
            println!("Checkpoints in {}", store.dir().display());
            ui::print_checkpoints(&checkpoints);
        }
    }

    Ok(())
}
