//! Command-line interface.
//!
//! [`Cli`] has three subcommands ([`Command`]): `create`, `promote` and
//! `checkpoints`, plus the global flags `--max-retries` and `--verbose`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::EventPlatform;
use crate::social::SocialPlatform;

/// Create events on Luma, Meetup and Partiful and promote them on social networks.
#[derive(Debug, Parser)]
#[command(name = "eventpilot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Client-level retries for transient gateway failures.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Debug-level logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Event platform accepted on the command line, mapped to [`EventPlatform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Luma,
    Meetup,
    Partiful,
}

impl From<PlatformArg> for EventPlatform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Luma => EventPlatform::Luma,
            PlatformArg::Meetup => EventPlatform::Meetup,
            PlatformArg::Partiful => EventPlatform::Partiful,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SocialArg {
    Twitter,
    Linkedin,
    Instagram,
    Facebook,
    Discord,
}

impl From<SocialArg> for SocialPlatform {
    fn from(arg: SocialArg) -> Self {
        match arg {
            SocialArg::Twitter => SocialPlatform::Twitter,
            SocialArg::Linkedin => SocialPlatform::Linkedin,
            SocialArg::Instagram => SocialPlatform::Instagram,
            SocialArg::Facebook => SocialPlatform::Facebook,
            SocialArg::Discord => SocialPlatform::Discord,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the event on each platform, one after another.
    Create {
        /// JSON file with the event fields.
        event: PathBuf,

        /// Platforms to create on (repeatable). Defaults to all.
        #[arg(long = "platform", value_enum)]
        platforms: Vec<PlatformArg>,

        /// Platforms to leave out (repeatable).
        #[arg(long, value_enum)]
        skip: Vec<PlatformArg>,

        /// Meetup group URL; Meetup is skipped without one.
        #[arg(long)]
        meetup_group_url: Option<String>,

        /// Cover image to upload where supported.
        #[arg(long)]
        image_url: Option<String>,

        /// JSON object of per-platform descriptions.
        #[arg(long)]
        descriptions: Option<PathBuf>,

        /// JSON file with ticket, recurrence, co-host and integration options.
        #[arg(long)]
        features: Option<PathBuf>,

        /// Checkpoint namespace.
        #[arg(long)]
        tenant: Option<String>,

        /// Save progress and resume from an earlier checkpoint.
        #[arg(long, default_value_t = false)]
        checkpoint: bool,
    },

    /// Post the event to social networks.
    Promote {
        /// JSON file with the event fields.
        event: PathBuf,

        /// RSVP link to include in posts.
        #[arg(long)]
        event_url: String,

        #[arg(long)]
        image_url: Option<String>,

        /// JSON object of per-network post text.
        #[arg(long)]
        copies: Option<PathBuf>,

        /// Networks to leave out (repeatable).
        #[arg(long, value_enum)]
        skip: Vec<SocialArg>,
    },

    /// List saved checkpoints.
    Checkpoints {
        #[arg(long)]
        tenant: Option<String>,
    },
}
