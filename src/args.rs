use std::path::PathBuf;

use clap::Parser;
use send_email::Overrides;

/// Sends one email through an SMTP server, using defaults from
/// `email_config.conf` next to the executable.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub(crate) struct Args {
    /// Recipients, comma separated
    #[clap(short = 't', value_name = "ADDRESSES")]
    pub to: Option<String>,
    /// Carbon copy recipients, comma separated
    #[clap(short = 'c', value_name = "ADDRESSES")]
    pub cc: Option<String>,
    /// Blind carbon copy recipients, comma separated
    #[clap(short = 'b', value_name = "ADDRESSES")]
    pub bcc: Option<String>,
    /// Subject line
    #[clap(short = 's', value_name = "SUBJECT")]
    pub subject: Option<String>,
    /// Message body
    #[clap(short = 'm', value_name = "TEXT")]
    pub body: Option<String>,
    /// Files to attach, comma separated
    #[clap(short = 'f', value_name = "FILES")]
    pub attachments: Option<String>,
    /// Path to the configuration file
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Enable debug logging and verbose transport output
    #[clap(long)]
    pub debug: bool,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            attachments: self.attachments.clone(),
        }
    }
}
