mod connection;
mod input;
mod logger;
mod mail;
mod message;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use connection::{
    Credentials, CurlTransport, Directive, Encryption, Envelope, Security, Server, Transport,
};
pub use input::{load, write_template, Config, Loaded, CONFIG_FILE_NAME};
pub use logger::{entry_line, FileLogger, LOG_FILE_NAME};
pub use mail::{split_list, Mail, Overrides};
pub use message::{
    base64_lines, boundary_for, compose, compose_in, compose_to_bytes, render,
    resolve_attachments, Attachment, ComposedDocument,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read config file {}: {1}", .0.display())]
    ConfigRead(PathBuf, #[source] io::Error),
    #[error("cannot create config template {}: {1}", .0.display())]
    ConfigCreate(PathBuf, #[source] io::Error),
    #[error("config file is missing required settings: {0}")]
    MissingConfig(String),
    #[error("invalid SMTP_PORT {0:?}")]
    Port(String),
    #[error("invalid SMTP_ENCRYPTION {0:?}, expected none, ssl or tls")]
    Encryption(String),
    #[error("no recipient given, use -t or DEFAULT_TO_EMAILS")]
    NoRecipient,
    #[error("{0} must not contain line breaks")]
    LineBreak(&'static str),
    #[error("cannot read attachment {}: {1}", .0.display())]
    File(PathBuf, #[source] io::Error),
    #[error("cannot write message file {}: {1}", .0.display())]
    Document(PathBuf, #[source] io::Error),
    #[error("cannot run mail client {0}: {1}")]
    Spawn(String, #[source] io::Error),
    #[error("mail client failed with {0}")]
    Delivery(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub enum Event {
    EncryptionSelected { port: u16, security: Security },
    Sending { url: String, security: Security },
    MailSent { subject: String, to: String },
    FailedToSendMail { subject: String, to: String, reason: String },
}

pub trait Logger {
    fn record(&mut self, sender: &str, mail: &Mail, success: bool);
    fn event(&self, event: Event);
}

/// Directory holding the running executable; config and activity log live there.
pub fn executable_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Merges, composes and delivers one message, then records the attempt.
///
/// Validation failures return before anything is composed or delivered. Once
/// the transport has been invoked the message file is removed and the attempt
/// logged whatever the outcome.
pub fn send<T, L>(
    config: &Config,
    overrides: &Overrides,
    transport: &mut T,
    logger: &mut L,
) -> Result<()>
where
    T: Transport,
    L: Logger,
{
    let mail = Mail::merge(config, overrides)?;
    let server = config.server()?;
    if config.smtp_encryption == Encryption::Auto {
        logger.event(Event::EncryptionSelected {
            port: server.port,
            security: server.security,
        });
    }

    let document = message::compose(&mail)?;
    logger.event(Event::Sending {
        url: server.url(),
        security: server.security,
    });
    let envelope = Envelope::new(server, config.credentials(), &mail);
    let result = transport.deliver(&envelope, document.path());
    if let Err(e) = document.discard() {
        log::warn!("{}", e);
    }

    logger.record(&mail.from, &mail, result.is_ok());
    let to = mail.to.join(", ");
    match result {
        Ok(()) => {
            logger.event(Event::MailSent {
                subject: mail.subject.clone(),
                to,
            });
            Ok(())
        }
        Err(error) => {
            logger.event(Event::FailedToSendMail {
                subject: mail.subject.clone(),
                to,
                reason: error.to_string(),
            });
            Err(error)
        }
    }
}
