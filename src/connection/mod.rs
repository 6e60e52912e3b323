mod protocol;

pub use protocol::{Directive, Encryption, Security};

use super::{Error, Mail, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

#[cfg(windows)]
pub const DEFAULT_CLIENT: &str = "curl.exe";
#[cfg(not(windows))]
pub const DEFAULT_CLIENT: &str = "curl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub address: String,
    pub port: u16,
    pub security: Security,
}

impl Server {
    pub fn new(address: String, port: u16, security: Security) -> Server {
        Server {
            address,
            port,
            security,
        }
    }
    pub fn url(&self) -> String {
        protocol::url(self.security, &self.address, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: String, password: String) -> Credentials {
        Credentials { username, password }
    }
}

/// Everything the transport needs besides the message itself.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub server: Server,
    pub credentials: Credentials,
    pub from: String,
    pub recipients: Vec<String>,
}

impl Envelope {
    /// Recipients are To, Cc and Bcc flattened, one entry per address.
    pub fn new(server: Server, credentials: Credentials, mail: &Mail) -> Envelope {
        Envelope {
            server,
            credentials,
            from: mail.from.clone(),
            recipients: mail.recipients().map(str::to_string).collect(),
        }
    }
}

/// Hands a composed message to something that speaks SMTP.
pub trait Transport {
    fn deliver(&mut self, envelope: &Envelope, document: &Path) -> Result<()>;
}

/// Delivers through an external curl-compatible client.
pub struct CurlTransport {
    program: OsString,
    verbose: bool,
}

impl CurlTransport {
    pub fn new(program: Option<&str>, verbose: bool) -> CurlTransport {
        CurlTransport {
            program: program.unwrap_or(DEFAULT_CLIENT).into(),
            verbose,
        }
    }

    pub fn directives(&self, envelope: &Envelope, document: &Path) -> Vec<Directive> {
        let mut directives = vec![if self.verbose {
            Directive::Verbose
        } else {
            Directive::Quiet
        }];
        if envelope.server.security != Security::None {
            directives.push(Directive::SslRequired);
        }
        directives.push(Directive::Url(envelope.server.url()));
        directives.push(Directive::MailFrom(envelope.from.clone()));
        for rcpt in envelope.recipients.iter() {
            directives.push(Directive::MailRcpt(rcpt.clone()));
        }
        directives.push(Directive::User(
            envelope.credentials.username.clone(),
            envelope.credentials.password.clone(),
        ));
        directives.push(Directive::UploadFile(document.to_path_buf()));
        directives
    }

    pub fn command(&self, envelope: &Envelope, document: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        for d in self.directives(envelope, document) {
            cmd.args(d.args());
        }
        cmd
    }
}

impl Transport for CurlTransport {
    fn deliver(&mut self, envelope: &Envelope, document: &Path) -> Result<()> {
        log::debug!(
            "invoking {:?} for {} recipient(s)",
            self.program,
            envelope.recipients.len()
        );
        let status = self
            .command(envelope, document)
            .status()
            .map_err(|e| Error::Spawn(self.program.to_string_lossy().into_owned(), e))?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::Delivery(status.to_string()))
        }
    }
}
