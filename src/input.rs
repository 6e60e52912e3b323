use std::fs;
use std::path::{Path, PathBuf};

use crate::connection::{Credentials, Encryption, Server};
use crate::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "email_config.conf";

const TEMPLATE: &str = "\
# SMTP server settings
# Edit the values below before sending.

# SMTP server host name
SMTP_SERVER=smtp.example.com

# SMTP server port
SMTP_PORT=465

# Encryption: none, ssl or tls
#   none: plain connection
#   ssl:  implicit TLS (SMTPS, usually port 465)
#   tls:  STARTTLS upgrade (usually port 587)
# Leave empty to pick one from the port.
SMTP_ENCRYPTION=ssl

# SMTP login
SMTP_USER=user@example.com

# SMTP password (write \\# for a literal hash)
SMTP_PASS=password

# Sender address; most servers require it to match SMTP_USER
SENDER=\"user@example.com\"

# Optional display name, shown as: Sender Name <address>
SENDER_NAME=\"Sender Name\"

# Message defaults, each can be overridden on the command line.
# Address lists and attachments are comma separated.
DEFAULT_TO_EMAILS=\"\"
DEFAULT_CC_EMAILS=\"\"
DEFAULT_BCC_EMAILS=\"\"
DEFAULT_SUBJECT=\"Test message\"
DEFAULT_BODY=\"This is a test message.\"
DEFAULT_ATTACHMENTS=\"\"

# Optional path of the curl-compatible client used for delivery
# SMTP_CLIENT=curl
";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub smtp_server: String,
    pub smtp_port: String,
    pub smtp_encryption: Encryption,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_client: Option<String>,
    pub sender: String,
    pub sender_name: Option<String>,
    pub default_to: String,
    pub default_cc: String,
    pub default_bcc: String,
    pub default_subject: String,
    pub default_body: String,
    pub default_attachments: String,
}

/// Result of looking for the configuration file.
#[derive(Debug)]
pub enum Loaded {
    Config(Config),
    /// No file was found; a template was written at this path.
    Created(PathBuf),
}

pub fn load(path: &Path) -> Result<Loaded> {
    if !path.exists() {
        write_template(path)?;
        return Ok(Loaded::Created(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|e| Error::ConfigRead(path.to_path_buf(), e))?;
    Config::parse(&String::from_utf8_lossy(&bytes)).map(Loaded::Config)
}

pub fn write_template(path: &Path) -> Result<()> {
    fs::write(path, TEMPLATE).map_err(|e| Error::ConfigCreate(path.to_path_buf(), e))
}

/// Cuts the line at the first `#` not preceded by a backslash and unescapes `\#`.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn unquote(value: &str) -> &str {
    let value = value.trim();
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

impl Config {
    pub fn parse(text: &str) -> Result<Config> {
        let mut config = Config::default();
        for line in text.lines() {
            let line = strip_comment(line);
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value).to_string();
            match key.trim() {
                "SMTP_SERVER" => config.smtp_server = value,
                "SMTP_PORT" => config.smtp_port = value,
                "SMTP_ENCRYPTION" => config.smtp_encryption = value.parse()?,
                "SMTP_USER" => config.smtp_user = value,
                "SMTP_PASS" => config.smtp_pass = value,
                "SMTP_CLIENT" => config.smtp_client = non_empty(value),
                "SENDER" => config.sender = value,
                "SENDER_NAME" => config.sender_name = non_empty(value),
                "DEFAULT_TO_EMAILS" => config.default_to = value,
                "DEFAULT_CC_EMAILS" => config.default_cc = value,
                "DEFAULT_BCC_EMAILS" => config.default_bcc = value,
                "DEFAULT_SUBJECT" => config.default_subject = value,
                "DEFAULT_BODY" => config.default_body = value,
                "DEFAULT_ATTACHMENTS" => config.default_attachments = value,
                other => log::debug!("ignoring unknown config key {:?}", other),
            }
        }
        Ok(config)
    }

    /// Fails with the names of every required key left empty.
    pub fn check_required(&self) -> Result<()> {
        let missing: Vec<&'static str> = [
            ("SMTP_SERVER", &self.smtp_server),
            ("SMTP_PORT", &self.smtp_port),
            ("SMTP_USER", &self.smtp_user),
            ("SMTP_PASS", &self.smtp_pass),
            ("SENDER", &self.sender),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key)
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingConfig(missing.join(", ")))
        }
    }

    pub fn port(&self) -> Result<u16> {
        match self.smtp_port.trim().parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(Error::Port(self.smtp_port.clone())),
        }
    }

    pub fn server(&self) -> Result<Server> {
        let port = self.port()?;
        Ok(Server::new(
            self.smtp_server.clone(),
            port,
            self.smtp_encryption.resolve(port),
        ))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.smtp_user.clone(), self.smtp_pass.clone())
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Security;

    #[test]
    fn parse_values_and_comments() {
        let config = Config::parse(
            "# leading comment\n\
             SMTP_SERVER = smtp.example.com  # trailing\n\
             SMTP_PORT=587\n\
             SMTP_PASS=\"pa\\#ss\"\n\
             SENDER='me@example.com'\n\
             DEFAULT_SUBJECT=\"hello = world\"\n\
             UNKNOWN=whatever\n\
             not a pair\n",
        )
        .unwrap();
        assert_eq!(config.smtp_server, "smtp.example.com");
        assert_eq!(config.smtp_port, "587");
        assert_eq!(config.smtp_pass, "pa#ss");
        assert_eq!(config.sender, "me@example.com");
        assert_eq!(config.default_subject, "hello = world");
        assert_eq!(config.smtp_encryption, Encryption::Auto);
    }

    #[test]
    fn last_write_wins() {
        let config = Config::parse("SMTP_USER=first\nSMTP_USER=second\n").unwrap();
        assert_eq!(config.smtp_user, "second");
    }

    #[test]
    fn only_matching_quotes_are_removed() {
        assert_eq!(unquote("  \"quoted\"  "), "quoted");
        assert_eq!(unquote("'single'"), "single");
        assert_eq!(unquote("\"mixed'"), "\"mixed'");
        assert_eq!(unquote("\"\"\"x\"\"\""), "\"\"x\"\"");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn empty_sender_name_is_unset() {
        let config = Config::parse("SENDER_NAME=\"\"\n").unwrap();
        assert_eq!(config.sender_name, None);
    }

    #[test]
    fn invalid_encryption_is_rejected() {
        assert!(matches!(
            Config::parse("SMTP_ENCRYPTION=maybe\n"),
            Err(Error::Encryption(_))
        ));
    }

    #[test]
    fn required_fields_are_reported() {
        let config = Config::parse("SMTP_SERVER=smtp.example.com\nSMTP_PORT=25\n").unwrap();
        match config.check_required() {
            Err(Error::MissingConfig(keys)) => assert_eq!(keys, "SMTP_USER, SMTP_PASS, SENDER"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn server_resolves_encryption_from_port() {
        let config = Config::parse("SMTP_SERVER=h\nSMTP_PORT=465\n").unwrap();
        assert_eq!(config.server().unwrap().security, Security::Ssl);
        let config = Config::parse("SMTP_SERVER=h\nSMTP_PORT=587\n").unwrap();
        assert_eq!(config.server().unwrap().security, Security::Tls);
        let config = Config::parse("SMTP_SERVER=h\nSMTP_PORT=2525\n").unwrap();
        assert_eq!(config.server().unwrap().security, Security::None);
        let config = Config::parse("SMTP_SERVER=h\nSMTP_PORT=465\nSMTP_ENCRYPTION=none\n").unwrap();
        assert_eq!(config.server().unwrap().security, Security::None);
    }

    #[test]
    fn bad_port_is_rejected() {
        let config = Config::parse("SMTP_PORT=smtp\n").unwrap();
        assert!(matches!(config.server(), Err(Error::Port(_))));
    }

    #[test]
    fn template_is_written_and_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        match load(&path).unwrap() {
            Loaded::Created(created) => assert_eq!(created, path),
            other => panic!("unexpected {:?}", other),
        }
        let config = match load(&path).unwrap() {
            Loaded::Config(config) => config,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(config.smtp_server, "smtp.example.com");
        assert_eq!(config.smtp_encryption, Encryption::Ssl);
        assert_eq!(config.sender_name.as_deref(), Some("Sender Name"));
        assert_eq!(config.default_to, "");
        assert!(config.check_required().is_ok());
    }
}
