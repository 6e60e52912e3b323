use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::Error;

/// Encryption mode as written in the configuration file.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum Encryption {
    #[default]
    Auto,
    None,
    Ssl,
    Tls,
}

/// Encryption mode actually used on the wire, once `Auto` has been resolved.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Security {
    None,
    Ssl,
    Tls,
}

impl FromStr for Encryption {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Encryption::Auto),
            "none" => Ok(Encryption::None),
            "ssl" | "smtps" => Ok(Encryption::Ssl),
            "tls" | "starttls" => Ok(Encryption::Tls),
            _ => Err(Error::Encryption(value.to_string())),
        }
    }
}

impl Encryption {
    /// Resolves `Auto` from the port: 465 is implicit TLS, 587 is STARTTLS.
    pub fn resolve(self, port: u16) -> Security {
        match self {
            Encryption::None => Security::None,
            Encryption::Ssl => Security::Ssl,
            Encryption::Tls => Security::Tls,
            Encryption::Auto => match port {
                465 => Security::Ssl,
                587 => Security::Tls,
                _ => Security::None,
            },
        }
    }
}

impl Security {
    pub fn scheme(&self) -> &'static str {
        match self {
            Security::Ssl => "smtps",
            Security::Tls | Security::None => "smtp",
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Security::None => "none",
            Security::Ssl => "ssl",
            Security::Tls => "tls",
        })
    }
}

/// One option handed to the transport executable.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Directive {
    Url(String),
    SslRequired,
    MailFrom(String),
    MailRcpt(String),
    User(String, String),
    UploadFile(PathBuf),
    Verbose,
    Quiet,
}

impl Directive {
    pub fn args(&self) -> Vec<OsString> {
        match self {
            Directive::Url(url) => vec!["--url".into(), url.into()],
            Directive::SslRequired => vec!["--ssl-reqd".into()],
            Directive::MailFrom(from) => vec!["--mail-from".into(), from.into()],
            Directive::MailRcpt(to) => vec!["--mail-rcpt".into(), to.into()],
            Directive::User(un, pw) => vec!["--user".into(), format!("{}:{}", un, pw).into()],
            Directive::UploadFile(path) => vec!["--upload-file".into(), path.into()],
            Directive::Verbose => vec!["--verbose".into()],
            Directive::Quiet => vec!["--silent".into(), "--show-error".into()],
        }
    }
}

pub fn url(security: Security, address: &str, port: u16) -> String {
    format!("{}://{}:{}", security.scheme(), address, port)
}
