use std::path::PathBuf;

use crate::input::Config;
use crate::{Error, Result};

/// The message to be sent, after config defaults and command-line values are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub from_name: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<PathBuf>,
}

/// Values given on the command line. `None` keeps the config default.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub attachments: Option<String>,
}

/// Splits a comma separated list, trimming whitespace and quotes and dropping empty entries.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|item| item.trim_matches(|c: char| c.is_whitespace() || c == '"'))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl Mail {
    pub fn merge(config: &Config, overrides: &Overrides) -> Result<Mail> {
        let pick = |value: &Option<String>, default: &String| {
            value.clone().unwrap_or_else(|| default.clone())
        };
        let mail = Mail {
            from: config.sender.clone(),
            from_name: config.sender_name.clone(),
            to: split_list(&pick(&overrides.to, &config.default_to)),
            cc: split_list(&pick(&overrides.cc, &config.default_cc)),
            bcc: split_list(&pick(&overrides.bcc, &config.default_bcc)),
            subject: pick(&overrides.subject, &config.default_subject),
            text: pick(&overrides.body, &config.default_body),
            attachments: split_list(&pick(&overrides.attachments, &config.default_attachments))
                .into_iter()
                .map(PathBuf::from)
                .collect(),
        };
        if mail.to.is_empty() {
            return Err(Error::NoRecipient);
        }
        mail.check_single_line()?;
        config.check_required()?;
        Ok(mail)
    }

    /// Header values and log fields have to stay on one line.
    fn check_single_line(&self) -> Result<()> {
        let breaks = |value: &str| value.contains(['\r', '\n']);
        if breaks(&self.subject) {
            return Err(Error::LineBreak("subject"));
        }
        if breaks(&self.from) || self.from_name.as_deref().map_or(false, breaks) {
            return Err(Error::LineBreak("sender"));
        }
        if self.recipients().any(breaks) {
            return Err(Error::LineBreak("address"));
        }
        if self.attachments.iter().any(|p| breaks(&p.to_string_lossy())) {
            return Err(Error::LineBreak("attachment path"));
        }
        Ok(())
    }

    /// To, Cc and Bcc in that order.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
            .map(String::as_str)
    }

    pub fn from_header(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from),
            None => self.from.clone(),
        }
    }

    pub fn attachment_names(&self) -> Vec<String> {
        self.attachments.iter().map(|p| file_name(p)).collect()
    }
}

pub(crate) fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
