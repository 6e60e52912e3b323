use crate::{Event, Logger, Mail};
use std::io::Write;
use std::path::{Path, PathBuf};

use std::fs;

pub const LOG_FILE_NAME: &str = "send_email.log";

/// Prints progress to the console and appends one line per attempt to the activity log.
pub struct FileLogger {
    pub(crate) path: Option<PathBuf>,
}

impl FileLogger {
    pub fn file(path: PathBuf) -> FileLogger {
        FileLogger { path: Some(path) }
    }
    pub fn none() -> FileLogger {
        FileLogger { path: None }
    }
    pub fn new(path: Option<PathBuf>) -> FileLogger {
        if let Some(logfile) = path {
            FileLogger::file(logfile)
        } else {
            FileLogger::none()
        }
    }
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

pub fn entry_line(timestamp: &str, sender: &str, mail: &Mail, success: bool) -> String {
    let names = mail.attachment_names();
    format!(
        "[{}] Sender: {}, To: [{}], Cc: [{}], Bcc: [{}], Subject: \"{}\", Attachments: [{}], Status: {}",
        timestamp,
        sender,
        mail.to.join(", "),
        mail.cc.join(", "),
        mail.bcc.join(", "),
        mail.subject,
        if names.is_empty() {
            "None".to_string()
        } else {
            names.join(", ")
        },
        if success { "Success" } else { "Failed" }
    )
}

impl FileLogger {
    fn append(path: &Path, line: &str) -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)?;
        writeln!(file, "{}", line)?;
        file.flush()
    }

    fn event_encryption_selected(&self, port: u16, security: String) {
        log::info!(
            "SMTP_ENCRYPTION not set, selected {} for port {}",
            security,
            port
        );
    }
    fn event_sending(&self, url: String, security: String) {
        println!("sending mail...");
        println!("connecting to {} using {} encryption.", url, security);
    }
    fn event_mail_sent(&self, subject: String, to: String) {
        println!("--> sent [{}] to <{}>.", subject, to);
    }
    fn event_mail_failed(&self, subject: String, to: String, reason: String) {
        eprintln!("--> sending [{}] to <{}> failed:\n{}", subject, to, reason);
        eprintln!("check the SMTP settings and the network connection.");
    }
}

impl Logger for FileLogger {
    fn record(&mut self, sender: &str, mail: &Mail, success: bool) {
        let path = if let Some(p) = self.path.as_ref() {
            p
        } else {
            return;
        };
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let line = entry_line(&timestamp, sender, mail, success);
        if let Err(e) = FileLogger::append(path, &line) {
            log::debug!("could not write activity log {}: {}", path.display(), e);
        }
    }

    fn event(&self, event: Event) {
        match event {
            Event::EncryptionSelected { port, security } => {
                self.event_encryption_selected(port, security.to_string())
            }
            Event::Sending { url, security } => self.event_sending(url, security.to_string()),
            Event::MailSent { subject, to } => self.event_mail_sent(subject, to),
            Event::FailedToSendMail { subject, to, reason } => {
                self.event_mail_failed(subject, to, reason)
            }
        }
    }
}
