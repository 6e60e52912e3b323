use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine};
use tempfile::NamedTempFile;

use crate::mail::{file_name, Mail};
use crate::{Error, Result};

const LINE_LENGTH: usize = 76;
const CRLF: &str = "\r\n";

/// An attachment that was found on disk and read.
pub struct Attachment {
    pub name: String,
    pub content: Vec<u8>,
}

/// Reads every attachment that exists, warning about and skipping the rest.
pub fn resolve_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>> {
    let mut attachments = vec![];
    for path in paths.iter() {
        if !path.is_file() {
            log::warn!("attachment {} does not exist, skipping", path.display());
            continue;
        }
        let content = fs::read(path).map_err(|e| Error::File(path.clone(), e))?;
        attachments.push(Attachment {
            name: file_name(path),
            content,
        });
    }
    Ok(attachments)
}

/// Standard base64 cut into lines of 76 characters.
pub fn base64_lines(data: &[u8]) -> Vec<String> {
    let encoded = general_purpose::STANDARD.encode(data);
    encoded
        .as_bytes()
        .chunks(LINE_LENGTH)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// A boundary that does not occur in `text`.
pub fn boundary_for(text: &str) -> String {
    loop {
        let boundary = format!(
            "===={}_{}====",
            chrono::Utc::now().timestamp(),
            uuid::Uuid::new_v4().simple()
        );
        if !text.contains(&boundary) {
            return boundary;
        }
    }
}

/// Wraps a parameter value in quotes, escaping `"` and `\`.
pub fn quoted_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn text_part(out: &mut String, text: &str) {
    out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    out.push_str("Content-Transfer-Encoding: 8bit\r\n");
    out.push_str(CRLF);
    out.push_str(text);
    out.push_str(CRLF);
}

/// Renders the full message. With no attachments the body is a single text part.
pub fn render(mail: &Mail, attachments: &[Attachment], boundary: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("From: {}\r\n", mail.from_header()));
    out.push_str(&format!("To: {}\r\n", mail.to.join(", ")));
    if !mail.cc.is_empty() {
        out.push_str(&format!("Cc: {}\r\n", mail.cc.join(", ")));
    }
    if !mail.bcc.is_empty() {
        out.push_str(&format!("Bcc: {}\r\n", mail.bcc.join(", ")));
    }
    out.push_str(&format!("Subject: {}\r\n", mail.subject));
    out.push_str("MIME-Version: 1.0\r\n");

    if attachments.is_empty() {
        text_part(&mut out, &mail.text);
        return out;
    }

    out.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{}\"\r\n",
        boundary
    ));
    out.push_str(CRLF);
    out.push_str(&format!("--{}\r\n", boundary));
    text_part(&mut out, &mail.text);
    out.push_str(CRLF);

    for att in attachments.iter() {
        out.push_str(&format!("--{}\r\n", boundary));
        let name = quoted_string(&att.name);
        out.push_str(&format!(
            "Content-Type: application/octet-stream; name={}\r\n",
            name
        ));
        out.push_str("Content-Transfer-Encoding: base64\r\n");
        out.push_str(&format!(
            "Content-Disposition: attachment; filename={}\r\n",
            name
        ));
        out.push_str(CRLF);
        for line in base64_lines(&att.content) {
            out.push_str(&line);
            out.push_str(CRLF);
        }
        out.push_str(CRLF);
    }
    out.push_str(&format!("--{}--\r\n", boundary));
    out
}

pub fn compose_to_bytes(mail: &Mail) -> Result<Vec<u8>> {
    let attachments = resolve_attachments(&mail.attachments)?;
    let boundary = boundary_for(&mail.text);
    Ok(render(mail, &attachments, &boundary).into_bytes())
}

/// A composed message waiting on disk for the transport.
pub struct ComposedDocument {
    file: NamedTempFile,
}

impl ComposedDocument {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn discard(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close().map_err(|e| Error::Document(path, e))
    }
}

pub fn compose(mail: &Mail) -> Result<ComposedDocument> {
    compose_in(mail, &std::env::temp_dir())
}

pub fn compose_in(mail: &Mail, dir: &Path) -> Result<ComposedDocument> {
    let bytes = compose_to_bytes(mail)?;
    let mut file = tempfile::Builder::new()
        .prefix("email_")
        .suffix(".eml")
        .tempfile_in(dir)
        .map_err(|e| Error::Document(dir.to_path_buf(), e))?;
    if let Err(e) = file.write_all(&bytes).and_then(|_| file.flush()) {
        return Err(Error::Document(file.path().to_path_buf(), e));
    }
    log::debug!("composed {} bytes into {}", bytes.len(), file.path().display());
    Ok(ComposedDocument { file })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> Mail {
        Mail {
            from: "me@example.com".to_string(),
            from_name: Some("Me".to_string()),
            to: vec!["a@x.com".to_string(), "b@y.com".to_string()],
            cc: vec![],
            bcc: vec!["hidden@z.com".to_string()],
            subject: "Report".to_string(),
            text: "Hello there".to_string(),
            attachments: vec![],
        }
    }

    #[test]
    fn single_part_layout() {
        let out = render(&mail(), &[], "unused");
        assert_eq!(
            out,
            "From: Me <me@example.com>\r\n\
             To: a@x.com, b@y.com\r\n\
             Bcc: hidden@z.com\r\n\
             Subject: Report\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             Hello there\r\n"
        );
    }

    #[test]
    fn multipart_layout() {
        let attachments = vec![Attachment {
            name: "a.bin".to_string(),
            content: b"abc".to_vec(),
        }];
        let out = render(&mail(), &attachments, "B0UND");
        assert_eq!(
            out,
            "From: Me <me@example.com>\r\n\
             To: a@x.com, b@y.com\r\n\
             Bcc: hidden@z.com\r\n\
             Subject: Report\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"B0UND\"\r\n\
             \r\n\
             --B0UND\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             Hello there\r\n\
             \r\n\
             --B0UND\r\n\
             Content-Type: application/octet-stream; name=\"a.bin\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             Content-Disposition: attachment; filename=\"a.bin\"\r\n\
             \r\n\
             YWJj\r\n\
             \r\n\
             --B0UND--\r\n"
        );
    }

    #[test]
    fn attachment_names_are_escaped() {
        assert_eq!(quoted_string("plain.txt"), "\"plain.txt\"");
        assert_eq!(quoted_string("say \"hi\".txt"), "\"say \\\"hi\\\".txt\"");
        assert_eq!(quoted_string("a\\b"), "\"a\\\\b\"");

        let attachments = vec![Attachment {
            name: "q\"uote.bin".to_string(),
            content: vec![],
        }];
        let out = render(&mail(), &attachments, "B0UND");
        assert!(out.contains("Content-Type: application/octet-stream; name=\"q\\\"uote.bin\"\r\n"));
        assert!(out.contains("Content-Disposition: attachment; filename=\"q\\\"uote.bin\"\r\n"));
    }

    #[test]
    fn base64_wraps_at_76() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let lines = base64_lines(&data);
        let (last, full) = lines.split_last().unwrap();
        assert!(full.iter().all(|l| l.len() == 76));
        assert!(!last.is_empty() && last.len() <= 76);
        let joined: String = lines.concat();
        assert_eq!(general_purpose::STANDARD.decode(joined).unwrap(), data);
    }

    #[test]
    fn base64_round_trips_every_length() {
        for len in 0..=300usize {
            let data: Vec<u8> = (0..len).map(|i| (i * 37 % 256) as u8).collect();
            let joined = base64_lines(&data).concat();
            assert_eq!(general_purpose::STANDARD.decode(&joined).unwrap(), data);
        }
        assert!(base64_lines(&[]).is_empty());
    }

    #[test]
    fn boundary_avoids_body() {
        let boundary = boundary_for("plain body");
        assert!(boundary.starts_with("===="));
        assert!(boundary.ends_with("===="));
        assert_ne!(boundary, boundary_for("plain body"));
    }

    #[test]
    fn missing_attachments_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        fs::write(&present, b"data").unwrap();
        let attachments =
            resolve_attachments(&[dir.path().join("missing.txt"), present.clone()]).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].name, "present.txt");
        assert_eq!(attachments[0].content, b"data");
    }

    #[test]
    fn all_missing_falls_back_to_single_part() {
        let dir = tempfile::tempdir().unwrap();
        let mut mail = mail();
        mail.attachments = vec![dir.path().join("gone.pdf")];
        let out = String::from_utf8(compose_to_bytes(&mail).unwrap()).unwrap();
        assert!(!out.contains("multipart"));
        assert!(!out.contains("--===="));
        assert_eq!(out.matches("Content-Type: text/plain").count(), 1);
    }

    #[test]
    fn document_is_removed_on_discard() {
        let dir = tempfile::tempdir().unwrap();
        let doc = compose_in(&mail(), dir.path()).unwrap();
        let path = doc.path().to_path_buf();
        assert!(fs::read_to_string(&path).unwrap().starts_with("From: "));
        doc.discard().unwrap();
        assert!(!path.exists());
    }
}
