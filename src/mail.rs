use std::{path::PathBuf, sync::Mutex};

use anyhow::Context;
use async_trait::async_trait;

use crate::error::AppResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn confirmation_code(from: &str, to: &str, code: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: "Confirmation code".to_string(),
            body: format!("Your registration code: {code}"),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> AppResult<()>;
}

/// Writes each message as a plain-text file, one per send.
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Mailer for FileMailer {
    async fn send(&self, email: Email) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;

        let now = jiff::Timestamp::now();
        let path = self.dir.join(format!("{}-{}.log", now.as_nanosecond(), sanitize(&email.to)));
        let contents = format!(
            "From: {}\nTo: {}\nDate: {}\nSubject: {}\n\n{}\n",
            email.from, email.to, now, email.subject, email.body
        );
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        tracing::debug!(to = %email.to, path = %path.display(), "email written");
        Ok(())
    }
}

fn sanitize(addr: &str) -> String {
    addr.chars().map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' }).collect()
}

/// Keeps sent messages in memory.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<Email>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> AppResult<()> {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(email);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_mailer_writes_message() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = FileMailer::new(dir.path().join("outbox"));
        mailer.send(Email::confirmation_code("a@x.io", "b+1@x.io", "CODE123")).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("outbox")).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let path = entries[0].as_ref().unwrap().path();
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("b_1_x.io.log"));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("To: b+1@x.io"));
        assert!(contents.contains("CODE123"));
    }
}
