use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::info;
use url::form_urlencoded;

pub trait Mailer {
    fn compose(&self, subject: &str, body: &str) -> Result<()>;
}

/// `mailto:` link with form-encoded subject and body; spaces become `%20`.
pub fn mailto_link(subject: &str, body: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("subject", subject)
        .append_pair("body", body)
        .finish()
        .replace('+', "%20");
    format!("mailto:?{query}")
}

/// Hands the draft to the desktop's default mail handler.
pub struct SystemMailer;

impl Mailer for SystemMailer {
    fn compose(&self, subject: &str, body: &str) -> Result<()> {
        let link = mailto_link(subject, body);
        let mut command = launcher_command(&link);
        let status = command
            .status()
            .with_context(|| format!("failed to launch mail handler for {subject:?}"))?;
        if !status.success() {
            bail!("mail handler exited with {status}");
        }
        info!(subject, "opened mail draft");
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn launcher_command(link: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(link);
    command
}

#[cfg(target_os = "macos")]
fn launcher_command(link: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(link);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn launcher_command(link: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(link);
    command
}

pub struct DisabledMailer;

impl Mailer for DisabledMailer {
    fn compose(&self, subject: &str, body: &str) -> Result<()> {
        info!(subject, body_chars = body.len(), "mail handler disabled; draft not opened");
        Ok(())
    }
}

pub fn mailer_for(enabled: bool) -> Box<dyn Mailer> {
    if enabled {
        Box::new(SystemMailer)
    } else {
        Box::new(DisabledMailer)
    }
}
