// src/platform.rs

//! Desktop platform capabilities.
//!
//! Clipboard and browser access go through the usual system tools
//! (`pbcopy`, `wl-copy`, `xclip`, `xsel`, `open`, `xdg-open`). Detection
//! runs once; a tool that is not installed leaves the capability empty.
//! Desktops have no native share sheet.

use std::env;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{AppError, Result};
use crate::services::share::{Capabilities, Clipboard, UrlOpener};

/// Clipboard tools in order of preference, with the arguments that make
/// them read the clipboard contents from stdin.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip.exe", &[]),
];

/// Detect every available capability.
pub fn detect_capabilities() -> Capabilities {
    let clipboard = SystemClipboard::detect().map(|c| Arc::new(c) as Arc<dyn Clipboard>);
    let opener = SystemOpener::detect().map(|o| Arc::new(o) as Arc<dyn UrlOpener>);
    Capabilities {
        clipboard,
        share: None,
        opener,
    }
}

/// Locate `program` on `PATH`.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    find_in(env::split_paths(&path), program)
}

fn find_in(dirs: impl IntoIterator<Item = PathBuf>, program: &str) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Clipboard backed by a command-line tool.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    program: PathBuf,
    args: &'static [&'static str],
}

impl SystemClipboard {
    pub fn detect() -> Option<Self> {
        let found = CLIPBOARD_TOOLS
            .iter()
            .find_map(|&(name, args)| find_program(name).map(|program| Self { program, args }));
        match &found {
            Some(clipboard) => log::debug!("Using clipboard tool {}", clipboard.program.display()),
            None => log::debug!("No clipboard tool found"),
        }
        found
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::capability("clipboard", "stdin not captured"))?;
        stdin.write_all(text.as_bytes()).await?;
        drop(stdin);

        let status = child.wait().await?;
        if !status.success() {
            return Err(AppError::capability(
                "clipboard",
                format!("{} exited with {}", self.program.display(), status),
            ));
        }
        Ok(())
    }
}

/// Browser launcher backed by the desktop's URL handler.
#[derive(Debug, Clone)]
pub struct SystemOpener {
    program: PathBuf,
    args: &'static [&'static str],
}

impl SystemOpener {
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "windows") {
            return Some(Self {
                program: PathBuf::from("cmd"),
                args: &["/C", "start", ""],
            });
        }
        let name = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        find_program(name).map(|program| Self { program, args: &[] })
    }
}

#[async_trait]
impl UrlOpener for SystemOpener {
    async fn open(&self, url: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        if !status.success() {
            return Err(AppError::capability(
                "browser",
                format!("{} exited with {}", self.program.display(), status),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_in_searches_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("xclip"), b"").unwrap();

        let found = find_in(
            [first.path().to_path_buf(), second.path().to_path_buf()],
            "xclip",
        );
        assert_eq!(found, Some(second.path().join("xclip")));
        assert_eq!(find_in([first.path().to_path_buf()], "xclip"), None);
    }

    #[test]
    fn test_directories_are_not_programs() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("pbcopy")).unwrap();
        assert_eq!(find_in([dir.path().to_path_buf()], "pbcopy"), None);
    }

    #[test]
    fn test_desktop_has_no_native_share() {
        assert!(detect_capabilities().share.is_none());
    }
}
