//! Session scripts
//!
//! A session is a list of operations run in order against one host:
//!
//! - `write:<path>:<text>` writes `text` to `path`
//! - `read:<path>` reads up to the channel capacity from `path`
//! - `read:<path>:<len>` reads up to `len` bytes
//! - `sysctl:<value>` writes `value` to the sysctl variable

use anyhow::{bail, Context, Result};

/// One step of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write { path: String, text: String },
    Read { path: String, len: Option<usize> },
    Sysctl { value: i32 },
}

impl Op {
    pub fn parse(arg: &str) -> Result<Self> {
        let (verb, rest) = arg
            .split_once(':')
            .with_context(|| format!("missing ':' in operation {arg:?}"))?;

        match verb {
            "write" => {
                // Text may itself contain ':'
                let (path, text) = rest
                    .split_once(':')
                    .with_context(|| format!("expected write:<path>:<text>, got {arg:?}"))?;
                Ok(Op::Write {
                    path: checked_path(path)?,
                    text: text.to_string(),
                })
            }
            "read" => {
                let (path, len) = match rest.split_once(':') {
                    Some((path, len)) => {
                        let len: usize = len
                            .parse()
                            .with_context(|| format!("invalid read length {len:?}"))?;
                        (path, Some(len))
                    }
                    None => (rest, None),
                };
                Ok(Op::Read {
                    path: checked_path(path)?,
                    len,
                })
            }
            "sysctl" => {
                let value: i32 = rest
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid sysctl value {rest:?}"))?;
                Ok(Op::Sysctl { value })
            }
            other => bail!("unknown operation {other:?} (expected write, read or sysctl)"),
        }
    }
}

fn checked_path(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        bail!("endpoint path must be absolute, got {path:?}");
    }
    Ok(path.to_string())
}
