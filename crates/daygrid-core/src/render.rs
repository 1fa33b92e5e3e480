use std::io::{self, Write};

use anyhow::Context;
use serde::Serialize;

use crate::config::Config;

/// Writes command results to stdout as JSON.
#[derive(Debug, Clone)]
pub struct Renderer {
    pretty: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            pretty: cfg.get_bool("output.pretty").unwrap_or(true),
        }
    }

    #[tracing::instrument(skip(self, value))]
    pub fn print_json<T: Serialize>(&mut self, value: &T) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.write_json(out, value)
    }

    pub fn write_json<W: Write, T: Serialize>(&self, mut writer: W, value: &T) -> anyhow::Result<()> {
        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, value)
        } else {
            serde_json::to_writer(&mut writer, value)
        };
        written.context("failed to serialize output")?;
        writeln!(writer)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, rows))]
    pub fn print_key_values(&mut self, rows: &[(String, String)]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in rows {
            writeln!(out, "{key:width$} {value}")?;
        }
        Ok(())
    }
}
