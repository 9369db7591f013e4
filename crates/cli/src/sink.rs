use std::{
    io::{self, Write},
    sync::Mutex,
};

use {
    async_trait::async_trait,
    tgbridge_channels::{AccountEvent, AccountEventSink},
    tracing::warn,
};

/// Writes every host event as one JSON object per line.
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write_event(&self, event: &AccountEvent) -> anyhow::Result<()> {
        let line = serde_json::to_string(event)?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

#[async_trait]
impl<W: Write + Send> AccountEventSink for JsonLinesSink<W> {
    async fn emit(&self, event: AccountEvent) {
        if let Err(e) = self.write_event(&event) {
            warn!(error = %e, "failed to write event");
        }
    }
}
