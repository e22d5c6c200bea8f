use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::path::Path;
use uartplot::{persistence::Persistence, serial::LineSource};

/// In-memory stand-in for the serial port: every queued record is immediately available.
#[derive(Default)]
pub struct ScriptedSource {
    records: VecDeque<Result<Vec<u8>, String>>,
}

impl ScriptedSource {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut source = Self::default();
        for line in lines {
            source.push_line(line);
        }
        source
    }

    pub fn push_line(&mut self, line: &str) {
        self.records.push_back(Ok(format!("{line}\r\n").into_bytes()));
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.records.push_back(Ok(bytes.to_vec()));
    }

    pub fn push_error(&mut self, message: &str) {
        self.records.push_back(Err(message.to_string()));
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl LineSource for ScriptedSource {
    fn has_pending(&mut self) -> Result<bool> {
        Ok(!self.records.is_empty())
    }

    async fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        match self.records.pop_front() {
            Some(Ok(bytes)) => Ok(Some(bytes)),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(None),
        }
    }
}

pub async fn create_sink(dir: &Path) -> Persistence {
    let started = Utc.with_ymd_and_hms(2025, 3, 7, 9, 5, 2).unwrap();
    Persistence::create(dir, started).await.expect("create sink")
}

pub fn sample_line(raw: u32, value: u32) -> String {
    format!("Photocell read: raw={raw}, scaled=true, value={value}")
}
