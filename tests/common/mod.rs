// Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;

use dlp_rfid2::{DlpRfid2, Protocol, RfidTransport};

/// Replies the reader gives while `set_protocol` programs it
pub const SETUP_REPLIES: [&str; 5] = [
    "TRF7970A EVM\r\n",
    "Register write request.\r\n",
    "Register write request.\r\n",
    "AGC selection.\r\n",
    "AM/PM selection.\r\n",
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scripted reader: every request gets the next queued reply
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub replies: VecDeque<Vec<u8>>,
    pub sent: Vec<String>,
    pending: Vec<u8>,
}

impl ScriptedTransport {
    pub fn new<S: AsRef<str>>(replies: &[S]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.as_ref().as_bytes().to_vec()).collect(),
            ..Self::default()
        }
    }
}

impl RfidTransport for ScriptedTransport {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.sent.push(String::from_utf8_lossy(data).into_owned());
        self.pending = self.replies.pop_front().unwrap_or_default();
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, Self::Error> {
        let len = self.pending.len().min(buf.len());
        buf[..len].copy_from_slice(&self.pending[..len]);
        self.pending.drain(..len);
        Ok(len)
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.pending.clear();
        Ok(())
    }
}

/// Session already switched to `protocol`, answering `replies` afterwards
pub fn session<S: AsRef<str>>(protocol: Protocol, replies: &[S]) -> DlpRfid2<ScriptedTransport> {
    init_logging();
    let mut all: Vec<String> = SETUP_REPLIES.iter().map(|s| s.to_string()).collect();
    all.extend(replies.iter().map(|s| s.as_ref().to_string()));
    let mut reader = DlpRfid2::new(ScriptedTransport::new(&all));
    reader.set_protocol(protocol).unwrap();
    reader
}

/// Read-multiple-block reply carrying `record`
pub fn read_reply(record: &[u8; 32]) -> String {
    let hex: String = record.iter().map(|b| format!("{:02X}", b)).collect();
    format!("Request mode.\r\n[00{}00000000]\r\n", hex)
}
