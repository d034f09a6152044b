//! In-memory stove used by the session tests
//!
//! Every `connect()` opens a fresh `tokio::io::duplex` pair and spawns a task
//! that parses each request frame, records it, and answers with a canned
//! line. Individual requests (counted across connections) can be muted or
//! answered by hanging up.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

use stove_protocol::codec::{Command, Frame, Mode};
use stove_protocol::connection::{Connector, StoveStream};
use stove_protocol::error::{Result, StoveError};

pub const INFO_LINE: &str = "INF;ACME;Pellet 9;1.2.3;2.0.1;AA:BB:CC:DD:EE:FF;SN-0042\n";
// stove type 2057: room 1 sensor, DHW, one fan; state 8 (running)
pub const DATA_LINE: &str =
    "DAT;2057;8;0;3;3;215;220;0;0;0;0;1450;4;0;0;1;0;80;1\n";
pub const DATA2_LINE: &str = "DAT;1;0;0;0;0;450;500;600;650;480;500;1;0\n";
pub const WRITE_ACK: &str = "DAT;OK\n";

#[derive(Default)]
struct SimState {
    connects: usize,
    refuse: bool,
    frames: Vec<Frame>,
    muted: HashSet<usize>,
    hang_up: HashSet<usize>,
}

#[derive(Clone, Default)]
pub struct SimulatedStove {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedStove {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }

    /// Refuse (or accept again) new connections
    pub fn refuse_connections(&self, refuse: bool) {
        self.state.lock().refuse = refuse;
    }

    /// Never answer the request with this overall index
    pub fn mute_request(&self, index: usize) {
        self.state.lock().muted.insert(index);
    }

    /// Close the socket instead of answering this request
    pub fn hang_up_on(&self, index: usize) {
        self.state.lock().hang_up.insert(index);
    }

    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.state.lock().frames.clone()
    }

    /// Parameter lists of every write frame, in arrival order
    pub fn writes(&self) -> Vec<Vec<String>> {
        self.frames()
            .into_iter()
            .filter(|f| f.mode() == Mode::Write)
            .map(|f| f.parameters().to_vec())
            .collect()
    }

    fn reply_for(frame: &Frame) -> &'static str {
        match (frame.command(), frame.mode(), frame.parameters()) {
            (Command::Info, _, _) => INFO_LINE,
            (Command::Data, Mode::Read, [block]) if block == "2" => DATA2_LINE,
            (Command::Data, Mode::Read, _) => DATA_LINE,
            (Command::Data, _, _) => WRITE_ACK,
        }
    }

    async fn serve(self, stream: DuplexStream) {
        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {},
            }

            let Ok(frame) = Frame::parse(&line) else {
                return;
            };
            let reply = Self::reply_for(&frame);

            let (muted, hang_up) = {
                let mut state = self.state.lock();
                let index = state.frames.len();
                state.frames.push(frame);
                (state.muted.contains(&index), state.hang_up.contains(&index))
            };

            if hang_up {
                return;
            }
            if muted {
                continue;
            }
            if reader.get_mut().write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl Connector for SimulatedStove {
    async fn connect(&self) -> Result<Box<dyn StoveStream>> {
        {
            let mut state = self.state.lock();
            state.connects += 1;
            if state.refuse {
                return Err(StoveError::connect("connection refused"));
            }
        }

        let (client, server) = duplex(4096);
        tokio::spawn(self.clone().serve(server));
        Ok(Box::new(client))
    }

    fn target(&self) -> String {
        "simulated-stove".to_string()
    }
}

/// Connector whose far end is not read until the test takes it
///
/// With a small pipe capacity the session's write blocks part way through a
/// frame.
pub struct StalledPeer {
    capacity: usize,
    peer: Mutex<Option<DuplexStream>>,
}

impl StalledPeer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            peer: Mutex::new(None),
        }
    }

    /// Stove end of the most recent connection
    pub fn take_peer(&self) -> Option<DuplexStream> {
        self.peer.lock().take()
    }
}

#[async_trait]
impl Connector for StalledPeer {
    async fn connect(&self) -> Result<Box<dyn StoveStream>> {
        let (client, server) = duplex(self.capacity);
        *self.peer.lock() = Some(server);
        Ok(Box::new(client))
    }

    fn target(&self) -> String {
        "stalled-peer".to_string()
    }
}
