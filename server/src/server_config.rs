use std::time::Duration;

use serde::{Deserialize, Serialize};

use common::config::Validate;
use common::engine::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use common::protocol::DEFAULT_MAX_FRAME_LEN;

pub const DEFAULT_CONFIG_PATH: &str = "go_server.yaml";
pub const DEFAULT_PORT: u16 = 5005;
pub const DEFAULT_BOARD_SIZE: usize = 19;
pub const OUTBOUND_QUEUE_CAPACITY: usize = 128;
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

const MIN_FRAME_LEN: usize = 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub default_board_size: usize,
    pub allowed_board_sizes: Vec<usize>,
    pub max_frame_len: usize,
    pub outbound_queue_capacity: usize,
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            default_board_size: DEFAULT_BOARD_SIZE,
            allowed_board_sizes: vec![9, 13, 19],
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            outbound_queue_capacity: OUTBOUND_QUEUE_CAPACITY,
            shutdown_grace_ms: SHUTDOWN_GRACE.as_millis() as u64,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn is_allowed_board_size(&self, board_size: usize) -> bool {
        self.allowed_board_sizes.contains(&board_size)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must not be 0".to_string());
        }
        if self.allowed_board_sizes.is_empty() {
            return Err("allowed_board_sizes must not be empty".to_string());
        }
        if let Some(size) = self
            .allowed_board_sizes
            .iter()
            .find(|size| !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(*size))
        {
            return Err(format!(
                "board size {} is outside {}..={}",
                size, MIN_BOARD_SIZE, MAX_BOARD_SIZE
            ));
        }
        if !self.is_allowed_board_size(self.default_board_size) {
            return Err(format!(
                "default_board_size {} is not in allowed_board_sizes",
                self.default_board_size
            ));
        }
        if self.max_frame_len < MIN_FRAME_LEN {
            return Err(format!("max_frame_len must be at least {}", MIN_FRAME_LEN));
        }
        if self.outbound_queue_capacity == 0 {
            return Err("outbound_queue_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
