//! Stove protocol constants
//!
//! Frame layout, default endpoint and poll-loop timing shared by the codec and
//! the polling session.

use std::time::Duration;

// ============================================================================
// Frame Layout Constants
// ============================================================================

/// First byte of every request frame
pub const FRAME_START: u8 = b'#';

/// Terminator for request frames and response lines
pub const FRAME_END: u8 = b'\n';

/// Socket identifier; always zero for this driver
/// Format: 5 decimal digits, zero padded
pub const SOCKET_ID: &str = "00000";

/// Marker following the socket identifier
pub const CLIENT_MARKER: &str = "C---";

/// Separator between parameters in requests and fields in responses
pub const FIELD_SEPARATOR: char = ';';

/// Width of the hex parameter-length field
pub const LENGTH_FIELD_LEN: usize = 4;

/// Width of the hex checksum field
pub const CHECKSUM_LEN: usize = 4;

/// Width of the command code
pub const COMMAND_LEN: usize = 3;

/// Offset of the length field inside the frame
/// = '#'(1) + socket id(5) + marker(4)
pub const LENGTH_FIELD_OFFSET: usize = 1 + SOCKET_ID.len() + CLIENT_MARKER.len();

/// Smallest well-formed frame: header + length + command + mode + ';' + crc + '\n'
pub const MIN_FRAME_LEN: usize =
    LENGTH_FIELD_OFFSET + LENGTH_FIELD_LEN + COMMAND_LEN + 1 + 1 + CHECKSUM_LEN + 1;

// ============================================================================
// Endpoint & Timing Defaults
// ============================================================================

/// Default TCP port of the stove WiFi module
pub const DEFAULT_PORT: u16 = 5001;

/// Delay between successful poll cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Delay before reconnecting after any failure
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Maximum wait for a response line
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum wait for the TCP handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Initial capacity of the response buffer
pub const RESPONSE_BUFFER_CAPACITY: usize = 1024;

// ============================================================================
// Read Request Parameters
// ============================================================================

/// Parameter selecting the primary status block
pub const DATA_BLOCK_PRIMARY: &str = "0";

/// Parameter selecting the secondary status block
pub const DATA_BLOCK_SECONDARY: &str = "2";
