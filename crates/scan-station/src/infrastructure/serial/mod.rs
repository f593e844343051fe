//! Serial scanner reader.
//!
//! Scanners configured as a (virtual) COM port stream raw bytes.  A dedicated
//! thread reads the port with a short timeout and posts every non-empty chunk
//! into the station queue as [`StationEvent::SerialBytes`]; framing into scans
//! happens in the station, so the reader knows nothing about barcodes.
//!
//! When the port closes or fails, the reader posts
//! [`StationEvent::SerialDisconnected`] and exits.

use std::io::{ErrorKind, Read};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serialport::SerialPort;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::application::detect_scans::{StationEvent, StationHandle};

/// Read timeout; also bounds how long the reader takes to notice shutdown.
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Largest chunk read in one call.
const READ_CHUNK_SIZE: usize = 256;

/// Error type for the serial scanner reader.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Opens `path` at `baud_rate` (8N1, no flow control).
///
/// # Errors
///
/// Returns [`SerialError::Open`] if the port does not exist or is busy.
pub fn open_serial_port(path: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, SerialError> {
    serialport::new(path, baud_rate)
        .timeout(SERIAL_READ_TIMEOUT)
        .open()
        .map_err(|source| SerialError::Open {
            port: path.to_string(),
            source,
        })
}

/// Reads `reader` until end of stream, posting each chunk to `events`.
///
/// Read timeouts are normal and only used to check whether the station is
/// still listening.  Returns `Ok(())` on end of stream or once the station has
/// stopped.
///
/// # Errors
///
/// Returns [`SerialError::Read`] for any other I/O failure.
pub fn pump_serial<R: Read>(mut reader: R, events: &UnboundedSender<StationEvent>) -> Result<(), SerialError> {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        if events.is_closed() {
            return Ok(());
        }
        match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => {
                if events.send(StationEvent::SerialBytes(buf[..n].to_vec())).is_err() {
                    return Ok(());
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {}
            Err(e) => return Err(SerialError::Read(e)),
        }
    }
}

/// Spawns the reader thread for an open port.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_serial_reader(port: Box<dyn SerialPort>, station: StationHandle) -> std::io::Result<JoinHandle<()>> {
    let name = port.name().unwrap_or_else(|| "serial".to_string());
    thread::Builder::new().name("serial-scanner".to_string()).spawn(move || {
        info!(port = %name, "serial scanner reader started");
        let events = station.sender();
        match pump_serial(port, &events) {
            Ok(()) => debug!(port = %name, "serial reader finished"),
            Err(e) => warn!(port = %name, "serial scanner failed: {e}"),
        }
        // Ignored if the station has already stopped.
        let _ = station.post(StationEvent::SerialDisconnected);
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::detect_scans::station_channel;
    use std::collections::VecDeque;
    use std::io;

    /// A reader that replays a fixed script of read results.
    struct ScriptedReader {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self { script: script.into() }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn timed_out() -> io::Result<Vec<u8>> {
        Err(io::Error::new(ErrorKind::TimedOut, "no data"))
    }

    #[test]
    fn test_pump_posts_chunks_and_skips_timeouts() {
        // Arrange
        let (handle, mut rx) = station_channel();
        let reader = ScriptedReader::new(vec![Ok(b"LOT".to_vec()), timed_out(), Ok(b"-42\r\n".to_vec())]);

        // Act
        let result = pump_serial(reader, &handle.sender());

        // Assert
        assert!(result.is_ok());
        assert_eq!(rx.try_recv().unwrap(), StationEvent::SerialBytes(b"LOT".to_vec()));
        assert_eq!(rx.try_recv().unwrap(), StationEvent::SerialBytes(b"-42\r\n".to_vec()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_pump_returns_read_error() {
        let (handle, _rx) = station_channel();
        let reader = ScriptedReader::new(vec![Err(io::Error::new(ErrorKind::BrokenPipe, "unplugged"))]);

        let result = pump_serial(reader, &handle.sender());

        assert!(matches!(result, Err(SerialError::Read(e)) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_pump_stops_when_station_is_gone() {
        // Arrange: an endless stream of timeouts would spin forever otherwise
        struct AlwaysTimesOut;
        impl Read for AlwaysTimesOut {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::TimedOut, "no data"))
            }
        }
        let (handle, rx) = station_channel();
        drop(rx);

        // Act / Assert
        assert!(pump_serial(AlwaysTimesOut, &handle.sender()).is_ok());
    }

    #[test]
    fn test_open_missing_port_is_an_open_error() {
        let result = open_serial_port("/dev/definitely-not-a-scanner", 9600);

        match result {
            Err(SerialError::Open { port, .. }) => assert_eq!(port, "/dev/definitely-not-a-scanner"),
            other => panic!("expected open error, got {:?}", other.map(|_| ())),
        }
    }
}
