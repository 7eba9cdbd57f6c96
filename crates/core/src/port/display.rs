// Display Adapter Port
// Capability interface over the two-color panel (real hardware or a stand-in)

use thiserror::Error;

use crate::domain::{Geometry, Plane};

/// Panel boundary errors; any of these ends the agent loop
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Panel I/O failed: {0}")]
    Io(String),

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Panel unavailable: {0}")]
    Unavailable(String),
}

/// Display Adapter trait
///
/// Implementations:
/// - NoopDisplay (infra-system): logs instead of driving hardware
/// - mocks::RecordingDisplay: records calls for tests
pub trait DisplayAdapter: Send {
    /// Fixed panel geometry
    fn geometry(&self) -> Geometry;

    fn width(&self) -> u32 {
        self.geometry().width
    }

    fn height(&self) -> u32 {
        self.geometry().height
    }

    /// Wake the panel and prepare it for a refresh
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Convert a plane into the panel's native buffer layout
    fn get_buffer(&self, plane: &Plane) -> Vec<u8> {
        plane.pack()
    }

    /// Push both device buffers in one refresh
    fn display(&mut self, ink: &[u8], accent: &[u8]) -> Result<(), DisplayError>;

    /// Enter low-power mode
    fn sleep(&mut self) -> Result<(), DisplayError>;

    /// Release hardware resources. Must be safe to call more than once.
    fn teardown(&mut self);
}

/// Expected device buffer length for a geometry
pub fn buffer_len(geometry: Geometry) -> usize {
    (geometry.width as usize).div_ceil(8) * geometry.height as usize
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// One recorded panel call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PanelCall {
        Init,
        Display { ink: Vec<u8>, accent: Vec<u8> },
        Sleep,
        Teardown,
    }

    /// Mock panel that records calls; the log handle survives moving the
    /// panel into the agent.
    pub struct RecordingDisplay {
        geometry: Geometry,
        log: Arc<Mutex<Vec<PanelCall>>>,
        fail_on_display: Option<usize>,
        displays: usize,
    }

    impl RecordingDisplay {
        pub fn new(geometry: Geometry) -> Self {
            Self {
                geometry,
                log: Arc::new(Mutex::new(Vec::new())),
                fail_on_display: None,
                displays: 0,
            }
        }

        /// Fail the `n`th (1-based) display call with an I/O error
        pub fn failing_on_display(mut self, n: usize) -> Self {
            self.fail_on_display = Some(n);
            self
        }

        pub fn log(&self) -> Arc<Mutex<Vec<PanelCall>>> {
            Arc::clone(&self.log)
        }
    }

    impl DisplayAdapter for RecordingDisplay {
        fn geometry(&self) -> Geometry {
            self.geometry
        }

        fn init(&mut self) -> Result<(), DisplayError> {
            self.log.lock().unwrap().push(PanelCall::Init);
            Ok(())
        }

        fn display(&mut self, ink: &[u8], accent: &[u8]) -> Result<(), DisplayError> {
            self.displays += 1;
            if self.fail_on_display == Some(self.displays) {
                return Err(DisplayError::Io("SPI write failed".to_string()));
            }
            self.log.lock().unwrap().push(PanelCall::Display {
                ink: ink.to_vec(),
                accent: accent.to_vec(),
            });
            Ok(())
        }

        fn sleep(&mut self) -> Result<(), DisplayError> {
            self.log.lock().unwrap().push(PanelCall::Sleep);
            Ok(())
        }

        fn teardown(&mut self) {
            let mut log = self.log.lock().unwrap();
            if !log.contains(&PanelCall::Teardown) {
                log.push(PanelCall::Teardown);
            }
        }
    }
}
