//! Trait abstraction for the referee transport to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for the referee serial transport
///
/// The link owns one implementation and is the only caller; the transport
/// never invokes back into the link. One `receive` call models one capture
/// cycle: it resolves when the line goes idle after a variable-length
/// reception, however short.
#[async_trait]
pub trait RefereePort: Send {
    /// Capture bytes from the line into `buf`
    ///
    /// Resolves with the number of bytes captured once reception pauses. The
    /// future stays pending while the line is silent.
    async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Transmit one composed frame
    ///
    /// Resolves once the transport has accepted every byte; the caller must
    /// not start another transmission before then.
    async fn transmit(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Disable and re-enable the underlying receiver
    ///
    /// Discards driver-side buffers; never touches the state store or
    /// sequence counters.
    fn restart(&mut self) -> io::Result<()>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// One scripted receive cycle
    #[derive(Debug, Clone)]
    pub enum Capture {
        /// The line delivers these bytes, then goes idle
        Bytes(Vec<u8>),

        /// The line stays silent; receive never resolves
        Silence,
    }

    /// Mock transport driven by a script of captures
    #[derive(Clone)]
    pub struct MockPort {
        captures: Arc<Mutex<VecDeque<Capture>>>,
        pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
        pub restarts: Arc<Mutex<usize>>,
    }

    impl MockPort {
        pub fn new(captures: Vec<Capture>) -> Self {
            Self {
                captures: Arc::new(Mutex::new(captures.into())),
                sent: Arc::new(Mutex::new(Vec::new())),
                restarts: Arc::new(Mutex::new(0)),
            }
        }

        pub fn sent_frames(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }

        pub fn push_capture(&self, capture: Capture) {
            self.captures.lock().unwrap().push_back(capture);
        }
    }

    #[async_trait]
    impl RefereePort for MockPort {
        async fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            loop {
                let next = self.captures.lock().unwrap().pop_front();
                match next {
                    Some(Capture::Bytes(bytes)) => {
                        let take = bytes.len().min(buf.len());
                        buf[..take].copy_from_slice(&bytes[..take]);
                        return Ok(take);
                    }
                    Some(Capture::Silence) => std::future::pending::<()>().await,
                    // Script exhausted: keep watching for captures pushed later.
                    None => tokio::time::sleep(std::time::Duration::from_millis(1)).await,
                }
            }
        }

        async fn transmit(&mut self, frame: &[u8]) -> io::Result<()> {
            self.sent.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        fn restart(&mut self) -> io::Result<()> {
            *self.restarts.lock().unwrap() += 1;
            Ok(())
        }
    }
}
