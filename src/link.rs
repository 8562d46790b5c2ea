//! # Referee Link Task
//!
//! The single owning task of the referee serial link.
//!
//! This module handles:
//! - The capture cycle: wait for one receive cycle with a bounded timeout
//! - Parsing captures into the state store and publishing snapshots
//! - Offline/online link status transitions
//! - Consuming fast/slow refresh edges and draining the UI stack
//! - Single-packet-in-flight transmission
//!
//! Concurrency discipline is single-writer-per-resource: the link task is
//! the only writer of the state store and the UI stack. Refresh timers only
//! raise edge flags; every queue mutation and frame composition happens here.
//! External producers reach the link through a [`LinkHandle`]: a bounded
//! channel for UI operations (rejected when full, which is the backpressure
//! signal) and a shared snapshot of display inputs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::referee::decoder::parse_capture;
use crate::referee::projector::{view_for, ConsumerKind, ConsumerView};
use crate::referee::protocol::{LinkStatus, RefereeState, RX_BUFFER_LEN};
use crate::serial::RefereePort;
use crate::telemetry::{TelemetryLogger, TelemetrySnapshot};
use crate::ui::composer::PacketComposer;
use crate::ui::element::{DeleteOp, GraphicElement, StringElement};
use crate::ui::scheduler::{DisplayInput, RefreshScheduler, RefreshSignal, Screen};
use crate::ui::stack::{UiOp, UiStack};

/// Capacity of the external UI operation channel
const UI_OP_CHANNEL_CAPACITY: usize = 32;

/// The referee link, generic over the transport
pub struct RefereeLink<P> {
    port: P,
    state: RefereeState,
    state_tx: watch::Sender<RefereeState>,
    stack: UiStack,
    scheduler: RefreshScheduler,
    composer: PacketComposer,
    ops_rx: mpsc::Receiver<UiOp>,
    display: Arc<Mutex<DisplayInput>>,
    fast_signal: RefreshSignal,
    slow_signal: RefreshSignal,
    telemetry: Option<TelemetryLogger>,
    capture_timeout: Duration,
    fast_period: Duration,
    slow_period: Duration,
    log_interval: Duration,
}

/// Cloneable handle other subsystems use to observe and feed the link
#[derive(Debug, Clone)]
pub struct LinkHandle {
    state_rx: watch::Receiver<RefereeState>,
    ops_tx: mpsc::Sender<UiOp>,
    display: Arc<Mutex<DisplayInput>>,
}

impl LinkHandle {
    /// Latest published state snapshot
    pub fn state(&self) -> RefereeState {
        *self.state_rx.borrow()
    }

    /// Project the latest snapshot for one consumer
    ///
    /// Synchronous and non-blocking; safe to call at any cadence.
    pub fn view_for(&self, kind: ConsumerKind) -> ConsumerView {
        view_for(kind, &self.state_rx.borrow())
    }

    /// Wait until the link publishes a new snapshot
    ///
    /// # Returns
    ///
    /// * `bool` - false once the link task has gone away
    pub async fn changed(&mut self) -> bool {
        self.state_rx.changed().await.is_ok()
    }

    /// Enqueue a deletion for the next composed frame
    ///
    /// # Returns
    ///
    /// * `bool` - false if the operation was rejected under backpressure
    pub fn push_delete(&self, op: DeleteOp) -> bool {
        self.ops_tx.try_send(UiOp::Delete(op)).is_ok()
    }

    /// Enqueue a graphic element
    pub fn push_graphic(&self, element: GraphicElement) -> bool {
        self.ops_tx.try_send(UiOp::Graphic(element)).is_ok()
    }

    /// Enqueue a string element
    pub fn push_string(&self, element: StringElement) -> bool {
        self.ops_tx.try_send(UiOp::String(element)).is_ok()
    }

    /// Update the display inputs the refresh scheduler reads each fast tick
    pub fn update_display<F>(&self, update: F)
    where
        F: FnOnce(&mut DisplayInput),
    {
        let mut input = self
            .display
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut input);
    }
}

impl<P: RefereePort> RefereeLink<P> {
    /// Build a link around an opened transport
    ///
    /// # Errors
    ///
    /// Returns error if the telemetry journal cannot be created
    pub fn new(port: P, config: &Config) -> Result<(Self, LinkHandle)> {
        let (state_tx, state_rx) = watch::channel(RefereeState::default());
        let (ops_tx, ops_rx) = mpsc::channel(UI_OP_CHANNEL_CAPACITY);
        let display = Arc::new(Mutex::new(DisplayInput::default()));

        let telemetry = if config.telemetry.enabled {
            Some(TelemetryLogger::new(&config.telemetry)?)
        } else {
            None
        };

        let link = Self {
            port,
            state: RefereeState::default(),
            state_tx,
            stack: UiStack::new(
                config.ui.delete_queue,
                config.ui.graphic_queue,
                config.ui.string_queue,
            ),
            scheduler: RefreshScheduler::new(Screen::new(
                config.ui.screen_width,
                config.ui.screen_height,
            )),
            composer: PacketComposer::new(),
            ops_rx,
            display: display.clone(),
            fast_signal: RefreshSignal::new(),
            slow_signal: RefreshSignal::new(),
            telemetry,
            capture_timeout: Duration::from_millis(config.link.capture_timeout_ms),
            fast_period: Duration::from_millis(config.ui.fast_refresh_ms),
            slow_period: Duration::from_millis(config.ui.slow_refresh_ms),
            log_interval: Duration::from_millis(config.telemetry.log_interval_ms),
        };

        let handle = LinkHandle {
            state_rx,
            ops_tx,
            display,
        };

        Ok((link, handle))
    }

    /// Drive the link until a transport fault
    ///
    /// Each pass is one capture cycle followed by at most one refresh edge
    /// and a drain of the UI stack. The capture is always re-armed, whatever
    /// the previous cycle's outcome.
    pub async fn run(mut self) -> Result<()> {
        self.spawn_refresh_timers();
        let mut rx_buf = vec![0u8; RX_BUFFER_LEN];
        let mut last_journal = Instant::now();

        info!(
            "Referee link running (capture timeout {} ms)",
            self.capture_timeout.as_millis()
        );

        loop {
            match timeout(self.capture_timeout, self.port.receive(&mut rx_buf)).await {
                Ok(Ok(len)) if len > 0 => {
                    let previous = self.state.status;
                    let report = parse_capture(&rx_buf[..len], &mut self.state);

                    if let Some(cmd_id) = report.unknown_command {
                        debug!(
                            "Unknown command 0x{:04X}; abandoned remainder of capture",
                            cmd_id
                        );
                    }
                    if report.bytes_skipped > 0 {
                        debug!("Dropped {} noise bytes", report.bytes_skipped);
                    }
                    if report.frames_applied > 0 {
                        if previous == LinkStatus::Offline {
                            info!("Referee link online");
                        }
                        self.publish();
                    }
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!("Receive failed: {}; restarting receiver", e);
                    self.port.restart()?;
                }
                Err(_elapsed) => {
                    if self.state.status == LinkStatus::Running {
                        info!("Referee link offline");
                        self.state.status = LinkStatus::Offline;
                        self.publish();
                    }
                }
            }

            self.drain_external_ops();

            if self.slow_signal.take() {
                let rejected = self.scheduler.slow_refresh(&mut self.stack);
                if rejected > 0 {
                    debug!("UI stack rejected {} static elements", rejected);
                }
            } else if self.fast_signal.take() {
                let input = *self
                    .display
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let outcome = self.scheduler.fast_refresh(&mut self.stack, &input);
                if outcome.rejected > 0 {
                    debug!(
                        "UI stack rejected {} elements for group {:?}",
                        outcome.rejected, outcome.group
                    );
                }
            }

            self.flush_ui().await?;
            self.journal(&mut last_journal);
        }
    }

    /// Publish the current state to every handle
    fn publish(&self) {
        self.state_tx.send_replace(self.state);
    }

    /// Move externally pushed operations onto the UI stack
    fn drain_external_ops(&mut self) {
        while let Ok(op) = self.ops_rx.try_recv() {
            if !self.stack.push_op(op) {
                debug!("UI stack full; dropped externally pushed operation");
            }
        }
    }

    /// Compose and transmit until the stack is drained
    ///
    /// The awaited transmit is the single-packet-in-flight hand-off token:
    /// the next compose cannot start before the previous send has completed.
    async fn flush_ui(&mut self) -> Result<()> {
        let robot_id = self.state.robot_status.robot_id;
        while let Some(packet) = self.composer.compose(&mut self.stack, robot_id) {
            self.port.transmit(packet.as_ref()).await?;
            debug!("Sent UI frame ({} bytes)", packet.len());
        }
        Ok(())
    }

    /// Append a journal line at the configured interval
    ///
    /// A journal fault disables journaling rather than taking the link down.
    fn journal(&mut self, last_journal: &mut Instant) {
        if self.telemetry.is_none() || last_journal.elapsed() < self.log_interval {
            return;
        }
        *last_journal = Instant::now();

        if let Some(logger) = self.telemetry.as_mut() {
            if let Err(e) = logger.log(&TelemetrySnapshot::capture(&self.state)) {
                warn!("Telemetry journal failed: {}; journaling disabled", e);
                self.telemetry = None;
            }
        }
    }

    /// Start the fast and slow refresh timers
    ///
    /// The timer tasks never touch link state: they raise edge flags the
    /// owning loop consumes. Missed ticks are skipped, not replayed.
    fn spawn_refresh_timers(&self) {
        let timers = [
            (self.fast_signal.clone(), self.fast_period),
            (self.slow_signal.clone(), self.slow_period),
        ];
        for (signal, period) in timers {
            tokio::spawn(async move {
                let mut ticks = interval(period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticks.tick().await;
                    signal.raise();
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referee::crc::{crc16, crc8, verify_crc16};
    use crate::referee::protocol::{
        CMD_GAME_STATUS, CMD_INTER_ROBOT, FRAME_SOF, SUB_CMD_UI_DELETE,
    };
    use crate::serial::port_trait::mocks::{Capture, MockPort};
    use crate::ui::element::DeleteOp;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.link.capture_timeout_ms = 40;
        config.ui.fast_refresh_ms = 20;
        config.ui.slow_refresh_ms = 10_000;
        config.telemetry.enabled = false;
        config
    }

    fn game_status_frame() -> Vec<u8> {
        let payload = [0u8; 6];
        let mut frame = vec![FRAME_SOF];
        frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        frame.push(0);
        frame.push(crc8(&frame));
        frame.extend_from_slice(&CMD_GAME_STATUS.to_le_bytes());
        frame.extend_from_slice(&payload);
        let tail = crc16(&frame);
        frame.extend_from_slice(&tail.to_le_bytes());
        frame
    }

    #[tokio::test]
    async fn test_verified_frame_brings_link_online() {
        let port = MockPort::new(vec![Capture::Bytes(game_status_frame())]);
        let (link, mut handle) = RefereeLink::new(port, &test_config()).unwrap();
        tokio::spawn(link.run());

        assert!(handle.changed().await);
        assert_eq!(handle.state().status, LinkStatus::Running);
    }

    #[tokio::test]
    async fn test_capture_timeout_goes_offline_then_recovers() {
        let port = MockPort::new(vec![Capture::Bytes(game_status_frame())]);
        let script = port.clone();
        let (link, mut handle) = RefereeLink::new(port, &test_config()).unwrap();
        tokio::spawn(link.run());

        assert!(handle.changed().await);
        assert_eq!(handle.state().status, LinkStatus::Running);

        // The line goes silent; the next capture cycle times out.
        assert!(handle.changed().await);
        assert_eq!(handle.state().status, LinkStatus::Offline);

        // The next verified frame flips the link straight back.
        script.push_capture(Capture::Bytes(game_status_frame()));
        assert!(handle.changed().await);
        assert_eq!(handle.state().status, LinkStatus::Running);
    }

    #[tokio::test]
    async fn test_fast_refresh_transmits_valid_frames() {
        let port = MockPort::new(vec![Capture::Silence]);
        let script = port.clone();
        let (link, _handle) = RefereeLink::new(port, &test_config()).unwrap();
        tokio::spawn(link.run());

        tokio::time::sleep(Duration::from_millis(300)).await;

        let sent = script.sent_frames();
        assert!(!sent.is_empty(), "fast refresh produced no frames");
        for frame in &sent {
            assert_eq!(frame[0], FRAME_SOF);
            assert_eq!(u16::from_le_bytes([frame[5], frame[6]]), CMD_INTER_ROBOT);
            assert!(verify_crc16(frame), "sent frame fails verification");
        }
    }

    #[tokio::test]
    async fn test_externally_pushed_delete_goes_out_first() {
        let port = MockPort::new(vec![Capture::Silence]);
        let script = port.clone();
        let (link, handle) = RefereeLink::new(port, &test_config()).unwrap();

        assert!(handle.push_delete(DeleteOp::all()));
        tokio::spawn(link.run());

        tokio::time::sleep(Duration::from_millis(300)).await;

        let sent = script.sent_frames();
        assert!(!sent.is_empty());
        let first = &sent[0];
        assert_eq!(
            u16::from_le_bytes([first[7], first[8]]),
            SUB_CMD_UI_DELETE,
            "the pending deletion outranks refresh graphics"
        );
    }

    #[tokio::test]
    async fn test_handle_views_carry_status() {
        let port = MockPort::new(vec![Capture::Bytes(game_status_frame())]);
        let (link, mut handle) = RefereeLink::new(port, &test_config()).unwrap();
        tokio::spawn(link.run());
        assert!(handle.changed().await);

        match handle.view_for(ConsumerKind::Chassis) {
            ConsumerView::Chassis(view) => assert_eq!(view.status, LinkStatus::Running),
            other => panic!("expected chassis view, got {:?}", other),
        }
    }
}
