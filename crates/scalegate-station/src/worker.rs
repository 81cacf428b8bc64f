//! Weighing-station worker state machine.
//!
//! One worker drives one indicator from a dedicated OS thread. The
//! lifecycle is a tagged state enum plus a transition function; the run
//! loop is the single mutator of the tag:
//!
//! ```text
//! Initialize -> Connect -> Idle <-> Measure
//!                  ^         |
//!                  |         v (link lost anywhere)
//!                  +------ Recover
//! ```
//!
//! Idle polls the scale, mirrors the weight onto the display and watches
//! the RFID reader. A tagged card opens a weighing: the worker records the
//! card UID as the plate, emits [`StationEvent::rfid_tagged`] and walks the
//! announcement sequence in Measure, emitting
//! [`StationEvent::weighing_completed`] once the last announcement has
//! played out. Decode errors never change state; link loss always routes
//! through Recover.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use scalegate_proto::{CommandCode, RequestPacket, ResponsePacket, VoiceCode};

use crate::{
    event::{EventSink, StationEvent},
    link::{IndicatorLink, LinkError, PortOpener},
};

/// Announcements played for one completed weighing, in order.
const MEASURE_SEQUENCE: [VoiceCode; 3] =
    [VoiceCode::PleaseWait, VoiceCode::WeightComplete, VoiceCode::ThankYou];

/// Lifecycle states of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Log startup and fall through to Connect.
    Initialize,
    /// Open the serial port and reset its input buffer.
    Connect,
    /// Poll the scale and watch for cards.
    Idle,
    /// Drive the announcement sequence for a tagged card.
    Measure,
    /// Close the port, back off, reconnect.
    Recover,
}

/// Tunables for one worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Device address echoed into every request.
    pub device_id: u8,
    /// Pause between polls.
    pub polling_interval: Duration,
    /// Back-off before reopening a lost port.
    pub retry_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            polling_interval: Duration::from_millis(100),
            retry_interval: Duration::from_secs(10),
        }
    }
}

/// Cooperative stop signal shared between the worker thread and its owner.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the worker to stop at its next state evaluation.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether a stop has been requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of driving a single announcement.
enum DriveOutcome {
    Played,
    Stopped,
}

/// State machine driving one scale over one serial port.
pub struct WeighingWorker<O: PortOpener, S: EventSink> {
    opener: O,
    sink: S,
    config: WorkerConfig,
    stop: StopFlag,
    state: WorkerState,
    link: Option<O::Link>,
    last_weight: i32,
    last_plate: String,
}

impl<O: PortOpener, S: EventSink> WeighingWorker<O, S> {
    /// Create a worker; it owns its port once `run` reaches Connect.
    pub fn new(opener: O, sink: S, config: WorkerConfig) -> Self {
        Self {
            opener,
            sink,
            config,
            stop: StopFlag::new(),
            state: WorkerState::Initialize,
            link: None,
            last_weight: 0,
            last_plate: String::new(),
        }
    }

    /// Stop signal for this worker; clone it before moving the worker to
    /// its thread.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Current state tag.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Last weight observed on the scale.
    pub fn last_weight(&self) -> i32 {
        self.last_weight
    }

    /// Run until a stop is requested, then close the port.
    pub fn run(&mut self) {
        tracing::info!("weighing worker starting");
        while !self.stop.is_set() {
            self.tick();
        }
        self.link = None;
        tracing::info!("weighing worker stopped");
    }

    /// One iteration of the run loop: take a step and fold the outcome
    /// back into the state tag.
    pub fn tick(&mut self) {
        match self.step() {
            Ok(next) => self.state = next,
            Err(err) if err.is_timeout() => {
                tracing::warn!(state = ?self.state, "serial read timed out");
            },
            Err(err) => {
                tracing::warn!(%err, "serial link lost");
                self.state = WorkerState::Recover;
            },
        }
    }

    /// Advance the state machine by one transition.
    ///
    /// Timeouts bubble up without a state change; link loss is mapped to
    /// Recover by the caller.
    pub fn step(&mut self) -> Result<WorkerState, LinkError> {
        match self.state {
            WorkerState::Initialize => {
                tracing::info!("worker startup");
                Ok(WorkerState::Connect)
            },
            WorkerState::Connect => self.connect(),
            WorkerState::Idle => self.idle_tick(),
            WorkerState::Measure => self.measure(),
            WorkerState::Recover => self.recover(),
        }
    }

    fn connect(&mut self) -> Result<WorkerState, LinkError> {
        tracing::debug!("opening serial port");
        let mut link = self.opener.open()?;
        link.reset_input()?;
        self.link = Some(link);
        tracing::info!("serial port connected");
        Ok(WorkerState::Idle)
    }

    fn idle_tick(&mut self) -> Result<WorkerState, LinkError> {
        // Echo the last weight with a blank plate; the display keeps
        // showing whatever the scale last reported.
        self.send_display("", false, VoiceCode::None)?;

        if let Some(response) = self.read_decoded()? {
            if response.current_weight != self.last_weight {
                tracing::info!(weight = response.current_weight, "scale weight changed");
                self.last_weight = response.current_weight;
            }

            if response.has_rfid_card() {
                tracing::info!(uid = %response.rfid_card_uid, "card tagged");
                self.last_plate = response.rfid_card_uid.clone();
                self.sink.emit(StationEvent::rfid_tagged(response.rfid_card_uid));
                self.pause(self.config.polling_interval);
                return Ok(WorkerState::Measure);
            }
        }

        self.pause(self.config.polling_interval);
        Ok(WorkerState::Idle)
    }

    fn measure(&mut self) -> Result<WorkerState, LinkError> {
        for target in MEASURE_SEQUENCE {
            match self.drive_announcement(target)? {
                DriveOutcome::Played => {},
                DriveOutcome::Stopped => return Ok(WorkerState::Measure),
            }
        }

        self.sink.emit(StationEvent::weighing_completed(&self.last_plate, self.last_weight));
        tracing::info!(weight = self.last_weight, plate = %self.last_plate, "weighing completed");
        Ok(WorkerState::Idle)
    }

    /// Play one announcement to completion.
    ///
    /// The indicator reports the code currently on its speaker in every
    /// response. While it is silent we keep requesting the target code;
    /// once it starts speaking we request silence and wait for the
    /// falling edge. Advancing on the edge (not on bare silence) is what
    /// keeps a single announcement from being requested twice.
    fn drive_announcement(&mut self, target: VoiceCode) -> Result<DriveOutcome, LinkError> {
        let mut speaker_active = false;
        let mut heard = false;

        loop {
            if self.stop.is_set() {
                return Ok(DriveOutcome::Stopped);
            }

            let voice = if speaker_active { VoiceCode::None } else { target };
            let plate = self.last_plate.clone();
            self.send_display(&plate, true, voice)?;

            match self.read_decoded() {
                Ok(Some(response)) => {
                    speaker_active = !response.voice_code.is_silent();
                    if speaker_active {
                        heard = true;
                    } else if heard {
                        return Ok(DriveOutcome::Played);
                    }
                },
                Ok(None) => {},
                // A slow response must not abandon the sequence position.
                Err(err) if err.is_timeout() => {
                    tracing::warn!(?target, "serial read timed out mid-announcement");
                },
                Err(err) => return Err(err),
            }

            self.pause(self.config.polling_interval);
        }
    }

    fn recover(&mut self) -> Result<WorkerState, LinkError> {
        self.link = None;
        tracing::info!(retry_in = ?self.config.retry_interval, "serial recovery scheduled");
        self.pause(self.config.retry_interval);
        Ok(WorkerState::Connect)
    }

    fn send_display(
        &mut self,
        plate: &str,
        green_blink: bool,
        voice_code: VoiceCode,
    ) -> Result<(), LinkError> {
        let request = RequestPacket {
            device_id: self.config.device_id,
            command_code: CommandCode::Display,
            display_weight: self.last_weight,
            display_plate: plate.to_string(),
            green_blink,
            red_blink: false,
            voice_code,
        };
        self.link_mut()?.write_frame(&request.encode())
    }

    /// Read one frame and decode it. Undecodable frames are logged and
    /// reported as `None`; they never change state.
    fn read_decoded(&mut self) -> Result<Option<ResponsePacket>, LinkError> {
        let raw = self.link_mut()?.read_frame()?;
        match ResponsePacket::decode(&raw) {
            Ok(packet) => Ok(Some(packet)),
            Err(err) => {
                tracing::warn!(%err, frame_len = raw.len(), "discarding undecodable frame");
                Ok(None)
            },
        }
    }

    fn link_mut(&mut self) -> Result<&mut O::Link, LinkError> {
        self.link.as_mut().ok_or_else(|| LinkError::LinkLost("port not open".to_string()))
    }

    /// Sleep in short slices so a stop request is honored promptly even
    /// inside the recovery back-off.
    fn pause(&self, total: Duration) {
        let slice = Duration::from_millis(50);
        let mut remaining = total;
        while !remaining.is_zero() && !self.stop.is_set() {
            let nap = remaining.min(slice);
            std::thread::sleep(nap);
            remaining -= nap;
        }
    }
}
