//! Retroactive MIDI capture: always buffering, grab what was just played

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use cadenza_core::{Key, QuantizationSettings, TimedNote, clamp_bpm, detect_key, notes_to_beats, quantize};
use crossbeam_channel::{Sender, bounded};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::CaptureConfig;

/// Onsets considered by tempo detection (the most recent ones)
const TEMPO_WINDOW: usize = 32;
/// Loop candidates, in bars of 4/4
const LOOP_BARS: [u32; 4] = [1, 2, 4, 8];
/// Fraction of repeated onsets needed to call a loop
const LOOP_THRESHOLD: f64 = 0.6;
/// Onset match tolerance in beats (a 32nd note either side)
const LOOP_TOLERANCE: f64 = 0.125;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Nothing to capture")]
    NothingCaptured,
    #[error("Capture intake already running")]
    IntakeAlreadyRunning,
    #[error("Capture intake thread panicked")]
    IntakePanicked,
}

// ============================================================================
// Events and Clips
// ============================================================================

/// A raw channel-voice message stamped in seconds since the buffer started
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapturedEvent {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
    pub timestamp: f64,
}

impl CapturedEvent {
    pub fn note_on(channel: u8, pitch: u8, velocity: u8, timestamp: f64) -> Self {
        Self {
            status: 0x90 | (channel & 0x0F),
            data1: pitch & 0x7F,
            data2: velocity & 0x7F,
            timestamp,
        }
    }

    pub fn note_off(channel: u8, pitch: u8, timestamp: f64) -> Self {
        Self {
            status: 0x80 | (channel & 0x0F),
            data1: pitch & 0x7F,
            data2: 0,
            timestamp,
        }
    }

    pub fn control_change(channel: u8, controller: u8, value: u8, timestamp: f64) -> Self {
        Self {
            status: 0xB0 | (channel & 0x0F),
            data1: controller & 0x7F,
            data2: value & 0x7F,
            timestamp,
        }
    }

    pub fn is_note_on(&self) -> bool {
        self.status & 0xF0 == 0x90 && self.data2 > 0
    }

    /// Note-off, or note-on with zero velocity
    pub fn is_note_off(&self) -> bool {
        self.status & 0xF0 == 0x80 || (self.status & 0xF0 == 0x90 && self.data2 == 0)
    }

    pub fn is_control_change(&self) -> bool {
        self.status & 0xF0 == 0xB0
    }

    /// Zero-based channel
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    pub fn pitch(&self) -> u8 {
        self.data1
    }

    pub fn velocity(&self) -> u8 {
        self.data2
    }
}

/// Loop detection outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopInfo {
    pub is_loop: bool,
    pub start_beat: f64,
    pub end_beat: f64,
    pub confidence: f64,
}

impl LoopInfo {
    pub fn bars(&self) -> u32 {
        ((self.end_beat - self.start_beat) / 4.0).round() as u32
    }
}

/// A captured stretch of performance with its analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedClip {
    pub id: String,
    pub name: String,
    pub events: Vec<CapturedEvent>,
    /// Paired notes in seconds from `start_time`
    pub notes: Vec<TimedNote>,
    pub start_time: f64,
    pub end_time: f64,
    pub tempo: f64,
    pub length_beats: f64,
    pub key: Key,
    pub looping: LoopInfo,
}

impl CapturedClip {
    pub fn duration_seconds(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Notes converted to beats at the clip's tempo
    pub fn notes_in_beats(&self) -> Vec<TimedNote> {
        notes_to_beats(&self.notes, self.tempo)
    }
}

/// A clip together with its quantized notes (in beats)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedCapture {
    pub clip: CapturedClip,
    pub notes: Vec<TimedNote>,
}

// ============================================================================
// Capture Buffer
// ============================================================================

/// Live capture buffer fed from a real-time thread
pub struct MidiCapture {
    buffer: Arc<Mutex<VecDeque<CapturedEvent>>>,
    enabled: Arc<AtomicBool>,
    tempo_bits: Arc<AtomicU64>,
    history: Mutex<Vec<CapturedClip>>,
    capture_count: AtomicUsize,
    retention_seconds: f64,
    channel_capacity: usize,
    intake_running: Arc<AtomicBool>,
}

/// Handle to a running intake thread
pub struct Intake {
    sender: Sender<CapturedEvent>,
    handle: JoinHandle<usize>,
}

impl Intake {
    /// A sender for the real-time producer
    pub fn sender(&self) -> Sender<CapturedEvent> {
        self.sender.clone()
    }

    /// Close this handle's sender and wait for the thread to drain.
    /// Returns the number of events taken in. Other senders must be dropped
    /// first or this blocks.
    pub fn finish(self) -> Result<usize, CaptureError> {
        drop(self.sender);
        self.handle.join().map_err(|_| CaptureError::IntakePanicked)
    }
}

impl MidiCapture {
    pub fn new(retention_seconds: f64, channel_capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::new())),
            enabled: Arc::new(AtomicBool::new(true)),
            tempo_bits: Arc::new(AtomicU64::new(120.0f64.to_bits())),
            history: Mutex::new(Vec::new()),
            capture_count: AtomicUsize::new(0),
            retention_seconds: retention_seconds.max(0.0),
            channel_capacity: channel_capacity.max(1),
            intake_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        let capture = Self::new(config.retention_seconds, config.channel_capacity);
        capture.set_tempo(config.tempo);
        capture
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "Capture toggled");
    }

    /// Host tempo, used when the performance has too few onsets to measure
    pub fn tempo(&self) -> f64 {
        f64::from_bits(self.tempo_bits.load(Ordering::Relaxed))
    }

    pub fn set_tempo(&self, bpm: f64) {
        self.tempo_bits.store(clamp_bpm(bpm).to_bits(), Ordering::Relaxed);
    }

    /// Append an event, dropping anything older than the retention window
    pub fn record(&self, event: CapturedEvent) {
        push_event(&self.buffer, &self.enabled, self.retention_seconds, event);
    }

    /// Start a thread that drains a bounded channel into the buffer
    pub fn spawn_intake(&self) -> Result<Intake, CaptureError> {
        if self.intake_running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::IntakeAlreadyRunning);
        }

        let (tx, rx) = bounded::<CapturedEvent>(self.channel_capacity);
        let buffer = self.buffer.clone();
        let enabled = self.enabled.clone();
        let running = self.intake_running.clone();
        let retention = self.retention_seconds;

        let handle = thread::spawn(move || {
            let mut received = 0;
            while let Ok(event) = rx.recv() {
                push_event(&buffer, &enabled, retention, event);
                received += 1;
            }
            running.store(false, Ordering::SeqCst);
            debug!(received, "Capture intake closed");
            received
        });

        info!(capacity = self.channel_capacity, "Capture intake started");
        Ok(Intake { sender: tx, handle })
    }

    /// Copy of the live buffer, taken under the lock
    pub fn snapshot(&self) -> Vec<CapturedEvent> {
        self.buffer
            .lock()
            .map(|buf| buf.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn event_count(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    pub fn has_content(&self) -> bool {
        self.event_count() > 0
    }

    /// Seconds between the oldest and newest buffered events
    pub fn buffer_duration(&self) -> f64 {
        self.buffer
            .lock()
            .ok()
            .and_then(|buf| Some(buf.back()?.timestamp - buf.front()?.timestamp))
            .unwrap_or(0.0)
    }

    /// Capture the whole buffer
    pub fn capture(&self) -> CapturedClip {
        let events = self.snapshot();
        self.finish_capture(events)
    }

    /// Capture events from the last `seconds`, measured back from the newest
    /// buffered event
    pub fn capture_last_seconds(&self, seconds: f64) -> CapturedClip {
        let mut events = self.snapshot();
        if let Some(last) = events.last().map(|e| e.timestamp) {
            let cutoff = last - seconds.max(0.0);
            events.retain(|e| e.timestamp >= cutoff);
        }
        self.finish_capture(events)
    }

    /// Capture the last `bars` bars of 4/4 at the host tempo
    pub fn capture_last_bars(&self, bars: u32) -> CapturedClip {
        self.capture_last_seconds(bars as f64 * 4.0 * 60.0 / self.tempo())
    }

    /// Capture the buffer and quantize its notes. The quantizer runs on the
    /// snapshot copy, after the buffer lock has been released.
    pub fn capture_and_quantize(&self, settings: &QuantizationSettings) -> Result<QuantizedCapture, CaptureError> {
        let clip = self.capture();
        if clip.notes.is_empty() {
            return Err(CaptureError::NothingCaptured);
        }
        let notes = quantize(&clip.notes_in_beats(), settings);
        Ok(QuantizedCapture { clip, notes })
    }

    pub fn history(&self) -> Vec<CapturedClip> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last_capture(&self) -> Option<CapturedClip> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }

    pub fn clear_history(&self) {
        if let Ok(mut h) = self.history.lock() {
            h.clear();
        }
    }

    /// Empty the live buffer
    pub fn reset(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
        info!("Capture buffer reset");
    }

    fn finish_capture(&self, events: Vec<CapturedEvent>) -> CapturedClip {
        let id = format!("capture_{}", self.capture_count.fetch_add(1, Ordering::SeqCst));
        let clip = build_clip(id, events, self.tempo());
        if !clip.is_empty() {
            if let Ok(mut h) = self.history.lock() {
                h.push(clip.clone());
            }
        }
        info!(
            events = clip.events.len(),
            notes = clip.notes.len(),
            tempo = clip.tempo,
            key = %clip.key,
            "Capture taken"
        );
        clip
    }
}

impl Default for MidiCapture {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

fn push_event(
    buffer: &Mutex<VecDeque<CapturedEvent>>,
    enabled: &AtomicBool,
    retention: f64,
    event: CapturedEvent,
) {
    if !enabled.load(Ordering::SeqCst) {
        return;
    }
    if let Ok(mut buf) = buffer.lock() {
        buf.push_back(event);
        let oldest = event.timestamp - retention;
        while buf.front().is_some_and(|e| e.timestamp < oldest) {
            buf.pop_front();
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

fn build_clip(id: String, events: Vec<CapturedEvent>, host_tempo: f64) -> CapturedClip {
    let (start_time, end_time) = match (events.first(), events.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => (0.0, 0.0),
    };
    let notes = pair_notes(&events, start_time, end_time);
    let onsets: Vec<f64> = events.iter().filter(|e| e.is_note_on()).map(|e| e.timestamp).collect();
    let tempo = detect_tempo(&onsets).unwrap_or_else(|| clamp_bpm(host_tempo));

    let onset_beats: Vec<f64> = onsets.iter().map(|t| (t - start_time) * tempo / 60.0).collect();
    let looping = detect_loop(&onset_beats);
    let pitches: Vec<u8> = notes.iter().map(|n| n.pitch).collect();

    let mut clip = CapturedClip {
        id,
        name: String::new(),
        notes,
        start_time,
        end_time,
        tempo,
        length_beats: (end_time - start_time) * tempo / 60.0,
        key: detect_key(&pitches),
        looping,
        events,
    };
    clip.name = clip_name(&clip);
    clip
}

/// Match each note-on with the next note-off on the same channel and pitch.
/// Notes still held at the end of the clip last until `end_time`.
pub fn pair_notes(events: &[CapturedEvent], start_time: f64, end_time: f64) -> Vec<TimedNote> {
    let mut held: BTreeMap<(u8, u8), Vec<usize>> = BTreeMap::new();
    let mut notes: Vec<TimedNote> = Vec::new();

    for event in events {
        let key = (event.channel(), event.pitch());
        if event.is_note_on() {
            held.entry(key).or_default().push(notes.len());
            let note = TimedNote::new(event.pitch(), event.velocity(), event.timestamp - start_time, 0.0)
                .with_channel(event.channel());
            notes.push(note);
        } else if event.is_note_off() {
            let matched = held.get_mut(&key).filter(|stack| !stack.is_empty()).map(|stack| stack.remove(0));
            if let Some(idx) = matched {
                notes[idx].duration = event.timestamp - start_time - notes[idx].start;
            }
        }
    }

    for idx in held.into_values().flatten() {
        notes[idx].duration = end_time - start_time - notes[idx].start;
    }
    notes
}

/// Tempo from note-on inter-onset intervals.
///
/// The most recent onsets' intervals between 0.1 s and 2 s are binned to
/// 10 ms. The mean interval of the most common bin is read as a quarter
/// note, folded into 60-180 BPM. Fewer than four onsets or no usable
/// interval gives `None`.
pub fn detect_tempo(onsets: &[f64]) -> Option<f64> {
    if onsets.len() < 4 {
        return None;
    }
    let recent = &onsets[onsets.len().saturating_sub(TEMPO_WINDOW)..];

    // bin -> (interval sum, count)
    let mut bins: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for pair in recent.windows(2) {
        let interval = pair[1] - pair[0];
        if interval > 0.1 && interval < 2.0 {
            let bin = bins.entry((interval * 100.0).round() as i64).or_default();
            bin.0 += interval;
            bin.1 += 1;
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for &(sum, count) in bins.values() {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((sum, count));
        }
    }
    let (sum, count) = best?;

    let mut bpm = 60.0 / (sum / count as f64);
    while bpm < 60.0 {
        bpm *= 2.0;
    }
    while bpm > 180.0 {
        bpm /= 2.0;
    }
    Some(bpm)
}

/// Look for a 1, 2, 4 or 8 bar loop in onset positions (beats from the clip
/// start). A length qualifies once the performance spans one and a half
/// loops and more than 60 % of the onsets after the first loop repeat one
/// loop-length earlier. The shortest qualifying length wins.
pub fn detect_loop(onset_beats: &[f64]) -> LoopInfo {
    if onset_beats.len() < 4 {
        return LoopInfo::default();
    }
    let first = onset_beats.iter().copied().fold(f64::INFINITY, f64::min);
    let last = onset_beats.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = last - first;

    for bars in LOOP_BARS {
        let length = bars as f64 * 4.0;
        if span < length * 1.5 {
            continue;
        }
        let score = repetition_score(onset_beats, first, length);
        if score > LOOP_THRESHOLD {
            return LoopInfo {
                is_loop: true,
                start_beat: 0.0,
                end_beat: length,
                confidence: score,
            };
        }
    }
    LoopInfo::default()
}

fn repetition_score(onset_beats: &[f64], first: f64, length: f64) -> f64 {
    let later: Vec<f64> = onset_beats
        .iter()
        .map(|b| b - first)
        .filter(|&b| b >= length - LOOP_TOLERANCE)
        .collect();
    if later.is_empty() {
        return 0.0;
    }
    let matched = later
        .iter()
        .filter(|&&b| {
            onset_beats
                .iter()
                .any(|&other| ((other - first) - (b - length)).abs() < LOOP_TOLERANCE)
        })
        .count();
    matched as f64 / later.len() as f64
}

fn clip_name(clip: &CapturedClip) -> String {
    if clip.is_empty() {
        return "Empty Capture".to_string();
    }
    let mut name = String::from("Capture");
    if !clip.notes.is_empty() {
        name.push_str(&format!(" {} notes", clip.notes.len()));
    }
    if clip.looping.is_loop {
        name.push_str(&format!(" [{} bar loop]", clip.looping.bars()));
    }
    name.push_str(&format!(" @ {} BPM", clip.tempo as i32));
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::{PitchClass, Scale};

    /// Quarter notes at 120 BPM: an ascending C major line for `count` notes
    fn play(capture: &MidiCapture, count: usize) {
        const LINE: [u8; 8] = [60, 62, 64, 65, 67, 69, 71, 72];
        for i in 0..count {
            let t = i as f64 * 0.5;
            let pitch = LINE[i % LINE.len()];
            capture.record(CapturedEvent::note_on(0, pitch, 100, t));
            capture.record(CapturedEvent::note_off(0, pitch, t + 0.4));
        }
    }

    #[test]
    fn test_event_kinds() {
        let on = CapturedEvent::note_on(3, 60, 90, 0.0);
        assert!(on.is_note_on());
        assert_eq!(on.channel(), 3);
        assert!(CapturedEvent::note_off(0, 60, 1.0).is_note_off());
        assert!(CapturedEvent::note_on(0, 60, 0, 1.0).is_note_off());
        assert!(CapturedEvent::control_change(0, 1, 64, 0.0).is_control_change());
    }

    #[test]
    fn test_pairing() {
        let events = [
            CapturedEvent::note_on(0, 60, 100, 1.0),
            CapturedEvent::note_on(0, 64, 80, 1.5),
            CapturedEvent::note_off(0, 60, 2.0),
            CapturedEvent::note_on(1, 60, 70, 2.5),
            CapturedEvent::note_on(0, 64, 0, 3.0),
        ];
        let notes = pair_notes(&events, 1.0, 4.0);
        assert_eq!(notes.len(), 3);
        assert_eq!((notes[0].start, notes[0].duration), (0.0, 1.0));
        assert_eq!((notes[1].start, notes[1].duration), (0.5, 1.5));
        // Still held on channel 1: runs to the end
        assert_eq!((notes[2].start, notes[2].duration, notes[2].channel), (1.5, 1.5, 1));
    }

    #[test]
    fn test_tempo_detection() {
        let onsets: Vec<f64> = (0..8).map(|i| i as f64 * 0.5).collect();
        assert_eq!(detect_tempo(&onsets), Some(120.0));
        let sixteenths: Vec<f64> = (0..16).map(|i| i as f64 * 0.125).collect();
        // 480 BPM worth of onsets folds down into range
        assert_eq!(detect_tempo(&sixteenths), Some(120.0));
        let slow: Vec<f64> = (0..6).map(|i| i as f64 * 1.25).collect();
        assert_eq!(detect_tempo(&slow), Some(96.0));
        assert_eq!(detect_tempo(&[0.0, 0.5, 1.0]), None);
        assert_eq!(detect_tempo(&[0.0, 5.0, 10.0, 15.0]), None);

        // Dotted sixteenths at 160 BPM sit between two 10 ms bins
        let dotted: Vec<f64> = (0..8).map(|i| i as f64 * 0.1875).collect();
        assert!((detect_tempo(&dotted).unwrap() - 160.0).abs() < 1e-9);
        let jittered = [0.0, 0.498, 1.0, 1.502, 2.0, 2.497, 3.0, 3.5];
        assert!((detect_tempo(&jittered).unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_loop_detection() {
        let steady: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let info = detect_loop(&steady);
        assert!(info.is_loop);
        assert_eq!(info.bars(), 1);
        assert_eq!(info.confidence, 1.0);

        let loose = [0.0, 0.6, 1.9, 3.1, 4.45, 5.8, 7.3];
        assert!(!detect_loop(&loose).is_loop);
        assert!(!detect_loop(&[0.0, 1.0, 2.0]).is_loop);
    }

    #[test]
    fn test_capture_clip() {
        let capture = MidiCapture::new(120.0, 16);
        play(&capture, 16);
        let clip = capture.capture();
        assert_eq!(clip.id, "capture_0");
        assert_eq!(clip.notes.len(), 16);
        assert_eq!(clip.tempo, 120.0);
        assert_eq!(clip.key, Key::new(PitchClass::C, Scale::Major));
        assert!((clip.length_beats - 15.8).abs() < 1e-9);
        assert!(clip.name.starts_with("Capture 16 notes"));
        assert!(clip.name.ends_with("@ 120 BPM"));
        assert_eq!(capture.history().len(), 1);
        // Capturing does not consume the buffer
        assert_eq!(capture.event_count(), 32);
    }

    #[test]
    fn test_loop_named_in_clip() {
        let capture = MidiCapture::default();
        for i in 0..16 {
            let t = i as f64 * 0.5;
            let pitch = [60, 64, 67, 72][i % 4];
            capture.record(CapturedEvent::note_on(0, pitch, 100, t));
            capture.record(CapturedEvent::note_off(0, pitch, t + 0.25));
        }
        let clip = capture.capture();
        assert!(clip.looping.is_loop);
        assert!(clip.name.contains("[1 bar loop]"));
    }

    #[test]
    fn test_retention_window() {
        let capture = MidiCapture::new(2.0, 16);
        play(&capture, 16);
        let events = capture.snapshot();
        let last = events.last().map(|e| e.timestamp).unwrap_or_default();
        assert!(events.iter().all(|e| e.timestamp >= last - 2.0));
        assert!(capture.buffer_duration() <= 2.0);
    }

    #[test]
    fn test_capture_last_seconds_and_bars() {
        let capture = MidiCapture::default();
        play(&capture, 16);
        // Newest event is at 7.9 s; one bar at 120 BPM is 2 s
        let clip = capture.capture_last_bars(1);
        assert!(clip.events.iter().all(|e| e.timestamp > 5.8));
        assert_eq!(clip.events.iter().filter(|e| e.is_note_on()).count(), 4);
        assert_eq!(clip.notes.len(), 4);
        assert_eq!(capture.capture_last_seconds(0.0).events.len(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let capture = MidiCapture::default();
        play(&capture, 2);
        let snap = capture.snapshot();
        capture.record(CapturedEvent::note_on(0, 70, 100, 2.0));
        assert_eq!(snap.len(), 4);
        assert_eq!(capture.event_count(), 5);
    }

    #[test]
    fn test_disabled_drops_events_and_reset_clears() {
        let capture = MidiCapture::default();
        capture.set_enabled(false);
        play(&capture, 4);
        assert!(!capture.has_content());
        capture.set_enabled(true);
        play(&capture, 4);
        assert!(capture.has_content());
        capture.reset();
        assert!(!capture.has_content());
        let clip = capture.capture();
        assert_eq!(clip.name, "Empty Capture");
        assert!(capture.history().is_empty());
    }

    #[test]
    fn test_intake_thread() {
        let capture = MidiCapture::new(120.0, 4);
        let intake = capture.spawn_intake().unwrap();
        assert!(matches!(capture.spawn_intake(), Err(CaptureError::IntakeAlreadyRunning)));

        let tx = intake.sender();
        let producer = thread::spawn(move || {
            for i in 0..10 {
                let t = i as f64 * 0.5;
                tx.send(CapturedEvent::note_on(0, 60, 100, t)).unwrap();
                tx.send(CapturedEvent::note_off(0, 60, t + 0.25)).unwrap();
            }
        });
        producer.join().unwrap();
        assert_eq!(intake.finish().unwrap(), 20);
        assert_eq!(capture.event_count(), 20);
        assert!(capture.spawn_intake().is_ok());
    }

    #[test]
    fn test_capture_and_quantize() {
        let capture = MidiCapture::default();
        assert!(matches!(
            capture.capture_and_quantize(&QuantizationSettings::default()),
            Err(CaptureError::NothingCaptured)
        ));

        // Quarter notes at 120 BPM, all but the first slightly late
        for i in 0..8 {
            let t = i as f64 * 0.5 + if i > 0 { 0.02 } else { 0.0 };
            capture.record(CapturedEvent::note_on(0, 60, 100, t));
            capture.record(CapturedEvent::note_off(0, 60, t + 0.2));
        }
        let result = capture.capture_and_quantize(&QuantizationSettings::default()).unwrap();
        assert_eq!(result.notes.len(), 8);
        for (i, note) in result.notes.iter().enumerate() {
            assert!((note.start - i as f64).abs() < 1e-9);
        }
        // The clip keeps the raw timing
        assert!((result.clip.notes[1].start - 0.52).abs() < 1e-9);
    }
}
