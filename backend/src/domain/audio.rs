//! Voice notes attached to reports.
//!
//! Recorded audio is kept inline on the report as a `data:` URI. Capture
//! hardware is behind [`AudioCapture`] so the recording flow can run without a
//! microphone.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use shared::ReportDraft;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use super::form_session::FormSession;

pub const DEFAULT_AUDIO_MIME: &str = "audio/webm";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("could not access microphone: {0}")]
    DeviceUnavailable(String),
    #[error("no recording in progress")]
    NotRecording,
    #[error("recording failed: {0}")]
    Failed(String),
}

/// A `data:<mime>;base64,<payload>` voice note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioNote(String);

impl AudioNote {
    /// Assemble captured chunks, in order, into one note
    pub fn from_chunks<B: AsRef<[u8]>>(mime: &str, chunks: &[B]) -> Self {
        let bytes: Vec<u8> = chunks.iter().flat_map(|c| c.as_ref().iter().copied()).collect();
        Self(format!("data:{};base64,{}", mime, B64.encode(bytes)))
    }

    /// Accept an existing data URI if it is well formed
    pub fn parse(uri: &str) -> Option<Self> {
        let (header, payload) = uri.strip_prefix("data:")?.split_once(',')?;
        header.strip_suffix(";base64")?;
        B64.decode(payload).ok()?;
        Some(Self(uri.to_string()))
    }

    pub fn mime(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or("")
    }

    pub fn decode(&self) -> Option<Vec<u8>> {
        let (_, payload) = self.0.split_once(',')?;
        B64.decode(payload).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AudioNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Microphone access
#[async_trait]
pub trait AudioCapture: Send {
    async fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop recording and hand back what was captured
    async fn stop(&mut self) -> Result<AudioNote, CaptureError>;
}

/// Drives an [`AudioCapture`] on behalf of a report form
pub struct VoiceRecorder<C: AudioCapture> {
    capture: C,
    recording: bool,
}

impl<C: AudioCapture> VoiceRecorder<C> {
    pub fn new(capture: C) -> Self {
        Self {
            capture,
            recording: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if let Err(e) = self.capture.start().await {
            warn!("Could not start recording: {}", e);
            return Err(e);
        }
        self.recording = true;
        Ok(())
    }

    /// Stop recording and attach the note to the form
    pub async fn stop_into(&mut self, session: &mut FormSession<ReportDraft>) -> Result<(), CaptureError> {
        if !self.recording {
            return Err(CaptureError::NotRecording);
        }
        self.recording = false;

        let note = self.capture.stop().await?;
        info!("Recorded voice note ({})", note.mime());
        session.update(|draft| draft.audio_note = Some(note.into_string()));
        Ok(())
    }

    pub fn discard(session: &mut FormSession<ReportDraft>) {
        session.update(|draft| draft.audio_note = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::draft_autosave::{DraftAutosaver, DEFAULT_DEBOUNCE};
    use crate::storage::memory::MemoryStore;
    use crate::storage::repositories::DraftRepository;
    use crate::storage::traits::KeyValueStore;
    use std::sync::Arc;

    struct FakeCapture {
        available: bool,
        chunks: Vec<Vec<u8>>,
    }

    #[async_trait]
    impl AudioCapture for FakeCapture {
        async fn start(&mut self) -> Result<(), CaptureError> {
            if self.available {
                Ok(())
            } else {
                Err(CaptureError::DeviceUnavailable("permission denied".to_string()))
            }
        }

        async fn stop(&mut self) -> Result<AudioNote, CaptureError> {
            Ok(AudioNote::from_chunks(DEFAULT_AUDIO_MIME, &self.chunks))
        }
    }

    fn report_session() -> FormSession<ReportDraft> {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let drafts = DraftRepository::new(store);
        let autosaver = DraftAutosaver::new(drafts.clone(), DEFAULT_DEBOUNCE);
        FormSession::open_prefilled(drafts, autosaver, ReportDraft::default())
    }

    #[test]
    fn test_chunks_become_data_uri() {
        let note = AudioNote::from_chunks("audio/webm", &[b"he".to_vec(), b"llo".to_vec()]);
        assert_eq!(note.as_str(), "data:audio/webm;base64,aGVsbG8=");
        assert_eq!(note.mime(), "audio/webm");
        assert_eq!(note.decode().unwrap(), b"hello");
        assert_eq!(AudioNote::parse(note.as_str()), Some(note));
    }

    #[test]
    fn test_parse_rejects_malformed_uri() {
        assert!(AudioNote::parse("audio/webm;base64,aGVsbG8=").is_none());
        assert!(AudioNote::parse("data:audio/webm,plain").is_none());
        assert!(AudioNote::parse("data:audio/webm;base64,***").is_none());
    }

    #[tokio::test]
    async fn test_recording_attaches_note() {
        let mut session = report_session();
        let mut recorder = VoiceRecorder::new(FakeCapture {
            available: true,
            chunks: vec![vec![1, 2, 3]],
        });

        recorder.start().await.unwrap();
        assert!(recorder.is_recording());
        recorder.stop_into(&mut session).await.unwrap();

        assert_eq!(session.data().audio_note.as_deref(), Some("data:audio/webm;base64,AQID"));
        VoiceRecorder::<FakeCapture>::discard(&mut session);
        assert!(session.data().audio_note.is_none());
        session.close();
    }

    #[tokio::test]
    async fn test_unavailable_device_leaves_form_untouched() {
        let mut session = report_session();
        session.update(|d| d.description = Some("kept".to_string()));
        let mut recorder = VoiceRecorder::new(FakeCapture {
            available: false,
            chunks: Vec::new(),
        });

        assert!(matches!(
            recorder.start().await,
            Err(CaptureError::DeviceUnavailable(_))
        ));
        assert!(!recorder.is_recording());
        assert!(matches!(
            recorder.stop_into(&mut session).await,
            Err(CaptureError::NotRecording)
        ));
        assert_eq!(session.data().description.as_deref(), Some("kept"));
        assert!(session.data().audio_note.is_none());
        session.close();
    }
}
