use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cloudscribe::backend::Status;
use cloudscribe::speech::{SpeechRecognitionAlternative, SpeechRecognitionResult};
use cloudscribe::{
    Error, OperationProgress, OperationSnapshot, OperationState, Opts, PollOpts,
    RecognitionBackend, RecognitionRequest, RecognitionResponse, cloudscribe::run,
};

/// Deterministic in-memory backend: reports "running" a fixed number of times, then resolves.
struct MockService {
    outcome: OperationState,
    running_polls: usize,
    polls: Cell<usize>,
    requests: RefCell<Vec<RecognitionRequest>>,
}

impl MockService {
    fn resolving_to(response: RecognitionResponse) -> Self {
        Self {
            outcome: OperationState::Succeeded(response),
            running_polls: 2,
            polls: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn failing_with(code: i32, message: &str) -> Self {
        Self {
            outcome: OperationState::Failed(Status {
                code,
                message: message.to_owned(),
            }),
            running_polls: 1,
            polls: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn snapshot(&self, state: OperationState) -> OperationSnapshot {
        OperationSnapshot {
            name: "mock-op".to_owned(),
            progress: OperationProgress::default(),
            state,
        }
    }
}

impl RecognitionBackend for MockService {
    fn start_recognition(
        &self,
        request: &RecognitionRequest,
    ) -> cloudscribe::Result<OperationSnapshot> {
        self.requests.borrow_mut().push(request.clone());
        Ok(self.snapshot(OperationState::Running))
    }

    fn poll_operation(&self, name: &str) -> cloudscribe::Result<OperationSnapshot> {
        assert_eq!(name, "mock-op");
        let n = self.polls.get() + 1;
        self.polls.set(n);
        if n <= self.running_polls {
            Ok(self.snapshot(OperationState::Running))
        } else {
            Ok(self.snapshot(self.outcome.clone()))
        }
    }
}

fn hello_world() -> RecognitionResponse {
    RecognitionResponse {
        results: vec![SpeechRecognitionResult {
            alternatives: vec![SpeechRecognitionAlternative {
                transcript: "hello world".to_owned(),
                confidence: 0.95,
                words: Vec::new(),
            }],
            ..Default::default()
        }],
        total_billed_time: None,
    }
}

fn fast_opts() -> Opts {
    Opts {
        poll: PollOpts {
            interval: Duration::ZERO,
            timeout: None,
        },
        ..Opts::default()
    }
}

/// A 44-byte canonical header (mono, 16-bit PCM) followed by `pcm_bytes` of samples.
fn write_wav(
    dir: &Path,
    sample_rate: u32,
    pcm_bytes: usize,
) -> anyhow::Result<(PathBuf, Vec<u8>)> {
    let data_len = pcm_bytes as u32;
    let mut bytes = Vec::with_capacity(44 + pcm_bytes);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    assert_eq!(bytes.len(), 44);
    bytes.extend((0..pcm_bytes).map(|i| (i * 7 % 251) as u8));

    let path = dir.join("clip.wav");
    std::fs::write(&path, &bytes)?;
    Ok((path, bytes))
}

fn run_to_string<B: RecognitionBackend>(
    path: Option<&Path>,
    opts: &Opts,
    backend: B,
) -> cloudscribe::Result<String> {
    let mut out = Vec::new();
    run(path, opts, |_| Ok(backend), &mut out)?;
    Ok(String::from_utf8(out).expect("report is UTF-8"))
}

fn without_timing(report: &str) -> Vec<&str> {
    report
        .lines()
        .filter(|line| !line.starts_with("Time duration"))
        .collect()
}

#[test]
fn transcribes_wav_with_mock_service() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (path, bytes) = write_wav(dir.path(), 16_000, 3200)?;
    let service = MockService::resolving_to(hello_world());

    let report = run_to_string(Some(path.as_path()), &fast_opts(), &service)?;

    assert!(report.contains("Sample Rate (Hz): 16000\n"));
    assert!(report.contains("\"hello world\" (confidence=0.95)\n"));
    assert!(report.starts_with(&format!("Audio file:  {}\n", path.display())));
    assert!(report.lines().last().unwrap_or_default().starts_with("Time duration :  "));

    let requests = service.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sample_rate_hertz, 16_000);
    assert_eq!(requests[0].language_code, "en-US");
    assert_eq!(requests[0].content, bytes);
    assert_eq!(service.polls.get(), 3);
    Ok(())
}

#[test]
fn missing_argument_skips_all_io() -> anyhow::Result<()> {
    let connected = Cell::new(false);
    let mut out = Vec::new();

    run(
        None,
        &fast_opts(),
        |_| -> cloudscribe::Result<MockService> {
            connected.set(true);
            Err(Error::Auth("should not connect".to_owned()))
        },
        &mut out,
    )?;

    assert_eq!(String::from_utf8(out)?, "No argument provided.\n");
    assert!(!connected.get());
    Ok(())
}

#[test]
fn zero_results_prints_headers_only() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (path, _) = write_wav(dir.path(), 8_000, 100)?;
    let service = MockService::resolving_to(RecognitionResponse::default());

    let report = run_to_string(Some(path.as_path()), &fast_opts(), &service)?;
    let lines = without_timing(&report);

    assert_eq!(
        lines,
        vec![
            format!("Audio file:  {}", path.display()).as_str(),
            "Sample Rate (Hz): 8000",
            "",
            "",
        ]
    );
    assert!(!report.contains("confidence="));
    Ok(())
}

#[test]
fn repeated_runs_print_identical_transcripts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (path, _) = write_wav(dir.path(), 44_100, 1000)?;

    let path = Some(path.as_path());
    let first = run_to_string(path, &fast_opts(), MockService::resolving_to(hello_world()))?;
    let second = run_to_string(path, &fast_opts(), MockService::resolving_to(hello_world()))?;

    assert_eq!(without_timing(&first), without_timing(&second));
    Ok(())
}

#[test]
fn service_failure_is_returned_after_headers() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (path, _) = write_wav(dir.path(), 16_000, 10)?;
    let service = MockService::failing_with(8, "Quota exceeded");

    let mut out = Vec::new();
    let err = run(Some(path.as_path()), &fast_opts(), |_| Ok(&service), &mut out).unwrap_err();

    assert!(matches!(err, Error::Service { code: 8, .. }));
    let printed = String::from_utf8(out)?;
    assert!(printed.contains("Sample Rate (Hz): 16000"));
    assert!(!printed.contains("Time duration"));
    Ok(())
}

#[test]
fn unreadable_file_fails_before_connecting() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("missing.wav");
    let connected = Cell::new(false);

    let mut out = Vec::new();
    let err = run(
        Some(path.as_path()),
        &fast_opts(),
        |_| -> cloudscribe::Result<MockService> {
            connected.set(true);
            Ok(MockService::resolving_to(hello_world()))
        },
        &mut out,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Io { .. }));
    assert!(!connected.get());
    Ok(())
}

#[test]
fn short_file_is_an_io_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("short.wav");
    std::fs::write(&path, b"RIFF\0\0\0\0WAVE")?;

    let service = MockService::resolving_to(hello_world());
    let err = run_to_string(Some(path.as_path()), &fast_opts(), service).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    Ok(())
}

#[test]
fn connect_failure_is_fatal() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (path, _) = write_wav(dir.path(), 16_000, 10)?;

    let mut out = Vec::new();
    let err = run(
        Some(path.as_path()),
        &fast_opts(),
        |opts| cloudscribe::GoogleSpeechClient::new(opts),
        &mut out,
    );
    // The default credentials file is not present in the test's working directory.
    assert!(matches!(err, Err(Error::Auth(_))));
    Ok(())
}

#[test]
fn strict_mode_rejects_non_wav_input() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "this is definitely not a wav file, just text")?;

    // Default mode trusts whatever sits at offset 24.
    let report = run_to_string(
        Some(path.as_path()),
        &fast_opts(),
        MockService::resolving_to(RecognitionResponse::default()),
    )?;
    assert!(report.contains("Sample Rate (Hz): "));

    let strict = Opts {
        validate_wav_header: true,
        ..fast_opts()
    };
    let err = run_to_string(
        Some(path.as_path()),
        &strict,
        MockService::resolving_to(RecognitionResponse::default()),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidWav(_)));
    Ok(())
}

#[test]
fn language_and_word_offsets_flow_into_request() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (path, _) = write_wav(dir.path(), 16_000, 10)?;
    let service = MockService::resolving_to(hello_world());
    let opts = Opts {
        language_code: "fr-FR".to_owned(),
        enable_word_time_offsets: true,
        ..fast_opts()
    };

    run_to_string(Some(path.as_path()), &opts, &service)?;

    let requests = service.requests.borrow();
    assert_eq!(requests[0].language_code, "fr-FR");
    assert!(requests[0].enable_word_time_offsets);
    Ok(())
}
