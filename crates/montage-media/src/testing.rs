//! In-memory engine double for tests.
//!
//! `RecordingEngine` keeps artifacts in a map, journals every call, and can be
//! scripted to fail at a chosen step. Trims copy the input bytes; concats join
//! the bytes of the files listed in the manifest, so the final artifact shows
//! exactly which parts were joined and in what order.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::engine::{check_artifact_name, parse_manifest, EncodeEngine, EngineLoader, EngineOp};
use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressSink;

/// One call made into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Ingest(String),
    Execute(EngineOp),
    Read(String),
    Delete(String),
}

/// Where a scripted engine should fail.
#[derive(Debug, Clone, PartialEq)]
pub enum FailPoint {
    /// Ingesting the named artifact.
    Ingest(String),
    /// Any trim operation.
    Trim,
    /// The concat operation.
    Concat,
    /// Reading the output back.
    Read,
}

/// Behaviour of a [`RecordingEngine`].
#[derive(Debug, Clone, Default)]
pub struct EngineScript {
    /// Step at which to fail.
    pub fail_on: Option<FailPoint>,
    /// Make every delete fail.
    pub fail_deletes: bool,
    /// Raw progress values reported during each operation.
    pub progress_values: Vec<f64>,
    /// If set, concat waits for a notification before running.
    pub hold_before_concat: Option<Arc<Notify>>,
}

/// Artifacts and call journal shared with the test.
#[derive(Debug, Default)]
pub struct EngineState {
    pub files: BTreeMap<String, Vec<u8>>,
    pub calls: Vec<EngineCall>,
}

impl EngineState {
    /// Operations executed, in order.
    pub fn ops(&self) -> Vec<EngineOp> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Execute(op) => Some(op.clone()),
                _ => None,
            })
            .collect()
    }

    /// Artifacts deleted, in order.
    pub fn deleted(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Delete(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Scripted in-memory engine.
pub struct RecordingEngine {
    script: EngineScript,
    state: Arc<Mutex<EngineState>>,
    progress: Option<ProgressSink>,
}

impl RecordingEngine {
    /// Create an engine and a handle to its state.
    pub fn new(script: EngineScript) -> (Self, Arc<Mutex<EngineState>>) {
        let state = Arc::new(Mutex::new(EngineState::default()));
        let engine = Self {
            script,
            state: Arc::clone(&state),
            progress: None,
        };
        (engine, state)
    }

    fn record(&self, call: EngineCall) {
        self.state.lock().calls.push(call);
    }

    fn report_progress(&self) {
        if let Some(sink) = &self.progress {
            for value in &self.script.progress_values {
                sink.report(*value);
            }
        }
    }

    fn fails_at(&self, point: &FailPoint) -> bool {
        self.script.fail_on.as_ref() == Some(point)
    }

    fn input(&self, name: &str, op: &EngineOp) -> EngineResult<Vec<u8>> {
        self.state
            .lock()
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Execute {
                op: op.label().into(),
                reason: format!("{name} does not exist"),
            })
    }
}

impl EncodeEngine for RecordingEngine {
    async fn ingest(&mut self, name: &str, bytes: Vec<u8>) -> EngineResult<()> {
        self.record(EngineCall::Ingest(name.to_string()));
        check_artifact_name(name)?;
        if self.fails_at(&FailPoint::Ingest(name.to_string())) {
            return Err(EngineError::Ingest {
                name: name.to_string(),
                reason: "scripted failure".into(),
            });
        }
        self.state.lock().files.insert(name.to_string(), bytes);
        Ok(())
    }

    async fn execute(&mut self, op: &EngineOp) -> EngineResult<()> {
        self.record(EngineCall::Execute(op.clone()));
        let output = match op {
            EngineOp::Trim { input, .. } => {
                if self.fails_at(&FailPoint::Trim) {
                    return Err(EngineError::Execute {
                        op: op.label().into(),
                        reason: "scripted failure".into(),
                    });
                }
                self.input(input, op)?
            }
            EngineOp::Concat { manifest, .. } => {
                if let Some(hold) = &self.script.hold_before_concat {
                    hold.notified().await;
                }
                if self.fails_at(&FailPoint::Concat) {
                    return Err(EngineError::Execute {
                        op: op.label().into(),
                        reason: "scripted failure".into(),
                    });
                }
                let listing = String::from_utf8_lossy(&self.input(manifest, op)?).into_owned();
                let mut joined = Vec::new();
                for part in parse_manifest(&listing) {
                    joined.extend(self.input(&part, op)?);
                }
                joined
            }
        };
        self.report_progress();
        self.state.lock().files.insert(op.output().to_string(), output);
        Ok(())
    }

    async fn read_artifact(&mut self, name: &str) -> EngineResult<Vec<u8>> {
        self.record(EngineCall::Read(name.to_string()));
        if self.fails_at(&FailPoint::Read) {
            return Err(EngineError::Read {
                name: name.to_string(),
                reason: "scripted failure".into(),
            });
        }
        self.state
            .lock()
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Read {
                name: name.to_string(),
                reason: "no such artifact".into(),
            })
    }

    async fn delete_artifact(&mut self, name: &str) -> EngineResult<()> {
        self.record(EngineCall::Delete(name.to_string()));
        if self.script.fail_deletes {
            return Err(EngineError::Delete {
                name: name.to_string(),
                reason: "scripted failure".into(),
            });
        }
        self.state.lock().files.remove(name);
        Ok(())
    }
}

/// Loader producing [`RecordingEngine`]s that share one state.
#[derive(Clone)]
pub struct RecordingLoader {
    script: EngineScript,
    state: Arc<Mutex<EngineState>>,
    loads: Arc<AtomicUsize>,
}

impl RecordingLoader {
    /// Create a loader; every engine it creates follows `script`.
    pub fn new(script: EngineScript) -> Self {
        Self {
            script,
            state: Arc::new(Mutex::new(EngineState::default())),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// State shared by every engine this loader creates.
    pub fn state(&self) -> Arc<Mutex<EngineState>> {
        Arc::clone(&self.state)
    }

    /// How many engines were created.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl EngineLoader for RecordingLoader {
    type Engine = RecordingEngine;

    async fn load(&self, progress: ProgressSink) -> EngineResult<RecordingEngine> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(RecordingEngine {
            script: self.script.clone(),
            state: Arc::clone(&self.state),
            progress: Some(progress),
        })
    }
}
