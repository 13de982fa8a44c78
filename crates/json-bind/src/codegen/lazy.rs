//! Forward references for types whose codec is still being built.
//!
//! A structural analyzer publishes a [`PlaceholderCodec`] for its type
//! before resolving member types, so a member typed with the enclosing
//! type (directly or through a cycle) resolves to the placeholder instead
//! of recursing forever. Once the real codec exists the placeholder
//! forwards to it; callers arriving earlier wait for it, up to a timeout.
//!
//! An abandoned placeholder can still be held by codecs built during the
//! failed analysis. When used, it resolves its type again through the
//! engine and forwards to whatever that produces.

use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use json_bind_buffers::{Reader, Writer};
use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex};

use super::{Codec, CodecRef, FormatDescription};
use crate::error::{ConfigurationError, Error, Result};
use crate::json_bind::JsonBind;
use crate::type_def::TypeDescriptor;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotState {
    Pending,
    Resolved,
    Abandoned(String),
}

pub struct PlaceholderCodec {
    manifest: TypeDescriptor,
    resolved: OnceLock<CodecRef>,
    state: Mutex<SlotState>,
    ready: Condvar,
    /// Thread running the analysis; it can never wait on itself.
    owner: ThreadId,
    timeout: Duration,
    json: Weak<JsonBind>,
}

impl PlaceholderCodec {
    pub fn new(manifest: TypeDescriptor, timeout: Duration, json: Weak<JsonBind>) -> Arc<Self> {
        Arc::new(Self {
            manifest,
            resolved: OnceLock::new(),
            state: Mutex::new(SlotState::Pending),
            ready: Condvar::new(),
            owner: thread::current().id(),
            timeout,
            json,
        })
    }

    /// Fills the slot and wakes every waiter. Later calls are ignored.
    pub fn resolve(&self, codec: CodecRef) {
        if self.resolved.set(codec).is_err() {
            return;
        }
        let mut state = self.state.lock();
        *state = SlotState::Resolved;
        self.ready.notify_all();
        trace!("placeholder for {} resolved", self.manifest);
    }

    /// Marks the slot as never to be filled, failing current and future
    /// waiters.
    pub fn abandon(&self, reason: String) {
        let mut state = self.state.lock();
        if *state == SlotState::Pending {
            warn!("placeholder for {} abandoned: {}", self.manifest, reason);
            *state = SlotState::Abandoned(reason);
            self.ready.notify_all();
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    fn target(&self) -> Result<&CodecRef> {
        if let Some(codec) = self.resolved.get() {
            return Ok(codec);
        }
        let type_name = || self.manifest.to_string();
        let deadline = Instant::now() + self.timeout;
        let mut state = self.state.lock();
        loop {
            match &*state {
                SlotState::Resolved => break,
                SlotState::Abandoned(reason) => {
                    let reason = reason.clone();
                    drop(state);
                    return self.recover(reason);
                }
                SlotState::Pending if thread::current().id() == self.owner => {
                    return Err(ConfigurationError::ReentrantPlaceholder {
                        type_name: type_name(),
                    }
                    .into())
                }
                SlotState::Pending => {}
            }
            if self.ready.wait_until(&mut state, deadline).timed_out()
                && *state == SlotState::Pending
            {
                warn!(
                    "gave up waiting for codec of {} after {:?}",
                    self.manifest, self.timeout
                );
                return Err(ConfigurationError::PlaceholderTimeout {
                    type_name: type_name(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }
                .into());
            }
        }
        drop(state);
        self.resolved.get().ok_or_else(|| {
            ConfigurationError::NoCodecFound {
                type_name: type_name(),
            }
            .into()
        })
    }

    /// Re-resolves the type of an abandoned placeholder and forwards to
    /// the result from then on.
    fn recover(&self, reason: String) -> Result<&CodecRef> {
        let abandoned = |reason: String| -> Error {
            ConfigurationError::PlaceholderAbandoned {
                type_name: self.manifest.to_string(),
                reason,
            }
            .into()
        };
        let Some(json) = self.json.upgrade() else {
            return Err(abandoned(reason));
        };
        let codec = json
            .resolve(&self.manifest)
            .map_err(|err| abandoned(err.to_string()))?;
        if std::ptr::addr_eq(Arc::as_ptr(&codec), self as *const Self) {
            return Err(abandoned(reason));
        }
        debug!("placeholder for {} recovered after failed analysis", self.manifest);
        let _ = self.resolved.set(codec);
        {
            let mut state = self.state.lock();
            *state = SlotState::Resolved;
            self.ready.notify_all();
        }
        self.resolved.get().ok_or_else(|| abandoned(reason))
    }
}

impl Codec for PlaceholderCodec {
    fn manifest(&self) -> &TypeDescriptor {
        &self.manifest
    }

    fn encode(&self, writer: &mut Writer, value: &Value) -> Result<()> {
        self.target()?.encode(writer, value)
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value> {
        self.target()?.decode(reader)
    }

    fn bind(&self, reader: &mut Reader<'_>, instance: &mut Value) -> Result<()> {
        self.target()?.bind(reader, instance)
    }

    fn is_pending(&self) -> bool {
        !self.is_resolved()
    }

    fn ensure_ready(&self) -> Result<()> {
        self.target()?.ensure_ready()
    }

    fn formats(&self) -> Option<&FormatDescription> {
        self.resolved.get().and_then(|codec| codec.formats())
    }
}
