use dashmap::DashMap;

use super::CodecRef;
use crate::type_def::TypeDescriptor;

/// Process-wide codec cache keyed by descriptor.
///
/// Registration is last-write-wins with no lock spanning a resolution; a
/// published codec is only ever replaced whole.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: DashMap<TypeDescriptor, CodecRef>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `codec` for `manifest`, or removes the entry for `None`.
    /// Returns the previous entry.
    pub fn register(&self, manifest: TypeDescriptor, codec: Option<CodecRef>) -> Option<CodecRef> {
        match codec {
            Some(codec) => self.codecs.insert(manifest, codec),
            None => self.codecs.remove(&manifest).map(|(_, codec)| codec),
        }
    }

    pub fn lookup(&self, manifest: &TypeDescriptor) -> Option<CodecRef> {
        self.codecs.get(manifest).map(|entry| entry.value().clone())
    }
}
