//! The engine: declarations, the codec registry and the analyzer pipeline.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use json_bind_buffers::{Reader, Writer};
use log::debug;

use crate::codegen::any::AnyCodec;
use crate::codegen::containers::{collection, enums, map, optional};
use crate::codegen::primitives::{BoolCodec, BytesCodec, FloatCodec, IntCodec, StringCodec};
use crate::codegen::registry::CodecRegistry;
use crate::codegen::structural::{bean, builder, record};
use crate::codegen::{mixin, CodecRef};
use crate::error::{ConfigurationError, DecodeError, DecodeErrorKind, Result};
use crate::settings::Settings;
use crate::type_def::{TypeDeclaration, TypeDescriptor};
use crate::value::Value;

/// Builds a codec for the descriptors it recognizes, `None` otherwise.
pub type Analyzer =
    Arc<dyn Fn(&TypeDescriptor, &JsonBind) -> Result<Option<CodecRef>> + Send + Sync>;

/// Analyzers in resolution order: containers before structural shapes.
pub fn default_analyzers() -> Vec<Analyzer> {
    vec![
        Arc::new(collection::analyze) as Analyzer,
        Arc::new(map::analyze) as Analyzer,
        Arc::new(optional::analyze) as Analyzer,
        Arc::new(enums::analyze) as Analyzer,
        Arc::new(bean::analyze) as Analyzer,
        Arc::new(record::analyze) as Analyzer,
        Arc::new(builder::analyze) as Analyzer,
        Arc::new(mixin::analyze) as Analyzer,
    ]
}

/// Codec factory and cache.
///
/// ```
/// use json_bind::{JsonBind, Member, Object, Settings, TypeDeclaration, TypeDescriptor, Value};
///
/// let json = JsonBind::new(Settings::default());
/// let pair = json.declare(TypeDeclaration::record(
///     "Pair",
///     vec![
///         Member::new("x", TypeDescriptor::int()),
///         Member::new("y", TypeDescriptor::int()),
///     ],
/// ));
/// let value: Value = Object::new(pair.clone()).with("x", 1).with("y", 2).into();
/// assert_eq!(json.to_vec(&pair, &value).unwrap(), br#"{"x":1,"y":2}"#);
/// assert_eq!(json.from_slice(&pair, br#"{"y":2,"x":1}"#).unwrap(), value);
/// ```
pub struct JsonBind {
    settings: Settings,
    registry: CodecRegistry,
    declarations: DashMap<Arc<str>, Arc<TypeDeclaration>>,
    analyzers: Vec<Analyzer>,
    handle: Weak<JsonBind>,
}

impl JsonBind {
    pub fn new(settings: Settings) -> Arc<Self> {
        Self::with_analyzers(settings, default_analyzers())
    }

    /// Engine with a custom analyzer list. Scalar and `any` codecs are
    /// always registered.
    pub fn with_analyzers(settings: Settings, analyzers: Vec<Analyzer>) -> Arc<Self> {
        let json = Arc::new_cyclic(|handle| JsonBind {
            settings,
            registry: CodecRegistry::new(),
            declarations: DashMap::new(),
            analyzers,
            handle: handle.clone(),
        });
        json.register_builtins();
        json
    }

    fn register_builtins(&self) {
        let builtins: [CodecRef; 6] = [
            Arc::new(BoolCodec::new()),
            Arc::new(IntCodec::new()),
            Arc::new(FloatCodec::new()),
            Arc::new(StringCodec::new()),
            Arc::new(BytesCodec::new()),
            Arc::new(AnyCodec::new(self.handle.clone())),
        ];
        for codec in builtins {
            self.registry.register(codec.manifest().clone(), Some(codec));
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Weak handle for codecs that look up other codecs while encoding.
    pub fn handle(&self) -> Weak<JsonBind> {
        self.handle.clone()
    }

    /// Makes a declaration available to the analyzers and returns the
    /// descriptor of the declared type. Redeclaring a name replaces the
    /// declaration but not codecs already built from it.
    pub fn declare(&self, declaration: TypeDeclaration) -> TypeDescriptor {
        let descriptor = declaration.descriptor();
        self.declarations
            .insert(Arc::from(declaration.name.as_str()), Arc::new(declaration));
        descriptor
    }

    /// Declaration behind a named descriptor.
    pub fn declaration(&self, manifest: &TypeDescriptor) -> Option<Arc<TypeDeclaration>> {
        let name = manifest.name()?;
        self.declarations.get(name).map(|d| d.value().clone())
    }

    /// Publishes a codec, bypassing the analyzers for `manifest`. `None`
    /// removes the entry. Returns the previous codec.
    pub fn register(&self, manifest: TypeDescriptor, codec: Option<CodecRef>) -> Option<CodecRef> {
        self.registry.register(manifest, codec)
    }

    pub fn lookup(&self, manifest: &TypeDescriptor) -> Option<CodecRef> {
        self.registry.lookup(manifest)
    }

    /// Returns the cached codec for `manifest`, building and caching it on
    /// a miss with the first analyzer that recognizes the type.
    pub fn resolve(&self, manifest: &TypeDescriptor) -> Result<CodecRef> {
        if let Some(codec) = self.registry.lookup(manifest) {
            return Ok(codec);
        }
        for analyzer in &self.analyzers {
            if let Some(codec) = analyzer(manifest, self)? {
                debug!("registered codec for {manifest}");
                self.registry.register(manifest.clone(), Some(codec.clone()));
                return Ok(codec);
            }
        }
        Err(ConfigurationError::NoCodecFound {
            type_name: manifest.to_string(),
        }
        .into())
    }

    // ------------------------------------------------------------ Top level

    pub fn serialize(&self, writer: &mut Writer, manifest: &TypeDescriptor, value: &Value) -> Result<()> {
        self.resolve(manifest)?.encode(writer, value)
    }

    pub fn to_vec(&self, manifest: &TypeDescriptor, value: &Value) -> Result<Vec<u8>> {
        let mut writer = Writer::with_alloc_size(1024);
        self.serialize(&mut writer, manifest, value)?;
        Ok(writer.flush())
    }

    /// Decodes the value at the reader's next token. Leaves the reader
    /// after the value.
    pub fn deserialize(&self, reader: &mut Reader<'_>, manifest: &TypeDescriptor) -> Result<Value> {
        let codec = self.resolve(manifest)?;
        reader.next_token()?;
        codec.decode(reader)
    }

    /// Decodes a complete document.
    pub fn from_slice(&self, manifest: &TypeDescriptor, input: &[u8]) -> Result<Value> {
        let mut reader = Reader::new(input);
        let value = self.deserialize(&mut reader, manifest)?;
        self.check_trailing(&mut reader)?;
        Ok(value)
    }

    /// Decodes a complete document into an existing instance.
    pub fn bind_from_slice(
        &self,
        manifest: &TypeDescriptor,
        input: &[u8],
        instance: &mut Value,
    ) -> Result<()> {
        let codec = self.resolve(manifest)?;
        let mut reader = Reader::new(input);
        reader.next_token()?;
        codec.bind(&mut reader, instance)?;
        self.check_trailing(&mut reader)
    }

    fn check_trailing(&self, reader: &mut Reader<'_>) -> Result<()> {
        if self.settings.verify_trailing && !reader.is_end() {
            return Err(
                DecodeError::new(reader.position(), DecodeErrorKind::TrailingContent).into(),
            );
        }
        Ok(())
    }
}
