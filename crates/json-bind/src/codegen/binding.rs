//! Hash-dispatched property tables.
//!
//! Names are matched by their FNV-1a hash. Only entries whose hash is
//! shared with another entry (or that ask for it explicitly) compare the
//! full name bytes, so the common case is one integer compare.

use json_bind_buffers::{name_hash, Reader};

use crate::error::{ConfigurationError, DecodeError, DecodeErrorKind, Result};
use crate::settings::UnknownPolicy;

/// Input to [`PropertyBindingTable::build`].
pub struct PropertySpec<T> {
    pub name: String,
    pub exact_name: bool,
    pub mandatory: bool,
    pub non_null: bool,
    pub value: T,
}

impl<T> PropertySpec<T> {
    pub fn new(name: &str, value: T) -> Self {
        Self {
            name: name.to_string(),
            exact_name: false,
            mandatory: false,
            non_null: false,
            value,
        }
    }

    pub fn flags(mut self, exact_name: bool, mandatory: bool, non_null: bool) -> Self {
        self.exact_name = exact_name;
        self.mandatory = mandatory;
        self.non_null = non_null;
        self
    }
}

#[derive(Debug)]
pub struct BindingEntry<T> {
    pub name: String,
    pub hash: u32,
    pub exact_name: bool,
    pub mandatory: bool,
    /// Single bit of the table's mandatory mask, zero when optional.
    pub mandatory_bit: u64,
    pub non_null: bool,
    pub value: T,
}

#[derive(Debug)]
pub struct PropertyBindingTable<T> {
    entries: Vec<BindingEntry<T>>,
    mandatory_mask: u64,
}

impl<T> PropertyBindingTable<T> {
    pub fn build(type_name: &str, specs: Vec<PropertySpec<T>>) -> Result<Self, ConfigurationError> {
        let count = specs.iter().filter(|s| s.mandatory).count();
        if count > 64 {
            return Err(ConfigurationError::TooManyMandatory {
                type_name: type_name.to_string(),
                count,
            });
        }
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|other| other.name == spec.name) {
                return Err(ConfigurationError::InvalidDeclaration {
                    type_name: type_name.to_string(),
                    reason: format!("duplicate property '{}'", spec.name),
                });
            }
        }
        let hashes: Vec<u32> = specs.iter().map(|s| name_hash(s.name.as_bytes())).collect();
        let mut next_bit = 0u32;
        let mut mandatory_mask = 0u64;
        let entries = specs
            .into_iter()
            .zip(hashes.iter().copied())
            .map(|(spec, hash)| {
                let collides = hashes.iter().filter(|&&h| h == hash).count() > 1;
                let mandatory_bit = if spec.mandatory {
                    let bit = 1u64 << next_bit;
                    next_bit += 1;
                    bit
                } else {
                    0
                };
                mandatory_mask |= mandatory_bit;
                BindingEntry {
                    name: spec.name,
                    hash,
                    exact_name: spec.exact_name || collides,
                    mandatory: spec.mandatory,
                    mandatory_bit,
                    non_null: spec.non_null,
                    value: spec.value,
                }
            })
            .collect();
        Ok(Self {
            entries,
            mandatory_mask,
        })
    }

    pub fn entries(&self) -> &[BindingEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mandatory_mask(&self) -> u64 {
        self.mandatory_mask
    }

    /// Finds the entry for the name last hashed by `reader`. `hint` is the
    /// position expected when input follows declaration order; it is tried
    /// before the full scan.
    pub fn find(&self, reader: &Reader<'_>, hash: u32, hint: usize) -> Option<(usize, &BindingEntry<T>)> {
        let accepts = |entry: &BindingEntry<T>| {
            entry.hash == hash && (!entry.exact_name || reader.was_last_name(entry.name.as_bytes()))
        };
        if let Some(entry) = self.entries.get(hint) {
            if accepts(entry) {
                return Some((hint, entry));
            }
        }
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| accepts(entry))
    }

    /// Names of the mandatory entries whose bits are still set.
    pub fn missing(&self, remaining: u64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.mandatory_bit & remaining != 0)
            .map(|e| e.name.clone())
            .collect()
    }
}

/// Reads `"name":value` pairs until the closing brace, dispatching each
/// through `table`. Entered with the first token after `{` as the last
/// token; returns with `}` consumed and every mandatory entry seen.
pub(crate) fn read_members<T>(
    reader: &mut Reader<'_>,
    table: &PropertyBindingTable<T>,
    unknown: UnknownPolicy,
    mut bind: impl FnMut(&BindingEntry<T>, &mut Reader<'_>) -> Result<()>,
) -> Result<()> {
    let mut remaining = table.mandatory_mask();
    let mut hint = 0;
    if reader.last_token() != b'}' {
        loop {
            let name_at = reader.token_start();
            let hash = reader.fill_name()?;
            reader.next_token()?;
            match table.find(reader, hash, hint) {
                Some((i, entry)) => {
                    if entry.non_null && reader.last_token() == b'n' {
                        let at = reader.token_start();
                        if reader.was_null()? {
                            return Err(DecodeError::new(at, DecodeErrorKind::NullForNonNull)
                                .with_field(&entry.name)
                                .into());
                        }
                    }
                    bind(entry, reader).map_err(|e| e.in_field(&entry.name))?;
                    remaining &= !entry.mandatory_bit;
                    hint = i + 1;
                }
                None => match unknown {
                    UnknownPolicy::Skip => reader.skip()?,
                    UnknownPolicy::Fail => {
                        let name = reader.last_name();
                        return Err(DecodeError::new(
                            name_at,
                            DecodeErrorKind::UnknownProperty(name.clone()),
                        )
                        .with_field(name)
                        .into());
                    }
                },
            }
            match reader.next_token()? {
                b',' => {
                    reader.next_token()?;
                }
                b'}' => break,
                _ => {
                    return Err(DecodeError::syntax(
                        reader.token_start(),
                        "Expecting '}' or ',' while parsing object",
                    )
                    .into())
                }
            }
        }
    }
    if remaining != 0 {
        let missing = table.missing(remaining);
        let first = missing.first().cloned().unwrap_or_default();
        return Err(DecodeError::new(
            reader.position(),
            DecodeErrorKind::MissingMandatory(missing),
        )
        .with_field(first)
        .into());
    }
    Ok(())
}
