//! # Constant Registries
//!
//! Ordered, name- and value-indexed collections of [`NamedConstant`]s built
//! from a raw constant namespace. A registry is either an `Enum` (plain list
//! of alternatives) or a `Flag` (single-bit members that combine with `|`).
//!
//! Flag registries set aside two sentinel members when present:
//! - `empty`: the zero-valued member, e.g. `TRIG_INVALID`
//! - `all`: the one member with several bits set, e.g. `TRIG_ANY`
//!
//! Sentinels are not part of [`ConstantRegistry::iter`] but can still be
//! reached through [`ConstantRegistry::index_by_name`] and friends.

use crate::constant::NamedConstant;
use crate::error::{ConflictError, ContractError};
use crate::namespace::RawConstant;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Registry flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryKind {
    Enum,
    Flag,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKind::Enum => write!(f, "enum"),
            RegistryKind::Flag => write!(f, "flag"),
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Filters a raw namespace down to one registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    name: String,
    prefix: String,
    blacklist: Vec<String>,
    whitelist: Option<Vec<String>>,
    translation: HashMap<String, String>,
}

impl RegistryBuilder {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Skip these (already translated) item names
    pub fn blacklist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(names.into_iter().map(Into::into));
        self
    }

    /// Keep only these (already translated) item names
    pub fn whitelist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist
            .get_or_insert_with(Vec::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Use `to` instead of the lower-cased form of `from`
    pub fn translate(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.translation.insert(from.into(), to.into());
        self
    }

    /// Item name for a raw constant, or `None` when the prefix doesn't match.
    pub fn item_name(&self, raw_name: &str) -> Option<String> {
        let stripped = raw_name.trim().strip_prefix(self.prefix.as_str())?;
        Some(match self.translation.get(stripped) {
            Some(translated) => translated.clone(),
            None => stripped.to_lowercase(),
        })
    }

    fn is_ignored(&self, item_name: &str) -> bool {
        self.blacklist.iter().any(|b| b == item_name)
            || self
                .whitelist
                .as_ref()
                .is_some_and(|w| !w.iter().any(|n| n == item_name))
    }

    pub fn build_enum(self, source: &[RawConstant]) -> Result<ConstantRegistry, ConflictError> {
        self.build(RegistryKind::Enum, source)
    }

    pub fn build_flag(self, source: &[RawConstant]) -> Result<ConstantRegistry, ConflictError> {
        self.build(RegistryKind::Flag, source)
    }

    pub fn build(
        self,
        kind: RegistryKind,
        source: &[RawConstant],
    ) -> Result<ConstantRegistry, ConflictError> {
        let mut registry = ConstantRegistry::empty_registry(&self.name, kind);
        for raw in source {
            let Some(item_name) = self.item_name(raw.name) else {
                continue;
            };
            if self.is_ignored(&item_name) {
                continue;
            }
            let item = NamedConstant::new(item_name.clone(), raw.value, raw.doc()).map_err(|_| {
                ConflictError::ValueOutOfRange {
                    registry: self.name.clone(),
                    name: item_name,
                    value: raw.value,
                }
            })?;
            registry.insert(item)?;
        }
        registry.finish()?;
        tracing::debug!(
            registry = %registry.name,
            kind = %registry.kind,
            members = registry.visible.len(),
            empty = registry.empty().map(|c| c.name.as_str()),
            all = registry.all().map(|c| c.name.as_str()),
            "built constant registry"
        );
        Ok(registry)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// An enum or flag family.
#[derive(Debug, Clone)]
pub struct ConstantRegistry {
    name: String,
    kind: RegistryKind,
    /// Every member, sentinels included, sorted by value
    entries: Vec<NamedConstant>,
    /// Indices of the non-sentinel members
    visible: Vec<usize>,
    empty: Option<usize>,
    all: Option<usize>,
    by_name: HashMap<String, usize>,
    by_value: HashMap<u32, usize>,
}

impl ConstantRegistry {
    fn empty_registry(name: &str, kind: RegistryKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            entries: Vec::new(),
            visible: Vec::new(),
            empty: None,
            all: None,
            by_name: HashMap::new(),
            by_value: HashMap::new(),
        }
    }

    fn insert(&mut self, item: NamedConstant) -> Result<(), ConflictError> {
        if self.entries.iter().any(|e| e.name == item.name) {
            return Err(ConflictError::DuplicateName {
                registry: self.name.clone(),
                name: item.name,
            });
        }
        if item.value != 0 {
            if let Some(first) = self.entries.iter().find(|e| e.value == item.value) {
                return Err(ConflictError::ValueCollision {
                    registry: self.name.clone(),
                    first: first.name.clone(),
                    second: item.name,
                    value: item.value,
                });
            }
        }
        tracing::trace!(registry = %self.name, name = %item.name, value = item.value, "add item");
        self.entries.push(item);
        Ok(())
    }

    /// Sort, pick out sentinels and index the result.
    fn finish(&mut self) -> Result<(), ConflictError> {
        self.entries.sort_by_key(|e| e.value);

        if self.kind == RegistryKind::Flag {
            for (index, entry) in self.entries.iter().enumerate() {
                if entry.value == 0 {
                    if let Some(first) = self.empty {
                        return Err(ConflictError::MultipleEmpty {
                            registry: self.name.clone(),
                            first: self.entries[first].name.clone(),
                            second: entry.name.clone(),
                        });
                    }
                    self.empty = Some(index);
                } else if !entry.is_single_bit() {
                    if let Some(first) = self.all {
                        let first = &self.entries[first];
                        return Err(ConflictError::MultipleAll {
                            registry: self.name.clone(),
                            first: first.name.clone(),
                            first_value: first.value,
                            second: entry.name.clone(),
                            second_value: entry.value,
                        });
                    }
                    self.all = Some(index);
                }
            }
        }

        self.visible = (0..self.entries.len())
            .filter(|&i| Some(i) != self.empty && Some(i) != self.all)
            .collect();
        for (index, entry) in self.entries.iter().enumerate() {
            self.by_name.insert(entry.name.clone(), index);
            self.by_value.entry(entry.value).or_insert(index);
        }
        Ok(())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    /// Visible members in ascending value order
    pub fn iter(&self) -> impl Iterator<Item = &NamedConstant> + '_ {
        self.visible.iter().map(move |&i| &self.entries[i])
    }

    /// Number of visible members
    #[inline]
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn index_by_name(&self, name: &str) -> Option<&NamedConstant> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn index_by_value(&self, value: u32) -> Option<&NamedConstant> {
        self.by_value.get(&value).map(|&i| &self.entries[i])
    }

    /// Zero-valued sentinel (flag registries only)
    pub fn empty(&self) -> Option<&NamedConstant> {
        self.empty.map(|i| &self.entries[i])
    }

    /// Multi-bit sentinel (flag registries only)
    pub fn all(&self) -> Option<&NamedConstant> {
        self.all.map(|i| &self.entries[i])
    }

    /// OR of every value the family ever assigns, sentinels included.
    pub fn combined_mask(&self) -> u32 {
        self.entries.iter().fold(0, |mask, e| mask | e.value)
    }

    /// Member lookup that reports unknown names as a contract violation.
    pub fn member(&self, name: &str) -> Result<&NamedConstant, ContractError> {
        self.index_by_name(name)
            .ok_or_else(|| ContractError::UnknownMember {
                registry: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Are all bits of member `name` set in `value`?
    pub fn get(&self, value: u32, name: &str) -> Result<bool, ContractError> {
        let member = self.member(name)?;
        if member.value == 0 {
            return Err(ContractError::EmptyMask {
                registry: self.name.clone(),
                name: member.name.clone(),
            });
        }
        Ok(value & member.value == member.value)
    }

    /// `value` with the bit of member `name` set or cleared.
    pub fn set(&self, value: u32, name: &str, status: bool) -> Result<u32, ContractError> {
        let member = self.member(name)?;
        if !member.is_single_bit() {
            return Err(ContractError::MultiBitMember {
                registry: self.name.clone(),
                name: member.name.clone(),
                value: member.value,
            });
        }
        if status {
            Ok(value | member.value)
        } else {
            // member's bit is present after the OR, so this only clears it
            Ok((value | member.value) - member.value)
        }
    }

    /// Names of the visible members fully contained in `value`.
    pub fn set_members(&self, value: u32) -> impl Iterator<Item = &NamedConstant> + '_ {
        self.iter()
            .filter(move |m| m.value != 0 && value & m.value == m.value)
    }

    /// `"|"`-joined member names, or `default` when nothing is set.
    pub fn render(&self, value: u32, default: &str) -> String {
        let names: Vec<&str> = self.set_members(value).map(|m| m.name.as_str()).collect();
        if names.is_empty() {
            default.to_string()
        } else {
            names.join("|")
        }
    }
}

impl<'a> IntoIterator for &'a ConstantRegistry {
    type Item = &'a NamedConstant;
    type IntoIter = Box<dyn Iterator<Item = &'a NamedConstant> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl fmt::Display for ConstantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, member) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", member.name)?;
        }
        write!(f, "]")
    }
}
