//! Hierarchical content names.
//!
//! Names are `/`-separated component paths (`/videos/lectures/intro`).
//! Prefix relationships drive both routing and the `AuthTag` scope check,
//! so component canonicity is validated at construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use ncap_wire::{TlvReader, TlvType, TlvWriter, WireError};

/// Name canonicity validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name must not be empty")]
    Empty,

    #[error("name must start with '/'")]
    MissingLeadingSlash,

    #[error("name component {index} is empty")]
    EmptyComponent { index: usize },

    #[error("name must be ASCII")]
    NonAscii,

    #[error("name component {index} has invalid character '{ch}'")]
    InvalidChar { index: usize, ch: char },
}

fn validate_component(index: usize, component: &str) -> Result<(), NameError> {
    if component.is_empty() {
        return Err(NameError::EmptyComponent { index });
    }
    if !component.is_ascii() {
        return Err(NameError::NonAscii);
    }
    for ch in component.chars() {
        let ok = ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-');
        if !ok {
            return Err(NameError::InvalidChar { index, ch });
        }
    }
    Ok(())
}

/// Hierarchical content name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// Parse a name from its `/a/b/c` URI form.
    ///
    /// # Errors
    /// Returns a `NameError` if the name is not canonical.
    pub fn parse(uri: &str) -> Result<Self, NameError> {
        if uri.is_empty() {
            return Err(NameError::Empty);
        }
        let Some(rest) = uri.strip_prefix('/') else {
            return Err(NameError::MissingLeadingSlash);
        };
        if rest.is_empty() {
            return Err(NameError::Empty);
        }
        let components: Vec<String> = rest.split('/').map(str::to_owned).collect();
        for (index, component) in components.iter().enumerate() {
            validate_component(index, component)?;
        }
        Ok(Self { components })
    }

    /// Build a name from pre-validated components.
    ///
    /// # Errors
    /// Returns a `NameError` if any component is not canonical.
    pub fn from_components<I, S>(components: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        if components.is_empty() {
            return Err(NameError::Empty);
        }
        for (index, component) in components.iter().enumerate() {
            validate_component(index, component)?;
        }
        Ok(Self { components })
    }

    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether `self` is a prefix of `other` (every name is a prefix of
    /// itself).
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }

    /// Return a new name with `component` appended.
    ///
    /// # Errors
    /// Returns a `NameError` if the component is not canonical.
    pub fn child(&self, component: &str) -> Result<Self, NameError> {
        validate_component(self.components.len(), component)?;
        let mut components = self.components.clone();
        components.push(component.to_owned());
        Ok(Self { components })
    }

    /// Append this name to a TLV writer under the given enclosing type.
    ///
    /// # Errors
    /// Propagates `WireError` from the writer.
    pub fn write_tlv(&self, writer: &mut TlvWriter, ty: TlvType) -> Result<(), WireError> {
        writer.nested(ty, |inner| {
            for component in &self.components {
                inner.bytes(TlvType::NameComponent, component.as_bytes())?;
            }
            Ok(())
        })
    }

    /// Read a name out of the value of an enclosing TLV.
    ///
    /// Decoded components are accepted as opaque bytes (lossy UTF-8);
    /// canonicity is an issuance-side property, not a decode-side one.
    ///
    /// # Errors
    /// Returns `WireError` if the component TLV structure is malformed.
    pub fn read_tlv(body: &[u8]) -> Result<Self, WireError> {
        let mut reader = TlvReader::new(body);
        let mut components = Vec::new();
        while !reader.is_empty() {
            let raw = reader.expect(TlvType::NameComponent)?;
            components.push(String::from_utf8_lossy(raw).into_owned());
        }
        reader.finish()?;
        Ok(Self { components })
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Name> for String {
    fn from(value: Name) -> Self {
        value.to_string()
    }
}

impl std::str::FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let name = Name::parse("/videos/lectures/intro").unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.to_string(), "/videos/lectures/intro");
    }

    #[test]
    fn rejects_non_canonical() {
        assert_eq!(Name::parse(""), Err(NameError::Empty));
        assert_eq!(Name::parse("videos"), Err(NameError::MissingLeadingSlash));
        assert_eq!(Name::parse("/"), Err(NameError::Empty));
        assert_eq!(
            Name::parse("/a//b"),
            Err(NameError::EmptyComponent { index: 1 })
        );
        assert!(matches!(
            Name::parse("/a/b c"),
            Err(NameError::InvalidChar { index: 1, ch: ' ' })
        ));
    }

    #[test]
    fn prefix_relation() {
        let prefix = Name::parse("/videos").unwrap();
        let name = Name::parse("/videos/lectures").unwrap();
        let other = Name::parse("/audio/lectures").unwrap();

        assert!(prefix.is_prefix_of(&name));
        assert!(prefix.is_prefix_of(&prefix));
        assert!(!prefix.is_prefix_of(&other));
        assert!(!name.is_prefix_of(&prefix));
    }

    #[test]
    fn child_appends() {
        let base = Name::parse("/videos").unwrap();
        let child = base.child("auth").unwrap();
        assert_eq!(child.to_string(), "/videos/auth");
        assert!(base.child("bad component").is_err());
    }

    #[test]
    fn tlv_roundtrip() {
        let name = Name::parse("/videos/lectures").unwrap();
        for ty in [TlvType::Name, TlvType::Prefix, TlvType::KeyLocator] {
            let mut writer = TlvWriter::new();
            name.write_tlv(&mut writer, ty).unwrap();
            let bytes = writer.into_vec();

            let mut reader = TlvReader::new(&bytes);
            let body = reader.expect(ty).unwrap();
            reader.finish().unwrap();

            assert_eq!(Name::read_tlv(body).unwrap(), name);
        }
    }

    #[test]
    fn serde_as_uri_string() {
        let name = Name::parse("/videos/intro").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"/videos/intro\"");
        let back: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
