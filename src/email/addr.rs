//! Module related to email addresses.
//!
//! This module regroups email address entities and their rendering
//! as SES address strings.

use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use std::{fmt, ops};

/// Defines a single email address, with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addr {
    pub email: String,
    pub name: Option<String>,
}

impl Addr {
    pub fn new<E: Into<String>>(email: E) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name<E: Into<String>, N: Into<String>>(email: E, name: N) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// Returns the display name worth rendering: present, non-empty
    /// and different from the email.
    fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty() && *name != self.email)
    }
}

/// Renders the address as `"name" <email>`, with double quotes of
/// the name escaped, or as the bare email when there is no name to
/// show.
impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name() {
            Some(name) => write!(f, "\"{}\" <{}>", name.replace('"', "\\\""), self.email),
            None => write!(f, "{}", self.email),
        }
    }
}

impl From<&str> for Addr {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Addr {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

impl<E: Into<String>, N: Into<String>> From<(E, N)> for Addr {
    fn from((email, name): (E, N)) -> Self {
        Self::with_name(email, name)
    }
}

/// Defines an ordered list of email addresses.
///
/// It deserializes either from a sequence, whose entries are bare
/// emails or `{ email, name }` tables, or from a mapping of emails to
/// display names. Input order and duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addrs(pub Vec<Addr>);

impl Addrs {
    /// Renders every address, in order.
    pub fn to_rendered(&self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl ops::Deref for Addrs {
    type Target = Vec<Addr>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ops::DerefMut for Addrs {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Addr>> for Addrs {
    fn from(addrs: Vec<Addr>) -> Self {
        Self(addrs)
    }
}

impl<A: Into<Addr>> FromIterator<A> for Addrs {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AddrEntry {
    Email(String),
    Addr {
        email: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<AddrEntry> for Addr {
    fn from(entry: AddrEntry) -> Self {
        match entry {
            AddrEntry::Email(email) => Addr::new(email),
            AddrEntry::Addr { email, name } => Addr { email, name },
        }
    }
}

struct AddrsVisitor;

impl<'de> Visitor<'de> for AddrsVisitor {
    type Value = Addrs;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an email, a list of emails or a map of emails to names")
    }

    fn visit_str<E: de::Error>(self, email: &str) -> Result<Self::Value, E> {
        Ok(Addrs(vec![Addr::new(email)]))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut addrs = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(entry) = seq.next_element::<AddrEntry>()? {
            addrs.push(entry.into());
        }
        Ok(Addrs(addrs))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut addrs = Vec::with_capacity(map.size_hint().unwrap_or_default());
        while let Some((email, name)) = map.next_entry::<String, Option<String>>()? {
            addrs.push(Addr { email, name });
        }
        Ok(Addrs(addrs))
    }
}

impl<'de> Deserialize<'de> for Addrs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AddrsVisitor)
    }
}
