use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::GraphError;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(NodeId);
uuid_id!(RelId);
uuid_id!(AttrId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub id: AttrId,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub visible: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>, visible: bool) -> Self {
        Self {
            id: AttrId::new(),
            name: name.into(),
            value: value.into(),
            visible,
        }
    }
}

/// Attributes in insertion order, addressed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts `attr`, replacing an existing attribute with the same id in place.
    pub fn insert(&mut self, attr: Attribute) -> AttrId {
        let id = attr.id;
        match self.0.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => *existing = attr,
            None => self.0.push(attr),
        }
        id
    }

    pub fn remove(&mut self, id: AttrId) -> Result<Attribute, GraphError> {
        let pos = self
            .0
            .iter()
            .position(|attr| attr.id == id)
            .ok_or(GraphError::MissingAttribute(id))?;
        Ok(self.0.remove(pos))
    }

    pub fn get(&self, id: AttrId) -> Option<&Attribute> {
        self.0.iter().find(|attr| attr.id == id)
    }

    pub fn get_mut(&mut self, id: AttrId) -> Option<&mut Attribute> {
        self.0.iter_mut().find(|attr| attr.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter().filter(|attr| attr.visible)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for attr in iter {
            attrs.insert(attr);
        }
        attrs
    }
}

/// A person, place or group on the sociogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub notes: String,
}

impl Node {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            attributes: Attributes::new(),
            notes: String::new(),
        }
    }

    pub fn with_attributes(mut self, attrs: impl IntoIterator<Item = Attribute>) -> Self {
        for attr in attrs {
            self.attributes.insert(attr);
        }
        self
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A labelled, weighted link from one node to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub id: RelId,
    pub label: String,
    #[serde(alias = "from")]
    pub origin: String,
    #[serde(alias = "to")]
    pub destination: String,
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub mutual: bool,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub notes: String,
}

impl Relationship {
    pub fn new(
        label: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        weight: i32,
        mutual: bool,
    ) -> Self {
        Self {
            id: RelId::new(),
            label: label.into(),
            origin: origin.into(),
            destination: destination.into(),
            weight,
            mutual,
            attributes: Attributes::new(),
            notes: String::new(),
        }
    }

    /// Whether this relationship starts or ends at `node`.
    pub fn touches(&self, node: &str) -> bool {
        self.origin == node || self.destination == node
    }

    /// Whether this relationship joins the two distinct nodes `a` and `b`.
    pub fn spans(&self, a: &str, b: &str) -> bool {
        a != b && self.touches(a) && self.touches(b)
    }

    pub fn ends_at(&self, node: &str) -> bool {
        self.destination == node
    }

    /// Ordering key used everywhere a "heaviest" relationship is picked.
    pub fn rank(&self) -> (i32, &str) {
        (self.weight, self.label.as_str())
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.origin, self.label, self.destination)
    }
}
