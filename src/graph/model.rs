use std::collections::BTreeMap;

/// One attribute value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Integer literal.
    Int(i64),
    /// String literal.
    Text(String),
    /// Reference to another entity (or vocabulary term) by URL.
    Ref(String),
}

impl Value {
    /// Integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload, if this is a string literal.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Target URL, if this is a reference.
    pub fn as_ref_id(&self) -> Option<&str> {
        match self {
            Self::Ref(id) => Some(id),
            _ => None,
        }
    }
}

/// URL-identified record: type tags plus a multi-valued attribute map.
///
/// Values under one key keep their insertion order. For `hasTrack` and `hasEvent` that order is
/// meaningful and every operation here preserves it.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "WireEntity", into = "WireEntity")]
pub struct Entity {
    /// Type tags (URLs).
    pub types: Vec<String>,
    /// Property URL → values.
    pub attributes: BTreeMap<String, Vec<Value>>,
}

impl Entity {
    /// Entity carrying a single type tag.
    pub fn typed(type_url: impl Into<String>) -> Self {
        Self {
            types: vec![type_url.into()],
            attributes: BTreeMap::new(),
        }
    }

    /// Add a type tag unless already present.
    pub fn add_type(&mut self, type_url: impl Into<String>) {
        let type_url = type_url.into();
        if !self.has_type(&type_url) {
            self.types.push(type_url);
        }
    }

    /// Whether `type_url` is among the type tags.
    pub fn has_type(&self, type_url: &str) -> bool {
        self.types.iter().any(|t| t == type_url)
    }

    /// Append a value under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.entry(key.into()).or_default().push(value);
    }

    /// Builder form of [`Entity::add`].
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.add(key, value);
        self
    }

    /// Replace all values under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), vec![value]);
    }

    /// Remove and return all values under `key`.
    pub fn remove(&mut self, key: &str) -> Vec<Value> {
        self.attributes.remove(key).unwrap_or_default()
    }

    /// All values under `key`, in insertion order.
    pub fn values(&self, key: &str) -> &[Value] {
        self.attributes.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// First integer under `key`.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.values(key).iter().find_map(Value::as_int)
    }

    /// First string literal under `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.values(key).iter().find_map(Value::as_text)
    }

    /// First reference under `key`.
    pub fn reference(&self, key: &str) -> Option<&str> {
        self.values(key).iter().find_map(Value::as_ref_id)
    }

    /// All references under `key`, in insertion order.
    pub fn references<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.values(key).iter().filter_map(Value::as_ref_id)
    }
}

/// Set of entities keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Graph {
    entities: BTreeMap<String, Entity>,
}

impl Graph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity, returning the previous one.
    pub fn insert(&mut self, id: impl Into<String>, entity: Entity) -> Option<Entity> {
        self.entities.insert(id.into(), entity)
    }

    /// Entity by id.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Whether `id` resolves.
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the graph has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.entities.iter().map(|(id, e)| (id.as_str(), e))
    }

    /// Ids of all entities tagged with `type_url`, in id order.
    pub fn ids_with_type<'a>(&'a self, type_url: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |(_, e)| e.has_type(type_url))
            .map(|(id, _)| id)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WireEntity {
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    attributes: BTreeMap<String, WireValues>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum WireValues {
    // Arrays first: a one-element array must not be read as a single reference.
    Many(Vec<WireValue>),
    One(WireValue),
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum WireValue {
    Int(i64),
    Ref {
        #[serde(rename = "@id")]
        id: String,
    },
    Text(String),
}

impl From<WireValue> for Value {
    fn from(v: WireValue) -> Self {
        match v {
            WireValue::Int(i) => Self::Int(i),
            WireValue::Ref { id } => Self::Ref(id),
            WireValue::Text(s) => Self::Text(s),
        }
    }
}

impl From<Value> for WireValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Int(i) => Self::Int(i),
            Value::Ref(id) => Self::Ref { id },
            Value::Text(s) => Self::Text(s),
        }
    }
}

impl From<WireEntity> for Entity {
    fn from(w: WireEntity) -> Self {
        let attributes = w
            .attributes
            .into_iter()
            .map(|(key, values)| {
                let values = match values {
                    WireValues::Many(vs) => vs.into_iter().map(Value::from).collect(),
                    WireValues::One(v) => vec![Value::from(v)],
                };
                (key, values)
            })
            .collect();
        Self {
            types: w.types,
            attributes,
        }
    }
}

impl From<Entity> for WireEntity {
    fn from(e: Entity) -> Self {
        let attributes = e
            .attributes
            .into_iter()
            .map(|(key, mut values)| {
                let wire = if values.len() == 1 {
                    WireValues::One(values.remove(0).into())
                } else {
                    WireValues::Many(values.into_iter().map(WireValue::from).collect())
                };
                (key, wire)
            })
            .collect();
        Self {
            types: e.types,
            attributes,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/model.rs"]
mod tests;
