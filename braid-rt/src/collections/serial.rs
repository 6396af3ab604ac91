//! Serialized formats for persistent collections.
//!
//! Lists serialize as plain sequences. Sets and maps serialize through a
//! small struct that also records their ordering flag, so that an ordered
//! collection comes back ordered.

use std::hash::Hash;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{PersistentList, PersistentMap, PersistentSet};

#[derive(Serialize)]
struct SerialSetRef<'a, E> {
    ordered: bool,
    items: Vec<&'a E>,
}

#[derive(Deserialize)]
struct SerialSet<E> {
    ordered: bool,
    items: Vec<E>,
}

#[derive(Serialize)]
struct SerialMapRef<'a, K, V> {
    ordered: bool,
    entries: Vec<(&'a K, &'a V)>,
}

#[derive(Deserialize)]
struct SerialMap<K, V> {
    ordered: bool,
    entries: Vec<(K, V)>,
}

impl<E: Serialize> Serialize for PersistentList<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, E: Deserialize<'de>> Deserialize<'de> for PersistentList<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::deserialize(deserializer).map(Self::from)
    }
}

impl<E: Serialize> Serialize for PersistentSet<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerialSetRef {
            ordered: self.is_ordered(),
            items: self.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, E: Deserialize<'de> + Hash + Eq> Deserialize<'de> for PersistentSet<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let SerialSet { ordered, items } = SerialSet::deserialize(deserializer)?;
        Ok(if ordered {
            Self::ordered(items)
        } else {
            items.into_iter().collect()
        })
    }
}

impl<K: Serialize, V: Serialize> Serialize for PersistentMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerialMapRef {
            ordered: self.is_ordered(),
            entries: self.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, K: Deserialize<'de> + Hash + Eq, V: Deserialize<'de>> Deserialize<'de>
    for PersistentMap<K, V>
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let SerialMap { ordered, entries } = SerialMap::deserialize(deserializer)?;
        Ok(if ordered {
            Self::ordered(entries)
        } else {
            entries.into_iter().collect()
        })
    }
}
