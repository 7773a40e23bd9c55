//! Two-level endpoint registry: group → name → endpoint.

use crate::{Endpoint, Error};
use std::{
    collections::{BTreeMap, btree_map::Entry},
    ops::Index,
    sync::Arc,
};

/// Endpoints sharing a group name.
#[derive(Clone, Default)]
pub struct Group {
    endpoints: BTreeMap<String, Arc<dyn Endpoint>>,
}

impl Group {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Endpoint>> {
        self.endpoints.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Index<&str> for Group {
    type Output = Arc<dyn Endpoint>;

    /// # Panics
    ///
    /// Panics if no endpoint with that name is registered in the group.
    fn index(&self, name: &str) -> &Self::Output {
        self.get(name)
            .unwrap_or_else(|| panic!("no endpoint named `{name}` in group"))
    }
}

/// Registry built once while constructing the facade.
#[derive(Clone, Default)]
pub struct Registry {
    groups: BTreeMap<String, Group>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one endpoint under `group.name`.
    ///
    /// Creates the group on first use. A name already taken in the group is an
    /// `Error::DuplicateEndpoint` and the existing endpoint stays in place.
    pub fn register(&mut self, endpoint: Arc<dyn Endpoint>) -> Result<(), Error> {
        let group = self.groups.entry(endpoint.group().to_owned()).or_default();
        match group.endpoints.entry(endpoint.name().to_owned()) {
            Entry::Occupied(_) => Err(Error::DuplicateEndpoint {
                group: endpoint.group().into(),
                name: endpoint.name().into(),
            }),
            Entry::Vacant(slot) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    group = endpoint.group(),
                    name = endpoint.name(),
                    "registered endpoint"
                );
                slot.insert(endpoint);
                Ok(())
            }
        }
    }

    /// Register endpoints in order, stopping at the first duplicate.
    pub fn register_all<I>(&mut self, endpoints: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Arc<dyn Endpoint>>,
    {
        endpoints
            .into_iter()
            .try_for_each(|endpoint| self.register(endpoint))
    }

    #[must_use]
    pub fn get(&self, group: &str, name: &str) -> Option<&Arc<dyn Endpoint>> {
        self.groups.get(group)?.get(name)
    }

    #[must_use]
    pub fn group(&self, group: &str) -> Option<&Group> {
        self.groups.get(group)
    }

    /// `(group, name)` pairs in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups
            .iter()
            .flat_map(|(group, g)| g.names().map(move |name| (group.as_str(), name)))
    }

    /// Total number of registered endpoints across groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(Group::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index<&str> for Registry {
    type Output = Group;

    /// # Panics
    ///
    /// Panics if the group does not exist.
    fn index(&self, group: &str) -> &Self::Output {
        self.group(group)
            .unwrap_or_else(|| panic!("no endpoint group named `{group}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Api, ResponseBody, endpoint};
    use serde_json::Value;

    fn fixed(group: &str, name: &str, reply: &'static str) -> Arc<dyn Endpoint> {
        Arc::new(endpoint(group, name, move |_api: Api, _args: Value| async move {
            Ok::<_, Error>(ResponseBody::Text(reply.to_owned()))
        }))
    }

    #[test]
    fn registers_into_groups() {
        let mut registry = Registry::new();
        registry
            .register_all([
                fixed("items", "list", "a"),
                fixed("items", "create", "b"),
                fixed("users", "me", "c"),
            ])
            .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry["items"].len(), 2);
        assert_eq!(registry["users"]["me"].name(), "me");
        assert!(registry.get("users", "list").is_none());
        assert_eq!(
            registry.keys().collect::<Vec<_>>(),
            [("items", "create"), ("items", "list"), ("users", "me")]
        );
    }

    #[test]
    fn same_name_in_other_group_is_allowed() {
        let mut registry = Registry::new();
        registry.register(fixed("items", "list", "a")).unwrap();
        registry.register(fixed("users", "list", "b")).unwrap();
        assert!(registry["items"].contains("list"));
        assert!(registry["users"].contains("list"));
    }

    #[test]
    fn duplicate_keeps_first_registration() {
        let mut registry = Registry::new();
        let first = fixed("items", "list", "first");
        registry.register(first.clone()).unwrap();

        let err = registry
            .register(fixed("items", "list", "second"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Endpoint items.list already defined");
        assert!(Arc::ptr_eq(registry.get("items", "list").unwrap(), &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_all_stops_at_first_duplicate() {
        let mut registry = Registry::new();
        let err = registry
            .register_all([
                fixed("a", "x", ""),
                fixed("a", "x", ""),
                fixed("b", "y", ""),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateEndpoint { .. }));
        assert!(registry.get("b", "y").is_none());
    }

    #[test]
    #[should_panic(expected = "no endpoint group named `missing`")]
    fn indexing_unknown_group_panics() {
        let registry = Registry::new();
        let _ = &registry["missing"];
    }
}
