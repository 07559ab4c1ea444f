//! Navigation helpers over the decoded catalog value.
//!
//! Every helper tolerates missing arrays and wrong types by yielding
//! nothing for that branch.

use crate::path::JsonPath;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// An object found at a known location in the catalog.
pub(crate) type Located<'a> = (JsonPath, &'a Map<String, Value>);

/// Returns the objects of the array stored under `key`, with their paths.
pub(crate) fn objects_in<'a>(
    parent: &'a Map<String, Value>,
    parent_path: &JsonPath,
    key: &str,
) -> Vec<Located<'a>> {
    let Some(items) = parent.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    let array_path = parent_path.key(key);
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| item.as_object().map(|object| (array_path.index(index), object)))
        .collect()
}

/// Returns every `products[i].flavors[j]` object.
pub(crate) fn flavors(root: &Value) -> Vec<Located<'_>> {
    let Some(root) = root.as_object() else {
        return Vec::new();
    };
    objects_in(root, &JsonPath::root(), "products")
        .into_iter()
        .flat_map(|(product_path, product)| objects_in(product, &product_path, "flavors"))
        .collect()
}

/// Returns every dependency of a flavor: its `dependencies` entries and the
/// `dependencies` entries of each of its `swappable_dependencies`.
pub(crate) fn dependencies<'a>(flavor_path: &JsonPath, flavor: &'a Map<String, Value>) -> Vec<Located<'a>> {
    let mut found = objects_in(flavor, flavor_path, "dependencies");
    for (swappable_path, swappable) in objects_in(flavor, flavor_path, "swappable_dependencies") {
        found.extend(objects_in(swappable, &swappable_path, "dependencies"));
    }
    found
}

/// An item of an array that shares its field value with other items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DuplicateItem<'a> {
    /// Index of this item.
    pub index: usize,
    /// The shared field value.
    pub value: &'a str,
    /// Indices of the other items with the same value.
    pub others: Vec<usize>,
}

/// Finds items of `items` whose string `field` is shared with another item.
///
/// Items without the field, or with a non-string value, are ignored. The
/// result is in item order.
pub(crate) fn duplicate_items<'a>(items: &'a [Value], field: &str) -> Vec<DuplicateItem<'a>> {
    let values: Vec<Option<&str>> = items
        .iter()
        .map(|item| item.get(field).and_then(Value::as_str))
        .collect();

    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, value) in values.iter().enumerate() {
        if let Some(value) = value {
            groups.entry(*value).or_default().push(index);
        }
    }

    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let value = (*value)?;
            let group = groups.get(value)?;
            if group.len() < 2 {
                return None;
            }
            let others = group.iter().copied().filter(|&other| other != index).collect();
            Some(DuplicateItem { index, value, others })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flavors_with_paths() {
        let value = json!({
            "products": [
                {"flavors": [{"a": 1}, "not an object", {"b": 2}]},
                {"no_flavors": true},
                5
            ]
        });
        let found: Vec<String> = flavors(&value).iter().map(|(path, _)| path.to_string()).collect();
        assert_eq!(found, vec!["$.products[0].flavors[0]", "$.products[0].flavors[2]"]);
    }

    #[test]
    fn flavors_tolerates_wrong_types() {
        assert!(flavors(&json!([])).is_empty());
        assert!(flavors(&json!({"products": {"flavors": []}})).is_empty());
        assert!(flavors(&json!({"products": [{"flavors": "x"}]})).is_empty());
    }

    #[test]
    fn dependencies_include_swappable() {
        let value = json!({"products": [{"flavors": [{
            "dependencies": [{"id": "a"}],
            "swappable_dependencies": [
                {"dependencies": [{"id": "b"}, {"id": "c"}]},
                {"dependencies": null}
            ]
        }]}]});
        let flavor = &flavors(&value)[0];
        let found: Vec<String> = dependencies(&flavor.0, flavor.1)
            .iter()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(
            found,
            vec![
                "$.products[0].flavors[0].dependencies[0]",
                "$.products[0].flavors[0].swappable_dependencies[0].dependencies[0]",
                "$.products[0].flavors[0].swappable_dependencies[0].dependencies[1]",
            ]
        );
    }

    #[test]
    fn duplicate_items_groups_by_field() {
        let items = vec![
            json!({"key": "a"}),
            json!({"key": "b"}),
            json!({"key": "a"}),
            json!({"key": 1}),
            json!({"other": "a"}),
            json!({"key": "a"}),
        ];
        let found = duplicate_items(&items, "key");
        assert_eq!(
            found,
            vec![
                DuplicateItem { index: 0, value: "a", others: vec![2, 5] },
                DuplicateItem { index: 2, value: "a", others: vec![0, 5] },
                DuplicateItem { index: 5, value: "a", others: vec![0, 2] },
            ]
        );
    }

    #[test]
    fn duplicate_items_none() {
        let items = vec![json!({"key": "a"}), json!({"key": "b"}), json!("scalar")];
        assert!(duplicate_items(&items, "key").is_empty());
    }
}
