use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Keys of a document level, kept sorted so traversals are deterministic.
pub type Object = BTreeMap<String, Node>;

/// A value inside a design document.
///
/// Design documents only hold strings (view functions, `_id`, `_rev`, ...) and nested objects of
/// them. Anything else is rejected when converting from JSON.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Leaf(String),
    Object(Object),
}

impl Node {
    /// Converts a JSON value, failing on the first number, boolean, array or null found.
    pub fn from_json(value: Value) -> Result<Self> {
        from_json_at(value, &mut String::new())
    }

    /// Converts a JSON value which must be an object at the top level.
    pub fn object_from_json(value: Value) -> Result<Object> {
        match Self::from_json(value)? {
            Node::Object(object) => Ok(object),
            Node::Leaf(_) => Err(Error::Structural {
                key_path: String::new(),
                found: "string",
            }),
        }
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Node::Leaf(s) => Some(s.as_str()),
            Node::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Leaf(_) => None,
            Node::Object(object) => Some(object),
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Leaf(s.to_owned())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Leaf(s)
    }
}

impl From<Object> for Node {
    fn from(object: Object) -> Self {
        Node::Object(object)
    }
}

/// `key_path` is the `/` joined path of `value`, used for error reporting.
fn from_json_at(value: Value, key_path: &mut String) -> Result<Node> {
    let found = match value {
        Value::String(s) => return Ok(Node::Leaf(s)),
        Value::Object(map) => {
            let mut object = Object::new();
            for (key, child) in map {
                let len = key_path.len();
                if len != 0 {
                    key_path.push('/');
                }
                key_path.push_str(&key);
                let node = from_json_at(child, key_path)?;
                key_path.truncate(len);

                object.insert(key, node);
            }
            return Ok(Node::Object(object));
        }
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::Array(_) => "an array",
    };

    Err(Error::Structural {
        key_path: key_path.clone(),
        found,
    })
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Node::Leaf(s) => serializer.serialize_str(s),
            Node::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in object {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json() {
        let value = json!({
            "_id": "_design/app",
            "views": { "by_name": { "map": "function(doc) {}" } },
            "empty": {}
        });
        let object = Node::object_from_json(value).unwrap();

        assert_eq!(object["_id"], Node::from("_design/app"));
        assert_eq!(object["empty"], Node::Object(Object::new()));

        let map = &object["views"].as_object().unwrap()["by_name"]
            .as_object()
            .unwrap()["map"];
        assert_eq!(map.as_leaf(), Some("function(doc) {}"));
    }

    #[test]
    fn test_from_json_rejects_other_values() {
        let value = json!({ "options": { "local_seq": true } });
        match Node::from_json(value) {
            Err(Error::Structural { key_path, found }) => {
                assert_eq!(key_path, "options/local_seq");
                assert_eq!(found, "a boolean");
            }
            other => panic!("expected structural error, got {:?}", other),
        }

        for value in [json!(1), json!(null), json!([])] {
            assert!(matches!(
                Node::from_json(json!({ "a": value })),
                Err(Error::Structural { .. })
            ));
        }

        assert!(matches!(
            Node::object_from_json(json!("text")),
            Err(Error::Structural { .. })
        ));
    }

    #[test]
    fn test_serialize() {
        let mut views = Object::new();
        views.insert("map".to_owned(), Node::from("function(doc) {}"));
        let mut doc = Object::new();
        doc.insert("views".to_owned(), Node::Object(views));
        doc.insert("language".to_owned(), Node::from("javascript"));

        let value = serde_json::to_value(Node::Object(doc)).unwrap();
        assert_eq!(
            value,
            json!({ "language": "javascript", "views": { "map": "function(doc) {}" } })
        );
    }
}
