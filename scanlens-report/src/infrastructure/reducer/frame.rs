//! Reducer stack frames

use serde_json::{Map, Value};

use crate::domain::{HappyPathDetails, HttpMethod, IndexTableName, OperationRecord, StatusCounts};

/// Position of a child inside its parent container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

/// A generic object or array being rebuilt, with its link into the parent
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFrame {
    pub link: Option<Link>,
    pub node: Node,
}

impl ValueFrame {
    pub fn object(link: Option<Link>) -> Self {
        Self {
            link,
            node: Node::Object(Map::new()),
        }
    }

    pub fn array(link: Option<Link>) -> Self {
        Self {
            link,
            node: Node::Array(Vec::new()),
        }
    }

    /// Link for the next child: the pending key in an object, the next
    /// position in an array.
    pub fn child_link(&self, key: Option<String>) -> Link {
        match &self.node {
            Node::Object(_) => Link::Key(key.unwrap_or_default()),
            Node::Array(items) => Link::Index(items.len()),
        }
    }

    pub fn insert(&mut self, link: Link, value: Value) {
        match (&mut self.node, link) {
            (Node::Object(map), Link::Key(key)) => {
                map.insert(key, value);
            }
            (Node::Array(items), Link::Index(index)) => {
                debug_assert_eq!(index, items.len());
                items.push(value);
            }
            (Node::Object(map), Link::Index(index)) => {
                map.insert(index.to_string(), value);
            }
            (Node::Array(items), Link::Key(_)) => items.push(value),
        }
    }

    pub fn into_value(self) -> Value {
        match self.node {
            Node::Object(map) => Value::Object(map),
            Node::Array(items) => Value::Array(items),
        }
    }
}

/// One path object under `paths`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFrame {
    pub path: String,
    pub methods: Vec<HttpMethod>,
}

/// One method object under a path
#[derive(Debug, Clone, PartialEq)]
pub struct OperationFrame {
    pub record: OperationRecord,
}

impl OperationFrame {
    pub fn new(path: &str, method: HttpMethod) -> Self {
        Self {
            record: OperationRecord::new(path, method),
        }
    }

    pub fn set_happy_path(&mut self, happy_path: HappyPathDetails) {
        self.record.happy_path = Some(happy_path);
    }
}

/// An operation's `issues` array; tallies are folded into the operation on close
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuesFrame {
    pub path: String,
    pub method: HttpMethod,
    pub next_index: usize,
    pub status_counts: StatusCounts,
    pub owasp_issue_count: u64,
}

/// One string array under `index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTableFrame {
    pub name: IndexTableName,
    pub entries: Vec<String>,
}

/// A frame on the report reducer stack
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// The root object
    Report,
    Paths,
    Path(PathFrame),
    Operation(OperationFrame),
    Issues(IssuesFrame),
    Index,
    IndexTable(IndexTableFrame),
    /// Nested structure rebuilt as a JSON value
    Value(ValueFrame),
    /// Ignored subtree
    Skip,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_frame_links() {
        let mut object = ValueFrame::object(None);
        let link = object.child_link(Some("a".into()));
        assert_eq!(link, Link::Key("a".into()));
        object.insert(link, json!(1));

        let mut array = ValueFrame::array(Some(Link::Key("b".into())));
        for v in [json!(true), json!("x")] {
            let link = array.child_link(None);
            array.insert(link, v);
        }
        assert_eq!(array.child_link(None), Link::Index(2));
        let link = array.link.clone().unwrap();
        object.insert(link, array.into_value());

        assert_eq!(object.into_value(), json!({"a": 1, "b": [true, "x"]}));
    }
}
