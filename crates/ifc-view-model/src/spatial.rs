// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure snapshot (Project → Site → Building → Storey → Elements)

use crate::{AttributeValue, ExpressId, LibraryError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of spatial structure node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialNodeType {
    /// IfcProject - root of the hierarchy
    Project,
    /// IfcSite - geographic site
    Site,
    /// IfcBuilding - a building structure
    Building,
    /// IfcBuildingStorey - a floor/level
    Storey,
    /// IfcSpace - a room or area
    Space,
    /// Building element (wall, door, etc.)
    Element,
}

impl SpatialNodeType {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            SpatialNodeType::Project => "Project",
            SpatialNodeType::Site => "Site",
            SpatialNodeType::Building => "Building",
            SpatialNodeType::Storey => "Storey",
            SpatialNodeType::Space => "Space",
            SpatialNodeType::Element => "Element",
        }
    }

    /// Classify a node from its type tag (`"IFCBUILDINGSTOREY"`, `"IfcSite"`, ...)
    pub fn from_type_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "IFCPROJECT" => SpatialNodeType::Project,
            "IFCSITE" => SpatialNodeType::Site,
            "IFCBUILDING" => SpatialNodeType::Building,
            "IFCBUILDINGSTOREY" => SpatialNodeType::Storey,
            "IFCSPACE" => SpatialNodeType::Space,
            _ => SpatialNodeType::Element,
        }
    }
}

/// Node in the spatial hierarchy tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialNode {
    /// Entity id, absent for synthetic grouping nodes
    pub express_id: Option<ExpressId>,
    /// IFC type tag as reported by the library (e.g. `"IFCWALL"`)
    pub type_tag: String,
    /// Name attribute, when the library resolved it
    pub name: Option<String>,
    /// Child nodes in library order
    pub children: Vec<SpatialNode>,
}

impl SpatialNode {
    pub fn new(express_id: impl Into<Option<ExpressId>>, type_tag: impl Into<String>) -> Self {
        Self {
            express_id: express_id.into(),
            type_tag: type_tag.into(),
            name: None,
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_child(mut self, child: SpatialNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add a child node
    pub fn add_child(&mut self, child: SpatialNode) {
        self.children.push(child);
    }

    pub fn node_type(&self) -> SpatialNodeType {
        SpatialNodeType::from_type_tag(&self.type_tag)
    }

    /// Label for tree views: name, then type tag with id
    pub fn label(&self) -> String {
        match (&self.name, self.express_id) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(id)) => format!("{} {}", self.type_tag, id),
            _ => self.type_tag.clone(),
        }
    }

    /// Decode the library's spatial structure JSON
    ///
    /// Nodes look like `{"expressID": 1, "type": "IFCPROJECT", "children": [..]}`;
    /// with nested resolution enabled they also carry their attributes, of
    /// which only `Name` is kept.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| LibraryError::malformed("spatial node is not an object"))?;
        let express_id = map
            .get("expressID")
            .and_then(Value::as_f64)
            .and_then(ExpressId::from_f64);
        let type_tag = match map.get("type") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::from("UNKNOWN"),
        };
        let name = map
            .get("Name")
            .map(AttributeValue::from_json)
            .and_then(|v| v.as_str().map(str::to_string));
        let children = match map.get("children") {
            Some(Value::Array(items)) => items
                .iter()
                .map(SpatialNode::from_json)
                .collect::<Result<Vec<_>>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(LibraryError::malformed("spatial children is not an array")),
        };
        Ok(Self {
            express_id,
            type_tag,
            name,
            children,
        })
    }

    /// Find a node by id (recursive)
    pub fn find(&self, id: ExpressId) -> Option<&SpatialNode> {
        self.iter().find(|n| n.express_id == Some(id))
    }

    /// Iterate all nodes (depth-first)
    pub fn iter(&self) -> SpatialNodeIter<'_> {
        SpatialNodeIter { stack: vec![self] }
    }

    /// Get total element count (recursive)
    pub fn element_count(&self) -> usize {
        self.iter()
            .filter(|n| n.node_type() == SpatialNodeType::Element)
            .count()
    }
}

/// Iterator over spatial nodes (depth-first)
pub struct SpatialNodeIter<'a> {
    stack: Vec<&'a SpatialNode>,
}

impl<'a> Iterator for SpatialNodeIter<'a> {
    type Item = &'a SpatialNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Add children in reverse order so first child is processed first
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

/// Immutable spatial structure of one model, with a parent index
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialTree {
    root: SpatialNode,
    parents: FxHashMap<ExpressId, ExpressId>,
}

impl SpatialTree {
    pub fn new(root: SpatialNode) -> Self {
        let mut parents = FxHashMap::default();
        index_parents(&root, &mut parents);
        Self { root, parents }
    }

    pub fn root(&self) -> &SpatialNode {
        &self.root
    }

    pub fn find(&self, id: ExpressId) -> Option<&SpatialNode> {
        self.root.find(id)
    }

    pub fn contains(&self, id: ExpressId) -> bool {
        self.root.express_id == Some(id) || self.parents.contains_key(&id)
    }

    pub fn parent(&self, id: ExpressId) -> Option<ExpressId> {
        self.parents.get(&id).copied()
    }

    /// Ids from the root down to the element's direct parent
    pub fn ancestors(&self, id: ExpressId) -> Vec<ExpressId> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            // Malformed input could contain a cycle
            if path.contains(&parent) {
                break;
            }
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn node_count(&self) -> usize {
        self.root.iter().count()
    }
}

impl Serialize for SpatialTree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SpatialTree {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        SpatialNode::deserialize(deserializer).map(SpatialTree::new)
    }
}

fn index_parents(node: &SpatialNode, parents: &mut FxHashMap<ExpressId, ExpressId>) {
    for child in &node.children {
        if let (Some(parent), Some(id)) = (node.express_id, child.express_id) {
            parents.entry(id).or_insert(parent);
        }
        index_parents(child, parents);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SpatialTree {
        let storey = SpatialNode::new(ExpressId(8), "IFCBUILDINGSTOREY")
            .with_name("Ground Floor")
            .with_child(SpatialNode::new(ExpressId(10), "IFCWALL"))
            .with_child(SpatialNode::new(ExpressId(11), "IFCDOOR"));
        let building = SpatialNode::new(ExpressId(6), "IFCBUILDING").with_child(storey);
        let site = SpatialNode::new(ExpressId(4), "IFCSITE").with_child(building);
        SpatialTree::new(SpatialNode::new(ExpressId(1), "IFCPROJECT").with_child(site))
    }

    #[test]
    fn test_ancestors() {
        let tree = sample();
        assert_eq!(
            tree.ancestors(ExpressId(10)),
            vec![ExpressId(1), ExpressId(4), ExpressId(6), ExpressId(8)]
        );
        assert!(tree.ancestors(ExpressId(1)).is_empty());
        assert!(tree.ancestors(ExpressId(999)).is_empty());
    }

    #[test]
    fn test_counts_and_lookup() {
        let tree = sample();
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.root().element_count(), 2);
        assert!(tree.contains(ExpressId(1)));
        assert!(tree.contains(ExpressId(11)));
        assert_eq!(
            tree.find(ExpressId(8)).map(SpatialNode::label),
            Some("Ground Floor".to_string())
        );
        assert_eq!(
            tree.find(ExpressId(10)).map(SpatialNode::node_type),
            Some(SpatialNodeType::Element)
        );
    }

    #[test]
    fn test_from_json() {
        let raw = json!({
            "expressID": 1,
            "type": "IFCPROJECT",
            "Name": {"type": 1, "value": "Demo"},
            "children": [
                {"expressID": 4, "type": "IFCSITE", "children": []},
                {"expressID": 20, "type": "IFCSPACE"}
            ]
        });
        let root = SpatialNode::from_json(&raw).unwrap();
        assert_eq!(root.name.as_deref(), Some("Demo"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].node_type(), SpatialNodeType::Site);
        assert_eq!(root.children[1].node_type(), SpatialNodeType::Space);
    }

    #[test]
    fn test_from_json_rejects_bad_children() {
        let raw = json!({"expressID": 1, "type": "IFCPROJECT", "children": 3});
        assert!(SpatialNode::from_json(&raw).is_err());
    }

    #[test]
    fn test_iteration_order() {
        let tree = sample();
        let ids: Vec<u32> = tree
            .root()
            .iter()
            .filter_map(|n| n.express_id.map(|id| id.0))
            .collect();
        assert_eq!(ids, vec![1, 4, 6, 8, 10, 11]);
    }
}
