//! Property graph projection of entities.
//!
//! Entities with edge-shaped schemata become relationship edges; all
//! others become entity nodes, with reified value nodes (names, URLs,
//! countries by default) attached by specificity-weighted edges.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use crate::error::{GraphError, Result};
use crate::model::property::Property;
use crate::model::Model;
use crate::proxy::EntityProxy;
use crate::types::registry::registry;
use crate::types::PropertyType;

/// A graph node: either an entity or a reified property value.
#[derive(Clone)]
pub struct Node<'m> {
    pub id: String,
    pub value: String,
    pub ptype: &'static dyn PropertyType,
    /// Schema name, when one is known for the node.
    pub schema: Option<String>,
    /// The full entity, when the node was built from one.
    pub proxy: Option<EntityProxy<'m>>,
}

impl<'m> Node<'m> {
    fn new(ptype: &'static dyn PropertyType, value: &str) -> Node<'m> {
        Node {
            id: ptype.node_id(value).unwrap_or_default(),
            value: value.to_string(),
            ptype,
            schema: None,
            proxy: None,
        }
    }

    fn from_proxy(proxy: &EntityProxy<'m>) -> Option<Node<'m>> {
        if proxy.id.is_empty() {
            return None;
        }
        let mut node = Node::new(registry().get_or_string("entity"), &proxy.id);
        node.schema = Some(proxy.schema().name.clone());
        node.proxy = Some(proxy.clone());
        Some(node)
    }

    pub fn is_entity(&self) -> bool {
        self.ptype.name() == "entity"
    }

    /// Display caption: the entity caption when available, the raw value
    /// otherwise.
    pub fn caption(&self) -> String {
        match &self.proxy {
            Some(proxy) => proxy.caption(),
            None => self.ptype.caption(&self.value, None),
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.ptype.name())
            .field("schema", &self.schema)
            .finish()
    }
}

/// A relationship between two nodes, weighted by value specificity.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub weight: f64,
    pub source_id: String,
    pub target_id: String,
    /// Qualified name of the property that formed a value edge.
    pub prop: Option<String>,
    /// Schema name of the relationship entity that formed the edge.
    pub schema: Option<String>,
    /// Qualified name of the reverse stub the source entity's schema
    /// holds for a relationship edge, resolved at projection time.
    pub source_stub: Option<String>,
    /// Likewise for the target entity's schema.
    pub target_stub: Option<String>,
}

impl Edge {
    /// The label to render the edge with: the schema name for
    /// relationship edges, the property name otherwise.
    pub fn type_name(&self) -> &str {
        self.schema
            .as_deref()
            .or(self.prop.as_deref())
            .unwrap_or("")
    }

    /// The property through which the source node sees this edge: the
    /// reverse stub for relationship edges, the forward property for
    /// value edges.
    pub fn source_prop(&self) -> Option<&str> {
        self.source_stub.as_deref().or(self.prop.as_deref())
    }

    /// The property through which the target node sees this edge.
    /// Always a reverse stub; `None` for value edges.
    pub fn target_prop(&self) -> Option<&str> {
        self.target_stub.as_deref()
    }
}

/// Resolve an entity property's reverse stub on its range schema,
/// returning the stub's qualified name.
fn reverse_stub_qname(model: &Model, prop: &Property) -> Option<String> {
    let range = model.get(prop.range.as_deref()?)?;
    let stub = range.get(prop.reverse.as_deref()?)?;
    stub.stub.then(|| stub.qname.clone())
}

pub struct Graph<'m> {
    edge_types: Vec<&'static dyn PropertyType>,
    graph: DiGraph<Node<'m>, Edge>,
    node_ids: HashMap<String, NodeIndex>,
    edge_ids: HashMap<String, EdgeIndex>,
    /// Entity IDs seen anywhere; `None` until the full entity arrives.
    proxies: BTreeMap<String, Option<EntityProxy<'m>>>,
}

impl<'m> Graph<'m> {
    /// A graph reifying the default value types: names, URLs, countries.
    pub fn new() -> Graph<'m> {
        let defaults = ["name", "url", "country"]
            .iter()
            .filter_map(|n| registry().get(n))
            .collect();
        Graph::with_edge_types(defaults)
    }

    /// Only matchable types are accepted as reified edge types.
    pub fn with_edge_types(edge_types: Vec<&'static dyn PropertyType>) -> Graph<'m> {
        Graph {
            edge_types: edge_types.into_iter().filter(|t| t.matchable()).collect(),
            graph: DiGraph::new(),
            node_ids: HashMap::new(),
            edge_ids: HashMap::new(),
            proxies: BTreeMap::new(),
        }
    }

    /// Drop all nodes, edges and queued references.
    pub fn flush(&mut self) {
        self.graph.clear();
        self.node_ids.clear();
        self.edge_ids.clear();
        self.proxies.clear();
    }

    /// Record interest in an entity ID; the full entity replaces the
    /// placeholder when it arrives.
    pub fn queue(&mut self, id: &str, proxy: Option<&EntityProxy<'m>>) {
        match proxy {
            Some(p) => {
                self.proxies.insert(id.to_string(), Some(p.clone()));
            }
            None => {
                self.proxies.entry(id.to_string()).or_insert(None);
            }
        }
    }

    /// IDs referenced by edges but not yet resolved to a full entity.
    pub fn queued(&self) -> Vec<&str> {
        self.proxies
            .iter()
            .filter(|(_, p)| p.is_none())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Integrate an entity: edge-shaped schemata become relationship
    /// edges, anything else an entity node with reified value nodes.
    pub fn add(&mut self, proxy: &EntityProxy<'m>) {
        if proxy.id.is_empty() {
            return;
        }
        self.queue(&proxy.id, Some(proxy));
        if proxy.schema().is_edge() {
            for (source, target) in proxy.edge_pairs() {
                self.add_edge_proxy(proxy, &source, &target);
            }
        } else {
            self.add_node(proxy);
        }
    }

    fn upsert_node(&mut self, node: Node<'m>) -> Option<NodeIndex> {
        if node.id.is_empty() {
            return None;
        }
        if let Some(&idx) = self.node_ids.get(&node.id) {
            // First insertion wins, but an entity node may replace a
            // bare stub for the same ID.
            if node.proxy.is_some() && self.graph[idx].proxy.is_none() {
                self.graph[idx] = node;
            }
            return Some(idx);
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_ids.insert(id, idx);
        Some(idx)
    }

    fn node_stub(&mut self, prop: &Property, value: &str) -> Option<NodeIndex> {
        if prop.is_entity() {
            self.queue(value, None);
        }
        let mut node = Node::new(prop.ptype, value);
        node.schema = prop.range.clone();
        self.upsert_node(node)
    }

    fn insert_edge(&mut self, edge: Edge) {
        let (Some(&src), Some(&dst)) = (
            self.node_ids.get(&edge.source_id),
            self.node_ids.get(&edge.target_id),
        ) else {
            return;
        };
        if let Some(&idx) = self.edge_ids.get(&edge.id) {
            self.graph[idx] = edge;
            return;
        }
        let id = edge.id.clone();
        let idx = self.graph.add_edge(src, dst, edge);
        self.edge_ids.insert(id, idx);
    }

    fn add_edge_proxy(&mut self, proxy: &EntityProxy<'m>, source: &str, target: &str) {
        let schema = proxy.schema();
        let Some(edge_spec) = &schema.edge else { return };
        let (Some(sp), Some(tp)) = (schema.get(&edge_spec.source), schema.get(&edge_spec.target))
        else {
            return;
        };
        let Some(src) = self.node_stub(sp, source) else {
            return;
        };
        let Some(dst) = self.node_stub(tp, target) else {
            return;
        };
        let (src_id, dst_id) = (self.graph[src].id.clone(), self.graph[dst].id.clone());
        let model = proxy.model();
        self.insert_edge(Edge {
            id: format!("{src_id}<{}>{dst_id}", proxy.id),
            weight: 1.0,
            source_id: src_id,
            target_id: dst_id,
            prop: None,
            schema: Some(schema.name.clone()),
            source_stub: reverse_stub_qname(model, sp),
            target_stub: reverse_stub_qname(model, tp),
        });
    }

    fn add_node(&mut self, proxy: &EntityProxy<'m>) {
        let Some(entity_node) = Node::from_proxy(proxy) else {
            return;
        };
        let entity_id = entity_node.id.clone();
        self.upsert_node(entity_node);
        for (prop, value) in proxy.iter_values() {
            if !self.edge_types.iter().any(|t| t.name() == prop.ptype.name()) {
                continue;
            }
            let weight = prop.ptype.specificity(value);
            if weight <= 0.0 {
                continue;
            }
            let Some(value_idx) = self.node_stub(prop, value) else {
                continue;
            };
            let value_id = self.graph[value_idx].id.clone();
            self.insert_edge(Edge {
                id: format!("{entity_id}<>{value_id}"),
                weight,
                source_id: entity_id.clone(),
                target_id: value_id,
                prop: Some(prop.qname.clone()),
                schema: None,
                source_stub: None,
                target_stub: None,
            });
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node<'m>> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    pub fn node(&self, id: &str) -> Result<&Node<'m>> {
        self.node_ids
            .get(id)
            .map(|&idx| &self.graph[idx])
            .ok_or_else(|| {
                GraphError::NodeNotFound {
                    id: id.to_string(),
                }
                .into()
            })
    }
}

impl Default for Graph<'_> {
    fn default() -> Self {
        Graph::new()
    }
}
