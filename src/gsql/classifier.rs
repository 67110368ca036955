//! Structural classification of query output.
//!
//! Query output mixes vertex sets, edge sets, scalars and nested containers
//! with no type tag. Entries are told apart by the keys they carry:
//!
//! - `v_id` and `v_type`: a vertex
//! - `e_type`, `from_id` and `to_id`: an edge
//! - anything else: "other" output, labeled by the key it was printed under
//!
//! # Example
//!
//! ```rust
//! use tigergraph::gsql::classify;
//!
//! let raw = r#"[{"Result": [
//!     {"v_id": "c1", "v_type": "company", "attributes": {"name": "Acme"}}
//! ]}, {"total": 1}]"#;
//!
//! let result = classify(raw, false);
//! assert_eq!(result.vertices()["company"].len(), 1);
//! assert_eq!(result.other()[0].label, "total");
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::gsql::errors::ClassificationError;

/// Structural shape of one JSON value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Object with `v_id` and `v_type`.
    Vertex,
    /// Object with `e_type`, `from_id` and `to_id`.
    Edge,
    /// Null, boolean, number or string.
    Scalar,
    /// Array or any other object.
    Container,
}

impl Shape {
    /// Classifies `value` by the keys it carries.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::of_object(map),
            Value::Array(_) => Self::Container,
            _ => Self::Scalar,
        }
    }

    fn of_object(map: &Map<String, Value>) -> Self {
        if map.get("v_type").is_some_and(Value::is_string) && map.get("v_id").is_some_and(is_id) {
            Self::Vertex
        } else if map.get("e_type").is_some_and(Value::is_string)
            && map.get("from_id").is_some_and(is_id)
            && map.get("to_id").is_some_and(is_id)
        {
            Self::Edge
        } else {
            Self::Container
        }
    }

    /// Whether the shape is a vertex or an edge.
    #[must_use]
    pub const fn is_graph_element(self) -> bool {
        matches!(self, Self::Vertex | Self::Edge)
    }
}

fn is_id(value: &Value) -> bool {
    value.is_string() || value.is_number()
}

fn id_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn attributes_of(map: &Map<String, Value>) -> Map<String, Value> {
    match map.get("attributes") {
        Some(Value::Object(attributes)) => attributes.clone(),
        _ => Map::new(),
    }
}

/// One vertex of the output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VertexInstance {
    /// Primary id.
    #[serde(rename = "v_id")]
    pub id: String,
    /// Vertex type name.
    #[serde(rename = "v_type")]
    pub vertex_type: String,
    /// Attribute values.
    pub attributes: Map<String, Value>,
    /// Label of the print block the vertex was found in.
    #[serde(skip)]
    pub source: String,
}

impl VertexInstance {
    fn from_map(map: &Map<String, Value>, source: &str) -> Self {
        Self {
            id: id_text(map.get("v_id")),
            vertex_type: id_text(map.get("v_type")),
            attributes: attributes_of(map),
            source: source.to_string(),
        }
    }
}

/// One edge of the output. Edges have no id of their own.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgeInstance {
    /// Edge type name.
    #[serde(rename = "e_type")]
    pub edge_type: String,
    /// Source vertex type.
    pub from_type: String,
    /// Source vertex id.
    pub from_id: String,
    /// Target vertex type.
    pub to_type: String,
    /// Target vertex id.
    pub to_id: String,
    /// Whether the edge type is directed.
    pub directed: bool,
    /// Attribute values.
    pub attributes: Map<String, Value>,
    /// Label of the print block the edge was found in.
    #[serde(skip)]
    pub source: String,
}

impl EdgeInstance {
    fn from_map(map: &Map<String, Value>, source: &str) -> Self {
        Self {
            edge_type: id_text(map.get("e_type")),
            from_type: id_text(map.get("from_type")),
            from_id: id_text(map.get("from_id")),
            to_type: id_text(map.get("to_type")),
            to_id: id_text(map.get("to_id")),
            directed: map
                .get("directed")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            attributes: attributes_of(map),
            source: source.to_string(),
        }
    }

    /// Identifier composed from type and endpoints,
    /// e.g. `works_at:person(p1)->company(c1)`.
    #[must_use]
    pub fn composite_id(&self) -> String {
        format!(
            "{}:{}({})->{}({})",
            self.edge_type, self.from_type, self.from_id, self.to_type, self.to_id
        )
    }
}

/// Output that is neither a vertex nor an edge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OtherEntry {
    /// Key the value was printed under, or `#<n>` for unlabeled values.
    pub label: String,
    /// The value.
    pub value: Value,
}

/// Output partitioned into vertices, edges and other entries.
///
/// Buckets keep the order instances appeared in the input.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClassifiedResult {
    vertices: BTreeMap<String, Vec<VertexInstance>>,
    edges: BTreeMap<String, Vec<EdgeInstance>>,
    other: Vec<OtherEntry>,
}

impl ClassifiedResult {
    /// Vertices by type name.
    #[must_use]
    pub const fn vertices(&self) -> &BTreeMap<String, Vec<VertexInstance>> {
        &self.vertices
    }

    /// Edges by type name.
    #[must_use]
    pub const fn edges(&self) -> &BTreeMap<String, Vec<EdgeInstance>> {
        &self.edges
    }

    /// Other output, in input order.
    #[must_use]
    pub fn other(&self) -> &[OtherEntry] {
        &self.other
    }

    /// Total number of vertex instances.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.values().map(Vec::len).sum()
    }

    /// Total number of edge instances.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Whether nothing was classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.other.is_empty()
    }

    /// Vertices with repeated ids merged, keeping first-appearance order.
    /// Later attribute values overwrite earlier ones. Each merged vertex
    /// counts its occurrences and lists the print blocks it came from.
    #[must_use]
    pub fn unique_vertices(&self) -> BTreeMap<String, Vec<UniqueInstance<VertexInstance>>> {
        self.vertices
            .iter()
            .map(|(vertex_type, instances)| {
                let merged = merge_by(
                    instances,
                    |v| v.id.clone(),
                    |v| &v.source,
                    |v| &mut v.attributes,
                );
                (vertex_type.clone(), merged)
            })
            .collect()
    }

    /// Edges with repeated [`EdgeInstance::composite_id`]s merged, keeping
    /// first-appearance order.
    #[must_use]
    pub fn unique_edges(&self) -> BTreeMap<String, Vec<UniqueInstance<EdgeInstance>>> {
        self.edges
            .iter()
            .map(|(edge_type, instances)| {
                let merged = merge_by(
                    instances,
                    EdgeInstance::composite_id,
                    |e| &e.source,
                    |e| &mut e.attributes,
                );
                (edge_type.clone(), merged)
            })
            .collect()
    }

    /// Serializes back into print-block form.
    ///
    /// Classifying the returned value reproduces this partition.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut blocks = Vec::new();
        for instances in self.vertices.values() {
            push_runs(&mut blocks, instances, |v| &v.source);
        }
        for instances in self.edges.values() {
            push_runs(&mut blocks, instances, |e| &e.source);
        }
        for entry in &self.other {
            let mut block = Map::new();
            block.insert(entry.label.clone(), entry.value.clone());
            blocks.push(Value::Object(block));
        }
        Value::Array(blocks)
    }
}

/// A vertex or edge with its repeats merged in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UniqueInstance<T> {
    /// The first occurrence, with attributes of later ones merged in.
    #[serde(flatten)]
    pub instance: T,
    /// How often the instance occurred.
    pub occurrences: usize,
    /// Print-block label of each occurrence, in input order.
    pub sources: Vec<String>,
}

/// One print block per run of instances sharing a source label, keyed by
/// that label, so classifying the blocks restores each source.
fn push_runs<T: Serialize>(
    blocks: &mut Vec<Value>,
    instances: &[T],
    source: impl Fn(&T) -> &String,
) {
    let mut start = 0;
    while start < instances.len() {
        let label = source(&instances[start]);
        let len = instances[start..]
            .iter()
            .take_while(|i| source(*i) == label)
            .count();
        let mut block = Map::new();
        block.insert(label.clone(), serde_json::json!(&instances[start..start + len]));
        blocks.push(Value::Object(block));
        start += len;
    }
}

fn merge_by<T: Clone>(
    instances: &[T],
    key: impl Fn(&T) -> String,
    source: impl Fn(&T) -> &String,
    attributes: impl Fn(&mut T) -> &mut Map<String, Value>,
) -> Vec<UniqueInstance<T>> {
    let mut merged: Vec<UniqueInstance<T>> = Vec::new();
    let mut positions: BTreeMap<String, usize> = BTreeMap::new();
    for instance in instances {
        let id = key(instance);
        if let Some(&index) = positions.get(&id) {
            let mut incoming = instance.clone();
            let incoming = std::mem::take(attributes(&mut incoming));
            let unique = &mut merged[index];
            attributes(&mut unique.instance).extend(incoming);
            unique.occurrences += 1;
            unique.sources.push(source(instance).clone());
        } else {
            positions.insert(id, merged.len());
            merged.push(UniqueInstance {
                instance: instance.clone(),
                occurrences: 1,
                sources: vec![source(instance).clone()],
            });
        }
    }
    merged
}

/// Classifies raw client or endpoint output.
///
/// Text that is not JSON as a whole is searched for a JSON object or array
/// on lines of its own, since the client may print banner lines before it
/// and status lines after it. Text without one is a single other entry
/// labeled `#0`, holding the text as given. With `restrict_to_graph_elements`, other
/// entries are dropped.
#[must_use]
pub fn classify(raw: &str, restrict_to_graph_elements: bool) -> ClassifiedResult {
    match parse_output(raw) {
        Some(value) => classify_value(value, restrict_to_graph_elements),
        None => {
            let mut walker = Walker::new(restrict_to_graph_elements);
            if !raw.trim().is_empty() {
                walker.push_other("#0".to_string(), Value::String(raw.to_string()));
            }
            walker.result
        }
    }
}

/// Classifies already-parsed output.
///
/// An array root is a list of print blocks. An object root carrying a
/// `results` array (the REST++ envelope) is classified through `results`.
#[must_use]
pub fn classify_value(value: Value, restrict_to_graph_elements: bool) -> ClassifiedResult {
    let mut walker = Walker::new(restrict_to_graph_elements);
    walker.root(value);
    walker.result
}

/// Classifies raw bytes, rejecting output that is not text.
///
/// # Errors
///
/// Returns [`ClassificationError`] for NUL bytes or invalid UTF-8.
pub fn classify_bytes(
    raw: &[u8],
    restrict_to_graph_elements: bool,
) -> Result<ClassifiedResult, ClassificationError> {
    if let Some(offset) = raw.iter().position(|b| *b == 0) {
        return Err(ClassificationError::Binary { offset });
    }
    let text = std::str::from_utf8(raw).map_err(|e| ClassificationError::NotUtf8 {
        offset: e.valid_up_to(),
    })?;
    Ok(classify(text, restrict_to_graph_elements))
}

fn parse_output(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    line_starts(trimmed).find_map(|start| value_on_own_lines(&trimmed[start..]))
}

fn line_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(text.match_indices('\n').map(|(i, _)| i + 1))
}

/// Parses a JSON object or array at the start of `text`. Text may follow
/// it only from the next line on.
fn value_on_own_lines(text: &str) -> Option<Value> {
    let body = text.trim_start_matches([' ', '\t']);
    if !body.starts_with(['{', '[']) {
        return None;
    }
    let mut stream = serde_json::Deserializer::from_str(body).into_iter::<Value>();
    let value = stream.next()?.ok()?;
    let rest = body[stream.byte_offset()..].trim_start_matches([' ', '\t', '\r']);
    (rest.is_empty() || rest.starts_with('\n')).then_some(value)
}

struct Walker {
    restrict: bool,
    result: ClassifiedResult,
}

impl Walker {
    fn new(restrict: bool) -> Self {
        Self {
            restrict,
            result: ClassifiedResult::default(),
        }
    }

    fn root(&mut self, value: Value) {
        match value {
            Value::Array(blocks) => {
                for (index, block) in blocks.into_iter().enumerate() {
                    self.block(format!("#{index}"), block);
                }
            }
            Value::Object(mut map)
                if Shape::of_object(&map) == Shape::Container
                    && map.get("results").is_some_and(Value::is_array) =>
            {
                if let Some(results) = map.remove("results") {
                    self.root(results);
                }
            }
            other => self.block("#0".to_string(), other),
        }
    }

    fn block(&mut self, position: String, block: Value) {
        match Shape::of(&block) {
            Shape::Vertex | Shape::Edge => self.push_element(&position, &block),
            Shape::Container => match block {
                Value::Object(map) => {
                    for (label, value) in map {
                        let source = label.clone();
                        self.labeled(&source, label, value);
                    }
                }
                other => {
                    let source = position.clone();
                    self.labeled(&source, position, other);
                }
            },
            Shape::Scalar => self.push_other(position, block),
        }
    }

    /// Routes `value`; graph elements are recorded under `source`, the label
    /// of the enclosing print block.
    fn labeled(&mut self, source: &str, label: String, value: Value) {
        match Shape::of(&value) {
            Shape::Vertex | Shape::Edge => self.push_element(source, &value),
            Shape::Scalar => self.push_other(label, value),
            Shape::Container if !contains_graph_element(&value) => self.push_other(label, value),
            Shape::Container => match value {
                Value::Array(items) => {
                    for (index, item) in items.into_iter().enumerate() {
                        self.labeled(source, format!("{label}[{index}]"), item);
                    }
                }
                Value::Object(map) => {
                    for (key, item) in map {
                        self.labeled(source, format!("{label}.{key}"), item);
                    }
                }
                scalar => self.push_other(label, scalar),
            },
        }
    }

    fn push_element(&mut self, source: &str, value: &Value) {
        let Value::Object(map) = value else {
            return;
        };
        match Shape::of(value) {
            Shape::Vertex => {
                let vertex = VertexInstance::from_map(map, source);
                self.result
                    .vertices
                    .entry(vertex.vertex_type.clone())
                    .or_default()
                    .push(vertex);
            }
            Shape::Edge => {
                let edge = EdgeInstance::from_map(map, source);
                self.result
                    .edges
                    .entry(edge.edge_type.clone())
                    .or_default()
                    .push(edge);
            }
            Shape::Scalar | Shape::Container => {}
        }
    }

    fn push_other(&mut self, label: String, value: Value) {
        if !self.restrict {
            self.result.other.push(OtherEntry { label, value });
        }
    }
}

fn contains_graph_element(value: &Value) -> bool {
    if Shape::of(value).is_graph_element() {
        return true;
    }
    match value {
        Value::Array(items) => items.iter().any(contains_graph_element),
        Value::Object(map) => map.values().any(contains_graph_element),
        _ => false,
    }
}
