use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::actions::ControlAction;
use crate::assets::AssetSource;
use crate::material::Material;
use crate::obj::{load_obj_from_str, TriMesh};

/// Index of a node inside its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees, applied X, then Y, then Z.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: unit_scale(),
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

/// Pickable geometry carried by a node, expressed in the node's local space.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Box { half_extents: Vec3 },
    Mesh(Arc<TriMesh>),
}

/// Element of the loaded model hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub geometry: Option<Geometry>,
    pub material: Option<Material>,
    action: Option<ControlAction>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            geometry: None,
            material: None,
            action: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Action bound to this exact node, if any.
    pub fn action(&self) -> Option<ControlAction> {
        self.action
    }

    pub(crate) fn set_action(&mut self, action: ControlAction) {
        self.action = Some(action);
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed node tree of a loaded model. Shape is fixed after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Creates a graph containing only a root node.
    pub fn new(root: SceneNode) -> Self {
        let mut root = root;
        root.parent = None;
        root.children.clear();
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = node;
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).map(|node| node.name.as_str()).unwrap_or("")
    }

    /// Depth-first, pre-order search for the first node called `name`.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.nodes[id.0].name == name)
    }

    /// Returns `start` and all of its descendants in pre-order.
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Composes the transforms from the root down to `id`.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.node(current) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            cursor = node.parent;
        }
        matrix
    }

    /// Parses the model XML, loading referenced OBJ meshes through `assets`.
    pub fn from_xml(xml: &str, assets: &dyn AssetSource) -> Result<Self> {
        let document = Document::parse(xml).context("invalid model XML")?;
        let root_element = document.root_element();
        if !root_element.has_tag_name("model") {
            return Err(anyhow!(
                "expected <model> root element, found <{}>",
                root_element.tag_name().name()
            ));
        }

        let root_name =
            optional_text(&root_element, "name").unwrap_or_else(|| "Scene".to_string());
        let mut root = SceneNode::new(root_name);
        root.transform = parse_transform(&root_element)?;
        let mut graph = SceneGraph::new(root);

        let mut pending: Vec<(NodeId, Node<'_, '_>)> = child_nodes(&root_element)
            .rev()
            .map(|element| (graph.root(), element))
            .collect();
        while let Some((parent, element)) = pending.pop() {
            let node = parse_node(&element, assets)?;
            let id = graph.add_child(parent, node);
            pending.extend(child_nodes(&element).rev().map(|child| (id, child)));
        }
        Ok(graph)
    }
}

fn child_nodes<'a, 'input>(
    element: &Node<'a, 'input>,
) -> impl DoubleEndedIterator<Item = Node<'a, 'input>> {
    element
        .children()
        .filter(|child| child.has_tag_name("node"))
        .collect::<Vec<_>>()
        .into_iter()
}

fn parse_node(element: &Node<'_, '_>, assets: &dyn AssetSource) -> Result<SceneNode> {
    let name = optional_text(element, "name").ok_or_else(|| anyhow!("<name> tag is missing"))?;
    let mut node = SceneNode::new(name.clone());
    node.transform =
        parse_transform(element).with_context(|| format!("invalid transform on node {name}"))?;

    if let Some(size) = optional_text(element, "box") {
        let size = parse_vec3(&size).with_context(|| format!("invalid <box> on node {name}"))?;
        node.geometry = Some(Geometry::Box {
            half_extents: size * 0.5,
        });
    } else if let Some(mesh_id) = optional_text(element, "mesh") {
        let text = assets
            .fetch_text(&mesh_id)
            .with_context(|| format!("failed to fetch mesh {mesh_id} for node {name}"))?;
        let mesh = load_obj_from_str(&text)
            .with_context(|| format!("failed to parse mesh {mesh_id} for node {name}"))?;
        node.geometry = Some(Geometry::Mesh(Arc::new(mesh)));
    }

    if let Some(color) = optional_text(element, "color") {
        let color = parse_vec3(&color).with_context(|| format!("invalid <color> on node {name}"))?;
        node.material = Some(Material::Standard {
            color: color / 255.0,
        });
    } else if node.geometry.is_some() {
        node.material = Some(Material::default());
    }
    Ok(node)
}

fn parse_transform(element: &Node<'_, '_>) -> Result<Transform> {
    let mut transform = Transform::default();
    if let Some(value) = optional_text(element, "position") {
        transform.position = parse_vec3(&value)?;
    }
    if let Some(value) = optional_text(element, "rotation") {
        transform.rotation = parse_vec3(&value)?;
    }
    if let Some(value) = optional_text(element, "scale") {
        transform.scale = parse_vec3(&value)?;
    }
    Ok(transform)
}

pub(crate) fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

pub(crate) fn parse_vec3(value: &str) -> Result<Vec3> {
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("invalid vector component {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "vector must have 3 components, found {}",
            numbers.len()
        )),
    }
}
