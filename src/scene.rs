use crate::color::Color;
use crate::light::{DirectionalLight, HemisphereLight};
use crate::mesh::Mesh;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub enum Node {
    HemisphereLight(HemisphereLight),
    DirectionalLight(DirectionalLight),
    Mesh(Mesh),
}

impl From<HemisphereLight> for Node {
    fn from(light: HemisphereLight) -> Self {
        Node::HemisphereLight(light)
    }
}

impl From<DirectionalLight> for Node {
    fn from(light: DirectionalLight) -> Self {
        Node::DirectionalLight(light)
    }
}

impl From<Mesh> for Node {
    fn from(mesh: Mesh) -> Self {
        Node::Mesh(mesh)
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    children: Vec<Node>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            children: Vec::new(),
        }
    }

    pub fn add(&mut self, node: impl Into<Node>) -> NodeId {
        let id = NodeId(self.children.len());
        self.children.push(node.into());
        id
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn mesh(&self, id: NodeId) -> Option<&Mesh> {
        match self.children.get(id.0) {
            Some(Node::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Option<&mut Mesh> {
        match self.children.get_mut(id.0) {
            Some(Node::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.children.iter().filter_map(|node| match node {
            Node::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    pub fn hemisphere_lights(&self) -> impl Iterator<Item = &HemisphereLight> {
        self.children.iter().filter_map(|node| match node {
            Node::HemisphereLight(light) => Some(light),
            _ => None,
        })
    }

    pub fn directional_lights(&self) -> impl Iterator<Item = &DirectionalLight> {
        self.children.iter().filter_map(|node| match node {
            Node::DirectionalLight(light) => Some(light),
            _ => None,
        })
    }
}
