//! Skeleton - named joint hierarchy with local rotations

use std::sync::atomic::{AtomicU64, Ordering};

use posemirror_core::Rotation3D;

static NEXT_SKELETON_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one skeleton instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkeletonId(u64);

impl SkeletonId {
    fn next() -> Self {
        SkeletonId(NEXT_SKELETON_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to a joint, valid for the skeleton that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointId(usize);

impl JointId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Joint {
    name: String,
    parent: Option<JointId>,
    children: Vec<JointId>,
    local_rotation: Rotation3D,
}

/// Joint hierarchy of one avatar
///
/// Joints are stored in an arena; a parent is always created before its
/// children, so a joint's index is greater than its parent's.
#[derive(Debug)]
pub struct Skeleton {
    id: SkeletonId,
    joints: Vec<Joint>,
}

impl Skeleton {
    /// Create a skeleton containing only its root joint
    pub fn new(root_name: impl Into<String>) -> Self {
        Skeleton {
            id: SkeletonId::next(),
            joints: vec![Joint {
                name: root_name.into(),
                parent: None,
                children: Vec::new(),
                local_rotation: Rotation3D::identity(),
            }],
        }
    }

    pub fn id(&self) -> SkeletonId {
        self.id
    }

    pub fn root(&self) -> JointId {
        JointId(0)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Add a named joint under `parent`
    pub fn add_joint(&mut self, parent: JointId, name: impl Into<String>) -> JointId {
        let id = JointId(self.joints.len());
        self.joints.push(Joint {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            local_rotation: Rotation3D::identity(),
        });
        self.joints[parent.0].children.push(id);
        id
    }

    /// Walk a root-relative path, creating any missing joints along it
    pub fn ensure_path(&mut self, path: &str) -> JointId {
        let mut current = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match self.child(current, segment) {
                Some(existing) => existing,
                None => self.add_joint(current, segment),
            };
        }
        current
    }

    pub fn name(&self, joint: JointId) -> Option<&str> {
        self.joints.get(joint.0).map(|j| j.name.as_str())
    }

    pub fn parent(&self, joint: JointId) -> Option<JointId> {
        self.joints.get(joint.0).and_then(|j| j.parent)
    }

    pub fn children(&self, joint: JointId) -> &[JointId] {
        self.joints
            .get(joint.0)
            .map(|j| j.children.as_slice())
            .unwrap_or(&[])
    }

    /// First direct child of `parent` called `name`
    pub fn child(&self, parent: JointId, name: &str) -> Option<JointId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.joints[c.0].name == name)
    }

    /// Resolve a slash-delimited path relative to `start`
    pub fn find_from(&self, start: JointId, path: &str) -> Option<JointId> {
        if path.is_empty() || start.0 >= self.joints.len() {
            return None;
        }
        path.split('/')
            .try_fold(start, |current, segment| self.child(current, segment))
    }

    /// Resolve a root-relative path (the root's own name is not part of it)
    pub fn find(&self, path: &str) -> Option<JointId> {
        self.find_from(self.root(), path)
    }

    pub fn local_rotation(&self, joint: JointId) -> Option<Rotation3D> {
        self.joints.get(joint.0).map(|j| j.local_rotation)
    }

    /// Overwrite a joint's local rotation. Returns `false` for foreign handles.
    pub fn set_local_rotation(&mut self, joint: JointId, rotation: Rotation3D) -> bool {
        match self.joints.get_mut(joint.0) {
            Some(j) => {
                j.local_rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// World rotation: local rotations composed from the root down
    pub fn world_rotation(&self, joint: JointId) -> Option<Rotation3D> {
        let mut current = self.joints.get(joint.0)?;
        let mut world = current.local_rotation;
        while let Some(parent) = current.parent {
            current = &self.joints[parent.0];
            world = current.local_rotation * world;
        }
        Some(world)
    }
}
