//! Bone resolution - keys to joints through ranked path templates

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::{JointId, Skeleton, SkeletonId};

/// Ordered registry of key -> candidate paths (first match wins)
#[derive(Debug, Clone)]
pub struct BoneTemplates<K> {
    entries: Vec<(K, Vec<String>)>,
}

impl<K> Default for BoneTemplates<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> BoneTemplates<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register candidates for a key, replacing any previous entry
    pub fn insert<I, S>(&mut self, key: K, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = candidates,
            None => self.entries.push((key, candidates)),
        }
    }

    /// Builder form of [`Self::insert`]
    pub fn with<I, S>(mut self, key: K, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(key, candidates);
        self
    }

    /// Register `relative` paths both under an `Armature` root and bare
    pub fn with_armature_variants(self, key: K, relative: &[&str]) -> Self {
        let candidates: Vec<String> = relative
            .iter()
            .flat_map(|p| [format!("Armature/{}", p), (*p).to_string()])
            .collect();
        self.with(key, candidates)
    }

    pub fn candidates(&self, key: &K) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Keys matching a predicate, e.g. the leg bones to exclude
    pub fn keys_where(&self, predicate: impl Fn(&K) -> bool) -> HashSet<K> {
        self.keys().filter(|k| predicate(k)).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[String])> {
        self.entries.iter().map(|(k, c)| (k, c.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolved-count disagreement between two maps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatch {
    pub left: usize,
    pub right: usize,
}

/// Key -> joint handles for one specific skeleton
///
/// Immutable once built; rebuild with [`resolve`] instead of patching.
#[derive(Debug, Clone)]
pub struct JointMap<K> {
    skeleton: SkeletonId,
    entries: Vec<(K, JointId)>,
    index: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash> JointMap<K> {
    /// Skeleton the handles belong to
    pub fn skeleton(&self) -> SkeletonId {
        self.skeleton
    }

    /// Whether the handles are valid for `skeleton`
    pub fn is_for(&self, skeleton: &Skeleton) -> bool {
        self.skeleton == skeleton.id()
    }

    pub fn get(&self, key: &K) -> Option<JointId> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Entries in template order
    pub fn iter(&self) -> impl Iterator<Item = (&K, JointId)> {
        self.entries.iter().map(|(k, j)| (k, *j))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostic for two maps that should cover the same vocabulary
    pub fn count_mismatch(&self, other: &JointMap<K>) -> Option<CountMismatch> {
        if self.len() == other.len() {
            None
        } else {
            Some(CountMismatch {
                left: self.len(),
                right: other.len(),
            })
        }
    }
}

/// Map every non-excluded template key to the first candidate path that
/// exists under `skeleton`'s root. Keys without a match are left out.
///
/// Read-only; safe to call every tick until a skeleton is ready.
pub fn resolve<K: Clone + Eq + Hash>(
    skeleton: &Skeleton,
    templates: &BoneTemplates<K>,
    exclude: &HashSet<K>,
) -> JointMap<K> {
    let mut entries = Vec::with_capacity(templates.len());
    let mut index = HashMap::with_capacity(templates.len());

    for (key, candidates) in templates.iter() {
        if exclude.contains(key) {
            continue;
        }
        if let Some(joint) = candidates.iter().find_map(|path| skeleton.find(path)) {
            index.insert(key.clone(), entries.len());
            entries.push((key.clone(), joint));
        }
    }

    tracing::debug!(
        "resolved {} of {} keys on skeleton {:?}",
        entries.len(),
        templates.len(),
        skeleton.id()
    );

    JointMap {
        skeleton: skeleton.id(),
        entries,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posemirror_core::BoneKey;

    fn templates() -> BoneTemplates<BoneKey> {
        BoneTemplates::new()
            .with_armature_variants(BoneKey::HIPS, &["Hips"])
            .with_armature_variants("Spine1".into(), &["Hips/Spine/Spine1"])
            .with_armature_variants("LUpLeg".into(), &["Hips/LeftUpLeg"])
    }

    #[test]
    fn test_armature_fallback_resolves() {
        let mut skeleton = Skeleton::new("Live");
        let hips = skeleton.ensure_path("Armature/Hips");

        let map = resolve(&skeleton, &templates(), &HashSet::new());
        assert_eq!(map.get(&BoneKey::HIPS), Some(hips));
        assert!(map.is_for(&skeleton));
    }

    #[test]
    fn test_bare_form_resolves() {
        let mut skeleton = Skeleton::new("Reference");
        let spine1 = skeleton.ensure_path("Hips/Spine/Spine1");

        let map = resolve(&skeleton, &templates(), &HashSet::new());
        assert_eq!(map.get(&"Spine1".into()), Some(spine1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_missing_paths_leave_key_absent() {
        let mut skeleton = Skeleton::new("Odd");
        skeleton.ensure_path("Root/Pelvis");

        let map = resolve(&skeleton, &templates(), &HashSet::new());
        assert!(map.is_empty());
        assert!(!map.contains(&BoneKey::HIPS));
    }

    #[test]
    fn test_excluded_keys_skipped() {
        let mut skeleton = Skeleton::new("Live");
        skeleton.ensure_path("Hips/LeftUpLeg");

        let templates = templates();
        let legs = templates.keys_where(BoneKey::is_leg);
        let map = resolve(&skeleton, &templates, &legs);

        assert!(map.contains(&BoneKey::HIPS));
        assert!(!map.contains(&"LUpLeg".into()));
    }

    #[test]
    fn test_first_candidate_wins() {
        let mut skeleton = Skeleton::new("Both");
        let wrapped = skeleton.ensure_path("Armature/Hips");
        skeleton.ensure_path("Hips");

        let map = resolve(&skeleton, &templates(), &HashSet::new());
        assert_eq!(map.get(&BoneKey::HIPS), Some(wrapped));
    }

    #[test]
    fn test_resolve_is_idempotent_and_reports_mismatch() {
        let mut live = Skeleton::new("Live");
        live.ensure_path("Armature/Hips/Spine/Spine1");
        let mut reference = Skeleton::new("Reference");
        reference.ensure_path("Hips");

        let a = resolve(&live, &templates(), &HashSet::new());
        let b = resolve(&live, &templates(), &HashSet::new());
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());

        let r = resolve(&reference, &templates(), &HashSet::new());
        assert_eq!(a.count_mismatch(&r), Some(CountMismatch { left: 2, right: 1 }));
        assert_eq!(a.count_mismatch(&b), None);
    }
}
