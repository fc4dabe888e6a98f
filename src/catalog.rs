//! Image tag catalog for the test matrix.
//!
//! The monitor image ships in three release lines (hammer, jewel,
//! infernalis) across several OS bases. The catalog is configuration
//! data: one parameterized lifecycle consumes whichever subset a suite
//! asks for, instead of one copy-pasted fixture per line.

use serde::{Deserialize, Serialize};

/// Release lines present in the default catalog.
pub const RELEASE_LINES: [&str; 3] = ["hammer", "jewel", "infernalis"];

/// The set of image tags a suite can run against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TagCatalog {
    tags: Vec<String>,
}

impl Default for TagCatalog {
    fn default() -> Self {
        Self {
            tags: [
                "ceph/daemon:tag-build-master-hammer-centos-7",
                "ceph/daemon:tag-build-master-infernalis-centos-7",
                "ceph/daemon:tag-build-master-jewel-centos-7",
                "ceph/daemon:tag-build-master-hammer-ubuntu-16.04",
                "ceph/daemon:tag-build-master-infernalis-ubuntu-16.04",
                "ceph/daemon:tag-build-master-jewel-ubuntu-16.04",
                "ceph/daemon:tag-build-master-hammer-ubuntu-14.04",
                "ceph/daemon:tag-build-master-infernalis-ubuntu-14.04",
                "ceph/daemon:tag-build-master-jewel-ubuntu-14.04",
                "ceph/daemon:tag-build-master-jewel-fedora-23",
                "ceph/daemon:tag-build-master-jewel-fedora-24",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl TagCatalog {
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }

    /// Every tag, in catalog order.
    pub fn all(&self) -> &[String] {
        &self.tags
    }

    /// Tags whose reference contains the given release-line name.
    pub fn release_line(&self, line: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|tag| tag.contains(line))
            .map(String::as_str)
            .collect()
    }

    pub fn first(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
