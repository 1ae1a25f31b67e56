//! Hierarchy of test configuration files.
//!
//! Every `save.toml` below the test root becomes a [`ConfigNode`]. Nodes
//! live in an arena owned by [`ConfigTree`]; parent and child links are
//! [`NodeId`] handles into it, so the tree never owns itself cyclically.
//!
//! Resolution runs in two passes over the whole tree, parents first:
//!
//! 1. every node appends the configs declared in its own file and merges
//!    them with the configs of its ancestors, nearest first;
//! 2. every node replaces its configs with their validated form.
//!
//! After resolution the tree is read-only.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::loader::is_config_file;
use crate::config::schema::{ConfigSection, GeneralConfig, PluginConfig};
use crate::error::{Result, SaveError};
use crate::logging::SharedLogger;
use crate::plugin::Plugin;

/// Handle of a node inside a [`ConfigTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in construction order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One configuration file and its resolved plugin configs.
#[derive(Debug, Clone)]
pub struct ConfigNode {
    id: NodeId,
    location: PathBuf,
    directory: PathBuf,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    plugin_configs: Vec<PluginConfig>,
}

impl ConfigNode {
    /// Handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Path of the configuration file.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Directory containing the configuration file.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in construction order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Plugin configs of this node.
    pub fn plugin_configs(&self) -> &[PluginConfig] {
        &self.plugin_configs
    }

    /// The `[general]` config, if any.
    pub fn general_config(&self) -> Option<&GeneralConfig> {
        self.plugin_configs.iter().find_map(|c| match c {
            PluginConfig::General(general) => Some(general),
            _ => None,
        })
    }

    /// Plugin configs other than `[general]`.
    pub fn plugin_configs_without_general(&self) -> impl Iterator<Item = &PluginConfig> {
        self.plugin_configs
            .iter()
            .filter(|c| c.section() != ConfigSection::General)
    }
}

/// Outcome of resolving a whole tree.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Nodes whose own configuration failed, with the reason.
    pub failed: Vec<(NodeId, SaveError)>,
    /// Nodes left unresolved because an ancestor failed.
    pub skipped: Vec<NodeId>,
}

impl Resolution {
    /// Whether the node was fully resolved.
    pub fn is_resolved(&self, id: NodeId) -> bool {
        !self.skipped.contains(&id) && !self.failed.iter().any(|(failed, _)| *failed == id)
    }
}

/// Arena of configuration nodes.
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
    logger: SharedLogger,
}

impl fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigTree")
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

impl ConfigTree {
    /// Create an empty tree.
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            nodes: Vec::new(),
            logger,
        }
    }

    /// Build the tree from every config file below `root`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigStructure` if `root` has no config file of its own.
    ///
    /// A relative `root` is made absolute against the current directory,
    /// so node directories and the test paths found in them stay valid
    /// when a tool runs inside a suite directory.
    pub fn discover(root: &Path, config_name: &str, logger: SharedLogger) -> Result<Self> {
        let root = std::path::absolute(root)?;
        let root_config = root.join(config_name);
        if !root_config.is_file() {
            return Err(SaveError::ConfigStructure {
                path: root_config,
                message: "test root must contain a configuration file".to_string(),
            });
        }

        let mut locations = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && is_config_file(entry.path(), config_name) {
                locations.push(entry.into_path());
            }
        }
        // Shallower files first, so every parent exists before its children.
        locations.sort_by_key(|p| (p.components().count(), p.clone()));

        let mut tree = ConfigTree::new(logger);
        for location in locations {
            let parent = location
                .parent()
                .and_then(|dir| tree.nearest_node_above(dir));
            tree.add_node(location, parent)?;
        }
        Ok(tree)
    }

    fn nearest_node_above(&self, directory: &Path) -> Option<NodeId> {
        directory.ancestors().skip(1).find_map(|ancestor| {
            self.nodes
                .iter()
                .find(|n| n.directory == ancestor)
                .map(|n| n.id)
        })
    }

    /// Add a node for the config file at `location`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigStructure` if `location` is not a regular file, the
    /// parent is unknown, or the file does not lie below the parent's
    /// directory.
    pub fn add_node(
        &mut self,
        location: impl Into<PathBuf>,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let location = location.into();
        let structure_error = |message: &str| SaveError::ConfigStructure {
            path: location.clone(),
            message: message.to_string(),
        };

        let metadata = fs::metadata(&location)
            .map_err(|e| structure_error(&format!("cannot read config file: {}", e)))?;
        if !metadata.is_file() {
            return Err(structure_error(
                "location denotes a directory, but a config must be created from a file",
            ));
        }
        let directory = location
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| structure_error("config file has no parent directory"))?;

        match parent {
            None if !self.nodes.is_empty() => {
                return Err(structure_error("tree already has a root"));
            }
            Some(parent) => {
                let parent_node = self
                    .nodes
                    .get(parent.0)
                    .ok_or_else(|| structure_error("parent node does not exist"))?;
                if directory == parent_node.directory
                    || !directory.starts_with(&parent_node.directory)
                {
                    return Err(structure_error(
                        "config must lie in a sub-directory of its parent config",
                    ));
                }
                self.logger.debug(&format!(
                    "Add child {} for {}",
                    location.display(),
                    parent_node.location.display()
                ));
            }
            None => {}
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(ConfigNode {
            id,
            location,
            directory,
            parent,
            children: Vec::new(),
            plugin_configs: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        Ok(id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node, if the tree is not empty.
    pub fn root(&self) -> Option<NodeId> {
        self.nodes.first().map(|n| n.id)
    }

    /// Node behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &ConfigNode {
        &self.nodes[id.0]
    }

    /// Whether the node has no parent.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).is_root()
    }

    /// Ancestors of a node, nearest first, ending at the root.
    pub fn parent_chain(&self, id: NodeId, include_self: bool) -> ParentChain<'_> {
        let next = if include_self {
            Some(id)
        } else {
            self.node(id).parent
        };
        ParentChain { tree: self, next }
    }

    /// The node and all nodes below it, in pre-order.
    pub fn all_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = vec![id];
        for child in &self.node(id).children {
            result.extend(self.all_descendants(*child));
        }
        result
    }

    /// Append the locally declared configs of a node, then merge with its
    /// ancestors.
    ///
    /// # Errors
    ///
    /// Returns `ConfigStructure` if the node declares a section twice.
    pub fn process_in_place<F>(&mut self, id: NodeId, discover: F) -> Result<()>
    where
        F: FnOnce(&ConfigNode) -> Result<Vec<PluginConfig>>,
    {
        let declared = discover(self.node(id))?;
        let mut seen = HashSet::new();
        for config in &declared {
            if !seen.insert(config.section()) {
                return Err(SaveError::ConfigStructure {
                    path: self.node(id).location.clone(),
                    message: format!("section [{}] is declared more than once", config.section()),
                });
            }
        }
        self.nodes[id.0].plugin_configs.extend(declared);
        self.merge_with_parents(id)
    }

    /// Merge the node's configs with those of its ancestors, nearest first.
    ///
    /// A section missing locally is inherited as is; a section present
    /// locally is merged with the ancestor's, keeping local fields.
    pub fn merge_with_parents(&mut self, id: NodeId) -> Result<()> {
        self.logger.debug(&format!(
            "Start merging configs for {}",
            self.node(id).location.display()
        ));

        let ancestors: Vec<NodeId> = self.parent_chain(id, false).map(ConfigNode::id).collect();
        for ancestor in ancestors {
            let inherited = self.nodes[ancestor.0].plugin_configs.clone();
            let configs = &mut self.nodes[id.0].plugin_configs;
            for parent_config in &inherited {
                match configs
                    .iter()
                    .position(|c| c.section() == parent_config.section())
                {
                    None => configs.push(parent_config.clone()),
                    Some(index) => configs[index] = configs[index].merge_with(parent_config)?,
                }
            }
        }
        Ok(())
    }

    /// Replace every config of the node with its validated form.
    ///
    /// Either all configs are replaced or, on error, none.
    pub fn validate_and_set_defaults(&mut self, id: NodeId) -> Result<()> {
        self.logger.debug(&format!(
            "Start plugin validation for {}",
            self.node(id).location.display()
        ));
        let validated = self.nodes[id.0]
            .plugin_configs
            .iter()
            .map(PluginConfig::validate_and_set_defaults)
            .collect::<Result<Vec<_>>>()?;
        self.nodes[id.0].plugin_configs = validated;
        Ok(())
    }

    /// Resolve every node: discovery and merge first, then validation.
    ///
    /// A failing node does not stop its siblings; its descendants are
    /// skipped because they would inherit the failure.
    pub fn resolve_all<F>(&mut self, mut discover: F) -> Resolution
    where
        F: FnMut(&ConfigNode) -> Result<Vec<PluginConfig>>,
    {
        let mut resolution = Resolution::default();
        let Some(root) = self.root() else {
            return resolution;
        };
        let order = self.all_descendants(root);

        for &id in &order {
            if self.has_unresolved_ancestor(id, &resolution) {
                resolution.skipped.push(id);
                continue;
            }
            if let Err(e) = self.process_in_place(id, &mut discover) {
                self.logger.warn(&format!(
                    "Skipping {}: {}",
                    self.node(id).location.display(),
                    e
                ));
                resolution.failed.push((id, e));
            }
        }

        for &id in &order {
            if !resolution.is_resolved(id) {
                continue;
            }
            if self.has_unresolved_ancestor(id, &resolution) {
                resolution.skipped.push(id);
                continue;
            }
            if let Err(e) = self.validate_and_set_defaults(id) {
                self.logger.warn(&format!(
                    "Skipping {}: {}",
                    self.node(id).location.display(),
                    e
                ));
                resolution.failed.push((id, e));
            }
        }
        resolution
    }

    fn has_unresolved_ancestor(&self, id: NodeId, resolution: &Resolution) -> bool {
        self.parent_chain(id, false)
            .any(|ancestor| !resolution.is_resolved(ancestor.id))
    }

    /// Construct the plugins of a node that have something to test.
    ///
    /// A plugin is kept when its test file discovery yields at least one
    /// entry; discovery stops at the first one.
    pub fn build_active_plugins<F>(&self, id: NodeId, factory: F) -> Result<Vec<Box<dyn Plugin>>>
    where
        F: Fn(&PluginConfig, &ConfigNode) -> Result<Box<dyn Plugin>>,
    {
        let node = self.node(id);
        let mut active = Vec::new();
        for config in node.plugin_configs_without_general() {
            let plugin = factory(config, node)?;
            if plugin.discover_test_files(node.directory()).next().is_some() {
                active.push(plugin);
            } else {
                self.logger.debug(&format!(
                    "No test files for [{}] in {}",
                    config.section(),
                    node.directory().display()
                ));
            }
        }
        Ok(active)
    }
}

/// Ascending iterator over a node's ancestors.
pub struct ParentChain<'a> {
    tree: &'a ConfigTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for ParentChain<'a> {
    type Item = &'a ConfigNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.node(self.next?);
        self.next = node.parent;
        Some(node)
    }
}
