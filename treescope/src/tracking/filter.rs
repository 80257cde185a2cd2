//! Component filtering and report attribution.
//!
//! # Precedence
//!
//! 1. **Whitelist** - when present, only listed names are tracked
//! 2. **Built-in primitives** - never filtered; reported as `"Parent > View"`
//! 3. **Blacklist** - names passed when profiling starts
//! 4. **Default-ignore prefixes** - framework and overlay internals

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::accessor;
use crate::domain::NodeId;
use crate::host::HostTree;

// =============================================================================
// CLASSIFICATION TABLES
// =============================================================================

/// Framework, dev-overlay and animation internals
pub const DEFAULT_IGNORE_PREFIXES: &[&str] = &[
    "RCT",
    "LogBox",
    "YellowBox",
    "AppContainer",
    "DebuggingOverlay",
    "DevTools",
    "Inspector",
    "PerformanceOverlay",
    "Animated(",
    "AnimatedComponent",
    "withDevTools",
    "__",
];

/// Built-in components that wrap a native view
pub const BUILTIN_PRIMITIVES: &[&str] = &[
    "View",
    "Text",
    "TextInput",
    "Image",
    "ImageBackground",
    "ScrollView",
    "FlatList",
    "SectionList",
    "VirtualizedList",
    "Pressable",
    "TouchableOpacity",
    "TouchableHighlight",
    "TouchableWithoutFeedback",
    "SafeAreaView",
    "KeyboardAvoidingView",
    "Modal",
    "Switch",
    "ActivityIndicator",
    "StatusBar",
    "RefreshControl",
];

#[must_use]
pub fn is_default_ignored(name: &str) -> bool {
    DEFAULT_IGNORE_PREFIXES.iter().any(|p| name.starts_with(p))
}

#[must_use]
pub fn is_builtin_primitive(name: &str) -> bool {
    BUILTIN_PRIMITIVES.contains(&name)
}

/// Options accepted when profiling starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileOptions {
    /// Track only these components
    pub components: Option<Vec<String>>,
    /// Never track these components
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentFilter {
    whitelist: Option<HashSet<String>>,
    blacklist: HashSet<String>,
}

impl From<&ProfileOptions> for ComponentFilter {
    fn from(options: &ProfileOptions) -> Self {
        Self {
            whitelist: options.components.as_ref().map(|c| c.iter().cloned().collect()),
            blacklist: options.ignore.iter().cloned().collect(),
        }
    }
}

impl ComponentFilter {
    fn is_ignored(&self, name: &str) -> bool {
        self.blacklist.contains(name) || is_default_ignored(name)
    }

    /// Reporting key of the composite at `id`, or `None` if it is filtered out.
    #[must_use]
    pub fn component_key(&self, tree: &HostTree, id: NodeId) -> Option<String> {
        let name = tree.get(id)?.name.as_str();

        if let Some(whitelist) = &self.whitelist {
            if !whitelist.contains(name) {
                return None;
            }
        } else if !is_builtin_primitive(name) && self.is_ignored(name) {
            return None;
        }

        if is_builtin_primitive(name) {
            return Some(self.attribute(tree, id, name));
        }
        Some(name.to_string())
    }

    /// `"Parent > Primitive"` using the nearest composite ancestor that is
    /// itself neither built-in nor ignored.
    fn attribute(&self, tree: &HostTree, id: NodeId, name: &str) -> String {
        let owner = tree
            .ancestors(id)
            .filter_map(|a| tree.get(a))
            .filter(|n| n.kind.is_composite())
            .map(|n| n.name.as_str())
            .find(|n| !is_builtin_primitive(n) && !self.is_ignored(n));
        match owner {
            Some(owner) => format!("{owner} > {name}"),
            None => name.to_string(),
        }
    }
}

/// Name of the nearest composite ancestor, for the `parent` field of a render record.
#[must_use]
pub fn parent_name(tree: &HostTree, id: NodeId) -> Option<String> {
    let parent = accessor::nearest_composite_ancestor(tree, id)?;
    tree.get(parent).map(|n| n.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Node, NodeKind};

    /// Root > LogBoxInspector > App > Card > View
    fn sample() -> (HostTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        let logbox = tree.add_child(root, Node::function("LogBoxInspector"));
        let app = tree.add_child(logbox, Node::function("App"));
        let card = tree.add_child(app, Node::function("Card"));
        let view = tree.add_child(card, Node::function("View"));
        (tree, logbox, app, card, view)
    }

    #[test]
    fn test_default_ignore_prefixes() {
        let (tree, logbox, app, ..) = sample();
        let filter = ComponentFilter::default();
        assert_eq!(filter.component_key(&tree, logbox), None);
        assert_eq!(filter.component_key(&tree, app), Some("App".to_string()));
    }

    #[test]
    fn test_builtins_are_attributed_to_owner() {
        let (tree, .., view) = sample();
        let filter = ComponentFilter::default();
        assert_eq!(filter.component_key(&tree, view), Some("Card > View".to_string()));

        let options = ProfileOptions { components: None, ignore: vec!["Card".into(), "View".into()] };
        let filter = ComponentFilter::from(&options);
        // Blacklisting a builtin has no effect; blacklisted owners are skipped
        assert_eq!(filter.component_key(&tree, view), Some("App > View".to_string()));
    }

    #[test]
    fn test_whitelist_is_authoritative() {
        let (tree, logbox, app, card, view) = sample();
        let options = ProfileOptions {
            components: Some(vec!["LogBoxInspector".into(), "Card".into()]),
            ignore: vec!["Card".into()],
        };
        let filter = ComponentFilter::from(&options);
        assert_eq!(filter.component_key(&tree, logbox), Some("LogBoxInspector".to_string()));
        assert_eq!(filter.component_key(&tree, card), Some("Card".to_string()));
        assert_eq!(filter.component_key(&tree, app), None);
        assert_eq!(filter.component_key(&tree, view), None);
    }

    #[test]
    fn test_parent_name() {
        let (tree, _, app, card, _) = sample();
        assert_eq!(parent_name(&tree, card), Some("App".to_string()));
        assert_eq!(parent_name(&tree, app), Some("LogBoxInspector".to_string()));
    }
}
