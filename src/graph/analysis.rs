//! Recursion Analysis
//!
//! Builds a graph of declarations (an edge for every member that mentions
//! another declaration) and computes strongly connected components, to
//! find the members that must be stored behind an indirection.
//!
//! A member needs a `Box` when it holds a declaration by value and both
//! ends of the edge sit in the same cycle. Members behind an array or a map
//! already have one. Alias declarations that sit in a cycle cannot stay
//! plain type aliases and are rendered as newtypes.

use std::collections::{HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::codegen::{Declaration, DeclarationKind};

/// One member mentioning another declaration
#[derive(Debug, Clone, PartialEq, Eq)]
struct MemberEdge {
    member: String,
    by_value: bool,
}

/// Which members and declarations take part in recursion
#[derive(Debug, Clone, Default)]
pub struct RecursionAnalysis {
    /// (declaration, member identifier) pairs that need a `Box`
    boxed: HashSet<(String, String)>,
    /// Array/map/alias declarations that sit on a cycle
    recursive_aliases: HashSet<String>,
    /// Cycles (multi-member components, or self-referencing declarations),
    /// members sorted by name
    groups: Vec<Vec<String>>,
}

impl RecursionAnalysis {
    /// Whether `member` of `declaration` must be boxed. Aliases use the
    /// empty member name.
    pub fn is_boxed(&self, declaration: &str, member: &str) -> bool {
        self.boxed
            .contains(&(declaration.to_string(), member.to_string()))
    }

    /// Whether an alias declaration must become a newtype
    pub fn is_recursive_alias(&self, declaration: &str) -> bool {
        self.recursive_aliases.contains(declaration)
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn boxed_count(&self) -> usize {
        self.boxed.len()
    }
}

/// Analyze a merged declaration set
pub fn analyze_recursion(declarations: &[Declaration]) -> RecursionAnalysis {
    let mut graph: DiGraph<&str, MemberEdge> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    for declaration in declarations {
        let node = graph.add_node(declaration.name.as_str());
        nodes.insert(declaration.name.as_str(), node);
    }

    for declaration in declarations {
        let from = nodes[declaration.name.as_str()];
        for (member, ty) in declaration.members() {
            let by_value: HashSet<&str> = ty.by_value_names().into_iter().collect();
            for name in ty.all_names() {
                if let Some(&to) = nodes.get(name) {
                    graph.add_edge(
                        from,
                        to,
                        MemberEdge {
                            member: member.to_string(),
                            by_value: by_value.contains(name),
                        },
                    );
                }
            }
        }
    }

    let mut component_of: HashMap<NodeIndex, usize> = HashMap::new();
    let mut groups = Vec::new();
    let mut cyclic: HashSet<usize> = HashSet::new();

    for (id, component) in kosaraju_scc(&graph).into_iter().enumerate() {
        for node in &component {
            component_of.insert(*node, id);
        }
        let self_loop = component.len() == 1
            && graph.edges(component[0]).any(|e| e.target() == component[0]);
        if component.len() > 1 || self_loop {
            cyclic.insert(id);
            let mut members: Vec<String> = component.iter().map(|n| graph[*n].to_string()).collect();
            members.sort();
            groups.push(members);
        }
    }
    groups.sort();

    let mut analysis = RecursionAnalysis {
        groups,
        ..RecursionAnalysis::default()
    };

    for edge in graph.edge_references() {
        let (from, to) = (edge.source(), edge.target());
        let component = component_of[&from];
        if component != component_of[&to] || !cyclic.contains(&component) {
            continue;
        }
        let declaration = graph[from].to_string();
        if edge.weight().by_value {
            analysis
                .boxed
                .insert((declaration.clone(), edge.weight().member.clone()));
        }
        analysis.recursive_aliases.insert(declaration);
    }

    // only alias-like declarations need the newtype treatment
    let aliases: HashSet<&str> = declarations
        .iter()
        .filter(|d| {
            matches!(
                d.kind,
                DeclarationKind::Array(_) | DeclarationKind::Map(_) | DeclarationKind::Alias(_)
            )
        })
        .map(|d| d.name.as_str())
        .collect();
    analysis
        .recursive_aliases
        .retain(|name| aliases.contains(name.as_str()));

    tracing::debug!(
        cycles = analysis.groups.len(),
        boxed = analysis.boxed.len(),
        "analyzed recursion"
    );
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{ExtensionField, Field, TypeRef};
    use crate::graph::{RootId, SchemaKey};

    fn declaration(name: &str, kind: DeclarationKind) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            doc: None,
            origin: SchemaKey::root(RootId(0)),
            source: format!("test#/{name}"),
        }
    }

    fn field(identifier: &str, ty: TypeRef) -> Field {
        Field {
            json_name: identifier.to_lowercase(),
            identifier: identifier.to_string(),
            required: false,
            ty,
            doc: None,
        }
    }

    fn named(name: &str) -> TypeRef {
        TypeRef::Named(name.to_string())
    }

    #[test]
    fn test_self_reference_is_boxed() {
        let declarations = vec![declaration(
            "Node",
            DeclarationKind::Struct {
                fields: vec![
                    field("Next", TypeRef::Nullable(Box::new(named("Node")))),
                    field("Children", TypeRef::Array(Box::new(named("Node")))),
                ],
                extension: None,
            },
        )];
        let analysis = analyze_recursion(&declarations);
        assert!(analysis.is_boxed("Node", "Next"));
        assert!(!analysis.is_boxed("Node", "Children"));
        assert_eq!(analysis.groups(), &[vec!["Node".to_string()]]);
    }

    #[test]
    fn test_mutual_recursion() {
        let declarations = vec![
            declaration(
                "A",
                DeclarationKind::Struct {
                    fields: vec![field("B", named("B"))],
                    extension: None,
                },
            ),
            declaration(
                "B",
                DeclarationKind::Struct {
                    fields: vec![field("A", named("A"))],
                    extension: Some(ExtensionField {
                        value: named("C"),
                    }),
                },
            ),
            declaration("C", DeclarationKind::Alias(TypeRef::Any)),
        ];
        let analysis = analyze_recursion(&declarations);
        assert!(analysis.is_boxed("A", "B"));
        assert!(analysis.is_boxed("B", "A"));
        assert!(!analysis.is_boxed("B", ""));
        assert_eq!(analysis.boxed_count(), 2);
        assert_eq!(analysis.groups(), &[vec!["A".to_string(), "B".to_string()]]);
    }

    #[test]
    fn test_recursive_array_alias_becomes_newtype() {
        let declarations = vec![declaration(
            "Tree",
            DeclarationKind::Array(TypeRef::Array(Box::new(named("Tree")))),
        )];
        let analysis = analyze_recursion(&declarations);
        assert!(analysis.is_recursive_alias("Tree"));
        assert!(!analysis.is_boxed("Tree", ""));
    }

    #[test]
    fn test_acyclic_graph_has_no_groups() {
        let declarations = vec![
            declaration(
                "A",
                DeclarationKind::Struct {
                    fields: vec![field("B", named("B"))],
                    extension: None,
                },
            ),
            declaration("B", DeclarationKind::Alias(TypeRef::Any)),
        ];
        let analysis = analyze_recursion(&declarations);
        assert!(analysis.groups().is_empty());
        assert!(!analysis.is_boxed("A", "B"));
    }
}
