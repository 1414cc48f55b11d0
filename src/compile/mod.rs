use crate::error::{ElementRef, FlowIssue, IssueCode, ValidationReport};
use crate::flow::{FlowDocument, FlowSettings, NodeKind, NodeSpec};
use ahash::AHashMap;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod artifact;
mod validate;

use validate::{collect_warnings, validate_structure};

/// Index of a node inside the compiled arena.
pub type NodeIx = u32;

/// A node's outgoing transitions, resolved to arena indices at compile time
/// so evaluation never repeats string lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum Routing {
    /// Single undiscriminated transition; `None` means the flow ends here.
    Next(Option<NodeIx>),
    /// Condition branches. A missing side is a runtime error if taken;
    /// validation normally rejects it first (defense in depth).
    Branch {
        on_true: Option<NodeIx>,
        on_false: Option<NodeIx>,
    },
    /// Switch cases in declaration order, keys lowercased, plus the default.
    Cases {
        cases: Vec<(String, NodeIx)>,
        default: Option<NodeIx>,
    },
    /// Parallel fan-out paths in path-index order, plus the merge target.
    FanOut {
        paths: Vec<NodeIx>,
        merge: Option<NodeIx>,
    },
}

/// One node of the compiled arena: typed spec plus resolved routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CompiledNode {
    pub id: String,
    pub kind: NodeKind,
    pub spec: NodeSpec,
    pub routing: Routing,
}

/// A validated flow document resolved into an arena of nodes.
///
/// This is the unit the interpreter evaluates and the unit persisted by
/// [`artifact`]. Construction goes through [`CompiledFlow::compile`], so a
/// value of this type is always structurally sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFlow {
    nodes: Vec<CompiledNode>,
    start: NodeIx,
    index: AHashMap<String, NodeIx>,
    pub settings: FlowSettings,
    pub version: Option<u32>,
    /// Non-fatal findings from validation (orphan nodes, empty parallels).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FlowIssue>,
}

impl CompiledFlow {
    /// Validates `doc` and resolves it into an arena.
    ///
    /// On failure returns the full list of structural errors, grouped by
    /// class per the validation contract: every edge-reference problem is
    /// reported before any branching problem, and so on.
    pub fn compile(doc: &FlowDocument) -> Result<Self, ValidationReport> {
        validate_structure(doc)?;

        let index: AHashMap<String, NodeIx> = doc
            .nodes
            .iter()
            .enumerate()
            .map(|(ix, n)| (n.id.clone(), ix as NodeIx))
            .collect();

        let mut issues = Vec::new();
        let mut nodes = Vec::with_capacity(doc.nodes.len());
        for def in &doc.nodes {
            let spec = match def.lower() {
                Ok(spec) => spec,
                Err(message) => {
                    issues.push(FlowIssue::error(
                        ElementRef::Node(def.id.clone()),
                        IssueCode::InvalidConfig,
                        format!("invalid config for '{}' node: {}", def.kind, message),
                    ));
                    continue;
                }
            };
            match resolve_routing(doc, def.id.as_str(), &spec, &index) {
                Ok(routing) => nodes.push(CompiledNode {
                    id: def.id.clone(),
                    kind: def.kind,
                    spec,
                    routing,
                }),
                Err(issue) => issues.push(issue),
            }
        }
        if !issues.is_empty() {
            return Err(ValidationReport::new(issues));
        }

        Ok(Self {
            start: index[&doc.start_node_id],
            index,
            nodes,
            settings: doc.settings.clone(),
            version: doc.version,
            warnings: collect_warnings(doc),
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn start_ix(&self) -> NodeIx {
        self.start
    }

    pub fn node(&self, ix: NodeIx) -> &CompiledNode {
        &self.nodes[ix as usize]
    }

    pub fn node_ix(&self, id: &str) -> Option<NodeIx> {
        self.index.get(id).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CompiledNode> {
        self.nodes.iter()
    }
}

fn resolve_routing(
    doc: &FlowDocument,
    node_id: &str,
    spec: &NodeSpec,
    index: &AHashMap<String, NodeIx>,
) -> Result<Routing, FlowIssue> {
    let outgoing: Vec<_> = doc.edges_from(node_id).collect();

    let routing = match spec {
        NodeSpec::Branch(_) => {
            let mut on_true = None;
            let mut on_false = None;
            for edge in &outgoing {
                // Validation guarantees labels are exactly true/false here.
                match edge.discriminator().as_deref() {
                    Some("true") => on_true = Some(index[&edge.target]),
                    Some("false") => on_false = Some(index[&edge.target]),
                    _ => {}
                }
            }
            Routing::Branch { on_true, on_false }
        }
        NodeSpec::Cases(_) => {
            let mut cases = Vec::new();
            let mut default = None;
            for edge in &outgoing {
                match edge.discriminator() {
                    Some(case) => cases.push((case, index[&edge.target])),
                    None => default = Some(index[&edge.target]),
                }
            }
            Routing::Cases { cases, default }
        }
        NodeSpec::FanOut(config) => {
            // Numeric path-index labels first, then unlabeled edges in
            // declaration order.
            let mut labeled: Vec<((u8, u32), NodeIx)> = outgoing
                .iter()
                .enumerate()
                .map(|(pos, edge)| {
                    let order = match edge.discriminator().and_then(|d| d.parse::<u32>().ok()) {
                        Some(n) => (0, n),
                        None => (1, pos as u32),
                    };
                    (order, index[&edge.target])
                })
                .collect();
            labeled.sort_by_key(|(order, _)| *order);
            let merge = match &config.merge {
                Some(id) => Some(index.get(id).copied().ok_or_else(|| {
                    FlowIssue::error(
                        ElementRef::Node(node_id.to_string()),
                        IssueCode::UnknownMergeNode,
                        format!("merge node '{}' does not exist", id),
                    )
                })?),
                None => None,
            };
            Routing::FanOut {
                paths: labeled.into_iter().map(|(_, ix)| ix).collect(),
                merge,
            }
        }
        _ => Routing::Next(outgoing.first().map(|edge| index[&edge.target])),
    };
    Ok(routing)
}
