use crate::error::{ElementRef, FlowIssue, IssueCode, ValidationReport};
use crate::flow::{EdgeDefinition, FlowDocument, NodeKind};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

/// Runs the ordered structural checks over a flow document.
///
/// Checks are grouped into classes; the first failing class aborts with a
/// report listing every instance *within* that class, so the editor can
/// highlight all offending elements of the same kind at once.
pub(super) fn validate_structure(doc: &FlowDocument) -> Result<(), ValidationReport> {
    let node_ids: AHashSet<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();

    let classes: [fn(&FlowDocument, &AHashSet<&str>) -> Vec<FlowIssue>; 6] = [
        check_edge_references,
        check_start_reference,
        check_condition_branches,
        check_switch_cases,
        check_single_output,
        check_pause_free_cycles,
    ];

    for check in classes {
        let issues = check(doc, &node_ids);
        if !issues.is_empty() {
            return Err(ValidationReport::new(issues));
        }
    }
    Ok(())
}

/// Non-fatal findings, surfaced alongside a successful compilation.
pub(super) fn collect_warnings(doc: &FlowDocument) -> Vec<FlowIssue> {
    let mut warnings = Vec::new();

    // Orphans: nodes unreachable from the start node via any edge.
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for edge in &doc.edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    let mut reached: AHashSet<&str> = AHashSet::new();
    let mut stack = vec![doc.start_node_id.as_str()];
    while let Some(id) = stack.pop() {
        if reached.insert(id) {
            if let Some(next) = adjacency.get(id) {
                stack.extend(next.iter().copied());
            }
        }
    }
    for node in &doc.nodes {
        if !reached.contains(node.id.as_str()) {
            warnings.push(FlowIssue::warning(
                ElementRef::Node(node.id.clone()),
                IssueCode::OrphanNode,
                "node is not reachable from the start node",
            ));
        }
    }

    for node in doc.nodes.iter().filter(|n| n.kind == NodeKind::Parallel) {
        if doc.edges_from(&node.id).next().is_none() {
            warnings.push(FlowIssue::warning(
                ElementRef::Node(node.id.clone()),
                IssueCode::EmptyParallel,
                "parallel node has no outgoing paths",
            ));
        }
    }

    warnings
}

fn check_edge_references(doc: &FlowDocument, node_ids: &AHashSet<&str>) -> Vec<FlowIssue> {
    let mut issues = Vec::new();
    for edge in &doc.edges {
        if !node_ids.contains(edge.source.as_str()) {
            issues.push(FlowIssue::error(
                ElementRef::Edge(edge.id.clone()),
                IssueCode::UnknownSourceNode,
                format!("source node '{}' does not exist", edge.source),
            ));
        }
        if !node_ids.contains(edge.target.as_str()) {
            issues.push(FlowIssue::error(
                ElementRef::Edge(edge.id.clone()),
                IssueCode::UnknownTargetNode,
                format!("target node '{}' does not exist", edge.target),
            ));
        }
    }
    issues
}

fn check_start_reference(doc: &FlowDocument, node_ids: &AHashSet<&str>) -> Vec<FlowIssue> {
    if node_ids.contains(doc.start_node_id.as_str()) {
        Vec::new()
    } else {
        vec![FlowIssue::error(
            ElementRef::Document,
            IssueCode::UnknownStartNode,
            format!("start node '{}' does not exist", doc.start_node_id),
        )]
    }
}

fn check_condition_branches(doc: &FlowDocument, _node_ids: &AHashSet<&str>) -> Vec<FlowIssue> {
    let mut issues = Vec::new();
    for node in doc.nodes.iter().filter(|n| n.kind == NodeKind::Condition) {
        let by_branch: AHashMap<Option<String>, Vec<&EdgeDefinition>> = doc
            .edges_from(&node.id)
            .map(|e| (e.discriminator(), e))
            .into_group_map()
            .into_iter()
            .collect();

        for (disc, edges) in &by_branch {
            match disc.as_deref() {
                Some("true") | Some("false") => {
                    for extra in edges.iter().skip(1) {
                        issues.push(FlowIssue::error(
                            ElementRef::Edge(extra.id.clone()),
                            IssueCode::DuplicateBranch,
                            format!(
                                "condition node '{}' already has a '{}' branch",
                                node.id,
                                disc.as_deref().unwrap_or_default()
                            ),
                        ));
                    }
                }
                other => {
                    for edge in edges {
                        issues.push(FlowIssue::error(
                            ElementRef::Edge(edge.id.clone()),
                            IssueCode::InvalidBranchLabel,
                            format!(
                                "condition branches must be labeled 'true' or 'false', found '{}'",
                                other.unwrap_or("<none>")
                            ),
                        ));
                    }
                }
            }
        }
    }
    issues
}

fn check_switch_cases(doc: &FlowDocument, _node_ids: &AHashSet<&str>) -> Vec<FlowIssue> {
    let mut issues = Vec::new();
    for node in doc.nodes.iter().filter(|n| n.kind == NodeKind::Switch) {
        let by_case: Vec<(Option<String>, Vec<&EdgeDefinition>)> = doc
            .edges_from(&node.id)
            .map(|e| (e.discriminator(), e))
            .into_group_map()
            .into_iter()
            .collect();

        for (disc, edges) in &by_case {
            if edges.len() < 2 {
                continue;
            }
            for extra in edges.iter().skip(1) {
                match disc {
                    Some(case) => issues.push(FlowIssue::error(
                        ElementRef::Edge(extra.id.clone()),
                        IssueCode::DuplicateCase,
                        format!("switch node '{}' already has a '{}' case", node.id, case),
                    )),
                    None => issues.push(FlowIssue::error(
                        ElementRef::Edge(extra.id.clone()),
                        IssueCode::DuplicateDefault,
                        format!("switch node '{}' already has a default edge", node.id),
                    )),
                }
            }
        }
    }
    issues
}

fn check_single_output(doc: &FlowDocument, _node_ids: &AHashSet<&str>) -> Vec<FlowIssue> {
    let mut issues = Vec::new();
    for node in doc.nodes.iter().filter(|n| n.kind.is_single_output()) {
        let outgoing: Vec<_> = doc.edges_from(&node.id).collect();
        if outgoing.len() > 1 {
            let edge_ids = outgoing.iter().map(|e| e.id.as_str()).join(", ");
            issues.push(FlowIssue::error(
                ElementRef::Node(node.id.clone()),
                IssueCode::AmbiguousTransition,
                format!(
                    "single-output node has {} outgoing edges ({})",
                    outgoing.len(),
                    edge_ids
                ),
            ));
        }
    }
    issues
}

/// Rejects cycles reachable from the start node that never pass through a
/// node capable of pausing or terminating the conversation. Such a cycle
/// would spin forever sending messages with no pause point.
fn check_pause_free_cycles(doc: &FlowDocument, _node_ids: &AHashSet<&str>) -> Vec<FlowIssue> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let kinds: AHashMap<&str, NodeKind> =
        doc.nodes.iter().map(|n| (n.id.as_str(), n.kind)).collect();
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for edge in &doc.edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    let mut marks: AHashMap<&str, Mark> = AHashMap::new();
    let mut flagged: AHashSet<&str> = AHashSet::new();
    let mut issues = Vec::new();

    // Iterative DFS over chains of auto-advancing nodes. Pause-capable nodes
    // break cycles but not reachability: their successors restart the walk
    // as fresh roots once the current chain has fully unwound, so a
    // message-only cycle sitting behind a question is still found.
    enum Frame<'a> {
        Enter(&'a str),
        Exit(&'a str),
    }
    let mut roots = vec![doc.start_node_id.as_str()];
    while let Some(root) = roots.pop() {
        if marks.contains_key(root) {
            continue;
        }
        let mut stack = vec![Frame::Enter(root)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if marks.contains_key(id) {
                        continue;
                    }
                    if kinds.get(id).is_some_and(|k| k.breaks_cycle()) {
                        marks.insert(id, Mark::Done);
                        for &next in adjacency.get(id).into_iter().flatten() {
                            if !marks.contains_key(next) {
                                roots.push(next);
                            }
                        }
                        continue;
                    }
                    marks.insert(id, Mark::InProgress);
                    stack.push(Frame::Exit(id));
                    for &next in adjacency.get(id).into_iter().flatten() {
                        match marks.get(next) {
                            Some(Mark::InProgress) => {
                                if flagged.insert(next) {
                                    issues.push(FlowIssue::error(
                                        ElementRef::Node(next.to_string()),
                                        IssueCode::UnterminatedCycle,
                                        "cycle with no pause point reachable from the start node",
                                    ));
                                }
                            }
                            Some(Mark::Done) => {}
                            None => stack.push(Frame::Enter(next)),
                        }
                    }
                }
                Frame::Exit(id) => {
                    marks.insert(id, Mark::Done);
                }
            }
        }
    }
    issues
}
