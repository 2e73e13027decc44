use super::markup::{top_level_nodes, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Everything before the first marker: level, size, stat table.
    Stats,
    Features,
    Actions,
    Reactions,
}

#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub kind: SectionKind,
    pub nodes: Vec<Node<'a>>,
}

/// Cluster a stat block's top-level nodes into sections at the
/// `FEATURES` / `ACTIONS` / `REACTIONS` marker paragraphs. Markers
/// themselves are not kept.
pub fn cluster_sections(body: &str) -> Vec<Section<'_>> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current_nodes: Vec<Node> = Vec::new();
    let mut current_kind = SectionKind::Stats;

    for node in top_level_nodes(body) {
        if let Some(new_kind) = detect_marker(&node) {
            if !current_nodes.is_empty() {
                sections.push(Section {
                    kind: current_kind,
                    nodes: std::mem::take(&mut current_nodes),
                });
            }
            current_kind = new_kind;
            continue;
        }
        current_nodes.push(node);
    }

    if !current_nodes.is_empty() {
        sections.push(Section {
            kind: current_kind,
            nodes: current_nodes,
        });
    }

    sections
}

fn detect_marker(node: &Node) -> Option<SectionKind> {
    if !node.is("p") {
        return None;
    }
    match node.text().to_ascii_uppercase().as_str() {
        "FEATURE" | "FEATURES" => Some(SectionKind::Features),
        "ACTION" | "ACTIONS" => Some(SectionKind::Actions),
        "REACTION" | "REACTIONS" => Some(SectionKind::Reactions),
        _ => None,
    }
}

/// Nodes of every section of `kind`, in document order.
pub fn nodes_of<'s, 'a>(
    sections: &'s [Section<'a>],
    kind: SectionKind,
) -> impl Iterator<Item = &'s Node<'a>> {
    sections
        .iter()
        .filter(move |s| s.kind == kind)
        .flat_map(|s| s.nodes.iter())
}
