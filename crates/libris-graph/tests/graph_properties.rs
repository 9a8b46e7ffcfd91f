use std::collections::HashSet;

use libris_config::GraphConfig;
use libris_core::{Edge, EdgeType, Node, pair_key};
use libris_graph::{GraphBuilder, build_graph, explain_connections, remap};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};

fn sample_records() -> Vec<Value> {
    vec![
        json!({"id": "neuromancer", "title": "Neuromancer", "author": "William Gibson",
               "tags": ["Cyberpunk", "AI", "Noir"], "publicationYear": 1984,
               "createdAt": "2024-01-05T00:00:00Z"}),
        json!({"id": "count-zero", "title": "Count Zero", "author": "William Gibson",
               "tags": ["Cyberpunk", "AI"], "publicationYear": 1986,
               "createdAt": "2024-02-10T00:00:00Z"}),
        json!({"id": "snow-crash", "title": "Snow Crash", "author": "Neal Stephenson",
               "tags": ["Cyberpunk", "Satire"], "publicationYear": 1992}),
        json!({"id": "dispossessed", "title": "The Dispossessed", "author": "Ursula K. Le Guin",
               "tags": ["Anarchy", "Philosophy"], "publicationYear": 1974}),
        json!({"id": "left-hand", "title": "The Left Hand of Darkness",
               "author": "Ursula K. Le Guin", "tags": ["Gender", "Philosophy"]}),
        json!({"id": "darkness-visible", "title": "Darkness Visible", "author": "Unknown Author",
               "tags": "not-a-list"}),
        json!({"id": "mystery", "title": "Untitled Notebook", "author": "Unknown Author"}),
        json!({"title": "No id at all"}),
    ]
}

fn non_resonance(edges: &[Edge]) -> Vec<Edge> {
    edges
        .iter()
        .filter(|edge| edge.edge_type != EdgeType::Resonance)
        .cloned()
        .collect()
}

fn cyberpunk_trio() -> Vec<Node> {
    ["Alpha", "Bravo", "Charlie"]
        .iter()
        .enumerate()
        .map(|(index, title)| Node {
            id: format!("n{index}"),
            title: (*title).to_owned(),
            author: format!("Author {index}"),
            author_known: true,
            tags: vec!["Cyberpunk".to_owned()],
            genre: None,
            publication_year: None,
            created_at: None,
            notes: None,
        })
        .collect()
}

#[test]
fn edges_never_loop_duplicate_or_go_negative() {
    for seed in 0..20 {
        let graph = build_graph(&sample_records(), &mut StdRng::seed_from_u64(seed));

        let mut seen = HashSet::new();
        for edge in &graph.edges {
            assert_ne!(edge.from_id, edge.to_id, "self edge {edge:?}");
            assert!(edge.strength >= 0.0 && edge.strength.is_finite());
            let (left, right) = pair_key(edge.from_id.as_str(), edge.to_id.as_str());
            assert!(
                seen.insert((left.to_owned(), right.to_owned(), edge.edge_type)),
                "duplicate {:?} edge between {left} and {right}",
                edge.edge_type
            );
        }
    }
}

#[test]
fn build_graph_drops_records_without_ids_and_keeps_the_rest() {
    let graph = build_graph(&sample_records(), &mut StdRng::seed_from_u64(1));
    assert_eq!(graph.nodes.len(), 7);
    assert_eq!(graph.rejected.len(), 1);
    assert_eq!(graph.rejected[0].index, 7);

    let visible = graph
        .nodes
        .iter()
        .find(|node| node.id == "darkness-visible")
        .expect("record with malformed tags survives");
    assert!(visible.tags.is_empty());

    // Title words still connect it to "The Left Hand of Darkness".
    assert!(graph.edges.iter().any(|edge| {
        edge.edge_type == EdgeType::TitleSimilarity
            && edge.connects("left-hand", "darkness-visible")
    }));
}

#[test]
fn scenario_three_nodes_sharing_one_tag() {
    let builder = GraphBuilder::new(GraphConfig::default());
    let edges = builder.build_edges(&cyberpunk_trio(), &mut StdRng::seed_from_u64(8));

    let tag_edges = edges
        .iter()
        .filter(|edge| edge.edge_type == EdgeType::TagShared)
        .collect::<Vec<_>>();
    assert_eq!(tag_edges.len(), 3);
    for edge in tag_edges {
        assert_eq!(edge.strength, 2.0);
        assert_eq!(edge.shared_attributes, vec!["Cyberpunk".to_owned()]);
    }
    assert!(
        edges
            .iter()
            .all(|edge| matches!(edge.edge_type, EdgeType::TagShared | EdgeType::Resonance))
    );
}

#[test]
fn scenario_unknown_authors_never_match() {
    let records = vec![
        json!({"id": "a", "title": "First", "author": "Unknown Author"}),
        json!({"id": "b", "title": "Second", "author": "Unknown Author"}),
    ];
    for seed in 0..10 {
        let graph = build_graph(&records, &mut StdRng::seed_from_u64(seed));
        assert!(
            graph
                .edges
                .iter()
                .all(|edge| edge.edge_type != EdgeType::AuthorShared)
        );
    }
}

#[test]
fn scenario_filter_then_focus_enhances_existing_edge() {
    let nodes = vec![
        Node {
            id: "a".to_owned(),
            title: "One".to_owned(),
            author: "X".to_owned(),
            author_known: true,
            tags: vec!["Solarpunk".to_owned()],
            genre: None,
            publication_year: None,
            created_at: None,
            notes: None,
        },
        Node {
            id: "b".to_owned(),
            title: "Two".to_owned(),
            author: "Y".to_owned(),
            author_known: true,
            tags: vec!["Solarpunk".to_owned()],
            genre: None,
            publication_year: None,
            created_at: None,
            notes: None,
        },
    ];

    let edges = remap(
        &nodes,
        &["Solarpunk".to_owned()],
        Some("Solarpunk"),
        &mut StdRng::seed_from_u64(4),
    );
    let tag_edge = edges
        .iter()
        .find(|edge| edge.edge_type == EdgeType::TagShared)
        .expect("tag edge");
    assert_eq!(tag_edge.strength, 3.0);
    assert!(tag_edge.reason.contains("Enhanced by Solarpunk filter"));
}

#[test]
fn remap_without_filters_matches_fresh_build_modulo_resonance() {
    let graph = build_graph(&sample_records(), &mut StdRng::seed_from_u64(21));
    for seed in 0..5 {
        let remapped = remap(&graph.nodes, &[], None, &mut StdRng::seed_from_u64(seed));
        assert_eq!(non_resonance(&remapped), non_resonance(&graph.edges));
    }
}

#[test]
fn scenario_single_node_has_no_edges() {
    let graph = build_graph(
        &[json!({"id": "solo", "title": "Solitude", "tags": ["Quiet", "Sea"]})],
        &mut StdRng::seed_from_u64(2),
    );
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty());
}

#[test]
fn scenario_explain_isolated_node() {
    let graph = build_graph(
        &[json!({"id": "solo", "title": "Solitude"})],
        &mut StdRng::seed_from_u64(2),
    );
    let breakdown = explain_connections("solo", &graph.nodes, &graph.edges);
    assert_eq!(breakdown.total, 0);
    assert!(breakdown.shared_themes.is_empty());
    assert!(breakdown.subgenres.is_empty());
    assert!(breakdown.eras.is_empty());
    assert!(breakdown.most_connected.is_empty());
    assert!(breakdown.connections.is_empty());
}

#[test]
fn empty_input_produces_an_empty_graph() {
    let graph = build_graph(&[], &mut StdRng::seed_from_u64(0));
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
    let remapped = remap(
        &graph.nodes,
        &["Any".to_owned()],
        Some("Any"),
        &mut StdRng::seed_from_u64(0),
    );
    assert!(remapped.is_empty());
}
