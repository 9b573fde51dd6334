// tests/graph_properties.rs

mod common;
use crate::common::assert_topological;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use proptest::prelude::*;
use workdag::dag::{Graph, SortState};
use workdag::errors::GraphError;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("n{i}")).collect()
}

// Random edges over `n` nodes, cycles allowed.
fn any_graph_strategy(max_nodes: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1..=max_nodes).prop_flat_map(|n| {
        let edges = proptest::collection::vec((0..n, 0..n), 0..(n * 2));
        (Just(n), edges)
    })
}

// Random edges that only point from lower to higher index, so never cyclic.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    any_graph_strategy(max_nodes).prop_map(|(n, edges)| {
        let edges = edges
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        (n, edges)
    })
}

fn build(n: usize, edges: &[(usize, usize)]) -> Graph<String> {
    let nodes = names(n);
    let edge_names: Vec<(String, String)> = edges
        .iter()
        .map(|(a, b)| (nodes[*a].clone(), nodes[*b].clone()))
        .collect();
    Graph::new(nodes, edge_names).unwrap()
}

proptest! {
    #[test]
    fn sort_fails_exactly_when_graph_is_cyclic((n, edges) in any_graph_strategy(8)) {
        let mut oracle = DiGraph::<(), ()>::new();
        let idx: Vec<_> = (0..n).map(|_| oracle.add_node(())).collect();
        for (a, b) in &edges {
            oracle.add_edge(idx[*a], idx[*b], ());
        }

        let mut graph = build(n, &edges);
        let result = graph.sorting(None);

        if is_cyclic_directed(&oracle) {
            prop_assert!(matches!(result, Err(GraphError::Cycle(_))));
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn sorted_order_is_a_topological_permutation((n, edges) in dag_strategy(10)) {
        let mut graph = build(n, &edges);
        let order = graph.sorted_node_names().unwrap();

        let mut seen: Vec<&str> = order.clone();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), n);

        let all = names(n);
        let edge_names: Vec<(&str, &str)> = edges
            .iter()
            .map(|(a, b)| (all[*a].as_str(), all[*b].as_str()))
            .collect();
        assert_topological(&order, &edge_names);
    }

    #[test]
    fn draining_ready_nodes_empties_any_dag((n, edges) in dag_strategy(10)) {
        let mut graph = build(n, &edges);
        graph.sorting(None).unwrap();

        let mut removed = 0;
        while !graph.is_empty() {
            let ready: Vec<String> = graph.ready_nodes().into_iter().cloned().collect();
            prop_assert!(!ready.is_empty());
            for node in ready {
                graph.remove_node(&node).unwrap();
                removed += 1;
            }
            // Whatever removal did to the order, re-sorting must succeed.
            graph.sorted_nodes().unwrap();
            prop_assert_eq!(graph.sort_state(), SortState::Valid);
        }
        prop_assert_eq!(removed, n);
    }

    #[test]
    fn incremental_resort_stays_topological(
        (n, edges) in dag_strategy(10),
        remove_first in any::<bool>(),
    ) {
        let mut graph = build(n, &edges);
        graph.sorting(None).unwrap();

        if remove_first {
            let head = graph.ready_nodes()[0].clone();
            graph.remove_node(&head).unwrap();
        }
        let first = graph.node_names().first().map(|name| name.to_string());
        graph.add_nodes(["late".to_string()]).unwrap();
        if let Some(first) = &first {
            graph.add_edges([("late".to_string(), first.clone())]).unwrap();
        }
        let expected = graph.len();

        let order = graph.sorted_node_names().unwrap();
        prop_assert_eq!(order.len(), expected);
        if let Some(first) = &first {
            assert_topological(&order, &[("late", first.as_str())]);
        }
    }
}
