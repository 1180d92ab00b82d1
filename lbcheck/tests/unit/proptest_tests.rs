//! Property-based tests using proptest

use proptest::prelude::*;

use lbcheck::verifier::{client_expected_count, count_marker, DEFAULT_MARKER};
use lbcheck_common::types::{split_evenly, ExpectedDistribution, SplitPolicy};

fn policy() -> impl Strategy<Value = SplitPolicy> {
    prop_oneof![Just(SplitPolicy::Even), Just(SplitPolicy::AllOnFirst)]
}

fn node_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec((1u8..=254).prop_map(|last| format!("127.0.0.{last}")), 1..8)
}

// ---------------------------------------------------------------------------
// split_evenly / ExpectedDistribution
// ---------------------------------------------------------------------------

proptest! {
    /// 任意の(total, nodes)で合計がtotalになり、偏りは1以内
    #[test]
    fn split_evenly_sums_to_total(total in 0usize..10_000, nodes in 1usize..16) {
        let shares = split_evenly(total, nodes);
        prop_assert_eq!(shares.len(), nodes);
        prop_assert_eq!(shares.iter().sum::<usize>(), total);
        let max = shares.iter().max().copied().unwrap_or(0);
        let min = shares.iter().min().copied().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }

    /// 余りは先頭から割り当てられる（非増加列）
    #[test]
    fn split_evenly_is_non_increasing(total in 0usize..10_000, nodes in 1usize..16) {
        let shares = split_evenly(total, nodes);
        prop_assert!(shares.windows(2).all(|w| w[0] >= w[1]));
    }

    /// 期待分布の合計は常に planned_total に一致する
    #[test]
    fn distribution_sums_to_planned_total(
        workload in 0usize..5_000,
        policy in policy(),
        nodes in node_list(),
        control_index in 0usize..8,
    ) {
        let control = nodes[control_index % nodes.len()].clone();
        let dist = ExpectedDistribution::build(workload, policy, &nodes, &control);
        let sum: usize = dist.iter().map(|(_, count)| count).sum();
        prop_assert_eq!(sum, dist.planned_total());
        prop_assert_eq!(dist.planned_total(), workload + policy.control_connections());
    }

    /// ノードの並び順は期待分布に影響しない
    #[test]
    fn distribution_is_independent_of_node_order(
        workload in 0usize..5_000,
        policy in policy(),
        nodes in node_list(),
    ) {
        let control = nodes[0].clone();
        let mut reversed = nodes.clone();
        reversed.reverse();
        prop_assert_eq!(
            ExpectedDistribution::build(workload, policy, &nodes, &control),
            ExpectedDistribution::build(workload, policy, &reversed, &control)
        );
    }
}

// ---------------------------------------------------------------------------
// count_marker / client_expected_count
// ---------------------------------------------------------------------------

proptest! {
    /// マーカーを含まない任意の断片をk個のマーカーで区切るとkを返す（k = 0を含む）
    #[test]
    fn count_marker_counts_k_occurrences(
        pieces in prop::collection::vec("[a-z0-9<>/ \n]{0,24}", 1..30),
    ) {
        prop_assume!(pieces.iter().all(|p| !p.contains("client") && !p.contains("backend")));
        let k = pieces.len() - 1;
        let body = pieces.join(DEFAULT_MARKER);
        prop_assert_eq!(count_marker(&body, DEFAULT_MARKER), k);
    }

    /// 制御ノードだけが1減り、0未満にはならない
    #[test]
    fn client_expected_count_adjusts_only_control(
        expected in 0usize..1_000,
        node in 1u8..=254,
        control in 1u8..=254,
    ) {
        let node = format!("127.0.0.{node}");
        let control = format!("127.0.0.{control}");
        let adjusted = client_expected_count(&node, expected, &control);
        if node == control {
            prop_assert_eq!(adjusted, expected.saturating_sub(1));
        } else {
            prop_assert_eq!(adjusted, expected);
        }
        prop_assert_eq!(
            client_expected_count(&node.to_uppercase(), expected, &control),
            adjusted
        );
    }
}
