//! # Integration Test Flows
//!
//! Full relay cycles across simulated chains:
//!
//! 1. **Local write → roots → relay → settle**: the aggregated view on the
//!    destination includes the settled remote contribution.
//! 2. **Mesh of three chains**: every chain settles every other chain.
//! 3. **Version bump**: post-bump state settles into a fresh chronicle while
//!    pre-bump history stays queryable.
//! 4. **Concurrent local writers** on one ledger.

#[cfg(test)]
mod tests {
    use super::super::{link_apps, SimChain};
    use lm_03_liquidity_matrix::{
        LedgerEvent, LocalLedgerApi, MatrixQueryApi, RootsOutcome, SettlementState,
    };
    use shared_types::{Address, Hash};
    use std::sync::Arc;

    const APP: Address = [0xaa; 20];
    const ALICE: Address = [0xa1; 20];
    const BOB: Address = [0xb0; 20];
    const KEY: Hash = [0x0c; 32];

    // =============================================================================
    // FLOW 1: SINGLE RELAY
    // =============================================================================

    #[tokio::test]
    async fn test_end_to_end_settled_total() {
        let uids = [1, 2];
        let a = SimChain::new(1, &uids, 100);
        let mut b = SimChain::new(2, &uids, 100);
        a.register(APP);
        b.register(APP);
        link_apps(&[&a, &b], APP);

        a.matrix.update_liquidity(APP, ALICE, 100).unwrap();
        b.matrix.update_liquidity(APP, BOB, 40).unwrap();
        a.close_step();

        a.relay_to(&b).await;
        assert_eq!(b.deliver().unwrap(), vec![RootsOutcome::Stored]);
        let synced = b.matrix.get_last_synced_roots(1).unwrap();
        assert_eq!(synced.version, 1);
        assert_eq!(synced.timestamp, 100);

        let (liquidity, data) = b.settle_from(&a, APP, 100, &[ALICE], &[]);
        assert_eq!(liquidity.applied, 1);
        assert!(data.finalized);

        let local_total = b.matrix.get_local_total_liquidity(APP);
        assert_eq!(local_total, 40);
        assert_eq!(
            b.matrix.get_aggregated_settled_total_liquidity(APP),
            local_total + 100
        );
        assert_eq!(b.matrix.get_aggregated_settled_liquidity(APP, ALICE), 100);
        assert_eq!(
            b.matrix.get_settlement_state(APP, 1, 100),
            SettlementState::Finalized
        );
    }

    // =============================================================================
    // FLOW 2: THREE-CHAIN MESH
    // =============================================================================

    #[tokio::test]
    async fn test_three_chain_mesh_converges() {
        let uids = [1, 2, 3];
        let mut chains: Vec<SimChain> = uids.iter().map(|u| SimChain::new(*u, &uids, 100)).collect();

        for chain in &chains {
            chain.register(APP);
            chain
                .matrix
                .update_liquidity(APP, ALICE, 10 * chain.uid as i128)
                .unwrap();
            chain
                .matrix
                .update_data(APP, KEY, format!("chain-{}", chain.uid).into_bytes())
                .unwrap();
            chain.close_step();
        }
        link_apps(&chains.iter().collect::<Vec<_>>(), APP);

        for source in &chains {
            for dest in chains.iter().filter(|c| c.uid != source.uid) {
                source.relay_to(dest).await;
            }
        }
        for chain in chains.iter_mut() {
            let outcomes = chain.deliver().unwrap();
            assert_eq!(outcomes, vec![RootsOutcome::Stored; 2]);
        }

        for dest in &chains {
            for source in chains.iter().filter(|c| c.uid != dest.uid) {
                let (_, data) = dest.settle_from(source, APP, 100, &[ALICE], &[KEY]);
                assert!(data.finalized);
            }
        }

        for chain in &chains {
            assert_eq!(chain.matrix.get_aggregated_finalized_total_liquidity(APP), 60);
            assert_eq!(chain.matrix.get_aggregated_finalized_liquidity(APP, ALICE), 60);
            for other in uids.iter().filter(|u| **u != chain.uid) {
                assert_eq!(
                    chain.matrix.get_finalized_remote_data(APP, *other, KEY),
                    Some(format!("chain-{other}").into_bytes())
                );
            }
            assert_eq!(chain.events.count("finalized"), 2);
        }
    }

    // =============================================================================
    // FLOW 3: VERSION BUMP
    // =============================================================================

    #[tokio::test]
    async fn test_version_bump_isolates_remote_history() {
        let uids = [1, 2];
        let a = SimChain::new(1, &uids, 100);
        let mut b = SimChain::new(2, &uids, 100);
        a.register(APP);
        b.register(APP);
        link_apps(&[&a, &b], APP);

        a.matrix
            .update_liquidity(APP, ALICE, 100)
            .unwrap();
        a.matrix.update_liquidity(APP, BOB, 50).unwrap();
        a.close_step();
        a.relay_to(&b).await;
        b.deliver().unwrap();
        b.settle_from(&a, APP, 100, &[ALICE, BOB], &[]);
        assert_eq!(b.matrix.get_settled_remote_total_liquidity(APP, 1), 150);

        // reorg on A
        assert_eq!(a.matrix.add_version(200).unwrap(), 2);
        a.clock.set(200);
        a.matrix.update_liquidity(APP, ALICE, 30).unwrap();
        a.close_step();
        let message = a.matrix.roots_message();
        assert_eq!((message.version, message.timestamp), (2, 200));

        a.relay_to(&b).await;
        b.deliver().unwrap();
        let (receipt, _) = b.settle_from(&a, APP, 200, &[ALICE, BOB], &[]);
        assert_eq!(receipt.version, 2);

        b.clock.set(300);
        assert_eq!(b.matrix.get_remote_liquidity(APP, 1, ALICE), 30);
        assert_eq!(b.matrix.get_remote_liquidity(APP, 1, BOB), 0);
        assert_eq!(b.matrix.get_settled_remote_total_liquidity(APP, 1), 30);
        assert_eq!(b.matrix.get_remote_liquidity_at(APP, 1, ALICE, 150), 100);
        assert_eq!(b.matrix.get_remote_total_liquidity_at(APP, 1, 150), 150);
        assert_eq!(b.matrix.get_aggregated_settled_total_liquidity(APP), 30);
        assert!(b
            .events
            .filter(|e| matches!(e, LedgerEvent::LiquiditySettled { version: 2, .. }))
            .len()
            == 1);
    }

    // =============================================================================
    // FLOW 4: CONCURRENT WRITERS
    // =============================================================================

    #[test]
    fn test_concurrent_apps_do_not_interfere() {
        let chain = Arc::new(SimChain::new(1, &[1, 2], 100));

        std::thread::scope(|scope| {
            for i in 1..=8u8 {
                let chain = Arc::clone(&chain);
                scope.spawn(move || {
                    let app = [i; 20];
                    chain.register(app);
                    for account in 1..=25u8 {
                        chain
                            .matrix
                            .update_liquidity(app, [account; 20], i as i128)
                            .unwrap();
                    }
                });
            }
        });

        let mut indices: Vec<u64> = (1..=8u8)
            .map(|i| {
                let app = [i; 20];
                assert_eq!(chain.matrix.get_local_total_liquidity(app), 25 * i as i128);
                chain
                    .matrix
                    .get_top_liquidity_proof(app)
                    .unwrap()
                    .main_tree_index
            })
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..8).collect::<Vec<u64>>());
        assert_eq!(chain.events.count("local_liquidity_updated"), 8 * 25);
    }
}
