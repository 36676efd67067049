use std::{collections::BTreeSet, sync::Arc, time::Duration};

use client::{
    ClientError, FaucetBridge, SubscriptionMessage, Wallet, WalletError,
};
use contracts::{ContractEvent, Identity};
use faucet::{FaucetError, CLAIM_AMOUNT, COOLDOWN_SECS, LIFETIME_CAP};
use init::{deploy_contracts, DeployOptions};
use server::{build_router, metrics::NodeMetrics, AppModuleCtx, ChainState, Clock, Node};
use tokio::sync::mpsc;

const CHAIN: u64 = 1337;
const START: u64 = 1_700_000_000;

async fn start_node() -> (String, Arc<Node>) {
    let metrics = NodeMetrics::new("test").unwrap();
    let node = Node::new(
        "test".to_string(),
        CHAIN,
        ChainState::default(),
        Clock::manual(START),
        None,
        metrics,
    );
    let router = build_router(AppModuleCtx {
        node: node.clone(),
        dev_mode: true,
        max_body_size: 1 << 20,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), node)
}

/// Node with both contracts deployed by `admin`.
async fn deployed() -> (FaucetBridge, Wallet, Arc<Node>) {
    let (url, node) = start_node().await;
    let admin = Wallet::generate();
    let deployment = deploy_contracts(&url, CHAIN, &admin, DeployOptions::default())
        .await
        .unwrap();
    assert_eq!(deployment.admin, *admin.identity());
    let bridge = FaucetBridge::new(deployment.config).unwrap();
    (bridge, admin, node)
}

fn faucet_error(result: Result<contracts::api::Receipt, ClientError>) -> FaucetError {
    let err = result.unwrap_err();
    err.faucet_error()
        .unwrap_or_else(|| panic!("expected a faucet revert, got {err:?}"))
}

#[tokio::test]
async fn deployment_wires_faucet_as_minter() {
    let (bridge, admin, _node) = deployed().await;

    let token = bridge.token_info().await.unwrap();
    assert_eq!(token.symbol, "JAN");
    assert_eq!(token.decimals, 18);
    assert_eq!(token.owner, *admin.identity());
    assert_eq!(token.minter, Identity::from("faucet"));

    let status = bridge.faucet_status().await.unwrap();
    assert_eq!(status.admin, *admin.identity());
    assert_eq!(status.claim_amount, CLAIM_AMOUNT);
    assert!(!status.paused);
}

#[tokio::test]
async fn claims_follow_cooldown_and_lifetime_cap() {
    let (bridge, _admin, _node) = deployed().await;
    let user = Wallet::generate();
    let account = user.identity();

    assert!(bridge.can_claim(account).await.unwrap());
    assert_eq!(bridge.remaining_allowance(account).await.unwrap(), LIFETIME_CAP);
    assert_eq!(bridge.last_claim_at(account).await.unwrap(), 0);

    let receipt = bridge.request_tokens(&user).await.unwrap();
    assert_eq!(receipt.timestamp, START);
    assert_eq!(bridge.balance_of(account).await.unwrap(), CLAIM_AMOUNT);
    assert_eq!(bridge.last_claim_at(account).await.unwrap(), START);

    // Views agree with the claim that follows them.
    assert!(!bridge.can_claim(account).await.unwrap());
    let err = bridge.request_tokens(&user).await.unwrap_err();
    assert_eq!(err.to_string(), "Cooldown period not elapsed");
    assert_eq!(err.faucet_error(), Some(FaucetError::CooldownNotElapsed));

    let claimant = bridge.claimant(account).await.unwrap();
    assert_eq!(claimant.cooldown_remaining(), COOLDOWN_SECS);

    let claims = (LIFETIME_CAP / CLAIM_AMOUNT) as usize;
    for _ in 1..claims {
        bridge.node().advance_time(COOLDOWN_SECS + 1).await.unwrap();
        assert!(bridge.can_claim(account).await.unwrap());
        bridge.request_tokens(&user).await.unwrap();
    }

    assert_eq!(bridge.balance_of(account).await.unwrap(), LIFETIME_CAP);
    assert_eq!(bridge.total_claimed(account).await.unwrap(), LIFETIME_CAP);
    assert_eq!(bridge.remaining_allowance(account).await.unwrap(), 0);

    bridge.node().advance_time(COOLDOWN_SECS + 1).await.unwrap();
    assert!(!bridge.can_claim(account).await.unwrap());
    assert_eq!(
        faucet_error(bridge.request_tokens(&user).await),
        FaucetError::LifetimeCapExceeded
    );
    assert_eq!(bridge.balance_of(account).await.unwrap(), LIFETIME_CAP);
}

#[tokio::test]
async fn only_admin_pauses() {
    let (bridge, admin, _node) = deployed().await;
    let user = Wallet::generate();

    let err = bridge.set_paused(&user, true).await.unwrap_err();
    assert_eq!(err.to_string(), "Only admin can call this function");
    assert!(!bridge.is_paused().await.unwrap());

    bridge.set_paused(&admin, true).await.unwrap();
    assert!(bridge.is_paused().await.unwrap());
    assert!(!bridge.can_claim(user.identity()).await.unwrap());
    assert_eq!(
        faucet_error(bridge.request_tokens(&user).await),
        FaucetError::Paused
    );

    bridge.set_paused(&admin, false).await.unwrap();
    bridge.request_tokens(&user).await.unwrap();
    assert_eq!(bridge.balance_of(user.identity()).await.unwrap(), CLAIM_AMOUNT);
}

#[tokio::test]
async fn reverted_claims_keep_the_nonce() {
    let (bridge, _admin, node) = deployed().await;
    let user = Wallet::generate();

    bridge.request_tokens(&user).await.unwrap();
    let nonce = bridge.node().get_nonce(user.identity()).await.unwrap();
    assert_eq!(nonce, 1);

    bridge.request_tokens(&user).await.unwrap_err();
    assert_eq!(bridge.node().get_nonce(user.identity()).await.unwrap(), nonce);

    let height = node.read(|state, _| state.block_height()).await;
    // token, faucet, set minter, one claim
    assert_eq!(height, 4);
}

#[tokio::test]
async fn claim_events_reach_subscribers() {
    let (bridge, _admin, _node) = deployed().await;
    let user = Wallet::generate();

    let (tx, mut rx) = mpsc::channel(16);
    let subscription = bridge.subscribe(user.identity().clone(), tx).unwrap();
    // Let both sockets finish their handshake.
    tokio::time::sleep(Duration::from_millis(300)).await;

    bridge.request_tokens(&user).await.unwrap();

    let mut seen = BTreeSet::new();
    while seen.len() < 2 {
        let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open");
        match message {
            SubscriptionMessage::Event(event) => match event.event {
                ContractEvent::Transfer { to, amount, .. } => {
                    assert_eq!(to, *user.identity());
                    assert_eq!(amount, CLAIM_AMOUNT);
                    seen.insert("transfer");
                }
                ContractEvent::TokensClaimed { user: who, .. } => {
                    assert_eq!(who, *user.identity());
                    seen.insert("claimed");
                }
                other => panic!("unexpected event {other:?}"),
            },
            SubscriptionMessage::Closed { error, .. } => panic!("stream closed: {error:?}"),
        }
    }
    assert!(subscription.is_active());
    subscription.detach();
}

#[tokio::test]
async fn wrong_chain_is_reported() {
    let (url, _node) = start_node().await;
    let bridge = FaucetBridge::new(client::BridgeConfig {
        node_url: url,
        chain_id: 7,
        token_contract: None,
        faucet_contract: None,
    })
    .unwrap();

    match bridge.check_network().await {
        Err(ClientError::Wallet(WalletError::NetworkMismatch { expected, actual })) => {
            assert_eq!(expected, 7);
            assert_eq!(actual, CHAIN);
        }
        other => panic!("expected a network mismatch, got {other:?}"),
    }

    // The node refuses transactions for another chain.
    let err = init::deploy_contracts(
        bridge.config().node_url.as_str(),
        7,
        &Wallet::generate(),
        DeployOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(format!("{err:#}").contains("Wrong network"));
}
