//! Integration tests for general message routing.
//!
//! Tests contract-call ingress from the connection router, egress to the
//! gateway contract, and routing of queued messages in the end blocker.

use cosmwasm_std::testing::{mock_env, MockStorage};
use cosmwasm_std::{coin, Addr, Binary, HexBinary, Storage, Uint128};
use serde_json::json;

use nexus::abci::end_blocker;
use nexus::chain::{activate_chain, register_asset, register_chain};
use nexus::custody::get_escrow_address;
use nexus::general_message::{
    enqueue_route_message, get_message, get_processing_messages, route_message, route_queue_len,
    set_new_message,
};
use nexus::hash::sha256;
use nexus::msg::WasmCallMessage;
use nexus::state::{Params, PARAMS};
use nexus::testing::{
    axelarnet_chain, evm_chain, setup_config, wasm_chain, MockBank, MockIbc, MockProxy,
    MockStaking, MockWasm, RecordingRoute, EVM_ADDRESS, MODULE_ACCOUNT, TERRA_ADDRESS,
};
use nexus::wasm::dispatch_wasm_messages;
use nexus::{
    AddressValidators, BankKeeper, ContractError, Keepers, MessageRouterBuilder, RoutingContext,
    WasmMessageRoute,
};
use nexus_common::{
    Asset, ChainName, CrossChainAddress, GeneralMessage, MessageId, MessageStatus, WASM_MODULE,
};

const ROUTER: &str = "axelar1connectionrouter";
const GATEWAY: &str = "axelar1gateway";
const TX: &[u8] = b"dispatch tx";

// ============================================================================
// Test Setup
// ============================================================================

#[derive(Default)]
struct Keeper {
    bank: MockBank,
    ibc: MockIbc,
    staking: MockStaking,
    proxy: MockProxy,
    wasm: MockWasm,
}

impl Keeper {
    fn keepers(&self) -> Keepers<'_> {
        Keepers {
            bank: &self.bank,
            ibc: &self.ibc,
            staking: &self.staking,
            proxy: &self.proxy,
            wasm: &self.wasm,
        }
    }
}

fn setup() -> MockStorage {
    let mut storage = MockStorage::new();
    setup_config(&mut storage).unwrap();
    set_params(&mut storage, Some(ROUTER), Some(GATEWAY));

    for chain in [axelarnet_chain(), evm_chain("Ethereum"), wasm_chain("Neutron")] {
        register_chain(&mut storage, &chain).unwrap();
        activate_chain(&mut storage, &chain).unwrap();
    }
    storage
}

fn set_params(storage: &mut dyn Storage, router: Option<&str>, gateway: Option<&str>) {
    PARAMS
        .save(
            storage,
            &Params {
                connection_router: router.map(Addr::unchecked),
                gateway: gateway.map(Addr::unchecked),
                ..Params::default()
            },
        )
        .unwrap();
}

fn call(recipient_chain: &str, recipient_address: &str) -> WasmCallMessage {
    WasmCallMessage {
        sender_chain: ChainName::unchecked("Stargaze"),
        sender_address: "stars1sender".to_string(),
        recipient_chain: ChainName::unchecked(recipient_chain),
        recipient_address: recipient_address.to_string(),
        payload_hash: Binary::from(vec![1u8; 32]),
        source_tx_id: Binary::from(vec![2u8; 32]),
        source_tx_index: 3,
        token: None,
    }
}

fn message_id(counter: u64) -> String {
    MessageId {
        tx_hash: sha256(TX),
        counter,
    }
    .to_string()
}

/// An approved message from Ethereum to a contract on Neutron
fn message(id: &str) -> GeneralMessage {
    GeneralMessage {
        id: id.to_string(),
        sender: CrossChainAddress::new(evm_chain("Ethereum"), EVM_ADDRESS),
        recipient: CrossChainAddress::new(wasm_chain("Neutron"), "neutron1contract"),
        payload_hash: HexBinary::from(vec![1u8; 32]),
        status: MessageStatus::Approved,
        asset: None,
        source_tx_id: HexBinary::from(vec![2u8; 32]),
        source_tx_index: 0,
    }
}

fn store_message(storage: &mut dyn Storage, id: &str) {
    set_new_message(storage, &message(id)).unwrap();
}

fn status(storage: &dyn Storage, id: &str) -> MessageStatus {
    get_message(storage, id).unwrap().unwrap().status
}

// ============================================================================
// Ingress Tests
// ============================================================================

#[test]
fn test_dispatch_requires_connection_router() {
    let mut storage = setup();
    let keeper = Keeper::default();

    let err = dispatch_wasm_messages(
        &mut storage,
        &keeper.keepers(),
        TX,
        &Addr::unchecked("axelar1someone"),
        vec![call("Ethereum", EVM_ADDRESS)],
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::NotConnectionRouter {
            address: "axelar1someone".to_string()
        }
    );

    set_params(&mut storage, None, Some(GATEWAY));
    let err = dispatch_wasm_messages(
        &mut storage,
        &keeper.keepers(),
        TX,
        &Addr::unchecked(ROUTER),
        vec![call("Ethereum", EVM_ADDRESS)],
    )
    .unwrap_err();
    assert_eq!(err, ContractError::ConnectionRouterNotSet);
}

#[test]
fn test_dispatch_sets_status_by_destination() {
    let mut storage = setup();
    let keeper = Keeper::default();

    let res = dispatch_wasm_messages(
        &mut storage,
        &keeper.keepers(),
        TX,
        &Addr::unchecked(ROUTER),
        vec![call("Ethereum", EVM_ADDRESS), call("axelarnet", TERRA_ADDRESS)],
    )
    .unwrap();

    assert_eq!(res.events.len(), 2);
    let count = res.attributes.iter().find(|a| a.key == "count").unwrap();
    assert_eq!(count.value, "2");

    // bound for another chain: routing is already underway
    let to_ethereum = get_message(&storage, &message_id(0)).unwrap().unwrap();
    assert_eq!(to_ethereum.status, MessageStatus::Processing);
    assert_eq!(to_ethereum.sender.chain.module, WASM_MODULE);
    assert_eq!(to_ethereum.source_chain(), &ChainName::unchecked("stargaze"));
    assert_eq!(to_ethereum.recipient.chain, evm_chain("Ethereum"));
    assert_eq!(to_ethereum.source_tx_index, 3);

    // bound for the home chain: waits to be routed
    assert_eq!(status(&storage, &message_id(1)), MessageStatus::Approved);

    let processing = get_processing_messages(&storage, &ChainName::unchecked("ethereum"), 10).unwrap();
    assert_eq!(processing, vec![to_ethereum]);
    assert!(get_processing_messages(&storage, &ChainName::unchecked("Axelarnet"), 10)
        .unwrap()
        .is_empty());
}

#[test]
fn test_dispatch_fails_on_unknown_destination() {
    let mut storage = setup();
    let keeper = Keeper::default();

    let err = dispatch_wasm_messages(
        &mut storage,
        &keeper.keepers(),
        TX,
        &Addr::unchecked(ROUTER),
        vec![call("Ethereum", EVM_ADDRESS), call("Unknown", EVM_ADDRESS)],
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::ChainNotFound {
            chain: "Unknown".to_string()
        }
    );
}

#[test]
fn test_dispatch_locks_token_from_router() {
    let mut storage = setup();
    let keeper = Keeper::default();
    let router = Addr::unchecked(ROUTER);
    keeper.bank.fund(&mut storage, &router, &coin(100, "uaxl")).unwrap();

    let mut with_token = call("Ethereum", EVM_ADDRESS);
    with_token.token = Some(coin(40, "uaxl"));
    dispatch_wasm_messages(&mut storage, &keeper.keepers(), TX, &router, vec![with_token]).unwrap();

    let msg = get_message(&storage, &message_id(0)).unwrap().unwrap();
    assert_eq!(msg.asset, Some(coin(40, "uaxl")));

    let escrow = get_escrow_address("axelar", "uaxl").unwrap();
    assert_eq!(keeper.bank.balance(&storage, &router, "uaxl").unwrap(), Uint128::new(60));
    assert_eq!(keeper.bank.balance(&storage, &escrow, "uaxl").unwrap(), Uint128::new(40));
}

// ============================================================================
// Egress Tests
// ============================================================================

#[test]
fn test_route_to_gateway() {
    let mut storage = setup();
    let wasm = MockWasm::default();
    let validators = AddressValidators::with_defaults();
    let router = MessageRouterBuilder::new()
        .add_route(WASM_MODULE, WasmMessageRoute::new(&wasm))
        .seal();
    let ctx = RoutingContext {
        sender: Addr::unchecked(MODULE_ACCOUNT),
        payload: None,
    };

    store_message(&mut storage, "msg-0");
    route_message(&mut storage, &mock_env(), &validators, &router, "msg-0", &ctx).unwrap();
    assert_eq!(status(&storage, "msg-0"), MessageStatus::Executed);

    let executions = wasm.executions();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].contract, Addr::unchecked(GATEWAY));
    assert_eq!(executions[0].caller, Addr::unchecked(MODULE_ACCOUNT));

    let sent: serde_json::Value = serde_json::from_slice(executions[0].msg.as_slice()).unwrap();
    assert_eq!(
        sent,
        json!({
            "route_messages_to_router": [{
                "source_chain": "Ethereum",
                "source_address": EVM_ADDRESS,
                "destination_chain": "Neutron",
                "destination_address": "neutron1contract",
                "payload_hash": vec![1u8; 32],
                "source_tx_id": vec![2u8; 32],
                "source_tx_index": 0,
                "id": "msg-0",
            }]
        })
    );
}

#[test]
fn test_route_to_gateway_failures() {
    let mut storage = setup();
    let wasm = MockWasm::default();
    let validators = AddressValidators::with_defaults();
    let router = MessageRouterBuilder::new()
        .add_route(WASM_MODULE, WasmMessageRoute::new(&wasm))
        .seal();
    let ctx = RoutingContext {
        sender: Addr::unchecked(MODULE_ACCOUNT),
        payload: None,
    };

    set_params(&mut storage, Some(ROUTER), None);
    store_message(&mut storage, "msg-0");
    let err = route_message(&mut storage, &mock_env(), &validators, &router, "msg-0", &ctx).unwrap_err();
    assert_eq!(
        err,
        ContractError::RouteFailed {
            id: "msg-0".to_string(),
            module: WASM_MODULE.to_string(),
            reason: ContractError::GatewayNotSet.to_string(),
        }
    );

    // tokens cannot be carried to the gateway
    set_params(&mut storage, Some(ROUTER), Some(GATEWAY));
    register_asset(&mut storage, &evm_chain("Ethereum"), &Asset::new("uaxl", false)).unwrap();
    let msg = GeneralMessage {
        asset: Some(coin(5, "uaxl")),
        ..message("msg-1")
    };
    set_new_message(&mut storage, &msg).unwrap();

    let err = route_message(&mut storage, &mock_env(), &validators, &router, "msg-1", &ctx).unwrap_err();
    assert_eq!(
        err,
        ContractError::RouteFailed {
            id: "msg-1".to_string(),
            module: WASM_MODULE.to_string(),
            reason: ContractError::AssetTransferNotSupported.to_string(),
        }
    );
    assert!(wasm.executions().is_empty());
}

// ============================================================================
// End Blocker Routing Tests
// ============================================================================

#[test]
fn test_end_blocker_routes_queue_up_to_limit() {
    let mut storage = setup();
    let keeper = Keeper::default();
    let validators = AddressValidators::with_defaults();
    let route = RecordingRoute::default();
    let router = MessageRouterBuilder::new()
        .add_route(WASM_MODULE, &route)
        .seal();

    PARAMS
        .update(&mut storage, |params| -> Result<_, ContractError> {
            Ok(Params {
                end_blocker_limit: 2,
                ..params
            })
        })
        .unwrap();

    for id in ["msg-0", "msg-1", "msg-2"] {
        store_message(&mut storage, id);
        enqueue_route_message(&mut storage, id).unwrap();
    }

    let res = end_blocker(&mut storage, &mock_env(), &keeper.proxy, &validators, &router).unwrap();
    let routed = res.attributes.iter().find(|a| a.key == "routed_messages").unwrap();
    assert_eq!(routed.value, "2");
    assert_eq!(route.routed(), vec!["msg-0".to_string(), "msg-1".to_string()]);
    assert_eq!(route_queue_len(&storage).unwrap(), 1);

    // routes leave the message processing until the destination confirms
    assert_eq!(status(&storage, "msg-0"), MessageStatus::Processing);
    assert_eq!(status(&storage, "msg-2"), MessageStatus::Approved);

    end_blocker(&mut storage, &mock_env(), &keeper.proxy, &validators, &router).unwrap();
    assert_eq!(route_queue_len(&storage).unwrap(), 0);
    assert_eq!(route.routed().len(), 3);
}

#[test]
fn test_end_blocker_marks_failed_routes_and_retries() {
    let mut storage = setup();
    let keeper = Keeper::default();
    let validators = AddressValidators::with_defaults();

    set_params(&mut storage, Some(ROUTER), None);
    store_message(&mut storage, "msg-0");
    enqueue_route_message(&mut storage, "msg-0").unwrap();

    {
        let router = MessageRouterBuilder::new()
            .add_route(WASM_MODULE, WasmMessageRoute::new(&keeper.wasm))
            .seal();
        let res = end_blocker(&mut storage, &mock_env(), &keeper.proxy, &validators, &router).unwrap();
        let routed = res.attributes.iter().find(|a| a.key == "routed_messages").unwrap();
        assert_eq!(routed.value, "0");
    }
    assert_eq!(status(&storage, "msg-0"), MessageStatus::Failed);
    assert!(get_processing_messages(&storage, &ChainName::unchecked("Neutron"), 10)
        .unwrap()
        .is_empty());

    // once the gateway is configured a retry goes through
    set_params(&mut storage, Some(ROUTER), Some(GATEWAY));
    enqueue_route_message(&mut storage, "msg-0").unwrap();
    let router = MessageRouterBuilder::new()
        .add_route(WASM_MODULE, WasmMessageRoute::new(&keeper.wasm))
        .seal();
    end_blocker(&mut storage, &mock_env(), &keeper.proxy, &validators, &router).unwrap();

    assert_eq!(status(&storage, "msg-0"), MessageStatus::Executed);
    assert_eq!(keeper.wasm.executions().len(), 1);
}

#[test]
fn test_end_blocker_discards_writes_of_failed_routes() {
    let mut storage = setup();
    let keeper = Keeper::default();
    let validators = AddressValidators::with_defaults();

    store_message(&mut storage, "msg-0");
    enqueue_route_message(&mut storage, "msg-0").unwrap();

    let failing = RecordingRoute::failing();
    let router = MessageRouterBuilder::new().add_route(WASM_MODULE, &failing).seal();
    end_blocker(&mut storage, &mock_env(), &keeper.proxy, &validators, &router).unwrap();

    assert_eq!(status(&storage, "msg-0"), MessageStatus::Failed);
    assert!(!RecordingRoute::marked(&storage, "msg-0"));

    // a successful retry keeps what the route wrote
    enqueue_route_message(&mut storage, "msg-0").unwrap();
    let route = RecordingRoute::default();
    let router = MessageRouterBuilder::new().add_route(WASM_MODULE, &route).seal();
    end_blocker(&mut storage, &mock_env(), &keeper.proxy, &validators, &router).unwrap();

    assert_eq!(status(&storage, "msg-0"), MessageStatus::Processing);
    assert!(RecordingRoute::marked(&storage, "msg-0"));
    assert_eq!(route.routed(), vec!["msg-0".to_string()]);
}

#[test]
fn test_end_blocker_leaves_invalid_messages_untouched() {
    let mut storage = setup();
    let keeper = Keeper::default();
    let validators = AddressValidators::with_defaults();
    let route = RecordingRoute::default();
    let router = MessageRouterBuilder::new().add_route(WASM_MODULE, &route).seal();

    // the sender's chain is not activated, so processing never starts
    register_chain(&mut storage, &evm_chain("Avalanche")).unwrap();
    let msg = GeneralMessage {
        sender: CrossChainAddress::new(evm_chain("Avalanche"), EVM_ADDRESS),
        ..message("msg-1")
    };
    set_new_message(&mut storage, &msg).unwrap();
    enqueue_route_message(&mut storage, "msg-1").unwrap();

    end_blocker(&mut storage, &mock_env(), &keeper.proxy, &validators, &router).unwrap();
    assert_eq!(status(&storage, "msg-1"), MessageStatus::Approved);
    assert!(route.routed().is_empty());
    assert_eq!(route_queue_len(&storage).unwrap(), 0);
}

#[test]
fn test_only_approved_or_failed_messages_are_queued() {
    let mut storage = setup();
    let keeper = Keeper::default();

    dispatch_wasm_messages(
        &mut storage,
        &keeper.keepers(),
        TX,
        &Addr::unchecked(ROUTER),
        vec![call("Ethereum", EVM_ADDRESS)],
    )
    .unwrap();

    let err = enqueue_route_message(&mut storage, &message_id(0)).unwrap_err();
    assert_eq!(
        err,
        ContractError::InvalidMessageStatus {
            id: message_id(0),
            status: "processing".to_string(),
            expected: "approved, failed".to_string(),
        }
    );

    let err = enqueue_route_message(&mut storage, "missing").unwrap_err();
    assert_eq!(
        err,
        ContractError::MessageNotFound {
            id: "missing".to_string()
        }
    );
}
