use cvm_runtime::{
    gas::{storage_set_cost, HostGasMeter},
    types::{keccak256, Address, CallEvent, Code, Event, LogEvent},
    Cache, CallRequest, DeployRequest, ErrorCode, ExecutionError,
};

use crate::common::{
    block_reader, deleter, echo, float_user, forwarder, hasher, infinite_loop, initialized_reader,
    reverter, store_and_log, without_entrypoint, word, Outcome, TestWorld, ALICE,
};

mod common;

fn deploy_wasm(world: &TestWorld, code: Vec<u8>) -> Outcome {
    let outcome = world.deploy(DeployRequest {
        caller: ALICE,
        code,
        wasm: true,
        ..Default::default()
    });
    world.backend.increment_sequence(&ALICE);
    outcome
}

fn call_with_value(world: &TestWorld, callee: Address, value: u64, data: Vec<u8>) -> Outcome {
    world.call(CallRequest {
        caller: ALICE,
        callee,
        value,
        data,
        view: false,
    })
}

#[test]
fn test_wasm_deploy_and_call() {
    let world = TestWorld::new();
    let code = store_and_log();
    let contract = deploy_wasm(&world, code.clone()).address();
    assert_eq!(
        world.runtime.get_code(world.backend.clone(), &contract).unwrap(),
        Some(Code::Wasm(code))
    );

    let outcome = world.call_from_alice(contract, &[]);
    let result = outcome.unwrap();
    assert_eq!(result.return_value, b"hello".to_vec());
    assert!(result.gas.consumed > storage_set_cost(0, 5).values().0);
    assert_eq!(outcome.host_gas.consumed(), result.gas.host_fee);
    assert_eq!(
        outcome.events,
        vec![Event::Log(LogEvent {
            address: contract,
            topics: vec![word(1)],
            data: b"hello".to_vec(),
        })]
    );
    assert_eq!(
        world.runtime.get_storage(world.backend.clone(), &contract, &word(1)),
        b"hello".to_vec()
    );
}

#[test]
fn test_wasm_input() {
    let world = TestWorld::new();
    let contract = deploy_wasm(&world, echo()).address();
    let outcome = world.call_from_alice(contract, &[1, 2, 3]);
    assert_eq!(outcome.unwrap().return_value, vec![1, 2, 3]);
}

/// `init` runs once at deploy; its writes are visible to later calls.
#[test]
fn test_wasm_init() {
    let world = TestWorld::new();
    let outcome = deploy_wasm(&world, initialized_reader());
    assert!(outcome.unwrap().gas.fee > 0);
    let contract = outcome.address();
    assert_eq!(
        world.runtime.get_storage(world.backend.clone(), &contract, &word(1)),
        b"hello".to_vec()
    );
    assert_eq!(
        world.call_from_alice(contract, &[]).unwrap().return_value,
        b"hello".to_vec()
    );
}

/// Deleting a storage cell earns a refund, capped at half of the consumed gas.
#[test]
fn test_wasm_storage_delete_refund() {
    let world = TestWorld::new();
    let contract = deploy_wasm(&world, deleter()).address();

    let gas = world.call_from_alice(contract, &[]).unwrap().gas;
    assert!(gas.refund > 0);
    assert_eq!(gas.refund, gas.consumed / 2);
    assert_eq!(gas.fee, gas.consumed - gas.refund);
    assert_eq!(
        world.runtime.get_storage(world.backend.clone(), &contract, &word(1)),
        vec![0u8; 32]
    );
}

#[test]
fn test_wasm_revert() {
    let world = TestWorld::new();
    let contract = deploy_wasm(&world, reverter()).address();
    let before = world.backend.dump();

    let outcome = world.call_from_alice(contract, &[]);
    assert_eq!(outcome.error(), ExecutionError::ExecutionReverted(b"hell".to_vec()));
    assert_eq!(world.backend.dump(), before);
}

#[test]
fn test_wasm_gas_exhaustion() {
    let world = TestWorld::new();
    let contract = deploy_wasm(&world, infinite_loop()).address();
    let before = world.backend.dump();

    let outcome = world.call_with_gas(
        CallRequest {
            caller: ALICE,
            callee: contract,
            value: 1,
            data: vec![],
            view: false,
        },
        100_000,
    );
    assert_eq!(outcome.error(), ExecutionError::InsufficientGas);
    assert_eq!(outcome.host_gas.consumed(), 100_000);
    assert_eq!(world.backend.dump(), before);
    assert_eq!(world.balance(&ALICE), 1_000);
}

/// A WASM contract calls another WASM contract; the callee's writes and events are part of the
/// outer call.
#[test]
fn test_wasm_nested_call() {
    let world = TestWorld::new();
    let callee = deploy_wasm(&world, store_and_log()).address();
    let caller = deploy_wasm(&world, forwarder()).address();

    let outcome = call_with_value(&world, caller, 7, callee.to_vec());
    assert_eq!(outcome.unwrap().return_value, b"hello".to_vec());
    assert_eq!(
        outcome.events,
        vec![
            Event::Call(CallEvent {
                caller,
                callee,
                value: 7,
                input: vec![],
                depth: 1,
                return_value: b"hello".to_vec(),
            }),
            Event::Log(LogEvent {
                address: callee,
                topics: vec![word(1)],
                data: b"hello".to_vec(),
            }),
        ]
    );
    assert_eq!(world.balance(&callee), 7);
    assert_eq!(world.balance(&caller), 0);
    assert_eq!(
        world.runtime.get_storage(world.backend.clone(), &callee, &word(1)),
        b"hello".to_vec()
    );
}

/// A WASM contract calls an EVM contract.
#[test]
fn test_wasm_calls_evm() {
    let world = TestWorld::new();
    let evm = world.deploy_script(&format!("deploy {}", hex::encode("log 02 bb\nreturn 0b")));
    let caller = deploy_wasm(&world, forwarder()).address();

    let outcome = call_with_value(&world, caller, 0, evm.to_vec());
    assert_eq!(outcome.unwrap().return_value, vec![0x0b]);
    assert_eq!(outcome.events.len(), 2);
}

/// A nested call into a reverting contract aborts the outer call.
#[test]
fn test_wasm_nested_revert() {
    let world = TestWorld::new();
    let callee = deploy_wasm(&world, reverter()).address();
    let caller = deploy_wasm(&world, forwarder()).address();
    let before = world.backend.dump();

    let outcome = call_with_value(&world, caller, 3, callee.to_vec());
    assert_eq!(outcome.error(), ExecutionError::ExecutionReverted(b"hell".to_vec()));
    assert!(outcome.events.is_empty());
    assert_eq!(world.backend.dump(), before);
}

#[test]
fn test_wasm_block_environment() {
    let world = TestWorld::new();
    let contract = deploy_wasm(&world, block_reader()).address();
    assert_eq!(
        world.call_from_alice(contract, &[]).unwrap().return_value,
        10u64.to_le_bytes().to_vec()
    );

    world.runtime.begin_block(world.backend.clone(), &world.header);
    let mut expected = 10u64.to_le_bytes().to_vec();
    expected.extend_from_slice(&[9u8; 32]);
    assert_eq!(
        world.call_from_alice(contract, &[]).unwrap().return_value,
        expected
    );
}

#[test]
fn test_wasm_hash_function() {
    let world = TestWorld::new();
    let contract = deploy_wasm(&world, hasher()).address();
    assert_eq!(
        world.call_from_alice(contract, &[]).unwrap().return_value,
        keccak256(b"hello").to_vec()
    );
}

#[test]
fn test_wasm_invalid_code() {
    let world = TestWorld::new();
    for code in [float_user(), without_entrypoint(), vec![0xde, 0xad, 0xbe, 0xef]] {
        let outcome = world.deploy(DeployRequest {
            caller: ALICE,
            code,
            wasm: true,
            ..Default::default()
        });
        assert_eq!(outcome.error().code(), ErrorCode::InvalidCode);
    }
}

#[test]
fn test_wasm_memory_limit() {
    let mut world = TestWorld::new();
    world.runtime = world.runtime.clone().set_smart_contract_memory_limit(0);
    let outcome = deploy_wasm(&world, echo());
    assert_eq!(outcome.error().code(), ErrorCode::InvalidCode);

    world.runtime = world
        .runtime
        .clone()
        .set_smart_contract_memory_limit(64 * 1024);
    let contract = deploy_wasm(&world, echo()).address();
    assert_eq!(
        world.call_from_alice(contract, &[5]).unwrap().return_value,
        vec![5]
    );
}

/// Compiled modules are cached by code hash; a cached module behaves like a fresh one.
#[test]
fn test_wasm_module_cache() {
    let cache_dir = std::env::temp_dir().join("cvm_runtime_module_cache");
    let mut world = TestWorld::new();
    world.runtime = world
        .runtime
        .clone()
        .set_smart_contract_cache(Cache::new(cache_dir).unwrap());

    let contract = deploy_wasm(&world, echo()).address();
    let first = world.call_from_alice(contract, &[1]).unwrap().gas;
    let second = world.call_from_alice(contract, &[1]).unwrap().gas;
    assert_eq!(first, second);
}
