use cvm_runtime::{
    genesis::{GenesisAccount, GenesisMetadata, GenesisStorage},
    state::MemoryBackend,
    types::{keccak256, CodeKind},
    DeployRequest, GenesisState,
};

use crate::common::{echo, word, TestWorld, ALICE};

mod common;

/// A world with an EVM contract (with storage, metadata and abi) and a WASM contract.
fn populated_world() -> TestWorld {
    let world = TestWorld::new();
    world
        .deploy(DeployRequest {
            caller: ALICE,
            code: b"sstore 01 ff\nsstore 02 aabb".to_vec(),
            metas: vec!["first".to_string(), "second".to_string()],
            abi: Some(b"[]".to_vec()),
            ..Default::default()
        })
        .address();
    world.backend.increment_sequence(&ALICE);
    world
        .deploy(DeployRequest {
            caller: ALICE,
            code: echo(),
            wasm: true,
            metas: vec!["echo".to_string()],
            ..Default::default()
        })
        .address();
    world
}

#[test]
fn test_genesis_export() {
    let world = populated_world();
    let genesis = world.runtime.genesis_export(world.backend.clone()).unwrap();

    assert_eq!(genesis.accounts.len(), 2);
    assert_eq!(genesis.metadata.len(), 3);
    let evm = genesis
        .accounts
        .iter()
        .find(|account| account.kind == CodeKind::Evm)
        .unwrap();
    assert_eq!(
        evm.storage,
        vec![
            GenesisStorage {
                key: word(1),
                value: vec![0xff]
            },
            GenesisStorage {
                key: word(2),
                value: vec![0xaa, 0xbb]
            },
        ]
    );
    assert_eq!(evm.contract_meta.len(), 2);
    assert_eq!(evm.contract_meta[1].metadata_hash, keccak256(b"second"));
    assert_eq!(evm.abi, Some(b"[]".to_vec()));
}

/// Export(Import(Export(X))) == Export(X), also through JSON.
#[test]
fn test_genesis_round_trip() {
    let world = populated_world();
    let exported = world.runtime.genesis_export(world.backend.clone()).unwrap();
    let json = exported.to_json().unwrap();

    let fresh = MemoryBackend::new();
    let imported = GenesisState::from_json(&json).unwrap();
    world
        .runtime
        .genesis_import(fresh.clone(), &imported)
        .unwrap();
    let re_exported = world.runtime.genesis_export(fresh.clone()).unwrap();
    assert_eq!(re_exported, exported);

    // contracts run the same after import
    let address = exported
        .accounts
        .iter()
        .find(|account| account.kind == CodeKind::Wasm)
        .unwrap()
        .address;
    let mut copy = TestWorld::new();
    copy.backend = fresh;
    copy.backend.fund(&ALICE, 1_000);
    assert_eq!(
        copy.call_from_alice(address, &[4, 2]).unwrap().return_value,
        vec![4, 2]
    );
}

/// Importing keeps balances already present in the ledger and adds unlinked metadata.
#[test]
fn test_genesis_import_into_funded_account() {
    let backend = MemoryBackend::new();
    let world = TestWorld::new();
    let address = ALICE;

    let genesis = GenesisState {
        accounts: vec![GenesisAccount {
            address,
            kind: CodeKind::Evm,
            code: b"return 01".to_vec(),
            storage: vec![GenesisStorage {
                key: word(3),
                value: vec![3],
            }],
            contract_meta: vec![],
            abi: None,
        }],
        metadata: vec![GenesisMetadata {
            hash: keccak256(b"loose"),
            metadata: "loose".to_string(),
        }],
    };
    backend.fund(&address, 77);
    world.runtime.genesis_import(backend.clone(), &genesis).unwrap();

    let exported = world.runtime.genesis_export(backend.clone()).unwrap();
    assert_eq!(exported, genesis);
    assert_eq!(backend.total_supply(), 77);
    assert_eq!(
        world
            .runtime
            .get_metadata(backend.clone(), &keccak256(b"loose"))
            .unwrap(),
        Some("loose".to_string())
    );
    assert_eq!(world.runtime.get_storage(backend, &address, &word(3)), vec![3]);
}
