use std::sync::Arc;

use cvm_runtime::{
    gas::BasicHostGasMeter,
    state::{MemoryBackend, StateAdapter},
    types::{Address, BlockHeader, Event},
    CallRequest, DeployRequest, ExecutionError, ExecutionResult, Params, Runtime,
};

use super::ScriptEvm;

pub const HOST_GAS_LIMIT: u64 = 1_000_000;

pub const ALICE: Address = Address([0xa1; 20]);
pub const BOB: Address = Address([0xb0; 20]);

/// Everything one call leaves behind.
pub struct Outcome {
    pub result: Result<ExecutionResult, ExecutionError>,
    pub events: Vec<Event>,
    pub host_gas: BasicHostGasMeter,
}

impl Outcome {
    pub fn unwrap(&self) -> &ExecutionResult {
        match &self.result {
            Ok(result) => result,
            Err(e) => panic!("call failed: {:?}", e),
        }
    }

    pub fn error(&self) -> ExecutionError {
        match &self.result {
            Ok(_) => panic!("call succeeded"),
            Err(e) => e.clone(),
        }
    }

    pub fn address(&self) -> Address {
        self.unwrap().address.unwrap()
    }
}

/// An in-memory chain with a funded account, the script EVM, and the built-in WASM interpreter.
pub struct TestWorld {
    pub backend: MemoryBackend,
    pub runtime: Runtime,
    pub header: BlockHeader,
    pub params: Params,
}

impl TestWorld {
    pub fn new() -> Self {
        let backend = MemoryBackend::new();
        backend.fund(&ALICE, 1_000);
        Self {
            backend,
            runtime: Runtime::new().set_evm_interpreter(Arc::new(ScriptEvm)),
            header: BlockHeader {
                height: 10,
                time: 1_700_000_000,
                last_block_hash: Some([9u8; 32]),
            },
            params: Params::new(1),
        }
    }

    pub fn adapter(&self) -> StateAdapter<MemoryBackend> {
        StateAdapter::new(self.backend.clone())
    }

    pub fn balance(&self, address: &Address) -> u64 {
        self.adapter()
            .get_account(address)
            .unwrap()
            .map_or(0, |account| account.balance)
    }

    pub fn deploy(&self, request: DeployRequest) -> Outcome {
        self.deploy_with_gas(request, HOST_GAS_LIMIT)
    }

    pub fn deploy_with_gas(&self, request: DeployRequest, gas_limit: u64) -> Outcome {
        let mut host_gas = BasicHostGasMeter::new(gas_limit);
        let mut events = Vec::new();
        let result = self.runtime.deploy(
            self.backend.clone(),
            self.header.clone(),
            &self.params,
            request,
            &mut host_gas,
            &mut events,
        );
        Outcome {
            result,
            events,
            host_gas,
        }
    }

    /// Deploys an EVM script from ALICE and advances ALICE's sequence, as the host would.
    pub fn deploy_script(&self, script: &str) -> Address {
        let outcome = self.deploy(DeployRequest {
            caller: ALICE,
            code: script.as_bytes().to_vec(),
            ..Default::default()
        });
        self.backend.increment_sequence(&ALICE);
        outcome.address()
    }

    pub fn call(&self, request: CallRequest) -> Outcome {
        self.call_with_gas(request, HOST_GAS_LIMIT)
    }

    pub fn call_with_gas(&self, request: CallRequest, gas_limit: u64) -> Outcome {
        let mut host_gas = BasicHostGasMeter::new(gas_limit);
        let mut events = Vec::new();
        let result = self.runtime.call(
            self.backend.clone(),
            self.header.clone(),
            &self.params,
            request,
            &mut host_gas,
            &mut events,
        );
        Outcome {
            result,
            events,
            host_gas,
        }
    }

    pub fn call_from_alice(&self, callee: Address, data: &[u8]) -> Outcome {
        self.call(CallRequest {
            caller: ALICE,
            callee,
            value: 0,
            data: data.to_vec(),
            view: false,
        })
    }
}
