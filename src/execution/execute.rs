/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Orchestrates one deploy or call end-to-end across the [phases](super::phase).
//!
//! The [Coordinator] owns the call's [ChangeCache], gas ledger and block environment for the call's
//! lifetime. The cache is synced exactly once, after the call completed without error and only if
//! the call is not a view call. Events are buffered and forwarded to the host's sink on success.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use super::{
    block_env::BlockInfo,
    cache::{lock_state, ChangeCache, SharedState},
    phase::{self, Settlement},
};
use crate::{
    error::ExecutionError,
    gas::{GasConverter, GasLedger, HostGasMeter},
    interpreter::{forward_events, CallContext, Dispatcher, EventSink, Vm},
    state::{Backend, StateAdapter},
    types::{Address, CallKind, CallParams, Code, Event},
};

/// Input of a deploy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeployRequest {
    pub caller: Address,
    /// Amount moved from the caller into the new contract account
    pub value: u64,
    /// Init code, or the runtime code itself if `runtime` is set
    pub code: Vec<u8>,
    /// Descriptive strings linked to the deployed code
    pub metas: Vec<String>,
    /// Opaque descriptor stored next to the code
    pub abi: Option<Vec<u8>>,
    /// Code flavor: WASM if set, EVM otherwise
    pub wasm: bool,
    /// Install `code` verbatim instead of running it
    pub runtime: bool,
    pub view: bool,
}

/// Input of a call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub caller: Address,
    pub callee: Address,
    pub value: u64,
    pub data: Vec<u8>,
    pub view: bool,
}

/// Outcome of a successful deploy or call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Return data of a call, or the address bytes of a deployed contract
    pub return_value: Vec<u8>,
    /// Address of the deployed contract
    pub address: Option<Address>,
    pub gas: Settlement,
}

/// Coordinator runs calls against one backend, in one block, with one set of interpreters.
pub struct Coordinator<B: Backend> {
    backend: B,
    block: Arc<dyn BlockInfo>,
    dispatcher: Arc<Dispatcher>,
    converter: GasConverter,
}

impl<B: Backend> Coordinator<B> {
    pub fn new(
        backend: B,
        block: Arc<dyn BlockInfo>,
        dispatcher: Arc<Dispatcher>,
        converter: GasConverter,
    ) -> Self {
        Self {
            backend,
            block,
            dispatcher,
            converter,
        }
    }

    pub fn deploy(
        &self,
        request: DeployRequest,
        host_gas: &mut dyn HostGasMeter,
        sink: &mut dyn EventSink,
    ) -> Result<ExecutionResult, ExecutionError> {
        let cache = self.open_cache();
        let state: SharedState = cache.clone();

        let address = phase::resolve_deploy(
            &mut *lock_state(&state),
            &request.caller,
            request.value,
            request.view,
        )
        .map_err(|e| aborted("resolve", e))?;
        debug!(caller = %request.caller, %address, "resolved deploy");

        let mut gas =
            phase::charge(&self.converter, host_gas).map_err(|e| aborted("charge", e))?;
        debug!(gas = gas.original(), "charged");

        let ctx = self.context(state);
        let mut events = Vec::new();
        let outcome = interpret_deploy(&ctx, &mut events, &request, &address, &mut gas)
            .map(|()| address.to_vec());

        self.finish(cache, outcome, request.view, gas, host_gas, sink, events, Some(address))
    }

    pub fn call(
        &self,
        request: CallRequest,
        host_gas: &mut dyn HostGasMeter,
        sink: &mut dyn EventSink,
    ) -> Result<ExecutionResult, ExecutionError> {
        let cache = self.open_cache();
        let state: SharedState = cache.clone();

        let code = phase::resolve_call(
            &mut *lock_state(&state),
            &request.caller,
            &request.callee,
            request.value,
            &request.data,
        )
        .map_err(|e| aborted("resolve", e))?;
        debug!(caller = %request.caller, callee = %request.callee, "resolved call");

        let mut gas =
            phase::charge(&self.converter, host_gas).map_err(|e| aborted("charge", e))?;
        debug!(gas = gas.original(), "charged");

        let ctx = self.context(state);
        let mut events = Vec::new();
        let outcome = match code {
            Some(code) => {
                let params = CallParams {
                    kind: CallKind::Call,
                    caller: request.caller,
                    callee: request.callee,
                    value: request.value,
                    input: request.data.clone(),
                    depth: 0,
                    is_view: request.view,
                };
                ctx.dispatcher
                    .run(&ctx, &mut events, &params, &code, &mut gas)
                    .map_err(ExecutionError::from)
            }
            // plain transfer to a codeless account
            None => Ok(Vec::new()),
        };

        self.finish(cache, outcome, request.view, gas, host_gas, sink, events, None)
    }

    fn open_cache(&self) -> Arc<Mutex<ChangeCache<B>>> {
        Arc::new(Mutex::new(ChangeCache::new(StateAdapter::new(
            self.backend.clone(),
        ))))
    }

    fn context(&self, state: SharedState) -> CallContext {
        CallContext {
            state,
            block: self.block.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }

    /// Commit or Abort, then Settle. The refund only applies if the commit went through.
    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        cache: Arc<Mutex<ChangeCache<B>>>,
        outcome: Result<Vec<u8>, ExecutionError>,
        view: bool,
        mut gas: GasLedger,
        host_gas: &mut dyn HostGasMeter,
        sink: &mut dyn EventSink,
        events: Vec<Event>,
        address: Option<Address>,
    ) -> Result<ExecutionResult, ExecutionError> {
        let committed = match outcome {
            Ok(return_value) if view => Ok(return_value),
            Ok(return_value) => cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .sync()
                .map(|()| {
                    debug!("committed");
                    return_value
                })
                .map_err(|e| aborted("commit", e.into())),
            Err(e) => Err(aborted("interpret", e)),
        };

        let settlement = phase::settle(&self.converter, &mut gas, host_gas, committed.is_ok());
        debug!(
            consumed = settlement.consumed,
            refund = settlement.refund,
            host_fee = settlement.host_fee,
            "settled"
        );

        let return_value = committed?;
        forward_events(events, sink);

        Ok(ExecutionResult {
            return_value,
            address,
            gas: settlement,
        })
    }
}

/// Interpret phase of a deploy: runs the init code, or takes the bytes verbatim for a runtime
/// deploy, then installs the resulting code.
fn interpret_deploy(
    ctx: &CallContext,
    events: &mut Vec<Event>,
    request: &DeployRequest,
    address: &Address,
    gas: &mut GasLedger,
) -> Result<(), ExecutionError> {
    let code = match Vm::for_deploy(request.wasm, request.runtime) {
        Vm::Runtime(kind) => Code::new(kind, request.code.clone()),
        vm => {
            let kind = vm.code_kind();
            let params = CallParams {
                kind: CallKind::Create,
                caller: request.caller,
                callee: *address,
                value: request.value,
                input: Vec::new(),
                depth: 0,
                is_view: request.view,
            };
            let runtime_code = ctx
                .dispatcher
                .interpreter(kind)?
                .execute(ctx, events, &params, &request.code, gas)?;
            Code::new(kind, runtime_code)
        }
    };
    phase::install_code(
        &mut *lock_state(&ctx.state),
        address,
        code,
        &request.metas,
        request.abi.clone(),
    )
}

fn aborted(phase: &str, error: ExecutionError) -> ExecutionError {
    let coded = error.coded();
    warn!(phase, code = coded.code, name = coded.name, "aborted: {}", coded.message);
    error
}
