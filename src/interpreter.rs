/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [Interpreter] capability, dispatch between bytecode flavors, and nested calls.
//!
//! Every interpreter sees the call through a [CallContext]: the shared state of the whole call tree,
//! the block environment, and the [Dispatcher] through which it reaches other contracts. Nested calls
//! share the state handle and draw from the same gas. Nothing is committed before the top-level call
//! finishes.

use std::sync::Arc;

use crate::{
    error::InterpreterError,
    execution::{block_env::BlockInfo, cache::{lock_state, SharedState, StateAccess}},
    gas::{GasLedger, CALL_BASE_COST},
    params::MAX_CALL_DEPTH,
    types::{Account, Address, CallEvent, CallParams, Code, CodeKind, Event, LogEvent},
};

/// Receiver of the events a call emits.
pub trait EventSink {
    fn call(&mut self, event: CallEvent);

    fn log(&mut self, event: LogEvent);
}

impl EventSink for Vec<Event> {
    fn call(&mut self, event: CallEvent) {
        self.push(Event::Call(event));
    }

    fn log(&mut self, event: LogEvent) {
        self.push(Event::Log(event));
    }
}

/// Forwards buffered events to a sink, preserving their order.
pub fn forward_events(events: Vec<Event>, sink: &mut dyn EventSink) {
    for event in events {
        match event {
            Event::Call(e) => sink.call(e),
            Event::Log(e) => sink.log(e),
        }
    }
}

/// Executes one flavor of bytecode.
pub trait Interpreter: Send + Sync {
    /// Runs `code` for `params`. Engine gas is drawn from `gas`; an interpreter must stop with
    /// `InsufficientGas` rather than continue once it is exhausted. Refunds are credited to `gas`.
    fn execute(
        &self,
        ctx: &CallContext,
        sink: &mut dyn EventSink,
        params: &CallParams,
        code: &[u8],
        gas: &mut GasLedger,
    ) -> Result<Vec<u8>, InterpreterError>;
}

/// Everything an interpreter may reach during a call.
#[derive(Clone)]
pub struct CallContext {
    pub state: SharedState,
    pub block: Arc<dyn BlockInfo>,
    pub dispatcher: Arc<Dispatcher>,
}

/// How the bytes of a call or deploy are handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vm {
    Evm,
    Wasm,
    /// Install the bytes of a deploy verbatim as code of the given flavor, without running them.
    Runtime(CodeKind),
}

impl Vm {
    pub fn for_deploy(wasm: bool, runtime: bool) -> Self {
        let kind = if wasm { CodeKind::Wasm } else { CodeKind::Evm };
        match (runtime, kind) {
            (true, kind) => Vm::Runtime(kind),
            (false, CodeKind::Wasm) => Vm::Wasm,
            (false, CodeKind::Evm) => Vm::Evm,
        }
    }

    pub fn for_code(code: &Code) -> Self {
        match code.kind() {
            CodeKind::Evm => Vm::Evm,
            CodeKind::Wasm => Vm::Wasm,
        }
    }

    pub fn code_kind(&self) -> CodeKind {
        match self {
            Vm::Evm => CodeKind::Evm,
            Vm::Wasm => CodeKind::Wasm,
            Vm::Runtime(kind) => *kind,
        }
    }
}

/// Holds the configured interpreters and selects one per code flavor.
#[derive(Clone, Default)]
pub struct Dispatcher {
    evm: Option<Arc<dyn Interpreter>>,
    wasm: Option<Arc<dyn Interpreter>>,
}

impl Dispatcher {
    pub fn new(evm: Option<Arc<dyn Interpreter>>, wasm: Option<Arc<dyn Interpreter>>) -> Self {
        Self { evm, wasm }
    }

    pub fn interpreter(&self, kind: CodeKind) -> Result<&Arc<dyn Interpreter>, InterpreterError> {
        let interpreter = match kind {
            CodeKind::Evm => self.evm.as_ref(),
            CodeKind::Wasm => self.wasm.as_ref(),
        };
        interpreter.ok_or(InterpreterError::Unavailable(kind))
    }

    /// Runs `code` with the interpreter of its flavor.
    pub fn run(
        &self,
        ctx: &CallContext,
        sink: &mut dyn EventSink,
        params: &CallParams,
        code: &Code,
        gas: &mut GasLedger,
    ) -> Result<Vec<u8>, InterpreterError> {
        if params.depth > MAX_CALL_DEPTH {
            return Err(InterpreterError::CallDepthExceeded);
        }
        self.interpreter(code.kind())?
            .execute(ctx, sink, params, code.bytes(), gas)
    }

    /// Performs a nested contract-to-contract call: transfers `params.value`, then runs the callee's
    /// code. A codeless callee accepts a plain transfer only. A [CallEvent] is emitted ahead of the
    /// events of the callee.
    pub fn call(
        &self,
        ctx: &CallContext,
        sink: &mut dyn EventSink,
        params: &CallParams,
        gas: &mut GasLedger,
    ) -> Result<Vec<u8>, InterpreterError> {
        if params.depth > MAX_CALL_DEPTH {
            return Err(InterpreterError::CallDepthExceeded);
        }
        gas.consume(CALL_BASE_COST)?;

        let code = {
            let mut state = lock_state(&ctx.state);
            transfer_value(&mut *state, &params.caller, &params.callee, params.value)?;
            state
                .get_account(&params.callee)?
                .and_then(|account| account.code)
                .filter(|code| !code.is_empty())
        };

        let mut events = Vec::new();
        let return_value = match code {
            Some(code) => self.run(ctx, &mut events, params, &code, gas)?,
            None if params.input.is_empty() => Vec::new(),
            None => return Err(InterpreterError::CodeOutOfBounds(params.callee)),
        };

        sink.call(CallEvent {
            caller: params.caller,
            callee: params.callee,
            value: params.value,
            input: params.input.clone(),
            depth: params.depth,
            return_value: return_value.clone(),
        });
        forward_events(events, sink);
        Ok(return_value)
    }
}

/// Moves `value` from `from` to `to` inside the call's state. The recipient is created if it does not
/// exist yet, even for a zero value.
pub fn transfer_value(
    state: &mut dyn StateAccess,
    from: &Address,
    to: &Address,
    value: u64,
) -> Result<(), InterpreterError> {
    let mut sender = state.get_account(from)?.unwrap_or_else(|| Account::new(*from));
    if sender.balance < value {
        return Err(InterpreterError::InsufficientBalance(*from));
    }
    if from == to || value == 0 {
        if state.get_account(to)?.is_none() {
            state.update_account(Account::new(*to))?;
        }
        return Ok(());
    }

    let mut recipient = state.get_account(to)?.unwrap_or_else(|| Account::new(*to));
    recipient.balance = recipient
        .balance
        .checked_add(value)
        .ok_or_else(|| InterpreterError::Other(format!("balance of {} overflows", to)))?;
    sender.balance -= value;
    state.update_account(sender)?;
    state.update_account(recipient)?;
    Ok(())
}
