/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Host functions imported by WASM contracts from module `env`.
//!
//! |Function        | Signature                                                   |
//! |:---            |:---                                                         |
//! |`storage_get`   | `(key_ptr, value_ptr_ptr) -> value_len`                     |
//! |`storage_set`   | `(key_ptr, value_ptr, value_len)`                           |
//! |`caller`        | `(address_ptr)`                                             |
//! |`address`       | `(address_ptr)`                                             |
//! |`value`         | `() -> u64`                                                 |
//! |`input`         | `(input_ptr_ptr) -> input_len`                              |
//! |`balance`       | `() -> u64`                                                 |
//! |`block_height`  | `() -> u64`                                                 |
//! |`block_time`    | `() -> u64`                                                 |
//! |`block_hash`    | `(height: u64, hash_ptr) -> found`                          |
//! |`log`           | `(topics_ptr, topics_count, data_ptr, data_len)`            |
//! |`return_value`  | `(value_ptr, value_len)`                                    |
//! |`revert`        | `(data_ptr, data_len)`                                      |
//! |`call`          | `(address_ptr, value: u64, input_ptr, input_len, rval_ptr_ptr) -> rval_len` |
//! |`sha256`        | `(msg_ptr, msg_len, digest_ptr)`                            |
//! |`keccak256`     | `(msg_ptr, msg_len, digest_ptr)`                            |
//! |`ripemd160`     | `(msg_ptr, msg_len, digest_ptr)`                            |
//!
//! Storage keys are 32 bytes, addresses 20 bytes, topics 32 bytes each. Every function charges
//! gas from the instance's metering counter before it has an effect.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use wasmer::{imports, Function, ImportObject, Store};

use super::{env::Env, memory::MemoryContext};
use crate::{
    error::{InterpreterError, StateError},
    execution::cache::lock_state,
    gas::{self, GasLedger},
    types::{
        is_zero_value, keccak256, Address, CallKind, CallParams, Event, LogEvent, Word256,
        ADDRESS_LENGTH,
    },
};

/// FuncError defines the errors returned from execution of host functions. Any of them traps the
/// contract.
#[derive(Debug, thiserror::Error)]
pub enum FuncError {
    #[error("gas exhausted in host function")]
    GasExhaustion,

    /// The contract called `revert`.
    #[error("reverted")]
    Revert(Vec<u8>),

    /// Failure of a nested call or of the state.
    #[error(transparent)]
    Interpreter(InterpreterError),

    #[error("runtime: {0}")]
    Runtime(anyhow::Error),
}

impl From<anyhow::Error> for FuncError {
    fn from(e: anyhow::Error) -> Self {
        Self::Runtime(e)
    }
}

impl From<StateError> for FuncError {
    fn from(e: StateError) -> Self {
        Self::Interpreter(InterpreterError::State(e))
    }
}

impl From<InterpreterError> for FuncError {
    fn from(e: InterpreterError) -> Self {
        Self::Interpreter(e)
    }
}

/// Creates the import object for instantiating a contract module.
pub(crate) fn imports(store: &Store, env: &Env) -> ImportObject {
    imports! {
        "env" => {
            "storage_get" => Function::new_native_with_env(store, env.clone(), storage_get),
            "storage_set" => Function::new_native_with_env(store, env.clone(), storage_set),

            "caller" => Function::new_native_with_env(store, env.clone(), caller),
            "address" => Function::new_native_with_env(store, env.clone(), address),
            "value" => Function::new_native_with_env(store, env.clone(), value),
            "input" => Function::new_native_with_env(store, env.clone(), input),
            "balance" => Function::new_native_with_env(store, env.clone(), balance),

            "block_height" => Function::new_native_with_env(store, env.clone(), block_height),
            "block_time" => Function::new_native_with_env(store, env.clone(), block_time),
            "block_hash" => Function::new_native_with_env(store, env.clone(), block_hash),

            "log" => Function::new_native_with_env(store, env.clone(), log),
            "return_value" => Function::new_native_with_env(store, env.clone(), return_value),
            "revert" => Function::new_native_with_env(store, env.clone(), revert),
            "call" => Function::new_native_with_env(store, env.clone(), call),

            "sha256" => Function::new_native_with_env(store, env.clone(), sha256),
            "keccak256" => Function::new_native_with_env(store, env.clone(), keccak256_digest),
            "ripemd160" => Function::new_native_with_env(store, env.clone(), ripemd160),
        }
    }
}

/* ↓↓↓ Gas-charging helpers ↓↓↓ */

fn charge(env: &Env, amount: u64) -> Result<(), FuncError> {
    if env.gas().subtract(amount) {
        Ok(())
    } else {
        Err(FuncError::GasExhaustion)
    }
}

fn read(env: &Env, offset: u32, len: u32) -> Result<Vec<u8>, FuncError> {
    charge(env, gas::wasm_memory_read_cost(len as usize))?;
    Ok(env.read_bytes(offset, len)?)
}

fn read_word(env: &Env, offset: u32) -> Result<Word256, FuncError> {
    let bytes = read(env, offset, 32)?;
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes);
    Ok(word)
}

fn write(env: &Env, value: &[u8], val_ptr_ptr: u32) -> Result<u32, FuncError> {
    charge(env, gas::wasm_memory_write_cost(value.len()))?;
    Ok(env.write_bytes(value, val_ptr_ptr)?)
}

fn write_at(env: &Env, value: &[u8], ptr: u32) -> Result<(), FuncError> {
    charge(env, gas::wasm_memory_write_cost(value.len()))?;
    Ok(env.write_bytes_at(value, ptr)?)
}

/// Length a stored value counts for. Absent cells read as zero words and count as empty.
fn stored_len(value: &[u8]) -> usize {
    if is_zero_value(value) {
        0
    } else {
        value.len()
    }
}

/* ↓↓↓ Storage ↓↓↓ */

fn storage_get(env: &Env, key_ptr: u32, val_ptr_ptr: u32) -> Result<u32, FuncError> {
    let key = read_word(env, key_ptr)?;
    let value = lock_state(&env.ctx.state).get_storage(&env.params.callee, &key)?;
    charge(env, gas::storage_get_cost(stored_len(&value)))?;
    write(env, &value, val_ptr_ptr)
}

fn storage_set(env: &Env, key_ptr: u32, val_ptr: u32, val_len: u32) -> Result<(), FuncError> {
    let key = read_word(env, key_ptr)?;
    let value = read(env, val_ptr, val_len)?;

    let mut state = lock_state(&env.ctx.state);
    let old_value = state.get_storage(&env.params.callee, &key)?;
    let (deduct, reward) =
        gas::storage_set_cost(stored_len(&old_value), stored_len(&value)).values();
    charge(env, deduct)?;
    state.set_storage(&env.params.callee, key, value)?;
    drop(state);

    let mut output = env.output();
    output.refund = output.refund.saturating_add(reward);
    Ok(())
}

/* ↓↓↓ Call parameters ↓↓↓ */

fn caller(env: &Env, address_ptr: u32) -> Result<(), FuncError> {
    write_at(env, env.params.caller.as_bytes(), address_ptr)
}

fn address(env: &Env, address_ptr: u32) -> Result<(), FuncError> {
    write_at(env, env.params.callee.as_bytes(), address_ptr)
}

fn value(env: &Env) -> Result<u64, FuncError> {
    Ok(env.params.value)
}

fn input(env: &Env, input_ptr_ptr: u32) -> Result<u32, FuncError> {
    write(env, &env.params.input, input_ptr_ptr)
}

fn balance(env: &Env) -> Result<u64, FuncError> {
    charge(env, gas::storage_get_cost(std::mem::size_of::<u64>()))?;
    let account = lock_state(&env.ctx.state).get_account(&env.params.callee)?;
    Ok(account.map_or(0, |account| account.balance))
}

/* ↓↓↓ Block ↓↓↓ */

fn block_height(env: &Env) -> Result<u64, FuncError> {
    Ok(env.ctx.block.last_block_height())
}

fn block_time(env: &Env) -> Result<u64, FuncError> {
    Ok(env.ctx.block.last_block_time())
}

fn block_hash(env: &Env, height: u64, hash_ptr: u32) -> Result<i32, FuncError> {
    charge(env, gas::STORAGE_ACCESS_COST)?;
    match env.ctx.block.block_hash(height)? {
        Some(hash) => {
            write_at(env, &hash, hash_ptr)?;
            Ok(1)
        }
        None => Ok(0),
    }
}

/* ↓↓↓ Outputs ↓↓↓ */

fn log(
    env: &Env,
    topics_ptr: u32,
    topics_count: u32,
    data_ptr: u32,
    data_len: u32,
) -> Result<(), FuncError> {
    charge(env, gas::log_cost(topics_count as usize, data_len as usize))?;
    let topics = read(env, topics_ptr, topics_count.saturating_mul(32))?
        .chunks_exact(32)
        .map(|chunk| {
            let mut topic = [0u8; 32];
            topic.copy_from_slice(chunk);
            topic
        })
        .collect();
    let data = read(env, data_ptr, data_len)?;

    env.output().events.push(Event::Log(LogEvent {
        address: env.params.callee,
        topics,
        data,
    }));
    Ok(())
}

fn return_value(env: &Env, value_ptr: u32, value_len: u32) -> Result<(), FuncError> {
    let value = read(env, value_ptr, value_len)?;
    env.output().return_value = value;
    Ok(())
}

fn revert(env: &Env, data_ptr: u32, data_len: u32) -> Result<(), FuncError> {
    let data = read(env, data_ptr, data_len)?;
    Err(FuncError::Revert(data))
}

/// Nested call. The callee draws from this instance's remaining gas; what it consumes is deducted
/// afterwards and its refund is added to this call's refund.
fn call(
    env: &Env,
    address_ptr: u32,
    value: u64,
    input_ptr: u32,
    input_len: u32,
    rval_ptr_ptr: u32,
) -> Result<u32, FuncError> {
    let callee = Address::from_slice(&read(env, address_ptr, ADDRESS_LENGTH as u32)?)
        .map_err(|e| FuncError::Runtime(e.into()))?;
    let input = read(env, input_ptr, input_len)?;
    let params = CallParams {
        kind: CallKind::Call,
        caller: env.params.callee,
        callee,
        value,
        input,
        depth: env.params.depth + 1,
        is_view: env.params.is_view,
    };

    let mut gas = GasLedger::new(env.gas().gas());
    let mut events = Vec::new();
    let result = env
        .ctx
        .dispatcher
        .call(&env.ctx, &mut events, &params, &mut gas);

    env.gas().subtract(gas.consumed());
    let return_value = result?;

    let mut output = env.output();
    output.refund = output.refund.saturating_add(gas.refund());
    output.events.extend(events);
    drop(output);

    write(env, &return_value, rval_ptr_ptr)
}

/* ↓↓↓ Cryptographic functions ↓↓↓ */

fn sha256(env: &Env, msg_ptr: u32, msg_len: u32, digest_ptr: u32) -> Result<(), FuncError> {
    charge(env, (msg_len as u64).saturating_mul(gas::CRYPTO_SHA256_PER_BYTE))?;
    let message = read(env, msg_ptr, msg_len)?;
    let digest = Sha256::digest(&message);
    write_at(env, digest.as_slice(), digest_ptr)
}

fn keccak256_digest(
    env: &Env,
    msg_ptr: u32,
    msg_len: u32,
    digest_ptr: u32,
) -> Result<(), FuncError> {
    charge(env, (msg_len as u64).saturating_mul(gas::CRYPTO_KECCAK256_PER_BYTE))?;
    let message = read(env, msg_ptr, msg_len)?;
    write_at(env, &keccak256(&message), digest_ptr)
}

fn ripemd160(env: &Env, msg_ptr: u32, msg_len: u32, digest_ptr: u32) -> Result<(), FuncError> {
    charge(env, (msg_len as u64).saturating_mul(gas::CRYPTO_RIPEMD160_PER_BYTE))?;
    let message = read(env, msg_ptr, msg_len)?;
    let digest = Ripemd160::digest(&message);
    write_at(env, digest.as_slice(), digest_ptr)
}
