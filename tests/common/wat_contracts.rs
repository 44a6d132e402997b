//! Hand-written WASM contracts. Every contract shares one prelude: the host imports, one page of
//! exported memory, and a bump allocator. Memory layout used by the bodies:
//!
//! - `0..32`   storage key 1 (32-byte word whose last byte is 1)
//! - `64..69`  "hello"
//! - `128`     scratch pointer slots
//! - `1024..`  heap

const PRELUDE: &str = r#"
  (import "env" "storage_get" (func $storage_get (param i32 i32) (result i32)))
  (import "env" "storage_set" (func $storage_set (param i32 i32 i32)))
  (import "env" "input" (func $input (param i32) (result i32)))
  (import "env" "value" (func $value (result i64)))
  (import "env" "log" (func $log (param i32 i32 i32 i32)))
  (import "env" "return_value" (func $return_value (param i32 i32)))
  (import "env" "revert" (func $revert (param i32 i32)))
  (import "env" "call" (func $call (param i32 i64 i32 i32 i32) (result i32)))
  (import "env" "block_height" (func $block_height (result i64)))
  (import "env" "block_hash" (func $block_hash (param i64 i32) (result i32)))
  (import "env" "keccak256" (func $keccak256 (param i32 i32 i32)))
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 1024))
  (func (export "alloc") (param $len i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (local.get $len)))
    (local.get $ptr))
  (data (i32.const 31) "\01")
  (data (i32.const 64) "hello")
"#;

/// Compiles a contract from the prelude plus `body`.
pub fn wasm_contract(body: &str) -> Vec<u8> {
    wat::parse_str(format!("(module {} {})", PRELUDE, body)).unwrap()
}

/// Writes "hello" under key 1, logs it with key 1 as topic, and returns it.
pub fn store_and_log() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "entrypoint")
          (call $storage_set (i32.const 0) (i32.const 64) (i32.const 5))
          (call $log (i32.const 0) (i32.const 1) (i32.const 64) (i32.const 5))
          (call $return_value (i32.const 64) (i32.const 5)))
        "#,
    )
}

/// Returns its input.
pub fn echo() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "entrypoint")
          (local $len i32)
          (local.set $len (call $input (i32.const 128)))
          (call $return_value (i32.load (i32.const 128)) (local.get $len)))
        "#,
    )
}

/// Writes key 1 in `init`; `entrypoint` returns the value under key 1.
pub fn initialized_reader() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "init")
          (call $storage_set (i32.const 0) (i32.const 64) (i32.const 5)))
        (func (export "entrypoint")
          (local $len i32)
          (local.set $len (call $storage_get (i32.const 0) (i32.const 128)))
          (call $return_value (i32.load (i32.const 128)) (local.get $len)))
        "#,
    )
}

/// Writes key 1 in `init`; `entrypoint` deletes it.
pub fn deleter() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "init")
          (call $storage_set (i32.const 0) (i32.const 64) (i32.const 5)))
        (func (export "entrypoint")
          (call $storage_set (i32.const 0) (i32.const 64) (i32.const 0)))
        "#,
    )
}

/// Writes key 1, then reverts with "hell".
pub fn reverter() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "entrypoint")
          (call $storage_set (i32.const 0) (i32.const 64) (i32.const 5))
          (call $revert (i32.const 64) (i32.const 4)))
        "#,
    )
}

pub fn infinite_loop() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "entrypoint")
          (loop $forever (br $forever)))
        "#,
    )
}

/// Calls the contract whose 20-byte address is its input, forwarding the call value, and returns
/// what the callee returned.
pub fn forwarder() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "entrypoint")
          (local $target i32)
          (local $len i32)
          (drop (call $input (i32.const 128)))
          (local.set $target (i32.load (i32.const 128)))
          (local.set $len
            (call $call (local.get $target) (call $value) (local.get $target) (i32.const 0) (i32.const 136)))
          (call $return_value (i32.load (i32.const 136)) (local.get $len)))
        "#,
    )
}

/// Returns the block height as 8 little-endian bytes followed by the hash of block 9, if recorded.
pub fn block_reader() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "entrypoint")
          (i64.store (i32.const 256) (call $block_height))
          (if (call $block_hash (i64.const 9) (i32.const 264))
            (then (call $return_value (i32.const 256) (i32.const 40)))
            (else (call $return_value (i32.const 256) (i32.const 8)))))
        "#,
    )
}

/// Returns keccak256("hello").
pub fn hasher() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "entrypoint")
          (call $keccak256 (i32.const 64) (i32.const 5) (i32.const 512))
          (call $return_value (i32.const 512) (i32.const 32)))
        "#,
    )
}

/// Uses a floating point instruction.
pub fn float_user() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "entrypoint")
          (drop (f32.add (f32.const 1) (f32.const 2))))
        "#,
    )
}

/// Exports no `entrypoint`.
pub fn without_entrypoint() -> Vec<u8> {
    wasm_contract(
        r#"
        (func (export "init"))
        "#,
    )
}
