use cvm_runtime::{
    error::InterpreterError,
    execution::cache::lock_state,
    gas::GasLedger,
    interpreter::{CallContext, EventSink, Interpreter},
    types::{Address, CallKind, CallParams, LogEvent, Word256},
};

/// Gas charged for every line of a script.
pub const SCRIPT_OP_COST: u64 = 10;

/// Stand-in for an EVM interpreter. Its bytecode is a UTF-8 script, one operation per line:
///
/// |Line                          | Effect                                               |
/// |:---                          |:---                                                  |
/// |`sstore <key> <value>`        | write storage of the running contract                |
/// |`sload <key>`                 | output := storage value                              |
/// |`return <hex>`                | output := bytes                                      |
/// |`input`                       | output := call input                                 |
/// |`revert [hex]`                | fail with revert data                                |
/// |`log <topic> <hex>`           | emit a log                                           |
/// |`gas <amount>`                | consume gas                                          |
/// |`refund <amount>`             | credit the refund counter                            |
/// |`call <address> <value> [hex]`| nested call, output := its return value              |
/// |`recurse`                     | nested call into the running contract itself         |
/// |`number`                      | output := big-endian block height                    |
/// |`blockhash <height>`          | output := recorded hash or empty                     |
/// |`deploy <hex>`                | on create, install these bytes instead of the script |
///
/// Keys and topics are a single byte, left-padded to 32 bytes.
pub struct ScriptEvm;

pub fn word(b: u8) -> Word256 {
    let mut word = [0u8; 32];
    word[31] = b;
    word
}

fn parse_word(s: &str) -> Result<Word256, InterpreterError> {
    u8::from_str_radix(s, 16)
        .map(word)
        .map_err(|e| InterpreterError::InvalidCode(e.to_string()))
}

fn parse_hex(s: &str) -> Result<Vec<u8>, InterpreterError> {
    hex::decode(s).map_err(|e| InterpreterError::InvalidCode(e.to_string()))
}

fn parse_u64(s: &str) -> Result<u64, InterpreterError> {
    s.parse()
        .map_err(|e: std::num::ParseIntError| InterpreterError::InvalidCode(e.to_string()))
}

impl Interpreter for ScriptEvm {
    fn execute(
        &self,
        ctx: &CallContext,
        sink: &mut dyn EventSink,
        params: &CallParams,
        code: &[u8],
        gas: &mut GasLedger,
    ) -> Result<Vec<u8>, InterpreterError> {
        let script =
            std::str::from_utf8(code).map_err(|e| InterpreterError::InvalidCode(e.to_string()))?;
        let mut output = Vec::new();
        let mut runtime_code = code.to_vec();

        for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
            gas.consume(SCRIPT_OP_COST)?;
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                ["sstore", key, value] => lock_state(&ctx.state).set_storage(
                    &params.callee,
                    parse_word(key)?,
                    parse_hex(value)?,
                )?,
                ["sload", key] => {
                    output = lock_state(&ctx.state).get_storage(&params.callee, &parse_word(key)?)?
                }
                ["return", data] => output = parse_hex(data)?,
                ["input"] => output = params.input.clone(),
                ["revert"] => return Err(InterpreterError::Reverted(Vec::new())),
                ["revert", data] => return Err(InterpreterError::Reverted(parse_hex(data)?)),
                ["log", topic, data] => sink.log(LogEvent {
                    address: params.callee,
                    topics: vec![parse_word(topic)?],
                    data: parse_hex(data)?,
                }),
                ["gas", amount] => gas.consume(parse_u64(amount)?)?,
                ["refund", amount] => gas.add_refund(parse_u64(amount)?),
                ["call", address, value, rest @ ..] => {
                    let callee: Address = address
                        .parse()
                        .map_err(|e: cvm_runtime::ExecutionError| {
                            InterpreterError::InvalidCode(e.to_string())
                        })?;
                    let input = match rest {
                        [data] => parse_hex(data)?,
                        _ => Vec::new(),
                    };
                    let child = CallParams {
                        kind: CallKind::Call,
                        caller: params.callee,
                        callee,
                        value: parse_u64(value)?,
                        input,
                        depth: params.depth + 1,
                        is_view: params.is_view,
                    };
                    output = ctx.dispatcher.call(ctx, sink, &child, gas)?;
                }
                ["recurse"] => {
                    let child = CallParams {
                        kind: CallKind::Call,
                        caller: params.callee,
                        callee: params.callee,
                        value: 0,
                        input: Vec::new(),
                        depth: params.depth + 1,
                        is_view: params.is_view,
                    };
                    output = ctx.dispatcher.call(ctx, sink, &child, gas)?;
                }
                ["number"] => output = ctx.block.last_block_height().to_be_bytes().to_vec(),
                ["blockhash", height] => {
                    output = ctx
                        .block
                        .block_hash(parse_u64(height)?)?
                        .map(|hash| hash.to_vec())
                        .unwrap_or_default()
                }
                ["deploy", data] => runtime_code = parse_hex(data)?,
                _ => return Err(InterpreterError::InvalidCode(line.to_string())),
            }
        }

        Ok(match params.kind {
            CallKind::Create => runtime_code,
            CallKind::Call => output,
        })
    }
}
