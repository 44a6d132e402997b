#[cfg(test)]
#[allow(dead_code)]
pub mod script_evm;
pub use script_evm::*;

#[cfg(test)]
#[allow(dead_code)]
pub mod test_world;
pub use test_world::*;

#[cfg(test)]
#[allow(dead_code)]
pub mod wat_contracts;
pub use wat_contracts::*;
