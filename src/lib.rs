pub mod ast;
pub mod chunk;
pub mod compiler;
pub mod error;
pub mod natives;
pub mod parser;
pub mod scanner;
pub mod value;
pub mod vm;

pub use error::PhasaError;
pub use value::Value;
pub use vm::Vm;

/// Run source text through the whole pipeline: scan and parse, compile,
/// then execute on the given VM. The VM's globals survive between calls
/// so a REPL can feed lines one at a time.
pub fn interpret(source: &str, vm: &mut Vm) -> Result<Value, PhasaError> {
    let program = parser::parse(source).map_err(PhasaError::Compile)?;
    let function = compiler::compile(&program).map_err(PhasaError::Compile)?;
    vm.run(function).map_err(PhasaError::from)
}
