//! Host natives preloaded into globals before a run. A native takes the
//! argument values the call site supplied and returns a value or a fault
//! message; the declared arity is advisory only.

use std::sync::OnceLock;

use cpu_time::ProcessTime;

use crate::{value::Value, vm::Vm};

static BEGIN_OF_PROGRAM: OnceLock<ProcessTime> = OnceLock::new();

fn clock(_args: &[Value]) -> Result<Value, String> {
    let begin = BEGIN_OF_PROGRAM.get_or_init(ProcessTime::now);
    Ok(Value::Number(begin.elapsed().as_secs_f64()))
}

pub fn install(vm: &mut Vm) {
    vm.define_native("clock", 0, clock);
}
